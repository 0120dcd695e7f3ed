//! Action executor: ordered selector fallback over a [`PageDriver`].
//!
//! A logical action ("post button", "caption field") carries an ordered
//! list of candidate locators. The executor probes them strictly in order,
//! performs the interaction on the first visible match, and only then falls
//! back to a free-text script probe.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::browser::{ElementHandle, Locator, PageDriver, Probe};
use crate::error::{ActionError, BrowserError};
use crate::pacing::{Pacing, Sleeper};

/// Default per-candidate visibility timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout used for each popup candidate.
pub const POPUP_TIMEOUT: Duration = Duration::from_secs(1);

/// What to do with the located element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Mouse click.
    Click,
    /// Clear the field, then type.
    Fill(String),
    /// Type without clearing.
    Type(String),
    /// Attach files to a file input.
    Attach(Vec<PathBuf>),
}

impl Interaction {
    fn needs_visibility(&self) -> bool {
        !matches!(self, Self::Attach(_))
    }
}

/// A named UI step with its candidate locators.
#[derive(Debug, Clone)]
pub struct Action {
    /// Logical name used in logs and errors.
    pub name: String,
    /// Locators tried strictly in order.
    pub candidates: Vec<Locator>,
    /// Keywords for the last-resort script probe (empty disables it).
    pub fallback_keywords: Vec<String>,
    /// Visibility timeout for each candidate.
    pub timeout: Duration,
    /// Skip disabled matches.
    pub require_enabled: bool,
    /// Interaction performed on the winning element.
    pub interaction: Interaction,
}

impl Action {
    fn new(name: impl Into<String>, interaction: Interaction) -> Self {
        Self {
            name: name.into(),
            candidates: Vec::new(),
            fallback_keywords: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            require_enabled: false,
            interaction,
        }
    }

    /// Click action.
    pub fn click(name: impl Into<String>) -> Self {
        Self::new(name, Interaction::Click)
    }

    /// Clear-then-type action.
    pub fn fill(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, Interaction::Fill(text.into()))
    }

    /// Type action.
    pub fn type_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, Interaction::Type(text.into()))
    }

    /// File attach action.
    pub fn attach(name: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self::new(name, Interaction::Attach(files))
    }

    /// Set the candidate locators.
    #[must_use]
    pub fn candidates(mut self, candidates: impl IntoIterator<Item = Locator>) -> Self {
        self.candidates = candidates.into_iter().collect();
        self
    }

    /// Enable the script-probe fallback with these keywords.
    #[must_use]
    pub fn fallback<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Override the per-candidate timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Only accept enabled elements.
    #[must_use]
    pub fn require_enabled(mut self) -> Self {
        self.require_enabled = true;
        self
    }

    fn probe(&self) -> Probe {
        Probe {
            visible: self.interaction.needs_visibility(),
            enabled: self.require_enabled,
        }
    }
}

/// Which locator performed the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Index of the winning candidate, `None` for the script fallback.
    pub candidate: Option<usize>,
    /// The script probe was used.
    pub via_fallback: bool,
}

/// Runs actions with human pacing.
#[derive(Clone)]
pub struct ActionExecutor {
    pacing: Pacing,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for ActionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionExecutor")
            .field("pacing", &self.pacing)
            .finish_non_exhaustive()
    }
}

impl ActionExecutor {
    /// Create an executor.
    pub fn new(pacing: Pacing, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { pacing, sleeper }
    }

    /// Pacing policy in use.
    #[must_use]
    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    /// Short human pause between two actions.
    pub async fn pause(&self) {
        self.sleeper.sleep(self.pacing.action.sample()).await;
    }

    /// Longer wait for the page to settle after a submit or upload.
    pub async fn settle(&self) {
        self.sleeper.sleep(self.pacing.settle.sample()).await;
    }

    /// Arbitrary wait through the injected sleeper.
    pub async fn wait(&self, duration: Duration) {
        self.sleeper.sleep(duration).await;
    }

    /// Perform `action`, failing when no candidate nor the fallback works.
    pub async fn run(
        &self,
        page: &dyn PageDriver,
        action: &Action,
    ) -> Result<ActionOutcome, ActionError> {
        let mut last_error: Option<String> = None;
        let probe = action.probe();

        for (index, locator) in action.candidates.iter().enumerate() {
            match self.wait_for(page, locator, probe, action.timeout).await {
                Ok(Some(handle)) => {
                    tracing::debug!(action = %action.name, candidate = %locator, "Candidate matched");
                    match self.interact(page, &handle, &action.interaction).await {
                        Ok(()) => {
                            return Ok(ActionOutcome {
                                candidate: Some(index),
                                via_fallback: false,
                            })
                        }
                        Err(e) => {
                            tracing::warn!(action = %action.name, candidate = %locator, error = %e, "Interaction failed, trying next candidate");
                            last_error = Some(e.to_string());
                        }
                    }
                }
                Ok(None) => {
                    tracing::debug!(action = %action.name, candidate = %locator, "Candidate not found");
                }
                Err(e) => {
                    tracing::debug!(action = %action.name, candidate = %locator, error = %e, "Candidate probe failed");
                    last_error = Some(e.to_string());
                }
            }
        }

        if !action.fallback_keywords.is_empty() {
            let probe_locator = Locator::probe(action.fallback_keywords.iter().cloned());
            let found = page.find(&probe_locator, probe).await;
            match found {
                Ok(Some(handle)) => {
                    tracing::info!(action = %action.name, keywords = ?action.fallback_keywords, "Using script probe fallback");
                    match page.click(&handle).await {
                        Ok(()) => {
                            return Ok(ActionOutcome {
                                candidate: None,
                                via_fallback: true,
                            })
                        }
                        Err(e) => last_error = Some(e.to_string()),
                    }
                }
                Ok(None) => {
                    tracing::debug!(action = %action.name, "Script probe found nothing");
                }
                Err(e) => {
                    tracing::debug!(action = %action.name, error = %e, "Script probe failed");
                    last_error = Some(e.to_string());
                }
            }
        }

        Err(ActionError {
            action: action.name.clone(),
            last_error,
        })
    }

    /// Best-effort variant of [`run`](Self::run): a failure is logged and yields `None`.
    pub async fn try_run(&self, page: &dyn PageDriver, action: &Action) -> Option<ActionOutcome> {
        match self.run(page, action).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::debug!(error = %e, "Optional step skipped");
                None
            }
        }
    }

    /// Click every visible popup candidate. Returns how many were dismissed.
    pub async fn dismiss_popups(&self, page: &dyn PageDriver, candidates: &[Locator]) -> usize {
        let mut dismissed = 0;
        for locator in candidates {
            match self
                .wait_for(page, locator, Probe::VISIBLE, POPUP_TIMEOUT)
                .await
            {
                Ok(Some(handle)) => match page.click(&handle).await {
                    Ok(()) => {
                        tracing::debug!(popup = %locator, "Popup dismissed");
                        dismissed += 1;
                        self.pause().await;
                    }
                    Err(e) => tracing::debug!(popup = %locator, error = %e, "Popup click failed"),
                },
                Ok(None) => {}
                Err(e) => tracing::debug!(popup = %locator, error = %e, "Popup probe failed"),
            }
        }
        dismissed
    }

    /// Whether any indicator is present in the DOM.
    pub async fn any_present(&self, page: &dyn PageDriver, indicators: &[Locator]) -> bool {
        for locator in indicators {
            match page.count(locator).await {
                Ok(n) if n > 0 => return true,
                Ok(_) => {}
                Err(e) => tracing::debug!(indicator = %locator, error = %e, "Presence check failed"),
            }
        }
        false
    }

    /// Whether any indicator becomes visible within `timeout`.
    pub async fn any_visible(
        &self,
        page: &dyn PageDriver,
        indicators: &[Locator],
        timeout: Duration,
    ) -> bool {
        for locator in indicators {
            match self.wait_for(page, locator, Probe::VISIBLE, timeout).await {
                Ok(Some(_)) => return true,
                Ok(None) => {}
                Err(e) => tracing::debug!(indicator = %locator, error = %e, "Visibility check failed"),
            }
        }
        false
    }

    async fn wait_for(
        &self,
        page: &dyn PageDriver,
        locator: &Locator,
        probe: Probe,
        timeout: Duration,
    ) -> Result<Option<ElementHandle>, BrowserError> {
        let attempts = self.pacing.probe_attempts(timeout);
        for attempt in 1..=attempts {
            if let Some(handle) = page.find(locator, probe).await? {
                return Ok(Some(handle));
            }
            if attempt < attempts {
                self.sleeper.sleep(self.pacing.poll_interval).await;
            }
        }
        Ok(None)
    }

    async fn interact(
        &self,
        page: &dyn PageDriver,
        handle: &ElementHandle,
        interaction: &Interaction,
    ) -> Result<(), BrowserError> {
        match interaction {
            Interaction::Click => page.click(handle).await,
            Interaction::Fill(text) => {
                page.click(handle).await?;
                page.clear(handle).await?;
                self.type_slowly(page, handle, text).await
            }
            Interaction::Type(text) => {
                page.click(handle).await?;
                self.type_slowly(page, handle, text).await
            }
            Interaction::Attach(files) => page.attach_files(handle, files).await,
        }
    }

    async fn type_slowly(
        &self,
        page: &dyn PageDriver,
        handle: &ElementHandle,
        text: &str,
    ) -> Result<(), BrowserError> {
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            page.type_text(handle, ch.encode_utf8(&mut buf)).await?;
            self.sleeper.sleep(self.pacing.typing.sample()).await;
        }
        Ok(())
    }
}
