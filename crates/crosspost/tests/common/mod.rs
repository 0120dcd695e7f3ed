//! Scripted browser doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use crosspost::browser::{ElementHandle, Probe, StoredCookie};
use crosspost::pacing::{Pacing, Sleeper};
use crosspost::{ActionExecutor, BrowserError, BrowserLauncher, Locator, PageDriver, Platform};

// =============================================================================
// Fake Page
// =============================================================================

/// State of one scripted element.
#[derive(Debug, Clone, Copy)]
pub struct FakeElement {
    pub visible: bool,
    pub enabled: bool,
}

impl FakeElement {
    pub const READY: Self = Self {
        visible: true,
        enabled: true,
    };
    pub const HIDDEN: Self = Self {
        visible: false,
        enabled: true,
    };
    pub const DISABLED: Self = Self {
        visible: true,
        enabled: false,
    };
}

/// Everything the page saw, for assertions.
#[derive(Debug, Default)]
pub struct PageLog {
    /// Locators probed, in order.
    pub probes: Vec<String>,
    /// Locators clicked, in order.
    pub clicks: Vec<String>,
    /// Text typed per locator.
    pub typed: HashMap<String, String>,
    /// Files attached per locator.
    pub attached: HashMap<String, Vec<PathBuf>>,
    /// Navigations.
    pub visited: Vec<String>,
    /// Screenshots written.
    pub screenshots: Vec<PathBuf>,
    /// Cookies installed through `set_cookies`.
    pub restored_cookies: Vec<StoredCookie>,
    /// Number of `close` calls.
    pub closed: usize,
}

#[derive(Debug, Default)]
struct FakeState {
    /// Every locator not explicitly scripted resolves to a ready element.
    permissive: bool,
    /// Substrings of locator descriptions that never resolve in permissive mode.
    hidden: Vec<String>,
    elements: HashMap<String, FakeElement>,
    texts: HashMap<String, String>,
    /// Elements that appear once the keyed locator is clicked.
    reveals: HashMap<String, Vec<String>>,
    handles: HashMap<String, String>,
    url: Option<String>,
    cookies: Vec<StoredCookie>,
    next_handle: usize,
    log: PageLog,
}

/// In-memory [`PageDriver`]. Elements are keyed by the locator's display form.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    state: Arc<Mutex<FakeState>>,
}

impl FakePage {
    /// Page where only scripted elements exist.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Page where every locator resolves unless hidden.
    pub fn permissive() -> Self {
        let page = Self::default();
        page.lock().permissive = true;
        page
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Script an element for `locator`.
    pub fn with(self, locator: &Locator, element: FakeElement) -> Self {
        self.lock().elements.insert(locator.to_string(), element);
        self
    }

    /// Script an element's rendered text.
    pub fn with_text(self, locator: &Locator, text: &str) -> Self {
        let key = locator.to_string();
        {
            let mut state = self.lock();
            state.elements.entry(key.clone()).or_insert(FakeElement::READY);
            state.texts.insert(key, text.to_string());
        }
        self
    }

    /// In permissive mode, never resolve locators whose description contains `needle`.
    pub fn hide_containing(self, needle: &str) -> Self {
        self.lock().hidden.push(needle.to_string());
        self
    }

    /// Make `revealed` ready once `trigger` has been clicked.
    pub fn reveal_on_click(self, trigger: &Locator, revealed: &Locator) -> Self {
        self.lock()
            .reveals
            .entry(trigger.to_string())
            .or_default()
            .push(revealed.to_string());
        self
    }

    /// Pin the URL reported by `current_url`.
    pub fn at_url(self, url: &str) -> Self {
        self.lock().url = Some(url.to_string());
        self
    }

    /// Cookies returned by `cookies`.
    pub fn with_cookies(self, cookies: Vec<StoredCookie>) -> Self {
        self.lock().cookies = cookies;
        self
    }

    /// Inspect the interaction log.
    pub fn log<R>(&self, f: impl FnOnce(&PageLog) -> R) -> R {
        f(&self.lock().log)
    }

    fn element_for(state: &FakeState, key: &str) -> Option<FakeElement> {
        if let Some(element) = state.elements.get(key) {
            return Some(*element);
        }
        if state.permissive && !state.hidden.iter().any(|h| key.contains(h.as_str())) {
            return Some(FakeElement::READY);
        }
        None
    }

    fn key_of(&self, handle: &ElementHandle) -> Result<String, BrowserError> {
        self.lock()
            .handles
            .get(handle.id())
            .cloned()
            .ok_or_else(|| BrowserError::Request(format!("stale handle {}", handle.id())))
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.lock().log.visited.push(url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> Result<String, BrowserError> {
        let state = self.lock();
        Ok(state
            .url
            .clone()
            .or_else(|| state.log.visited.last().cloned())
            .unwrap_or_default())
    }

    async fn wait_for_navigation(&self) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn find(
        &self,
        locator: &Locator,
        probe: Probe,
    ) -> Result<Option<ElementHandle>, BrowserError> {
        let key = locator.to_string();
        let mut state = self.lock();
        state.log.probes.push(key.clone());

        let Some(element) = Self::element_for(&state, &key) else {
            return Ok(None);
        };
        if (probe.visible && !element.visible) || (probe.enabled && !element.enabled) {
            return Ok(None);
        }

        state.next_handle += 1;
        let id = format!("h{}", state.next_handle);
        state.handles.insert(id.clone(), key);
        Ok(Some(ElementHandle::new(id)))
    }

    async fn count(&self, locator: &Locator) -> Result<usize, BrowserError> {
        let state = self.lock();
        Ok(usize::from(
            Self::element_for(&state, &locator.to_string()).is_some(),
        ))
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), BrowserError> {
        let key = self.key_of(element)?;
        let mut state = self.lock();
        if let Some(revealed) = state.reveals.get(&key).cloned() {
            for locator in revealed {
                state.elements.insert(locator, FakeElement::READY);
            }
        }
        state.log.clicks.push(key);
        Ok(())
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), BrowserError> {
        let key = self.key_of(element)?;
        self.lock().log.typed.entry(key).or_default().push_str(text);
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<(), BrowserError> {
        let key = self.key_of(element)?;
        self.lock().log.typed.remove(&key);
        Ok(())
    }

    async fn attach_files(
        &self,
        element: &ElementHandle,
        files: &[PathBuf],
    ) -> Result<(), BrowserError> {
        let key = self.key_of(element)?;
        self.lock().log.attached.insert(key, files.to_vec());
        Ok(())
    }

    async fn text_of(&self, element: &ElementHandle) -> Result<Option<String>, BrowserError> {
        let key = self.key_of(element)?;
        Ok(self.lock().texts.get(&key).cloned())
    }

    async fn evaluate(&self, _script: &str) -> Result<serde_json::Value, BrowserError> {
        Ok(serde_json::Value::Null)
    }

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, b"")?;
        self.lock().log.screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<StoredCookie>, BrowserError> {
        Ok(self.lock().cookies.clone())
    }

    async fn set_cookies(&self, cookies: &[StoredCookie]) -> Result<(), BrowserError> {
        self.lock().log.restored_cookies.extend_from_slice(cookies);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.lock().log.closed += 1;
        Ok(())
    }
}

// =============================================================================
// Fake Launcher
// =============================================================================

/// Hands out clones of one [`FakePage`] and counts launches.
#[derive(Debug, Default)]
pub struct FakeLauncher {
    page: FakePage,
    launches: AtomicUsize,
    fail: bool,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self {
            page,
            launches: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// Launcher whose browser never starts.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn page(&self) -> &FakePage {
        &self.page
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(
        &self,
        _platform: Platform,
        _headless: bool,
    ) -> Result<Box<dyn PageDriver>, BrowserError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BrowserError::Launch("no chrome in tests".to_string()));
        }
        Ok(Box::new(self.page.clone()))
    }
}

// =============================================================================
// Sleeper
// =============================================================================

/// Records requested sleeps without waiting.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }

    /// Sleeps of at least `min`, ignoring pacing noise.
    pub fn long_sleeps(&self, min: Duration) -> Vec<Duration> {
        self.slept().into_iter().filter(|d| *d >= min).collect()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// Executor with zero pacing.
pub fn instant_executor() -> ActionExecutor {
    ActionExecutor::new(Pacing::instant(), Arc::new(RecordingSleeper::default()))
}
