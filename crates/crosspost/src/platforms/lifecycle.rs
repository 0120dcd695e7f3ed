//! One publish attempt: browser start, session check, login, publish, teardown.

use std::path::Path;

use thiserror::Error;

use super::{Platform, PostContent, Poster, PosterContext};
use crate::browser::{BrowserLauncher, PageDriver};
use crate::error::PosterError;
use crate::executor::ActionExecutor;
use crate::results::PublishResult;
use crate::session::{SessionState, SessionStore};

/// Lifecycle states of a poster during one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosterState {
    NotStarted,
    BrowserReady,
    SessionChecked { logged_in: bool },
    LoggingIn,
    LoggedIn,
    LoginFailed,
    Publishing,
    Published,
    PublishFailed,
}

/// Shared settings for [`run_attempt`].
#[derive(Debug, Clone, Copy)]
pub struct AttemptOptions<'a> {
    /// Run without a visible window.
    pub headless: bool,
    /// Executor shared by every poster.
    pub executor: &'a ActionExecutor,
    /// Where error and confirmation screenshots go.
    pub screenshots_dir: &'a Path,
    /// Session cookie store.
    pub sessions: &'a SessionStore,
}

#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Login(PosterError),

    #[error("publish failed: {0}")]
    Publish(PosterError),
}

impl AttemptError {
    fn poster_error(&self) -> &PosterError {
        match self {
            Self::Login(e) | Self::Publish(e) => e,
        }
    }
}

struct Tracker {
    platform: Platform,
    state: PosterState,
}

impl Tracker {
    fn new(platform: Platform) -> Self {
        tracing::debug!(platform = %platform, state = ?PosterState::NotStarted, "Poster state");
        Self {
            platform,
            state: PosterState::NotStarted,
        }
    }

    fn enter(&mut self, next: PosterState) {
        tracing::info!(platform = %self.platform, from = ?self.state, to = ?next, "Poster state");
        self.state = next;
    }
}

/// Drive `poster` through one attempt and report the outcome.
///
/// Never panics and never returns an error: every failure becomes a failed
/// [`PublishResult`]. The browser is always closed before returning.
pub async fn run_attempt(
    launcher: &dyn BrowserLauncher,
    poster: &dyn Poster,
    content: &PostContent,
    options: &AttemptOptions<'_>,
) -> PublishResult {
    let platform = poster.platform();
    let mut tracker = Tracker::new(platform);
    tracing::info!(platform = %platform, "Starting publication");

    let mut page = match launcher.launch(platform, options.headless).await {
        Ok(page) => page,
        Err(e) => {
            tracing::error!(platform = %platform, error = %e, "Browser launch failed");
            return PublishResult::failure(platform.as_str(), format!("browser launch failed: {e}"));
        }
    };
    tracker.enter(PosterState::BrowserReady);

    let ctx = PosterContext {
        page: page.as_ref(),
        executor: options.executor,
        screenshots_dir: options.screenshots_dir,
        platform,
    };
    let outcome = drive(&ctx, poster, content, options.sessions, &mut tracker).await;

    if let Err(e) = &outcome {
        if e.poster_error().needs_manual_intervention() {
            tracing::warn!(platform = %platform, error = %e, "Manual login required before the next run");
        } else {
            tracing::error!(platform = %platform, error = %e, "Publication failed");
        }
        ctx.screenshot("error").await;
    }

    if let Err(e) = page.close().await {
        tracing::warn!(platform = %platform, error = %e, "Browser teardown failed");
    }

    match outcome {
        Ok(()) => {
            tracing::info!(platform = %platform, "Publication succeeded");
            PublishResult::success(platform.as_str())
        }
        Err(e) => PublishResult::failure(platform.as_str(), e.to_string()),
    }
}

async fn drive(
    ctx: &PosterContext<'_>,
    poster: &dyn Poster,
    content: &PostContent,
    sessions: &SessionStore,
    tracker: &mut Tracker,
) -> Result<(), AttemptError> {
    let platform = poster.platform();

    restore_session(ctx.page, sessions, platform).await;
    if let Err(e) = ctx.page.goto(poster.entry_url()).await {
        tracing::warn!(platform = %platform, error = %e, "Entry page did not load");
    }
    ctx.executor.settle().await;

    let logged_in = match poster.check_logged_in(ctx).await {
        Ok(logged_in) => logged_in,
        Err(e) => {
            tracing::warn!(platform = %platform, error = %e, "Session check failed, assuming logged out");
            false
        }
    };
    tracker.enter(PosterState::SessionChecked { logged_in });

    if logged_in {
        tracing::info!(platform = %platform, "Already logged in (saved session)");
    } else {
        tracker.enter(PosterState::LoggingIn);
        if let Err(e) = poster.login(ctx).await {
            tracker.enter(PosterState::LoginFailed);
            return Err(AttemptError::Login(e));
        }
        tracker.enter(PosterState::LoggedIn);
        save_session(ctx.page, sessions, platform).await;
    }

    ctx.executor.settle().await;
    tracker.enter(PosterState::Publishing);
    match poster.publish(ctx, content).await {
        Ok(()) => {
            tracker.enter(PosterState::Published);
            Ok(())
        }
        Err(e) => {
            tracker.enter(PosterState::PublishFailed);
            Err(AttemptError::Publish(e))
        }
    }
}

async fn restore_session(page: &dyn PageDriver, sessions: &SessionStore, platform: Platform) {
    let Some(state) = sessions.load(platform) else {
        return;
    };
    match page.set_cookies(&state.cookies).await {
        Ok(()) => tracing::info!(
            platform = %platform,
            cookies = state.cookies.len(),
            saved_at = %state.saved_at,
            "Session restored"
        ),
        Err(e) => tracing::warn!(platform = %platform, error = %e, "Could not restore session"),
    }
}

async fn save_session(page: &dyn PageDriver, sessions: &SessionStore, platform: Platform) {
    let cookies = match page.cookies().await {
        Ok(cookies) => cookies,
        Err(e) => {
            tracing::warn!(platform = %platform, error = %e, "Could not read session cookies");
            return;
        }
    };
    if let Err(e) = sessions.save(&SessionState::new(platform, cookies)) {
        tracing::warn!(platform = %platform, error = %e, "Could not save session");
    }
}
