//! Error types for the cross-posting pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised before any browser work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment value could not be parsed
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    /// Credentials required by the targeted platforms are absent
    #[error("missing credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),

    /// The requested post folder does not exist
    #[error("post not found: {}", .0.display())]
    PostNotFound(PathBuf),
}

/// Errors coming from the browser or the DevTools protocol.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Browser process could not be started
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// DevTools protocol failure
    #[error("browser protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    /// A protocol request could not be built
    #[error("invalid protocol request: {0}")]
    Request(String),

    /// Filesystem error (screenshots, uploads)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Task join failure while tearing the browser down
    #[error("browser handler task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A logical UI action found no workable control on the page.
#[derive(Debug, Error)]
#[error("no usable control found for '{action}'")]
pub struct ActionError {
    /// Name of the logical action (e.g. "post button").
    pub action: String,
    /// Last browser error seen while probing, if any.
    pub last_error: Option<String>,
}

/// Errors from a platform poster (login or publish).
#[derive(Debug, Error)]
pub enum PosterError {
    /// A required UI action could not be performed
    #[error(transparent)]
    Action(#[from] ActionError),

    /// Browser or protocol failure
    #[error(transparent)]
    Browser(#[from] BrowserError),

    /// The platform put up a checkpoint / CAPTCHA / 2FA page
    #[error("{platform} security challenge at {url}: log in manually once to validate this device")]
    SecurityChallenge { platform: String, url: String },

    /// Credentials were submitted but the session is still anonymous
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// No usable credentials for the platform
    #[error("no credentials configured for {0}")]
    MissingCredentials(String),

    /// The platform cannot publish text-only posts
    #[error("{0} requires an image or a video")]
    MissingMedia(String),

    /// A media path points to nothing
    #[error("media file not found: {}", .0.display())]
    MediaNotFound(PathBuf),
}

impl PosterError {
    /// Whether this failure needs a human before the next attempt.
    #[must_use]
    pub fn needs_manual_intervention(&self) -> bool {
        matches!(self, Self::SecurityChallenge { .. })
    }
}

/// Errors while reading or writing post folders.
#[derive(Debug, Error)]
pub enum PostError {
    /// Filesystem error with the offending path
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Caption template does not exist
    #[error("template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// Caption template failed to render
    #[error("failed to render template: {0}")]
    Render(#[from] handlebars::RenderError),
}

impl PostError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
