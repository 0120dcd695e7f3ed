//! Platform posters.
//!
//! Each supported network implements [`Poster`]: a session check, a login
//! sequence and a publish sequence, all expressed as executor actions over a
//! [`PageDriver`]. [`run_attempt`] drives one poster through its lifecycle.

mod facebook;
mod google;
mod instagram;
mod lifecycle;
mod linkedin;
mod twitter;

pub use facebook::FacebookPoster;
pub use instagram::InstagramPoster;
pub use lifecycle::{run_attempt, AttemptOptions, PosterState};
pub use linkedin::LinkedInPoster;
pub use twitter::TwitterPoster;

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::browser::{Locator, PageDriver};
use crate::config::Credentials;
use crate::error::{ActionError, PosterError};
use crate::executor::{Action, ActionExecutor, ActionOutcome};

/// A supported social network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// LinkedIn
    #[serde(rename = "linkedin")]
    LinkedIn,
    /// Instagram
    Instagram,
    /// Facebook
    Facebook,
    /// X (formerly Twitter)
    Twitter,
}

impl Platform {
    /// Parse a platform identifier (`x` is accepted for Twitter).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linkedin" => Some(Self::LinkedIn),
            "instagram" => Some(Self::Instagram),
            "facebook" => Some(Self::Facebook),
            "twitter" | "x" => Some(Self::Twitter),
            _ => None,
        }
    }

    /// Canonical identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LinkedIn => "linkedin",
            Self::Instagram => "instagram",
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::LinkedIn => "LinkedIn",
            Self::Instagram => "Instagram",
            Self::Facebook => "Facebook",
            Self::Twitter => "X (Twitter)",
        }
    }

    /// Console marker.
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::LinkedIn => "💼",
            Self::Instagram => "📸",
            Self::Facebook => "📘",
            Self::Twitter => "🐦",
        }
    }

    /// All platforms in publishing order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::LinkedIn, Self::Instagram, Self::Facebook, Self::Twitter]
    }

    /// Whether the login page offers "continue with Google".
    #[must_use]
    pub const fn supports_google_login(self) -> bool {
        matches!(self, Self::LinkedIn | Self::Twitter)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a poster publishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostContent {
    /// Caption, already formatted for the platform.
    pub text: String,
    /// Optional image.
    pub image: Option<PathBuf>,
    /// Optional video (ignored when an image is present).
    pub video: Option<PathBuf>,
}

impl PostContent {
    /// The single media file to upload, image first.
    #[must_use]
    pub fn media(&self) -> Option<&Path> {
        self.image.as_deref().or(self.video.as_deref())
    }

    /// Whether the uploaded media is a video.
    #[must_use]
    pub fn media_is_video(&self) -> bool {
        self.image.is_none() && self.video.is_some()
    }
}

/// Everything a poster needs during one attempt.
pub struct PosterContext<'a> {
    /// The live page.
    pub page: &'a dyn PageDriver,
    /// Shared action executor.
    pub executor: &'a ActionExecutor,
    /// Screenshot output directory.
    pub screenshots_dir: &'a Path,
    /// Platform being driven.
    pub platform: Platform,
}

impl PosterContext<'_> {
    /// Run a required action.
    pub async fn act(&self, action: &Action) -> Result<ActionOutcome, ActionError> {
        self.executor.run(self.page, action).await
    }

    /// Run a best-effort action.
    pub async fn try_act(&self, action: &Action) -> Option<ActionOutcome> {
        self.executor.try_run(self.page, action).await
    }

    /// Dismiss any visible popup among `candidates`.
    pub async fn dismiss(&self, candidates: &[Locator]) -> usize {
        self.executor.dismiss_popups(self.page, candidates).await
    }

    /// Current URL, lowercased; empty when the page cannot tell.
    pub async fn url(&self) -> String {
        match self.page.current_url().await {
            Ok(url) => url.to_lowercase(),
            Err(e) => {
                tracing::debug!(error = %e, "Could not read current URL");
                String::new()
            }
        }
    }

    /// Save `<platform>_<label>_<timestamp>.png`. Failures are logged only.
    pub async fn screenshot(&self, label: &str) -> Option<PathBuf> {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let path = self
            .screenshots_dir
            .join(format!("{}_{label}_{stamp}.png", self.platform.as_str()));
        match self.page.screenshot(&path).await {
            Ok(()) => Some(path),
            Err(e) => {
                tracing::warn!(platform = %self.platform, label, error = %e, "Screenshot failed");
                None
            }
        }
    }

    /// Fail with a security-challenge error if the URL carries any marker.
    pub async fn detect_challenge(&self, markers: &[&str]) -> Result<(), PosterError> {
        let url = self.url().await;
        if markers.iter().any(|m| url.contains(m)) {
            tracing::warn!(
                platform = %self.platform,
                url = %url,
                "Security verification detected; log in manually once to validate this device"
            );
            self.screenshot("security_challenge").await;
            return Err(PosterError::SecurityChallenge {
                platform: self.platform.display_name().to_string(),
                url,
            });
        }
        Ok(())
    }
}

/// One social network's login and publish sequences.
#[async_trait]
pub trait Poster: Send + Sync {
    /// Platform handled by this poster.
    fn platform(&self) -> Platform;

    /// Page opened first (restored cookies are installed there).
    fn entry_url(&self) -> &'static str;

    /// Whether the current browser session is authenticated.
    async fn check_logged_in(&self, ctx: &PosterContext<'_>) -> Result<bool, PosterError>;

    /// Log in interactively.
    async fn login(&self, ctx: &PosterContext<'_>) -> Result<(), PosterError>;

    /// Publish `content`.
    async fn publish(&self, ctx: &PosterContext<'_>, content: &PostContent)
        -> Result<(), PosterError>;
}

/// Build the poster for `platform`.
#[must_use]
pub fn poster_for(platform: Platform, credentials: &Credentials) -> Box<dyn Poster> {
    match platform {
        Platform::LinkedIn => Box::new(LinkedInPoster::new(credentials)),
        Platform::Instagram => Box::new(InstagramPoster::new(credentials)),
        Platform::Facebook => Box::new(FacebookPoster::new(credentials)),
        Platform::Twitter => Box::new(TwitterPoster::new(credentials)),
    }
}

/// Popups shared by every platform.
pub(crate) fn common_popups() -> Vec<Locator> {
    vec![
        Locator::aria("Close"),
        Locator::aria("Fermer"),
        Locator::text("button", "Not Now"),
        Locator::text("button", "Not now"),
        Locator::text("button", "Pas maintenant"),
    ]
}

/// Fail early on a missing media file.
pub(crate) fn ensure_exists(path: &Path) -> Result<(), PosterError> {
    if path.exists() {
        Ok(())
    } else {
        Err(PosterError::MediaNotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Platform::parse("x"), Some(Platform::Twitter));
        assert_eq!(Platform::parse("Twitter"), Some(Platform::Twitter));
        assert_eq!(Platform::parse(" linkedin "), Some(Platform::LinkedIn));
        assert_eq!(Platform::parse("myspace"), None);
    }

    #[test]
    fn test_serde_identifiers() {
        let json = serde_json::to_string(&Platform::LinkedIn).unwrap();
        assert_eq!(json, "\"linkedin\"");
        let back: Platform = serde_json::from_str("\"instagram\"").unwrap();
        assert_eq!(back, Platform::Instagram);
    }

    #[test]
    fn test_media_prefers_image() {
        let content = PostContent {
            text: String::new(),
            image: Some(PathBuf::from("a.png")),
            video: Some(PathBuf::from("b.mp4")),
        };
        assert_eq!(content.media(), Some(Path::new("a.png")));
        assert!(!content.media_is_video());
    }
}
