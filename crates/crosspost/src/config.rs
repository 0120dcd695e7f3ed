//! Runtime configuration read from the environment.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::pacing::{DelayRange, Pacing};
use crate::platforms::Platform;

/// Default seconds between two platforms of the same post.
pub const DEFAULT_DELAY_BETWEEN_PLATFORMS: u64 = 300;

/// Default seconds between two posts.
pub const DEFAULT_DELAY_BETWEEN_POSTS: u64 = 60;

/// Runtime settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root folder of dated post directories.
    pub posts_dir: PathBuf,
    /// Daily results logs and text logs.
    pub logs_dir: PathBuf,
    /// Error and confirmation screenshots.
    pub screenshots_dir: PathBuf,
    /// Per-platform session files.
    pub browser_data_dir: PathBuf,
    /// Caption templates for `new-post`.
    pub templates_dir: PathBuf,
    /// Wait between two platforms of one post.
    pub delay_between_platforms: Duration,
    /// Wait between two posts.
    pub delay_between_posts: Duration,
    /// Human pacing policy.
    pub pacing: Pacing,
    /// Debug logging by default.
    pub debug: bool,
    /// Move fully published posts to `_published/`.
    pub archive_published: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            posts_dir: PathBuf::from("posts"),
            logs_dir: PathBuf::from("logs"),
            screenshots_dir: PathBuf::from("screenshots"),
            browser_data_dir: PathBuf::from("browser_data"),
            templates_dir: PathBuf::from("templates"),
            delay_between_platforms: Duration::from_secs(DEFAULT_DELAY_BETWEEN_PLATFORMS),
            delay_between_posts: Duration::from_secs(DEFAULT_DELAY_BETWEEN_POSTS),
            pacing: Pacing::default(),
            debug: false,
            archive_published: false,
        }
    }
}

impl Config {
    /// Create configuration from environment variables.
    ///
    /// # Optional Environment Variables
    /// - `POSTS_FOLDER`, `LOGS_DIR`, `SCREENSHOTS_DIR`, `BROWSER_DATA_DIR`, `TEMPLATES_DIR`
    /// - `DELAY_BETWEEN_PLATFORMS` / `DELAY_BETWEEN_POSTS`: seconds (default: 300 / 60)
    /// - `HUMAN_DELAY_MIN_MS` / `HUMAN_DELAY_MAX_MS` (default: 1000 / 3000)
    /// - `TYPING_DELAY_MIN_MS` / `TYPING_DELAY_MAX_MS` (default: 30 / 100)
    /// - `DEBUG_MODE`, `ARCHIVE_PUBLISHED`: `true` to enable
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let dir = |key: &str, default: PathBuf| lookup(key).map_or(default, PathBuf::from);

        let human_min = number(&lookup, "HUMAN_DELAY_MIN_MS", 1_000)?;
        let human_max = number(&lookup, "HUMAN_DELAY_MAX_MS", 3_000)?;
        let typing_min = number(&lookup, "TYPING_DELAY_MIN_MS", 30)?;
        let typing_max = number(&lookup, "TYPING_DELAY_MAX_MS", 100)?;

        let pacing = Pacing {
            action: DelayRange::from_millis(human_min, human_max),
            typing: DelayRange::from_millis(typing_min, typing_max),
            ..Pacing::default()
        };

        Ok(Self {
            posts_dir: dir("POSTS_FOLDER", defaults.posts_dir),
            logs_dir: dir("LOGS_DIR", defaults.logs_dir),
            screenshots_dir: dir("SCREENSHOTS_DIR", defaults.screenshots_dir),
            browser_data_dir: dir("BROWSER_DATA_DIR", defaults.browser_data_dir),
            templates_dir: dir("TEMPLATES_DIR", defaults.templates_dir),
            delay_between_platforms: Duration::from_secs(number(
                &lookup,
                "DELAY_BETWEEN_PLATFORMS",
                DEFAULT_DELAY_BETWEEN_PLATFORMS,
            )?),
            delay_between_posts: Duration::from_secs(number(
                &lookup,
                "DELAY_BETWEEN_POSTS",
                DEFAULT_DELAY_BETWEEN_POSTS,
            )?),
            pacing,
            debug: flag(&lookup, "DEBUG_MODE"),
            archive_published: flag(&lookup, "ARCHIVE_PUBLISHED"),
        })
    }
}

fn number<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key, value: raw })
        }
        _ => Ok(default),
    }
}

fn flag<F>(lookup: &F, key: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
}

/// A username / password pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Login {
    /// Email or username.
    pub username: String,
    /// Password.
    pub password: String,
}

impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Login")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Platform credentials.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// `LINKEDIN_EMAIL` / `LINKEDIN_PASS`.
    pub linkedin: Option<Login>,
    /// `INSTAGRAM_USER` / `INSTAGRAM_PASS`.
    pub instagram: Option<Login>,
    /// `FACEBOOK_EMAIL` / `FACEBOOK_PASS`.
    pub facebook: Option<Login>,
    /// `TWITTER_USER` / `TWITTER_PASS`.
    pub twitter: Option<Login>,
    /// Email asked by X on unusual-activity checks.
    pub twitter_email: Option<String>,
    /// Managed Facebook page to publish on.
    pub facebook_page_name: Option<String>,
    /// `GOOGLE_EMAIL` / `GOOGLE_PASSWORD` for "continue with Google".
    pub google: Option<Login>,
}

impl Credentials {
    /// Read credentials from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials from an arbitrary variable lookup. Blank values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let pair = |user: &str, pass: &str| match (value(user), value(pass)) {
            (Some(username), Some(password)) => Some(Login { username, password }),
            _ => None,
        };

        Self {
            linkedin: pair("LINKEDIN_EMAIL", "LINKEDIN_PASS"),
            instagram: pair("INSTAGRAM_USER", "INSTAGRAM_PASS"),
            facebook: pair("FACEBOOK_EMAIL", "FACEBOOK_PASS"),
            twitter: pair("TWITTER_USER", "TWITTER_PASS"),
            twitter_email: value("TWITTER_EMAIL"),
            facebook_page_name: value("FACEBOOK_PAGE_NAME"),
            google: pair("GOOGLE_EMAIL", "GOOGLE_PASSWORD"),
        }
    }

    /// Platform's own login.
    #[must_use]
    pub fn login_for(&self, platform: Platform) -> Option<&Login> {
        match platform {
            Platform::LinkedIn => self.linkedin.as_ref(),
            Platform::Instagram => self.instagram.as_ref(),
            Platform::Facebook => self.facebook.as_ref(),
            Platform::Twitter => self.twitter.as_ref(),
        }
    }

    /// Google login usable for `platform`, if the platform supports it.
    #[must_use]
    pub fn google_for(&self, platform: Platform) -> Option<&Login> {
        if platform.supports_google_login() {
            self.google.as_ref()
        } else {
            None
        }
    }

    /// Environment variables to set before `platforms` can log in.
    #[must_use]
    pub fn missing_for(&self, platforms: &[Platform]) -> Vec<String> {
        let mut missing = Vec::new();
        for &platform in platforms {
            if self.login_for(platform).is_some() || self.google_for(platform).is_some() {
                continue;
            }
            let (user, pass) = env_keys(platform);
            missing.push(format!("{user} / {pass}"));
        }
        missing
    }
}

fn env_keys(platform: Platform) -> (&'static str, &'static str) {
    match platform {
        Platform::LinkedIn => ("LINKEDIN_EMAIL", "LINKEDIN_PASS"),
        Platform::Instagram => ("INSTAGRAM_USER", "INSTAGRAM_PASS"),
        Platform::Facebook => ("FACEBOOK_EMAIL", "FACEBOOK_PASS"),
        Platform::Twitter => ("TWITTER_USER", "TWITTER_PASS"),
    }
}
