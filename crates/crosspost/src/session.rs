//! Per-platform browser session persistence.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::browser::StoredCookie;
use crate::platforms::Platform;

/// Cookies captured after a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Platform the cookies belong to.
    pub platform: Platform,
    /// Browser cookies.
    pub cookies: Vec<StoredCookie>,
    /// When the session was captured.
    pub saved_at: DateTime<Utc>,
}

impl SessionState {
    /// Capture a session now.
    #[must_use]
    pub fn new(platform: Platform, cookies: Vec<StoredCookie>) -> Self {
        Self {
            platform,
            cookies,
            saved_at: Utc::now(),
        }
    }
}

/// Directory of `<platform>_state.json` files.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Create a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the session file for `platform`.
    #[must_use]
    pub fn path_for(&self, platform: Platform) -> PathBuf {
        self.dir.join(format!("{}_state.json", platform.as_str()))
    }

    /// Load a stored session. A missing or unreadable file yields `None`.
    #[must_use]
    pub fn load(&self, platform: Platform) -> Option<SessionState> {
        let path = self.path_for(platform);
        if !path.exists() {
            return None;
        }
        match read_state(&path) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable session file");
                None
            }
        }
    }

    /// Persist a session.
    pub fn save(&self, state: &SessionState) -> Result<PathBuf> {
        let path = self.path_for(state.platform);
        let content = serde_json::to_string_pretty(state)?;
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(platform = %state.platform, cookies = state.cookies.len(), "Session saved");
        Ok(path)
    }
}

fn read_state(path: &Path) -> Result<SessionState> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
