//! Browser page abstraction.
//!
//! Posters and the action executor only talk to a [`PageDriver`]; the
//! chromiumoxide-backed [`ChromePage`] is the production implementation.

mod chrome;
mod locator;

pub use chrome::{ChromeLauncher, ChromePage};
pub use locator::{Locator, Pick};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BrowserError;
use crate::platforms::Platform;

/// Reference to an element resolved on the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    id: String,
}

impl ElementHandle {
    /// Wrap a handle id produced by the page.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Raw handle id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// CSS selector that re-finds the marked element.
    #[must_use]
    pub fn selector(&self) -> String {
        format!("[data-crosspost-handle=\"{}\"]", self.id)
    }
}

/// Conditions a located element must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    /// Element must be rendered with a non-empty box.
    pub visible: bool,
    /// Element must not be `disabled` / `aria-disabled`.
    pub enabled: bool,
}

impl Probe {
    /// Visible, enabled state not checked.
    pub const VISIBLE: Self = Self {
        visible: true,
        enabled: false,
    };

    /// Visible and enabled.
    pub const ACTIONABLE: Self = Self {
        visible: true,
        enabled: true,
    };

    /// Attached to the DOM, visibility ignored (hidden file inputs).
    pub const ATTACHED: Self = Self {
        visible: false,
        enabled: false,
    };
}

/// Browser-agnostic cookie used for session persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Cookie domain.
    pub domain: String,
    /// Cookie path.
    pub path: String,
    /// Secure flag.
    #[serde(default)]
    pub secure: bool,
    /// HttpOnly flag.
    #[serde(default)]
    pub http_only: bool,
}

/// One page of one running browser.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to `url`.
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// Current page URL (empty when unknown).
    async fn current_url(&self) -> Result<String, BrowserError>;

    /// Wait for the in-flight navigation to finish.
    async fn wait_for_navigation(&self) -> Result<(), BrowserError>;

    /// Resolve `locator` once; `None` when nothing satisfies `probe`.
    async fn find(
        &self,
        locator: &Locator,
        probe: Probe,
    ) -> Result<Option<ElementHandle>, BrowserError>;

    /// Number of elements matching `locator`, visible or not.
    async fn count(&self, locator: &Locator) -> Result<usize, BrowserError>;

    /// Real mouse click on the element.
    async fn click(&self, element: &ElementHandle) -> Result<(), BrowserError>;

    /// Type `text` into the element through key events.
    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), BrowserError>;

    /// Empty an input or contenteditable element.
    async fn clear(&self, element: &ElementHandle) -> Result<(), BrowserError>;

    /// Set the files of an `<input type=file>`.
    async fn attach_files(
        &self,
        element: &ElementHandle,
        files: &[PathBuf],
    ) -> Result<(), BrowserError>;

    /// Rendered text of the element.
    async fn text_of(&self, element: &ElementHandle) -> Result<Option<String>, BrowserError>;

    /// Evaluate a script expression and return its JSON value.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, BrowserError>;

    /// Write a PNG screenshot of the page to `path`.
    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError>;

    /// All cookies visible to the page.
    async fn cookies(&self) -> Result<Vec<StoredCookie>, BrowserError>;

    /// Install cookies into the browser.
    async fn set_cookies(&self, cookies: &[StoredCookie]) -> Result<(), BrowserError>;

    /// Shut the browser down. Safe to call more than once.
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// Starts one browser per publish attempt.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launch a browser for `platform` and open a blank page.
    async fn launch(
        &self,
        platform: Platform,
        headless: bool,
    ) -> Result<Box<dyn PageDriver>, BrowserError>;
}
