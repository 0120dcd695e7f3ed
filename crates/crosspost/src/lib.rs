//! Cross-posting crate for publishing one piece of content to several
//! social networks through their web UIs.
//!
//! This crate provides:
//! - Post folder loading, validation and per-platform text formatting
//! - A selector-fallback action executor over a browser page abstraction
//! - One poster per platform (LinkedIn, Instagram, Facebook, X) driven by chromiumoxide
//! - A sequential orchestrator with a daily JSON results log

pub mod browser;
pub mod config;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod pacing;
pub mod platforms;
pub mod post;
pub mod results;
pub mod session;

// Re-export main types
pub use browser::{BrowserLauncher, ChromeLauncher, Locator, PageDriver};
pub use config::{Config, Credentials};
pub use error::{ActionError, BrowserError, ConfigError, PostError, PosterError};
pub use executor::{Action, ActionExecutor, Interaction};
pub use orchestrator::{Orchestrator, RunEvent, RunOptions};
pub use pacing::{DelayRange, Pacing, Sleeper, TokioSleeper};
pub use platforms::{Platform, PostContent, Poster};
pub use post::Post;
pub use results::{PublishResult, ResultsLog, RunSummary};
pub use session::SessionStore;
