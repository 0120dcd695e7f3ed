//! Post folders: loading, validation, per-platform formatting and archiving.
//!
//! A post is a directory named after its date (e.g. `posts/2025-01-20/`)
//! holding `caption.txt`, an optional image or video, and an optional
//! `config.json` with target platforms and a schedule.

mod archive;
mod format;
mod loader;
mod template;
mod validate;

pub use archive::archive_post;
pub use format::{
    estimate_publish_time, extract_hashtags, format_text_for_platform, optimal_posting_time,
    truncate_for_twitter,
};
pub use loader::{load_post, pending_posts, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
pub use template::{create_post_from_template, render_template};
pub use validate::{validate_for_targets, validate_post, PostIssue};

use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::platforms::Platform;

/// A loaded post folder. Never mutated after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Folder name, used as the post identifier and sort key.
    pub date: String,
    /// Folder path.
    pub dir: PathBuf,
    /// Trimmed caption text.
    pub text: String,
    /// First image found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,
    /// First video found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<PathBuf>,
    /// Explicit target platforms; `None` means all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
    /// Raw schedule from `config.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

impl Post {
    /// Target platform names: the explicit list, else every platform.
    #[must_use]
    pub fn target_names(&self) -> Vec<String> {
        match &self.platforms {
            Some(list) => list.clone(),
            None => Platform::all()
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
        }
    }

    /// Whether the post targets `platform`.
    #[must_use]
    pub fn targets(&self, platform: Platform) -> bool {
        self.target_names()
            .iter()
            .any(|name| Platform::parse(name) == Some(platform))
    }

    /// Parsed schedule. Unparseable values count as unscheduled.
    #[must_use]
    pub fn scheduled_at(&self) -> Option<DateTime<Local>> {
        self.schedule.as_deref().and_then(parse_schedule)
    }
}

fn parse_schedule(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Local.from_local_datetime(&naive).earliest();
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn post(schedule: Option<&str>, platforms: Option<Vec<&str>>) -> Post {
        Post {
            date: "2025-01-20".to_string(),
            dir: PathBuf::from("posts/2025-01-20"),
            text: "Hello".to_string(),
            image: None,
            video: None,
            platforms: platforms.map(|p| p.into_iter().map(String::from).collect()),
            schedule: schedule.map(String::from),
        }
    }

    #[test]
    fn test_schedule_formats() {
        let at = post(Some("2025-03-01T09:30:00"), None).scheduled_at().unwrap();
        assert_eq!((at.month(), at.day(), at.hour(), at.minute()), (3, 1, 9, 30));

        let at = post(Some("2025-03-01 18:05"), None).scheduled_at().unwrap();
        assert_eq!(at.hour(), 18);

        let at = post(Some("2025-03-01"), None).scheduled_at().unwrap();
        assert_eq!(at.hour(), 0);

        assert!(post(Some("2025-03-01T09:30:00+00:00"), None)
            .scheduled_at()
            .is_some());
        assert!(post(Some("next tuesday"), None).scheduled_at().is_none());
        assert!(post(None, None).scheduled_at().is_none());
    }

    #[test]
    fn test_targets_default_to_all() {
        let all = post(None, None);
        assert_eq!(all.target_names().len(), 4);
        assert!(all.targets(Platform::Instagram));

        let some = post(None, Some(vec!["x", "linkedin"]));
        assert!(some.targets(Platform::Twitter));
        assert!(!some.targets(Platform::Facebook));
    }
}
