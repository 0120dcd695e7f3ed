//! Publish results and the daily JSON results log.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of one (post, platform) attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    /// Platform identifier as requested.
    pub platform: String,
    /// Whether the post went out.
    pub success: bool,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Local time, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// Set on simulated results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

impl PublishResult {
    fn now(platform: &str, success: bool, error: Option<String>, dry_run: Option<bool>) -> Self {
        Self {
            platform: platform.to_string(),
            success,
            error,
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            dry_run,
        }
    }

    /// Successful publication.
    #[must_use]
    pub fn success(platform: &str) -> Self {
        Self::now(platform, true, None, None)
    }

    /// Failed publication.
    #[must_use]
    pub fn failure(platform: &str, error: impl Into<String>) -> Self {
        Self::now(platform, false, Some(error.into()), None)
    }

    /// Simulated success, no browser involved.
    #[must_use]
    pub fn dry_run(platform: &str) -> Self {
        Self::now(platform, true, None, Some(true))
    }

    /// Target name that matches no platform.
    #[must_use]
    pub fn unknown_platform(name: &str) -> Self {
        Self::failure(name, format!("Unknown platform: {name}"))
    }
}

/// One post's results, as stored in the daily log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the entry was written.
    pub timestamp: String,
    /// Post folder name.
    pub post_date: String,
    /// Results keyed by platform.
    pub results: BTreeMap<String, PublishResult>,
}

/// Directory of `<YYYY-MM-DD>.json` result files.
#[derive(Debug, Clone)]
pub struct ResultsLog {
    dir: PathBuf,
}

impl ResultsLog {
    /// Create a log rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file for `date`.
    #[must_use]
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    /// Append one post's results to today's file.
    pub fn append(&self, post_date: &str, results: &BTreeMap<String, PublishResult>) -> Result<PathBuf> {
        self.append_at(Local::now(), post_date, results)
    }

    /// Append to the file of `now`'s day. The file is rewritten through a temp file.
    ///
    /// A day file that cannot be parsed is renamed to `<date>.json.corrupt`
    /// and a fresh array is started.
    pub fn append_at(
        &self,
        now: DateTime<Local>,
        post_date: &str,
        results: &BTreeMap<String, PublishResult>,
    ) -> Result<PathBuf> {
        let path = self.path_for(now.date_naive());
        let mut entries = match read_entries(&path) {
            Ok(entries) => entries,
            Err(e) if path.exists() => {
                let corrupt = path.with_extension("json.corrupt");
                tracing::warn!(
                    path = %path.display(),
                    moved_to = %corrupt.display(),
                    error = %e,
                    "Unreadable results log moved aside"
                );
                std::fs::rename(&path, &corrupt)
                    .with_context(|| format!("failed to move {} aside", path.display()))?;
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        entries.push(LogEntry {
            timestamp: now.to_rfc3339(),
            post_date: post_date.to_string(),
            results: results.clone(),
        });

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&entries)?)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("failed to replace {}", path.display()))?;

        tracing::debug!(path = %path.display(), entries = entries.len(), "Results saved");
        Ok(path)
    }

    /// Every entry recorded on `date` (empty when no file exists).
    pub fn load_day(&self, date: NaiveDate) -> Result<Vec<LogEntry>> {
        read_entries(&self.path_for(date))
    }
}

fn read_entries(path: &Path) -> Result<Vec<LogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("malformed results log {}", path.display()))
}

/// Totals over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Posts processed.
    pub posts: usize,
    /// Successful platform attempts.
    pub successes: usize,
    /// Failed platform attempts.
    pub failures: usize,
}

impl RunSummary {
    /// Add one post's results.
    pub fn record(&mut self, results: &BTreeMap<String, PublishResult>) {
        self.posts += 1;
        for result in results.values() {
            if result.success {
                self.successes += 1;
            } else {
                self.failures += 1;
            }
        }
    }

    /// Whether every attempt succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures == 0
    }
}
