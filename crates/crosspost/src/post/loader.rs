//! Reads post folders from disk.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Deserialize;
use walkdir::WalkDir;

use super::{validate_post, Post};
use crate::error::PostError;

/// Image extensions, in lookup order.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Video extensions, in lookup order.
pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".avi", ".webm"];

const CAPTION_FILE: &str = "caption.txt";
const CONFIG_FILE: &str = "config.json";

/// Optional per-post `config.json`.
#[derive(Debug, Default, Deserialize)]
struct PostConfig {
    #[serde(default)]
    platforms: Option<Vec<String>>,
    #[serde(default)]
    schedule: Option<String>,
}

/// Load one post folder.
pub fn load_post(dir: &Path) -> Result<Post, PostError> {
    let date = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let caption = dir.join(CAPTION_FILE);
    let text = if caption.exists() {
        std::fs::read_to_string(&caption)
            .map_err(|e| PostError::io(&caption, e))?
            .trim()
            .to_string()
    } else {
        tracing::warn!(post = %date, "No caption.txt in post folder");
        String::new()
    };

    let files = list_files(dir)?;
    let image = find_media(dir, &files, "image", IMAGE_EXTENSIONS);
    let video = find_media(dir, &files, "video", VIDEO_EXTENSIONS);
    let config = read_config(dir, &date);

    Ok(Post {
        date,
        dir: dir.to_path_buf(),
        text,
        image,
        video,
        platforms: config.platforms,
        schedule: config.schedule,
    })
}

/// Valid, due posts under `posts_dir`, sorted by folder name.
///
/// Hidden folders and folders starting with `_` (archives, samples) are
/// skipped, as are invalid posts and posts scheduled after `now`.
pub fn pending_posts(posts_dir: &Path, now: DateTime<Local>) -> Result<Vec<Post>, PostError> {
    if !posts_dir.exists() {
        tracing::warn!(path = %posts_dir.display(), "Posts folder not found");
        return Ok(Vec::new());
    }

    let mut posts = Vec::new();
    let entries = std::fs::read_dir(posts_dir).map_err(|e| PostError::io(posts_dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| PostError::io(posts_dir, e))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }

        let post = match load_post(&path) {
            Ok(post) => post,
            Err(e) => {
                tracing::warn!(post = %name, error = %e, "Skipping unreadable post");
                continue;
            }
        };

        let issues = validate_post(&post);
        if !issues.is_empty() {
            let issues: Vec<String> = issues.iter().map(ToString::to_string).collect();
            tracing::warn!(post = %name, issues = ?issues, "Skipping invalid post");
            continue;
        }

        if let Some(at) = post.scheduled_at() {
            if at > now {
                tracing::info!(post = %name, scheduled_at = %at, "Post scheduled for later");
                continue;
            }
        }

        posts.push(post);
    }

    posts.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(posts)
}

fn list_files(dir: &Path) -> Result<Vec<String>, PostError> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            PostError::io(path, e.into())
        })?;
        if entry.file_type().is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// `<stem><ext>` wins for each extension, else any file with that extension.
fn find_media(dir: &Path, files: &[String], stem: &str, extensions: &[&str]) -> Option<PathBuf> {
    for ext in extensions {
        let preferred = format!("{stem}{ext}");
        if files.iter().any(|f| *f == preferred) {
            return Some(dir.join(preferred));
        }
        if let Some(any) = files.iter().find(|f| f.ends_with(ext)) {
            return Some(dir.join(any));
        }
    }
    None
}

fn read_config(dir: &Path, date: &str) -> PostConfig {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return PostConfig::default();
    }
    let parsed = std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));
    match parsed {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(post = %date, error = %e, "Ignoring malformed config.json");
            PostConfig::default()
        }
    }
}
