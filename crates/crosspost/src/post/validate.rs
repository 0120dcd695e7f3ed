//! Pre-publication checks on a loaded post.

use std::fmt;
use std::path::PathBuf;

use super::Post;
use crate::platforms::Platform;

/// Something that blocks a post from being published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostIssue {
    EmptyText,
    ImageNotFound(PathBuf),
    VideoNotFound(PathBuf),
    InstagramNeedsMedia,
}

impl fmt::Display for PostIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyText => f.write_str("caption text is empty (caption.txt)"),
            Self::ImageNotFound(path) => write!(f, "image not found: {}", path.display()),
            Self::VideoNotFound(path) => write!(f, "video not found: {}", path.display()),
            Self::InstagramNeedsMedia => f.write_str("Instagram requires an image or a video"),
        }
    }
}

/// List everything wrong with `post`. An empty list means it can be published.
#[must_use]
pub fn validate_post(post: &Post) -> Vec<PostIssue> {
    let targets: Vec<Platform> = post
        .target_names()
        .iter()
        .filter_map(|name| Platform::parse(name))
        .collect();
    validate_for_targets(post, &targets)
}

/// Like [`validate_post`], but the media rules follow `targets` instead of
/// the post's own platform list (used when the run overrides the platform).
#[must_use]
pub fn validate_for_targets(post: &Post, targets: &[Platform]) -> Vec<PostIssue> {
    let mut issues = Vec::new();

    if post.text.is_empty() {
        issues.push(PostIssue::EmptyText);
    }

    let chars = post.text.chars().count();
    if chars > 280 {
        tracing::warn!(post = %post.date, chars, "Text will be truncated for X");
    }

    if let Some(image) = &post.image {
        if !image.exists() {
            issues.push(PostIssue::ImageNotFound(image.clone()));
        }
    }
    if let Some(video) = &post.video {
        if !video.exists() {
            issues.push(PostIssue::VideoNotFound(video.clone()));
        }
    }

    if targets.contains(&Platform::Instagram) && post.image.is_none() && post.video.is_none() {
        issues.push(PostIssue::InstagramNeedsMedia);
    }

    issues
}
