//! Moves published post folders out of the queue.

use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::PostError;

const ARCHIVE_DIR: &str = "_published";

/// Move `dir` to `<parent>/_published/<name>_<YYYYmmdd_HHMMSS>`.
pub fn archive_post(dir: &Path) -> Result<PathBuf, PostError> {
    let parent = dir.parent().unwrap_or_else(|| Path::new("."));
    let archive = parent.join(ARCHIVE_DIR);
    std::fs::create_dir_all(&archive).map_err(|e| PostError::io(&archive, e))?;

    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let target = archive.join(format!("{name}_{stamp}"));

    std::fs::rename(dir, &target).map_err(|e| PostError::io(dir, e))?;
    tracing::info!(from = %dir.display(), to = %target.display(), "Post archived");
    Ok(target)
}
