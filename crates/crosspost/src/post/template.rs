//! Caption templates (`<templates_dir>/<name>.txt`) rendered with handlebars.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use handlebars::Handlebars;

use crate::error::PostError;

/// Render `<templates_dir>/<name>.txt`, substituting `{{var}}` placeholders.
///
/// Unknown placeholders render empty. Output is not HTML-escaped.
pub fn render_template(
    templates_dir: &Path,
    name: &str,
    vars: &BTreeMap<String, String>,
) -> Result<String, PostError> {
    let path = templates_dir.join(format!("{name}.txt"));
    if !path.exists() {
        return Err(PostError::TemplateNotFound(path));
    }
    let template = std::fs::read_to_string(&path).map_err(|e| PostError::io(&path, e))?;

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    Ok(handlebars.render_template(&template, vars)?)
}

/// Create `<posts_dir>/<date>/caption.txt` from a template.
///
/// Fails if the post folder already has a caption.
pub fn create_post_from_template(
    templates_dir: &Path,
    posts_dir: &Path,
    name: &str,
    date: &str,
    vars: &BTreeMap<String, String>,
) -> Result<PathBuf, PostError> {
    let text = render_template(templates_dir, name, vars)?;
    let dir = posts_dir.join(date);
    std::fs::create_dir_all(&dir).map_err(|e| PostError::io(&dir, e))?;

    let caption = dir.join("caption.txt");
    if caption.exists() {
        return Err(PostError::io(
            &caption,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "caption already exists"),
        ));
    }
    std::fs::write(&caption, text.trim_end().to_string() + "\n")
        .map_err(|e| PostError::io(&caption, e))?;
    tracing::info!(path = %caption.display(), template = name, "Post created from template");
    Ok(dir)
}
