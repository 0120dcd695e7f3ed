//! Per-platform caption formatting and scheduling hints.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::platforms::Platform;

const TWITTER_LIMIT: usize = 280;
const INSTAGRAM_LIMIT: usize = 2200;
const ELLIPSIS: &str = "...";

/// A space before this character index is too early to cut at.
const WORD_CUT_MIN: usize = 200;

/// Rough time needed to publish on one platform.
const TIME_PER_PLATFORM: Duration = Duration::from_secs(60);

/// Adapt `text` to the conventions of `platform`.
#[must_use]
pub fn format_text_for_platform(text: &str, platform: Platform) -> String {
    match platform {
        Platform::Twitter => truncate_for_twitter(&collapse_blank_lines(text), TWITTER_LIMIT),
        Platform::Instagram => {
            let text = collapse_blank_lines(text);
            if text.chars().count() > INSTAGRAM_LIMIT {
                let head: String = text.chars().take(INSTAGRAM_LIMIT - ELLIPSIS.len()).collect();
                format!("{head}{ELLIPSIS}")
            } else {
                text
            }
        }
        Platform::LinkedIn | Platform::Facebook => text.to_string(),
    }
}

/// Cut `text` to at most `max` characters, preferring a word boundary.
///
/// The text is cut to `max - 3` characters; if the last space of that cut
/// sits past character 200 the cut moves back to it. `...` is appended.
#[must_use]
pub fn truncate_for_twitter(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut cut: Vec<char> = text.chars().take(keep).collect();
    if let Some(space) = cut.iter().rposition(|c| *c == ' ') {
        if space > WORD_CUT_MIN {
            cut.truncate(space);
        }
    }
    let mut out: String = cut.into_iter().collect();
    out.push_str(ELLIPSIS);
    out
}

fn collapse_blank_lines(text: &str) -> String {
    text.replace("\n\n", "\n")
}

/// Hashtags (`#word`) in order of appearance.
#[must_use]
pub fn extract_hashtags(text: &str) -> Vec<String> {
    static HASHTAG: OnceLock<Regex> = OnceLock::new();
    let re = HASHTAG.get_or_init(|| Regex::new(r"#\w+").expect("hashtag pattern is valid"));
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Total time to publish on `platform_count` platforms with `delay` between them.
#[must_use]
pub fn estimate_publish_time(platform_count: usize, delay: Duration) -> Duration {
    if platform_count == 0 {
        return Duration::ZERO;
    }
    let count = u32::try_from(platform_count).unwrap_or(u32::MAX);
    TIME_PER_PLATFORM * count + delay * (count - 1)
}

/// Usual best local posting time (`HH:MM`) for a platform.
#[must_use]
pub fn optimal_posting_time(platform: Platform) -> &'static str {
    match platform {
        Platform::LinkedIn => "10:00",
        Platform::Instagram => "11:00",
        Platform::Facebook => "13:00",
        Platform::Twitter => "09:00",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate_for_twitter("Hello #world", 280), "Hello #world");
        assert_eq!(
            format_text_for_platform("Hello #world", Platform::Twitter),
            "Hello #world"
        );
    }

    #[test]
    fn test_truncate_without_spaces() {
        let text = "a".repeat(300);
        let out = truncate_for_twitter(&text, 280);
        assert_eq!(out.chars().count(), 280);
        assert!(out.ends_with("..."));
        assert_eq!(&out[..277], &text[..277]);
    }

    #[test]
    fn test_truncate_at_late_word_boundary() {
        let text = format!("{} {}", "a".repeat(250), "b".repeat(60));
        let out = truncate_for_twitter(&text, 280);
        assert_eq!(out, format!("{}...", "a".repeat(250)));
    }

    #[test]
    fn test_early_space_is_ignored() {
        let text = format!("{} {}", "a".repeat(100), "b".repeat(300));
        let out = truncate_for_twitter(&text, 280);
        assert_eq!(out.chars().count(), 280);
        assert!(out.starts_with(&"a".repeat(100)));
    }

    #[test]
    fn test_truncate_is_idempotent() {
        let words = "lorem ipsum dolor sit amet ".repeat(20);
        let once = truncate_for_twitter(&words, 280);
        assert!(once.chars().count() <= 280);
        assert_eq!(truncate_for_twitter(&once, 280), once);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "é".repeat(300);
        let out = truncate_for_twitter(&text, 280);
        assert_eq!(out.chars().count(), 280);
    }

    #[test]
    fn test_instagram_limit_and_blank_lines() {
        let long = "x".repeat(2500);
        let out = format_text_for_platform(&long, Platform::Instagram);
        assert_eq!(out.chars().count(), 2200);
        assert!(out.ends_with("..."));

        assert_eq!(
            format_text_for_platform("a\n\nb", Platform::Instagram),
            "a\nb"
        );
        assert_eq!(format_text_for_platform("a\n\nb", Platform::LinkedIn), "a\n\nb");
    }

    #[test]
    fn test_extract_hashtags() {
        assert_eq!(
            extract_hashtags("Hello #world and #rust_lang!"),
            vec!["#world".to_string(), "#rust_lang".to_string()]
        );
        assert!(extract_hashtags("no tags").is_empty());
    }

    #[test]
    fn test_estimate_publish_time() {
        let delay = Duration::from_secs(300);
        assert_eq!(estimate_publish_time(0, delay), Duration::ZERO);
        assert_eq!(estimate_publish_time(1, delay), Duration::from_secs(60));
        assert_eq!(estimate_publish_time(4, delay), Duration::from_secs(240 + 900));
    }
}
