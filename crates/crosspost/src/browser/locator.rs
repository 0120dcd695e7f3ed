//! Tagged locator variants for finding one control on an unstable page.

use std::fmt;

/// Which match to keep when several elements qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pick {
    /// First match in document order.
    #[default]
    First,
    /// Last match in document order (composer dialogs render on top).
    Last,
}

/// One way of locating a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Any element matching a CSS selector.
    Structural { css: String, pick: Pick },
    /// Element matching `scope` whose normalized text contains `text`.
    TextMatch {
        scope: String,
        text: String,
        pick: Pick,
    },
    /// Element whose `aria-label` equals (or contains) `label`.
    AriaLabel {
        label: String,
        exact: bool,
        pick: Pick,
    },
    /// Free-text scan over interactive elements for any of the keywords.
    ScriptProbe { keywords: Vec<String> },
}

impl Locator {
    /// Structural CSS selector.
    pub fn css(css: impl Into<String>) -> Self {
        Self::Structural {
            css: css.into(),
            pick: Pick::First,
        }
    }

    /// Element in `scope` whose text contains `text`.
    pub fn text(scope: impl Into<String>, text: impl Into<String>) -> Self {
        Self::TextMatch {
            scope: scope.into(),
            text: text.into(),
            pick: Pick::First,
        }
    }

    /// Exact `aria-label` match.
    pub fn aria(label: impl Into<String>) -> Self {
        Self::AriaLabel {
            label: label.into(),
            exact: true,
            pick: Pick::First,
        }
    }

    /// Substring `aria-label` match.
    pub fn aria_contains(label: impl Into<String>) -> Self {
        Self::AriaLabel {
            label: label.into(),
            exact: false,
            pick: Pick::First,
        }
    }

    /// Free-text probe over buttons, links and submit inputs.
    pub fn probe<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ScriptProbe {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// Keep the last match instead of the first.
    #[must_use]
    pub fn last(self) -> Self {
        match self {
            Self::Structural { css, .. } => Self::Structural {
                css,
                pick: Pick::Last,
            },
            Self::TextMatch { scope, text, .. } => Self::TextMatch {
                scope,
                text,
                pick: Pick::Last,
            },
            Self::AriaLabel { label, exact, .. } => Self::AriaLabel {
                label,
                exact,
                pick: Pick::Last,
            },
            probe @ Self::ScriptProbe { .. } => probe,
        }
    }

    /// Match selection mode.
    #[must_use]
    pub fn pick(&self) -> Pick {
        match self {
            Self::Structural { pick, .. }
            | Self::TextMatch { pick, .. }
            | Self::AriaLabel { pick, .. } => *pick,
            Self::ScriptProbe { .. } => Pick::First,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural { css, .. } => write!(f, "css({css})")?,
            Self::TextMatch { scope, text, .. } => write!(f, "text({scope} ~ {text:?})")?,
            Self::AriaLabel { label, exact, .. } => {
                let op = if *exact { "=" } else { "*=" };
                write!(f, "aria{op}({label:?})")?;
            }
            Self::ScriptProbe { keywords } => write!(f, "probe[{}]", keywords.join(", "))?,
        }
        if self.pick() == Pick::Last {
            f.write_str(":last")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_stable() {
        assert_eq!(
            Locator::css("button[type=\"submit\"]").to_string(),
            "css(button[type=\"submit\"])"
        );
        assert_eq!(
            Locator::text("button", "Next").to_string(),
            "text(button ~ \"Next\")"
        );
        assert_eq!(Locator::aria("Close").to_string(), "aria=(\"Close\")");
        assert_eq!(
            Locator::aria_contains("Start a post").to_string(),
            "aria*=(\"Start a post\")"
        );
        assert_eq!(
            Locator::probe(["Post", "Publier"]).to_string(),
            "probe[Post, Publier]"
        );
    }

    #[test]
    fn test_last_pick() {
        let locator = Locator::css("div[role=\"button\"]").last();
        assert_eq!(locator.pick(), Pick::Last);
        assert!(locator.to_string().ends_with(":last"));

        let probe = Locator::probe(["Post"]).last();
        assert_eq!(probe.pick(), Pick::First);
    }
}
