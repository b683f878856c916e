//! Pattern-based edit rules.

pub mod placeholder;

use fancy_regex::Regex;
use tracing::warn;

use crate::config::types::RuleConfig;
use crate::surface::Surface;

/// A pattern-to-replacement mapping, optionally scoped to a source surface
/// and optionally relocating matches to a destination surface.
///
/// Rules are immutable after construction; the rule list grows by
/// copy-on-append, never by in-place edits. Matching is first-match-wins
/// in list order.
#[derive(Debug)]
pub struct EditRule {
    pattern: String,
    /// The compiled pattern, anchored so a rule matches a whole message.
    matcher: Regex,
    source: Option<Surface>,
    replacement: String,
    destination: Option<Surface>,
}

impl EditRule {
    pub fn new(
        pattern: &str,
        source: Option<Surface>,
        replacement: impl Into<String>,
        destination: Option<Surface>,
    ) -> Result<Self, fancy_regex::Error> {
        let matcher = Regex::new(&format!("^(?:{})$", pattern))?;
        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
            source,
            replacement: replacement.into(),
            destination,
        })
    }

    pub fn from_config(config: &RuleConfig) -> Result<Self, String> {
        let source = resolve_surface(config.source_surface.as_deref())?;
        let destination = resolve_surface(config.destination_surface.as_deref())?;
        Self::new(&config.pattern, source, config.replacement.clone(), destination)
            .map_err(|e| format!("invalid pattern '{}': {}", config.pattern, e))
    }

    pub fn to_config(&self) -> RuleConfig {
        RuleConfig {
            pattern: self.pattern.clone(),
            source_surface: self.source.map(|s| s.friendly_name().to_string()),
            replacement: self.replacement.clone(),
            destination_surface: self.destination.map(|s| s.friendly_name().to_string()),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn source(&self) -> Option<Surface> {
        self.source
    }

    pub fn destination(&self) -> Option<Surface> {
        self.destination
    }

    /// Whether this rule applies to a message on the given surface.
    pub fn matches(&self, surface: Surface, text: &str) -> bool {
        if let Some(source) = self.source {
            if source != surface {
                return false;
            }
        }
        self.matcher.is_match(text).unwrap_or_else(|e| {
            warn!("Match failed for pattern '{}': {}", self.pattern, e);
            false
        })
    }

    /// Substitute the replacement template over a matching message.
    ///
    /// Returns `None` when the rule does not apply. The result is the raw
    /// template expansion; color and placeholder expansion belong to the
    /// caller.
    pub fn rewrite(&self, surface: Surface, text: &str) -> Option<String> {
        if !self.matches(surface, text) {
            return None;
        }
        Some(
            self.matcher
                .replace_all(text, self.replacement.as_str())
                .into_owned(),
        )
    }
}

fn resolve_surface(name: Option<&str>) -> Result<Option<Surface>, String> {
    match name {
        None => Ok(None),
        Some(name) => Surface::from_name(name)
            .map(Some)
            .ok_or_else(|| format!("unknown surface '{}'", name)),
    }
}

/// Escape text so it matches itself as a pattern.
pub fn escape_pattern(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '.' | '[' | ']' | '{' | '}' | '(' | ')' | '*' | '+' | '-' | '?' | '^' | '$'
                | '|'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_match_only() {
        let rule = EditRule::new("Hel+o", None, "Goodbye", None).unwrap();
        assert!(rule.matches(Surface::PrimaryChat, "Hello"));
        assert!(rule.matches(Surface::PrimaryChat, "Helllllo"));
        assert!(!rule.matches(Surface::PrimaryChat, "Hello there"));
    }

    #[test]
    fn test_source_constraint() {
        let rule =
            EditRule::new("Hello", Some(Surface::SystemChat), "Hi", None).unwrap();
        assert!(rule.matches(Surface::SystemChat, "Hello"));
        assert!(!rule.matches(Surface::PrimaryChat, "Hello"));
    }

    #[test]
    fn test_rewrite_group_references() {
        let rule = EditRule::new("(\\w+) joined", None, "Welcome, $1!", None).unwrap();
        assert_eq!(
            rule.rewrite(Surface::SystemChat, "Steve joined"),
            Some("Welcome, Steve!".to_string())
        );
        assert_eq!(rule.rewrite(Surface::SystemChat, "Steve left"), None);
    }

    #[test]
    fn test_rewrite_to_empty() {
        let rule = EditRule::new("spam.*", None, "", None).unwrap();
        assert_eq!(
            rule.rewrite(Surface::PrimaryChat, "spam spam"),
            Some(String::new())
        );
    }

    #[test]
    fn test_lookahead_pattern() {
        // fancy-regex territory: rules in the wild use look-around.
        let rule = EditRule::new("(?!Admin).* joined", None, "someone joined", None).unwrap();
        assert!(rule.matches(Surface::SystemChat, "Steve joined"));
        assert!(!rule.matches(Surface::SystemChat, "Admin joined"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(EditRule::new("[oops", None, "x", None).is_err());
    }

    #[test]
    fn test_escape_pattern_matches_itself() {
        let text = "Use /help (page 1-3)? [yes|no] *$^";
        let escaped = escape_pattern(text);
        let rule = EditRule::new(&escaped, None, "ok", None).unwrap();
        assert!(rule.matches(Surface::PrimaryChat, text));
        assert!(!rule.matches(Surface::PrimaryChat, "Use /help page 1"));
    }

    #[test]
    fn test_config_round_trip() {
        let rule = EditRule::new(
            "Hello",
            Some(Surface::PrimaryChat),
            "Hi",
            Some(Surface::ActionBar),
        )
        .unwrap();
        let config = rule.to_config();
        assert_eq!(config.source_surface.as_deref(), Some("Primary Chat"));
        let back = EditRule::from_config(&config).unwrap();
        assert_eq!(back.pattern(), "Hello");
        assert_eq!(back.destination(), Some(Surface::ActionBar));
    }

    #[test]
    fn test_from_config_unknown_surface() {
        let config = RuleConfig {
            pattern: "x".to_string(),
            source_surface: Some("hotbar".to_string()),
            replacement: "y".to_string(),
            destination_surface: None,
        };
        assert!(EditRule::from_config(&config).is_err());
    }
}
