//! Legacy inline color codes.
//!
//! Legacy text marks colors with a section sign followed by a code
//! character; rule authors write the friendlier `&` form, which is
//! translated at replacement time.

use fancy_regex::Regex;
use once_cell::sync::Lazy;
use tracing::warn;

/// The color marker character of the legacy text format.
pub const SECTION: char = '\u{00a7}';

/// Matches a section-sign color or format code.
static COLOR_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new("(?i)\u{00a7}([0-9A-FK-ORX])").expect("color code pattern is valid")
});

fn is_code_char(c: char) -> bool {
    c.is_ascii_hexdigit() || matches!(c.to_ascii_lowercase(), 'k'..='o' | 'r' | 'x')
}

/// Translate `&`-prefixed color codes into section-sign codes.
///
/// Only `&` followed by a valid code character is translated; any other
/// `&` passes through untouched.
pub fn translate_ampersand(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '&' && i + 1 < chars.len() && is_code_char(chars[i + 1]) {
            out.push(SECTION);
            out.push(chars[i + 1].to_ascii_lowercase());
            i += 2;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

fn replace_codes(text: &str, replacement: &str) -> String {
    match COLOR_CODE.is_match(text) {
        Ok(true) => COLOR_CODE.replace_all(text, replacement).into_owned(),
        Ok(false) => text.to_string(),
        Err(e) => {
            warn!("Color code scan failed: {}", e);
            text.to_string()
        }
    }
}

/// Render section-sign codes back as `&` codes for display.
pub fn to_ampersand(text: &str) -> String {
    replace_codes(text, "&$1")
}

/// Strip all color and format codes.
pub fn strip_codes(text: &str) -> String {
    replace_codes(text, "")
}

/// Whether the text contains any section-sign codes.
pub fn contains_codes(text: &str) -> bool {
    COLOR_CODE.is_match(text).unwrap_or(false)
}

/// The component color name for a color code character, if it is one.
pub fn color_name(code: char) -> Option<&'static str> {
    match code.to_ascii_lowercase() {
        '0' => Some("black"),
        '1' => Some("dark_blue"),
        '2' => Some("dark_green"),
        '3' => Some("dark_aqua"),
        '4' => Some("dark_red"),
        '5' => Some("dark_purple"),
        '6' => Some("gold"),
        '7' => Some("gray"),
        '8' => Some("dark_gray"),
        '9' => Some("blue"),
        'a' => Some("green"),
        'b' => Some("aqua"),
        'c' => Some("red"),
        'd' => Some("light_purple"),
        'e' => Some("yellow"),
        'f' => Some("white"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_ampersand() {
        assert_eq!(translate_ampersand("&aHello"), "\u{00a7}aHello");
        assert_eq!(translate_ampersand("&a&lBig"), "\u{00a7}a\u{00a7}lBig");
        assert_eq!(translate_ampersand("5 & 6"), "5 & 6");
        assert_eq!(translate_ampersand("ends with &"), "ends with &");
    }

    #[test]
    fn test_translate_uppercase_code() {
        assert_eq!(translate_ampersand("&CAlert"), "\u{00a7}cAlert");
    }

    #[test]
    fn test_to_ampersand_round_trip() {
        let section = translate_ampersand("&eSun &7set");
        assert_eq!(to_ampersand(&section), "&eSun &7set");
    }

    #[test]
    fn test_strip_codes() {
        assert_eq!(strip_codes("\u{00a7}aHello \u{00a7}lworld"), "Hello world");
        assert_eq!(strip_codes("plain"), "plain");
    }

    #[test]
    fn test_contains_codes() {
        assert!(contains_codes("\u{00a7}cred"));
        assert!(!contains_codes("no codes"));
    }
}
