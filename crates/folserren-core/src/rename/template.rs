//! Name templates for serial numbering.
//!
//! A template either contains an index placeholder and is used as is, or is
//! a plain prefix that gets a zero-padded index appended. The placeholder
//! grammar is
//!
//! ```text
//! {i}
//! {i:[[fill]align][0]width base}
//! ```
//!
//! where `align` is `>` or `=`, `width` starts with a non-zero digit and
//! `base` is one of `d`, `x`, `X`, `b`. Left (`<`) and centre (`^`)
//! alignment are not placeholders, so such a template counts as a prefix.

use std::sync::OnceLock;

use regex::{Captures, Regex};

const PLACEHOLDER: &str =
    r"\{i(?::(?:(?P<fill>[^{}<>^=])?(?P<align>[>=]))?(?P<zero>0)?(?P<width>[1-9][0-9]*)(?P<base>[dxXb]))?\}";

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PLACEHOLDER).expect("placeholder pattern is valid"))
}

/// A user-supplied naming template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTemplate {
    /// Contains at least one index placeholder.
    Complete(String),
    /// Literal text that precedes a default zero-padded index.
    Prefix(String),
}

impl NameTemplate {
    pub fn parse(template: &str) -> Self {
        if placeholder().is_match(template) {
            NameTemplate::Complete(template.to_string())
        } else {
            NameTemplate::Prefix(template.to_string())
        }
    }

    /// Produces the concrete pattern for a group numbered with `width` digits.
    pub fn resolve(&self, width: usize) -> String {
        match self {
            NameTemplate::Complete(template) => template.clone(),
            NameTemplate::Prefix(prefix) => format!("{prefix}{}", default_pattern(width)),
        }
    }
}

/// Resolves an optional template, falling back to a bare zero-padded index.
pub fn resolve(template: Option<&NameTemplate>, width: usize) -> String {
    match template {
        Some(template) => template.resolve(width),
        None => default_pattern(width),
    }
}

fn default_pattern(width: usize) -> String {
    format!("{{i:0{width}d}}")
}

/// Substitutes `index` into every placeholder of `pattern`.
pub fn render(pattern: &str, index: usize) -> String {
    placeholder()
        .replace_all(pattern, |caps: &Captures<'_>| format_index(caps, index))
        .into_owned()
}

fn format_index(caps: &Captures<'_>, index: usize) -> String {
    let digits = match caps.name("base").map(|m| m.as_str()) {
        Some("x") => format!("{index:x}"),
        Some("X") => format!("{index:X}"),
        Some("b") => format!("{index:b}"),
        _ => index.to_string(),
    };
    let width = caps
        .name("width")
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .unwrap_or(0);
    let fill = match (caps.name("fill"), caps.name("zero")) {
        (Some(fill), _) => fill.as_str().chars().next().unwrap_or(' '),
        (None, Some(_)) => '0',
        (None, None) => ' ',
    };

    let len = digits.chars().count();
    if len >= width {
        return digits;
    }
    let mut padded: String = std::iter::repeat(fill).take(width - len).collect();
    padded.push_str(&digits);
    padded
}

/// Number of decimal digits in `n`. Zero counts as one digit.
pub fn digit_count(n: usize) -> usize {
    let mut n = n;
    let mut digits = 0;
    loop {
        n /= 10;
        digits += 1;
        if n == 0 {
            return digits;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_count_boundaries() {
        assert_eq!(digit_count(0), 1);
        assert_eq!(digit_count(1), 1);
        assert_eq!(digit_count(9), 1);
        assert_eq!(digit_count(10), 2);
        assert_eq!(digit_count(99), 2);
        assert_eq!(digit_count(100), 3);
        assert_eq!(digit_count(12_345), 5);
    }

    #[test]
    fn parse_recognises_placeholders() {
        for t in ["{i}", "img_{i}", "{i:03d}", "{i:>4d}", "{i:*>4d}", "{i:0=4d}", "{i:4x}", "{i:08b}", "v{i:2X}_final"] {
            assert!(
                matches!(NameTemplate::parse(t), NameTemplate::Complete(_)),
                "{t} should be complete"
            );
        }
    }

    #[test]
    fn parse_treats_everything_else_as_prefix() {
        for t in ["img_", "", "{j}", "{i:<4d}", "{i:^4d}", "{i:0d}", "{i:3}", "{i"] {
            assert_eq!(
                NameTemplate::parse(t),
                NameTemplate::Prefix(t.to_string()),
                "{t} should be a prefix"
            );
        }
    }

    #[test]
    fn resolve_default_uses_width() {
        assert_eq!(resolve(None, 1), "{i:01d}");
        assert_eq!(resolve(None, 3), "{i:03d}");
    }

    #[test]
    fn resolve_prefix_appends_index() {
        let template = NameTemplate::parse("img_");

        assert_eq!(resolve(Some(&template), 2), "img_{i:02d}");
    }

    #[test]
    fn resolve_complete_is_verbatim() {
        let template = NameTemplate::parse("{i:05d}-scan");

        assert_eq!(resolve(Some(&template), 1), "{i:05d}-scan");
    }

    #[test]
    fn render_default_patterns() {
        assert_eq!(render("{i:01d}", 3), "3");
        assert_eq!(render("{i:02d}", 3), "03");
        assert_eq!(render("{i:02d}", 12), "12");
        assert_eq!(render("{i:02d}", 123), "123");
    }

    #[test]
    fn render_bases_and_fills() {
        assert_eq!(render("{i}", 7), "7");
        assert_eq!(render("{i:4x}", 255), "  ff");
        assert_eq!(render("{i:04X}", 255), "00FF");
        assert_eq!(render("{i:08b}", 5), "00000101");
        assert_eq!(render("{i:*>4d}", 5), "***5");
        assert_eq!(render("{i:>3d}", 5), "  5");
        assert_eq!(render("{i:0=3d}", 5), "005");
    }

    #[test]
    fn render_replaces_every_placeholder() {
        assert_eq!(render("{i}_of_{i:03d}", 4), "4_of_004");
    }

    #[test]
    fn render_keeps_literal_text() {
        assert_eq!(render("img_{i:02d}_raw", 9), "img_09_raw");
    }
}
