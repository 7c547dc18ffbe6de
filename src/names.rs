//! Identifier mangling and object-key formatting.
//!
//! Every symbol that reaches the output passes through [`validate_name`]:
//! anything outside `[A-Za-z0-9$_.&]` and code points up to 255 is spelled
//! `_$<code>_`, and a name that would start like a number gets a leading
//! underscore. The mapping is deterministic, so the same symbol always
//! yields the same identifier.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static NUMERIC_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)|0[xX][0-9a-fA-F]+|0[oO][0-7]+|0[bB][01]+)$",
    )
    .expect("numeric literal pattern compiles")
});

/// True when the host would read `text` as a number (blank text reads as 0).
///
/// ```rust
/// use lisp2js::names::is_numeric;
/// assert!(is_numeric("12"));
/// assert!(is_numeric("0x12"));
/// assert!(is_numeric("-1.5e3"));
/// assert!(!is_numeric("x12"));
/// assert!(!is_numeric("-"));
/// ```
pub fn is_numeric(text: &str) -> bool {
    let trimmed = text.trim_matches(is_host_whitespace);
    trimmed.is_empty() || NUMERIC_LITERAL.is_match(trimmed)
}

fn is_host_whitespace(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '$' | '_' | '.' | '&') || u32::from(c) > 255
}

/// Maps a symbol to a host-legal identifier.
///
/// ```rust
/// use lisp2js::names::validate_name;
/// assert_eq!(validate_name("add"), "add");
/// assert_eq!(validate_name("a-b"), "a_$45_b");
/// assert_eq!(validate_name("1st"), "_1st");
/// ```
pub fn validate_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if is_identifier_char(c) {
            out.push(c);
        } else {
            out.push_str(&format!("_${}_", u32::from(c)));
        }
    }
    if out.chars().next().is_some_and(|c| is_numeric(&c.to_string())) {
        out.insert(0, '_');
    }
    out
}

/// How an atom is spelled in output: symbols are validated, while numbers,
/// string literals, `:keywords` and `'`-prefixed atoms pass through.
pub fn atom_text(atom: &str) -> Cow<'_, str> {
    let literal = atom.is_empty()
        || is_numeric(atom)
        || atom.starts_with(['\'', '"', ':']);
    if literal {
        Cow::Borrowed(atom)
    } else {
        Cow::Owned(validate_name(atom))
    }
}

/// True when `name` survives [`validate_name`] unchanged and is not a number.
pub fn is_plain_identifier(name: &str) -> bool {
    validate_name(name) == name && !is_numeric(name)
}

/// Object-literal key: bare when it is already a plain identifier, quoted otherwise.
pub fn format_key(key: &str) -> String {
    if is_plain_identifier(key) {
        key.to_string()
    } else {
        format!("\"{}\"", key)
    }
}

/// Property access suffix for a compiled key: `.name` when the key is a
/// string literal or `.name` token spelling a plain identifier, `[key]`
/// for everything else.
pub fn format_key_for_object(key: &str) -> String {
    let inner = if let Some(rest) = key.strip_prefix('.') {
        Some(rest)
    } else if let Some(rest) = key.strip_prefix('"') {
        Some(drop_last_char(rest))
    } else {
        None
    };
    match inner {
        Some(name) if is_plain_identifier(name) => format!(".{}", name),
        _ => format!("[{}]", key),
    }
}

fn drop_last_char(text: &str) -> &str {
    match text.char_indices().next_back() {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mangles_punctuation_by_code_point() {
        assert_eq!(
            validate_name("->this*name$invalid@in*js"),
            "_$45__$62_this_$42_name$invalid_$64_in_$42_js"
        );
        assert_eq!(validate_name("**"), "_$42__$42_");
        assert_eq!(validate_name("this.x"), "this.x");
        assert_eq!(validate_name("&"), "&");
        assert_eq!(validate_name("λx"), "λx");
    }

    #[test]
    fn leading_digit_gets_underscore() {
        assert_eq!(validate_name("9lives"), "_9lives");
        assert_eq!(validate_name("$9"), "$9");
        assert_eq!(validate_name(""), "");
    }

    #[test]
    fn numeric_literals_follow_host_rules() {
        for text in ["0", "12", "1.", ".5", "+3", "1e10", "0b101", "0o17", "Infinity", ""] {
            assert!(is_numeric(text), "{text} should be numeric");
        }
        for text in ["abc", "1a", "0x", "--1", ".", "e5", "NaN", "1_000"] {
            assert!(!is_numeric(text), "{text} should not be numeric");
        }
    }

    #[test]
    fn atoms_pass_literals_through() {
        assert_eq!(atom_text("0x12"), "0x12");
        assert_eq!(atom_text("\"a-b\""), "\"a-b\"");
        assert_eq!(atom_text(":key-word"), ":key-word");
        assert_eq!(atom_text("a-b"), "a_$45_b");
        assert_eq!(atom_text("true"), "true");
    }

    #[test]
    fn keys_for_object_literals() {
        assert_eq!(format_key("name"), "name");
        assert_eq!(format_key("a-b"), "\"a-b\"");
        assert_eq!(format_key("12"), "\"12\"");
    }

    #[test]
    fn keys_for_property_access() {
        assert_eq!(format_key_for_object("\"length\""), ".length");
        assert_eq!(format_key_for_object(".log"), ".log");
        assert_eq!(format_key_for_object("length"), "[length]");
        assert_eq!(format_key_for_object("0"), "[0]");
        assert_eq!(format_key_for_object("\"a b\""), "[\"a b\"]");
        assert_eq!(format_key_for_object("\"\""), "[\"\"]");
    }
}
