use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref FOURCC:     Regex = Regex::new(r"^[ !#-&(-\[\]-~]{4}$").unwrap();
}

/// Quote `text` as a double-quoted C/C# string literal.
pub fn quote(text: &str) -> String {
    match serde_json::to_string(text) {
        Ok(quoted) => quoted,
        Err(_) => format!("\"{}\"", text),
    }
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().to_string() + chars.as_str(),
    }
}

pub fn is_identifier(s: &str) -> bool {
    IDENTIFIER.is_match(s)
}

/// Four printable ASCII characters, excluding quote and backslash so the tag
/// can be written as a multi-character literal.
pub fn is_fourcc(s: &str) -> bool {
    FOURCC.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
    }

    #[test]
    fn capitalize_first_letter_only() {
        assert_eq!(capitalize("lightType"), "LightType");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("X"), "X");
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("Transform"));
        assert!(is_identifier("_private9"));
        assert!(!is_identifier("9lives"));
        assert!(!is_identifier("has space"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn fourcc_tags() {
        assert!(is_fourcc("LRAD"));
        assert!(is_fourcc("tStr"));
        assert!(is_fourcc("a b!"));
        assert!(!is_fourcc("ABC"));
        assert!(!is_fourcc("ABCDE"));
        assert!(!is_fourcc("AB'C"));
        assert!(!is_fourcc("AB\\C"));
    }
}
