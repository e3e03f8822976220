// Tue Jan 13 2026 - Alex

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern", "false", "fn",
    "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "self",
    "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where", "while", "abstract", "become",
    "box", "do", "final", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

pub struct StringUtils;

impl StringUtils {
    /// `NumKeys` -> `num_keys`, `PageID` -> `page_id`, `HTTPHeader` -> `http_header`.
    pub fn snake_case(s: &str) -> String {
        let chars: Vec<char> = s.chars().collect();
        let mut result = String::with_capacity(s.len() + 4);

        for (i, &c) in chars.iter().enumerate() {
            if c.is_uppercase() {
                let prev = if i > 0 { Some(chars[i - 1]) } else { None };
                let next = chars.get(i + 1).copied();
                let boundary = match prev {
                    Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                    Some(p) if p.is_uppercase() => next.map(|n| n.is_lowercase()).unwrap_or(false),
                    _ => false,
                };
                if boundary && !result.ends_with('_') {
                    result.push('_');
                }
                result.extend(c.to_lowercase());
            } else if c == ' ' || c == '-' {
                result.push('_');
            } else {
                result.push(c);
            }
        }

        result
    }

    pub fn is_valid_identifier(s: &str) -> bool {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) if first.is_alphabetic() || first == '_' => {
                chars.all(|c| c.is_alphanumeric() || c == '_')
            }
            _ => false,
        }
    }

    pub fn sanitize_identifier(s: &str) -> String {
        let mut result: String = s
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect();

        if result.chars().next().map(|c| c.is_numeric()).unwrap_or(true) {
            result = format!("_{}", result);
        }

        result
    }

    pub fn is_keyword(s: &str) -> bool {
        RUST_KEYWORDS.contains(&s)
    }

    /// Snake-cased, sanitized identifier, raw-escaped when it collides with a keyword.
    pub fn field_ident(s: &str) -> String {
        let ident = Self::sanitize_identifier(&Self::snake_case(s));
        match ident.as_str() {
            "self" | "super" | "crate" | "Self" => format!("{}_", ident),
            _ if Self::is_keyword(&ident) => format!("r#{}", ident),
            _ => ident,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(StringUtils::snake_case("NumKeys"), "num_keys");
        assert_eq!(StringUtils::snake_case("PageID"), "page_id");
        assert_eq!(StringUtils::snake_case("HTTPHeader"), "http_header");
        assert_eq!(StringUtils::snake_case("Key2Offset"), "key2_offset");
        assert_eq!(StringUtils::snake_case("already_snake"), "already_snake");
        assert_eq!(StringUtils::snake_case("Body"), "body");
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(StringUtils::sanitize_identifier("my-field"), "my_field");
        assert_eq!(StringUtils::sanitize_identifier("9lives"), "_9lives");
        assert_eq!(StringUtils::sanitize_identifier(""), "_");
        assert!(StringUtils::is_valid_identifier("Header"));
        assert!(!StringUtils::is_valid_identifier("1x"));
    }

    #[test]
    fn test_field_ident_escapes_keywords() {
        assert_eq!(StringUtils::field_ident("Type"), "r#type");
        assert_eq!(StringUtils::field_ident("Self"), "self_");
        assert_eq!(StringUtils::field_ident("Footer"), "footer");
    }
}
