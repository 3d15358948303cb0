//! Statement building blocks.
//!
//! Redshift's `COPY` cannot take bind parameters, so every externally
//! supplied value reaches a statement through a validated type in
//! [`values`] and is rendered with [`quote_literal`].

pub mod values;

pub use values::{IamRoleArn, JsonFormat, Region, S3Uri};

/// Renders `value` as a Redshift string literal.
///
/// Redshift treats backslash as an escape character inside literals, so
/// both `\` and `'` are doubled.
pub fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        match ch {
            '\'' => quoted.push_str("''"),
            '\\' => quoted.push_str("\\\\"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('\'');
    quoted
}

/// Renders a double-quoted identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Strips one pair of matching surrounding quotes, as found in
/// hand-written `dwh.cfg` files (`LOG_DATA='s3://...'`).
pub(crate) fn unquote(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['\'', '"'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_escapes_quotes_and_backslashes() {
        assert_eq!(quote_literal("auto"), "'auto'");
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(quote_literal(r"a\b"), r"'a\\b'");
        assert_eq!(
            quote_literal("x'; DROP TABLE users; --"),
            "'x''; DROP TABLE users; --'"
        );
    }

    #[test]
    fn ident_is_double_quoted() {
        assert_eq!(quote_ident("songplay"), "\"songplay\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn unquote_strips_one_pair() {
        assert_eq!(unquote("'s3://bucket/key'"), "s3://bucket/key");
        assert_eq!(unquote("  \"auto\" "), "auto");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("'"), "'");
    }
}
