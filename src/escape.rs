//! The escaping collaborator used by the renderer.
//!
//! The renderer never invents quoting rules of its own: every string
//! literal is handed to a connection-bound [`Escaper`] so escaping can
//! follow the connection's active character set. When no connection is
//! available the raw text passes through unmodified, which is only
//! acceptable for offline rendering and tests.

use tracing::debug;

/// A connection-bound string escaper.
///
/// Implemented by whatever stands in for the live database connection.
/// Output is at most `2 * input + 1` bytes.
pub trait Escaper {
    /// Escape `raw` for inclusion inside a quoted SQL string literal.
    fn escape_string(&self, raw: &str) -> String;
}

/// Escaper applying the MySQL C API rules for the default character set.
///
/// Good enough for offline rendering and tests. Production clients should
/// implement [`Escaper`] on their connection handle so escaping tracks the
/// connection's character set.
#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlEscaper;

impl Escaper for MysqlEscaper {
    fn escape_string(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len() * 2 + 1);
        for c in raw.chars() {
            match c {
                '\0' => out.push_str("\\0"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\x1a' => out.push_str("\\Z"),
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                c => out.push(c),
            }
        }
        out
    }
}

/// Escape `value` into `dest`, or copy it through unmodified when no
/// connection is available.
pub(crate) fn append_escaped(dest: &mut String, value: &str, conn: Option<&dyn Escaper>) {
    match conn {
        Some(escaper) => dest.push_str(&escaper.escape_string(value)),
        None => {
            debug!("connectionless escape performed; this should only occur in testing");
            dest.push_str(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_escaper_quotes_and_controls() {
        let escaper = MysqlEscaper;
        assert_eq!(escaper.escape_string("a'b"), "a\\'b");
        assert_eq!(escaper.escape_string("a\"b"), "a\\\"b");
        assert_eq!(escaper.escape_string("a\\b"), "a\\\\b");
        assert_eq!(escaper.escape_string("a\nb\r\0"), "a\\nb\\r\\0");
        assert_eq!(escaper.escape_string("plain"), "plain");
    }

    #[test]
    fn test_connectionless_passthrough() {
        let mut out = String::new();
        append_escaped(&mut out, "a'b", None);
        assert_eq!(out, "a'b");
    }
}
