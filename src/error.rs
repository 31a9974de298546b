//! Error types for sqlstencil.

use thiserror::Error;

/// The main error type for templating and rendering operations.
///
/// Rendering errors carry the offending template text and the byte offset
/// the renderer had reached, so the message alone is enough to locate the
/// bad placeholder. Every error is fail-fast: the render aborts and no
/// partial output is returned.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Malformed placeholder syntax: an unknown `%` code, a truncated
    /// two-character code, or a template ending with a bare `%`.
    #[error("Parse error at offset {offset}: {message}; query: {query}")]
    Parse {
        query: String,
        offset: usize,
        message: String,
    },

    /// A literal `;`, `'`, `"` or backtick appeared in safe-mode template
    /// text. These characters may only enter the rendered output through
    /// the escaping/quoting machinery, never from the template itself.
    #[error("Saw dangerous characters in SQL query at offset {offset}; query: {query}")]
    UnsafeTemplateRejected { query: String, offset: usize },

    /// The template had more value-consuming placeholders than arguments.
    #[error("Too few parameters for query at offset {offset}; query: {query}")]
    TooFewParameters { query: String, offset: usize },

    /// Arguments were left over after the template was fully scanned.
    #[error("Too many parameters specified for query; query: {query}")]
    TooManyParameters { query: String },

    /// An argument's active variant does not match its placeholder code.
    #[error("Invalid value type {actual} for format %{code} at offset {offset}; query: {query}")]
    TypeMismatch {
        query: String,
        offset: usize,
        code: char,
        actual: &'static str,
    },

    /// A placeholder needed a list or pair-list the argument doesn't hold,
    /// or `%V` rows disagreed on column count.
    #[error("{message} at offset {offset}; query: {query}")]
    ShapeMismatch {
        query: String,
        offset: usize,
        message: String,
    },

    /// A typed accessor was called on an argument holding another variant.
    #[error("Expected {expected} argument, got {actual}")]
    AccessorMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Display-text conversion requested for a variant that has none.
    #[error("Only bool, int, double and string arguments convert to text; got {actual}")]
    UnsupportedConversion { actual: &'static str },

    /// A dynamic (JSON) value has no defined argument mapping.
    #[error("Dynamic value has no argument mapping: {message}")]
    UnsupportedDynamicType { message: String },
}

impl QueryError {
    /// Create a parse error at the given byte offset of `query`.
    pub(crate) fn parse(query: &str, offset: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            query: query.to_string(),
            offset,
            message: message.into(),
        }
    }

    /// Create a shape error at the given byte offset of `query`.
    pub(crate) fn shape(query: &str, offset: usize, message: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            query: query.to_string(),
            offset,
            message: message.into(),
        }
    }

    /// Create a placeholder/value type mismatch error.
    pub(crate) fn type_mismatch(
        query: &str,
        offset: usize,
        code: char,
        actual: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            query: query.to_string(),
            offset,
            code,
            actual,
        }
    }
}

/// Result type alias for templating operations.
pub type QueryResult<T> = Result<T, QueryError>;
