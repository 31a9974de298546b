//! The typed argument model fed to the template renderer.
//!
//! Every placeholder in a template consumes one [`QueryArgument`]. The type
//! is a closed sum: the renderer matches exhaustively, so there is no
//! "wrong accessor at runtime" failure mode hidden inside it.

use crate::error::{QueryError, QueryResult};
use crate::query::Query;

/// One typed operand for a template placeholder.
///
/// Collections nest: `List` holds arguments (including other lists, for
/// `%V` row sets), `Pairs` holds ordered key/value pairs (order preserved,
/// duplicate keys are legal pass-through).
#[derive(Debug, Clone, PartialEq)]
pub enum QueryArgument {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    /// Ordered sequence, used for IN-lists (`%Ld`/`%Ls`/`%Lf`/`%LC`) and
    /// bulk-insert rows and row sets (`%V`).
    List(Vec<QueryArgument>),
    /// Ordered key/value pairs, used for SET clauses (`%U`), WHERE
    /// equality clauses (`%W`, `%LO`, `%LA`) and row objects.
    Pairs(Vec<(String, QueryArgument)>),
    /// An embedded query, rendered inline in value positions. Not allowed
    /// inside `%V` rows.
    SubQuery(Box<Query>),
}

/// An empty pair list, ready for [`QueryArgument::append_pair`].
impl Default for QueryArgument {
    fn default() -> Self {
        QueryArgument::Pairs(Vec::new())
    }
}

impl QueryArgument {
    /// Stable lowercase kind name, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            QueryArgument::Null => "null",
            QueryArgument::Bool(_) => "bool",
            QueryArgument::Int(_) => "int",
            QueryArgument::Double(_) => "double",
            QueryArgument::String(_) => "string",
            QueryArgument::List(_) => "list",
            QueryArgument::Pairs(_) => "pairs",
            QueryArgument::SubQuery(_) => "query",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, QueryArgument::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, QueryArgument::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, QueryArgument::Int(_))
    }

    pub fn is_double(&self) -> bool {
        matches!(self, QueryArgument::Double(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, QueryArgument::String(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, QueryArgument::List(_))
    }

    pub fn is_pairs(&self) -> bool {
        matches!(self, QueryArgument::Pairs(_))
    }

    pub fn is_query(&self) -> bool {
        matches!(self, QueryArgument::SubQuery(_))
    }

    /// Get the bool value, or fail if another variant is active.
    pub fn get_bool(&self) -> QueryResult<bool> {
        match self {
            QueryArgument::Bool(b) => Ok(*b),
            other => Err(Self::mismatch("bool", other)),
        }
    }

    /// Get the integer value, or fail if another variant is active.
    pub fn get_int(&self) -> QueryResult<i64> {
        match self {
            QueryArgument::Int(i) => Ok(*i),
            other => Err(Self::mismatch("int", other)),
        }
    }

    /// Get the double value, or fail if another variant is active.
    pub fn get_double(&self) -> QueryResult<f64> {
        match self {
            QueryArgument::Double(f) => Ok(*f),
            other => Err(Self::mismatch("double", other)),
        }
    }

    /// Get the string value, or fail if another variant is active.
    pub fn get_string(&self) -> QueryResult<&str> {
        match self {
            QueryArgument::String(s) => Ok(s),
            other => Err(Self::mismatch("string", other)),
        }
    }

    /// Get the list elements, or fail if another variant is active.
    pub fn get_list(&self) -> QueryResult<&[QueryArgument]> {
        match self {
            QueryArgument::List(items) => Ok(items),
            other => Err(Self::mismatch("list", other)),
        }
    }

    /// Get the key/value pairs, or fail if another variant is active.
    pub fn get_pairs(&self) -> QueryResult<&[(String, QueryArgument)]> {
        match self {
            QueryArgument::Pairs(pairs) => Ok(pairs),
            other => Err(Self::mismatch("pairs", other)),
        }
    }

    /// Get the embedded query, or fail if another variant is active.
    pub fn get_query(&self) -> QueryResult<&Query> {
        match self {
            QueryArgument::SubQuery(query) => Ok(query),
            other => Err(Self::mismatch("query", other)),
        }
    }

    /// Canonical display text for scalar variants.
    ///
    /// Bools render as `1`/`0`, ints and doubles as decimal text, strings
    /// verbatim. Every other variant has no text form and fails.
    pub fn display_text(&self) -> QueryResult<String> {
        match self {
            QueryArgument::Bool(true) => Ok("1".to_string()),
            QueryArgument::Bool(false) => Ok("0".to_string()),
            QueryArgument::Int(i) => Ok(i.to_string()),
            QueryArgument::Double(f) => Ok(f.to_string()),
            QueryArgument::String(s) => Ok(s.clone()),
            other => Err(QueryError::UnsupportedConversion {
                actual: other.type_name(),
            }),
        }
    }

    /// Append a key/value pair to a `Pairs` argument.
    ///
    /// Valid only while the argument is a pair list (the [`Default`]
    /// state); any other variant fails loudly. Returns `&mut self` so
    /// appends can be chained when each step is checked.
    pub fn append_pair(
        &mut self,
        key: impl Into<String>,
        value: impl Into<QueryArgument>,
    ) -> QueryResult<&mut Self> {
        match self {
            QueryArgument::Pairs(pairs) => {
                pairs.push((key.into(), value.into()));
                Ok(self)
            }
            other => Err(Self::mismatch("pairs", other)),
        }
    }

    fn mismatch(expected: &'static str, actual: &QueryArgument) -> QueryError {
        QueryError::AccessorMismatch {
            expected,
            actual: actual.type_name(),
        }
    }
}

/// Fluent builder for `Pairs` arguments.
///
/// Accumulates pairs in call order and is converted into an immutable
/// [`QueryArgument`] on completion:
///
/// ```
/// use sqlstencil::prelude::*;
///
/// let row = PairsBuilder::new()
///     .pair("id", 7i64)
///     .pair("name", "alice")
///     .build();
/// assert!(row.is_pairs());
/// ```
#[derive(Debug, Default, Clone)]
pub struct PairsBuilder {
    pairs: Vec<(String, QueryArgument)>,
}

impl PairsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one key/value pair.
    pub fn pair(mut self, key: impl Into<String>, value: impl Into<QueryArgument>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Finish the builder into a `Pairs` argument.
    pub fn build(self) -> QueryArgument {
        QueryArgument::Pairs(self.pairs)
    }
}

impl From<PairsBuilder> for QueryArgument {
    fn from(builder: PairsBuilder) -> Self {
        builder.build()
    }
}

/// A caller-trusted, pre-rendered SQL fragment for `%Q`.
///
/// `%Q` appends its operand completely unescaped. Wrapping such fragments
/// in this type marks the trust decision at the call site instead of
/// letting an ordinary string slide into the escape hatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFragment(pub String);

impl From<RawFragment> for QueryArgument {
    fn from(raw: RawFragment) -> Self {
        QueryArgument::String(raw.0)
    }
}

impl From<bool> for QueryArgument {
    fn from(v: bool) -> Self {
        QueryArgument::Bool(v)
    }
}

impl From<i32> for QueryArgument {
    fn from(v: i32) -> Self {
        QueryArgument::Int(v as i64)
    }
}

impl From<i64> for QueryArgument {
    fn from(v: i64) -> Self {
        QueryArgument::Int(v)
    }
}

impl From<u32> for QueryArgument {
    fn from(v: u32) -> Self {
        QueryArgument::Int(v as i64)
    }
}

impl From<f64> for QueryArgument {
    fn from(v: f64) -> Self {
        QueryArgument::Double(v)
    }
}

impl From<&str> for QueryArgument {
    fn from(v: &str) -> Self {
        QueryArgument::String(v.to_string())
    }
}

impl From<String> for QueryArgument {
    fn from(v: String) -> Self {
        QueryArgument::String(v)
    }
}

impl From<Query> for QueryArgument {
    fn from(v: Query) -> Self {
        QueryArgument::SubQuery(Box::new(v))
    }
}

impl<T: Into<QueryArgument>> From<Vec<T>> for QueryArgument {
    fn from(v: Vec<T>) -> Self {
        QueryArgument::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<QueryArgument>> From<Option<T>> for QueryArgument {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(value) => value.into(),
            None => QueryArgument::Null,
        }
    }
}

impl TryFrom<&serde_json::Value> for QueryArgument {
    type Error = QueryError;

    /// Convert a dynamically typed JSON value into an argument.
    ///
    /// Objects become `Pairs` with keys sorted lexicographically; the sort
    /// happens once here, so the same logical object always renders to
    /// identical text. Arrays become `List`, scalars map one-to-one.
    /// Integers outside the i64 range and any other shape are rejected.
    fn try_from(value: &serde_json::Value) -> QueryResult<Self> {
        use serde_json::Value;

        Ok(match value {
            Value::Null => QueryArgument::Null,
            Value::Bool(b) => QueryArgument::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    QueryArgument::Int(i)
                } else if n.is_f64() {
                    QueryArgument::Double(n.as_f64().unwrap_or_default())
                } else {
                    return Err(QueryError::UnsupportedDynamicType {
                        message: format!("integer {n} does not fit in 64 bits"),
                    });
                }
            }
            Value::String(s) => QueryArgument::String(s.clone()),
            Value::Array(items) => QueryArgument::List(
                items
                    .iter()
                    .map(QueryArgument::try_from)
                    .collect::<QueryResult<_>>()?,
            ),
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                let mut pairs = Vec::with_capacity(keys.len());
                for key in keys {
                    pairs.push((key.clone(), QueryArgument::try_from(&map[key])?));
                }
                QueryArgument::Pairs(pairs)
            }
        })
    }
}

impl TryFrom<serde_json::Value> for QueryArgument {
    type Error = QueryError;

    fn try_from(value: serde_json::Value) -> QueryResult<Self> {
        QueryArgument::try_from(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_empty_pairs() {
        let arg = QueryArgument::default();
        assert!(arg.is_pairs());
        assert!(arg.get_pairs().unwrap().is_empty());
    }

    #[test]
    fn test_append_pair_chains() {
        let mut arg = QueryArgument::default();
        arg.append_pair("a", 1i64)
            .unwrap()
            .append_pair("b", "two")
            .unwrap();
        let pairs = arg.get_pairs().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, "a");
        assert_eq!(pairs[1].1, QueryArgument::String("two".to_string()));
    }

    #[test]
    fn test_append_pair_rejects_non_pairs() {
        let mut arg = QueryArgument::Int(1);
        let err = arg.append_pair("a", 1i64).unwrap_err();
        assert!(matches!(
            err,
            QueryError::AccessorMismatch {
                expected: "pairs",
                actual: "int"
            }
        ));
    }

    #[test]
    fn test_accessor_mismatch() {
        let arg = QueryArgument::String("x".to_string());
        assert!(arg.get_string().is_ok());
        let err = arg.get_double().unwrap_err();
        assert!(matches!(
            err,
            QueryError::AccessorMismatch {
                expected: "double",
                actual: "string"
            }
        ));
    }

    #[test]
    fn test_display_text_scalars() {
        assert_eq!(QueryArgument::Bool(true).display_text().unwrap(), "1");
        assert_eq!(QueryArgument::Bool(false).display_text().unwrap(), "0");
        assert_eq!(QueryArgument::Int(-42).display_text().unwrap(), "-42");
        assert_eq!(QueryArgument::Double(1.5).display_text().unwrap(), "1.5");
        assert_eq!(
            QueryArgument::String("hi".to_string())
                .display_text()
                .unwrap(),
            "hi"
        );
    }

    #[test]
    fn test_display_text_rejects_collections() {
        for arg in [
            QueryArgument::Null,
            QueryArgument::List(vec![]),
            QueryArgument::Pairs(vec![]),
        ] {
            assert!(matches!(
                arg.display_text().unwrap_err(),
                QueryError::UnsupportedConversion { .. }
            ));
        }
    }

    #[test]
    fn test_builder_preserves_order_and_duplicates() {
        let arg = PairsBuilder::new()
            .pair("z", 1i64)
            .pair("a", 2i64)
            .pair("z", 3i64)
            .build();
        let pairs = arg.get_pairs().unwrap();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "z"]);
    }

    #[test]
    fn test_dynamic_object_keys_sorted() {
        let arg = QueryArgument::try_from(json!({"b": 1, "a": null, "c": "x"})).unwrap();
        let pairs = arg.get_pairs().unwrap();
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert!(pairs[0].1.is_null());
    }

    #[test]
    fn test_dynamic_scalars_and_arrays() {
        let arg = QueryArgument::try_from(json!([1, 2.5, "s", true, null])).unwrap();
        let list = arg.get_list().unwrap();
        assert_eq!(list[0], QueryArgument::Int(1));
        assert_eq!(list[1], QueryArgument::Double(2.5));
        assert_eq!(list[2], QueryArgument::String("s".to_string()));
        assert_eq!(list[3], QueryArgument::Bool(true));
        assert_eq!(list[4], QueryArgument::Null);
    }

    #[test]
    fn test_dynamic_rejects_huge_u64() {
        let err = QueryArgument::try_from(json!(u64::MAX)).unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedDynamicType { .. }));
    }

    #[test]
    fn test_option_from() {
        let none: Option<i64> = None;
        assert!(QueryArgument::from(none).is_null());
        assert_eq!(QueryArgument::from(Some(3i64)), QueryArgument::Int(3));
    }
}
