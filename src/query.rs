//! Query values: a template string bound to its default arguments.

use crate::argument::QueryArgument;
use crate::error::QueryResult;
use crate::escape::Escaper;
use crate::render::render_template;

/// An immutable SQL query template plus its default ordered arguments.
///
/// Rendering runs the placeholder interpreter over the template text; a
/// query built with [`Query::unchecked`] skips all parsing, validation and
/// escaping and renders to its text verbatim.
///
/// ```
/// use sqlstencil::prelude::*;
///
/// let q = Query::new(
///     "SELECT * FROM %T WHERE %W",
///     vec![
///         "users".into(),
///         PairsBuilder::new().pair("id", 7i64).build(),
///     ],
/// );
/// assert_eq!(
///     q.render_insecure().unwrap(),
///     "SELECT * FROM `users` WHERE `id` = 7",
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    query_text: String,
    unsafe_query: bool,
    params: Vec<QueryArgument>,
}

impl Query {
    /// Build a query from template text and its default arguments.
    pub fn new(query_text: impl Into<String>, params: Vec<QueryArgument>) -> Self {
        Self {
            query_text: query_text.into(),
            unsafe_query: false,
            params,
        }
    }

    /// Build a query whose text the caller attests is already complete,
    /// safe SQL. Rendering returns it verbatim with no placeholder
    /// parsing, validation or escaping.
    pub fn unchecked(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            unsafe_query: true,
            params: Vec::new(),
        }
    }

    /// The raw template text.
    pub fn query_format(&self) -> &str {
        &self.query_text
    }

    /// Whether this query renders verbatim, bypassing the safe path.
    pub fn is_unsafe(&self) -> bool {
        self.unsafe_query
    }

    /// The default argument list.
    pub fn params(&self) -> &[QueryArgument] {
        &self.params
    }

    /// Concatenate another query's template text and arguments onto this
    /// one. Matching is positional, so no placeholder renumbering is
    /// needed across the boundary.
    pub fn append(&mut self, other: &Query) {
        self.query_text.push_str(&other.query_text);
        self.params.extend(other.params.iter().cloned());
    }

    /// Render with escaping bound to `conn`, using the default arguments.
    pub fn render(&self, conn: &dyn Escaper) -> QueryResult<String> {
        self.render_internal(Some(conn), &self.params)
    }

    /// Render with escaping bound to `conn`, overriding the arguments.
    /// Overrides must still satisfy arity and type matching.
    pub fn render_with(
        &self,
        conn: &dyn Escaper,
        params: &[QueryArgument],
    ) -> QueryResult<String> {
        self.render_internal(Some(conn), params)
    }

    /// Render without an escaping connection: string values pass through
    /// unescaped. For offline inspection and tests only, never for
    /// execution against a real database.
    pub fn render_insecure(&self) -> QueryResult<String> {
        self.render_internal(None, &self.params)
    }

    /// [`Query::render_insecure`] with overridden arguments.
    pub fn render_insecure_with(&self, params: &[QueryArgument]) -> QueryResult<String> {
        self.render_internal(None, params)
    }

    /// Render with an optional connection; used for embedded subqueries,
    /// which inherit the outer render's connection.
    pub(crate) fn render_opt(&self, conn: Option<&dyn Escaper>) -> QueryResult<String> {
        self.render_internal(conn, &self.params)
    }

    fn render_internal(
        &self,
        conn: Option<&dyn Escaper>,
        params: &[QueryArgument],
    ) -> QueryResult<String> {
        if self.unsafe_query {
            return Ok(self.query_text.clone());
        }
        render_template(&self.query_text, params, conn)
    }

    /// Render each query independently and join with `;` (no trailing
    /// separator).
    pub fn render_multi_query(
        conn: Option<&dyn Escaper>,
        queries: &[Query],
    ) -> QueryResult<String> {
        // Sum of template lengths plus per-parameter slack.
        let reserve: usize = queries
            .iter()
            .map(|q| q.query_text.len() + 8 * q.params.len())
            .sum();
        let mut ret = String::with_capacity(reserve);

        for query in queries {
            if !ret.is_empty() {
                ret.push(';');
            }
            ret.push_str(&query.render_opt(conn)?);
        }
        Ok(ret)
    }
}

/// An ordered sequence of queries rendered into one statement.
///
/// The first successful [`MultiQuery::render_query`] caches the joined
/// text for the lifetime of the value; later calls return the cache
/// without re-rendering. `&mut self` keeps the first render single-owner;
/// share the value only after it has been rendered once.
#[derive(Debug, Clone)]
pub struct MultiQuery {
    queries: Vec<Query>,
    rendered: Option<String>,
}

impl MultiQuery {
    pub fn new(queries: Vec<Query>) -> Self {
        Self {
            queries,
            rendered: None,
        }
    }

    /// The underlying query sequence.
    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    /// Render the sequence into one semicolon-joined statement.
    ///
    /// Fast path: a lone unsafe query returns its raw template text
    /// directly, with no copy and no safe-path validation.
    pub fn render_query(&mut self, conn: Option<&dyn Escaper>) -> QueryResult<&str> {
        if self.queries.len() == 1 && self.queries[0].is_unsafe() {
            return Ok(self.queries[0].query_format());
        }
        if self.rendered.is_none() {
            self.rendered = Some(Query::render_multi_query(conn, &self.queries)?);
        }
        Ok(self.rendered.as_deref().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::PairsBuilder;

    #[test]
    fn test_unchecked_renders_verbatim() {
        // The dangerous-character gate does not apply to unsafe queries.
        let q = Query::unchecked("SELECT * FROM t WHERE x = ';DROP'");
        assert_eq!(
            q.render_insecure().unwrap(),
            "SELECT * FROM t WHERE x = ';DROP'"
        );
    }

    #[test]
    fn test_safe_query_rejects_dangerous_text() {
        let q = Query::new("SELECT * FROM t WHERE x = ';DROP'", vec![]);
        assert!(q.render_insecure().is_err());
    }

    #[test]
    fn test_render_with_overrides() {
        let q = Query::new("SELECT %d", vec![1i64.into()]);
        assert_eq!(q.render_insecure().unwrap(), "SELECT 1");
        assert_eq!(
            q.render_insecure_with(&[2i64.into()]).unwrap(),
            "SELECT 2"
        );
        // Overrides still enforce arity.
        assert!(q.render_insecure_with(&[]).is_err());
    }

    #[test]
    fn test_append_concatenates_text_and_params() {
        let mut q = Query::new("SELECT %d", vec![1i64.into()]);
        q.append(&Query::new(" WHERE %W", vec![
            PairsBuilder::new().pair("a", 2i64).build(),
        ]));
        assert_eq!(q.render_insecure().unwrap(), "SELECT 1 WHERE `a` = 2");
        assert_eq!(q.params().len(), 2);
    }

    #[test]
    fn test_render_multi_query_joins_with_semicolon() {
        let queries = vec![
            Query::new("SELECT %d", vec![1i64.into()]),
            Query::new("SELECT %d", vec![2i64.into()]),
        ];
        assert_eq!(
            Query::render_multi_query(None, &queries).unwrap(),
            "SELECT 1;SELECT 2"
        );
    }

    #[test]
    fn test_multi_query_caches() {
        let mut mq = MultiQuery::new(vec![
            Query::new("SELECT 1", vec![]),
            Query::new("SELECT 2", vec![]),
        ]);
        assert_eq!(mq.render_query(None).unwrap(), "SELECT 1;SELECT 2");
        assert_eq!(mq.render_query(None).unwrap(), "SELECT 1;SELECT 2");
    }

    #[test]
    fn test_multi_query_unsafe_singleton_fast_path() {
        // Text that the safe path would reject comes back untouched.
        let mut mq = MultiQuery::new(vec![Query::unchecked("RAW 'SQL'; HERE")]);
        assert_eq!(mq.render_query(None).unwrap(), "RAW 'SQL'; HERE");
    }

    #[test]
    fn test_multi_query_error_propagates() {
        let mut mq = MultiQuery::new(vec![Query::new("SELECT %d", vec![])]);
        assert!(mq.render_query(None).is_err());
        // A failed render leaves the cache empty; the error repeats.
        assert!(mq.render_query(None).is_err());
    }
}
