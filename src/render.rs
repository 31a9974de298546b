//! The template renderer.
//!
//! A single left-to-right scan over template text, interpreting `%`
//! placeholder codes against an ordered argument queue and emitting
//! escaped SQL into an output buffer.
//!
//! # Placeholder grammar
//!
//! ```text
//! SELECT %C FROM %T WHERE %W AND id IN (%Ld)
//!        ─┬─      ─┬─       ─┬─           ─┬─
//!         │        │         │             └── comma-joined int list
//!         │        │         └── AND-joined `col` = value pairs
//!         │        └── backtick-quoted table name
//!         └── backtick-quoted column name
//! ```
//!
//! Matching is purely positional: each value-consuming code pulls the next
//! unconsumed argument. `%%` emits a literal `%` and consumes nothing.

use crate::argument::QueryArgument;
use crate::error::{QueryError, QueryResult};
use crate::escape::{Escaper, append_escaped};

/// Characters that may never appear literally in safe-mode template text.
const DANGEROUS_CHARS: &[char] = &[';', '\'', '"', '`'];

/// How strictly a value's kind is checked before it is appended.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ValueContext {
    /// A concrete `d`/`s`/`f` code letter from the template.
    Code(char),
    /// The enclosing construct already validated the shape; any scalar
    /// (and a subquery) is accepted, and Null renders as `NULL`.
    AnyScalar,
    /// Inside a `%V` row: like `AnyScalar` but subqueries are rejected.
    RowElement,
}

impl ValueContext {
    /// The code letter reported in mismatch diagnostics.
    fn code(self) -> char {
        match self {
            ValueContext::Code(c) => c,
            ValueContext::AnyScalar | ValueContext::RowElement => 'v',
        }
    }
}

/// Byte-offset cursor over template text.
///
/// Keeps the position bookkeeping and the "unexpected end of string"
/// check for two-character codes in one place.
struct Cursor<'a> {
    text: &'a str,
    chars: std::str::CharIndices<'a>,
    offset: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.char_indices(),
            offset: 0,
        }
    }

    /// Byte offset of the most recently returned character.
    fn offset(&self) -> usize {
        self.offset
    }

    fn next(&mut self) -> Option<char> {
        let (idx, c) = self.chars.next()?;
        self.offset = idx;
        Some(c)
    }

    /// Consume the second character of a two-character code.
    fn advance(&mut self) -> QueryResult<char> {
        self.next()
            .ok_or_else(|| QueryError::parse(self.text, self.offset, "unexpected end of string"))
    }
}

/// Render `text` against `params` in safe mode.
pub(crate) fn render_template(
    text: &str,
    params: &[QueryArgument],
    conn: Option<&dyn Escaper>,
) -> QueryResult<String> {
    let renderer = Renderer {
        text,
        conn,
        // Template length plus per-parameter slack.
        out: String::with_capacity(text.len() + 8 * params.len()),
    };
    renderer.run(params)
}

struct Renderer<'a> {
    text: &'a str,
    conn: Option<&'a dyn Escaper>,
    out: String,
}

impl<'a> Renderer<'a> {
    fn run(mut self, params: &[QueryArgument]) -> QueryResult<String> {
        // Literal metacharacters never pass, placeholders or not.
        if let Some(offset) = self.text.find(DANGEROUS_CHARS) {
            return Err(QueryError::UnsafeTemplateRejected {
                query: self.text.to_string(),
                offset,
            });
        }

        let mut cursor = Cursor::new(self.text);
        let mut queue = params.iter();
        let mut after_percent = false;

        while let Some(c) = cursor.next() {
            if !after_percent {
                if c == '%' {
                    after_percent = true;
                } else {
                    self.out.push(c);
                }
                continue;
            }

            after_percent = false;
            if c == '%' {
                self.out.push('%');
                continue;
            }

            // The argument is claimed before the code letter is
            // classified, so arity errors win over unknown codes.
            let Some(param) = queue.next() else {
                return Err(QueryError::TooFewParameters {
                    query: self.text.to_string(),
                    offset: cursor.offset(),
                });
            };
            self.placeholder(&mut cursor, c, param)?;
        }

        if after_percent {
            return Err(QueryError::parse(
                self.text,
                self.text.len(),
                "string ended with unfinished % code",
            ));
        }
        if queue.next().is_some() {
            return Err(QueryError::TooManyParameters {
                query: self.text.to_string(),
            });
        }

        Ok(self.out)
    }

    /// Interpret one placeholder code against its claimed argument.
    fn placeholder(
        &mut self,
        cursor: &mut Cursor<'a>,
        code: char,
        param: &QueryArgument,
    ) -> QueryResult<()> {
        match code {
            'd' | 's' | 'f' => {
                self.append_value(cursor.offset(), ValueContext::Code(code), param)
            }
            'K' => self.append_comment(param),
            'T' | 'C' => self.append_identifier(param),
            '=' => {
                let letter = cursor.advance()?;
                if !matches!(letter, 'd' | 's' | 'f') {
                    return Err(QueryError::parse(
                        self.text,
                        cursor.offset(),
                        "expected %=d, %=s, or %=f",
                    ));
                }
                if param.is_null() {
                    self.out.push_str(" IS NULL");
                    Ok(())
                } else {
                    self.out.push_str(" = ");
                    self.append_value(cursor.offset(), ValueContext::Code(letter), param)
                }
            }
            'V' => self.append_rows(cursor.offset(), param),
            'L' => {
                let letter = cursor.advance()?;
                match letter {
                    'O' | 'A' => {
                        let sep = if letter == 'O' { " OR " } else { " AND " };
                        self.out.push('(');
                        self.append_pair_clauses(cursor.offset(), sep, param)?;
                        self.out.push(')');
                        Ok(())
                    }
                    'd' | 's' | 'f' | 'C' => self.append_list(cursor.offset(), letter, param),
                    _ => Err(QueryError::parse(
                        self.text,
                        cursor.offset(),
                        "unknown % code",
                    )),
                }
            }
            'U' => self.append_pair_clauses(cursor.offset(), ", ", param),
            'W' => self.append_pair_clauses(cursor.offset(), " AND ", param),
            'Q' => {
                let text = param.display_text()?;
                self.out.push_str(&text);
                Ok(())
            }
            _ => Err(QueryError::parse(
                self.text,
                cursor.offset(),
                "unknown % code",
            )),
        }
    }

    /// Append one value operand, checked against its context.
    fn append_value(
        &mut self,
        offset: usize,
        ctx: ValueContext,
        param: &QueryArgument,
    ) -> QueryResult<()> {
        match param {
            QueryArgument::String(s) => {
                self.check_code(ctx, 's', offset, "string")?;
                self.out.reserve(s.len() + 4);
                self.out.push('"');
                append_escaped(&mut self.out, s, self.conn);
                self.out.push('"');
                Ok(())
            }
            QueryArgument::Int(i) => {
                self.check_code(ctx, 'd', offset, "int")?;
                self.out.push_str(&i.to_string());
                Ok(())
            }
            QueryArgument::Double(f) => {
                self.check_code(ctx, 'f', offset, "double")?;
                self.out.push_str(&f.to_string());
                Ok(())
            }
            QueryArgument::Null => match ctx {
                ValueContext::Code(code) => {
                    Err(QueryError::type_mismatch(self.text, offset, code, "null"))
                }
                ValueContext::AnyScalar | ValueContext::RowElement => {
                    self.out.push_str("NULL");
                    Ok(())
                }
            },
            QueryArgument::SubQuery(sub) => match ctx {
                ValueContext::RowElement => Err(QueryError::shape(
                    self.text,
                    offset,
                    "%V doesn't allow subquery",
                )),
                ValueContext::Code(_) | ValueContext::AnyScalar => {
                    let sql = sub.render_opt(self.conn)?;
                    self.out.push_str(&sql);
                    Ok(())
                }
            },
            other => Err(QueryError::type_mismatch(
                self.text,
                offset,
                ctx.code(),
                other.type_name(),
            )),
        }
    }

    /// Fail unless the context accepts values of code letter `wanted`.
    fn check_code(
        &self,
        ctx: ValueContext,
        wanted: char,
        offset: usize,
        actual: &'static str,
    ) -> QueryResult<()> {
        match ctx {
            ValueContext::Code(code) if code != wanted => {
                Err(QueryError::type_mismatch(self.text, offset, code, actual))
            }
            _ => Ok(()),
        }
    }

    /// `%K`: display text wrapped in a comment, with comment delimiters
    /// inside the text defused.
    fn append_comment(&mut self, param: &QueryArgument) -> QueryResult<()> {
        let text = param.display_text()?;
        let text = text.replace("/*", " / * ").replace("*/", " * / ");
        self.out.push_str("/*");
        self.out.push_str(&text);
        self.out.push_str("*/");
        Ok(())
    }

    /// `%T`/`%C`: backtick-quoted identifier for strings, display text
    /// for other scalars.
    fn append_identifier(&mut self, param: &QueryArgument) -> QueryResult<()> {
        if let QueryArgument::String(name) = param {
            self.quote_identifier(name);
            Ok(())
        } else {
            let text = param.display_text()?;
            self.out.push_str(&text);
            Ok(())
        }
    }

    fn quote_identifier(&mut self, name: &str) {
        self.out.reserve(name.len() + 4);
        self.out.push('`');
        for c in name.chars() {
            // Toss in an extra ` if we see one.
            if c == '`' {
                self.out.push('`');
            }
            self.out.push(c);
        }
        self.out.push('`');
    }

    /// `%V`: a list of equal-length rows rendered as `(v, v), (v, v)`.
    fn append_rows(&mut self, offset: usize, param: &QueryArgument) -> QueryResult<()> {
        if param.is_query() {
            return Err(QueryError::shape(self.text, offset, "%V doesn't allow subquery"));
        }
        let rows = self.expect_list(offset, param, "list of rows expected for %V")?;

        let mut first_row_len = 0;
        for (row_idx, row) in rows.iter().enumerate() {
            if row_idx > 0 {
                self.out.push_str(", ");
            }
            let cols = self.expect_list(offset, row, "list of values expected for %V row")?;
            self.out.push('(');
            for (col_idx, col) in cols.iter().enumerate() {
                if col_idx > 0 {
                    self.out.push_str(", ");
                }
                self.append_value(offset, ValueContext::RowElement, col)?;
            }
            self.out.push(')');

            if row_idx == 0 {
                first_row_len = cols.len();
            } else if cols.len() != first_row_len {
                return Err(QueryError::shape(
                    self.text,
                    offset,
                    "not all rows provided for %V formatter are the same size",
                ));
            }
        }
        Ok(())
    }

    /// `%Ld`/`%Ls`/`%Lf`/`%LC`: comma-joined list elements.
    fn append_list(
        &mut self,
        offset: usize,
        letter: char,
        param: &QueryArgument,
    ) -> QueryResult<()> {
        let items = self.expect_list(offset, param, "expected array for %L formatter")?;
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                self.out.push_str(", ");
            }
            if letter == 'C' {
                self.append_identifier(item)?;
            } else {
                self.append_value(offset, ValueContext::Code(letter), item)?;
            }
        }
        Ok(())
    }

    /// `%U`/`%W`/`%LO`/`%LA`: `` `col` = value`` clauses joined by `sep`.
    ///
    /// Null values render as `IS NULL` under the AND/OR separators (WHERE
    /// correctness) but as `= NULL` under the comma separator (valid in
    /// SET clauses).
    fn append_pair_clauses(
        &mut self,
        offset: usize,
        sep: &str,
        param: &QueryArgument,
    ) -> QueryResult<()> {
        let pairs = match param {
            QueryArgument::Pairs(pairs) => pairs,
            other => {
                return Err(QueryError::shape(
                    self.text,
                    offset,
                    format!("object expected for %Lx but received {}", other.type_name()),
                ));
            }
        };

        for (idx, (column, value)) in pairs.iter().enumerate() {
            if idx > 0 {
                self.out.push_str(sep);
            }
            self.quote_identifier(column);
            if value.is_null() && !sep.starts_with(',') {
                self.out.push_str(" IS NULL");
            } else {
                self.out.push_str(" = ");
                self.append_value(offset, ValueContext::AnyScalar, value)?;
            }
        }
        Ok(())
    }

    fn expect_list<'p>(
        &self,
        offset: usize,
        param: &'p QueryArgument,
        message: &str,
    ) -> QueryResult<&'p [QueryArgument]> {
        match param {
            QueryArgument::List(items) => Ok(items),
            other => Err(QueryError::shape(
                self.text,
                offset,
                format!("{message} but received {}", other.type_name()),
            )),
        }
    }
}
