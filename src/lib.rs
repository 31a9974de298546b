//! # sqlstencil — typed, injection-safe SQL templating
//!
//! Build a query from a literal template containing typed placeholder
//! codes plus an ordered argument list; sqlstencil validates argument
//! shapes against the codes, escapes and quotes values, and renders one
//! executable SQL string. Literal `;`, `'`, `"` and backtick characters
//! are rejected in template text: quoting only ever comes from the
//! engine, never from the template.
//!
//! ## Quick example
//!
//! ```
//! use sqlstencil::prelude::*;
//!
//! let q = Query::new(
//!     "UPDATE %T SET %U WHERE id%=d",
//!     vec![
//!         "users".into(),
//!         PairsBuilder::new().pair("name", "alice").build(),
//!         7i64.into(),
//!     ],
//! );
//! assert_eq!(
//!     q.render(&MysqlEscaper).unwrap(),
//!     "UPDATE `users` SET `name` = \"alice\" WHERE id = 7",
//! );
//! ```
//!
//! ## Format codes
//!
//! | Code   | Argument       | Renders as                                 |
//! |--------|----------------|--------------------------------------------|
//! | `%%`   | —              | literal `%`                                |
//! | `%d`   | int            | decimal text                               |
//! | `%f`   | double         | decimal text                               |
//! | `%s`   | string         | quoted, escaped string literal             |
//! | `%T` `%C` | identifier  | backtick-quoted table/column name          |
//! | `%=d` `%=s` `%=f` | scalar or null | ` = value` or ` IS NULL`       |
//! | `%K`   | scalar         | comment-safe `/* text */`                  |
//! | `%V`   | list of rows   | `(v, v), (v, v)` bulk-insert rows          |
//! | `%Ld` `%Ls` `%Lf` `%LC` | list | comma-joined elements             |
//! | `%LO` `%LA` | pairs     | `(col = v OR/AND col = v)` groups          |
//! | `%U`   | pairs          | comma-joined `col = v` (SET clause)        |
//! | `%W`   | pairs          | AND-joined, null as `col IS NULL` (WHERE)  |
//! | `%Q`   | scalar         | raw trusted fragment, unescaped            |
//!
//! Matching is strictly positional, left to right, and exact: too few or
//! too many arguments is an error, as is any argument whose variant does
//! not fit its code.

pub mod argument;
pub mod error;
pub mod escape;
pub mod query;

mod render;

pub mod prelude {
    pub use crate::argument::{PairsBuilder, QueryArgument, RawFragment};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::escape::{Escaper, MysqlEscaper};
    pub use crate::query::{MultiQuery, Query};
}

pub use argument::{PairsBuilder, QueryArgument, RawFragment};
pub use error::{QueryError, QueryResult};
pub use escape::{Escaper, MysqlEscaper};
pub use query::{MultiQuery, Query};
