//! Query-string builder for the spreadsheet query dialect.
//!
//! The dialect has no parameter binding, so arguments are rendered into the
//! string. Logical column names are rewritten to column letters by a
//! [`ColumnReplacer`] seeded from the store's [`ColumnMapping`].
//!
//! ```ignore
//! use tabula::{args, ColumnOrderBy};
//! use tabula::query::{ColumnReplacer, QueryBuilder};
//!
//! let query = QueryBuilder::new(ColumnReplacer::from_mapping(&mapping), ["name", "age"])
//!     .where_clause("age > ? AND name != ?", args![18, "bob"])
//!     .order_by(vec![ColumnOrderBy::desc("age")])
//!     .limit(10)
//!     .build()?;
//! // select B, C where C > 18 AND B != "bob" order by C DESC limit 10
//! ```
//!
//! [`ColumnMapping`]: crate::columns::ColumnMapping

mod builder;
pub mod dialect;
mod replacer;
mod types;


pub use builder::{QueryBuilder, WhereInterceptor};
pub use replacer::ColumnReplacer;
pub use types::{ColumnOrderBy, OrderBy, QueryArg};
