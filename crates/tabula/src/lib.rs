//! tabula: tabular and key-value stores on top of a spreadsheet
//!
//! A spreadsheet only offers cell-range reads and writes plus a restricted
//! query dialect. This crate layers SQL-like statements and a key-value API on
//! top of that, discovering affected rows by evaluating formulas server-side in
//! a reserved scratchpad cell.
//!
//! # Architecture
//!
//! - `columns`: logical column name to spreadsheet letter mapping
//! - `codec` / `values`: value encoding, escaping and precision checks
//! - `query`: query-string builder and the formula dialect constants
//! - `scratchpad`: scratchpad allocation and row-index discovery
//! - `row`: `RowStore` with Select/Insert/Update/Delete/Count statements
//! - `kv`: `KvStore` (raw ranges) and `RowKvStore` (on top of `RowStore`)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use serde::{Deserialize, Serialize};
//! use tabula::{args, RowStore, RowStoreConfig};
//! use tabula::http::{GoogleSheets, SheetsClientConfig, StaticToken};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! let sheets = Arc::new(GoogleSheets::new(SheetsClientConfig::new(), Arc::new(StaticToken::new(token)))?);
//! let store = RowStore::new(sheets, "spreadsheet-id", "people", RowStoreConfig::new(["name", "age"])).await?;
//!
//! store.insert(&[Person { name: "alice".into(), age: 30 }]).exec().await?;
//! let adults: Vec<Person> = store
//!     .select(&[])
//!     .where_clause("age >= ?", args![18])
//!     .exec()
//!     .await?;
//! ```

pub mod codec;
pub mod columns;
pub mod kv;
pub mod query;
pub mod row;
pub mod scratchpad;
pub mod values;

pub use tabula_common::{CellRange, Result, SheetOperations, TabulaError};
pub use tabula_http as http;

pub use codec::{BasicCodec, Codec};
pub use columns::{ColumnMapping, ColumnSpec, MAX_COLUMNS};
pub use kv::{KvMode, KvStore, KvStoreConfig, RowKvStore};
pub use query::{ColumnOrderBy, OrderBy, QueryArg, QueryBuilder};
pub use row::{
    CountStmt, DeleteStmt, InsertStmt, RowStore, RowStoreConfig, SelectStmt, UpdateStmt,
};
pub use scratchpad::{RowIndexPlan, Scratchpad};
