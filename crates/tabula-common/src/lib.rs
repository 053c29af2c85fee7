//! Common utilities for tabula
//!
//! This crate provides the types shared by the HTTP layer and the store engine:
//! - `error`: unified error taxonomy
//! - `range`: A1-style cell ranges and column letter encoding
//! - `sheets`: the sheet operations capability the stores are written against

pub mod error;
pub mod range;
pub mod sheets;

pub use error::{Result, TabulaError};
pub use range::{cell_to_col_idx, generate_column_name, CellRange};
pub use sheets::{
    value_to_text, AppendMode, BatchUpdateRowsRequest, InsertRowsResult, QueryRowsResult, Rows,
    SheetOperations, UpdateRowsResult,
};
