//! A1-style cell ranges
//!
//! Parses and formats `sheet!fromCell:toCell` references and encodes
//! column ordinals into spreadsheet column letters.

use serde::{Deserialize, Serialize};
use std::fmt;

const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Encodes a 0-based column ordinal into spreadsheet letters (0 -> A, 26 -> AA).
///
/// This is not a plain base-26 conversion: after the first letter, a second
/// letter can start from "A" again, so every round past the first subtracts one
/// before taking the modulo.
pub fn generate_column_name(ordinal: usize) -> String {
    let mut letters = vec![ALPHABET[ordinal % 26]];
    let mut n = ordinal / 26;

    while n > 0 {
        n -= 1;
        letters.push(ALPHABET[n % 26]);
        n /= 26;
    }

    letters.iter().rev().map(|&b| b as char).collect()
}

/// Converts a cell reference (`"AB12"`) into its 1-based column index (`28`).
///
/// Trailing row digits are ignored and letters are case-insensitive. Returns 0
/// when the cell has no column letters.
pub fn cell_to_col_idx(cell: &str) -> usize {
    let letters = match cell.find(|c: char| c.is_ascii_digit()) {
        Some(idx) => &cell[..idx],
        None => cell,
    };

    letters
        .bytes()
        .filter(u8::is_ascii_alphabetic)
        .map(|b| (b.to_ascii_uppercase() - b'A' + 1) as usize)
        .fold(0, |acc, digit| acc * 26 + digit)
}

fn cell_to_row_idx(cell: &str) -> Option<u64> {
    let idx = cell.find(|c: char| c.is_ascii_digit())?;
    cell[idx..].parse().ok()
}

/// A parsed `[sheet!]from[:to]` range reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    /// The string this range was parsed from
    pub original: String,
    /// Sheet name, empty when the reference had no `!`
    pub sheet_name: String,
    /// First cell (e.g. `A1`)
    pub from_cell: String,
    /// Last cell, equal to `from_cell` for single-cell references
    pub to_cell: String,
}

impl CellRange {
    /// Parse a range such as `Sheet1!A1:C5`, `A1:C5`, `Sheet1!B2` or `B2`
    pub fn parse(s: &str) -> Self {
        let (sheet_name, cells) = match s.find('!') {
            Some(idx) => (&s[..idx], &s[idx + 1..]),
            None => ("", s),
        };

        let (from_cell, to_cell) = match cells.find(':') {
            Some(idx) => (&cells[..idx], &cells[idx + 1..]),
            None => (cells, cells),
        };

        Self {
            original: s.to_string(),
            sheet_name: sheet_name.to_string(),
            from_cell: from_cell.to_string(),
            to_cell: to_cell.to_string(),
        }
    }

    /// Build a range for `range` (e.g. `A1:C1`) inside `sheet_name`
    pub fn new(sheet_name: &str, range: &str) -> Self {
        Self::parse(&format!("{}!{}", sheet_name, range))
    }

    /// The cell part without the sheet name, always `from:to`
    pub fn range(&self) -> String {
        format!("{}:{}", self.from_cell, self.to_cell)
    }

    /// Number of columns spanned, 0 if either cell has no column letters
    pub fn num_cols(&self) -> usize {
        let from = cell_to_col_idx(&self.from_cell);
        let to = cell_to_col_idx(&self.to_cell);
        if from == 0 || to == 0 {
            return 0;
        }
        from.abs_diff(to) + 1
    }

    /// Number of rows spanned, 0 if either cell has no parseable row number
    pub fn num_rows(&self) -> usize {
        match (cell_to_row_idx(&self.from_cell), cell_to_row_idx(&self.to_cell)) {
            (Some(from), Some(to)) => (from.abs_diff(to) + 1) as usize,
            _ => 0,
        }
    }

    /// First row number of the range, if the from-cell carries one
    pub fn first_row(&self) -> Option<u64> {
        cell_to_row_idx(&self.from_cell)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl From<&str> for CellRange {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}
