//! Logical to physical column name substitution.

use crate::columns::ColumnMapping;

/// Full-text replacer seeded from a column mapping.
///
/// Scans left to right; at each position the longest logical name that
/// matches is replaced and scanning resumes after it. Text that matches no
/// name passes through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnReplacer {
    /// Sorted by descending name length
    pairs: Vec<(String, String)>,
}

impl ColumnReplacer {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        let mut pairs: Vec<(String, String)> = pairs
            .into_iter()
            .filter(|(from, _)| !from.is_empty())
            .collect();
        pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self { pairs }
    }

    pub fn from_mapping(mapping: &ColumnMapping) -> Self {
        Self::new(mapping.name_pairs())
    }

    pub fn replace(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(ch) = rest.chars().next() {
            match self.pairs.iter().find(|(from, _)| rest.starts_with(from.as_str())) {
                Some((from, to)) => {
                    out.push_str(to);
                    rest = &rest[from.len()..];
                }
                None => {
                    out.push(ch);
                    rest = &rest[ch.len_utf8()..];
                }
            }
        }

        out
    }
}
