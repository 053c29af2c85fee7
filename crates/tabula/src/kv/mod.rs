//! Key-value stores.
//!
//! Two layouts share the same `get` / `set` / `delete` / `close` surface:
//!
//! - [`KvStore`] works on raw ranges (key, value, timestamp in `A:C`) and
//!   resolves keys with lookup formulas evaluated in its scratchpad.
//! - [`RowKvStore`] is a two-column [`RowStore`](crate::RowStore) and uses
//!   ordinary statements.
//!
//! In [`KvMode::Default`] each key has at most one row. In
//! [`KvMode::AppendOnly`] every write appends a row, the newest row for a key
//! wins, and a delete appends an empty value (a tombstone). The two modes are
//! not compatible on the same sheet.

mod rows;
mod sheet;

pub use rows::RowKvStore;
pub use sheet::KvStore;

use crate::codec::{BasicCodec, Codec};
use std::sync::Arc;

/// Physical layout of a key-value sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KvMode {
    /// One row per key, overwritten in place
    #[default]
    Default,
    /// One row per write; the latest row for a key is authoritative
    AppendOnly,
}

/// Key-value store configuration
#[derive(Debug, Clone)]
pub struct KvStoreConfig {
    pub mode: KvMode,
    pub codec: Arc<dyn Codec>,
}

impl Default for KvStoreConfig {
    fn default() -> Self {
        Self {
            mode: KvMode::Default,
            codec: Arc::new(BasicCodec),
        }
    }
}

impl KvStoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: KvMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }
}
