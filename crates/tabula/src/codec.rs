//! Stored value encoding
//!
//! The backend reads back an empty string both for a cell that was never
//! written and for one written with an empty value. Every stored payload gets
//! a one-character prefix so an empty payload still reads back as `"!"`.

use tabula_common::{Result, TabulaError};

const BASIC_CODEC_PREFIX: &str = "!";

/// Converts caller bytes to and from the text stored in a cell
///
/// Cells hold text, so an implementation either maps arbitrary bytes into text
/// itself or rejects input it cannot represent. [`BasicCodec`] stores the
/// payload verbatim and therefore only round-trips UTF-8; `encode` fails with
/// `TabulaError::InvalidArgument` on anything else, before a store writes.
/// Install a binary-safe codec through [`KvStoreConfig::codec`] for opaque
/// bytes.
///
/// [`KvStoreConfig::codec`]: crate::KvStoreConfig::codec
pub trait Codec: Send + Sync + std::fmt::Debug {
    fn encode(&self, value: &[u8]) -> Result<String>;
    fn decode(&self, value: &str) -> Result<Vec<u8>>;
}

/// Prefix-marker codec for UTF-8 payloads; non-UTF-8 input is rejected
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicCodec;

impl Codec for BasicCodec {
    fn encode(&self, value: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(value).map_err(|e| {
            TabulaError::InvalidArgument(format!("value is not valid UTF-8: {}", e))
        })?;
        Ok(format!("{}{}", BASIC_CODEC_PREFIX, text))
    }

    fn decode(&self, value: &str) -> Result<Vec<u8>> {
        if value.is_empty() {
            return Err(TabulaError::Decode("basic decode fail: empty string".to_string()));
        }
        match value.strip_prefix(BASIC_CODEC_PREFIX) {
            Some(rest) => Ok(rest.as_bytes().to_vec()),
            None => Err(TabulaError::Decode(
                "basic decode fail: missing value prefix".to_string(),
            )),
        }
    }
}
