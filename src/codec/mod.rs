//! Node/delta wire codecs. Spec calls for two interchangeable encodings
//! selected at store creation, with a header byte on every stored value
//! so a reader never has to trust the store's current default.

pub mod binary;
pub mod json;

use crate::error::{MeridianError, MeridianResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

const HEADER_JSON: u8 = 0x01;
const HEADER_BINARY: u8 = 0x02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    Json,
    Binary,
}

impl CodecKind {
    pub fn from_env_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "json" | "text" => CodecKind::Json,
            _ => CodecKind::Binary,
        }
    }
}

/// Encode `value` with `kind`, prefixed by a one-byte header identifying it.
pub fn encode<T: Serialize>(kind: CodecKind, value: &T) -> MeridianResult<Vec<u8>> {
    let mut out = Vec::new();
    match kind {
        CodecKind::Json => {
            out.push(HEADER_JSON);
            out.extend(json::encode(value)?);
        }
        CodecKind::Binary => {
            out.push(HEADER_BINARY);
            out.extend(binary::encode(value)?);
        }
    }
    Ok(out)
}

/// Decode a header-prefixed payload, dispatching on the header byte rather
/// than any ambient configuration — so either codec can be read regardless
/// of what the store is currently configured to write.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> MeridianResult<T> {
    let (header, payload) = bytes
        .split_first()
        .ok_or_else(|| MeridianError::Serialization("empty encoded payload".into()))?;
    match *header {
        HEADER_JSON => json::decode(payload),
        HEADER_BINARY => binary::decode(payload),
        other => Err(MeridianError::Serialization(format!(
            "unrecognized codec header byte: {other:#x}"
        ))),
    }
}
