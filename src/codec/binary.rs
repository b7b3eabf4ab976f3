//! Compact binary wire form: `bincode`-encoded payload with a trailing
//! CRC32 checksum, the same envelope shape the teacher's WAL records use
//! for on-disk framing.

use crate::error::{MeridianError, MeridianResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode<T: Serialize>(value: &T) -> MeridianResult<Vec<u8>> {
    let body = bincode::serialize(value)?;
    let checksum = crc32fast::hash(&body);
    let mut out = Vec::with_capacity(body.len() + 4);
    out.extend_from_slice(&body);
    out.extend_from_slice(&checksum.to_be_bytes());
    Ok(out)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> MeridianResult<T> {
    if bytes.len() < 4 {
        return Err(MeridianError::Serialization(
            "binary payload shorter than checksum trailer".into(),
        ));
    }
    let (body, trailer) = bytes.split_at(bytes.len() - 4);
    let expected = u32::from_be_bytes(trailer.try_into().unwrap());
    let actual = crc32fast::hash(body);
    if actual != expected {
        return Err(MeridianError::Serialization(format!(
            "binary payload checksum mismatch: expected {expected:#x}, got {actual:#x}"
        )));
    }
    Ok(bincode::deserialize(body)?)
}
