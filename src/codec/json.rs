//! Text/JSON wire form: human-readable, used for debugging and for stores
//! that prioritize inspectability over size.

use crate::error::MeridianResult;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode<T: Serialize>(value: &T) -> MeridianResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> MeridianResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}
