//! Key encoding. Big-endian float packing so lexicographic byte order
//! matches numeric order for non-negative values.

use uuid::Uuid;

pub fn node_key(id: Uuid) -> Vec<u8> {
    let mut k = Vec::with_capacity(17);
    k.push(b'n');
    k.extend_from_slice(id.as_bytes());
    k
}

pub fn meta_key(id: Uuid, field: &str) -> Vec<u8> {
    let mut k = Vec::with_capacity(18 + field.len());
    k.push(b'm');
    k.extend_from_slice(id.as_bytes());
    k.push(b':');
    k.extend_from_slice(field.as_bytes());
    k
}

pub fn temporal_key(t: f64, id: Uuid) -> Vec<u8> {
    let mut k = Vec::with_capacity(25);
    k.push(b't');
    k.extend_from_slice(&be_f64(t));
    k.extend_from_slice(id.as_bytes());
    k
}

pub fn temporal_range_bounds(lo: f64, hi: f64) -> (Vec<u8>, Vec<u8>) {
    let mut lo_key = vec![b't'];
    lo_key.extend_from_slice(&be_f64(lo));
    let mut hi_key = vec![b't'];
    hi_key.extend_from_slice(&be_f64(hi));
    hi_key.extend(std::iter::repeat(0xff).take(16));
    (lo_key, hi_key)
}

pub fn spatial_key(dims: &[f64], id: Uuid) -> Vec<u8> {
    let mut k = Vec::with_capacity(1 + dims.len() * 8 + 16);
    k.push(b's');
    for d in dims {
        k.extend_from_slice(&be_f64(*d));
    }
    k.extend_from_slice(id.as_bytes());
    k
}

pub fn delta_key(delta_id: Uuid) -> Vec<u8> {
    let mut k = Vec::with_capacity(6 + 16);
    k.extend_from_slice(b"delta:");
    k.extend_from_slice(delta_id.as_bytes());
    k
}

pub fn delta_by_node_key(node_id: Uuid) -> Vec<u8> {
    let mut k = Vec::with_capacity(5 + 16);
    k.extend_from_slice(b"node:");
    k.extend_from_slice(node_id.as_bytes());
    k
}

pub fn delta_time_key(node_id: Uuid, t: f64) -> Vec<u8> {
    let mut k = Vec::with_capacity(5 + 16 + 1 + 8);
    k.extend_from_slice(b"time:");
    k.extend_from_slice(node_id.as_bytes());
    k.push(b':');
    k.extend_from_slice(&be_f64(t));
    k
}

pub fn delta_time_prefix(node_id: Uuid) -> Vec<u8> {
    let mut k = Vec::with_capacity(5 + 16 + 1);
    k.extend_from_slice(b"time:");
    k.extend_from_slice(node_id.as_bytes());
    k.push(b':');
    k
}

pub fn delta_time_range_bounds(node_id: Uuid, lo: f64, hi: f64) -> (Vec<u8>, Vec<u8>) {
    let mut lo_key = delta_time_prefix(node_id);
    lo_key.extend_from_slice(&be_f64(lo));
    let mut hi_key = delta_time_prefix(node_id);
    hi_key.extend_from_slice(&be_f64(hi));
    hi_key.push(0xff);
    (lo_key, hi_key)
}

pub fn delta_latest_key(node_id: Uuid) -> Vec<u8> {
    let mut k = Vec::with_capacity(7 + 16);
    k.extend_from_slice(b"latest:");
    k.extend_from_slice(node_id.as_bytes());
    k
}

/// Big-endian packing with the sign bit flipped so IEEE-754 ordering
/// matches byte ordering for all finite values, not only non-negatives.
/// We only ever feed non-negative timestamps/radii per the data model's
/// invariants, but the flip keeps the encoding correct if that changes.
pub fn be_f64(v: f64) -> [u8; 8] {
    let bits = v.to_bits();
    let flipped = if v.is_sign_negative() { !bits } else { bits | (1u64 << 63) };
    flipped.to_be_bytes()
}

pub fn uuid_from_suffix(bytes: &[u8]) -> Option<Uuid> {
    if bytes.len() < 16 {
        return None;
    }
    let tail = &bytes[bytes.len() - 16..];
    Uuid::from_slice(tail).ok()
}

#[cfg(test)]
#[path = "keys_tests.rs"]
mod keys_tests;
