/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Byte encodings of the discovery database's scalar fields.
//!
//! Integers are zig-zag encoded into unsigned LEB128 varints, the same encoding Go's
//! `binary.PutVarint` produces, so that stores written by other implementations stay readable.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use unsigned_varint::{decode, encode};

pub fn encode_i64(n: i64) -> Vec<u8> {
    let zigzag = ((n << 1) ^ (n >> 63)) as u64;
    let mut buf = encode::u64_buffer();
    encode::u64(zigzag, &mut buf).to_vec()
}

/// Decode a varint written by [`encode_i64`]. Bytes after the varint are ignored.
pub fn decode_i64(blob: &[u8]) -> Option<i64> {
    let (zigzag, _) = decode::u64(blob).ok()?;
    Some((zigzag >> 1) as i64 ^ -((zigzag & 1) as i64))
}

/// Topic registration tickets are stored as `issued` then `used`, both big-endian.
pub fn encode_tickets(issued: u32, used: u32) -> [u8; 8] {
    let mut blob = [0u8; 8];
    blob[..4].copy_from_slice(&issued.to_be_bytes());
    blob[4..].copy_from_slice(&used.to_be_bytes());
    blob
}

/// Anything other than exactly 8 bytes decodes to `(0, 0)`.
pub fn decode_tickets(blob: &[u8]) -> (u32, u32) {
    match <[u8; 8]>::try_from(blob) {
        Ok(blob) => (
            u32::from_be_bytes([blob[0], blob[1], blob[2], blob[3]]),
            u32::from_be_bytes([blob[4], blob[5], blob[6], blob[7]]),
        ),
        Err(_) => (0, 0),
    }
}

/// Whole seconds since the Unix epoch. Negative for times before it.
pub fn unix_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_secs()).map_or(i64::MIN, |secs| -secs),
    }
}

pub fn from_unix_secs(secs: i64) -> SystemTime {
    let offset = Duration::from_secs(secs.unsigned_abs());
    let time = if secs >= 0 {
        UNIX_EPOCH.checked_add(offset)
    } else {
        UNIX_EPOCH.checked_sub(offset)
    };
    time.unwrap_or(UNIX_EPOCH)
}
