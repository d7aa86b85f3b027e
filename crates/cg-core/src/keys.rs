//! Cache key derivation.
//!
//! Per-agent state is namespaced by a short prefix derived from the agent's
//! immutable identifier: the hex id is left-padded with `0` to a multiple of
//! three digits and every 3-digit group (12 bits) becomes one codec
//! character.  Room-scoped keys use the packed room name.

use crate::codec::chunk_to_char;
use crate::ids::AgentId;
use crate::room::RoomName;
use crate::{CoreError, CoreResult};

/// Key for an object with a hexadecimal id.
///
/// # Errors
///
/// [`CoreError::InvalidId`] for an empty or non-hexadecimal id.
pub fn object_key(id: &str, suffix: &str) -> CoreResult<String> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CoreError::InvalidId(id.to_string()));
    }
    let padded = format!("{:0>width$}", id, width = id.len().div_ceil(3) * 3);
    let mut key = String::with_capacity(padded.len() / 3 + suffix.len());
    for group in padded.as_bytes().chunks(3) {
        let digits = std::str::from_utf8(group).map_err(|_| CoreError::InvalidId(id.to_string()))?;
        let value =
            u32::from_str_radix(digits, 16).map_err(|_| CoreError::InvalidId(id.to_string()))?;
        key.push(chunk_to_char(value));
    }
    key.push_str(suffix);
    Ok(key)
}

/// Key for an agent.  Equivalent to `object_key` over the id as eight hex
/// digits, but cannot fail.
pub fn agent_key(agent: AgentId, suffix: &str) -> String {
    let id = agent.0;
    let mut key = String::with_capacity(3 + suffix.len());
    key.push(chunk_to_char(id >> 24));
    key.push(chunk_to_char((id >> 12) & 0xFFF));
    key.push(chunk_to_char(id & 0xFFF));
    key.push_str(suffix);
    key
}

/// Key for a room.
pub fn room_key(room: RoomName, suffix: &str) -> String {
    let packed = u32::from(room.packed());
    let mut key = String::with_capacity(2 + suffix.len());
    key.push(chunk_to_char(packed >> 8));
    key.push(chunk_to_char(packed & 0xFF));
    key.push_str(suffix);
    key
}
