//! Typed serializers for [`WithSerializer`](crate::WithSerializer).

use std::marker::PhantomData;

use cg_core::{Codec, MoveTarget, Position};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::pack;
use crate::CacheResult;

/// Converts one value type to and from its cached string.
///
/// `KEY` namespaces the decode memo; it must be unique per value type.
pub trait Serializer {
    type Value: Clone + 'static;
    const KEY: &'static str;

    fn serialize(&self, value: &Self::Value) -> CacheResult<String>;
    fn deserialize(&self, raw: &str) -> CacheResult<Self::Value>;
}

/// Unsigned integers up to 52 bits (ticks, indexes).
#[derive(Copy, Clone, Debug, Default)]
pub struct NumberSerializer;

impl Serializer for NumberSerializer {
    type Value = u64;
    const KEY: &'static str = "ns";

    fn serialize(&self, value: &u64) -> CacheResult<String> {
        Ok(Codec::NUMBER.encode_one(*value)?)
    }

    fn deserialize(&self, raw: &str) -> CacheResult<u64> {
        Ok(Codec::NUMBER.decode_one(raw)?)
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct PositionSerializer;

impl Serializer for PositionSerializer {
    type Value = Position;
    const KEY: &'static str = "ps";

    fn serialize(&self, value: &Position) -> CacheResult<String> {
        pack::pack_position(*value)
    }

    fn deserialize(&self, raw: &str) -> CacheResult<Position> {
        pack::unpack_position(raw)
    }
}

/// An empty list serializes to the empty string and is therefore stored
/// as "absent".
#[derive(Copy, Clone, Debug, Default)]
pub struct PositionListSerializer;

impl Serializer for PositionListSerializer {
    type Value = Vec<Position>;
    const KEY: &'static str = "pls";

    fn serialize(&self, value: &Vec<Position>) -> CacheResult<String> {
        pack::pack_positions(value)
    }

    fn deserialize(&self, raw: &str) -> CacheResult<Vec<Position>> {
        pack::unpack_positions(raw)
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct MoveTargetListSerializer;

impl Serializer for MoveTargetListSerializer {
    type Value = Vec<MoveTarget>;
    const KEY: &'static str = "mtls";

    fn serialize(&self, value: &Vec<MoveTarget>) -> CacheResult<String> {
        pack::pack_move_targets(value)
    }

    fn deserialize(&self, raw: &str) -> CacheResult<Vec<MoveTarget>> {
        pack::unpack_move_targets(raw)
    }
}

/// Any serde type, as JSON.
pub struct Json<T>(PhantomData<fn() -> T>);

impl<T> Json<T> {
    pub fn new() -> Self {
        Json(PhantomData)
    }
}

impl<T> Default for Json<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Json<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Copy for Json<T> {}

impl<T> std::fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Json")
    }
}

impl<T: Serialize + DeserializeOwned + Clone + 'static> Serializer for Json<T> {
    type Value = T;
    const KEY: &'static str = "js";

    fn serialize(&self, value: &T) -> CacheResult<String> {
        Ok(serde_json::to_string(value)?)
    }

    fn deserialize(&self, raw: &str) -> CacheResult<T> {
        Ok(serde_json::from_str(raw)?)
    }
}
