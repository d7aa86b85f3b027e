//! String packing for positions, coordinates and move targets.
//!
//! In memory a [`Position`] is a packed `u32`; strings only appear at the
//! cache boundary.  One position packs into exactly two codec characters
//! (8 + 8 bits of room, 6 + 6 bits of tile), so position lists need no
//! separator and no length header.

use cg_core::{Codec, Coord, Depth, MoveTarget, Position, RoomName};

use crate::{CacheError, CacheResult};

const POSITION_DEPTHS: [u32; 4] = [8, 8, 6, 6];
const POSITION_CHARS: usize = 2;
const TARGET_CHARS: usize = 3;
const RANGE_DEPTH: u32 = 15;

fn position_codec() -> CacheResult<Codec> {
    Ok(Codec::per_element(&POSITION_DEPTHS)?)
}

fn encode_position(codec: &Codec, pos: Position) -> CacheResult<String> {
    let room = pos.room().packed();
    Ok(codec.encode(&[
        u64::from(room >> 8),
        u64::from(room & 0xFF),
        u64::from(pos.x()),
        u64::from(pos.y()),
    ])?)
}

fn decode_position(codec: &Codec, raw: &str) -> CacheResult<Position> {
    match codec.decode(raw)?.as_slice() {
        &[rx, ry, x, y] => {
            let room = RoomName::from_packed(((rx as u16) << 8) | ry as u16);
            Ok(Position::new(room, x as u8, y as u8)?)
        }
        other => Err(CacheError::Corrupt(format!("{} position fields", other.len()))),
    }
}

pub fn pack_position(pos: Position) -> CacheResult<String> {
    encode_position(&position_codec()?, pos)
}

pub fn unpack_position(raw: &str) -> CacheResult<Position> {
    if raw.chars().count() != POSITION_CHARS {
        return Err(CacheError::Corrupt(format!("position of length {}", raw.chars().count())));
    }
    decode_position(&position_codec()?, raw)
}

pub fn pack_positions(positions: &[Position]) -> CacheResult<String> {
    let codec = position_codec()?;
    let mut out = String::with_capacity(positions.len() * POSITION_CHARS * 3);
    for &pos in positions {
        out.push_str(&encode_position(&codec, pos)?);
    }
    Ok(out)
}

pub fn unpack_positions(raw: &str) -> CacheResult<Vec<Position>> {
    let codec = position_codec()?;
    split_records(raw, POSITION_CHARS)?
        .iter()
        .map(|rec| decode_position(&codec, rec))
        .collect()
}

/// Three characters per target: position, then a 15-bit range.
pub fn pack_move_targets(targets: &[MoveTarget]) -> CacheResult<String> {
    let pos_codec = position_codec()?;
    let range_codec = Codec::scalar(RANGE_DEPTH)?;
    let mut out = String::with_capacity(targets.len() * TARGET_CHARS * 3);
    for t in targets {
        out.push_str(&encode_position(&pos_codec, t.pos)?);
        out.push_str(&range_codec.encode_one(u64::from(t.range))?);
    }
    Ok(out)
}

pub fn unpack_move_targets(raw: &str) -> CacheResult<Vec<MoveTarget>> {
    let pos_codec = position_codec()?;
    let range_codec = Codec::scalar(RANGE_DEPTH)?;
    split_records(raw, TARGET_CHARS)?
        .iter()
        .map(|rec| {
            let split = rec.char_indices().nth(POSITION_CHARS).map_or(rec.len(), |(i, _)| i);
            let (pos, range) = rec.split_at(split);
            Ok(MoveTarget::new(
                decode_position(&pos_codec, pos)?,
                range_codec.decode_one(range)? as u32,
            ))
        })
        .collect()
}

/// Length-prefixed list of 12-bit in-room coordinates.
pub fn pack_coords(coords: &[Coord]) -> CacheResult<String> {
    let codec = Codec::new(Depth::Fixed(12), true, false)?;
    let values: Vec<u64> = coords.iter().map(|c| u64::from(c.packed())).collect();
    Ok(codec.encode(&values)?)
}

pub fn unpack_coords(raw: &str) -> CacheResult<Vec<Coord>> {
    let codec = Codec::new(Depth::Fixed(12), true, false)?;
    codec
        .decode(raw)?
        .into_iter()
        .map(|v| Ok(Coord::from_packed(v as u16)?))
        .collect()
}

fn split_records(raw: &str, width: usize) -> CacheResult<Vec<String>> {
    let chars: Vec<char> = raw.chars().collect();
    if chars.len() % width != 0 {
        return Err(CacheError::Corrupt(format!(
            "{} characters is not a multiple of {width}",
            chars.len()
        )));
    }
    Ok(chars.chunks(width).map(|c| c.iter().collect()).collect())
}
