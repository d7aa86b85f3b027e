//! Compact codec: packs small unsigned integers into short printable strings.
//!
//! # Layout
//!
//! Values are written most-significant-bit first into a continuous bit
//! stream.  The stream is cut into 15-bit chunks and every chunk becomes one
//! `char` at `CHAR_OFFSET + chunk`.  With the offset at `0x100` every code
//! point lands in `0x0100..=0x80FF`, which skips the ASCII control range and
//! stays well below the surrogate block.  A trailing partial chunk is padded
//! with zero bits.
//!
//! Optional leading characters:
//!
//! ```text
//! [meta]   1 char   bit 0 = array flag, bits 1..=6 = depth   (meta codecs only)
//! [length] 1 char   element count                            (fixed-depth arrays only)
//! payload  n chars  the packed values
//! ```
//!
//! Fixed-depth arrays carry an explicit length because padding bits could
//! otherwise decode as extra zero elements.  Per-element depth codecs encode
//! exactly `depths.len()` values, so they need neither header.

use crate::{CoreError, CoreResult};

/// Usable bits per output character.
pub const BITS_PER_CHAR: u32 = 15;

/// Widest value a codec may carry, matching the host's safe integer width.
pub const MAX_DEPTH: u32 = 52;

/// Longest array a fixed-depth codec can encode (one length character).
pub const MAX_ARRAY_LEN: usize = (1 << BITS_PER_CHAR) - 1;

const CHAR_OFFSET: u32 = 0x100;
const CHUNK_MASK: u128 = (1 << BITS_PER_CHAR) - 1;

/// Bit depth configuration of a [`Codec`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Depth {
    /// Every value uses the same number of bits.
    Fixed(u32),
    /// Value `i` uses `depths[i]` bits; exactly `depths.len()` values are
    /// encoded.
    PerElement(Vec<u32>),
}

/// A validated encoder/decoder.
///
/// Construction fails fast on an impossible configuration; encoding fails
/// only when a value does not fit its depth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Codec {
    depth: Depth,
    array: bool,
    meta:  bool,
}

impl Codec {
    /// Scalar codec for any value up to [`MAX_DEPTH`] bits: ticks, counters.
    pub const NUMBER: Codec = Codec { depth: Depth::Fixed(MAX_DEPTH), array: false, meta: false };

    /// Build a codec.
    ///
    /// # Errors
    ///
    /// [`CoreError::CodecConfig`] if any depth is 0 or above [`MAX_DEPTH`],
    /// if a per-element depth list is empty, if a scalar codec is given
    /// per-element depths, or if metadata is requested for per-element depths
    /// (the header only has room for one depth).
    pub fn new(depth: Depth, array: bool, meta: bool) -> CoreResult<Self> {
        match &depth {
            Depth::Fixed(d) => check_depth(*d)?,
            Depth::PerElement(ds) => {
                if ds.is_empty() {
                    return Err(CoreError::CodecConfig("empty per-element depth list".into()));
                }
                if !array {
                    return Err(CoreError::CodecConfig(
                        "per-element depths require an array codec".into(),
                    ));
                }
                if meta {
                    return Err(CoreError::CodecConfig(
                        "metadata cannot describe per-element depths".into(),
                    ));
                }
                for &d in ds {
                    check_depth(d)?;
                }
            }
        }
        Ok(Self { depth, array, meta })
    }

    /// Scalar codec with a fixed depth and no metadata.
    pub fn scalar(depth: u32) -> CoreResult<Self> {
        Self::new(Depth::Fixed(depth), false, false)
    }

    /// Array codec with one depth per element and no metadata.
    pub fn per_element(depths: &[u32]) -> CoreResult<Self> {
        Self::new(Depth::PerElement(depths.to_vec()), true, false)
    }

    pub fn depth(&self) -> &Depth {
        &self.depth
    }

    pub fn is_array(&self) -> bool {
        self.array
    }

    /// Number of characters one encoding of `count` values occupies.
    pub fn encoded_len(&self, count: usize) -> usize {
        let header = usize::from(self.meta)
            + usize::from(self.array && matches!(self.depth, Depth::Fixed(_)));
        let bits: u64 = match &self.depth {
            Depth::Fixed(d) => *d as u64 * count as u64,
            Depth::PerElement(ds) => ds.iter().map(|&d| d as u64).sum(),
        };
        header + bits.div_ceil(BITS_PER_CHAR as u64) as usize
    }

    /// Encode a single value.
    pub fn encode_one(&self, value: u64) -> CoreResult<String> {
        self.encode(&[value])
    }

    /// Encode `values`.  Scalar codecs accept exactly one value.
    ///
    /// # Errors
    ///
    /// [`CoreError::CodecRange`] if a value needs more bits than its depth,
    /// [`CoreError::CodecConfig`] if the value count does not match the codec.
    pub fn encode(&self, values: &[u64]) -> CoreResult<String> {
        if !self.array && values.len() != 1 {
            return Err(CoreError::CodecConfig(format!(
                "scalar codec given {} values",
                values.len()
            )));
        }
        let mut w = BitWriter::default();

        if self.meta {
            let Depth::Fixed(d) = self.depth else {
                return Err(CoreError::CodecConfig("metadata needs a fixed depth".into()));
            };
            w.push_char(u32::from(self.array) | (d << 1))?;
        }

        match &self.depth {
            Depth::Fixed(d) => {
                if self.array {
                    if values.len() > MAX_ARRAY_LEN {
                        return Err(CoreError::CodecRange {
                            value: values.len() as u64,
                            depth: BITS_PER_CHAR,
                        });
                    }
                    w.push_char(values.len() as u32)?;
                }
                for &v in values {
                    w.push(v, *d)?;
                }
            }
            Depth::PerElement(ds) => {
                if values.len() != ds.len() {
                    return Err(CoreError::CodecConfig(format!(
                        "expected {} values, got {}",
                        ds.len(),
                        values.len()
                    )));
                }
                for (&v, &d) in values.iter().zip(ds) {
                    w.push(v, d)?;
                }
            }
        }
        w.finish()
    }

    /// Decode a scalar.
    pub fn decode_one(&self, encoded: &str) -> CoreResult<u64> {
        let values = self.decode(encoded)?;
        match values.as_slice() {
            [v] => Ok(*v),
            _ => Err(CoreError::Malformed(format!(
                "expected one value, found {}",
                values.len()
            ))),
        }
    }

    /// Exact inverse of [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// [`CoreError::Malformed`] for characters outside the codec alphabet or
    /// truncated input.
    pub fn decode(&self, encoded: &str) -> CoreResult<Vec<u64>> {
        let mut r = BitReader::new(encoded);

        let (array, depth) = if self.meta {
            let header = r.pull_char()?;
            (header & 1 == 1, Depth::Fixed(header >> 1))
        } else {
            (self.array, self.depth.clone())
        };

        match depth {
            Depth::Fixed(d) => {
                check_depth(d).map_err(|_| CoreError::Malformed(format!("header depth {d}")))?;
                let count = if array { r.pull_char()? as usize } else { 1 };
                (0..count).map(|_| r.pull(d)).collect()
            }
            Depth::PerElement(ds) => ds.iter().map(|&d| r.pull(d)).collect(),
        }
    }
}

fn check_depth(d: u32) -> CoreResult<()> {
    if d == 0 || d > MAX_DEPTH {
        return Err(CoreError::CodecConfig(format!(
            "depth {d} outside 1..={MAX_DEPTH}"
        )));
    }
    Ok(())
}

/// Map one 15-bit chunk to its character.  Infallible for chunks below
/// `1 << 15`; larger inputs are masked.
pub fn chunk_to_char(chunk: u32) -> char {
    // 0x100 + 0x7FFF stays below the surrogate range, so this never fails.
    char::from_u32(CHAR_OFFSET + (chunk & CHUNK_MASK as u32)).unwrap_or('\u{100}')
}

fn char_to_chunk(c: char) -> CoreResult<u32> {
    let code = c as u32;
    if !(CHAR_OFFSET..CHAR_OFFSET + (1 << BITS_PER_CHAR)).contains(&code) {
        return Err(CoreError::Malformed(format!("character U+{code:04X} out of range")));
    }
    Ok(code - CHAR_OFFSET)
}

// ── Bit stream ────────────────────────────────────────────────────────────────

#[derive(Default)]
struct BitWriter {
    acc:  u128,
    bits: u32,
    out:  String,
}

impl BitWriter {
    fn push(&mut self, value: u64, depth: u32) -> CoreResult<()> {
        if depth < 64 && value >> depth != 0 {
            return Err(CoreError::CodecRange { value, depth });
        }
        self.acc = (self.acc << depth) | value as u128;
        self.bits += depth;
        while self.bits >= BITS_PER_CHAR {
            self.bits -= BITS_PER_CHAR;
            let chunk = (self.acc >> self.bits) & CHUNK_MASK;
            self.out.push(chunk_to_char(chunk as u32));
            self.acc &= (1u128 << self.bits) - 1;
        }
        Ok(())
    }

    /// Headers always sit on a character boundary.
    fn push_char(&mut self, value: u32) -> CoreResult<()> {
        debug_assert_eq!(self.bits, 0);
        self.push(value as u64, BITS_PER_CHAR)
    }

    fn finish(mut self) -> CoreResult<String> {
        if self.bits > 0 {
            let chunk = (self.acc << (BITS_PER_CHAR - self.bits)) & CHUNK_MASK;
            self.out.push(chunk_to_char(chunk as u32));
        }
        Ok(self.out)
    }
}

struct BitReader<'a> {
    chars: std::str::Chars<'a>,
    acc:   u128,
    bits:  u32,
}

impl<'a> BitReader<'a> {
    fn new(s: &'a str) -> Self {
        Self { chars: s.chars(), acc: 0, bits: 0 }
    }

    fn pull(&mut self, depth: u32) -> CoreResult<u64> {
        while self.bits < depth {
            let c = self
                .chars
                .next()
                .ok_or_else(|| CoreError::Malformed("input ends mid-value".into()))?;
            self.acc = (self.acc << BITS_PER_CHAR) | char_to_chunk(c)? as u128;
            self.bits += BITS_PER_CHAR;
        }
        self.bits -= depth;
        let v = (self.acc >> self.bits) & ((1u128 << depth) - 1);
        self.acc &= (1u128 << self.bits) - 1;
        Ok(v as u64)
    }

    fn pull_char(&mut self) -> CoreResult<u32> {
        // Drop any padding left over from a previous partial character.
        self.acc = 0;
        self.bits = 0;
        self.pull(BITS_PER_CHAR).map(|v| v as u32)
    }
}
