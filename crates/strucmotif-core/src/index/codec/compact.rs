//! Compact bucket encoding.
//!
//! Layout: `MAGIC VERSION` followed by tagged fields. Each field is `tag:u8`,
//! `count:varint` and `count` payload items. Varints are unsigned LEB128 over `u64`;
//! signed deltas are zig-zag mapped first. A field that is absent decodes as empty.
//!
//! | tag | field              | item                                                        |
//! |-----|--------------------|-------------------------------------------------------------|
//! | 1   | structure indices  | zig-zag delta to the previous index                         |
//! | 2   | offsets            | delta to the previous offset                                |
//! | 3   | identifiers        | zig-zag delta of `index1` to the previous occurrence, then zig-zag of `index2 - index1` |
//! | 4   | operator overlay   | delta position, byte length, UTF-8 bytes                    |

use super::CodecError;
use crate::index::bucket::Bucket;
use std::collections::BTreeMap;

pub const MAGIC: u8 = 0xB5;
pub const VERSION: u8 = 1;

const TAG_STRUCTURES: u8 = 1;
const TAG_OFFSETS: u8 = 2;
const TAG_IDENTIFIERS: u8 = 3;
const TAG_OPERATORS: u8 = 4;

fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

fn unzigzag(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn write_header(out: &mut Vec<u8>, tag: u8, count: usize) {
    out.push(tag);
    write_varint(out, count as u64);
}

pub fn encode(bucket: &Bucket) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + bucket.occurrence_count() * 4);
    out.push(MAGIC);
    out.push(VERSION);

    write_header(&mut out, TAG_STRUCTURES, bucket.structure_count());
    let mut previous = 0i64;
    for &index in bucket.structure_indices() {
        write_varint(&mut out, zigzag(i64::from(index) - previous));
        previous = i64::from(index);
    }

    write_header(&mut out, TAG_OFFSETS, bucket.structure_count());
    let mut previous = 0u32;
    for &offset in bucket.offsets() {
        write_varint(&mut out, u64::from(offset - previous));
        previous = offset;
    }

    write_header(&mut out, TAG_IDENTIFIERS, bucket.occurrence_count());
    let mut previous = 0i64;
    for &packed in bucket.identifiers() {
        let index1 = (packed >> 32) as i64;
        let index2 = (packed & 0xFFFF_FFFF) as i64;
        write_varint(&mut out, zigzag(index1 - previous));
        write_varint(&mut out, zigzag(index2 - index1));
        previous = index1;
    }

    if !bucket.operators().is_empty() {
        write_header(&mut out, TAG_OPERATORS, bucket.operators().len());
        let mut previous = 0u32;
        for (&position, operator) in bucket.operators() {
            write_varint(&mut out, u64::from(position - previous));
            write_varint(&mut out, operator.len() as u64);
            out.extend_from_slice(operator.as_bytes());
            previous = position;
        }
    }

    out
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn is_empty(&self) -> bool {
        self.position >= self.bytes.len()
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.position)
    }

    fn byte(&mut self) -> Result<u8, CodecError> {
        let byte = *self
            .bytes
            .get(self.position)
            .ok_or(CodecError::Truncated(self.position))?;
        self.position += 1;
        Ok(byte)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .position
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(CodecError::Truncated(self.bytes.len()))?;
        let slice = &self.bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn varint(&mut self) -> Result<u64, CodecError> {
        let start = self.position;
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let byte = self.byte()?;
            let payload = u64::from(byte & 0x7F);
            if shift == 63 && payload > 1 {
                return Err(CodecError::VarintOverflow(start));
            }
            value |= payload << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(CodecError::VarintOverflow(start))
    }

    /// Item count of a field, bounded by the bytes left so corrupt counts cannot force
    /// huge allocations.
    fn count(&mut self) -> Result<usize, CodecError> {
        let count = self.varint()?;
        usize::try_from(count)
            .ok()
            .filter(|&count| count <= self.remaining())
            .ok_or(CodecError::Truncated(self.bytes.len()))
    }
}

fn to_u32(value: i64, what: &str) -> Result<u32, CodecError> {
    u32::try_from(value)
        .map_err(|_| CodecError::Inconsistent(format!("{what} out of range: {value}")))
}

/// Applies a zig-zag delta read from disk; overflow means the input is corrupt.
fn add_delta(previous: i64, encoded: u64, what: &str) -> Result<i64, CodecError> {
    previous
        .checked_add(unzigzag(encoded))
        .ok_or_else(|| CodecError::Inconsistent(format!("{what} delta overflows")))
}

pub fn decode(bytes: &[u8]) -> Result<Bucket, CodecError> {
    let mut reader = ByteReader::new(bytes);
    let magic = reader.byte()?;
    if magic != MAGIC {
        return Err(CodecError::BadMagic(magic));
    }
    let version = reader.byte()?;
    if version != VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let mut structure_indices = Vec::new();
    let mut offsets = Vec::new();
    let mut identifiers = Vec::new();
    let mut operators = BTreeMap::new();
    let mut seen = [false; 5];

    while !reader.is_empty() {
        let tag = reader.byte()?;
        let slot = seen
            .get_mut(usize::from(tag))
            .filter(|_| tag != 0)
            .ok_or(CodecError::UnknownTag(tag))?;
        if *slot {
            return Err(CodecError::Inconsistent(format!("field {tag} appears twice")));
        }
        *slot = true;
        let count = reader.count()?;

        match tag {
            TAG_STRUCTURES => {
                structure_indices.reserve(count);
                let mut previous = 0i64;
                for _ in 0..count {
                    previous = add_delta(previous, reader.varint()?, "structure index")?;
                    structure_indices.push(to_u32(previous, "structure index")?);
                }
            }
            TAG_OFFSETS => {
                offsets.reserve(count);
                let mut previous = 0u64;
                for _ in 0..count {
                    previous = previous.saturating_add(reader.varint()?);
                    offsets.push(to_u32(previous as i64, "offset")?);
                }
            }
            TAG_IDENTIFIERS => {
                identifiers.reserve(count);
                let mut previous = 0i64;
                for _ in 0..count {
                    let index1 = add_delta(previous, reader.varint()?, "residue index")?;
                    let index2 = add_delta(index1, reader.varint()?, "residue index")?;
                    let index1 = to_u32(index1, "residue index")?;
                    let index2 = to_u32(index2, "residue index")?;
                    identifiers.push(u64::from(index1) << 32 | u64::from(index2));
                    previous = i64::from(index1);
                }
            }
            TAG_OPERATORS => {
                let mut previous = 0u64;
                for _ in 0..count {
                    previous = previous.saturating_add(reader.varint()?);
                    let position = to_u32(previous as i64, "overlay position")?;
                    let len = usize::try_from(reader.varint()?)
                        .map_err(|_| CodecError::Truncated(bytes.len()))?;
                    let text = std::str::from_utf8(reader.take(len)?)
                        .map_err(|_| CodecError::InvalidUtf8)?;
                    operators.insert(position, text.to_string());
                }
            }
            _ => return Err(CodecError::UnknownTag(tag)),
        }
    }

    Bucket::from_parts(structure_indices, offsets, identifiers, operators)
}
