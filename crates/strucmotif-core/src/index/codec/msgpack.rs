//! MessagePack bucket encoding.
//!
//! A bucket is one 4-element array: `[structure_indices, offsets, identifiers, overlay]`.
//! The first three are arrays of unsigned integers; the overlay is a map from endpoint
//! position to operator id. Integer and length widths are whatever MessagePack picks for
//! the value, so the format stays readable by any MessagePack implementation.

use super::CodecError;
use crate::index::bucket::Bucket;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};

const FIELD_COUNT: u32 = 4;

fn encode_error<E: std::fmt::Debug>(e: E) -> CodecError {
    CodecError::MessagePack(format!("{e:?}"))
}

fn len_u32(len: usize) -> Result<u32, CodecError> {
    u32::try_from(len).map_err(|_| CodecError::MessagePack(format!("array too long: {len}")))
}

fn write_uint_array<I>(out: &mut Vec<u8>, len: usize, values: I) -> Result<(), CodecError>
where
    I: IntoIterator<Item = u64>,
{
    rmp::encode::write_array_len(out, len_u32(len)?).map_err(encode_error)?;
    for value in values {
        rmp::encode::write_uint(out, value).map_err(encode_error)?;
    }
    Ok(())
}

pub fn encode(bucket: &Bucket) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(16 + bucket.occurrence_count() * 9);
    rmp::encode::write_array_len(&mut out, FIELD_COUNT).map_err(encode_error)?;
    write_uint_array(
        &mut out,
        bucket.structure_count(),
        bucket.structure_indices().iter().map(|&v| u64::from(v)),
    )?;
    write_uint_array(
        &mut out,
        bucket.structure_count(),
        bucket.offsets().iter().map(|&v| u64::from(v)),
    )?;
    write_uint_array(
        &mut out,
        bucket.occurrence_count(),
        bucket.identifiers().iter().copied(),
    )?;
    rmp::encode::write_map_len(&mut out, len_u32(bucket.operators().len())?)
        .map_err(encode_error)?;
    for (&position, operator) in bucket.operators() {
        rmp::encode::write_uint(&mut out, u64::from(position)).map_err(encode_error)?;
        rmp::encode::write_str(&mut out, operator).map_err(encode_error)?;
    }
    Ok(out)
}

fn decode_error<E: std::fmt::Debug>(context: &str) -> impl Fn(E) -> CodecError + '_ {
    move |e| CodecError::MessagePack(format!("{context}: {e:?}"))
}

fn remaining(rd: &Cursor<&[u8]>) -> usize {
    rd.get_ref().len().saturating_sub(rd.position() as usize)
}

fn read_uint_array(rd: &mut Cursor<&[u8]>, context: &str) -> Result<Vec<u64>, CodecError> {
    let len = rmp::decode::read_array_len(rd).map_err(decode_error(context))? as usize;
    if len > remaining(rd) {
        return Err(CodecError::Truncated(rd.get_ref().len()));
    }
    let mut values = Vec::with_capacity(len);
    for _ in 0..len {
        values.push(rmp::decode::read_int::<u64, _>(rd).map_err(decode_error(context))?);
    }
    Ok(values)
}

fn narrow(values: Vec<u64>, context: &str) -> Result<Vec<u32>, CodecError> {
    values
        .into_iter()
        .map(|value| {
            u32::try_from(value)
                .map_err(|_| CodecError::Inconsistent(format!("{context} out of range: {value}")))
        })
        .collect()
}

fn read_overlay(rd: &mut Cursor<&[u8]>) -> Result<BTreeMap<u32, String>, CodecError> {
    let len = rmp::decode::read_map_len(rd).map_err(decode_error("overlay"))? as usize;
    if len > remaining(rd) {
        return Err(CodecError::Truncated(rd.get_ref().len()));
    }
    let mut overlay = BTreeMap::new();
    for _ in 0..len {
        let position =
            rmp::decode::read_int::<u32, _>(rd).map_err(decode_error("overlay position"))?;
        let str_len =
            rmp::decode::read_str_len(rd).map_err(decode_error("overlay operator"))? as usize;
        if str_len > remaining(rd) {
            return Err(CodecError::Truncated(rd.get_ref().len()));
        }
        let mut buf = vec![0u8; str_len];
        rd.read_exact(&mut buf)
            .map_err(|_| CodecError::Truncated(rd.get_ref().len()))?;
        let operator = String::from_utf8(buf).map_err(|_| CodecError::InvalidUtf8)?;
        overlay.insert(position, operator);
    }
    Ok(overlay)
}

pub fn decode(bytes: &[u8]) -> Result<Bucket, CodecError> {
    let mut rd = Cursor::new(bytes);
    let fields = rmp::decode::read_array_len(&mut rd).map_err(decode_error("bucket"))?;
    if fields != FIELD_COUNT {
        return Err(CodecError::MessagePack(format!(
            "expected {FIELD_COUNT} fields, found {fields}"
        )));
    }
    let structure_indices =
        narrow(read_uint_array(&mut rd, "structure indices")?, "structure index")?;
    let offsets = narrow(read_uint_array(&mut rd, "offsets")?, "offset")?;
    let identifiers = read_uint_array(&mut rd, "identifiers")?;
    let operators = read_overlay(&mut rd)?;
    if remaining(&rd) > 0 {
        return Err(CodecError::MessagePack(format!(
            "{} trailing bytes",
            remaining(&rd)
        )));
    }
    Bucket::from_parts(structure_indices, offsets, identifiers, operators)
}
