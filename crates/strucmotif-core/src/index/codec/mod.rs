//! Binary encodings of [`Bucket`]s.
//!
//! - [`compact`] - Tagged fields of delta and zig-zag encoded varints
//! - [`msgpack`] - A self-describing MessagePack array

pub mod compact;
pub mod msgpack;

use super::bucket::Bucket;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unexpected end of input after {0} bytes")]
    Truncated(usize),
    #[error("Bad magic byte {0:#04x}")]
    BadMagic(u8),
    #[error("Unsupported format version {0}")]
    UnsupportedVersion(u8),
    #[error("Unknown field tag {0}")]
    UnknownTag(u8),
    #[error("Varint exceeds 64 bits at byte {0}")]
    VarintOverflow(usize),
    #[error("Invalid UTF-8 in operator id")]
    InvalidUtf8,
    #[error("Inconsistent bucket: {0}")]
    Inconsistent(String),
    #[error("MessagePack error: {0}")]
    MessagePack(String),
}

/// Selects the on-disk encoding of buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BucketCodecKind {
    #[default]
    Compact,
    MessagePack,
}

impl BucketCodecKind {
    pub fn encode(self, bucket: &Bucket) -> Result<Vec<u8>, CodecError> {
        match self {
            BucketCodecKind::Compact => Ok(compact::encode(bucket)),
            BucketCodecKind::MessagePack => msgpack::encode(bucket),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<Bucket, CodecError> {
        match self {
            BucketCodecKind::Compact => compact::decode(bytes),
            BucketCodecKind::MessagePack => msgpack::decode(bytes),
        }
    }
}

impl fmt::Display for BucketCodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketCodecKind::Compact => f.write_str("compact"),
            BucketCodecKind::MessagePack => f.write_str("message-pack"),
        }
    }
}

impl FromStr for BucketCodecKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(BucketCodecKind::Compact),
            "message-pack" | "messagepack" | "msgpack" => Ok(BucketCodecKind::MessagePack),
            other => Err(format!("unknown bucket codec '{other}'")),
        }
    }
}
