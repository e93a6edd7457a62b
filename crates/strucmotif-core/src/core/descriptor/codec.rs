use crate::core::models::residue::{RESIDUE_TYPE_COUNT, ResidueType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Width of a distance bucket in Angstroms.
pub const DISTANCE_BUCKET_WIDTH: f64 = 1.0;
/// Width of an angle bucket in degrees.
pub const ANGLE_BUCKET_WIDTH: f64 = 10.0;
pub const DISTANCE_BUCKET_COUNT: u8 = 32;
pub const ANGLE_BUCKET_COUNT: u8 = 18;

const FIELD_BITS: u32 = 5;
const FIELD_MASK: u32 = (1 << FIELD_BITS) - 1;
const USED_BITS: u32 = 5 * FIELD_BITS;

const TYPE1_SHIFT: u32 = 4 * FIELD_BITS;
const TYPE2_SHIFT: u32 = 3 * FIELD_BITS;
const BACKBONE_SHIFT: u32 = 2 * FIELD_BITS;
const SIDE_CHAIN_SHIFT: u32 = FIELD_BITS;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Packed descriptor {0:#x} uses bits above bit 25")]
    ReservedBits(u32),
    #[error("Packed descriptor {packed:#x} has invalid residue type ordinal {ordinal}")]
    InvalidResidueType { packed: u32, ordinal: u8 },
    #[error(
        "Packed descriptor {packed:#x} has angle bucket {bucket} (maximum {max})",
        max = ANGLE_BUCKET_COUNT - 1
    )]
    InvalidAngleBucket { packed: u32, bucket: u8 },
    #[error("Packed descriptor {0:#x} is not in canonical residue order")]
    NotCanonical(u32),
}

/// Discretized geometry of one residue pair, packed into 25 bits of a `u32`:
/// `type1 << 20 | type2 << 15 | backbone << 10 | side_chain << 5 | angle`.
///
/// The residue types are always stored in canonical order (`type1 <= type2`). Both
/// distances are symmetric in the pair, so a pair and its reverse encode identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ResiduePairDescriptor(u32);

/// Unpacked fields of a [`ResiduePairDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorFields {
    pub type1: ResidueType,
    pub type2: ResidueType,
    pub backbone_bucket: u8,
    pub side_chain_bucket: u8,
    pub angle_bucket: u8,
}

pub fn distance_bucket(distance: f64) -> u8 {
    (distance / DISTANCE_BUCKET_WIDTH)
        .floor()
        .clamp(0.0, f64::from(DISTANCE_BUCKET_COUNT - 1)) as u8
}

pub fn angle_bucket(degrees: f64) -> u8 {
    (degrees / ANGLE_BUCKET_WIDTH)
        .floor()
        .clamp(0.0, f64::from(ANGLE_BUCKET_COUNT - 1)) as u8
}

impl ResiduePairDescriptor {
    /// Builds a descriptor from buckets, canonicalizing the residue type order and clamping
    /// every bucket into its valid range.
    pub fn new(
        type1: ResidueType,
        type2: ResidueType,
        backbone_bucket: u8,
        side_chain_bucket: u8,
        angle_bucket: u8,
    ) -> Self {
        let (type1, type2) = if type1 <= type2 {
            (type1, type2)
        } else {
            (type2, type1)
        };
        let backbone = u32::from(backbone_bucket.min(DISTANCE_BUCKET_COUNT - 1));
        let side_chain = u32::from(side_chain_bucket.min(DISTANCE_BUCKET_COUNT - 1));
        let angle = u32::from(angle_bucket.min(ANGLE_BUCKET_COUNT - 1));
        Self(
            u32::from(type1.ordinal()) << TYPE1_SHIFT
                | u32::from(type2.ordinal()) << TYPE2_SHIFT
                | backbone << BACKBONE_SHIFT
                | side_chain << SIDE_CHAIN_SHIFT
                | angle,
        )
    }

    /// Discretizes raw pair geometry (distances in Angstroms, angle in degrees).
    pub fn encode(
        type1: ResidueType,
        type2: ResidueType,
        backbone_distance: f64,
        side_chain_distance: f64,
        angle_degrees: f64,
    ) -> Self {
        Self::new(
            type1,
            type2,
            distance_bucket(backbone_distance),
            distance_bucket(side_chain_distance),
            angle_bucket(angle_degrees),
        )
    }

    pub fn from_packed(packed: u32) -> Result<Self, DescriptorError> {
        if packed >> USED_BITS != 0 {
            return Err(DescriptorError::ReservedBits(packed));
        }
        let ordinal1 = ((packed >> TYPE1_SHIFT) & FIELD_MASK) as u8;
        let ordinal2 = ((packed >> TYPE2_SHIFT) & FIELD_MASK) as u8;
        for ordinal in [ordinal1, ordinal2] {
            if usize::from(ordinal) >= RESIDUE_TYPE_COUNT {
                return Err(DescriptorError::InvalidResidueType { packed, ordinal });
            }
        }
        if ordinal1 > ordinal2 {
            return Err(DescriptorError::NotCanonical(packed));
        }
        let angle = (packed & FIELD_MASK) as u8;
        if angle >= ANGLE_BUCKET_COUNT {
            return Err(DescriptorError::InvalidAngleBucket {
                packed,
                bucket: angle,
            });
        }
        Ok(Self(packed))
    }

    pub fn packed(self) -> u32 {
        self.0
    }

    fn field(self, shift: u32) -> u8 {
        ((self.0 >> shift) & FIELD_MASK) as u8
    }

    fn residue_type(self, shift: u32) -> ResidueType {
        // Ordinals are validated on construction.
        ResidueType::from_ordinal(self.field(shift)).unwrap_or(ResidueType::Alanine)
    }

    pub fn type1(self) -> ResidueType {
        self.residue_type(TYPE1_SHIFT)
    }

    pub fn type2(self) -> ResidueType {
        self.residue_type(TYPE2_SHIFT)
    }

    pub fn backbone_bucket(self) -> u8 {
        self.field(BACKBONE_SHIFT)
    }

    pub fn side_chain_bucket(self) -> u8 {
        self.field(SIDE_CHAIN_SHIFT)
    }

    pub fn angle_bucket(self) -> u8 {
        self.field(0)
    }

    pub fn decode(self) -> DescriptorFields {
        DescriptorFields {
            type1: self.type1(),
            type2: self.type2(),
            backbone_bucket: self.backbone_bucket(),
            side_chain_bucket: self.side_chain_bucket(),
            angle_bucket: self.angle_bucket(),
        }
    }
}

impl TryFrom<u32> for ResiduePairDescriptor {
    type Error = DescriptorError;

    fn try_from(packed: u32) -> Result<Self, Self::Error> {
        Self::from_packed(packed)
    }
}

impl From<ResiduePairDescriptor> for u32 {
    fn from(descriptor: ResiduePairDescriptor) -> Self {
        descriptor.0
    }
}

impl fmt::Display for ResiduePairDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.decode();
        write!(
            f,
            "{}-{}:{}:{}:{}",
            fields.type1,
            fields.type2,
            fields.backbone_bucket,
            fields.side_chain_bucket,
            fields.angle_bucket
        )
    }
}

/// Per-dimension tolerance, in buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Tolerance {
    pub backbone: u8,
    pub side_chain: u8,
    pub angle: u8,
}

impl Tolerance {
    pub fn uniform(tolerance: u8) -> Self {
        Self {
            backbone: tolerance,
            side_chain: tolerance,
            angle: tolerance,
        }
    }

    pub fn largest(self) -> u8 {
        self.backbone.max(self.side_chain).max(self.angle)
    }
}

fn bucket_range(center: u8, tolerance: u8, count: u8) -> std::ops::RangeInclusive<u8> {
    center.saturating_sub(tolerance)..=center.saturating_add(tolerance).min(count - 1)
}

/// `original` plus every type it may be exchanged for.
pub(crate) fn allowed_types(
    original: ResidueType,
    exchanges: Option<&[ResidueType]>,
) -> BTreeSet<ResidueType> {
    let mut types = BTreeSet::from([original]);
    types.extend(exchanges.into_iter().flatten().copied());
    types
}

/// Enumerates every descriptor within `tolerance` of `descriptor` in each geometric
/// dimension, crossed with every allowed residue type per position.
///
/// `exchanges[0]` lists the types accepted in place of `descriptor.type1()`,
/// `exchanges[1]` those accepted in place of `descriptor.type2()`. The original types are
/// always included. All results are canonical.
pub fn expand(
    descriptor: ResiduePairDescriptor,
    tolerance: Tolerance,
    exchanges: [Option<&[ResidueType]>; 2],
) -> BTreeSet<ResiduePairDescriptor> {
    let fields = descriptor.decode();
    let types1 = allowed_types(fields.type1, exchanges[0]);
    let types2 = allowed_types(fields.type2, exchanges[1]);

    let backbones =
        bucket_range(fields.backbone_bucket, tolerance.backbone, DISTANCE_BUCKET_COUNT);
    let side_chains =
        bucket_range(fields.side_chain_bucket, tolerance.side_chain, DISTANCE_BUCKET_COUNT);
    let angles = bucket_range(fields.angle_bucket, tolerance.angle, ANGLE_BUCKET_COUNT);

    let mut expanded = BTreeSet::new();
    for &type1 in &types1 {
        for &type2 in &types2 {
            for backbone in backbones.clone() {
                for side_chain in side_chains.clone() {
                    for angle in angles.clone() {
                        expanded.insert(ResiduePairDescriptor::new(
                            type1, type2, backbone, side_chain, angle,
                        ));
                    }
                }
            }
        }
    }
    expanded
}
