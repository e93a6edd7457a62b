use super::codec::ResiduePairDescriptor;
use super::identifier::ResiduePairIdentifier;

/// A residue pair observed in a structure: its descriptor and where it was found.
///
/// The identifier is oriented like the descriptor: its first endpoint carries
/// `descriptor.type1()` and its second endpoint `descriptor.type2()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResiduePairOccurrence {
    pub descriptor: ResiduePairDescriptor,
    pub identifier: ResiduePairIdentifier,
}

impl ResiduePairOccurrence {
    pub fn new(descriptor: ResiduePairDescriptor, identifier: ResiduePairIdentifier) -> Self {
        Self {
            descriptor,
            identifier,
        }
    }
}
