use crate::core::models::selector::IndexSelector;
use crate::core::models::structure::OperatorId;

/// One of the two residues of a residue pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    First,
    Second,
}

/// How a later residue pair relates to an earlier one, by shared residues.
///
/// Two endpoints are shared when both residue index and operator agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overlap {
    Disjoint,
    /// The later pair's first residue is the earlier pair's given endpoint.
    SharedFirst(Endpoint),
    /// The later pair's second residue is the earlier pair's given endpoint.
    SharedSecond(Endpoint),
    Identical,
    Swapped,
}

/// Locates a residue pair within one structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ResiduePairIdentifier {
    pub first: IndexSelector,
    pub second: IndexSelector,
}

impl ResiduePairIdentifier {
    pub fn new(first: IndexSelector, second: IndexSelector) -> Self {
        Self { first, second }
    }

    /// Identifier of two deposited residues.
    pub fn deposited(index1: u32, index2: u32) -> Self {
        Self::new(IndexSelector::new(index1), IndexSelector::new(index2))
    }

    /// Both residue indices packed as `index1 << 32 | index2`.
    pub fn packed_indices(&self) -> u64 {
        u64::from(self.first.index) << 32 | u64::from(self.second.index)
    }

    pub fn from_packed(packed: u64, operator1: OperatorId, operator2: OperatorId) -> Self {
        Self::new(
            IndexSelector::new((packed >> 32) as u32).with_operator(operator1),
            IndexSelector::new(packed as u32).with_operator(operator2),
        )
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.second.clone(), self.first.clone())
    }

    pub fn endpoint(&self, endpoint: Endpoint) -> &IndexSelector {
        match endpoint {
            Endpoint::First => &self.first,
            Endpoint::Second => &self.second,
        }
    }

    fn shared_endpoint(&self, selector: &IndexSelector) -> Option<Endpoint> {
        if *selector == self.first {
            Some(Endpoint::First)
        } else if *selector == self.second {
            Some(Endpoint::Second)
        } else {
            None
        }
    }

    /// Relation of `later` to `self`.
    pub fn overlap(&self, later: &ResiduePairIdentifier) -> Overlap {
        match (
            self.shared_endpoint(&later.first),
            self.shared_endpoint(&later.second),
        ) {
            (Some(Endpoint::First), Some(Endpoint::Second)) => Overlap::Identical,
            (Some(Endpoint::Second), Some(Endpoint::First)) => Overlap::Swapped,
            (Some(endpoint), None) => Overlap::SharedFirst(endpoint),
            (None, Some(endpoint)) => Overlap::SharedSecond(endpoint),
            // Both endpoints of `later` collapse onto the same residue: treat as disjoint.
            (Some(_), Some(_)) | (None, None) => Overlap::Disjoint,
        }
    }
}
