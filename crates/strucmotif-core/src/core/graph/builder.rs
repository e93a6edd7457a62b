use super::policy::InclusionPolicy;
use crate::core::descriptor::codec::ResiduePairDescriptor;
use crate::core::descriptor::identifier::ResiduePairIdentifier;
use crate::core::descriptor::occurrence::ResiduePairOccurrence;
use crate::core::models::residue::ResidueType;
use crate::core::models::selector::IndexSelector;
use crate::core::models::structure::Structure;
use crate::core::utils::geometry::{angle_degrees, direction, virtual_beta_carbon};
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::{Point3, Unit, Vector3};
use std::cmp::Ordering;
use tracing::debug;

/// Default contact cutoff between backbone anchors, in Angstroms.
pub const DEFAULT_CUTOFF: f64 = 20.0;

/// A contacting residue pair together with its exact backbone-anchor distance.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactEdge {
    pub occurrence: ResiduePairOccurrence,
    pub backbone_distance: f64,
}

/// All contacting residue pairs of one structure, each unordered pair once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResidueGraph {
    edges: Vec<ContactEdge>,
}

impl ResidueGraph {
    pub fn edges(&self) -> &[ContactEdge] {
        &self.edges
    }

    pub fn into_edges(self) -> Vec<ContactEdge> {
        self.edges
    }

    pub fn occurrences(&self) -> impl Iterator<Item = &ResiduePairOccurrence> {
        self.edges.iter().map(|edge| &edge.occurrence)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[derive(Debug, Clone)]
struct AnchoredResidue {
    selector: IndexSelector,
    residue_type: ResidueType,
    backbone: Point3<f64>,
    side_chain: Point3<f64>,
    orientation: Unit<Vector3<f64>>,
}

/// Extracts residue-pair occurrences from structures.
#[derive(Debug, Clone)]
pub struct ResidueGraphBuilder {
    squared_cutoff: f64,
    policy: InclusionPolicy,
}

impl Default for ResidueGraphBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_CUTOFF, InclusionPolicy::default())
    }
}

impl ResidueGraphBuilder {
    pub fn new(cutoff: f64, policy: InclusionPolicy) -> Self {
        Self {
            squared_cutoff: cutoff * cutoff,
            policy,
        }
    }

    pub fn cutoff(&self) -> f64 {
        self.squared_cutoff.sqrt()
    }

    pub fn policy(&self) -> &InclusionPolicy {
        &self.policy
    }

    /// Builds the residue graph of `structure`.
    ///
    /// Residues admitted by the inclusion policy are anchored (backbone and side-chain
    /// anchor plus orientation); residues of unknown type or without anchor atoms are
    /// skipped. Candidate pairs come from a fixed-radius k-d tree query on backbone
    /// anchors. The returned edges are sorted by occurrence, independent of residue order.
    pub fn build(&self, structure: &Structure) -> ResidueGraph {
        let anchored: Vec<AnchoredResidue> = self
            .policy
            .endpoints(structure)
            .into_iter()
            .filter_map(|selector| {
                let anchored = anchor(structure, &selector);
                if anchored.is_none() {
                    debug!(
                        structure = %structure.id,
                        residue = selector.index,
                        operator = %selector.operator,
                        "Skipping residue without type or anchor atoms"
                    );
                }
                anchored
            })
            .collect();
        if anchored.len() < 2 {
            return ResidueGraph::default();
        }

        let positions: Vec<[f64; 3]> = anchored
            .iter()
            .map(|residue| [residue.backbone.x, residue.backbone.y, residue.backbone.z])
            .collect();
        let kdtree: KdTree<f64, 3> = (&positions).into();

        let mut edges = Vec::new();
        for (i, residue) in anchored.iter().enumerate() {
            let neighbours =
                kdtree.within_unsorted::<SquaredEuclidean>(&positions[i], self.squared_cutoff);
            for neighbour in neighbours {
                let j = neighbour.item as usize;
                if j <= i || neighbour.distance > self.squared_cutoff {
                    continue;
                }
                let other = &anchored[j];
                if !self.policy.accepts_pair(&residue.selector, &other.selector) {
                    continue;
                }
                edges.push(contact(residue, other, neighbour.distance.sqrt()));
            }
        }
        edges.sort_by(|a, b| a.occurrence.cmp(&b.occurrence));
        ResidueGraph { edges }
    }
}

fn anchor(structure: &Structure, selector: &IndexSelector) -> Option<AnchoredResidue> {
    let residue = structure.residue(selector.index)?;
    let residue_type = residue.residue_type?;
    let backbone = residue.atom_position(residue_type.backbone_anchor())?;
    let side_chain = match residue.atom_position(residue_type.side_chain_anchor()) {
        Some(position) => position,
        None if residue_type.is_amino_acid() => virtual_beta_carbon(
            &residue.atom_position("N")?,
            &backbone,
            &residue.atom_position("C")?,
        )?,
        None => return None,
    };
    let backbone = structure.transform(&selector.operator, &backbone)?;
    let side_chain = structure.transform(&selector.operator, &side_chain)?;
    let orientation = direction(&backbone, &side_chain)?;
    Some(AnchoredResidue {
        selector: selector.clone(),
        residue_type,
        backbone,
        side_chain,
        orientation,
    })
}

fn contact(a: &AnchoredResidue, b: &AnchoredResidue, backbone_distance: f64) -> ContactEdge {
    let side_chain_distance = (a.side_chain - b.side_chain).norm();
    let angle = angle_degrees(&a.orientation, &b.orientation);
    let descriptor = ResiduePairDescriptor::encode(
        a.residue_type,
        b.residue_type,
        backbone_distance,
        side_chain_distance,
        angle,
    );
    // The identifier's first endpoint carries the descriptor's first type.
    let (first, second) = match a.residue_type.cmp(&b.residue_type) {
        Ordering::Less => (a, b),
        Ordering::Greater => (b, a),
        Ordering::Equal if a.selector <= b.selector => (a, b),
        Ordering::Equal => (b, a),
    };
    ContactEdge {
        occurrence: ResiduePairOccurrence::new(
            descriptor,
            ResiduePairIdentifier::new(first.selector.clone(), second.selector.clone()),
        ),
        backbone_distance,
    }
}
