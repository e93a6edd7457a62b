use super::error::QueryError;
use crate::core::graph::builder::ContactEdge;
use crate::core::models::selector::IndexSelector;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// How the contact graph of a query motif is reduced before searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PruningStrategy {
    /// Keep every contact.
    None,
    /// Keep a minimum spanning tree over backbone distance.
    #[default]
    MinimumSpanning,
}

impl PruningStrategy {
    /// Reduces `edges` and orders the survivors into a connected path: every step after the
    /// first shares a residue with an earlier step, and among the connectable steps the
    /// lightest goes first.
    ///
    /// # Errors
    ///
    /// [`QueryError::Empty`] when there are no edges, [`QueryError::Disconnected`] when
    /// the edges do not connect every residue in `residues`.
    pub fn apply(
        self,
        edges: Vec<ContactEdge>,
        residues: &[IndexSelector],
    ) -> Result<Vec<ContactEdge>, QueryError> {
        if edges.is_empty() {
            return Err(QueryError::Empty);
        }
        let edges: Vec<ContactEdge> = edges
            .into_iter()
            .sorted_by(|a, b| {
                a.backbone_distance
                    .total_cmp(&b.backbone_distance)
                    .then_with(|| a.occurrence.identifier.cmp(&b.occurrence.identifier))
            })
            .collect();
        let kept = match self {
            PruningStrategy::None => edges,
            PruningStrategy::MinimumSpanning => minimum_spanning(edges, residues),
        };
        order_path(kept, residues)
    }
}

/// Kruskal over edges already sorted by weight.
fn minimum_spanning(edges: Vec<ContactEdge>, residues: &[IndexSelector]) -> Vec<ContactEdge> {
    let positions: BTreeMap<&IndexSelector, usize> = residues
        .iter()
        .enumerate()
        .map(|(position, selector)| (selector, position))
        .collect();
    let mut components = UnionFind::new(residues.len());
    edges
        .into_iter()
        .filter(|edge| {
            let identifier = &edge.occurrence.identifier;
            match (positions.get(&identifier.first), positions.get(&identifier.second)) {
                (Some(&a), Some(&b)) => components.union(a, b),
                _ => false,
            }
        })
        .collect()
}

fn order_path(
    mut remaining: Vec<ContactEdge>,
    residues: &[IndexSelector],
) -> Result<Vec<ContactEdge>, QueryError> {
    let mut path = Vec::with_capacity(remaining.len());
    let mut covered: BTreeSet<IndexSelector> = BTreeSet::new();
    while !remaining.is_empty() {
        let next = if path.is_empty() {
            Some(0)
        } else {
            remaining.iter().position(|edge| {
                covered.contains(&edge.occurrence.identifier.first)
                    || covered.contains(&edge.occurrence.identifier.second)
            })
        };
        let Some(next) = next else {
            return Err(QueryError::Disconnected);
        };
        let edge = remaining.remove(next);
        covered.insert(edge.occurrence.identifier.first.clone());
        covered.insert(edge.occurrence.identifier.second.clone());
        path.push(edge);
    }
    if residues.iter().any(|residue| !covered.contains(residue)) {
        return Err(QueryError::Disconnected);
    }
    Ok(path)
}

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Joins the sets of `a` and `b`; false if they already were one set.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (a, b) = (self.find(a), self.find(b));
        if a == b {
            return false;
        }
        match self.rank[a].cmp(&self.rank[b]) {
            std::cmp::Ordering::Less => self.parent[a] = b,
            std::cmp::Ordering::Greater => self.parent[b] = a,
            std::cmp::Ordering::Equal => {
                self.parent[b] = a;
                self.rank[a] += 1;
            }
        }
        true
    }
}

impl fmt::Display for PruningStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PruningStrategy::None => f.write_str("none"),
            PruningStrategy::MinimumSpanning => f.write_str("minimum-spanning"),
        }
    }
}

impl FromStr for PruningStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(PruningStrategy::None),
            "minimum-spanning" | "mst" => Ok(PruningStrategy::MinimumSpanning),
            other => Err(format!("unknown pruning strategy '{other}'")),
        }
    }
}
