//! Synthetic structures for tests.
//!
//! Residues are built from ideal templates and placed along a helix-like curve, so every
//! structure has realistic contact distances without shipping coordinate files.

use super::atom::Atom;
use super::structure::{Residue, Structure};
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion};

const BACKBONE: [(&str, [f64; 3]); 4] = [
    ("N", [-0.525, 1.363, 0.0]),
    ("CA", [0.0, 0.0, 0.0]),
    ("C", [1.526, 0.0, 0.0]),
    ("O", [2.153, -1.062, 0.0]),
];

const BETA_CARBON: (&str, [f64; 3]) = ("CB", [-0.529, -0.774, -1.205]);

fn side_chain(name: &str) -> &'static [(&'static str, [f64; 3])] {
    match name {
        "SER" => &[("OG", [0.112, -1.874, -1.986])],
        "ASP" => &[
            ("CG", [-0.305, -2.214, -1.703]),
            ("OD1", [0.612, -2.882, -1.154]),
            ("OD2", [-1.104, -2.713, -2.545]),
        ],
        "HIS" => &[
            ("CG", [-0.214, -2.203, -1.812]),
            ("ND1", [0.935, -2.716, -1.248]),
            ("CD2", [-1.108, -3.124, -2.318]),
            ("CE1", [0.841, -4.015, -1.497]),
            ("NE2", [-0.391, -4.306, -2.117]),
        ],
        "CYS" => &[("SG", [0.244, -2.051, -2.337])],
        _ => &[],
    }
}

/// Rigid placement of the `i`-th residue along the helix.
pub(crate) fn helix_placement(i: usize) -> Isometry3<f64> {
    let theta = (100.0 * i as f64).to_radians();
    Isometry3::from_parts(
        Translation3::new(2.3 * theta.cos(), 2.3 * theta.sin(), 1.5 * i as f64),
        UnitQuaternion::from_euler_angles(0.35, -0.2 + 0.01 * i as f64, theta),
    )
}

/// Builds a residue from templates. Glycine carries no CB.
pub(crate) fn residue_at(
    chain_id: &str,
    seq_id: i32,
    name: &str,
    placement: &Isometry3<f64>,
) -> Residue {
    let mut residue = Residue::new(chain_id, seq_id, name);
    let beta_carbon = (name != "GLY").then_some(BETA_CARBON);
    for (atom_name, [x, y, z]) in BACKBONE
        .iter()
        .copied()
        .chain(beta_carbon)
        .chain(side_chain(name).iter().copied())
    {
        residue.add_atom(Atom::new(atom_name, placement * Point3::new(x, y, z)));
    }
    residue
}

/// A single-chain helix of `length` residues. Positions listed in `special` get the given
/// component name, every other position is alanine (or glycine on every fifth residue).
pub(crate) fn helix_structure(id: &str, length: usize, special: &[(usize, &str)]) -> Structure {
    let residues = (0..length)
        .map(|i| {
            let name = special
                .iter()
                .find(|(position, _)| *position == i)
                .map(|(_, name)| *name)
                .unwrap_or(if i % 5 == 4 { "GLY" } else { "ALA" });
            residue_at("A", i as i32 + 1, name, &helix_placement(i))
        })
        .collect();
    Structure::new(id, residues)
}

/// Label sequence ids of the triad residues in [`triad_structure`], in motif order.
pub(crate) const TRIAD_SEQ_IDS: [i32; 3] = [3, 6, 10];

/// Twelve residues with exactly one His, one Asp and one Ser forming a compact triad.
pub(crate) fn triad_structure(id: &str) -> Structure {
    helix_structure(id, 12, &[(2, "HIS"), (5, "ASP"), (9, "SER")])
}

/// Same residue types as [`triad_structure`] but arranged differently along the helix.
pub(crate) fn scrambled_triad_structure(id: &str) -> Structure {
    helix_structure(id, 16, &[(1, "SER"), (7, "HIS"), (14, "ASP")])
}

/// Rigidly moved copy of `structure` under a new id. Operators and assemblies are not copied.
pub(crate) fn moved(structure: &Structure, id: &str, motion: &Isometry3<f64>) -> Structure {
    let residues = structure
        .residues()
        .iter()
        .map(|residue| {
            let mut copy = Residue::new(&residue.chain_id, residue.seq_id, &residue.name)
                .with_author(
                    &residue.author_chain_id,
                    residue.author_seq_id,
                    residue.insertion_code,
                );
            for atom in residue.atoms() {
                copy.add_atom(Atom::new(&atom.name, motion * atom.position));
            }
            copy
        })
        .collect();
    Structure::new(id, residues)
}

pub(crate) fn motion(seed: usize) -> Isometry3<f64> {
    let s = seed as f64;
    Isometry3::from_parts(
        Translation3::new(10.0 * s - 3.0, -4.0 * s, 7.5 + s),
        UnitQuaternion::from_euler_angles(0.3 * s, 1.1 - 0.2 * s, -0.7 * s),
    )
}
