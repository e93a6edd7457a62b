use crate::core::models::selector::{IndexSelector, LabelSelector};
use crate::core::models::structure::Structure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Which residue copies of a structure take part in its residue graph.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InclusionPolicy {
    /// Deposited coordinates only.
    #[default]
    Deposited,
    /// Every operator copy, keeping pairs with at least one deposited residue.
    DepositedWithContacts,
    /// Residues generated by the given bioassembly; both residues of a pair must belong to it.
    Assembly(String),
    /// Exactly the listed residues.
    Selection(Vec<LabelSelector>),
}

impl InclusionPolicy {
    /// Residue copies admitted by this policy, in ascending selector order.
    pub(crate) fn endpoints(&self, structure: &Structure) -> Vec<IndexSelector> {
        let residue_count = structure.residue_count() as u32;
        let endpoints: BTreeSet<IndexSelector> = match self {
            InclusionPolicy::Deposited => (0..residue_count).map(IndexSelector::new).collect(),
            InclusionPolicy::DepositedWithContacts => structure
                .operator_ids()
                .flat_map(|operator| {
                    (0..residue_count)
                        .map(move |index| IndexSelector::new(index).with_operator(operator.clone()))
                })
                .collect(),
            InclusionPolicy::Assembly(id) => {
                let Some(assembly) = structure.assembly(id) else {
                    debug!(
                        structure = %structure.id,
                        assembly = %id,
                        "Assembly not defined, structure contributes no residues"
                    );
                    return Vec::new();
                };
                let mut endpoints = BTreeSet::new();
                for operator in structure.operator_ids() {
                    for (index, residue) in structure.residues().iter().enumerate() {
                        if assembly.contains(&residue.chain_id, &operator) {
                            endpoints.insert(
                                IndexSelector::new(index as u32).with_operator(operator.clone()),
                            );
                        }
                    }
                }
                endpoints
            }
            InclusionPolicy::Selection(selectors) => selectors
                .iter()
                .filter_map(|selector| select(structure, selector))
                .collect(),
        };
        endpoints.into_iter().collect()
    }

    /// Whether two admitted residue copies may form a pair.
    pub(crate) fn accepts_pair(&self, a: &IndexSelector, b: &IndexSelector) -> bool {
        match self {
            InclusionPolicy::DepositedWithContacts => {
                a.operator.is_identity() || b.operator.is_identity()
            }
            _ => true,
        }
    }
}

fn select(structure: &Structure, selector: &LabelSelector) -> Option<IndexSelector> {
    structure.operator(&selector.operator)?;
    let index = structure
        .residues()
        .iter()
        .position(|residue| {
            residue.chain_id == selector.chain_id && residue.seq_id == selector.seq_id
        });
    if index.is_none() {
        debug!(structure = %structure.id, residue = %selector, "Selected residue not present");
    }
    index.map(|index| IndexSelector::new(index as u32).with_operator(selector.operator.clone()))
}

impl InclusionPolicy {
    /// Short label for log output.
    pub fn name(&self) -> &'static str {
        match self {
            InclusionPolicy::Deposited => "deposited",
            InclusionPolicy::DepositedWithContacts => "deposited-with-contacts",
            InclusionPolicy::Assembly(_) => "assembly",
            InclusionPolicy::Selection(_) => "selection",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::fixtures::helix_structure;
    use crate::core::models::structure::{Assembly, AssemblyGenerator, OperatorId};
    use nalgebra::{Matrix4, Vector3};

    fn structure_with_copies() -> Structure {
        let mut structure = helix_structure("1abc", 4, &[]);
        structure.add_operator(
            OperatorId::new("2"),
            Matrix4::new_translation(&Vector3::new(8.0, 0.0, 0.0)),
        );
        structure.add_assembly(Assembly {
            id: "1".to_string(),
            generators: vec![AssemblyGenerator {
                operators: vec![OperatorId::new("2")],
                chains: vec!["A".to_string()],
            }],
        });
        structure
    }

    #[test]
    fn deposited_admits_identity_copies_only() {
        let endpoints = InclusionPolicy::Deposited.endpoints(&structure_with_copies());
        assert_eq!(endpoints.len(), 4);
        assert!(endpoints.iter().all(|e| e.operator.is_identity()));
    }

    #[test]
    fn deposited_with_contacts_admits_every_copy_but_needs_a_deposited_endpoint() {
        let policy = InclusionPolicy::DepositedWithContacts;
        let endpoints = policy.endpoints(&structure_with_copies());
        assert_eq!(endpoints.len(), 8);

        let deposited = IndexSelector::new(0);
        let copy = IndexSelector::new(1).with_operator(OperatorId::new("2"));
        let other_copy = IndexSelector::new(2).with_operator(OperatorId::new("2"));
        assert!(policy.accepts_pair(&deposited, &copy));
        assert!(!policy.accepts_pair(&copy, &other_copy));
    }

    #[test]
    fn assembly_admits_generated_copies() {
        let structure = structure_with_copies();
        let endpoints = InclusionPolicy::Assembly("1".to_string()).endpoints(&structure);
        assert_eq!(endpoints.len(), 4);
        assert!(endpoints.iter().all(|e| e.operator.as_str() == "2"));
        assert!(InclusionPolicy::Assembly("9".to_string()).endpoints(&structure).is_empty());
    }

    #[test]
    fn selection_admits_listed_residues_once() {
        let policy = InclusionPolicy::Selection(vec![
            LabelSelector::new("A", 3),
            LabelSelector::new("A", 1),
            LabelSelector::new("A", 3),
            LabelSelector::new("B", 1),
            LabelSelector::new("A", 2).with_operator(OperatorId::new("7")),
        ]);
        let endpoints = policy.endpoints(&structure_with_copies());
        assert_eq!(endpoints, vec![IndexSelector::new(0), IndexSelector::new(2)]);
    }

    #[test]
    fn policies_serialize_to_kebab_case_toml() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Wrapper {
            policy: InclusionPolicy,
        }
        for policy in [
            InclusionPolicy::Deposited,
            InclusionPolicy::DepositedWithContacts,
            InclusionPolicy::Assembly("1".to_string()),
            InclusionPolicy::Selection(vec![LabelSelector::new("A", 57)]),
        ] {
            let wrapper = Wrapper { policy };
            let text = toml::to_string(&wrapper).unwrap();
            assert_eq!(toml::from_str::<Wrapper>(&text).unwrap(), wrapper);
        }
        let text = toml::to_string(&Wrapper {
            policy: InclusionPolicy::DepositedWithContacts,
        })
        .unwrap();
        assert!(text.contains("deposited-with-contacts"));
    }
}
