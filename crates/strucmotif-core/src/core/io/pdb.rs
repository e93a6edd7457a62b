use crate::core::io::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::structure::{Assembly, AssemblyGenerator, OperatorId, Residue, Structure};
use crate::core::utils::identifiers::is_heavy_atom;
use nalgebra::{Matrix4, Point3};
use std::io::{self, BufRead, Write};
use thiserror::Error;

const OPERATOR_TOLERANCE: f64 = 1e-5;

#[derive(Debug, Error)]
pub enum StructureFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PdbParseErrorKind,
    },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 54 chars)")]
    LineTooShort,
    #[error("Malformed BIOMT record: {0}")]
    InvalidBiomt(String),
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn char_at(line: &str, index: usize) -> Option<char> {
    line.get(index..index + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| !c.is_whitespace())
}

fn parse_int(
    line: &str,
    start: usize,
    end: usize,
    line_num: usize,
) -> Result<i32, StructureFileError> {
    let value = slice_and_trim(line, start, end);
    if value.is_empty() {
        return Err(StructureFileError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::MissingRequiredField {
                columns: format!("{}-{}", start + 1, end),
            },
        });
    }
    value.parse().map_err(|_| StructureFileError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

fn parse_float(
    line: &str,
    start: usize,
    end: usize,
    line_num: usize,
) -> Result<f64, StructureFileError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| StructureFileError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.to_string(),
        },
    })
}

/// Atom name padded to the four-character PDB name field.
fn pdb_atom_name(name: &str) -> String {
    if name.len() < 4 {
        format!(" {name:<3}")
    } else {
        name.to_string()
    }
}

fn element_of(name: &str) -> char {
    name.chars().find(|c| c.is_ascii_alphabetic()).unwrap_or(' ')
}

/// Collects REMARK 350 records into assemblies. Distinct transformations get operator
/// ids "2", "3", ... in order of appearance; the identity matrix maps to the identity
/// operator.
#[derive(Debug, Default)]
struct AssemblyRecords {
    assemblies: Vec<Assembly>,
    operators: Vec<(OperatorId, Matrix4<f64>)>,
    rows: [[f64; 4]; 3],
}

impl AssemblyRecords {
    fn current_generator(&mut self) -> Option<&mut AssemblyGenerator> {
        self.assemblies
            .last_mut()
            .and_then(|assembly| assembly.generators.last_mut())
    }

    fn parse_line(&mut self, line: &str, line_num: usize) -> Result<(), StructureFileError> {
        let content = line.get(10..).unwrap_or("").trim();
        if let Some(id) = content.strip_prefix("BIOMOLECULE:") {
            self.assemblies.push(Assembly {
                id: id.trim().to_string(),
                generators: Vec::new(),
            });
        } else if let Some(chains) = content.strip_prefix("APPLY THE FOLLOWING TO CHAINS:") {
            if let Some(assembly) = self.assemblies.last_mut() {
                assembly.generators.push(AssemblyGenerator {
                    operators: Vec::new(),
                    chains: split_chains(chains),
                });
            }
        } else if let Some(chains) = content.strip_prefix("AND CHAINS:") {
            if let Some(generator) = self.current_generator() {
                generator.chains.extend(split_chains(chains));
            }
        } else if content.starts_with("BIOMT") {
            self.parse_biomt(content, line_num)?;
        }
        Ok(())
    }

    fn parse_biomt(&mut self, content: &str, line_num: usize) -> Result<(), StructureFileError> {
        let invalid = || StructureFileError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::InvalidBiomt(content.to_string()),
        };
        let fields: Vec<&str> = content.split_whitespace().collect();
        if fields.len() < 6 {
            return Err(invalid());
        }
        let row: usize = fields[0]
            .get(5..)
            .and_then(|row| row.parse().ok())
            .filter(|row| (1..=3).contains(row))
            .ok_or_else(invalid)?;
        let mut values = [0.0; 4];
        for (value, field) in values.iter_mut().zip(&fields[2..6]) {
            *value = field.parse().map_err(|_| invalid())?;
        }
        self.rows[row - 1] = values;

        if row == 3 {
            let [r1, r2, r3] = self.rows;
            #[rustfmt::skip]
            let matrix = Matrix4::new(
                r1[0], r1[1], r1[2], r1[3],
                r2[0], r2[1], r2[2], r2[3],
                r3[0], r3[1], r3[2], r3[3],
                0.0,   0.0,   0.0,   1.0,
            );
            let id = self.operator_id(matrix);
            if let Some(generator) = self.current_generator() {
                if !generator.operators.contains(&id) {
                    generator.operators.push(id);
                }
            }
        }
        Ok(())
    }

    fn operator_id(&mut self, matrix: Matrix4<f64>) -> OperatorId {
        if (matrix - Matrix4::identity()).amax() < OPERATOR_TOLERANCE {
            return OperatorId::identity();
        }
        if let Some((id, _)) = self
            .operators
            .iter()
            .find(|(_, known)| (known - matrix).amax() < OPERATOR_TOLERANCE)
        {
            return id.clone();
        }
        let id = OperatorId::new(&(self.operators.len() + 2).to_string());
        self.operators.push((id.clone(), matrix));
        id
    }

    fn apply_to(self, structure: &mut Structure) {
        for (id, matrix) in self.operators {
            structure.add_operator(id, matrix);
        }
        for assembly in self.assemblies {
            structure.add_assembly(assembly);
        }
    }
}

fn split_chains(chains: &str) -> Vec<String> {
    chains
        .split(',')
        .map(str::trim)
        .filter(|chain| !chain.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fixed-column PDB coordinate reader and writer.
///
/// Only the first model is read. Hydrogens are dropped and only the first alternate
/// location of an atom is kept. PDB files carry author numbering only, so label and
/// author numbering coincide.
pub struct PdbFile;

impl StructureFile for PdbFile {
    type Error = StructureFileError;

    fn read_from(reader: &mut impl BufRead, id: &str) -> Result<Structure, Self::Error> {
        let mut residues: Vec<Residue> = Vec::new();
        let mut current_key: Option<(String, i32, Option<char>, String)> = None;
        let mut assemblies = AssemblyRecords::default();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let record = line.get(0..6).unwrap_or(line.as_str()).trim_end();

            match record {
                "ATOM" | "HETATM" => {
                    if line.len() < 54 {
                        return Err(StructureFileError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort,
                        });
                    }
                    let atom_name = slice_and_trim(&line, 12, 16);
                    if atom_name.is_empty() {
                        return Err(StructureFileError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField {
                                columns: "13-16".to_string(),
                            },
                        });
                    }
                    let element = slice_and_trim(&line, 76, 78);
                    let is_hydrogen = if element.is_empty() {
                        !is_heavy_atom(atom_name)
                    } else {
                        matches!(element, "H" | "D")
                    };
                    if is_hydrogen {
                        continue;
                    }

                    let residue_name = slice_and_trim(&line, 17, 20).to_string();
                    let chain_id = slice_and_trim(&line, 21, 22).to_string();
                    let seq_id = parse_int(&line, 22, 26, line_num)?;
                    let insertion_code = char_at(&line, 26);
                    let position = Point3::new(
                        parse_float(&line, 30, 38, line_num)?,
                        parse_float(&line, 38, 46, line_num)?,
                        parse_float(&line, 46, 54, line_num)?,
                    );

                    let key = (chain_id, seq_id, insertion_code, residue_name);
                    if current_key.as_ref() != Some(&key) {
                        let (chain_id, seq_id, insertion_code, residue_name) = &key;
                        residues.push(
                            Residue::new(chain_id, *seq_id, residue_name).with_author(
                                chain_id,
                                *seq_id,
                                *insertion_code,
                            ),
                        );
                        current_key = Some(key);
                    }
                    if let Some(residue) = residues.last_mut() {
                        if residue.atom(atom_name).is_none() {
                            residue.add_atom(Atom::new(atom_name, position));
                        }
                    }
                }
                "REMARK" if slice_and_trim(&line, 6, 10) == "350" => {
                    assemblies.parse_line(&line, line_num)?;
                }
                "ENDMDL" => break,
                _ => {}
            }
        }

        if residues.is_empty() {
            return Err(StructureFileError::MissingRecord("ATOM/HETATM".to_string()));
        }
        let mut structure = Structure::new(id, residues);
        assemblies.apply_to(&mut structure);
        Ok(structure)
    }

    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        for assembly in structure.assemblies() {
            writeln!(writer, "REMARK 350 BIOMOLECULE: {}", assembly.id)?;
            for generator in &assembly.generators {
                writeln!(
                    writer,
                    "REMARK 350 APPLY THE FOLLOWING TO CHAINS: {}",
                    generator.chains.join(", ")
                )?;
                for (serial, operator) in generator.operators.iter().enumerate() {
                    let Some(matrix) = structure.operator(operator) else {
                        continue;
                    };
                    for row in 0..3 {
                        writeln!(
                            writer,
                            "REMARK 350   BIOMT{} {:>3}{:>10.6}{:>10.6}{:>10.6}{:>15.5}",
                            row + 1,
                            serial + 1,
                            matrix[(row, 0)],
                            matrix[(row, 1)],
                            matrix[(row, 2)],
                            matrix[(row, 3)],
                        )?;
                    }
                }
            }
        }

        let mut serial = 0usize;
        for residue in structure.residues() {
            let record = if residue.residue_type.is_some() {
                "ATOM  "
            } else {
                "HETATM"
            };
            let chain = residue.author_chain_id.chars().next().unwrap_or(' ');
            let insertion_code = residue.insertion_code.unwrap_or(' ');
            for atom in residue.atoms() {
                serial += 1;
                writeln!(
                    writer,
                    "{record}{serial:>5} {name:<4} {residue_name:>3} {chain}{seq_id:>4}{insertion_code}   {x:>8.3}{y:>8.3}{z:>8.3}{occupancy:>6.2}{b_factor:>6.2}          {element:>2}",
                    serial = serial % 100_000,
                    name = pdb_atom_name(&atom.name),
                    residue_name = residue.name,
                    seq_id = residue.author_seq_id,
                    x = atom.position.x,
                    y = atom.position.y,
                    z = atom.position.z,
                    occupancy = 1.0,
                    b_factor = 0.0,
                    element = element_of(&atom.name),
                )?;
            }
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}
