pub mod index;
pub mod search;

#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Commands};
    use crate::utils::progress::CliProgressHandler;
    use clap::Parser;
    use nalgebra::{Point3, Vector3};
    use std::path::Path;
    use strucmotif::core::io::pdb::PdbFile;
    use strucmotif::core::io::traits::StructureFile;
    use strucmotif::core::models::atom::Atom;
    use strucmotif::core::models::structure::{Residue, Structure};
    use tempfile::tempdir;

    const ATOMS: [(&str, [f64; 3]); 5] = [
        ("N", [-1.2, 0.5, 0.0]),
        ("CA", [0.0, 0.0, 0.0]),
        ("C", [1.2, 0.6, 0.3]),
        ("O", [1.5, 1.7, 0.4]),
        ("CB", [0.1, -0.8, -1.2]),
    ];

    /// Three residues along a bent path, passed through `place`.
    fn triad(id: &str, place: impl Fn(Point3<f64>) -> Point3<f64>) -> Structure {
        let residues = ["HIS", "ASP", "SER"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let i = i as f64;
                let base = Vector3::new(3.8 * i, 1.5 * (i % 2.0), 0.7 * i * i);
                let mut residue = Residue::new("A", i as i32 + 1, name);
                for (atom, offset) in ATOMS {
                    let position = Point3::from(Vector3::from(offset) + base);
                    residue.add_atom(Atom::new(atom, place(position)));
                }
                residue
            })
            .collect();
        Structure::new(id, residues)
    }

    fn run(argv: &[&str], progress: &CliProgressHandler) {
        let mut full = vec!["strucmotif"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Index(args) => super::index::run(args, progress).unwrap(),
            Commands::Search(args) => super::search::run(args, progress).unwrap(),
        }
    }

    fn path(p: &Path) -> &str {
        p.to_str().unwrap()
    }

    #[test]
    fn indexed_structures_are_found_by_search() {
        let dir = tempdir().unwrap();
        let structures = dir.path().join("structures");
        std::fs::create_dir(&structures).unwrap();
        PdbFile::write_to_path(&triad("a", |p| p), structures.join("a.pdb")).unwrap();
        PdbFile::write_to_path(
            &triad("b", |p| Point3::new(-p.y + 5.0, p.x - 2.0, p.z + 11.0)),
            structures.join("b.pdb"),
        )
        .unwrap();
        let index = dir.path().join("index");
        let output = dir.path().join("hits.csv");
        let progress = CliProgressHandler::hidden();

        run(&["index", "-s", path(&structures), "-i", path(&index)], &progress);
        run(
            &[
                "search",
                "-i",
                path(&index),
                "-s",
                path(&structures),
                "-Q",
                path(&structures.join("a.pdb")),
                "-r",
                "A:1,A:2,A:3",
                "-o",
                path(&output),
            ],
            &progress,
        );

        let mut reader = csv::Reader::from_path(&output).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        let ids: Vec<&str> = rows.iter().map(|row| &row[0]).collect();
        assert_eq!(ids, vec!["a", "b"]);
        for row in &rows {
            assert!(row[1].parse::<f64>().unwrap() < 0.01);
            assert_eq!(&row[2], "A:1 A:2 A:3");
        }
    }
}
