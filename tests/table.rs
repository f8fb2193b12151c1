use camino::Utf8PathBuf;

use taxlineage::lineage::{RawLineage, normalize};
use taxlineage::table::{LineageTables, output_paths};

#[test]
fn creates_both_files_with_shared_header() {
    let temp = tempfile::tempdir().unwrap();
    let prefix = Utf8PathBuf::from_path_buf(temp.path().join("run")).unwrap();

    let mut tables = LineageTables::create(&prefix).unwrap();
    let pair = normalize(
        "AB000001",
        &RawLineage::Lines(vec![
            "562\tspecies\t562\tEscherichia coli".to_string(),
            "562\tfamily\t543\tEnterobacteriaceae".to_string(),
        ]),
    );
    tables.write_pair(&pair).unwrap();
    tables.into_inner().unwrap();

    let (taxids_path, names_path) = output_paths(&prefix);
    let taxids = std::fs::read_to_string(taxids_path.as_std_path()).unwrap();
    let names = std::fs::read_to_string(names_path.as_std_path()).unwrap();

    let header = "accn\tsuperkingdom\tphylum\tclass\torder\tfamily\tgenus\tspecies";
    assert_eq!(taxids, format!("{header}\nAB000001\t\t\t\t\t543\t\t562\n"));
    assert_eq!(
        names,
        format!("{header}\nAB000001\t\t\t\t\tEnterobacteriaceae\t\tEscherichia coli\n")
    );
}

#[test]
fn names_with_quotes_are_written_verbatim() {
    let mut tables = LineageTables::new(Vec::new(), Vec::new()).unwrap();
    let pair = normalize(
        "Q1",
        &RawLineage::Lines(vec![
            "1\tgenus\t5\t\"Candidatus\" Foo".to_string(),
            "1\tspecies\t6\tFoo bar, strain X".to_string(),
        ]),
    );
    tables.write_pair(&pair).unwrap();
    assert_eq!(tables.rows(), 1);

    let (_, names) = tables.into_inner().unwrap();
    let names = String::from_utf8(names).unwrap();
    assert!(names.ends_with("Q1\t\t\t\t\t\t\"Candidatus\" Foo\tFoo bar, strain X\n"));
}
