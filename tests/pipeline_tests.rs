use std::fs;
use std::path::Path;

use xlt_rs::pipeline::{self, Options};

const CSV_HEADER: &str = "\"GID\",\"TID\",\"Size\",\"Start\",\"End\",\"Strain\",\"Species\"";

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn options(root: &Path, prefix: &str) -> Options {
    Options {
        output_prefix: root.join("out").join(prefix).to_string_lossy().into_owned(),
        input_dir: root.join("genomes"),
        taxonomy_dir: root.join("taxonomy"),
        ..Options::default()
    }
}

fn setup_scenario(root: &Path) {
    write(
        &root.join("genomes/Escherichia_coli_K12/NC_000913.fna"),
        ">NC|123|x|x|Escherichia coli strain K12, complete genome\nACGT\n",
    );
    write(
        &root.join("genomes/Shigella_flexneri/NC_004851.fna"),
        ">NC|124|x|x|Shigella flexneri 2a plasmid pCP301, complete sequence\nGGGG\n",
    );
    write(&root.join("taxonomy/gi_taxid_nucl.dmp"), "123\t511145\n");
    write(&root.join("taxonomy/nodes.dmp"), "511145|83333|no rank|...\n");
    write(
        &root.join("taxonomy/names.dmp"),
        "83333|Escherichia coli|...|scientific name|\n",
    );
    fs::create_dir_all(root.join("out")).unwrap();
}

#[test]
fn test_end_to_end_scenario() {
    let dir = tempfile::tempdir().unwrap();
    setup_scenario(dir.path());
    let opts = options(dir.path(), "bacteria");

    let summary = pipeline::run(&opts);
    assert_eq!(summary.collect.directories, 2);
    assert_eq!(summary.collect.sequences_written, 1);
    assert_eq!(summary.collect.plasmids_skipped, 1);
    assert_eq!(summary.rows_written, 1);
    assert_eq!(summary.passes.len(), 3);
    assert!(summary.passes.iter().all(|p| p.is_complete()));

    let fasta = fs::read_to_string(opts.fasta_path()).unwrap();
    assert_eq!(
        fasta,
        ">NC|123|x|x|Escherichia coli strain K12, complete genome\nACGT\n"
    );

    let csv = fs::read_to_string(opts.csv_path()).unwrap();
    assert_eq!(
        csv,
        format!(
            "{}\n123,511145,4,0,0,\"Escherichia coli strain K12\",\"Escherichia coli\"\n",
            CSV_HEADER
        )
    );
}

#[test]
fn test_unresolved_records_are_left_out() {
    let dir = tempfile::tempdir().unwrap();
    setup_scenario(dir.path());
    write(
        &dir.path().join("genomes/Unknown/x.fna"),
        ">NC|555|x|x|Mystery bacterium, complete genome\nAAAAAAAAAA\n",
    );
    let opts = options(dir.path(), "bacteria");

    let summary = pipeline::run(&opts);
    assert_eq!(summary.collect.sequences_written, 2);
    assert_eq!(summary.rows_written, 1);

    let fasta = fs::read_to_string(opts.fasta_path()).unwrap();
    assert!(fasta.contains(">NC|555|x|x|Mystery bacterium, complete genome\nAAAAAAAAAA\n"));

    let csv = fs::read_to_string(opts.csv_path()).unwrap();
    assert!(!csv.contains("555"));
    assert_eq!(csv.lines().count(), 2);
}

#[test]
fn test_missing_reference_files_still_produce_outputs() {
    let dir = tempfile::tempdir().unwrap();
    setup_scenario(dir.path());
    fs::remove_file(dir.path().join("taxonomy/names.dmp")).unwrap();
    fs::remove_file(dir.path().join("taxonomy/gi_taxid_nucl.dmp")).unwrap();
    let opts = options(dir.path(), "bacteria");

    let summary = pipeline::run(&opts);
    assert!(!summary.passes[0].is_complete());
    assert!(!summary.passes[2].is_complete());
    assert_eq!(summary.rows_written, 0);

    let csv = fs::read_to_string(opts.csv_path()).unwrap();
    assert_eq!(csv, format!("{}\n", CSV_HEADER));
    assert!(fs::read_to_string(opts.fasta_path()).unwrap().contains("NC|123|"));
}

#[test]
fn test_unreadable_output_location_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    setup_scenario(dir.path());
    let opts = Options {
        output_prefix: dir
            .path()
            .join("no/such/dir/bacteria")
            .to_string_lossy()
            .into_owned(),
        ..options(dir.path(), "unused")
    };

    let summary = pipeline::run(&opts);
    assert_eq!(summary.collect.sequences_written, 0);
    assert_eq!(summary.rows_written, 0);
    assert!(!opts.csv_path().exists());
}

#[test]
fn test_collection_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    setup_scenario(dir.path());
    write(
        &dir.path().join("genomes/Escherichia_coli_K12/more/NC_000914.fna"),
        ">NC|200|x|x|Escherichia coli strain W\nAC\nGT\n\
         >NC|201|x|x|Escherichia coli strain W plasmid pW\nA\n",
    );

    let first = options(dir.path(), "first");
    let second = options(dir.path(), "second");
    pipeline::run(&first);
    pipeline::run(&second);

    let a = fs::read_to_string(first.fasta_path()).unwrap();
    let b = fs::read_to_string(second.fasta_path()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.matches('>').count(), 2);
    assert_eq!(
        fs::read_to_string(first.csv_path()).unwrap(),
        fs::read_to_string(second.csv_path()).unwrap()
    );
}

#[test]
fn test_duplicate_genome_across_directories_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    setup_scenario(dir.path());
    write(
        &dir.path().join("genomes/Zz_copy/dup.fna"),
        ">NC|123|x|x|Another copy of 123\nTTTTTTTT\n",
    );
    let opts = options(dir.path(), "bacteria");

    let summary = pipeline::run(&opts);
    assert_eq!(summary.collect.duplicates_skipped, 1);
    assert_eq!(summary.rows_written, 1);

    let fasta = fs::read_to_string(opts.fasta_path()).unwrap();
    assert!(!fasta.contains("Another copy"));
    let csv = fs::read_to_string(opts.csv_path()).unwrap();
    assert!(csv.contains("123,511145,4,0,0,"));
}
