use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::collector::{self, CollectStats};
use crate::gz_stream::locate_dump;
use crate::join::{self, GiTaxidPass, JoinPass, NodeRankPass, PassReport, ScientificNamePass};
use crate::output;
use crate::translation::TranslationTable;

#[derive(Debug, Clone)]
pub struct Options {
    pub output_prefix: String,
    pub input_dir: PathBuf,
    pub taxonomy_dir: PathBuf,
    pub extensions: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            output_prefix: String::new(),
            input_dir: PathBuf::from("."),
            taxonomy_dir: PathBuf::from("."),
            extensions: vec!["fna".to_string()],
        }
    }
}

impl Options {
    pub fn fasta_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.fna", self.output_prefix))
    }

    pub fn csv_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.csv", self.output_prefix))
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub collect: CollectStats,
    pub passes: Vec<PassReport>,
    pub rows_written: usize,
}

fn write_merged_fasta(opts: &Options, table: &mut TranslationTable) -> Result<CollectStats> {
    let path = opts.fasta_path();
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    let stats = collector::collect(&opts.input_dir, &opts.extensions, table, &mut out)
        .with_context(|| format!("failed to collect sequences into {}", path.display()))?;
    out.flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(stats)
}

fn stage<P: JoinPass>(pass: &P, table: &mut TranslationTable, dir: &Path) -> PassReport {
    let path = locate_dump(dir, pass.dump_name());
    log::info!("processing {} ...", path.display());
    let report = join::run_pass_file(pass, table, &path);

    if let Some(e) = &report.error {
        log::error!("{}", e);
    }
    if report.misses > 0 {
        log::warn!(
            "{}: {} unparseable lines skipped, first: {}",
            pass.dump_name(),
            report.misses,
            report.miss_samples[0]
        );
    }
    log::info!(
        "processing {} ... completed ({} lines, {} keys needed, {} records resolved)",
        pass.dump_name(),
        report.lines_read,
        report.index_entries,
        report.resolved
    );
    report
}

/// Runs the three joins in their required order.
pub fn resolve_taxonomy(table: &mut TranslationTable, taxonomy_dir: &Path) -> Vec<PassReport> {
    vec![
        stage(&GiTaxidPass, table, taxonomy_dir),
        stage(&NodeRankPass, table, taxonomy_dir),
        stage(&ScientificNamePass, table, taxonomy_dir),
    ]
}

/// Builds `<prefix>.fna` and `<prefix>.csv`. Failures are logged and the run
/// continues with whatever was produced.
pub fn run(opts: &Options) -> RunSummary {
    let mut table = TranslationTable::new();
    let mut summary = RunSummary::default();

    match write_merged_fasta(opts, &mut table) {
        Ok(stats) => summary.collect = stats,
        Err(e) => log::error!("{:#}", e),
    }
    log::info!(
        "{} sequences written to {} ({} plasmids, {} duplicates, {} malformed headers skipped)",
        summary.collect.sequences_written,
        opts.fasta_path().display(),
        summary.collect.plasmids_skipped,
        summary.collect.duplicates_skipped,
        summary.collect.malformed_skipped
    );

    summary.passes = resolve_taxonomy(&mut table, &opts.taxonomy_dir);

    let csv_path = opts.csv_path();
    match output::write_translation_file(&csv_path, &table) {
        Ok(rows) => {
            summary.rows_written = rows;
            log::info!("{} rows written to {}", rows, csv_path.display());
        }
        Err(e) => log::error!("{}", e),
    }

    let unresolved = table.len() - table.resolved().count();
    if unresolved > 0 {
        log::info!("{} records without a taxon id were left out", unresolved);
    }

    summary
}
