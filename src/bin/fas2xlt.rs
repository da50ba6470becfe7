// Merges per-organism NCBI FASTA downloads into one reference FASTA, drops
// plasmids, and writes the matching taxonomy translation table.
//
// Usage: fas2xlt bacteria
// produces bacteria.fna and bacteria.csv from the subdirectories of the current
// directory, using gi_taxid_nucl.dmp, nodes.dmp and names.dmp from the same place.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};

use xlt_rs::pipeline::{self, Options};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Output prefix; writes <prefix>.fna and <prefix>.csv
    #[clap(value_name = "OUTPUT_PREFIX")]
    output_prefix: Option<String>,

    /// Directory whose subdirectories hold the FASTA downloads
    #[clap(short = 'i', long, default_value = ".", value_parser)]
    input_dir: PathBuf,

    /// Directory holding gi_taxid_nucl.dmp, nodes.dmp and names.dmp (optionally .gz)
    #[clap(short = 't', long, default_value = ".", value_parser)]
    taxonomy_dir: PathBuf,

    /// FASTA file extension to collect; may be repeated
    #[clap(
        short = 'e',
        long = "extension",
        default_value = "fna",
        action = clap::ArgAction::Append
    )]
    extensions: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let output_prefix = match args.output_prefix {
        Some(prefix) => prefix,
        None => {
            if let Err(e) = Args::command().print_help() {
                log::error!("{}", e);
            }
            return ExitCode::SUCCESS;
        }
    };

    let opts = Options {
        output_prefix,
        input_dir: args.input_dir,
        taxonomy_dir: args.taxonomy_dir,
        extensions: args.extensions,
    };

    let summary = pipeline::run(&opts);
    log::info!(
        "done: {} directories ({} failed), {} sequences, {} translation rows",
        summary.collect.directories,
        summary.collect.failed_directories,
        summary.collect.sequences_written,
        summary.rows_written
    );

    ExitCode::SUCCESS
}
