use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use walkdir::WalkDir;

use crate::errors::{Result, XltError};
use crate::gz_stream;
use crate::output::write_fasta_record;
use crate::seqreader::{FastaReader, Sequence};
use crate::translation::{TranslationRecord, TranslationTable};

const PLASMID: &str = "plasmid";

/// Header text to sequence, in first-seen order. A repeated header keeps its
/// position and takes the later sequence.
pub type SequenceList = IndexMap<String, String>;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectStats {
    pub directories: usize,
    pub failed_directories: usize,
    pub files: usize,
    pub sequences_written: usize,
    pub plasmids_skipped: usize,
    pub duplicates_skipped: usize,
    pub malformed_skipped: usize,
}

/// True if `path` ends with `.<ext>` or `.<ext>.gz` for one of `extensions`.
pub fn has_fasta_extension(path: &Path, extensions: &[String]) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return false,
    };
    let name = name.strip_suffix(".gz").unwrap_or(name);
    extensions.iter().any(|ext| {
        name.len() > ext.len() + 1
            && name.ends_with(ext.as_str())
            && name.as_bytes()[name.len() - ext.len() - 1] == b'.'
    })
}

/// Immediate subdirectories of `root`, sorted by name.
pub fn collection_units(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

fn walk_error(dir: &Path, e: walkdir::Error) -> XltError {
    let path = e.path().unwrap_or(dir).to_path_buf();
    let source = e
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop"));
    XltError::io(path, source)
}

/// All FASTA files below `dir`, in path order.
pub fn fasta_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        if entry.file_type().is_file() && has_fasta_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Parses one FASTA file into `list`.
pub fn read_fasta_file(path: &Path, list: &mut SequenceList) -> Result<usize> {
    let reader = gz_stream::open_text(path)?;
    let mut fasta = FastaReader::new(reader);
    let mut seq = Sequence::default();
    let mut count = 0;
    while fasta
        .next_sequence(&mut seq)
        .map_err(|e| XltError::io(path, e))?
    {
        list.insert(std::mem::take(&mut seq.header), std::mem::take(&mut seq.seq));
        count += 1;
    }
    Ok(count)
}

/// Parses every FASTA file of a collection unit. Any I/O error abandons the
/// whole unit.
pub fn read_directory(dir: &Path, extensions: &[String]) -> Result<(SequenceList, usize)> {
    let files = fasta_files(dir, extensions)?;
    let mut list = SequenceList::new();
    for f in &files {
        read_fasta_file(f, &mut list)?;
        log::debug!("file: {} completed", f.display());
    }
    Ok((list, files.len()))
}

/// Drops plasmids, creates one record per remaining header and streams the
/// accepted sequences to `out`.
pub fn accept_sequences<W: Write>(
    list: SequenceList,
    table: &mut TranslationTable,
    out: &mut W,
    stats: &mut CollectStats,
) -> Result<()> {
    for (header, seq) in list {
        if header.contains(PLASMID) {
            stats.plasmids_skipped += 1;
            continue;
        }

        let record = match TranslationRecord::from_header(&header, seq.len() as u64) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("skipping sequence: {}", e);
                stats.malformed_skipped += 1;
                continue;
            }
        };

        if table.contains(record.genome_key()) {
            log::warn!(
                "skipping sequence: {}",
                XltError::DuplicateGenome(record.genome_key())
            );
            stats.duplicates_skipped += 1;
            continue;
        }

        let sequence = Sequence { header, seq };
        write_fasta_record(out, &sequence).map_err(|e| XltError::io("<merged fasta>", e))?;
        table.insert(record)?;
        stats.sequences_written += 1;
    }
    Ok(())
}

/// Collects every collection unit under `root` into `table`, writing the merged
/// FASTA to `out`. A unit that fails to read is logged and skipped; a failure to
/// write `out` stops collection.
pub fn collect<W: Write>(
    root: &Path,
    extensions: &[String],
    table: &mut TranslationTable,
    out: &mut W,
) -> Result<CollectStats> {
    let mut stats = CollectStats::default();

    for dir in collection_units(root)? {
        let name = dir.file_name().map_or_else(
            || dir.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );
        log::info!("directory: {}", name);
        stats.directories += 1;

        match read_directory(&dir, extensions) {
            Ok((list, files)) => {
                stats.files += files;
                accept_sequences(list, table, out, &mut stats)?;
            }
            Err(e) => {
                log::error!("directory {} skipped: {}", name, e);
                stats.failed_directories += 1;
            }
        }
    }

    Ok(stats)
}
