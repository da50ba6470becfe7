//! Streaming joins of the translation table against the NCBI reference dumps.
//!
//! Every pass follows the same shape: harvest the keys the table needs, scan
//! the reference file once keeping only lines whose key is needed, then copy
//! the resolved values back onto the records. Index size is bounded by the
//! number of distinct keys in the table, never by the size of the dump.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::dmp;
use crate::errors::{MissKind, ParseMiss, XltError};
use crate::gz_stream;
use crate::translation::{GenomeKey, TaxId, TranslationTable};

const PROGRESS_INTERVAL: u64 = 10_000_000;
const MAX_MISS_SAMPLES: usize = 32;

/// Lookup keys harvested from the table, each mapped to its resolved value
/// (`None` until a matching reference line is seen).
#[derive(Debug)]
pub struct ReferenceIndex<K, V> {
    entries: HashMap<K, Option<V>>,
}

impl<K: Eq + Hash + Copy, V> ReferenceIndex<K, V> {
    pub fn from_need_set(need: HashSet<K>) -> Self {
        let entries = need.into_iter().map(|k| (k, None)).collect();
        ReferenceIndex { entries }
    }

    /// Slot for `key` if the table needs it.
    pub fn slot_mut(&mut self, key: &K) -> Option<&mut Option<V>> {
        self.entries.get_mut(key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).and_then(|v| v.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolved_len(&self) -> usize {
        self.entries.values().filter(|v| v.is_some()).count()
    }
}

/// One join against one reference dump.
pub trait JoinPass {
    type Key: Eq + Hash + Copy;
    type Value;

    /// Default dump file name, used for locating and logging.
    fn dump_name(&self) -> &'static str;

    /// Distinct keys the current table state needs resolved.
    fn need_set(&self, table: &TranslationTable) -> HashSet<Self::Key>;

    /// Parses only the key field of a reference line.
    fn key(&self, line: &str) -> Result<Self::Key, MissKind>;

    /// Parses a line whose key is needed. `Ok(None)` means the line is valid
    /// but not eligible to provide a value.
    fn resolve(&self, line: &str) -> Result<Option<Self::Value>, MissKind>;

    /// Writes resolved values onto the records, returning how many received one.
    fn apply(
        &self,
        table: &mut TranslationTable,
        index: &ReferenceIndex<Self::Key, Self::Value>,
    ) -> usize;
}

/// Outcome of one join pass.
#[derive(Debug)]
pub struct PassReport {
    pub source: PathBuf,
    pub lines_read: u64,
    pub blank_lines: u64,
    pub misses: u64,
    pub miss_samples: Vec<ParseMiss>,
    pub index_entries: usize,
    pub resolved: usize,
    pub error: Option<XltError>,
}

impl PassReport {
    fn new(source: &Path) -> Self {
        PassReport {
            source: source.to_path_buf(),
            lines_read: 0,
            blank_lines: 0,
            misses: 0,
            miss_samples: Vec::new(),
            index_entries: 0,
            resolved: 0,
            error: None,
        }
    }

    fn record_miss(&mut self, miss: ParseMiss) {
        self.misses += 1;
        if self.miss_samples.len() < MAX_MISS_SAMPLES {
            self.miss_samples.push(miss);
        }
    }

    /// True when the reference file was read to the end.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs `pass` over a reference stream and applies the result to `table`.
///
/// # Arguments
///
/// * `pass` - The join to perform.
/// * `table` - Records to enrich. Owned exclusively for the duration of the pass.
/// * `reader` - The reference dump contents.
/// * `source` - Path reported in the log and in the returned report.
///
/// # Returns
///
/// A report of what was read and resolved. A read error stops the scan but the
/// values found up to that point are still applied.
pub fn run_pass<P: JoinPass, R: BufRead>(
    pass: &P,
    table: &mut TranslationTable,
    mut reader: R,
    source: &Path,
) -> PassReport {
    let mut report = PassReport::new(source);
    let mut index: ReferenceIndex<P::Key, P::Value> =
        ReferenceIndex::from_need_set(pass.need_set(table));
    let show_progress = atty::is(atty::Stream::Stderr);
    let mut line: Vec<u8> = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                report.error = Some(XltError::io(source, e));
                break;
            }
        }
        report.lines_read += 1;

        if show_progress && report.lines_read % PROGRESS_INTERVAL == 0 {
            eprint!(
                "\rprocessing {}: searched through {} lines...",
                pass.dump_name(),
                report.lines_read
            );
        }

        let text = match std::str::from_utf8(&line) {
            Ok(text) => text.trim_end_matches(|c| c == '\n' || c == '\r'),
            Err(_) => {
                report.record_miss(ParseMiss::at(report.lines_read, MissKind::InvalidUtf8));
                continue;
            }
        };
        if text.trim().is_empty() {
            report.blank_lines += 1;
            continue;
        }

        let key = match pass.key(text) {
            Ok(key) => key,
            Err(kind) => {
                report.record_miss(ParseMiss::at(report.lines_read, kind));
                continue;
            }
        };

        let slot = match index.slot_mut(&key) {
            Some(slot) => slot,
            None => continue,
        };

        match pass.resolve(text) {
            Ok(Some(value)) => *slot = Some(value),
            Ok(None) => {}
            Err(kind) => report.record_miss(ParseMiss::at(report.lines_read, kind)),
        }
    }

    if show_progress && report.lines_read >= PROGRESS_INTERVAL {
        eprint!("\r");
    }

    report.index_entries = index.len();
    report.resolved = pass.apply(table, &index);
    report
}

/// Opens `path` (gzipped or plain) and runs `pass` over it. An open failure is
/// reported like a read failure: the pass still applies its empty index.
pub fn run_pass_file<P: JoinPass>(
    pass: &P,
    table: &mut TranslationTable,
    path: &Path,
) -> PassReport {
    match gz_stream::open_text(path) {
        Ok(reader) => run_pass(pass, table, reader, path),
        Err(e) => {
            let mut report = run_pass(pass, table, std::io::empty(), path);
            report.error = Some(e);
            report
        }
    }
}

/// Pass 1: GI to taxon id (`gi_taxid_nucl.dmp`).
#[derive(Debug, Default, Clone, Copy)]
pub struct GiTaxidPass;

impl JoinPass for GiTaxidPass {
    type Key = GenomeKey;
    type Value = TaxId;

    fn dump_name(&self) -> &'static str {
        dmp::NCBI_TAXID
    }

    fn need_set(&self, table: &TranslationTable) -> HashSet<GenomeKey> {
        table.keys().collect()
    }

    fn key(&self, line: &str) -> Result<GenomeKey, MissKind> {
        dmp::gi_taxid_key(line)
    }

    fn resolve(&self, line: &str) -> Result<Option<TaxId>, MissKind> {
        dmp::parse_gi_taxid(line).map(|entry| Some(entry.taxid))
    }

    fn apply(
        &self,
        table: &mut TranslationTable,
        index: &ReferenceIndex<GenomeKey, TaxId>,
    ) -> usize {
        let mut resolved = 0;
        for rec in table.iter_mut() {
            rec.taxon_id = index.get(&rec.genome_key()).copied();
            rec.rank_id = rec.taxon_id;
            if rec.taxon_id.is_some() {
                resolved += 1;
            }
        }
        resolved
    }
}

/// Pass 2: taxon id to rank id (`nodes.dmp`), collapsing "no rank" nodes one hop
/// to their parent.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeRankPass;

impl JoinPass for NodeRankPass {
    type Key = TaxId;
    type Value = TaxId;

    fn dump_name(&self) -> &'static str {
        dmp::NCBI_NODES
    }

    fn need_set(&self, table: &TranslationTable) -> HashSet<TaxId> {
        table.iter().filter_map(|r| r.taxon_id).collect()
    }

    fn key(&self, line: &str) -> Result<TaxId, MissKind> {
        dmp::node_key(line)
    }

    fn resolve(&self, line: &str) -> Result<Option<TaxId>, MissKind> {
        dmp::parse_node(line).map(|node| Some(node.rank_id()))
    }

    fn apply(
        &self,
        table: &mut TranslationTable,
        index: &ReferenceIndex<TaxId, TaxId>,
    ) -> usize {
        let mut resolved = 0;
        for rec in table.iter_mut() {
            rec.rank_id = rec.taxon_id.and_then(|t| index.get(&t).copied());
            if rec.rank_id.is_some() {
                resolved += 1;
            }
        }
        resolved
    }
}

/// Pass 3: rank id to scientific name (`names.dmp`). Records without a match
/// keep the species text parsed from their header.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScientificNamePass;

impl JoinPass for ScientificNamePass {
    type Key = TaxId;
    type Value = String;

    fn dump_name(&self) -> &'static str {
        dmp::NCBI_NAMES
    }

    fn need_set(&self, table: &TranslationTable) -> HashSet<TaxId> {
        table.iter().filter_map(|r| r.rank_id).collect()
    }

    fn key(&self, line: &str) -> Result<TaxId, MissKind> {
        dmp::name_key(line)
    }

    fn resolve(&self, line: &str) -> Result<Option<String>, MissKind> {
        let entry = dmp::parse_name(line)?;
        Ok(if entry.is_scientific() {
            Some(entry.name)
        } else {
            None
        })
    }

    fn apply(
        &self,
        table: &mut TranslationTable,
        index: &ReferenceIndex<TaxId, String>,
    ) -> usize {
        let mut resolved = 0;
        for rec in table.iter_mut() {
            if let Some(name) = rec.rank_id.and_then(|r| index.get(&r)) {
                rec.species = name.clone();
                resolved += 1;
            }
        }
        resolved
    }
}
