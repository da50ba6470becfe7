use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::errors::{Result, XltError};

pub type TaxId = u64;
pub type GenomeKey = u64;

/// Taxonomic annotation of one genome sequence.
///
/// `taxon_id` and `rank_id` stay `None` until the join passes resolve them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRecord {
    genome_key: GenomeKey,
    pub taxon_id: Option<TaxId>,
    pub rank_id: Option<TaxId>,
    length: u64,
    strain: String,
    pub species: String,
}

impl TranslationRecord {
    /// Builds a record from a FASTA header (without `>`) and its sequence length.
    ///
    /// # Arguments
    ///
    /// * `header` - Pipe-delimited header: `field0|GI|field2|field3|description, ...`.
    /// * `length` - Length of the concatenated sequence.
    ///
    /// # Returns
    ///
    /// The record, or `MalformedHeader` if the GI field is not an integer or the
    /// description field is missing.
    pub fn from_header(header: &str, length: u64) -> Result<Self> {
        let malformed = |reason: &str| XltError::MalformedHeader {
            header: header.to_string(),
            reason: reason.to_string(),
        };

        let mut fields = header.split('|');
        let genome_key = fields
            .nth(1)
            .ok_or_else(|| malformed("missing GI field"))?
            .trim()
            .parse::<GenomeKey>()
            .map_err(|_| malformed("GI field is not an integer"))?;
        let description = fields
            .nth(2)
            .ok_or_else(|| malformed("missing description field"))?;
        let strain = description.split(',').next().unwrap_or("").trim().to_string();

        Ok(TranslationRecord {
            genome_key,
            taxon_id: None,
            rank_id: None,
            length,
            species: strain.clone(),
            strain,
        })
    }

    pub fn genome_key(&self) -> GenomeKey {
        self.genome_key
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn strain(&self) -> &str {
        &self.strain
    }

    pub fn is_resolved(&self) -> bool {
        self.taxon_id.is_some()
    }
}

/// Records keyed by genome key, kept in insertion order.
#[derive(Debug, Default)]
pub struct TranslationTable {
    records: IndexMap<GenomeKey, TranslationRecord>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record; an already-present genome key is rejected and the
    /// existing record is left untouched.
    pub fn insert(&mut self, record: TranslationRecord) -> Result<()> {
        match self.records.entry(record.genome_key) {
            Entry::Occupied(e) => Err(XltError::DuplicateGenome(*e.key())),
            Entry::Vacant(e) => {
                e.insert(record);
                Ok(())
            }
        }
    }

    pub fn contains(&self, key: GenomeKey) -> bool {
        self.records.contains_key(&key)
    }

    pub fn get(&self, key: GenomeKey) -> Option<&TranslationRecord> {
        self.records.get(&key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = GenomeKey> + '_ {
        self.records.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranslationRecord> {
        self.records.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TranslationRecord> {
        self.records.values_mut()
    }

    /// Records with a resolved taxon id, in insertion order.
    pub fn resolved(&self) -> impl Iterator<Item = &TranslationRecord> {
        self.iter().filter(|r| r.is_resolved())
    }
}

/// One row of a written translation table, as consumed by read assignment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranslationEntry {
    #[serde(rename = "GID")]
    pub gid: GenomeKey,
    #[serde(rename = "TID")]
    pub tid: TaxId,
    #[serde(rename = "Size")]
    pub size: u64,
    #[serde(rename = "Start")]
    pub start: u64,
    #[serde(rename = "End")]
    pub end: u64,
    #[serde(rename = "Strain")]
    pub strain: String,
    #[serde(rename = "Species")]
    pub species: String,
}

/// Translation table rows keyed by GID, in file order. A repeated GID keeps its
/// position and takes the later row.
pub type TranslationIndex = IndexMap<GenomeKey, TranslationEntry>;

/// Loads a translation table CSV. The header row is required and columns are
/// matched by name.
pub fn read_translation_table<R: Read>(input: R) -> Result<TranslationIndex> {
    let mut rdr = csv::Reader::from_reader(input);
    let mut index = TranslationIndex::new();
    for row in rdr.deserialize() {
        let entry: TranslationEntry = row?;
        index.insert(entry.gid, entry);
    }
    Ok(index)
}

pub fn read_translation_file<P: AsRef<Path>>(path: P) -> Result<TranslationIndex> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| XltError::io(path, e))?;
    let index = read_translation_table(BufReader::new(file))?;
    log::info!("loaded {} translation rows from {}", index.len(), path.display());
    Ok(index)
}
