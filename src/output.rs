use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use csv::{QuoteStyle, WriterBuilder};

use crate::errors::{Result, XltError};
use crate::seqreader::Sequence;
use crate::translation::{GenomeKey, TaxId, TranslationRecord, TranslationTable};

pub const WMGS_BLOCK: u64 = 1000;

/// Number of `WMGS_BLOCK`-sized blocks in a genome, rounded half to even.
///
/// 500 -> 0, 1000 -> 1, 1500 -> 2, 2500 -> 2.
pub fn block_count(length: u64) -> u64 {
    let quotient = length / WMGS_BLOCK;
    let remainder = length % WMGS_BLOCK;
    let half = WMGS_BLOCK / 2;
    if remainder > half || (remainder == half && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}

/// Writes one FASTA record: header line, then the whole sequence on one line.
pub fn write_fasta_record<W: Write>(out: &mut W, sequence: &Sequence) -> io::Result<()> {
    write!(out, "{}", sequence)
}

const TABLE_HEADER: [&str; 7] = ["GID", "TID", "Size", "Start", "End", "Strain", "Species"];

/// Wraps `text` in double quotes, doubling any embedded quote.
fn quote_text(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

#[derive(Debug)]
struct TranslationRow<'a> {
    gid: GenomeKey,
    tid: TaxId,
    size: u64,
    start: u64,
    end: u64,
    strain: &'a str,
    species: &'a str,
}

impl<'a> TranslationRow<'a> {
    fn from_record(rec: &'a TranslationRecord) -> Option<Self> {
        let tid = rec.taxon_id?;
        Some(TranslationRow {
            gid: rec.genome_key(),
            tid,
            size: rec.length(),
            start: 0,
            end: block_count(rec.length()),
            strain: rec.strain(),
            species: &rec.species,
        })
    }

    /// Numeric columns bare, text columns always quoted.
    fn fields(&self) -> [String; 7] {
        [
            self.gid.to_string(),
            self.tid.to_string(),
            self.size.to_string(),
            self.start.to_string(),
            self.end.to_string(),
            quote_text(self.strain),
            quote_text(self.species),
        ]
    }
}

/// Writes the translation table as CSV. Only records with a resolved taxon id
/// are written. Quoting is decided per column, not per value: the header and
/// the Strain/Species columns are always quoted, numbers never are.
///
/// # Returns
///
/// The number of data rows written.
pub fn write_translation_table<W: Write>(out: W, table: &TranslationTable) -> Result<usize> {
    // Fields arrive pre-quoted, so the writer must not quote again.
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .from_writer(out);
    wtr.write_record(TABLE_HEADER.iter().map(|h| quote_text(h)))?;
    let mut rows = 0;
    for row in table.iter().filter_map(TranslationRow::from_record) {
        wtr.write_record(&row.fields())?;
        rows += 1;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(rows)
}

pub fn write_translation_file<P: AsRef<Path>>(path: P, table: &TranslationTable) -> Result<usize> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| XltError::io(path, e))?;
    write_translation_table(BufWriter::new(file), table)
}
