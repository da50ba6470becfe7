//! Line parsers for the NCBI dump formats.
//!
//! Each format exposes a cheap `*_key` function that only looks at the first
//! field, and a full parser that validates the field count. The join passes
//! call the full parser only for keys they actually need.

use crate::errors::MissKind;
use crate::translation::TaxId;

pub const NCBI_TAXID: &str = "gi_taxid_nucl.dmp";
pub const NCBI_NODES: &str = "nodes.dmp";
pub const NCBI_NAMES: &str = "names.dmp";

const NO_RANK: &str = "no rank";
const SCIENTIFIC: &str = "scientific";

fn numeric_field(
    field: Option<&str>,
    index: usize,
    expected: usize,
    found: usize,
) -> Result<u64, MissKind> {
    let field = field.ok_or(MissKind::TooFewFields { expected, found })?;
    field
        .trim()
        .parse()
        .map_err(|_| MissKind::NonNumeric { field: index })
}

fn first_numeric(line: &str, delim: char) -> Result<u64, MissKind> {
    numeric_field(line.split(delim).next(), 0, 1, 0)
}

/// `gi<TAB>taxid`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GiTaxid {
    pub gi: u64,
    pub taxid: TaxId,
}

pub fn gi_taxid_key(line: &str) -> Result<u64, MissKind> {
    first_numeric(line, '\t')
}

pub fn parse_gi_taxid(line: &str) -> Result<GiTaxid, MissKind> {
    let found = line.split('\t').count();
    let mut fields = line.split('\t');
    let gi = numeric_field(fields.next(), 0, 2, found)?;
    let taxid = numeric_field(fields.next(), 1, 2, found)?;
    Ok(GiTaxid { gi, taxid })
}

/// `taxid | parent_taxid | rank | ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    pub taxid: TaxId,
    pub parent: TaxId,
    pub rank: String,
}

impl NodeEntry {
    /// The node's parent when it carries no formal rank, otherwise the node itself.
    /// Only one hop is taken.
    pub fn rank_id(&self) -> TaxId {
        if self.rank.contains(NO_RANK) {
            self.parent
        } else {
            self.taxid
        }
    }
}

pub fn node_key(line: &str) -> Result<TaxId, MissKind> {
    first_numeric(line, '|')
}

pub fn parse_node(line: &str) -> Result<NodeEntry, MissKind> {
    let found = line.split('|').count();
    if found < 3 {
        return Err(MissKind::TooFewFields { expected: 3, found });
    }
    let mut fields = line.split('|');
    let taxid = numeric_field(fields.next(), 0, 3, found)?;
    let parent = numeric_field(fields.next(), 1, 3, found)?;
    let rank = fields.next().unwrap_or("").trim().to_string();
    Ok(NodeEntry { taxid, parent, rank })
}

/// `taxid | name | unique_name | name_class | ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
    pub taxid: TaxId,
    pub name: String,
    pub name_class: String,
}

impl NameEntry {
    pub fn is_scientific(&self) -> bool {
        self.name_class.contains(SCIENTIFIC)
    }
}

pub fn name_key(line: &str) -> Result<TaxId, MissKind> {
    first_numeric(line, '|')
}

pub fn parse_name(line: &str) -> Result<NameEntry, MissKind> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() < 4 {
        return Err(MissKind::TooFewFields {
            expected: 4,
            found: fields.len(),
        });
    }
    let taxid = numeric_field(Some(fields[0]), 0, 4, fields.len())?;
    Ok(NameEntry {
        taxid,
        name: fields[1].trim().to_string(),
        name_class: fields[3].trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gi_taxid() {
        assert_eq!(
            parse_gi_taxid("123\t511145"),
            Ok(GiTaxid { gi: 123, taxid: 511145 })
        );
        assert_eq!(gi_taxid_key(" 42 \t7"), Ok(42));
        assert_eq!(
            parse_gi_taxid("123"),
            Err(MissKind::TooFewFields { expected: 2, found: 1 })
        );
        assert_eq!(
            parse_gi_taxid("123\tabc"),
            Err(MissKind::NonNumeric { field: 1 })
        );
        assert_eq!(gi_taxid_key("gi\ttaxid"), Err(MissKind::NonNumeric { field: 0 }));
    }

    #[test]
    fn test_node_rank_id() {
        let node = parse_node("511145\t|\t83333\t|\tno rank\t|\t\t|\t0\t|").unwrap();
        assert_eq!(node.taxid, 511145);
        assert_eq!(node.parent, 83333);
        assert_eq!(node.rank, "no rank");
        assert_eq!(node.rank_id(), 83333);

        let node = parse_node("562\t|\t561\t|\tspecies\t|").unwrap();
        assert_eq!(node.rank_id(), 562);
    }

    #[test]
    fn test_node_misses() {
        assert_eq!(
            parse_node("562\t|\t561"),
            Err(MissKind::TooFewFields { expected: 3, found: 2 })
        );
        assert_eq!(
            parse_node("562\t|\tx\t|\tspecies\t|"),
            Err(MissKind::NonNumeric { field: 1 })
        );
        assert_eq!(node_key("\t|\t1\t|"), Err(MissKind::NonNumeric { field: 0 }));
    }

    #[test]
    fn test_name_entry() {
        let entry =
            parse_name("83333\t|\tEscherichia coli K-12\t|\t\t|\tscientific name\t|").unwrap();
        assert_eq!(entry.taxid, 83333);
        assert_eq!(entry.name, "Escherichia coli K-12");
        assert!(entry.is_scientific());

        let entry = parse_name("83333\t|\tE. coli K12\t|\t\t|\tsynonym\t|").unwrap();
        assert!(!entry.is_scientific());

        assert_eq!(
            parse_name("83333\t|\tname"),
            Err(MissKind::TooFewFields { expected: 4, found: 2 })
        );
    }
}
