use std::fmt;
use std::io::{self, BufRead};

fn strip_string(s: &mut String) {
    while s.ends_with(char::is_whitespace) {
        s.pop();
    }
}

/// Header text with the leading/trailing `>` markers and spaces removed.
pub fn clean_header(line: &str) -> &str {
    line.trim_matches(|c| c == '>' || c == ' ')
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub header: String, // header line without '>'
    pub seq: String,
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ">{}", self.header)?;
        writeln!(f, "{}", self.seq)
    }
}

/// Streaming FASTA reader. Sequence lines are trimmed and concatenated; blank
/// lines and any text before the first header are ignored.
pub struct FastaReader<R: BufRead> {
    reader: R,
    bytes: Vec<u8>,
    line: String,
    pending_header: Option<String>,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            bytes: Vec::with_capacity(8192),
            line: String::with_capacity(8192),
            pending_header: None,
        }
    }

    /// Reads one raw line into `self.line`. Bytes that are not valid UTF-8 are
    /// replaced rather than failing the read.
    fn read_line(&mut self) -> io::Result<usize> {
        self.bytes.clear();
        self.line.clear();
        let n = self.reader.read_until(b'\n', &mut self.bytes)?;
        match std::str::from_utf8(&self.bytes) {
            Ok(s) => self.line.push_str(s),
            Err(_) => self.line.push_str(&String::from_utf8_lossy(&self.bytes)),
        }
        Ok(n)
    }

    /// Reads the next record into `sequence`. Returns `Ok(false)` at end of input.
    pub fn next_sequence(&mut self, sequence: &mut Sequence) -> io::Result<bool> {
        sequence.header.clear();
        sequence.seq.clear();

        let header = match self.pending_header.take() {
            Some(h) => h,
            None => loop {
                if self.read_line()? == 0 {
                    return Ok(false);
                }
                let trimmed = self.line.trim();
                if trimmed.starts_with('>') {
                    break clean_header(trimmed).to_string();
                }
            },
        };
        sequence.header = header;

        loop {
            if self.read_line()? == 0 {
                break;
            }
            strip_string(&mut self.line);
            let trimmed = self.line.trim_start();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('>') {
                self.pending_header = Some(clean_header(trimmed).to_string());
                break;
            }
            sequence.seq.push_str(trimmed);
        }

        Ok(true)
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = io::Result<Sequence>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut seq = Sequence::default();
        match self.next_sequence(&mut seq) {
            Ok(true) => Some(Ok(seq)),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fasta_parsing() {
        let data = ">read1 some desc\nACGT\nGG\n\n>read2 other desc\n  GATTACA  \n";
        let mut reader = FastaReader::new(data.as_bytes());
        let mut seq = Sequence::default();

        assert!(reader.next_sequence(&mut seq).unwrap());
        assert_eq!(seq.header, "read1 some desc");
        assert_eq!(seq.seq, "ACGTGG");

        assert!(reader.next_sequence(&mut seq).unwrap());
        assert_eq!(seq.header, "read2 other desc");
        assert_eq!(seq.seq, "GATTACA");

        assert!(!reader.next_sequence(&mut seq).unwrap());
    }

    #[test]
    fn test_leading_text_and_empty_record() {
        let data = "junk before header\n> gi|1|a|b|c \n>gi|2|a|b|d\nAC\r\nGT\r\n";
        let records: Vec<Sequence> = FastaReader::new(data.as_bytes())
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].header, "gi|1|a|b|c");
        assert_eq!(records[0].seq, "");
        assert_eq!(records[1].header, "gi|2|a|b|d");
        assert_eq!(records[1].seq, "ACGT");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let data: &[u8] = b">gi|1|r|x|Strain caf\xe9, genome\nAC\xffGT\n>gi|2|r|x|Clean\nTT\n";
        let records: Vec<Sequence> = FastaReader::new(data).map(|r| r.unwrap()).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].header, "gi|1|r|x|Strain caf\u{FFFD}, genome");
        assert_eq!(records[0].seq, "AC\u{FFFD}GT");
        assert_eq!(records[1].header, "gi|2|r|x|Clean");
        assert_eq!(records[1].seq, "TT");
    }

    #[test]
    fn test_display() {
        let seq = Sequence {
            header: "NC|123|x|x|E. coli".to_string(),
            seq: "ACGT".to_string(),
        };
        assert_eq!(seq.to_string(), ">NC|123|x|x|E. coli\nACGT\n");
    }
}
