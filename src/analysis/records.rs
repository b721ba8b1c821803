//! Sequence record readers for genome and alignment inputs

use std::fs::File;
use std::io::Read;
use std::path::Path;

use bio::io::fasta;
use gb_io::reader::SeqReader;

use super::error::AnalysisError;
use super::nucleotide::{is_alignment_symbol, is_standard_base, GAP};

/// A single genome sequence (uppercase, `[ACGT]+`)
#[derive(Debug, Clone)]
pub struct GenomeRecord {
    pub name: String,
    pub sequence: Vec<u8>,
}

impl GenomeRecord {
    /// Uppercase and validate a raw genome sequence.
    pub fn new(name: impl Into<String>, raw: &[u8]) -> Result<Self, AnalysisError> {
        let sequence: Vec<u8> = raw.iter().map(|b| b.to_ascii_uppercase()).collect();
        if sequence.is_empty() {
            return Err(AnalysisError::EmptySequence);
        }
        if let Some(pos) = sequence.iter().position(|&b| !is_standard_base(b)) {
            return Err(AnalysisError::Validation {
                symbol: sequence[pos] as char,
                row: 1,
                column: pos + 1,
            });
        }
        Ok(Self {
            name: name.into(),
            sequence,
        })
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Equal-length aligned sequences over `{A,C,G,T,-}`
#[derive(Debug, Clone)]
pub struct AlignmentMatrix {
    names: Vec<String>,
    rows: Vec<Vec<u8>>,
}

impl AlignmentMatrix {
    /// Validate rows into an alignment. Row and column numbers in errors are 1-based.
    pub fn new(names: Vec<String>, rows: Vec<Vec<u8>>) -> Result<Self, AnalysisError> {
        let expected = match rows.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(AnalysisError::EmptySequence),
        };

        for (r, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(AnalysisError::RaggedAlignment {
                    row: r + 1,
                    expected,
                    found: row.len(),
                });
            }
            if let Some(c) = row.iter().position(|&b| !is_alignment_symbol(b)) {
                return Err(AnalysisError::Validation {
                    symbol: row[c] as char,
                    row: r + 1,
                    column: c + 1,
                });
            }
        }

        Ok(Self { names, rows })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub fn sample_count(&self) -> usize {
        self.rows.len()
    }

    pub fn alignment_length(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GenomeFormat {
    Fasta,
    GenBank,
}

impl GenomeFormat {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "fasta" | "fa" | "fas" | "fna" => Some(Self::Fasta),
            "gb" | "gbk" | "genbank" => Some(Self::GenBank),
            _ => None,
        }
    }
}

/// Read the first record of a FASTA or GenBank file as a genome.
pub fn read_genome(path: &Path) -> Result<GenomeRecord, AnalysisError> {
    let format = GenomeFormat::from_path(path)
        .ok_or_else(|| AnalysisError::UnsupportedFormat(path.display().to_string()))?;

    let file = File::open(path)?;
    match format {
        GenomeFormat::Fasta => parse_genome_fasta(file),
        GenomeFormat::GenBank => parse_genome_genbank(file),
    }
}

/// Parse the first FASTA record from a reader as a genome.
pub fn parse_genome_fasta<R: Read>(reader: R) -> Result<GenomeRecord, AnalysisError> {
    let reader = fasta::Reader::new(reader);
    match reader.records().next() {
        Some(record) => {
            let record = record.map_err(|e| AnalysisError::Parse(e.to_string()))?;
            GenomeRecord::new(record.id(), record.seq())
        }
        None => Err(AnalysisError::Parse("no FASTA record found".to_string())),
    }
}

/// Parse the first GenBank record from a reader as a genome.
pub fn parse_genome_genbank<R: Read>(reader: R) -> Result<GenomeRecord, AnalysisError> {
    match SeqReader::new(reader).next() {
        Some(record) => {
            let record = record.map_err(|e| AnalysisError::Parse(e.to_string()))?;
            let name = record
                .name
                .as_deref()
                .or(record.accession.as_deref())
                .map(str::trim)
                .unwrap_or_default()
                .to_string();
            GenomeRecord::new(name, &record.seq)
        }
        None => Err(AnalysisError::Parse("no GenBank record found".to_string())),
    }
}

/// Read a FASTA alignment file.
pub fn read_alignment(path: &Path, n_as_gap: bool) -> Result<AlignmentMatrix, AnalysisError> {
    let file = File::open(path)?;
    parse_alignment_fasta(file, n_as_gap)
}

/// Parse all FASTA records from a reader into a validated alignment.
pub fn parse_alignment_fasta<R: Read>(
    reader: R,
    n_as_gap: bool,
) -> Result<AlignmentMatrix, AnalysisError> {
    let reader = fasta::Reader::new(reader);
    let mut names = Vec::new();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| AnalysisError::Parse(e.to_string()))?;
        let row: Vec<u8> = record
            .seq()
            .iter()
            .filter(|b| !b.is_ascii_whitespace())
            .map(|b| match b.to_ascii_uppercase() {
                b'N' if n_as_gap => GAP,
                other => other,
            })
            .collect();
        names.push(record.id().to_string());
        rows.push(row);
    }

    AlignmentMatrix::new(names, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_genome_fasta_uppercases() {
        let rec = parse_genome_fasta(&b">chl\nacgt\nACGT\n"[..]).unwrap();
        assert_eq!(rec.name, "chl");
        assert_eq!(rec.sequence, b"ACGTACGT".to_vec());
    }

    #[test]
    fn test_genome_rejects_ambiguity() {
        let err = parse_genome_fasta(&b">chl\nACGNT\n"[..]).unwrap_err();
        match err {
            AnalysisError::Validation { symbol, column, .. } => {
                assert_eq!(symbol, 'N');
                assert_eq!(column, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    const GENBANK: &str = "\
LOCUS       NC_000932                 12 bp    DNA     circular PLN 15-APR-2019
DEFINITION  Arabidopsis thaliana chloroplast, complete genome.
ACCESSION   NC_000932
VERSION     NC_000932.1
FEATURES             Location/Qualifiers
     source          1..12
                     /organism=\"Arabidopsis thaliana\"
ORIGIN
        1 atgcatgcat gc
//
";

    #[test]
    fn test_parse_genbank_record() {
        let rec = parse_genome_genbank(GENBANK.as_bytes()).unwrap();
        assert_eq!(rec.name, "NC_000932");
        assert_eq!(rec.sequence, b"ATGCATGCATGC".to_vec());
    }

    #[test]
    fn test_genbank_sequence_is_validated() {
        let gb = GENBANK.replace("atgcatgcat gc", "atgcatgnat gc");
        let err = parse_genome_genbank(gb.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Validation { symbol: 'N', column: 8, .. }
        ));
    }

    #[test]
    fn test_alignment_validation() {
        let ok = parse_alignment_fasta(&b">a\nAC-T\n>b\nACGT\n"[..], false).unwrap();
        assert_eq!(ok.sample_count(), 2);
        assert_eq!(ok.alignment_length(), 4);

        let ragged = parse_alignment_fasta(&b">a\nACGT\n>b\nACG\n"[..], false);
        assert!(matches!(
            ragged,
            Err(AnalysisError::RaggedAlignment { row: 2, expected: 4, found: 3 })
        ));

        let bad = parse_alignment_fasta(&b">a\nACGT\n>b\nACRT\n"[..], false);
        assert!(matches!(
            bad,
            Err(AnalysisError::Validation { symbol: 'R', row: 2, column: 3 })
        ));
    }

    #[test]
    fn test_n_as_gap() {
        let strict = parse_alignment_fasta(&b">a\nANGT\n>b\nACGT\n"[..], false);
        assert!(strict.is_err());
        let relaxed = parse_alignment_fasta(&b">a\nANGT\n>b\nACGT\n"[..], true).unwrap();
        assert_eq!(relaxed.rows()[0], b"A-GT".to_vec());
    }

    #[test]
    fn test_read_genome_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let fa = dir.path().join("sample.fa");
        let mut f = File::create(&fa).unwrap();
        writeln!(f, ">sample\nACGTACGT").unwrap();
        assert_eq!(read_genome(&fa).unwrap().len(), 8);

        let gbk = dir.path().join("sample.gbk");
        std::fs::write(&gbk, GENBANK).unwrap();
        assert_eq!(read_genome(&gbk).unwrap().len(), 12);

        let txt = dir.path().join("sample.txt");
        std::fs::write(&txt, ">x\nACGT\n").unwrap();
        assert!(matches!(
            read_genome(&txt),
            Err(AnalysisError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_unknown_extension_checked_before_opening() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        assert!(matches!(
            read_genome(&missing),
            Err(AnalysisError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            read_genome(&dir.path().join("missing.fasta")),
            Err(AnalysisError::Io(_))
        ));
    }
}
