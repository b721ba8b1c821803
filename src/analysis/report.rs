//! Text renderings and output files consumed by the plotting tools

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::warn;

use super::error::AnalysisError;
use super::regions::RepeatRegions;
use super::types::{FragmentPi, PiReport};

pub const PI_TABLE_HEADER: &str = "Start\tEnd\tMidpoint\tPi\tS";

impl PiReport {
    /// `#`-prefixed run summary followed by a rule line
    pub fn render_header(&self) -> String {
        format!(
            "#infile: {}\n\
             #seq number: {}\n\
             #aln length: {}\n\
             #conserved length: {}\n\
             #window length: {}\n\
             #step size: {}\n\
             #Nucleotide diversity, Pi: {:.5}\n\
             #Number of polymorphic (segregating) sites, S: {}\n\
             {}",
            self.source,
            self.sample_count,
            self.alignment_length,
            self.conserved_length,
            self.window,
            self.step,
            self.pi,
            self.segregating_sites,
            "=".repeat(35),
        )
    }

    /// Window table, one tab-separated row per window
    pub fn render_table(&self) -> String {
        let mut lines = Vec::with_capacity(self.windows.len() + 1);
        lines.push(PI_TABLE_HEADER.to_string());
        for w in &self.windows {
            lines.push(format!(
                "{}\t{}\t{}\t{:.5}\t{}",
                w.start, w.end, w.midpoint, w.pi, w.segregating_sites
            ));
        }
        lines.join("\n")
    }
}

pub fn fragment_line(fragment: &FragmentPi) -> String {
    format!("{}\t{:.5}", fragment.name, fragment.pi)
}

/// Write lines, each terminated by a newline.
pub fn write_lines<I, S>(path: &Path, lines: I) -> Result<(), AnalysisError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(out, "{}", line.as_ref())?;
    }
    out.flush()?;
    Ok(())
}

/// Write `{species}_{region}.fasta` for each of the four regions.
pub fn write_region_fasta(
    output_dir: &Path,
    species: &str,
    regions: &RepeatRegions,
) -> Result<Vec<PathBuf>, AnalysisError> {
    let mut written = Vec::with_capacity(4);
    for (label, sequence) in regions.region_sequences() {
        let path = output_dir.join(format!("{}_{}.fasta", species, label));
        let mut out = BufWriter::new(File::create(&path)?);
        writeln!(out, ">{}_{}", species, label)?;
        out.write_all(sequence)?;
        writeln!(out)?;
        out.flush()?;
        written.push(path);
    }
    Ok(written)
}

/// One fragment name per non-empty line.
pub fn read_reference_order(path: &Path) -> Result<Vec<String>, AnalysisError> {
    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Reorder fragments to follow `order`, keeping the first match per name.
pub fn sort_by_reference_order(fragments: &[FragmentPi], order: &[String]) -> Vec<FragmentPi> {
    order
        .iter()
        .filter_map(|name| {
            let found = fragments.iter().find(|f| &f.name == name);
            if found.is_none() {
                warn!("'{}' from the reference order has no Pi result", name);
            }
            found.cloned()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::PiWindow;

    fn fragment(name: &str, pi: f64) -> FragmentPi {
        FragmentPi {
            name: name.to_string(),
            pi,
        }
    }

    #[test]
    fn test_render_table() {
        let report = PiReport {
            source: "aln.fasta".to_string(),
            sample_count: 3,
            alignment_length: 12,
            conserved_length: 10,
            window: 4,
            step: 2,
            pi: 0.123456,
            segregating_sites: 2,
            windows: vec![PiWindow {
                start: 1,
                end: 4,
                midpoint: 2,
                pi: 1.0 / 3.0,
                segregating_sites: 1,
            }],
        };
        assert_eq!(report.render_table(), "Start\tEnd\tMidpoint\tPi\tS\n1\t4\t2\t0.33333\t1");
        let header = report.render_header();
        assert!(header.starts_with("#infile: aln.fasta\n#seq number: 3\n"));
        assert!(header.contains("#Nucleotide diversity, Pi: 0.12346\n"));
        assert!(header.ends_with(&"=".repeat(35)));
    }

    #[test]
    fn test_sort_by_reference_order() {
        let results = vec![fragment("rbcL", 0.01), fragment("psbA", 0.02), fragment("matK", 0.03)];
        let order: Vec<String> = ["psbA", "ycf1", "matK", "rbcL"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let sorted = sort_by_reference_order(&results, &order);
        let names: Vec<_> = sorted.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["psbA", "matK", "rbcL"]);
        assert_eq!(fragment_line(&sorted[0]), "psbA\t0.02000");
    }

    #[test]
    fn test_read_reference_order_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order.txt");
        fs::write(&path, "psbA\n\n  matK \nrbcL\n").unwrap();
        assert_eq!(read_reference_order(&path).unwrap(), vec!["psbA", "matK", "rbcL"]);
    }
}
