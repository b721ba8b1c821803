//! Inverted-repeat detection and LSC/IRb/SSC/IRa partitioning
//!
//! A coarse scan over fixed windows finds a seed stretch of the genome
//! whose reverse complement occurs elsewhere; two base-by-base walks then
//! extend the seed and its partner copy out to the exact IR junctions.
//! All coordinates are circular: regions may span the origin.

use log::debug;
use serde::{Deserialize, Serialize};

use super::error::StructuralWarning;
use super::nucleotide::{gc_content, is_complement, reverse_complement};
use super::records::GenomeRecord;

/// Size of the non-overlapping windows used to seed the repeat search
pub const SEED_WINDOW: usize = 500;

/// The four plastid genome regions, in genome order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Lsc,
    Irb,
    Ssc,
    Ira,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::Lsc, Region::Irb, Region::Ssc, Region::Ira];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Lsc => "LSC",
            Self::Irb => "IRb",
            Self::Ssc => "SSC",
            Self::Ira => "IRa",
        }
    }
}

/// A stretch of a circular sequence: `len` bases starting at 0-based `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: usize,
    pub len: usize,
}

impl Interval {
    /// True when the interval runs past the last base into position 0.
    pub fn wraps_origin(&self, genome_len: usize) -> bool {
        self.start + self.len > genome_len
    }

    /// 1-based inclusive coordinates: `a-b`, `a-L,1-b` across the origin, `-` when empty.
    pub fn coordinates(&self, genome_len: usize) -> String {
        if self.len == 0 {
            return "-".to_string();
        }
        let first = self.start + 1;
        let last = (self.start + self.len - 1) % genome_len + 1;
        if self.wraps_origin(genome_len) {
            format!("{}-{},1-{}", first, genome_len, last)
        } else {
            format!("{}-{}", first, last)
        }
    }

    /// Copy the interval's bases out of a circular sequence.
    pub fn extract(&self, sequence: &[u8]) -> Vec<u8> {
        let n = sequence.len();
        (0..self.len).map(|k| sequence[(self.start + k) % n]).collect()
    }

    /// Iterate the 0-based positions covered by the interval.
    pub fn positions(&self, genome_len: usize) -> impl Iterator<Item = usize> {
        let start = self.start;
        (0..self.len).map(move |k| (start + k) % genome_len)
    }
}

/// One located region with its sequence and GC percentage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSpan {
    pub region: Region,
    pub interval: Interval,
    pub sequence: Vec<u8>,
    pub gc: f64,
}

/// Result of a successful partition of the genome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepeatRegions {
    pub genome_length: usize,
    /// Spans in LSC, IRb, SSC, IRa order
    pub spans: Vec<RegionSpan>,
    pub total_gc: f64,
}

impl RepeatRegions {
    pub fn span(&self, region: Region) -> &RegionSpan {
        &self.spans[region as usize]
    }

    pub fn lsc_wraps_origin(&self) -> bool {
        self.span(Region::Lsc).interval.wraps_origin(self.genome_length)
    }

    /// Tab-separated summary: lengths, coordinates, GC percentages.
    pub fn summary_line(&self) -> String {
        let n = self.genome_length;
        let lsc = self.span(Region::Lsc);
        let irb = self.span(Region::Irb);
        let ssc = self.span(Region::Ssc);
        let ira = self.span(Region::Ira);

        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{:.2}\t{:.2}\t{:.2}",
            lsc.interval.len,
            irb.interval.len,
            ssc.interval.len,
            lsc.interval.coordinates(n),
            irb.interval.coordinates(n),
            ssc.interval.coordinates(n),
            ira.interval.coordinates(n),
            self.total_gc,
            lsc.gc,
            irb.gc,
            ssc.gc,
        )
    }

    /// Region label and sequence, in genome order
    pub fn region_sequences(&self) -> impl Iterator<Item = (&'static str, &[u8])> {
        self.spans
            .iter()
            .map(|s| (s.region.label(), s.sequence.as_slice()))
    }
}

/// Outcome of scanning one genome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegionScan {
    Resolved(RepeatRegions),
    Unresolved(StructuralWarning),
}

/// Locate the inverted repeats of a genome and partition it into four regions.
pub fn locate_repeat_regions(genome: &GenomeRecord) -> RegionScan {
    let seq = genome.sequence.as_slice();
    let n = seq.len();

    let runs = merge_runs(&seed_windows(seq));
    let Some((seed_start, seed_end)) = longest_run(&runs) else {
        return RegionScan::Unresolved(StructuralWarning::NoRepeatFound);
    };
    let seed_len = seed_end - seed_start;
    debug!(
        "{}: {} repeat run(s), seed {}..{}",
        genome.name,
        runs.len(),
        seed_start,
        seed_end
    );

    let partner = reverse_complement(&seq[seed_start..seed_end]);
    let Some(copy_start) = find_circular(seq, &partner, |i| {
        let d = (i + n - seed_start) % n;
        d < seed_len || n - d < seed_len
    }) else {
        return RegionScan::Unresolved(StructuralWarning::SeedNotFound);
    };

    // Unrolled coordinates: the second copy may end past `n`.
    let ((s1, mut e1), (mut s2, e2)) = if copy_start < seed_start {
        ((copy_start, copy_start + seed_len), (seed_start, seed_end))
    } else {
        ((seed_start, seed_end), (copy_start, copy_start + seed_len))
    };

    // Junction between the copies; stops before the walkers meet.
    let mut inner = 0;
    while e1 + 1 < s2 && is_complement(seq[e1], seq[s2 - 1]) {
        e1 += 1;
        s2 -= 1;
        inner += 1;
    }

    // Junction on the far side, possibly across the origin.
    let outer_gap = n + s1 - e2;
    let mut outer = 0;
    while 2 * (outer + 1) <= outer_gap {
        let before_first = (s1 + n - 1 - outer) % n;
        let after_second = (e2 + outer) % n;
        if !is_complement(seq[before_first], seq[after_second]) {
            break;
        }
        outer += 1;
    }
    debug!(
        "{}: junction walks extended {} bp inside, {} bp outside",
        genome.name, inner, outer
    );

    let ir_first = Interval {
        start: (s1 + n - outer) % n,
        len: e1 - s1 + outer,
    };
    let ir_second = Interval {
        start: s2 % n,
        len: e2 - s2 + outer,
    };
    let between = Interval {
        start: e1 % n,
        len: s2 - e1,
    };
    let across = Interval {
        start: (e2 + outer) % n,
        len: outer_gap - 2 * outer,
    };

    // LSC is the longer single-copy segment; labels then follow genome order.
    let layout = if between.len <= across.len {
        [across, ir_first, between, ir_second]
    } else {
        [between, ir_second, across, ir_first]
    };

    let spans: Vec<RegionSpan> = Region::ALL
        .iter()
        .zip(layout)
        .map(|(&region, interval)| {
            let sequence = interval.extract(seq);
            RegionSpan {
                region,
                interval,
                gc: gc_content(&sequence),
                sequence,
            }
        })
        .collect();

    // Both walks move the two copies in lockstep, so IRb and IRa always match in length.
    RegionScan::Resolved(RepeatRegions {
        genome_length: n,
        spans,
        total_gc: gc_content(seq),
    })
}

/// Start/end of every full window whose content occurs in the reverse complement.
fn seed_windows(seq: &[u8]) -> Vec<(usize, usize)> {
    let reverse = reverse_complement(seq);
    (0..seq.len())
        .step_by(SEED_WINDOW)
        .filter(|&i| i + SEED_WINDOW <= seq.len())
        .filter(|&i| contains(&reverse, &seq[i..i + SEED_WINDOW]))
        .map(|i| (i, i + SEED_WINDOW))
        .collect()
}

/// Coalesce touching windows into maximal runs.
fn merge_runs(windows: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    for &(start, end) in windows {
        match runs.last_mut() {
            Some(last) if last.1 == start => last.1 = end,
            _ => runs.push((start, end)),
        }
    }
    runs
}

/// First of the longest runs.
fn longest_run(runs: &[(usize, usize)]) -> Option<(usize, usize)> {
    runs.iter()
        .copied()
        .min_by_key(|&(start, end)| std::cmp::Reverse(end - start))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// First start position of `needle` in circular `seq`, ignoring starts rejected by `skip`.
fn find_circular(seq: &[u8], needle: &[u8], skip: impl Fn(usize) -> bool) -> Option<usize> {
    let n = seq.len();
    if needle.is_empty() || needle.len() > n {
        return None;
    }
    (0..n).find(|&i| {
        !skip(i)
            && needle
                .iter()
                .enumerate()
                .all(|(j, &b)| seq[(i + j) % n] == b)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct XorShift(u64);

    impl XorShift {
        fn bases(&mut self, len: usize) -> Vec<u8> {
            (0..len)
                .map(|_| {
                    self.0 ^= self.0 << 13;
                    self.0 ^= self.0 >> 7;
                    self.0 ^= self.0 << 17;
                    b"ACGT"[(self.0 % 4) as usize]
                })
                .collect()
        }
    }

    /// LSC + IRb + SSC + IRa with junction bases that cannot extend the repeat.
    fn plastome(lsc_len: usize, ir_len: usize, ssc_len: usize, seed: u64) -> Vec<u8> {
        let mut rng = XorShift(seed);
        let mut lsc = rng.bases(lsc_len);
        let irb = rng.bases(ir_len);
        let mut ssc = rng.bases(ssc_len);
        if let Some(last) = lsc.len().checked_sub(1) {
            lsc[0] = b'C';
            lsc[last] = b'C';
        }
        if let Some(last) = ssc.len().checked_sub(1) {
            ssc[0] = b'A';
            ssc[last] = b'A';
        }
        let ira = reverse_complement(&irb);
        [lsc, irb, ssc, ira].concat()
    }

    fn rotate(seq: &[u8], by: usize) -> Vec<u8> {
        [&seq[by..], &seq[..by]].concat()
    }

    fn resolve(seq: &[u8]) -> RepeatRegions {
        let genome = GenomeRecord::new("test", seq).unwrap();
        match locate_repeat_regions(&genome) {
            RegionScan::Resolved(regions) => regions,
            RegionScan::Unresolved(w) => panic!("unresolved: {w}"),
        }
    }

    fn coords(regions: &RepeatRegions) -> Vec<String> {
        Region::ALL
            .iter()
            .map(|&r| regions.span(r).interval.coordinates(regions.genome_length))
            .collect()
    }

    fn assert_partition(regions: &RepeatRegions) {
        let n = regions.genome_length;
        let mut covered = vec![0u8; n];
        for span in &regions.spans {
            for pos in span.interval.positions(n) {
                covered[pos] += 1;
            }
        }
        assert!(covered.iter().all(|&c| c == 1), "regions must tile the genome");
        let irb = &regions.span(Region::Irb).sequence;
        let ira = &regions.span(Region::Ira).sequence;
        assert_eq!(reverse_complement(irb), *ira);
    }

    #[test]
    fn test_canonical_layout() {
        let seq = plastome(5000, 1500, 2000, 42);
        let regions = resolve(&seq);
        assert_eq!(
            coords(&regions),
            vec!["1-5000", "5001-6500", "6501-8500", "8501-10000"]
        );
        assert!(!regions.lsc_wraps_origin());
        assert_partition(&regions);
    }

    #[test]
    fn test_boundaries_refined_past_seed_windows() {
        let seq = plastome(4900, 1700, 1700, 7);
        let regions = resolve(&seq);
        assert_eq!(
            coords(&regions),
            vec!["1-4900", "4901-6600", "6601-8300", "8301-10000"]
        );
        assert_partition(&regions);
    }

    #[test]
    fn test_ssc_across_origin() {
        let seq = rotate(&plastome(5000, 1500, 2000, 42), 7000);
        let regions = resolve(&seq);
        assert_eq!(
            coords(&regions),
            vec!["3001-8000", "8001-9500", "9501-10000,1-1500", "1501-3000"]
        );
        assert_partition(&regions);
    }

    #[test]
    fn test_lsc_across_origin() {
        let seq = rotate(&plastome(5000, 1500, 2000, 42), 2000);
        let regions = resolve(&seq);
        assert!(regions.lsc_wraps_origin());
        assert_eq!(
            coords(&regions),
            vec!["8001-10000,1-3000", "3001-4500", "4501-6500", "6501-8000"]
        );
        assert_partition(&regions);
    }

    #[test]
    fn test_ir_across_origin() {
        let seq = rotate(&plastome(5000, 1500, 2000, 42), 9000);
        let regions = resolve(&seq);
        assert_eq!(
            coords(&regions),
            vec!["1001-6000", "6001-7500", "7501-9500", "9501-10000,1-1000"]
        );
        assert_partition(&regions);
    }

    #[test]
    fn test_origin_inside_inverted_repeat() {
        let seq = plastome(2433, 1299, 1173, 42);
        let n = seq.len();
        for cut in [n - 700, n - 1100, 2533, 3083] {
            let regions = resolve(&rotate(&seq, cut));
            let lengths: Vec<usize> = regions.spans.iter().map(|s| s.interval.len).collect();
            assert_eq!(lengths, vec![2433, 1299, 1173, 1299], "rotation {cut}");
            assert_partition(&regions);
        }

        let regions = resolve(&rotate(&seq, n - 700));
        assert_eq!(
            coords(&regions),
            vec!["701-3133", "3134-4432", "4433-5605", "5606-6204,1-700"]
        );
    }

    #[test]
    fn test_repeats_at_sequence_ends() {
        // IR copies at [0,1500) and [8500,10000), single-copy content between.
        let seq = plastome(0, 1500, 7000, 11);
        let regions = resolve(&seq);
        assert_eq!(regions.span(Region::Irb).interval.len, 1500);
        assert_eq!(regions.span(Region::Ira).interval.len, 1500);
        assert_eq!(regions.span(Region::Lsc).interval.len, 7000);
        assert!(regions.span(Region::Ssc).interval.len < 7000);
        assert_partition(&regions);
    }

    #[test]
    fn test_summary_line_format() {
        let seq = plastome(5000, 1500, 2000, 42);
        let regions = resolve(&seq);
        let line = regions.summary_line();
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields.len(), 11);
        assert_eq!(
            &fields[..7],
            &["5000", "1500", "2000", "1-5000", "5001-6500", "6501-8500", "8501-10000"]
        );
        assert_eq!(fields[7], format!("{:.2}", gc_content(&seq)));
    }

    #[test]
    fn test_no_repeat() {
        let seq = XorShift(99).bases(5000);
        let genome = GenomeRecord::new("plain", &seq).unwrap();
        assert!(matches!(
            locate_repeat_regions(&genome),
            RegionScan::Unresolved(StructuralWarning::NoRepeatFound)
        ));
    }

    #[test]
    fn test_self_palindrome_reports_seed_not_found() {
        let half = XorShift(5).bases(1000);
        let seq = [half.clone(), reverse_complement(&half)].concat();
        let genome = GenomeRecord::new("palindrome", &seq).unwrap();
        assert!(matches!(
            locate_repeat_regions(&genome),
            RegionScan::Unresolved(StructuralWarning::SeedNotFound)
        ));
    }

    #[test]
    fn test_deterministic() {
        let seq = rotate(&plastome(4900, 1700, 1700, 3), 1234);
        let a = resolve(&seq);
        let b = resolve(&seq);
        assert_eq!(coords(&a), coords(&b));
        assert_eq!(a.summary_line(), b.summary_line());
    }

    #[test]
    fn test_merge_runs() {
        let runs = merge_runs(&[(0, 500), (500, 1000), (2000, 2500), (3000, 3500), (3500, 4000)]);
        assert_eq!(runs, vec![(0, 1000), (2000, 2500), (3000, 4000)]);
        assert_eq!(longest_run(&runs), Some((0, 1000)));
    }

    #[test]
    fn test_interval_coordinates() {
        assert_eq!(Interval { start: 0, len: 10 }.coordinates(100), "1-10");
        assert_eq!(Interval { start: 95, len: 10 }.coordinates(100), "96-100,1-5");
        assert_eq!(Interval { start: 3, len: 0 }.coordinates(100), "-");
    }
}
