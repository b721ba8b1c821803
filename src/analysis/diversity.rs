//! Nucleotide diversity (Pi) over gap-free alignment sites
//!
//! Gap columns are dropped before any statistic is computed. Windows are
//! laid out over the remaining conserved sites and their midpoints are
//! mapped back to original alignment columns.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;

use log::{info, warn};
use rayon::prelude::*;

use super::error::AnalysisError;
use super::nucleotide::{base_index, GAP};
use super::records::AlignmentMatrix;
use super::types::{PiReport, PiWindow, PiWindowParams, ProgressUpdate};

/// Conserved-site index to original alignment column, strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConservedSiteMap(Vec<usize>);

impl ConservedSiteMap {
    pub fn original_index(&self, conserved: usize) -> Option<usize> {
        self.0.get(conserved).copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Alignment restricted to columns without gaps in any row
#[derive(Debug, Clone)]
pub struct ConservedAlignment {
    rows: Vec<Vec<u8>>,
    site_map: ConservedSiteMap,
    alignment_length: usize,
}

impl ConservedAlignment {
    pub fn from_alignment(alignment: &AlignmentMatrix) -> Self {
        let rows = alignment.rows();
        let alignment_length = alignment.alignment_length();

        let kept: Vec<usize> = (0..alignment_length)
            .filter(|&col| rows.iter().all(|row| row[col] != GAP))
            .collect();

        let conserved_rows = rows
            .iter()
            .map(|row| kept.iter().map(|&col| row[col]).collect())
            .collect();

        Self {
            rows: conserved_rows,
            site_map: ConservedSiteMap(kept),
            alignment_length,
        }
    }

    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    pub fn site_map(&self) -> &ConservedSiteMap {
        &self.site_map
    }

    pub fn sample_count(&self) -> usize {
        self.rows.len()
    }

    pub fn alignment_length(&self) -> usize {
        self.alignment_length
    }

    pub fn conserved_length(&self) -> usize {
        self.site_map.len()
    }
}

/// Pi and number of segregating sites over a set of columns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteDiversity {
    pub pi: f64,
    pub segregating_sites: usize,
}

/// Number of sample pairs whose symbols differ at one column.
fn column_differences(rows: &[Vec<u8>], col: usize) -> usize {
    let mut counts = [0usize; 4];
    for row in rows {
        if let Some(i) = base_index(row[col]) {
            counts[i] += 1;
        }
    }
    let n = rows.len();
    let same: usize = counts.iter().map(|&c| c * c.saturating_sub(1) / 2).sum();
    n * n.saturating_sub(1) / 2 - same
}

/// Nei's Pi over `range` of gap-free columns. 0.0 for an empty range.
pub fn nucleotide_diversity(rows: &[Vec<u8>], range: Range<usize>) -> SiteDiversity {
    let n = rows.len();
    let pairs = n * n.saturating_sub(1) / 2;
    let len = range.len();
    if len == 0 || pairs == 0 {
        return SiteDiversity {
            pi: 0.0,
            segregating_sites: 0,
        };
    }

    let mut total = 0usize;
    let mut segregating_sites = 0usize;
    for col in range {
        let diff = column_differences(rows, col);
        total += diff;
        if diff > 0 {
            segregating_sites += 1;
        }
    }

    SiteDiversity {
        pi: total as f64 / pairs as f64 / len as f64,
        segregating_sites,
    }
}

/// Effective window layout over the conserved sites
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlan {
    pub window: usize,
    pub step: usize,
    pub count: usize,
}

impl WindowPlan {
    /// Clamp window and step to the conserved length (0 means the whole length).
    pub fn resolve(
        window: usize,
        step: usize,
        conserved_len: usize,
    ) -> Result<Self, AnalysisError> {
        let clamp = |v: usize| if v == 0 { conserved_len } else { v.min(conserved_len) };
        let (window, step) = (clamp(window), clamp(step));

        if window == 0 || step == 0 {
            return Err(AnalysisError::Configuration {
                window,
                step,
                reason: "window and step must be positive".to_string(),
            });
        }
        if window < step {
            return Err(AnalysisError::Configuration {
                window,
                step,
                reason: "window must be larger than step".to_string(),
            });
        }

        Ok(Self {
            window,
            step,
            count: (conserved_len - window) / step + 1,
        })
    }

    /// 0-based half-open conserved-site span of window `index`
    pub fn span(&self, index: usize) -> Range<usize> {
        let start = index * self.step;
        start..start + self.window
    }
}

/// Compute every window of `plan`, checking `cancel` before each one.
pub fn scan_windows(
    conserved: &ConservedAlignment,
    plan: &WindowPlan,
    progress_tx: Option<&Sender<ProgressUpdate>>,
    cancel: &AtomicBool,
) -> Result<Vec<PiWindow>, AnalysisError> {
    let completed = AtomicUsize::new(0);
    let total = plan.count;

    let windows: Option<Vec<PiWindow>> = (0..plan.count)
        .into_par_iter()
        .map(|index| {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }

            let span = plan.span(index);
            let start = span.start + 1;
            let end = span.end;
            let stats = nucleotide_diversity(conserved.rows(), span);
            let mid = (start + end) / 2;
            let midpoint = conserved.site_map().as_slice()[mid - 1] + 1;

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(tx) = progress_tx {
                if done % 10 == 0 || done == total {
                    let _ = tx.send(ProgressUpdate::new(
                        done,
                        total,
                        format!("Window {}/{}", done, total),
                    ));
                }
            }

            Some(PiWindow {
                start,
                end,
                midpoint,
                pi: stats.pi,
                segregating_sites: stats.segregating_sites,
            })
        })
        .collect();

    windows.ok_or(AnalysisError::Cancelled)
}

/// Global statistics plus the sliding-window profile for one alignment.
pub fn diversity_report(
    alignment: &AlignmentMatrix,
    source: &str,
    params: &PiWindowParams,
    progress_tx: Option<&Sender<ProgressUpdate>>,
    cancel: &AtomicBool,
) -> Result<PiReport, AnalysisError> {
    let samples = alignment.sample_count();
    if samples < 2 {
        return Err(AnalysisError::InsufficientSamples(samples));
    }

    let conserved = ConservedAlignment::from_alignment(alignment);
    let conserved_len = conserved.conserved_length();
    info!(
        "{}: {} samples, {} columns, {} conserved",
        source,
        samples,
        conserved.alignment_length(),
        conserved_len
    );

    let mut report = PiReport {
        source: source.to_string(),
        sample_count: samples,
        alignment_length: conserved.alignment_length(),
        conserved_length: conserved_len,
        window: 0,
        step: 0,
        pi: 0.0,
        segregating_sites: 0,
        windows: Vec::new(),
    };

    if conserved_len == 0 {
        warn!("{}: every column contains a gap, Pi reported as 0", source);
        return Ok(report);
    }

    let global = nucleotide_diversity(conserved.rows(), 0..conserved_len);
    let plan = WindowPlan::resolve(params.window, params.step, conserved_len)?;
    let pool = params.thread_count.build_pool()?;
    let windows = pool.install(|| scan_windows(&conserved, &plan, progress_tx, cancel))?;

    report.window = plan.window;
    report.step = plan.step;
    report.pi = global.pi;
    report.segregating_sites = global.segregating_sites;
    report.windows = windows;
    Ok(report)
}

/// Pi of a whole gene or IGS alignment after gap-column removal.
pub fn fragment_pi(alignment: &AlignmentMatrix) -> Result<f64, AnalysisError> {
    let samples = alignment.sample_count();
    if samples < 2 {
        return Err(AnalysisError::InsufficientSamples(samples));
    }
    let conserved = ConservedAlignment::from_alignment(alignment);
    Ok(nucleotide_diversity(conserved.rows(), 0..conserved.conserved_length()).pi)
}
