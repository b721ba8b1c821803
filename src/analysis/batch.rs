//! Batch drivers run from the background job thread
//!
//! Each driver processes its inputs independently: a failure on one file is
//! recorded in the report and the batch moves on to the next file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::diversity::{diversity_report, fragment_pi};
use super::error::AnalysisError;
use super::records::{read_alignment, read_genome};
use super::regions::{locate_repeat_regions, RegionScan, RepeatRegions};
use super::report::{
    fragment_line, read_reference_order, sort_by_reference_order, write_lines,
    write_region_fasta,
};
use super::types::{FragmentPi, FragmentPiParams, PiReport, PiWindowParams, ProgressUpdate};

pub const REGION_SUMMARY_FILE: &str = "repeat_analysis_results.txt";
pub const PI_WINDOW_FILE: &str = "pi_results.txt";
pub const FRAGMENT_PI_FILE: &str = "Pi_results.txt";

fn send(progress_tx: Option<&Sender<ProgressUpdate>>, update: ProgressUpdate) {
    if let Some(tx) = progress_tx {
        let _ = tx.send(update);
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name(path))
}

/// Per-file outcome of the region finder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionFileOutcome {
    pub file_name: String,
    /// Line written to the summary file
    pub line: String,
    pub regions: Option<RepeatRegions>,
    pub fasta_files: Vec<PathBuf>,
    pub failed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionBatchReport {
    pub files: Vec<RegionFileOutcome>,
    pub summary_path: PathBuf,
}

/// Locate repeat regions in every input genome and write the region files.
pub fn run_region_batch(
    inputs: &[PathBuf],
    output_dir: &Path,
    progress_tx: Option<&Sender<ProgressUpdate>>,
    cancel: &AtomicBool,
) -> Result<RegionBatchReport, AnalysisError> {
    fs::create_dir_all(output_dir)?;
    let total = inputs.len();
    let mut files = Vec::with_capacity(total);

    for (i, input) in inputs.iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            return Err(AnalysisError::Cancelled);
        }
        let name = file_name(input);
        send(
            progress_tx,
            ProgressUpdate::new(i, total, format!("Finding regions in {}...", name)),
        );

        let outcome = match region_file(input, output_dir) {
            Ok((RegionScan::Resolved(regions), fasta_files)) => RegionFileOutcome {
                line: format!("{}\t{}", name, regions.summary_line()),
                file_name: name,
                regions: Some(regions),
                fasta_files,
                failed: false,
            },
            Ok((RegionScan::Unresolved(warning), _)) => {
                warn!("{}: {}", name, warning);
                RegionFileOutcome {
                    line: format!("{}\t{}", name, warning),
                    file_name: name,
                    regions: None,
                    fasta_files: Vec::new(),
                    failed: false,
                }
            }
            Err(e) => {
                warn!("{}: {}", name, e);
                RegionFileOutcome {
                    line: format!("Error processing {}: {}", name, e),
                    file_name: name,
                    regions: None,
                    fasta_files: Vec::new(),
                    failed: true,
                }
            }
        };
        files.push(outcome);
    }

    let summary_path = output_dir.join(REGION_SUMMARY_FILE);
    write_lines(&summary_path, files.iter().map(|f| f.line.as_str()))?;
    send(
        progress_tx,
        ProgressUpdate::new(total, total, format!("Results saved to {}", summary_path.display())),
    );
    info!("region finder processed {} file(s)", total);

    Ok(RegionBatchReport {
        files,
        summary_path,
    })
}

fn region_file(
    input: &Path,
    output_dir: &Path,
) -> Result<(RegionScan, Vec<PathBuf>), AnalysisError> {
    let genome = read_genome(input)?;
    let scan = locate_repeat_regions(&genome);
    let fasta_files = match &scan {
        RegionScan::Resolved(regions) => {
            write_region_fasta(output_dir, &file_stem(input), regions)?
        }
        RegionScan::Unresolved(_) => Vec::new(),
    };
    Ok((scan, fasta_files))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiWindowOutput {
    pub report: PiReport,
    pub table_path: PathBuf,
}

/// Sliding-window Pi for one alignment file; writes the window table.
pub fn run_pi_window(
    input: &Path,
    output_dir: &Path,
    params: &PiWindowParams,
    progress_tx: Option<&Sender<ProgressUpdate>>,
    cancel: &AtomicBool,
) -> Result<PiWindowOutput, AnalysisError> {
    fs::create_dir_all(output_dir)?;
    send(
        progress_tx,
        ProgressUpdate::new(0, 1, format!("Reading {}...", file_name(input))),
    );

    let alignment = read_alignment(input, params.n_as_gap)?;
    let source = fs::canonicalize(input)
        .unwrap_or_else(|_| input.to_path_buf())
        .display()
        .to_string();
    let report = diversity_report(&alignment, &source, params, progress_tx, cancel)?;

    let table_path = output_dir.join(PI_WINDOW_FILE);
    fs::write(&table_path, report.render_table())?;
    info!(
        "{}: Pi {:.5}, S {}, {} window(s)",
        source,
        report.pi,
        report.segregating_sites,
        report.windows.len()
    );

    Ok(PiWindowOutput { report, table_path })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentFailure {
    pub file_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentBatchReport {
    pub results: Vec<FragmentPi>,
    pub failures: Vec<FragmentFailure>,
    pub results_path: PathBuf,
    pub sorted: Vec<FragmentPi>,
    pub sorted_path: Option<PathBuf>,
}

/// Alignment files (`*.fasta`) of a directory, sorted by name.
pub fn list_fragment_files(input_dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
    let mut files: Vec<PathBuf> = fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "fasta"))
        .collect();
    files.sort();
    Ok(files)
}

/// Pi of every gene/IGS alignment in `input_dir`, optionally re-sorted by a reference order.
pub fn run_fragment_pi(
    input_dir: &Path,
    output_dir: &Path,
    reference_order: Option<&Path>,
    params: &FragmentPiParams,
    progress_tx: Option<&Sender<ProgressUpdate>>,
    cancel: &AtomicBool,
) -> Result<FragmentBatchReport, AnalysisError> {
    fs::create_dir_all(output_dir)?;
    let files = list_fragment_files(input_dir)?;
    let total = files.len();
    info!("{} {} alignment(s) in {}", total, params.kind.label(), input_dir.display());

    let completed = AtomicUsize::new(0);
    let pool = params.thread_count.build_pool()?;
    let outcomes: Option<Vec<(String, Result<f64, AnalysisError>)>> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                let pi = read_alignment(path, params.n_as_gap).and_then(|aln| fragment_pi(&aln));

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % 10 == 0 || done == total {
                    send(
                        progress_tx,
                        ProgressUpdate::new(done, total, format!("Alignment {}/{}", done, total)),
                    );
                }
                Some((file_stem(path), pi))
            })
            .collect()
    });
    let outcomes = outcomes.ok_or(AnalysisError::Cancelled)?;

    let mut results = Vec::new();
    let mut failures = Vec::new();
    for (name, outcome) in outcomes {
        match outcome {
            Ok(pi) => results.push(FragmentPi { name, pi }),
            Err(e) => {
                warn!("{}: {}", name, e);
                failures.push(FragmentFailure {
                    file_name: format!("{}.fasta", name),
                    error: e.to_string(),
                });
            }
        }
    }

    let results_path = output_dir.join(FRAGMENT_PI_FILE);
    write_lines(&results_path, results.iter().map(fragment_line))?;

    let (sorted, sorted_path) = match reference_order {
        Some(order_path) => {
            let order = read_reference_order(order_path)?;
            let sorted = sort_by_reference_order(&results, &order);
            let path = output_dir.join(format!("{}_sort_as_cp_order.txt", params.kind.label()));
            write_lines(&path, sorted.iter().map(fragment_line))?;
            (sorted, Some(path))
        }
        None => (Vec::new(), None),
    };

    Ok(FragmentBatchReport {
        results,
        failures,
        results_path,
        sorted,
        sorted_path,
    })
}
