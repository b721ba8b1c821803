//! Parameter and result types for the analysis jobs

use serde::{Deserialize, Serialize};

/// Thread count configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ThreadCount {
    /// Use all available CPU cores
    #[default]
    Auto,
    /// Use a specific number of threads
    Fixed(usize),
}

impl ThreadCount {
    /// Get the actual number of threads to use
    pub fn get_count(&self) -> usize {
        match self {
            Self::Auto => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            Self::Fixed(n) => (*n).max(1),
        }
    }

    /// Build a rayon pool sized for this setting
    pub fn build_pool(&self) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.get_count())
            .build()
    }
}

/// Sliding-window Pi parameters.
///
/// A window or step of 0 means "the whole conserved alignment".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiWindowParams {
    pub window: usize,
    pub step: usize,
    /// Rewrite `N` to a gap before validation
    pub n_as_gap: bool,
    pub thread_count: ThreadCount,
}

impl Default for PiWindowParams {
    fn default() -> Self {
        Self {
            window: 600,
            step: 200,
            n_as_gap: false,
            thread_count: ThreadCount::Auto,
        }
    }
}

/// Kind of fragment alignments processed by the per-fragment Pi batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FragmentKind {
    #[default]
    Gene,
    Igs,
}

impl FragmentKind {
    pub const ALL: [FragmentKind; 2] = [FragmentKind::Gene, FragmentKind::Igs];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Gene => "gene",
            Self::Igs => "IGS",
        }
    }
}

/// Per-fragment Pi parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FragmentPiParams {
    pub kind: FragmentKind,
    pub n_as_gap: bool,
    pub thread_count: ThreadCount,
}

/// One sliding window of the Pi profile.
///
/// `start`/`end` are 1-based inclusive conserved-site coordinates;
/// `midpoint` is 1-based in original alignment coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiWindow {
    pub start: usize,
    pub end: usize,
    pub midpoint: usize,
    pub pi: f64,
    pub segregating_sites: usize,
}

/// Complete sliding-window diversity report for one alignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiReport {
    pub source: String,
    pub sample_count: usize,
    pub alignment_length: usize,
    pub conserved_length: usize,
    pub window: usize,
    pub step: usize,
    pub pi: f64,
    pub segregating_sites: usize,
    pub windows: Vec<PiWindow>,
}

/// Pi of one gene or IGS alignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentPi {
    pub name: String,
    pub pi: f64,
}

/// Progress update during a job
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub completed: usize,
    pub total: usize,
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(completed: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            completed,
            total,
            message: message.into(),
        }
    }

    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }
}
