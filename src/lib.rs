//! Plastome Toolkit - chloroplast genome comparative analysis
//!
//! Locates the inverted repeats of plastid genomes and partitions them into
//! LSC/IRb/SSC/IRa, and computes nucleotide diversity (Pi) over alignments,
//! globally, in sliding windows, or per gene/IGS fragment.

pub mod analysis;
pub mod settings;

pub use analysis::*;
