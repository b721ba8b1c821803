//! Error and warning types shared by the analysis engines

use std::fmt;
use thiserror::Error;

/// Fatal errors for a single input unit (one file or one alignment).
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A symbol outside the allowed alphabet was found
    #[error("invalid symbol '{symbol}' at row {row}, column {column}")]
    Validation {
        symbol: char,
        row: usize,
        column: usize,
    },
    #[error("sequence is empty")]
    EmptySequence,
    #[error("alignment rows differ in length: row {row} has {found} columns, expected {expected}")]
    RaggedAlignment {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("sample number is less than 2 (found {0})")]
    InsufficientSamples(usize),
    /// Window/step combination that cannot be scanned
    #[error("invalid window configuration (window {window}, step {step}): {reason}")]
    Configuration {
        window: usize,
        step: usize,
        reason: String,
    },
    #[error("unsupported file format for '{0}'; use FASTA (.fasta, .fa) or GenBank (.gb, .gbk)")]
    UnsupportedFormat(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("analysis cancelled")]
    Cancelled,
}

/// Non-fatal structural findings of the repeat region locator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StructuralWarning {
    NoRepeatFound,
    SeedNotFound,
}

impl fmt::Display for StructuralWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRepeatFound => {
                write!(f, "No repeated sequences longer than 1,000 bp were detected!")
            }
            Self::SeedNotFound => write!(f, "The assembled sequence may be wrong!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_symbol_and_position() {
        let err = AnalysisError::Validation {
            symbol: 'N',
            row: 2,
            column: 17,
        };
        assert_eq!(err.to_string(), "invalid symbol 'N' at row 2, column 17");
    }

    #[test]
    fn test_warning_texts() {
        assert_eq!(
            StructuralWarning::SeedNotFound.to_string(),
            "The assembled sequence may be wrong!"
        );
        assert_eq!(
            StructuralWarning::NoRepeatFound.to_string(),
            "No repeated sequences longer than 1,000 bp were detected!"
        );
    }
}
