use std::io;
use thiserror::Error;

/// Error type for stripes-io operations.
#[derive(Error, Debug)]
pub enum ContactMapError {
    /// IO error occurred during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A line of an input file could not be parsed.
    #[error("Line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// Pixel refers to a chromosome that has no size.
    #[error("Chromosome {0} is not listed in the chrom sizes")]
    UnknownChromosome(String),

    /// Pixel lies outside its chromosome.
    #[error("Bin {bin} is out of range for {chrom} ({n_bins} bins)")]
    BinOutOfRange {
        chrom: String,
        bin: usize,
        n_bins: usize,
    },

    /// Dense input matrix is not square.
    #[error("Matrix must be square, got {0} x {1}")]
    NotSquare(usize, usize),

    /// Resolution could not be determined or is zero.
    #[error("Could not determine a positive matrix resolution")]
    InvalidResolution,

    /// Value column does not exist.
    #[error("Value column {0} is out of range")]
    InvalidValueColumn(usize),
}

/// Result type alias for stripes-io operations.
pub type Result<T> = std::result::Result<T, ContactMapError>;
