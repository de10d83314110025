use std::ops::Range;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StripeError {
    #[error("There is no chromosome called {name} in the provided matrix or it is shorter than {min_length} bp")]
    UnknownChromosome { name: String, min_length: u64 },

    #[error("Exit: no usable chromosomes (all are shorter than {0} bp, missing, or failed background estimation)")]
    NoUsableChromosomes(u64),

    #[error("Background distribution can't be estimated for {chrom}: {reason}")]
    DegenerateBackground { chrom: String, reason: String },

    #[error("Stripe geometry rejected: {0}")]
    Geometry(String),

    #[error("Chromosome not present in the contact matrix: {0}")]
    MissingChromosome(String),

    #[error("Window rows {rows:?}, cols {cols:?} is out of bounds for {chrom} ({n_bins} bins)")]
    OutOfBounds {
        chrom: String,
        rows: Range<usize>,
        cols: Range<usize>,
        n_bins: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),
}

/// Result type alias for stripe calling operations.
pub type Result<T> = std::result::Result<T, StripeError>;
