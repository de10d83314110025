/// Chromosomes must be strictly longer than this (in bp) to be analysed.
pub const MIN_CHROM_LENGTH: u64 = 500_000;

/// Pseudocount added to both sides of every intensity ratio.
pub const LOG_PSEUDOCOUNT: f64 = 1e-9;
