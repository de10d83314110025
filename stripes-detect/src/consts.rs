/// Fewest windows an (orientation, width) null distribution may be built from.
pub const MIN_NULL_WINDOWS: usize = 30;

/// Multiplier spreading the run seed over chromosomes.
pub const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Gaussian kernels are cut at this many standard deviations.
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// Rows are kept when their contrast reaches this fraction of the reference.
pub const ROW_CONTRAST_FRACTION: f64 = 0.5;

/// Saturation quantiles of a run when none are given.
pub const DEFAULT_MAXPIXEL: [f64; 5] = [0.95, 0.96, 0.97, 0.98, 0.99];
