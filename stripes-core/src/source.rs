use std::ops::Range;

use ndarray::Array2;

use crate::errors::{Result, StripeError};
use crate::models::{Chromosome, Footprint};

///
/// Read-only access to a symmetric, non-negative contact matrix.
///
/// Implementations must be safe to share between worker threads; the detection
/// engine reads windows concurrently and never writes.
///
pub trait MatrixSource: Send + Sync {
    /// Bin size in bp.
    fn resolution(&self) -> u32;

    /// Chromosomes of the matrix, in matrix order.
    fn chromosomes(&self) -> Vec<Chromosome>;

    ///
    /// Read a dense window of one chromosome's matrix.
    ///
    /// # Arguments
    /// - chrom: chromosome name
    /// - rows: row bins, must lie within the chromosome
    /// - cols: column bins, must lie within the chromosome
    fn fetch(&self, chrom: &str, rows: Range<usize>, cols: Range<usize>) -> Result<Array2<f64>>;

    /// Number of bins of a chromosome.
    fn n_bins(&self, chrom: &str) -> Result<usize> {
        self.chromosomes()
            .iter()
            .find(|c| c.name == chrom)
            .map(|c| c.n_bins(self.resolution()))
            .ok_or_else(|| StripeError::MissingChromosome(chrom.to_string()))
    }

    ///
    /// Whole matrix of one chromosome, with the resolution. Only sensible for
    /// small chromosomes; the engine itself works on windows.
    ///
    fn get(&self, chrom: &str) -> Result<(Array2<f64>, u32)> {
        let n = self.n_bins(chrom)?;
        Ok((self.fetch(chrom, 0..n, 0..n)?, self.resolution()))
    }

    ///
    /// Values of a stripe footprint laid out length x width: rows follow the
    /// extent, columns the anchor.
    ///
    /// For a left stripe this reads the mirror image below the diagonal, which
    /// holds the same values because the matrix is symmetric.
    fn fetch_footprint(&self, chrom: &str, footprint: &Footprint) -> Result<Array2<f64>> {
        self.fetch(
            chrom,
            footprint.extent.as_range(),
            footprint.anchor.as_range(),
        )
    }
}
