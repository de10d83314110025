//! Null model of window intensities along the diagonal.
//!
//! For every usable chromosome, windows the shape of a minimal stripe are
//! sampled right next to the diagonal and their mean intensity recorded, per
//! orientation and per width. The merged samples form the [`NullDistribution`]
//! candidates are tested against.

use log::debug;
use ndarray::{Array2, s};
use rand::prelude::*;

use stripes_core::{Chromosome, MatrixSource, Orientation, Result, StripeError};

use crate::consts::{MIN_NULL_WINDOWS, SEED_STRIDE};
use crate::params::{NullSampling, StripeParams};

///
/// Sorted sample of a window statistic.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmpiricalDistribution {
    values: Vec<f64>,
}

impl EmpiricalDistribution {
    pub fn new(mut values: Vec<f64>) -> Self {
        values.retain(|v| v.is_finite());
        values.sort_by(f64::total_cmp);
        EmpiricalDistribution { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    ///
    /// Upper tail probability of `observed`, `(#{v >= observed} + 1) / (n + 1)`.
    /// Ties count as at least as extreme. A non-finite observation gets 1.
    ///
    pub fn upper_tail(&self, observed: f64) -> f64 {
        if !observed.is_finite() {
            return 1.0;
        }
        let below = self.values.partition_point(|v| *v < observed);
        let at_least = self.values.len() - below;
        (at_least + 1) as f64 / (self.values.len() + 1) as f64
    }
}

///
/// Window statistics of one chromosome, before merging.
///
/// `windows[orientation.index()][width - 1]` holds the means of every usable
/// window of that orientation and width.
///
#[derive(Debug, Clone, PartialEq)]
pub struct NullSamples {
    pub chrom: String,
    pub windows: [Vec<Vec<f64>>; 2],
}

impl NullSamples {
    pub fn new<T: Into<String>>(chrom: T, max_width: usize) -> Self {
        NullSamples {
            chrom: chrom.into(),
            windows: [vec![Vec::new(); max_width], vec![Vec::new(); max_width]],
        }
    }

    pub fn get(&self, orientation: Orientation, width: usize) -> &[f64] {
        width
            .checked_sub(1)
            .and_then(|idx| self.windows[orientation.index()].get(idx))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    fn push(&mut self, orientation: Orientation, width: usize, value: f64) {
        self.windows[orientation.index()][width - 1].push(value);
    }

    /// Fewest windows collected for any (orientation, width).
    pub fn min_count(&self) -> usize {
        self.windows
            .iter()
            .flat_map(|per_width| per_width.iter().map(|v| v.len()))
            .min()
            .unwrap_or(0)
    }
}

///
/// Empirical null distributions of the window mean, keyed by orientation and
/// width. Built once per run and shared read-only by every extraction pass.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NullDistribution {
    distributions: [Vec<EmpiricalDistribution>; 2],
}

impl NullDistribution {
    ///
    /// Merge the samples of several chromosomes.
    ///
    pub fn from_samples<'a, I>(samples: I, max_width: usize) -> Self
    where
        I: IntoIterator<Item = &'a NullSamples>,
    {
        let mut merged: [Vec<Vec<f64>>; 2] =
            [vec![Vec::new(); max_width], vec![Vec::new(); max_width]];
        for sample in samples {
            for orientation in Orientation::ALL {
                let idx = orientation.index();
                for (width_idx, values) in sample.windows[idx].iter().enumerate().take(max_width) {
                    merged[idx][width_idx].extend_from_slice(values);
                }
            }
        }

        let [left, right] = merged;
        NullDistribution {
            distributions: [
                left.into_iter().map(EmpiricalDistribution::new).collect(),
                right.into_iter().map(EmpiricalDistribution::new).collect(),
            ],
        }
    }

    pub fn get(&self, orientation: Orientation, width: usize) -> Option<&EmpiricalDistribution> {
        width
            .checked_sub(1)
            .and_then(|idx| self.distributions[orientation.index()].get(idx))
            .filter(|dist| !dist.is_empty())
    }

    /// Largest width with a distribution.
    pub fn max_width(&self) -> usize {
        self.distributions[0].len().min(self.distributions[1].len())
    }
}

///
/// Samples diagonal windows of a matrix to build the null distribution.
///
pub struct BackgroundModel<'a> {
    source: &'a dyn MatrixSource,
    min_length: usize,
    max_width: usize,
    null_samples: usize,
    sampling: NullSampling,
    seed: u64,
}

impl<'a> BackgroundModel<'a> {
    pub fn new(source: &'a dyn MatrixSource, params: &StripeParams) -> Self {
        BackgroundModel {
            source,
            min_length: params.min_length,
            max_width: params.max_width,
            null_samples: params.null_samples,
            sampling: params.null_sampling,
            seed: params.seed,
        }
    }

    /// Seed of the `index`-th chromosome of a run.
    pub fn chromosome_seed(&self, index: usize) -> u64 {
        self.seed
            .wrapping_add((index as u64).wrapping_mul(SEED_STRIDE))
    }

    fn positions(&self, n_bins: usize, seed: u64) -> Vec<usize> {
        if n_bins == 0 {
            return Vec::new();
        }
        match self.sampling {
            NullSampling::Random => {
                let mut rng = StdRng::seed_from_u64(seed);
                (0..self.null_samples)
                    .map(|_| rng.random_range(0..n_bins))
                    .collect()
            }
            NullSampling::Systematic => (0..self.null_samples)
                .map(|i| ((i as f64 + 0.5) * n_bins as f64 / self.null_samples as f64) as usize)
                .collect(),
        }
    }

    ///
    /// Sample the windows of one chromosome.
    ///
    /// # Arguments
    /// - chrom: chromosome to sample
    /// - seed: seed of the position generator, see [`BackgroundModel::chromosome_seed`]
    ///
    /// # Returns
    /// The window means, or [`StripeError::DegenerateBackground`] when some
    /// (orientation, width) gets fewer than the minimum number of windows.
    pub fn sample_chromosome(&self, chrom: &Chromosome, seed: u64) -> Result<NullSamples> {
        let n_bins = chrom.n_bins(self.source.resolution());
        let length = self.min_length;
        let max_width = self.max_width;
        let mut samples = NullSamples::new(chrom.name.clone(), max_width);

        for a in self.positions(n_bins, seed) {
            // right: anchor [a, a + w), extent [a - L, a)
            if a >= length && a < n_bins {
                let cols_end = (a + max_width).min(n_bins);
                let block = self.source.fetch(&chrom.name, a - length..a, a..cols_end)?;
                for width in 1..=block.ncols() {
                    if let Some(mean) = window_mean(&block, 0..width) {
                        samples.push(Orientation::Right, width, mean);
                    }
                }
            }

            // left: anchor [a - w, a), extent [a, a + L)
            if a > 0 && a + length <= n_bins {
                let cols_start = a.saturating_sub(max_width);
                let block = self.source.fetch(&chrom.name, a..a + length, cols_start..a)?;
                let n_cols = block.ncols();
                for width in 1..=n_cols {
                    if let Some(mean) = window_mean(&block, n_cols - width..n_cols) {
                        samples.push(Orientation::Left, width, mean);
                    }
                }
            }
        }

        let min_count = samples.min_count();
        debug!(
            "{}: sampled background, at least {} windows per width",
            chrom.name, min_count
        );
        if min_count < MIN_NULL_WINDOWS {
            return Err(StripeError::DegenerateBackground {
                chrom: chrom.name.clone(),
                reason: format!(
                    "only {} usable windows for some width, {} needed",
                    min_count, MIN_NULL_WINDOWS
                ),
            });
        }

        Ok(samples)
    }

    ///
    /// Sample every chromosome in turn and merge the windows. Chromosomes whose
    /// background is degenerate make the whole estimate fail.
    ///
    pub fn estimate(&self, chromosomes: &[Chromosome]) -> Result<NullDistribution> {
        let samples = chromosomes
            .iter()
            .enumerate()
            .map(|(idx, chrom)| self.sample_chromosome(chrom, self.chromosome_seed(idx)))
            .collect::<Result<Vec<NullSamples>>>()?;
        Ok(NullDistribution::from_samples(&samples, self.max_width))
    }
}

/// Mean of the given columns of a block; `None` when a value is not finite.
fn window_mean(block: &Array2<f64>, cols: std::ops::Range<usize>) -> Option<f64> {
    let window = block.slice(s![.., cols]);
    if window.is_empty() || window.iter().any(|v| !v.is_finite()) {
        return None;
    }
    window.mean()
}
