use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stripes_core::consts::MIN_CHROM_LENGTH;

use crate::consts::DEFAULT_MAXPIXEL;
use crate::redundancy::RankKey;

#[derive(Error, Debug)]
pub enum ParamsError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

pub type ParamsResult<T> = std::result::Result<T, ParamsError>;

///
/// How diagonal positions are chosen for the background model.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullSampling {
    /// Uniformly at random from a seeded generator.
    #[default]
    Random,
    /// Evenly spaced along the chromosome.
    Systematic,
}

fn default_num_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

///
/// Every knob of a stripe calling run.
///
/// Missing keys of a TOML config take their default.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripeParams {
    /// Standard deviation of the Gaussian smoothing before edge detection.
    pub canny: f64,
    /// Shortest stripe, in bins.
    pub min_length: usize,
    /// Widest stripe, in bins.
    pub max_width: usize,
    /// Saturation quantiles, one extraction pass each.
    pub maxpixel: Vec<f64>,
    pub num_threads: usize,
    pub pvalue_cutoff: f64,

    /// Diagonal positions drawn per chromosome for the background.
    pub null_samples: usize,
    pub null_sampling: NullSampling,
    pub seed: u64,
    /// Side of the square tiles the diagonal is scanned in, in bins.
    pub tile_size: usize,
    /// Bounding-box overlap (fraction of the smaller box) that makes two
    /// candidates the same stripe.
    pub min_overlap: f64,
    /// Order in which overlapping candidates are kept.
    pub rank_key: RankKey,
    /// Hysteresis thresholds, in slope units of the saturated image.
    pub edge_low: f64,
    pub edge_high: f64,
    /// Chromosomes must be strictly longer than this, in bp.
    pub min_chrom_length: u64,
    pub progress: bool,
}

impl Default for StripeParams {
    fn default() -> Self {
        StripeParams {
            canny: 2.5,
            min_length: 10,
            max_width: 8,
            maxpixel: DEFAULT_MAXPIXEL.to_vec(),
            num_threads: default_num_threads(),
            pvalue_cutoff: 0.2,
            null_samples: 1000,
            null_sampling: NullSampling::Random,
            seed: 0,
            tile_size: 400,
            min_overlap: 0.5,
            rank_key: RankKey::PValue,
            edge_low: 0.01,
            edge_high: 0.025,
            min_chrom_length: MIN_CHROM_LENGTH,
            progress: false,
        }
    }
}

impl TryFrom<&Path> for StripeParams {
    type Error = ParamsError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        let params: StripeParams = toml::from_str(&toml_str)?;
        params.validate()?;
        Ok(params)
    }
}

impl StripeParams {
    ///
    /// Check the parameters for values the engine cannot work with.
    ///
    pub fn validate(&self) -> ParamsResult<()> {
        let invalid = |msg: String| Err(ParamsError::Invalid(msg));

        if !(self.canny.is_finite() && self.canny > 0.0) {
            return invalid(format!("canny must be positive, got {}", self.canny));
        }
        if self.min_length < 2 {
            return invalid(format!(
                "min_length must be at least 2 bins, got {}",
                self.min_length
            ));
        }
        if self.max_width == 0 {
            return invalid("max_width must be at least 1 bin".to_string());
        }
        if self.maxpixel.is_empty() {
            return invalid("at least one maxpixel threshold is required".to_string());
        }
        if let Some(bad) = self
            .maxpixel
            .iter()
            .find(|q| !(q.is_finite() && **q > 0.0 && **q <= 1.0))
        {
            return invalid(format!("maxpixel values must lie in (0, 1], got {}", bad));
        }
        if self.num_threads == 0 {
            return invalid("num_threads must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.pvalue_cutoff) {
            return invalid(format!(
                "pvalue_cutoff must lie in [0, 1], got {}",
                self.pvalue_cutoff
            ));
        }
        if self.null_samples == 0 {
            return invalid("null_samples must be at least 1".to_string());
        }
        if !(self.min_overlap > 0.0 && self.min_overlap <= 1.0) {
            return invalid(format!(
                "min_overlap must lie in (0, 1], got {}",
                self.min_overlap
            ));
        }
        if !(self.edge_low >= 0.0 && self.edge_low <= self.edge_high) {
            return invalid(format!(
                "edge thresholds must satisfy 0 <= low <= high, got {} and {}",
                self.edge_low, self.edge_high
            ));
        }
        let min_tile = 2 * (self.min_length + self.max_width);
        if self.tile_size < min_tile {
            return invalid(format!(
                "tile_size must be at least {} bins, got {}",
                min_tile, self.tile_size
            ));
        }

        Ok(())
    }

    /// Saturation thresholds without repeats, in the order given.
    pub fn thresholds(&self) -> Vec<f64> {
        let mut thresholds: Vec<f64> = Vec::with_capacity(self.maxpixel.len());
        for q in &self.maxpixel {
            if !thresholds.contains(q) {
                thresholds.push(*q);
            }
        }
        thresholds
    }
}
