//! # Stripe detection engine.
//!
//! Finds stripes in a Hi-C contact matrix behind a [`stripes_core::MatrixSource`].
//! A run goes through five stages:
//!
//! 1. [`BackgroundModel`] samples windows along the diagonal of every usable
//!    chromosome and builds a [`NullDistribution`] of window means per orientation
//!    and width.
//! 2. [`CandidateExtractor`] saturates the matrix at one threshold, finds vertical
//!    edges and pairs them into rectangles, once per (chromosome, threshold).
//! 3. [`SignificanceEstimator`] attaches an empirical p-value to every candidate.
//! 4. [`resolve`] keeps one candidate per physical stripe.
//! 5. [`StripinessScorer`] scores each survivor against its flanks.
//!
//! [`StripeCaller`] wires the stages together on a rayon pool.
//!
//! ```no_run
//! use stripes_core::ChromosomeSelection;
//! use stripes_detect::{StripeCaller, StripeParams};
//! # fn run(map: &dyn stripes_core::MatrixSource) -> stripes_core::Result<()> {
//! let caller = StripeCaller::new(map, StripeParams::default())?;
//! let report = caller.run(&ChromosomeSelection::All)?;
//! println!("{} stripes pass the cutoff", report.filtered.len());
//! # Ok(())
//! # }
//! ```
pub mod background;
pub mod consts;
pub mod extract;
pub mod image;
pub mod params;
pub mod pipeline;
pub mod redundancy;
pub mod significance;
pub mod stats;
pub mod stripiness;
pub mod window;

// re-exports
pub use background::{BackgroundModel, EmpiricalDistribution, NullDistribution, NullSamples};
pub use extract::CandidateExtractor;
pub use params::{NullSampling, ParamsError, StripeParams};
pub use pipeline::{StripeCaller, StripeReport};
pub use redundancy::{RankKey, resolve};
pub use significance::SignificanceEstimator;
pub use stripiness::StripinessScorer;
