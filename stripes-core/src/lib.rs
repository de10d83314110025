//! # Core models for calling stripes in Hi-C contact matrices.
//!
//! A stripe is an elongated band of elevated contact frequency that starts at the
//! diagonal of a contact matrix and extends away from it. This crate holds the
//! types shared by the detection engine and the io layer:
//!
//! - [`Chromosome`], [`Orientation`], [`BinSpan`] and [`Footprint`] describe where a
//!   stripe sits in bin space
//! - [`StripeCandidate`] and [`ResultTable`] carry detected stripes and final results
//! - [`MatrixSource`] is the read-only window access the engine needs from a matrix
//! - [`Warnings`] collects run-level warnings so they are reported once
//!
pub mod consts;
pub mod errors;
pub mod models;
pub mod selection;
pub mod source;
pub mod warnings;

// re-exports
pub use errors::*;
pub use models::*;
pub use selection::{ChromosomeSelection, select_chromosomes};
pub use source::MatrixSource;
pub use warnings::Warnings;
