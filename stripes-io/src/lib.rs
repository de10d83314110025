//! # Input/Output utilities for stripe calling.
//!
//! This small crate provides the pieces around the detection engine that touch the
//! disk: reading a contact matrix from a pixel dump into a sparse, symmetric
//! [`ContactMap`], reading chrom sizes files, writing result tables and preparing
//! the output directory.
//!
pub mod chrom_sizes;
pub mod contact_map;
pub mod error;
pub mod outdir;
pub mod reader;
pub mod results;

// re-expose core functions
pub use chrom_sizes::*;
pub use contact_map::*;
pub use error::*;
pub use outdir::*;
pub use reader::*;
pub use results::*;
