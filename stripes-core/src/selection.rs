//! Validation of the chromosomes requested for a run.
//!
//! Chromosomes at or below the length floor, or shorter than two bins, are never
//! analysed. Requested names that are missing are reported once, together with
//! the list of valid alternatives; the run only fails when nothing usable is
//! left.

use std::str::FromStr;

use crate::errors::{Result, StripeError};
use crate::models::Chromosome;
use crate::warnings::Warnings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChromosomeSelection {
    All,
    Named(Vec<String>),
}

impl FromStr for ChromosomeSelection {
    type Err = String;

    ///
    /// Parse `all` or a comma separated list of chromosome names.
    ///
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let names: Vec<String> = s
            .split(',')
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(|name| name.to_string())
            .collect();

        match names.as_slice() {
            [] => Err("No chromosomes given".to_string()),
            [only] if only == "all" => Ok(ChromosomeSelection::All),
            _ => Ok(ChromosomeSelection::Named(names)),
        }
    }
}

///
/// Pick the chromosomes to analyse.
///
/// # Arguments
/// - available: chromosomes of the matrix, in matrix order
/// - selection: `all` or the requested names
/// - min_length: chromosomes must be strictly longer than this (bp)
/// - resolution: bin size of the matrix
/// - warnings: collector for missing or too-short requests
///
/// # Returns
/// The usable chromosomes, in matrix order for `all` and in request order
/// otherwise, or [`StripeError::NoUsableChromosomes`] when none remain.
pub fn select_chromosomes(
    available: &[Chromosome],
    selection: &ChromosomeSelection,
    min_length: u64,
    resolution: u32,
    warnings: &mut Warnings,
) -> Result<Vec<Chromosome>> {
    let usable: Vec<&Chromosome> = available
        .iter()
        .filter(|chrom| chrom.length > min_length && chrom.length >= 2 * resolution as u64)
        .collect();

    if usable.is_empty() {
        return Err(StripeError::NoUsableChromosomes(min_length));
    }

    let selected: Vec<Chromosome> = match selection {
        ChromosomeSelection::All => usable.into_iter().cloned().collect(),
        ChromosomeSelection::Named(names) => {
            let mut selected: Vec<Chromosome> = Vec::with_capacity(names.len());
            let mut missing = false;

            for name in names {
                match usable.iter().find(|chrom| &chrom.name == name) {
                    Some(chrom) => {
                        if !selected.iter().any(|c| &c.name == name) {
                            selected.push((*chrom).clone());
                        }
                    }
                    None => {
                        let err = StripeError::UnknownChromosome {
                            name: name.clone(),
                            min_length,
                        };
                        warnings.push(err.to_string());
                        missing = true;
                    }
                }
            }

            if missing {
                let possible: Vec<&str> = usable.iter().map(|chrom| chrom.name.as_str()).collect();
                warnings.push(format!(
                    "The possible chromosomes are: {}",
                    possible.join(", ")
                ));
            }

            selected
        }
    };

    if selected.is_empty() {
        return Err(StripeError::NoUsableChromosomes(min_length));
    }

    Ok(selected)
}
