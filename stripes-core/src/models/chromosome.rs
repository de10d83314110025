use std::fmt::{self, Display};

use serde::Serialize;

///
/// A chromosome of the contact matrix: its name and length in bp.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Chromosome {
    pub name: String,
    pub length: u64,
}

impl Chromosome {
    pub fn new<T: Into<String>>(name: T, length: u64) -> Self {
        Chromosome {
            name: name.into(),
            length,
        }
    }

    ///
    /// Number of bins covering the chromosome at the given resolution. The last
    /// bin may be partial.
    ///
    pub fn n_bins(&self, resolution: u32) -> usize {
        self.length.div_ceil(resolution.max(1) as u64) as usize
    }
}

impl Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.name, self.length)
    }
}
