use crate::models::{BoundingBox, Footprint, Orientation};

///
/// One detected rectangular stripe together with its summary statistics.
///
/// Coordinates are kept in bins; genomic positions are derived on demand and
/// clipped to the chromosome length.
///
#[derive(Debug, Clone, PartialEq)]
pub struct StripeCandidate {
    pub chrom: String,
    pub footprint: Footprint,
    pub resolution: u32,
    pub chrom_length: u64,

    /// Sum of the contact values inside the footprint.
    pub total: f64,
    pub mean: f64,
    pub median: f64,
    /// Number of pixels inside the footprint.
    pub num: usize,

    /// Saturation threshold (quantile) of the extraction pass that found it.
    pub maxpixel: f64,
    pub pvalue: f64,
}

/// Ordered working set of candidates.
pub type CandidateTable = Vec<StripeCandidate>;

impl StripeCandidate {
    fn genomic(&self, bin: usize) -> u64 {
        (bin as u64 * self.resolution as u64).min(self.chrom_length)
    }

    pub fn orientation(&self) -> Orientation {
        self.footprint.orientation
    }

    /// Chromosome of the column axis. Stripes are intra-chromosomal.
    pub fn chr2(&self) -> &str {
        &self.chrom
    }

    pub fn pos1(&self) -> u64 {
        self.genomic(self.footprint.rows().start)
    }

    pub fn pos2(&self) -> u64 {
        self.genomic(self.footprint.rows().end)
    }

    pub fn pos3(&self) -> u64 {
        self.genomic(self.footprint.cols().start)
    }

    pub fn pos4(&self) -> u64 {
        self.genomic(self.footprint.cols().end)
    }

    /// Genomic start of the stripe along its long axis.
    pub fn start(&self) -> u64 {
        self.genomic(self.footprint.extent.start)
    }

    /// Genomic end of the stripe along its long axis.
    pub fn end(&self) -> u64 {
        self.genomic(self.footprint.extent.end)
    }

    /// Length of the stripe in bp.
    pub fn length(&self) -> u64 {
        self.end() - self.start()
    }

    /// Width of the stripe in bp.
    pub fn width(&self) -> u64 {
        self.genomic(self.footprint.anchor.end) - self.genomic(self.footprint.anchor.start)
    }

    pub fn bbox(&self) -> BoundingBox {
        self.footprint.bbox()
    }

    ///
    /// Check the candidate invariants: a non-empty box, a proper genomic span
    /// and a p-value in `[0, 1]`.
    ///
    pub fn is_valid(&self) -> bool {
        let bbox = self.bbox();
        bbox.height > 0
            && bbox.width > 0
            && self.start() < self.end()
            && (0.0..=1.0).contains(&self.pvalue)
    }
}
