use std::ops::Range;

use rayon::prelude::*;

use stripes_core::{Footprint, MatrixSource, Orientation, Result, StripeCandidate};

use crate::stats::median;
use crate::window::row_contrast;

///
/// Rows of the extent whose flanks, as wide as the stripe, stay clear of the
/// diagonal. Falls back to the whole extent when no row does.
///
fn off_diagonal_rows(footprint: &Footprint) -> Range<usize> {
    let width = footprint.width();
    let extent = footprint.extent;
    let rows = match footprint.orientation {
        Orientation::Right => {
            extent.start..extent.end.min(footprint.anchor.start.saturating_sub(width))
        }
        Orientation::Left => extent.start.max(footprint.anchor.end + width)..extent.end,
    };
    if rows.is_empty() {
        extent.as_range()
    } else {
        rows
    }
}

///
/// Scores how stripe-like a candidate is: the median, along the stripe, of the
/// log ratio between its intensity and that of the flanking columns.
///
/// Zero means no contrast. Smooth, convex backgrounds score at or below zero.
///
pub struct StripinessScorer<'a> {
    source: &'a dyn MatrixSource,
}

impl<'a> StripinessScorer<'a> {
    pub fn new(source: &'a dyn MatrixSource) -> Self {
        StripinessScorer { source }
    }

    ///
    /// Stripiness of a single candidate. The flanks are as wide as the stripe
    /// and clipped to the chromosome; rows where a flank would reach the
    /// diagonal are left out.
    ///
    pub fn score_one(&self, candidate: &StripeCandidate) -> Result<f64> {
        let footprint = &candidate.footprint;
        let n_bins = self.source.n_bins(&candidate.chrom)?;
        let width = footprint.width();

        let cols = footprint.anchor.start.saturating_sub(width)
            ..(footprint.anchor.end + width).min(n_bins);
        let block = self
            .source
            .fetch(&candidate.chrom, off_diagonal_rows(footprint), cols.clone())?;

        let band = footprint.anchor.start - cols.start..footprint.anchor.end - cols.start;
        let contrast: Vec<f64> = block
            .rows()
            .into_iter()
            .filter_map(|row| row_contrast(&row, &band, width))
            .collect();

        Ok(median(&contrast).unwrap_or(0.0))
    }

    ///
    /// Stripiness of every candidate, in the same order. Candidates are scored
    /// in parallel on the current rayon pool and fail independently.
    ///
    pub fn score(&self, candidates: &[StripeCandidate]) -> Vec<Result<f64>> {
        candidates
            .par_iter()
            .map(|candidate| self.score_one(candidate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::Array2;
    use pretty_assertions::assert_eq;
    use rstest::*;

    use stripes_core::{BinSpan, StripeError};
    use stripes_io::ContactMap;

    fn map(with_stripe: bool) -> ContactMap {
        let matrix = Array2::from_shape_fn((100, 100), |(i, j)| {
            let (r, c) = (i.min(j), i.max(j));
            if with_stripe && (20..50).contains(&r) && (50..53).contains(&c) {
                20.0
            } else {
                2.0 + 8.0 / (1.0 + (c - r) as f64)
            }
        });
        ContactMap::from_dense("chr1", 10_000, &matrix).unwrap()
    }

    fn candidate(orientation: Orientation, anchor: BinSpan, extent: BinSpan) -> StripeCandidate {
        StripeCandidate {
            chrom: "chr1".to_string(),
            footprint: Footprint::new(orientation, anchor, extent).unwrap(),
            resolution: 10_000,
            chrom_length: 1_000_000,
            total: 0.0,
            mean: 0.0,
            median: 0.0,
            num: 0,
            maxpixel: 0.95,
            pvalue: 1.0,
        }
    }

    #[rstest]
    fn test_stripe_scores_above_background() {
        let stripe = candidate(Orientation::Right, BinSpan::new(50, 53), BinSpan::new(20, 50));

        let with_signal = map(true);
        let without_signal = map(false);
        let scored = StripinessScorer::new(&with_signal).score_one(&stripe).unwrap();
        let flat = StripinessScorer::new(&without_signal).score_one(&stripe).unwrap();

        assert!(scored > 1.0);
        assert!(flat <= 0.0);
        assert!(scored > flat);
    }

    #[rstest]
    fn test_left_stripe_reads_its_mirror() {
        // nothing extends downstream of rows 50..53
        let with_signal = map(true);
        let left = candidate(Orientation::Left, BinSpan::new(50, 53), BinSpan::new(53, 80));
        let score = StripinessScorer::new(&with_signal).score_one(&left).unwrap();
        assert!(score <= 0.0);
    }

    #[rstest]
    fn test_score_keeps_order() {
        let with_signal = map(true);
        let candidates = vec![
            candidate(Orientation::Right, BinSpan::new(70, 73), BinSpan::new(40, 70)),
            candidate(Orientation::Right, BinSpan::new(50, 53), BinSpan::new(20, 50)),
        ];
        let scores: Vec<f64> = StripinessScorer::new(&with_signal)
            .score(&candidates)
            .into_iter()
            .map(|score| score.unwrap())
            .collect();
        assert_eq!(scores.len(), 2);
        assert!(scores[1] > scores[0]);
    }

    #[rstest]
    #[case(Orientation::Right, 44..50, 50..53, BinSpan::new(50, 53), BinSpan::new(44, 50))]
    #[case(Orientation::Left, 50..53, 53..59, BinSpan::new(50, 53), BinSpan::new(53, 59))]
    fn test_flanks_skip_the_diagonal(
        #[case] orientation: Orientation,
        #[case] rows: Range<usize>,
        #[case] cols: Range<usize>,
        #[case] anchor: BinSpan,
        #[case] extent: BinSpan,
    ) {
        // flat background, a bright diagonal and a band four times the background
        let matrix = Array2::from_shape_fn((100, 100), |(i, j)| {
            let (r, c) = (i.min(j), i.max(j));
            if r == c {
                1000.0
            } else if rows.contains(&r) && cols.contains(&c) {
                4.0
            } else {
                1.0
            }
        });
        let map = ContactMap::from_dense("chr1", 10_000, &matrix).unwrap();

        let stripe = candidate(orientation, anchor, extent);
        let score = StripinessScorer::new(&map).score_one(&stripe).unwrap();
        assert!((score - 4.0_f64.ln()).abs() < 1e-6);
    }

    #[rstest]
    fn test_score_reports_failures_per_candidate() {
        let with_signal = map(true);
        let stripe = candidate(Orientation::Right, BinSpan::new(50, 53), BinSpan::new(20, 50));
        let elsewhere = StripeCandidate {
            chrom: "chr9".to_string(),
            ..stripe.clone()
        };
        let candidates = vec![stripe, elsewhere];

        let scores = StripinessScorer::new(&with_signal).score(&candidates);
        assert!(scores[0].is_ok());
        assert!(matches!(scores[1], Err(StripeError::MissingChromosome(_))));
    }

    #[rstest]
    fn test_anchor_at_chromosome_end_is_clipped() {
        let with_signal = map(false);
        let edge = candidate(Orientation::Right, BinSpan::new(97, 100), BinSpan::new(60, 97));
        assert!(StripinessScorer::new(&with_signal).score_one(&edge).is_ok());
    }
}
