use stripes_core::StripeCandidate;

use crate::background::NullDistribution;

///
/// Empirical p-values of candidates against the null distribution of window
/// means matching their orientation and width.
///
pub struct SignificanceEstimator<'a> {
    null: &'a NullDistribution,
}

impl<'a> SignificanceEstimator<'a> {
    pub fn new(null: &'a NullDistribution) -> Self {
        SignificanceEstimator { null }
    }

    ///
    /// Upper-tail p-value of the candidate mean, in `[0, 1]`. Candidates whose
    /// width has no null distribution get 1.
    ///
    pub fn pvalue(&self, candidate: &StripeCandidate) -> f64 {
        self.null
            .get(candidate.orientation(), candidate.footprint.width())
            .map(|dist| dist.upper_tail(candidate.mean))
            .unwrap_or(1.0)
    }

    /// Attach a p-value to every candidate.
    pub fn annotate(&self, candidates: &mut [StripeCandidate]) {
        for candidate in candidates.iter_mut() {
            candidate.pvalue = self.pvalue(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use stripes_core::{BinSpan, Footprint, Orientation};

    use crate::background::NullSamples;

    fn candidate(width: usize, mean: f64) -> StripeCandidate {
        StripeCandidate {
            chrom: "chr1".to_string(),
            footprint: Footprint::new(
                Orientation::Right,
                BinSpan::new(50, 50 + width),
                BinSpan::new(20, 50),
            )
            .unwrap(),
            resolution: 10_000,
            chrom_length: 1_000_000,
            total: mean * (30 * width) as f64,
            mean,
            median: mean,
            num: 30 * width,
            maxpixel: 0.95,
            pvalue: 1.0,
        }
    }

    #[fixture]
    fn null() -> NullDistribution {
        let mut samples = NullSamples::new("chr1", 3);
        samples.windows[Orientation::Right.index()][2] = (1..=99).map(|v| v as f64).collect();
        NullDistribution::from_samples([&samples], 3)
    }

    #[rstest]
    #[case(100.0, 0.01)]
    #[case(99.0, 0.02)]
    #[case(0.5, 1.0)]
    fn test_pvalue(null: NullDistribution, #[case] mean: f64, #[case] expected: f64) {
        let estimator = SignificanceEstimator::new(&null);
        let p = estimator.pvalue(&candidate(3, mean));
        assert!((p - expected).abs() < 1e-12);
    }

    #[rstest]
    fn test_missing_distribution_gives_one(null: NullDistribution) {
        let estimator = SignificanceEstimator::new(&null);
        assert_eq!(estimator.pvalue(&candidate(2, 1000.0)), 1.0);
    }

    #[rstest]
    fn test_annotate(null: NullDistribution) {
        let estimator = SignificanceEstimator::new(&null);
        let mut candidates = vec![candidate(3, 100.0), candidate(3, 50.0)];
        estimator.annotate(&mut candidates);
        assert_eq!(candidates[0].pvalue, 0.01);
        assert!(candidates.iter().all(|c| (0.0..=1.0).contains(&c.pvalue)));
    }
}
