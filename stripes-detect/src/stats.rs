//! Small order statistics over `f64` samples. Non-finite values are ignored.

fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

///
/// Quantile with linear interpolation between the closest ranks, `q` in `[0, 1]`.
///
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let sorted = sorted_finite(values);
    quantile_sorted(&sorted, q)
}

/// [`quantile`] of an already sorted, finite sample.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(1.0, 5.0)]
    #[case(0.5, 3.0)]
    #[case(0.95, 4.8)]
    fn test_quantile_interpolates(#[case] q: f64, #[case] expected: f64) {
        let values = [5.0, 1.0, 3.0, 2.0, 4.0];
        let result = quantile(&values, q).unwrap();
        assert!((result - expected).abs() < 1e-12);
    }

    #[rstest]
    fn test_median_even_and_nan() {
        assert_eq!(median(&[4.0, 1.0, f64::NAN, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[f64::NAN]), None);
    }
}
