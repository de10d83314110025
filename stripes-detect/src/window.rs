//! Intensity contrast between a band of columns and its flanks.

use std::ops::Range;

use ndarray::ArrayView1;

use stripes_core::consts::LOG_PSEUDOCOUNT;

///
/// Columns on both sides of `band`, each `width` wide, clipped to `[0, n_cols)`.
///
pub fn flank_columns(
    band: &Range<usize>,
    width: usize,
    n_cols: usize,
) -> (Range<usize>, Range<usize>) {
    let left = band.start.saturating_sub(width)..band.start.min(n_cols);
    let right = band.end.min(n_cols)..(band.end + width).min(n_cols);
    (left, right)
}

fn finite_sum(row: &ArrayView1<f64>, cols: Range<usize>) -> (f64, usize) {
    let mut sum = 0.0;
    let mut count = 0;
    for c in cols {
        let v = row[c];
        if v.is_finite() {
            sum += v;
        }
        count += 1;
    }
    (sum, count)
}

///
/// Log ratio of the mean intensity inside `band` to the mean of its flanks on
/// one row. Non-finite pixels count as zero.
///
/// # Returns
/// `None` when the band or both flanks are empty.
pub fn row_contrast(row: &ArrayView1<f64>, band: &Range<usize>, width: usize) -> Option<f64> {
    let n_cols = row.len();
    if band.start >= band.end || band.end > n_cols {
        return None;
    }

    let (left, right) = flank_columns(band, width, n_cols);
    let (in_sum, in_count) = finite_sum(row, band.clone());
    let (left_sum, left_count) = finite_sum(row, left);
    let (right_sum, right_count) = finite_sum(row, right);

    let flank_count = left_count + right_count;
    if in_count == 0 || flank_count == 0 {
        return None;
    }

    let inside = in_sum / in_count as f64;
    let flank = (left_sum + right_sum) / flank_count as f64;
    Some(((inside + LOG_PSEUDOCOUNT) / (flank + LOG_PSEUDOCOUNT)).ln())
}
