//! Image processing on saturated matrix tiles: saturation, Gaussian smoothing
//! and detection of vertical edges grouped into per-column runs.

use std::collections::VecDeque;

use ndarray::Array2;

use stripes_core::{BinSpan, Orientation};

use crate::consts::GAUSSIAN_TRUNCATE;
use crate::stats::quantile;

///
/// Scale a tile so that its `maxpixel` quantile maps to 1 and clip to `[0, 1]`.
/// Non-finite pixels become 0.
///
/// # Returns
/// `None` when the saturation level is not positive, e.g. for an empty tile.
pub fn saturate(tile: &Array2<f64>, maxpixel: f64) -> Option<Array2<f64>> {
    let values: Vec<f64> = tile.iter().copied().collect();
    let level = quantile(&values, maxpixel)?;
    if level <= 0.0 {
        return None;
    }
    Some(tile.mapv(|v| {
        if v.is_finite() {
            (v / level).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }))
}

/// Normalised Gaussian weights from `-radius` to `radius`.
pub fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (GAUSSIAN_TRUNCATE * sigma).ceil() as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-(x * x) as f64 / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

fn convolve_axis(image: &Array2<f64>, kernel: &[f64], along_rows: bool) -> Array2<f64> {
    let (n_rows, n_cols) = image.dim();
    let radius = (kernel.len() / 2) as isize;
    let limit = if along_rows { n_rows } else { n_cols } as isize - 1;

    Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        let center = if along_rows { r } else { c } as isize;
        kernel
            .iter()
            .enumerate()
            .map(|(k, w)| {
                // replicate the border pixel
                let idx = (center + k as isize - radius).clamp(0, limit) as usize;
                let v = if along_rows { image[[idx, c]] } else { image[[r, idx]] };
                w * v
            })
            .sum()
    })
}

///
/// Separable Gaussian smoothing with replicated borders.
///
pub fn gaussian_blur(image: &Array2<f64>, sigma: f64) -> Array2<f64> {
    if image.is_empty() || sigma <= 0.0 {
        return image.clone();
    }
    let kernel = gaussian_kernel(sigma);
    let horizontal = convolve_axis(image, &kernel, false);
    convolve_axis(&horizontal, &kernel, true)
}

///
/// Central difference along each row; one-sided halves at the borders.
///
pub fn horizontal_gradient(image: &Array2<f64>) -> Array2<f64> {
    let (n_rows, n_cols) = image.dim();
    if n_cols == 0 {
        return image.clone();
    }
    Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        let left = c.saturating_sub(1);
        let right = (c + 1).min(n_cols - 1);
        (image[[r, right]] - image[[r, left]]) / 2.0
    })
}

///
/// A column of vertical edge pixels of one sign on one side of the diagonal.
///
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRun {
    pub orientation: Orientation,
    /// `1` for an intensity rise from left to right, `-1` for a fall.
    pub sign: i8,
    pub col: usize,
    pub rows: BinSpan,
    /// Sub-pixel column of the edge, averaged over the run.
    pub x: f64,
}

impl EdgeRun {
    pub fn is_rising(&self) -> bool {
        self.sign > 0
    }
}

///
/// Vertical edges of a square tile: the sign of the horizontal gradient where
/// an edge survived, zero elsewhere, and the gradient magnitude.
///
#[derive(Debug, Clone)]
pub struct EdgeMap {
    pub sign: Array2<i8>,
    pub magnitude: Array2<f64>,
}

impl EdgeMap {
    ///
    /// Canny-style detection of vertical edges.
    ///
    /// # Arguments
    /// - image: saturated tile, values in `[0, 1]`
    /// - sigma: Gaussian smoothing
    /// - low: weak edge threshold
    /// - high: strong edge threshold
    pub fn detect(image: &Array2<f64>, sigma: f64, low: f64, high: f64) -> Self {
        let gradient = horizontal_gradient(&gaussian_blur(image, sigma));
        let magnitude = gradient.mapv(f64::abs);
        let (n_rows, n_cols) = gradient.dim();

        // non-maximum suppression along the row
        let candidate = Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
            let m = magnitude[[r, c]];
            if m < low || m == 0.0 {
                return 0i8;
            }
            let left_ok = c == 0 || m >= magnitude[[r, c - 1]];
            let right_ok = c + 1 == n_cols || m > magnitude[[r, c + 1]];
            if left_ok && right_ok {
                if gradient[[r, c]] > 0.0 { 1 } else { -1 }
            } else {
                0
            }
        });

        // hysteresis: weak pixels survive when connected to a strong one of the same sign
        let mut sign = Array2::<i8>::zeros((n_rows, n_cols));
        let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
        for ((r, c), s) in candidate.indexed_iter() {
            if *s != 0 && magnitude[[r, c]] >= high {
                sign[[r, c]] = *s;
                queue.push_back((r, c));
            }
        }

        while let Some((r, c)) = queue.pop_front() {
            let s = sign[[r, c]];
            for nr in r.saturating_sub(1)..=(r + 1).min(n_rows - 1) {
                for nc in c.saturating_sub(1)..=(c + 1).min(n_cols - 1) {
                    if sign[[nr, nc]] == 0 && candidate[[nr, nc]] == s {
                        sign[[nr, nc]] = s;
                        queue.push_back((nr, nc));
                    }
                }
            }
        }

        EdgeMap { sign, magnitude }
    }

    /// Parabolic refinement of an edge column, in `[-0.5, 0.5]`.
    fn subpixel_offset(&self, r: usize, c: usize) -> f64 {
        let n_cols = self.magnitude.ncols();
        if c == 0 || c + 1 >= n_cols {
            return 0.0;
        }
        let left = self.magnitude[[r, c - 1]];
        let center = self.magnitude[[r, c]];
        let right = self.magnitude[[r, c + 1]];
        let denom = left - 2.0 * center + right;
        if denom >= 0.0 {
            return 0.0;
        }
        (0.5 * (left - right) / denom).clamp(-0.5, 0.5)
    }

    ///
    /// Group edge pixels into runs down each column, bridging single-row gaps.
    ///
    /// Runs above the diagonal belong to right stripes, runs below it to left
    /// stripes; pixels on the diagonal are ignored. The tile must be square and
    /// centred on the diagonal.
    pub fn runs(&self) -> Vec<EdgeRun> {
        let (n_rows, n_cols) = self.sign.dim();
        let mut runs: Vec<EdgeRun> = Vec::new();

        for c in 0..n_cols {
            let sides = [
                (Orientation::Right, 0..c.min(n_rows)),
                (Orientation::Left, (c + 1).min(n_rows)..n_rows),
            ];
            for (orientation, rows) in sides {
                for sign in [1i8, -1i8] {
                    let hits: Vec<usize> = rows
                        .clone()
                        .filter(|r| self.sign[[*r, c]] == sign)
                        .collect();
                    for group in split_on_gaps(&hits) {
                        let x = group
                            .iter()
                            .map(|r| c as f64 + self.subpixel_offset(*r, c))
                            .sum::<f64>()
                            / group.len() as f64;
                        runs.push(EdgeRun {
                            orientation,
                            sign,
                            col: c,
                            rows: BinSpan::new(group[0], group[group.len() - 1] + 1),
                            x,
                        });
                    }
                }
            }
        }

        runs
    }
}

/// Split sorted rows wherever more than one row is missing.
fn split_on_gaps(rows: &[usize]) -> Vec<&[usize]> {
    let mut groups: Vec<&[usize]> = Vec::new();
    let mut start = 0;
    for i in 1..=rows.len() {
        if i == rows.len() || rows[i] - rows[i - 1] > 2 {
            if i > start {
                groups.push(&rows[start..i]);
            }
            start = i;
        }
    }
    groups
}
