//! Candidate stripes of one chromosome at one saturation threshold.
//!
//! The diagonal is scanned in overlapping square tiles. Each tile is saturated,
//! its vertical edges are found and grouped into runs, and every rising run is
//! paired with the nearest falling run to its right. A pair is then fitted
//! against the raw values: the columns by the half maximum of the column
//! profile within the tile, the rows by the longest stretch whose contrast
//! against the flanks holds up. Rows are read along the whole chromosome, so a
//! stripe is only ever cut at the matrix boundary.

use std::ops::Range;

use log::{debug, trace};
use ndarray::Array2;

use stripes_core::{
    BinSpan, CandidateTable, Chromosome, Footprint, MatrixSource, Orientation, Result,
    StripeCandidate, StripeError,
};

use crate::background::NullDistribution;
use crate::consts::ROW_CONTRAST_FRACTION;
use crate::image::{EdgeMap, EdgeRun, saturate};
use crate::params::StripeParams;
use crate::significance::SignificanceEstimator;
use crate::stats::median;
use crate::window::{flank_columns, row_contrast};

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

///
/// Square tiles `[start, end)` covering `n_bins`, each `tile_size` wide and
/// overlapping by half. The last tile is clipped to the end.
///
pub fn tile_bounds(n_bins: usize, tile_size: usize) -> Vec<Range<usize>> {
    let step = (tile_size / 2).max(1);
    let mut tiles: Vec<Range<usize>> = Vec::new();
    let mut start = 0;
    while start < n_bins {
        let end = (start + tile_size).min(n_bins);
        tiles.push(start..end);
        if end == n_bins {
            break;
        }
        start += step;
    }
    tiles
}

///
/// Longest stretch of `true`, bridging single `false` entries, among the
/// stretches that intersect `within`.
///
fn longest_marked_run(marked: &[bool], within: &Range<usize>) -> Option<Range<usize>> {
    let mut runs: Vec<Range<usize>> = Vec::new();
    let mut current: Option<Range<usize>> = None;

    for (i, is_marked) in marked.iter().enumerate() {
        if !is_marked {
            continue;
        }
        current = match current {
            Some(run) if i - run.end <= 1 => Some(run.start..i + 1),
            Some(run) => {
                runs.push(run);
                Some(i..i + 1)
            }
            None => Some(i..i + 1),
        };
    }
    runs.extend(current);

    let mut best: Option<Range<usize>> = None;
    for run in runs {
        let hits = run.start.max(within.start) < run.end.min(within.end);
        let longer = best.as_ref().is_none_or(|b| run.len() > b.len());
        if hits && longer {
            best = Some(run);
        }
    }
    best
}

///
/// Removes duplicates of the same stripe, e.g. found in two overlapping tiles.
/// Longer candidates win, then higher means. The survivors come back in
/// genomic order.
///
pub fn merge_overlapping(mut candidates: CandidateTable, min_overlap: f64) -> CandidateTable {
    candidates.sort_by(|a, b| {
        b.footprint
            .length()
            .cmp(&a.footprint.length())
            .then(b.mean.total_cmp(&a.mean))
            .then(a.footprint.rows().start.cmp(&b.footprint.rows().start))
            .then(a.footprint.cols().start.cmp(&b.footprint.cols().start))
    });

    let mut kept: CandidateTable = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let duplicate = kept.iter().any(|k| {
            k.orientation() == candidate.orientation()
                && k.footprint.overlap_fraction(&candidate.footprint) >= min_overlap
        });
        if !duplicate {
            kept.push(candidate);
        }
    }

    kept.sort_by_key(|c| (c.footprint.rows().start, c.footprint.cols().start, c.orientation()));
    kept
}

///
/// Extracts candidate stripes from a matrix, one chromosome and one saturation
/// threshold per call.
///
pub struct CandidateExtractor<'a> {
    source: &'a dyn MatrixSource,
    null: &'a NullDistribution,
    canny: f64,
    min_length: usize,
    max_width: usize,
    tile_size: usize,
    min_overlap: f64,
    edge_low: f64,
    edge_high: f64,
}

impl<'a> CandidateExtractor<'a> {
    pub fn new(
        source: &'a dyn MatrixSource,
        null: &'a NullDistribution,
        params: &StripeParams,
    ) -> Self {
        CandidateExtractor {
            source,
            null,
            canny: params.canny,
            min_length: params.min_length,
            max_width: params.max_width,
            tile_size: params.tile_size,
            min_overlap: params.min_overlap,
            edge_low: params.edge_low,
            edge_high: params.edge_high,
        }
    }

    ///
    /// All candidates of a chromosome at one saturation threshold, with their
    /// p-values.
    ///
    /// # Arguments
    /// - chrom: chromosome to scan
    /// - maxpixel: saturation quantile
    pub fn extract(&self, chrom: &Chromosome, maxpixel: f64) -> Result<CandidateTable> {
        let n_bins = chrom.n_bins(self.source.resolution());
        let mut candidates: CandidateTable = Vec::new();

        for tile in tile_bounds(n_bins, self.tile_size) {
            let raw = self.source.fetch(&chrom.name, tile.clone(), tile.clone())?;
            candidates.extend(self.extract_tile(chrom, tile.start, &raw, maxpixel)?);
        }

        let mut candidates = merge_overlapping(candidates, self.min_overlap);
        SignificanceEstimator::new(self.null).annotate(&mut candidates);

        debug!(
            "{} at maxpixel {}: {} candidates",
            chrom.name,
            maxpixel,
            candidates.len()
        );
        Ok(candidates)
    }

    fn min_run_overlap(&self) -> usize {
        (self.min_length / 2).max(1)
    }

    fn extract_tile(
        &self,
        chrom: &Chromosome,
        offset: usize,
        raw: &Array2<f64>,
        maxpixel: f64,
    ) -> Result<CandidateTable> {
        let Some(image) = saturate(raw, maxpixel) else {
            return Ok(Vec::new());
        };

        let min_rows = self.min_run_overlap();
        let runs: Vec<EdgeRun> = EdgeMap::detect(&image, self.canny, self.edge_low, self.edge_high)
            .runs()
            .into_iter()
            .filter(|run| run.rows.len() >= min_rows)
            .collect();

        let mut candidates: CandidateTable = Vec::new();
        for (rising, falling) in self.pair_runs(&runs) {
            match self.fit(chrom, offset, raw, rising, falling) {
                Ok(footprint) => candidates.push(self.measure(chrom, &footprint, maxpixel)?),
                Err(StripeError::Geometry(reason)) => trace!(
                    "{}: dropped edge pair at column {}: {}",
                    chrom.name,
                    rising.col + offset,
                    reason
                ),
                Err(e) => return Err(e),
            }
        }
        Ok(candidates)
    }

    ///
    /// Pair every rising run with the nearest falling run of the same
    /// orientation to its right that shares enough rows with it.
    ///
    fn pair_runs<'r>(&self, runs: &'r [EdgeRun]) -> Vec<(&'r EdgeRun, &'r EdgeRun)> {
        let max_gap = self.max_width as f64 + self.canny.ceil() + 1.0;
        let min_overlap = self.min_run_overlap();

        runs.iter()
            .filter(|run| run.is_rising())
            .filter_map(|rising| {
                runs.iter()
                    .filter(|f| !f.is_rising() && f.orientation == rising.orientation)
                    .filter(|f| f.x > rising.x && f.x - rising.x <= max_gap)
                    .filter(|f| f.rows.intersection_len(&rising.rows) >= min_overlap)
                    .min_by(|a, b| a.x.total_cmp(&b.x))
                    .map(|falling| (rising, falling))
            })
            .collect()
    }

    ///
    /// Fit a footprint, in chromosome coordinates, to a pair of edge runs of
    /// the tile starting at bin `offset`.
    ///
    fn fit(
        &self,
        chrom: &Chromosome,
        offset: usize,
        raw: &Array2<f64>,
        rising: &EdgeRun,
        falling: &EdgeRun,
    ) -> Result<Footprint> {
        let n = raw.nrows();
        let orientation = rising.orientation;

        // columns around the pair, one bin of margin on each side
        let lo = (rising.x.floor() as usize).saturating_sub(1);
        let hi = ((falling.x.ceil() as usize) + 1).min(n.saturating_sub(1));
        if hi < lo + 2 {
            return Err(StripeError::Geometry(format!(
                "column window {}..={} is too narrow",
                lo, hi
            )));
        }

        let top = rising.rows.start.max(falling.rows.start);
        let bottom = rising.rows.end.min(falling.rows.end);
        let core = match orientation {
            Orientation::Right => top..bottom.min(lo),
            Orientation::Left => top.max(hi + 1)..bottom,
        };
        if core.is_empty() {
            return Err(StripeError::Geometry(
                "edge pair has no rows off the diagonal".to_string(),
            ));
        }

        let anchor = self.fit_columns(raw, lo..hi + 1, &core)?.shifted(offset);
        let core = core.start + offset..core.end + offset;
        let extent = self.fit_rows(chrom, orientation, &anchor, &core)?;
        Footprint::new(orientation, anchor, extent)
    }

    /// Half-maximum span of the mean column profile over the core rows.
    fn fit_columns(
        &self,
        raw: &Array2<f64>,
        cols: Range<usize>,
        core: &Range<usize>,
    ) -> Result<BinSpan> {
        let profile: Vec<f64> = cols
            .clone()
            .map(|c| {
                core.clone().map(|r| finite_or_zero(raw[[r, c]])).sum::<f64>() / core.len() as f64
            })
            .collect();

        let last = profile.len() - 1;
        let baseline = (profile[0] + profile[last]) / 2.0;
        let (peak_idx, peak) = profile
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, v)| if v > best.1 { (i, v) } else { best });
        if peak <= baseline {
            return Err(StripeError::Geometry(
                "column profile has no peak above its margins".to_string(),
            ));
        }

        let half = baseline + (peak - baseline) / 2.0;
        let mut c0 = peak_idx;
        while c0 > 0 && profile[c0 - 1] >= half {
            c0 -= 1;
        }
        let mut c1 = peak_idx + 1;
        while c1 < profile.len() && profile[c1] >= half {
            c1 += 1;
        }

        let anchor = BinSpan::new(cols.start + c0, cols.start + c1);
        if anchor.is_empty() || anchor.len() > self.max_width {
            return Err(StripeError::Geometry(format!(
                "width {} outside 1..={}",
                anchor.len(),
                self.max_width
            )));
        }
        Ok(anchor)
    }

    ///
    /// Rows of the stripe: the longest stretch off the diagonal, through the
    /// core rows, whose contrast reaches a fraction of the core median.
    ///
    /// `anchor` and `core` are chromosome bins. The anchor columns and their
    /// flanks are read over the whole off-diagonal side of the chromosome.
    fn fit_rows(
        &self,
        chrom: &Chromosome,
        orientation: Orientation,
        anchor: &BinSpan,
        core: &Range<usize>,
    ) -> Result<BinSpan> {
        let n_bins = chrom.n_bins(self.source.resolution());
        let rows = match orientation {
            Orientation::Right => 0..anchor.start,
            Orientation::Left => anchor.end..n_bins,
        };
        let width = anchor.len();
        let (left, right) = flank_columns(&anchor.as_range(), width, n_bins);
        let cols = left.start..right.end;
        let strip = self.source.fetch(&chrom.name, rows.clone(), cols.clone())?;

        let band = anchor.start - cols.start..anchor.end - cols.start;
        let contrast: Vec<Option<f64>> = strip
            .rows()
            .into_iter()
            .map(|row| row_contrast(&row, &band, width))
            .collect();

        let core_local =
            core.start.max(rows.start) - rows.start..core.end.min(rows.end) - rows.start;
        let core_values: Vec<f64> = contrast[core_local.clone()]
            .iter()
            .flatten()
            .copied()
            .collect();
        let reference = match median(&core_values) {
            Some(k) if k > 0.0 => k,
            _ => {
                return Err(StripeError::Geometry(
                    "no positive contrast against the flanks".to_string(),
                ));
            }
        };

        let threshold = ROW_CONTRAST_FRACTION * reference;
        let marked: Vec<bool> = contrast
            .iter()
            .map(|k| matches!(k, Some(k) if *k >= threshold))
            .collect();

        let run = longest_marked_run(&marked, &core_local).ok_or_else(|| {
            StripeError::Geometry("contrast does not hold on the core rows".to_string())
        })?;
        let extent = BinSpan::new(rows.start + run.start, rows.start + run.end);
        if extent.len() < self.min_length {
            return Err(StripeError::Geometry(format!(
                "length {} below {}",
                extent.len(),
                self.min_length
            )));
        }
        Ok(extent)
    }

    fn measure(
        &self,
        chrom: &Chromosome,
        footprint: &Footprint,
        maxpixel: f64,
    ) -> Result<StripeCandidate> {
        let values: Vec<f64> = self
            .source
            .fetch_footprint(&chrom.name, footprint)?
            .iter()
            .copied()
            .map(finite_or_zero)
            .collect();
        let total: f64 = values.iter().sum();
        let num = values.len();

        Ok(StripeCandidate {
            chrom: chrom.name.clone(),
            footprint: *footprint,
            resolution: self.source.resolution(),
            chrom_length: chrom.length,
            total,
            mean: total / num as f64,
            median: median(&values).unwrap_or(0.0),
            num,
            maxpixel,
            pvalue: 1.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use stripes_io::ContactMap;

    use crate::background::BackgroundModel;

    fn background(i: usize, j: usize) -> f64 {
        2.0 + 8.0 / (1.0 + i.abs_diff(j) as f64)
    }

    /// Decay matrix of `n` bins with a band of 20 over upper-triangle `rows` x `cols`.
    fn band_map(n: usize, rows: Range<usize>, cols: Range<usize>) -> ContactMap {
        let matrix = Array2::from_shape_fn((n, n), |(i, j)| {
            let (r, c) = (i.min(j), i.max(j));
            if rows.contains(&r) && cols.contains(&c) {
                20.0
            } else {
                background(i, j)
            }
        });
        ContactMap::from_dense("chr1", 10_000, &matrix).unwrap()
    }

    /// 100 x 100 decay matrix with a right stripe over columns 50..53, rows 20..50.
    #[fixture]
    fn stripe_map() -> ContactMap {
        band_map(100, 20..50, 50..53)
    }

    fn extract_at(map: &ContactMap, maxpixel: f64) -> CandidateTable {
        let params = StripeParams::default();
        let null = BackgroundModel::new(map, &params)
            .estimate(&map.chromosomes())
            .unwrap();
        let extractor = CandidateExtractor::new(map, &null, &params);
        extractor.extract(&map.chromosomes()[0], maxpixel).unwrap()
    }

    #[rstest]
    #[case(100, 400, vec![0..100])]
    #[case(1000, 400, vec![0..400, 200..600, 400..800, 600..1000])]
    #[case(500, 400, vec![0..400, 200..500])]
    #[case(0, 400, vec![])]
    fn test_tile_bounds(
        #[case] n_bins: usize,
        #[case] tile_size: usize,
        #[case] expected: Vec<Range<usize>>,
    ) {
        assert_eq!(tile_bounds(n_bins, tile_size), expected);
    }

    #[rstest]
    fn test_longest_marked_run_bridges_single_gaps() {
        let marked = [true, false, true, true, false, false, true, true, true, true, true];
        assert_eq!(longest_marked_run(&marked, &(0..11)), Some(6..11));
        assert_eq!(longest_marked_run(&marked, &(0..2)), Some(0..4));
        assert_eq!(longest_marked_run(&marked, &(4..6)), None);
    }

    #[rstest]
    fn test_extract_finds_injected_stripe(stripe_map: ContactMap) {
        let params = StripeParams::default();
        let null = BackgroundModel::new(&stripe_map, &params)
            .estimate(&stripe_map.chromosomes())
            .unwrap();
        let extractor = CandidateExtractor::new(&stripe_map, &null, &params);
        let chrom = stripe_map.chromosomes()[0].clone();

        for maxpixel in [0.95, 0.99] {
            let candidates = extractor.extract(&chrom, maxpixel).unwrap();
            let right: Vec<&StripeCandidate> = candidates
                .iter()
                .filter(|c| c.orientation() == Orientation::Right)
                .collect();
            assert_eq!(right.len(), 1);

            let stripe = right[0];
            assert_eq!(stripe.footprint.anchor, BinSpan::new(50, 53));
            assert_eq!(stripe.footprint.extent, BinSpan::new(20, 50));
            assert_eq!(stripe.mean, 20.0);
            assert_eq!(stripe.num, 90);
            assert_eq!(stripe.maxpixel, maxpixel);
            assert!(stripe.pvalue < 0.05);
            assert!(candidates.iter().all(|c| c.is_valid()));
        }
    }

    #[rstest]
    fn test_extract_finds_injected_left_stripe() {
        // horizontal band on rows 50..53, i.e. a vertical one below the diagonal
        let map = band_map(100, 50..53, 53..83);
        let candidates = extract_at(&map, 0.95);

        let left: Vec<&StripeCandidate> = candidates
            .iter()
            .filter(|c| c.orientation() == Orientation::Left)
            .collect();
        assert_eq!(left.len(), 1);

        let stripe = left[0];
        assert_eq!(stripe.footprint.anchor, BinSpan::new(50, 53));
        assert_eq!(stripe.footprint.extent, BinSpan::new(53, 83));
        assert_eq!(stripe.footprint.rows(), BinSpan::new(50, 53));
        assert_eq!(stripe.mean, 20.0);
        assert!(stripe.pvalue < 0.05);
    }

    #[rstest]
    fn test_extract_follows_stripe_beyond_its_tile() {
        // 250 bins long, the band only enters the tile starting at bin 200
        let map = band_map(600, 150..400, 400..403);
        let candidates = extract_at(&map, 0.95);

        let long: Vec<&StripeCandidate> = candidates
            .iter()
            .filter(|c| c.orientation() == Orientation::Right)
            .filter(|c| c.footprint.anchor.intersection_len(&BinSpan::new(400, 403)) > 0)
            .collect();
        assert_eq!(long.len(), 1);
        assert_eq!(long[0].footprint.anchor, BinSpan::new(400, 403));
        assert_eq!(long[0].footprint.extent, BinSpan::new(150, 400));
        assert_eq!(long[0].length(), 2_500_000);
        assert_eq!(long[0].mean, 20.0);
    }

    #[rstest]
    fn test_extract_on_background_only_finds_nothing() {
        let matrix = Array2::from_shape_fn((100, 100), |(i, j)| background(i, j));
        let map = ContactMap::from_dense("chr1", 10_000, &matrix).unwrap();
        let params = StripeParams::default();
        let null = BackgroundModel::new(&map, &params)
            .estimate(&map.chromosomes())
            .unwrap();
        let extractor = CandidateExtractor::new(&map, &null, &params);

        let candidates = extractor.extract(&map.chromosomes()[0], 0.95).unwrap();
        assert!(candidates.is_empty());
    }

    #[rstest]
    fn test_merge_overlapping_keeps_longest(stripe_map: ContactMap) {
        let chrom = stripe_map.chromosomes()[0].clone();
        let make = |extent: BinSpan, mean: f64| StripeCandidate {
            chrom: chrom.name.clone(),
            footprint: Footprint::new(Orientation::Right, BinSpan::new(50, 53), extent).unwrap(),
            resolution: 10_000,
            chrom_length: chrom.length,
            total: mean * (extent.len() * 3) as f64,
            mean,
            median: mean,
            num: extent.len() * 3,
            maxpixel: 0.95,
            pvalue: 1.0,
        };

        let merged = merge_overlapping(
            vec![
                make(BinSpan::new(35, 50), 20.0),
                make(BinSpan::new(20, 50), 18.0),
                make(BinSpan::new(0, 12), 5.0),
            ],
            0.5,
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].footprint.extent, BinSpan::new(0, 12));
        assert_eq!(merged[1].footprint.extent, BinSpan::new(20, 50));
    }
}
