//! One candidate per physical stripe.
//!
//! Every extraction pass sees the same stripe again at its own saturation
//! threshold, usually with slightly different edges. Candidates are ranked and
//! greedily suppressed by bounding-box overlap.

use std::cmp::Ordering;

use fxhash::FxHashMap as HashMap;
use serde::{Deserialize, Serialize};

use stripes_core::{CandidateTable, StripeCandidate};

///
/// Column candidates are ranked by before suppression.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankKey {
    /// Smallest p-value first.
    #[default]
    PValue,
    /// Largest mean first.
    Mean,
}

impl RankKey {
    fn compare(self, a: &StripeCandidate, b: &StripeCandidate) -> Ordering {
        match self {
            RankKey::PValue => a.pvalue.total_cmp(&b.pvalue),
            RankKey::Mean => b.mean.total_cmp(&a.mean),
        }
    }
}

///
/// Collapse overlapping candidates.
///
/// Candidates are ranked by `key`; ties go to the larger total, then to the
/// earlier position (chromosome in order of first appearance, `pos1`, `pos3`),
/// then to the lower saturation threshold. Walking down the ranking, a candidate
/// is dropped when its bounding box covers at least `min_overlap` of the smaller
/// box of an already kept candidate on the same chromosome.
///
/// # Returns
/// The kept candidates, in their input order. Resolving the output again
/// returns it unchanged.
pub fn resolve(candidates: &[StripeCandidate], key: RankKey, min_overlap: f64) -> CandidateTable {
    let mut chrom_order: HashMap<&str, usize> = HashMap::default();
    for candidate in candidates {
        let next = chrom_order.len();
        chrom_order.entry(candidate.chrom.as_str()).or_insert(next);
    }

    let mut ranking: Vec<usize> = (0..candidates.len()).collect();
    ranking.sort_by(|&i, &j| {
        let (a, b) = (&candidates[i], &candidates[j]);
        key.compare(a, b)
            .then(b.total.total_cmp(&a.total))
            .then(chrom_order[a.chrom.as_str()].cmp(&chrom_order[b.chrom.as_str()]))
            .then(a.pos1().cmp(&b.pos1()))
            .then(a.pos3().cmp(&b.pos3()))
            .then(a.maxpixel.total_cmp(&b.maxpixel))
    });

    let mut kept: Vec<usize> = Vec::with_capacity(candidates.len());
    for idx in ranking {
        let candidate = &candidates[idx];
        let redundant = kept.iter().any(|&k| {
            let other = &candidates[k];
            other.chrom == candidate.chrom
                && other.footprint.overlap_fraction(&candidate.footprint) >= min_overlap
        });
        if !redundant {
            kept.push(idx);
        }
    }

    kept.sort_unstable();
    kept.into_iter().map(|idx| candidates[idx].clone()).collect()
}
