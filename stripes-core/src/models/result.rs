use serde::Serialize;

use crate::models::StripeCandidate;

///
/// One row of the final stripe table.
///
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub chr: String,
    pub pos1: u64,
    pub pos2: u64,
    pub chr2: String,
    pub pos3: u64,
    pub pos4: u64,
    pub length: u64,
    pub width: u64,
    #[serde(rename = "Mean")]
    pub mean: f64,
    pub maxpixel: f64,
    pub pvalue: f64,
    #[serde(rename = "Stripiness")]
    pub stripiness: f64,
}

impl ResultRow {
    pub const HEADER: [&'static str; 12] = [
        "chr",
        "pos1",
        "pos2",
        "chr2",
        "pos3",
        "pos4",
        "length",
        "width",
        "Mean",
        "maxpixel",
        "pvalue",
        "Stripiness",
    ];

    pub fn from_candidate(candidate: &StripeCandidate, stripiness: f64) -> Self {
        ResultRow {
            chr: candidate.chrom.clone(),
            pos1: candidate.pos1(),
            pos2: candidate.pos2(),
            chr2: candidate.chr2().to_string(),
            pos3: candidate.pos3(),
            pos4: candidate.pos4(),
            length: candidate.length(),
            width: candidate.width(),
            mean: candidate.mean,
            maxpixel: candidate.maxpixel,
            pvalue: candidate.pvalue,
            stripiness,
        }
    }

    ///
    /// Tab separated line, in [`ResultRow::HEADER`] order.
    ///
    pub fn as_string(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.chr,
            self.pos1,
            self.pos2,
            self.chr2,
            self.pos3,
            self.pos4,
            self.length,
            self.width,
            self.mean,
            self.maxpixel,
            self.pvalue,
            self.stripiness
        )
    }
}

///
/// Final table of stripes, one row per physical stripe.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    ///
    /// Pair every candidate with its Stripiness score. Both slices are in the
    /// same order; extra entries on either side are ignored.
    ///
    pub fn from_scored(candidates: &[StripeCandidate], scores: &[f64]) -> Self {
        let rows = candidates
            .iter()
            .zip(scores.iter())
            .map(|(candidate, score)| ResultRow::from_candidate(candidate, *score))
            .collect();
        ResultTable { rows }
    }

    ///
    /// Keep the rows with `pvalue < cutoff`, sorted by descending Stripiness.
    /// Equal scores keep their relative order.
    ///
    pub fn filter_by_pvalue(&self, cutoff: f64) -> ResultTable {
        let mut rows: Vec<ResultRow> = self
            .rows
            .iter()
            .filter(|row| row.pvalue < cutoff)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.stripiness.total_cmp(&a.stripiness));
        ResultTable { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRow> {
        self.rows.iter()
    }
}

impl From<Vec<ResultRow>> for ResultTable {
    fn from(rows: Vec<ResultRow>) -> Self {
        ResultTable { rows }
    }
}
