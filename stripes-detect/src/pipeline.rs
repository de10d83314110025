//! End-to-end stripe calling on a rayon pool.

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rayon::ThreadPool;
use rayon::prelude::*;

use stripes_core::{
    CandidateTable, Chromosome, ChromosomeSelection, MatrixSource, ResultTable, Result,
    StripeError, Warnings, select_chromosomes,
};

use crate::background::{BackgroundModel, NullDistribution, NullSamples};
use crate::extract::CandidateExtractor;
use crate::params::StripeParams;
use crate::redundancy::resolve;
use crate::stripiness::StripinessScorer;

///
/// Outcome of a run.
///
#[derive(Debug, Clone, Default)]
pub struct StripeReport {
    /// Every resolved stripe with its Stripiness, by chromosome, then by the
    /// threshold pass that found it, then by position.
    pub unfiltered: ResultTable,
    /// Stripes under the p-value cutoff, by descending Stripiness.
    pub filtered: ResultTable,
    pub warnings: Warnings,
    /// Chromosomes that made it through background estimation.
    pub chromosomes: Vec<Chromosome>,
    pub resolution: u32,
    /// Candidates over all extraction passes, before redundancy resolution.
    pub n_candidates: usize,
}

///
/// Runs the stages of stripe calling over a matrix.
///
pub struct StripeCaller<'a> {
    source: &'a dyn MatrixSource,
    params: StripeParams,
    pool: ThreadPool,
}

impl<'a> StripeCaller<'a> {
    ///
    /// Validate the parameters and set up the worker pool.
    ///
    pub fn new(source: &'a dyn MatrixSource, params: StripeParams) -> Result<Self> {
        params
            .validate()
            .map_err(|e| StripeError::InvalidParameter(e.to_string()))?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.num_threads)
            .build()
            .map_err(|e| StripeError::WorkerPool(e.to_string()))?;

        Ok(StripeCaller {
            source,
            params,
            pool,
        })
    }

    ///
    /// Call stripes on the selected chromosomes.
    ///
    /// Warnings gathered along the way are logged once, at the end, whether the
    /// run succeeds or not.
    pub fn run(&self, selection: &ChromosomeSelection) -> Result<StripeReport> {
        let mut warnings = Warnings::default();
        let result = self.call(selection, &mut warnings);
        warnings.emit();

        let mut report = result?;
        report.warnings = warnings;
        Ok(report)
    }

    fn call(
        &self,
        selection: &ChromosomeSelection,
        warnings: &mut Warnings,
    ) -> Result<StripeReport> {
        let resolution = self.source.resolution();
        let chromosomes = select_chromosomes(
            &self.source.chromosomes(),
            selection,
            self.params.min_chrom_length,
            resolution,
            warnings,
        )?;

        info!("Estimating background on {} chromosomes", chromosomes.len());
        let (usable, null) = self.estimate_background(&chromosomes, warnings)?;

        let thresholds = self.params.thresholds();
        info!(
            "Extracting candidates: {} chromosomes x {} thresholds",
            usable.len(),
            thresholds.len()
        );
        let union = self.extract_all(&usable, &thresholds, &null, warnings);
        let n_candidates = union.len();

        let resolved = resolve(&union, self.params.rank_key, self.params.min_overlap);
        info!(
            "Resolved {} candidates into {} stripes",
            n_candidates,
            resolved.len()
        );

        info!("Scoring stripiness");
        let (scored, scores) = self.score_all(resolved, warnings);

        let unfiltered = ResultTable::from_scored(&scored, &scores);
        let filtered = unfiltered.filter_by_pvalue(self.params.pvalue_cutoff);
        info!(
            "{} stripes, {} with p-value below {}",
            unfiltered.len(),
            filtered.len(),
            self.params.pvalue_cutoff
        );

        Ok(StripeReport {
            unfiltered,
            filtered,
            warnings: Warnings::default(),
            chromosomes: usable,
            resolution,
            n_candidates,
        })
    }

    ///
    /// Sample the background of every chromosome in parallel. Chromosomes with
    /// a degenerate background are dropped with a warning.
    ///
    fn estimate_background(
        &self,
        chromosomes: &[Chromosome],
        warnings: &mut Warnings,
    ) -> Result<(Vec<Chromosome>, NullDistribution)> {
        let model = BackgroundModel::new(self.source, &self.params);

        let sampled: Vec<Result<NullSamples>> = self.pool.install(|| {
            chromosomes
                .par_iter()
                .enumerate()
                .map(|(idx, chrom)| model.sample_chromosome(chrom, model.chromosome_seed(idx)))
                .collect()
        });

        let mut usable: Vec<Chromosome> = Vec::with_capacity(chromosomes.len());
        let mut samples: Vec<NullSamples> = Vec::with_capacity(chromosomes.len());
        for (chrom, result) in chromosomes.iter().zip(sampled) {
            match result {
                Ok(sample) => {
                    usable.push(chrom.clone());
                    samples.push(sample);
                }
                Err(e) => warnings.push(e.to_string()),
            }
        }

        if usable.is_empty() {
            return Err(StripeError::NoUsableChromosomes(self.params.min_chrom_length));
        }

        Ok((
            usable,
            NullDistribution::from_samples(&samples, self.params.max_width),
        ))
    }

    ///
    /// Stripiness of every resolved stripe. A stripe that can't be scored is
    /// reported as a warning and left out of both tables.
    ///
    fn score_all(
        &self,
        resolved: CandidateTable,
        warnings: &mut Warnings,
    ) -> (CandidateTable, Vec<f64>) {
        let results = self
            .pool
            .install(|| StripinessScorer::new(self.source).score(&resolved));

        let mut scored: CandidateTable = Vec::with_capacity(resolved.len());
        let mut scores: Vec<f64> = Vec::with_capacity(resolved.len());
        for (candidate, result) in resolved.into_iter().zip(results) {
            match result {
                Ok(score) => {
                    scored.push(candidate);
                    scores.push(score);
                }
                Err(e) => warnings.push(format!(
                    "Stripiness failed for {} stripe {}:{}-{}: {}",
                    candidate.orientation(),
                    candidate.chrom,
                    candidate.start(),
                    candidate.end(),
                    e
                )),
            }
        }
        (scored, scores)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.params.progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        let template = "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}";
        if let Ok(style) = ProgressStyle::with_template(template) {
            bar.set_style(style);
        }
        bar.set_message("extraction passes");
        bar
    }

    ///
    /// One extraction pass per (chromosome, threshold), all in parallel, then
    /// flattened into a single table. Failed passes are reported as warnings.
    ///
    fn extract_all(
        &self,
        chromosomes: &[Chromosome],
        thresholds: &[f64],
        null: &NullDistribution,
        warnings: &mut Warnings,
    ) -> CandidateTable {
        let tasks: Vec<(&Chromosome, f64)> = chromosomes
            .iter()
            .flat_map(|chrom| thresholds.iter().map(move |q| (chrom, *q)))
            .collect();

        let extractor = CandidateExtractor::new(self.source, null, &self.params);
        let bar = self.progress_bar(tasks.len());

        let passes: Vec<Result<CandidateTable>> = self.pool.install(|| {
            tasks
                .par_iter()
                .map(|(chrom, maxpixel)| {
                    let pass = extractor.extract(chrom, *maxpixel);
                    bar.inc(1);
                    pass
                })
                .collect()
        });
        bar.finish_and_clear();

        let mut union: CandidateTable = Vec::new();
        for ((chrom, maxpixel), pass) in tasks.iter().zip(passes) {
            match pass {
                Ok(candidates) => union.extend(candidates),
                Err(e) => warnings.push(format!(
                    "Extraction failed for {} at maxpixel {}: {}",
                    chrom.name, maxpixel, e
                )),
            }
        }

        debug!("{} candidates over {} passes", union.len(), tasks.len());
        union
    }
}
