use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use log::info;
use serde::Serialize;

use stripes_core::{Chromosome, ChromosomeSelection};
use stripes_detect::{StripeCaller, StripeParams, StripeReport};
use stripes_io::{
    ContactMap, OutputDir, PixelFormat, ResultWrite, prepare_output_dir, read_chrom_sizes,
};

use super::cli::{FILTERED_FILE, SUMMARY_FILE, UNFILTERED_FILE, parse_maxpixel};
use crate::consts::VERSION;

///
/// Everything needed to reproduce a run, written next to the result tables.
///
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    version: &'a str,
    params: &'a StripeParams,
    resolution: u32,
    chromosomes: &'a [Chromosome],
    candidates: usize,
    stripes: usize,
    filtered_stripes: usize,
    warnings: Vec<String>,
}

/// Ask on stdin whether a non-empty output directory may be cleared.
fn confirm_clear(path: &Path) -> bool {
    print!(
        "The output directory {} is not empty. Delete its contents? [Y/n] ",
        path.display()
    );
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes")
}

///
/// Build the run parameters: the config file when given, then command line
/// overrides.
///
pub fn params_from_matches(matches: &ArgMatches) -> Result<StripeParams> {
    let mut params = match matches.get_one::<String>("config") {
        Some(config) => StripeParams::try_from(Path::new(config))
            .with_context(|| format!("Failed to read config {}", config))?,
        None => StripeParams::default(),
    };

    if let Some(canny) = matches.get_one::<f64>("canny") {
        params.canny = *canny;
    }
    if let Some(min_length) = matches.get_one::<usize>("minL") {
        params.min_length = *min_length;
    }
    if let Some(max_width) = matches.get_one::<usize>("maxW") {
        params.max_width = *max_width;
    }
    if let Some(maxpixel) = matches.get_one::<String>("maxpixel") {
        params.maxpixel = parse_maxpixel(maxpixel).map_err(|e| anyhow!(e))?;
    }
    if let Some(num_threads) = matches.get_one::<usize>("numcores") {
        params.num_threads = *num_threads;
    }
    if let Some(pvalue) = matches.get_one::<f64>("pvalue") {
        params.pvalue_cutoff = *pvalue;
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        params.seed = *seed;
    }
    if matches.get_flag("progress") {
        params.progress = true;
    }

    params.validate()?;
    Ok(params)
}

fn pixel_format_from_matches(matches: &ArgMatches) -> Result<PixelFormat> {
    let value_column = match matches.get_one::<usize>("value-column") {
        Some(0) => return Err(anyhow!("--value-column is 1-based")),
        Some(column) => Some(column - 1),
        None => None,
    };
    Ok(PixelFormat {
        resolution: matches.get_one::<u32>("resolution").copied(),
        value_column,
    })
}

fn write_summary(path: &Path, params: &StripeParams, report: &StripeReport) -> Result<()> {
    let summary = RunSummary {
        version: VERSION,
        params,
        resolution: report.resolution,
        chromosomes: &report.chromosomes,
        candidates: report.n_candidates,
        stripes: report.unfiltered.len(),
        filtered_stripes: report.filtered.len(),
        warnings: report.warnings.iter().cloned().collect(),
    };
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &summary)?;
    Ok(())
}

/// Matches items from CLAP args before running the stripe caller
pub fn run_compute(matches: &ArgMatches) -> Result<()> {
    let pixels = matches
        .get_one::<String>("pixels")
        .context("A path to a pixel file is required.")?;
    let out = matches
        .get_one::<String>("out")
        .context("An output directory is required.")?;
    let chrom_sizes = matches
        .get_one::<String>("chrom-sizes")
        .context("A chrom sizes file is required.")?;
    let chrom = matches
        .get_one::<String>("chrom")
        .context("A chromosome selection is required.")?;

    let params = params_from_matches(matches)?;
    let format = pixel_format_from_matches(matches)?;
    let selection: ChromosomeSelection = chrom.parse().map_err(|e: String| anyhow!(e))?;

    let out = Path::new(out);
    let assume_yes = matches.get_flag("yes");
    let prepared = prepare_output_dir(out, |path| assume_yes || confirm_clear(path))
        .with_context(|| format!("Failed to prepare output directory {}", out.display()))?;
    if prepared == OutputDir::Declined {
        info!("Leaving {} untouched, nothing to do", out.display());
        return Ok(());
    }

    let chromosomes = read_chrom_sizes(chrom_sizes)
        .with_context(|| format!("Failed to read chrom sizes {}", chrom_sizes))?;
    info!("Loading contact matrix from {}", pixels);
    let map = ContactMap::from_pixels(pixels, chromosomes, &format)
        .with_context(|| format!("Failed to load pixels from {}", pixels))?;

    let caller = StripeCaller::new(&map, params.clone())?;
    let report = caller.run(&selection)?;

    report.unfiltered.write_tsv(out.join(UNFILTERED_FILE))?;
    report.filtered.write_tsv(out.join(FILTERED_FILE))?;
    write_summary(&out.join(SUMMARY_FILE), &params, &report)?;

    info!(
        "Wrote {} stripes ({} below the p-value cutoff) to {}",
        report.unfiltered.len(),
        report.filtered.len(),
        out.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::compute::cli::create_compute_cli;

    fn matches_from(args: &[&str]) -> ArgMatches {
        let mut argv = vec!["compute", "pixels.tsv", "out", "--chrom-sizes", "sizes.txt"];
        argv.extend_from_slice(args);
        create_compute_cli().try_get_matches_from(argv).unwrap()
    }

    #[rstest]
    fn test_flags_override_defaults() {
        let matches = matches_from(&[
            "-c", "2", "-l", "12", "-m", "0.97,0.99", "-p", "0.1", "--seed", "3",
        ]);
        let params = params_from_matches(&matches).unwrap();

        assert_eq!(params.canny, 2.0);
        assert_eq!(params.min_length, 12);
        assert_eq!(params.max_width, 8);
        assert_eq!(params.maxpixel, vec![0.97, 0.99]);
        assert_eq!(params.pvalue_cutoff, 0.1);
        assert_eq!(params.seed, 3);
    }

    #[rstest]
    fn test_flags_override_config() {
        let tempdir = tempfile::tempdir().unwrap();
        let config = tempdir.path().join("stripes.toml");
        std::fs::write(&config, "canny = 3.0\nmax_width = 5\n").unwrap();

        let matches = matches_from(&["--config", config.to_str().unwrap(), "-w", "6"]);
        let params = params_from_matches(&matches).unwrap();

        assert_eq!(params.canny, 3.0);
        assert_eq!(params.max_width, 6);
    }

    #[rstest]
    fn test_invalid_flag_values_fail() {
        let matches = matches_from(&["-p", "2.0"]);
        assert!(params_from_matches(&matches).is_err());
    }

    #[rstest]
    #[case(&[], None)]
    #[case(&["--value-column", "7"], Some(6))]
    fn test_value_column_is_one_based(#[case] args: &[&str], #[case] expected: Option<usize>) {
        let format = pixel_format_from_matches(&matches_from(args)).unwrap();
        assert_eq!(format.value_column, expected);
    }

    #[rstest]
    fn test_value_column_zero_is_rejected() {
        assert!(pixel_format_from_matches(&matches_from(&["--value-column", "0"])).is_err());
    }

    #[rstest]
    fn test_run_compute_writes_outputs() {
        let tempdir = tempfile::tempdir().unwrap();
        let sizes = tempdir.path().join("sizes.txt");
        std::fs::write(&sizes, "chr1\t1000000\n").unwrap();

        let pixels = tempdir.path().join("pixels.tsv");
        let mut file = BufWriter::new(File::create(&pixels).unwrap());
        for i in 0..100u32 {
            for j in i..100u32 {
                let stripe = (20..50).contains(&i) && (50..53).contains(&j);
                let value = if stripe {
                    20.0
                } else {
                    2.0 + 8.0 / (1.0 + (j - i) as f64)
                };
                writeln!(
                    file,
                    "chr1\t{}\t{}\tchr1\t{}\t{}\t{}",
                    i * 10_000,
                    (i + 1) * 10_000,
                    j * 10_000,
                    (j + 1) * 10_000,
                    value
                )
                .unwrap();
            }
        }
        drop(file);

        let out = tempdir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        std::fs::write(out.join("stale.txt"), "old").unwrap();

        let matches = create_compute_cli()
            .try_get_matches_from([
                "compute",
                pixels.to_str().unwrap(),
                out.to_str().unwrap(),
                "--chrom-sizes",
                sizes.to_str().unwrap(),
                "-n",
                "2",
                "-y",
            ])
            .unwrap();
        run_compute(&matches).unwrap();

        assert!(!out.join("stale.txt").exists());
        assert!(out.join(UNFILTERED_FILE).exists());
        assert!(out.join(FILTERED_FILE).exists());

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join(SUMMARY_FILE)).unwrap())
                .unwrap();
        assert_eq!(summary["resolution"], 10_000);
        assert_eq!(summary["stripes"], 1);
        assert_eq!(summary["chromosomes"][0]["name"], "chr1");
    }
}
