use clap::{Arg, ArgAction, Command, arg, value_parser};

pub const COMPUTE_CMD: &str = "compute";
pub const DEFAULT_CHROM: &str = "all";

pub const UNFILTERED_FILE: &str = "result_unfiltered.txt";
pub const FILTERED_FILE: &str = "result_filtered.txt";
pub const SUMMARY_FILE: &str = "run_summary.json";

pub fn create_compute_cli() -> Command {
    Command::new(COMPUTE_CMD)
        .about("Detect stripes in a contact matrix and write the result tables.")
        .arg_required_else_help(true)
        .arg(
            Arg::new("pixels")
                .help("Pixel dump of the matrix (chrom1 start1 end1 chrom2 start2 end2 count [balanced]), optionally gzipped")
                .required(true),
        )
        .arg(Arg::new("out").help("Output directory").required(true))
        .arg(arg!(--"chrom-sizes" <chromsizes> "Chromosome sizes file").required(true))
        .arg(
            arg!(-k --chrom <chrom> "Chromosomes to analyse, comma separated, or 'all'")
                .default_value(DEFAULT_CHROM),
        )
        .arg(
            arg!(-c --canny <canny> "Standard deviation of the Gaussian smoothing before edge detection")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("minL")
                .short('l')
                .long("minL")
                .help("Minimum stripe length, in bins")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("maxW")
                .short('w')
                .long("maxW")
                .help("Maximum stripe width, in bins")
                .value_parser(value_parser!(usize)),
        )
        .arg(arg!(-m --maxpixel <maxpixel> "Saturation quantiles, comma separated (e.g. 0.95,0.96,0.97)"))
        .arg(
            arg!(-n --numcores <numcores> "Number of worker threads")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(-p --pvalue <pvalue> "P-value cutoff of the filtered table")
                .value_parser(value_parser!(f64)),
        )
        .arg(arg!(--config <config> "TOML file with run parameters; flags take precedence"))
        .arg(
            arg!(--resolution <resolution> "Bin size in bp; read from the first pixel when omitted")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(--"value-column" <column> "1-based column holding the contact values; the last column when omitted")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--seed <seed> "Seed of the background sampling")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("yes")
                .short('y')
                .long("yes")
                .help("Clear a non-empty output directory without asking")
                .action(ArgAction::SetTrue),
        )
        .arg(arg!(--progress "Show a progress bar over the extraction passes"))
}

///
/// Parse a comma separated list of saturation quantiles.
///
pub fn parse_maxpixel(value: &str) -> Result<Vec<f64>, String> {
    value
        .split(',')
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .map(|q| {
            q.parse::<f64>()
                .map_err(|_| format!("Invalid maxpixel value: {}", q))
        })
        .collect()
}
