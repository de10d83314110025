mod compute;

use std::time::Instant;

use anyhow::Result;
use clap::Command;
use log::info;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "stripes";
    pub const BIN_NAME: &str = "stripes";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Call stripes, elongated bands of elevated contact frequency, in Hi-C contact matrices.")
        .subcommand_required(true)
        .subcommand(compute::cli::create_compute_cli())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let start = Instant::now();
    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // COMPUTE
        //
        Some((compute::cli::COMPUTE_CMD, matches)) => {
            compute::handlers::run_compute(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    info!("{} finished in {:.2?}", consts::PKG_NAME, start.elapsed());
    Ok(())
}
