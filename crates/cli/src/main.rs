use anyhow::{Context, Result};
use clap::Parser;
use cli::args::{self, Cli};
use cli::report;
use photosort_core::config;
use photosort_core::extractor::ExifDecoder;
use photosort_core::pipeline::Sorter;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cfg = config::load(cli.config.as_deref()).context("load config")?;
    let opts = cli.sort_options(&cfg)?;
    args::check_dest_root(&opts)?;
    info!("Sorting into {:?} ({:?}, dry run: {})", opts.dest_root, opts.action, opts.dry_run);

    let decoder = ExifDecoder;
    let sorter = Sorter::new(&opts, &decoder).context("build walker")?;
    let summary = sorter.run(&cli.photos, report::emit);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
