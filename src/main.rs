use anyhow::{bail, Context, Result};
use clap::Parser;

use liquidity_hunter::analysis::{find_hot_zones, run_pipeline};
use liquidity_hunter::config::AppConfig;
use liquidity_hunter::loader::{load_candles_from_csv, validate_series};
use liquidity_hunter::output::{export_heatmap, print_report};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = AppConfig::parse();
    run(&config)
}

fn run(config: &AppConfig) -> Result<()> {
    let input_path = &config.input_path;
    if !input_path.exists() {
        bail!("input file {:?} does not exist", input_path);
    }

    let tz = config.timezone()?;
    let heatmap_config = config.heatmap_config(tz)?;

    let candles = load_candles_from_csv(input_path, tz)
        .with_context(|| format!("failed to load input data from {:?}", input_path))?;
    validate_series(&candles)?;

    let output = run_pipeline(&candles, &heatmap_config)
        .context("failed to compute the liquidation heatmap")?;

    let zones = find_hot_zones(&output.cells, config.zone_threshold, config.zone_gap);
    print_report(&candles, &output, &zones);

    if let Some(path) = &config.export {
        export_heatmap(path, &output.cells)?;
    }

    Ok(())
}
