use std::path::Path;

use anyhow::{Context, Result};
use statrs::statistics::{Data, Median, Statistics};
use tabled::{settings::Style, Table, Tabled};

use crate::analysis::PipelineOutput;
use crate::data::{Candle, HeatmapCell, HotZone, PositionSide, SwingKind};

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Side")]
    side: &'static str,
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Peak")]
    peak: String,
    #[tabled(rename = "Intensity")]
    intensity: String,
    #[tabled(rename = "Mass")]
    mass: String,
    #[tabled(rename = "Distance")]
    distance: String,
}

/// Intensity statistics over the non-empty cells of a heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensitySummary {
    pub active_cells: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

pub fn summarise_intensity(cells: &[HeatmapCell]) -> Option<IntensitySummary> {
    let active: Vec<f64> = cells
        .iter()
        .map(|cell| cell.intensity)
        .filter(|&v| v > 0.0)
        .collect();
    if active.is_empty() {
        return None;
    }
    let std_dev = if active.len() > 1 {
        active.iter().std_dev()
    } else {
        0.0
    };
    Some(IntensitySummary {
        active_cells: active.len(),
        mean: active.iter().mean(),
        median: Data::new(active.clone()).median(),
        std_dev,
    })
}

pub fn print_report(candles: &[Candle], output: &PipelineOutput, zones: &[HotZone]) {
    println!("\n=== Liquidity Magnet Map (Estimated) ===\n");
    if let (Some(first), Some(last)) = (candles.first(), candles.last()) {
        println!(
            "Candles: {} spanning {} to {}",
            candles.len(),
            first.timestamp.format("%Y-%m-%d %H:%M"),
            last.timestamp.format("%Y-%m-%d %H:%M"),
        );
    }
    let current_price = output.current_price;
    println!("Current Price: {current_price:.2}");

    let highs = output
        .swings
        .iter()
        .filter(|s| s.kind == SwingKind::High)
        .count();
    let lows = output.swings.len() - highs;
    println!("Swings: {highs} highs / {lows} lows");

    let longs = output
        .levels
        .iter()
        .filter(|l| l.tier.side == PositionSide::Long)
        .count();
    let shorts = output.levels.len() - longs;
    println!(
        "Projected Levels: {longs} long / {shorts} short ({} aggregated)",
        output.profile.contributing
    );

    if let (Some(first), Some(last)) = (output.cells.first(), output.cells.last()) {
        println!(
            "Density Grid: {} bins of {:.4} | {:.2} to {:.2}",
            output.cells.len(),
            output.profile.bin_width,
            first.lower,
            last.upper
        );
    }
    if let Some(summary) = summarise_intensity(&output.cells) {
        println!(
            "Active Cells: {} | mean {:.3} | median {:.3} | std {:.3}",
            summary.active_cells, summary.mean, summary.median, summary.std_dev
        );
    }

    if let Some(warning) = output.warning {
        println!("\n{warning}.");
        return;
    }
    if zones.is_empty() {
        println!("\nNo hot zones above the intensity threshold.");
        return;
    }

    let rows: Vec<ZoneRow> = zones
        .iter()
        .map(|zone| ZoneRow {
            side: zone.dominant_side.label(),
            range: format!("{:.2} - {:.2}", zone.lower, zone.upper),
            peak: format!("{:.2}", zone.peak_price),
            intensity: format!("{:.2}", zone.peak_intensity),
            mass: format!("{:.2}", zone.mass),
            distance: if current_price != 0.0 {
                format!(
                    "{:+.2}%",
                    (zone.peak_price - current_price) / current_price * 100.0
                )
            } else {
                "-".to_string()
            },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("\n{table}\n");
    println!("Long Liq zones sit below swing lows: a drop into them forces long liquidations.");
    println!("Short Liq zones sit above swing highs: a rally into them forces short liquidations.");
}

/// Write one CSV row per heatmap cell for an external renderer.
pub fn export_heatmap<P: AsRef<Path>>(path: P, cells: &[HeatmapCell]) -> Result<()> {
    let path_ref = path.as_ref();
    let mut writer = csv::Writer::from_path(path_ref)
        .with_context(|| format!("failed to create {:?}", path_ref))?;
    for cell in cells {
        writer.serialize(cell)?;
    }
    writer.flush()?;
    log::info!("wrote {} heatmap cells to {:?}", cells.len(), path_ref);
    Ok(())
}
