use std::fmt;

use crate::analysis::density::{aggregate_levels, DensityProfile};
use crate::analysis::heatmap::build_heatmap;
use crate::analysis::projection::project_levels;
use crate::analysis::swings::detect_swings;
use crate::config::HeatmapConfig;
use crate::data::{Candle, HeatmapCell, LiquidationLevel, SwingPoint};
use crate::error::AnalysisError;

/// Non-fatal conditions that leave the heatmap valid but empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineWarning {
    NoSwings,
    NoLevels,
    NoLevelsInWindow,
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            PipelineWarning::NoSwings => "no swing points detected; heatmap is empty",
            PipelineWarning::NoLevels => "no leverage tiers configured; heatmap is empty",
            PipelineWarning::NoLevelsInWindow => {
                "no liquidation levels fall inside the time window or focus band; heatmap is empty"
            }
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub swings: Vec<SwingPoint>,
    /// Every projected level, before time window or focus band filtering.
    pub levels: Vec<LiquidationLevel>,
    pub profile: DensityProfile,
    pub cells: Vec<HeatmapCell>,
    pub current_price: f64,
    pub warning: Option<PipelineWarning>,
}

/// Recompute the whole heatmap from candles and configuration.
///
/// Configuration is validated before anything else runs, so an invalid
/// configuration never yields partial output.
pub fn run_pipeline(
    candles: &[Candle],
    config: &HeatmapConfig,
) -> Result<PipelineOutput, AnalysisError> {
    config.validate()?;

    let swings = detect_swings(candles, config.swing_window)?;
    let last_index = candles.len() - 1;
    let current_price = candles[last_index].close;

    let levels = project_levels(
        &swings,
        &config.leverage_tiers,
        config.decay.as_ref(),
        last_index,
    );
    log::debug!(
        "projected {} liquidation levels from {} swings",
        levels.len(),
        swings.len()
    );

    let profile = match config.focus_band {
        Some(band) => {
            let (floor, ceiling) = (current_price * (1.0 - band), current_price * (1.0 + band));
            let focused: Vec<LiquidationLevel> = levels
                .iter()
                .filter(|level| level.price > floor && level.price < ceiling)
                .cloned()
                .collect();
            log::debug!(
                "focus band {:.1}% keeps {} of {} levels",
                band * 100.0,
                focused.len(),
                levels.len()
            );
            aggregate_levels(&focused, candles, config.binning, config.time_window.as_ref())?
        }
        None => aggregate_levels(&levels, candles, config.binning, config.time_window.as_ref())?,
    };

    let cells = build_heatmap(&profile, config.scale);

    let warning = if swings.is_empty() {
        Some(PipelineWarning::NoSwings)
    } else if levels.is_empty() {
        Some(PipelineWarning::NoLevels)
    } else if profile.contributing == 0 {
        Some(PipelineWarning::NoLevelsInWindow)
    } else {
        None
    };
    if let Some(warning) = warning {
        log::warn!("{warning}");
    }

    log::info!(
        "heatmap: {} swings, {} levels ({} aggregated), {} bins, peak weight {:.3}",
        swings.len(),
        levels.len(),
        profile.contributing,
        profile.bins.len(),
        profile.max_weight
    );

    Ok(PipelineOutput {
        swings,
        levels,
        profile,
        cells,
        current_price,
        warning,
    })
}
