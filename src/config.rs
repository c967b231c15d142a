use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use clap::{ArgAction, Parser, ValueEnum};

use crate::error::AnalysisError;

/// Upper bound on the number of density bins a single run may allocate.
pub const MAX_BINS: usize = 100_000;

/// Command-line configuration for the liquidation heatmap estimator.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct AppConfig {
    /// Input CSV file path containing OHLCV data.
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input_path: PathBuf,

    /// Timezone used to interpret timestamps in the input file.
    #[arg(long, default_value = "UTC")]
    pub timezone: String,

    /// Candles on each side required to confirm a swing high/low.
    #[arg(short = 'w', long, default_value_t = 5)]
    pub window: usize,

    /// Leverage multipliers to simulate, comma separated.
    #[arg(long, value_delimiter = ',', default_value = "25,50")]
    pub leverage: Vec<u32>,

    /// Number of price bins spanning the observed range.
    #[arg(long, default_value_t = 200)]
    pub bins: usize,

    /// Fixed bin width in price units (overrides --bins).
    #[arg(long)]
    pub bin_width: Option<f64>,

    /// Only swings from the last N candles contribute to the density.
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub last_candles: Option<usize>,

    /// Only swings on or after this date (YYYY-MM-DD) contribute.
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Only swings on or before this date (YYYY-MM-DD) contribute.
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Shape of the age decay applied to level weights.
    #[arg(long, value_enum, default_value_t = DecayFunction::Exponential)]
    pub decay: DecayFunction,

    /// Decay half-life in candles; decay is disabled unless set.
    #[arg(long)]
    pub half_life: Option<f64>,

    /// Fixed weight ceiling for intensity normalisation (defaults to the densest bin).
    #[arg(long)]
    pub ceiling: Option<f64>,

    /// Keep only levels within this fraction of the last close.
    #[arg(long, default_value_t = 0.15)]
    pub focus_band: f64,

    /// Disable the focus band and aggregate every projected level.
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_focus: bool,

    /// Minimum intensity for a cell to count towards a hot zone.
    #[arg(long, default_value_t = 0.6)]
    pub zone_threshold: f64,

    /// Sub-threshold cells bridged inside a single hot zone.
    #[arg(long, default_value_t = 1)]
    pub zone_gap: usize,

    /// Write the heatmap cells to this CSV file.
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,
}

impl AppConfig {
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|err| anyhow!("unknown timezone {:?}: {err}", self.timezone))
    }

    /// Translate CLI flags into the pipeline configuration.
    pub fn heatmap_config(&self, tz: Tz) -> Result<HeatmapConfig> {
        let binning = match self.bin_width {
            Some(width) => Binning::Width(width),
            None => Binning::Count(self.bins),
        };

        let time_window = if let Some(n) = self.last_candles {
            Some(TimeWindow::LastCandles(n))
        } else if self.from.is_some() || self.to.is_some() {
            let start = self
                .from
                .map(|date| localize(tz, date.and_time(NaiveTime::MIN)))
                .transpose()?;
            let end = self
                .to
                .map(|date| {
                    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)
                        .ok_or_else(|| anyhow!("invalid end-of-day time"))?;
                    localize(tz, date.and_time(end_of_day))
                })
                .transpose()?;
            Some(TimeWindow::Range { start, end })
        } else {
            None
        };

        let decay = self.half_life.map(|half_life| DecayPolicy {
            function: self.decay,
            half_life,
        });

        let scale = match self.ceiling {
            Some(ceiling) => IntensityScale::Fixed(ceiling),
            None => IntensityScale::Auto,
        };

        let focus_band = if self.no_focus {
            None
        } else {
            Some(self.focus_band)
        };

        Ok(HeatmapConfig {
            swing_window: self.window,
            leverage_tiers: self.leverage.clone(),
            binning,
            time_window,
            decay,
            scale,
            focus_band,
        })
    }
}

fn localize(tz: Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(dt, _) => Ok(dt),
        LocalResult::None => Err(anyhow!("{naive} does not exist in timezone {tz}")),
    }
}

/// How the price axis is discretised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binning {
    Count(usize),
    Width(f64),
}

/// Restricts which swings contribute to the density profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeWindow {
    LastCandles(usize),
    /// Inclusive bounds on the originating candle's timestamp.
    Range {
        start: Option<DateTime<Tz>>,
        end: Option<DateTime<Tz>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DecayFunction {
    Exponential,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayPolicy {
    pub function: DecayFunction,
    /// Age in candles at which a level keeps half its weight.
    pub half_life: f64,
}

impl DecayPolicy {
    /// Weight multiplier for a swing `age` candles before the most recent candle.
    pub fn factor(&self, age: usize) -> f64 {
        let age = age as f64;
        match self.function {
            DecayFunction::Exponential => 0.5_f64.powf(age / self.half_life),
            DecayFunction::Linear => (1.0 - age / (2.0 * self.half_life)).max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntensityScale {
    /// Normalise by the heaviest bin of the current run.
    Auto,
    /// Normalise by a fixed ceiling so the scale is stable across runs.
    Fixed(f64),
}

/// Full parameter set for one recomputation of the heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapConfig {
    pub swing_window: usize,
    pub leverage_tiers: Vec<u32>,
    pub binning: Binning,
    pub time_window: Option<TimeWindow>,
    pub decay: Option<DecayPolicy>,
    pub scale: IntensityScale,
    pub focus_band: Option<f64>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            swing_window: 5,
            leverage_tiers: vec![25, 50],
            binning: Binning::Count(200),
            time_window: None,
            decay: None,
            scale: IntensityScale::Auto,
            focus_band: None,
        }
    }
}

impl HeatmapConfig {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.swing_window == 0 {
            return Err(AnalysisError::config("swing window must be at least 1"));
        }
        if let Some(tier) = self.leverage_tiers.iter().find(|&&tier| tier == 0) {
            return Err(AnalysisError::config(format!(
                "leverage tier must be positive, got {tier}"
            )));
        }
        match self.binning {
            Binning::Count(0) => {
                return Err(AnalysisError::config("bin count must be positive"));
            }
            Binning::Count(count) if count > MAX_BINS => {
                return Err(AnalysisError::config(format!(
                    "bin count {count} exceeds the limit of {MAX_BINS}"
                )));
            }
            Binning::Width(width) if !(width.is_finite() && width > 0.0) => {
                return Err(AnalysisError::config(format!(
                    "bin width must be positive, got {width}"
                )));
            }
            _ => {}
        }
        match self.time_window {
            Some(TimeWindow::LastCandles(0)) => {
                return Err(AnalysisError::config("time window must cover at least 1 candle"));
            }
            Some(TimeWindow::Range {
                start: Some(start),
                end: Some(end),
            }) if start > end => {
                return Err(AnalysisError::config(format!(
                    "time window start {start} is after end {end}"
                )));
            }
            _ => {}
        }
        if let Some(decay) = self.decay {
            if !(decay.half_life.is_finite() && decay.half_life > 0.0) {
                return Err(AnalysisError::config(format!(
                    "decay half-life must be positive, got {}",
                    decay.half_life
                )));
            }
        }
        if let IntensityScale::Fixed(ceiling) = self.scale {
            if !(ceiling.is_finite() && ceiling > 0.0) {
                return Err(AnalysisError::config(format!(
                    "intensity ceiling must be positive, got {ceiling}"
                )));
            }
        }
        if let Some(band) = self.focus_band {
            if !(band > 0.0 && band < 1.0) {
                return Err(AnalysisError::config(format!(
                    "focus band must lie strictly between 0 and 1, got {band}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(HeatmapConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_parameters() {
        let cases = [
            HeatmapConfig {
                swing_window: 0,
                ..HeatmapConfig::default()
            },
            HeatmapConfig {
                leverage_tiers: vec![25, 0],
                ..HeatmapConfig::default()
            },
            HeatmapConfig {
                binning: Binning::Count(0),
                ..HeatmapConfig::default()
            },
            HeatmapConfig {
                binning: Binning::Width(-1.0),
                ..HeatmapConfig::default()
            },
            HeatmapConfig {
                time_window: Some(TimeWindow::LastCandles(0)),
                ..HeatmapConfig::default()
            },
            HeatmapConfig {
                scale: IntensityScale::Fixed(0.0),
                ..HeatmapConfig::default()
            },
            HeatmapConfig {
                decay: Some(DecayPolicy {
                    function: DecayFunction::Exponential,
                    half_life: f64::NAN,
                }),
                ..HeatmapConfig::default()
            },
            HeatmapConfig {
                focus_band: Some(1.5),
                ..HeatmapConfig::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(AnalysisError::InvalidConfiguration(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn empty_tier_list_is_valid() {
        let config = HeatmapConfig {
            leverage_tiers: Vec::new(),
            ..HeatmapConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn decay_halves_at_half_life() {
        let exp = DecayPolicy {
            function: DecayFunction::Exponential,
            half_life: 10.0,
        };
        let lin = DecayPolicy {
            function: DecayFunction::Linear,
            half_life: 10.0,
        };
        assert!((exp.factor(0) - 1.0).abs() < 1e-12);
        assert!((exp.factor(10) - 0.5).abs() < 1e-12);
        assert!((lin.factor(10) - 0.5).abs() < 1e-12);
        assert_eq!(lin.factor(40), 0.0);
        assert!(exp.factor(5) > exp.factor(6));
    }

    #[test]
    fn cli_flags_map_to_heatmap_config() {
        let args = AppConfig::parse_from([
            "liquidity-hunter",
            "-i",
            "candles.csv",
            "--leverage",
            "10,100",
            "--bin-width",
            "2.5",
            "--half-life",
            "20",
            "--no-focus",
            "--from",
            "2024-01-02",
        ]);
        let tz = args.timezone().unwrap();
        let config = args.heatmap_config(tz).unwrap();
        assert_eq!(config.leverage_tiers, vec![10, 100]);
        assert_eq!(config.binning, Binning::Width(2.5));
        assert_eq!(config.focus_band, None);
        assert_eq!(
            config.decay,
            Some(DecayPolicy {
                function: DecayFunction::Exponential,
                half_life: 20.0
            })
        );
        match config.time_window {
            Some(TimeWindow::Range {
                start: Some(start),
                end: None,
            }) => assert_eq!(start.format("%Y-%m-%d %H:%M").to_string(), "2024-01-02 00:00"),
            other => panic!("unexpected window {other:?}"),
        }
    }
}
