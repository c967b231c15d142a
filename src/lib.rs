//! Estimated liquidation heatmaps from historical price structure.
//!
//! Swing highs and lows are detected in a candle series, each swing projects
//! hypothetical liquidation prices at the configured leverage tiers, and the
//! projected levels are binned along the price axis into a normalised density
//! that a chart renderer can overlay on the candles. The model is geometric and
//! approximate; it does not read order books.

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod loader;
pub mod output;

pub use analysis::{run_pipeline, PipelineOutput, PipelineWarning};
pub use config::{Binning, DecayFunction, DecayPolicy, HeatmapConfig, IntensityScale, TimeWindow};
pub use error::AnalysisError;
