use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

/// Single OHLCV candle sampled from the market-data feed.
#[derive(Debug, Clone, Serialize)]
pub struct Candle {
    pub timestamp: DateTime<Tz>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwingKind {
    High,
    Low,
}

impl SwingKind {
    /// Side of the position assumed to be opened at this swing.
    pub fn exposed_side(self) -> PositionSide {
        match self {
            SwingKind::Low => PositionSide::Long,
            SwingKind::High => PositionSide::Short,
        }
    }
}

/// Local extremum confirmed by a symmetric window of `strength` candles on each side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwingPoint {
    pub index: usize,
    pub timestamp: DateTime<Tz>,
    pub price: f64,
    pub kind: SwingKind,
    pub strength: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn label(self) -> &'static str {
        match self {
            PositionSide::Long => "Long Liq",
            PositionSide::Short => "Short Liq",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeverageTier {
    pub multiplier: u32,
    pub side: PositionSide,
}

impl LeverageTier {
    /// Approximate isolated-margin liquidation price for a position entered at `entry`.
    /// Maintenance margin is not modelled.
    pub fn liquidation_price(&self, entry: f64) -> f64 {
        let distance = 1.0 / f64::from(self.multiplier);
        match self.side {
            PositionSide::Long => entry * (1.0 - distance),
            PositionSide::Short => entry * (1.0 + distance),
        }
    }
}

/// Hypothetical liquidation price projected from one swing at one leverage tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidationLevel {
    /// Position of the originating swing in the detector output.
    pub swing_id: usize,
    /// Candle index of the originating swing.
    pub origin_index: usize,
    pub origin_price: f64,
    pub tier: LeverageTier,
    pub price: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityBin {
    pub lower: f64,
    pub upper: f64,
    pub midpoint: f64,
    pub weight: f64,
    pub long_weight: f64,
    pub short_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub price: f64,
    pub lower: f64,
    pub upper: f64,
    pub intensity: f64,
    pub long_intensity: f64,
    pub short_intensity: f64,
}

/// Run of adjacent hot cells summarised for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotZone {
    pub lower: f64,
    pub upper: f64,
    pub peak_price: f64,
    pub peak_intensity: f64,
    pub mass: f64,
    pub dominant_side: PositionSide,
}
