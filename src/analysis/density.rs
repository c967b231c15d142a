use itertools::{Itertools, MinMaxResult};

use crate::config::{Binning, TimeWindow, MAX_BINS};
use crate::data::{Candle, DensityBin, LiquidationLevel, PositionSide};
use crate::error::AnalysisError;

#[derive(Debug, Clone, PartialEq)]
pub struct DensityProfile {
    pub bins: Vec<DensityBin>,
    pub bin_width: f64,
    pub max_weight: f64,
    /// Levels that passed the time window and landed in a bin.
    pub contributing: usize,
}

impl DensityProfile {
    fn empty() -> Self {
        Self {
            bins: Vec::new(),
            bin_width: 0.0,
            max_weight: 0.0,
            contributing: 0,
        }
    }
}

/// Whether the swing behind `level` falls inside the time window.
pub fn within_window(level: &LiquidationLevel, candles: &[Candle], window: &TimeWindow) -> bool {
    match *window {
        TimeWindow::LastCandles(n) => level.origin_index >= candles.len().saturating_sub(n),
        TimeWindow::Range { start, end } => match candles.get(level.origin_index) {
            Some(candle) => {
                start.map_or(true, |s| candle.timestamp >= s)
                    && end.map_or(true, |e| candle.timestamp <= e)
            }
            None => false,
        },
    }
}

/// Accumulate level weights into price bins covering the observed range.
///
/// The range spans every candle's low/high plus every contributing level, so an
/// empty level set still produces an all-zero grid over the traded range. Bins
/// are half-open `[lower, upper)` except the last, which also holds the maximum.
pub fn aggregate_levels(
    levels: &[LiquidationLevel],
    candles: &[Candle],
    binning: Binning,
    window: Option<&TimeWindow>,
) -> Result<DensityProfile, AnalysisError> {
    let contributing: Vec<&LiquidationLevel> = levels
        .iter()
        .filter(|level| level.price.is_finite() && level.weight.is_finite())
        .filter(|level| window.map_or(true, |w| within_window(level, candles, w)))
        .collect();

    let observed = candles
        .iter()
        .flat_map(|c| [c.low, c.high])
        .chain(contributing.iter().map(|level| level.price))
        .filter(|price| price.is_finite())
        .minmax();
    let (mut min_price, mut max_price) = match observed {
        MinMaxResult::NoElements => return Ok(DensityProfile::empty()),
        MinMaxResult::OneElement(price) => (price, price),
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
    };

    let (count, bin_width) = match binning {
        Binning::Count(count) => {
            if max_price <= min_price {
                let pad = if min_price == 0.0 {
                    0.5
                } else {
                    min_price.abs() * 0.005
                };
                min_price -= pad;
                max_price += pad;
            }
            (count, (max_price - min_price) / count as f64)
        }
        Binning::Width(width) => {
            if max_price <= min_price {
                min_price -= width / 2.0;
                max_price += width / 2.0;
            }
            let needed = ((max_price - min_price) / width).ceil().max(1.0);
            if needed > MAX_BINS as f64 {
                return Err(AnalysisError::config(format!(
                    "bin width {width} over range {min_price:.4}..{max_price:.4} needs more than {MAX_BINS} bins"
                )));
            }
            let count = needed as usize;
            max_price = min_price + width * count as f64;
            (count, width)
        }
    };
    if count == 0 || !(bin_width.is_finite() && bin_width > 0.0) {
        return Err(AnalysisError::config(format!(
            "cannot partition {min_price}..{max_price} into {count} bins"
        )));
    }

    let mut bins: Vec<DensityBin> = (0..count)
        .map(|idx| {
            let lower = min_price + bin_width * idx as f64;
            let upper = if idx + 1 == count {
                max_price
            } else {
                min_price + bin_width * (idx + 1) as f64
            };
            DensityBin {
                lower,
                upper,
                midpoint: 0.5 * (lower + upper),
                weight: 0.0,
                long_weight: 0.0,
                short_weight: 0.0,
            }
        })
        .collect();

    for level in &contributing {
        let offset = ((level.price - min_price) / bin_width).floor();
        let mut idx = (offset.max(0.0) as usize).min(count - 1);
        // The division can round across an edge; settle against the stored bounds.
        while idx + 1 < count && level.price >= bins[idx + 1].lower {
            idx += 1;
        }
        while idx > 0 && level.price < bins[idx].lower {
            idx -= 1;
        }
        let bin = &mut bins[idx];
        bin.weight += level.weight;
        match level.tier.side {
            PositionSide::Long => bin.long_weight += level.weight,
            PositionSide::Short => bin.short_weight += level.weight,
        }
    }

    let max_weight = bins.iter().map(|bin| bin.weight).fold(0.0, f64::max);
    Ok(DensityProfile {
        bins,
        bin_width,
        max_weight,
        contributing: contributing.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{candles_from_closes, level};

    #[test]
    fn overlapping_levels_stack_in_one_bin() {
        let candles = candles_from_closes(&[100.0, 110.0]);
        let levels = vec![
            level(0, 101.2, PositionSide::Long, 1.0),
            level(1, 101.4, PositionSide::Short, 1.0),
            level(1, 108.0, PositionSide::Short, 1.0),
        ];
        let profile = aggregate_levels(&levels, &candles, Binning::Count(10), None).unwrap();

        assert_eq!(profile.bins.len(), 10);
        assert!((profile.bin_width - 1.0).abs() < 1e-12);
        assert_eq!(profile.bins[1].weight, 2.0);
        assert_eq!(profile.bins[1].long_weight, 1.0);
        assert_eq!(profile.bins[1].short_weight, 1.0);
        assert_eq!(profile.bins[8].weight, 1.0);
        assert_eq!(profile.max_weight, 2.0);
        assert_eq!(profile.contributing, 3);
    }

    #[test]
    fn bins_partition_range_without_gaps() {
        let candles = candles_from_closes(&[10.0, 13.7, 11.2]);
        let levels = vec![level(1, 9.1, PositionSide::Long, 1.0)];
        let profile = aggregate_levels(&levels, &candles, Binning::Count(7), None).unwrap();

        assert_eq!(profile.bins.first().unwrap().lower, 9.1);
        assert_eq!(profile.bins.last().unwrap().upper, 13.7);
        for pair in profile.bins.windows(2) {
            assert_eq!(pair[0].upper, pair[1].lower);
        }
    }

    #[test]
    fn levels_on_interior_edges_land_in_upper_bin() {
        let grids = [(3.3, 9.1, 13), (0.1, 0.7, 9), (101.7, 187.3, 37), (7.0, 8.0, 3)];
        for (lo, hi, count) in grids {
            let candles = candles_from_closes(&[lo, hi]);
            let grid = aggregate_levels(&[], &candles, Binning::Count(count), None).unwrap();
            for k in 1..count {
                let edge = grid.bins[k].lower;
                let levels = vec![level(0, edge, PositionSide::Long, 1.0)];
                let profile =
                    aggregate_levels(&levels, &candles, Binning::Count(count), None).unwrap();

                let hit: Vec<usize> = (0..count)
                    .filter(|&i| profile.bins[i].weight > 0.0)
                    .collect();
                assert_eq!(hit, vec![k], "edge {edge} of grid {lo}..{hi}/{count}");
                let bin = &profile.bins[k];
                assert!(bin.lower <= edge && edge < bin.upper);
            }
        }
    }

    #[test]
    fn maximum_price_lands_in_last_bin() {
        let candles = candles_from_closes(&[0.0, 10.0]);
        let levels = vec![level(0, 10.0, PositionSide::Short, 1.0)];
        let profile = aggregate_levels(&levels, &candles, Binning::Width(2.5), None).unwrap();
        assert_eq!(profile.bins.len(), 4);
        assert_eq!(profile.bins[3].weight, 1.0);
    }

    #[test]
    fn no_levels_gives_zero_bins() {
        let candles = candles_from_closes(&[5.0, 6.0, 7.0]);
        let profile = aggregate_levels(&[], &candles, Binning::Count(4), None).unwrap();
        assert_eq!(profile.bins.len(), 4);
        assert!(profile.bins.iter().all(|bin| bin.weight == 0.0));
        assert_eq!(profile.max_weight, 0.0);
    }

    #[test]
    fn flat_range_is_padded() {
        let candles = candles_from_closes(&[50.0, 50.0]);
        let profile = aggregate_levels(&[], &candles, Binning::Count(3), None).unwrap();
        assert_eq!(profile.bins.len(), 3);
        assert!(profile.bin_width > 0.0);
        assert!(profile.bins[0].lower < 50.0 && profile.bins[2].upper > 50.0);
    }

    #[test]
    fn last_candles_window_drops_old_swings() {
        let candles = candles_from_closes(&[10.0; 10]);
        let levels = vec![
            level(2, 9.6, PositionSide::Long, 1.0),
            level(8, 9.6, PositionSide::Long, 1.0),
        ];
        let window = TimeWindow::LastCandles(3);
        let profile =
            aggregate_levels(&levels, &candles, Binning::Count(4), Some(&window)).unwrap();
        assert_eq!(profile.contributing, 1);
        assert_eq!(profile.max_weight, 1.0);
    }

    #[test]
    fn date_range_window_uses_origin_timestamp() {
        let candles = candles_from_closes(&[10.0; 6]);
        let levels = vec![
            level(1, 9.6, PositionSide::Long, 1.0),
            level(3, 9.6, PositionSide::Long, 1.0),
            level(5, 9.6, PositionSide::Long, 1.0),
        ];
        let window = TimeWindow::Range {
            start: Some(candles[2].timestamp),
            end: Some(candles[4].timestamp),
        };
        let profile =
            aggregate_levels(&levels, &candles, Binning::Count(4), Some(&window)).unwrap();
        assert_eq!(profile.contributing, 1);
    }

    #[test]
    fn too_fine_width_is_rejected() {
        let candles = candles_from_closes(&[1.0, 1000.0]);
        let result = aggregate_levels(&[], &candles, Binning::Width(1e-6), None);
        assert!(matches!(result, Err(AnalysisError::InvalidConfiguration(_))));
    }
}
