use crate::data::{Candle, SwingKind, SwingPoint};
use crate::error::AnalysisError;

/// Detect swing highs and lows using a symmetric window of `window` candles.
///
/// A candle is a swing high when no candle in `[i - window, i + window]` has a
/// higher high and no earlier candle in that window has an equal one, so a flat
/// top yields a single swing at its first candle. Swing lows mirror this on the
/// lows. Candles closer than `window` to either end of the series are never
/// emitted. Output is ascending by index; a candle that is both a high and a low
/// (an outside bar) yields the high first.
pub fn detect_swings(candles: &[Candle], window: usize) -> Result<Vec<SwingPoint>, AnalysisError> {
    if window == 0 {
        return Err(AnalysisError::config("swing window must be at least 1"));
    }
    if candles.len() <= 2 * window {
        return Err(AnalysisError::InsufficientData {
            candles: candles.len(),
            window,
        });
    }

    let mut swings = Vec::new();
    for idx in window..candles.len() - window {
        let candle = &candles[idx];
        let left = &candles[idx - window..idx];
        let right = &candles[idx + 1..=idx + window];

        let high = candle.high;
        if left.iter().all(|c| c.high < high) && right.iter().all(|c| c.high <= high) {
            swings.push(SwingPoint {
                index: idx,
                timestamp: candle.timestamp,
                price: high,
                kind: SwingKind::High,
                strength: window,
            });
        }

        let low = candle.low;
        if left.iter().all(|c| c.low > low) && right.iter().all(|c| c.low >= low) {
            swings.push(SwingPoint {
                index: idx,
                timestamp: candle.timestamp,
                price: low,
                kind: SwingKind::Low,
                strength: window,
            });
        }
    }

    log::debug!(
        "detected {} swings over {} candles (window {window})",
        swings.len(),
        candles.len()
    );
    Ok(swings)
}
