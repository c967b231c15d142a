use crate::config::DecayPolicy;
use crate::data::{LeverageTier, LiquidationLevel, SwingPoint};

/// Project one liquidation level per (swing, leverage tier).
///
/// Longs are assumed to enter at swing lows and shorts at swing highs, so each
/// swing only spawns levels on its exposed side. With a decay policy the weight
/// shrinks with the swing's distance from `last_index`, otherwise it is 1.0.
pub fn project_levels(
    swings: &[SwingPoint],
    leverage_tiers: &[u32],
    decay: Option<&DecayPolicy>,
    last_index: usize,
) -> Vec<LiquidationLevel> {
    let mut levels = Vec::with_capacity(swings.len() * leverage_tiers.len());
    for (swing_id, swing) in swings.iter().enumerate() {
        let weight = decay
            .map(|policy| policy.factor(last_index.saturating_sub(swing.index)))
            .unwrap_or(1.0);
        let side = swing.kind.exposed_side();
        for &multiplier in leverage_tiers {
            let tier = LeverageTier { multiplier, side };
            levels.push(LiquidationLevel {
                swing_id,
                origin_index: swing.index,
                origin_price: swing.price,
                tier,
                price: tier.liquidation_price(swing.price),
                weight,
            });
        }
    }
    levels
}
