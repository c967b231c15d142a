use std::cmp::Ordering;

use crate::data::{HeatmapCell, HotZone, PositionSide};

/// Group hot cells into zones.
///
/// Cells at or above `threshold` are land; runs of land separated by at most
/// `max_gap` sub-threshold cells merge into one zone. Zones are returned
/// heaviest first, where mass is the summed intensity of the member cells.
pub fn find_hot_zones(cells: &[HeatmapCell], threshold: f64, max_gap: usize) -> Vec<HotZone> {
    let hot: Vec<usize> = cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| cell.intensity > 0.0 && cell.intensity >= threshold)
        .map(|(idx, _)| idx)
        .collect();
    let Some(&first) = hot.first() else {
        return Vec::new();
    };

    let mut zones = Vec::new();
    let mut start = first;
    let mut prev = first;
    for &idx in hot.iter().skip(1) {
        if idx - prev - 1 > max_gap {
            zones.push(summarise(&cells[start..=prev]));
            start = idx;
        }
        prev = idx;
    }
    zones.push(summarise(&cells[start..=prev]));

    zones.sort_by(|a, b| b.mass.partial_cmp(&a.mass).unwrap_or(Ordering::Equal));
    zones
}

fn summarise(span: &[HeatmapCell]) -> HotZone {
    let mut peak = &span[0];
    let mut long_mass = 0.0;
    let mut short_mass = 0.0;
    for cell in span {
        if cell.intensity > peak.intensity {
            peak = cell;
        }
        long_mass += cell.long_intensity;
        short_mass += cell.short_intensity;
    }
    let dominant_side = if long_mass >= short_mass {
        PositionSide::Long
    } else {
        PositionSide::Short
    };
    HotZone {
        lower: span[0].lower,
        upper: span[span.len() - 1].upper,
        peak_price: peak.price,
        peak_intensity: peak.intensity,
        mass: span.iter().map(|cell| cell.intensity).sum(),
        dominant_side,
    }
}
