use crate::analysis::density::DensityProfile;
use crate::config::IntensityScale;
use crate::data::HeatmapCell;

/// Normalise bin weights into `[0, 1]` intensities, one cell per bin.
///
/// A zero divisor (no weight anywhere) short-circuits to an all-zero map.
pub fn build_heatmap(profile: &DensityProfile, scale: IntensityScale) -> Vec<HeatmapCell> {
    let divisor = match scale {
        IntensityScale::Auto => profile.max_weight,
        IntensityScale::Fixed(ceiling) => ceiling,
    };
    let normalise = |weight: f64| -> f64 {
        if divisor > 0.0 && divisor.is_finite() {
            (weight / divisor).clamp(0.0, 1.0)
        } else {
            0.0
        }
    };

    profile
        .bins
        .iter()
        .map(|bin| HeatmapCell {
            price: bin.midpoint,
            lower: bin.lower,
            upper: bin.upper,
            intensity: normalise(bin.weight),
            long_intensity: normalise(bin.long_weight),
            short_intensity: normalise(bin.short_weight),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DensityBin;

    fn profile(weights: &[f64]) -> DensityProfile {
        let bins: Vec<DensityBin> = weights
            .iter()
            .enumerate()
            .map(|(idx, &weight)| DensityBin {
                lower: idx as f64,
                upper: idx as f64 + 1.0,
                midpoint: idx as f64 + 0.5,
                weight,
                long_weight: weight,
                short_weight: 0.0,
            })
            .collect();
        let max_weight = weights.iter().copied().fold(0.0, f64::max);
        DensityProfile {
            bins,
            bin_width: 1.0,
            max_weight,
            contributing: weights.len(),
        }
    }

    #[test]
    fn auto_scale_maps_max_to_one() {
        let cells = build_heatmap(&profile(&[0.0, 2.0, 4.0, 1.0]), IntensityScale::Auto);
        let intensities: Vec<f64> = cells.iter().map(|c| c.intensity).collect();
        assert_eq!(intensities, vec![0.0, 0.5, 1.0, 0.25]);
        assert_eq!(cells[2].price, 2.5);
        assert_eq!(cells[2].long_intensity, 1.0);
        assert_eq!(cells[2].short_intensity, 0.0);
    }

    #[test]
    fn fixed_ceiling_saturates() {
        let cells = build_heatmap(&profile(&[1.0, 3.0, 6.0]), IntensityScale::Fixed(4.0));
        let intensities: Vec<f64> = cells.iter().map(|c| c.intensity).collect();
        assert_eq!(intensities, vec![0.25, 0.75, 1.0]);
    }

    #[test]
    fn all_zero_weights_do_not_divide_by_zero() {
        let cells = build_heatmap(&profile(&[0.0, 0.0, 0.0]), IntensityScale::Auto);
        assert_eq!(cells.len(), 3);
        assert!(cells.iter().all(|c| c.intensity == 0.0 && !c.intensity.is_nan()));
    }

    #[test]
    fn ordering_survives_weight_scaling() {
        let weights = [0.3, 5.0, 2.2, 0.0, 7.5, 2.2];
        let scaled: Vec<f64> = weights.iter().map(|w| w * 13.0).collect();
        let base = build_heatmap(&profile(&weights), IntensityScale::Auto);
        let other = build_heatmap(&profile(&scaled), IntensityScale::Auto);
        for i in 0..weights.len() {
            for j in 0..weights.len() {
                if weights[i] > weights[j] {
                    assert!(base[i].intensity >= base[j].intensity);
                    assert!(other[i].intensity >= other[j].intensity);
                }
            }
            assert!((base[i].intensity - other[i].intensity).abs() < 1e-12);
        }
    }
}
