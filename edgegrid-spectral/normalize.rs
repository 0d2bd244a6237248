use rustfft::num_complex::Complex;

/// Value spread at or below which a magnitude map counts as flat
pub const FLAT_EPSILON: f64 = 1e-12;

/// Per-coefficient magnitude, compressed with `ln(1 + |X|)` when `log_scale` is set
pub fn magnitude_map(spectrum: &[Complex<f64>], log_scale: bool) -> Vec<f64> {
    spectrum
        .iter()
        .map(|c| {
            let m = c.norm();
            if log_scale { m.ln_1p() } else { m }
        })
        .collect()
}

/// Local min-max scaling to `0..=255`.
///
/// The minimum maps to 0 and the maximum to 255; intermediate values are
/// truncated toward zero. A flat map yields zeros.
pub fn normalize_min_max(values: &[f64]) -> Vec<u8> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    let range = max - min;
    if values.is_empty() || !(range > FLAT_EPSILON) {
        return vec![0; values.len()];
    }

    let scale = 255.0 / range;
    values
        .iter()
        .map(|&v| ((v - min) * scale).floor().clamp(0.0, 255.0) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_flat_map_is_zero() {
        assert_eq!(normalize_min_max(&[3.5; 9]), vec![0; 9]);
        assert_eq!(normalize_min_max(&[0.0; 4]), vec![0; 4]);
        assert!(normalize_min_max(&[]).is_empty());
    }

    #[test]
    fn test_extremes_map_to_0_and_255() {
        let out = normalize_min_max(&[2.0, 4.0, 6.0]);
        assert_eq!(out, vec![0, 127, 255]);
    }

    #[test]
    fn test_intermediate_values_truncate() {
        assert_eq!(normalize_min_max(&[0.0, 1.0, 2.0, 0.1]), vec![0, 127, 255, 12]);
        assert_eq!(normalize_min_max(&[0.0, 0.999, 1.0]), vec![0, 254, 255]);
    }

    #[test]
    fn test_log_magnitude() {
        let spectrum = [Complex::new(3.0, 4.0), Complex::new(0.0, 0.0)];
        let logged = magnitude_map(&spectrum, true);
        assert!((logged[0] - 6.0f64.ln()).abs() < 1e-12);
        assert_eq!(logged[1], 0.0);
        let raw = magnitude_map(&spectrum, false);
        assert!((raw[0] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_range_is_flat() {
        assert_eq!(normalize_min_max(&[f64::NAN, f64::NAN]), vec![0, 0]);
    }

    proptest! {
        #[test]
        fn non_degenerate_map_hits_both_ends(values in prop::collection::vec(0.0f64..1e4, 2..300)) {
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assume!(max - min > 1e-6);

            let out = normalize_min_max(&values);
            prop_assert_eq!(out.len(), values.len());
            prop_assert!(out.contains(&0));
            prop_assert!(out.contains(&255));
        }
    }
}
