//! Interpolated percentile thresholds.
//!
//! Every selection stage in the pipeline keeps "everything at or above the
//! p-th percentile of this document's scores". The percentile is computed with
//! linear interpolation between the two closest order statistics, so the
//! cutoff need not be an observed value and ties at the cutoff are kept.

use ordered_float::OrderedFloat;

/// The `p`-th percentile (0..=100) of `values`, or `None` for an empty slice.
///
/// `p` outside `0..=100` is clamped.
pub fn percentile(values: &[f32], p: f32) -> Option<f32> {
    if values.is_empty() {
        return None;
    }

    let mut sorted: Vec<OrderedFloat<f32>> = values.iter().copied().map(OrderedFloat).collect();
    sorted.sort_unstable();

    let p = f64::from(p.clamp(0.0, 100.0));
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    let a = sorted[lo].0;
    let b = sorted[hi].0;
    let value = (f64::from(a) + (f64::from(b) - f64::from(a)) * frac) as f32;

    // Rounding must never push the cutoff past the upper order statistic.
    Some(value.min(b))
}

/// Indices of every value at or above the `p`-th percentile, in input order.
pub fn select_at_or_above(values: &[f32], p: f32) -> Vec<usize> {
    let Some(cutoff) = percentile(values, p) else {
        return Vec::new();
    };
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v >= cutoff)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 50.0), Some(3.0));
        assert_eq!(percentile(&values, 100.0), Some(5.0));
        // rank = 0.9 * 4 = 3.6 -> 4 + 0.6 * (5 - 4)
        let p90 = percentile(&values, 90.0).unwrap();
        assert!((p90 - 4.6).abs() < 1e-5);
    }

    #[test]
    fn test_percentile_ignores_input_order() {
        let a = percentile(&[5.0, 1.0, 3.0], 75.0);
        let b = percentile(&[1.0, 3.0, 5.0], 75.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_percentile_empty_and_single() {
        assert_eq!(percentile(&[], 50.0), None);
        assert_eq!(percentile(&[0.42], 90.0), Some(0.42));
        assert!(select_at_or_above(&[], 10.0).is_empty());
    }

    #[test]
    fn test_zero_percentile_selects_everything() {
        let values = [0.3, -0.2, 0.9, 0.1];
        assert_eq!(select_at_or_above(&values, 0.0), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_ties_at_cutoff_are_included() {
        let values = [0.5, 0.9, 0.9, 0.9, 0.1];
        // Cutoff lands on 0.9; all three ties survive.
        assert_eq!(select_at_or_above(&values, 80.0), vec![1, 2, 3]);
    }

    #[test]
    fn test_selection_lower_bound() {
        let values: Vec<f32> = (0..37).map(|i| ((i * 7919) % 101) as f32 / 101.0).collect();
        for p in [0.0f32, 10.0, 25.0, 50.0, 75.0, 80.0, 90.0, 99.0, 100.0] {
            let selected = select_at_or_above(&values, p);
            let bound = (values.len() as f32 * (100.0 - p) / 100.0).floor() as usize;
            assert!(
                selected.len() >= bound,
                "p={} selected {} < bound {}",
                p,
                selected.len(),
                bound
            );
            assert!(!selected.is_empty());
        }
    }
}
