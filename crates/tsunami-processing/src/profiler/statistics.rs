//! Descriptive statistics for numeric columns.

use crate::types::{BoxPlotSummary, HistogramBin, NumericSummary};
use crate::utils::{mean, quantile};

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn calculate_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(variance.sqrt())
}

/// Adjusted Fisher-Pearson skewness, the estimator behind pandas' `skew()`.
///
/// `G1 = n / ((n - 1)(n - 2)) * sum(((x - mean) / s)^3)` with `s` the
/// sample standard deviation. Undefined below three values and for constant
/// columns.
pub(crate) fn calculate_skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let mean = mean(values)?;
    let std = calculate_std(values)?;
    if std == 0.0 {
        return None;
    }
    let n = n as f64;
    let cubed: f64 = values.iter().map(|v| ((v - mean) / std).powi(3)).sum();
    Some(n / ((n - 1.0) * (n - 2.0)) * cubed)
}

/// Equal-width histogram over `[min, max]`.
///
/// Every bin is half-open except the last, which includes `max`. A constant
/// column gets the range `[v - 0.5, v + 0.5]`.
pub(crate) fn build_histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins {
                hi
            } else {
                lo + width * (i + 1) as f64
            },
            count,
        })
        .collect()
}

/// Five-number summary with whiskers at the most extreme values inside
/// the 1.5 * IQR fences.
pub(crate) fn box_plot(sorted: &[f64]) -> Option<BoxPlotSummary> {
    let q1 = quantile(sorted, 0.25)?;
    let median = quantile(sorted, 0.5)?;
    let q3 = quantile(sorted, 0.75)?;
    let iqr = q3 - q1;
    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v >= lower_fence && *v <= upper_fence)
        .collect();
    let outlier_count = sorted.len() - inside.len();

    Some(BoxPlotSummary {
        lower_whisker: inside.first().copied().unwrap_or(q1),
        q1,
        median,
        q3,
        upper_whisker: inside.last().copied().unwrap_or(q3),
        outlier_count,
    })
}

/// Full numeric summary of a column's known values.
pub(crate) fn summarize(column: &str, values: &[f64], bins: usize) -> Option<NumericSummary> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let box_plot = box_plot(&sorted)?;

    Some(NumericSummary {
        column: column.to_string(),
        count: sorted.len(),
        mean: mean(&sorted)?,
        std: calculate_std(&sorted),
        min: *sorted.first()?,
        q1: box_plot.q1,
        median: box_plot.median,
        q3: box_plot.q3,
        max: *sorted.last()?,
        skewness: calculate_skewness(&sorted),
        histogram: build_histogram(&sorted, bins),
        box_plot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== calculate_std tests ====================

    #[test]
    fn test_calculate_std_basic() {
        // Mean 3, variance 10 / 4 = 2.5
        let std = calculate_std(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((std - 2.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_calculate_std_single_value() {
        assert_eq!(calculate_std(&[5.0]), None);
    }

    // ==================== calculate_skewness tests ====================

    #[test]
    fn test_skewness_symmetric_is_zero() {
        let skew = calculate_skewness(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!(skew.abs() < 1e-12);
    }

    #[test]
    fn test_skewness_matches_adjusted_estimator() {
        // pd.Series([1, 2, 3, 10]).skew() == 1.763632...
        let skew = calculate_skewness(&[1.0, 2.0, 3.0, 10.0]).unwrap();
        assert!((skew - 1.763632).abs() < 1e-5);
    }

    #[test]
    fn test_skewness_undefined_cases() {
        assert_eq!(calculate_skewness(&[1.0, 2.0]), None);
        assert_eq!(calculate_skewness(&[3.0, 3.0, 3.0]), None);
    }

    // ==================== histogram tests ====================

    #[test]
    fn test_histogram_counts_cover_all_values() {
        let values: Vec<f64> = (0..=10).map(f64::from).collect();
        let hist = build_histogram(&values, 10);
        assert_eq!(hist.len(), 10);
        assert_eq!(hist.iter().map(|b| b.count).sum::<usize>(), 11);
        // The max lands in the closed last bin
        assert_eq!(hist[9].count, 2);
        assert_eq!(hist[9].upper, 10.0);
    }

    #[test]
    fn test_histogram_constant_column() {
        let hist = build_histogram(&[2.0, 2.0], 4);
        assert_eq!(hist[0].lower, 1.5);
        assert_eq!(hist[3].upper, 2.5);
        assert_eq!(hist.iter().map(|b| b.count).sum::<usize>(), 2);
    }

    // ==================== box plot tests ====================

    #[test]
    fn test_box_plot_outliers() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 100.0];
        let summary = box_plot(&sorted).unwrap();
        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.q3, 4.0);
        assert_eq!(summary.outlier_count, 1);
        assert_eq!(summary.upper_whisker, 4.0);
        assert_eq!(summary.lower_whisker, 1.0);
    }

    #[test]
    fn test_summarize_empty_is_none() {
        assert!(summarize("Deaths", &[], 10).is_none());
    }

    #[test]
    fn test_summarize_fields() {
        let summary = summarize("Deaths", &[4.0, 0.0, 2.0], 2).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.min, 0.0);
        assert_eq!(summary.max, 4.0);
        assert_eq!(summary.mean, 2.0);
        assert_eq!(summary.median, 2.0);
        assert_eq!(summary.histogram.len(), 2);
    }
}
