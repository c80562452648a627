//! Data profiling module for the cleaned events table.
//!
//! This module provides the derived, read-only views behind the analysis:
//! - Column role partitioning (categorical vs numeric)
//! - Per-column null and cardinality profiles
//! - Numeric summaries (skewness, histogram bins, box-plot statistics)
//! - Top-N category frequencies
//! - Pearson correlation matrix

mod correlation;
mod frequencies;
mod statistics;

use polars::prelude::*;
use tracing::debug;

use crate::cleaner::SOURCE_ROW_COLUMN;
use crate::config::CleaningConfig;
use crate::error::Result;
use crate::types::{ColumnProfile, ColumnRole, DatasetProfile, MissingValueEntry};
use crate::utils::{dtype_label, is_numeric_dtype, known_f64_values, null_stats, to_f64_values};

use correlation::{build_correlations, strongest_pairs};
use frequencies::top_categories;
use statistics::summarize;

/// Knobs for [`DataProfiler::profile_dataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileOptions {
    /// Most frequent values listed per categorical column.
    pub top_n: usize,
    /// Histogram bins per numeric column.
    pub histogram_bins: usize,
    /// Strongest correlation pairs kept in the profile.
    pub strongest_pairs: usize,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            top_n: 5,
            histogram_bins: 10,
            strongest_pairs: 5,
        }
    }
}

impl ProfileOptions {
    pub fn from_config(config: &CleaningConfig) -> Self {
        Self {
            top_n: config.top_n_categories,
            histogram_bins: config.histogram_bins,
            ..Self::default()
        }
    }
}

/// Data profiler for the descriptive statistics stage.
pub struct DataProfiler;

impl DataProfiler {
    /// Profile a dataset.
    ///
    /// Columns listed in `categorical_columns`, plus every non-numeric
    /// column, are categorical; all other columns are numeric. Coded columns
    /// therefore never enter the numeric summaries or the correlation matrix.
    pub fn profile_dataset(
        df: &DataFrame,
        categorical_columns: &[String],
        options: &ProfileOptions,
    ) -> Result<DatasetProfile> {
        let (categorical, numeric) = Self::partition_columns(df, categorical_columns);

        let mut column_profiles = Vec::with_capacity(df.width());
        for name in Self::visible_columns(df) {
            let role = if categorical.contains(&name) {
                ColumnRole::Categorical
            } else {
                ColumnRole::Numeric
            };
            column_profiles.push(Self::profile_column(df, &name, role)?);
        }

        let mut numeric_summaries = Vec::with_capacity(numeric.len());
        let mut numeric_values = Vec::with_capacity(numeric.len());
        for name in &numeric {
            let series = df.column(name)?.as_materialized_series();
            let known = known_f64_values(series)?;
            if let Some(summary) = summarize(name, &known, options.histogram_bins) {
                debug!(
                    "{}: mean {:.3}, skew {:?}",
                    name, summary.mean, summary.skewness
                );
                numeric_summaries.push(summary);
            }
            numeric_values.push((name.clone(), to_f64_values(series)?));
        }

        let mut category_frequencies = Vec::with_capacity(categorical.len());
        for name in &categorical {
            let series = df.column(name)?.as_materialized_series();
            category_frequencies.push(top_categories(series, options.top_n)?);
        }

        let correlations = build_correlations(&numeric_values);
        let strongest_correlations = strongest_pairs(&correlations, options.strongest_pairs);

        Ok(DatasetProfile {
            shape: (df.height(), column_profiles.len()),
            column_profiles,
            categorical_columns: categorical,
            numeric_columns: numeric,
            numeric_summaries,
            category_frequencies,
            correlations,
            strongest_correlations,
        })
    }

    /// Split columns into (categorical, numeric), keeping frame order.
    pub fn partition_columns(
        df: &DataFrame,
        categorical_columns: &[String],
    ) -> (Vec<String>, Vec<String>) {
        let mut categorical = Vec::new();
        let mut numeric = Vec::new();
        for name in Self::visible_columns(df) {
            let is_numeric = df
                .column(&name)
                .map(|c| is_numeric_dtype(c.dtype()))
                .unwrap_or(false);
            if categorical_columns.contains(&name) || !is_numeric {
                categorical.push(name);
            } else {
                numeric.push(name);
            }
        }
        (categorical, numeric)
    }

    /// Null count and percentage for every column, in frame order.
    pub fn missing_report(df: &DataFrame) -> Vec<MissingValueEntry> {
        df.get_columns()
            .iter()
            .filter(|c| c.name().as_str() != SOURCE_ROW_COLUMN)
            .map(|c| {
                let (null_count, null_percentage) = null_stats(c.as_materialized_series());
                MissingValueEntry {
                    column: c.name().to_string(),
                    null_count,
                    null_percentage,
                }
            })
            .collect()
    }

    fn profile_column(df: &DataFrame, name: &str, role: ColumnRole) -> Result<ColumnProfile> {
        let series = df.column(name)?.as_materialized_series();
        let (null_count, null_percentage) = null_stats(series);
        let unique_count = series.drop_nulls().n_unique()?;

        Ok(ColumnProfile {
            name: name.to_string(),
            dtype: dtype_label(series.dtype()).to_string(),
            role,
            null_count,
            null_percentage,
            unique_count,
        })
    }

    fn visible_columns(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != SOURCE_ROW_COLUMN)
            .map(|name| name.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        df![
            "Year" => [1946i64, 1960, 2004, 2011],
            "Tsunami Cause Code" => [1i64, 1, 1, 3],
            "Country" => ["USA", "CHILE", "INDONESIA", "JAPAN"],
            "Maximum Water Height (m)" => [35.0, 25.0, 50.9, 39.0],
            "Deaths" => [165i64, 1000, 227899, 18428],
        ]
        .unwrap()
    }

    #[test]
    fn test_partition_uses_declared_roles() {
        let (categorical, numeric) =
            DataProfiler::partition_columns(&sample(), &["Tsunami Cause Code".to_string()]);
        assert_eq!(categorical, vec!["Tsunami Cause Code", "Country"]);
        assert_eq!(numeric, vec!["Year", "Maximum Water Height (m)", "Deaths"]);
    }

    #[test]
    fn test_profile_dataset() {
        let profile = DataProfiler::profile_dataset(
            &sample(),
            &["Tsunami Cause Code".to_string()],
            &ProfileOptions::default(),
        )
        .unwrap();

        assert_eq!(profile.shape, (4, 5));
        assert_eq!(profile.numeric_summaries.len(), 3);
        assert_eq!(profile.category_frequencies.len(), 2);
        assert_eq!(profile.correlations.columns.len(), 3);

        let cause = profile.categories("Tsunami Cause Code").unwrap();
        assert_eq!(cause.top[0].value, "1");
        assert!((cause.top[0].percentage - 75.0).abs() < 1e-9);

        let deaths = profile.numeric("Deaths").unwrap();
        assert!(deaths.skewness.unwrap() > 1.0);
        assert_eq!(profile.column_profiles[2].role, ColumnRole::Categorical);
    }

    #[test]
    fn test_source_row_column_is_hidden() {
        let df = sample()
            .with_row_index(SOURCE_ROW_COLUMN.into(), None)
            .unwrap();
        let profile = DataProfiler::profile_dataset(&df, &[], &ProfileOptions::default()).unwrap();
        assert_eq!(profile.shape.1, 5);
        assert!(!profile.numeric_columns.iter().any(|c| c == SOURCE_ROW_COLUMN));
        assert_eq!(DataProfiler::missing_report(&df).len(), 5);
    }

    #[test]
    fn test_missing_report() {
        let df = df![
            "Area" => [Some("HI"), None],
            "Deaths" => [Some(1i64), Some(2)],
        ]
        .unwrap();
        let report = DataProfiler::missing_report(&df);
        assert_eq!(report[0].null_count, 1);
        assert_eq!(report[0].null_percentage, 50.0);
        assert_eq!(report[1].null_count, 0);
    }
}
