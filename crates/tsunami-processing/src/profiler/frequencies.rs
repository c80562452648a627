//! Frequency tables for categorical columns.

use polars::prelude::*;

use crate::types::{CategoryCount, CategoryFrequencies};

const COUNT_COLUMN: &str = "__frequency";

/// The `n` most frequent non-null values of a column.
///
/// Percentages are relative to all rows, nulls included. Ties are broken by
/// value so the output is stable.
pub(crate) fn top_categories(series: &Series, n: usize) -> PolarsResult<CategoryFrequencies> {
    let total = series.len();
    let known = series.cast(&DataType::String)?.drop_nulls();
    let counts = known.value_counts(false, false, COUNT_COLUMN.into(), false)?;

    let values = counts.column(known.name())?.as_materialized_series().clone();
    let frequencies = counts
        .column(COUNT_COLUMN)?
        .as_materialized_series()
        .cast(&DataType::UInt64)?;

    let mut ranked: Vec<(String, usize)> = values
        .str()?
        .into_iter()
        .zip(frequencies.u64()?)
        .filter_map(|(value, count)| Some((value?.to_string(), count? as usize)))
        .collect();
    let distinct_values = ranked.len();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let top = ranked
        .into_iter()
        .take(n)
        .map(|(value, count)| CategoryCount {
            value,
            count,
            percentage: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            },
        })
        .collect();

    Ok(CategoryFrequencies {
        column: series.name().to_string(),
        distinct_values,
        top,
    })
}
