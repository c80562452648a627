//! Shared utilities for the cleaning pipeline.
//!
//! Series conversions, null filling and the polars-backed order statistics
//! used by both the imputers and the profiler. NaN counts as missing
//! everywhere, the same as null.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a string type.
#[inline]
pub fn is_string_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String)
}

/// Short, stable name for a dtype as shown in summaries.
pub fn dtype_label(dtype: &DataType) -> &'static str {
    match dtype {
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => "int",
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => "uint",
        DataType::Float32 | DataType::Float64 => "float",
        DataType::String => "string",
        DataType::Boolean => "bool",
        DataType::Null => "null",
        _ => "other",
    }
}

// =============================================================================
// Series Extraction Utilities
// =============================================================================

/// Values of a numeric Series as `Option<f64>`, nulls preserved and NaN
/// read as null.
pub fn to_f64_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Non-null, non-NaN values of a numeric Series.
pub fn known_f64_values(series: &Series) -> PolarsResult<Vec<f64>> {
    Ok(to_f64_values(series)?.into_iter().flatten().collect())
}

/// Number of NaN values; zero for non-float Series.
pub fn nan_count(series: &Series) -> PolarsResult<usize> {
    if !series.dtype().is_float() {
        return Ok(0);
    }
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().flatten().filter(|v| v.is_nan()).count())
}

/// A Float64 copy of a numeric Series with NaN replaced by null.
pub fn nan_as_null(series: &Series) -> PolarsResult<Series> {
    let values: Float64Chunked = to_f64_values(series)?.into_iter().collect();
    Ok(values.with_name(series.name().clone()).into_series())
}

/// Values of any Series in string form, nulls preserved.
///
/// Used for group keys and equality conditions, where `3` and `"3"` must
/// compare equal.
pub fn to_key_strings(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let cast = series.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series, returning a Float64 Series.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let values = to_f64_values(series)?;
    let filled: Float64Chunked = values
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();
    Ok(filled.with_name(series.name().clone()).into_series())
}

/// Fill null values in an integer Series, returning an Int64 Series.
pub fn fill_int_nulls(series: &Series, fill_value: i64) -> PolarsResult<Series> {
    let cast = series.cast(&DataType::Int64)?;
    let filled: Int64Chunked = cast
        .i64()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();
    Ok(filled.with_name(series.name().clone()).into_series())
}

/// Fill null values in a string Series.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let filled: StringChunked = series
        .str()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();
    Ok(filled.with_name(series.name().clone()).into_series())
}

// =============================================================================
// Order Statistics
// =============================================================================

fn as_chunked(values: &[f64]) -> Float64Chunked {
    Float64Chunked::from_slice(PlSmallStr::EMPTY, values)
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    as_chunked(values).mean()
}

/// Quantile with linear interpolation between closest ranks, `None` for an
/// empty slice.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    as_chunked(values)
        .quantile(q.clamp(0.0, 1.0), QuantileMethod::Linear)
        .unwrap_or(None)
}

/// Median, `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    as_chunked(values).median()
}

/// Null count and percentage of a Series.
pub fn null_stats(series: &Series) -> (usize, f64) {
    let nulls = series.null_count();
    let pct = if series.is_empty() {
        0.0
    } else {
        nulls as f64 / series.len() as f64 * 100.0
    };
    (nulls, pct)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_dtype_label() {
        assert_eq!(dtype_label(&DataType::Int64), "int");
        assert_eq!(dtype_label(&DataType::Float64), "float");
        assert_eq!(dtype_label(&DataType::String), "string");
    }

    #[test]
    fn test_known_f64_values_skips_nulls() {
        let series = Series::new("m".into(), &[Some(1i64), None, Some(3)]);
        assert_eq!(known_f64_values(&series).unwrap(), vec![1.0, 3.0]);
    }

    #[test]
    fn test_nan_is_treated_as_missing() {
        let series = Series::new("m".into(), &[Some(5.0), Some(f64::NAN), None, Some(7.0)]);
        assert_eq!(known_f64_values(&series).unwrap(), vec![5.0, 7.0]);
        assert_eq!(nan_count(&series).unwrap(), 1);

        let cleaned = nan_as_null(&series).unwrap();
        assert_eq!(cleaned.null_count(), 2);
        assert_eq!(cleaned.name().as_str(), "m");

        let filled = fill_numeric_nulls(&series, 6.0).unwrap();
        let values: Vec<Option<f64>> = filled.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(5.0), Some(6.0), Some(6.0), Some(7.0)]);
    }

    #[test]
    fn test_to_key_strings() {
        let series = Series::new("code".into(), &[Some(3i64), None]);
        let keys = to_key_strings(&series).unwrap();
        assert_eq!(keys, vec![Some("3".to_string()), None]);
    }

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("test".into(), &[Some(1.0), None, Some(3.0)]);
        let filled = fill_numeric_nulls(&series, 0.0).unwrap();

        assert_eq!(filled.null_count(), 0);
        assert_eq!(filled.name().as_str(), "test");
        assert_eq!(filled.get(1).unwrap().try_extract::<f64>().unwrap(), 0.0);
    }

    #[test]
    fn test_fill_int_nulls() {
        let series = Series::new("code".into(), &[None, Some(2i64)]);
        let filled = fill_int_nulls(&series, 1).unwrap();
        assert_eq!(filled.dtype(), &DataType::Int64);
        assert_eq!(filled.get(0).unwrap().try_extract::<i64>().unwrap(), 1);
    }

    #[test]
    fn test_fill_string_nulls() {
        let series = Series::new("Area".into(), &[Some("HI"), None]);
        let filled = fill_string_nulls(&series, "NA").unwrap();
        assert_eq!(filled.str().unwrap().get(1), Some("NA"));
    }

    #[test]
    fn test_quantiles() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile(&values, 0.5), Some(2.5));
        assert_eq!(quantile(&values, 0.25), Some(1.75));
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[9.0, 1.0, 5.0]), Some(5.0));
        assert_eq!(mean(&[5.0, 7.0]), Some(6.0));
    }

    #[test]
    fn test_null_stats() {
        let series = Series::new("x".into(), &[Some(1.0), None, None, Some(2.0)]);
        assert_eq!(null_stats(&series), (2, 50.0));
    }
}
