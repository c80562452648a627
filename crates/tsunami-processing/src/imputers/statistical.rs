//! Statistical and constant imputation.
//!
//! Median fills for physical measurements (Stage D) and typed constant fills
//! for columns where a missing value has a known meaning (Stage E).

use polars::prelude::*;
use tracing::{debug, info};

use crate::config::{ConstantFill, FillValue};
use crate::error::{CleaningError, Result};
use crate::utils::{
    fill_int_nulls, fill_numeric_nulls, fill_string_nulls, is_numeric_dtype, is_string_dtype,
    nan_as_null, nan_count,
};

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill each column's nulls with that column's median.
    ///
    /// Every median is taken from the frame as passed in, before any column
    /// is filled, so the fills never feed into each other. Callers pass the
    /// frame after the validity filter so the medians describe retained
    /// events only. Columns come out as Float64.
    pub fn apply_median_fills(
        df: &mut DataFrame,
        columns: &[String],
        processing_steps: &mut Vec<String>,
    ) -> Result<Vec<(String, f64, usize)>> {
        let mut plan = Vec::with_capacity(columns.len());
        for column in columns {
            let series = Self::series(df, column)?;
            let nulls = series.null_count() + nan_count(series)?;
            let median_val = nan_as_null(series)?.median();
            if nulls > 0 && median_val.is_none() {
                return Err(CleaningError::NoValidValues(column.clone()));
            }
            plan.push((column.clone(), median_val, nulls));
        }

        let mut applied = Vec::with_capacity(plan.len());
        for (column, median_val, nulls) in plan {
            let series = Self::series(df, &column)?.clone();
            let filled = match median_val {
                Some(m) => fill_numeric_nulls(&series, m)?,
                // No nulls and no values: only normalize the type
                None => series.cast(&DataType::Float64)?,
            };
            df.replace(&column, filled)?;

            if let Some(m) = median_val {
                debug!("{}: median {} used for {} nulls", column, m, nulls);
                processing_steps.push(format!(
                    "Filled {} missing values in '{}' with median {:.4}",
                    nulls, column, m
                ));
                applied.push((column, m, nulls));
            }
        }

        info!("Stage D: median-filled {} columns", applied.len());
        Ok(applied)
    }

    /// Fill a column's nulls with a typed constant. Returns the number of
    /// values filled.
    ///
    /// Text fills require a string column and numeric fills a numeric one.
    /// A column with no values at all takes the fill's type.
    pub fn apply_constant_fill(
        df: &mut DataFrame,
        fill: &ConstantFill,
        processing_steps: &mut Vec<String>,
    ) -> Result<usize> {
        let series = Self::series(df, &fill.column)?.clone();
        let nulls = series.null_count() + nan_count(&series)?;
        let all_null = nulls == series.len();
        let dtype = series.dtype().clone();

        let filled = match &fill.value {
            FillValue::Text(text) if is_string_dtype(&dtype) || all_null => {
                let as_text = series.cast(&DataType::String)?;
                fill_string_nulls(&as_text, text)?
            }
            FillValue::Int(v) if dtype.is_integer() || (all_null && !is_numeric_dtype(&dtype)) => {
                fill_int_nulls(&series, *v)?
            }
            FillValue::Int(_) | FillValue::Float(_) if is_numeric_dtype(&dtype) || all_null => {
                let value = fill.value.as_f64().unwrap_or_default();
                fill_numeric_nulls(&series, value)?
            }
            other => {
                return Err(CleaningError::TypeConversionFailed {
                    column: fill.column.clone(),
                    target_type: other.type_name().to_string(),
                    reason: format!("cannot fill a {} column with {}", dtype, other),
                });
            }
        };
        df.replace(&fill.column, filled)?;

        debug!("{}: {} nulls filled with {}", fill.column, nulls, fill.value);
        processing_steps.push(format!(
            "Filled {} missing values in '{}' with {}",
            nulls, fill.column, fill.value
        ));
        Ok(nulls)
    }

    fn series<'a>(df: &'a DataFrame, column: &str) -> Result<&'a Series> {
        Ok(df
            .column(column)
            .map_err(|_| CleaningError::ColumnNotFound(column.to_string()))?
            .as_materialized_series())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_f64(df: &DataFrame, column: &str, row: usize) -> f64 {
        df.column(column)
            .unwrap()
            .get(row)
            .unwrap()
            .try_extract::<f64>()
            .unwrap()
    }

    #[test]
    fn test_median_fill() {
        let mut df = df![
            "Earthquake Magnitude" => [Some(5.0), Some(7.0), None, Some(6.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let applied = StatisticalImputer::apply_median_fills(
            &mut df,
            &["Earthquake Magnitude".to_string()],
            &mut steps,
        )
        .unwrap();

        assert_eq!(applied, vec![("Earthquake Magnitude".to_string(), 6.0, 1)]);
        assert_eq!(get_f64(&df, "Earthquake Magnitude", 2), 6.0);
        assert!(steps[0].contains("median"));
    }

    #[test]
    fn test_median_fill_treats_nan_as_missing() {
        let mut df =
            df!["Earthquake Magnitude" => [Some(5.0), Some(f64::NAN), None, Some(7.0)]].unwrap();
        let mut steps = Vec::new();
        let applied = StatisticalImputer::apply_median_fills(
            &mut df,
            &["Earthquake Magnitude".to_string()],
            &mut steps,
        )
        .unwrap();

        assert_eq!(applied, vec![("Earthquake Magnitude".to_string(), 6.0, 2)]);
        assert_eq!(get_f64(&df, "Earthquake Magnitude", 1), 6.0);
        assert_eq!(get_f64(&df, "Earthquake Magnitude", 2), 6.0);
        let mags = df.column("Earthquake Magnitude").unwrap().f64().unwrap();
        assert!(mags.into_iter().flatten().all(|v| !v.is_nan()));
    }

    #[test]
    fn test_median_fill_promotes_integer_column() {
        let mut df = df!["Tsunami Intensity" => [Some(1i64), None, Some(4)]].unwrap();
        let mut steps = Vec::new();
        StatisticalImputer::apply_median_fills(
            &mut df,
            &["Tsunami Intensity".to_string()],
            &mut steps,
        )
        .unwrap();
        let col = df.column("Tsunami Intensity").unwrap();
        assert_eq!(col.dtype(), &DataType::Float64);
        assert_eq!(get_f64(&df, "Tsunami Intensity", 1), 2.5);
    }

    #[test]
    fn test_median_undefined_with_nulls_fails() {
        let mut df = df!["Focal Depth (km)" => [None::<f64>, None]].unwrap();
        let mut steps = Vec::new();
        let err = StatisticalImputer::apply_median_fills(
            &mut df,
            &["Focal Depth (km)".to_string()],
            &mut steps,
        )
        .unwrap_err();
        assert!(matches!(err, CleaningError::NoValidValues(c) if c == "Focal Depth (km)"));
    }

    #[test]
    fn test_medians_computed_before_any_fill() {
        let mut df = df![
            "a" => [Some(1.0), None, Some(3.0)],
            "b" => [Some(10.0), Some(20.0), None],
        ]
        .unwrap();
        let mut steps = Vec::new();
        let applied = StatisticalImputer::apply_median_fills(
            &mut df,
            &["a".to_string(), "b".to_string()],
            &mut steps,
        )
        .unwrap();
        assert_eq!(applied[0].1, 2.0);
        assert_eq!(applied[1].1, 15.0);
    }

    #[test]
    fn test_constant_fill_text() {
        let mut df = df!["Area" => [Some("HI"), None, None]].unwrap();
        let mut steps = Vec::new();
        let filled = StatisticalImputer::apply_constant_fill(
            &mut df,
            &ConstantFill::new("Area", FillValue::Text("NA".to_string())),
            &mut steps,
        )
        .unwrap();

        assert_eq!(filled, 2);
        assert_eq!(df.column("Area").unwrap().str().unwrap().get(2), Some("NA"));
    }

    #[test]
    fn test_constant_fill_keeps_integer_codes() {
        let mut df = df!["Damage Description" => [Some(3i64), None]].unwrap();
        let mut steps = Vec::new();
        StatisticalImputer::apply_constant_fill(
            &mut df,
            &ConstantFill::new("Damage Description", FillValue::Int(1)),
            &mut steps,
        )
        .unwrap();

        let col = df.column("Damage Description").unwrap();
        assert_eq!(col.dtype(), &DataType::Int64);
        assert_eq!(col.i64().unwrap().get(1), Some(1));
    }

    #[test]
    fn test_constant_fill_float() {
        let mut df = df!["Damage ($Mil)" => [Some(1.5), None]].unwrap();
        let mut steps = Vec::new();
        StatisticalImputer::apply_constant_fill(
            &mut df,
            &ConstantFill::new("Damage ($Mil)", FillValue::Float(0.0)),
            &mut steps,
        )
        .unwrap();
        assert_eq!(get_f64(&df, "Damage ($Mil)", 1), 0.0);
    }

    #[test]
    fn test_constant_fill_all_null_column_takes_fill_type() {
        // An all-empty column is read as string
        let mut df = df!["Damage ($Mil)" => [None::<&str>, None]].unwrap();
        let mut steps = Vec::new();
        StatisticalImputer::apply_constant_fill(
            &mut df,
            &ConstantFill::new("Damage ($Mil)", FillValue::Float(0.0)),
            &mut steps,
        )
        .unwrap();
        assert_eq!(df.column("Damage ($Mil)").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_constant_fill_type_mismatch() {
        let mut df = df!["Deaths" => [Some(1i64), None]].unwrap();
        let mut steps = Vec::new();
        let err = StatisticalImputer::apply_constant_fill(
            &mut df,
            &ConstantFill::new("Deaths", FillValue::Text("none".to_string())),
            &mut steps,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "TYPE_CONVERSION_FAILED");
    }
}
