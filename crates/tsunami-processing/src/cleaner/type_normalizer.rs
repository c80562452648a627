//! Type normalization for count-like and coded columns.
//!
//! Count columns become non-null `Int64` with missing values read as zero.
//! Coded columns become nullable `Int64` codes; their categorical role is
//! carried by the configuration rather than by the storage type.

use polars::prelude::*;
use tracing::debug;

use crate::error::{CleaningError, Result};

/// Type normalizer for Stage B.
pub struct TypeNormalizer;

impl TypeNormalizer {
    /// Normalize the configured integer and categorical columns.
    pub fn normalize(
        &self,
        mut df: DataFrame,
        int_columns: &[String],
        category_columns: &[String],
        processing_steps: &mut Vec<String>,
    ) -> Result<DataFrame> {
        for column in int_columns {
            let series = Self::numeric_view(&df, column, "Int64")?;
            let zero_filled = series.null_count();
            let ints = Self::to_int_counts(&series, column)?;
            df.with_column(ints)?;

            debug!("{}: {} nulls read as 0, cast to Int64", column, zero_filled);
            processing_steps.push(format!(
                "Converted '{}' to integer ({} missing values set to 0)",
                column, zero_filled
            ));
        }

        for column in category_columns {
            let series = Self::numeric_view(&df, column, "categorical code")?;
            let codes = Self::to_codes(&series, column)?;
            let distinct = codes.drop_nulls().n_unique()?;
            df.with_column(codes)?;

            debug!("{}: {} distinct codes", column, distinct);
            processing_steps.push(format!(
                "Converted '{}' to categorical codes ({} distinct)",
                column, distinct
            ));
        }

        Ok(df)
    }

    /// Read a column as Float64, failing on values that are not numbers.
    fn numeric_view(df: &DataFrame, column: &str, target: &str) -> Result<Series> {
        let series = df
            .column(column)
            .map_err(|_| CleaningError::ColumnNotFound(column.to_string()))?
            .as_materialized_series();

        series
            .strict_cast(&DataType::Float64)
            .map_err(|e| CleaningError::TypeConversionFailed {
                column: column.to_string(),
                target_type: target.to_string(),
                reason: e.to_string(),
            })
    }

    /// Nulls (and NaN) become 0, fractions truncate toward zero.
    fn to_int_counts(series: &Series, column: &str) -> Result<Series> {
        let mut values = Vec::with_capacity(series.len());
        for v in series.f64()?.into_iter() {
            let v = match v {
                Some(v) if v.is_nan() => 0.0,
                Some(v) => v,
                None => 0.0,
            };
            if !v.is_finite() {
                return Err(CleaningError::TypeConversionFailed {
                    column: column.to_string(),
                    target_type: "Int64".to_string(),
                    reason: format!("value {} is not finite", v),
                });
            }
            values.push(v.trunc() as i64);
        }
        Ok(Series::new(series.name().clone(), values))
    }

    /// Whole numbers become codes, nulls stay null, anything else fails.
    fn to_codes(series: &Series, column: &str) -> Result<Series> {
        let mut codes = Vec::with_capacity(series.len());
        for v in series.f64()?.into_iter() {
            match v {
                None => codes.push(None),
                Some(v) if v.is_nan() => codes.push(None),
                Some(v) if v.is_finite() && v.fract() == 0.0 => codes.push(Some(v as i64)),
                Some(v) => {
                    return Err(CleaningError::TypeConversionFailed {
                        column: column.to_string(),
                        target_type: "categorical code".to_string(),
                        reason: format!("value {} is not a whole-number code", v),
                    });
                }
            }
        }
        Ok(Series::new(series.name().clone(), codes))
    }
}
