//! Targeted single-row data patches.
//!
//! A patch fills a null in rows selected by equality conditions on other
//! columns, e.g. the one NEW ZEALAND event recorded without a location name.
//! Patches are only safe on the data they were written for, so a patch may
//! match at most its expected number of rows and the patched column must end
//! up complete. A patch with nothing to fix is skipped.

use polars::prelude::*;
use tracing::{debug, info};

use crate::cleaner::source_rows;
use crate::config::{DataPatch, FillValue};
use crate::error::{CleaningError, Result};
use crate::utils::{is_numeric_dtype, is_string_dtype, to_f64_values, to_key_strings};

/// Applies [`DataPatch`] rules with match-count validation.
pub struct PatchApplier;

impl PatchApplier {
    /// Apply all patches in order. Returns the number of values patched by
    /// each patch.
    ///
    /// # Errors
    ///
    /// [`CleaningError::DataShapeViolation`] when a patch matches more rows
    /// than expected, or when a patched column still has nulls afterwards.
    /// The message lists the affected input rows.
    pub fn apply_all(
        df: &mut DataFrame,
        patches: &[DataPatch],
        processing_steps: &mut Vec<String>,
    ) -> Result<Vec<usize>> {
        let mut counts = Vec::with_capacity(patches.len());
        for patch in patches {
            counts.push(Self::apply(df, patch, processing_steps)?);
        }

        // Leftover nulls in a patched column mean rows the patches did not
        // anticipate.
        let mut checked: Vec<&str> = Vec::new();
        for patch in patches {
            if checked.contains(&patch.column.as_str()) {
                continue;
            }
            checked.push(&patch.column);

            let nulls: Vec<bool> = df
                .column(&patch.column)?
                .as_materialized_series()
                .is_null()
                .into_iter()
                .map(|v| v.unwrap_or(false))
                .collect();
            let remaining = nulls.iter().filter(|n| **n).count();
            if remaining > 0 {
                let rows = source_rows(df, &nulls)?;
                return Err(CleaningError::DataShapeViolation {
                    column: patch.column.clone(),
                    reason: format!(
                        "{} missing values not covered by any patch (input rows {:?})",
                        remaining, rows
                    ),
                });
            }
        }

        let patched: usize = counts.iter().sum();
        if patched > 0 {
            info!("Stage E: applied {} data patches", patched);
        }
        Ok(counts)
    }

    /// Apply one patch after checking its match count.
    ///
    /// Zero matches is a no-op: the row the patch targets may be complete
    /// in this release of the export or removed by the validity filter.
    pub fn apply(
        df: &mut DataFrame,
        patch: &DataPatch,
        processing_steps: &mut Vec<String>,
    ) -> Result<usize> {
        let mask = Self::match_mask(df, patch)?;
        let matches = mask.iter().filter(|m| **m).count();

        if matches == 0 {
            debug!("No rows to patch: {}", Self::describe(patch));
            return Ok(0);
        }
        if matches > patch.expected_matches {
            let rows = source_rows(df, &mask)?;
            return Err(CleaningError::DataShapeViolation {
                column: patch.column.clone(),
                reason: format!(
                    "patch {} allows at most {} match(es), found {} (input rows {:?})",
                    Self::describe(patch),
                    patch.expected_matches,
                    matches,
                    rows
                ),
            });
        }

        let series = df
            .column(&patch.column)?
            .as_materialized_series()
            .clone();
        let updated = Self::fill_where(&series, &mask, &patch.value, &patch.column)?;
        df.replace(&patch.column, updated)?;

        debug!("Patched {} row(s): {}", matches, Self::describe(patch));
        processing_steps.push(format!(
            "Patched {} missing value(s) in '{}' with {}",
            matches, patch.column, patch.value
        ));
        Ok(matches)
    }

    /// Rows where the target is null and every condition holds.
    fn match_mask(df: &DataFrame, patch: &DataPatch) -> Result<Vec<bool>> {
        let target = df
            .column(&patch.column)
            .map_err(|_| CleaningError::ColumnNotFound(patch.column.clone()))?;
        let mut mask: Vec<bool> = target
            .as_materialized_series()
            .is_null()
            .into_iter()
            .map(|v| v.unwrap_or(false))
            .collect();

        for condition in &patch.when {
            let keys = to_key_strings(
                df.column(&condition.column)
                    .map_err(|_| CleaningError::ColumnNotFound(condition.column.clone()))?
                    .as_materialized_series(),
            )?;
            for (selected, key) in mask.iter_mut().zip(keys) {
                *selected = *selected && key.as_deref() == Some(condition.equals.as_str());
            }
        }

        Ok(mask)
    }

    fn fill_where(
        series: &Series,
        mask: &[bool],
        value: &FillValue,
        column: &str,
    ) -> Result<Series> {
        let name = series.name().clone();
        let all_null = series.null_count() == series.len();

        match value {
            FillValue::Text(text) if is_string_dtype(series.dtype()) || all_null => {
                let current = series.cast(&DataType::String)?;
                let values: Vec<Option<&str>> = current
                    .str()?
                    .into_iter()
                    .zip(mask)
                    .map(|(v, m)| if *m { Some(text.as_str()) } else { v })
                    .collect();
                Ok(Series::new(name, values))
            }
            FillValue::Int(v) if series.dtype().is_integer() => {
                let current = series.cast(&DataType::Int64)?;
                let values: Vec<Option<i64>> = current
                    .i64()?
                    .into_iter()
                    .zip(mask)
                    .map(|(cur, m)| if *m { Some(*v) } else { cur })
                    .collect();
                Ok(Series::new(name, values))
            }
            FillValue::Int(_) | FillValue::Float(_)
                if is_numeric_dtype(series.dtype()) || all_null =>
            {
                let fill = value.as_f64().unwrap_or_default();
                let values: Vec<Option<f64>> = to_f64_values(series)?
                    .into_iter()
                    .zip(mask)
                    .map(|(cur, m)| if *m { Some(fill) } else { cur })
                    .collect();
                Ok(Series::new(name, values))
            }
            other => Err(CleaningError::TypeConversionFailed {
                column: column.to_string(),
                target_type: other.type_name().to_string(),
                reason: format!("cannot patch a {} column with {}", series.dtype(), other),
            }),
        }
    }

    fn describe(patch: &DataPatch) -> String {
        let conditions: Vec<String> = patch
            .when
            .iter()
            .map(|c| format!("{} == \"{}\"", c.column, c.equals))
            .collect();
        if conditions.is_empty() {
            format!("'{}' := {}", patch.column, patch.value)
        } else {
            format!(
                "'{}' := {} where {}",
                patch.column,
                patch.value,
                conditions.join(" and ")
            )
        }
    }
}
