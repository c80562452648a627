//! Structural cleaning of the events table.
//!
//! This module provides:
//! - Column pruning (Stage A)
//! - Type normalization of count and coded columns (Stage B)
//! - The event validity filter (Stage C)
//! - Source row tracking and index reset (Stage G)

mod type_normalizer;

pub use type_normalizer::TypeNormalizer;

use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{CleaningError, Result, ResultExt};

/// Name of the private column carrying each row's position in the input.
///
/// Attached before Stage A and removed by [`DataCleaner::reset_index`].
pub const SOURCE_ROW_COLUMN: &str = "__source_row";

/// Data cleaner for the structural stages.
pub struct DataCleaner;

impl DataCleaner {
    /// Tag every row with its zero-based position in the input.
    pub fn attach_source_rows(&self, df: DataFrame) -> Result<DataFrame> {
        df.with_row_index(SOURCE_ROW_COLUMN.into(), None)
            .context("Attaching source row numbers")
    }

    /// Remove the configured low-value columns.
    ///
    /// Every listed column must be present.
    pub fn prune_columns(
        &self,
        df: DataFrame,
        drop_columns: &[String],
    ) -> Result<(DataFrame, Vec<String>)> {
        let mut steps = Vec::new();

        if let Some(missing) = drop_columns
            .iter()
            .find(|c| df.get_column_index(c.as_str()).is_none())
        {
            return Err(CleaningError::ColumnNotFound(missing.clone()));
        }

        let before = df.width();
        let names: Vec<PlSmallStr> = drop_columns.iter().map(|s| s.as_str().into()).collect();
        let df = df.drop_many(names);

        debug!("Dropped columns: {:?}", drop_columns);
        info!(
            "Stage A: dropped {} columns, {} remain",
            before - df.width(),
            df.width()
        );
        steps.push(format!(
            "Dropped {} low-value columns: {}",
            drop_columns.len(),
            drop_columns.join(", ")
        ));

        Ok((df, steps))
    }

    /// Keep only rows whose validity code is one of `valid_codes`.
    ///
    /// Rows with a missing code are discarded as well. Returns the filtered
    /// frame and the number of rows removed.
    pub fn filter_valid_events(
        &self,
        df: DataFrame,
        validity_column: &str,
        valid_codes: &[i64],
    ) -> Result<(DataFrame, usize)> {
        let codes = df
            .column(validity_column)
            .map_err(|_| CleaningError::ColumnNotFound(validity_column.to_string()))?
            .as_materialized_series()
            .cast(&DataType::Int64)
            .context(format!("Reading validity codes from '{}'", validity_column))?;

        let keep: Vec<bool> = codes
            .i64()?
            .into_iter()
            .map(|code| code.is_some_and(|c| valid_codes.contains(&c)))
            .collect();
        let mask = BooleanChunked::from_slice("valid_event".into(), &keep);

        let before = df.height();
        let df = df.filter(&mask)?;
        let removed = before - df.height();

        info!(
            "Stage C: kept {} of {} events with validity in {:?}",
            df.height(),
            before,
            valid_codes
        );
        if df.height() == 0 {
            warn!("No events passed the validity filter");
        }

        Ok((df, removed))
    }

    /// Discard the source row column, leaving a dense `0..n` row order.
    pub fn reset_index(&self, df: DataFrame) -> Result<DataFrame> {
        let df = if df.get_column_index(SOURCE_ROW_COLUMN).is_some() {
            df.drop(SOURCE_ROW_COLUMN)?
        } else {
            df
        };
        debug!("Stage G: index reset over {} rows", df.height());
        Ok(df)
    }
}

/// Input row numbers of the rows selected by `mask`.
///
/// Falls back to current positions when source rows are not tracked.
pub fn source_rows(df: &DataFrame, mask: &[bool]) -> Result<Vec<u64>> {
    let positions: Vec<Option<u64>> = match df.column(SOURCE_ROW_COLUMN) {
        Ok(col) => {
            let cast = col.as_materialized_series().cast(&DataType::UInt64)?;
            cast.u64()?.into_iter().collect()
        }
        Err(_) => (0..df.height() as u64).map(Some).collect(),
    };

    Ok(positions
        .into_iter()
        .zip(mask)
        .filter(|(_, selected)| **selected)
        .filter_map(|(row, _)| row)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_columns() {
        let df = df![
            "Id" => [1i64, 2],
            "Year" => [1946i64, 1960],
            "Vol" => [None::<f64>, None],
        ]
        .unwrap();

        let (df, steps) = DataCleaner
            .prune_columns(df, &["Id".to_string(), "Vol".to_string()])
            .unwrap();

        let names: Vec<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["Year"]);
        assert!(steps[0].contains("Dropped 2"));
    }

    #[test]
    fn test_prune_missing_column_fails() {
        let df = df!["Year" => [1946i64]].unwrap();
        let err = DataCleaner
            .prune_columns(df, &["More Info".to_string()])
            .unwrap_err();
        assert!(matches!(err, CleaningError::ColumnNotFound(c) if c == "More Info"));
    }

    #[test]
    fn test_filter_valid_events() {
        let df = df![
            "Tsunami Event Validity" => [Some(4i64), Some(-1), Some(2), None, Some(0), Some(3)],
            "Year" => [1i64, 2, 3, 4, 5, 6],
        ]
        .unwrap();

        let (df, removed) = DataCleaner
            .filter_valid_events(df, "Tsunami Event Validity", &[2, 3, 4])
            .unwrap();

        assert_eq!(removed, 3);
        let years: Vec<i64> = df
            .column("Year")
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(years, vec![1, 3, 6]);
    }

    #[test]
    fn test_source_rows_survive_filter_and_reset_removes_them() {
        let df = df![
            "Tsunami Event Validity" => [1i64, 4, 4],
        ]
        .unwrap();
        let df = DataCleaner.attach_source_rows(df).unwrap();
        let (df, _) = DataCleaner
            .filter_valid_events(df, "Tsunami Event Validity", &[4])
            .unwrap();

        assert_eq!(source_rows(&df, &[false, true]).unwrap(), vec![2]);

        let df = DataCleaner.reset_index(df).unwrap();
        assert!(df.get_column_index(SOURCE_ROW_COLUMN).is_none());
        assert_eq!(df.height(), 2);
    }
}
