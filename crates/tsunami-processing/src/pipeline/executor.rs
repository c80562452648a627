//! Stage executor.
//!
//! Runs the mutating stages A through G one at a time and records what each
//! did in the run summary. Ordering, progress and cancellation belong to
//! [`Pipeline`](super::Pipeline).

use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::cleaner::{DataCleaner, TypeNormalizer};
use crate::config::CleaningConfig;
use crate::error::Result;
use crate::imputers::{CoordinateImputer, PatchApplier, StatisticalImputer};
use crate::types::{ActionType, CleaningAction, CleaningSummary};

/// Share of removed rows above which the summary carries a warning.
const HIGH_ROW_LOSS_PERCENT: f32 = 30.0;

/// Executes the cleaning stages on an exclusively owned frame.
pub struct CleaningExecutor {
    cleaner: DataCleaner,
    normalizer: TypeNormalizer,
}

impl Default for CleaningExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CleaningExecutor {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
            normalizer: TypeNormalizer,
        }
    }

    /// Stage A: drop the configured columns.
    pub fn prune_columns(
        &self,
        df: DataFrame,
        config: &CleaningConfig,
        summary: &mut CleaningSummary,
        processing_steps: &mut Vec<String>,
    ) -> Result<DataFrame> {
        let (df, steps) = self.cleaner.prune_columns(df, &config.drop_columns)?;
        processing_steps.extend(steps);

        for column in &config.drop_columns {
            if let Some(col_summary) = summary.column_mut(column) {
                col_summary.was_removed = true;
                col_summary.removal_reason = Some("Listed in drop_columns".to_string());
            }
        }
        if !config.drop_columns.is_empty() {
            summary.add_action(
                CleaningAction::new(
                    ActionType::ColumnRemoved,
                    "dataset",
                    format!("Dropped {} low-value columns", config.drop_columns.len()),
                )
                .with_details(config.drop_columns.join(", ")),
            );
        }
        Ok(df)
    }

    /// Stage B: zero-fill and integer-cast counts, code categorical columns.
    pub fn normalize_types(
        &self,
        df: DataFrame,
        config: &CleaningConfig,
        summary: &mut CleaningSummary,
        processing_steps: &mut Vec<String>,
    ) -> Result<DataFrame> {
        // Nulls read as zero are fills too; count them before they vanish.
        let mut zero_filled = Vec::with_capacity(config.int_columns.len());
        for column in &config.int_columns {
            if let Ok(col) = df.column(column) {
                zero_filled.push((column.as_str(), col.null_count()));
            }
        }

        let df = self.normalizer.normalize(
            df,
            &config.int_columns,
            &config.category_columns,
            processing_steps,
        )?;

        for (column, count) in zero_filled {
            if count > 0
                && let Some(col_summary) = summary.column_mut(column)
            {
                col_summary.record_imputation("zero", count);
            }
        }

        let converted = config.int_columns.len() + config.category_columns.len();
        if converted > 0 {
            let mut columns: Vec<&str> = config.int_columns.iter().map(String::as_str).collect();
            columns.extend(config.category_columns.iter().map(String::as_str));
            summary.add_action(
                CleaningAction::new(
                    ActionType::TypeCorrected,
                    "dataset",
                    format!("Normalized types of {} columns", converted),
                )
                .with_details(columns.join(", ")),
            );
        }
        Ok(df)
    }

    /// Stage C: keep only events with an accepted validity code.
    pub fn filter_valid_events(
        &self,
        df: DataFrame,
        config: &CleaningConfig,
        summary: &mut CleaningSummary,
        processing_steps: &mut Vec<String>,
    ) -> Result<DataFrame> {
        let before = df.height();
        let (df, removed) =
            self.cleaner
                .filter_valid_events(df, &config.validity_column, &config.valid_codes)?;

        processing_steps.push(format!(
            "Removed {} of {} events with '{}' outside {:?}",
            removed, before, config.validity_column, config.valid_codes
        ));
        summary.rows_removed = removed;
        if removed > 0 {
            summary.add_action(CleaningAction::new(
                ActionType::RowsRemoved,
                config.validity_column.clone(),
                format!("Removed {} events failing the validity rule", removed),
            ));
        }

        if before > 0 {
            let removed_pct = removed as f32 / before as f32 * 100.0;
            if removed_pct > HIGH_ROW_LOSS_PERCENT {
                summary.add_warning(format!(
                    "High data loss: {:.1}% of events failed the validity rule",
                    removed_pct
                ));
            }
        }
        if df.height() == 0 {
            summary.add_warning("No events passed the validity filter");
        }
        Ok(df)
    }

    /// Stage D: median fills from the filtered frame.
    pub fn impute_medians(
        &self,
        df: &mut DataFrame,
        config: &CleaningConfig,
        summary: &mut CleaningSummary,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        let applied = StatisticalImputer::apply_median_fills(
            df,
            &config.median_fill_columns,
            processing_steps,
        )?;

        for (column, median, count) in applied {
            if count == 0 {
                continue;
            }
            if let Some(col_summary) = summary.column_mut(&column) {
                col_summary.record_imputation("median", count);
            }
            summary.add_action(
                CleaningAction::new(
                    ActionType::ValueImputed,
                    column,
                    format!("Filled {} missing values with the median", count),
                )
                .with_details(format!("median = {}", median)),
            );
        }
        Ok(())
    }

    /// Stage E: constant fills, then data patches.
    pub fn apply_fallback_fills(
        &self,
        df: &mut DataFrame,
        config: &CleaningConfig,
        summary: &mut CleaningSummary,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        for fill in &config.constant_fills {
            let count = StatisticalImputer::apply_constant_fill(df, fill, processing_steps)?;
            if count == 0 {
                continue;
            }
            if let Some(col_summary) = summary.column_mut(&fill.column) {
                col_summary.record_imputation("constant", count);
            }
            summary.add_action(
                CleaningAction::new(
                    ActionType::ValueImputed,
                    fill.column.clone(),
                    format!("Filled {} missing values with a constant", count),
                )
                .with_details(format!("value = {}", fill.value)),
            );
        }

        let counts = PatchApplier::apply_all(df, &config.data_patches, processing_steps)?;
        for (patch, count) in config.data_patches.iter().zip(counts) {
            if count == 0 {
                continue;
            }
            if let Some(col_summary) = summary.column_mut(&patch.column) {
                col_summary.record_imputation("data patch", count);
            }
            summary.add_action(
                CleaningAction::new(
                    ActionType::ValuePatched,
                    patch.column.clone(),
                    format!("Patched {} row(s)", count),
                )
                .with_details(format!("value = {}", patch.value)),
            );
        }
        Ok(())
    }

    /// Stage F: coordinate fallback chain.
    pub fn impute_coordinates(
        &self,
        df: &mut DataFrame,
        config: &CleaningConfig,
        summary: &mut CleaningSummary,
        processing_steps: &mut Vec<String>,
    ) -> Result<()> {
        let outcomes = CoordinateImputer::impute(
            df,
            &config.coordinate_columns,
            &config.coordinate_fallback,
            processing_steps,
        )?;

        for outcome in outcomes.into_iter().filter(|o| o.filled > 0) {
            let method = outcome.tier.to_string();
            if let Some(col_summary) = summary.column_mut(&outcome.column) {
                col_summary.record_imputation(&method, outcome.filled);
            }
            summary.add_action(CleaningAction::new(
                ActionType::ValueImputed,
                outcome.column,
                format!("Filled {} coordinates using {}", outcome.filled, method),
            ));
        }
        Ok(())
    }

    /// Stage G: drop source row tracking, leaving a dense index.
    pub fn reindex(
        &self,
        df: DataFrame,
        summary: &mut CleaningSummary,
        processing_steps: &mut Vec<String>,
    ) -> Result<DataFrame> {
        let df = self.cleaner.reset_index(df)?;
        processing_steps.push(format!("Reset row index to 0..{}", df.height()));
        summary.add_action(CleaningAction::new(
            ActionType::IndexReset,
            "dataset",
            format!("Row index reset over {} events", df.height()),
        ));
        Ok(df)
    }

    /// Report retained columns that still hold nulls.
    ///
    /// Coded columns keep unknown codes as null, so leftovers are surfaced
    /// as warnings rather than failures.
    pub fn check_completeness(&self, df: &DataFrame, summary: &mut CleaningSummary) {
        let incomplete: Vec<(String, usize)> = df
            .get_columns()
            .iter()
            .filter(|c| c.null_count() > 0)
            .map(|c| (c.name().to_string(), c.null_count()))
            .collect();

        if incomplete.is_empty() {
            info!("All {} retained columns are complete", df.width());
            return;
        }
        for (column, nulls) in incomplete {
            warn!("'{}' still has {} missing values", column, nulls);
            summary.add_warning(format!("'{}' still has {} missing values", column, nulls));
        }
        debug!("Completeness check finished with warnings");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnSummary;

    fn summary_for(df: &DataFrame) -> CleaningSummary {
        let mut summary = CleaningSummary::new();
        for col in df.get_columns() {
            summary.add_column_summary(ColumnSummary::new(col.name().as_str(), "float"));
        }
        summary
    }

    fn config() -> CleaningConfig {
        CleaningConfig::builder()
            .source_columns(Vec::<String>::new())
            .drop_columns(["Vol"])
            .int_columns(["Deaths"])
            .category_columns(["Tsunami Event Validity"])
            .median_fill_columns(["Earthquake Magnitude"])
            .constant_fills(vec![])
            .data_patches(vec![])
            .coordinate_columns(Vec::<String>::new())
            .build()
            .unwrap()
    }

    fn frame() -> DataFrame {
        df![
            "Vol" => [None::<f64>, None, None, None],
            "Deaths" => [Some(3.0), None, Some(1.0), None],
            "Tsunami Event Validity" => [3.0, 0.0, 4.0, 3.0],
            "Earthquake Magnitude" => [Some(5.0), Some(9.0), Some(7.0), None],
        ]
        .unwrap()
    }

    #[test]
    fn test_stages_a_to_d_record_summary() {
        let executor = CleaningExecutor::new();
        let config = config();
        let df = frame();
        let mut summary = summary_for(&df);
        let mut steps = Vec::new();

        let df = executor
            .prune_columns(df, &config, &mut summary, &mut steps)
            .unwrap();
        let df = executor
            .normalize_types(df, &config, &mut summary, &mut steps)
            .unwrap();
        let mut df = executor
            .filter_valid_events(df, &config, &mut summary, &mut steps)
            .unwrap();
        executor
            .impute_medians(&mut df, &config, &mut summary, &mut steps)
            .unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(summary.rows_removed, 1);
        assert!(summary.column_mut("Vol").unwrap().was_removed);
        assert_eq!(summary.column_mut("Deaths").unwrap().values_imputed, 2);

        // Median of the retained 5.0 and 7.0, not 7.0 over all rows
        let mags = df.column("Earthquake Magnitude").unwrap().f64().unwrap();
        assert_eq!(mags.get(2), Some(6.0));
        assert_eq!(summary.count_actions(ActionType::ValueImputed), 1);
        assert_eq!(summary.count_actions(ActionType::RowsRemoved), 1);
    }

    #[test]
    fn test_check_completeness_warns() {
        let executor = CleaningExecutor::new();
        let df = df!["Region" => [Some(1i64), None]].unwrap();
        let mut summary = CleaningSummary::new();
        executor.check_completeness(&df, &mut summary);
        assert_eq!(summary.warnings.len(), 1);
        assert!(summary.warnings[0].contains("Region"));
    }
}
