use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Pipeline Result
// ============================================================================

/// Everything a pipeline run produces.
#[derive(Debug, Clone)]
pub struct CleaningResult {
    /// The cleaned table, densely indexed from zero.
    pub data: DataFrame,
    /// Derived statistics over the cleaned table.
    pub profile: DatasetProfile,
    /// What the pipeline did, for display and the JSON report.
    pub summary: CleaningSummary,
    /// Step-by-step log lines in execution order.
    pub processing_steps: Vec<String>,
    /// Path of the written CSV, if the run saved to disk.
    pub output_file: Option<PathBuf>,
    /// Path of the written JSON report, if one was generated.
    pub report_file: Option<PathBuf>,
}

// ============================================================================
// Cleaning Summary
// ============================================================================

/// Human-readable summary of what the pipeline did.
///
/// # Example
///
/// ```rust,ignore
/// let summary = &result.summary;
/// println!("Kept {} of {} events", summary.rows_after, summary.rows_before);
/// println!("Completeness {:.0}% -> {:.0}%",
///     summary.data_quality_score_before * 100.0,
///     summary.data_quality_score_after * 100.0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    /// Number of rows read.
    pub rows_before: usize,
    /// Number of rows after the validity filter.
    pub rows_after: usize,
    /// Number of rows removed by the validity filter.
    pub rows_removed: usize,

    /// Number of columns read.
    pub columns_before: usize,
    /// Number of columns retained.
    pub columns_after: usize,
    /// Number of columns removed.
    pub columns_removed: usize,

    /// Null cells in the input.
    pub nulls_before: usize,
    /// Null cells in the output.
    pub nulls_after: usize,
    /// Share of non-null cells in the input (0.0 - 1.0).
    pub data_quality_score_before: f32,
    /// Share of non-null cells in the output (0.0 - 1.0).
    pub data_quality_score_after: f32,

    /// Actions taken, in order.
    pub actions: Vec<CleaningAction>,

    /// Per-column summaries of changes.
    pub column_summaries: Vec<ColumnSummary>,

    /// Warnings and notes generated during cleaning.
    pub warnings: Vec<String>,
}

impl CleaningSummary {
    /// Create a new empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action to the summary.
    pub fn add_action(&mut self, action: CleaningAction) {
        self.actions.push(action);
    }

    /// Add a warning to the summary.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Add a column summary.
    pub fn add_column_summary(&mut self, summary: ColumnSummary) {
        self.column_summaries.push(summary);
    }

    /// Look up the summary of a column by name.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnSummary> {
        self.column_summaries.iter_mut().find(|c| c.name == name)
    }

    /// Percentage of rows removed by the validity filter.
    pub fn rows_removed_percentage(&self) -> f32 {
        if self.rows_before == 0 {
            0.0
        } else {
            (self.rows_removed as f32 / self.rows_before as f32) * 100.0
        }
    }

    /// Count of actions of a given type.
    pub fn count_actions(&self, action_type: ActionType) -> usize {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .count()
    }
}

/// A single action taken during cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningAction {
    /// Type of action performed.
    pub action_type: ActionType,
    /// Target of the action (column name or "dataset").
    pub target: String,
    /// Human-readable description of the action.
    pub description: String,
    /// Additional details (fill value, strategy, affected rows).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl CleaningAction {
    pub fn new(
        action_type: ActionType,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
            details: None,
        }
    }

    /// Add details to the action.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Types of actions the pipeline records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// A column was removed from the dataset.
    ColumnRemoved,
    /// Rows failing the validity rule were removed.
    RowsRemoved,
    /// A column's data type was normalized.
    TypeCorrected,
    /// Missing values were imputed.
    ValueImputed,
    /// A targeted data patch was applied.
    ValuePatched,
    /// The row index was rebuilt.
    IndexReset,
}

impl ActionType {
    /// Get a human-readable display name for the action type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ColumnRemoved => "Column Removed",
            Self::RowsRemoved => "Rows Removed",
            Self::TypeCorrected => "Type Corrected",
            Self::ValueImputed => "Value Imputed",
            Self::ValuePatched => "Value Patched",
            Self::IndexReset => "Index Reset",
        }
    }
}

/// Summary of changes made to a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    /// Name of the column.
    pub name: String,
    /// Data type as read.
    pub original_type: String,
    /// Data type after cleaning.
    pub final_type: String,
    /// Missing values in the input.
    pub missing_before: usize,
    /// Missing values in the output.
    pub missing_after: usize,
    /// Number of values filled.
    pub values_imputed: usize,
    /// Fill method(s) used, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imputation_method: Option<String>,
    /// Whether the column was removed.
    pub was_removed: bool,
    /// Reason for removal, if removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removal_reason: Option<String>,
}

impl ColumnSummary {
    pub fn new(name: impl Into<String>, original_type: impl Into<String>) -> Self {
        let original_type = original_type.into();
        Self {
            name: name.into(),
            final_type: original_type.clone(),
            original_type,
            missing_before: 0,
            missing_after: 0,
            values_imputed: 0,
            imputation_method: None,
            was_removed: false,
            removal_reason: None,
        }
    }

    /// Mark the column as removed with a reason.
    pub fn mark_removed(mut self, reason: impl Into<String>) -> Self {
        self.was_removed = true;
        self.removal_reason = Some(reason.into());
        self
    }

    /// Record a fill of `count` values using `method`.
    pub fn record_imputation(&mut self, method: &str, count: usize) {
        self.values_imputed += count;
        self.imputation_method = Some(match self.imputation_method.take() {
            Some(existing) => format!("{}, {}", existing, method),
            None => method.to_string(),
        });
    }
}

// ============================================================================
// Profile Types
// ============================================================================

/// Role a column plays in the derived views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Continuous or count data; summarized numerically.
    Numeric,
    /// Coded or textual data; summarized by frequency.
    Categorical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub role: ColumnRole,
    pub null_count: usize,
    pub null_percentage: f64,
    pub unique_count: usize,
}

/// Null count of one column, as shown by the missing-value report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValueEntry {
    pub column: String,
    pub null_count: usize,
    pub null_percentage: f64,
}

/// One equal-width histogram bin. The last bin includes its upper edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Five-number summary with Tukey whiskers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPlotSummary {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    /// Values outside `[q1 - 1.5 * IQR, q3 + 1.5 * IQR]`.
    pub outlier_count: usize,
}

/// Descriptive statistics of a numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; undefined below two values.
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Adjusted Fisher-Pearson skewness; undefined below three values or
    /// for constant columns.
    pub skewness: Option<f64>,
    pub histogram: Vec<HistogramBin>,
    pub box_plot: BoxPlotSummary,
}

/// A value and how often it occurs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
    /// Share of all rows, in percent.
    pub percentage: f64,
}

/// Most frequent values of a categorical column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryFrequencies {
    pub column: String,
    pub distinct_values: usize,
    pub top: Vec<CategoryCount>,
}

/// Pairwise Pearson correlations between numeric columns.
///
/// `values[i][j]` is `None` when either column is constant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Coefficient between two named columns.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub left: String,
    pub right: String,
    pub coefficient: f64,
}

/// Derived, read-only views over a cleaned table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub shape: (usize, usize),
    pub column_profiles: Vec<ColumnProfile>,
    pub categorical_columns: Vec<String>,
    pub numeric_columns: Vec<String>,
    pub numeric_summaries: Vec<NumericSummary>,
    pub category_frequencies: Vec<CategoryFrequencies>,
    pub correlations: CorrelationMatrix,
    /// Off-diagonal pairs ordered by absolute coefficient, strongest first.
    pub strongest_correlations: Vec<CorrelationPair>,
}

impl DatasetProfile {
    /// Numeric summary of a column by name.
    pub fn numeric(&self, column: &str) -> Option<&NumericSummary> {
        self.numeric_summaries.iter().find(|s| s.column == column)
    }

    /// Category frequencies of a column by name.
    pub fn categories(&self, column: &str) -> Option<&CategoryFrequencies> {
        self.category_frequencies.iter().find(|f| f.column == column)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_add_action_and_count() {
        let mut summary = CleaningSummary::new();
        summary.add_action(CleaningAction::new(
            ActionType::ValueImputed,
            "Area",
            "Filled 3 missing values",
        ));
        summary.add_action(CleaningAction::new(
            ActionType::ColumnRemoved,
            "Vol",
            "Dropped",
        ));
        assert_eq!(summary.actions.len(), 2);
        assert_eq!(summary.count_actions(ActionType::ValueImputed), 1);
    }

    #[test]
    fn test_rows_removed_percentage() {
        let mut summary = CleaningSummary::new();
        summary.rows_before = 200;
        summary.rows_removed = 50;
        assert!((summary.rows_removed_percentage() - 25.0).abs() < 0.01);
        assert_eq!(CleaningSummary::new().rows_removed_percentage(), 0.0);
    }

    #[test]
    fn test_column_summary_record_imputation() {
        let mut summary = ColumnSummary::new("Latitude", "float");
        summary.record_imputation("mean by 'Location Name'", 2);
        summary.record_imputation("global median", 1);
        assert_eq!(summary.values_imputed, 3);
        assert_eq!(
            summary.imputation_method.as_deref(),
            Some("mean by 'Location Name', global median")
        );
    }

    #[test]
    fn test_column_summary_mark_removed() {
        let summary = ColumnSummary::new("Vol", "float").mark_removed("Listed in drop_columns");
        assert!(summary.was_removed);
        assert_eq!(summary.removal_reason.unwrap(), "Listed in drop_columns");
    }

    #[test]
    fn test_action_types_serialize_snake_case() {
        let json = serde_json::to_string(&ActionType::ValuePatched).unwrap();
        assert_eq!(json, "\"value_patched\"");
        assert_eq!(ActionType::IndexReset.display_name(), "Index Reset");
    }

    #[test]
    fn test_correlation_matrix_lookup() {
        let matrix = CorrelationMatrix {
            columns: vec!["a".to_string(), "b".to_string()],
            values: vec![vec![Some(1.0), Some(-0.5)], vec![Some(-0.5), Some(1.0)]],
        };
        assert_eq!(matrix.get("a", "b"), Some(-0.5));
        assert_eq!(matrix.get("a", "missing"), None);
    }
}
