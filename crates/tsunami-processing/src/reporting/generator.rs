use crate::error::{CleaningError, Result, ResultExt};
use crate::profiler::DataProfiler;
use crate::types::{
    CleaningAction, CleaningResult, CleaningSummary, ColumnSummary, DatasetProfile,
    MissingValueEntry,
};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ============================================================================
// Report Types
// ============================================================================

/// Report of a pipeline run, shared by `--json` output and the report file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file, when the run started from one
    pub input_file: Option<String>,
    /// Path to the cleaned CSV, if written
    pub output_file: Option<String>,
    /// Row, column and completeness figures
    pub processing_summary: ProcessingSummaryReport,
    /// Actions taken, in order
    pub actions: Vec<CleaningAction>,
    /// Step-by-step log lines
    pub processing_steps: Vec<String>,
    /// Per-column summaries of changes
    pub column_summaries: Vec<ColumnSummary>,
    /// Null counts of the cleaned table
    pub missing_values_after: Vec<MissingValueEntry>,
    /// Derived views over the cleaned table
    pub profile: DatasetProfile,
}

/// Summary block of a [`CleaningReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingSummaryReport {
    pub duration_ms: u64,
    pub rows_before: usize,
    pub rows_after: usize,
    pub rows_removed: usize,
    pub rows_removed_percent: f32,
    pub columns_before: usize,
    pub columns_after: usize,
    pub columns_removed: usize,
    pub nulls_before: usize,
    pub nulls_after: usize,
    /// Share of non-null cells before (0.0-1.0)
    pub data_quality_before: f32,
    /// Share of non-null cells after (0.0-1.0)
    pub data_quality_after: f32,
    pub warnings: Vec<String>,
}

impl From<&CleaningSummary> for ProcessingSummaryReport {
    fn from(summary: &CleaningSummary) -> Self {
        Self {
            duration_ms: summary.duration_ms,
            rows_before: summary.rows_before,
            rows_after: summary.rows_after,
            rows_removed: summary.rows_removed,
            rows_removed_percent: summary.rows_removed_percentage(),
            columns_before: summary.columns_before,
            columns_after: summary.columns_after,
            columns_removed: summary.columns_removed,
            nulls_before: summary.nulls_before,
            nulls_after: summary.nulls_after,
            data_quality_before: summary.data_quality_score_before,
            data_quality_after: summary.data_quality_score_after,
            warnings: summary.warnings.clone(),
        }
    }
}

// ============================================================================
// Report Generator
// ============================================================================

/// Writes the cleaned table and the JSON report.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: String,
}

impl ReportGenerator {
    /// Create a generator writing `<output_name>.csv` and
    /// `<output_name>_report.json` under `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>, output_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            output_name: output_name.into(),
        }
    }

    /// Path the cleaned CSV is written to.
    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.output_name))
    }

    /// Path the JSON report is written to.
    pub fn report_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_report.json", self.output_name))
    }

    /// Write the cleaned table as comma separated CSV with a header row.
    ///
    /// With `include_index` a leading `0..n-1` column headed `index_label`
    /// is written first.
    pub fn write_csv(
        &self,
        df: &DataFrame,
        include_index: bool,
        index_label: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.csv_path();

        let mut out = if include_index {
            df.with_row_index(index_label.into(), None)
                .context("Adding index column")?
        } else {
            df.clone()
        };

        // An empty index label must stay a bare empty field, which the
        // polars header writer would quote.
        let header: Vec<String> = out
            .get_column_names()
            .iter()
            .map(|name| csv_header_field(name.as_str()))
            .collect();

        let mut file = File::create(&path)?;
        writeln!(file, "{}", header.join(","))?;
        CsvWriter::new(&mut file)
            .include_header(false)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(&mut out)
            .map_err(|e| CleaningError::ReportGenerationFailed(e.to_string()))?;

        info!(
            "Cleaned dataset saved: {} ({} rows)",
            path.display(),
            out.height()
        );
        Ok(path)
    }

    /// Assemble the report for a finished run.
    pub fn build_report(input_file: Option<&Path>, result: &CleaningResult) -> CleaningReport {
        CleaningReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.map(|p| p.display().to_string()),
            output_file: result
                .output_file
                .as_ref()
                .map(|p| p.display().to_string()),
            processing_summary: ProcessingSummaryReport::from(&result.summary),
            actions: result.summary.actions.clone(),
            processing_steps: result.processing_steps.clone(),
            column_summaries: result.summary.column_summaries.clone(),
            missing_values_after: DataProfiler::missing_report(&result.data),
            profile: result.profile.clone(),
        }
    }

    /// Write a report as pretty-printed JSON.
    pub fn write_report(&self, report: &CleaningReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let path = self.report_path();
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&path)?;
        file.write_all(json.as_bytes())?;

        debug!("Report is {} bytes", json.len());
        info!("Report saved: {}", path.display());
        Ok(path)
    }
}

/// Quote a header name only when it would otherwise break the row.
fn csv_header_field(name: &str) -> String {
    if name.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", name.replace('"', "\"\""))
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cleaned() -> DataFrame {
        df![
            "Year" => [1960i64, 2011],
            "Country" => ["CHILE", "JAPAN"],
            "Latitude" => [-39.5, 38.3],
        ]
        .unwrap()
    }

    #[test]
    fn test_write_csv_with_unnamed_index() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path(), "Cleaned");

        let path = generator.write_csv(&cleaned(), true, "").unwrap();

        assert_eq!(path, dir.path().join("Cleaned.csv"));
        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ",Year,Country,Latitude");
        assert!(lines[1].starts_with("0,1960,CHILE,"));
        assert!(lines[2].starts_with("1,2011,JAPAN,"));
    }

    #[test]
    fn test_header_names_with_separator_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path(), "Cleaned");
        let df = df!["Damage, $Mil" => [1.5], "Area" => ["AK"]].unwrap();

        let path = generator.write_csv(&df, true, "").unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().next(), Some(",\"Damage, $Mil\",Area"));
        assert_eq!(csv_header_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_write_csv_without_index() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path(), "Cleaned");

        let path = generator.write_csv(&cleaned(), false, "").unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text.lines().next(), Some("Year,Country,Latitude"));
    }

    #[test]
    fn test_write_report_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(dir.path().join("nested"), "Cleaned");

        let mut summary = CleaningSummary::new();
        summary.rows_before = 4;
        summary.rows_after = 2;
        summary.rows_removed = 2;
        let result = CleaningResult {
            data: cleaned(),
            profile: DatasetProfile::default(),
            summary,
            processing_steps: vec!["Dropped 1 low-value columns: Vol".to_string()],
            output_file: None,
            report_file: None,
        };

        let report = ReportGenerator::build_report(Some(Path::new("events.tsv")), &result);
        let path = generator.write_report(&report).unwrap();

        assert_eq!(path.file_name().unwrap(), "Cleaned_report.json");
        let parsed: CleaningReport =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed.input_file.as_deref(), Some("events.tsv"));
        assert_eq!(parsed.processing_summary.rows_removed_percent, 50.0);
        assert_eq!(parsed.missing_values_after.len(), 3);
        assert_eq!(parsed.processing_steps.len(), 1);
    }
}
