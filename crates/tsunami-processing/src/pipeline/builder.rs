//! Main cleaning pipeline module.
//!
//! This module provides the [`Pipeline`] struct and its builder, which run
//! the stages in order over one owned `DataFrame`.

use crate::cleaner::DataCleaner;
use crate::config::{CleaningConfig, ConfigValidationError};
use crate::error::{CleaningError, Result};
use crate::loader;
use crate::pipeline::executor::CleaningExecutor;
use crate::pipeline::progress::{
    CancellationToken, ClosureProgressReporter, CleaningStage, ProgressReporter, ProgressUpdate,
};
use crate::profiler::{DataProfiler, ProfileOptions};
use crate::reporting::ReportGenerator;
use crate::schema::SchemaValidator;
use crate::types::{CleaningResult, CleaningSummary, ColumnSummary};
use crate::utils::dtype_label;
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// The tsunami events cleaning pipeline.
///
/// Use [`Pipeline::builder()`] to create a pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use tsunami_processing::{CancellationToken, CleaningConfig, Pipeline};
///
/// let token = CancellationToken::new();
///
/// let result = Pipeline::builder()
///     .config(CleaningConfig::builder().output_dir("cleaned").build()?)
///     .cancellation_token(token.clone())
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process_file("tsunami_events.tsv")?;
///
/// println!("{} events kept", result.data.height());
/// ```
pub struct Pipeline {
    config: CleaningConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: CancellationToken,
    executor: CleaningExecutor,
    reporter: ReportGenerator,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Read a delimited file with the configured separator and null markers,
    /// then process it.
    pub fn process_file(&self, path: impl AsRef<Path>) -> Result<CleaningResult> {
        let path = path.as_ref();
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Initializing,
            0.0,
            format!("Reading {}", path.display()),
        ));
        let df = match loader::load_for_config(path, &self.config) {
            Ok(df) => df,
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                return Err(e);
            }
        };
        self.run(df, Some(path))
    }

    /// Process an already loaded table.
    ///
    /// # Errors
    ///
    /// Returns `Err(CleaningError::Cancelled)` if the cancellation token was
    /// triggered before a stage started. Schema mismatches, data-shape
    /// violations, failed conversions and undefined fill values abort the
    /// run; nothing is written in that case.
    pub fn process(&self, df: DataFrame) -> Result<CleaningResult> {
        self.run(df, None)
    }

    fn run(&self, df: DataFrame, input: Option<&Path>) -> Result<CleaningResult> {
        match self.process_internal(df, input) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Cleaned {} events",
                    result.data.height()
                )));
                Ok(result)
            }
            Err(e) => {
                if e.is_cancelled() {
                    self.report_progress(ProgressUpdate::cancelled());
                } else {
                    self.report_progress(ProgressUpdate::failed(e.to_string()));
                }
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Check if cancellation has been requested.
    fn check_cancelled(&self) -> Result<()> {
        if self.cancellation_token.is_cancelled() {
            return Err(CleaningError::Cancelled);
        }
        Ok(())
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    /// Announce a stage after checking for cancellation.
    fn begin(&self, stage: CleaningStage, message: &str) -> Result<()> {
        self.check_cancelled()?;
        info!("{}...", stage.display_name());
        self.report_progress(ProgressUpdate::new(stage, 0.0, message));
        Ok(())
    }

    /// Like [`begin`](Self::begin), naming the columns the stage works on.
    fn begin_columns(&self, stage: CleaningStage, message: &str, columns: &[String]) -> Result<()> {
        self.check_cancelled()?;
        info!("{}...", stage.display_name());
        self.report_progress(
            ProgressUpdate::new(stage, 0.0, message)
                .with_sub_stage(format!("Columns: {}", columns.join(", "))),
        );
        Ok(())
    }

    fn finish(&self, stage: CleaningStage, message: impl Into<String>) {
        self.report_progress(ProgressUpdate::new(stage, 1.0, message));
    }

    fn process_internal(&self, df: DataFrame, input: Option<&Path>) -> Result<CleaningResult> {
        let start_time = Instant::now();
        let config = &self.config;
        let executor = &self.executor;

        self.begin(CleaningStage::Initializing, "Starting cleaning pipeline...")?;
        let mut summary = CleaningSummary::new();
        let mut processing_steps: Vec<String> = Vec::new();

        summary.rows_before = df.height();
        summary.columns_before = df.width();
        summary.nulls_before = count_nulls(&df);
        summary.data_quality_score_before = completeness(&df);
        for col in df.get_columns() {
            let mut col_summary = ColumnSummary::new(col.name().as_str(), dtype_label(col.dtype()));
            col_summary.missing_before = col.null_count();
            summary.add_column_summary(col_summary);
        }
        self.finish(
            CleaningStage::Initializing,
            format!("{} rows x {} columns", df.height(), df.width()),
        );

        self.begin(CleaningStage::SchemaValidation, "Validating input schema...")?;
        SchemaValidator::validate(&df, config)?;
        let df = DataCleaner.attach_source_rows(df)?;
        self.finish(CleaningStage::SchemaValidation, "Input schema OK");

        self.begin(CleaningStage::ColumnPruning, "Dropping unused columns...")?;
        let df = executor.prune_columns(df, config, &mut summary, &mut processing_steps)?;
        self.finish(CleaningStage::ColumnPruning, format!("{} columns kept", df.width() - 1));

        self.begin(CleaningStage::TypeNormalization, "Normalizing column types...")?;
        let df = executor.normalize_types(df, config, &mut summary, &mut processing_steps)?;
        self.finish(CleaningStage::TypeNormalization, "Types normalized");

        self.begin(CleaningStage::ValidityFilter, "Filtering events by validity...")?;
        let mut df = executor.filter_valid_events(df, config, &mut summary, &mut processing_steps)?;
        self.finish(
            CleaningStage::ValidityFilter,
            format!("{} events retained", df.height()),
        );

        self.begin_columns(
            CleaningStage::MedianImputation,
            "Filling measurements with medians...",
            &config.median_fill_columns,
        )?;
        executor.impute_medians(&mut df, config, &mut summary, &mut processing_steps)?;
        self.finish(CleaningStage::MedianImputation, "Median fills applied");

        self.begin(CleaningStage::FallbackImputation, "Applying constant fills and patches...")?;
        executor.apply_fallback_fills(&mut df, config, &mut summary, &mut processing_steps)?;
        self.finish(CleaningStage::FallbackImputation, "Constant fills and patches applied");

        self.begin_columns(
            CleaningStage::CoordinateImputation,
            "Imputing coordinates...",
            &config.coordinate_columns,
        )?;
        executor.impute_coordinates(&mut df, config, &mut summary, &mut processing_steps)?;
        self.finish(CleaningStage::CoordinateImputation, "Coordinates complete");

        self.begin(CleaningStage::Reindexing, "Resetting row index...")?;
        let df = executor.reindex(df, &mut summary, &mut processing_steps)?;
        executor.check_completeness(&df, &mut summary);
        self.finish(CleaningStage::Reindexing, "Index reset");

        self.begin(CleaningStage::Profiling, "Profiling cleaned dataset...")?;
        let profile = DataProfiler::profile_dataset(
            &df,
            &config.category_columns,
            &ProfileOptions::from_config(config),
        )?;
        debug!(
            "Profiled {} numeric and {} categorical columns",
            profile.numeric_columns.len(),
            profile.categorical_columns.len()
        );
        self.finish(CleaningStage::Profiling, "Profiling complete");

        summary.rows_after = df.height();
        summary.columns_after = df.width();
        summary.columns_removed = summary.columns_before.saturating_sub(summary.columns_after);
        summary.nulls_after = count_nulls(&df);
        summary.data_quality_score_after = completeness(&df);
        for col in df.get_columns() {
            if let Some(col_summary) = summary.column_mut(col.name().as_str()) {
                col_summary.final_type = dtype_label(col.dtype()).to_string();
                col_summary.missing_after = col.null_count();
            }
        }

        self.begin(CleaningStage::ReportGeneration, "Writing output...")?;
        let output_file = if config.save_to_disk {
            Some(
                self.reporter
                    .write_csv(&df, config.include_index, &config.index_label)?,
            )
        } else {
            None
        };
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        let mut result = CleaningResult {
            data: df,
            profile,
            summary,
            processing_steps,
            output_file,
            report_file: None,
        };

        if config.generate_reports {
            let report = ReportGenerator::build_report(input, &result);
            result.report_file = Some(self.reporter.write_report(&report)?);
        }
        self.finish(CleaningStage::ReportGeneration, "Output written");

        info!(
            "Pipeline finished in {} ms: {} of {} events kept, {} columns",
            result.summary.duration_ms,
            result.summary.rows_after,
            result.summary.rows_before,
            result.summary.columns_after
        );
        Ok(result)
    }
}

fn count_nulls(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|c| c.null_count()).sum()
}

/// Share of non-null cells (0.0 - 1.0).
fn completeness(df: &DataFrame) -> f32 {
    let total = df.height() * df.width();
    if total == 0 {
        return 0.0;
    }
    total.saturating_sub(count_nulls(df)) as f32 / total as f32
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<CleaningConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: Option<CancellationToken>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: CleaningConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// Convenience over [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Set a cancellation token for stopping the pipeline.
    ///
    /// Clone the token and call [`CancellationToken::cancel()`] from any
    /// thread; the next stage boundary returns [`CleaningError::Cancelled`].
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let reporter = ReportGenerator::new(config.output_dir.clone(), config.output_name.clone());

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
            cancellation_token: self.cancellation_token.unwrap_or_default(),
            executor: CleaningExecutor::new(),
            reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FillValue;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A reduced layout: only the columns the cleaning rules touch.
    fn small_config(output_dir: &Path) -> CleaningConfig {
        CleaningConfig::builder()
            .source_columns(Vec::<String>::new())
            .drop_columns(["Vol"])
            .int_columns(["Deaths"])
            .category_columns(["Tsunami Event Validity", "Death Description"])
            .median_fill_columns(["Earthquake Magnitude"])
            .constant_fills(vec![crate::config::ConstantFill::new(
                "Death Description",
                FillValue::Int(1),
            )])
            .output_dir(output_dir)
            .build()
            .unwrap()
    }

    fn small_frame() -> DataFrame {
        df![
            "Vol" => [None::<f64>, None, None, None, None],
            "Tsunami Event Validity" => [4i64, 3, 0, 2, 4],
            "Country" => ["JAPAN", "NEW ZEALAND", "CHILE", "JAPAN", "USA"],
            "Location Name" => [Some("SANRIKU"), None, Some("ARICA"), Some("SANRIKU"), Some("HILO")],
            "Earthquake Magnitude" => [Some(8.0), None, Some(9.5), Some(7.0), Some(7.5)],
            "Deaths" => [Some(22i64), None, Some(0), Some(5), None],
            "Death Description" => [Some(3i64), None, Some(1), None, Some(2)],
            "Latitude" => [Some(39.0), Some(-41.0), Some(-18.5), None, Some(19.7)],
            "Longitude" => [Some(142.0), Some(174.0), Some(-70.3), None, Some(-155.1)],
        ]
        .unwrap()
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert_eq!(pipeline.config.valid_codes, vec![2, 3, 4]);
        assert!(!pipeline.cancellation_token.is_cancelled());
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let mut config = CleaningConfig::default();
        config.valid_codes.clear();
        assert!(matches!(
            Pipeline::builder().config(config).build(),
            Err(ConfigValidationError::EmptyValidCodes)
        ));
    }

    #[test]
    fn test_process_small_frame() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::builder()
            .config(small_config(dir.path()))
            .build()
            .unwrap();

        let result = pipeline.process(small_frame()).unwrap();

        assert_eq!(result.data.height(), 4);
        assert_eq!(result.summary.rows_removed, 1);
        assert_eq!(result.data.get_column_index("Vol"), None);
        assert_eq!(result.data.get_column_index(crate::cleaner::SOURCE_ROW_COLUMN), None);

        let location = result.data.column("Location Name").unwrap().str().unwrap();
        assert_eq!(location.get(1), Some("In New Zealand"));

        // JAPAN/SANRIKU row with no coordinates takes the location mean
        let lat = result.data.column("Latitude").unwrap().f64().unwrap();
        assert_eq!(lat.get(2), Some(39.0));

        // Median of 8.0, 7.0 and 7.5 after the CHILE row is filtered out
        let mag = result.data.column("Earthquake Magnitude").unwrap().f64().unwrap();
        assert_eq!(mag.get(1), Some(7.5));

        assert_eq!(result.summary.nulls_after, 0);
        assert_eq!(result.summary.data_quality_score_after, 1.0);
        assert!(result.output_file.as_ref().unwrap().exists());
        assert!(result.report_file.is_none());
    }

    #[test]
    fn test_progress_reports_every_stage_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        let pipeline = Pipeline::builder()
            .config(small_config(dir.path()))
            .on_progress(move |update| {
                stages_clone.lock().unwrap().push(update.stage);
            })
            .build()
            .unwrap();
        pipeline.process(small_frame()).unwrap();

        let mut seen = stages.lock().unwrap().clone();
        assert_eq!(seen.pop(), Some(CleaningStage::Complete));
        seen.dedup();
        assert_eq!(seen, CleaningStage::ORDER.to_vec());
    }

    #[test]
    fn test_coordinate_stage_names_its_columns() {
        let dir = tempfile::tempdir().unwrap();
        let sub_stages = Arc::new(Mutex::new(Vec::new()));
        let sink = sub_stages.clone();

        Pipeline::builder()
            .config(small_config(dir.path()))
            .on_progress(move |update| {
                if let Some(sub) = update.sub_stage {
                    sink.lock().unwrap().push((update.stage, sub));
                }
            })
            .build()
            .unwrap()
            .process(small_frame())
            .unwrap();

        let sub_stages = sub_stages.lock().unwrap();
        assert!(sub_stages.contains(&(
            CleaningStage::CoordinateImputation,
            "Columns: Latitude, Longitude".to_string()
        )));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        let cancelled = Arc::new(AtomicUsize::new(0));
        let cancelled_clone = cancelled.clone();

        let pipeline = Pipeline::builder()
            .cancellation_token(token.clone())
            .on_progress(move |update| {
                if update.stage == CleaningStage::Cancelled {
                    cancelled_clone.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build()
            .unwrap();

        token.cancel();
        let err = pipeline.process(small_frame()).unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(cancelled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_check_cancelled() {
        let token = CancellationToken::new();
        let pipeline = Pipeline::builder()
            .cancellation_token(token.clone())
            .build()
            .unwrap();

        assert!(pipeline.check_cancelled().is_ok());
        token.cancel();
        assert!(matches!(
            pipeline.check_cancelled().unwrap_err(),
            CleaningError::Cancelled
        ));
    }

    #[test]
    fn test_schema_mismatch_aborts_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::builder()
            .config(small_config(dir.path()))
            .build()
            .unwrap();

        let df = small_frame().drop("Latitude").unwrap();
        let err = pipeline.process(df).unwrap_err();

        assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
        assert!(err.to_string().contains("Latitude"));
        assert!(!dir.path().join("CleanedTsunamiDataIndex.csv").exists());
    }
}
