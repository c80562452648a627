//! Tsunami Events Cleaning Library
//!
//! A batch cleaning and profiling pipeline for the historical tsunami events
//! export, built with Rust and Polars.
//!
//! # Overview
//!
//! The pipeline reads the tab separated export once and runs a fixed
//! sequence of stages over a single owned table:
//!
//! - **Schema validation**: the header must match the configured layout
//! - **Column pruning** (A): drop empty, identifier and redundant total columns
//! - **Type normalization** (B): zero-filled integer counts, integer category codes
//! - **Validity filter** (C): keep events with validity 2, 3 or 4
//! - **Median imputation** (D): physical measurements, from retained events only
//! - **Constant fills and data patches** (E): typed defaults, checked single-row fixes
//! - **Coordinate fallback** (F): location mean, then country mean, then global median
//! - **Reindexing** (G): dense `0..n-1` row index
//! - **Profiling** (H): skewness, histograms, top-N categories, correlations
//!
//! The cleaned table is written as CSV with a leading index column.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tsunami_processing::{CleaningConfig, Pipeline};
//!
//! let result = Pipeline::builder()
//!     .config(CleaningConfig::default())
//!     .build()?
//!     .process_file("tsunami_events.tsv")?;
//!
//! println!("{} events kept", result.summary.rows_after);
//! for summary in &result.profile.numeric_summaries {
//!     println!("{}: skew {:?}", summary.column, summary.skewness);
//! }
//! ```
//!
//! # Configuration
//!
//! Column lists, fill values, patches and the coordinate fallback chain live
//! in [`CleaningConfig`]. Its `Default` holds the rules for the tsunami
//! export; a JSON file can override any field:
//!
//! ```rust,ignore
//! use tsunami_processing::config::CleaningConfig;
//!
//! let config = CleaningConfig::from_json_file("cleaning.json")?;
//! let config = CleaningConfig::builder()
//!     .valid_codes(vec![3, 4])
//!     .generate_reports(true)
//!     .build()?;
//! ```
//!
//! # Progress Reporting
//!
//! ```rust,ignore
//! use tsunami_processing::{CancellationToken, CleaningError, Pipeline};
//!
//! let token = CancellationToken::new();
//!
//! let result = Pipeline::builder()
//!     .cancellation_token(token.clone())
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(df);
//!
//! match result {
//!     Ok(result) => println!("Success!"),
//!     Err(CleaningError::Cancelled) => println!("Cancelled"),
//!     Err(e) => println!("Error: {}", e),
//! }
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod imputers;
pub mod loader;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{DataCleaner, SOURCE_ROW_COLUMN, TypeNormalizer};
pub use config::{
    CleaningConfig, CleaningConfigBuilder, ConfigValidationError, ConstantFill, DataPatch,
    FallbackTier, FillValue, PatchCondition,
};
pub use error::{CleaningError, Result as TsunamiResult, ResultExt};
pub use imputers::{CoordinateImputer, PatchApplier, StatisticalImputer, TierOutcome};
pub use loader::{load_delimited, load_for_config};
pub use pipeline::{
    CancellationToken, CleaningExecutor, CleaningStage, ClosureProgressReporter, Pipeline,
    PipelineBuilder, ProgressReporter, ProgressUpdate,
};
pub use profiler::{DataProfiler, ProfileOptions};
pub use reporting::{CleaningReport, ProcessingSummaryReport, ReportGenerator};
pub use schema::SchemaValidator;
pub use types::{
    ActionType, CleaningAction, CleaningResult, CleaningSummary, ColumnProfile, ColumnRole,
    ColumnSummary, CorrelationMatrix, CorrelationPair, DatasetProfile, MissingValueEntry,
    NumericSummary,
};
