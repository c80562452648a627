//! Progress reporting and cancellation for the cleaning pipeline.
//!
//! The pipeline runs its stages strictly in order and reports one update at
//! the start and end of each. A [`CancellationToken`] shared with another
//! thread is checked between stages.
//!
//! # Example
//!
//! ```rust,ignore
//! use tsunami_processing::{CancellationToken, CleaningStage, Pipeline};
//!
//! let token = CancellationToken::new();
//! let stop_after_filter = token.clone();
//!
//! // Keep only the filtered table's row count, skip imputation and output
//! let result = Pipeline::builder()
//!     .cancellation_token(token)
//!     .on_progress(move |update| {
//!         if update.stage == CleaningStage::ValidityFilter && update.stage_progress == 1.0 {
//!             eprintln!("{}", update.message);
//!             stop_after_filter.cancel();
//!         }
//!     })
//!     .build()?
//!     .process_file("tsunami_events.tsv");
//! assert!(result.unwrap_err().is_cancelled());
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stages of the cleaning pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStage {
    /// Loading the input and preparing the run
    Initializing,
    /// Checking the input header against the configured layout
    SchemaValidation,
    /// Stage A: dropping unused columns
    ColumnPruning,
    /// Stage B: integer and category coercion
    TypeNormalization,
    /// Stage C: keeping only valid events
    ValidityFilter,
    /// Stage D: median fills
    MedianImputation,
    /// Stage E: constant fills and data patches
    FallbackImputation,
    /// Stage F: coordinate fallback chain
    CoordinateImputation,
    /// Stage G: contiguous row index
    Reindexing,
    /// Descriptive statistics over the cleaned table
    Profiling,
    /// Writing the cleaned table and report
    ReportGeneration,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline was cancelled by the caller
    Cancelled,
    /// Pipeline failed with an error
    Failed,
}

impl CleaningStage {
    /// Processing stages in the order they run. Terminal states excluded.
    pub const ORDER: [CleaningStage; 11] = [
        Self::Initializing,
        Self::SchemaValidation,
        Self::ColumnPruning,
        Self::TypeNormalization,
        Self::ValidityFilter,
        Self::MedianImputation,
        Self::FallbackImputation,
        Self::CoordinateImputation,
        Self::Reindexing,
        Self::Profiling,
        Self::ReportGeneration,
    ];

    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::SchemaValidation => "Validating Schema",
            Self::ColumnPruning => "Pruning Columns",
            Self::TypeNormalization => "Normalizing Types",
            Self::ValidityFilter => "Filtering Events",
            Self::MedianImputation => "Median Imputation",
            Self::FallbackImputation => "Constant Fills and Patches",
            Self::CoordinateImputation => "Imputing Coordinates",
            Self::Reindexing => "Resetting Index",
            Self::Profiling => "Profiling Dataset",
            Self::ReportGeneration => "Writing Output",
            Self::Complete => "Complete",
            Self::Cancelled => "Cancelled",
            Self::Failed => "Failed",
        }
    }

    /// Share of the overall run spent in this stage. Processing stages sum
    /// to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Initializing => 0.02,
            Self::SchemaValidation => 0.03,
            Self::ColumnPruning => 0.05,
            Self::TypeNormalization => 0.10,
            Self::ValidityFilter => 0.05,
            Self::MedianImputation => 0.10,
            Self::FallbackImputation => 0.10,
            Self::CoordinateImputation => 0.15,
            Self::Reindexing => 0.02,
            Self::Profiling => 0.23,
            Self::ReportGeneration => 0.15,
            Self::Complete | Self::Cancelled | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Complete => 1.0,
            Self::Cancelled | Self::Failed => 0.0,
            stage => Self::ORDER
                .iter()
                .take_while(|s| *s != stage)
                .map(|s| s.weight())
                .sum(),
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: CleaningStage,

    /// Optional sub-stage description (e.g., "Column: Latitude")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    /// Creates a progress update for a stage.
    pub fn new(stage: CleaningStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let stage_progress = stage_progress.clamp(0.0, 1.0);
        let progress = stage.base_progress() + stage.weight() * stage_progress;
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress,
            message: message.into(),
        }
    }

    /// Attaches a sub-stage description.
    pub fn with_sub_stage(mut self, sub_stage: impl Into<String>) -> Self {
        self.sub_stage = Some(sub_stage.into());
        self
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self::terminal(CleaningStage::Complete, 1.0, message)
    }

    /// Creates a cancelled progress update.
    pub fn cancelled() -> Self {
        Self::terminal(CleaningStage::Cancelled, 0.0, "Pipeline cancelled by user")
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::terminal(CleaningStage::Failed, 0.0, message)
    }

    fn terminal(stage: CleaningStage, progress: f32, message: impl Into<String>) -> Self {
        Self {
            stage,
            sub_stage: None,
            progress,
            stage_progress: progress,
            message: message.into(),
        }
    }
}

/// Receives progress updates during a pipeline run.
///
/// Implementations must be `Send + Sync` so a run on a worker thread can
/// report to a listener owned elsewhere.
pub trait ProgressReporter: Send + Sync {
    /// Called at stage boundaries. Keep it cheap and non-blocking.
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

/// Token for cancelling a running pipeline.
///
/// Clones share one atomic flag. The pipeline checks it between stages and
/// returns [`CleaningError::Cancelled`](crate::error::CleaningError::Cancelled)
/// once it is set.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(CancellationToken: Send, Sync);
static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. Safe to call from any thread.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether this token or any clone has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused for another run.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}
