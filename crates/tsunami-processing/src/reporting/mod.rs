//! Output of a pipeline run.
//!
//! [`ReportGenerator`] writes the cleaned table as CSV and, on request, a
//! [`CleaningReport`] as JSON. The same report struct backs the CLI's
//! `--json` output.
//!
//! # Example
//!
//! ```rust,ignore
//! use tsunami_processing::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_report(Some(input.as_path()), &result);
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! let generator = ReportGenerator::new("output", "CleanedTsunamiDataIndex");
//! generator.write_report(&report)?;
//! ```

mod generator;

pub use generator::{CleaningReport, ProcessingSummaryReport, ReportGenerator};
