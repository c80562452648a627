//! Imputation module for handling missing values.
//!
//! This module provides the three fill strategies of the pipeline:
//! - Statistical imputation (post-filter medians, typed constants)
//! - Targeted data patches with match-count validation
//! - The coordinate fallback chain (group means, then a global median)

mod geographic;
mod patches;
mod statistical;

pub use geographic::{CoordinateImputer, TierOutcome};
pub use patches::PatchApplier;
pub use statistical::StatisticalImputer;
