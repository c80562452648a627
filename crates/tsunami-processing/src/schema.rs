//! Input schema validation.
//!
//! Runs before any transformation so that a renamed or missing column fails
//! the run up front instead of surfacing as a confusing error mid-pipeline.

use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::config::CleaningConfig;
use crate::error::{CleaningError, Result};

pub struct SchemaValidator;

impl SchemaValidator {
    /// Check that every column the configuration refers to is present and,
    /// when `source_columns` is set, that no unknown column is present.
    pub fn validate(df: &DataFrame, config: &CleaningConfig) -> Result<()> {
        let present: HashSet<&str> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .collect();

        let mut required = config.referenced_columns();
        for column in &config.source_columns {
            if !required.contains(column) {
                required.push(column.clone());
            }
        }

        let missing: Vec<String> = required
            .into_iter()
            .filter(|c| !present.contains(c.as_str()))
            .collect();

        let unexpected: Vec<String> = if config.source_columns.is_empty() {
            Vec::new()
        } else {
            let expected: HashSet<&str> =
                config.source_columns.iter().map(String::as_str).collect();
            df.get_column_names()
                .into_iter()
                .filter(|name| !expected.contains(name.as_str()))
                .map(|name| name.to_string())
                .collect()
        };

        if !missing.is_empty() || !unexpected.is_empty() {
            debug!("Missing columns: {:?}", missing);
            debug!("Unexpected columns: {:?}", unexpected);
            return Err(CleaningError::SchemaMismatch {
                missing,
                unexpected,
            });
        }

        info!("Input schema OK ({} columns)", df.width());
        Ok(())
    }
}
