//! Coordinate imputation through an ordered fallback chain.
//!
//! Each coordinate column is filled independently. A tier only touches
//! values that are still missing when it runs, and group means are taken
//! from the column as it stands after the previous tier, so values filled
//! by a location mean can inform the country mean.

use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::FallbackTier;
use crate::error::{CleaningError, Result};
use crate::utils::{median, to_f64_values, to_key_strings};

/// Values filled by one tier for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct TierOutcome {
    pub column: String,
    pub tier: FallbackTier,
    pub filled: usize,
}

/// Fills latitude/longitude style columns tier by tier.
pub struct CoordinateImputer;

impl CoordinateImputer {
    /// Run the fallback chain on every column. Columns come out as Float64
    /// with no nulls.
    pub fn impute(
        df: &mut DataFrame,
        columns: &[String],
        tiers: &[FallbackTier],
        processing_steps: &mut Vec<String>,
    ) -> Result<Vec<TierOutcome>> {
        let mut outcomes = Vec::new();

        for column in columns {
            let series = df
                .column(column)
                .map_err(|_| CleaningError::ColumnNotFound(column.clone()))?
                .as_materialized_series();
            let name = series.name().clone();
            let mut values = to_f64_values(series)?;
            let initially_missing = values.iter().filter(|v| v.is_none()).count();

            for tier in tiers {
                let missing = values.iter().filter(|v| v.is_none()).count();
                if missing == 0 {
                    break;
                }

                let filled = match tier {
                    FallbackTier::GroupMean { by } => {
                        let keys = to_key_strings(
                            df.column(by)
                                .map_err(|_| CleaningError::ColumnNotFound(by.clone()))?
                                .as_materialized_series(),
                        )?;
                        Self::fill_group_mean(&mut values, &keys)
                    }
                    FallbackTier::GlobalMedian => {
                        let known: Vec<f64> = values.iter().flatten().copied().collect();
                        let Some(m) = median(&known) else {
                            return Err(CleaningError::NoValidValues(column.clone()));
                        };
                        Self::fill_constant(&mut values, m)
                    }
                };

                debug!("{}: {} filled by {}", column, filled, tier);
                if filled > 0 {
                    processing_steps.push(format!(
                        "Filled {} missing values in '{}' using {}",
                        filled, column, tier
                    ));
                }
                outcomes.push(TierOutcome {
                    column: column.clone(),
                    tier: tier.clone(),
                    filled,
                });
            }

            let remaining = values.iter().filter(|v| v.is_none()).count();
            if remaining > 0 {
                warn!("{}: {} values left after fallback chain", column, remaining);
                return Err(CleaningError::ImputationFailed {
                    column: column.clone(),
                    reason: format!("{} values still missing after all fallback tiers", remaining),
                });
            }

            info!(
                "Stage F: '{}' complete ({} values imputed)",
                column, initially_missing
            );
            df.replace(column, Series::new(name, values))?;
        }

        Ok(outcomes)
    }

    /// Fill missing values with the mean of known values sharing the key.
    ///
    /// Rows with a null key are skipped, and so are groups with no known value.
    fn fill_group_mean(values: &mut [Option<f64>], keys: &[Option<String>]) -> usize {
        let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
        for (value, key) in values.iter().zip(keys) {
            if let (Some(v), Some(k)) = (value, key) {
                let entry = sums.entry(k.as_str()).or_insert((0.0, 0));
                entry.0 += v;
                entry.1 += 1;
            }
        }

        let mut filled = 0;
        for (value, key) in values.iter_mut().zip(keys) {
            if value.is_some() {
                continue;
            }
            if let Some((sum, count)) = key.as_deref().and_then(|k| sums.get(k)) {
                *value = Some(sum / *count as f64);
                filled += 1;
            }
        }
        filled
    }

    fn fill_constant(values: &mut [Option<f64>], fill: f64) -> usize {
        let mut filled = 0;
        for value in values.iter_mut().filter(|v| v.is_none()) {
            *value = Some(fill);
            filled += 1;
        }
        filled
    }
}
