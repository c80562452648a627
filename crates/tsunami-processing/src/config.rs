//! Configuration for the tsunami cleaning pipeline.
//!
//! All hand-authored cleaning rules (which columns to drop, which to coerce,
//! which event validity codes to keep, constant fills, the single-row data
//! patches and the coordinate fallback chain) live in [`CleaningConfig`].
//! The [`Default`] implementation encodes the rules for the NOAA historical
//! tsunami events export; other exports can be described with a JSON file
//! loaded through [`CleaningConfig::from_json_file`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CleaningError, Result};

/// Columns of the raw export, in file order.
pub const SOURCE_COLUMNS: [&str; 51] = [
    "Unnamed: 0",
    "Id",
    "Year",
    "Mo",
    "Dy",
    "Hr",
    "Mn",
    "Sec",
    "Tsunami Event Validity",
    "Tsunami Cause Code",
    "Earthquake Magnitude",
    "Focal Depth (km)",
    "Vol",
    "More Info",
    "Deposits",
    "Country",
    "Area",
    "Region",
    "Location Name",
    "Latitude",
    "Longitude",
    "Maximum Water Height (m)",
    "Number of Runups",
    "Tsunami Magnitude (Abe)",
    "Tsunami Magnitude (Iida)",
    "Tsunami Intensity",
    "Warn Status",
    "Deaths",
    "Death Description",
    "Missing",
    "Missing Description",
    "Injuries",
    "Injuries Description",
    "Damage ($Mil)",
    "Damage Description",
    "Houses Destroyed",
    "Houses Destroyed Description",
    "Houses Damaged",
    "Houses Damaged Description",
    "Total Deaths",
    "Total Death Description",
    "Total Missing",
    "Total Missing Description",
    "Total Injuries",
    "Total Injuries Description",
    "Total Damage ($Mil)",
    "Total Damage Description",
    "Total Houses Destroyed",
    "Total Houses Destroyed Description",
    "Total Houses Damaged",
    "Total Houses Damaged Description",
];

/// Columns removed in Stage A: sparse timing fields, identifiers, empty
/// columns and the `Total ...` aggregates that mix in non-tsunami effects.
pub const DROP_COLUMNS: [&str; 29] = [
    "Unnamed: 0",
    "Id",
    "Hr",
    "Mn",
    "Sec",
    "Vol",
    "More Info",
    "Tsunami Magnitude (Abe)",
    "Warn Status",
    "Missing",
    "Missing Description",
    "Injuries",
    "Injuries Description",
    "Houses Destroyed",
    "Houses Destroyed Description",
    "Houses Damaged",
    "Houses Damaged Description",
    "Total Deaths",
    "Total Death Description",
    "Total Missing",
    "Total Missing Description",
    "Total Injuries",
    "Total Injuries Description",
    "Total Damage ($Mil)",
    "Total Damage Description",
    "Total Houses Destroyed",
    "Total Houses Destroyed Description",
    "Total Houses Damaged",
    "Total Houses Damaged Description",
];

/// Count-like columns stored as integers, nulls meaning zero.
pub const INT_COLUMNS: [&str; 6] = ["Year", "Mo", "Dy", "Deposits", "Number of Runups", "Deaths"];

/// Coded columns that carry a categorical role.
pub const CATEGORY_COLUMNS: [&str; 5] = [
    "Tsunami Event Validity",
    "Tsunami Cause Code",
    "Region",
    "Death Description",
    "Damage Description",
];

/// Physical measurements filled with their post-filter median.
pub const MEDIAN_FILL_COLUMNS: [&str; 5] = [
    "Earthquake Magnitude",
    "Focal Depth (km)",
    "Maximum Water Height (m)",
    "Tsunami Magnitude (Iida)",
    "Tsunami Intensity",
];

/// A typed fill value.
///
/// Serialized untagged, so JSON `1` is an integer, `0.0` a float and
/// `"NA"` a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FillValue {
    /// Numeric view of the value, `None` for text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FillValue::Int(v) => Some(*v as f64),
            FillValue::Float(v) => Some(*v),
            FillValue::Text(_) => None,
        }
    }

    /// Short name of the value's type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FillValue::Int(_) => "integer",
            FillValue::Float(_) => "float",
            FillValue::Text(_) => "string",
        }
    }
}

impl fmt::Display for FillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillValue::Int(v) => write!(f, "{}", v),
            FillValue::Float(v) => write!(f, "{}", v),
            FillValue::Text(v) => write!(f, "\"{}\"", v),
        }
    }
}

/// Fill every null of `column` with `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantFill {
    pub column: String,
    pub value: FillValue,
}

impl ConstantFill {
    pub fn new(column: impl Into<String>, value: FillValue) -> Self {
        Self {
            column: column.into(),
            value,
        }
    }
}

/// Equality condition on another column of the same row.
///
/// Values are compared on their string form, so `equals: "3"` matches an
/// integer column holding `3`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchCondition {
    pub column: String,
    pub equals: String,
}

/// A targeted fill for a known, tiny set of rows.
///
/// Applies `value` to rows where `column` is null and every condition in
/// `when` holds. At most `expected_matches` rows may match; more means the
/// input is not the data the patch was written for. No match leaves the
/// data unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPatch {
    pub column: String,
    pub value: FillValue,
    #[serde(default)]
    pub when: Vec<PatchCondition>,
    #[serde(default = "default_expected_matches")]
    pub expected_matches: usize,
}

fn default_expected_matches() -> usize {
    1
}

/// One tier of the coordinate fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum FallbackTier {
    /// Mean of known values among rows sharing the same `by` key.
    GroupMean { by: String },
    /// Median of all known values in the column.
    GlobalMedian,
}

impl fmt::Display for FallbackTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackTier::GroupMean { by } => write!(f, "mean by '{}'", by),
            FallbackTier::GlobalMedian => write!(f, "global median"),
        }
    }
}

/// Configuration for the cleaning pipeline.
///
/// Use [`CleaningConfig::builder()`] for a fluent setup, or deserialize from
/// JSON. Missing JSON fields fall back to the tsunami defaults.
///
/// # Example
///
/// ```rust,ignore
/// use tsunami_processing::config::CleaningConfig;
///
/// let config = CleaningConfig::builder()
///     .valid_codes(vec![3, 4])
///     .output_dir("cleaned")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Full expected input schema. Extra input columns are rejected.
    /// An empty list disables the extra-column check.
    pub source_columns: Vec<String>,

    /// Columns removed in Stage A.
    pub drop_columns: Vec<String>,

    /// Columns whose nulls become 0 before integer coercion.
    pub int_columns: Vec<String>,

    /// Coded columns kept as nullable integer codes with a categorical role.
    pub category_columns: Vec<String>,

    /// Columns filled with their post-filter median.
    pub median_fill_columns: Vec<String>,

    /// Column holding the event validity code.
    /// Default: "Tsunami Event Validity"
    pub validity_column: String,

    /// Validity codes kept by Stage C.
    /// Default: [2, 3, 4]
    pub valid_codes: Vec<i64>,

    /// Per-column constant fills.
    pub constant_fills: Vec<ConstantFill>,

    /// Targeted single-row fills, validated against their expected match count.
    pub data_patches: Vec<DataPatch>,

    /// Columns imputed through the fallback chain.
    /// Default: ["Latitude", "Longitude"]
    pub coordinate_columns: Vec<String>,

    /// Ordered fallback tiers; must end with [`FallbackTier::GlobalMedian`].
    pub coordinate_fallback: Vec<FallbackTier>,

    /// Field separator of the input file.
    /// Default: '\t'
    pub input_separator: char,

    /// Extra strings read as null besides empty fields.
    /// Default: "NaN", "nan"
    pub null_markers: Vec<String>,

    /// Output directory for the cleaned CSV and report.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Output file name without extension.
    /// Default: "CleanedTsunamiDataIndex"
    pub output_name: String,

    /// Whether the CSV carries a leading row index column.
    /// Default: true
    pub include_index: bool,

    /// Header of the index column. Empty matches an unnamed index.
    pub index_label: String,

    /// Whether to write the cleaned data to disk.
    /// Default: true
    pub save_to_disk: bool,

    /// Whether to write the JSON report next to the CSV.
    /// Default: false
    pub generate_reports: bool,

    /// Number of most frequent values listed per categorical column.
    /// Default: 5
    pub top_n_categories: usize,

    /// Number of histogram bins per numeric column.
    /// Default: 10
    pub histogram_bins: usize,
}

fn to_strings(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            source_columns: to_strings(&SOURCE_COLUMNS),
            drop_columns: to_strings(&DROP_COLUMNS),
            int_columns: to_strings(&INT_COLUMNS),
            category_columns: to_strings(&CATEGORY_COLUMNS),
            median_fill_columns: to_strings(&MEDIAN_FILL_COLUMNS),
            validity_column: "Tsunami Event Validity".to_string(),
            valid_codes: vec![2, 3, 4],
            constant_fills: default_constant_fills(),
            data_patches: default_data_patches(),
            coordinate_columns: vec!["Latitude".to_string(), "Longitude".to_string()],
            coordinate_fallback: default_coordinate_fallback(),
            input_separator: '\t',
            null_markers: vec!["NaN".to_string(), "nan".to_string()],
            output_dir: PathBuf::from("output"),
            output_name: "CleanedTsunamiDataIndex".to_string(),
            include_index: true,
            index_label: String::new(),
            save_to_disk: true,
            generate_reports: false,
            top_n_categories: 5,
            histogram_bins: 10,
        }
    }
}

fn default_constant_fills() -> Vec<ConstantFill> {
    vec![
        // Area is only recorded for USA and Canada.
        ConstantFill::new("Area", FillValue::Text("NA".to_string())),
        ConstantFill::new("Damage ($Mil)", FillValue::Float(0.0)),
        ConstantFill::new("Death Description", FillValue::Int(1)),
        ConstantFill::new("Damage Description", FillValue::Int(1)),
    ]
}

fn default_data_patches() -> Vec<DataPatch> {
    vec![DataPatch {
        column: "Location Name".to_string(),
        value: FillValue::Text("In New Zealand".to_string()),
        when: vec![PatchCondition {
            column: "Country".to_string(),
            equals: "NEW ZEALAND".to_string(),
        }],
        expected_matches: 1,
    }]
}

fn default_coordinate_fallback() -> Vec<FallbackTier> {
    vec![
        FallbackTier::GroupMean {
            by: "Location Name".to_string(),
        },
        FallbackTier::GroupMean {
            by: "Country".to_string(),
        },
        FallbackTier::GlobalMedian,
    ]
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// Fields absent from the file keep their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: CleaningConfig = serde_json::from_str(&text)?;
        config.validate()?;
        tracing::debug!("Loaded cleaning configuration from {}", path.display());
        Ok(config)
    }

    /// Columns that survive Stage A, in source order.
    ///
    /// Only meaningful when `source_columns` is set.
    pub fn retained_columns(&self) -> Vec<String> {
        let dropped: HashSet<&str> = self.drop_columns.iter().map(String::as_str).collect();
        self.source_columns
            .iter()
            .filter(|c| !dropped.contains(c.as_str()))
            .cloned()
            .collect()
    }

    /// Every column name the cleaning rules refer to, without duplicates.
    pub fn referenced_columns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        let mut push = |name: &str| {
            if seen.insert(name.to_string()) {
                columns.push(name.to_string());
            }
        };

        for c in &self.drop_columns {
            push(c);
        }
        for c in &self.int_columns {
            push(c);
        }
        for c in &self.category_columns {
            push(c);
        }
        push(&self.validity_column);
        for c in &self.median_fill_columns {
            push(c);
        }
        for fill in &self.constant_fills {
            push(&fill.column);
        }
        for patch in &self.data_patches {
            push(&patch.column);
            for condition in &patch.when {
                push(&condition.column);
            }
        }
        for c in &self.coordinate_columns {
            push(c);
        }
        // Group keys only matter when there is something to impute.
        if !self.coordinate_columns.is_empty() {
            for tier in &self.coordinate_fallback {
                if let FallbackTier::GroupMean { by } = tier {
                    push(by);
                }
            }
        }
        columns
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.valid_codes.is_empty() {
            return Err(ConfigValidationError::EmptyValidCodes);
        }

        if !self.input_separator.is_ascii() {
            return Err(ConfigValidationError::InvalidSeparator(self.input_separator));
        }

        if self.top_n_categories == 0 {
            return Err(ConfigValidationError::InvalidCount {
                field: "top_n_categories".to_string(),
                value: 0,
            });
        }

        if self.histogram_bins == 0 {
            return Err(ConfigValidationError::InvalidCount {
                field: "histogram_bins".to_string(),
                value: 0,
            });
        }

        if self.output_name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyOutputName);
        }

        // A column has at most one type role.
        let roles = [
            ("int_columns", &self.int_columns),
            ("category_columns", &self.category_columns),
            ("median_fill_columns", &self.median_fill_columns),
            ("coordinate_columns", &self.coordinate_columns),
        ];
        for (i, (first, a)) in roles.iter().enumerate() {
            for (second, b) in roles.iter().skip(i + 1) {
                if let Some(column) = a.iter().find(|c| b.contains(c)) {
                    return Err(ConfigValidationError::ConflictingColumnRoles {
                        column: column.clone(),
                        first: first.to_string(),
                        second: second.to_string(),
                    });
                }
            }
        }

        // Nothing downstream of Stage A may use a dropped column.
        let dropped: HashSet<&str> = self.drop_columns.iter().map(String::as_str).collect();
        let mut used = vec![("validity_column", self.validity_column.as_str())];
        for (field, list) in roles {
            used.extend(list.iter().map(|c| (field, c.as_str())));
        }
        used.extend(
            self.constant_fills
                .iter()
                .map(|f| ("constant_fills", f.column.as_str())),
        );
        for patch in &self.data_patches {
            used.push(("data_patches", patch.column.as_str()));
            used.extend(patch.when.iter().map(|c| ("data_patches", c.column.as_str())));
        }
        if !self.coordinate_columns.is_empty() {
            for tier in &self.coordinate_fallback {
                if let FallbackTier::GroupMean { by } = tier {
                    used.push(("coordinate_fallback", by.as_str()));
                }
            }
        }
        if let Some((field, column)) = used.into_iter().find(|(_, c)| dropped.contains(c)) {
            return Err(ConfigValidationError::DroppedColumnReferenced {
                column: column.to_string(),
                field: field.to_string(),
            });
        }

        if !self.coordinate_columns.is_empty() {
            match self.coordinate_fallback.last() {
                Some(FallbackTier::GlobalMedian) => {}
                _ => return Err(ConfigValidationError::UnterminatedFallbackChain),
            }
            if let Some(index) = self
                .coordinate_fallback
                .iter()
                .position(|t| *t == FallbackTier::GlobalMedian)
                && index + 1 != self.coordinate_fallback.len()
            {
                return Err(ConfigValidationError::UnreachableFallbackTier(index + 1));
            }
        }

        if let Some(patch) = self.data_patches.iter().find(|p| p.expected_matches == 0) {
            return Err(ConfigValidationError::InvalidExpectedMatches(
                patch.column.clone(),
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("valid_codes must list at least one validity code")]
    EmptyValidCodes,

    #[error("Invalid input separator {0:?} (must be a single ASCII character)")]
    InvalidSeparator(char),

    #[error("Invalid value for '{field}': {value} (must be at least 1)")]
    InvalidCount { field: String, value: usize },

    #[error("output_name must not be empty")]
    EmptyOutputName,

    #[error("Column '{column}' is listed in both {first} and {second}")]
    ConflictingColumnRoles {
        column: String,
        first: String,
        second: String,
    },

    #[error("Column '{column}' is dropped in Stage A but referenced by {field}")]
    DroppedColumnReferenced { column: String, field: String },

    #[error("coordinate_fallback must end with the global_median tier")]
    UnterminatedFallbackChain,

    #[error("coordinate_fallback tier {0} follows global_median and can never apply")]
    UnreachableFallbackTier(usize),

    #[error("Data patch for column '{0}' must expect at least one matching row")]
    InvalidExpectedMatches(String),
}

impl From<ConfigValidationError> for CleaningError {
    fn from(err: ConfigValidationError) -> Self {
        CleaningError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    source_columns: Option<Vec<String>>,
    drop_columns: Option<Vec<String>>,
    int_columns: Option<Vec<String>>,
    category_columns: Option<Vec<String>>,
    median_fill_columns: Option<Vec<String>>,
    validity_column: Option<String>,
    valid_codes: Option<Vec<i64>>,
    constant_fills: Option<Vec<ConstantFill>>,
    data_patches: Option<Vec<DataPatch>>,
    coordinate_columns: Option<Vec<String>>,
    coordinate_fallback: Option<Vec<FallbackTier>>,
    input_separator: Option<char>,
    null_markers: Option<Vec<String>>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    include_index: Option<bool>,
    index_label: Option<String>,
    save_to_disk: Option<bool>,
    generate_reports: Option<bool>,
    top_n_categories: Option<usize>,
    histogram_bins: Option<usize>,
}

fn owned<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl CleaningConfigBuilder {
    /// Set the expected input schema. An empty list accepts extra columns.
    pub fn source_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_columns = Some(owned(columns));
        self
    }

    /// Set the columns removed in Stage A.
    pub fn drop_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop_columns = Some(owned(columns));
        self
    }

    /// Set the columns coerced to integers with nulls as zero.
    pub fn int_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.int_columns = Some(owned(columns));
        self
    }

    /// Set the coded categorical columns.
    pub fn category_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category_columns = Some(owned(columns));
        self
    }

    /// Set the columns filled with their post-filter median.
    pub fn median_fill_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.median_fill_columns = Some(owned(columns));
        self
    }

    /// Set the column holding the validity code.
    pub fn validity_column(mut self, column: impl Into<String>) -> Self {
        self.validity_column = Some(column.into());
        self
    }

    /// Set the validity codes retained by Stage C.
    pub fn valid_codes(mut self, codes: Vec<i64>) -> Self {
        self.valid_codes = Some(codes);
        self
    }

    /// Replace the constant fills.
    pub fn constant_fills(mut self, fills: Vec<ConstantFill>) -> Self {
        self.constant_fills = Some(fills);
        self
    }

    /// Replace the data patches.
    pub fn data_patches(mut self, patches: Vec<DataPatch>) -> Self {
        self.data_patches = Some(patches);
        self
    }

    /// Set the columns imputed through the fallback chain.
    pub fn coordinate_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.coordinate_columns = Some(owned(columns));
        self
    }

    /// Set the ordered fallback tiers.
    pub fn coordinate_fallback(mut self, tiers: Vec<FallbackTier>) -> Self {
        self.coordinate_fallback = Some(tiers);
        self
    }

    /// Set the input field separator.
    pub fn input_separator(mut self, separator: char) -> Self {
        self.input_separator = Some(separator);
        self
    }

    /// Set extra strings parsed as null.
    pub fn null_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_markers = Some(owned(markers));
        self
    }

    /// Set the output directory.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the output file name (without extension).
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Enable or disable the leading index column in the CSV.
    pub fn include_index(mut self, include: bool) -> Self {
        self.include_index = Some(include);
        self
    }

    /// Set the header of the index column.
    pub fn index_label(mut self, label: impl Into<String>) -> Self {
        self.index_label = Some(label.into());
        self
    }

    /// Enable or disable writing output files.
    ///
    /// When false the cleaned frame and profile are only returned in memory.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Enable or disable the JSON report.
    pub fn generate_reports(mut self, generate: bool) -> Self {
        self.generate_reports = Some(generate);
        self
    }

    /// Set how many frequent values are listed per categorical column.
    pub fn top_n_categories(mut self, n: usize) -> Self {
        self.top_n_categories = Some(n);
        self
    }

    /// Set the number of histogram bins.
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    /// Build the configuration.
    ///
    /// Unset fields take the tsunami defaults. Returns an error if the
    /// resulting configuration is invalid.
    pub fn build(self) -> std::result::Result<CleaningConfig, ConfigValidationError> {
        let defaults = CleaningConfig::default();
        let config = CleaningConfig {
            source_columns: self.source_columns.unwrap_or(defaults.source_columns),
            drop_columns: self.drop_columns.unwrap_or(defaults.drop_columns),
            int_columns: self.int_columns.unwrap_or(defaults.int_columns),
            category_columns: self.category_columns.unwrap_or(defaults.category_columns),
            median_fill_columns: self
                .median_fill_columns
                .unwrap_or(defaults.median_fill_columns),
            validity_column: self.validity_column.unwrap_or(defaults.validity_column),
            valid_codes: self.valid_codes.unwrap_or(defaults.valid_codes),
            constant_fills: self.constant_fills.unwrap_or(defaults.constant_fills),
            data_patches: self.data_patches.unwrap_or(defaults.data_patches),
            coordinate_columns: self
                .coordinate_columns
                .unwrap_or(defaults.coordinate_columns),
            coordinate_fallback: self
                .coordinate_fallback
                .unwrap_or(defaults.coordinate_fallback),
            input_separator: self.input_separator.unwrap_or(defaults.input_separator),
            null_markers: self.null_markers.unwrap_or(defaults.null_markers),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            output_name: self.output_name.unwrap_or(defaults.output_name),
            include_index: self.include_index.unwrap_or(defaults.include_index),
            index_label: self.index_label.unwrap_or(defaults.index_label),
            save_to_disk: self.save_to_disk.unwrap_or(defaults.save_to_disk),
            generate_reports: self.generate_reports.unwrap_or(defaults.generate_reports),
            top_n_categories: self.top_n_categories.unwrap_or(defaults.top_n_categories),
            histogram_bins: self.histogram_bins.unwrap_or(defaults.histogram_bins),
        };

        config.validate()?;
        Ok(config)
    }
}
