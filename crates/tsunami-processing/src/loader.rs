//! Reading the raw events export.
//!
//! The export is tab separated with a header row. Empty fields are null;
//! additional null markers can be configured. Quoted fields are tried
//! first, then the file is re-read with quote handling disabled, since
//! free-text location names occasionally contain a stray `"`.
//!
//! Float NaN is normalized to null after reading, so fills and statistics
//! only ever deal with one kind of missing value.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::CleaningConfig;
use crate::error::{CleaningError, Result, ResultExt};

/// Load a delimited file with full-column schema inference.
pub fn load_delimited(
    path: impl AsRef<Path>,
    separator: u8,
    null_markers: &[String],
) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CleaningError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input file not found: {}", path.display()),
        )));
    }

    // Strategy 1: standard quoting
    match read_with(path, separator, null_markers, Some(b'"')) {
        Ok(df) => {
            let df = nan_to_null(df).context("Normalizing NaN values")?;
            info!(
                "Loaded {} rows x {} columns from {}",
                df.height(),
                df.width(),
                path.display()
            );
            return Ok(df);
        }
        Err(e) => {
            debug!("Quoted read of {} failed: {}", path.display(), e);
        }
    }

    // Strategy 2: quotes as literal characters
    warn!("Retrying {} with quote handling disabled", path.display());
    let df = read_with(path, separator, null_markers, None)
        .context(format!("Failed to read {}", path.display()))?;
    let df = nan_to_null(df).context("Normalizing NaN values")?;
    info!(
        "Loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Load the input described by a configuration.
pub fn load_for_config(path: impl AsRef<Path>, config: &CleaningConfig) -> Result<DataFrame> {
    load_delimited(path, config.input_separator as u8, &config.null_markers)
}

/// Replace float NaN with null in every float column.
pub fn nan_to_null(mut df: DataFrame) -> PolarsResult<DataFrame> {
    let float_columns: Vec<PlSmallStr> = df
        .get_columns()
        .iter()
        .filter(|c| c.dtype().is_float())
        .map(|c| c.name().clone())
        .collect();

    for name in float_columns {
        let series = df.column(&name)?.as_materialized_series();
        let nans = crate::utils::nan_count(series)?;
        if nans == 0 {
            continue;
        }
        let cleaned = crate::utils::nan_as_null(series)?;
        debug!("'{}': {} NaN value(s) read as null", name, nans);
        df.replace(&name, cleaned)?;
    }
    Ok(df)
}

fn read_with(
    path: &Path,
    separator: u8,
    null_markers: &[String],
    quote_char: Option<u8>,
) -> PolarsResult<DataFrame> {
    let null_values = if null_markers.is_empty() {
        None
    } else {
        Some(NullValues::AllColumns(
            null_markers.iter().map(|m| m.as_str().into()).collect(),
        ))
    };

    CsvReadOptions::default()
        .with_infer_schema_length(None)
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(separator)
                .with_quote_char(quote_char)
                .with_null_values(null_values),
        )
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_tab_separated() {
        let file = write_temp("Year\tCountry\tDeaths\n1946\tUSA\t165\n1960\tCHILE\t\n");
        let df = load_delimited(file.path(), b'\t', &[]).unwrap();

        assert_eq!(df.shape(), (2, 3));
        assert_eq!(df.column("Deaths").unwrap().null_count(), 1);
        assert_eq!(
            df.column("Country").unwrap().str().unwrap().get(1),
            Some("CHILE")
        );
    }

    #[test]
    fn test_load_with_null_markers() {
        let file = write_temp("Area\tDeaths\nHI\t-\n-\t3\n");
        let df = load_delimited(file.path(), b'\t', &["-".to_string()]).unwrap();

        assert_eq!(df.column("Area").unwrap().null_count(), 1);
        assert_eq!(df.column("Deaths").unwrap().null_count(), 1);
    }

    #[test]
    fn test_nan_tokens_are_read_as_null() {
        let file = write_temp("Magnitude\tArea\n7.5\tHI\nNaN\tnan\n6.0\tAK\n");
        let markers = CleaningConfig::default().null_markers;
        let df = load_delimited(file.path(), b'\t', &markers).unwrap();

        let mags = df.column("Magnitude").unwrap();
        assert_eq!(mags.null_count(), 1);
        assert_eq!(df.column("Area").unwrap().null_count(), 1);
    }

    #[test]
    fn test_nan_without_markers_is_normalized() {
        let file = write_temp("Latitude\n38.3\nNaN\n");
        let df = load_delimited(file.path(), b'\t', &[]).unwrap();

        let lat = df.column("Latitude").unwrap().f64().unwrap();
        assert_eq!(lat.get(0), Some(38.3));
        assert_eq!(lat.get(1), None);
    }

    #[test]
    fn test_nan_to_null_leaves_other_columns() {
        let df = df![
            "Latitude" => [Some(f64::NAN), Some(1.0), None],
            "Country" => ["JAPAN", "CHILE", "PERU"],
        ]
        .unwrap();
        let df = nan_to_null(df).unwrap();

        assert_eq!(df.column("Latitude").unwrap().null_count(), 2);
        assert_eq!(df.column("Country").unwrap().null_count(), 0);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_delimited("/nonexistent/events.tsv", b'\t', &[]);
        assert_eq!(result.unwrap_err().error_code(), "IO_ERROR");
    }
}
