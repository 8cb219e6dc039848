use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info};

use crate::config::PanelConfig;
use crate::error::{PanelError, Result};
use crate::schema::*;

const BLANKS: &str = " \t\r\n";

/// Load the survey file named by `config`.
pub fn load_records(config: &PanelConfig) -> Result<DataFrame> {
    load_records_from(&config.records_path(), config)
}

/// Load a semicolon-delimited survey file.
///
/// Required columns: see [`REQUIRED`]. `Estado`, `Região` and `Ano` are
/// optional; the first two default to the configured state/region, the year
/// to 0.
///
/// Area and volume are coerced to non-negative floats (unparseable -> 0),
/// the year to an integer (unparseable -> 0, `2021.0` -> 2021), coordinates
/// to nullable floats. A decimal comma is accepted in all of them.
/// Missing categorical values become [`sentinel::NOT_INFORMED`].
pub fn load_records_from(path: &Path, config: &PanelConfig) -> Result<DataFrame> {
    let raw = read_csv_as_strings(path)?;
    debug!(path = %path.display(), columns = ?raw.get_column_names_str(), "survey columns found");

    require_columns(&raw, &[geo::LATITUDE, geo::LONGITUDE])?;
    require_columns(&raw, &REQUIRED)?;

    let df = coerce(raw, config)?;
    info!(path = %path.display(), rows = df.height(), "survey records loaded");
    Ok(df)
}

/// Read a CSV file with all columns as String dtype.
/// Cleans column names of surrounding whitespace, BOM and line breaks.
fn read_csv_as_strings(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(PanelError::SourceNotFound(path.to_path_buf()));
    }

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .map_parse_options(|opts| opts.with_separator(b';'))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let cleaned: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| clean_column_name(c))
        .collect();
    df.set_column_names(cleaned.as_slice())?;

    Ok(df)
}

pub(crate) fn clean_column_name(name: &str) -> String {
    name.replace(['\u{feff}', '\r', '\n'], "").trim().to_string()
}

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| df.column(name).is_err())
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    Err(PanelError::MissingColumns {
        missing,
        found: df
            .get_column_names_str()
            .iter()
            .map(|c| c.to_string())
            .collect(),
    })
}

fn coerce(raw: DataFrame, config: &PanelConfig) -> Result<DataFrame> {
    let schema = raw.schema();
    let has_state = schema.contains(identity::STATE);
    let has_region = schema.contains(identity::REGION);
    let has_year = schema.contains(production::YEAR);

    let mut lazy = raw.lazy();

    if !has_state {
        lazy = lazy.with_column(lit(config.default_state.clone()).alias(identity::STATE));
    }
    if !has_region {
        lazy = lazy.with_column(lit(config.default_region.clone()).alias(identity::REGION));
    }

    let year = if has_year {
        decimal(production::YEAR)
            .cast(DataType::Float64)
            .cast(DataType::Int64)
            .fill_null(lit(0i64))
    } else {
        lit(0i64).cast(DataType::Int64)
    };

    lazy = lazy.with_columns([
        non_negative(production::AREA_HA),
        non_negative(production::VOLUME_KG),
        decimal(geo::LATITUDE).cast(DataType::Float64),
        decimal(geo::LONGITUDE).cast(DataType::Float64),
        year.alias(production::YEAR),
    ]);

    lazy = lazy.with_columns(NORMALIZED.iter().map(|c| normalized(c)).collect::<Vec<_>>());

    Ok(lazy.collect()?)
}

fn stripped(column: &str) -> Expr {
    col(column).str().strip_chars(lit(BLANKS))
}

/// Decimal comma read as a point ("1,5" -> "1.5"). Thousands separators are
/// not recognized, so "1.200,5" stays unparseable.
fn decimal(column: &str) -> Expr {
    stripped(column).str().replace_all(lit(","), lit("."), true)
}

fn non_negative(column: &str) -> Expr {
    let value = decimal(column)
        .cast(DataType::Float64)
        .fill_null(lit(0.0));
    when(value.clone().gt(lit(0.0)))
        .then(value)
        .otherwise(lit(0.0))
        .alias(column)
}

fn normalized(column: &str) -> Expr {
    let value = col(column).cast(DataType::String).str().strip_chars(lit(BLANKS));
    when(value.clone().is_null().or(value.clone().eq(lit(""))))
        .then(lit(sentinel::NOT_INFORMED))
        .otherwise(value)
        .alias(column)
}
