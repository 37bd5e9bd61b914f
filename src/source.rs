use std::path::Path;

use log::{debug, info, warn};
use polars::prelude::*;

use crate::allergen::ImputeStrategy;
use crate::config::DatasetConfig;
use crate::error::AllervisError;
use crate::region::Continent;
use crate::schema::{series, table};

const WHITESPACE: &str = " \t\r\n";

/// A per-allergen time series.
///
/// `frame` holds Code, Entity, Year (Int64) and one Float64 column named
/// after the allergen, in file order. Rows without a country code are
/// already dropped; a null value means the file had no usable number.
#[derive(Debug, Clone)]
pub struct AllergenSeries {
    pub name: String,
    pub strategy: ImputeStrategy,
    pub frame: DataFrame,
}

/// Read every allergen file named by the config, in catalogue order.
pub fn load_allergen_series(
    config: &DatasetConfig,
) -> Result<Vec<AllergenSeries>, AllervisError> {
    config
        .allergens
        .iter()
        .map(|source| {
            let path = config.allergen_path(source);
            read_allergen_series(
                &path,
                &source.name,
                source.category.impute_strategy(),
                config.value_column.as_deref(),
            )
        })
        .collect()
}

/// Read one allergen file.
///
/// Required columns: Entity, Code, Year, + the value column (the last
/// column unless `value_column` names another one).
pub fn read_allergen_series(
    path: &Path,
    name: &str,
    strategy: ImputeStrategy,
    value_column: Option<&str>,
) -> Result<AllergenSeries, AllervisError> {
    let raw = read_csv_as_strings(path)?;
    require_columns(&raw, &[series::ENTITY, series::CODE, series::YEAR])?;

    let value_col = match value_column {
        Some(c) => {
            require_columns(&raw, &[c])?;
            c.to_string()
        }
        None => raw
            .get_column_names_str()
            .last()
            .map(|c| c.to_string())
            .ok_or_else(|| {
                AllervisError::InvalidData(format!("{} has no columns", path.display()))
            })?,
    };
    if [series::ENTITY, series::CODE, series::YEAR].contains(&value_col.as_str()) {
        return Err(AllervisError::MissingColumn(format!(
            "value column in {}",
            path.display()
        )));
    }

    let total = raw.height();
    let frame = raw
        .lazy()
        .select([
            col(series::CODE).str().strip_chars(lit(WHITESPACE)),
            col(series::ENTITY)
                .str()
                .strip_chars(lit(WHITESPACE))
                .fill_null(lit("")),
            col(series::YEAR)
                .str()
                .strip_chars(lit(WHITESPACE))
                .cast(DataType::Int64),
            col(value_col.as_str())
                .str()
                .strip_chars(lit(WHITESPACE))
                .cast(DataType::Float64)
                .alias(name),
        ])
        // Regional aggregates ("Africa", "World", ...) come without a code.
        .filter(col(series::CODE).is_not_null().and(col(series::CODE).neq(lit(""))))
        .collect()?;

    let skipped = total - frame.height();
    if skipped > 0 {
        debug!("{name}: skipped {skipped} rows without a country code");
    }

    let years = frame.column(series::YEAR)?;
    if years.null_count() > 0 {
        return Err(AllervisError::InvalidData(format!(
            "{}: {} rows have no valid year",
            path.display(),
            years.null_count()
        )));
    }

    let invalid = frame
        .clone()
        .lazy()
        .filter(col(name).lt(lit(0.0)).or(col(name).is_finite().not()))
        .collect()?;
    if invalid.height() > 0 {
        let code = invalid.column(series::CODE)?.str()?.get(0).unwrap_or("");
        return Err(AllervisError::InvalidData(format!(
            "{}: {} consumption values are not non-negative numbers (first: '{}')",
            path.display(),
            invalid.height(),
            code
        )));
    }

    info!(
        "read {} observations for {} from {}",
        frame.height(),
        name,
        path.display()
    );

    Ok(AllergenSeries {
        name: name.to_string(),
        strategy,
        frame,
    })
}

pub fn load_continents(config: &DatasetConfig) -> Result<DataFrame, AllervisError> {
    read_continents(
        &config.continents_path(),
        &config.continent_code_column,
        &config.continent_column,
    )
}

/// Read the country → continent lookup as a (Code, Continent) frame.
///
/// Continent values are canonical region codes; "NA" becomes "NAM" and codes
/// outside the six continents become null. Extra columns are ignored.
pub fn read_continents(
    path: &Path,
    code_column: &str,
    continent_column: &str,
) -> Result<DataFrame, AllervisError> {
    let raw = read_csv_as_strings(path)?;
    require_columns(&raw, &[code_column, continent_column])?;

    let df = raw
        .lazy()
        .select([
            col(code_column)
                .str()
                .strip_chars(lit(WHITESPACE))
                .alias(table::CODE),
            col(continent_column)
                .str()
                .strip_chars(lit(WHITESPACE))
                .alias(table::CONTINENT),
        ])
        .filter(col(table::CODE).is_not_null().and(col(table::CODE).neq(lit(""))))
        .collect()?;

    let duplicates = df
        .clone()
        .lazy()
        .group_by([col(table::CODE)])
        .agg([len().alias("_rows")])
        .filter(col("_rows").gt(lit(1)))
        .sort([table::CODE], SortMultipleOptions::default())
        .collect()?;
    if let Some(code) = duplicates.column(table::CODE)?.str()?.into_iter().next().flatten() {
        return Err(AllervisError::DuplicateCountry {
            code: code.to_string(),
            detail: format!("listed twice in {}", path.display()),
        });
    }

    let codes = df.column(table::CODE)?.str()?;
    let raw_continents = df.column(table::CONTINENT)?.str()?;
    let continents: Vec<Option<&str>> = codes
        .into_iter()
        .zip(raw_continents)
        .map(|(code, raw)| {
            let raw = raw.unwrap_or("");
            let continent = Continent::from_code(raw);
            if continent.is_none() {
                warn!(
                    "country {}: continent '{raw}' is not a dashboard region; left empty",
                    code.unwrap_or("")
                );
            }
            continent.map(Continent::code)
        })
        .collect();

    let out = DataFrame::new(vec![
        df.column(table::CODE)?.clone(),
        Column::new(table::CONTINENT.into(), &continents),
    ])?;
    debug!("read {} continent assignments", out.height());
    Ok(out)
}

/// Read a CSV file with all columns as String dtype.
/// Trims whitespace from column names.
pub(crate) fn read_csv_as_strings(path: &Path) -> Result<DataFrame, AllervisError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;
    Ok(df)
}

pub(crate) fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), AllervisError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(AllervisError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}
