use std::collections::HashSet;

use log::{debug, info};
use polars::prelude::*;

use crate::allergen::ImputeStrategy;
use crate::config::DatasetConfig;
use crate::error::AllervisError;
use crate::schema::{series as src, table};
use crate::source::{self, AllergenSeries};
use crate::table::AllergenTable;

const ROW_INDEX: &str = "_row";
const NAME_COUNT: &str = "_names";

/// Build the normalized table from in-memory series and a (Code, Continent)
/// lookup.
///
/// Steps: latest observation per country and allergen, full join on the
/// country code, per-column imputation, scaling by the column maximum and a
/// left join of the continent lookup. Column order follows `series`; rows
/// are ordered by country code.
pub fn normalize(
    series: &[AllergenSeries],
    continents: &DataFrame,
) -> Result<AllergenTable, AllervisError> {
    if series.is_empty() {
        return Err(AllervisError::Validation(
            "No allergen series to normalize".to_string(),
        ));
    }
    let mut names = HashSet::new();
    for s in series {
        if !names.insert(s.name.as_str()) {
            return Err(AllervisError::Validation(format!(
                "Allergen series '{}' given twice",
                s.name
            )));
        }
    }

    let latest = series
        .iter()
        .map(latest_per_country)
        .collect::<Result<Vec<_>, _>>()?;

    // One entity name per code across every series.
    let entity_frames: Vec<LazyFrame> = latest
        .iter()
        .map(|df| df.clone().lazy().select([col(src::CODE), col(src::ENTITY)]))
        .collect();
    let entities = concat(entity_frames, UnionArgs::default())?
        .group_by([col(src::CODE)])
        .agg([
            col(src::ENTITY).first(),
            col(src::ENTITY).n_unique().alias(NAME_COUNT),
        ])
        .collect()?;
    reject_conflicting_names(&entities, "across allergen series")?;

    let merged = series
        .iter()
        .zip(&latest)
        .map(|(s, df)| {
            df.clone()
                .lazy()
                .select([col(src::CODE), col(s.name.as_str())])
        })
        .reduce(|merged, frame| {
            merged.join(
                frame,
                [col(src::CODE)],
                [col(src::CODE)],
                JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
            )
        })
        .ok_or_else(|| AllervisError::Validation("No allergen series to normalize".to_string()))?;
    let merged = merged
        .join(
            entities.lazy().select([col(src::CODE), col(src::ENTITY)]),
            [col(src::CODE)],
            [col(src::CODE)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;

    let mut scaled = Vec::with_capacity(series.len());
    for s in series {
        scaled.push(impute_and_scale(&merged, &s.name, s.strategy)?);
    }

    let mut output = vec![col(table::CODE), col(table::ENTITY)];
    output.extend(series.iter().map(|s| col(s.name.as_str())));
    output.push(col(table::CONTINENT));

    let df = merged
        .lazy()
        .with_columns(scaled)
        .join(
            continents
                .clone()
                .lazy()
                .select([col(table::CODE), col(table::CONTINENT)]),
            [col(table::CODE)],
            [col(table::CODE)],
            JoinArgs::new(JoinType::Left),
        )
        .select(output)
        .sort([table::CODE], SortMultipleOptions::default())
        .collect()?;

    let unmatched = df.column(table::CONTINENT)?.null_count();
    if unmatched > 0 {
        debug!("{unmatched} countries have no continent");
    }

    let table = AllergenTable::from_dataframe(&df)?;
    info!(
        "normalized {} countries across {} allergens",
        table.len(),
        series.len()
    );
    Ok(table)
}

/// Read the configured files, normalize, and persist the result.
pub fn normalize_dataset(config: &DatasetConfig) -> Result<AllergenTable, AllervisError> {
    config.validate()?;
    let series = source::load_allergen_series(config)?;
    let continents = source::load_continents(config)?;
    let table = normalize(&series, &continents)?;
    table.write_csv(&config.output_path())?;
    Ok(table)
}

/// Keep the chronologically latest observation per country code.
/// A year tie goes to the row that comes later in the file.
fn latest_per_country(series: &AllergenSeries) -> Result<DataFrame, AllervisError> {
    let name = series.name.as_str();
    let df = series
        .frame
        .clone()
        .lazy()
        .with_row_index(ROW_INDEX, None)
        .group_by([col(src::CODE)])
        .agg([
            col(src::ENTITY).first(),
            col(src::ENTITY).n_unique().alias(NAME_COUNT),
            col(name)
                .sort_by([col(src::YEAR), col(ROW_INDEX)], SortMultipleOptions::default())
                .last(),
        ])
        .collect()?;
    reject_conflicting_names(&df, &format!("in {name}"))?;
    Ok(df)
}

fn reject_conflicting_names(df: &DataFrame, context: &str) -> Result<(), AllervisError> {
    let conflicts = df
        .clone()
        .lazy()
        .filter(col(NAME_COUNT).gt(lit(1)))
        .sort([src::CODE], SortMultipleOptions::default())
        .collect()?;
    let first = conflicts.column(src::CODE)?.str()?.into_iter().next().flatten();
    match first {
        Some(code) => Err(AllervisError::DuplicateCountry {
            code: code.to_string(),
            detail: format!("named differently {context}"),
        }),
        None => Ok(()),
    }
}

/// Expression filling the gaps of one column and dividing by its maximum.
fn impute_and_scale(
    merged: &DataFrame,
    name: &str,
    strategy: ImputeStrategy,
) -> Result<Expr, AllervisError> {
    let column = merged.column(name)?;
    if column.null_count() == merged.height() {
        return Err(AllervisError::EmptyAllergen(name.to_string()));
    }
    // The fill value never exceeds the observed maximum.
    match column.f64()?.max() {
        Some(max) if max > 0.0 => {}
        _ => return Err(AllervisError::DegenerateColumn(name.to_string())),
    }
    debug!(
        "{name}: filling {} missing values ({strategy:?})",
        column.null_count()
    );

    let fill = match strategy {
        ImputeStrategy::Minimum => col(name).min(),
        ImputeStrategy::Median => col(name).median(),
    };
    Ok((col(name).fill_null(fill) / col(name).max()).alias(name))
}
