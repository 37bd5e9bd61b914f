use std::cmp::Ordering;

use polars::prelude::*;

use crate::error::AllervisError;
use crate::region::{ColorScheme, Continent, GeoScope, MapIdiom, Region};
use crate::schema::{table, view};
use crate::table::AllergenTable;

/// A validated, non-empty allergen selection in table column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    indices: Vec<usize>,
    names: Vec<String>,
}

impl Selection {
    /// Duplicates are dropped; unknown names are rejected.
    pub fn new<S: AsRef<str>>(table: &AllergenTable, names: &[S]) -> Result<Self, AllervisError> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let idx = table
                .allergen_index(name)
                .ok_or_else(|| AllervisError::UnknownAllergen(name.to_string()))?;
            indices.push(idx);
        }
        if indices.is_empty() {
            return Err(AllervisError::EmptySelection);
        }
        indices.sort_unstable();
        indices.dedup();
        let names = indices
            .iter()
            .map(|&i| table.allergens()[i].clone())
            .collect();
        Ok(Self { indices, names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// One country with the derived columns for a selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub code: String,
    pub entity: String,
    pub continent: Option<Continent>,
    /// Selected allergen values, aligned with [`Selection::names`].
    pub values: Vec<f64>,
    pub selected_set: f64,
    pub most_prevalent_allergen: String,
    pub least_prevalent_allergen: String,
}

/// Rows of `region` with `selected_set` and the most/least prevalent allergen,
/// in table order. The shared table is only read, never written.
pub fn derive_rows(table: &AllergenTable, selection: &Selection, region: Region) -> Vec<ViewRow> {
    table
        .rows_in(region)
        .map(|row| {
            let values: Vec<f64> = selection.indices.iter().map(|&i| row.values[i]).collect();
            let most = extreme_position(&values, Ordering::Greater);
            let least = extreme_position(&values, Ordering::Less);
            ViewRow {
                code: row.code.clone(),
                entity: row.entity.clone(),
                continent: row.continent,
                selected_set: values.iter().sum(),
                most_prevalent_allergen: selection.names[most].clone(),
                least_prevalent_allergen: selection.names[least].clone(),
                values,
            }
        })
        .collect()
}

/// Position of the first value that no later value beats in direction `wanted`.
fn extreme_position(values: &[f64], wanted: Ordering) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if v.total_cmp(&values[best]) == wanted {
            best = i;
        }
    }
    best
}

// ── Bar chart ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct BarChartView {
    pub region: Region,
    pub selection: Selection,
    /// Sorted ascending by `selected_set`.
    pub rows: Vec<ViewRow>,
    /// Per-country axis labels; off for the world view (too many bars).
    pub show_tick_labels: bool,
}

impl BarChartView {
    /// Stacking order of the bar segments: selected allergens by name.
    pub fn stack_order(&self) -> Vec<(usize, &str)> {
        let mut order: Vec<(usize, &str)> = self
            .selection
            .names()
            .iter()
            .enumerate()
            .map(|(i, n)| (i, n.as_str()))
            .collect();
        order.sort_by(|a, b| a.1.cmp(b.1));
        order
    }

    pub fn to_dataframe(&self) -> Result<DataFrame, AllervisError> {
        rows_to_dataframe(&self.rows, &self.selection)
    }
}

pub fn compute_bar_chart_view<S: AsRef<str>>(
    table: &AllergenTable,
    selected_allergens: &[S],
    region: Region,
) -> Result<BarChartView, AllervisError> {
    let selection = Selection::new(table, selected_allergens)?;
    let mut rows = derive_rows(table, &selection, region);
    rows.sort_by(|a, b| a.selected_set.total_cmp(&b.selected_set));
    Ok(BarChartView {
        region,
        selection,
        rows,
        show_tick_labels: region.shows_tick_labels(),
    })
}

// ── Map ─────────────────────────────────────────────────────────────────────

/// What the map colors countries by.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorEncoding {
    Continuous {
        column: &'static str,
        scale: &'static str,
    },
    Categorical {
        column: &'static str,
        /// Distinct categories in order of first appearance in the rows.
        categories: Vec<String>,
    },
}

impl ColorEncoding {
    pub fn column(&self) -> &'static str {
        match self {
            ColorEncoding::Continuous { column, .. } => *column,
            ColorEncoding::Categorical { column, .. } => *column,
        }
    }
}

pub const SEQUENTIAL_SCALE: &str = "Blues";

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub region: Region,
    pub idiom: MapIdiom,
    pub scheme: ColorScheme,
    pub selection: Selection,
    pub rows: Vec<ViewRow>,
    pub color: ColorEncoding,
    pub scope: GeoScope,
    /// Hide the base geography layer under a choropleth.
    pub hide_base_geography: bool,
}

impl MapView {
    pub fn to_dataframe(&self) -> Result<DataFrame, AllervisError> {
        rows_to_dataframe(&self.rows, &self.selection)
    }
}

pub fn compute_map_view<S: AsRef<str>>(
    table: &AllergenTable,
    selected_allergens: &[S],
    region: Region,
    idiom: MapIdiom,
    scheme: ColorScheme,
) -> Result<MapView, AllervisError> {
    let selection = Selection::new(table, selected_allergens)?;
    let mut rows = derive_rows(table, &selection, region);

    let color = match scheme {
        ColorScheme::Sequential => ColorEncoding::Continuous {
            column: view::SELECTED_SET,
            scale: SEQUENTIAL_SCALE,
        },
        ColorScheme::Mpa => {
            rows.sort_by(|a, b| a.most_prevalent_allergen.cmp(&b.most_prevalent_allergen));
            ColorEncoding::Categorical {
                column: view::MOST_PREVALENT_ALLERGEN,
                categories: categories(rows.iter().map(|r| r.most_prevalent_allergen.as_str())),
            }
        }
        ColorScheme::Lpa => {
            rows.sort_by(|a, b| a.least_prevalent_allergen.cmp(&b.least_prevalent_allergen));
            ColorEncoding::Categorical {
                column: view::LEAST_PREVALENT_ALLERGEN,
                categories: categories(rows.iter().map(|r| r.least_prevalent_allergen.as_str())),
            }
        }
    };

    let hide_base_geography = idiom == MapIdiom::Choropleth
        && matches!(
            region,
            Region::World | Region::Continent(Continent::Oceania)
        );

    Ok(MapView {
        region,
        idiom,
        scheme,
        selection,
        rows,
        color,
        scope: region.geo_scope(),
        hide_base_geography,
    })
}

fn categories<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        if !out.iter().any(|c| c == v) {
            out.push(v.to_string());
        }
    }
    out
}

/// Columns: Code, Entity, Continent, the selected allergens, then the
/// derived columns.
fn rows_to_dataframe(rows: &[ViewRow], selection: &Selection) -> Result<DataFrame, AllervisError> {
    let codes: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
    let entities: Vec<&str> = rows.iter().map(|r| r.entity.as_str()).collect();
    let continents: Vec<Option<&str>> = rows
        .iter()
        .map(|r| r.continent.map(Continent::code))
        .collect();
    let selected_set: Vec<f64> = rows.iter().map(|r| r.selected_set).collect();
    let most: Vec<&str> = rows
        .iter()
        .map(|r| r.most_prevalent_allergen.as_str())
        .collect();
    let least: Vec<&str> = rows
        .iter()
        .map(|r| r.least_prevalent_allergen.as_str())
        .collect();

    let mut columns: Vec<Column> = vec![
        Column::new(table::CODE.into(), &codes),
        Column::new(table::ENTITY.into(), &entities),
        Column::new(table::CONTINENT.into(), &continents),
    ];
    for (j, name) in selection.names().iter().enumerate() {
        let values: Vec<f64> = rows.iter().map(|r| r.values[j]).collect();
        columns.push(Column::new(name.as_str().into(), &values));
    }
    columns.push(Column::new(view::SELECTED_SET.into(), &selected_set));
    columns.push(Column::new(view::MOST_PREVALENT_ALLERGEN.into(), &most));
    columns.push(Column::new(view::LEAST_PREVALENT_ALLERGEN.into(), &least));

    Ok(DataFrame::new(columns)?)
}
