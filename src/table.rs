use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use log::info;
use polars::prelude::*;

use crate::error::AllervisError;
use crate::region::{Continent, Region};
use crate::schema::table;
use crate::source::{read_csv_as_strings, require_columns};

/// One country of the normalized table.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryRow {
    pub code: String,
    pub entity: String,
    pub continent: Option<Continent>,
    /// One value in [0, 1] per allergen column, in table column order.
    pub values: Vec<f64>,
}

/// The normalized, read-only country × allergen table.
///
/// Invariants (checked on construction): codes are unique, every row has one
/// value per allergen column and every value lies in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct AllergenTable {
    allergens: Vec<String>,
    rows: Vec<CountryRow>,
}

impl AllergenTable {
    pub fn new(allergens: Vec<String>, rows: Vec<CountryRow>) -> Result<Self, AllervisError> {
        let mut names = HashSet::new();
        for a in &allergens {
            if [table::CODE, table::ENTITY, table::CONTINENT].contains(&a.as_str()) {
                return Err(AllervisError::Validation(format!(
                    "Allergen name '{a}' clashes with a table column"
                )));
            }
            if !names.insert(a.as_str()) {
                return Err(AllervisError::Validation(format!(
                    "Allergen column '{a}' appears twice"
                )));
            }
        }

        let mut codes = HashSet::new();
        for row in &rows {
            if !codes.insert(row.code.as_str()) {
                return Err(AllervisError::DuplicateCountry {
                    code: row.code.clone(),
                    detail: "more than one row in the table".to_string(),
                });
            }
            if row.values.len() != allergens.len() {
                return Err(AllervisError::InvalidData(format!(
                    "Row '{}' has {} values for {} allergen columns",
                    row.code,
                    row.values.len(),
                    allergens.len()
                )));
            }
            for (a, v) in allergens.iter().zip(&row.values) {
                if !(0.0..=1.0).contains(v) {
                    return Err(AllervisError::InvalidData(format!(
                        "Value {v} of '{a}' for '{}' is outside [0, 1]",
                        row.code
                    )));
                }
            }
        }

        Ok(Self { allergens, rows })
    }

    pub fn allergens(&self) -> &[String] {
        &self.allergens
    }

    pub fn rows(&self) -> &[CountryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn allergen_index(&self, name: &str) -> Option<usize> {
        self.allergens.iter().position(|a| a == name)
    }

    pub fn rows_in(&self, region: Region) -> impl Iterator<Item = &CountryRow> {
        self.rows.iter().filter(move |r| region.contains(r.continent))
    }

    /// Columns: Code, Entity, one per allergen, Continent.
    pub fn to_dataframe(&self) -> Result<DataFrame, AllervisError> {
        let codes: Vec<&str> = self.rows.iter().map(|r| r.code.as_str()).collect();
        let entities: Vec<&str> = self.rows.iter().map(|r| r.entity.as_str()).collect();
        let continents: Vec<Option<&str>> = self
            .rows
            .iter()
            .map(|r| r.continent.map(Continent::code))
            .collect();

        let mut columns: Vec<Column> = Vec::with_capacity(self.allergens.len() + 3);
        columns.push(Column::new(table::CODE.into(), &codes));
        columns.push(Column::new(table::ENTITY.into(), &entities));
        for (j, name) in self.allergens.iter().enumerate() {
            let values: Vec<f64> = self.rows.iter().map(|r| r.values[j]).collect();
            columns.push(Column::new(name.as_str().into(), &values));
        }
        columns.push(Column::new(table::CONTINENT.into(), &continents));

        Ok(DataFrame::new(columns)?)
    }

    /// Rebuild a table from a frame laid out like [`AllergenTable::to_dataframe`].
    /// Every column other than Code, Entity and Continent is an allergen.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self, AllervisError> {
        require_columns(df, &[table::CODE, table::ENTITY])?;

        let allergens: Vec<String> = df
            .get_column_names_str()
            .iter()
            .filter(|c| ![table::CODE, table::ENTITY, table::CONTINENT].contains(*c))
            .map(|c| c.to_string())
            .collect();

        let codes = df.column(table::CODE)?.str()?;
        let entities = df.column(table::ENTITY)?.str()?;
        let continents = match df.column(table::CONTINENT) {
            Ok(c) => Some(c.str()?),
            Err(_) => None,
        };
        let value_cols = allergens
            .iter()
            .map(|a| df.column(a.as_str()).and_then(|c| c.f64()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let code = codes
                .get(i)
                .ok_or_else(|| AllervisError::InvalidData(format!("Null country code at row {i}")))?
                .to_string();
            let entity = entities.get(i).unwrap_or("").to_string();
            let continent = continents
                .and_then(|c| c.get(i))
                .and_then(Continent::from_code);

            let mut values = Vec::with_capacity(allergens.len());
            for (name, col) in allergens.iter().zip(&value_cols) {
                let v = col.get(i).ok_or_else(|| {
                    AllervisError::InvalidData(format!("Missing '{name}' value for '{code}'"))
                })?;
                values.push(v);
            }

            rows.push(CountryRow {
                code,
                entity,
                continent,
                values,
            });
        }

        Self::new(allergens, rows)
    }

    /// Persist as CSV. Writing an unchanged table yields identical bytes.
    pub fn write_csv(&self, path: &Path) -> Result<(), AllervisError> {
        let mut df = self.to_dataframe()?;
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)?;
        info!("wrote {} countries to {}", self.rows.len(), path.display());
        Ok(())
    }

    /// Load a table persisted by [`AllergenTable::write_csv`].
    pub fn read_csv(path: &Path) -> Result<Self, AllervisError> {
        let raw = read_csv_as_strings(path)?;
        require_columns(&raw, &[table::CODE, table::ENTITY])?;

        let casts: Vec<Expr> = raw
            .get_column_names_str()
            .iter()
            .filter(|c| ![table::CODE, table::ENTITY, table::CONTINENT].contains(*c))
            .map(|c| {
                col(*c)
                    .str()
                    .strip_chars(lit(" \t\r\n"))
                    .cast(DataType::Float64)
            })
            .collect();

        let df = raw.lazy().with_columns(casts).collect()?;
        let table = Self::from_dataframe(&df)?;
        info!(
            "loaded {} countries x {} allergens from {}",
            table.len(),
            table.allergens.len(),
            path.display()
        );
        Ok(table)
    }
}
