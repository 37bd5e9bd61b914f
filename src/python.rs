use std::path::{Path, PathBuf};
use std::sync::Arc;

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyModule};
use pyo3_polars::PyDataFrame;

use crate::allergen::AllergenPreset;
use crate::config::DatasetConfig;
use crate::error::AllervisError;
use crate::figure;
use crate::normalize;
use crate::popover::PopoverState;
use crate::region::{ColorScheme, MapIdiom, Region};
use crate::schema;
use crate::table::AllergenTable;
use crate::view::{self, ColorEncoding};

/// Read-only dashboard state: the normalized table, loaded once.
///
/// Every view method builds a fresh result; the table itself is never
/// modified, so one instance can serve concurrent callbacks.
#[pyclass(frozen)]
pub struct Dashboard {
    table: Arc<AllergenTable>,
}

#[pymethods]
impl Dashboard {
    /// Load the persisted normalized table (e.g. `concatenated.csv`).
    #[new]
    fn new(table_path: String) -> PyResult<Self> {
        let table = AllergenTable::read_csv(Path::new(&table_path))?;
        Ok(Self {
            table: Arc::new(table),
        })
    }

    /// Allergen columns of the table, in column order.
    #[getter]
    fn allergens(&self) -> Vec<String> {
        self.table.allergens().to_vec()
    }

    #[getter]
    fn table_df(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.table.to_dataframe()?))
    }

    /// Allergen names a radio preset pushes into the multi-select.
    fn resolve_preset(&self, preset: &str) -> PyResult<Vec<String>> {
        let preset: AllergenPreset = preset.parse()?;
        Ok(preset.resolve(self.table.allergens()))
    }

    /// Stacked bar chart data.
    ///
    /// Returns None when no allergen is selected. Otherwise a dict with:
    ///     data: DataFrame sorted ascending by selected_set
    ///     allergens: stacking order of the bar segments
    ///     show_tick_labels: whether per-country labels fit on the axis
    ///     figure: plotly figure JSON string
    fn bar_chart<'py>(
        &self,
        py: Python<'py>,
        allergens: Vec<String>,
        region: &str,
    ) -> PyResult<Option<Bound<'py, PyDict>>> {
        let region: Region = region.parse()?;
        let bar = match view::compute_bar_chart_view(&self.table, &allergens, region) {
            Err(AllervisError::EmptySelection) => return Ok(None),
            result => result?,
        };

        let stack: Vec<String> = bar
            .stack_order()
            .into_iter()
            .map(|(_, name)| name.to_string())
            .collect();

        let out = PyDict::new(py);
        out.set_item("data", PyDataFrame(bar.to_dataframe()?))?;
        out.set_item("allergens", stack)?;
        out.set_item("show_tick_labels", bar.show_tick_labels)?;
        out.set_item("figure", figure::bar_chart_figure(&bar).to_string())?;
        Ok(Some(out))
    }

    /// Map data.
    ///
    /// Returns None when no allergen is selected. Otherwise a dict with:
    ///     data: DataFrame in the color scheme's order
    ///     color: column the map is colored by
    ///     color_scale: continuous scale name, or None for categorical colors
    ///     scope: renderer scope
    ///     center: (lon, lat) override or None
    ///     projection_scale: zoom override or None
    ///     figure: plotly figure JSON string
    #[pyo3(signature = (allergens, region, map_idiom="choropleth", color_scheme="mpa"))]
    fn map<'py>(
        &self,
        py: Python<'py>,
        allergens: Vec<String>,
        region: &str,
        map_idiom: &str,
        color_scheme: &str,
    ) -> PyResult<Option<Bound<'py, PyDict>>> {
        let region: Region = region.parse()?;
        let idiom: MapIdiom = map_idiom.parse()?;
        let scheme: ColorScheme = color_scheme.parse()?;
        let map = match view::compute_map_view(&self.table, &allergens, region, idiom, scheme) {
            Err(AllervisError::EmptySelection) => return Ok(None),
            result => result?,
        };

        let color_scale = match &map.color {
            ColorEncoding::Continuous { scale, .. } => Some(*scale),
            ColorEncoding::Categorical { .. } => None,
        };

        let out = PyDict::new(py);
        out.set_item("data", PyDataFrame(map.to_dataframe()?))?;
        out.set_item("color", map.color.column())?;
        out.set_item("color_scale", color_scale)?;
        out.set_item("scope", map.scope.scope)?;
        out.set_item("center", map.scope.viewport.map(|v| (v.lon, v.lat)))?;
        out.set_item(
            "projection_scale",
            map.scope.viewport.map(|v| v.projection_scale),
        )?;
        out.set_item("figure", figure::map_figure(&map).to_string())?;
        Ok(Some(out))
    }
}

/// Run the offline normalizer and write the persisted table.
///
/// `config_path` points at a JSON dataset config; otherwise the default
/// catalogue is read from `data_dir`.
#[pyfunction]
#[pyo3(signature = (data_dir=None, config_path=None))]
fn normalize_dataset(
    data_dir: Option<String>,
    config_path: Option<String>,
) -> PyResult<PyDataFrame> {
    let mut config = match config_path {
        Some(path) => DatasetConfig::load(Path::new(&path))?,
        None => DatasetConfig::default(),
    };
    if let Some(dir) = data_dir {
        config.data_dir = PathBuf::from(dir);
    }
    let table = normalize::normalize_dataset(&config)?;
    Ok(PyDataFrame(table.to_dataframe()?))
}

/// Popover callback: flips `is_open` once the help button has been clicked.
#[pyfunction]
#[pyo3(signature = (n_clicks, is_open))]
fn toggle_popover(n_clicks: Option<u64>, is_open: bool) -> bool {
    PopoverState::from_open(is_open)
        .on_activation(n_clicks)
        .is_open()
}

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Table
    let table = PyModule::new(m.py(), "table")?;
    table.add("CODE", schema::table::CODE)?;
    table.add("ENTITY", schema::table::ENTITY)?;
    table.add("CONTINENT", schema::table::CONTINENT)?;
    m.add_submodule(&table)?;

    // Derived view
    let derived = PyModule::new(m.py(), "view")?;
    derived.add("SELECTED_SET", schema::view::SELECTED_SET)?;
    derived.add(
        "MOST_PREVALENT_ALLERGEN",
        schema::view::MOST_PREVALENT_ALLERGEN,
    )?;
    derived.add(
        "LEAST_PREVALENT_ALLERGEN",
        schema::view::LEAST_PREVALENT_ALLERGEN,
    )?;
    m.add_submodule(&derived)?;

    // Selector values
    let region = PyModule::new(m.py(), "region")?;
    region.add("ALL", schema::region::ALL.to_vec())?;
    region.add("WORLD", schema::region::WORLD)?;
    region.add("OCEANIA", schema::region::OCEANIA)?;
    m.add_submodule(&region)?;

    let map_idiom = PyModule::new(m.py(), "map_idiom")?;
    map_idiom.add("CHOROPLETH", schema::map_idiom::CHOROPLETH)?;
    map_idiom.add("BUBBLE", schema::map_idiom::BUBBLE)?;
    m.add_submodule(&map_idiom)?;

    let color_scheme = PyModule::new(m.py(), "color_scheme")?;
    color_scheme.add("SEQUENTIAL", schema::color_scheme::SEQUENTIAL)?;
    color_scheme.add("MPA", schema::color_scheme::MPA)?;
    color_scheme.add("LPA", schema::color_scheme::LPA)?;
    m.add_submodule(&color_scheme)?;

    let preset = PyModule::new(m.py(), "preset")?;
    preset.add("COMMON", schema::preset::COMMON)?;
    preset.add("CUSTOM", schema::preset::CUSTOM)?;
    preset.add("ALL", schema::preset::ALL_ALLERGENS)?;
    m.add_submodule(&preset)?;

    Ok(())
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // RUST_LOG controls verbosity; a host that already set a logger wins.
    let _ = env_logger::try_init();
    m.add_class::<Dashboard>()?;
    m.add_function(wrap_pyfunction!(normalize_dataset, m)?)?;
    m.add_function(wrap_pyfunction!(toggle_popover, m)?)?;
    add_schema_exports(m)?;
    Ok(())
}
