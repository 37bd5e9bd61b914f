pub mod allergen;
pub mod config;
pub mod error;
pub mod figure;
pub mod normalize;
pub mod popover;
pub mod region;
pub mod schema;
pub mod source;
pub mod table;
pub mod view;

#[cfg(feature = "python")]
mod python;

pub use allergen::{AllergenCategory, AllergenPreset, AllergenSource, ImputeStrategy};
pub use config::DatasetConfig;
pub use error::AllervisError;
pub use normalize::{normalize, normalize_dataset};
pub use popover::PopoverState;
pub use region::{ColorScheme, Continent, MapIdiom, Region};
pub use table::{AllergenTable, CountryRow};
pub use view::{compute_bar_chart_view, compute_map_view, BarChartView, MapView, Selection};
