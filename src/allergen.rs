use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AllervisError;
use crate::schema::preset;

/// Food group an allergen belongs to. Decides how its gaps are imputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllergenCategory {
    MeatDairy,
    EggSeafood,
    Nut,
    Cereal,
}

/// How missing per-country values of one allergen column are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImputeStrategy {
    /// Column minimum: assume a country without data eats little of it.
    Minimum,
    Median,
}

impl AllergenCategory {
    pub fn impute_strategy(self) -> ImputeStrategy {
        match self {
            AllergenCategory::Nut => ImputeStrategy::Minimum,
            _ => ImputeStrategy::Median,
        }
    }
}

/// One catalogue entry: allergen name, its food group and source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllergenSource {
    pub name: String,
    pub category: AllergenCategory,
    pub file: String,
}

impl AllergenSource {
    fn new(name: &str, category: AllergenCategory, file: &str) -> Self {
        Self {
            name: name.to_string(),
            category,
            file: file.to_string(),
        }
    }
}

/// The dashboard's allergen catalogue, in persisted column order.
pub fn default_catalogue() -> Vec<AllergenSource> {
    use AllergenCategory::*;
    vec![
        AllergenSource::new("Beef", MeatDairy, "beef-and-buffalo-meat-consumption-per-person.csv"),
        AllergenSource::new("Seafood", EggSeafood, "fish-and-seafood-consumption-per-capita.csv"),
        AllergenSource::new("Egg", EggSeafood, "per-capita-egg-consumption-kilograms-per-year.csv"),
        AllergenSource::new("Milk", MeatDairy, "per-capita-milk-consumption.csv"),
        // nuts
        AllergenSource::new("Peanut", Nut, "per-capita-peanut-consumption.csv"),
        AllergenSource::new("Almond", Nut, "almond-consumption-per-capita.csv"),
        AllergenSource::new("Cashew", Nut, "cashew-consumption-per-capita.csv"),
        AllergenSource::new("Hazelnut", Nut, "hazelnuts-consumption-per-capita.csv"),
        AllergenSource::new("Macadamia", Nut, "macadamia-consumption-per-capita.csv"),
        AllergenSource::new("Pecan", Nut, "pecans-consumption-per-capita.csv"),
        AllergenSource::new("Pine", Nut, "pine-nuts-consumption-per-capita.csv"),
        AllergenSource::new("Pistachio", Nut, "pistachios-consumption-per-capita.csv"),
        AllergenSource::new("Walnut", Nut, "walnuts-consumption-per-capita.csv"),
        // cereals
        AllergenSource::new("Barley", Cereal, "barley-consumption-per-capita.csv"),
        AllergenSource::new("Corn", Cereal, "corn-maize-consumption-per-capita.csv"),
        AllergenSource::new("Oat", Cereal, "oats-consumption-per-capita.csv"),
        AllergenSource::new("Rice", Cereal, "rice-consumption-per-capita.csv"),
        AllergenSource::new("Rye", Cereal, "rye-consumption-per-capita.csv"),
        AllergenSource::new("Wheat", Cereal, "wheat-consumption-per-capita.csv"),
    ]
}

pub const COMMON_ALLERGENS: [&str; 5] = ["Egg", "Milk", "Peanut", "Seafood", "Wheat"];

/// Radio-selector preset that overwrites the allergen multi-select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllergenPreset {
    Common,
    Custom,
    All,
}

impl FromStr for AllergenPreset {
    type Err = AllervisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            preset::COMMON => Ok(AllergenPreset::Common),
            preset::CUSTOM => Ok(AllergenPreset::Custom),
            preset::ALL_ALLERGENS => Ok(AllergenPreset::All),
            other => Err(AllervisError::invalid_selector(
                "allergen preset",
                other,
                &preset::ALL,
            )),
        }
    }
}

impl AllergenPreset {
    /// Allergen names the preset pushes into the multi-select, sorted by name.
    ///
    /// `available` is the list of allergen columns offered by the dashboard.
    /// The result never depends on what was selected before.
    pub fn resolve<S: AsRef<str>>(self, available: &[S]) -> Vec<String> {
        let mut names: Vec<String> = match self {
            AllergenPreset::Common => COMMON_ALLERGENS.iter().map(|s| s.to_string()).collect(),
            AllergenPreset::Custom => Vec::new(),
            AllergenPreset::All => available.iter().map(|s| s.as_ref().to_string()).collect(),
        };
        names.sort();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue_names() -> Vec<String> {
        default_catalogue().into_iter().map(|a| a.name).collect()
    }

    #[test]
    fn catalogue_has_nine_nuts_and_nineteen_entries() {
        let catalogue = default_catalogue();
        assert_eq!(catalogue.len(), 19);
        let nuts = catalogue
            .iter()
            .filter(|a| a.category == AllergenCategory::Nut)
            .count();
        assert_eq!(nuts, 9);
    }

    #[test]
    fn only_nuts_impute_with_minimum() {
        assert_eq!(AllergenCategory::Nut.impute_strategy(), ImputeStrategy::Minimum);
        assert_eq!(AllergenCategory::Cereal.impute_strategy(), ImputeStrategy::Median);
        assert_eq!(AllergenCategory::MeatDairy.impute_strategy(), ImputeStrategy::Median);
        assert_eq!(AllergenCategory::EggSeafood.impute_strategy(), ImputeStrategy::Median);
    }

    #[test]
    fn common_preset_is_fixed() {
        let names = catalogue_names();
        let resolved = AllergenPreset::Common.resolve(&names);
        assert_eq!(resolved, vec!["Egg", "Milk", "Peanut", "Seafood", "Wheat"]);
    }

    #[test]
    fn custom_preset_is_empty_and_all_is_sorted() {
        let names = catalogue_names();
        assert!(AllergenPreset::Custom.resolve(&names).is_empty());

        let all = AllergenPreset::All.resolve(&names);
        assert_eq!(all.len(), 19);
        assert_eq!(all.first().map(String::as_str), Some("Almond"));
        assert_eq!(all.last().map(String::as_str), Some("Wheat"));
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let err = "favourites".parse::<AllergenPreset>().unwrap_err();
        assert!(matches!(err, AllervisError::InvalidSelector { .. }));
    }
}
