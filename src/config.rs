use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::allergen::{default_catalogue, AllergenSource};
use crate::error::AllervisError;
use crate::schema::continents;

/// Where the normalizer finds its inputs and writes its output.
///
/// Relative file names are resolved against `data_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub data_dir: PathBuf,
    pub allergens: Vec<AllergenSource>,
    /// Value column of the allergen files. Defaults to the last column.
    pub value_column: Option<String>,
    pub continents_file: String,
    pub continent_code_column: String,
    pub continent_column: String,
    pub output_file: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("Food Allergies Data"),
            allergens: default_catalogue(),
            value_column: None,
            continents_file: "continents.csv".to_string(),
            continent_code_column: continents::ALPHA3.to_string(),
            continent_column: continents::CONTINENT.to_string(),
            output_file: "concatenated.csv".to_string(),
        }
    }
}

impl DatasetConfig {
    /// Default catalogue rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load a JSON config file. Missing keys fall back to the defaults.
    pub fn load(path: &Path) -> Result<Self, AllervisError> {
        let contents = fs::read_to_string(path)?;
        let config: DatasetConfig = serde_json::from_str(&contents)?;
        debug!("loaded dataset config from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AllervisError> {
        if self.allergens.is_empty() {
            return Err(AllervisError::Validation(
                "Dataset config lists no allergens".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for source in &self.allergens {
            if source.name.trim().is_empty() {
                return Err(AllervisError::Validation(format!(
                    "Allergen with file '{}' has an empty name",
                    source.file
                )));
            }
            if !seen.insert(source.name.as_str()) {
                return Err(AllervisError::Validation(format!(
                    "Allergen '{}' is listed more than once",
                    source.name
                )));
            }
        }
        Ok(())
    }

    pub fn allergen_path(&self, source: &AllergenSource) -> PathBuf {
        self.data_dir.join(&source.file)
    }

    pub fn continents_path(&self) -> PathBuf {
        self.data_dir.join(&self.continents_file)
    }

    pub fn output_path(&self) -> PathBuf {
        self.data_dir.join(&self.output_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"data_dir": "/srv/allergies", "output_file": "table.csv"}}"#).unwrap();

        let config = DatasetConfig::load(file.path()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/allergies"));
        assert_eq!(config.output_path(), PathBuf::from("/srv/allergies/table.csv"));
        assert_eq!(config.allergens.len(), 19);
        assert_eq!(config.continent_code_column, "alpha3");
    }

    #[test]
    fn duplicate_allergen_is_rejected() {
        let mut config = DatasetConfig::default();
        let milk = config.allergens[3].clone();
        config.allergens.push(milk);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Milk"));
    }

    #[test]
    fn empty_catalogue_is_rejected() {
        let config = DatasetConfig {
            allergens: vec![],
            ..DatasetConfig::default()
        };
        assert!(matches!(config.validate(), Err(AllervisError::Validation(_))));
    }
}
