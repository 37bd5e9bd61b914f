#[cfg(feature = "python")]
use pyo3::exceptions::{PyRuntimeError, PyValueError};
#[cfg(feature = "python")]
use pyo3::PyErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AllervisError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("InvalidData: {0}")]
    InvalidData(String),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Allergen '{0}' has no observed values; cannot impute")]
    EmptyAllergen(String),

    #[error("Duplicate country code '{code}' ({detail})")]
    DuplicateCountry { code: String, detail: String },

    #[error("Allergen '{0}' has no positive maximum; cannot scale to [0, 1]")]
    DegenerateColumn(String),

    #[error("Unknown allergen: {0}")]
    UnknownAllergen(String),

    #[error("No allergen selected")]
    EmptySelection,

    #[error("Invalid {kind}: '{value}'. Must be one of: {expected}")]
    InvalidSelector {
        kind: &'static str,
        value: String,
        expected: String,
    },
}

impl AllervisError {
    pub(crate) fn invalid_selector(kind: &'static str, value: &str, expected: &[&str]) -> Self {
        AllervisError::InvalidSelector {
            kind,
            value: value.to_string(),
            expected: expected
                .iter()
                .map(|v| format!("'{v}'"))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[cfg(feature = "python")]
impl From<AllervisError> for PyErr {
    fn from(err: AllervisError) -> PyErr {
        match err {
            AllervisError::UnknownAllergen(_)
            | AllervisError::EmptySelection
            | AllervisError::InvalidSelector { .. } => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_selector_lists_accepted_values() {
        let err = AllervisError::invalid_selector("region", "antarctica", &["world", "asia"]);
        assert_eq!(
            err.to_string(),
            "Invalid region: 'antarctica'. Must be one of: 'world', 'asia'"
        );
    }

    #[test]
    fn empty_selection_message_is_user_facing() {
        assert_eq!(AllervisError::EmptySelection.to_string(), "No allergen selected");
    }
}
