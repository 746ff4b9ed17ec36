// Typed errors with thiserror. Only developer-supplied input can fail;
// URL-derived filter state is coerced to defaults instead.

use thiserror::Error;

/// Filter engine error types.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid page size bounds: min {min}, max {max}, default {default}")]
    InvalidPageSizeBounds { min: u32, max: u32, default: u32 },

    #[error("Invalid filter state: {0}")]
    InvalidFilters(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for FilterError {
    fn from(err: serde_json::Error) -> Self {
        FilterError::Serialization(err.to_string())
    }
}

impl From<serde_urlencoded::ser::Error> for FilterError {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        FilterError::Serialization(err.to_string())
    }
}
