// Engine configuration passed from JS. Every field has a serde default so `{}` is valid.

use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::types::{FilterState, DEFAULT_PAGE_SIZE};

/// Inclusive page size range plus the default used when the URL carries none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSizeBounds {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl PageSizeBounds {
    pub fn new(min: u32, max: u32, default: u32) -> Result<Self, FilterError> {
        let bounds = PageSizeBounds { min, max, default };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Bounds of the older games listing page (multiples of a three-column grid).
    pub fn legacy() -> Self {
        PageSizeBounds {
            min: 9,
            max: 40,
            default: 18,
        }
    }

    pub fn clamp(&self, page_size: u32) -> u32 {
        page_size.clamp(self.min, self.max)
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if self.min == 0 || self.min > self.max || !(self.min..=self.max).contains(&self.default) {
            return Err(FilterError::InvalidPageSizeBounds {
                min: self.min,
                max: self.max,
                default: self.default,
            });
        }
        Ok(())
    }
}

impl Default for PageSizeBounds {
    fn default() -> Self {
        PageSizeBounds {
            min: 10,
            max: 50,
            default: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Which fields `build` writes to the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Only fields that deviate from their defaults. Used for the address bar.
    #[default]
    ChangedOnly,
    /// Every field, defaults included. Used for backend requests.
    Full,
}

/// Filter engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub page_size: PageSizeBounds,
    #[serde(default)]
    pub query_mode: QueryMode,
    /// Drop duplicate tokens while canonicalizing.
    #[serde(default = "default_true")]
    pub dedupe_tokens: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            page_size: PageSizeBounds::default(),
            query_mode: QueryMode::default(),
            dedupe_tokens: true,
        }
    }
}

impl FilterConfig {
    pub fn from_json(config_json: &str) -> Result<Self, FilterError> {
        let config: FilterConfig = serde_json::from_str(config_json)
            .map_err(|e| FilterError::InvalidConfig(e.to_string()))?;
        if let Err(err) = config.page_size.validate() {
            log::warn!("Rejecting filter config: {err}");
            return Err(err);
        }
        Ok(config)
    }

    /// Filter state with every field at its default.
    pub fn default_filters(&self) -> FilterState {
        FilterState::with_page_size_default(self.page_size.default)
    }
}
