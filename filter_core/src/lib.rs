// filter_core: Rust/WASM filter-state engine for the game release calendar.
// All filter logic lives here; JS only moves strings between the router, the cache and this crate.

mod cache_key;
mod canonical;
mod coerce;
mod config;
mod error;
mod query;
mod stable;
mod types;

#[cfg(test)]
mod strategies;

use wasm_bindgen::prelude::*;

pub use cache_key::{
    build_cache_key, CacheKey, CacheKeyBuilder, ALL_GAMES_ENDPOINT, ALL_GAMES_NAMESPACE,
};
pub use canonical::{canonicalize, Canonicalizer};
pub use config::{FilterConfig, PageSizeBounds, QueryMode};
pub use error::FilterError;
pub use query::{QueryMapper, QueryParams, QueryValue};
pub use stable::{stable_serialize, stable_serialize_json};
pub use types::*;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_js(err: FilterError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Filter engine exposed to JavaScript.
/// Everything crosses the boundary as JSON or query strings.
#[wasm_bindgen]
pub struct FilterEngine {
    cache_keys: CacheKeyBuilder,
}

#[wasm_bindgen]
impl FilterEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<FilterEngine, JsValue> {
        FilterEngine::from_config_json(config_json).map_err(to_js)
    }

    /// Parse a raw URL query string (`?genres=RPG&pageSize=30`) into filter state JSON.
    pub fn parse_query(&self, query: &str) -> Result<String, JsValue> {
        let filters = self.mapper().parse_query_string(query);
        serde_json::to_string(&filters).map_err(|e| to_js(e.into()))
    }

    /// Parse a router query object (`{ key: string | string[] | undefined }`) given as JSON.
    pub fn parse_query_object(&self, query_json: &str) -> Result<String, JsValue> {
        self.try_parse_query_object(query_json).map_err(to_js)
    }

    /// Query string for `history.replaceState`, without the leading `?`.
    pub fn build_query(&self, filters_json: &str) -> Result<String, JsValue> {
        self.try_build_query(filters_json).map_err(to_js)
    }

    pub fn canonicalize(&self, filters_json: &str) -> Result<String, JsValue> {
        self.try_canonicalize(filters_json).map_err(to_js)
    }

    /// Cache key as a JSON array: `["allGames", fingerprint]`.
    pub fn cache_key(&self, filters_json: &str) -> Result<String, JsValue> {
        self.try_cache_key(filters_json).map_err(to_js)
    }

    /// Cache key as a JS array, ready to hand to the query client.
    pub fn cache_key_tuple(&self, filters_json: &str) -> Result<js_sys::Array, JsValue> {
        let filters = self.parse_filters(filters_json).map_err(to_js)?;
        let key = self.cache_keys.build(&filters).map_err(to_js)?;
        let tuple = js_sys::Array::new();
        tuple.push(&JsValue::from_str(key.namespace()));
        tuple.push(&JsValue::from_str(key.fingerprint()));
        Ok(tuple)
    }

    /// Request path for one page of `GET /api/games/all`.
    pub fn api_request_path(&self, filters_json: &str, page: u32) -> Result<String, JsValue> {
        self.try_api_request_path(filters_json, page).map_err(to_js)
    }

    /// True when the filters are equivalent to the defaults ("clear filters" is a no-op).
    pub fn is_default(&self, filters_json: &str) -> Result<bool, JsValue> {
        let filters = self.parse_filters(filters_json).map_err(to_js)?;
        Ok(self.cache_keys.canonicalizer().is_default(&filters))
    }

    /// Default filter state JSON for the configured page size bounds.
    pub fn default_filters(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.mapper().config().default_filters())
            .map_err(|e| to_js(e.into()))
    }
}

impl FilterEngine {
    pub fn from_config_json(config_json: &str) -> Result<FilterEngine, FilterError> {
        let config = FilterConfig::from_json(config_json)?;
        Ok(FilterEngine::with_config(config))
    }

    pub fn with_config(config: FilterConfig) -> FilterEngine {
        FilterEngine {
            cache_keys: CacheKeyBuilder::new(config),
        }
    }

    fn mapper(&self) -> &QueryMapper {
        self.cache_keys.mapper()
    }

    /// Filter JSON is coerced like URL input: only malformed JSON is rejected.
    fn parse_filters(&self, filters_json: &str) -> Result<FilterState, FilterError> {
        let value: serde_json::Value = serde_json::from_str(filters_json)
            .map_err(|e| FilterError::InvalidFilters(e.to_string()))?;
        Ok(coerce::filters_from_json(
            &value,
            self.mapper().config().default_filters(),
        ))
    }

    pub fn try_parse_query_object(&self, query_json: &str) -> Result<String, FilterError> {
        let params: QueryParams = serde_json::from_str(query_json)?;
        Ok(serde_json::to_string(&self.mapper().parse(&params))?)
    }

    pub fn try_build_query(&self, filters_json: &str) -> Result<String, FilterError> {
        let filters = self.parse_filters(filters_json)?;
        self.mapper().build(&filters)
    }

    pub fn try_canonicalize(&self, filters_json: &str) -> Result<String, FilterError> {
        let filters = self.parse_filters(filters_json)?;
        Ok(serde_json::to_string(
            &self.cache_keys.canonicalizer().canonicalize(&filters),
        )?)
    }

    pub fn try_cache_key(&self, filters_json: &str) -> Result<String, FilterError> {
        let filters = self.parse_filters(filters_json)?;
        Ok(serde_json::to_string(&self.cache_keys.build(&filters)?)?)
    }

    pub fn try_api_request_path(&self, filters_json: &str, page: u32) -> Result<String, FilterError> {
        let filters = self.parse_filters(filters_json)?;
        self.cache_keys.api_request_path(&filters, page)
    }
}

/// Stable fingerprint of an arbitrary JSON document. Empty input counts as `undefined`.
#[wasm_bindgen(js_name = stableSerialize)]
pub fn stable_serialize_js(json: &str) -> Result<String, JsValue> {
    if json.trim().is_empty() {
        return Ok(stable_serialize(None));
    }
    let value: serde_json::Value = serde_json::from_str(json).map_err(|e| to_js(e.into()))?;
    Ok(stable_serialize(Some(&value)))
}

/// Review buckets in display order, for building the filter UI.
#[wasm_bindgen(js_name = reviewBuckets)]
pub fn review_buckets() -> js_sys::Array {
    ReviewBucket::ALL
        .iter()
        .map(|bucket| JsValue::from_str(bucket.as_str()))
        .collect()
}
