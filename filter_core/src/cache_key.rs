// Cache keys for paginated game results, and the backend request path that goes with them.
// The cache client itself lives in JS; it receives keys from here and treats them as opaque.

use std::fmt;

use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

use crate::canonical::Canonicalizer;
use crate::config::{FilterConfig, QueryMode};
use crate::error::FilterError;
use crate::query::{encode, QueryMapper};
use crate::stable::stable_serialize_json;
use crate::types::FilterState;

/// Cache namespace of the "all games" listing.
pub const ALL_GAMES_NAMESPACE: &str = "allGames";

/// Backend endpoint for the paginated game listing.
pub const ALL_GAMES_ENDPOINT: &str = "/api/games/all";

/// `(namespace, fingerprint)` lookup key. Serialized as a two-element JSON array.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey {
    namespace: &'static str,
    fingerprint: String,
}

impl CacheKey {
    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.fingerprint)
    }
}

impl Serialize for CacheKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(self.namespace)?;
        tuple.serialize_element(&self.fingerprint)?;
        tuple.end()
    }
}

/// Derives cache keys and request paths from filter state.
#[derive(Debug, Clone, Default)]
pub struct CacheKeyBuilder {
    mapper: QueryMapper,
}

impl CacheKeyBuilder {
    pub fn new(config: FilterConfig) -> Self {
        CacheKeyBuilder {
            mapper: QueryMapper::new(config),
        }
    }

    /// Query mapper sharing this builder's configuration.
    pub fn mapper(&self) -> &QueryMapper {
        &self.mapper
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        self.mapper.canonicalizer()
    }

    /// Semantically equal filters (same token sets, same scalars) share a key.
    pub fn build(&self, filters: &FilterState) -> Result<CacheKey, FilterError> {
        let canonical = self.canonicalizer().canonicalize(filters);
        Ok(CacheKey {
            namespace: ALL_GAMES_NAMESPACE,
            fingerprint: stable_serialize_json(&canonical)?,
        })
    }

    /// `GET` path for one page of results: every filter field plus `page`, keys sorted.
    pub fn api_request_path(&self, filters: &FilterState, page: u32) -> Result<String, FilterError> {
        let mut pairs = self.mapper.query_pairs(filters, QueryMode::Full);
        pairs.insert("page", page.to_string());
        Ok(format!("{ALL_GAMES_ENDPOINT}?{}", encode(&pairs)?))
    }
}

/// Cache key under the default configuration.
pub fn build_cache_key(filters: &FilterState) -> Result<CacheKey, FilterError> {
    CacheKeyBuilder::default().build(filters)
}
