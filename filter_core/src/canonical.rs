// Canonical form of filter state.
// Equivalent filter intents (same token sets, same scalars) must produce identical values,
// so that the result cache and the URL treat them as one entry.

use crate::config::FilterConfig;
use crate::types::*;

/// Normalizes loosely built filter state into its canonical shape.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    config: FilterConfig,
}

impl Canonicalizer {
    pub fn new(config: FilterConfig) -> Self {
        Canonicalizer { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Sort every token set, resolve the review sentinel and re-clamp numeric fields.
    /// Pure and idempotent.
    pub fn canonicalize(&self, raw: &FilterState) -> FilterState {
        let mut canonical = raw.clone();

        for field in TokenField::ALL {
            let tokens = canonical.tokens_mut(field);
            tokens.sort();
            if self.config.dedupe_tokens {
                tokens.dedup();
            }
        }

        canonical.review_score_desc = canonical_review_tokens(&raw.review_score_desc);
        canonical.page_size = self.config.page_size.clamp(raw.page_size);
        canonical.popularity_score = clamp_popularity_score(raw.popularity_score);

        canonical
    }

    /// True when the filter state is equivalent to the all-defaults state.
    pub fn is_default(&self, filters: &FilterState) -> bool {
        self.canonicalize(filters) == self.config.default_filters()
    }
}

/// Review tokens obey the sentinel rule: empty or containing `all` collapses to `["all"]`,
/// unknown tokens are dropped, and the result is never empty.
fn canonical_review_tokens(tokens: &[String]) -> Vec<String> {
    if tokens.is_empty() || tokens.iter().any(|t| t == REVIEW_ALL) {
        return vec![REVIEW_ALL.to_string()];
    }

    let mut known: Vec<String> = tokens
        .iter()
        .filter(|token| {
            let known = ReviewBucket::from_token(token).is_some();
            if !known {
                log::debug!("Dropping unknown review token {token:?}");
            }
            known
        })
        .cloned()
        .collect();
    known.sort();
    known.dedup();

    if known.is_empty() {
        known.push(REVIEW_ALL.to_string());
    }
    known
}

/// Canonicalize with the default configuration.
pub fn canonicalize(raw: &FilterState) -> FilterState {
    Canonicalizer::default().canonicalize(raw)
}
