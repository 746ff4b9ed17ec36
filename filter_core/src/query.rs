// URL query <-> filter state mapping.
// Parsing never fails: missing, malformed or out-of-range values fall back to defaults.
// Building writes keys in sorted order so the query string is itself a stable fingerprint.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::canonical::Canonicalizer;
use crate::coerce::{parse_csv, parse_date, parse_enum, parse_number};
use crate::config::{FilterConfig, QueryMode};
use crate::error::FilterError;
use crate::types::*;

pub const START_DATE: &str = "startDate";
pub const END_DATE: &str = "endDate";
pub const ONLY_UPCOMING: &str = "onlyUpcoming";
pub const REVIEW_SCORE_DESC: &str = "reviewScoreDesc";
pub const SORT_BY: &str = "sortBy";
pub const SORT_ORDER: &str = "sortOrder";
pub const PAGE_SIZE: &str = "pageSize";
pub const POPULARITY_SCORE: &str = "popularityScore";

/// A single query parameter as delivered by the router: missing, once, or repeated.
/// Scalar fields read the first value; token-set fields read all of them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    #[default]
    Absent,
    Single(String),
    Multiple(Vec<String>),
}

impl QueryValue {
    /// First value, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            QueryValue::Absent => None,
            QueryValue::Single(value) => Some(value),
            QueryValue::Multiple(values) => values.first().map(String::as_str),
        }
    }

    /// Every value, in order. Token sets are the union of all occurrences.
    pub fn values(&self) -> &[String] {
        match self {
            QueryValue::Absent => &[],
            QueryValue::Single(value) => std::slice::from_ref(value),
            QueryValue::Multiple(values) => values,
        }
    }

    fn push(&mut self, value: String) {
        *self = match std::mem::take(self) {
            QueryValue::Absent => QueryValue::Single(value),
            QueryValue::Single(first) => QueryValue::Multiple(vec![first, value]),
            QueryValue::Multiple(mut values) => {
                values.push(value);
                QueryValue::Multiple(values)
            }
        };
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQueryValue {
    Single(String),
    Multiple(Vec<String>),
}

impl<'de> Deserialize<'de> for QueryValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<RawQueryValue>::deserialize(deserializer)? {
            None => QueryValue::Absent,
            Some(RawQueryValue::Single(value)) => QueryValue::Single(value),
            Some(RawQueryValue::Multiple(values)) if values.is_empty() => QueryValue::Absent,
            Some(RawQueryValue::Multiple(values)) => QueryValue::Multiple(values),
        })
    }
}

/// Decoded query parameters grouped by key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, QueryValue>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw `a=b&c=d` query string. A leading `?` is accepted.
    /// An undecodable string is treated as empty.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
            Ok(pairs) => Self::from_pairs(pairs),
            Err(err) => {
                log::debug!("Ignoring undecodable query string {query:?}: {err}");
                Self::default()
            }
        }
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            params.append(key, value);
        }
        params
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    pub fn insert(&mut self, key: impl Into<String>, value: QueryValue) {
        self.0.insert(key.into(), value);
    }

    /// Total accessor: unknown keys are `Absent`.
    pub fn get(&self, key: &str) -> &QueryValue {
        const ABSENT: &QueryValue = &QueryValue::Absent;
        self.0.get(key).unwrap_or(ABSENT)
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).first()
    }
}

/// Maps filter state to and from URL query parameters.
#[derive(Debug, Clone, Default)]
pub struct QueryMapper {
    canonicalizer: Canonicalizer,
}

impl QueryMapper {
    pub fn new(config: FilterConfig) -> Self {
        QueryMapper {
            canonicalizer: Canonicalizer::new(config),
        }
    }

    pub fn config(&self) -> &FilterConfig {
        self.canonicalizer.config()
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    /// Parse query parameters into canonical filter state, filling defaults.
    pub fn parse(&self, query: &QueryParams) -> FilterState {
        let config = self.config();
        let defaults = config.default_filters();

        let mut filters = FilterState {
            start_date: parse_date(query.first(START_DATE)),
            end_date: parse_date(query.first(END_DATE)),
            only_upcoming: query.first(ONLY_UPCOMING) == Some("true"),
            review_score_desc: parse_csv(query.get(REVIEW_SCORE_DESC).values()),
            sort_by: parse_enum(query.first(SORT_BY), SortBy::from_query, defaults.sort_by),
            sort_order: parse_enum(
                query.first(SORT_ORDER),
                SortOrder::from_query,
                defaults.sort_order,
            ),
            page_size: config
                .page_size
                .clamp(parse_number(query.first(PAGE_SIZE), defaults.page_size)),
            popularity_score: clamp_popularity_score(parse_number(
                query.first(POPULARITY_SCORE),
                defaults.popularity_score,
            )),
            ..defaults
        };
        for field in TokenField::ALL {
            *filters.tokens_mut(field) = parse_csv(query.get(field.query_key()).values());
        }

        self.canonicalizer.canonicalize(&filters)
    }

    pub fn parse_query_string(&self, query: &str) -> FilterState {
        self.parse(&QueryParams::from_query_string(query))
    }

    /// Build the query string for the configured mode.
    pub fn build(&self, filters: &FilterState) -> Result<String, FilterError> {
        self.build_with_mode(filters, self.config().query_mode)
    }

    pub fn build_with_mode(
        &self,
        filters: &FilterState,
        mode: QueryMode,
    ) -> Result<String, FilterError> {
        encode(&self.query_pairs(filters, mode))
    }

    /// Key/value pairs for the canonical form of `filters`, sorted by key.
    pub fn query_pairs(
        &self,
        filters: &FilterState,
        mode: QueryMode,
    ) -> BTreeMap<&'static str, String> {
        let canonical = self.canonicalizer.canonicalize(filters);
        let defaults = self.config().default_filters();
        let full = mode == QueryMode::Full;

        let mut pairs = BTreeMap::new();
        let mut emit = |key: &'static str, value: String, is_default: bool| {
            if full || !is_default {
                pairs.insert(key, value);
            }
        };

        emit(
            START_DATE,
            format_date(canonical.start_date),
            canonical.start_date.is_none(),
        );
        emit(
            END_DATE,
            format_date(canonical.end_date),
            canonical.end_date.is_none(),
        );
        emit(
            ONLY_UPCOMING,
            canonical.only_upcoming.to_string(),
            canonical.only_upcoming == defaults.only_upcoming,
        );
        for field in TokenField::ALL {
            let tokens = canonical.tokens(field);
            emit(field.query_key(), tokens.join(","), tokens.is_empty());
        }
        emit(
            REVIEW_SCORE_DESC,
            canonical.review_score_desc.join(","),
            canonical.review_score_desc == defaults.review_score_desc,
        );
        emit(
            SORT_BY,
            canonical.sort_by.as_str().to_string(),
            canonical.sort_by == defaults.sort_by,
        );
        emit(
            SORT_ORDER,
            canonical.sort_order.as_str().to_string(),
            canonical.sort_order == defaults.sort_order,
        );
        emit(
            PAGE_SIZE,
            canonical.page_size.to_string(),
            canonical.page_size == defaults.page_size,
        );
        emit(
            POPULARITY_SCORE,
            canonical.popularity_score.to_string(),
            canonical.popularity_score == defaults.popularity_score,
        );

        pairs
    }
}

pub(crate) fn encode(pairs: &BTreeMap<&'static str, String>) -> Result<String, FilterError> {
    Ok(serde_urlencoded::to_string(pairs)?)
}

fn format_date(date: Option<CalendarDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::canonicalize;
    use proptest::prelude::*;

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn parse(query: &str) -> FilterState {
        QueryMapper::default().parse_query_string(query)
    }

    #[test]
    fn empty_query_gives_defaults() {
        assert_eq!(parse(""), FilterConfig::default().default_filters());
        assert_eq!(parse("?"), FilterConfig::default().default_filters());
    }

    #[test]
    fn popularity_score_is_clamped() {
        assert_eq!(parse("popularityScore=9999").popularity_score, 100);
        assert_eq!(parse("popularityScore=-5").popularity_score, 40);
        assert_eq!(parse("popularityScore=75").popularity_score, 75);
        assert_eq!(parse("popularityScore=abc").popularity_score, 40);
        assert_eq!(parse("popularityScore=NaN").popularity_score, 40);
    }

    #[test]
    fn page_size_uses_configured_bounds() {
        assert_eq!(parse("pageSize=5").page_size, 10);
        assert_eq!(parse("pageSize=500").page_size, 50);
        assert_eq!(parse("pageSize=inf").page_size, 20);

        let legacy = QueryMapper::new(FilterConfig {
            page_size: crate::config::PageSizeBounds::legacy(),
            ..FilterConfig::default()
        });
        assert_eq!(legacy.parse_query_string("pageSize=5").page_size, 9);
        assert_eq!(legacy.parse_query_string("pageSize=45").page_size, 40);
    }

    #[test]
    fn booleans_require_exact_true() {
        assert!(parse("onlyUpcoming=true").only_upcoming);
        assert!(!parse("onlyUpcoming=TRUE").only_upcoming);
        assert!(!parse("onlyUpcoming=1").only_upcoming);
    }

    #[test]
    fn first_value_wins_for_scalars() {
        let filters = parse("sortBy=name&sortBy=popularity&pageSize=30&pageSize=40");
        assert_eq!(filters.sort_by, SortBy::Name);
        assert_eq!(filters.page_size, 30);
    }

    #[test]
    fn repeated_token_keys_are_combined() {
        let filters =
            parse("genres=RPG&genres=Action,Indie&reviewScoreDesc=Mixed&reviewScoreDesc=Positive");
        assert_eq!(filters.genres, strings(&["Action", "Indie", "RPG"]));
        assert_eq!(filters.review_score_desc, strings(&["Mixed", "Positive"]));
    }

    #[test]
    fn unknown_enums_fall_back() {
        let filters = parse("sortBy=rating&sortOrder=down");
        assert_eq!(filters.sort_by, SortBy::ReleaseDate);
        assert_eq!(filters.sort_order, SortOrder::Asc);
    }

    #[test]
    fn invalid_dates_are_unbounded() {
        let filters = parse("startDate=2025-13-01&endDate=2025-06-30");
        assert_eq!(filters.start_date, None);
        assert_eq!(filters.end_date, CalendarDate::from_ymd(2025, 6, 30));
    }

    #[test]
    fn csv_tokens_are_split_and_trimmed() {
        let filters = parse("tags=Co-op,%20Indie%20,,Roguelike");
        assert_eq!(filters.tags, strings(&["Co-op", "Indie", "Roguelike"]));
    }

    #[test]
    fn review_filter_parses_buckets() {
        let filters = parse("reviewScoreDesc=Very+Positive,Mixed,Bogus");
        assert_eq!(filters.review_score_desc, strings(&["Mixed", "Very Positive"]));
        assert_eq!(
            parse("reviewScoreDesc=all,Mixed").review_score_desc,
            strings(&[REVIEW_ALL])
        );
    }

    #[test]
    fn parse_then_canonicalize_scenario() {
        let mut query = QueryParams::new();
        query.insert("genres", QueryValue::Multiple(strings(&["RPG", "Action"])));
        query.insert("tags", QueryValue::Absent);
        query.insert("popularityScore", QueryValue::Single("150".to_string()));
        query.insert("sortBy", QueryValue::Single("name".to_string()));

        let filters = canonicalize(&QueryMapper::default().parse(&query));
        assert_eq!(filters.genres, strings(&["Action", "RPG"]));
        assert!(filters.tags.is_empty());
        assert_eq!(filters.popularity_score, 100);
        assert_eq!(filters.sort_by, SortBy::Name);
        assert_eq!(filters.review_score_desc, strings(&[REVIEW_ALL]));
    }

    #[test]
    fn router_object_scenario_from_json() {
        let query: QueryParams = serde_json::from_str(
            r#"{"genres":["RPG","Action"],"tags":[],"popularityScore":"150","sortBy":"name"}"#,
        )
        .unwrap();
        let filters = QueryMapper::default().parse(&query);
        assert_eq!(filters.genres, strings(&["Action", "RPG"]));
        assert!(filters.tags.is_empty());
        assert_eq!(filters.popularity_score, 100);
        assert_eq!(filters.sort_by, SortBy::Name);
        assert_eq!(filters.review_score_desc, strings(&[REVIEW_ALL]));
    }

    #[test]
    fn query_value_from_router_json() {
        let params: QueryParams = serde_json::from_str(
            r#"{"genres":["RPG","Action"],"sortBy":"name","startDate":null,"tags":[]}"#,
        )
        .unwrap();
        assert_eq!(params.get("genres").first(), Some("RPG"));
        assert_eq!(params.first("sortBy"), Some("name"));
        assert_eq!(params.get("startDate"), &QueryValue::Absent);
        assert_eq!(params.get("tags"), &QueryValue::Absent);
        assert_eq!(params.get("missing"), &QueryValue::Absent);
    }

    #[test]
    fn repeated_keys_accumulate() {
        let params = QueryParams::from_pairs([("a", "1"), ("a", "2"), ("b", "3")]);
        assert_eq!(
            params.get("a"),
            &QueryValue::Multiple(strings(&["1", "2"]))
        );
        assert_eq!(params.get("b"), &QueryValue::Single("3".to_string()));
    }

    #[test]
    fn build_changed_only_omits_defaults() {
        let mapper = QueryMapper::default();
        assert_eq!(mapper.build(&FilterState::default()).unwrap(), "");

        let filters = FilterState::default()
            .with_token_added(TokenField::Platforms, "xbox")
            .with_token_added(TokenField::Platforms, "pc")
            .with_sort(SortBy::Popularity, SortOrder::Asc)
            .with_only_upcoming(true);
        assert_eq!(
            mapper.build(&filters).unwrap(),
            "onlyUpcoming=true&platforms=pc%2Cxbox&sortBy=popularity"
        );
    }

    #[test]
    fn build_full_emits_every_field_sorted() {
        let mapper = QueryMapper::default();
        let query = mapper
            .build_with_mode(&FilterState::default(), QueryMode::Full)
            .unwrap();
        assert_eq!(
            query,
            "developers=&endDate=&genres=&onlyUpcoming=false&pageSize=20&platforms=\
             &popularityScore=40&publishers=&reviewScoreDesc=all&sortBy=releaseDate\
             &sortOrder=ASC&startDate=&tags="
        );
        assert_eq!(mapper.parse_query_string(&query), FilterState::default());
    }

    #[test]
    fn build_is_independent_of_token_order() {
        let mapper = QueryMapper::default();
        let a = FilterState {
            genres: strings(&["RPG", "Action"]),
            review_score_desc: strings(&["Very Positive", "Mixed"]),
            ..FilterState::default()
        };
        let b = FilterState {
            genres: strings(&["Action", "RPG"]),
            review_score_desc: strings(&["Mixed", "Very Positive"]),
            ..FilterState::default()
        };
        assert_eq!(mapper.build(&a).unwrap(), mapper.build(&b).unwrap());
    }

    mod property_tests {
        use super::*;
        use crate::strategies::filter_state_strategy;

        proptest! {
            /// Canonical state survives the address bar in both build modes.
            #[test]
            fn parse_build_round_trip(
                state in filter_state_strategy(),
                full in any::<bool>(),
            ) {
                let mapper = QueryMapper::default();
                let mode = if full { QueryMode::Full } else { QueryMode::ChangedOnly };
                let canonical = canonicalize(&state);
                let query = mapper.build_with_mode(&canonical, mode).unwrap();
                prop_assert_eq!(mapper.parse_query_string(&query), canonical);
            }

            /// Arbitrary garbage never panics and always yields canonical, in-range state.
            #[test]
            fn parse_is_total(query in ".{0,64}") {
                let filters = parse(&query);
                prop_assert!((MIN_POPULARITY_SCORE..=MAX_POPULARITY_SCORE)
                    .contains(&filters.popularity_score));
                prop_assert!((10..=50).contains(&filters.page_size));
                prop_assert_eq!(canonicalize(&filters), filters);
            }

            #[test]
            fn popularity_score_always_clamped(score in any::<i64>()) {
                let filters = parse(&format!("popularityScore={score}"));
                prop_assert_eq!(
                    filters.popularity_score,
                    score.clamp(MIN_POPULARITY_SCORE as i64, MAX_POPULARITY_SCORE as i64) as u32
                );
            }
        }
    }
}
