// Strong typing over query strings. Newtypes for calendar dates, enums for sort keys
// and review buckets. FilterState values are snapshots: every mutation returns a new one.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::config::PageSizeBounds;

/// Sentinel review token meaning "no review filter".
pub const REVIEW_ALL: &str = "all";

pub const MIN_POPULARITY_SCORE: u32 = 40;
pub const MAX_POPULARITY_SCORE: u32 = 100;
pub const DEFAULT_POPULARITY_SCORE: u32 = 40;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

pub fn clamp_popularity_score(score: u32) -> u32 {
    score.clamp(MIN_POPULARITY_SCORE, MAX_POPULARITY_SCORE)
}

/// Calendar date in `YYYY-MM-DD` form. Newtype so that only valid dates reach the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Parse a strict `YYYY-MM-DD` string. Anything else, including the empty string, is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        let shape_ok = bytes.len() == 10
            && bytes[4] == b'-'
            && bytes[7] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        if !shape_ok {
            return None;
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(CalendarDate)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        if !(0..=9999).contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, day).map(CalendarDate)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            self.0.month(),
            self.0.day()
        )
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CalendarDate::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid calendar date: {s:?}")))
    }
}

/// Sort key for the game list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    ReleaseDate,
    Popularity,
    Name,
}

impl SortBy {
    pub const ALL: [SortBy; 3] = [SortBy::ReleaseDate, SortBy::Popularity, SortBy::Name];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::ReleaseDate => "releaseDate",
            SortBy::Popularity => "popularity",
            SortBy::Name => "name",
        }
    }

    pub fn from_query(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sort_by| sort_by.as_str() == s)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn from_query(s: &str) -> Option<Self> {
        match s {
            "ASC" => Some(SortOrder::Asc),
            "DESC" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Review-sentiment bucket, as reported by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReviewBucket {
    OverwhelminglyPositive,
    VeryPositive,
    Positive,
    MostlyPositive,
    Mixed,
    MostlyNegative,
    Negative,
    VeryNegative,
    OverwhelminglyNegative,
}

impl ReviewBucket {
    /// Display order, best to worst.
    pub const ALL: [ReviewBucket; 9] = [
        ReviewBucket::OverwhelminglyPositive,
        ReviewBucket::VeryPositive,
        ReviewBucket::Positive,
        ReviewBucket::MostlyPositive,
        ReviewBucket::Mixed,
        ReviewBucket::MostlyNegative,
        ReviewBucket::Negative,
        ReviewBucket::VeryNegative,
        ReviewBucket::OverwhelminglyNegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewBucket::OverwhelminglyPositive => "Overwhelmingly Positive",
            ReviewBucket::VeryPositive => "Very Positive",
            ReviewBucket::Positive => "Positive",
            ReviewBucket::MostlyPositive => "Mostly Positive",
            ReviewBucket::Mixed => "Mixed",
            ReviewBucket::MostlyNegative => "Mostly Negative",
            ReviewBucket::Negative => "Negative",
            ReviewBucket::VeryNegative => "Very Negative",
            ReviewBucket::OverwhelminglyNegative => "Overwhelmingly Negative",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.as_str() == token)
    }
}

/// The token-set fields of a filter. Order inside each set is insignificant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenField {
    Genres,
    Tags,
    Developers,
    Publishers,
    Platforms,
}

impl TokenField {
    pub const ALL: [TokenField; 5] = [
        TokenField::Genres,
        TokenField::Tags,
        TokenField::Developers,
        TokenField::Publishers,
        TokenField::Platforms,
    ];

    /// Query parameter (and JSON field) name.
    pub fn query_key(&self) -> &'static str {
        match self {
            TokenField::Genres => "genres",
            TokenField::Tags => "tags",
            TokenField::Developers => "developers",
            TokenField::Publishers => "publishers",
            TokenField::Platforms => "platforms",
        }
    }
}

/// Filter state of the game list, as mirrored in the URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub start_date: Option<CalendarDate>,
    pub end_date: Option<CalendarDate>,
    pub only_upcoming: bool,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub developers: Vec<String>,
    pub publishers: Vec<String>,
    pub platforms: Vec<String>,
    pub review_score_desc: Vec<String>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page_size: u32,
    pub popularity_score: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState::with_page_size_default(DEFAULT_PAGE_SIZE)
    }
}

impl FilterState {
    /// All defaults, with the given default page size.
    pub fn with_page_size_default(page_size: u32) -> Self {
        FilterState {
            start_date: None,
            end_date: None,
            only_upcoming: false,
            genres: Vec::new(),
            tags: Vec::new(),
            developers: Vec::new(),
            publishers: Vec::new(),
            platforms: Vec::new(),
            review_score_desc: vec![REVIEW_ALL.to_string()],
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            page_size,
            popularity_score: DEFAULT_POPULARITY_SCORE,
        }
    }

    pub fn tokens(&self, field: TokenField) -> &[String] {
        match field {
            TokenField::Genres => &self.genres,
            TokenField::Tags => &self.tags,
            TokenField::Developers => &self.developers,
            TokenField::Publishers => &self.publishers,
            TokenField::Platforms => &self.platforms,
        }
    }

    pub(crate) fn tokens_mut(&mut self, field: TokenField) -> &mut Vec<String> {
        match field {
            TokenField::Genres => &mut self.genres,
            TokenField::Tags => &mut self.tags,
            TokenField::Developers => &mut self.developers,
            TokenField::Publishers => &mut self.publishers,
            TokenField::Platforms => &mut self.platforms,
        }
    }

    /// Set-union insert: adding a token that is already selected is a no-op.
    pub fn with_token_added(&self, field: TokenField, token: &str) -> Self {
        let mut next = self.clone();
        let tokens = next.tokens_mut(field);
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
        next
    }

    pub fn with_token_removed(&self, field: TokenField, token: &str) -> Self {
        let mut next = self.clone();
        next.tokens_mut(field).retain(|t| t != token);
        next
    }

    pub fn with_token_toggled(&self, field: TokenField, token: &str) -> Self {
        if self.tokens(field).iter().any(|t| t == token) {
            self.with_token_removed(field, token)
        } else {
            self.with_token_added(field, token)
        }
    }

    /// Toggle a concrete review bucket. Selecting one drops the `all` sentinel,
    /// deselecting the last one brings it back.
    pub fn with_review_bucket_toggled(&self, bucket: ReviewBucket) -> Self {
        let mut next = self.clone();
        let token = bucket.as_str();
        next.review_score_desc.retain(|t| t != REVIEW_ALL);
        if next.review_score_desc.iter().any(|t| t == token) {
            next.review_score_desc.retain(|t| t != token);
        } else {
            next.review_score_desc.push(token.to_string());
        }
        if next.review_score_desc.is_empty() {
            next.review_score_desc.push(REVIEW_ALL.to_string());
        }
        next
    }

    /// Clear the review filter.
    pub fn with_all_reviews(&self) -> Self {
        FilterState {
            review_score_desc: vec![REVIEW_ALL.to_string()],
            ..self.clone()
        }
    }

    pub fn with_date_range(&self, start: Option<CalendarDate>, end: Option<CalendarDate>) -> Self {
        FilterState {
            start_date: start,
            end_date: end,
            ..self.clone()
        }
    }

    pub fn with_only_upcoming(&self, only_upcoming: bool) -> Self {
        FilterState {
            only_upcoming,
            ..self.clone()
        }
    }

    pub fn with_sort(&self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        FilterState {
            sort_by,
            sort_order,
            ..self.clone()
        }
    }

    pub fn with_page_size(&self, page_size: u32, bounds: &PageSizeBounds) -> Self {
        FilterState {
            page_size: bounds.clamp(page_size),
            ..self.clone()
        }
    }

    pub fn with_popularity_score(&self, score: u32) -> Self {
        FilterState {
            popularity_score: clamp_popularity_score(score),
            ..self.clone()
        }
    }
}

/// Filter JSON from JS is untrusted like the URL: wrong types and unknown values
/// fall back to defaults instead of failing. Only malformed JSON is an error.
impl<'de> Deserialize<'de> for FilterState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(crate::coerce::filters_from_json(&value, FilterState::default()))
    }
}
