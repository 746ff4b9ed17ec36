// Lenient coercion of untrusted input (URL values, filter JSON from JS) into typed fields.
// Nothing here fails: unusable values fall back to the given default and are logged.

use serde_json::{Map, Value};

use crate::types::*;

pub(crate) fn parse_date(raw: Option<&str>) -> Option<CalendarDate> {
    let raw = raw?;
    let date = CalendarDate::parse(raw);
    if date.is_none() && !raw.is_empty() {
        log::debug!("Ignoring invalid date value {raw:?}");
    }
    date
}

/// Comma-separated tokens from every value; blank segments are dropped and tokens are trimmed.
pub(crate) fn parse_csv<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values
        .iter()
        .flat_map(|raw| raw.as_ref().split(','))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn parse_enum<T>(raw: Option<&str>, from_query: fn(&str) -> Option<T>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => from_query(raw).unwrap_or_else(|| {
            log::debug!("Unknown enum value {raw:?}, using default");
            default
        }),
    }
}

/// Numbers are read leniently (`"12.7"` is 12); non-finite input gives the default.
/// Negative values saturate to zero and are clamped by the caller.
pub(crate) fn parse_number(raw: Option<&str>, default: u32) -> u32 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<f64>() {
        Ok(value) => number_or_default(value, default),
        Err(_) => {
            log::debug!("Invalid numeric value {raw:?}, using default {default}");
            default
        }
    }
}

fn number_or_default(value: f64, default: u32) -> u32 {
    if value.is_finite() {
        value.trunc().clamp(0.0, u32::MAX as f64) as u32
    } else {
        log::debug!("Non-finite numeric value {value}, using default {default}");
        default
    }
}

fn json_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

fn json_number(value: Option<&Value>, default: u32) -> u32 {
    match value {
        Some(Value::Number(n)) => n
            .as_f64()
            .map_or(default, |n| number_or_default(n, default)),
        Some(Value::String(s)) => parse_number(Some(s), default),
        _ => default,
    }
}

fn json_bool(value: Option<&Value>, default: bool) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => default,
    }
}

/// Arrays, CSV strings, or nothing. `null` and other shapes are the empty set.
fn json_tokens(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => {
            let strings: Vec<&str> = items
                .iter()
                .filter_map(|item| {
                    let s = item.as_str();
                    if s.is_none() {
                        log::debug!("Ignoring non-string token {item}");
                    }
                    s
                })
                .collect();
            parse_csv(&strings)
        }
        Some(Value::String(s)) => parse_csv(&[s]),
        _ => Vec::new(),
    }
}

/// Filter state from loosely typed JSON. Missing keys keep the value from `defaults`;
/// a non-object document gives `defaults` unchanged.
pub(crate) fn filters_from_json(value: &Value, defaults: FilterState) -> FilterState {
    let empty = Map::new();
    let object = match value {
        Value::Object(object) => object,
        other => {
            log::debug!("Filter JSON is not an object ({other}), using defaults");
            &empty
        }
    };
    let field = |key: &str| object.get(key);

    let mut filters = FilterState {
        start_date: parse_date(json_str(field("startDate"))),
        end_date: parse_date(json_str(field("endDate"))),
        only_upcoming: json_bool(field("onlyUpcoming"), defaults.only_upcoming),
        sort_by: parse_enum(json_str(field("sortBy")), SortBy::from_query, defaults.sort_by),
        sort_order: parse_enum(
            json_str(field("sortOrder")),
            SortOrder::from_query,
            defaults.sort_order,
        ),
        page_size: json_number(field("pageSize"), defaults.page_size),
        popularity_score: json_number(field("popularityScore"), defaults.popularity_score),
        ..defaults
    };
    for token_field in TokenField::ALL {
        if let Some(value) = field(token_field.query_key()) {
            *filters.tokens_mut(token_field) = json_tokens(Some(value));
        }
    }
    if let Some(value) = field("reviewScoreDesc") {
        filters.review_score_desc = json_tokens(Some(value));
    }
    filters
}
