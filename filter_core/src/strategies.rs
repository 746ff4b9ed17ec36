// Shared proptest strategies for filter state.

use proptest::prelude::*;

use crate::types::*;

/// URL-safe token: non-empty, no commas, no surrounding whitespace.
pub fn token_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9]([A-Za-z0-9 ._&+-]{0,10}[A-Za-z0-9])?"
}

pub fn tokens_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(token_strategy(), 0..6)
}

/// Review tokens: known buckets, the sentinel, and junk.
pub fn review_strategy() -> impl Strategy<Value = Vec<String>> {
    let token = prop_oneof![
        prop::sample::select(ReviewBucket::ALL.to_vec()).prop_map(|b| b.as_str().to_string()),
        Just(REVIEW_ALL.to_string()),
        token_strategy(),
    ];
    prop::collection::vec(token, 0..5)
}

pub fn date_strategy() -> impl Strategy<Value = Option<CalendarDate>> {
    prop::option::of(
        (1990i32..2040, 1u32..=12, 1u32..=28)
            .prop_filter_map("valid date", |(y, m, d)| CalendarDate::from_ymd(y, m, d)),
    )
}

pub fn sort_order_strategy() -> impl Strategy<Value = SortOrder> {
    prop::bool::ANY.prop_map(|desc| if desc { SortOrder::Desc } else { SortOrder::Asc })
}

/// Arbitrary filter state, including out-of-range numbers and unsorted tokens.
pub fn filter_state_strategy() -> impl Strategy<Value = FilterState> {
    (
        (date_strategy(), date_strategy(), any::<bool>()),
        (
            tokens_strategy(),
            tokens_strategy(),
            tokens_strategy(),
            tokens_strategy(),
            tokens_strategy(),
        ),
        review_strategy(),
        (
            prop::sample::select(SortBy::ALL.to_vec()),
            sort_order_strategy(),
        ),
        (0u32..200, 0u32..200),
    )
        .prop_map(
            |(
                (start_date, end_date, only_upcoming),
                (genres, tags, developers, publishers, platforms),
                review_score_desc,
                (sort_by, sort_order),
                (page_size, popularity_score),
            )| FilterState {
                start_date,
                end_date,
                only_upcoming,
                genres,
                tags,
                developers,
                publishers,
                platforms,
                review_score_desc,
                sort_by,
                sort_order,
                page_size,
                popularity_score,
            },
        )
}
