//! Shared test harness for repository scenario testing
//!
//! Provides a small fixed catalog, helpers for inspecting results, and the
//! `scenario_tests!` conformance macro.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod scenario_harness;
//! use scenario_harness::*;
//!
//! scenario_tests!(seeded_repository().await);
//! ```

#![allow(dead_code)]

#[macro_use]
mod scenario_tests;

use benchflix::core::Movie;
use chrono::NaiveDate;

pub const LITTLE_SHARK: i64 = 1;
pub const THE_THING: i64 = 2;
pub const SEA_OF_GLASS: i64 = 3;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Three movies:
///
/// | id | title        | added      | rating | directors          |
/// |----|--------------|------------|--------|--------------------|
/// | 1  | Little Shark | 2021-06-01 | 7.5    | Ann Lee            |
/// | 2  | The Thing    | 2019-02-03 | 8.1    | Tom Shark, Bob Ray |
/// | 3  | Sea of Glass | 2021-09-10 | 5.0    | (none)             |
///
/// "shark" matches movie 1 by title and movie 2 by director.
pub fn catalog() -> Vec<Movie> {
    vec![
        Movie::new(LITTLE_SHARK, "Little Shark", date(2021, 6, 1), 7.5).with_directors(["Ann Lee"]),
        Movie::new(THE_THING, "The Thing", date(2019, 2, 3), 8.1)
            .with_directors(["Tom Shark", "Bob Ray"]),
        Movie::new(SEA_OF_GLASS, "Sea of Glass", date(2021, 9, 10), 5.0)
            .with_directors(Vec::<String>::new()),
    ]
}

pub fn ids(movies: &[Movie]) -> Vec<i64> {
    movies.iter().map(|m| m.id).collect()
}

pub fn names(list: &[&str]) -> Option<Vec<String>> {
    Some(list.iter().map(|n| n.to_string()).collect())
}

/// Find a movie by id, panicking with the ids present otherwise.
pub fn by_id(movies: &[Movie], id: i64) -> &Movie {
    movies
        .iter()
        .find(|m| m.id == id)
        .unwrap_or_else(|| panic!("movie {} not in {:?}", id, ids(movies)))
}
