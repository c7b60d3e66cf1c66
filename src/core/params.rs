//! Filter, sort and pagination parameters for the four scenarios

use serde::{Deserialize, Serialize};

/// Parameters of the List scenarios.
///
/// Zero/empty fields disable their filter. `limit` is resolved by the sort
/// policy, so any value is accepted here.
///
/// # Example
/// ```json
/// {"search": "shark", "year_added": 2021, "min_rating": 6.5, "limit": 50}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListParams {
    #[serde(alias = "Search")]
    pub search: String,

    #[serde(alias = "YearAdded")]
    pub year_added: i64,

    #[serde(alias = "MinRating")]
    pub min_rating: f64,

    #[serde(alias = "Limit")]
    pub limit: u64,
}

impl ListParams {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn year_added(mut self, year: i64) -> Self {
        self.year_added = year;
        self
    }

    pub fn min_rating(mut self, rating: f64) -> Self {
        self.min_rating = rating;
        self
    }

    pub fn filter(&self) -> Filter<'_> {
        Filter {
            search: &self.search,
            year_added: self.year_added,
            min_rating: self.min_rating,
        }
    }
}

/// Parameters of the Dashboard scenarios.
///
/// `sort` must name an allow-listed column (`title`, `added_at`, `rating`);
/// anything else is rejected when the statement is composed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardParams {
    #[serde(alias = "Search")]
    pub search: String,

    #[serde(alias = "YearAdded")]
    pub year_added: i64,

    #[serde(alias = "MinRating")]
    pub min_rating: f64,

    #[serde(alias = "Limit")]
    pub limit: u64,

    #[serde(alias = "Sort")]
    pub sort: String,

    #[serde(alias = "Desc")]
    pub desc: bool,

    #[serde(alias = "WithDirectors")]
    pub with_directors: bool,
}

impl DashboardParams {
    pub fn new(sort: impl Into<String>, limit: u64) -> Self {
        Self {
            sort: sort.into(),
            limit,
            ..Self::default()
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn year_added(mut self, year: i64) -> Self {
        self.year_added = year;
        self
    }

    pub fn min_rating(mut self, rating: f64) -> Self {
        self.min_rating = rating;
        self
    }

    pub fn descending(mut self, desc: bool) -> Self {
        self.desc = desc;
        self
    }

    pub fn with_directors(mut self, with_directors: bool) -> Self {
        self.with_directors = with_directors;
        self
    }

    pub fn filter(&self) -> Filter<'_> {
        Filter {
            search: &self.search,
            year_added: self.year_added,
            min_rating: self.min_rating,
        }
    }
}

/// The filter fields shared by both parameter shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Filter<'a> {
    pub search: &'a str,
    pub year_added: i64,
    pub min_rating: f64,
}

impl Filter<'_> {
    /// True when no filter field is set.
    pub fn is_unfiltered(&self) -> bool {
        self.search.is_empty() && self.year_added == 0 && self.min_rating == 0.0
    }
}
