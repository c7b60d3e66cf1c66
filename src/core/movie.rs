//! The movie entity and its column layout

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A catalog movie as returned by every scenario.
///
/// `directors` distinguishes "not requested" (`None`) from "requested but
/// nobody is related" (`Some(vec![])`). When present the names are sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub added_at: NaiveDate,
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directors: Option<Vec<String>>,
}

impl Movie {
    /// Create a movie without directors (not requested).
    pub fn new(id: i64, title: impl Into<String>, added_at: NaiveDate, rating: f64) -> Self {
        Self {
            id,
            title: title.into(),
            added_at,
            rating,
            directors: None,
        }
    }

    /// Attach a director collection, normalizing its order.
    pub fn with_directors<I, S>(mut self, directors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directors = Some(sorted_names(
            directors.into_iter().map(Into::into).collect(),
        ));
        self
    }
}

/// Sort a related-names collection so output is deterministic.
pub fn sorted_names(mut names: Vec<String>) -> Vec<String> {
    names.sort_unstable();
    names
}

/// A column a movie statement may project, in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieColumn {
    Id,
    Title,
    AddedAt,
    Rating,
    Directors,
}

impl MovieColumn {
    pub fn name(self) -> &'static str {
        match self {
            MovieColumn::Id => "id",
            MovieColumn::Title => "title",
            MovieColumn::AddedAt => "added_at",
            MovieColumn::Rating => "rating",
            MovieColumn::Directors => "directors",
        }
    }
}

/// Core columns only.
pub const CORE_COLUMNS: &[MovieColumn] = &[
    MovieColumn::Id,
    MovieColumn::Title,
    MovieColumn::AddedAt,
    MovieColumn::Rating,
];

/// Core columns followed by the inline director aggregation.
pub const COLUMNS_WITH_DIRECTORS: &[MovieColumn] = &[
    MovieColumn::Id,
    MovieColumn::Title,
    MovieColumn::AddedAt,
    MovieColumn::Rating,
    MovieColumn::Directors,
];

/// One row of the secondary hydration statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectorGroup {
    pub movie_id: i64,
    pub names: Vec<String>,
}
