//! Store capability consumed by the generic repository
//!
//! An [`Executor`] runs a rendered [`Statement`] and scans its rows. It knows
//! nothing about scenarios; composing statements and merging the hydration
//! round trip happen above it.

use crate::core::error::StorageError;
use crate::core::movie::{DirectorGroup, Movie, MovieColumn, sorted_names};
use crate::query::builder::{Dialect, Statement};
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait Executor: Send + Sync {
    /// Human readable backend name, used in errors and logs
    fn backend(&self) -> &'static str;

    fn dialect(&self) -> Dialect;

    /// Run a movie statement, scanning exactly `statement.columns()`.
    async fn fetch_movies(&self, statement: &Statement) -> Result<Vec<Movie>, StorageError>;

    /// Run the hydration statement, one group per related movie.
    async fn fetch_director_groups(
        &self,
        statement: &Statement,
    ) -> Result<Vec<DirectorGroup>, StorageError>;
}

/// Positional access to one result row.
///
/// Implemented by each driver's row type so that [`scan_movie`] owns the
/// column-to-field mapping once.
pub trait RowReader {
    fn backend(&self) -> &'static str;

    fn read_i64(&self, index: usize, column: &'static str) -> Result<i64, StorageError>;

    fn read_f64(&self, index: usize, column: &'static str) -> Result<f64, StorageError>;

    fn read_string(&self, index: usize, column: &'static str) -> Result<String, StorageError>;

    fn read_date(&self, index: usize, column: &'static str) -> Result<NaiveDate, StorageError>;

    /// An aggregated name collection; SQL NULL reads as `None`.
    fn read_names(
        &self,
        index: usize,
        column: &'static str,
    ) -> Result<Option<Vec<String>>, StorageError>;
}

/// Scan one movie row projecting `columns` in order.
///
/// A projected directors column always yields `Some`, empty when the
/// aggregation produced NULL, with names sorted.
pub fn scan_movie<R: RowReader + ?Sized>(
    row: &R,
    columns: &[MovieColumn],
) -> Result<Movie, StorageError> {
    let mut id = None;
    let mut title = None;
    let mut added_at = None;
    let mut rating = None;
    let mut directors = None;

    for (index, column) in columns.iter().enumerate() {
        let name = column.name();
        match column {
            MovieColumn::Id => id = Some(row.read_i64(index, name)?),
            MovieColumn::Title => title = Some(row.read_string(index, name)?),
            MovieColumn::AddedAt => added_at = Some(row.read_date(index, name)?),
            MovieColumn::Rating => rating = Some(row.read_f64(index, name)?),
            MovieColumn::Directors => {
                let names = row.read_names(index, name)?.unwrap_or_default();
                directors = Some(sorted_names(names));
            }
        }
    }

    let missing = |column: MovieColumn| {
        StorageError::decode(row.backend(), column.name(), "column not projected")
    };

    Ok(Movie {
        id: id.ok_or_else(|| missing(MovieColumn::Id))?,
        title: title.ok_or_else(|| missing(MovieColumn::Title))?,
        added_at: added_at.ok_or_else(|| missing(MovieColumn::AddedAt))?,
        rating: rating.ok_or_else(|| missing(MovieColumn::Rating))?,
        directors,
    })
}

/// Scan one `(movie_id, names)` row of the hydration statement.
pub fn scan_director_group<R: RowReader + ?Sized>(row: &R) -> Result<DirectorGroup, StorageError> {
    Ok(DirectorGroup {
        movie_id: row.read_i64(0, "movie_id")?,
        names: sorted_names(row.read_names(1, "directors")?.unwrap_or_default()),
    })
}
