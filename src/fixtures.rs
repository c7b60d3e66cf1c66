//! Fixture loading for seeding and benchmark runs
//!
//! Movies come from a JSON array or from the catalog CSV export; parameter
//! sets are always JSON.

use crate::core::Movie;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::StringRecord;
use serde::de::DeserializeOwned;
use std::path::Path;

// Catalog CSV column positions
const CSV_ID: usize = 0;
const CSV_TITLE: usize = 2;
const CSV_DIRECTORS: usize = 3;
const CSV_ADDED_AT: usize = 6;
const CSV_RATING: usize = 8;

const DIRECTOR_SEPARATOR: &str = ", ";

/// Read movies from `path`, as CSV when the extension is `csv` and as JSON
/// otherwise.
pub fn load_movie_fixture(path: impl AsRef<Path>) -> Result<Vec<Movie>> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        load_movies_csv(path)
    } else {
        load_movies(path)
    }
}

/// Read a JSON array of movies.
///
/// ```json
/// [{"id": 1, "title": "Little Shark", "added_at": "2021-06-01",
///   "rating": 7.5, "directors": ["Tom Shark"]}]
/// ```
pub fn load_movies(path: impl AsRef<Path>) -> Result<Vec<Movie>> {
    load_json(path.as_ref())
}

/// Read the catalog CSV export.
///
/// The first row is a header. Columns used: id (0), title (2), directors (3,
/// joined by `", "`), added_at (6, `YYYY-MM-DD`) and rating (8); the others are
/// ignored. An empty directors cell gives a movie with no directors.
pub fn load_movies_csv(path: impl AsRef<Path>) -> Result<Vec<Movie>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut movies = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to parse {}", path.display()))?;
        let movie = movie_from_record(&record)
            .with_context(|| format!("{}: invalid record {}", path.display(), i + 1))?;
        movies.push(movie);
    }
    Ok(movies)
}

fn movie_from_record(record: &StringRecord) -> Result<Movie> {
    let id: i64 = column(record, CSV_ID, "id")?
        .parse()
        .context("id is not an integer")?;
    let title = column(record, CSV_TITLE, "title")?;
    let added_at = NaiveDate::parse_from_str(column(record, CSV_ADDED_AT, "added_at")?, "%Y-%m-%d")
        .context("added_at is not a YYYY-MM-DD date")?;
    let rating: f64 = column(record, CSV_RATING, "rating")?
        .parse()
        .context("rating is not a number")?;
    let directors = column(record, CSV_DIRECTORS, "directors")?
        .split(DIRECTOR_SEPARATOR)
        .map(str::trim)
        .filter(|name| !name.is_empty());

    Ok(Movie::new(id, title, added_at, rating).with_directors(directors))
}

fn column<'r>(record: &'r StringRecord, index: usize, name: &str) -> Result<&'r str> {
    record
        .get(index)
        .map(str::trim)
        .with_context(|| format!("missing {name} column"))
}

/// Read a JSON array of parameter objects, keeping the first `size` entries
/// (`0` keeps all).
///
/// The same file decodes as either parameter shape; fields the shape does not
/// know are ignored.
pub fn load_params<P: DeserializeOwned>(path: impl AsRef<Path>, size: usize) -> Result<Vec<P>> {
    let mut params: Vec<P> = load_json(path.as_ref())?;
    if size > 0 {
        params.truncate(size);
    }
    Ok(params)
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}
