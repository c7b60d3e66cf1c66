//! PostgreSQL executor using sqlx.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! benchflix-rs = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! # Schema
//!
//! `movies`, `people` and the `movie_directors` join table. Title and name
//! carry `simple`-configuration GIN full-text indexes; year, `added_at`,
//! `rating` and `title` carry b-tree indexes.

use crate::config::PoolConfig;
use crate::core::error::StorageError;
use crate::core::executor::{Executor, RowReader, scan_director_group, scan_movie};
use crate::core::movie::{DirectorGroup, Movie};
use crate::query::builder::{Dialect, Statement, Value};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};

const BACKEND: &str = "PostgreSQL";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS movies (
        id BIGINT PRIMARY KEY,
        title TEXT NOT NULL,
        added_at DATE NOT NULL,
        rating DOUBLE PRECISION NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS people (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS movie_directors (
        movie_id BIGINT NOT NULL REFERENCES movies (id) ON DELETE CASCADE,
        person_id BIGINT NOT NULL REFERENCES people (id) ON DELETE CASCADE,
        PRIMARY KEY (movie_id, person_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_movies_title_fts ON movies USING GIN (to_tsvector('simple', title))",
    "CREATE INDEX IF NOT EXISTS idx_people_name_fts ON people USING GIN (to_tsvector('simple', name))",
    "CREATE INDEX IF NOT EXISTS idx_movies_year ON movies ((EXTRACT(YEAR FROM added_at)))",
    "CREATE INDEX IF NOT EXISTS idx_movies_added_at ON movies (added_at)",
    "CREATE INDEX IF NOT EXISTS idx_movies_rating ON movies (rating)",
    "CREATE INDEX IF NOT EXISTS idx_movies_title ON movies (title)",
];

/// Open a pool sized by `config`.
pub async fn connect(url: &str, config: &PoolConfig) -> Result<PgPool, StorageError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .idle_timeout(config.idle_timeout())
        .connect(url)
        .await
        .map_err(|e| StorageError::Connection {
            backend: BACKEND,
            source: e.into(),
        })
}

/// Apply the required tables and indexes (idempotent).
///
/// Safe to call on every startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StorageError> {
    for ddl in SCHEMA {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| StorageError::query(BACKEND, e))?;
    }
    Ok(())
}

/// Insert a movie, its directors and the join rows in one transaction.
///
/// Existing rows are left untouched, so seeding is repeatable.
pub async fn insert_movie(pool: &PgPool, movie: &Movie) -> Result<(), StorageError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| StorageError::query(BACKEND, e))?;

    sqlx::query(
        "INSERT INTO movies (id, title, added_at, rating) VALUES ($1, $2, $3, $4) \
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(movie.id)
    .bind(&movie.title)
    .bind(movie.added_at)
    .bind(movie.rating)
    .execute(&mut *tx)
    .await
    .map_err(|e| StorageError::query(BACKEND, e))?;

    for name in movie.directors.iter().flatten() {
        let (person_id,): (i64,) = sqlx::query_as(
            "INSERT INTO people (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StorageError::query(BACKEND, e))?;

        sqlx::query(
            "INSERT INTO movie_directors (movie_id, person_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(movie.id)
        .bind(person_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::query(BACKEND, e))?;
    }

    tx.commit()
        .await
        .map_err(|e| StorageError::query(BACKEND, e))
}

/// Executor backed by a PostgreSQL pool.
///
/// Integer lists bind as a single `BIGINT[]` parameter.
#[derive(Clone, Debug)]
pub struct PostgresExecutor {
    pool: PgPool,
}

impl PostgresExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn query<'q>(statement: &'q Statement) -> Query<'q, Postgres, PgArguments> {
        statement
            .args()
            .iter()
            .fold(sqlx::query(statement.sql()), |query, value| match value {
                Value::Text(text) => query.bind(text.as_str()),
                Value::Int(int) => query.bind(*int),
                Value::Float(float) => query.bind(*float),
                Value::IntList(ids) => query.bind(ids.as_slice()),
            })
    }

    async fn fetch_rows(&self, statement: &Statement) -> Result<Vec<PgRow>, StorageError> {
        Self::query(statement)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::query(BACKEND, e))
    }
}

#[async_trait]
impl Executor for PostgresExecutor {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn fetch_movies(&self, statement: &Statement) -> Result<Vec<Movie>, StorageError> {
        let rows = self.fetch_rows(statement).await?;
        rows.iter()
            .map(|row| scan_movie(row, statement.columns()))
            .collect()
    }

    async fn fetch_director_groups(
        &self,
        statement: &Statement,
    ) -> Result<Vec<DirectorGroup>, StorageError> {
        let rows = self.fetch_rows(statement).await?;
        rows.iter().map(scan_director_group).collect()
    }
}

impl RowReader for PgRow {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn read_i64(&self, index: usize, column: &'static str) -> Result<i64, StorageError> {
        self.try_get(index)
            .map_err(|e| StorageError::decode(BACKEND, column, e))
    }

    fn read_f64(&self, index: usize, column: &'static str) -> Result<f64, StorageError> {
        self.try_get(index)
            .map_err(|e| StorageError::decode(BACKEND, column, e))
    }

    fn read_string(&self, index: usize, column: &'static str) -> Result<String, StorageError> {
        self.try_get(index)
            .map_err(|e| StorageError::decode(BACKEND, column, e))
    }

    fn read_date(&self, index: usize, column: &'static str) -> Result<NaiveDate, StorageError> {
        self.try_get(index)
            .map_err(|e| StorageError::decode(BACKEND, column, e))
    }

    fn read_names(
        &self,
        index: usize,
        column: &'static str,
    ) -> Result<Option<Vec<String>>, StorageError> {
        self.try_get(index)
            .map_err(|e| StorageError::decode(BACKEND, column, e))
    }
}
