//! MySQL executor using sqlx.
//!
//! # Feature flag
//!
//! This module is gated behind the `mysql` feature flag:
//! ```toml
//! [dependencies]
//! benchflix-rs = { version = "0.1", features = ["mysql"] }
//! ```
//!
//! # Differences from PostgreSQL backend
//!
//! - `?` placeholders; a repeated value is bound once per reference
//! - integer lists are expanded to `?, ?, …` before they reach the driver
//! - `MATCH … AGAINST` on `FULLTEXT` indexes instead of `tsvector`; the server
//!   needs `--innodb-ft-min-token-size=1` for one- and two-letter terms
//! - names aggregate with `JSON_ARRAYAGG`, which has no ordering clause, so
//!   they are sorted after decoding
//! - `INSERT IGNORE` instead of `ON CONFLICT`
//! - indexes are declared inline since `CREATE INDEX IF NOT EXISTS` is missing

use crate::config::PoolConfig;
use crate::core::error::StorageError;
use crate::core::executor::{Executor, RowReader, scan_director_group, scan_movie};
use crate::core::movie::{DirectorGroup, Movie};
use crate::query::builder::{Dialect, Statement, Value};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::mysql::{MySqlArguments, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{MySql, MySqlPool, Row};

const BACKEND: &str = "MySQL";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS movies (
        id BIGINT NOT NULL PRIMARY KEY,
        title VARCHAR(512) NOT NULL,
        added_at DATE NOT NULL,
        rating DOUBLE NOT NULL,
        FULLTEXT INDEX idx_movies_title_fts (title),
        INDEX idx_movies_year ((YEAR(added_at))),
        INDEX idx_movies_added_at (added_at),
        INDEX idx_movies_rating (rating),
        INDEX idx_movies_title (title)
    )",
    "CREATE TABLE IF NOT EXISTS people (
        id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        UNIQUE INDEX idx_people_name (name),
        FULLTEXT INDEX idx_people_name_fts (name)
    )",
    "CREATE TABLE IF NOT EXISTS movie_directors (
        movie_id BIGINT NOT NULL,
        person_id BIGINT NOT NULL,
        PRIMARY KEY (movie_id, person_id),
        FOREIGN KEY (movie_id) REFERENCES movies (id) ON DELETE CASCADE,
        FOREIGN KEY (person_id) REFERENCES people (id) ON DELETE CASCADE
    )",
];

/// Open a pool sized by `config`.
pub async fn connect(url: &str, config: &PoolConfig) -> Result<MySqlPool, StorageError> {
    MySqlPoolOptions::new()
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
/// The `FULLTEXT` indexes are built with stopwords disabled so terms such as
/// "the" stay searchable, matching PostgreSQL's `simple` configuration. The
/// minimum token length is a server startup option
/// (`--innodb-ft-min-token-size=1`); a larger value is logged as a warning.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), StorageError> {
    let mut conn = pool
        .acquire()
        .await
        .map_err(|e| StorageError::query(BACKEND, e))?;

    // Read when an index is created, so it must be set on the DDL connection
    sqlx::query("SET SESSION innodb_ft_enable_stopword = 0")
        .execute(&mut *conn)
        .await
        .map_err(|e| StorageError::query(BACKEND, e))?;

    for ddl in SCHEMA {
        sqlx::query(ddl)
            .execute(&mut *conn)
            .await
            .map_err(|e| StorageError::query(BACKEND, e))?;
    }

    let (min_token_size,): (i64,) =
        sqlx::query_as("SELECT CAST(@@innodb_ft_min_token_size AS SIGNED)")
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| StorageError::query(BACKEND, e))?;
    if min_token_size > 1 {
        tracing::warn!(
            min_token_size,
            "innodb_ft_min_token_size is above 1, shorter search terms will not match"
        );
    }
    Ok(())
}

/// Insert a movie, its directors and the join rows in one transaction.
pub async fn insert_movie(pool: &MySqlPool, movie: &Movie) -> Result<(), StorageError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| StorageError::query(BACKEND, e))?;

    sqlx::query("INSERT IGNORE INTO movies (id, title, added_at, rating) VALUES (?, ?, ?, ?)")
        .bind(movie.id)
        .bind(&movie.title)
        .bind(movie.added_at)
        .bind(movie.rating)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::query(BACKEND, e))?;

    for name in movie.directors.iter().flatten() {
        sqlx::query("INSERT IGNORE INTO people (name) VALUES (?)")
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::query(BACKEND, e))?;

        // No RETURNING on MySQL, read the id back
        let (person_id,): (i64,) = sqlx::query_as("SELECT id FROM people WHERE name = ?")
            .bind(name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| StorageError::query(BACKEND, e))?;

        sqlx::query("INSERT IGNORE INTO movie_directors (movie_id, person_id) VALUES (?, ?)")
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

/// Executor backed by a MySQL pool.
#[derive(Clone, Debug)]
pub struct MysqlExecutor {
    pool: MySqlPool,
}

impl MysqlExecutor {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    fn query<'q>(statement: &'q Statement) -> Result<Query<'q, MySql, MySqlArguments>, StorageError> {
        let mut query = sqlx::query(statement.sql());
        for value in statement.args() {
            query = match value {
                Value::Text(text) => query.bind(text.as_str()),
                Value::Int(int) => query.bind(*int),
                Value::Float(float) => query.bind(*float),
                Value::IntList(_) => {
                    return Err(StorageError::UnsupportedBind {
                        backend: BACKEND,
                        kind: value.kind(),
                    });
                }
            };
        }
        Ok(query)
    }

    async fn fetch_rows(&self, statement: &Statement) -> Result<Vec<MySqlRow>, StorageError> {
        Self::query(statement)?
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::query(BACKEND, e))
    }
}

#[async_trait]
impl Executor for MysqlExecutor {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn dialect(&self) -> Dialect {
        Dialect::MySql
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

impl RowReader for MySqlRow {
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
        self.try_get::<Option<Json<Vec<String>>>, _>(index)
            .map(|names| names.map(|Json(names)| names))
            .map_err(|e| StorageError::decode(BACKEND, column, e))
    }
}
