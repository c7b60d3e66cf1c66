//! # benchflix
//!
//! Compares data-access strategies on a movie catalog through four named
//! query scenarios.
//!
//! ## Features
//!
//! - **Four scenarios**: List, List-with-hydration, Dashboard and
//!   Dashboard-with-hydration behind one [`Repository`](core::Repository) trait
//! - **Composable filters**: optional search, year and rating predicates with
//!   late placeholder rendering for PostgreSQL (`$n`) and MySQL (`?`)
//! - **Allow-listed sorting**: user input never reaches the SQL text
//! - **Batch hydration**: related director names in exactly one secondary
//!   round trip, merged through an id index
//! - **Cancellation**: every round trip races a `CancellationToken`
//! - **Pluggable stores**: PostgreSQL and MySQL via `sqlx`, plus an in-memory
//!   executor for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use benchflix::prelude::*;
//!
//! let pool = benchflix::storage::postgres::connect(&url, &PoolConfig::default()).await?;
//! let repo = ComposedRepository::new("composed", PostgresExecutor::new(pool));
//!
//! let params = DashboardParams::new("title", 10)
//!     .search("shark")
//!     .with_directors(true);
//! let movies = repo.query_dashboard_preload(&QueryContext::new(), &params).await?;
//! ```

pub mod config;
pub mod core;
pub mod fixtures;
pub mod query;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        DashboardParams, DirectorGroup, Executor, ListParams, Movie, MovieColumn, QueryContext,
        QueryError, Repository, Scenario, StorageError,
    };

    // === Query ===
    pub use crate::query::{ComposedRepository, Dialect, SqlBuilder, Statement, Value};

    // === Storage ===
    pub use crate::storage::InMemoryExecutor;
    #[cfg(feature = "mysql")]
    pub use crate::storage::MysqlExecutor;
    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresExecutor;

    // === Config ===
    pub use crate::config::{Backend, BenchConfig, DatabaseUrls, PoolConfig, StrategyConfig};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::NaiveDate;
    pub use tokio_util::sync::CancellationToken;
}
