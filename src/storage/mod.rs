//! Executor implementations for different backends

pub mod in_memory;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::{InMemoryExecutor, RoundTrip};
#[cfg(feature = "mysql")]
pub use mysql::MysqlExecutor;
#[cfg(feature = "postgres")]
pub use postgres::PostgresExecutor;
