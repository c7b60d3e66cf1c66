//! Core module containing the domain types and the repository contract

pub mod error;
pub mod executor;
pub mod movie;
pub mod params;
pub mod repository;

pub use error::{QueryError, StorageError};
pub use executor::{Executor, RowReader};
pub use movie::{DirectorGroup, Movie, MovieColumn};
pub use params::{DashboardParams, Filter, ListParams};
pub use repository::{QueryContext, Repository, Scenario};
