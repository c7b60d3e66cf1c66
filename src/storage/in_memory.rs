//! In-memory executor for tests and dry runs
//!
//! `InMemoryExecutor` does not interpret SQL. Movie statements return the
//! stored rows in insertion order, truncated to the statement's trailing
//! limit bind, with directors attached only when the statement projects them.
//! Hydration statements are answered from the stored relations using the ids
//! bound in the statement. Every statement is recorded, and a round trip can
//! be made to fail or to hang so error and cancellation paths are testable.

use crate::core::error::StorageError;
use crate::core::executor::Executor;
use crate::core::movie::{DirectorGroup, Movie, MovieColumn, sorted_names};
use crate::query::builder::{Dialect, RowShape, Statement, Value};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

const BACKEND: &str = "in-memory";

/// Which round trip a scripted behaviour applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundTrip {
    /// Movie statements
    Primary,
    /// The director batch statement
    Hydration,
}

impl RoundTrip {
    fn of(statement: &Statement) -> Self {
        match statement.shape() {
            RowShape::Movies(_) => RoundTrip::Primary,
            RowShape::DirectorGroups => RoundTrip::Hydration,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    movies: Vec<Movie>,
    directors: HashMap<i64, Vec<String>>,
    statements: Vec<Statement>,
    failures: HashMap<RoundTrip, String>,
    hangs: Vec<RoundTrip>,
}

impl State {
    fn insert(&mut self, mut movie: Movie) {
        if let Some(names) = movie.directors.take() {
            self.directors.insert(movie.id, sorted_names(names));
        }
        self.movies.retain(|existing| existing.id != movie.id);
        self.movies.push(movie);
    }
}

/// Scripted executor backed by a movie list.
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone)]
pub struct InMemoryExecutor {
    dialect: Dialect,
    state: Arc<RwLock<State>>,
}

impl InMemoryExecutor {
    pub fn new() -> Self {
        Self {
            dialect: Dialect::Postgres,
            state: Arc::new(RwLock::new(State::default())),
        }
    }

    /// Render statements for `dialect` (only affects what gets recorded).
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Seed with movies; their `directors`, when present, become relations.
    pub fn with_movies(self, movies: impl IntoIterator<Item = Movie>) -> Result<Self, StorageError> {
        {
            let mut state = self.write()?;
            for movie in movies {
                state.insert(movie);
            }
        }
        Ok(self)
    }

    /// Insert or replace a movie and its relations.
    pub fn insert_movie(&self, movie: Movie) -> Result<(), StorageError> {
        self.write()?.insert(movie);
        Ok(())
    }

    /// Make every round trip of `kind` fail with `message`.
    pub fn fail_on(&self, kind: RoundTrip, message: impl Into<String>) -> Result<(), StorageError> {
        self.write()?.failures.insert(kind, message.into());
        Ok(())
    }

    /// Make every round trip of `kind` wait forever.
    pub fn hang_on(&self, kind: RoundTrip) -> Result<(), StorageError> {
        self.write()?.hangs.push(kind);
        Ok(())
    }

    /// Statements received so far, in order
    pub fn statements(&self) -> Vec<Statement> {
        self.state
            .read()
            .map(|state| state.statements.clone())
            .unwrap_or_default()
    }

    /// Number of statements of `kind` received so far
    pub fn round_trips(&self, kind: RoundTrip) -> usize {
        self.statements()
            .iter()
            .filter(|statement| RoundTrip::of(statement) == kind)
            .count()
    }

    pub fn clear_statements(&self) -> Result<(), StorageError> {
        self.write()?.statements.clear();
        Ok(())
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StorageError> {
        self.state
            .write()
            .map_err(|e| StorageError::query(BACKEND, format!("failed to acquire write lock: {e}")))
    }

    /// Record the statement and apply scripted behaviour. Returns whether the
    /// round trip should hang.
    fn receive(&self, statement: &Statement) -> Result<bool, StorageError> {
        let kind = RoundTrip::of(statement);
        let mut state = self.write()?;
        state.statements.push(statement.clone());

        if let Some(message) = state.failures.get(&kind) {
            return Err(StorageError::query(BACKEND, message.clone()));
        }
        Ok(state.hangs.contains(&kind))
    }
}

impl Default for InMemoryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// The limit is always the last bind of a movie statement.
fn trailing_limit(args: &[Value]) -> Option<usize> {
    match args.last() {
        Some(Value::Int(limit)) => usize::try_from(*limit).ok(),
        _ => None,
    }
}

fn bound_ids(args: &[Value]) -> Vec<i64> {
    let mut ids = Vec::new();
    for value in args {
        match value {
            Value::IntList(list) => ids.extend_from_slice(list),
            Value::Int(id) => ids.push(*id),
            _ => {}
        }
    }
    ids
}

#[async_trait]
impl Executor for InMemoryExecutor {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn fetch_movies(&self, statement: &Statement) -> Result<Vec<Movie>, StorageError> {
        if self.receive(statement)? {
            std::future::pending::<()>().await;
        }

        let state = self
            .state
            .read()
            .map_err(|e| StorageError::query(BACKEND, format!("failed to acquire read lock: {e}")))?;

        let inline = statement.columns().contains(&MovieColumn::Directors);
        let limit = trailing_limit(statement.args()).unwrap_or(usize::MAX);

        Ok(state
            .movies
            .iter()
            .take(limit)
            .map(|movie| {
                let mut movie = movie.clone();
                if inline {
                    movie.directors =
                        Some(state.directors.get(&movie.id).cloned().unwrap_or_default());
                }
                movie
            })
            .collect())
    }

    async fn fetch_director_groups(
        &self,
        statement: &Statement,
    ) -> Result<Vec<DirectorGroup>, StorageError> {
        if self.receive(statement)? {
            std::future::pending::<()>().await;
        }

        let state = self
            .state
            .read()
            .map_err(|e| StorageError::query(BACKEND, format!("failed to acquire read lock: {e}")))?;

        let mut ids = bound_ids(statement.args());
        ids.sort_unstable();
        ids.dedup();

        Ok(ids
            .into_iter()
            .filter_map(|movie_id| {
                state
                    .directors
                    .get(&movie_id)
                    .filter(|names| !names.is_empty())
                    .map(|names| DirectorGroup {
                        movie_id,
                        names: names.clone(),
                    })
            })
            .collect())
    }
}
