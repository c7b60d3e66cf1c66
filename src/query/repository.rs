//! Generic repository over any [`Executor`]

use crate::core::error::QueryError;
use crate::core::executor::Executor;
use crate::core::movie::Movie;
use crate::core::params::{DashboardParams, ListParams};
use crate::core::repository::{QueryContext, Repository, Scenario};
use crate::query::builder::Statement;
use crate::query::{composer, hydrate::hydrate};
use async_trait::async_trait;
use indexmap::IndexSet;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Default threshold above which an invocation is reported as slow
pub const DEFAULT_SLOW_QUERY: Duration = Duration::from_millis(500);

/// A data-access strategy built from the query composer and one executor.
///
/// Scenarios left out of the enabled set answer with the skip signal and
/// never reach the store.
///
/// # Example
///
/// ```rust,ignore
/// let repo = ComposedRepository::new("pg-composed", executor)
///     .with_scenarios([Scenario::List, Scenario::ListPreload]);
///
/// let movies = repo.query_list(&QueryContext::new(), &ListParams::new(50)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ComposedRepository<E> {
    name: String,
    executor: E,
    scenarios: IndexSet<Scenario>,
    slow_query: Duration,
}

impl<E: Executor> ComposedRepository<E> {
    /// A strategy implementing all four scenarios.
    pub fn new(name: impl Into<String>, executor: E) -> Self {
        Self {
            name: name.into(),
            executor,
            scenarios: Scenario::ALL.into_iter().collect(),
            slow_query: DEFAULT_SLOW_QUERY,
        }
    }

    /// Restrict the strategy to `scenarios`.
    pub fn with_scenarios(mut self, scenarios: impl IntoIterator<Item = Scenario>) -> Self {
        self.scenarios = scenarios.into_iter().collect();
        self
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query = threshold;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn supports(&self, scenario: Scenario) -> bool {
        self.scenarios.contains(&scenario)
    }

    /// Enabled scenarios in configuration order
    pub fn scenarios(&self) -> impl Iterator<Item = Scenario> + '_ {
        self.scenarios.iter().copied()
    }

    fn ensure_supported(&self, scenario: Scenario) -> Result<(), QueryError> {
        if self.supports(scenario) {
            Ok(())
        } else {
            Err(QueryError::Unsupported {
                strategy: self.name.clone(),
                scenario,
            })
        }
    }

    /// Primary round trip, plus the batched hydration when `hydrated`.
    async fn load(
        &self,
        ctx: &QueryContext,
        scenario: Scenario,
        statement: Statement,
        hydrated: bool,
    ) -> Result<Vec<Movie>, QueryError> {
        tracing::debug!(
            sql = statement.sql(),
            binds = statement.args().len(),
            "executing statement"
        );

        let start = Instant::now();
        let movies = ctx.run(self.executor.fetch_movies(&statement)).await?;
        let movies = if hydrated {
            hydrate(&self.executor, ctx, movies).await?
        } else {
            movies
        };

        let elapsed = start.elapsed();
        if elapsed > self.slow_query {
            tracing::warn!(
                target: "benchflix::slow_query",
                strategy = %self.name,
                scenario = %scenario,
                elapsed_ms = elapsed.as_millis() as u64,
                sql = statement.sql(),
                "slow scenario query"
            );
        }
        tracing::debug!(rows = movies.len(), elapsed_ms = elapsed.as_millis() as u64, "loaded");

        Ok(movies)
    }
}

#[async_trait]
impl<E: Executor> Repository for ComposedRepository<E> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip_all, fields(strategy = %self.name, scenario = "list"))]
    async fn query_list(
        &self,
        ctx: &QueryContext,
        params: &ListParams,
    ) -> Result<Vec<Movie>, QueryError> {
        self.ensure_supported(Scenario::List)?;
        let statement = composer::list(self.executor.dialect(), params);
        self.load(ctx, Scenario::List, statement, false).await
    }

    #[instrument(skip_all, fields(strategy = %self.name, scenario = "list_preload"))]
    async fn query_list_preload(
        &self,
        ctx: &QueryContext,
        params: &ListParams,
    ) -> Result<Vec<Movie>, QueryError> {
        self.ensure_supported(Scenario::ListPreload)?;
        let statement = composer::list_preload(self.executor.dialect(), params);
        self.load(ctx, Scenario::ListPreload, statement, true).await
    }

    #[instrument(skip_all, fields(strategy = %self.name, scenario = "dashboard"))]
    async fn query_dashboard(
        &self,
        ctx: &QueryContext,
        params: &DashboardParams,
    ) -> Result<Vec<Movie>, QueryError> {
        self.ensure_supported(Scenario::Dashboard)?;
        let statement = composer::dashboard(self.executor.dialect(), params)?;
        self.load(ctx, Scenario::Dashboard, statement, false).await
    }

    #[instrument(skip_all, fields(strategy = %self.name, scenario = "dashboard_preload"))]
    async fn query_dashboard_preload(
        &self,
        ctx: &QueryContext,
        params: &DashboardParams,
    ) -> Result<Vec<Movie>, QueryError> {
        self.ensure_supported(Scenario::DashboardPreload)?;
        let statement = composer::dashboard_preload(self.executor.dialect(), params)?;
        self.load(
            ctx,
            Scenario::DashboardPreload,
            statement,
            params.with_directors,
        )
        .await
    }
}
