//! The repository facade consumed by the benchmark harness

use crate::core::error::{QueryError, StorageError};
use crate::core::movie::Movie;
use crate::core::params::{DashboardParams, ListParams};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;

/// One of the four named query shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    List,
    ListPreload,
    Dashboard,
    DashboardPreload,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::List,
        Scenario::ListPreload,
        Scenario::Dashboard,
        Scenario::DashboardPreload,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Scenario::List => "list",
            Scenario::ListPreload => "list_preload",
            Scenario::Dashboard => "dashboard",
            Scenario::DashboardPreload => "dashboard_preload",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.as_str() == s)
            .ok_or_else(|| format!("unknown scenario: {s}"))
    }
}

/// Per-invocation context.
///
/// Carries the cancellation signal shared by both round trips of one
/// invocation. Cloning shares the token.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    cancel: CancellationToken,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing token, e.g. a child of a harness-wide token.
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive one store round trip, aborting it when the token fires.
    ///
    /// A token that is already cancelled prevents the round trip from being
    /// started at all.
    pub async fn run<F, T>(&self, round_trip: F) -> Result<T, QueryError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(QueryError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(QueryError::Cancelled),
            result = round_trip => result.map_err(QueryError::from),
        }
    }
}

/// The four-scenario contract every data-access strategy implements.
///
/// Each call is independent: no caching, no retries. A strategy that does
/// not implement a scenario returns [`QueryError::Unsupported`].
#[async_trait]
pub trait Repository: Send + Sync {
    /// Strategy name used in logs and skip signals
    fn name(&self) -> &str;

    /// Movies with their directors aggregated inline, best rated first
    async fn query_list(
        &self,
        ctx: &QueryContext,
        params: &ListParams,
    ) -> Result<Vec<Movie>, QueryError>;

    /// Same rows as `query_list`, directors loaded by one batched statement
    async fn query_list_preload(
        &self,
        ctx: &QueryContext,
        params: &ListParams,
    ) -> Result<Vec<Movie>, QueryError>;

    /// Filtered, sorted movies; directors inline when requested
    async fn query_dashboard(
        &self,
        ctx: &QueryContext,
        params: &DashboardParams,
    ) -> Result<Vec<Movie>, QueryError>;

    /// Filtered, sorted movies; directors batch-loaded when requested
    async fn query_dashboard_preload(
        &self,
        ctx: &QueryContext,
        params: &DashboardParams,
    ) -> Result<Vec<Movie>, QueryError>;
}
