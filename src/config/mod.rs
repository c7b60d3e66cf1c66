//! Configuration loading and management

use crate::core::Scenario;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable consulted when no URL is configured
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Connection pool sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout_secs: u64,
}

impl PoolConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 6,
            min_connections: 3,
            idle_timeout_secs: 120,
        }
    }
}

/// Store a strategy runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Postgres,
    Mysql,
    InMemory,
}

impl Backend {
    /// Whether this build can run strategies on the backend
    pub fn is_compiled(self) -> bool {
        match self {
            Backend::Postgres => cfg!(feature = "postgres"),
            Backend::Mysql => cfg!(feature = "mysql"),
            Backend::InMemory => true,
        }
    }

    /// PostgreSQL when compiled in, then MySQL, else the in-memory executor
    pub fn preferred() -> Self {
        [Backend::Postgres, Backend::Mysql]
            .into_iter()
            .find(|backend| backend.is_compiled())
            .unwrap_or(Backend::InMemory)
    }
}

/// Connection URLs for individual backends, overriding `database_url`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseUrls {
    pub postgres: Option<String>,
    pub mysql: Option<String>,
}

/// One data-access strategy under comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Name used in logs and skip signals
    pub name: String,

    pub backend: Backend,

    /// Scenarios the strategy implements; the rest are skipped
    #[serde(default = "all_scenarios")]
    pub scenarios: Vec<Scenario>,
}

fn all_scenarios() -> Vec<Scenario> {
    Scenario::ALL.to_vec()
}

fn default_slow_query_ms() -> u64 {
    500
}

/// Complete benchmark configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Connection URL; falls back to `DATABASE_URL`
    #[serde(default)]
    pub database_url: Option<String>,

    /// Backend-specific URLs, needed when PostgreSQL and MySQL run together
    #[serde(default)]
    pub database_urls: DatabaseUrls,

    #[serde(default)]
    pub pool: PoolConfig,

    /// Invocations slower than this are logged on `benchflix::slow_query`
    #[serde(default = "default_slow_query_ms")]
    pub slow_query_ms: u64,

    pub strategies: Vec<StrategyConfig>,
}

impl BenchConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot be run.
    pub fn validate(&self) -> Result<()> {
        if self.pool.max_connections == 0 {
            bail!("pool.max_connections must be at least 1");
        }
        if self.pool.min_connections > self.pool.max_connections {
            bail!(
                "pool.min_connections ({}) exceeds pool.max_connections ({})",
                self.pool.min_connections,
                self.pool.max_connections
            );
        }
        for (i, strategy) in self.strategies.iter().enumerate() {
            if strategy.name.is_empty() {
                bail!("strategy #{} has an empty name", i + 1);
            }
            if self.strategies[..i].iter().any(|s| s.name == strategy.name) {
                bail!("duplicate strategy name '{}'", strategy.name);
            }
        }
        Ok(())
    }

    /// Configured URL, else the `DATABASE_URL` environment variable
    pub fn database_url(&self) -> Option<String> {
        self.database_url
            .clone()
            .or_else(|| std::env::var(DATABASE_URL_ENV).ok())
    }

    /// URL for `backend`: its `database_urls` entry, then [`Self::database_url`]
    pub fn database_url_for(&self, backend: Backend) -> Option<String> {
        let specific = match backend {
            Backend::Postgres => self.database_urls.postgres.as_ref(),
            Backend::Mysql => self.database_urls.mysql.as_ref(),
            Backend::InMemory => None,
        };
        specific.cloned().or_else(|| self.database_url())
    }

    pub fn slow_query_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_query_ms)
    }

    /// Find a strategy by name
    pub fn strategy(&self, name: &str) -> Option<&StrategyConfig> {
        self.strategies.iter().find(|s| s.name == name)
    }

    /// Whether any strategy needs a pool for `backend`
    pub fn uses_backend(&self, backend: Backend) -> bool {
        self.strategies.iter().any(|s| s.backend == backend)
    }

    /// One strategy with all four scenarios on [`Backend::preferred`]
    pub fn default_config() -> Self {
        Self {
            database_url: None,
            database_urls: DatabaseUrls::default(),
            pool: PoolConfig::default(),
            slow_query_ms: default_slow_query_ms(),
            strategies: vec![StrategyConfig {
                name: "composed".to_string(),
                backend: Backend::preferred(),
                scenarios: all_scenarios(),
            }],
        }
    }
}
