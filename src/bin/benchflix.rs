use anyhow::{Context, Result, bail};
use benchflix::config::{Backend, BenchConfig};
use benchflix::core::{
    DashboardParams, ListParams, Movie, QueryContext, QueryError, Repository, Scenario,
};
use benchflix::fixtures;
use benchflix::query::ComposedRepository;
use benchflix::storage::InMemoryExecutor;
use clap::{Parser, Subcommand};
use futures::{StreamExt, TryStreamExt};
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "benchflix", version, about = "Movie query strategy benchmark")]
struct Cli {
    /// YAML configuration. Defaults to one PostgreSQL strategy.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Connection string. Overrides the configuration and DATABASE_URL.
    #[arg(long)]
    database_url: Option<String>,

    /// PostgreSQL connection string, taking precedence over --database-url
    #[arg(long)]
    postgres_url: Option<String>,

    /// MySQL connection string, taking precedence over --database-url
    #[arg(long)]
    mysql_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create tables and indexes for every configured backend
    Schema,

    /// Insert movies and their directors from a JSON or CSV fixture
    Seed {
        #[arg(long)]
        movies: PathBuf,
    },

    /// Run every strategy and scenario once per parameter set
    Run {
        #[arg(long)]
        params: PathBuf,

        /// Number of parameter sets to use (0 = all)
        #[arg(long, default_value_t = 0)]
        size: usize,

        /// Fixture used to fill in-memory strategies
        #[arg(long)]
        movies: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => BenchConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => BenchConfig::default_config(),
    };
    if cli.database_url.is_some() {
        config.database_url = cli.database_url;
    }
    if cli.postgres_url.is_some() {
        config.database_urls.postgres = cli.postgres_url;
    }
    if cli.mysql_url.is_some() {
        config.database_urls.mysql = cli.mysql_url;
    }

    match cli.command {
        Commands::Schema => schema(&config).await,
        Commands::Seed { movies } => {
            let movies = fixtures::load_movie_fixture(&movies)?;
            seed(&config, movies).await
        }
        Commands::Run {
            params,
            size,
            movies,
        } => {
            let list: Vec<ListParams> = fixtures::load_params(&params, size)?;
            let dashboard: Vec<DashboardParams> = fixtures::load_params(&params, size)?;
            let movies = match movies {
                Some(path) => fixtures::load_movie_fixture(&path)?,
                None => Vec::new(),
            };
            run(&config, &list, &dashboard, movies).await
        }
    }
}

#[cfg(any(feature = "postgres", feature = "mysql"))]
fn require_url(config: &BenchConfig, backend: Backend) -> Result<String> {
    config.database_url_for(backend).with_context(|| {
        format!("no connection URL for {backend:?}; set database_urls, database_url or env DATABASE_URL")
    })
}

async fn schema(config: &BenchConfig) -> Result<()> {
    if config.uses_backend(Backend::Postgres) {
        postgres_schema(config).await?;
    }
    if config.uses_backend(Backend::Mysql) {
        mysql_schema(config).await?;
    }
    Ok(())
}

async fn seed(config: &BenchConfig, movies: Vec<Movie>) -> Result<()> {
    if config.uses_backend(Backend::Postgres) {
        postgres_seed(config, &movies).await?;
    }
    if config.uses_backend(Backend::Mysql) {
        mysql_seed(config, &movies).await?;
    }
    tracing::info!(movies = movies.len(), "seeded");
    Ok(())
}

#[cfg(feature = "postgres")]
async fn postgres_schema(config: &BenchConfig) -> Result<()> {
    use benchflix::storage::postgres;
    let pool = postgres::connect(&require_url(config, Backend::Postgres)?, &config.pool).await?;
    postgres::ensure_schema(&pool).await?;
    tracing::info!("PostgreSQL schema ready");
    Ok(())
}

#[cfg(not(feature = "postgres"))]
async fn postgres_schema(_: &BenchConfig) -> Result<()> {
    bail!("built without the `postgres` feature")
}

#[cfg(feature = "mysql")]
async fn mysql_schema(config: &BenchConfig) -> Result<()> {
    use benchflix::storage::mysql;
    let pool = mysql::connect(&require_url(config, Backend::Mysql)?, &config.pool).await?;
    mysql::ensure_schema(&pool).await?;
    tracing::info!("MySQL schema ready");
    Ok(())
}

#[cfg(not(feature = "mysql"))]
async fn mysql_schema(_: &BenchConfig) -> Result<()> {
    bail!("built without the `mysql` feature")
}

#[cfg(feature = "postgres")]
async fn postgres_seed(config: &BenchConfig, movies: &[Movie]) -> Result<()> {
    use benchflix::storage::postgres;

    let pool = postgres::connect(&require_url(config, Backend::Postgres)?, &config.pool).await?;
    postgres::ensure_schema(&pool).await?;
    futures::stream::iter(movies.iter().map(Ok))
        .try_for_each_concurrent(config.pool.max_connections as usize, |movie| {
            postgres::insert_movie(&pool, movie)
        })
        .await?;
    Ok(())
}

#[cfg(not(feature = "postgres"))]
async fn postgres_seed(_: &BenchConfig, _: &[Movie]) -> Result<()> {
    bail!("built without the `postgres` feature")
}

#[cfg(feature = "mysql")]
async fn mysql_seed(config: &BenchConfig, movies: &[Movie]) -> Result<()> {
    use benchflix::storage::mysql;

    let pool = mysql::connect(&require_url(config, Backend::Mysql)?, &config.pool).await?;
    mysql::ensure_schema(&pool).await?;
    futures::stream::iter(movies.iter().map(Ok))
        .try_for_each_concurrent(config.pool.max_connections as usize, |movie| {
            mysql::insert_movie(&pool, movie)
        })
        .await?;
    Ok(())
}

#[cfg(not(feature = "mysql"))]
async fn mysql_seed(_: &BenchConfig, _: &[Movie]) -> Result<()> {
    bail!("built without the `mysql` feature")
}

/// Instantiate the configured strategies, one pool per backend.
async fn strategies(config: &BenchConfig, movies: Vec<Movie>) -> Result<Vec<Box<dyn Repository>>> {
    #[cfg(feature = "postgres")]
    let pg = if config.uses_backend(Backend::Postgres) {
        let url = require_url(config, Backend::Postgres)?;
        let pool = benchflix::storage::postgres::connect(&url, &config.pool).await?;
        Some(benchflix::storage::PostgresExecutor::new(pool))
    } else {
        None
    };

    #[cfg(feature = "mysql")]
    let my = if config.uses_backend(Backend::Mysql) {
        let url = require_url(config, Backend::Mysql)?;
        let pool = benchflix::storage::mysql::connect(&url, &config.pool).await?;
        Some(benchflix::storage::MysqlExecutor::new(pool))
    } else {
        None
    };

    let memory = InMemoryExecutor::new().with_movies(movies)?;

    let mut repos: Vec<Box<dyn Repository>> = Vec::with_capacity(config.strategies.len());
    for strategy in &config.strategies {
        let threshold = config.slow_query_threshold();
        let scenarios = strategy.scenarios.iter().copied();
        let repo: Box<dyn Repository> = match strategy.backend {
            Backend::InMemory => Box::new(
                ComposedRepository::new(&strategy.name, memory.clone())
                    .with_scenarios(scenarios)
                    .with_slow_query_threshold(threshold),
            ),
            #[cfg(feature = "postgres")]
            Backend::Postgres => match &pg {
                Some(executor) => Box::new(
                    ComposedRepository::new(&strategy.name, executor.clone())
                        .with_scenarios(scenarios)
                        .with_slow_query_threshold(threshold),
                ),
                None => bail!("no PostgreSQL pool for strategy '{}'", strategy.name),
            },
            #[cfg(feature = "mysql")]
            Backend::Mysql => match &my {
                Some(executor) => Box::new(
                    ComposedRepository::new(&strategy.name, executor.clone())
                        .with_scenarios(scenarios)
                        .with_slow_query_threshold(threshold),
                ),
                None => bail!("no MySQL pool for strategy '{}'", strategy.name),
            },
            #[allow(unreachable_patterns)]
            backend => bail!(
                "strategy '{}' needs the {:?} backend, which this build does not include",
                strategy.name,
                backend
            ),
        };
        repos.push(repo);
    }
    Ok(repos)
}

async fn invoke(
    repo: &dyn Repository,
    ctx: &QueryContext,
    scenario: Scenario,
    list: &ListParams,
    dashboard: &DashboardParams,
) -> Result<Vec<Movie>, QueryError> {
    match scenario {
        Scenario::List => repo.query_list(ctx, list).await,
        Scenario::ListPreload => repo.query_list_preload(ctx, list).await,
        Scenario::Dashboard => repo.query_dashboard(ctx, dashboard).await,
        Scenario::DashboardPreload => repo.query_dashboard_preload(ctx, dashboard).await,
    }
}

/// Invoke `scenario` once per parameter set, at most `concurrency` at a time,
/// and return the total row count.
async fn run_scenario(
    repo: &dyn Repository,
    scenario: Scenario,
    list: &[ListParams],
    dashboard: &[DashboardParams],
    shutdown: &CancellationToken,
    concurrency: usize,
) -> Result<usize, QueryError> {
    futures::stream::iter(list.iter().zip(dashboard))
        .map(|(list, dashboard)| {
            let ctx = QueryContext::with_cancellation(shutdown.child_token());
            async move {
                invoke(repo, &ctx, scenario, list, dashboard)
                    .await
                    .map(|movies| movies.len())
            }
        })
        .buffer_unordered(concurrency.max(1))
        .try_fold(0usize, |rows, n| async move { Ok::<_, QueryError>(rows + n) })
        .await
}

async fn run(
    config: &BenchConfig,
    list: &[ListParams],
    dashboard: &[DashboardParams],
    movies: Vec<Movie>,
) -> Result<()> {
    let repos = strategies(config, movies).await?;

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C signal, cancelling in-flight queries...");
            on_signal.cancel();
        }
    });

    let concurrency = config.pool.max_connections as usize;

    for repo in &repos {
        let repo = repo.as_ref();
        for scenario in Scenario::ALL {
            let start = Instant::now();

            let outcome =
                run_scenario(repo, scenario, list, dashboard, &shutdown, concurrency).await;

            match outcome {
                Ok(rows) => tracing::info!(
                    strategy = repo.name(),
                    %scenario,
                    invocations = list.len(),
                    concurrency,
                    rows,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "completed"
                ),
                Err(err) if err.is_skip() => {
                    tracing::info!(strategy = repo.name(), %scenario, "skipped")
                }
                Err(QueryError::Cancelled) => {
                    tracing::warn!("run cancelled");
                    return Ok(());
                }
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("{} failed on {scenario}", repo.name()));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchflix::storage::RoundTrip;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn repository() -> ComposedRepository<InMemoryExecutor> {
        let added_at = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        let movies = (1..=3).map(|id| Movie::new(id, format!("movie {id}"), added_at, 5.0));
        ComposedRepository::new("memory", InMemoryExecutor::new().with_movies(movies).unwrap())
    }

    #[tokio::test]
    async fn test_run_scenario_sums_rows() {
        let repo = repository();
        let list = vec![ListParams::new(1), ListParams::new(2), ListParams::new(10)];
        let dashboard = vec![DashboardParams::new("title", 10); 3];

        let rows = run_scenario(
            &repo,
            Scenario::List,
            &list,
            &dashboard,
            &CancellationToken::new(),
            2,
        )
        .await
        .unwrap();
        assert_eq!(rows, 1 + 2 + 3);
    }

    #[tokio::test]
    async fn test_run_scenario_overlaps_parameter_sets() {
        let repo = repository();
        repo.executor().hang_on(RoundTrip::Primary).unwrap();
        let list = vec![ListParams::new(5); 4];
        let dashboard = vec![DashboardParams::new("title", 5); 4];

        let shutdown = CancellationToken::new();
        let cancel = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let result = run_scenario(&repo, Scenario::List, &list, &dashboard, &shutdown, 3).await;
        assert!(matches!(result, Err(QueryError::Cancelled)));
        // Three invocations were in flight at once, the fourth never started
        assert_eq!(repo.executor().round_trips(RoundTrip::Primary), 3);
    }

    #[tokio::test]
    async fn test_run_scenario_reports_skip() {
        let repo = repository().with_scenarios([Scenario::List]);
        let err = run_scenario(
            &repo,
            Scenario::Dashboard,
            &[ListParams::new(5)],
            &[DashboardParams::new("title", 5)],
            &CancellationToken::new(),
            4,
        )
        .await
        .unwrap_err();
        assert!(err.is_skip());
    }
}
