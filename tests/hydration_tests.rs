//! Round-trip accounting for the hydrated scenarios over the in-memory executor.

#[macro_use]
mod scenario_harness;

use benchflix::core::{DashboardParams, ListParams, QueryContext, QueryError, Repository};
use benchflix::query::{ComposedRepository, Value};
use benchflix::storage::{InMemoryExecutor, RoundTrip};
use scenario_harness::*;
use std::time::Duration;

fn repository() -> ComposedRepository<InMemoryExecutor> {
    ComposedRepository::new("memory", InMemoryExecutor::new().with_movies(catalog()).unwrap())
}

#[tokio::test]
async fn test_preload_issues_exactly_one_secondary_statement() {
    let repo = repository();
    let movies = repo
        .query_list_preload(&QueryContext::new(), &ListParams::new(5))
        .await
        .unwrap();

    let executor = repo.executor();
    assert_eq!(executor.round_trips(RoundTrip::Primary), 1);
    assert_eq!(executor.round_trips(RoundTrip::Hydration), 1);

    let statements = executor.statements();
    assert_eq!(
        statements[1].args(),
        &[Value::IntList(vec![LITTLE_SHARK, THE_THING, SEA_OF_GLASS])]
    );

    assert_eq!(by_id(&movies, LITTLE_SHARK).directors, names(&["Ann Lee"]));
    assert_eq!(
        by_id(&movies, THE_THING).directors,
        names(&["Bob Ray", "Tom Shark"])
    );
    assert_eq!(by_id(&movies, SEA_OF_GLASS).directors, names(&[]));
}

#[tokio::test]
async fn test_batch_size_follows_primary_rows() {
    let repo = repository();
    repo.query_list_preload(&QueryContext::new(), &ListParams::new(2))
        .await
        .unwrap();

    let statements = repo.executor().statements();
    assert_eq!(
        statements[1].args(),
        &[Value::IntList(vec![LITTLE_SHARK, THE_THING])]
    );
}

#[tokio::test]
async fn test_empty_primary_skips_secondary() {
    let repo = ComposedRepository::new("empty", InMemoryExecutor::new());
    let movies = repo
        .query_dashboard_preload(
            &QueryContext::new(),
            &DashboardParams::new("title", 10).with_directors(true),
        )
        .await
        .unwrap();

    assert!(movies.is_empty());
    assert_eq!(repo.executor().round_trips(RoundTrip::Hydration), 0);
}

#[tokio::test]
async fn test_dashboard_preload_hydrates_only_when_requested() {
    let repo = repository();
    let ctx = QueryContext::new();

    let bare = repo
        .query_dashboard_preload(&ctx, &DashboardParams::new("rating", 10))
        .await
        .unwrap();
    assert!(bare.iter().all(|m| m.directors.is_none()));
    assert_eq!(repo.executor().round_trips(RoundTrip::Hydration), 0);

    let hydrated = repo
        .query_dashboard_preload(&ctx, &DashboardParams::new("rating", 10).with_directors(true))
        .await
        .unwrap();
    assert!(hydrated.iter().all(|m| m.directors.is_some()));
    assert_eq!(repo.executor().round_trips(RoundTrip::Hydration), 1);
}

#[tokio::test]
async fn test_inline_scenarios_use_one_round_trip() {
    let repo = repository();
    let ctx = QueryContext::new();

    repo.query_list(&ctx, &ListParams::new(5)).await.unwrap();
    repo.query_dashboard(&ctx, &DashboardParams::new("title", 5).with_directors(true))
        .await
        .unwrap();

    assert_eq!(repo.executor().round_trips(RoundTrip::Primary), 2);
    assert_eq!(repo.executor().round_trips(RoundTrip::Hydration), 0);
}

#[tokio::test]
async fn test_secondary_failure_discards_primary_rows() {
    let repo = repository();
    repo.executor().fail_on(RoundTrip::Hydration, "connection reset").unwrap();

    let err = repo
        .query_list_preload(&QueryContext::new(), &ListParams::new(5))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "STORAGE_ERROR");
    assert!(err.to_string().contains("connection reset"));
}

#[tokio::test]
async fn test_cancellation_during_secondary_round_trip() {
    let repo = repository();
    repo.executor().hang_on(RoundTrip::Hydration).unwrap();

    let ctx = QueryContext::new();
    let token = ctx.cancellation_token().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        repo.query_list_preload(&ctx, &ListParams::new(5)),
    )
    .await
    .expect("cancellation did not abort the round trip");

    assert!(matches!(result, Err(QueryError::Cancelled)));
    assert_eq!(repo.executor().round_trips(RoundTrip::Primary), 1);
    assert_eq!(repo.executor().round_trips(RoundTrip::Hydration), 1);
}
