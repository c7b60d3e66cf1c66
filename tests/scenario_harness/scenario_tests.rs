//! Macro-generated conformance suite for `Repository` implementations.
//!
//! The `scenario_tests!` macro generates a test module validating a repository
//! seeded with [`catalog`](super::catalog) against the four scenarios:
//! filtering, ordering, limits, director loading, invalid sorts and
//! idempotence.
//!
//! # Usage
//!
//! ```rust,ignore
//! scenario_tests!(seeded_pg_repository().await);
//! ```

/// Generate a full `Repository` conformance test suite.
///
/// `$factory` must evaluate to a `Repository` seeded with exactly the harness
/// catalog. It is re-evaluated for each test.
#[macro_export]
macro_rules! scenario_tests {
    ($factory:expr) => {
        mod scenario_contract_tests {
            use super::*;
            use benchflix::core::{
                DashboardParams, ListParams, QueryContext, QueryError, Repository,
            };

            // ==================================================================
            // List
            // ==================================================================

            #[tokio::test]
            async fn test_list_unfiltered_rating_desc() {
                let repo = $factory;
                let movies = repo
                    .query_list(&QueryContext::new(), &ListParams::new(5))
                    .await
                    .unwrap();

                assert_eq!(ids(&movies), vec![THE_THING, LITTLE_SHARK, SEA_OF_GLASS]);
                assert_eq!(
                    by_id(&movies, THE_THING).directors,
                    names(&["Bob Ray", "Tom Shark"])
                );
                assert_eq!(by_id(&movies, SEA_OF_GLASS).directors, names(&[]));
            }

            #[tokio::test]
            async fn test_list_preload_matches_inline() {
                let repo = $factory;
                let ctx = QueryContext::new();
                let params = ListParams::new(10).min_rating(5.0);

                let inline = repo.query_list(&ctx, &params).await.unwrap();
                let preload = repo.query_list_preload(&ctx, &params).await.unwrap();
                assert_eq!(inline, preload);
            }

            #[tokio::test]
            async fn test_list_limit_is_applied() {
                let repo = $factory;
                let movies = repo
                    .query_list_preload(&QueryContext::new(), &ListParams::new(2))
                    .await
                    .unwrap();
                assert_eq!(ids(&movies), vec![THE_THING, LITTLE_SHARK]);
            }

            #[tokio::test]
            async fn test_list_zero_limit_means_max() {
                let repo = $factory;
                let movies = repo
                    .query_list(&QueryContext::new(), &ListParams::new(0))
                    .await
                    .unwrap();
                assert_eq!(movies.len(), 3);
            }

            #[tokio::test]
            async fn test_list_year_filter() {
                let repo = $factory;
                let movies = repo
                    .query_list(&QueryContext::new(), &ListParams::new(10).year_added(2021))
                    .await
                    .unwrap();
                assert_eq!(ids(&movies), vec![LITTLE_SHARK, SEA_OF_GLASS]);
            }

            #[tokio::test]
            async fn test_list_min_rating_is_inclusive() {
                let repo = $factory;
                let movies = repo
                    .query_list(&QueryContext::new(), &ListParams::new(10).min_rating(7.5))
                    .await
                    .unwrap();
                assert_eq!(ids(&movies), vec![THE_THING, LITTLE_SHARK]);
            }

            // ==================================================================
            // Dashboard
            // ==================================================================

            #[tokio::test]
            async fn test_dashboard_search_title_or_director() {
                let repo = $factory;
                let params = DashboardParams::new("title", 10)
                    .search("shark")
                    .with_directors(true);
                let movies = repo
                    .query_dashboard_preload(&QueryContext::new(), &params)
                    .await
                    .unwrap();

                assert_eq!(ids(&movies), vec![LITTLE_SHARK, THE_THING]);
                assert_eq!(movies[0].directors, names(&["Ann Lee"]));
                assert_eq!(movies[1].directors, names(&["Bob Ray", "Tom Shark"]));
            }

            #[tokio::test]
            async fn test_dashboard_search_short_common_words() {
                let repo = $factory;
                let ctx = QueryContext::new();

                let the = repo
                    .query_dashboard(&ctx, &DashboardParams::new("title", 10).search("the"))
                    .await
                    .unwrap();
                assert_eq!(ids(&the), vec![THE_THING]);

                let of = repo
                    .query_dashboard(&ctx, &DashboardParams::new("title", 10).search("of"))
                    .await
                    .unwrap();
                assert_eq!(ids(&of), vec![SEA_OF_GLASS]);
            }

            #[tokio::test]
            async fn test_dashboard_inline_matches_preload() {
                let repo = $factory;
                let ctx = QueryContext::new();
                let params = DashboardParams::new("rating", 10)
                    .descending(true)
                    .with_directors(true);

                let inline = repo.query_dashboard(&ctx, &params).await.unwrap();
                let preload = repo.query_dashboard_preload(&ctx, &params).await.unwrap();
                assert_eq!(inline, preload);
                assert_eq!(ids(&inline), vec![THE_THING, LITTLE_SHARK, SEA_OF_GLASS]);
            }

            #[tokio::test]
            async fn test_dashboard_without_directors_leaves_them_absent() {
                let repo = $factory;
                let ctx = QueryContext::new();
                let params = DashboardParams::new("title", 10);

                for movies in [
                    repo.query_dashboard(&ctx, &params).await.unwrap(),
                    repo.query_dashboard_preload(&ctx, &params).await.unwrap(),
                ] {
                    assert_eq!(movies.len(), 3);
                    assert!(movies.iter().all(|m| m.directors.is_none()));
                }
            }

            #[tokio::test]
            async fn test_dashboard_sort_added_at_desc() {
                let repo = $factory;
                let params = DashboardParams::new("added_at", 10).descending(true);
                let movies = repo
                    .query_dashboard(&QueryContext::new(), &params)
                    .await
                    .unwrap();
                assert_eq!(ids(&movies), vec![SEA_OF_GLASS, LITTLE_SHARK, THE_THING]);
            }

            #[tokio::test]
            async fn test_dashboard_all_filters_combined() {
                let repo = $factory;
                let params = DashboardParams::new("title", 10)
                    .search("shark")
                    .year_added(2021)
                    .min_rating(7.0);
                let movies = repo
                    .query_dashboard(&QueryContext::new(), &params)
                    .await
                    .unwrap();
                assert_eq!(ids(&movies), vec![LITTLE_SHARK]);
            }

            #[tokio::test]
            async fn test_dashboard_no_match_is_empty() {
                let repo = $factory;
                let params = DashboardParams::new("title", 10)
                    .search("zeppelin")
                    .with_directors(true);
                let movies = repo
                    .query_dashboard_preload(&QueryContext::new(), &params)
                    .await
                    .unwrap();
                assert!(movies.is_empty());
            }

            #[tokio::test]
            async fn test_dashboard_invalid_sort() {
                let repo = $factory;
                let err = repo
                    .query_dashboard(&QueryContext::new(), &DashboardParams::new("budget", 10))
                    .await
                    .unwrap_err();
                assert!(matches!(err, QueryError::InvalidSort { .. }));
            }

            // ==================================================================
            // Invocation properties
            // ==================================================================

            #[tokio::test]
            async fn test_repeated_invocations_are_identical() {
                let repo = $factory;
                let ctx = QueryContext::new();
                let params = DashboardParams::new("rating", 10)
                    .search("shark")
                    .with_directors(true);

                let first = repo.query_dashboard_preload(&ctx, &params).await.unwrap();
                let second = repo.query_dashboard_preload(&ctx, &params).await.unwrap();
                assert_eq!(first, second);
            }

            #[tokio::test]
            async fn test_cancelled_context_returns_cancelled() {
                let repo = $factory;
                let ctx = QueryContext::new();
                ctx.cancel();
                let err = repo.query_list(&ctx, &ListParams::new(5)).await.unwrap_err();
                assert!(matches!(err, QueryError::Cancelled));
            }
        }
    };
}
