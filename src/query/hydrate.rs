//! Two-phase loading of director names
//!
//! The primary rows are already in memory; one secondary statement fetches the
//! names for the whole batch and an id index merges them back in place.

use crate::core::error::QueryError;
use crate::core::executor::Executor;
use crate::core::movie::Movie;
use crate::core::repository::QueryContext;
use crate::query::composer;
use indexmap::IndexMap;

/// Attach director names to `movies` with exactly one secondary round trip.
///
/// Every movie leaves with `Some(..)` directors, empty when nothing is related.
/// An empty batch returns immediately without touching the store. On failure
/// the primary rows are dropped and the error returned.
pub async fn hydrate<E>(
    executor: &E,
    ctx: &QueryContext,
    mut movies: Vec<Movie>,
) -> Result<Vec<Movie>, QueryError>
where
    E: Executor + ?Sized,
{
    if movies.is_empty() {
        return Ok(movies);
    }

    // id -> positions, in encounter order
    let mut index: IndexMap<i64, Vec<usize>> = IndexMap::with_capacity(movies.len());
    for (position, movie) in movies.iter_mut().enumerate() {
        movie.directors = Some(Vec::new());
        index.entry(movie.id).or_default().push(position);
    }

    let ids: Vec<i64> = index.keys().copied().collect();
    let statement = composer::directors(executor.dialect(), &ids);
    tracing::debug!(
        sql = statement.sql(),
        batch = ids.len(),
        "hydrating directors"
    );

    let groups = ctx
        .run(executor.fetch_director_groups(&statement))
        .await?;

    for group in groups {
        let Some(positions) = index.get(&group.movie_id) else {
            continue;
        };
        if let Some((last, rest)) = positions.split_last() {
            for &position in rest {
                movies[position].directors = Some(group.names.clone());
            }
            movies[*last].directors = Some(group.names);
        }
    }

    Ok(movies)
}
