//! One statement per scenario, plus the director batch statement
//!
//! | Scenario                | Columns             | Order             |
//! |-------------------------|---------------------|-------------------|
//! | List                    | core + directors    | rating DESC       |
//! | List-with-hydration     | core                | rating DESC       |
//! | Dashboard               | core (+ directors)  | allow-listed sort |
//! | Dashboard-with-hydration| core                | allow-listed sort |
//!
//! The inline directors aggregation costs a correlated join plus a per-row
//! array aggregation, so it is only emitted by List and by Dashboard when
//! `with_directors` is set.

use crate::core::error::QueryError;
use crate::core::movie::{COLUMNS_WITH_DIRECTORS, CORE_COLUMNS};
use crate::core::params::{DashboardParams, ListParams};
use crate::query::builder::{Dialect, RowShape, SqlBuilder, Statement};
use crate::query::predicate::{build_predicates, push_where};
use crate::query::sort::{OrderBy, push_limit};

const CORE_SELECT: &str = "SELECT m.id, m.title, m.added_at, m.rating";

/// Identity filter of the List family
const LIST_IDENTITY: &str = "1=1";

/// Identity filter of the Dashboard family
const DASHBOARD_IDENTITY: &str = "true";

/// List: directors aggregated inline, fixed `rating DESC` order.
pub fn list(dialect: Dialect, params: &ListParams) -> Statement {
    let mut builder = SqlBuilder::new();
    push_from(&mut builder, dialect, true);
    push_where(
        &mut builder,
        build_predicates(dialect, &params.filter()),
        LIST_IDENTITY,
    );
    OrderBy::LIST.push_sql(&mut builder);
    push_limit(&mut builder, params.limit);
    builder.build(dialect, RowShape::Movies(COLUMNS_WITH_DIRECTORS))
}

/// List-with-hydration: core columns only, same filter, order and limit.
pub fn list_preload(dialect: Dialect, params: &ListParams) -> Statement {
    let mut builder = SqlBuilder::new();
    push_from(&mut builder, dialect, false);
    push_where(
        &mut builder,
        build_predicates(dialect, &params.filter()),
        LIST_IDENTITY,
    );
    OrderBy::LIST.push_sql(&mut builder);
    push_limit(&mut builder, params.limit);
    builder.build(dialect, RowShape::Movies(CORE_COLUMNS))
}

/// Dashboard: directors column and join only when requested.
///
/// Fails with [`QueryError::InvalidSort`] before any SQL is built.
pub fn dashboard(dialect: Dialect, params: &DashboardParams) -> Result<Statement, QueryError> {
    dashboard_statement(dialect, params, params.with_directors)
}

/// Dashboard-with-hydration: never aggregates directors inline.
pub fn dashboard_preload(
    dialect: Dialect,
    params: &DashboardParams,
) -> Result<Statement, QueryError> {
    dashboard_statement(dialect, params, false)
}

fn dashboard_statement(
    dialect: Dialect,
    params: &DashboardParams,
    inline_directors: bool,
) -> Result<Statement, QueryError> {
    let order = OrderBy::resolve(&params.sort, params.desc)?;

    let mut builder = SqlBuilder::new();
    push_from(&mut builder, dialect, inline_directors);
    push_where(
        &mut builder,
        build_predicates(dialect, &params.filter()),
        DASHBOARD_IDENTITY,
    );
    order.push_sql(&mut builder);
    push_limit(&mut builder, params.limit);

    let columns = if inline_directors {
        COLUMNS_WITH_DIRECTORS
    } else {
        CORE_COLUMNS
    };
    Ok(builder.build(dialect, RowShape::Movies(columns)))
}

/// Secondary statement: director names grouped by movie, restricted to `ids`.
///
/// Callers never pass an empty batch.
pub fn directors(dialect: Dialect, ids: &[i64]) -> Statement {
    debug_assert!(!ids.is_empty(), "empty hydration batch");

    let mut builder = SqlBuilder::new();
    match dialect {
        Dialect::Postgres => {
            builder.push(
                "SELECT md.movie_id, ARRAY_AGG(p.name ORDER BY p.name) AS directors \
                 FROM movie_directors md \
                 JOIN people p ON p.id = md.person_id \
                 WHERE md.movie_id = ANY(",
            );
            builder.push_bind(ids.to_vec());
            builder.push(") GROUP BY md.movie_id");
        }
        Dialect::MySql => {
            builder.push(
                "SELECT md.movie_id, JSON_ARRAYAGG(p.name) AS directors \
                 FROM movie_directors md \
                 JOIN people p ON p.id = md.person_id \
                 WHERE md.movie_id IN (",
            );
            builder.push_bind(ids.to_vec());
            builder.push(") GROUP BY md.movie_id");
        }
    }
    builder.build(dialect, RowShape::DirectorGroups)
}

/// `SELECT … FROM movies m`, with the correlated directors aggregation when
/// `inline_directors` is set.
fn push_from(builder: &mut SqlBuilder, dialect: Dialect, inline_directors: bool) {
    builder.push(CORE_SELECT);

    if !inline_directors {
        builder.push(" FROM movies m");
        return;
    }

    match dialect {
        Dialect::Postgres => {
            builder.push(
                ", d.directors FROM movies m \
                 LEFT JOIN LATERAL (\
                 SELECT ARRAY_AGG(p.name ORDER BY p.name) AS directors \
                 FROM movie_directors md \
                 JOIN people p ON p.id = md.person_id \
                 WHERE md.movie_id = m.id\
                 ) d ON true",
            );
        }
        Dialect::MySql => {
            builder.push(
                ", (\
                 SELECT JSON_ARRAYAGG(p.name) \
                 FROM movie_directors md \
                 JOIN people p ON p.id = md.person_id \
                 WHERE md.movie_id = m.id\
                 ) AS directors FROM movies m",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::movie::MovieColumn;
    use crate::query::builder::Value;

    const DIALECTS: [Dialect; 2] = [Dialect::Postgres, Dialect::MySql];

    #[test]
    fn test_list_postgres_statement() {
        let statement = list(Dialect::Postgres, &ListParams::new(5));
        assert_eq!(
            statement.sql(),
            "SELECT m.id, m.title, m.added_at, m.rating, d.directors FROM movies m \
             LEFT JOIN LATERAL (SELECT ARRAY_AGG(p.name ORDER BY p.name) AS directors \
             FROM movie_directors md JOIN people p ON p.id = md.person_id \
             WHERE md.movie_id = m.id) d ON true \
             WHERE 1=1 ORDER BY m.rating DESC, m.id ASC LIMIT $1"
        );
        assert_eq!(statement.args(), &[Value::Int(5)]);
        assert_eq!(statement.columns(), COLUMNS_WITH_DIRECTORS);
    }

    #[test]
    fn test_list_preload_has_no_aggregation() {
        for dialect in DIALECTS {
            let statement = list_preload(dialect, &ListParams::new(5).min_rating(6.0));
            assert!(!statement.sql().contains("ARRAY_AGG"));
            assert!(!statement.sql().contains("JSON_ARRAYAGG"));
            assert!(!statement.sql().contains("directors"));
            assert!(statement.sql().contains("ORDER BY m.rating DESC"));
            assert_eq!(statement.columns(), CORE_COLUMNS);
        }
    }

    #[test]
    fn test_list_filter_placeholders_follow_inclusion() {
        let params = ListParams::new(2000).search("shark").min_rating(7.0);
        let statement = list_preload(Dialect::Postgres, &params);
        assert!(statement.sql().contains("plainto_tsquery('simple', $1)"));
        assert!(statement.sql().contains("m.rating >= $2"));
        assert!(statement.sql().ends_with("LIMIT $3"));
        assert_eq!(
            statement.args(),
            &[Value::from("shark"), Value::Float(7.0), Value::Int(1000)]
        );
    }

    #[test]
    fn test_dashboard_unfiltered_uses_where_true() {
        for dialect in DIALECTS {
            let statement = dashboard(dialect, &DashboardParams::new("title", 10)).unwrap();
            assert!(statement.sql().contains(" WHERE true ORDER BY m.title ASC"));
        }
    }

    #[test]
    fn test_dashboard_directors_only_when_requested() {
        for dialect in DIALECTS {
            let without = dashboard(dialect, &DashboardParams::new("rating", 10)).unwrap();
            assert!(!without.sql().contains("directors"));
            assert_eq!(without.columns(), CORE_COLUMNS);

            let with = dashboard(
                dialect,
                &DashboardParams::new("rating", 10).with_directors(true),
            )
            .unwrap();
            assert!(with.sql().contains("AS directors"));
            assert_eq!(with.columns().last(), Some(&MovieColumn::Directors));
        }
    }

    #[test]
    fn test_dashboard_preload_never_inlines_directors() {
        for dialect in DIALECTS {
            let params = DashboardParams::new("added_at", 10)
                .descending(true)
                .with_directors(true);
            let statement = dashboard_preload(dialect, &params).unwrap();
            assert!(!statement.sql().contains("directors"));
            assert!(statement.sql().contains("ORDER BY m.added_at DESC"));
            assert_eq!(statement.columns(), CORE_COLUMNS);
        }
    }

    #[test]
    fn test_dashboard_invalid_sort() {
        for dialect in DIALECTS {
            let params = DashboardParams::new("popularity", 10);
            assert!(matches!(
                dashboard(dialect, &params),
                Err(QueryError::InvalidSort { .. })
            ));
            assert!(matches!(
                dashboard_preload(dialect, &params),
                Err(QueryError::InvalidSort { .. })
            ));
        }
    }

    #[test]
    fn test_dashboard_mysql_full_filter() {
        let params = DashboardParams::new("title", 25)
            .search("thing")
            .year_added(2010)
            .min_rating(4.5);
        let statement = dashboard(Dialect::MySql, &params).unwrap();
        assert_eq!(statement.sql().matches('?').count(), 5);
        assert_eq!(
            statement.args(),
            &[
                Value::from("thing"),
                Value::from("thing"),
                Value::Int(2010),
                Value::Float(4.5),
                Value::Int(25),
            ]
        );
    }

    #[test]
    fn test_directors_batch_statement() {
        let pg = directors(Dialect::Postgres, &[3, 1, 2]);
        assert!(pg.sql().contains("WHERE md.movie_id = ANY($1) GROUP BY md.movie_id"));
        assert_eq!(pg.args(), &[Value::IntList(vec![3, 1, 2])]);

        let my = directors(Dialect::MySql, &[3, 1, 2]);
        assert!(my.sql().contains("WHERE md.movie_id IN (?, ?, ?) GROUP BY md.movie_id"));
        assert_eq!(my.args().len(), 3);
    }

    #[test]
    fn test_composition_is_referentially_transparent() {
        let params = DashboardParams::new("rating", 77)
            .search("little")
            .descending(true)
            .with_directors(true);
        for dialect in DIALECTS {
            assert_eq!(
                dashboard(dialect, &params).unwrap(),
                dashboard(dialect, &params).unwrap()
            );
        }
    }
}
