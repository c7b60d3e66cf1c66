//! Filter predicates built from optional parameter fields

use crate::core::params::Filter;
use crate::query::builder::{Dialect, SqlBuilder, Value};

/// Which filter field produced a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateKind {
    Search,
    Year,
    Rating,
}

/// One conditional SQL fragment together with its bound values
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    kind: PredicateKind,
    sql: SqlBuilder,
}

impl Predicate {
    pub fn kind(&self) -> PredicateKind {
        self.kind
    }

    pub fn values(&self) -> &[Value] {
        self.sql.values()
    }

    pub fn render(&self, dialect: Dialect) -> (String, Vec<Value>) {
        self.sql.render(dialect)
    }
}

/// Build the conjunction members for `filter`, in a fixed order.
///
/// Each rule applies independently: search when the term is non-empty, year
/// when non-zero, rating (inclusive lower bound) when non-zero.
pub fn build_predicates(dialect: Dialect, filter: &Filter<'_>) -> Vec<Predicate> {
    let mut predicates = Vec::with_capacity(3);

    if !filter.search.is_empty() {
        predicates.push(search(dialect, filter.search));
    }

    if filter.year_added != 0 {
        let mut sql = SqlBuilder::new();
        sql.push("EXTRACT(YEAR FROM m.added_at) = ");
        sql.push_bind(filter.year_added);
        predicates.push(Predicate {
            kind: PredicateKind::Year,
            sql,
        });
    }

    if filter.min_rating != 0.0 {
        let mut sql = SqlBuilder::new();
        sql.push("m.rating >= ");
        sql.push_bind(filter.min_rating);
        predicates.push(Predicate {
            kind: PredicateKind::Rating,
            sql,
        });
    }

    predicates
}

/// Title match OR any director name match.
fn search(dialect: Dialect, term: &str) -> Predicate {
    let mut sql = SqlBuilder::new();

    match dialect {
        Dialect::Postgres => {
            sql.push("(to_tsvector('simple', m.title) @@ plainto_tsquery('simple', ");
            let term = sql.push_bind(term);
            sql.push(
                ") OR EXISTS (\
                 SELECT 1 FROM movie_directors md \
                 JOIN people p ON p.id = md.person_id \
                 WHERE md.movie_id = m.id \
                 AND to_tsvector('simple', p.name) @@ plainto_tsquery('simple', ",
            );
            sql.push_slot(term);
            sql.push(")))");
        }
        Dialect::MySql => {
            sql.push("(MATCH (m.title) AGAINST (");
            let term = sql.push_bind(term);
            sql.push(
                " IN NATURAL LANGUAGE MODE) OR EXISTS (\
                 SELECT 1 FROM movie_directors md \
                 JOIN people p ON p.id = md.person_id \
                 WHERE md.movie_id = m.id \
                 AND MATCH (p.name) AGAINST (",
            );
            sql.push_slot(term);
            sql.push(" IN NATURAL LANGUAGE MODE)))");
        }
    }

    Predicate {
        kind: PredicateKind::Search,
        sql,
    }
}

/// Append ` WHERE <p1> AND <p2> …` to `builder`, or ` WHERE <identity>` when
/// there are no predicates.
pub fn push_where(builder: &mut SqlBuilder, predicates: Vec<Predicate>, identity: &'static str) {
    builder.push(" WHERE ");

    if predicates.is_empty() {
        builder.push(identity);
        return;
    }

    for (i, predicate) in predicates.into_iter().enumerate() {
        if i > 0 {
            builder.push(" AND ");
        }
        builder.append(predicate.sql);
    }
}
