//! Sort and limit policy

use crate::core::error::QueryError;
use crate::query::builder::SqlBuilder;
use std::str::FromStr;

/// Upper bound of every result set
pub const MAX_LIMIT: u64 = 1000;

/// Resolve a requested limit: inside `[1, MAX_LIMIT]` it is kept, anything
/// else collapses to `MAX_LIMIT`.
pub fn resolve_limit(limit: u64) -> u64 {
    if (1..=MAX_LIMIT).contains(&limit) {
        limit
    } else {
        MAX_LIMIT
    }
}

/// Allow-listed sortable columns of the Dashboard scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Title,
    AddedAt,
    Rating,
}

impl SortColumn {
    pub fn column(self) -> &'static str {
        match self {
            SortColumn::Title => "m.title",
            SortColumn::AddedAt => "m.added_at",
            SortColumn::Rating => "m.rating",
        }
    }
}

impl FromStr for SortColumn {
    type Err = QueryError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key {
            "title" => Ok(SortColumn::Title),
            "added_at" => Ok(SortColumn::AddedAt),
            "rating" => Ok(SortColumn::Rating),
            _ => Err(QueryError::InvalidSort {
                key: key.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn from_desc(desc: bool) -> Self {
        if desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A resolved ORDER BY clause.
///
/// `m.id` is always appended as a tie-breaker so equal sort keys come back
/// in the same order on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl OrderBy {
    /// Fixed order of the List scenarios, which expose no sort key
    pub const LIST: OrderBy = OrderBy {
        column: SortColumn::Rating,
        direction: SortDirection::Desc,
    };

    /// Resolve a dashboard sort key and direction flag.
    pub fn resolve(key: &str, desc: bool) -> Result<Self, QueryError> {
        Ok(OrderBy {
            column: key.parse()?,
            direction: SortDirection::from_desc(desc),
        })
    }

    pub fn push_sql(&self, builder: &mut SqlBuilder) {
        builder.push(" ORDER BY ");
        builder.push(self.column.column());
        builder.push(" ");
        builder.push(self.direction.as_sql());
        builder.push(", m.id ASC");
    }
}

/// Append ` LIMIT <bind>` with the resolved limit.
pub fn push_limit(builder: &mut SqlBuilder, limit: u64) {
    builder.push(" LIMIT ");
    // resolve_limit keeps the value within i64 range
    builder.push_bind(resolve_limit(limit) as i64);
}
