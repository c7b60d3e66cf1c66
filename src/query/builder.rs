//! SQL statement builder with late placeholder rendering
//!
//! Fragments and bound values accumulate in a [`SqlBuilder`] as parts. Each
//! bound value occupies a [`Slot`]; a slot may be referenced more than once.
//! Placeholder text is only produced by [`SqlBuilder::build`], so clauses can
//! be included or skipped freely without renumbering anything by hand.
//!
//! - PostgreSQL numbers slots `$1, $2, …` in order of first use and reuses
//!   the number for repeated references.
//! - MySQL emits `?` per reference and repeats the value; an integer list
//!   expands to `?, ?, …`.

use crate::core::movie::MovieColumn;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::Write as _;

/// SQL dialect of a store adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Postgres,
    MySql,
}

/// A value passed through the driver's binding mechanism
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
    IntList(Vec<i64>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::IntList(_) => "integer list",
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Vec<i64>> for Value {
    fn from(value: Vec<i64>) -> Self {
        Value::IntList(value)
    }
}

/// Handle to a bound value inside one builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot(usize);

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Sql(Cow<'static, str>),
    Slot(Slot),
}

/// Accumulates SQL fragments and bound values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlBuilder {
    parts: Vec<Part>,
    values: Vec<Value>,
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append literal SQL. Never pass user input here.
    pub fn push(&mut self, sql: impl Into<Cow<'static, str>>) -> &mut Self {
        self.parts.push(Part::Sql(sql.into()));
        self
    }

    /// Bind a value and reference it at the current position.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> Slot {
        let slot = Slot(self.values.len());
        self.values.push(value.into());
        self.parts.push(Part::Slot(slot));
        slot
    }

    /// Reference an already bound value again.
    pub fn push_slot(&mut self, slot: Slot) -> &mut Self {
        debug_assert!(slot.0 < self.values.len(), "slot from another builder");
        self.parts.push(Part::Slot(slot));
        self
    }

    /// Append another builder, keeping its slots distinct from ours.
    pub fn append(&mut self, other: SqlBuilder) -> &mut Self {
        let offset = self.values.len();
        self.values.extend(other.values);
        self.parts.extend(other.parts.into_iter().map(|part| match part {
            Part::Slot(Slot(index)) => Part::Slot(Slot(index + offset)),
            sql => sql,
        }));
        self
    }

    /// Bound values in slot order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Render placeholders for `dialect` and return `(sql, arguments)`.
    pub fn render(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut args = Vec::with_capacity(self.values.len());

        match dialect {
            Dialect::Postgres => {
                let mut numbers: Vec<Option<usize>> = vec![None; self.values.len()];
                for part in &self.parts {
                    match part {
                        Part::Sql(text) => sql.push_str(text),
                        Part::Slot(Slot(index)) => {
                            let number = *numbers[*index].get_or_insert_with(|| {
                                args.push(self.values[*index].clone());
                                args.len()
                            });
                            let _ = write!(sql, "${number}");
                        }
                    }
                }
            }
            Dialect::MySql => {
                for part in &self.parts {
                    match part {
                        Part::Sql(text) => sql.push_str(text),
                        Part::Slot(Slot(index)) => match &self.values[*index] {
                            Value::IntList(ids) => {
                                for (i, id) in ids.iter().enumerate() {
                                    if i > 0 {
                                        sql.push_str(", ");
                                    }
                                    sql.push('?');
                                    args.push(Value::Int(*id));
                                }
                            }
                            value => {
                                sql.push('?');
                                args.push(value.clone());
                            }
                        },
                    }
                }
            }
        }

        (sql, args)
    }

    /// Render into an executable statement with the given row shape.
    pub fn build(&self, dialect: Dialect, shape: RowShape) -> Statement {
        let (sql, args) = self.render(dialect);
        Statement { sql, args, shape }
    }
}

/// What the rows of a statement look like, in positional scan order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    /// Movie rows projecting exactly these columns
    Movies(&'static [MovieColumn]),
    /// `(movie_id, names)` rows of the hydration statement
    DirectorGroups,
}

/// A fully rendered statement ready for an executor
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    args: Vec<Value>,
    shape: RowShape,
}

impl Statement {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn shape(&self) -> RowShape {
        self.shape
    }

    /// Projected movie columns, empty for non-movie statements
    pub fn columns(&self) -> &'static [MovieColumn] {
        match self.shape {
            RowShape::Movies(columns) => columns,
            RowShape::DirectorGroups => &[],
        }
    }
}
