//! Statement composition and the generic repository
//!
//! Bottom up: [`builder`] renders placeholders, [`predicate`] and [`sort`]
//! produce clauses, [`composer`] assembles one statement per scenario,
//! [`hydrate`] runs the batched secondary load and [`repository`] ties it all
//! to an [`Executor`](crate::core::executor::Executor).

pub mod builder;
pub mod composer;
pub mod hydrate;
pub mod predicate;
pub mod repository;
pub mod sort;

pub use builder::{Dialect, RowShape, Slot, SqlBuilder, Statement, Value};
pub use hydrate::hydrate;
pub use predicate::{Predicate, PredicateKind, build_predicates};
pub use repository::ComposedRepository;
pub use sort::{MAX_LIMIT, OrderBy, SortColumn, SortDirection, resolve_limit};
