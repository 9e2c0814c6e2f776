//! Typed column model for condition evaluation.
//!
//! This module provides:
//! - The column type registry mapping schema types to filter behavior
//! - Literal parsing for user supplied comparison values
//! - The `ColumnValue` wrapper around raw cells and its comparisons

pub mod column_type;
pub mod literal;
pub mod value;

pub use column_type::{ColumnKind, ColumnSchema, ColumnType};
pub use literal::{parse_literal, Literal};
pub use value::{ColumnValue, Predicate};
