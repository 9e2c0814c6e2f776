//! Parsing of literal values written in a condition.

use super::column_type::{ColumnKind, ColumnType};
use crate::error::{QueryError, QueryResult};
use chrono::{NaiveDate, NaiveDateTime};

/// A condition literal converted for the column it is compared against
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// The empty literal, meaning "no value"
    Empty,
    Number(f64),
    Timestamp(NaiveDateTime),
    Bool(bool),
    Text(String),
}

impl Literal {
    pub fn is_empty(&self) -> bool {
        matches!(self, Literal::Empty)
    }
}

/// Convert a raw literal into the typed value used for comparisons with
/// cells of `column_type`.
pub fn parse_literal(column_type: ColumnType, raw: &str) -> QueryResult<Literal> {
    match column_type.kind() {
        ColumnKind::Number => {
            if raw.is_empty() {
                return Ok(Literal::Empty);
            }
            raw.parse::<f64>()
                .map(Literal::Number)
                .map_err(|e| QueryError::invalid_literal(column_type, raw, e.to_string()))
        }
        ColumnKind::Date | ColumnKind::UtcTimestamp => {
            if raw.is_empty() {
                return Ok(Literal::Empty);
            }
            parse_timestamp(raw)
                .map(Literal::Timestamp)
                .ok_or_else(|| {
                    QueryError::invalid_literal(
                        column_type,
                        raw,
                        "expected YYYY-M-D with optional H, H:M or H:M:S",
                    )
                })
        }
        ColumnKind::Checkbox => {
            if raw.is_empty() {
                return Ok(Literal::Bool(false));
            }
            match raw.to_lowercase().as_str() {
                "true" => Ok(Literal::Bool(true)),
                "false" => Ok(Literal::Bool(false)),
                _ => Err(QueryError::invalid_literal(
                    column_type,
                    raw,
                    "expected \"true\" or \"false\", case insensitive",
                )),
            }
        }
        ColumnKind::Text | ColumnKind::LongText | ColumnKind::List => {
            if raw.is_empty() {
                Ok(Literal::Empty)
            } else {
                Ok(Literal::Text(raw.to_string()))
            }
        }
    }
}

/// Parse `YYYY-M-D`, `YYYY-M-D H`, `YYYY-M-D H:M` or `YYYY-M-D H:M:S`.
///
/// Missing components default to zero.
pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    parse_date_time(s, s.split_once(' '))
}

/// Parse a timestamp stored in a date cell, where the time part may also be
/// separated from the date by `T`.
pub(crate) fn parse_stored_timestamp(s: &str) -> Option<NaiveDateTime> {
    parse_date_time(s, s.split_once(|c: char| c == ' ' || c == 'T'))
}

fn parse_date_time(s: &str, parts: Option<(&str, &str)>) -> Option<NaiveDateTime> {
    let (date_part, time_part) = match parts {
        Some((date, time)) => (date, Some(time)),
        None => (s, None),
    };
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;

    let mut hms = [0u32; 3];
    if let Some(time) = time_part {
        let components: Vec<&str> = time.split(':').collect();
        if components.len() > 3 {
            return None;
        }
        for (slot, component) in hms.iter_mut().zip(components) {
            if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            *slot = component.parse().ok()?;
        }
    }

    date.and_hms_opt(hms[0], hms[1], hms[2])
}
