//! Typed wrapper around a raw cell and the comparisons a condition can apply to it.

use super::column_type::{ColumnKind, ColumnType};
use super::literal::{parse_stored_timestamp, Literal};
use crate::condition::CompareOp;
use crate::error::{QueryError, QueryResult};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Utc};
use serde_json::Value;

/// A cell converted according to its column type.
///
/// `None` payloads stand for a cell without a value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Number(Option<f64>),
    Timestamp(Option<NaiveDateTime>),
    Bool(bool),
    Text(Option<String>),
    List(Option<Vec<String>>),
    /// A text-behavior cell holding something other than a string
    Opaque,
}

impl ColumnValue {
    /// Convert a raw cell of a column of type `column_type`.
    ///
    /// ctime/mtime cells are UTC timestamps; they are shifted into local
    /// time, or into `utc_offset` when one is given.
    pub fn from_cell(
        column_type: ColumnType,
        cell: &Value,
        utc_offset: Option<FixedOffset>,
    ) -> QueryResult<Self> {
        let shape_error = || {
            QueryError::Shape(format!(
                "{} column cannot hold the value {}",
                column_type, cell
            ))
        };

        match column_type.kind() {
            ColumnKind::Number => match cell {
                Value::Null => Ok(ColumnValue::Number(None)),
                Value::Number(n) => n
                    .as_f64()
                    .map(|n| ColumnValue::Number(Some(n)))
                    .ok_or_else(shape_error),
                _ => Err(shape_error()),
            },
            ColumnKind::Date => match cell {
                Value::Null => Ok(ColumnValue::Timestamp(None)),
                Value::String(s) if s.is_empty() => Ok(ColumnValue::Timestamp(None)),
                Value::String(s) => parse_stored_timestamp(s)
                    .map(|ts| ColumnValue::Timestamp(Some(ts)))
                    .ok_or_else(shape_error),
                _ => Err(shape_error()),
            },
            ColumnKind::UtcTimestamp => match cell {
                Value::Null => Ok(ColumnValue::Timestamp(None)),
                Value::String(s) if s.is_empty() => Ok(ColumnValue::Timestamp(None)),
                Value::String(s) => utc_to_local(s, utc_offset)
                    .map(|ts| ColumnValue::Timestamp(Some(ts)))
                    .ok_or_else(shape_error),
                _ => Err(shape_error()),
            },
            ColumnKind::Checkbox => match cell {
                Value::Null => Ok(ColumnValue::Bool(false)),
                Value::Bool(b) => Ok(ColumnValue::Bool(*b)),
                _ => Err(shape_error()),
            },
            ColumnKind::Text => Ok(text_value(cell, |s| s)),
            ColumnKind::LongText => Ok(text_value(cell, |s| s.trim_end_matches('\n'))),
            ColumnKind::List => match cell {
                Value::Null => Ok(ColumnValue::List(None)),
                Value::Array(items) => items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .map(|items| ColumnValue::List(Some(items)))
                    .ok_or_else(shape_error),
                _ => Err(shape_error()),
            },
        }
    }

    /// Apply `op` with `literal` on the right-hand side.
    ///
    /// `column_type` must be the type both sides were built from; it is used
    /// for error reporting.
    pub fn compare(
        &self,
        column_type: ColumnType,
        op: CompareOp,
        literal: &Literal,
    ) -> QueryResult<bool> {
        Predicate::new(column_type, op, literal)?.matches(self)
    }

    fn equal(&self, column_type: ColumnType, literal: &Literal) -> QueryResult<bool> {
        match (self, literal) {
            (ColumnValue::Number(cell), Literal::Empty) => Ok(cell.is_none()),
            (ColumnValue::Number(cell), Literal::Number(n)) => Ok(*cell == Some(*n)),
            (ColumnValue::Timestamp(cell), Literal::Empty) => Ok(cell.is_none()),
            (ColumnValue::Timestamp(cell), Literal::Timestamp(ts)) => Ok(*cell == Some(*ts)),
            (ColumnValue::Bool(cell), Literal::Bool(b)) => Ok(cell == b),
            (ColumnValue::Text(cell), Literal::Empty) => Ok(cell.is_none()),
            (ColumnValue::Text(cell), Literal::Text(s)) => Ok(cell.as_deref() == Some(s.as_str())),
            (ColumnValue::Opaque, Literal::Empty | Literal::Text(_)) => Ok(false),
            (ColumnValue::List(cell), Literal::Empty) => {
                Ok(cell.as_ref().map_or(true, |items| items.is_empty()))
            }
            (ColumnValue::List(cell), Literal::Text(s)) => {
                Ok(cell.as_ref().map_or(false, |items| items.contains(s)))
            }
            _ => Err(mismatch(column_type, literal)),
        }
    }

    fn like(&self, column_type: ColumnType, pattern: &LikePattern<'_>) -> QueryResult<bool> {
        match self {
            ColumnValue::Text(Some(data)) => Ok(pattern.matches(data)),
            ColumnValue::Text(None) | ColumnValue::Opaque => Ok(false),
            _ => Err(QueryError::Shape(format!(
                "{} column produced a non-text value",
                column_type
            ))),
        }
    }

    fn ordering(&self, column_type: ColumnType, op: CompareOp, literal: &Literal) -> QueryResult<bool> {
        let ordering = match (self, literal) {
            (ColumnValue::Number(cell), Literal::Number(n)) => match cell {
                Some(cell) => cell.partial_cmp(n),
                None => return Ok(false),
            },
            (ColumnValue::Timestamp(cell), Literal::Timestamp(ts)) => match cell {
                Some(cell) => Some(cell.cmp(ts)),
                None => return Ok(false),
            },
            _ => return Err(mismatch(column_type, literal)),
        };

        Ok(ordering.map_or(false, |ordering| op.accepts(ordering)))
    }
}

/// An operator and literal validated against a column type.
///
/// Building one reports every error that does not depend on a cell, so a
/// bad term fails even when no row is inspected.
#[derive(Debug, Clone)]
pub struct Predicate<'a> {
    column_type: ColumnType,
    op: CompareOp,
    literal: &'a Literal,
    pattern: Option<LikePattern<'a>>,
}

impl<'a> Predicate<'a> {
    pub fn new(column_type: ColumnType, op: CompareOp, literal: &'a Literal) -> QueryResult<Self> {
        column_type.check_operator(op)?;

        let mut pattern = None;
        match op {
            CompareOp::Like => {
                let raw = match literal {
                    Literal::Text(s) => s.as_str(),
                    Literal::Empty => "",
                    _ => return Err(mismatch(column_type, literal)),
                };
                pattern = Some(LikePattern::parse(raw).ok_or_else(|| {
                    QueryError::invalid_literal(column_type, raw, "no pattern found in like phrase")
                })?);
            }
            CompareOp::Greater | CompareOp::GreaterEqual | CompareOp::Less | CompareOp::LessEqual
                if literal.is_empty() =>
            {
                return Err(QueryError::invalid_literal(
                    column_type,
                    "",
                    format!("the operator '{}' needs a value", op),
                ));
            }
            _ => {}
        }

        Ok(Self {
            column_type,
            op,
            literal,
            pattern,
        })
    }

    /// Test one cell value
    pub fn matches(&self, value: &ColumnValue) -> QueryResult<bool> {
        match (self.op, &self.pattern) {
            (CompareOp::Equal, _) => value.equal(self.column_type, self.literal),
            (CompareOp::NotEqual, _) => value.equal(self.column_type, self.literal).map(|eq| !eq),
            (CompareOp::Like, Some(pattern)) => value.like(self.column_type, pattern),
            (CompareOp::Like, None) => Err(mismatch(self.column_type, self.literal)),
            (op, _) => value.ordering(self.column_type, op, self.literal),
        }
    }
}

fn text_value(cell: &Value, normalize: impl Fn(&str) -> &str) -> ColumnValue {
    match cell {
        Value::Null => ColumnValue::Text(None),
        Value::String(s) => {
            let s = normalize(s);
            if s.is_empty() {
                ColumnValue::Text(None)
            } else {
                ColumnValue::Text(Some(s.to_string()))
            }
        }
        _ => ColumnValue::Opaque,
    }
}

fn utc_to_local(raw: &str, utc_offset: Option<FixedOffset>) -> Option<NaiveDateTime> {
    let utc = DateTime::parse_from_rfc3339(raw).ok()?.with_timezone(&Utc);
    Some(match utc_offset {
        Some(offset) => utc.with_timezone(&offset).naive_local(),
        None => utc.with_timezone(&Local).naive_local(),
    })
}

fn mismatch(column_type: ColumnType, literal: &Literal) -> QueryError {
    QueryError::invalid_literal(
        column_type,
        format!("{:?}", literal),
        "literal does not match the column type",
    )
}

/// The four shapes a LIKE pattern can take
#[derive(Debug, Clone, Copy, PartialEq)]
enum LikePattern<'a> {
    Prefix(&'a str),
    Suffix(&'a str),
    Contains(&'a str),
    PrefixSuffix(&'a str, &'a str),
}

impl<'a> LikePattern<'a> {
    fn parse(pattern: &'a str) -> Option<Self> {
        if !pattern.contains('%') {
            return None;
        }

        let leading = pattern.starts_with('%');
        let trailing = pattern.ends_with('%');
        Some(match (leading, trailing) {
            (false, true) => LikePattern::Prefix(&pattern[..pattern.len() - 1]),
            (true, false) => LikePattern::Suffix(&pattern[1..]),
            (true, true) => LikePattern::Contains(
                pattern
                    .strip_prefix('%')
                    .and_then(|rest| rest.strip_suffix('%'))
                    .unwrap_or(""),
            ),
            (false, false) => {
                let start = pattern.split('%').next().unwrap_or("");
                let end = pattern.rsplit('%').next().unwrap_or("");
                LikePattern::PrefixSuffix(start, end)
            }
        })
    }

    fn matches(&self, data: &str) -> bool {
        match self {
            LikePattern::Prefix(start) => data.starts_with(start),
            LikePattern::Suffix(end) => data.ends_with(end),
            LikePattern::Contains(middle) => data.contains(middle),
            LikePattern::PrefixSuffix(start, end) => data.starts_with(start) && data.ends_with(end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::parse_literal;
    use serde_json::json;

    fn check(column_type: ColumnType, cell: Value, op: CompareOp, literal: &str) -> QueryResult<bool> {
        let literal = parse_literal(column_type, literal)?;
        ColumnValue::from_cell(column_type, &cell, None)?.compare(column_type, op, &literal)
    }

    #[test]
    fn test_number_equality() -> QueryResult<()> {
        assert!(check(ColumnType::Number, json!(20), CompareOp::Equal, "20")?);
        assert!(check(ColumnType::Number, json!(20.0), CompareOp::Equal, "20")?);
        assert!(!check(ColumnType::Number, json!(20.5), CompareOp::Equal, "20")?);
        assert!(check(ColumnType::Number, json!(null), CompareOp::Equal, "")?);
        assert!(!check(ColumnType::Number, json!(0), CompareOp::Equal, "")?);
        assert!(check(ColumnType::Number, json!(0), CompareOp::NotEqual, "")?);
        assert!(check(ColumnType::Number, json!(null), CompareOp::NotEqual, "3")?);
        Ok(())
    }

    #[test]
    fn test_number_ordering() -> QueryResult<()> {
        assert!(check(ColumnType::Number, json!(20), CompareOp::GreaterEqual, "18")?);
        assert!(check(ColumnType::Number, json!(18), CompareOp::GreaterEqual, "18")?);
        assert!(!check(ColumnType::Number, json!(18), CompareOp::Greater, "18")?);
        assert!(check(ColumnType::Number, json!(17), CompareOp::Less, "18")?);
        assert!(check(ColumnType::Number, json!(18), CompareOp::LessEqual, "18")?);

        for op in [
            CompareOp::Greater,
            CompareOp::GreaterEqual,
            CompareOp::Less,
            CompareOp::LessEqual,
        ] {
            assert!(!check(ColumnType::Number, json!(null), op, "18")?);
        }
        Ok(())
    }

    #[test]
    fn test_ordering_with_empty_literal_fails() {
        assert!(matches!(
            check(ColumnType::Number, json!(3), CompareOp::Greater, ""),
            Err(QueryError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn test_number_cell_shape() {
        assert!(matches!(
            check(ColumnType::Number, json!("12"), CompareOp::Equal, "12"),
            Err(QueryError::Shape(_))
        ));
    }

    #[test]
    fn test_date_comparisons() -> QueryResult<()> {
        assert!(check(ColumnType::Date, json!("2021-03-04"), CompareOp::Equal, "2021-3-4")?);
        assert!(check(ColumnType::Date, json!("2021-03-04 10:30"), CompareOp::Greater, "2021-3-4 10")?);
        assert!(check(ColumnType::Date, json!("2021-03-04"), CompareOp::Less, "2021-3-5")?);
        assert!(check(ColumnType::Date, json!(null), CompareOp::Equal, "")?);
        assert!(!check(ColumnType::Date, json!(null), CompareOp::Less, "2021-3-5")?);
        Ok(())
    }

    #[test]
    fn test_ctime_shifts_stored_cell_only() -> QueryResult<()> {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let cell = ColumnValue::from_cell(
            ColumnType::Ctime,
            &json!("2021-03-04T20:30:00.123+00:00"),
            Some(offset),
        )?;
        let next_day = parse_literal(ColumnType::Ctime, "2021-3-5")?;
        assert!(cell.compare(ColumnType::Ctime, CompareOp::Greater, &next_day)?);

        let utc = ColumnValue::from_cell(
            ColumnType::Mtime,
            &json!("2021-03-04T20:30:00+00:00"),
            Some(FixedOffset::east_opt(0).unwrap()),
        )?;
        assert!(utc.compare(ColumnType::Mtime, CompareOp::Less, &next_day)?);
        assert!(utc.compare(
            ColumnType::Mtime,
            CompareOp::Equal,
            &parse_literal(ColumnType::Mtime, "2021-3-4 20:30")?
        )?);
        Ok(())
    }

    #[test]
    fn test_checkbox() -> QueryResult<()> {
        assert!(check(ColumnType::Checkbox, json!(true), CompareOp::Equal, "true")?);
        assert!(check(ColumnType::Checkbox, json!(false), CompareOp::Equal, "")?);
        assert!(check(ColumnType::Checkbox, json!(null), CompareOp::Equal, "false")?);
        assert!(check(ColumnType::Checkbox, json!(true), CompareOp::NotEqual, "FALSE")?);
        assert!(matches!(
            check(ColumnType::Checkbox, json!(true), CompareOp::Greater, "true"),
            Err(QueryError::UnsupportedOperation { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_text_equality() -> QueryResult<()> {
        assert!(check(ColumnType::Text, json!("NYC"), CompareOp::Equal, "NYC")?);
        assert!(!check(ColumnType::Text, json!("nyc"), CompareOp::Equal, "NYC")?);
        assert!(check(ColumnType::Text, json!(null), CompareOp::Equal, "")?);
        assert!(check(ColumnType::Text, json!("x"), CompareOp::NotEqual, "")?);
        assert!(check(ColumnType::LongText, json!("notes\n\n"), CompareOp::Equal, "notes")?);
        Ok(())
    }

    #[test]
    fn test_like_patterns() -> QueryResult<()> {
        assert!(check(ColumnType::Text, json!("Joanne"), CompareOp::Like, "%ann%")?);
        assert!(!check(ColumnType::Text, json!("Anna"), CompareOp::Like, "%ann%")?);
        assert!(check(ColumnType::Text, json!("Anna"), CompareOp::Like, "Ann%")?);
        assert!(check(ColumnType::Text, json!("Joanne"), CompareOp::Like, "%anne")?);
        assert!(check(ColumnType::Text, json!("abcd"), CompareOp::Like, "ab%cd")?);
        assert!(check(ColumnType::Text, json!("abc"), CompareOp::Like, "ab%bc")?);
        assert!(!check(ColumnType::Text, json!("abxd"), CompareOp::Like, "ab%cd")?);
        assert!(check(ColumnType::Text, json!("anything"), CompareOp::Like, "%")?);
        assert!(!check(ColumnType::Text, json!(null), CompareOp::Like, "%")?);
        Ok(())
    }

    #[test]
    fn test_like_without_wildcard_fails() {
        assert!(matches!(
            check(ColumnType::Text, json!("abc"), CompareOp::Like, "abc"),
            Err(QueryError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn test_predicate_rejects_bad_literals_without_a_cell() {
        let no_wildcard = Literal::Text("abc".to_string());
        assert!(matches!(
            Predicate::new(ColumnType::Text, CompareOp::Like, &no_wildcard),
            Err(QueryError::InvalidLiteral { .. })
        ));
        assert!(matches!(
            Predicate::new(ColumnType::Number, CompareOp::Less, &Literal::Empty),
            Err(QueryError::InvalidLiteral { .. })
        ));
        assert!(Predicate::new(ColumnType::Number, CompareOp::Equal, &Literal::Empty).is_ok());
    }

    #[test]
    fn test_non_text_cells_never_match() -> QueryResult<()> {
        let link = json!([{"row_id": "a"}]);
        assert!(!check(ColumnType::Link, link.clone(), CompareOp::Like, "%a%")?);
        assert!(!check(ColumnType::Link, link.clone(), CompareOp::Equal, "a")?);
        assert!(check(ColumnType::Link, link, CompareOp::NotEqual, "a")?);
        Ok(())
    }

    #[test]
    fn test_multiple_select_membership() -> QueryResult<()> {
        let tags = json!(["red", "green"]);
        assert!(check(ColumnType::MultipleSelect, tags.clone(), CompareOp::Equal, "red")?);
        assert!(!check(ColumnType::MultipleSelect, tags.clone(), CompareOp::Equal, "blue")?);
        assert!(check(ColumnType::MultipleSelect, tags.clone(), CompareOp::NotEqual, "blue")?);
        assert!(!check(ColumnType::MultipleSelect, tags, CompareOp::Equal, "")?);
        assert!(check(ColumnType::MultipleSelect, json!([]), CompareOp::Equal, "")?);
        assert!(!check(ColumnType::MultipleSelect, json!(null), CompareOp::Equal, "red")?);
        assert!(matches!(
            check(ColumnType::MultipleSelect, json!("red"), CompareOp::Equal, "red"),
            Err(QueryError::Shape(_))
        ));
        Ok(())
    }

    #[test]
    fn test_cross_variant_comparison_is_rejected() {
        let cell = ColumnValue::Number(Some(1.0));
        let literal = Literal::Text("1".to_string());
        assert!(matches!(
            cell.compare(ColumnType::Number, CompareOp::Equal, &literal),
            Err(QueryError::InvalidLiteral { .. })
        ));
    }
}
