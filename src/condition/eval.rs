//! Condition evaluation against a row snapshot.
//!
//! Every term is evaluated against the full base row set; the per-term
//! subsets are then folded left to right, merging by row identity.

use super::ast::{Condition, Connector, Term};
use super::parser::parse_condition;
use crate::column::{parse_literal, ColumnSchema, ColumnValue, Predicate};
use crate::error::QueryResult;
use crate::row::{row_id, Row, RowId};
use chrono::FixedOffset;
use log::trace;
use std::collections::{HashMap, HashSet};

/// Evaluator for conditions over a fixed set of rows
pub struct ConditionEvaluator<'a> {
    /// Base rows every term is evaluated against
    rows: &'a [Row],
    /// Columns by name
    columns: HashMap<&'a str, &'a ColumnSchema>,
    /// Offset applied to stored ctime/mtime cells; local time when unset
    utc_offset: Option<FixedOffset>,
}

impl<'a> ConditionEvaluator<'a> {
    pub fn new(rows: &'a [Row], columns: &'a [ColumnSchema]) -> Self {
        Self {
            rows,
            columns: columns.iter().map(|c| (c.name.as_str(), c)).collect(),
            utc_offset: None,
        }
    }

    pub fn with_utc_offset(mut self, utc_offset: Option<FixedOffset>) -> Self {
        self.utc_offset = utc_offset;
        self
    }

    /// Evaluate a condition and return the matching rows
    pub fn evaluate(&self, condition: &Condition) -> QueryResult<Vec<&'a Row>> {
        let mut result = self.filter_term(&condition.first)?;
        for (connector, term) in &condition.rest {
            let term_rows = self.filter_term(term)?;
            result = merge(result, *connector, term_rows)?;
        }
        Ok(result)
    }

    /// Select the base rows matching a single term.
    ///
    /// A column missing from the schema selects nothing, as does a row
    /// without a cell for the column. Operator and literal errors are
    /// reported before any row is read.
    pub fn filter_term(&self, term: &Term) -> QueryResult<Vec<&'a Row>> {
        let Some(column) = self.columns.get(term.column.as_str()) else {
            trace!("unknown column '{}', term selects no rows", term.column);
            return Ok(Vec::new());
        };
        let column_type = column.column_type;
        column_type.check_operator(term.op)?;
        let literal = parse_literal(column_type, &term.literal)?;
        let predicate = Predicate::new(column_type, term.op, &literal)?;

        let mut matched = Vec::new();
        for row in self.rows {
            let Some(cell) = row.get(&term.column) else {
                continue;
            };
            let value = ColumnValue::from_cell(column_type, cell, self.utc_offset)?;
            if predicate.matches(&value)? {
                matched.push(row);
            }
        }

        trace!("term `{}` matched {} of {} rows", term, matched.len(), self.rows.len());
        Ok(matched)
    }
}

/// Merge the running result with the rows of the next term.
///
/// `And` keeps running rows whose identity also appears in `term_rows`;
/// `Or` appends term rows whose identity is not yet present. Running order
/// is preserved in both cases.
pub fn merge<'a>(
    running: Vec<&'a Row>,
    connector: Connector,
    term_rows: Vec<&'a Row>,
) -> QueryResult<Vec<&'a Row>> {
    match connector {
        Connector::And => {
            let term_ids = identities(&term_rows)?;
            let mut merged = Vec::with_capacity(running.len().min(term_rows.len()));
            for row in running {
                if term_ids.contains(&row_id(row)?) {
                    merged.push(row);
                }
            }
            Ok(merged)
        }
        Connector::Or => {
            let mut seen = identities(&running)?;
            let mut merged = running;
            for row in term_rows {
                if seen.insert(row_id(row)?) {
                    merged.push(row);
                }
            }
            Ok(merged)
        }
    }
}

fn identities(rows: &[&Row]) -> QueryResult<HashSet<RowId>> {
    rows.iter().map(|row| row_id(row)).collect()
}

/// Parse `condition` and evaluate it against `rows`, returning owned copies
/// of the matching rows in order. An empty condition selects every row.
pub fn evaluate_condition(
    rows: &[Row],
    columns: &[ColumnSchema],
    condition: &str,
    utc_offset: Option<FixedOffset>,
) -> QueryResult<Vec<Row>> {
    let Some(condition) = parse_condition(condition)? else {
        return Ok(rows.to_vec());
    };
    let evaluator = ConditionEvaluator::new(rows, columns).with_utc_offset(utc_offset);
    let matched = evaluator.evaluate(&condition)?;
    Ok(matched.into_iter().cloned().collect())
}
