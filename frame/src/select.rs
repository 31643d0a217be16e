//! FILENAME: frame/src/select.rs
//! PURPOSE: Row selection - closure filters and composable predicates.
//! CONTEXT: Predicates compose column comparisons with AND/OR/NOT and
//! short-circuit like ordinary boolean expressions. Any comparison that
//! touches a Missing value is false; that is a propagation policy, not an
//! error, so `Not` over such a comparison is true.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::cell::CellValue;
use crate::error::FrameError;
use crate::index::Label;
use crate::table::Table;

/// Comparison operators for cell predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl ComparisonOperator {
    fn holds(&self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            ComparisonOperator::Equals => ord == Equal,
            ComparisonOperator::NotEquals => ord != Equal,
            ComparisonOperator::GreaterThan => ord == Greater,
            ComparisonOperator::GreaterThanOrEqual => ord != Less,
            ComparisonOperator::LessThan => ord == Less,
            ComparisonOperator::LessThanOrEqual => ord != Greater,
        }
    }
}

/// A composable row predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Predicate {
    /// Compare a named column's cell against a constant.
    Compare {
        column: String,
        op: ComparisonOperator,
        value: CellValue,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// Convenience constructor for the common leaf case.
    pub fn compare(column: &str, op: ComparisonOperator, value: CellValue) -> Predicate {
        Predicate::Compare {
            column: column.to_string(),
            op,
            value,
        }
    }

    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    /// Evaluates the predicate for one row. Short-circuits on And/Or;
    /// comparisons involving Missing (or incomparable variants) are false.
    pub fn eval(&self, row: &RowView<'_>) -> bool {
        match self {
            Predicate::Compare { column, op, value } => match row.get(column) {
                Some(cell) => cell.compare(value).map(|ord| op.holds(ord)).unwrap_or(false),
                None => false,
            },
            Predicate::And(a, b) => a.eval(row) && b.eval(row),
            Predicate::Or(a, b) => a.eval(row) || b.eval(row),
            Predicate::Not(inner) => !inner.eval(row),
        }
    }

    /// Every column name the predicate mentions.
    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Compare { column, .. } => out.push(column),
            Predicate::And(a, b) | Predicate::Or(a, b) => {
                a.collect_columns(out);
                b.collect_columns(out);
            }
            Predicate::Not(inner) => inner.collect_columns(out),
        }
    }
}

/// A borrowed view of one table row, handed to filter callbacks.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a Table,
    pos: usize,
}

impl<'a> RowView<'a> {
    pub(crate) fn new(table: &'a Table, pos: usize) -> RowView<'a> {
        RowView { table, pos }
    }

    /// The cell in the named column, or None for an unknown name.
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        self.table
            .column(column)
            .ok()
            .map(|c| &c.values()[self.pos])
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// The row's index label tuple.
    pub fn index_label(&self) -> &'a [Label] {
        self.table
            .row_index()
            .label_at(self.pos)
            .unwrap_or(&[])
    }
}

impl Table {
    /// Keeps the rows for which the predicate closure returns true, in
    /// their original relative order. The derived index is the
    /// subsequence of the original at the kept positions.
    pub fn filter(&self, pred: impl Fn(&RowView<'_>) -> bool) -> Table {
        let (rows, _) = self.shape();
        let positions: Vec<usize> = (0..rows)
            .filter(|&p| pred(&RowView::new(self, p)))
            .collect();
        debug!("filter kept {} of {} rows", positions.len(), rows);
        self.take(&positions)
    }

    /// Predicate-tree filter. Unknown column names fail with
    /// `UnknownColumn` before any row is evaluated.
    pub fn filter_where(&self, predicate: &Predicate) -> Result<Table, FrameError> {
        let mut referenced = Vec::new();
        predicate.collect_columns(&mut referenced);
        for name in referenced {
            if !self.has_column(name) {
                return Err(FrameError::UnknownColumn(name.to_string()));
            }
        }
        Ok(self.filter(|row| predicate.eval(row)))
    }
}
