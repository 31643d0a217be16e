//! FILENAME: frame/src/cell.rs
//! PURPOSE: Defines the fundamental value types stored in a column.
//! CONTEXT: This file contains the `CellValue` enum and the `Dtype` tag.
//! A cell is a closed tagged union; `Missing` is a first-class value, so
//! every column is missing-capable without wrapping values in Option.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The column types the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dtype {
    Int,
    Float,
    Text,
    Bool,
    /// Labels drawn from an ordered, finite set of bins.
    Category,
}

/// A single observed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Numeric view of the cell. `Int` widens to `f64`; non-numeric
    /// variants and `Missing` have no numeric view.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(n) => Some(*n as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Comparison used by predicates. Returns `None` whenever either side
    /// is `Missing` or the variants are not comparable; callers must treat
    /// `None` as "predicate false". `Int` and `Float` compare numerically.
    pub fn compare(&self, other: &CellValue) -> Option<Ordering> {
        match (self, other) {
            (CellValue::Missing, _) | (_, CellValue::Missing) => None,
            (CellValue::Text(a), CellValue::Text(b)) => Some(a.cmp(b)),
            (CellValue::Bool(a), CellValue::Bool(b)) => Some(a.cmp(b)),
            (a, b) => {
                let (x, y) = (a.as_f64()?, b.as_f64()?);
                x.partial_cmp(&y)
            }
        }
    }

    /// Total order used only for sorting. `Missing` sorts last; across
    /// variants the order is numeric < text < bool; NaN sorts after every
    /// other number.
    pub fn total_order(&self, other: &CellValue) -> Ordering {
        fn rank(v: &CellValue) -> u8 {
            match v {
                CellValue::Int(_) | CellValue::Float(_) => 0,
                CellValue::Text(_) => 1,
                CellValue::Bool(_) => 2,
                CellValue::Missing => 3,
            }
        }

        match (self, other) {
            (CellValue::Missing, CellValue::Missing) => Ordering::Equal,
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (a, b) if rank(a) == 0 && rank(b) == 0 => {
                let (x, y) = (a.as_f64().unwrap_or(f64::NAN), b.as_f64().unwrap_or(f64::NAN));
                match (x.is_nan(), y.is_nan()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                }
            }
            (a, b) => rank(a).cmp(&rank(b)),
        }
    }

    /// Returns the display value of the cell as a String. Whole numbers
    /// render without a decimal point, booleans as TRUE/FALSE.
    pub fn display_value(&self) -> String {
        match self {
            CellValue::Missing => String::new(),
            CellValue::Int(n) => format!("{}", n),
            CellValue::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{:.0}", f)
                } else {
                    format!("{}", f)
                }
            }
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => {
                if *b { "TRUE" } else { "FALSE" }.to_string()
            }
        }
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Int(n)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}
