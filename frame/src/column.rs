//! FILENAME: frame/src/column.rs
//! PURPOSE: The Column Store - a named, typed, length-fixed value sequence.
//! CONTEXT: Columns own their data through a reference-counted, read-only
//! buffer. Cloning a column, renaming it, or deriving a table shares the
//! buffer; no API hands out a mutable alias to it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cell::{CellValue, Dtype};
use crate::error::FrameError;

/// A named, typed, length-fixed sequence of values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: Arc<Vec<CellValue>>,
    dtype: Dtype,
}

impl Column {
    /// Builds a column, inferring the dtype from the values.
    ///
    /// All-Int columns infer `Int`; numeric columns with at least one
    /// float infer `Float`; uniform text and bool columns infer their
    /// variant. A column of only Missing values infers `Float`, and a
    /// mixed-variant column falls back to `Text` - numeric operations on
    /// it will report `TypeMismatch` when they actually need numbers.
    pub fn from_values(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        let dtype = infer_dtype(&values);
        Column {
            name: name.into(),
            values: Arc::new(values),
            dtype,
        }
    }

    /// Builds a column with an explicit dtype (used by the categorizer,
    /// whose label columns are `Category` rather than plain text).
    pub fn with_dtype(name: impl Into<String>, values: Vec<CellValue>, dtype: Dtype) -> Self {
        Column {
            name: name.into(),
            values: Arc::new(values),
            dtype,
        }
    }

    pub fn from_ints(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self::from_values(name, values.into_iter().map(CellValue::Int).collect())
    }

    pub fn from_floats(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::from_values(name, values.into_iter().map(CellValue::Float).collect())
    }

    pub fn from_texts(name: impl Into<String>, values: Vec<&str>) -> Self {
        Self::from_values(
            name,
            values
                .into_iter()
                .map(|s| CellValue::Text(s.to_string()))
                .collect(),
        )
    }

    pub fn from_bools(name: impl Into<String>, values: Vec<bool>) -> Self {
        Self::from_values(name, values.into_iter().map(CellValue::Bool).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Retrieves the cell at `i`.
    pub fn get(&self, i: usize) -> Result<&CellValue, FrameError> {
        self.values.get(i).ok_or(FrameError::IndexOutOfRange {
            pos: i as i64,
            len: self.values.len(),
        })
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CellValue> {
        self.values.iter()
    }

    /// Pure rename; the backing buffer is shared with the original.
    pub fn with_name(&self, name: impl Into<String>) -> Column {
        Column {
            name: name.into(),
            values: Arc::clone(&self.values),
            dtype: self.dtype,
        }
    }

    /// Numeric view of the whole column, Missing as `None`.
    ///
    /// Fails with `TypeMismatch` unless the dtype is `Int` or `Float`.
    pub fn numeric_values(&self) -> Result<Vec<Option<f64>>, FrameError> {
        match self.dtype {
            Dtype::Int | Dtype::Float => Ok(self.values.iter().map(|v| v.as_f64()).collect()),
            other => Err(FrameError::TypeMismatch(format!(
                "column '{}' has dtype {:?}, a numeric column is required",
                self.name, other
            ))),
        }
    }

    /// Gathers the cells at `positions` into a new column (shared name and
    /// dtype, fresh buffer).
    pub(crate) fn take(&self, positions: &[usize]) -> Column {
        let values = positions
            .iter()
            .map(|&p| self.values[p].clone())
            .collect::<Vec<_>>();
        Column {
            name: self.name.clone(),
            values: Arc::new(values),
            dtype: self.dtype,
        }
    }
}

fn infer_dtype(values: &[CellValue]) -> Dtype {
    let mut saw_int = false;
    let mut saw_float = false;
    let mut saw_text = false;
    let mut saw_bool = false;

    for v in values {
        match v {
            CellValue::Missing => {}
            CellValue::Int(_) => saw_int = true,
            CellValue::Float(_) => saw_float = true,
            CellValue::Text(_) => saw_text = true,
            CellValue::Bool(_) => saw_bool = true,
        }
    }

    match (saw_int, saw_float, saw_text, saw_bool) {
        (_, _, true, false) if !saw_int && !saw_float => Dtype::Text,
        (_, _, false, true) if !saw_int && !saw_float => Dtype::Bool,
        (true, false, false, false) => Dtype::Int,
        (_, true, false, false) | (false, false, false, false) => Dtype::Float,
        _ => Dtype::Text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_inference() {
        assert_eq!(Column::from_ints("a", vec![1, 2]).dtype(), Dtype::Int);
        assert_eq!(Column::from_floats("a", vec![1.0]).dtype(), Dtype::Float);
        assert_eq!(Column::from_texts("a", vec!["x"]).dtype(), Dtype::Text);
        assert_eq!(Column::from_bools("a", vec![true]).dtype(), Dtype::Bool);

        let mixed_numeric = Column::from_values(
            "a",
            vec![CellValue::Int(1), CellValue::Float(2.5), CellValue::Missing],
        );
        assert_eq!(mixed_numeric.dtype(), Dtype::Float);

        let all_missing = Column::from_values("a", vec![CellValue::Missing, CellValue::Missing]);
        assert_eq!(all_missing.dtype(), Dtype::Float);
    }

    #[test]
    fn test_get_out_of_range() {
        let col = Column::from_ints("a", vec![1, 2, 3]);
        assert!(col.get(2).is_ok());
        assert!(matches!(
            col.get(3),
            Err(FrameError::IndexOutOfRange { pos: 3, len: 3 })
        ));
    }

    #[test]
    fn test_with_name_shares_buffer() {
        let col = Column::from_ints("a", vec![1, 2, 3]);
        let renamed = col.with_name("b");
        assert_eq!(renamed.name(), "b");
        assert_eq!(renamed.len(), 3);
        assert!(Arc::ptr_eq(&col.values, &renamed.values));
    }

    #[test]
    fn test_numeric_values_requires_numeric_dtype() {
        let col = Column::from_values(
            "a",
            vec![CellValue::Int(1), CellValue::Missing, CellValue::Int(3)],
        );
        assert_eq!(
            col.numeric_values().unwrap(),
            vec![Some(1.0), None, Some(3.0)]
        );

        let text = Column::from_texts("t", vec!["x"]);
        assert!(matches!(
            text.numeric_values(),
            Err(FrameError::TypeMismatch(_))
        ));
    }
}
