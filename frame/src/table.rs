//! FILENAME: frame/src/table.rs
//! PURPOSE: The Table - an ordered collection of columns sharing one index.
//! CONTEXT: This file defines the central data structure. A table is never
//! mutated after construction: every operation derives a NEW table, and
//! construction copies the caller's sequences into shared read-only
//! buffers, so mutating a source collection afterwards cannot reach the
//! table.

use std::collections::HashMap;

use log::debug;

use crate::cell::{CellValue, Dtype};
use crate::column::Column;
use crate::error::FrameError;
use crate::index::Index;

/// Any columnar source can be imported into a table. Textual formats
/// (CSV and friends) are an external collaborator's responsibility; the
/// only contract is a rectangular columnar structure.
pub trait ColumnarSource {
    fn names(&self) -> Vec<String>;
    fn column(&self, name: &str) -> Vec<CellValue>;
}

/// An ordered collection of columns sharing one row index.
/// Column names are unique and insertion order is preserved.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
    row_index: Index,
}

impl Table {
    /// Builds a table from `(name, values)` pairs, in order.
    ///
    /// Fails with `ShapeMismatch` if the sequences (or the explicit index)
    /// disagree in length, and `SchemaMismatch` on a duplicate name.
    pub fn from_columns(
        columns: Vec<(String, Vec<CellValue>)>,
        index: Option<Index>,
    ) -> Result<Table, FrameError> {
        let built = columns
            .into_iter()
            .map(|(name, values)| Column::from_values(name, values))
            .collect();
        Self::from_parts(built, index)
    }

    /// Builds a table from already-constructed columns.
    pub fn from_parts(columns: Vec<Column>, index: Option<Index>) -> Result<Table, FrameError> {
        let row_count = columns.first().map(|c| c.len()).unwrap_or(0);
        for col in &columns {
            if col.len() != row_count {
                return Err(FrameError::ShapeMismatch(format!(
                    "column '{}' has {} rows, expected {}",
                    col.name(),
                    col.len(),
                    row_count
                )));
            }
        }

        let row_index = match index {
            Some(ix) => {
                if ix.len() != row_count {
                    return Err(FrameError::ShapeMismatch(format!(
                        "index has {} labels for {} rows",
                        ix.len(),
                        row_count
                    )));
                }
                ix
            }
            None => Index::default_range(row_count),
        };

        let mut by_name = HashMap::with_capacity(columns.len());
        for (pos, col) in columns.iter().enumerate() {
            if by_name.insert(col.name().to_string(), pos).is_some() {
                return Err(FrameError::SchemaMismatch(format!(
                    "duplicate column name '{}'",
                    col.name()
                )));
            }
        }

        Ok(Table {
            columns,
            by_name,
            row_index,
        })
    }

    /// Imports every column of a columnar source, in the source's order.
    pub fn from_source(source: &dyn ColumnarSource) -> Result<Table, FrameError> {
        let columns = source
            .names()
            .into_iter()
            .map(|name| {
                let values = source.column(&name);
                (name, values)
            })
            .collect();
        Self::from_columns(columns, None)
    }

    pub fn row_index(&self) -> &Index {
        &self.row_index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Looks a column up by name.
    pub fn column(&self, name: &str) -> Result<&Column, FrameError> {
        self.by_name
            .get(name)
            .map(|&pos| &self.columns[pos])
            .ok_or_else(|| FrameError::UnknownColumn(name.to_string()))
    }

    /// Positional row access, cells in declared column order.
    pub fn row(&self, pos: usize) -> Result<Vec<CellValue>, FrameError> {
        let (rows, _) = self.shape();
        if pos >= rows {
            return Err(FrameError::IndexOutOfRange {
                pos: pos as i64,
                len: rows,
            });
        }
        Ok(self
            .columns
            .iter()
            .map(|c| c.values()[pos].clone())
            .collect())
    }

    /// `(row_count, col_count)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_index.len(), self.columns.len())
    }

    /// Positional slice over the half-open interval `[start, stop)`.
    ///
    /// Negative indices count from the end and `step` may be negative,
    /// following the usual slicing convention; out-of-range bounds clamp
    /// rather than error. `step == 0` fails with `IndexOutOfRange`.
    pub fn slice_positional(&self, start: i64, stop: i64, step: i64) -> Result<Table, FrameError> {
        let n = self.shape().0 as i64;
        if step == 0 {
            return Err(FrameError::IndexOutOfRange { pos: 0, len: 0 });
        }

        let mut start = if start < 0 { start + n } else { start };
        let mut stop = if stop < 0 { stop + n } else { stop };

        let mut positions = Vec::new();
        if step > 0 {
            start = start.clamp(0, n);
            stop = stop.clamp(0, n);
            let mut i = start;
            while i < stop {
                positions.push(i as usize);
                i += step;
            }
        } else {
            start = start.min(n - 1);
            stop = stop.max(-1);
            let mut i = start;
            while i > stop {
                if i >= 0 {
                    positions.push(i as usize);
                }
                i += step;
            }
        }

        Ok(self.take(&positions))
    }

    /// The first `n` rows, clamped to the table length.
    pub fn head(&self, n: usize) -> Table {
        let keep = n.min(self.shape().0);
        let positions: Vec<usize> = (0..keep).collect();
        self.take(&positions)
    }

    /// The last `n` rows, clamped to the table length.
    pub fn tail(&self, n: usize) -> Table {
        let rows = self.shape().0;
        let keep = n.min(rows);
        let positions: Vec<usize> = (rows - keep..rows).collect();
        self.take(&positions)
    }

    /// Full materialization, one inner sequence per row, columns in
    /// declared order.
    pub fn to_row_major(&self) -> Vec<Vec<CellValue>> {
        let (rows, _) = self.shape();
        (0..rows)
            .map(|r| self.columns.iter().map(|c| c.values()[r].clone()).collect())
            .collect()
    }

    /// Column-major export: `(name, values)` in declared order.
    pub fn to_column_major(&self) -> Vec<(String, Vec<CellValue>)> {
        self.columns
            .iter()
            .map(|c| (c.name().to_string(), c.values().to_vec()))
            .collect()
    }

    /// Derives a table with `values` appended as a new column, or
    /// replacing an existing column of the same name.
    pub fn with_column(
        &self,
        name: impl Into<String>,
        values: Vec<CellValue>,
    ) -> Result<Table, FrameError> {
        let name = name.into();
        let (rows, _) = self.shape();
        if values.len() != rows {
            return Err(FrameError::ShapeMismatch(format!(
                "column '{}' has {} values for {} rows",
                name,
                values.len(),
                rows
            )));
        }
        let mut columns = self.columns.clone();
        let fresh = Column::from_values(name.clone(), values);
        match self.by_name.get(&name) {
            Some(&pos) => columns[pos] = fresh,
            None => columns.push(fresh),
        }
        Self::from_parts(columns, Some(self.row_index.clone()))
    }

    /// Transforms one column cell-by-cell into a derived table.
    pub fn map_column(
        &self,
        name: &str,
        f: impl Fn(&CellValue) -> CellValue,
    ) -> Result<Table, FrameError> {
        let source = self.column(name)?;
        let values = source.values().iter().map(f).collect();
        self.with_column(name, values)
    }

    /// Pure rename of one column.
    pub fn rename_column(&self, old: &str, new: &str) -> Result<Table, FrameError> {
        let pos = *self
            .by_name
            .get(old)
            .ok_or_else(|| FrameError::UnknownColumn(old.to_string()))?;
        if old != new && self.by_name.contains_key(new) {
            return Err(FrameError::SchemaMismatch(format!(
                "duplicate column name '{}'",
                new
            )));
        }
        let mut columns = self.columns.clone();
        columns[pos] = columns[pos].with_name(new);
        Self::from_parts(columns, Some(self.row_index.clone()))
    }

    /// Derives a table without the named column.
    pub fn drop_column(&self, name: &str) -> Result<Table, FrameError> {
        let pos = *self
            .by_name
            .get(name)
            .ok_or_else(|| FrameError::UnknownColumn(name.to_string()))?;
        let mut columns = self.columns.clone();
        columns.remove(pos);
        Self::from_parts(columns, Some(self.row_index.clone()))
    }

    /// Stable multi-key sort. `keys` and `ascending` pair up one to one;
    /// Missing values sort last in either direction, and the row index is
    /// permuted along with the rows.
    pub fn sort_by(&self, keys: &[&str], ascending: &[bool]) -> Result<Table, FrameError> {
        if keys.len() != ascending.len() {
            return Err(FrameError::ShapeMismatch(format!(
                "{} sort keys with {} directions",
                keys.len(),
                ascending.len()
            )));
        }
        let key_columns: Vec<&Column> = keys
            .iter()
            .map(|k| self.column(k))
            .collect::<Result<_, _>>()?;

        let mut positions: Vec<usize> = (0..self.shape().0).collect();
        positions.sort_by(|&a, &b| {
            for (col, &asc) in key_columns.iter().zip(ascending) {
                let (va, vb) = (&col.values()[a], &col.values()[b]);
                let ord = match (va.is_missing(), vb.is_missing()) {
                    (true, true) => std::cmp::Ordering::Equal,
                    (true, false) => std::cmp::Ordering::Greater,
                    (false, true) => std::cmp::Ordering::Less,
                    (false, false) => {
                        if asc {
                            va.total_order(vb)
                        } else {
                            vb.total_order(va)
                        }
                    }
                };
                if ord != std::cmp::Ordering::Equal {
                    return ord;
                }
            }
            std::cmp::Ordering::Equal
        });

        Ok(self.take(&positions))
    }

    /// Gathers the given row positions into a new table; the derived
    /// index is the subsequence of the original at those positions.
    /// Callers pass positions already known to be in range.
    pub(crate) fn take(&self, positions: &[usize]) -> Table {
        let columns: Vec<Column> = self.columns.iter().map(|c| c.take(positions)).collect();
        let index = match &self.row_index {
            Index::Flat(labels) => {
                Index::Flat(positions.iter().map(|&p| labels[p].clone()).collect())
            }
            Index::Multi { levels, tuples } => Index::Multi {
                levels: *levels,
                tuples: positions.iter().map(|&p| tuples[p].clone()).collect(),
            },
        };
        debug!(
            "derived table keeps {} of {} rows",
            positions.len(),
            self.shape().0
        );
        let mut by_name = HashMap::with_capacity(columns.len());
        for (pos, col) in columns.iter().enumerate() {
            by_name.insert(col.name().to_string(), pos);
        }
        Table {
            columns,
            by_name,
            row_index: index,
        }
    }

    /// Returns the dtype of a named column.
    pub fn dtype_of(&self, name: &str) -> Result<Dtype, FrameError> {
        Ok(self.column(name)?.dtype())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Label;

    fn create_test_table() -> Table {
        Table::from_columns(
            vec![
                (
                    "age".to_string(),
                    vec![17, 19, 21, 37, 18].into_iter().map(CellValue::Int).collect(),
                ),
                (
                    "score".to_string(),
                    vec![12, 10, 11, 15, 16].into_iter().map(CellValue::Int).collect(),
                ),
                (
                    "group".to_string(),
                    vec!["test", "test", "test", "control", "control"]
                        .into_iter()
                        .map(CellValue::from)
                        .collect(),
                ),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_construction_checks_shape() {
        let result = Table::from_columns(
            vec![
                ("a".to_string(), vec![CellValue::Int(1)]),
                ("b".to_string(), vec![CellValue::Int(1), CellValue::Int(2)]),
            ],
            None,
        );
        assert!(matches!(result, Err(FrameError::ShapeMismatch(_))));
    }

    #[test]
    fn test_construction_rejects_duplicate_names() {
        let result = Table::from_columns(
            vec![
                ("a".to_string(), vec![CellValue::Int(1)]),
                ("a".to_string(), vec![CellValue::Int(2)]),
            ],
            None,
        );
        assert!(matches!(result, Err(FrameError::SchemaMismatch(_))));
    }

    #[test]
    fn test_construction_copies_input() {
        let source = vec![CellValue::Int(1), CellValue::Int(2)];
        let table = Table::from_columns(vec![("a".to_string(), source.clone())], None).unwrap();
        drop(source);
        assert_eq!(table.column("a").unwrap().values()[1], CellValue::Int(2));
    }

    #[test]
    fn test_column_lookup() {
        let table = create_test_table();
        assert_eq!(table.column("age").unwrap().len(), 5);
        assert!(matches!(
            table.column("nope"),
            Err(FrameError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_row_access() {
        let table = create_test_table();
        let row = table.row(3).unwrap();
        assert_eq!(row[0], CellValue::Int(37));
        assert_eq!(row[2], CellValue::Text("control".to_string()));
        assert!(matches!(
            table.row(5),
            Err(FrameError::IndexOutOfRange { pos: 5, len: 5 })
        ));
    }

    #[test]
    fn test_slice_half_open() {
        let table = create_test_table();
        let slice = table.slice_positional(0, 4, 1).unwrap();
        assert_eq!(slice.shape(), (4, 3));
        // Index is the subsequence of the original.
        assert_eq!(slice.row_index().label_at(3).unwrap(), &[Label::Int(3)]);
    }

    #[test]
    fn test_slice_clamps_to_length() {
        let table = create_test_table();
        assert_eq!(table.slice_positional(0, 99, 1).unwrap().shape().0, 5);
        assert_eq!(table.slice_positional(3, 2, 1).unwrap().shape().0, 0);
    }

    #[test]
    fn test_slice_negative_indices() {
        let table = create_test_table();
        let last_two = table.slice_positional(-2, 5, 1).unwrap();
        assert_eq!(last_two.shape().0, 2);
        assert_eq!(last_two.row(0).unwrap()[0], CellValue::Int(37));
    }

    #[test]
    fn test_slice_negative_step() {
        let table = create_test_table();
        let reversed = table.slice_positional(4, -6, -1).unwrap();
        assert_eq!(reversed.shape().0, 5);
        assert_eq!(reversed.row(0).unwrap()[0], CellValue::Int(18));
        assert_eq!(reversed.row(4).unwrap()[0], CellValue::Int(17));

        let every_second = table.slice_positional(0, 5, 2).unwrap();
        assert_eq!(every_second.shape().0, 3);
    }

    #[test]
    fn test_slice_zero_step_errors() {
        let table = create_test_table();
        assert!(table.slice_positional(0, 5, 0).is_err());
    }

    #[test]
    fn test_head_tail_clamp() {
        let table = create_test_table();
        assert_eq!(table.head(2).shape().0, 2);
        assert_eq!(table.head(99).shape().0, 5);
        assert_eq!(table.tail(2).row(0).unwrap()[0], CellValue::Int(37));
        assert_eq!(table.tail(99).shape().0, 5);
    }

    #[test]
    fn test_row_major_export() {
        let table = create_test_table();
        let rows = table.to_row_major();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1][1], CellValue::Int(10));
    }

    #[test]
    fn test_with_column_append_and_replace() {
        let table = create_test_table();
        let with_rt = table
            .with_column(
                "rt",
                vec![3.5, 1.6, 6.4, 7.1, 2.9]
                    .into_iter()
                    .map(CellValue::Float)
                    .collect(),
            )
            .unwrap();
        assert_eq!(with_rt.shape(), (5, 4));
        assert_eq!(with_rt.column_names()[3], "rt");

        // Replacement keeps the column position.
        let replaced = with_rt
            .with_column("age", vec![CellValue::Missing; 5])
            .unwrap();
        assert_eq!(replaced.column_names()[0], "age");
        assert!(replaced.column("age").unwrap().values()[0].is_missing());
    }

    #[test]
    fn test_map_column_recode() {
        let table = Table::from_columns(
            vec![(
                "scores".to_string(),
                vec![1, 7, 3, 4, 5].into_iter().map(CellValue::Int).collect(),
            )],
            None,
        )
        .unwrap();
        // Center the scale at its midpoint.
        let centered = table
            .map_column("scores", |v| match v {
                CellValue::Int(n) => CellValue::Int(n - 4),
                other => other.clone(),
            })
            .unwrap();
        assert_eq!(centered.column("scores").unwrap().values()[0], CellValue::Int(-3));
    }

    #[test]
    fn test_rename_and_drop() {
        let table = create_test_table();
        let renamed = table.rename_column("group", "condition").unwrap();
        assert!(renamed.has_column("condition"));
        assert!(!renamed.has_column("group"));
        assert!(matches!(
            renamed.rename_column("condition", "age"),
            Err(FrameError::SchemaMismatch(_))
        ));

        let dropped = table.drop_column("score").unwrap();
        assert_eq!(dropped.shape(), (5, 2));
    }

    #[test]
    fn test_sort_by_stable_multi_key() {
        let table = Table::from_columns(
            vec![
                (
                    "age".to_string(),
                    vec![19, 17, 19, 18].into_iter().map(CellValue::Int).collect(),
                ),
                (
                    "score".to_string(),
                    vec![10, 12, 9, 16].into_iter().map(CellValue::Int).collect(),
                ),
            ],
            None,
        )
        .unwrap();

        let sorted = table.sort_by(&["age", "score"], &[true, true]).unwrap();
        let ages: Vec<CellValue> = sorted.column("age").unwrap().values().to_vec();
        assert_eq!(
            ages,
            vec![
                CellValue::Int(17),
                CellValue::Int(18),
                CellValue::Int(19),
                CellValue::Int(19)
            ]
        );
        // Within equal ages, the secondary key decides.
        assert_eq!(sorted.column("score").unwrap().values()[2], CellValue::Int(9));
        // The index rides along with the rows.
        assert_eq!(sorted.row_index().label_at(0).unwrap(), &[Label::Int(1)]);
    }

    #[test]
    fn test_sort_missing_last_both_directions() {
        let table = Table::from_columns(
            vec![(
                "x".to_string(),
                vec![
                    CellValue::Int(2),
                    CellValue::Missing,
                    CellValue::Int(1),
                ],
            )],
            None,
        )
        .unwrap();

        for asc in [true, false] {
            let sorted = table.sort_by(&["x"], &[asc]).unwrap();
            assert!(sorted.column("x").unwrap().values()[2].is_missing());
        }
    }

    #[test]
    fn test_from_source() {
        struct Fixed;
        impl ColumnarSource for Fixed {
            fn names(&self) -> Vec<String> {
                vec!["a".to_string(), "b".to_string()]
            }
            fn column(&self, name: &str) -> Vec<CellValue> {
                match name {
                    "a" => vec![CellValue::Int(1), CellValue::Int(2)],
                    _ => vec![CellValue::from("x"), CellValue::from("y")],
                }
            }
        }

        let table = Table::from_source(&Fixed).unwrap();
        assert_eq!(table.shape(), (2, 2));
        assert_eq!(table.column_names(), vec!["a", "b"]);
    }
}
