//! FILENAME: reshape-engine/src/tabulate.rs
//! PURPOSE: The Tabulator - frequency tables, cross-tabulation, proportions.
//! CONTEXT: Distinct values are ordered by FIRST APPEARANCE in the input
//! column; that order is documented and stable across runs. Frequency
//! tables keep a Missing bucket; cross-tabulation drops pairs where
//! either key is Missing.

use frame::{CellValue, Column, FrameError, Index, Label, Table};
use log::{debug, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::key::{cell_to_label, ValueInterner};

/// Which totals to divide by when converting counts to proportions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizeAxis {
    Rows,
    Columns,
    Total,
}

/// Column name used for appended marginal totals.
const MARGIN_LABEL: &str = "All";

/// Builds a frequency table with columns `{value, count}` - one row per
/// distinct observed value, in first-appearance order, including a
/// Missing bucket when the column contains missing values.
pub fn frequency(column: &Column) -> Result<Table, FrameError> {
    let mut interner = ValueInterner::new();
    let mut counts: Vec<i64> = Vec::new();
    for cell in column.iter() {
        let id = interner.intern(cell);
        if id == counts.len() {
            counts.push(0);
        }
        counts[id] += 1;
    }

    debug!(
        "frequency of '{}': {} distinct values over {} cells",
        column.name(),
        interner.len(),
        column.len()
    );

    let values = interner.representatives().to_vec();
    let count_cells = counts.into_iter().map(CellValue::Int).collect();
    Table::from_columns(
        vec![
            ("value".to_string(), values),
            ("count".to_string(), count_cells),
        ],
        None,
    )
}

/// Cross-tabulates two key columns into a grid of co-occurrence counts.
///
/// Rows are the distinct values of `row_key` (carried in the row index),
/// columns the distinct values of `col_key`; both in first-appearance
/// order. Pairs where either key is Missing are not tabulated. With
/// `add_margins`, an `All` column and an `All` row of marginal totals are
/// appended, with the grand total at their intersection.
pub fn crosstab(
    row_key: &Column,
    col_key: &Column,
    add_margins: bool,
) -> Result<Table, FrameError> {
    if row_key.len() != col_key.len() {
        return Err(FrameError::ShapeMismatch(format!(
            "row key '{}' has {} cells, column key '{}' has {}",
            row_key.name(),
            row_key.len(),
            col_key.name(),
            col_key.len()
        )));
    }

    let mut row_cats = ValueInterner::new();
    let mut col_cats = ValueInterner::new();
    let mut counts: FxHashMap<(usize, usize), i64> = FxHashMap::default();

    for (r, c) in row_key.iter().zip(col_key.iter()) {
        if r.is_missing() || c.is_missing() {
            continue;
        }
        let rid = row_cats.intern(r);
        let cid = col_cats.intern(c);
        *counts.entry((rid, cid)).or_insert(0) += 1;
    }

    let n_rows = row_cats.len();
    let n_cols = col_cats.len();
    let mut grid = vec![vec![0i64; n_cols]; n_rows];
    for ((rid, cid), n) in counts {
        grid[rid][cid] = n;
    }

    let row_totals: Vec<i64> = grid.iter().map(|row| row.iter().sum()).collect();
    let col_totals: Vec<i64> = (0..n_cols)
        .map(|c| grid.iter().map(|row| row[c]).sum())
        .collect();
    let grand_total: i64 = row_totals.iter().sum();

    // One output column per distinct column-key value, named by its
    // display form.
    let mut columns: Vec<(String, Vec<CellValue>)> = Vec::with_capacity(n_cols + 1);
    for cid in 0..n_cols {
        let mut cells: Vec<CellValue> = (0..n_rows).map(|rid| CellValue::Int(grid[rid][cid])).collect();
        if add_margins {
            cells.push(CellValue::Int(col_totals[cid]));
        }
        columns.push((col_cats.get(cid).display_value(), cells));
    }
    if add_margins {
        let mut cells: Vec<CellValue> = row_totals.iter().map(|&n| CellValue::Int(n)).collect();
        cells.push(CellValue::Int(grand_total));
        columns.push((MARGIN_LABEL.to_string(), cells));
    }

    let mut labels: Vec<Label> = row_cats
        .representatives()
        .iter()
        .map(cell_to_label)
        .collect();
    if add_margins {
        labels.push(Label::Text(MARGIN_LABEL.to_string()));
    }

    debug!(
        "crosstab: {} x {} categories over {} pairs",
        n_rows,
        n_cols,
        row_key.len()
    );
    Table::from_columns(columns, Some(Index::Flat(labels)))
}

/// Divides every cell of a count grid by its row, column, or grand total,
/// producing proportions.
///
/// The totals are computed from the cells of the given table, so the
/// input is expected to be a margin-free grid. A zero total yields
/// all-Missing cells for the affected row/column/table rather than a
/// division by zero. Missing input cells stay Missing and contribute
/// nothing to totals.
pub fn normalize(table: &Table, axis: NormalizeAxis) -> Result<Table, FrameError> {
    let (n_rows, _) = table.shape();
    let numeric: Vec<Vec<Option<f64>>> = table
        .columns()
        .iter()
        .map(|c| c.numeric_values())
        .collect::<Result<_, _>>()?;

    let row_totals: Vec<f64> = (0..n_rows)
        .map(|r| numeric.iter().filter_map(|col| col[r]).sum())
        .collect();
    let col_totals: Vec<f64> = numeric
        .iter()
        .map(|col| col.iter().flatten().sum())
        .collect();
    let grand_total: f64 = col_totals.iter().sum();

    let columns: Vec<(String, Vec<CellValue>)> = table
        .columns()
        .iter()
        .zip(&numeric)
        .enumerate()
        .map(|(c, (col, values))| {
            let cells = values
                .iter()
                .enumerate()
                .map(|(r, value)| {
                    let total = match axis {
                        NormalizeAxis::Rows => row_totals[r],
                        NormalizeAxis::Columns => col_totals[c],
                        NormalizeAxis::Total => grand_total,
                    };
                    match value {
                        Some(v) if total != 0.0 => CellValue::Float(v / total),
                        Some(_) => {
                            warn!(
                                "zero total while normalizing '{}', producing Missing",
                                col.name()
                            );
                            CellValue::Missing
                        }
                        None => CellValue::Missing,
                    }
                })
                .collect();
            (col.name().to_string(), cells)
        })
        .collect();

    Table::from_columns(columns, Some(table.row_index().clone()))
}
