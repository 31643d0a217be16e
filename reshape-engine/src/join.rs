//! FILENAME: reshape-engine/src/join.rs
//! PURPOSE: Key-aligned joining and row-stacking concatenation.
//! CONTEXT: The join key must be unique on the right side; a Missing key
//! component never matches anything, so left joins surface such rows with
//! Missing right-side cells and inner joins drop them.

use frame::{CellValue, Column, FrameError, Index, Table};
use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::key::{group_key, GroupKey};

/// Which rows survive the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    /// Every left row, unmatched right cells filled with Missing.
    Left,
    /// Only rows with a key match on both sides.
    Inner,
}

/// Aligns `left` and `right` rows by equality of the `on` key columns.
///
/// Fails with `AmbiguousJoin` if the right side repeats a key, and with
/// `SchemaMismatch` if a non-key column name exists on both sides. Key
/// columns appear once in the output, taken from the left. The derived
/// row index is the subsequence of the left index at the kept positions.
pub fn join(
    left: &Table,
    right: &Table,
    on: &[&str],
    how: JoinKind,
) -> Result<Table, FrameError> {
    if on.is_empty() {
        return Err(FrameError::ShapeMismatch(
            "join needs at least one key column".to_string(),
        ));
    }
    let left_keys: Vec<&Column> = on
        .iter()
        .map(|k| left.column(k))
        .collect::<Result<_, _>>()?;
    let right_keys: Vec<&Column> = on
        .iter()
        .map(|k| right.column(k))
        .collect::<Result<_, _>>()?;

    let right_payload: Vec<&Column> = right
        .columns()
        .iter()
        .filter(|c| !on.contains(&c.name()))
        .collect();
    for col in &right_payload {
        if left.has_column(col.name()) {
            return Err(FrameError::SchemaMismatch(format!(
                "column '{}' exists on both sides of the join",
                col.name()
            )));
        }
    }

    // The right side must be unique on the key.
    let right_rows = right.shape().0;
    let mut by_key: FxHashMap<GroupKey, usize> = FxHashMap::default();
    for r in 0..right_rows {
        let cells: Vec<&CellValue> = right_keys.iter().map(|c| &c.values()[r]).collect();
        if cells.iter().any(|c| c.is_missing()) {
            continue;
        }
        let key = group_key(&cells);
        if by_key.insert(key, r).is_some() {
            let rendered: Vec<String> = cells.iter().map(|c| c.display_value()).collect();
            return Err(FrameError::AmbiguousJoin(format!(
                "join key ({}) appears more than once on the right",
                rendered.join(", ")
            )));
        }
    }

    let left_rows = left.shape().0;
    let mut kept_left: Vec<usize> = Vec::with_capacity(left_rows);
    let mut matched_right: Vec<Option<usize>> = Vec::with_capacity(left_rows);
    for l in 0..left_rows {
        let cells: Vec<&CellValue> = left_keys.iter().map(|c| &c.values()[l]).collect();
        let hit = if cells.iter().any(|c| c.is_missing()) {
            None
        } else {
            by_key.get(&group_key(&cells)).copied()
        };
        match how {
            JoinKind::Left => {
                kept_left.push(l);
                matched_right.push(hit);
            }
            JoinKind::Inner => {
                if let Some(r) = hit {
                    kept_left.push(l);
                    matched_right.push(Some(r));
                }
            }
        }
    }

    let mut columns: Vec<(String, Vec<CellValue>)> =
        Vec::with_capacity(left.columns().len() + right_payload.len());
    for col in left.columns() {
        let cells = kept_left.iter().map(|&l| col.values()[l].clone()).collect();
        columns.push((col.name().to_string(), cells));
    }
    for col in &right_payload {
        let cells = matched_right
            .iter()
            .map(|hit| match hit {
                Some(r) => col.values()[*r].clone(),
                None => CellValue::Missing,
            })
            .collect();
        columns.push((col.name().to_string(), cells));
    }

    let index = left.row_index().take(&kept_left)?;
    debug!(
        "join: {} left rows, {} kept, {} matched",
        left_rows,
        kept_left.len(),
        matched_right.iter().flatten().count()
    );
    Table::from_columns(columns, Some(index))
}

/// Stacks tables on top of each other.
///
/// All inputs must share the same column NAME SET (`SchemaMismatch`
/// otherwise); the first table's column order wins. Row indexes are
/// concatenated without deduplication, so index values may repeat across
/// segments.
pub fn concat(tables: &[&Table]) -> Result<Table, FrameError> {
    let first = tables.first().ok_or_else(|| {
        FrameError::ShapeMismatch("cannot concatenate zero tables".to_string())
    })?;
    let names = first.column_names();

    for table in &tables[1..] {
        let other = table.column_names();
        let missing: Vec<&str> = names
            .iter()
            .filter(|n| !other.contains(n))
            .copied()
            .collect();
        let extra: Vec<&str> = other
            .iter()
            .filter(|n| !names.contains(n))
            .copied()
            .collect();
        if !missing.is_empty() || !extra.is_empty() {
            return Err(FrameError::SchemaMismatch(format!(
                "column sets differ: missing [{}], unexpected [{}]",
                missing.join(", "),
                extra.join(", ")
            )));
        }
    }

    let mut columns: Vec<(String, Vec<CellValue>)> = Vec::with_capacity(names.len());
    for name in &names {
        let mut cells = Vec::new();
        for table in tables {
            cells.extend(table.column(name)?.values().iter().cloned());
        }
        columns.push((name.to_string(), cells));
    }

    let indexes: Vec<&Index> = tables.iter().map(|t| t.row_index()).collect();
    let index = Index::concat(&indexes)?;

    debug!(
        "concat: {} tables -> {} rows",
        tables.len(),
        index.len()
    );
    Table::from_columns(columns, Some(index))
}
