//! FILENAME: reshape-engine/src/reshape.rs
//! PURPOSE: The Reshaper - wide/long conversions and transposition.
//! CONTEXT: melt unpivots every non-id column, wide_to_long unpivots
//! families of stub-prefixed columns, pivot is their inverse. None of
//! them aggregates: pivot refuses ambiguous input instead of summing it.

use frame::{CellValue, Column, FrameError, Index, Label, LabelTuple, Table};
use log::debug;
use regex::Regex;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::key::{cell_to_label, group_key, GroupKey, ValueInterner};

/// Unpivots every non-id column into `(variable, value)` pairs.
///
/// Output columns are `id..., variable, value` with one row per
/// (original row, non-id column) pair, `rows x (cols - ids)` rows in
/// total. Rows come out variable-major: all original rows of the first
/// non-id column, then the next. The output gets a fresh positional
/// index.
pub fn melt(table: &Table, id_columns: &[&str]) -> Result<Table, FrameError> {
    let ids = resolve_unique(table, id_columns)?;
    let value_cols: Vec<&Column> = table
        .columns()
        .iter()
        .filter(|c| !ids.iter().any(|id| *id == c.name()))
        .collect();

    let (rows, _) = table.shape();
    let out_len = rows * value_cols.len();
    let mut out: Vec<(String, Vec<CellValue>)> = Vec::with_capacity(ids.len() + 2);

    for id in &ids {
        let src = table.column(id)?;
        let mut cells = Vec::with_capacity(out_len);
        for _ in &value_cols {
            cells.extend(src.values().iter().cloned());
        }
        out.push((id.to_string(), cells));
    }

    let mut variable = Vec::with_capacity(out_len);
    let mut value = Vec::with_capacity(out_len);
    for col in &value_cols {
        variable.extend(
            std::iter::repeat(CellValue::Text(col.name().to_string())).take(rows),
        );
        value.extend(col.values().iter().cloned());
    }
    out.push(("variable".to_string(), variable));
    out.push(("value".to_string(), value));

    debug!("melt: {} rows -> {} rows", rows, out_len);
    Table::from_columns(out, None)
}

/// Unpivots families of `stub + separator + suffix` columns, one output
/// row per (original row, suffix).
///
/// Suffixes must fully match `suffix_pattern` (a regular expression).
/// Every stub must observe the identical suffix set; the first stub's
/// first-seen order becomes the output order. Output columns are
/// `id..., label_column, stub...`, and the row index is a MultiIndex of
/// `(id values..., suffix)`.
pub fn wide_to_long(
    table: &Table,
    stub_names: &[&str],
    id_columns: &[&str],
    label_column: &str,
    separator: &str,
    suffix_pattern: &str,
) -> Result<Table, FrameError> {
    let ids = resolve_unique(table, id_columns)?;
    if stub_names.is_empty() {
        return Err(FrameError::ShapeMismatch(
            "wide_to_long needs at least one stub name".to_string(),
        ));
    }
    let re = Regex::new(&format!("^(?:{})$", suffix_pattern)).map_err(|e| {
        FrameError::SchemaMismatch(format!(
            "invalid suffix pattern '{}': {}",
            suffix_pattern, e
        ))
    })?;

    // Scan each stub's column family in declared column order.
    let mut families: Vec<Vec<(String, &Column)>> = Vec::with_capacity(stub_names.len());
    for stub in stub_names {
        let prefix = format!("{}{}", stub, separator);
        let mut found: Vec<(String, &Column)> = Vec::new();
        for col in table.columns() {
            if let Some(suffix) = col.name().strip_prefix(&prefix) {
                if re.is_match(suffix) {
                    found.push((suffix.to_string(), col));
                }
            }
        }
        if found.is_empty() {
            return Err(FrameError::NoMatchingColumns(stub.to_string()));
        }
        families.push(found);
    }

    let canonical: Vec<String> = families[0].iter().map(|(s, _)| s.clone()).collect();
    for (stub, family) in stub_names.iter().zip(&families) {
        let mut expected: Vec<&String> = canonical.iter().collect();
        let mut observed: Vec<&String> = family.iter().map(|(s, _)| s).collect();
        expected.sort();
        observed.sort();
        if expected != observed {
            return Err(FrameError::InconsistentStubSuffixes(format!(
                "stub '{}' observes [{}], the first stub observes [{}]",
                stub,
                observed
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                expected
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
    }

    let lookups: Vec<FxHashMap<&str, &Column>> = families
        .iter()
        .map(|family| {
            family
                .iter()
                .map(|(s, col)| (s.as_str(), *col))
                .collect()
        })
        .collect();

    let rows = table.shape().0;
    let n_suffix = canonical.len();
    let out_len = rows * n_suffix;

    let mut out: Vec<(String, Vec<CellValue>)> =
        Vec::with_capacity(ids.len() + 1 + stub_names.len());

    let id_cols: Vec<&Column> = ids
        .iter()
        .map(|id| table.column(id))
        .collect::<Result<_, _>>()?;
    for (id, src) in ids.iter().zip(&id_cols) {
        let mut cells = Vec::with_capacity(out_len);
        for r in 0..rows {
            for _ in 0..n_suffix {
                cells.push(src.values()[r].clone());
            }
        }
        out.push((id.to_string(), cells));
    }

    let mut label_cells = Vec::with_capacity(out_len);
    for _ in 0..rows {
        for suffix in &canonical {
            label_cells.push(CellValue::Text(suffix.clone()));
        }
    }
    out.push((label_column.to_string(), label_cells));

    for (stub, lookup) in stub_names.iter().zip(&lookups) {
        let mut cells = Vec::with_capacity(out_len);
        for r in 0..rows {
            for suffix in &canonical {
                let col = lookup.get(suffix.as_str()).ok_or_else(|| {
                    FrameError::InconsistentStubSuffixes(format!(
                        "stub '{}' lost suffix '{}'",
                        stub, suffix
                    ))
                })?;
                cells.push(col.values()[r].clone());
            }
        }
        out.push((stub.to_string(), cells));
    }

    // The index mirrors the unpivoted identity: one level per id column
    // plus the suffix level.
    let levels = ids.len() + 1;
    let mut tuples: Vec<LabelTuple> = Vec::with_capacity(out_len);
    for r in 0..rows {
        for suffix in &canonical {
            let mut tuple: LabelTuple = SmallVec::with_capacity(levels);
            for src in &id_cols {
                tuple.push(cell_to_label(&src.values()[r]));
            }
            tuple.push(Label::Text(suffix.clone()));
            tuples.push(tuple);
        }
    }
    let index = Index::multi(levels, tuples)?;

    debug!(
        "wide_to_long: {} rows x {} suffixes -> {} rows",
        rows, n_suffix, out_len
    );
    Table::from_columns(out, Some(index))
}

/// Reconstructs wide columns from long rows - the inverse of melt and
/// wide_to_long.
///
/// Rows are grouped by the index columns (first-appearance order); each
/// distinct value of `columns_column` becomes one output column per value
/// column. With a single value column the new columns take the bare
/// label name, with several they take `value_label`. A second input row
/// for the same (index, column) combination fails with `DuplicateKey`;
/// combinations never observed fill with Missing.
pub fn pivot(
    table: &Table,
    index_columns: &[&str],
    columns_column: &str,
    value_columns: &[&str],
) -> Result<Table, FrameError> {
    let idx_names = resolve_unique(table, index_columns)?;
    if idx_names.is_empty() {
        return Err(FrameError::ShapeMismatch(
            "pivot needs at least one index column".to_string(),
        ));
    }
    let label_col = table.column(columns_column)?;
    let value_cols: Vec<&Column> = value_columns
        .iter()
        .map(|v| table.column(v))
        .collect::<Result<_, _>>()?;
    if value_cols.is_empty() {
        return Err(FrameError::ShapeMismatch(
            "pivot needs at least one value column".to_string(),
        ));
    }

    let idx_cols: Vec<&Column> = idx_names
        .iter()
        .map(|id| table.column(id))
        .collect::<Result<_, _>>()?;

    let rows = table.shape().0;
    let mut group_ids: FxHashMap<GroupKey, usize> = FxHashMap::default();
    let mut group_reps: Vec<Vec<CellValue>> = Vec::new();
    let mut labels = ValueInterner::new();
    let mut filled: FxHashMap<(usize, usize), Vec<CellValue>> = FxHashMap::default();

    for r in 0..rows {
        let key_cells: Vec<&CellValue> = idx_cols.iter().map(|c| &c.values()[r]).collect();
        let key = group_key(&key_cells);
        let gid = match group_ids.get(&key) {
            Some(&gid) => gid,
            None => {
                let gid = group_reps.len();
                group_reps.push(key_cells.iter().map(|&c| c.clone()).collect());
                group_ids.insert(key, gid);
                gid
            }
        };

        let label_cell = &label_col.values()[r];
        if label_cell.is_missing() {
            continue;
        }
        let lid = labels.intern(label_cell);

        let cells: Vec<CellValue> = value_cols.iter().map(|c| c.values()[r].clone()).collect();
        if filled.insert((gid, lid), cells).is_some() {
            let rendered: Vec<String> = group_reps[gid]
                .iter()
                .map(|c| c.display_value())
                .collect();
            return Err(FrameError::DuplicateKey(format!(
                "more than one row for index ({}) and column '{}'",
                rendered.join(", "),
                label_cell.display_value()
            )));
        }
    }

    let n_groups = group_reps.len();
    let mut out: Vec<(String, Vec<CellValue>)> =
        Vec::with_capacity(idx_names.len() + labels.len() * value_cols.len());

    for (i, id) in idx_names.iter().enumerate() {
        let cells = group_reps.iter().map(|rep| rep[i].clone()).collect();
        out.push((id.to_string(), cells));
    }

    for (v, value_name) in value_columns.iter().enumerate() {
        for lid in 0..labels.len() {
            let label_text = labels.get(lid).display_value();
            let name = if value_columns.len() == 1 {
                label_text
            } else {
                format!("{}_{}", value_name, label_text)
            };
            let cells = (0..n_groups)
                .map(|gid| {
                    filled
                        .get(&(gid, lid))
                        .map(|cells| cells[v].clone())
                        .unwrap_or(CellValue::Missing)
                })
                .collect();
            out.push((name, cells));
        }
    }

    debug!(
        "pivot: {} rows -> {} groups x {} labels",
        rows,
        n_groups,
        labels.len()
    );
    Table::from_columns(out, None)
}

/// Flips a table: rows become columns and columns become rows.
///
/// New column names are the display forms of the old row-index labels
/// (multi-level labels join with '_'), and the new row index carries the
/// old column names.
pub fn transpose(table: &Table) -> Result<Table, FrameError> {
    let (rows, _) = table.shape();
    let mut out: Vec<(String, Vec<CellValue>)> = Vec::with_capacity(rows);
    for r in 0..rows {
        let tuple = table.row_index().label_at(r)?;
        let name = tuple
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join("_");
        out.push((name, table.row(r)?));
    }
    let index = Index::Flat(
        table
            .column_names()
            .into_iter()
            .map(|n| Label::Text(n.to_string()))
            .collect(),
    );
    Table::from_columns(out, Some(index))
}

/// Validates the named columns exist and drops repeated mentions,
/// keeping the caller's order.
fn resolve_unique<'a>(table: &Table, names: &[&'a str]) -> Result<Vec<&'a str>, FrameError> {
    let mut seen = Vec::new();
    for &name in names {
        if !table.has_column(name) {
            return Err(FrameError::UnknownColumn(name.to_string()));
        }
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    Ok(seen)
}
