//! Hashable cell keys and value interning.
//!
//! Cells are not hashable as-is (floats), so grouping operations normalize
//! them into `CellKey`s. The interner assigns dense ids in first-appearance
//! order and remembers one representative cell per key; every "distinct
//! values of a column" ordering in this crate comes from here, which is
//! what makes frequency/crosstab/pivot output order stable.

use frame::{CellValue, Label};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Wrapper around f64 that implements Eq and Hash for use as a map key.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

/// A normalized, hashable representation of a cell value. Int and Float
/// cells that denote the same number normalize to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum CellKey {
    Missing,
    Number(OrderedFloat),
    Text(String),
    Bool(bool),
}

impl From<&CellValue> for CellKey {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Missing => CellKey::Missing,
            CellValue::Int(n) => CellKey::Number(OrderedFloat(*n as f64)),
            CellValue::Float(f) => CellKey::Number(OrderedFloat(*f)),
            CellValue::Text(s) => CellKey::Text(s.clone()),
            CellValue::Bool(b) => CellKey::Bool(*b),
        }
    }
}

/// A composite key over several cells (group-by / join keys).
pub(crate) type GroupKey = SmallVec<[CellKey; 4]>;

pub(crate) fn group_key(cells: &[&CellValue]) -> GroupKey {
    cells.iter().map(|&c| CellKey::from(c)).collect()
}

/// Index label form of a cell: Int cells keep their integer identity,
/// everything else labels by display form.
pub(crate) fn cell_to_label(cell: &CellValue) -> Label {
    match cell {
        CellValue::Int(n) => Label::Int(*n),
        other => Label::Text(other.display_value()),
    }
}

/// Dense first-appearance interner for cell values.
#[derive(Debug, Default)]
pub(crate) struct ValueInterner {
    by_key: FxHashMap<CellKey, usize>,
    representatives: Vec<CellValue>,
}

impl ValueInterner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Interns a value and returns its dense id. The first cell seen for
    /// a key becomes the representative.
    pub(crate) fn intern(&mut self, value: &CellValue) -> usize {
        let key = CellKey::from(value);
        if let Some(&id) = self.by_key.get(&key) {
            return id;
        }
        let id = self.representatives.len();
        self.representatives.push(value.clone());
        self.by_key.insert(key, id);
        id
    }

    pub(crate) fn len(&self) -> usize {
        self.representatives.len()
    }

    pub(crate) fn get(&self, id: usize) -> &CellValue {
        &self.representatives[id]
    }

    pub(crate) fn representatives(&self) -> &[CellValue] {
        &self.representatives
    }
}
