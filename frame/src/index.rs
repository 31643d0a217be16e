//! FILENAME: frame/src/index.rs
//! PURPOSE: Ordered row labels - flat or multi-level.
//! CONTEXT: A MultiIndex is stored arena-style as one tuple of labels per
//! row with a fixed level count. Level lookups are by position within the
//! tuple. Labels need not be unique; operations that require uniqueness
//! (join/pivot keys) enforce it themselves.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::FrameError;

/// A single index label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Int(i64),
    Text(String),
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Int(n) => write!(f, "{}", n),
            Label::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Label {
    fn from(n: i64) -> Self {
        Label::Int(n)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Text(s.to_string())
    }
}

/// One tuple of labels. Most indexes have few levels, so the tuple is
/// inline up to four labels.
pub type LabelTuple = SmallVec<[Label; 4]>;

/// Ordered row labels shared by every column of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Index {
    /// A flat ordered sequence of labels.
    Flat(Vec<Label>),
    /// An ordered sequence of label tuples, one per row, all of the same
    /// fixed level count.
    Multi { levels: usize, tuples: Vec<LabelTuple> },
}

impl Index {
    /// The default positional index `0..n`.
    pub fn default_range(n: usize) -> Index {
        Index::Flat((0..n as i64).map(Label::Int).collect())
    }

    /// Builds a multi-level index, validating that every tuple has the
    /// stated level count.
    pub fn multi(levels: usize, tuples: Vec<LabelTuple>) -> Result<Index, FrameError> {
        if levels == 0 {
            return Err(FrameError::ShapeMismatch(
                "a MultiIndex needs at least one level".to_string(),
            ));
        }
        for (i, t) in tuples.iter().enumerate() {
            if t.len() != levels {
                return Err(FrameError::ShapeMismatch(format!(
                    "index tuple at position {} has {} levels, expected {}",
                    i,
                    t.len(),
                    levels
                )));
            }
        }
        Ok(Index::Multi { levels, tuples })
    }

    pub fn len(&self) -> usize {
        match self {
            Index::Flat(labels) => labels.len(),
            Index::Multi { tuples, .. } => tuples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of label levels (a flat index has exactly one).
    pub fn levels(&self) -> usize {
        match self {
            Index::Flat(_) => 1,
            Index::Multi { levels, .. } => *levels,
        }
    }

    /// The label tuple at `pos` (length 1 for a flat index).
    pub fn label_at(&self, pos: usize) -> Result<&[Label], FrameError> {
        let err = FrameError::IndexOutOfRange {
            pos: pos as i64,
            len: self.len(),
        };
        match self {
            Index::Flat(labels) => labels.get(pos).map(std::slice::from_ref).ok_or(err),
            Index::Multi { tuples, .. } => tuples.get(pos).map(|t| t.as_slice()).ok_or(err),
        }
    }

    /// ALL positions carrying `label`, in ascending order - never an
    /// arbitrary single one. Callers that need uniqueness must check the
    /// cardinality themselves. Fails with `LabelNotFound` if absent.
    pub fn positions_of(&self, label: &[Label]) -> Result<Vec<usize>, FrameError> {
        if label.len() != self.levels() {
            return Err(FrameError::ShapeMismatch(format!(
                "lookup label has {} levels, index has {}",
                label.len(),
                self.levels()
            )));
        }
        let positions: Vec<usize> = (0..self.len())
            .filter(|&p| self.label_at(p).map(|t| t == label).unwrap_or(false))
            .collect();
        if positions.is_empty() {
            let rendered: Vec<String> = label.iter().map(|l| l.to_string()).collect();
            return Err(FrameError::LabelNotFound(rendered.join(", ")));
        }
        Ok(positions)
    }

    /// The flat sequence of labels at level `k`.
    pub fn level(&self, k: usize) -> Result<Vec<Label>, FrameError> {
        if k >= self.levels() {
            return Err(FrameError::IndexOutOfRange {
                pos: k as i64,
                len: self.levels(),
            });
        }
        Ok(match self {
            Index::Flat(labels) => labels.clone(),
            Index::Multi { tuples, .. } => tuples.iter().map(|t| t[k].clone()).collect(),
        })
    }

    /// Positions whose tuple matches every `Some` entry of the partial
    /// tuple. An empty result is not an error.
    pub fn positions_where(&self, partial: &[Option<Label>]) -> Result<Vec<usize>, FrameError> {
        if partial.len() != self.levels() {
            return Err(FrameError::ShapeMismatch(format!(
                "partial tuple has {} levels, index has {}",
                partial.len(),
                self.levels()
            )));
        }
        Ok((0..self.len())
            .filter(|&p| match self.label_at(p) {
                Ok(tuple) => partial
                    .iter()
                    .zip(tuple)
                    .all(|(want, have)| want.as_ref().map(|w| w == have).unwrap_or(true)),
                Err(_) => false,
            })
            .collect())
    }

    /// The subsequence of the index at `positions`.
    pub fn take(&self, positions: &[usize]) -> Result<Index, FrameError> {
        let len = self.len();
        if let Some(&bad) = positions.iter().find(|&&p| p >= len) {
            return Err(FrameError::IndexOutOfRange {
                pos: bad as i64,
                len,
            });
        }
        Ok(match self {
            Index::Flat(labels) => {
                Index::Flat(positions.iter().map(|&p| labels[p].clone()).collect())
            }
            Index::Multi { levels, tuples } => Index::Multi {
                levels: *levels,
                tuples: positions.iter().map(|&p| tuples[p].clone()).collect(),
            },
        })
    }

    /// Concatenates indexes end to end, preserving duplicates. All inputs
    /// must agree on the level count.
    pub fn concat(indexes: &[&Index]) -> Result<Index, FrameError> {
        let first = indexes.first().ok_or_else(|| {
            FrameError::ShapeMismatch("cannot concatenate zero indexes".to_string())
        })?;
        let levels = first.levels();
        if let Some(other) = indexes.iter().find(|ix| ix.levels() != levels) {
            return Err(FrameError::SchemaMismatch(format!(
                "cannot concatenate a {}-level index with a {}-level index",
                levels,
                other.levels()
            )));
        }
        if levels == 1 && indexes.iter().all(|ix| matches!(ix, Index::Flat(_))) {
            let mut labels = Vec::new();
            for ix in indexes {
                if let Index::Flat(ls) = ix {
                    labels.extend(ls.iter().cloned());
                }
            }
            return Ok(Index::Flat(labels));
        }
        let mut tuples: Vec<LabelTuple> = Vec::new();
        for ix in indexes {
            for p in 0..ix.len() {
                tuples.push(ix.label_at(p)?.iter().cloned().collect());
            }
        }
        Index::multi(levels, tuples)
    }
}
