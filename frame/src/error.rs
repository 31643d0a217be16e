//! FILENAME: frame/src/error.rs

use thiserror::Error;

/// All failures the engine can report. Every one is a local, synchronous,
/// recoverable error returned to the caller of the specific operation; no
/// operation leaves a table partially constructed.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("index out of range: position {pos} outside [0, {len})")]
    IndexOutOfRange { pos: i64, len: usize },

    #[error("label not found: {0}")]
    LabelNotFound(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("degenerate range: {0}")]
    DegenerateRange(String),

    #[error("label count mismatch: expected {expected} labels for {expected} bins, got {got}")]
    LabelCountMismatch { expected: usize, got: usize },

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("no matching columns for stub '{0}'")]
    NoMatchingColumns(String),

    #[error("inconsistent stub suffixes: {0}")]
    InconsistentStubSuffixes(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("ambiguous join: {0}")]
    AmbiguousJoin(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
}
