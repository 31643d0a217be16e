//! FILENAME: reshape-engine/src/lib.rs
//! Reshape and aggregation operators for the columnar table engine.
//!
//! This crate provides the transformation layer as a standalone module,
//! separate from the core table structure. It depends on `frame` only for
//! shared types (CellValue, Column, Index, Table).
//!
//! Layers:
//! - `categorize`: Cutting continuous columns into discrete bins
//! - `tabulate`: Frequency tables, cross-tabulation, proportions
//! - `reshape`: Wide/long conversions (melt, wide_to_long, pivot)
//! - `join`: Key-aligned joining and concatenation

pub mod categorize;
pub mod join;
mod key;
pub mod reshape;
pub mod tabulate;

pub use categorize::{cut_explicit, cut_fixed_width, qcut, Bin, Category};
pub use join::{concat, join, JoinKind};
pub use reshape::{melt, pivot, transpose, wide_to_long};
pub use tabulate::{crosstab, frequency, normalize, NormalizeAxis};
