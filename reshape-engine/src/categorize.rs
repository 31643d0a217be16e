//! FILENAME: reshape-engine/src/categorize.rs
//! PURPOSE: The Categorizer - cuts continuous columns into discrete bins.
//! CONTEXT: Three cutting strategies share one edge policy: every upper
//! bound is inclusive and only the FIRST bin's lower bound is inclusive,
//! so interior boundaries belong to exactly one bin. Values that fall
//! outside every bin become Missing, never an error.

use frame::{CellValue, Column, Dtype, FrameError};
use log::warn;
use serde::{Deserialize, Serialize};

/// One interval of a categorization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub lower_inclusive: bool,
    pub upper_inclusive: bool,
    pub label: String,
}

impl Bin {
    fn contains(&self, v: f64) -> bool {
        let above = if self.lower_inclusive {
            v >= self.lower
        } else {
            v > self.lower
        };
        let below = if self.upper_inclusive {
            v <= self.upper
        } else {
            v < self.upper
        };
        above && below
    }
}

/// The result of cutting a column: the ordered bin set plus the derived
/// label for every input cell.
#[derive(Debug, Clone)]
pub struct Category {
    bins: Vec<Bin>,
    labels: Vec<CellValue>,
}

impl Category {
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn labels(&self) -> &[CellValue] {
        &self.labels
    }

    /// Materializes the labels as a `Category`-dtype column.
    pub fn into_column(self, name: impl Into<String>) -> Column {
        Column::with_dtype(name, self.labels, Dtype::Category)
    }
}

/// Cuts a numeric column into `bin_count` equal-width bins spanning
/// `[min, max]` of its non-missing values.
///
/// Fails with `DegenerateRange` if `min == max` while more than one bin
/// was requested (or if no bins were requested at all), and with
/// `InsufficientData` when there is no non-missing value to span.
pub fn cut_fixed_width(column: &Column, bin_count: usize) -> Result<Category, FrameError> {
    let numeric = column.numeric_values()?;
    if bin_count == 0 {
        return Err(FrameError::DegenerateRange(
            "bin count must be at least 1".to_string(),
        ));
    }

    let observed: Vec<f64> = numeric.iter().flatten().copied().collect();
    if observed.is_empty() {
        return Err(FrameError::InsufficientData(format!(
            "column '{}' has no non-missing values to bin",
            column.name()
        )));
    }
    let min = observed.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = observed.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if min == max && bin_count > 1 {
        return Err(FrameError::DegenerateRange(format!(
            "column '{}' spans the single value {}, cannot cut into {} bins",
            column.name(),
            min,
            bin_count
        )));
    }

    // A constant column can still be cut into one bin that is the point
    // interval itself.
    if min == max {
        let bins = vec![Bin {
            lower: min,
            upper: max,
            lower_inclusive: true,
            upper_inclusive: true,
            label: format!("[{}, {}]", fmt_edge(min), fmt_edge(max)),
        }];
        return Ok(assign(&numeric, bins));
    }

    let width = (max - min) / bin_count as f64;
    let edges: Vec<f64> = (0..=bin_count)
        .map(|i| {
            if i == bin_count {
                max
            } else {
                min + width * i as f64
            }
        })
        .collect();

    let bins = build_bins(&edges, None)?;
    Ok(assign(&numeric, bins))
}

/// Cuts a numeric column at explicitly given edges.
///
/// `edges` must be strictly increasing with at least two entries
/// (`DegenerateRange` otherwise). When `labels` is given its length must
/// be `edges.len() - 1` (`LabelCountMismatch`). Values outside
/// `[edges.first(), edges.last()]` map to Missing.
pub fn cut_explicit(
    column: &Column,
    edges: &[f64],
    labels: Option<Vec<String>>,
) -> Result<Category, FrameError> {
    let numeric = column.numeric_values()?;
    let bins = build_bins(edges, labels)?;
    let category = assign(&numeric, bins);

    let out_of_range = category
        .labels
        .iter()
        .zip(&numeric)
        .filter(|(label, value)| label.is_missing() && value.is_some())
        .count();
    if out_of_range > 0 {
        warn!(
            "{} values of column '{}' fall outside the given edges",
            out_of_range,
            column.name()
        );
    }
    Ok(category)
}

/// Cuts a numeric column at its own sample quantiles.
///
/// `quantiles` are probabilities in `[0, 1]`, strictly increasing.
/// Quantiles interpolate linearly between order statistics; the resulting
/// edges delegate to [`cut_explicit`], so a tie at an interior boundary
/// lands in the lower bin (upper bounds are inclusive). Fails with
/// `InsufficientData` when fewer than two non-missing values exist.
pub fn qcut(
    column: &Column,
    quantiles: &[f64],
    labels: Option<Vec<String>>,
) -> Result<Category, FrameError> {
    let numeric = column.numeric_values()?;
    let mut observed: Vec<f64> = numeric.iter().flatten().copied().collect();
    if observed.len() < 2 {
        return Err(FrameError::InsufficientData(format!(
            "column '{}' has {} non-missing values, quantile cutting needs at least 2",
            column.name(),
            observed.len()
        )));
    }
    if quantiles.len() < 2 {
        return Err(FrameError::DegenerateRange(
            "at least two quantile probabilities are required".to_string(),
        ));
    }
    for pair in quantiles.windows(2) {
        if pair[1] <= pair[0] {
            return Err(FrameError::DegenerateRange(format!(
                "quantile probabilities must be strictly increasing, got {} after {}",
                pair[1], pair[0]
            )));
        }
    }
    if quantiles[0] < 0.0 || quantiles[quantiles.len() - 1] > 1.0 {
        return Err(FrameError::DegenerateRange(
            "quantile probabilities must lie in [0, 1]".to_string(),
        ));
    }

    observed.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let edges: Vec<f64> = quantiles.iter().map(|&q| sample_quantile(&observed, q)).collect();

    cut_explicit(column, &edges, labels)
}

/// Linear interpolation between order statistics at probability `q`.
fn sample_quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

fn build_bins(edges: &[f64], labels: Option<Vec<String>>) -> Result<Vec<Bin>, FrameError> {
    if edges.len() < 2 {
        return Err(FrameError::DegenerateRange(format!(
            "{} edges cannot delimit a bin",
            edges.len()
        )));
    }
    for pair in edges.windows(2) {
        if pair[1] <= pair[0] {
            return Err(FrameError::DegenerateRange(format!(
                "edges must be strictly increasing, got {} after {}",
                pair[1], pair[0]
            )));
        }
    }
    let bin_count = edges.len() - 1;
    if let Some(ref given) = labels {
        if given.len() != bin_count {
            return Err(FrameError::LabelCountMismatch {
                expected: bin_count,
                got: given.len(),
            });
        }
    }

    Ok((0..bin_count)
        .map(|i| {
            let lower = edges[i];
            let upper = edges[i + 1];
            let lower_inclusive = i == 0;
            let label = match labels {
                Some(ref given) => given[i].clone(),
                None => {
                    let open = if lower_inclusive { '[' } else { '(' };
                    format!("{}{}, {}]", open, fmt_edge(lower), fmt_edge(upper))
                }
            };
            Bin {
                lower,
                upper,
                lower_inclusive,
                upper_inclusive: true,
                label,
            }
        })
        .collect())
}

fn fmt_edge(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}

/// Maps every numeric view onto its bin label; Missing and out-of-range
/// values stay Missing.
fn assign(numeric: &[Option<f64>], bins: Vec<Bin>) -> Category {
    let labels = numeric
        .iter()
        .map(|value| match value {
            Some(v) => bins
                .iter()
                .find(|b| b.contains(*v))
                .map(|b| CellValue::Text(b.label.clone()))
                .unwrap_or(CellValue::Missing),
            None => CellValue::Missing,
        })
        .collect();
    Category { bins, labels }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ages() -> Column {
        Column::from_ints("age", vec![60, 58, 24, 26, 34, 42, 31, 30, 33, 2, 9])
    }

    #[test]
    fn test_cut_explicit_with_labels() {
        let labels = vec!["young".to_string(), "adult".to_string(), "older".to_string()];
        let category = cut_explicit(&ages(), &[0.0, 20.0, 40.0, 60.0], Some(labels)).unwrap();

        assert_eq!(category.bins().len(), 3);
        assert_eq!(category.labels()[0], CellValue::from("older")); // 60
        assert_eq!(category.labels()[2], CellValue::from("adult")); // 24
        assert_eq!(category.labels()[9], CellValue::from("young")); // 2
    }

    #[test]
    fn test_cut_explicit_boundary_goes_to_lower_bin() {
        let col = Column::from_ints("x", vec![0, 20, 21, 40]);
        let category = cut_explicit(
            &col,
            &[0.0, 20.0, 40.0],
            Some(vec!["lo".to_string(), "hi".to_string()]),
        )
        .unwrap();
        // 0 is in the first bin (its lower bound is inclusive), 20 lands
        // in the lower of the two bins that share the edge.
        assert_eq!(category.labels()[0], CellValue::from("lo"));
        assert_eq!(category.labels()[1], CellValue::from("lo"));
        assert_eq!(category.labels()[2], CellValue::from("hi"));
        assert_eq!(category.labels()[3], CellValue::from("hi"));
    }

    #[test]
    fn test_cut_explicit_out_of_range_is_missing() {
        let col = Column::from_ints("x", vec![-5, 10, 99]);
        let category = cut_explicit(&col, &[0.0, 20.0], None).unwrap();
        assert!(category.labels()[0].is_missing());
        assert!(!category.labels()[1].is_missing());
        assert!(category.labels()[2].is_missing());
    }

    #[test]
    fn test_cut_explicit_label_count_mismatch() {
        let result = cut_explicit(&ages(), &[0.0, 20.0, 40.0], Some(vec!["one".to_string()]));
        assert!(matches!(
            result,
            Err(FrameError::LabelCountMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_cut_explicit_requires_increasing_edges() {
        assert!(matches!(
            cut_explicit(&ages(), &[0.0, 40.0, 20.0], None),
            Err(FrameError::DegenerateRange(_))
        ));
        assert!(matches!(
            cut_explicit(&ages(), &[0.0], None),
            Err(FrameError::DegenerateRange(_))
        ));
    }

    #[test]
    fn test_cut_fixed_width_bin_count_and_coverage() {
        let category = cut_fixed_width(&ages(), 3).unwrap();
        assert_eq!(category.bins().len(), 3);
        // Every input value maps to exactly one bin.
        assert!(category.labels().iter().all(|l| !l.is_missing()));

        let distinct: std::collections::HashSet<String> = category
            .labels()
            .iter()
            .map(|l| l.display_value())
            .collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn test_cut_fixed_width_degenerate_range() {
        let flat = Column::from_ints("x", vec![5, 5, 5]);
        assert!(matches!(
            cut_fixed_width(&flat, 3),
            Err(FrameError::DegenerateRange(_))
        ));
        // A single bin over a single value is fine.
        let single = cut_fixed_width(&flat, 1).unwrap();
        assert!(single.labels().iter().all(|l| !l.is_missing()));
    }

    #[test]
    fn test_cut_requires_numeric_column() {
        let text = Column::from_texts("t", vec!["a", "b"]);
        assert!(matches!(
            cut_fixed_width(&text, 2),
            Err(FrameError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_qcut_median_split() {
        let col = Column::from_ints("x", (1..=10).collect());
        let category = qcut(&col, &[0.0, 0.5, 1.0], None).unwrap();
        assert_eq!(category.bins().len(), 2);

        let first_label = category.bins()[0].label.clone();
        let in_first = category
            .labels()
            .iter()
            .filter(|l| l.display_value() == first_label)
            .count();
        assert_eq!(in_first, 5);
        assert!(category.labels().iter().all(|l| !l.is_missing()));
    }

    #[test]
    fn test_qcut_uneven_probabilities() {
        let col = ages();
        let category = qcut(&col, &[0.0, 0.33, 0.66, 1.0], None).unwrap();
        assert_eq!(category.bins().len(), 3);
        // All eleven ages fall inside the quantile range.
        assert!(category.labels().iter().all(|l| !l.is_missing()));
    }

    #[test]
    fn test_qcut_insufficient_data() {
        let col = Column::from_values("x", vec![CellValue::Int(1), CellValue::Missing]);
        assert!(matches!(
            qcut(&col, &[0.0, 0.5, 1.0], None),
            Err(FrameError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_missing_values_stay_missing() {
        let col = Column::from_values(
            "x",
            vec![CellValue::Int(1), CellValue::Missing, CellValue::Int(9)],
        );
        let category = cut_fixed_width(&col, 2).unwrap();
        assert!(!category.labels()[0].is_missing());
        assert!(category.labels()[1].is_missing());
    }
}
