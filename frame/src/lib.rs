//! FILENAME: frame/src/lib.rs
//! PURPOSE: Main library entry point for the columnar table engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.

pub mod cell;
pub mod column;
pub mod error;
pub mod index;
pub mod select;
pub mod table;

// Re-export commonly used types at the crate root
pub use cell::{CellValue, Dtype};
pub use column::Column;
pub use error::FrameError;
pub use index::{Index, Label, LabelTuple};
pub use select::{ComparisonOperator, Predicate, RowView};
pub use table::{ColumnarSource, Table};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_builds_columns() {
        let col = Column::from_ints("age", vec![17, 19, 21]);
        assert_eq!(col.len(), 3);
        assert_eq!(col.dtype(), Dtype::Int);
    }

    #[test]
    fn integration_test_construct_slice_filter() {
        let table = Table::from_columns(
            vec![
                (
                    "age".to_string(),
                    vec![17, 19, 21, 37, 18, 19, 47, 18, 19]
                        .into_iter()
                        .map(CellValue::Int)
                        .collect(),
                ),
                (
                    "score".to_string(),
                    vec![12, 10, 11, 15, 16, 14, 25, 21, 29]
                        .into_iter()
                        .map(CellValue::Int)
                        .collect(),
                ),
                (
                    "rt".to_string(),
                    vec![3.552, 1.624, 6.431, 7.132, 2.925, 4.662, 3.634, 3.635, 5.234]
                        .into_iter()
                        .map(CellValue::Float)
                        .collect(),
                ),
                (
                    "group".to_string(),
                    vec![
                        "test", "test", "test", "test", "test", "control", "control", "control",
                        "control",
                    ]
                    .into_iter()
                    .map(CellValue::from)
                    .collect(),
                ),
            ],
            None,
        )
        .unwrap();

        assert_eq!(table.shape(), (9, 4));

        // First four participants, half-open slice.
        let first_four = table.slice_positional(0, 4, 1).unwrap();
        assert_eq!(first_four.shape().0, 4);

        // Old and slow, in the control group.
        let old_and_slow_control = table
            .filter_where(
                &Predicate::compare("age", ComparisonOperator::GreaterThan, CellValue::Int(21))
                    .and(Predicate::compare(
                        "rt",
                        ComparisonOperator::GreaterThan,
                        CellValue::Float(3.0),
                    ))
                    .and(Predicate::compare(
                        "group",
                        ComparisonOperator::Equals,
                        CellValue::from("control"),
                    )),
            )
            .unwrap();
        assert_eq!(old_and_slow_control.shape().0, 1);
        assert_eq!(
            old_and_slow_control.column("age").unwrap().values()[0],
            CellValue::Int(47)
        );
    }

    #[test]
    fn integration_test_slice_prefix_length_property() {
        let table = Table::from_columns(
            vec![(
                "x".to_string(),
                (0..7).map(CellValue::Int).collect(),
            )],
            None,
        )
        .unwrap();

        for n in 0..10 {
            let sliced = table.slice_positional(0, n, 1).unwrap();
            assert_eq!(sliced.shape().0, (n as usize).min(table.shape().0));
        }
    }

    #[test]
    fn integration_test_source_mutation_cannot_reach_table() {
        let mut source = vec![CellValue::Int(1), CellValue::Int(2)];
        let table = Table::from_columns(vec![("a".to_string(), source.clone())], None).unwrap();

        source[0] = CellValue::Int(99);
        assert_eq!(table.column("a").unwrap().values()[0], CellValue::Int(1));
    }
}
