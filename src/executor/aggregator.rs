//! Streaming grouped aggregation.
//!
//! An [`Aggregator`] folds input tuples into per-group state one at a time,
//! then emits one result tuple per group through a [`TupleIterator`].
//! Grouping is optional: with no group-by field, all input falls into a
//! single group and the output is a single tuple.
//!
//! Group keys are the group-by field values themselves ([`Field`] is
//! hashable), so integer and string groups share one container and the
//! output group column is the key verbatim.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::ExecError;
use super::tuple_iterator::TupleIterator;
use crate::datum::{Field, Type};
use crate::tuple::{Tuple, TupleDesc};

/// The aggregate operations.
///
/// `SumCount` and `ScAvg` exist for rollup plans that pre-aggregate partial
/// results: `SumCount` emits both the sum and the count, and `ScAvg` divides
/// a sum by counts accumulated from a secondary input column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
    SumCount,
    ScAvg,
}

impl fmt::Display for AggOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggOp::Min => write!(f, "MIN"),
            AggOp::Max => write!(f, "MAX"),
            AggOp::Sum => write!(f, "SUM"),
            AggOp::Avg => write!(f, "AVG"),
            AggOp::Count => write!(f, "COUNT"),
            AggOp::SumCount => write!(f, "SUM_COUNT"),
            AggOp::ScAvg => write!(f, "SC_AVG"),
        }
    }
}

/// An online accumulator that folds input tuples into per-group state.
///
/// Between the last `merge` and `iterator` the state is frozen. `iterator`
/// may be called repeatedly; each call yields a fresh independent cursor
/// over the same result contents.
pub trait Aggregator {
    /// Folds one input tuple into its group's state.
    fn merge(&mut self, tuple: &Tuple) -> Result<(), ExecError>;

    /// Returns an operator over the finalized per-group result tuples:
    /// `(groupVal, aggregateVal)` per group when grouping, a single
    /// `(aggregateVal)` otherwise. The iterator starts closed.
    fn iterator(&self) -> Result<TupleIterator, ExecError>;
}

fn group_key(
    grouping: Option<(usize, Type)>,
    tuple: &Tuple,
) -> Result<Option<Field>, ExecError> {
    match grouping {
        None => Ok(None),
        Some((gfield, gb_type)) => {
            let field = tuple.field(gfield);
            if field.ty() != gb_type {
                return Err(ExecError::TypeMismatch {
                    expected: gb_type,
                    found: field.ty(),
                });
            }
            Ok(Some(field.clone()))
        }
    }
}

fn int_field(tuple: &Tuple, i: usize) -> Result<i32, ExecError> {
    match tuple.field(i) {
        Field::Int(v) => Ok(*v),
        other => Err(ExecError::TypeMismatch {
            expected: Type::Int,
            found: other.ty(),
        }),
    }
}

/// Per-group accumulator state for integer aggregation.
#[derive(Debug, Clone, Copy)]
struct IntState {
    sum: i64,
    count: i64,
    min: i32,
    max: i32,
    sum_count: i64,
}

impl IntState {
    fn new() -> Self {
        Self {
            sum: 0,
            count: 0,
            min: i32::MAX,
            max: i32::MIN,
            sum_count: 0,
        }
    }
}

/// Computes a grouped aggregate over an integer column.
///
/// Every operation keeps the full `{sum, count, min, max, sum_count}` state
/// per group; the operation chosen at construction decides which parts reach
/// the output. `ScAvg` additionally requires each input tuple to carry a
/// precomputed count contribution in the field adjacent to the aggregate
/// field.
pub struct IntegerAggregator {
    grouping: Option<(usize, Type)>,
    afield: usize,
    op: AggOp,
    groups: HashMap<Option<Field>, IntState>,
}

impl IntegerAggregator {
    /// Creates an aggregator over input field `afield`.
    ///
    /// `grouping` is the group-by field's index and type, or `None` for
    /// single-group aggregation.
    pub fn new(grouping: Option<(usize, Type)>, afield: usize, op: AggOp) -> Self {
        Self {
            grouping,
            afield,
            op,
            groups: HashMap::new(),
        }
    }

    fn output_desc(&self) -> Arc<TupleDesc> {
        let mut types = Vec::new();
        if let Some((_, gb_type)) = self.grouping {
            types.push(gb_type);
        }
        types.push(Type::Int);
        if self.op == AggOp::SumCount {
            types.push(Type::Int);
        }
        Arc::new(TupleDesc::anonymous(types))
    }
}

impl Aggregator for IntegerAggregator {
    fn merge(&mut self, tuple: &Tuple) -> Result<(), ExecError> {
        let key = group_key(self.grouping, tuple)?;
        let value = int_field(tuple, self.afield)?;
        let count_contribution = if self.op == AggOp::ScAvg {
            int_field(tuple, self.afield + 1)? as i64
        } else {
            0
        };

        let state = self.groups.entry(key).or_insert_with(IntState::new);
        state.sum += value as i64;
        state.count += 1;
        state.min = state.min.min(value);
        state.max = state.max.max(value);
        state.sum_count += count_contribution;
        Ok(())
    }

    fn iterator(&self) -> Result<TupleIterator, ExecError> {
        let td = self.output_desc();
        let mut results = Vec::with_capacity(self.groups.len());
        for (key, state) in &self.groups {
            let mut fields = Vec::with_capacity(td.num_fields());
            if let Some(group_val) = key {
                fields.push(group_val.clone());
            }
            match self.op {
                AggOp::Min => fields.push(Field::Int(state.min)),
                AggOp::Max => fields.push(Field::Int(state.max)),
                AggOp::Sum => fields.push(Field::Int(state.sum as i32)),
                AggOp::Count => fields.push(Field::Int(state.count as i32)),
                AggOp::Avg => {
                    let avg = state
                        .sum
                        .checked_div(state.count)
                        .ok_or(ExecError::DivisionByZero)?;
                    fields.push(Field::Int(avg as i32));
                }
                AggOp::SumCount => {
                    fields.push(Field::Int(state.sum as i32));
                    fields.push(Field::Int(state.count as i32));
                }
                AggOp::ScAvg => {
                    let avg = state
                        .sum
                        .checked_div(state.sum_count)
                        .ok_or(ExecError::DivisionByZero)?;
                    fields.push(Field::Int(avg as i32));
                }
            }
            results.push(Tuple::new(td.clone(), fields));
        }
        Ok(TupleIterator::new(td, results))
    }
}

/// Computes a grouped COUNT over a string column.
///
/// COUNT is the only aggregate defined on strings; construction with any
/// other operation fails.
pub struct StringAggregator {
    grouping: Option<(usize, Type)>,
    afield: usize,
    groups: HashMap<Option<Field>, i64>,
}

impl StringAggregator {
    /// Creates a COUNT aggregator over string field `afield`.
    ///
    /// # Errors
    ///
    /// Returns `ExecError::InvalidAggregateOp` for any operation but
    /// `AggOp::Count`.
    pub fn new(
        grouping: Option<(usize, Type)>,
        afield: usize,
        op: AggOp,
    ) -> Result<Self, ExecError> {
        if op != AggOp::Count {
            return Err(ExecError::InvalidAggregateOp(op));
        }
        Ok(Self {
            grouping,
            afield,
            groups: HashMap::new(),
        })
    }

    fn output_desc(&self) -> Arc<TupleDesc> {
        let mut types = Vec::new();
        if let Some((_, gb_type)) = self.grouping {
            types.push(gb_type);
        }
        types.push(Type::Int);
        Arc::new(TupleDesc::anonymous(types))
    }
}

impl Aggregator for StringAggregator {
    fn merge(&mut self, tuple: &Tuple) -> Result<(), ExecError> {
        let key = group_key(self.grouping, tuple)?;
        match tuple.field(self.afield) {
            Field::Str(_) => {}
            other => {
                return Err(ExecError::TypeMismatch {
                    expected: Type::Str,
                    found: other.ty(),
                })
            }
        }
        *self.groups.entry(key).or_insert(0) += 1;
        Ok(())
    }

    fn iterator(&self) -> Result<TupleIterator, ExecError> {
        let td = self.output_desc();
        let mut results = Vec::with_capacity(self.groups.len());
        for (key, count) in &self.groups {
            let mut fields = Vec::with_capacity(td.num_fields());
            if let Some(group_val) = key {
                fields.push(group_val.clone());
            }
            fields.push(Field::Int(*count as i32));
            results.push(Tuple::new(td.clone(), fields));
        }
        Ok(TupleIterator::new(td, results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::OpIterator;

    fn int_pair_schema() -> Arc<TupleDesc> {
        Arc::new(TupleDesc::anonymous(vec![Type::Int, Type::Int]))
    }

    fn merge_pairs(agg: &mut dyn Aggregator, rows: &[(i32, i32)]) {
        let td = int_pair_schema();
        for &(g, v) in rows {
            let tuple = Tuple::new(td.clone(), vec![Field::Int(g), Field::Int(v)]);
            agg.merge(&tuple).unwrap();
        }
    }

    fn drain(mut it: TupleIterator) -> Vec<Vec<Field>> {
        it.open().unwrap();
        let mut out = Vec::new();
        while it.has_next().unwrap() {
            out.push(it.next().unwrap().fields().to_vec());
        }
        out.sort_by_key(|fields| format!("{:?}", fields));
        out
    }

    #[test]
    fn test_count_no_grouping() {
        let mut agg = IntegerAggregator::new(None, 1, AggOp::Count);
        merge_pairs(&mut agg, &[(0, 10), (0, 20), (0, 30)]);
        assert_eq!(drain(agg.iterator().unwrap()), vec![vec![Field::Int(3)]]);
    }

    #[test]
    fn test_grouped_min_max_sum() {
        let rows = [(1, 5), (1, 2), (2, 9), (1, 8), (2, -3)];

        let mut min = IntegerAggregator::new(Some((0, Type::Int)), 1, AggOp::Min);
        merge_pairs(&mut min, &rows);
        assert_eq!(
            drain(min.iterator().unwrap()),
            vec![
                vec![Field::Int(1), Field::Int(2)],
                vec![Field::Int(2), Field::Int(-3)],
            ]
        );

        let mut max = IntegerAggregator::new(Some((0, Type::Int)), 1, AggOp::Max);
        merge_pairs(&mut max, &rows);
        assert_eq!(
            drain(max.iterator().unwrap()),
            vec![
                vec![Field::Int(1), Field::Int(8)],
                vec![Field::Int(2), Field::Int(9)],
            ]
        );

        let mut sum = IntegerAggregator::new(Some((0, Type::Int)), 1, AggOp::Sum);
        merge_pairs(&mut sum, &rows);
        assert_eq!(
            drain(sum.iterator().unwrap()),
            vec![
                vec![Field::Int(1), Field::Int(15)],
                vec![Field::Int(2), Field::Int(6)],
            ]
        );
    }

    #[test]
    fn test_avg_truncates_toward_zero() {
        let mut agg = IntegerAggregator::new(Some((0, Type::Int)), 1, AggOp::Avg);
        merge_pairs(&mut agg, &[(1, 7), (1, 2), (2, -7), (2, -2)]);
        // 9 / 2 = 4 and -9 / 2 = -4 under truncating division.
        assert_eq!(
            drain(agg.iterator().unwrap()),
            vec![
                vec![Field::Int(1), Field::Int(4)],
                vec![Field::Int(2), Field::Int(-4)],
            ]
        );
    }

    #[test]
    fn test_string_group_keys() {
        let td = Arc::new(TupleDesc::anonymous(vec![Type::Str, Type::Int]));
        let mut agg = IntegerAggregator::new(Some((0, Type::Str)), 1, AggOp::Avg);
        for (g, v) in [("a", 1), ("a", 3), ("b", 10), ("a", 5), ("b", 30)] {
            let tuple = Tuple::new(td.clone(), vec![Field::str(g), Field::Int(v)]);
            agg.merge(&tuple).unwrap();
        }
        assert_eq!(
            drain(agg.iterator().unwrap()),
            vec![
                vec![Field::str("a"), Field::Int(3)],
                vec![Field::str("b"), Field::Int(20)],
            ]
        );
    }

    #[test]
    fn test_sum_count_emits_both() {
        let mut agg = IntegerAggregator::new(Some((0, Type::Int)), 1, AggOp::SumCount);
        merge_pairs(&mut agg, &[(1, 4), (1, 6), (2, 5)]);
        let results = drain(agg.iterator().unwrap());
        assert_eq!(
            results,
            vec![
                vec![Field::Int(1), Field::Int(10), Field::Int(2)],
                vec![Field::Int(2), Field::Int(5), Field::Int(1)],
            ]
        );
    }

    #[test]
    fn test_sc_avg_uses_adjacent_counts() {
        let td = Arc::new(TupleDesc::anonymous(vec![Type::Int, Type::Int, Type::Int]));
        let mut agg = IntegerAggregator::new(Some((0, Type::Int)), 1, AggOp::ScAvg);
        for (g, sum, cnt) in [(1, 10, 2), (1, 20, 3), (2, 7, 7)] {
            let tuple = Tuple::new(
                td.clone(),
                vec![Field::Int(g), Field::Int(sum), Field::Int(cnt)],
            );
            agg.merge(&tuple).unwrap();
        }
        assert_eq!(
            drain(agg.iterator().unwrap()),
            vec![
                vec![Field::Int(1), Field::Int(6)],
                vec![Field::Int(2), Field::Int(1)],
            ]
        );
    }

    #[test]
    fn test_sc_avg_zero_count_fails() {
        let td = Arc::new(TupleDesc::anonymous(vec![Type::Int, Type::Int, Type::Int]));
        let mut agg = IntegerAggregator::new(None, 1, AggOp::ScAvg);
        let tuple = Tuple::new(
            td,
            vec![Field::Int(0), Field::Int(10), Field::Int(0)],
        );
        agg.merge(&tuple).unwrap();
        assert!(matches!(
            agg.iterator(),
            Err(ExecError::DivisionByZero)
        ));
    }

    #[test]
    fn test_merge_rejects_non_int_aggregate_field() {
        let td = Arc::new(TupleDesc::anonymous(vec![Type::Int, Type::Str]));
        let mut agg = IntegerAggregator::new(None, 1, AggOp::Sum);
        let tuple = Tuple::new(td, vec![Field::Int(1), Field::str("oops")]);
        assert!(matches!(
            agg.merge(&tuple),
            Err(ExecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_iterator_calls_are_independent() {
        let mut agg = IntegerAggregator::new(None, 1, AggOp::Sum);
        merge_pairs(&mut agg, &[(0, 1), (0, 2)]);

        let first = drain(agg.iterator().unwrap());
        let second = drain(agg.iterator().unwrap());
        assert_eq!(first, second);
        assert_eq!(first, vec![vec![Field::Int(3)]]);
    }

    #[test]
    fn test_string_aggregator_counts() {
        let td = Arc::new(TupleDesc::anonymous(vec![Type::Int, Type::Str]));
        let mut agg = StringAggregator::new(Some((0, Type::Int)), 1, AggOp::Count).unwrap();
        for (g, s) in [(1, "x"), (1, "y"), (2, "z")] {
            let tuple = Tuple::new(td.clone(), vec![Field::Int(g), Field::str(s)]);
            agg.merge(&tuple).unwrap();
        }
        assert_eq!(
            drain(agg.iterator().unwrap()),
            vec![
                vec![Field::Int(1), Field::Int(2)],
                vec![Field::Int(2), Field::Int(1)],
            ]
        );
    }

    #[test]
    fn test_string_aggregator_rejects_non_count() {
        for op in [AggOp::Min, AggOp::Max, AggOp::Sum, AggOp::Avg] {
            assert!(matches!(
                StringAggregator::new(None, 0, op),
                Err(ExecError::InvalidAggregateOp(_))
            ));
        }
    }

    #[test]
    fn test_op_display() {
        assert_eq!(AggOp::Min.to_string(), "MIN");
        assert_eq!(AggOp::SumCount.to_string(), "SUM_COUNT");
        assert_eq!(AggOp::ScAvg.to_string(), "SC_AVG");
    }
}
