//! The aggregation operator.

use std::sync::Arc;

use super::aggregator::{AggOp, Aggregator, IntegerAggregator, StringAggregator};
use super::error::ExecError;
use super::iterator::OpIterator;
use super::tuple_iterator::TupleIterator;
use crate::datum::Type;
use crate::tuple::{Tuple, TupleDesc};

/// Computes an aggregate (for example a grouped AVG) over one column of its
/// child's output.
///
/// The child is drained completely into an [`Aggregator`] on the first pull;
/// after that the operator serves the aggregator's per-group results. A
/// `rewind` resets only the result cursor — the aggregator's state is
/// preserved and the child is not re-read.
pub struct Aggregate {
    child: Box<dyn OpIterator>,
    afield: usize,
    gfield: Option<usize>,
    op: AggOp,
    td: Arc<TupleDesc>,
    agg: Box<dyn Aggregator>,
    result: Option<TupleIterator>,
    open: bool,
}

impl Aggregate {
    /// Creates an aggregation over `child`'s field `afield`, grouped by
    /// `gfield` when given.
    ///
    /// The aggregator implementation is chosen by the aggregate field's
    /// type: integers support every [`AggOp`], strings only COUNT.
    ///
    /// # Errors
    ///
    /// Returns `ExecError::InvalidAggregateOp` when `op` is not valid for
    /// the aggregate field's type.
    pub fn new(
        child: Box<dyn OpIterator>,
        afield: usize,
        gfield: Option<usize>,
        op: AggOp,
    ) -> Result<Self, ExecError> {
        let child_td = child.tuple_desc();
        let grouping = gfield.map(|g| (g, child_td.field_type(g)));
        let agg: Box<dyn Aggregator> = match child_td.field_type(afield) {
            Type::Int => Box::new(IntegerAggregator::new(grouping, afield, op)),
            Type::Str => Box::new(StringAggregator::new(grouping, afield, op)?),
        };
        let td = Self::output_desc(&child_td, afield, gfield, op);
        Ok(Self {
            child,
            afield,
            gfield,
            op,
            td,
            agg,
            result: None,
            open: false,
        })
    }

    /// Output schema: the group column (keeping the child's name) when
    /// grouping, then the aggregate column named `"<OP>(<child field>)"`,
    /// plus an anonymous count column for SUM_COUNT.
    fn output_desc(
        child_td: &TupleDesc,
        afield: usize,
        gfield: Option<usize>,
        op: AggOp,
    ) -> Arc<TupleDesc> {
        let agg_name = format!("{}({})", op, child_td.field_name(afield).unwrap_or("null"));

        let mut types = Vec::new();
        let mut names = Vec::new();
        if let Some(g) = gfield {
            types.push(child_td.field_type(g));
            names.push(child_td.field_name(g).map(str::to_string));
        }
        types.push(Type::Int);
        names.push(Some(agg_name));
        if op == AggOp::SumCount {
            types.push(Type::Int);
            names.push(None);
        }
        Arc::new(TupleDesc::new(types, names))
    }

    /// Returns the group-by field index in the input tuples, if grouping.
    pub fn group_field(&self) -> Option<usize> {
        self.gfield
    }

    /// Returns the aggregate field index in the input tuples.
    pub fn aggregate_field(&self) -> usize {
        self.afield
    }

    /// Returns the aggregation operator.
    pub fn aggregate_op(&self) -> AggOp {
        self.op
    }

    /// Drains the child into the aggregator on first use and returns the
    /// result cursor.
    fn result(&mut self) -> Result<&mut TupleIterator, ExecError> {
        if self.result.is_none() {
            while self.child.has_next()? {
                let tuple = self.child.next()?;
                self.agg.merge(&tuple)?;
            }
            let mut it = self.agg.iterator()?;
            it.open()?;
            self.result = Some(it);
        }
        match &mut self.result {
            Some(it) => Ok(it),
            None => unreachable!("result was just materialized"),
        }
    }
}

impl OpIterator for Aggregate {
    fn open(&mut self) -> Result<(), ExecError> {
        self.child.open()?;
        if let Some(it) = &mut self.result {
            it.open()?;
        }
        self.open = true;
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool, ExecError> {
        if !self.open {
            return Ok(false);
        }
        self.result()?.has_next()
    }

    fn next(&mut self) -> Result<Tuple, ExecError> {
        if !self.open {
            return Err(ExecError::NoSuchElement);
        }
        self.result()?.next()
    }

    fn rewind(&mut self) -> Result<(), ExecError> {
        self.child.rewind()?;
        if let Some(it) = &mut self.result {
            it.rewind()?;
        }
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        if let Some(it) = &mut self.result {
            it.close();
        }
        self.open = false;
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.td.clone()
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }

    fn set_children(&mut self, mut children: Vec<Box<dyn OpIterator>>) {
        assert_eq!(children.len(), 1, "Aggregate takes exactly one child");
        self.child = children.remove(0);
    }
}
