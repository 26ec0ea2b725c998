//! Pipelined query execution.
//!
//! A physical plan is a tree of operators implementing [`OpIterator`]; the
//! root is pulled tuple by tuple, and each operator pulls from its children
//! on demand (the Volcano model). The operators here are the leaves and the
//! aggregation family:
//!
//! - [`SeqScan`]: table scan over a heap file
//! - [`TupleIterator`]: rewindable operator over materialized tuples
//! - [`Aggregate`]: drains its child into an [`Aggregator`], then yields one
//!   result tuple per group

mod aggregate;
mod aggregator;
mod error;
mod iterator;
mod seq_scan;
mod tuple_iterator;

pub use aggregate::Aggregate;
pub use aggregator::{AggOp, Aggregator, IntegerAggregator, StringAggregator};
pub use error::ExecError;
pub use iterator::OpIterator;
pub use seq_scan::SeqScan;
pub use tuple_iterator::TupleIterator;
