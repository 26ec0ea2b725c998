//! The pipelined operator protocol.

use std::sync::Arc;

use super::error::ExecError;
use crate::tuple::{Tuple, TupleDesc};

/// A node in a pipelined query plan, pulled tuple by tuple.
///
/// Every operator is an explicit state machine: it starts closed, `open`
/// readies it (opening children as needed), and `close` releases scan state.
/// An exhausted operator is still open — it keeps accepting `rewind` and
/// `close`. Calling `has_next` on a closed operator reports false rather
/// than failing; `next` past the last tuple fails `NoSuchElement`.
///
/// Cancellation is cooperative: any operation may fail with
/// `ExecError::Aborted`, which unwinds the pull chain. Operators must remain
/// safely closable after such a failure.
pub trait OpIterator {
    /// Readies the operator, opening its children.
    ///
    /// Opening an already open operator repositions it before its first
    /// tuple, like `rewind`.
    fn open(&mut self) -> Result<(), ExecError>;

    /// Returns true if another tuple remains. False on a closed operator.
    fn has_next(&mut self) -> Result<bool, ExecError>;

    /// Returns the next tuple.
    ///
    /// # Errors
    ///
    /// Fails with `ExecError::NoSuchElement` when no tuple remains.
    fn next(&mut self) -> Result<Tuple, ExecError>;

    /// Resets the operator to its pre-first state; observationally the same
    /// as `close` followed by `open`.
    fn rewind(&mut self) -> Result<(), ExecError>;

    /// Releases scan state and closes children. Idempotent.
    fn close(&mut self);

    /// Returns the schema of this operator's output, stable once the
    /// operator is constructed.
    fn tuple_desc(&self) -> Arc<TupleDesc>;

    /// Returns this operator's children for plan-tree inspection. Leaves
    /// report no children.
    fn children(&self) -> Vec<&dyn OpIterator>;

    /// Replaces this operator's children, for rule-based plan rewriters.
    /// Leaves ignore the call.
    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>);
}
