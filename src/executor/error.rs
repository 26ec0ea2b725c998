//! Executor-specific errors.

use std::fmt;

use super::aggregator::AggOp;
use crate::datum::Type;
use crate::heap::HeapError;
use crate::storage::StorageError;
use crate::tx::TransactionAborted;

/// Errors that can occur while executing an operator tree.
#[derive(Debug)]
pub enum ExecError {
    /// Page access through the buffer pool failed.
    Storage(StorageError),
    /// Page or heap file operation failed.
    Heap(HeapError),
    /// The transaction was aborted. Propagated unchanged through the whole
    /// pull chain; operators stay safely closable after seeing it.
    Aborted(TransactionAborted),
    /// `next()` was called on an exhausted or closed operator.
    NoSuchElement,
    /// The aggregation operator is not valid for the aggregated column type.
    InvalidAggregateOp(AggOp),
    /// An AVG-family aggregate divided by a zero count.
    DivisionByZero,
    /// A field had a different type than the operator requires.
    TypeMismatch {
        /// The type the operator expected.
        expected: Type,
        /// The type found in the tuple.
        found: Type,
    },
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::Storage(err) => write!(f, "{}", err),
            ExecError::Heap(err) => write!(f, "{}", err),
            ExecError::Aborted(err) => write!(f, "{}", err),
            ExecError::NoSuchElement => write!(f, "no more tuples"),
            ExecError::InvalidAggregateOp(op) => {
                write!(f, "aggregate operator {} not valid here", op)
            }
            ExecError::DivisionByZero => write!(f, "aggregate division by zero"),
            ExecError::TypeMismatch { expected, found } => {
                write!(f, "expected a {} field, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecError::Storage(err) => Some(err),
            ExecError::Heap(err) => Some(err),
            ExecError::Aborted(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for ExecError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Aborted(aborted) => ExecError::Aborted(aborted),
            StorageError::ScanExhausted => ExecError::NoSuchElement,
            other => ExecError::Storage(other),
        }
    }
}

impl From<HeapError> for ExecError {
    fn from(err: HeapError) -> Self {
        ExecError::Heap(err)
    }
}

impl From<TransactionAborted> for ExecError {
    fn from(err: TransactionAborted) -> Self {
        ExecError::Aborted(err)
    }
}
