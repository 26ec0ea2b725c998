//! Error types for the storage layer.

use std::fmt;

use crate::heap::HeapError;
use crate::tx::TransactionAborted;

/// Errors from buffer-pool-mediated page access.
#[derive(Debug)]
pub enum StorageError {
    /// Underlying page or file error.
    Heap(HeapError),
    /// No table with this id is registered in the catalog.
    UnknownTable(u64),
    /// The transaction was aborted by the lock manager. Propagated unchanged.
    Aborted(TransactionAborted),
    /// A scan was advanced past its last tuple.
    ScanExhausted,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Heap(err) => write!(f, "{}", err),
            StorageError::UnknownTable(table_id) => {
                write!(f, "no table with id {}", table_id)
            }
            StorageError::Aborted(err) => write!(f, "{}", err),
            StorageError::ScanExhausted => write!(f, "scan advanced past its last tuple"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Heap(err) => Some(err),
            StorageError::Aborted(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HeapError> for StorageError {
    fn from(err: HeapError) -> Self {
        StorageError::Heap(err)
    }
}

impl From<TransactionAborted> for StorageError {
    fn from(err: TransactionAborted) -> Self {
        StorageError::Aborted(err)
    }
}
