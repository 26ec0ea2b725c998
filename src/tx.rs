//! Transaction identities and page access permissions.
//!
//! The storage core does not implement concurrency control; it consumes the
//! transaction layer through this contract surface. Transactions are
//! identified by process-unique ids, request pages under a declared
//! [`Permission`], and may be aborted by the lock manager at any page fetch,
//! which surfaces as [`TransactionAborted`] and unwinds the current pull.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TX_ID: AtomicU64 = AtomicU64::new(0);

/// A process-unique transaction identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Allocates a fresh transaction id.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(NEXT_TX_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the numeric id.
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx{}", self.0)
    }
}

/// The access level a transaction requests on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Shared read access.
    ReadOnly,
    /// Exclusive read-write access.
    ReadWrite,
}

/// Raised by the buffer pool when a transaction is chosen as a deadlock or
/// timeout victim.
///
/// This error is never caught inside the storage core: every layer propagates
/// it unchanged, and operators that see it must remain safely closable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionAborted;

impl fmt::Display for TransactionAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transaction aborted")
    }
}

impl std::error::Error for TransactionAborted {}
