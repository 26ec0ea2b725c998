//! Page identity and the buffer pool.
//!
//! Pages are the unit of I/O and of caching. A [`HeapPageId`] names a page by
//! `(table, page number)`; the [`BufferPool`] caches parsed pages behind
//! shared read-write handles and delegates misses to the owning heap file.
//!
//! ```text
//! +-------------------+
//! |  Query operators  |
//! +-------------------+
//!          |
//!          v
//! +-------------------+
//! |    BufferPool     |
//! +-------------------+
//!          |
//!          v
//! +-------------------+
//! |     HeapFile      |
//! +-------------------+
//! ```

mod error;
mod page_id;
mod pool;

pub use error::StorageError;
pub use page_id::HeapPageId;
pub use pool::{BufferPool, PageHandle, DEFAULT_POOL_CAPACITY};
