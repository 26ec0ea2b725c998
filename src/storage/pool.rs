//! Buffer pool: the page cache between query operators and heap files.
//!
//! The pool maps page ids to parsed, latchable pages. A hit returns the
//! shared handle so that every holder sees the same in-memory page; a miss
//! delegates to the owning heap file's `read_page` and caches the result,
//! evicting the oldest resident page (writing it back first if dirty) when
//! the pool is at capacity.
//!
//! Callers declare a [`Permission`] per fetch. The permission is the seam
//! where a lock manager would queue or abort transactions; no lock manager is
//! layered in here, so fetches never block on other transactions, but any
//! fetch is allowed to fail with [`TransactionAborted`] and callers must
//! treat that as an unwinding cancellation.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use super::error::StorageError;
use super::page_id::HeapPageId;
use crate::catalog::Catalog;
use crate::heap::{HeapError, HeapPage};
use crate::tuple::Tuple;
use crate::tx::{Permission, TransactionId};

/// A shared, latchable handle to a cached page.
///
/// Readers take the read half; mutation requires the write half, which the
/// caller must pair with a `ReadWrite` fetch.
pub type PageHandle = Arc<RwLock<HeapPage>>;

/// Default number of pages the pool holds.
pub const DEFAULT_POOL_CAPACITY: usize = 50;

/// The page cache.
pub struct BufferPool {
    catalog: Arc<Catalog>,
    capacity: usize,
    frames: Mutex<Frames>,
}

struct Frames {
    pages: HashMap<HeapPageId, PageHandle>,
    /// Residency order for FIFO eviction. May contain stale ids for pages
    /// that were discarded; stale entries are skipped at eviction time.
    order: VecDeque<HeapPageId>,
}

impl BufferPool {
    /// Creates a pool over the given catalog holding at most `capacity` pages.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(catalog: Arc<Catalog>, capacity: usize) -> Self {
        assert!(capacity > 0, "buffer pool capacity must be positive");
        Self {
            catalog,
            capacity,
            frames: Mutex::new(Frames {
                pages: HashMap::with_capacity(capacity),
                order: VecDeque::new(),
            }),
        }
    }

    /// Returns the catalog this pool resolves tables through.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Returns the pool capacity in pages.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of pages currently cached.
    pub fn cached_pages(&self) -> usize {
        self.frames.lock().pages.len()
    }

    /// Fetches a page under the given permission.
    ///
    /// On a hit the cached handle is returned; on a miss the owning heap
    /// file reads the page, evicting the oldest resident page first when the
    /// pool is full.
    ///
    /// # Errors
    ///
    /// - `StorageError::UnknownTable` if the page's table is not registered
    /// - `StorageError::Heap` for out-of-range page numbers and I/O failures
    /// - `StorageError::Aborted` if the transaction is cancelled
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: HeapPageId,
        perm: Permission,
    ) -> Result<PageHandle, StorageError> {
        let mut frames = self.frames.lock();
        if let Some(handle) = frames.pages.get(&pid) {
            trace!(%tid, %pid, ?perm, "buffer pool hit");
            return Ok(handle.clone());
        }

        if frames.pages.len() >= self.capacity {
            self.evict(&mut frames)?;
        }

        trace!(%tid, %pid, ?perm, "buffer pool miss");
        let file = self.catalog.file(pid.table_id())?;
        let page = file.read_page(pid)?;
        let handle = Arc::new(RwLock::new(page));
        frames.pages.insert(pid, handle.clone());
        frames.order.push_back(pid);
        Ok(handle)
    }

    /// Inserts a tuple into the named table, marking touched pages dirty.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        table_id: u64,
        tuple: Tuple,
    ) -> Result<(), StorageError> {
        let file = self.catalog.file(table_id)?;
        let pages = file.insert_tuple(self, tid, tuple)?;
        for handle in pages {
            handle.read().mark_dirty(Some(tid));
        }
        Ok(())
    }

    /// Deletes a tuple from its home page, marking touched pages dirty.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> Result<(), StorageError> {
        let rid = tuple
            .record_id()
            .ok_or(HeapError::MissingRecordId)?;
        let file = self.catalog.file(rid.page_id().table_id())?;
        let pages = file.delete_tuple(self, tid, tuple)?;
        for handle in pages {
            handle.read().mark_dirty(Some(tid));
        }
        Ok(())
    }

    /// Writes the page through to its heap file if it is dirty, then clears
    /// the dirty mark. Does nothing for pages that are not cached.
    pub fn flush_page(&self, pid: HeapPageId) -> Result<(), StorageError> {
        let handle = self.frames.lock().pages.get(&pid).cloned();
        if let Some(handle) = handle {
            let page = handle.read();
            if page.dirtier().is_some() {
                let file = self.catalog.file(pid.table_id())?;
                file.write_page(&page)?;
                page.mark_dirty(None);
            }
        }
        Ok(())
    }

    /// Flushes every dirty cached page.
    pub fn flush_all_pages(&self) -> Result<(), StorageError> {
        let pids: Vec<_> = self.frames.lock().pages.keys().copied().collect();
        for pid in pids {
            self.flush_page(pid)?;
        }
        Ok(())
    }

    /// Drops a page from the cache without writing it back.
    pub fn discard_page(&self, pid: HeapPageId) {
        self.frames.lock().pages.remove(&pid);
    }

    /// Evicts the oldest resident page, writing it back first if dirty.
    fn evict(&self, frames: &mut Frames) -> Result<(), StorageError> {
        while let Some(pid) = frames.order.pop_front() {
            let Some(handle) = frames.pages.get(&pid).cloned() else {
                continue;
            };
            {
                let page = handle.read();
                if page.dirtier().is_some() {
                    let file = self.catalog.file(pid.table_id())?;
                    file.write_page(&page)?;
                    page.mark_dirty(None);
                }
            }
            frames.pages.remove(&pid);
            debug!(%pid, "evicted page");
            return Ok(());
        }
        Ok(())
    }
}
