//! Page-addressable heap file.
//!
//! A heap file is a byte file whose length is a multiple of the page size;
//! page `k` lives at byte offset `k * page_size()`. Reads and writes address
//! whole pages. Inserts fill the first page with a free slot, appending a
//! fresh empty page to the end of the file when every existing page is full.

use std::collections::hash_map::DefaultHasher;
use std::fs::{File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::error::HeapError;
use super::page::HeapPage;
use super::scan::HeapScan;
use crate::config;
use crate::storage::{BufferPool, HeapPageId, PageHandle, StorageError};
use crate::tuple::{Tuple, TupleDesc};
use crate::tx::{Permission, TransactionId};

/// A table's backing file: an ordered collection of heap pages.
///
/// All file I/O is serialized on a single mutex around the file handle;
/// page-granular concurrency comes from the buffer pool's per-page latches,
/// not from the file layer.
pub struct HeapFile {
    path: PathBuf,
    file: Mutex<File>,
    table_id: u64,
    td: Arc<TupleDesc>,
    num_pages: AtomicUsize,
}

impl HeapFile {
    /// Opens (creating if missing) the heap file at `path` with the given
    /// tuple schema.
    ///
    /// A file whose length is not a whole number of pages is padded with
    /// zeros up to the next page boundary. The table id is derived from the
    /// file's canonical path, so re-opening the same file yields the same id.
    pub fn open(path: impl Into<PathBuf>, td: Arc<TupleDesc>) -> Result<Arc<Self>, HeapError> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let page_size = config::page_size() as u64;
        let mut len = file.metadata()?.len();
        if len % page_size != 0 {
            len = len.div_ceil(page_size) * page_size;
            file.set_len(len)?;
        }

        let mut hasher = DefaultHasher::new();
        path.canonicalize()?.hash(&mut hasher);
        let table_id = hasher.finish();

        Ok(Arc::new(Self {
            path,
            file: Mutex::new(file),
            table_id,
            td,
            num_pages: AtomicUsize::new((len / page_size) as usize),
        }))
    }

    /// Returns the table id of this file, stable across re-opens.
    pub fn id(&self) -> u64 {
        self.table_id
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the schema of the tuples stored in this file.
    pub fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.td
    }

    /// Returns the number of pages currently in the file.
    pub fn num_pages(&self) -> usize {
        self.num_pages.load(Ordering::Acquire)
    }

    /// Reads the page with the given id from disk.
    ///
    /// Only the buffer pool should need to call this; everyone else goes
    /// through [`BufferPool::get_page`] so that cached copies stay coherent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPageId` for a page number outside the file, `Io` for
    /// a failed read, or `Format` for bytes that do not parse.
    pub fn read_page(&self, pid: HeapPageId) -> Result<HeapPage, HeapError> {
        let num_pages = self.num_pages();
        if pid.page_no() >= num_pages {
            return Err(HeapError::InvalidPageId {
                page_no: pid.page_no(),
                num_pages,
            });
        }

        let page_size = config::page_size();
        let mut data = vec![0u8; page_size];
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start((pid.page_no() * page_size) as u64))?;
            file.read_exact(&mut data)?;
        }
        trace!(table = self.table_id, page = pid.page_no(), "read page");
        HeapPage::new(pid, self.td.clone(), &data)
    }

    /// Writes the page to its offset in the file.
    ///
    /// Durability (fsync) is the caller's concern.
    pub fn write_page(&self, page: &HeapPage) -> Result<(), HeapError> {
        let page_size = config::page_size();
        let page_no = page.id().page_no();
        let data = page.page_data();
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start((page_no * page_size) as u64))?;
            file.write_all(&data)?;
        }
        self.num_pages.fetch_max(page_no + 1, Ordering::AcqRel);
        trace!(table = self.table_id, page = page_no, "wrote page");
        Ok(())
    }

    /// Appends one empty page to the file and returns its page number.
    ///
    /// Runs under the file mutex so concurrent appenders get distinct pages.
    fn append_empty_page(&self) -> Result<usize, HeapError> {
        let mut file = self.file.lock();
        let page_no = self.num_pages.load(Ordering::Acquire);
        file.seek(SeekFrom::Start((page_no * config::page_size()) as u64))?;
        file.write_all(&HeapPage::empty_page_data())?;
        self.num_pages.store(page_no + 1, Ordering::Release);
        debug!(table = self.table_id, page = page_no, "appended empty page");
        Ok(page_no)
    }

    /// Inserts a tuple on behalf of transaction `tid`.
    ///
    /// Scans pages in order for a free slot, fetching each through the pool
    /// with read-write permission; when every page is full, appends an empty
    /// page and inserts there. Exactly one page comes back in the returned
    /// list, dirtied by `tid` and holding the tuple with its record id
    /// assigned.
    pub fn insert_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: Tuple,
    ) -> Result<Vec<PageHandle>, StorageError> {
        let mut target = None;
        for page_no in 0..self.num_pages() {
            let pid = HeapPageId::new(self.table_id, page_no);
            let handle = pool.get_page(tid, pid, Permission::ReadWrite)?;
            if handle.read().num_empty_slots() > 0 {
                target = Some(handle);
                break;
            }
        }

        let handle = match target {
            Some(handle) => handle,
            None => {
                let page_no = self.append_empty_page()?;
                let pid = HeapPageId::new(self.table_id, page_no);
                pool.get_page(tid, pid, Permission::ReadWrite)?
            }
        };

        {
            let mut page = handle.write();
            page.insert_tuple(tuple)?;
            page.mark_dirty(Some(tid));
        }
        Ok(vec![handle])
    }

    /// Deletes a tuple on behalf of transaction `tid`.
    ///
    /// Fetches the tuple's home page with read-write permission and frees
    /// its slot. The returned page is not marked dirty here; the caller
    /// decides (the buffer pool does it on its delete path).
    pub fn delete_tuple(
        &self,
        pool: &BufferPool,
        tid: TransactionId,
        tuple: &Tuple,
    ) -> Result<Vec<PageHandle>, StorageError> {
        let rid = tuple.record_id().ok_or(HeapError::MissingRecordId)?;
        let handle = pool.get_page(tid, rid.page_id(), Permission::ReadWrite)?;
        handle.write().delete_tuple(tuple)?;
        Ok(vec![handle])
    }

    /// Creates a scan over this file's live tuples for transaction `tid`.
    ///
    /// The scan starts closed; call [`HeapScan::open`] before pulling.
    pub fn scan(self: &Arc<Self>, pool: Arc<BufferPool>, tid: TransactionId) -> HeapScan {
        HeapScan::new(self.clone(), pool, tid)
    }
}
