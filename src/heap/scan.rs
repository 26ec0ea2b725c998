//! Heap file scan iterator.
//!
//! A scan walks a file's pages in ascending page order and each page's
//! occupied slots in ascending slot order, fetching pages read-only through
//! the buffer pool and buffering one page of tuples at a time.
//!
//! The scan does not snapshot the table: a page is read when the cursor
//! reaches it, so tuples inserted into pages ahead of the cursor are
//! observed, while changes to pages already visited are not.

use std::sync::Arc;

use super::file::HeapFile;
use crate::storage::{BufferPool, HeapPageId, StorageError};
use crate::tuple::Tuple;
use crate::tx::{Permission, TransactionId};

/// A stateful iterator over the live tuples of a heap file.
///
/// The scan is an explicit state machine: it starts `Closed`, `open` moves
/// it to `Open` positioned before the first tuple, and `close` returns it to
/// `Closed`. An exhausted scan is still open and accepts `rewind`.
pub struct HeapScan {
    file: Arc<HeapFile>,
    pool: Arc<BufferPool>,
    tid: TransactionId,
    state: State,
}

enum State {
    Closed,
    Open {
        page_no: usize,
        tuples: Vec<Tuple>,
        pos: usize,
    },
}

impl HeapScan {
    pub(super) fn new(file: Arc<HeapFile>, pool: Arc<BufferPool>, tid: TransactionId) -> Self {
        Self {
            file,
            pool,
            tid,
            state: State::Closed,
        }
    }

    fn load_page(&self, page_no: usize) -> Result<Vec<Tuple>, StorageError> {
        let pid = HeapPageId::new(self.file.id(), page_no);
        let handle = self.pool.get_page(self.tid, pid, Permission::ReadOnly)?;
        let page = handle.read();
        Ok(page.iter().collect())
    }

    /// Positions the scan before the first tuple of the first page.
    pub fn open(&mut self) -> Result<(), StorageError> {
        let tuples = if self.file.num_pages() == 0 {
            Vec::new()
        } else {
            self.load_page(0)?
        };
        self.state = State::Open {
            page_no: 0,
            tuples,
            pos: 0,
        };
        Ok(())
    }

    /// Returns true if another tuple remains.
    ///
    /// Advances across page boundaries as needed; a page may legally hold no
    /// live tuples, so each newly loaded page is retested rather than
    /// assumed non-empty. On a closed scan this is false.
    pub fn has_next(&mut self) -> Result<bool, StorageError> {
        loop {
            match &self.state {
                State::Closed => return Ok(false),
                State::Open { tuples, pos, .. } if *pos < tuples.len() => return Ok(true),
                State::Open { page_no, .. } => {
                    let next_page = *page_no + 1;
                    if next_page >= self.file.num_pages() {
                        return Ok(false);
                    }
                    let tuples = self.load_page(next_page)?;
                    self.state = State::Open {
                        page_no: next_page,
                        tuples,
                        pos: 0,
                    };
                }
            }
        }
    }

    /// Returns the next tuple.
    ///
    /// # Errors
    ///
    /// Returns `ScanExhausted` when the scan is closed or past its last
    /// tuple.
    pub fn next(&mut self) -> Result<Tuple, StorageError> {
        if !self.has_next()? {
            return Err(StorageError::ScanExhausted);
        }
        match &mut self.state {
            State::Open { tuples, pos, .. } => {
                let tuple = tuples[*pos].clone();
                *pos += 1;
                Ok(tuple)
            }
            State::Closed => unreachable!("has_next returned true on a closed scan"),
        }
    }

    /// Restarts the scan from the first page.
    pub fn rewind(&mut self) -> Result<(), StorageError> {
        self.open()
    }

    /// Releases scan state; the scan can be re-opened.
    pub fn close(&mut self) {
        self.state = State::Closed;
    }
}
