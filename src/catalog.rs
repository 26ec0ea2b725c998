//! Table registry.
//!
//! The catalog maps table ids to their heap files and schemas. The storage
//! core consumes one operation from it — look up a table's tuple schema — and
//! the buffer pool additionally resolves page ids to owning files through it.
//! Everything else about catalog management (persistence, DDL) lives outside
//! this crate.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::heap::HeapFile;
use crate::storage::StorageError;
use crate::tuple::TupleDesc;

/// An in-memory registry of the tables in the database.
///
/// Registration is last-wins: adding a table whose id or name is already
/// present replaces the earlier entry.
#[derive(Default)]
pub struct Catalog {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<u64, Arc<HeapFile>>,
    names: HashMap<String, u64>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table under the given name.
    pub fn add_table(&self, file: Arc<HeapFile>, name: impl Into<String>) {
        let mut inner = self.inner.write();
        inner.names.insert(name.into(), file.id());
        inner.tables.insert(file.id(), file);
    }

    /// Returns the id of the table with the given name.
    pub fn table_id(&self, name: &str) -> Option<u64> {
        self.inner.read().names.get(name).copied()
    }

    /// Returns the heap file backing the given table.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UnknownTable` if no such table is registered.
    pub fn file(&self, table_id: u64) -> Result<Arc<HeapFile>, StorageError> {
        self.inner
            .read()
            .tables
            .get(&table_id)
            .cloned()
            .ok_or(StorageError::UnknownTable(table_id))
    }

    /// Returns the tuple schema of the given table.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UnknownTable` if no such table is registered.
    pub fn tuple_desc(&self, table_id: u64) -> Result<Arc<TupleDesc>, StorageError> {
        Ok(self.file(table_id)?.tuple_desc().clone())
    }
}
