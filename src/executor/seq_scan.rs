//! Sequential table scan operator.

use std::sync::Arc;

use super::error::ExecError;
use super::iterator::OpIterator;
use crate::heap::HeapScan;
use crate::storage::BufferPool;
use crate::tuple::{Tuple, TupleDesc};
use crate::tx::TransactionId;

/// Leaf operator that scans every live tuple of a table.
///
/// Pages are fetched read-only through the buffer pool as the cursor reaches
/// them; within a page, tuples come back in slot order.
pub struct SeqScan {
    td: Arc<TupleDesc>,
    scan: HeapScan,
}

impl SeqScan {
    /// Creates a scan over the given table for transaction `tid`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UnknownTable` (wrapped) if the table is not in
    /// the pool's catalog.
    pub fn new(pool: Arc<BufferPool>, tid: TransactionId, table_id: u64) -> Result<Self, ExecError> {
        let file = pool.catalog().file(table_id)?;
        let td = file.tuple_desc().clone();
        let scan = file.scan(pool, tid);
        Ok(Self { td, scan })
    }
}

impl OpIterator for SeqScan {
    fn open(&mut self) -> Result<(), ExecError> {
        self.scan.open()?;
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool, ExecError> {
        Ok(self.scan.has_next()?)
    }

    fn next(&mut self) -> Result<Tuple, ExecError> {
        Ok(self.scan.next()?)
    }

    fn rewind(&mut self) -> Result<(), ExecError> {
        self.scan.rewind()?;
        Ok(())
    }

    fn close(&mut self) {
        self.scan.close();
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.td.clone()
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        Vec::new()
    }

    fn set_children(&mut self, _children: Vec<Box<dyn OpIterator>>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::datum::{Field, Type};
    use crate::heap::HeapFile;
    use tempfile::tempdir;

    #[test]
    fn test_scan_yields_table_contents() {
        let dir = tempdir().unwrap();
        let td = Arc::new(TupleDesc::new(vec![Type::Int], vec![Some("v".into())]));
        let catalog = Arc::new(Catalog::new());
        let pool = Arc::new(BufferPool::new(catalog.clone(), 8));
        let file = HeapFile::open(dir.path().join("t.dat"), td.clone()).unwrap();
        catalog.add_table(file.clone(), "t");

        let tid = TransactionId::new();
        for v in 0..3 {
            pool.insert_tuple(tid, file.id(), Tuple::new(td.clone(), vec![Field::Int(v)]))
                .unwrap();
        }

        let mut scan = SeqScan::new(pool, tid, file.id()).unwrap();
        assert_eq!(scan.tuple_desc().field_name(0), Some("v"));
        assert!(scan.children().is_empty());

        scan.open().unwrap();
        let mut seen = Vec::new();
        while scan.has_next().unwrap() {
            seen.push(scan.next().unwrap().field(0).clone());
        }
        assert_eq!(seen, vec![Field::Int(0), Field::Int(1), Field::Int(2)]);

        scan.rewind().unwrap();
        assert!(scan.has_next().unwrap());
        scan.close();
        assert!(!scan.has_next().unwrap());
    }

    #[test]
    fn test_unknown_table_fails_construction() {
        let catalog = Arc::new(Catalog::new());
        let pool = Arc::new(BufferPool::new(catalog, 8));
        let result = SeqScan::new(pool, TransactionId::new(), 12345);
        assert!(matches!(result, Err(ExecError::Storage(_))));
    }
}
