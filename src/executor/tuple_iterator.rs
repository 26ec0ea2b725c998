//! An operator over materialized tuples.

use std::sync::Arc;

use super::error::ExecError;
use super::iterator::OpIterator;
use crate::tuple::{Tuple, TupleDesc};

/// A rewindable leaf operator over an in-memory list of tuples.
///
/// Aggregators emit their per-group results through one of these, and tests
/// use it to feed operators a fixed input.
pub struct TupleIterator {
    td: Arc<TupleDesc>,
    tuples: Vec<Tuple>,
    cursor: Cursor,
}

enum Cursor {
    Closed,
    Open { pos: usize },
}

impl TupleIterator {
    /// Creates a closed iterator over the given tuples.
    pub fn new(td: Arc<TupleDesc>, tuples: Vec<Tuple>) -> Self {
        Self {
            td,
            tuples,
            cursor: Cursor::Closed,
        }
    }
}

impl OpIterator for TupleIterator {
    fn open(&mut self) -> Result<(), ExecError> {
        self.cursor = Cursor::Open { pos: 0 };
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool, ExecError> {
        match self.cursor {
            Cursor::Closed => Ok(false),
            Cursor::Open { pos } => Ok(pos < self.tuples.len()),
        }
    }

    fn next(&mut self) -> Result<Tuple, ExecError> {
        match &mut self.cursor {
            Cursor::Open { pos } if *pos < self.tuples.len() => {
                let tuple = self.tuples[*pos].clone();
                *pos += 1;
                Ok(tuple)
            }
            _ => Err(ExecError::NoSuchElement),
        }
    }

    fn rewind(&mut self) -> Result<(), ExecError> {
        self.open()
    }

    fn close(&mut self) {
        self.cursor = Cursor::Closed;
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.td.clone()
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        Vec::new()
    }

    fn set_children(&mut self, _children: Vec<Box<dyn OpIterator>>) {}
}
