//! Tuples and their schemas.
//!
//! A [`TupleDesc`] is the positional schema of a row: an ordered, non-empty
//! sequence of column types with optional names. A [`Tuple`] is a row valued
//! per such a schema, optionally carrying the [`RecordId`] of the page slot
//! it lives in.

mod desc;
mod record;

pub use desc::{TdItem, TupleDesc};
pub use record::{RecordId, Tuple};
