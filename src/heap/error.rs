//! Error types for the heap module.

use std::fmt;

use crate::datum::FormatError;
use crate::storage::HeapPageId;

/// Errors from heap page and heap file operations.
#[derive(Debug)]
pub enum HeapError {
    /// Every slot of the page is occupied.
    PageFull,
    /// The tuple's schema does not match the page's schema.
    SchemaMismatch,
    /// The tuple's record id names a different page.
    WrongPage {
        /// The page the operation ran on.
        expected: HeapPageId,
        /// The page the tuple's record id names.
        found: HeapPageId,
    },
    /// The slot holds no tuple.
    EmptySlot(usize),
    /// The tuple carries no record id.
    MissingRecordId,
    /// The page number is outside the file.
    InvalidPageId {
        /// The requested page number.
        page_no: usize,
        /// The number of pages in the file.
        num_pages: usize,
    },
    /// File I/O failed.
    Io(std::io::Error),
    /// Page bytes failed to parse.
    Format(FormatError),
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapError::PageFull => write!(f, "page has no empty slots"),
            HeapError::SchemaMismatch => {
                write!(f, "tuple schema does not match the page schema")
            }
            HeapError::WrongPage { expected, found } => {
                write!(f, "tuple belongs to page {}, not page {}", found, expected)
            }
            HeapError::EmptySlot(slot) => write!(f, "slot {} holds no tuple", slot),
            HeapError::MissingRecordId => write!(f, "tuple carries no record id"),
            HeapError::InvalidPageId { page_no, num_pages } => {
                write!(
                    f,
                    "page {} out of range for a file of {} pages",
                    page_no, num_pages
                )
            }
            HeapError::Io(err) => write!(f, "heap file I/O failed: {}", err),
            HeapError::Format(err) => write!(f, "corrupt page bytes: {}", err),
        }
    }
}

impl std::error::Error for HeapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HeapError::Io(err) => Some(err),
            HeapError::Format(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for HeapError {
    fn from(err: std::io::Error) -> Self {
        HeapError::Io(err)
    }
}

impl From<FormatError> for HeapError {
    fn from(err: FormatError) -> Self {
        HeapError::Format(err)
    }
}
