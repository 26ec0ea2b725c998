//! Process-wide storage configuration.
//!
//! Two knobs control the on-disk format: the page size (the unit of I/O and
//! buffer-pool caching) and the fixed string field length. Both are read by
//! the codec and page-geometry code on every operation, so they must be set
//! before the first page is read or written; changing them afterwards makes
//! existing files unreadable.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default page size in bytes.
///
/// Matches the OS page size on most systems; small enough that a page of
/// two-int tuples still exercises multi-byte occupancy headers in tests.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default payload length of a string field in bytes.
pub const DEFAULT_STRING_LEN: usize = 128;

static PAGE_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_PAGE_SIZE);
static STRING_LEN: AtomicUsize = AtomicUsize::new(DEFAULT_STRING_LEN);

/// Returns the current page size in bytes.
pub fn page_size() -> usize {
    PAGE_SIZE.load(Ordering::Relaxed)
}

/// Overrides the page size. Must happen before the first page I/O.
pub fn set_page_size(size: usize) {
    assert!(size > 0, "page size must be positive");
    PAGE_SIZE.store(size, Ordering::Relaxed);
}

/// Returns the current string field payload length in bytes.
pub fn string_len() -> usize {
    STRING_LEN.load(Ordering::Relaxed)
}

/// Overrides the string field payload length. Must happen before the first
/// page I/O.
pub fn set_string_len(len: usize) {
    assert!(len > 0, "string length must be positive");
    STRING_LEN.store(len, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(string_len(), DEFAULT_STRING_LEN);
        assert!(page_size().is_power_of_two());
    }
}
