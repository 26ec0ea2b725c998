//! Slotted heap page with fixed-size tuple slots and an occupancy bitmap.
//!
//! Layout for a page of size `P` holding tuples of `S` bytes:
//!
//! ```text
//! +--------------------------+ offset 0
//! | header bitmap            |  ceil(num_slots / 8) bytes, LSB-first
//! +--------------------------+ offset header_bytes
//! | slot 0 (S bytes)         |
//! | ...                      |
//! | slot num_slots - 1       |
//! +--------------------------+ offset header_bytes + num_slots * S
//! | zero padding             |
//! +--------------------------+ offset P
//! ```
//!
//! `num_slots = (P * 8) / (S * 8 + 1)`: each tuple costs its `S` bytes plus
//! one header bit. Bit `i` of the bitmap lives in byte `i / 8` at position
//! `i % 8` counted from the least significant end; it is set when slot `i`
//! holds a tuple. Bits beyond `num_slots` are reserved and stay zero.
//!
//! The invariant that makes pages safe to persist: parsing `page_data()`
//! reproduces the same page, byte for byte.

use std::sync::Arc;

use bytes::{Buf, BufMut};
use parking_lot::Mutex;

use super::error::HeapError;
use crate::config;
use crate::storage::HeapPageId;
use crate::tuple::{RecordId, Tuple, TupleDesc};
use crate::tx::TransactionId;

/// Returns the number of tuple slots a page holds for the given schema.
pub fn num_slots_for(td: &TupleDesc) -> usize {
    (config::page_size() * 8) / (td.size() * 8 + 1)
}

fn header_bytes_for(num_slots: usize) -> usize {
    num_slots.div_ceil(8)
}

/// One page of a heap file: a parsed, mutable slot container.
///
/// The buffer pool owns pages; a page knows only its own id. All slot
/// mutation assumes the caller holds an exclusive latch on the page (the
/// write half of its pool handle). The before-image and the dirty mark have
/// their own internal locks so they stay observable under a shared latch.
pub struct HeapPage {
    pid: HeapPageId,
    td: Arc<TupleDesc>,
    num_slots: usize,
    header: Vec<u8>,
    tuples: Vec<Option<Tuple>>,
    /// Byte image of the page as of load time (or the last explicit
    /// snapshot); consumed by recovery collaborators.
    old_data: Mutex<Vec<u8>>,
    /// The transaction that last dirtied the page; `None` when clean.
    dirtier: Mutex<Option<TransactionId>>,
}

impl HeapPage {
    /// Parses a page from its on-disk bytes.
    ///
    /// Occupied slots are decoded into tuples carrying their record ids;
    /// empty slots are skipped. The raw bytes become the initial
    /// before-image.
    ///
    /// # Errors
    ///
    /// Returns `HeapError::Format` if an occupied slot's bytes do not decode
    /// as fields of the schema.
    ///
    /// # Panics
    ///
    /// Panics if `data` is not exactly one page long.
    pub fn new(pid: HeapPageId, td: Arc<TupleDesc>, data: &[u8]) -> Result<Self, HeapError> {
        assert_eq!(
            data.len(),
            config::page_size(),
            "page buffer must be exactly one page"
        );

        let num_slots = num_slots_for(&td);
        let header = data[..header_bytes_for(num_slots)].to_vec();
        let tuple_size = td.size();

        let mut tuples = Vec::with_capacity(num_slots);
        let mut cursor = &data[header.len()..];
        for slot in 0..num_slots {
            if header[slot / 8] & (1 << (slot % 8)) != 0 {
                let mut fields = Vec::with_capacity(td.num_fields());
                for i in 0..td.num_fields() {
                    fields.push(td.field_type(i).parse(&mut cursor)?);
                }
                let mut tuple = Tuple::new(td.clone(), fields);
                tuple.set_record_id(Some(RecordId::new(pid, slot)));
                tuples.push(Some(tuple));
            } else {
                cursor.advance(tuple_size);
                tuples.push(None);
            }
        }

        Ok(Self {
            pid,
            td,
            num_slots,
            header,
            tuples,
            old_data: Mutex::new(data.to_vec()),
            dirtier: Mutex::new(None),
        })
    }

    /// Returns the bytes of an empty page.
    pub fn empty_page_data() -> Vec<u8> {
        vec![0; config::page_size()]
    }

    /// Returns this page's id.
    pub fn id(&self) -> HeapPageId {
        self.pid
    }

    /// Returns the schema of the tuples this page stores.
    pub fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.td
    }

    /// Returns the number of tuple slots on this page.
    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    /// Returns true if slot `i` holds a tuple.
    pub fn is_slot_used(&self, i: usize) -> bool {
        self.header[i / 8] & (1 << (i % 8)) != 0
    }

    /// Returns the number of free slots.
    pub fn num_empty_slots(&self) -> usize {
        (0..self.num_slots).filter(|&i| !self.is_slot_used(i)).count()
    }

    fn set_slot_used(&mut self, i: usize, used: bool) {
        let mask = 1 << (i % 8);
        if used {
            self.header[i / 8] |= mask;
        } else {
            self.header[i / 8] &= !mask;
        }
    }

    /// Serializes the page to its on-disk form: header, slots in order
    /// (zeroes for empty slots), zero padding to the page size.
    ///
    /// Parsing the result reproduces this page byte for byte.
    pub fn page_data(&self) -> Vec<u8> {
        let page_size = config::page_size();
        let tuple_size = self.td.size();

        let mut data = Vec::with_capacity(page_size);
        data.put_slice(&self.header);
        for slot in &self.tuples {
            match slot {
                Some(tuple) => tuple.serialize(&mut data),
                None => data.put_bytes(0, tuple_size),
            }
        }
        data.put_bytes(0, page_size - data.len());
        data
    }

    /// Stores the tuple in the lowest-numbered free slot and assigns its
    /// record id.
    ///
    /// The page is not marked dirty here; that is the caller's policy.
    ///
    /// # Errors
    ///
    /// Returns `SchemaMismatch` if the tuple's schema differs from the
    /// page's, or `PageFull` if every slot is occupied.
    pub fn insert_tuple(&mut self, mut tuple: Tuple) -> Result<RecordId, HeapError> {
        if **tuple.tuple_desc() != *self.td {
            return Err(HeapError::SchemaMismatch);
        }
        let slot = (0..self.num_slots)
            .find(|&i| !self.is_slot_used(i))
            .ok_or(HeapError::PageFull)?;

        let rid = RecordId::new(self.pid, slot);
        tuple.set_record_id(Some(rid));
        self.set_slot_used(slot, true);
        self.tuples[slot] = Some(tuple);
        Ok(rid)
    }

    /// Frees the slot named by the tuple's record id.
    ///
    /// # Errors
    ///
    /// Returns `MissingRecordId` if the tuple was never stored, `WrongPage`
    /// if its record id names another page, or `EmptySlot` if the slot is
    /// already free.
    pub fn delete_tuple(&mut self, tuple: &Tuple) -> Result<(), HeapError> {
        let rid = tuple.record_id().ok_or(HeapError::MissingRecordId)?;
        if rid.page_id() != self.pid {
            return Err(HeapError::WrongPage {
                expected: self.pid,
                found: rid.page_id(),
            });
        }
        let slot = rid.tuple_no();
        if slot >= self.num_slots || !self.is_slot_used(slot) {
            return Err(HeapError::EmptySlot(slot));
        }
        self.set_slot_used(slot, false);
        self.tuples[slot] = None;
        Ok(())
    }

    /// Returns the occupied tuples in ascending slot order.
    ///
    /// The iterator is a snapshot of occupancy at the time of the call.
    pub fn iter(&self) -> std::vec::IntoIter<Tuple> {
        let live: Vec<Tuple> = self.tuples.iter().flatten().cloned().collect();
        live.into_iter()
    }

    /// Sets or clears the dirty mark, recording the dirtying transaction.
    pub fn mark_dirty(&self, dirtier: Option<TransactionId>) {
        *self.dirtier.lock() = dirtier;
    }

    /// Returns the transaction that last dirtied this page, or `None` when
    /// the page is clean. The pair (dirty, dirtier) is observed atomically.
    pub fn dirtier(&self) -> Option<TransactionId> {
        *self.dirtier.lock()
    }

    /// Refreshes the before-image to the page's current bytes.
    pub fn set_before_image(&self) {
        let data = self.page_data();
        *self.old_data.lock() = data;
    }

    /// Returns the page as of its before-image.
    pub fn before_image(&self) -> Result<HeapPage, HeapError> {
        let data = self.old_data.lock().clone();
        HeapPage::new(self.pid, self.td.clone(), &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::{Field, Type};

    fn two_int_schema() -> Arc<TupleDesc> {
        Arc::new(TupleDesc::anonymous(vec![Type::Int, Type::Int]))
    }

    fn pid() -> HeapPageId {
        HeapPageId::new(7, 0)
    }

    fn empty_page(td: &Arc<TupleDesc>) -> HeapPage {
        HeapPage::new(pid(), td.clone(), &HeapPage::empty_page_data()).unwrap()
    }

    fn pair(td: &Arc<TupleDesc>, a: i32, b: i32) -> Tuple {
        Tuple::new(td.clone(), vec![Field::Int(a), Field::Int(b)])
    }

    #[test]
    fn test_geometry() {
        let td = two_int_schema();
        // 8-byte tuples at a 4096-byte page: 32768 bits / 65 bits per slot.
        assert_eq!(num_slots_for(&td), 504);
        let page = empty_page(&td);
        assert_eq!(page.num_slots(), 504);
        assert_eq!(page.num_empty_slots(), 504);
    }

    #[test]
    fn test_insert_assigns_lowest_free_slot() {
        let td = two_int_schema();
        let mut page = empty_page(&td);

        for i in 0..3 {
            let rid = page.insert_tuple(pair(&td, i, i)).unwrap();
            assert_eq!(rid.page_id(), pid());
            assert_eq!(rid.tuple_no(), i as usize);
        }
        assert_eq!(page.num_empty_slots(), page.num_slots() - 3);
        assert!(page.is_slot_used(0));
        assert!(!page.is_slot_used(3));
    }

    #[test]
    fn test_insert_schema_mismatch() {
        let td = two_int_schema();
        let mut page = empty_page(&td);
        let other = Arc::new(TupleDesc::anonymous(vec![Type::Int]));
        let tuple = Tuple::new(other, vec![Field::Int(1)]);
        assert!(matches!(
            page.insert_tuple(tuple),
            Err(HeapError::SchemaMismatch)
        ));
    }

    #[test]
    fn test_insert_until_full() {
        let td = two_int_schema();
        let mut page = empty_page(&td);
        for i in 0..page.num_slots() {
            page.insert_tuple(pair(&td, i as i32, 0)).unwrap();
        }
        assert_eq!(page.num_empty_slots(), 0);
        assert!(matches!(
            page.insert_tuple(pair(&td, -1, -1)),
            Err(HeapError::PageFull)
        ));
    }

    #[test]
    fn test_delete_and_slot_reuse() {
        let td = two_int_schema();
        let mut page = empty_page(&td);
        for i in 0..4 {
            page.insert_tuple(pair(&td, i, i)).unwrap();
        }

        let mut victim = pair(&td, 1, 1);
        victim.set_record_id(Some(RecordId::new(pid(), 1)));
        page.delete_tuple(&victim).unwrap();
        assert!(!page.is_slot_used(1));
        assert_eq!(page.num_empty_slots(), page.num_slots() - 3);

        // The freed slot is the lowest free one, so the next insert takes it.
        let rid = page.insert_tuple(pair(&td, 9, 9)).unwrap();
        assert_eq!(rid.tuple_no(), 1);
    }

    #[test]
    fn test_delete_errors() {
        let td = two_int_schema();
        let mut page = empty_page(&td);
        page.insert_tuple(pair(&td, 1, 1)).unwrap();

        let unstored = pair(&td, 1, 1);
        assert!(matches!(
            page.delete_tuple(&unstored),
            Err(HeapError::MissingRecordId)
        ));

        let mut elsewhere = pair(&td, 1, 1);
        elsewhere.set_record_id(Some(RecordId::new(HeapPageId::new(7, 5), 0)));
        assert!(matches!(
            page.delete_tuple(&elsewhere),
            Err(HeapError::WrongPage { .. })
        ));

        let mut empty = pair(&td, 1, 1);
        empty.set_record_id(Some(RecordId::new(pid(), 3)));
        assert!(matches!(
            page.delete_tuple(&empty),
            Err(HeapError::EmptySlot(3))
        ));
    }

    #[test]
    fn test_iterator_ascending_skips_empty() {
        let td = two_int_schema();
        let mut page = empty_page(&td);
        for i in 0..5 {
            page.insert_tuple(pair(&td, i, 2 * i)).unwrap();
        }
        let mut victim = pair(&td, 2, 4);
        victim.set_record_id(Some(RecordId::new(pid(), 2)));
        page.delete_tuple(&victim).unwrap();

        let values: Vec<i32> = page
            .iter()
            .map(|t| match t.field(0) {
                Field::Int(v) => *v,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(values, vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_roundtrip_bytes_and_tuples() {
        let td = two_int_schema();
        let mut page = empty_page(&td);
        for i in 0..10 {
            page.insert_tuple(pair(&td, i, 2 * i)).unwrap();
        }

        let data = page.page_data();
        assert_eq!(data.len(), config::page_size());
        // Ten occupied slots: eight bits in the first byte, two in the second.
        assert_eq!(data[0], 0xFF);
        assert_eq!(data[1], 0x03);
        assert!(data[2..header_bytes_for(page.num_slots())]
            .iter()
            .all(|&b| b == 0));

        let parsed = HeapPage::new(pid(), td.clone(), &data).unwrap();
        assert_eq!(parsed.page_data(), data);

        let original: Vec<Tuple> = page.iter().collect();
        let reparsed: Vec<Tuple> = parsed.iter().collect();
        assert_eq!(original, reparsed);
    }

    #[test]
    fn test_parse_rejects_corrupt_string_slot() {
        let td = Arc::new(TupleDesc::anonymous(vec![Type::Str]));
        let mut data = HeapPage::empty_page_data();
        let header_bytes = header_bytes_for(num_slots_for(&td));
        // Mark slot 0 occupied but give it an invalid length prefix.
        data[0] = 0x01;
        data[header_bytes..header_bytes + 4].copy_from_slice(&(-1i32).to_be_bytes());
        assert!(matches!(
            HeapPage::new(pid(), td, &data),
            Err(HeapError::Format(_))
        ));
    }

    #[test]
    fn test_dirty_mark() {
        let td = two_int_schema();
        let page = empty_page(&td);
        assert_eq!(page.dirtier(), None);

        let tid = TransactionId::new();
        page.mark_dirty(Some(tid));
        assert_eq!(page.dirtier(), Some(tid));
        page.mark_dirty(None);
        assert_eq!(page.dirtier(), None);
    }

    #[test]
    fn test_before_image() {
        let td = two_int_schema();
        let mut page = empty_page(&td);
        page.insert_tuple(pair(&td, 1, 2)).unwrap();

        // The before-image is still the load-time (empty) page.
        let before = page.before_image().unwrap();
        assert_eq!(before.iter().count(), 0);

        page.set_before_image();
        let refreshed = page.before_image().unwrap();
        assert_eq!(refreshed.iter().count(), 1);
        assert_eq!(refreshed.page_data(), page.page_data());
    }
}
