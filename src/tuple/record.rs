//! Tuples and record identifiers.

use std::fmt;
use std::sync::Arc;

use bytes::BufMut;

use super::desc::TupleDesc;
use crate::datum::Field;
use crate::storage::HeapPageId;

/// The identity of a tuple within a table: the page it lives on and its slot
/// index within that page.
///
/// A record id is assigned when a tuple is inserted into a page and becomes
/// meaningless once the tuple is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    page_id: HeapPageId,
    tuple_no: usize,
}

impl RecordId {
    /// Creates a record id for slot `tuple_no` of the given page.
    pub fn new(page_id: HeapPageId, tuple_no: usize) -> Self {
        Self { page_id, tuple_no }
    }

    /// Returns the page this record id references.
    pub fn page_id(&self) -> HeapPageId {
        self.page_id
    }

    /// Returns the slot index within the page.
    pub fn tuple_no(&self) -> usize {
        self.tuple_no
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.page_id, self.tuple_no)
    }
}

/// A row valued per a [`TupleDesc`].
///
/// Invariant: `fields[i].ty() == td.field_type(i)` for every column, enforced
/// at construction and on every field update.
///
/// Equality compares the schema (positionally, by type) and the field values;
/// the record id is identity metadata and does not participate.
#[derive(Debug, Clone)]
pub struct Tuple {
    td: Arc<TupleDesc>,
    fields: Vec<Field>,
    rid: Option<RecordId>,
}

impl Tuple {
    /// Creates a tuple from a schema and matching field values.
    ///
    /// # Panics
    ///
    /// Panics if the field count or any field type disagrees with the schema.
    pub fn new(td: Arc<TupleDesc>, fields: Vec<Field>) -> Self {
        assert_eq!(
            fields.len(),
            td.num_fields(),
            "tuple has {} fields, schema expects {}",
            fields.len(),
            td.num_fields()
        );
        for (i, field) in fields.iter().enumerate() {
            assert_eq!(
                field.ty(),
                td.field_type(i),
                "field {} has type {}, schema expects {}",
                i,
                field.ty(),
                td.field_type(i)
            );
        }
        Self {
            td,
            fields,
            rid: None,
        }
    }

    /// Returns the schema of this tuple.
    pub fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.td
    }

    /// Returns the value of column `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn field(&self, i: usize) -> &Field {
        &self.fields[i]
    }

    /// Replaces the value of column `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range or the value's type disagrees with the
    /// schema.
    pub fn set_field(&mut self, i: usize, field: Field) {
        assert_eq!(
            field.ty(),
            self.td.field_type(i),
            "field {} has type {}, schema expects {}",
            i,
            field.ty(),
            self.td.field_type(i)
        );
        self.fields[i] = field;
    }

    /// Returns all field values in column order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the record id of this tuple's home slot, if it has been stored.
    pub fn record_id(&self) -> Option<RecordId> {
        self.rid
    }

    /// Sets or clears the record id.
    pub fn set_record_id(&mut self, rid: Option<RecordId>) {
        self.rid = rid;
    }

    /// Writes the tuple's fields in schema order, `td.size()` bytes in total.
    pub fn serialize(&self, buf: &mut impl BufMut) {
        for field in &self.fields {
            field.serialize(buf);
        }
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.td == other.td && self.fields == other.fields
    }
}

impl Eq for Tuple {}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Type;

    fn two_int_schema() -> Arc<TupleDesc> {
        Arc::new(TupleDesc::anonymous(vec![Type::Int, Type::Int]))
    }

    #[test]
    fn test_construction_and_access() {
        let td = two_int_schema();
        let tuple = Tuple::new(td.clone(), vec![Field::Int(1), Field::Int(2)]);
        assert_eq!(tuple.field(0), &Field::Int(1));
        assert_eq!(tuple.field(1), &Field::Int(2));
        assert_eq!(tuple.record_id(), None);
        assert_eq!(**tuple.tuple_desc(), *td);
    }

    #[test]
    #[should_panic(expected = "type")]
    fn test_field_type_mismatch_rejected() {
        Tuple::new(two_int_schema(), vec![Field::Int(1), Field::str("x")]);
    }

    #[test]
    #[should_panic(expected = "fields")]
    fn test_field_count_mismatch_rejected() {
        Tuple::new(two_int_schema(), vec![Field::Int(1)]);
    }

    #[test]
    fn test_set_field() {
        let mut tuple = Tuple::new(two_int_schema(), vec![Field::Int(1), Field::Int(2)]);
        tuple.set_field(1, Field::Int(9));
        assert_eq!(tuple.field(1), &Field::Int(9));
    }

    #[test]
    fn test_equality_ignores_record_id() {
        let td = two_int_schema();
        let a = Tuple::new(td.clone(), vec![Field::Int(1), Field::Int(2)]);
        let mut b = Tuple::new(td, vec![Field::Int(1), Field::Int(2)]);
        b.set_record_id(Some(RecordId::new(HeapPageId::new(7, 0), 3)));
        assert_eq!(a, b);
    }

    #[test]
    fn test_serialize_width() {
        let td = Arc::new(TupleDesc::anonymous(vec![Type::Int, Type::Str]));
        let tuple = Tuple::new(td.clone(), vec![Field::Int(5), Field::str("abc")]);
        let mut buf = Vec::new();
        tuple.serialize(&mut buf);
        assert_eq!(buf.len(), td.size());
    }

    #[test]
    fn test_record_id_structural_equality() {
        let a = RecordId::new(HeapPageId::new(1, 2), 3);
        let b = RecordId::new(HeapPageId::new(1, 2), 3);
        let c = RecordId::new(HeapPageId::new(1, 2), 4);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display() {
        let tuple = Tuple::new(two_int_schema(), vec![Field::Int(1), Field::Int(2)]);
        assert_eq!(tuple.to_string(), "1\t2");
    }
}
