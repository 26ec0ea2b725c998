//! Tuple schema description.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::datum::Type;

/// One entry of a tuple schema: a column type with an optional name.
#[derive(Debug, Clone)]
pub struct TdItem {
    /// The column type.
    pub field_type: Type,
    /// The column name. Names may be absent and need not be unique.
    pub name: Option<String>,
}

impl fmt::Display for TdItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({})",
            self.name.as_deref().unwrap_or("null"),
            self.field_type
        )
    }
}

/// The schema of a tuple: an ordered, non-empty sequence of typed columns.
///
/// Equality and hashing are positional by type only; column names are
/// documentation for humans and never participate in schema comparison.
#[derive(Debug, Clone)]
pub struct TupleDesc {
    items: Vec<TdItem>,
}

impl TupleDesc {
    /// Creates a schema from parallel type and name arrays.
    ///
    /// # Panics
    ///
    /// Panics if `types` is empty or the arrays differ in length.
    pub fn new(types: Vec<Type>, names: Vec<Option<String>>) -> Self {
        assert_eq!(
            types.len(),
            names.len(),
            "type and name arrays must have equal length"
        );
        Self::from_items(
            types
                .into_iter()
                .zip(names)
                .map(|(field_type, name)| TdItem { field_type, name })
                .collect(),
        )
    }

    /// Creates a schema with anonymous (unnamed) columns.
    ///
    /// # Panics
    ///
    /// Panics if `types` is empty.
    pub fn anonymous(types: Vec<Type>) -> Self {
        Self::from_items(
            types
                .into_iter()
                .map(|field_type| TdItem {
                    field_type,
                    name: None,
                })
                .collect(),
        )
    }

    fn from_items(items: Vec<TdItem>) -> Self {
        assert!(!items.is_empty(), "a tuple schema needs at least one field");
        Self { items }
    }

    /// Returns the number of columns.
    pub fn num_fields(&self) -> usize {
        self.items.len()
    }

    /// Returns the type of column `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn field_type(&self, i: usize) -> Type {
        self.items[i].field_type
    }

    /// Returns the name of column `i`, if it has one.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn field_name(&self, i: usize) -> Option<&str> {
        self.items[i].name.as_deref()
    }

    /// Returns the index of the first column with the given name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.name.as_deref() == Some(name))
    }

    /// Returns the fixed byte size of tuples with this schema: the sum of the
    /// per-column type widths.
    pub fn size(&self) -> usize {
        self.items.iter().map(|item| item.field_type.width()).sum()
    }

    /// Concatenates two schemas: all columns of `a` followed by all of `b`.
    pub fn merge(a: &TupleDesc, b: &TupleDesc) -> TupleDesc {
        let mut items = a.items.clone();
        items.extend(b.items.iter().cloned());
        Self::from_items(items)
    }

    /// Iterates over the schema entries in column order.
    pub fn iter(&self) -> impl Iterator<Item = &TdItem> {
        self.items.iter()
    }
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .zip(other.items.iter())
                .all(|(a, b)| a.field_type == b.field_type)
    }
}

impl Eq for TupleDesc {}

impl Hash for TupleDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for item in &self.items {
            item.field_type.hash(state);
        }
    }
}

impl fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}
