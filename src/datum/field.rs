//! Typed field values with fixed-width serialization.

use std::fmt;

use bytes::BufMut;

use super::types::Type;
use crate::config;

/// A single column value.
///
/// Fields are the unit of comparison and serialization. Integer fields are
/// compared numerically; string fields compare their meaningful prefix (the
/// stored string, which is already bounded by `string_len()`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    /// 32-bit signed integer value.
    Int(i32),
    /// String value of at most `string_len()` bytes.
    Str(String),
}

/// Comparison operators defined over compatible field pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Equals,
    GreaterThan,
    LessThan,
    LessThanOrEq,
    GreaterThanOrEq,
    /// Substring containment on strings; equality on integers.
    Like,
    NotEquals,
}

impl Field {
    /// Builds a string field, truncating to the longest prefix that fits the
    /// configured payload length without splitting a UTF-8 character.
    pub fn str(s: impl Into<String>) -> Field {
        let mut s = s.into();
        let max = config::string_len();
        if s.len() > max {
            let mut end = max;
            while !s.is_char_boundary(end) {
                end -= 1;
            }
            s.truncate(end);
        }
        Field::Str(s)
    }

    /// Returns the type of this field.
    pub fn ty(&self) -> Type {
        match self {
            Field::Int(_) => Type::Int,
            Field::Str(_) => Type::Str,
        }
    }

    /// Writes the field in its fixed-width on-disk form.
    ///
    /// Always writes exactly `self.ty().width()` bytes. String payloads
    /// beyond the meaningful length are zero-padded; overlong strings are
    /// truncated at a character boundary.
    pub fn serialize(&self, buf: &mut impl BufMut) {
        match self {
            Field::Int(v) => buf.put_i32(*v),
            Field::Str(s) => {
                let payload_len = config::string_len();
                let mut end = s.len().min(payload_len);
                while !s.is_char_boundary(end) {
                    end -= 1;
                }
                let bytes = &s.as_bytes()[..end];
                buf.put_i32(bytes.len() as i32);
                buf.put_slice(bytes);
                buf.put_bytes(0, payload_len - bytes.len());
            }
        }
    }

    /// Applies a comparison operator against another field.
    ///
    /// Returns `None` when the operand types are incompatible.
    pub fn compare(&self, op: CmpOp, other: &Field) -> Option<bool> {
        match (self, other) {
            (Field::Int(a), Field::Int(b)) => Some(match op {
                CmpOp::Equals | CmpOp::Like => a == b,
                CmpOp::NotEquals => a != b,
                CmpOp::GreaterThan => a > b,
                CmpOp::GreaterThanOrEq => a >= b,
                CmpOp::LessThan => a < b,
                CmpOp::LessThanOrEq => a <= b,
            }),
            (Field::Str(a), Field::Str(b)) => Some(match op {
                CmpOp::Equals => a == b,
                CmpOp::NotEquals => a != b,
                CmpOp::Like => a.contains(b.as_str()),
                CmpOp::GreaterThan => a > b,
                CmpOp::GreaterThanOrEq => a >= b,
                CmpOp::LessThan => a < b,
                CmpOp::LessThanOrEq => a <= b,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Str(s) => write!(f, "{}", s),
        }
    }
}
