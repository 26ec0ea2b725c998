//! The column type enumeration.

use bytes::Buf;

use super::error::FormatError;
use super::field::Field;
use crate::config;

/// A column type.
///
/// The set is closed: every column is either a 32-bit signed integer or a
/// fixed-length string. Each type has a fixed on-disk width so that tuple
/// sizes are computable from the schema alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    /// 32-bit signed integer, big-endian two's complement.
    Int,
    /// Fixed-length UTF-8 string: a 4-byte big-endian length prefix followed
    /// by `string_len()` payload bytes, of which the first `len` are
    /// meaningful.
    Str,
}

impl Type {
    /// Returns the on-disk width of a field of this type in bytes.
    pub fn width(&self) -> usize {
        match self {
            Type::Int => 4,
            Type::Str => config::string_len() + 4,
        }
    }

    /// Parses one field of this type from the buffer, consuming exactly
    /// [`width`](Self::width) bytes on success.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] if the buffer is too short, the string length
    /// prefix is out of range, or the payload is not valid UTF-8.
    pub fn parse(&self, buf: &mut impl Buf) -> Result<Field, FormatError> {
        let width = self.width();
        if buf.remaining() < width {
            return Err(FormatError::Truncated {
                required: width,
                available: buf.remaining(),
            });
        }
        match self {
            Type::Int => Ok(Field::Int(buf.get_i32())),
            Type::Str => {
                let len = buf.get_i32();
                let payload_len = config::string_len();
                if len < 0 || len as usize > payload_len {
                    return Err(FormatError::BadStringLength(len));
                }
                let mut payload = vec![0u8; payload_len];
                buf.copy_to_slice(&mut payload);
                payload.truncate(len as usize);
                Ok(Field::Str(String::from_utf8(payload)?))
            }
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "INT"),
            Type::Str => write!(f, "STRING"),
        }
    }
}
