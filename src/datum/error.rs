//! Error types for the datum module.

use std::fmt;

/// Errors from parsing field bytes.
#[derive(Debug)]
pub enum FormatError {
    /// Fewer bytes remained than the field width requires.
    Truncated {
        /// Bytes required by the field width.
        required: usize,
        /// Bytes available in the buffer.
        available: usize,
    },
    /// A string length prefix outside `0..=string_len()`.
    BadStringLength(i32),
    /// String payload was not valid UTF-8.
    Utf8(std::string::FromUtf8Error),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Truncated {
                required,
                available,
            } => {
                write!(
                    f,
                    "truncated field: need {} bytes, have {}",
                    required, available
                )
            }
            FormatError::BadStringLength(len) => {
                write!(f, "invalid string length prefix: {}", len)
            }
            FormatError::Utf8(err) => {
                write!(f, "invalid UTF-8 in string field: {}", err)
            }
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormatError::Utf8(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::string::FromUtf8Error> for FormatError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        FormatError::Utf8(err)
    }
}
