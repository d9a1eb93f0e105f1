//! Error types shared by the memory store, image codec, and device model.

use std::fmt;
use std::io;
use std::path::PathBuf;

//===========================================================================//

/// A specialized `Result` type for memory device operations.
pub type MemResult<T> = Result<T, MemError>;

//===========================================================================//

/// The location within an image file at which a parse error occurred.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ImageLoc {
    /// A one-based line number within a hex-text image.
    Line(u32),
    /// A byte offset within a raw binary image.
    Offset(u64),
}

impl fmt::Display for ImageLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageLoc::Line(line) => write!(f, "line {line}"),
            ImageLoc::Offset(offset) => write!(f, "byte offset {offset}"),
        }
    }
}

//===========================================================================//

/// An error encountered while parsing a memory image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseError {
    /// Where in the image the error occurred.
    pub location: ImageLoc,
    /// The error message to report to the user.
    pub message: String,
}

impl ParseError {
    /// Constructs a parse error at the given line of a hex-text image.
    pub fn at_line(line: u32, message: String) -> ParseError {
        ParseError { location: ImageLoc::Line(line), message }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

//===========================================================================//

/// An error from a memory store, device, or image operation.
#[derive(Debug)]
pub enum MemError {
    /// An address or data width was outside its permitted range.
    Configuration {
        /// The name of the misconfigured attribute.
        attr: &'static str,
        /// A description of the problem.
        message: String,
    },
    /// An address range fell outside `[0, 2^addr_width)`.
    OutOfRange {
        /// The first address of the offending range.
        start: u64,
        /// The number of cells in the offending range.
        len: u64,
        /// The number of addressable cells in the store.
        limit: u64,
    },
    /// A memory image was malformed.
    Parse(ParseError),
    /// An image file could not be read or written.
    StorageAccess {
        /// The path of the image file.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// Another view currently holds the edit claim on the store.
    EditorBusy,
    /// The device that an edit view was bound to no longer exists.
    Detached,
}

impl MemError {
    pub(crate) fn config(attr: &'static str, message: String) -> MemError {
        MemError::Configuration { attr, message }
    }

    pub(crate) fn storage(
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> MemError {
        MemError::StorageAccess { path: path.into(), source }
    }
}

impl fmt::Display for MemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemError::Configuration { attr, message } => {
                write!(f, "invalid {attr}: {message}")
            }
            MemError::OutOfRange { start, len, limit } => write!(
                f,
                "range ${start:x}+{len} is outside the address space of \
                 {limit} cells"
            ),
            MemError::Parse(error) => write!(f, "malformed image: {error}"),
            MemError::StorageAccess { path, source } => {
                write!(f, "cannot access {}: {source}", path.display())
            }
            MemError::EditorBusy => {
                write!(f, "memory is being edited in another view")
            }
            MemError::Detached => write!(f, "memory device no longer exists"),
        }
    }
}

impl std::error::Error for MemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MemError::StorageAccess { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ParseError> for MemError {
    fn from(error: ParseError) -> MemError {
        MemError::Parse(error)
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{ImageLoc, MemError, ParseError};

    #[test]
    fn display_parse_error() {
        let error = ParseError::at_line(7, "expected value".to_string());
        assert_eq!(error.to_string(), "line 7: expected value");
        let error = ParseError {
            location: ImageLoc::Offset(13),
            message: "truncated word".to_string(),
        };
        assert_eq!(
            MemError::from(error).to_string(),
            "malformed image: byte offset 13: truncated word"
        );
    }

    #[test]
    fn display_out_of_range() {
        let error = MemError::OutOfRange { start: 0x400, len: 1, limit: 1024 };
        assert_eq!(
            error.to_string(),
            "range $400+1 is outside the address space of 1024 cells"
        );
    }
}

//===========================================================================//
