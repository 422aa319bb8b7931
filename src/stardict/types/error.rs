//! Custom error types for the stardict-codec crate.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum StardictError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The data is structurally invalid or does not conform to the StarDict format.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A record ended before all of its fields could be decoded.
    #[error("Truncated {context} at byte offset {offset}")]
    Truncated { context: &'static str, offset: u64 },

    /// A definition entry carries a type marker outside the known set.
    #[error("Unknown content type marker {0:#04x}")]
    UnknownContentType(u8),

    /// Offsets may only be stored as 32 or 64 bit integers.
    #[error("Unsupported offset width: {0} bits. Only 32 and 64 are supported.")]
    UnsupportedOffsetWidth(u32),

    /// A declared count of items does not match the actual number of items found.
    #[error("Count mismatch for {item_type}: expected {expected}, but found {found}")]
    CountMismatch {
        item_type: &'static str,
        expected: u64,
        found: u64,
    },

    /// A file or region has an unexpected size.
    #[error("Size mismatch for {context}: expected {expected} bytes, but found {found} bytes")]
    SizeMismatch {
        context: &'static str,
        expected: u64,
        found: u64,
    },

    /// Input handed to a writer violates the dictionary's declared layout.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A builder operation was called out of order.
    #[error("Cannot {operation} while the builder is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// Another thread panicked while holding the definitions handle.
    #[error("Definitions file lock was poisoned")]
    LockPoisoned,

    /// Any of the above, attributed to the file it came from.
    #[error("{}: {source}", .path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<StardictError>,
    },
}

impl StardictError {
    /// Attaches the failing file to this error.
    pub fn in_file(self, path: impl AsRef<Path>) -> Self {
        StardictError::InFile {
            path: path.as_ref().to_path_buf(),
            source: Box::new(self),
        }
    }

    /// Returns the underlying error, looking through any file attribution.
    pub fn root(&self) -> &StardictError {
        match self {
            StardictError::InFile { source, .. } => source.root(),
            other => other,
        }
    }

    /// True for malformed or truncated bytes encountered on read.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self.root(),
            StardictError::InvalidFormat(_)
                | StardictError::Truncated { .. }
                | StardictError::UnknownContentType(_)
                | StardictError::UnsupportedOffsetWidth(_)
                | StardictError::CountMismatch { .. }
                | StardictError::SizeMismatch { .. }
        )
    }

    /// True when a writer rejected its input.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self.root(), StardictError::SchemaMismatch(_))
    }
}

/// A convenience `Result` type alias using the crate's `StardictError` type.
pub type Result<T> = std::result::Result<T, StardictError>;

/// Extension for attributing errors to a file path.
pub(crate) trait ResultExt<T> {
    fn in_file(self, path: &Path) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn in_file(self, path: &Path) -> Result<T> {
        self.map_err(|e| e.in_file(path))
    }
}
