//! Error type for FDT primitives.
//!
//! Every variant corresponds to one of libfdt's `FDT_ERR_*` status codes;
//! primitives never panic or return a sentinel integer, they return one of
//! these.

/// Result alias used throughout `fdt-raw`.
pub type FdtResult<T> = Result<T, FdtError>;

/// Errors that can occur while reading or editing an FDT blob.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdtError {
    /// The blob's magic number doesn't match `FDT_MAGIC`.
    #[error("bad magic")]
    BadMagic,
    /// The blob declares an unsupported structure-block version.
    #[error("bad version")]
    BadVersion,
    /// The structure block does not parse as a well-formed token stream.
    #[error("bad structure block")]
    BadStructure,
    /// A property value has an unexpected shape (wrong length, not a string, ...).
    #[error("bad property value")]
    BadValue,
    /// An offset or length falls outside the blob's bounds.
    #[error("offset out of bounds")]
    BadOffset,
    /// A path string is malformed or cannot be resolved.
    #[error("bad path")]
    BadPath,
    /// A phandle value is malformed (the all-ones sentinel, or wrong-length property).
    #[error("bad phandle")]
    BadPhandle,
    /// Growing the structure or strings block would overflow phandle/offset space.
    #[error("no space left in buffer")]
    NoSpace,
    /// A requested node, property, or path component does not exist.
    #[error("not found")]
    NotFound,
    /// The item being created already exists.
    #[error("already exists")]
    Exists,
    /// An internal consistency check failed; indicates an engine bug, not bad input.
    #[error("internal error")]
    Internal,
}
