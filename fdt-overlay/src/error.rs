//! Error type for the overlay engine.
//!
//! `OverlayError` wraps `fdt_raw::FdtError` for primitive-level failures
//! and adds the two overlay-specific status codes that sit above the raw
//! FDT error space.

pub type OverlayResult<T> = Result<T, OverlayError>;

/// Errors that can occur while applying or merging an overlay.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayError {
    /// A lower-level FDT primitive failed.
    #[error(transparent)]
    Fdt(#[from] fdt_raw::FdtError),
    /// The overlay does not satisfy one of the `fragment@N` / `__fixups__` /
    /// `__symbols__` conventions this engine relies on.
    #[error("malformed overlay")]
    BadOverlay,
    /// Phandle renumbering would overflow or produce the illegal sentinel.
    #[error("phandle space exhausted")]
    NoPhandles,
}

impl OverlayError {
    /// True for the lookup failures the driver tolerates in merge mode
    /// (a missing `__symbols__`/`__fixups__` entry is a no-op, not fatal).
    pub fn is_not_found(&self) -> bool {
        matches!(self, OverlayError::Fdt(fdt_raw::FdtError::NotFound))
    }
}

/// Outcome of a failed [`crate::merge`] call.
///
/// The `fdto_nospace` flag is set only when the error happened while
/// renaming the second overlay's fragments, the one stage that leaves the
/// base undamaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeFailure {
    pub error: OverlayError,
    /// If true, `NOSPACE` occurred while renaming fragments in the second
    /// overlay; the base was left undamaged and only `overlay` needs to
    /// grow before retrying. If false, both blobs have been damaged.
    pub fdto_nospace: bool,
}
