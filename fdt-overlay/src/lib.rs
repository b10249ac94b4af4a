//! Applies and merges Flattened Device Tree overlay blobs.
//!
//! Built on top of `fdt-raw`'s in-place blob editor. The overlay algorithm
//! itself (phandle renumbering, `__fixups__` resolution, fragment
//! application, `__symbols__` propagation, and the merge-only fragment
//! renumbering pass) is split across one module per concern, mirroring the
//! stages of the reference `fdt_overlay_apply` / `fdt_overlay_merge`
//! implementation this crate is modeled on.
#![no_std]

extern crate alloc;

mod driver;
mod error;
mod fixup;
mod fragment;
mod phandle;
mod rename;
mod symbols;
mod util;

pub use driver::{apply, merge};
pub use error::{MergeFailure, OverlayError, OverlayResult};
