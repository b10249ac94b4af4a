//! Low-level, bounds-checked access to Flattened Device Tree (FDT) blobs.
//!
//! This crate reads and edits FDT binary blobs (as produced by `dtc`, the
//! device tree compiler) in place, over a caller-provided `&mut [u8]`. It
//! has no knowledge of overlays or fixups — that lives in `fdt-overlay`,
//! built on top of the primitives here.
#![no_std]

extern crate alloc;

mod blob;
mod define;
mod error;
mod header;
mod owned;

pub use blob::{
    damage_magic, Fdt, MemoryReservation, MemoryReservationIter, PropertyIter, SubnodeIter, ROOT,
};
pub use define::{
    align4, Token, FDT_DAMAGED_MAGIC, FDT_FIRST_SUPPORTED_VERSION, FDT_HEADER_SIZE,
    FDT_LAST_SUPPORTED_VERSION, FDT_MAGIC, FDT_PHANDLE_ILLEGAL, FDT_PHANDLE_NONE, FDT_RSV_ENTRY_SIZE,
    FDT_TAGSIZE,
};
pub use error::{FdtError, FdtResult};
pub use header::check_header;
pub use owned::OwnedFdt;
