//! Owned, growable blob storage.
//!
//! `Fdt` itself never allocates: it edits whatever `&mut [u8]` it's given
//! and returns `NoSpace` once that buffer's headroom runs out. `OwnedFdt`
//! is the thin `Vec<u8>`-backed wrapper that owns the backing storage and
//! knows how to grow it, mirroring libfdt's `fdt_open_into` (used to
//! move a blob into a bigger buffer) and `fdt_pack` (shrink back down).

use alloc::vec;
use alloc::vec::Vec;

use crate::blob::Fdt;
use crate::error::{FdtError, FdtResult};
use crate::header;

/// A self-owned FDT blob that can grow its own backing buffer.
pub struct OwnedFdt {
    buf: Vec<u8>,
}

impl OwnedFdt {
    /// Takes ownership of an existing blob's bytes, trusting they already
    /// pass `check_header`. The buffer's length becomes the initial capacity.
    pub fn new(buf: Vec<u8>) -> FdtResult<Self> {
        header::check_header(&buf)?;
        Ok(Self { buf })
    }

    /// Copies `src` into a buffer padded with `extra` bytes of headroom.
    /// Equivalent to libfdt's `fdt_open_into` growing a blob into a
    /// larger allocation before editing it.
    pub fn open_into(src: &[u8], extra: usize) -> FdtResult<Self> {
        header::check_header(src)?;
        let mut buf = vec![0u8; src.len() + extra];
        buf[..src.len()].copy_from_slice(src);
        Ok(Self { buf })
    }

    /// Grows the backing buffer by `extra` bytes of zeroed headroom,
    /// without touching the blob's logical contents. Used by the
    /// retry-on-`NOSPACE` protocol to hand `Fdt::from_bytes` more room and
    /// retry a mutation that failed with `NoSpace`.
    pub fn grow(&mut self, extra: usize) {
        self.buf.resize(self.buf.len() + extra, 0);
    }

    /// Borrows this blob as an editable `Fdt`.
    pub fn as_fdt(&mut self) -> FdtResult<Fdt<'_>> {
        Fdt::from_bytes(&mut self.buf)
    }

    /// Shrinks the backing buffer down to the blob's logical `totalsize`,
    /// discarding any unused headroom. Equivalent to libfdt's
    /// `fdt_pack`.
    pub fn pack(&mut self) -> FdtResult<()> {
        let totalsize = header::totalsize(&self.buf)? as usize;
        if totalsize > self.buf.len() {
            return Err(FdtError::BadOffset);
        }
        self.buf.truncate(totalsize);
        Ok(())
    }

    /// The blob's raw bytes (capacity, including any headroom).
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes this wrapper, returning the backing buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}
