//! FDT header field access.
//!
//! The header is ten big-endian u32 fields at fixed offsets from the start
//! of the blob. Rather than parsing it into an owned struct that can go
//! stale, every field is read and written directly against the backing
//! buffer so header state can never diverge from the bytes the engine
//! actually mutates.

use crate::define::{FDT_FIRST_SUPPORTED_VERSION, FDT_HEADER_SIZE, FDT_LAST_SUPPORTED_VERSION, FDT_MAGIC};
use crate::error::{FdtError, FdtResult};

macro_rules! header_field {
    ($get:ident, $set:ident, $offset:expr) => {
        pub(crate) fn $get(buf: &[u8]) -> FdtResult<u32> {
            read_u32(buf, $offset)
        }

        pub(crate) fn $set(buf: &mut [u8], value: u32) -> FdtResult<()> {
            write_u32(buf, $offset, value)
        }
    };
}

fn read_u32(buf: &[u8], offset: usize) -> FdtResult<u32> {
    let bytes = buf.get(offset..offset + 4).ok_or(FdtError::BadOffset)?;
    Ok(u32::from_be_bytes(bytes.try_into().unwrap()))
}

fn write_u32(buf: &mut [u8], offset: usize, value: u32) -> FdtResult<()> {
    let bytes = buf.get_mut(offset..offset + 4).ok_or(FdtError::BadOffset)?;
    bytes.copy_from_slice(&value.to_be_bytes());
    Ok(())
}

header_field!(magic, set_magic, 0);
header_field!(totalsize, set_totalsize, 4);
header_field!(off_dt_struct, set_off_dt_struct, 8);
header_field!(off_dt_strings, set_off_dt_strings, 12);
header_field!(off_mem_rsvmap, set_off_mem_rsvmap, 16);
header_field!(version, set_version, 20);
header_field!(last_comp_version, set_last_comp_version, 24);
header_field!(boot_cpuid_phys, set_boot_cpuid_phys, 28);
header_field!(size_dt_strings, set_size_dt_strings, 32);
header_field!(size_dt_struct, set_size_dt_struct, 36);

/// Validates an FDT header without constructing an `Fdt`.
///
/// Checks magic, version range, and that `totalsize` fits within the
/// provided buffer. Grounded on libfdt's `fdt_check_header`, which every
/// driver entry point probes both input blobs with before doing anything else.
pub fn check_header(buf: &[u8]) -> FdtResult<()> {
    if buf.len() < FDT_HEADER_SIZE {
        return Err(FdtError::BadOffset);
    }
    if magic(buf)? != FDT_MAGIC {
        return Err(FdtError::BadMagic);
    }
    let version = self::version(buf)?;
    if version < FDT_FIRST_SUPPORTED_VERSION || last_comp_version(buf)? > FDT_LAST_SUPPORTED_VERSION {
        return Err(FdtError::BadVersion);
    }
    let total = totalsize(buf)? as usize;
    if total > buf.len() || total < FDT_HEADER_SIZE {
        return Err(FdtError::BadOffset);
    }
    Ok(())
}
