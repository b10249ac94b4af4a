//! Builds the smallest possible valid FDT blob (an empty root node, no
//! properties, no reservations) for tests to grow and populate through
//! `fdt-raw`'s own editing primitives rather than a hand-rolled byte layout.

use fdt_raw::{OwnedFdt, Token, FDT_HEADER_SIZE, FDT_MAGIC};

pub fn empty_blob() -> Vec<u8> {
    let mem_rsvmap_off = FDT_HEADER_SIZE;
    let mem_rsvmap_size = 16; // one zero/zero terminator entry

    let mut struct_bytes = Vec::new();
    struct_bytes.extend_from_slice(&u32::from(Token::BeginNode).to_be_bytes());
    struct_bytes.extend_from_slice(&[0, 0, 0, 0]); // empty name, NUL + padding
    struct_bytes.extend_from_slice(&u32::from(Token::EndNode).to_be_bytes());
    struct_bytes.extend_from_slice(&u32::from(Token::End).to_be_bytes());

    let struct_off = mem_rsvmap_off + mem_rsvmap_size;
    let struct_size = struct_bytes.len();
    let strings_off = struct_off + struct_size;
    let strings_size = 0;
    let totalsize = strings_off + strings_size;

    let mut buf = Vec::with_capacity(totalsize);
    buf.extend_from_slice(&FDT_MAGIC.to_be_bytes());
    buf.extend_from_slice(&(totalsize as u32).to_be_bytes());
    buf.extend_from_slice(&(struct_off as u32).to_be_bytes());
    buf.extend_from_slice(&(strings_off as u32).to_be_bytes());
    buf.extend_from_slice(&(mem_rsvmap_off as u32).to_be_bytes());
    buf.extend_from_slice(&17u32.to_be_bytes()); // version
    buf.extend_from_slice(&16u32.to_be_bytes()); // last_comp_version
    buf.extend_from_slice(&0u32.to_be_bytes()); // boot_cpuid_phys
    buf.extend_from_slice(&(strings_size as u32).to_be_bytes());
    buf.extend_from_slice(&(struct_size as u32).to_be_bytes());
    debug_assert_eq!(buf.len(), FDT_HEADER_SIZE);

    buf.extend_from_slice(&[0u8; 16]);
    buf.extend_from_slice(&struct_bytes);

    buf
}

/// An empty blob opened with `extra` bytes of growth headroom, ready for
/// tests to populate via `Fdt`'s editing methods.
pub fn blank(extra: usize) -> OwnedFdt {
    OwnedFdt::open_into(&empty_blob(), extra).expect("a freshly built empty blob is always well-formed")
}
