//! Component B: phandle renumbering.
//!
//! Shifts every phandle an overlay declares by a constant delta, then walks
//! `/__local_fixups__` to rewrite every reference to one of those phandles
//! inside the overlay itself. Grounded on `overlay_adjust_local_phandles` /
//! libfdt's `overlay_update_local_node_references`.

use alloc::string::String;
use alloc::vec::Vec;

use fdt_raw::{Fdt, FdtError, FDT_PHANDLE_ILLEGAL, ROOT};

use crate::error::{OverlayError, OverlayResult};

/// Adds `delta` to every phandle declared anywhere in `overlay`, then
/// rewrites every local (overlay-internal) phandle reference recorded under
/// `/__local_fixups__` by the same amount.
pub fn renumber_phandles(overlay: &mut Fdt, delta: u32) -> OverlayResult<()> {
    adjust_node_phandles(overlay, ROOT, delta)?;
    update_local_references(overlay, delta)
}

fn adjust_node_phandles(overlay: &mut Fdt, node: usize, delta: u32) -> OverlayResult<()> {
    add_phandle_offset(overlay, node, "phandle", delta)?;
    add_phandle_offset(overlay, node, "linux,phandle", delta)?;

    let mut child = overlay.first_subnode(node)?;
    while let Some(c) = child {
        adjust_node_phandles(overlay, c, delta)?;
        child = overlay.next_subnode(c)?;
    }
    Ok(())
}

fn add_phandle_offset(overlay: &mut Fdt, node: usize, name: &str, delta: u32) -> OverlayResult<()> {
    let value = match overlay.get_property_u32(node, name) {
        Ok(Some(v)) => v,
        Ok(None) => return Ok(()),
        Err(FdtError::BadValue) => return Err(OverlayError::Fdt(FdtError::BadPhandle)),
        Err(e) => return Err(e.into()),
    };
    let adjusted = value.checked_add(delta).ok_or(OverlayError::NoPhandles)?;
    if adjusted == FDT_PHANDLE_ILLEGAL {
        return Err(OverlayError::NoPhandles);
    }
    overlay.setprop_inplace_u32(node, name, adjusted)?;
    Ok(())
}

fn update_local_references(overlay: &mut Fdt, delta: u32) -> OverlayResult<()> {
    let fixups = match overlay.path_offset("/__local_fixups__") {
        Ok(off) => off,
        Err(FdtError::NotFound) => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    update_local_node_references(overlay, ROOT, fixups, delta)
}

fn update_local_node_references(overlay: &mut Fdt, tree_node: usize, fixup_node: usize, delta: u32) -> OverlayResult<()> {
    let mut prop = overlay.first_property_offset(fixup_node)?;
    while let Some(p) = prop {
        let (name, data) = overlay.get_property_by_offset(p)?;
        if data.len() % 4 != 0 {
            return Err(OverlayError::BadOverlay);
        }
        let name = String::from(name);
        let offsets: Vec<u32> = data
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes(c.try_into().unwrap()))
            .collect();

        for poffset in offsets {
            let poffset = poffset as usize;
            let (_, tree_data) = overlay.get_property(tree_node, &name)?.ok_or(OverlayError::BadOverlay)?;
            if poffset + 4 > tree_data.len() {
                return Err(OverlayError::BadOverlay);
            }
            let current = u32::from_be_bytes(tree_data[poffset..poffset + 4].try_into().unwrap());
            // Phandles to fixup can be unaligned; wraps silently, matching libfdt.
            let adjusted = current.wrapping_add(delta);
            match overlay.setprop_inplace_partial(tree_node, &name, poffset, &adjusted.to_be_bytes()) {
                Err(FdtError::NoSpace) => return Err(OverlayError::BadOverlay),
                Err(e) => return Err(e.into()),
                Ok(()) => {}
            }
        }
        prop = overlay.next_property_offset(p)?;
    }

    let mut fixup_child = overlay.first_subnode(fixup_node)?;
    while let Some(fc) = fixup_child {
        let child_name = String::from(overlay.get_name(fc)?);
        let tree_child = overlay
            .subnode_offset(tree_node, &child_name)?
            .ok_or(OverlayError::BadOverlay)?;
        update_local_node_references(overlay, tree_child, fc, delta)?;
        fixup_child = overlay.next_subnode(fc)?;
    }
    Ok(())
}
