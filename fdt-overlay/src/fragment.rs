//! Component D: fragment application (`fragment@N/__overlay__`).
//!
//! Walks every top-level `fragment@N` node in the overlay, resolves its
//! target in the base (by phandle or `target-path`), and deep-merges the
//! `__overlay__` subtree's properties and children into it. In merge mode,
//! a fragment whose target phandle simply isn't present in the base yet
//! (`NotFound`, left by an external reference a later overlay in the chain
//! still needs to supply) is instead copied into the combined blob
//! verbatim. A malformed or sentinel (`0xFFFFFFFF`) target phandle is
//! `BadPhandle`, a hard error in both modes. Grounded on
//! `overlay_apply_node` / `overlay_merge` / libfdt's `copy_node`.

use alloc::string::String;
use alloc::vec::Vec;

use fdt_raw::{Fdt, FdtError, ROOT};

use crate::error::OverlayError;
use crate::error::OverlayResult;
use crate::util::target_offset;

pub fn apply_fragments(base: &mut Fdt, overlay: &Fdt, merge: bool) -> OverlayResult<()> {
    let mut fragment = overlay.first_subnode(ROOT)?;
    while let Some(frag) = fragment {
        if let Some(overlay_node) = overlay.subnode_offset(frag, "__overlay__")? {
            match target_offset(base, overlay, frag) {
                Ok((target, _)) => apply_node(base, target, overlay, overlay_node)?,
                Err(OverlayError::Fdt(FdtError::NotFound)) if merge => {
                    copy_node(base, overlay, ROOT, frag)?;
                }
                Err(e) => return Err(e),
            }
        }
        fragment = overlay.next_subnode(frag)?;
    }
    Ok(())
}

/// Overwrites `target`'s properties with `overlay_node`'s, and recurses into
/// matching (or newly created) children. Existing properties/children of
/// `target` that the overlay node doesn't mention are left untouched.
fn apply_node(base: &mut Fdt, target: usize, overlay: &Fdt, overlay_node: usize) -> OverlayResult<()> {
    let mut prop = overlay.first_property_offset(overlay_node)?;
    while let Some(p) = prop {
        let (name, value) = overlay.get_property_by_offset(p)?;
        base.set_property(target, name, value)?;
        prop = overlay.next_property_offset(p)?;
    }

    let mut child = overlay.first_subnode(overlay_node)?;
    while let Some(c) = child {
        let name = overlay.get_name(c)?;
        let base_child = base.add_or_get_subnode(target, name)?;
        apply_node(base, base_child, overlay, c)?;
        child = overlay.next_subnode(c)?;
    }
    Ok(())
}

/// Copies `overlay_node` (and its whole subtree) into `base` under
/// `base_parent`, creating nodes as needed. Where a property already exists
/// on the base side, the overlay's bytes are appended after the existing
/// value rather than replacing it — this mirrors libfdt's `copy_node`,
/// which is also used to fold a second overlay's auxiliary nodes
/// (`__fixups__`, `__symbols__`, `__local_fixups__`) into the first.
pub(crate) fn copy_node(base: &mut Fdt, overlay: &Fdt, base_parent: usize, overlay_node: usize) -> OverlayResult<()> {
    let name = overlay.get_name(overlay_node)?;
    let base_node = base.add_or_get_subnode(base_parent, name)?;

    let mut child = overlay.first_subnode(overlay_node)?;
    while let Some(c) = child {
        copy_node(base, overlay, base_node, c)?;
        child = overlay.next_subnode(c)?;
    }

    let mut prop = overlay.first_property_offset(overlay_node)?;
    while let Some(p) = prop {
        let (name, value) = overlay.get_property_by_offset(p)?;
        let name = String::from(name);
        let next = overlay.next_property_offset(p)?;

        let mut combined: Vec<u8> = Vec::new();
        if let Some((_, existing)) = base.get_property(base_node, &name)? {
            combined.extend_from_slice(existing);
        }
        combined.extend_from_slice(value);
        base.set_property(base_node, &name, &combined)?;

        prop = next;
    }
    Ok(())
}
