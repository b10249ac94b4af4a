//! Component F (merge only): fragment renumbering.
//!
//! Before a second overlay can be merged behind a first, its `fragment@N`
//! nodes are renamed so their indices don't collide with the first
//! overlay's own fragments, and every `fragment@N` reference inside
//! `/__fixups__`, `/__symbols__` and `/__local_fixups__` is rewritten to
//! match. Grounded on `overlay_rename_fragments` / `rename_fragments_in_node`
//! / `count_fragments` in libfdt.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use fdt_raw::{Fdt, FdtError, ROOT};

use crate::error::{OverlayError, OverlayResult};

/// Renumbers every `fragment@N` node (and reference) in `second` so it
/// starts past the highest fragment index already used in `first`. A
/// `first` with no fragments at all leaves `second` untouched.
pub fn rename_fragments(first: &Fdt, second: &mut Fdt) -> OverlayResult<()> {
    let Some(max) = count_fragments(first)? else {
        return Ok(());
    };
    let delta = max.checked_add(1).ok_or(OverlayError::Fdt(FdtError::BadValue))?;

    rename_nodes(second, ROOT, delta)?;
    rename_fragments_in_node(second, "/__fixups__", delta)?;
    match rename_fragments_in_node(second, "/__symbols__", delta) {
        Ok(()) | Err(OverlayError::Fdt(FdtError::NotFound)) => {}
        Err(e) => return Err(e),
    }
    match second.path_offset("/__local_fixups__") {
        Ok(local) => rename_nodes(second, local, delta)?,
        Err(FdtError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn count_fragments(first: &Fdt) -> OverlayResult<Option<u32>> {
    let mut max = None;
    let mut child = first.first_subnode(ROOT)?;
    while let Some(c) = child {
        let name = first.get_name(c)?;
        if let Some(idx) = fragment_index(name) {
            if first.subnode_offset(c, "__overlay__")?.is_some() {
                max = Some(max.map_or(idx, |m: u32| m.max(idx)));
            }
        }
        child = first.next_subnode(c)?;
    }
    Ok(max)
}

fn fragment_index(name: &str) -> Option<u32> {
    name.strip_prefix("fragment@")?.parse().ok()
}

fn rename_nodes(overlay: &mut Fdt, parent: usize, delta: u32) -> OverlayResult<()> {
    let mut child = overlay.first_subnode(parent)?;
    while let Some(off) = child {
        let name = String::from(overlay.get_name(off)?);
        let next = overlay.next_subnode(off)?;
        if let Some(idx) = fragment_index(&name) {
            if overlay.subnode_offset(off, "__overlay__")?.is_some() {
                let new_idx = idx.checked_add(delta).ok_or(OverlayError::Fdt(FdtError::BadValue))?;
                overlay.set_name(off, &format!("fragment@{new_idx}"))?;
            }
        }
        child = next;
    }
    Ok(())
}

fn rename_fragments_in_node(overlay: &mut Fdt, path: &str, delta: u32) -> OverlayResult<()> {
    let node = overlay.path_offset(path)?;
    let mut prop = overlay.first_property_offset(node)?;
    while let Some(p) = prop {
        let (name, data) = overlay.get_property_by_offset(p)?;
        let name = String::from(name);
        let renamed = rename_fragment_refs(data, delta)?;
        let next = overlay.next_property_offset(p)?;
        if let Some(new_data) = renamed {
            overlay.set_property(node, &name, &new_data)?;
        }
        prop = next;
    }
    Ok(())
}

/// Rewrites every `fragment@<digits>` substring in `data`, shifting the
/// index by `delta`. Returns `None` if the pattern doesn't occur at all.
fn rename_fragment_refs(data: &[u8], delta: u32) -> OverlayResult<Option<Vec<u8>>> {
    const NEEDLE: &[u8] = b"fragment@";
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    let mut changed = false;

    while i < data.len() {
        if data[i..].starts_with(NEEDLE) {
            let digits_start = i + NEEDLE.len();
            let mut j = digits_start;
            while j < data.len() && data[j].is_ascii_digit() {
                j += 1;
            }
            if j > digits_start {
                let digits = core::str::from_utf8(&data[digits_start..j]).map_err(|_| OverlayError::BadOverlay)?;
                let idx: u32 = digits.parse().map_err(|_| OverlayError::BadOverlay)?;
                let new_idx = idx.checked_add(delta).ok_or(OverlayError::Fdt(FdtError::BadValue))?;
                out.extend_from_slice(NEEDLE);
                out.extend_from_slice(format!("{new_idx}").as_bytes());
                changed = true;
                i = j;
                continue;
            }
        }
        out.push(data[i]);
        i += 1;
    }
    Ok(if changed { Some(out) } else { None })
}
