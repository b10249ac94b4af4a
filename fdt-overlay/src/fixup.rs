//! Component C: external phandle fixups (`/__fixups__`).
//!
//! Resolves each `<path>:<property>:<offset>` triple against the base's
//! `/__symbols__` table and writes the resolved phandle into the overlay.
//! In merge mode, every resolved triple (other than a fragment's own
//! `target` pointer) is additionally recorded into the base's
//! `/__local_fixups__`, and the `__fixups__` property being read from is deleted once
//! fully resolved. Grounded on `overlay_fixup_phandles` /
//! libfdt's `overlay_add_to_local_fixups`.

use alloc::string::String;

use fdt_raw::{Fdt, FdtError, ROOT};

use crate::error::{OverlayError, OverlayResult};
use crate::util::{bytes_to_str, is_single_component_path, nul_strings, parse_triple, Triple};

/// Resolves every entry in `overlay`'s `/__fixups__` against `base`'s
/// `/__symbols__`. In merge mode, resolved entries are mirrored into
/// `base`'s `/__local_fixups__` and removed from the overlay as they
/// resolve; an entry that cannot be resolved (`NotFound`) is tolerated and
/// left in place for the fragment applier's verbatim-copy fallback to pick
/// up later.
pub fn resolve_fixups(base: &mut Fdt, overlay: &mut Fdt, merge: bool) -> OverlayResult<()> {
    let fixups_off = match overlay.path_offset("/__fixups__") {
        Ok(off) => off,
        Err(FdtError::NotFound) => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let mut symbols_off = base_symbols_offset(base)?;
    let mut prop = overlay.first_property_offset(fixups_off)?;

    while let Some(p) = prop {
        let next_prop = overlay.next_property_offset(p)?;
        match fixup_one_property(base, overlay, symbols_off, fixups_off, p, merge) {
            Ok(deleted) => {
                if deleted {
                    symbols_off = base_symbols_offset(base)?;
                    if next_prop.is_none() {
                        break;
                    }
                    // Deleting shifted the next entry down to this same
                    // offset; re-enter the loop without advancing `prop`.
                    continue;
                }
                prop = next_prop;
            }
            Err(e) if merge && e.is_not_found() => {
                prop = next_prop;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn base_symbols_offset(base: &Fdt) -> OverlayResult<Option<usize>> {
    match base.path_offset("/__symbols__") {
        Ok(off) => Ok(Some(off)),
        Err(FdtError::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Resolves every triple packed into one `__fixups__` property. Returns
/// `Ok(true)` when the property was consumed and deleted (merge mode only,
/// and only once every triple in it resolved).
fn fixup_one_property(
    base: &mut Fdt,
    overlay: &mut Fdt,
    symbols_off: Option<usize>,
    fixups_off: usize,
    prop_rel: usize,
    merge: bool,
) -> OverlayResult<bool> {
    let (label, data) = overlay.get_property_by_offset(prop_rel)?;
    let label = String::from(label);
    let data = data.to_vec();

    for triple in nul_strings(&data) {
        let t = parse_triple(triple?)?;
        fixup_one_phandle(base, overlay, symbols_off, &t, &label)?;
    }

    if !merge {
        return Ok(false);
    }

    for triple in nul_strings(&data) {
        let t = parse_triple(triple?)?;
        if is_single_component_path(t.path) && t.name.starts_with("target") {
            continue;
        }
        add_to_local_fixups(base, t.path, t.name, t.offset)?;
    }

    overlay.delete_property(fixups_off, &label)?;
    Ok(true)
}

fn fixup_one_phandle(base: &Fdt, overlay: &mut Fdt, symbols_off: Option<usize>, t: &Triple, label: &str) -> OverlayResult<()> {
    let symbols_off = symbols_off.ok_or(OverlayError::Fdt(FdtError::NotFound))?;
    let (_, symbol_path) = base
        .get_property(symbols_off, label)?
        .ok_or(OverlayError::Fdt(FdtError::NotFound))?;
    let symbol_path = bytes_to_str(symbol_path)?;
    let symbol_off = base.path_offset(symbol_path)?;
    let phandle = base
        .get_phandle(symbol_off)?
        .filter(|&v| v != 0)
        .ok_or(OverlayError::Fdt(FdtError::NotFound))?;

    let fixup_off = match overlay.path_offset(t.path) {
        Ok(off) => off,
        Err(FdtError::NotFound) => return Err(OverlayError::BadOverlay),
        Err(e) => return Err(e.into()),
    };
    match overlay.setprop_inplace_partial(fixup_off, t.name, t.offset, &phandle.to_be_bytes()) {
        Err(FdtError::NoSpace) => Err(OverlayError::BadOverlay),
        Err(e) => Err(e.into()),
        Ok(()) => Ok(()),
    }
}

fn add_to_local_fixups(base: &mut Fdt, path: &str, name: &str, offset: usize) -> OverlayResult<()> {
    let mut node = base.add_or_get_subnode(ROOT, "__local_fixups__")?;
    for component in path.split('/').filter(|s| !s.is_empty()) {
        node = base.add_or_get_subnode(node, component)?;
    }
    base.append_property_u32(node, name, offset as u32)?;
    Ok(())
}
