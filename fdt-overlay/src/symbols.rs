//! Component E: symbol table propagation (`/__symbols__`).
//!
//! Rewrites each of the overlay's `/__symbols__` entries — which point into
//! the overlay's own `/fragment@N/__overlay__/...` tree — into an absolute
//! path in the base, and records it under the base's `/__symbols__` (created
//! if absent). Grounded on libfdt's `overlay_symbol_update`.

use alloc::string::String;

use fdt_raw::{Fdt, FdtError, ROOT};

use crate::error::{OverlayError, OverlayResult};
use crate::util::target_offset;

pub fn update_symbols(base: &mut Fdt, overlay: &mut Fdt, merge: bool) -> OverlayResult<()> {
    let ov_sym = match overlay.path_offset("/__symbols__") {
        Ok(off) => off,
        Err(FdtError::NotFound) => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let mut root_sym: Option<usize> = None;
    let mut prop = overlay.first_property_offset(ov_sym)?;

    while let Some(p) = prop {
        let next_prop = overlay.next_property_offset(p)?;
        let (name, value) = overlay.get_property_by_offset(p)?;
        let name = String::from(name);
        let path = validate_symbol_value(value)?;

        let Some((frag_name, rel_path)) = resolve_symbol_path(path) else {
            // Doesn't resolve to anything under a fragment's __overlay__:
            // not an error, just nothing to propagate.
            prop = next_prop;
            continue;
        };

        let fragment = overlay.subnode_offset(ROOT, frag_name)?.ok_or(OverlayError::BadOverlay)?;
        overlay
            .subnode_offset(fragment, "__overlay__")?
            .ok_or(OverlayError::BadOverlay)?;

        let (target, target_path) = match target_offset(base, overlay, fragment) {
            Ok(v) => v,
            Err(OverlayError::Fdt(FdtError::NotFound)) if merge => {
                // That fragment is still unresolved and will be carried
                // verbatim by apply_fragments; nothing to propagate yet.
                prop = next_prop;
                continue;
            }
            Err(e) => return Err(e),
        };

        let owned_path;
        let base_path: &str = match target_path {
            Some(p) => p,
            None => {
                owned_path = base.get_path(target)?;
                &owned_path
            }
        };

        let mut combined = String::new();
        if base_path == "/" {
            combined.push('/');
            combined.push_str(rel_path);
        } else if rel_path.is_empty() {
            combined.push_str(base_path);
        } else {
            combined.push_str(base_path);
            combined.push('/');
            combined.push_str(rel_path);
        }

        let mut data = combined.into_bytes();
        data.push(0);

        let sym_node = match root_sym {
            Some(off) => off,
            None => {
                let off = base.add_or_get_subnode(ROOT, "__symbols__")?;
                root_sym = Some(off);
                off
            }
        };
        base.set_property(sym_node, &name, &data)?;

        if merge {
            overlay.delete_property(ov_sym, &name)?;
            if next_prop.is_none() {
                break;
            }
            continue;
        }
        prop = next_prop;
    }
    Ok(())
}

fn validate_symbol_value(data: &[u8]) -> OverlayResult<&str> {
    let last = data.len().checked_sub(1).ok_or(OverlayError::Fdt(FdtError::BadValue))?;
    if data[last] != 0 || data[..last].contains(&0) {
        return Err(OverlayError::Fdt(FdtError::BadValue));
    }
    core::str::from_utf8(&data[..last]).map_err(|_| OverlayError::Fdt(FdtError::BadValue))
}

/// Splits `/<fragment-name>/__overlay__[/<rest>]` into `(fragment-name,
/// rest)`. Returns `None` for anything else (a symbol that doesn't point
/// into a fragment's overlay tree, and so has nothing to propagate).
fn resolve_symbol_path(path: &str) -> Option<(&str, &str)> {
    let body = path.strip_prefix('/')?;
    let slash = body.find('/')?;
    let frag_name = &body[..slash];
    let rest = &body[slash..];
    if let Some(r) = rest.strip_prefix("/__overlay__/") {
        Some((frag_name, r))
    } else if rest == "/__overlay__" {
        Some((frag_name, ""))
    } else {
        None
    }
}
