//! Component G: the two public entry points, `apply` and `merge`.
//!
//! Sequences components B through F and implements the damaged-magic
//! contract from libfdt's `fdt_overlay_apply` / `fdt_overlay_merge`:
//! an overlay that has been applied or merged is no longer valid as a
//! standalone blob, and either blob involved in a failed operation is left
//! unusable so a caller can't silently reapply half-mutated state.

use fdt_raw::{Fdt, FdtError};

use crate::error::{MergeFailure, OverlayError, OverlayResult};
use crate::fixup::resolve_fixups;
use crate::fragment::{apply_fragments, copy_node};
use crate::phandle::renumber_phandles;
use crate::rename::rename_fragments;
use crate::symbols::update_symbols;

/// Applies `overlay` onto `base` in place. `overlay` is always left damaged
/// afterwards, win or lose; `base` is additionally damaged on failure.
pub fn apply(base: &mut Fdt, overlay: &mut Fdt) -> OverlayResult<()> {
    match apply_inner(base, overlay) {
        Ok(()) => {
            overlay.damage();
            Ok(())
        }
        Err(e) => {
            overlay.damage();
            base.damage();
            Err(e)
        }
    }
}

fn apply_inner(base: &mut Fdt, overlay: &mut Fdt) -> OverlayResult<()> {
    let delta = base.max_phandle()?.checked_add(1).ok_or(OverlayError::NoPhandles)?;
    log::debug!("apply: renumbering overlay phandles by {delta}");
    renumber_phandles(overlay, delta)?;
    log::debug!("apply: resolving fixups");
    resolve_fixups(base, overlay, false)?;
    log::debug!("apply: applying fragments");
    apply_fragments(base, overlay, false)?;
    log::debug!("apply: updating symbols");
    update_symbols(base, overlay, false)?;
    Ok(())
}

/// Folds `second` behind `first`, producing a combined overlay that can
/// later be applied (or merged again) as a single unit.
///
/// `second` is always left damaged afterwards. `first` is damaged too,
/// *unless* the failure happened while renaming `second`'s fragments — that
/// stage never touches `first`, so the returned [`MergeFailure::fdto_nospace`]
/// flag tells the caller only `second` needs to grow before retrying.
pub fn merge(first: &mut Fdt, second: &mut Fdt) -> Result<(), MergeFailure> {
    log::debug!("merge: renaming fragments in second overlay");
    if let Err(e) = rename_fragments(first, second) {
        let fdto_nospace = matches!(e, OverlayError::Fdt(FdtError::NoSpace));
        second.damage();
        if !fdto_nospace {
            first.damage();
        }
        return Err(MergeFailure { error: e, fdto_nospace });
    }

    match merge_inner(first, second) {
        Ok(()) => {
            second.damage();
            Ok(())
        }
        Err(e) => {
            second.damage();
            first.damage();
            Err(MergeFailure { error: e, fdto_nospace: false })
        }
    }
}

fn merge_inner(first: &mut Fdt, second: &mut Fdt) -> OverlayResult<()> {
    // Unlike apply()'s delta, merge uses max_phandle() with no +1: the
    // first overlay's own phandles are themselves provisional and will be
    // renumbered again when the combined blob is eventually applied.
    let delta = first.max_phandle()?;
    log::debug!("merge: renumbering second overlay phandles by {delta}");
    renumber_phandles(second, delta)?;
    log::debug!("merge: resolving fixups");
    resolve_fixups(first, second, true)?;
    log::debug!("merge: applying fragments");
    apply_fragments(first, second, true)?;
    log::debug!("merge: updating symbols");
    update_symbols(first, second, true)?;
    log::debug!("merge: folding auxiliary nodes into the combined blob");
    merge_node_properties(first, second, "/__fixups__")?;
    match merge_node_properties(first, second, "/__symbols__") {
        Ok(()) | Err(OverlayError::Fdt(FdtError::NotFound)) => {}
        Err(e) => return Err(e),
    }
    match merge_node_properties(first, second, "/__local_fixups__") {
        Ok(()) | Err(OverlayError::Fdt(FdtError::NotFound)) => {}
        Err(e) => return Err(e),
    }
    Ok(())
}

fn merge_node_properties(base: &mut Fdt, overlay: &Fdt, path: &str) -> OverlayResult<()> {
    let node = overlay.path_offset(path)?;
    copy_node(base, overlay, fdt_raw::ROOT, node)
}
