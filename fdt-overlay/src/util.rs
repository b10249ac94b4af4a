//! Shared helpers: fragment target resolution and the `<path>:<name>:<off>`
//! triple format used by both `__fixups__` and `__local_fixups__`.

use fdt_raw::{Fdt, FdtError, FDT_PHANDLE_ILLEGAL, FDT_PHANDLE_NONE};

use crate::error::{OverlayError, OverlayResult};

/// Strips exactly one trailing NUL (string properties are NUL-terminated)
/// and validates the rest as UTF-8.
pub fn bytes_to_str(data: &[u8]) -> OverlayResult<&str> {
    let bytes = match data.split_last() {
        Some((0, rest)) => rest,
        _ => data,
    };
    core::str::from_utf8(bytes).map_err(|_| OverlayError::BadOverlay)
}

fn get_target_phandle(overlay: &Fdt, fragment_rel: usize) -> OverlayResult<Option<u32>> {
    match overlay.get_property(fragment_rel, "target")? {
        None => Ok(None),
        Some((_, data)) => {
            if data.len() != 4 {
                return Err(OverlayError::Fdt(FdtError::BadPhandle));
            }
            let value = u32::from_be_bytes(data.try_into().unwrap());
            if value == FDT_PHANDLE_ILLEGAL {
                return Err(OverlayError::Fdt(FdtError::BadPhandle));
            }
            if value == FDT_PHANDLE_NONE {
                return Ok(None);
            }
            Ok(Some(value))
        }
    }
}

/// Resolves a fragment's target in `base`, by phandle if present, else by
/// `target-path`. Returns the base node offset and, when resolution went
/// through `target-path`, the path string used (needed verbatim by the
/// symbol updater).
///
/// A fragment with neither property is `BadOverlay`. A malformed-length or
/// sentinel (`0xFFFFFFFF`) phandle is `FdtError::BadPhandle`, a hard error.
/// A well-formed phandle that simply isn't declared anywhere in `base` is
/// `FdtError::NotFound` — callers in merge mode use that specific error to
/// decide whether to copy the fragment verbatim instead of failing, since
/// a later overlay in the chain may still supply it.
pub fn target_offset<'a>(base: &Fdt, overlay: &'a Fdt, fragment_rel: usize) -> OverlayResult<(usize, Option<&'a str>)> {
    match get_target_phandle(overlay, fragment_rel)? {
        Some(phandle) => {
            let off = base.node_offset_by_phandle(phandle)?;
            Ok((off, None))
        }
        None => match overlay.get_property(fragment_rel, "target-path")? {
            Some((_, data)) => {
                let path = bytes_to_str(data)?;
                let off = base.path_offset(path)?;
                Ok((off, Some(path)))
            }
            None => Err(OverlayError::BadOverlay),
        },
    }
}

/// One `<path>:<property-name>:<byte-offset>` triple as found in a
/// `__fixups__` or `__local_fixups__`-style entry.
pub struct Triple<'a> {
    pub path: &'a str,
    pub name: &'a str,
    pub offset: usize,
}

/// Parses one NUL-terminated triple string.
pub fn parse_triple(s: &str) -> OverlayResult<Triple<'_>> {
    let mut parts = s.splitn(3, ':');
    let path = parts.next().filter(|p| !p.is_empty()).ok_or(OverlayError::BadOverlay)?;
    let name = parts.next().filter(|p| !p.is_empty()).ok_or(OverlayError::BadOverlay)?;
    let offset_str = parts.next().ok_or(OverlayError::BadOverlay)?;
    let offset = offset_str.parse::<usize>().map_err(|_| OverlayError::BadOverlay)?;
    Ok(Triple { path, name, offset })
}

/// True for a path with exactly one `/`-separated component, i.e. a path of
/// the form `/fragment@N` with no further nesting.
pub fn is_single_component_path(path: &str) -> bool {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    !trimmed.contains('/')
}

/// Iterates the NUL-terminated strings packed into one property value.
/// Errors if the data does not end on a NUL boundary or is not valid UTF-8.
pub struct NulStrings<'a> {
    data: &'a [u8],
}

pub fn nul_strings(data: &[u8]) -> NulStrings<'_> {
    NulStrings { data }
}

impl<'a> Iterator for NulStrings<'a> {
    type Item = OverlayResult<&'a str>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }
        let pos = match self.data.iter().position(|&b| b == 0) {
            Some(p) => p,
            None => {
                self.data = &[];
                return Some(Err(OverlayError::BadOverlay));
            }
        };
        let (head, rest) = self.data.split_at(pos);
        self.data = &rest[1..];
        match core::str::from_utf8(head) {
            Ok(s) => Some(Ok(s)),
            Err(_) => Some(Err(OverlayError::BadOverlay)),
        }
    }
}
