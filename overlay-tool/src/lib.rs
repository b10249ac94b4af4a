//! Shared plumbing for the `overlay-merge` and `apply-tool` binaries: file
//! I/O and the error type each prints on exit.

use std::path::Path;

use fdt_overlay::{MergeFailure, OverlayError};
use fdt_raw::FdtError;

#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("reading {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("writing {path}: {source}")]
    Write { path: String, source: std::io::Error },
    #[error("{path} is not a valid FDT blob: {source}")]
    InvalidBlob { path: String, source: FdtError },
    #[error("applying overlay: {0}")]
    Apply(OverlayError),
    #[error("merging {path}: {source}")]
    Merge { path: String, source: OverlayError },
    #[error("internal: re-parsing a blob this tool just grew: {0}")]
    Reparse(FdtError),
    #[error("packing output blob: {0}")]
    Pack(FdtError),
}

pub fn read_blob(path: &Path) -> Result<Vec<u8>, ToolError> {
    let bytes = std::fs::read(path).map_err(|source| ToolError::Read {
        path: path.display().to_string(),
        source,
    })?;
    fdt_raw::check_header(&bytes).map_err(|source| ToolError::InvalidBlob {
        path: path.display().to_string(),
        source,
    })?;
    Ok(bytes)
}

pub fn write_blob(path: &Path, data: &[u8]) -> Result<(), ToolError> {
    std::fs::write(path, data).map_err(|source| ToolError::Write {
        path: path.display().to_string(),
        source,
    })
}

pub fn is_nospace(failure: &MergeFailure) -> bool {
    matches!(failure.error, OverlayError::Fdt(FdtError::NoSpace))
}
