//! Merges a number of overlay blobs into one combined overlay.
//!
//! Grounded on `fdtoverlaymerge.c`'s `do_fdtoverlay_merge`: the input blob is
//! progressively merged with each overlay in sequence via `fdt_overlay::merge`,
//! retrying with more headroom on `NOSPACE` — either just reloading the
//! overlay currently being merged (when the failure happened while renaming
//! its fragments) or reloading every blob from scratch and growing the whole
//! budget by another 512 bytes.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use fdt_raw::OwnedFdt;

use overlay_tool::{is_nospace, read_blob, write_blob, ToolError};

const GROW_STEP: usize = 512;

#[derive(Parser)]
#[command(about = "Merge a number of FDT overlay blobs")]
struct Args {
    /// Input base overlay DT blob
    #[arg(short, long)]
    input: PathBuf,
    /// Output DT blob
    #[arg(short, long)]
    output: PathBuf,
    /// Verbose messages
    #[arg(short, long)]
    verbose: bool,
    /// Overlay blobs to merge, in order
    #[arg(required = true)]
    overlays: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("overlay-merge: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), ToolError> {
    let mut extra_blob_len = 0usize;
    let mut extra_ov_len = vec![0usize; args.overlays.len()];

    'reload_all: loop {
        let mut base = OwnedFdt::new(read_blob(&args.input)?).map_err(|source| ToolError::InvalidBlob {
            path: args.input.display().to_string(),
            source,
        })?;

        let mut overlays = Vec::with_capacity(args.overlays.len());
        let mut total_len = extra_blob_len;
        for (i, path) in args.overlays.iter().enumerate() {
            let mut ov = OwnedFdt::new(read_blob(path)?).map_err(|source| ToolError::InvalidBlob {
                path: path.display().to_string(),
                source,
            })?;
            ov.grow(extra_ov_len[i]);
            total_len += ov.as_fdt().map_err(ToolError::Reparse)?.capacity();
            overlays.push(ov);
        }
        base.grow(total_len);

        for (i, path) in args.overlays.iter().enumerate() {
            loop {
                log::debug!("merging overlay blob {}", path.display());
                let mut base_fdt = base.as_fdt().map_err(ToolError::Reparse)?;
                let mut ov_fdt = overlays[i].as_fdt().map_err(ToolError::Reparse)?;

                match fdt_overlay::merge(&mut base_fdt, &mut ov_fdt) {
                    Ok(()) => break,
                    Err(failure) if is_nospace(&failure) && failure.fdto_nospace => {
                        extra_ov_len[i] += GROW_STEP;
                        log::info!("reloading overlay blob {}", path.display());
                        let mut fresh = OwnedFdt::new(read_blob(path)?).map_err(|source| ToolError::InvalidBlob {
                            path: path.display().to_string(),
                            source,
                        })?;
                        fresh.grow(extra_ov_len[i]);
                        overlays[i] = fresh;
                    }
                    Err(failure) if is_nospace(&failure) => {
                        extra_blob_len += GROW_STEP;
                        log::info!("reloading all blobs");
                        continue 'reload_all;
                    }
                    Err(failure) => {
                        return Err(ToolError::Merge { path: path.display().to_string(), source: failure.error });
                    }
                }
            }
        }

        base.pack().map_err(ToolError::Pack)?;
        write_blob(&args.output, base.as_bytes())?;
        return Ok(());
    }
}
