//! Applies one overlay onto one base device tree and times the call.
//!
//! Grounded on `fdt_overlay_test_app.c`: load both blobs, `clock()`-bracket
//! the single `fdt_overlay::apply` call, write the result, print the timing
//! line.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use fdt_raw::OwnedFdt;

use overlay_tool::{read_blob, write_blob, ToolError};

#[derive(Parser)]
#[command(about = "Apply one FDT overlay onto one base device tree")]
struct Args {
    base: PathBuf,
    overlay: PathBuf,
    output: PathBuf,
    /// Verbose messages
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("apply-tool: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), ToolError> {
    // Headroom for the properties/subnodes the overlay adds; grown again by
    // the caller (via a bigger --output budget upstream) if this isn't enough.
    const SLACK: usize = 4096;

    let base_bytes = read_blob(&args.base)?;
    let overlay_bytes = read_blob(&args.overlay)?;

    let mut base = OwnedFdt::open_into(&base_bytes, overlay_bytes.len() + SLACK).map_err(|source| ToolError::InvalidBlob {
        path: args.base.display().to_string(),
        source,
    })?;
    let mut overlay = OwnedFdt::new(overlay_bytes).map_err(|source| ToolError::InvalidBlob {
        path: args.overlay.display().to_string(),
        source,
    })?;

    let mut base_fdt = base.as_fdt().map_err(ToolError::Reparse)?;
    let mut overlay_fdt = overlay.as_fdt().map_err(ToolError::Reparse)?;

    let start = Instant::now();
    fdt_overlay::apply(&mut base_fdt, &mut overlay_fdt).map_err(ToolError::Apply)?;
    let elapsed = start.elapsed();

    base.pack().map_err(ToolError::Pack)?;
    write_blob(&args.output, base.as_bytes())?;

    println!("apply_overlay: took {:.9} secs", elapsed.as_secs_f64());
    Ok(())
}
