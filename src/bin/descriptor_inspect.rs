use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use vmdl_porter::descriptor::decode_descriptor;

/// Print what the heuristic decoder recovers from a `.bin` descriptor.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Descriptor file to decode
    file: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let data = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let descriptor = decode_descriptor(&data);

    eprintln!("File size: {} bytes", data.len());
    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    Ok(())
}
