use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};

use vmdl_porter::config::PipelineConfig;
use vmdl_porter::geometry::{BlenderOperator, GeometryProcessor, NoGeometry};
use vmdl_porter::locator::FsListing;
use vmdl_porter::pipeline::ModelConverter;
use vmdl_porter::texture_pipeline::decode::ImageFileDecoder;

/// Convert legacy FBX models with `.bin` descriptors into VMDL/VMAT assets.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Directory scanned recursively for FBX files
    #[arg(short, long, conflicts_with = "single")]
    input: Option<PathBuf>,

    /// Convert a single FBX file
    #[arg(short, long)]
    single: Option<PathBuf>,

    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Skip the Blender mesh/LOD/collision stage
    #[arg(long)]
    no_geometry: bool,
}

fn load_config(path: &PathBuf) -> Result<PipelineConfig> {
    if path.exists() {
        let config = PipelineConfig::load(path)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    } else {
        warn!("Config {} not found, using defaults", path.display());
        Ok(PipelineConfig::default())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = load_config(&args.config)?;

    let blender = BlenderOperator::new(&config.geometry);
    let geometry: &dyn GeometryProcessor = if args.no_geometry || !config.geometry.enabled {
        &NoGeometry
    } else {
        &blender
    };

    let converter = ModelConverter::new(&config, &FsListing, &ImageFileDecoder, geometry);

    if let Some(single) = &args.single {
        if !single.is_file() {
            bail!("File not found: {}", single.display());
        }
        let root = single.parent().map(PathBuf::from).unwrap_or_default();
        let report = converter
            .with_input_root(root)
            .process_single_model(single)
            .with_context(|| format!("converting {}", single.display()))?;
        info!(
            "Converted {} ({} derived textures)",
            report.model.display(),
            report.derived.produced().count()
        );
        return Ok(());
    }

    let summary = match &args.input {
        Some(input) => converter
            .with_input_root(input.clone())
            .batch_convert(Some(input.as_path()))?,
        None => converter.batch_convert(None)?,
    };

    info!(
        "Result: {}/{} models converted successfully",
        summary.succeeded, summary.total
    );
    if summary.succeeded == 0 {
        std::process::exit(1);
    }
    Ok(())
}
