//! Per-model conversion and the sequential batch driver.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{error, info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::PipelineConfig;
use crate::descriptor::{self, Descriptor};
use crate::geometry::{GeometryProcessor, ModelData};
use crate::kv3;
use crate::locator::{DirectoryListing, TextureLocator, TextureSet};
use crate::texture_pipeline::decode::TextureDecoder;
use crate::texture_pipeline::{DerivedTextureSet, OutputDirs, TextureProcessor};

/// Extension of source models picked up by the batch driver.
pub const MODEL_EXTENSION: &str = "fbx";
/// Batch report written to the output root.
pub const REPORT_FILE: &str = "conversion_report.json";

/// Output locations for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputContext {
    /// Model path relative to the input root (or just its file name).
    pub relative_path: PathBuf,
    pub model_output_dir: PathBuf,
    pub dirs: OutputDirs,
}

/// Everything produced for one model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub model: PathBuf,
    pub descriptor_path: Option<PathBuf>,
    pub descriptor: Descriptor,
    pub textures: TextureSet,
    pub derived: DerivedTextureSet,
    pub geometry: Option<ModelData>,
    pub vmat: Option<PathBuf>,
    pub vmdl: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub models: Vec<ModelReport>,
    pub failed: Vec<PathBuf>,
}

/// Drives descriptor decoding, texture synthesis, geometry and descriptor
/// generation for models, one at a time.
pub struct ModelConverter<'a, L: DirectoryListing> {
    config: &'a PipelineConfig,
    listing: &'a L,
    decoder: &'a dyn TextureDecoder,
    geometry: &'a dyn GeometryProcessor,
    input_root: PathBuf,
}

impl<'a, L: DirectoryListing> ModelConverter<'a, L> {
    pub fn new(
        config: &'a PipelineConfig,
        listing: &'a L,
        decoder: &'a dyn TextureDecoder,
        geometry: &'a dyn GeometryProcessor,
    ) -> Self {
        Self {
            config,
            listing,
            decoder,
            geometry,
            input_root: config.paths.input.clone(),
        }
    }

    /// Root used for relative output paths and texture-dir discovery.
    pub fn with_input_root(mut self, input_root: impl Into<PathBuf>) -> Self {
        self.input_root = input_root.into();
        self
    }

    pub fn prepare_output_context(&self, model_path: &Path) -> Result<OutputContext> {
        let relative_path = model_path
            .strip_prefix(&self.input_root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(model_path.file_name().unwrap_or_default()));

        let model_output_dir = match relative_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.config.paths.output.join(parent),
            _ => self.config.paths.output.clone(),
        };
        let dirs = OutputDirs::under(&model_output_dir);

        for dir in [&model_output_dir, &dirs.textures, &dirs.details_raw, &dirs.details_baked] {
            std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }

        Ok(OutputContext {
            relative_path,
            model_output_dir,
            dirs,
        })
    }

    /// Convert one model. Only failure to create its output directories is
    /// an error; every other failure degrades to a `None` in the report.
    pub fn process_single_model(&self, model_path: &Path) -> Result<ModelReport> {
        info!("Processing model: {}", model_path.display());
        let context = self.prepare_output_context(model_path)?;
        let name = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .context("model path has no file name")?;

        let locator = TextureLocator::new(
            self.listing,
            Some(self.input_root.as_path()),
            &self.config.textures.patterns,
        );
        let (descriptor_path, descriptor, textures) = match locator.locate(model_path) {
            Some(located) => {
                let descriptor = descriptor::read_descriptor_file(&located.path);
                (Some(located.path), descriptor, located.textures)
            }
            None => {
                warn!("No descriptor found for {}, using defaults", model_path.display());
                (None, Descriptor::default(), TextureSet::default())
            }
        };

        let processor = TextureProcessor::new(&self.config.textures, self.decoder);
        let derived = processor.process_all(&textures, &descriptor.material_params, &context.dirs);

        let geometry = self.geometry.process_model(
            model_path,
            &context.model_output_dir,
            &self.config.paths.temp,
        );

        let vmat = kv3::generate_vmat(
            &name,
            &derived,
            &descriptor.material_params,
            &context.model_output_dir,
        )
        .map_err(|e| error!("Material generation failed for {}: {:#}", name, e))
        .ok();

        let vmdl = geometry.as_ref().and_then(|model| {
            kv3::generate_vmdl(&name, model, vmat.as_deref(), &context.model_output_dir)
                .map_err(|e| error!("Model generation failed for {}: {:#}", name, e))
                .ok()
        });

        info!("Finished {}", model_path.display());
        Ok(ModelReport {
            model: model_path.to_path_buf(),
            descriptor_path,
            descriptor,
            textures,
            derived,
            geometry,
            vmat,
            vmdl,
        })
    }

    /// Convert every model under `input_dir` (or the configured input root)
    /// and write the batch report.
    pub fn batch_convert(&self, input_dir: Option<&Path>) -> Result<BatchSummary> {
        let input_dir = input_dir.unwrap_or(self.input_root.as_path());
        let models = find_model_files(input_dir);
        info!("Found {} model files in {}", models.len(), input_dir.display());

        let mut summary = BatchSummary {
            total: models.len(),
            succeeded: 0,
            models: Vec::new(),
            failed: Vec::new(),
        };

        for model in &models {
            match self.process_single_model(model) {
                Ok(report) => {
                    summary.succeeded += 1;
                    summary.models.push(report);
                }
                Err(e) => {
                    error!("Failed to process {}: {:#}", model.display(), e);
                    summary.failed.push(model.clone());
                }
            }
        }

        write_report(&self.config.paths.output, &summary)?;
        info!(
            "Converted {}/{} models successfully",
            summary.succeeded, summary.total
        );
        Ok(summary)
    }
}

/// All `*.fbx` files (any case) below `dir`, sorted.
pub fn find_model_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .is_some_and(|e| e.eq_ignore_ascii_case(MODEL_EXTENSION))
        })
        .collect();
    files.sort();
    files
}

fn write_report(output_root: &Path, summary: &BatchSummary) -> Result<()> {
    std::fs::create_dir_all(output_root)
        .with_context(|| format!("creating {}", output_root.display()))?;
    let path = output_root.join(REPORT_FILE);
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    info!("Report written: {}", path.display());
    Ok(())
}
