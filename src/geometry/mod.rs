//! Mesh import, LOD generation and collision decimation, delegated to a
//! headless Blender process.

mod script;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::GeometryConfig;

/// How often a running Blender child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Files produced by the geometry stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelData {
    #[serde(default)]
    pub lod_files: Vec<PathBuf>,
    #[serde(default)]
    pub physics_file: Option<PathBuf>,
    pub scale_applied: f32,
}

/// External geometry processing for a single model.
pub trait GeometryProcessor {
    /// `None` when the stage did not complete (spawn failure, non-zero exit,
    /// timeout). Texture results for the model are unaffected.
    fn process_model(&self, model_path: &Path, output_dir: &Path, temp_dir: &Path) -> Option<ModelData>;
}

/// Skips geometry entirely.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGeometry;

impl GeometryProcessor for NoGeometry {
    fn process_model(&self, model_path: &Path, _output_dir: &Path, _temp_dir: &Path) -> Option<ModelData> {
        info!("Geometry stage disabled for {}", model_path.display());
        None
    }
}

/// Runs Blender in background mode with a generated script.
pub struct BlenderOperator<'a> {
    config: &'a GeometryConfig,
}

enum RunOutcome {
    Exited(ExitStatus),
    TimedOut,
}

impl<'a> BlenderOperator<'a> {
    pub fn new(config: &'a GeometryConfig) -> Self {
        Self { config }
    }

    fn run(&self, model_path: &Path, output_dir: &Path, temp_dir: &Path) -> Result<Option<ModelData>> {
        let stem = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .context("model path has no file name")?;

        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("creating {}", output_dir.display()))?;
        std::fs::create_dir_all(temp_dir)
            .with_context(|| format!("creating {}", temp_dir.display()))?;

        let source = script::generate(model_path, &output_dir.join(&stem), self.config);
        let script_path = temp_dir.join(format!("blender_{}.py", stem));
        std::fs::write(&script_path, source)
            .with_context(|| format!("writing {}", script_path.display()))?;

        let log_path = temp_dir.join(format!("blender_{}.log", stem));
        let outcome = self.spawn_and_wait(&script_path, &log_path)?;

        match outcome {
            RunOutcome::TimedOut => {
                error!(
                    "Blender timed out after {}s for {} (log: {})",
                    self.config.timeout_secs,
                    model_path.display(),
                    log_path.display()
                );
                Ok(None)
            }
            RunOutcome::Exited(status) if !status.success() => {
                error!(
                    "Blender failed for {} with {} (log: {})",
                    model_path.display(),
                    status,
                    log_path.display()
                );
                Ok(None)
            }
            RunOutcome::Exited(_) => {
                info!("Blender finished for {}", model_path.display());
                Ok(Some(self.read_processing_info(output_dir, &stem)))
            }
        }
    }

    fn spawn_and_wait(&self, script_path: &Path, log_path: &Path) -> Result<RunOutcome> {
        let log = File::create(log_path).with_context(|| format!("creating {}", log_path.display()))?;
        let log_err = log.try_clone()?;

        let mut child = Command::new(&self.config.blender)
            .arg("--background")
            .arg("--python")
            .arg(script_path)
            .arg("--factory-startup")
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .spawn()
            .with_context(|| format!("launching {}", self.config.blender.display()))?;

        let deadline = Instant::now() + Duration::from_secs(self.config.timeout_secs);
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(RunOutcome::Exited(status));
            }
            if Instant::now() >= deadline {
                if let Err(e) = child.kill() {
                    warn!("Failed to kill Blender process: {}", e);
                }
                if let Err(e) = child.wait() {
                    warn!("Failed to reap Blender process: {}", e);
                }
                return Ok(RunOutcome::TimedOut);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Read `<stem>_processing_info.json`; fall back to "no LODs, configured
    /// scale" when it is missing or malformed.
    fn read_processing_info(&self, output_dir: &Path, stem: &str) -> ModelData {
        let info_path = output_dir.join(format!("{}_processing_info.json", stem));
        let parsed = std::fs::read_to_string(&info_path)
            .map_err(anyhow::Error::from)
            .and_then(|text| serde_json::from_str::<ModelData>(&text).map_err(anyhow::Error::from));

        match parsed {
            Ok(data) => data,
            Err(e) => {
                warn!("Could not read {}: {}", info_path.display(), e);
                ModelData {
                    lod_files: Vec::new(),
                    physics_file: None,
                    scale_applied: self.config.global_scale,
                }
            }
        }
    }
}

impl GeometryProcessor for BlenderOperator<'_> {
    fn process_model(&self, model_path: &Path, output_dir: &Path, temp_dir: &Path) -> Option<ModelData> {
        info!("Processing geometry in Blender: {}", model_path.display());
        match self.run(model_path, output_dir, temp_dir) {
            Ok(data) => data,
            Err(e) => {
                error!("Geometry stage failed for {}: {:#}", model_path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_blender_yields_none() {
        let tmp = TempDir::new().unwrap();
        let config = GeometryConfig {
            blender: tmp.path().join("no-such-blender"),
            ..GeometryConfig::default()
        };
        let operator = BlenderOperator::new(&config);
        let result = operator.process_model(
            &tmp.path().join("wall01.fbx"),
            &tmp.path().join("out"),
            &tmp.path().join("temp"),
        );
        assert_eq!(result, None);
        // the script is still written before launch
        assert!(tmp.path().join("temp").join("blender_wall01.py").exists());
    }

    #[test]
    fn processing_info_parses_and_falls_back() {
        let tmp = TempDir::new().unwrap();
        let config = GeometryConfig {
            global_scale: 2.5,
            ..GeometryConfig::default()
        };
        let operator = BlenderOperator::new(&config);

        let fallback = operator.read_processing_info(tmp.path(), "wall01");
        assert!(fallback.lod_files.is_empty());
        assert_eq!(fallback.scale_applied, 2.5);

        std::fs::write(
            tmp.path().join("wall01_processing_info.json"),
            r#"{"lod_files": ["/o/wall01.fbx", "/o/wall01_LOD1.fbx"], "physics_file": "/o/wall01_physics.fbx", "original_file": "/i/wall01.fbx", "scale_applied": 1.0}"#,
        )
        .unwrap();
        let data = operator.read_processing_info(tmp.path(), "wall01");
        assert_eq!(data.lod_files.len(), 2);
        assert_eq!(data.physics_file, Some(PathBuf::from("/o/wall01_physics.fbx")));
        assert_eq!(data.scale_applied, 1.0);
    }

    #[cfg(unix)]
    #[test]
    fn slow_process_times_out() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let fake = tmp.path().join("fake-blender.sh");
        std::fs::write(&fake, "#!/bin/sh\nsleep 5\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = GeometryConfig {
            blender: fake,
            timeout_secs: 0,
            ..GeometryConfig::default()
        };
        let operator = BlenderOperator::new(&config);
        let started = Instant::now();
        let result = operator.process_model(
            &tmp.path().join("wall01.fbx"),
            &tmp.path().join("out"),
            &tmp.path().join("temp"),
        );
        assert_eq!(result, None);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn successful_run_reads_info() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let fake = tmp.path().join("fake-blender.sh");
        std::fs::write(
            &fake,
            format!(
                "#!/bin/sh\nprintf '{{\"lod_files\":[\"a.fbx\"],\"physics_file\":null,\"scale_applied\":0.5}}' > '{}'\n",
                out.join("crate_processing_info.json").display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = GeometryConfig {
            blender: fake,
            ..GeometryConfig::default()
        };
        let data = BlenderOperator::new(&config)
            .process_model(&tmp.path().join("crate.fbx"), &out, &tmp.path().join("temp"))
            .unwrap();
        assert_eq!(data.lod_files, vec![PathBuf::from("a.fbx")]);
        assert_eq!(data.physics_file, None);
        assert_eq!(data.scale_applied, 0.5);
    }
}
