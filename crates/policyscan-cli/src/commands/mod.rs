//! Subcommands and the setup they share.

pub mod batch;
pub mod companies;
pub mod config;
pub mod output;
pub mod process;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use policyscan_core::models::config::ExtractionMode;
use policyscan_core::{Pipeline, PolicyscanConfig, PureOcrEngine};

/// Extraction mode as accepted on the command line.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ModeArg {
    /// Coordinates for images, patterns for text
    Auto,
    /// Company coordinate templates
    Coordinates,
    /// Company text patterns
    Patterns,
}

impl From<ModeArg> for ExtractionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => ExtractionMode::Auto,
            ModeArg::Coordinates => ExtractionMode::Coordinates,
            ModeArg::Patterns => ExtractionMode::Patterns,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("policyscan")
        .join("config.json")
}

/// Config file in effect: `--config`, else the default location.
pub fn config_path(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the config named by `--config`, the default file, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PolicyscanConfig> {
    match config_path {
        Some(path) => Ok(PolicyscanConfig::from_file(Path::new(path))?),
        None => {
            let path = default_config_path();
            if path.exists() {
                debug!("Loading config from {}", path.display());
                Ok(PolicyscanConfig::from_file(&path)?)
            } else {
                Ok(PolicyscanConfig::default())
            }
        }
    }
}

/// Build the pipeline, attaching OCR when the models can be loaded.
///
/// Text documents and text PDFs still work without models.
pub fn build_pipeline(
    mut config: PolicyscanConfig,
    model_dir: Option<PathBuf>,
) -> anyhow::Result<Pipeline> {
    if let Some(dir) = model_dir {
        config.ocr.model_dir = dir;
    }
    let ocr = config.ocr.clone();
    let pipeline = Pipeline::new(config)?;

    match PureOcrEngine::from_config(ocr) {
        Ok(engine) => Ok(pipeline.with_recognizer(Arc::new(engine))),
        Err(e) => {
            info!("OCR disabled, image input will be rejected: {}", e);
            Ok(pipeline)
        }
    }
}
