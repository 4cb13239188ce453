//! Native recognizer backed by `pure-onnx-ocr`.

use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{TextLine, TextRecognizer, sort_by_reading_order};

/// Recognizer running detection + recognition ONNX models in pure Rust.
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    config: OcrConfig,
}

impl PureOcrEngine {
    /// Load the models named in `config` from `config.model_dir`.
    pub fn from_config(config: OcrConfig) -> Result<Self, OcrError> {
        let det_path = config.model_path(&config.detection_model);
        let rec_path = config.model_path(&config.recognition_model);
        let dict_path = config.model_path(&config.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded OCR models from {}", config.model_dir.display());

        Ok(Self { engine, config })
    }

    /// Recognize lines with positions, in reading order.
    pub fn recognize_lines(&self, image: &DynamicImage) -> Result<Vec<TextLine>, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let mut lines: Vec<TextLine> = results
            .iter()
            .filter(|r| r.confidence >= self.config.recognition_threshold)
            .map(|r| TextLine {
                text: if self.config.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                },
                bounds: polygon_bounds(&r.bounding_box),
                confidence: r.confidence,
            })
            .collect();
        sort_by_reading_order(&mut lines);

        debug!(
            "Recognized {} lines on {}x{} image in {}ms",
            lines.len(),
            width,
            height,
            start.elapsed().as_millis()
        );
        Ok(lines)
    }
}

impl TextRecognizer for PureOcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let lines = self.recognize_lines(image)?;
        Ok(lines
            .iter()
            .map(|l| l.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Axis-aligned bounds of a detection polygon.
fn polygon_bounds(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 4] {
    let mut bounds = [f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY];
    for coord in polygon.exterior().coords() {
        bounds[0] = bounds[0].min(coord.x as f32);
        bounds[1] = bounds[1].min(coord.y as f32);
        bounds[2] = bounds[2].max(coord.x as f32);
        bounds[3] = bounds[3].max(coord.y as f32);
    }
    if bounds[0].is_infinite() {
        return [0.0; 4];
    }
    bounds
}
