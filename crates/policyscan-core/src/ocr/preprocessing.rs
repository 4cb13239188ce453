//! Region preparation for OCR: crop, grayscale, denoise, deskew, binarize.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use tracing::{debug, trace};

use crate::error::OcrError;
use crate::models::config::{OcrConfig, ThresholdMethod};
use crate::models::geometry::Rect;

/// Turns a raster image (or a region of it) into an OCR-ready image.
#[derive(Debug, Clone)]
pub struct RegionPreparator {
    threshold: ThresholdMethod,
    invert: bool,
    denoise: bool,
    deskew: bool,
}

impl RegionPreparator {
    /// Create a preparator with default settings (Otsu binarization only).
    pub fn new() -> Self {
        Self {
            threshold: ThresholdMethod::Otsu,
            invert: false,
            denoise: false,
            deskew: false,
        }
    }

    /// Create a preparator from OCR configuration.
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            threshold: config.threshold,
            invert: config.invert,
            denoise: config.denoise,
            deskew: config.deskew,
        }
    }

    /// Set the binarization method.
    pub fn with_threshold(mut self, threshold: ThresholdMethod) -> Self {
        self.threshold = threshold;
        self
    }

    /// Enable median denoising.
    pub fn with_denoise(mut self, denoise: bool) -> Self {
        self.denoise = denoise;
        self
    }

    /// Enable page deskewing.
    pub fn with_deskew(mut self, deskew: bool) -> Self {
        self.deskew = deskew;
        self
    }

    /// Crop a region, clamped to the image bounds.
    pub fn crop(&self, image: &DynamicImage, rect: Rect) -> Result<DynamicImage, OcrError> {
        let (width, height) = image.dimensions();
        let clamped = rect.clamp_to(width, height).ok_or_else(|| {
            OcrError::InvalidRegion(format!(
                "{:?} lies outside {}x{} image",
                rect, width, height
            ))
        })?;

        trace!("Cropping region {:?} (requested {:?})", clamped, rect);
        Ok(image.crop_imm(clamped.x, clamped.y, clamped.width, clamped.height))
    }

    /// Crop and clean a field region.
    pub fn prepare_region(&self, image: &DynamicImage, rect: Rect) -> Result<DynamicImage, OcrError> {
        let cropped = self.crop(image, rect)?;
        Ok(DynamicImage::ImageLuma8(self.clean(cropped.to_luma8())))
    }

    /// Clean a whole page, deskewing first when enabled.
    pub fn prepare_page(&self, image: &DynamicImage) -> DynamicImage {
        let mut gray = image.to_luma8();
        if self.deskew {
            let angle = estimate_skew(&gray);
            if angle.abs() > 0.1 {
                debug!("Deskewing page by {:.1} degrees", angle);
                gray = rotate(&gray, -angle);
            }
        }
        DynamicImage::ImageLuma8(self.clean(gray))
    }

    fn clean(&self, gray: GrayImage) -> GrayImage {
        let gray = if self.denoise { median3(&gray) } else { gray };

        let mut binary = match self.threshold {
            ThresholdMethod::None => return gray,
            ThresholdMethod::Otsu => {
                let t = otsu_threshold(&gray);
                binarize(&gray, t)
            }
            ThresholdMethod::Adaptive => adaptive_threshold(&gray, 15, 5),
        };

        if self.invert {
            image::imageops::invert(&mut binary);
        }
        binary
    }
}

impl Default for RegionPreparator {
    fn default() -> Self {
        Self::new()
    }
}

/// Otsu's method: the threshold maximizing between-class variance.
pub fn otsu_threshold(image: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 127;
    }
    let sum_all: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut sum_background = 0.0f64;
    let mut weight_background = 0u64;
    let mut best_variance = -1.0f64;
    let mut best = 0u8;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total - weight_background;
        if weight_foreground == 0 {
            break;
        }

        sum_background += t as f64 * count as f64;
        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (sum_all - sum_background) / weight_foreground as f64;
        let diff = mean_background - mean_foreground;
        let variance = weight_background as f64 * weight_foreground as f64 * diff * diff;

        if variance > best_variance {
            best_variance = variance;
            best = t as u8;
        }
    }

    best
}

fn binarize(image: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y)[0] > threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Local-mean threshold using an integral image.
fn adaptive_threshold(image: &GrayImage, block_size: u32, c: i64) -> GrayImage {
    let (width, height) = image.dimensions();
    let w = width as usize + 1;

    let mut integral = vec![0u64; w * (height as usize + 1)];
    for y in 0..height as usize {
        let mut row_sum = 0u64;
        for x in 0..width as usize {
            row_sum += image.get_pixel(x as u32, y as u32)[0] as u64;
            integral[(y + 1) * w + x + 1] = integral[y * w + x + 1] + row_sum;
        }
    }

    let half = block_size / 2;
    GrayImage::from_fn(width, height, |x, y| {
        let x0 = x.saturating_sub(half) as usize;
        let y0 = y.saturating_sub(half) as usize;
        let x1 = (x + half + 1).min(width) as usize;
        let y1 = (y + half + 1).min(height) as usize;

        let sum = integral[y1 * w + x1] + integral[y0 * w + x0]
            - integral[y0 * w + x1]
            - integral[y1 * w + x0];
        let count = ((x1 - x0) * (y1 - y0)) as u64;
        let mean = (sum / count) as i64;

        if image.get_pixel(x, y)[0] as i64 > mean - c {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

fn median3(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let mut window = [0u8; 9];
        let mut n = 0;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let nx = (x as i64 + dx).clamp(0, width as i64 - 1) as u32;
                let ny = (y as i64 + dy).clamp(0, height as i64 - 1) as u32;
                window[n] = image.get_pixel(nx, ny)[0];
                n += 1;
            }
        }
        window.sort_unstable();
        Luma([window[4]])
    })
}

/// Estimate page skew in degrees by maximizing row-profile variance.
fn estimate_skew(image: &GrayImage) -> f32 {
    let (width, height) = image.dimensions();
    let max_dim = width.max(height);
    let sample = if max_dim > 800 {
        let scale = 800.0 / max_dim as f32;
        image::imageops::resize(
            image,
            ((width as f32 * scale) as u32).max(1),
            ((height as f32 * scale) as u32).max(1),
            image::imageops::FilterType::Triangle,
        )
    } else {
        image.clone()
    };
    let sample = binarize(&sample, otsu_threshold(&sample));

    let mut best_angle = 0.0f32;
    let mut best_score = f64::MIN;
    let mut angle = -5.0f32;
    while angle <= 5.0 {
        let score = row_profile_variance(&rotate(&sample, angle));
        if score > best_score {
            best_score = score;
            best_angle = angle;
        }
        angle += 0.5;
    }
    best_angle
}

fn row_profile_variance(image: &GrayImage) -> f64 {
    let rows: Vec<f64> = image
        .rows()
        .map(|row| row.filter(|p| p[0] == 0).count() as f64)
        .collect();
    if rows.is_empty() {
        return 0.0;
    }
    let mean = rows.iter().sum::<f64>() / rows.len() as f64;
    rows.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / rows.len() as f64
}

/// Rotate around the center by `degrees`, filling uncovered pixels white.
fn rotate(image: &GrayImage, degrees: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let (sin, cos) = degrees.to_radians().sin_cos();
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;

    GrayImage::from_fn(width, height, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let sx = cos * dx + sin * dy + cx;
        let sy = -sin * dx + cos * dy + cy;
        if sx >= 0.0 && sy >= 0.0 && (sx as u32) < width && (sy as u32) < height {
            *image.get_pixel(sx as u32, sy as u32)
        } else {
            Luma([255])
        }
    })
}
