//! PDF access: embedded text and page images.
//!
//! Full rasterization is outside this crate. The default [`PageRasterizer`]
//! recovers the scanned page images that image-based PDFs embed, which is
//! what insurance declaration scans almost always are.

mod document;

pub use document::PdfDocument;

use image::DynamicImage;
use tracing::debug;

use crate::error::PdfError;

/// Turns PDF pages into raster images.
pub trait PageRasterizer: Send + Sync {
    /// Produce at most `max_pages` page images (0 = all pages).
    fn rasterize(
        &self,
        data: &[u8],
        max_pages: usize,
        dpi: u32,
    ) -> Result<Vec<DynamicImage>, PdfError>;
}

/// Rasterizer that returns the largest embedded image of each page.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfRasterizer;

impl PageRasterizer for LopdfRasterizer {
    fn rasterize(
        &self,
        data: &[u8],
        max_pages: usize,
        _dpi: u32,
    ) -> Result<Vec<DynamicImage>, PdfError> {
        let document = PdfDocument::load(data)?;
        let page_count = document.page_count() as usize;
        let limit = if max_pages == 0 {
            page_count
        } else {
            page_count.min(max_pages)
        };

        let mut pages = Vec::with_capacity(limit);
        for number in 1..=limit as u32 {
            let largest = document
                .page_images(number)?
                .into_iter()
                .max_by_key(|img| img.width() as u64 * img.height() as u64);
            if let Some(image) = largest {
                pages.push(image);
            }
        }

        // Some producers hang images off shared resources instead of pages.
        if pages.is_empty() {
            pages = document.all_images().into_iter().take(limit.max(1)).collect();
        }

        if pages.is_empty() {
            return Err(PdfError::ImageExtraction(
                "no page images found in PDF".to_string(),
            ));
        }

        debug!("Recovered {} page images of {} pages", pages.len(), page_count);
        Ok(pages)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use lopdf::{Document, Object, Stream, dictionary};

    /// Build a PDF whose pages each hold one gray image of the given size.
    pub fn image_pdf(sizes: &[(u32, u32)]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::new();
        for (i, &(width, height)) in sizes.iter().enumerate() {
            let pixels = vec![200u8; (width * height) as usize];
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width as i64,
                    "Height" => height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                pixels,
            ));
            let name = format!("Im{}", i + 1);
            let resources_id = doc.add_object(dictionary! {
                "XObject" => dictionary! { name.as_str() => image_id },
            });
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("in-memory PDF save");
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::testing::image_pdf;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rasterize_bounded_by_max_pages() {
        let data = image_pdf(&[(40, 30), (20, 10), (8, 8)]);
        let pages = LopdfRasterizer.rasterize(&data, 2, 300).unwrap();
        let sizes: Vec<_> = pages.iter().map(|p| (p.width(), p.height())).collect();
        assert_eq!(sizes, vec![(40, 30), (20, 10)]);
    }

    #[test]
    fn test_rasterize_zero_means_all_pages() {
        let data = image_pdf(&[(4, 4), (5, 5), (6, 6)]);
        assert_eq!(LopdfRasterizer.rasterize(&data, 0, 300).unwrap().len(), 3);
    }

    #[test]
    fn test_rasterize_rejects_garbage() {
        let err = LopdfRasterizer.rasterize(b"not a pdf", 3, 300).unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }
}
