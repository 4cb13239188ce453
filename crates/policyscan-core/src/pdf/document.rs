//! PDF loading with lopdf, text with pdf-extract.

use std::collections::HashSet;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use crate::error::PdfError;

/// A loaded PDF.
pub struct PdfDocument {
    document: Document,
    /// Bytes handed to pdf-extract (re-saved when decrypted).
    raw: Vec<u8>,
}

impl PdfDocument {
    /// Parse a PDF, decrypting it if it uses an empty user password.
    pub fn load(data: &[u8]) -> Result<Self, PdfError> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw = if document.is_encrypted() {
            document.decrypt("").map_err(|_| PdfError::Encrypted)?;
            debug!("Decrypted PDF with empty password");
            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to re-save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        if document.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }

        Ok(Self { document, raw })
    }

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Embedded text of the whole document.
    pub fn text(&self) -> Result<String, PdfError> {
        pdf_extract::extract_text_from_mem(&self.raw)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Decodable images referenced by a page's XObject resources (1-indexed).
    pub fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>, PdfError> {
        let pages = self.document.get_pages();
        let page_id = *pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let Some(resources) = self.resources(page_id) else {
            return Ok(Vec::new());
        };
        let Ok(xobjects) = resources.get(b"XObject") else {
            return Ok(Vec::new());
        };
        let Ok((_, Object::Dictionary(xobjects))) = self.document.dereference(xobjects) else {
            return Ok(Vec::new());
        };

        let images: Vec<DynamicImage> = xobjects
            .iter()
            .filter_map(|(_, obj)| self.document.dereference(obj).ok())
            .filter_map(|(_, obj)| self.decode_image(obj))
            .collect();

        trace!("Page {}: {} images", page, images.len());
        Ok(images)
    }

    /// Every decodable image in the file, in object order.
    pub fn all_images(&self) -> Vec<DynamicImage> {
        self.document
            .objects
            .values()
            .filter_map(|obj| self.decode_image(obj))
            .collect()
    }

    /// Page resources, following `Parent` links for inherited entries.
    /// A `Parent` chain that revisits a node yields no resources.
    fn resources(&self, node: ObjectId) -> Option<Dictionary> {
        let mut visited = HashSet::new();
        let mut current = node;
        loop {
            if !visited.insert(current) {
                debug!("Cyclic Parent chain at object {:?}", current);
                return None;
            }
            let Ok(Object::Dictionary(dict)) = self.document.get_object(current) else {
                return None;
            };
            if let Ok(res) = dict.get(b"Resources") {
                if let Ok((_, Object::Dictionary(res))) = self.document.dereference(res) {
                    return Some(res.clone());
                }
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => current = *parent,
                _ => return None,
            }
        }
    }

    fn decode_image(&self, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;
        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
        let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;

        let filter = dict.get(b"Filter").ok().and_then(|f| match f {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.last().and_then(|o| o.as_name().ok()),
            _ => None,
        });

        match filter {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Skipping {}x{} image with unsupported filter", width, height);
                return None;
            }
            _ => {}
        }

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            trace!("Skipping {}-bit image", bits);
            return None;
        }

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(id) => self
                    .document
                    .get_object(*id)
                    .ok()
                    .and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let pixels = (width as usize) * (height as usize);

        match color_space {
            b"DeviceGray" | b"G" if data.len() >= pixels => {
                GrayImage::from_raw(width, height, data[..pixels].to_vec())
                    .map(DynamicImage::ImageLuma8)
            }
            b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
                RgbImage::from_raw(width, height, data[..pixels * 3].to_vec())
                    .map(DynamicImage::ImageRgb8)
            }
            _ => {
                trace!(
                    "Could not decode {}x{} image ({} bytes)",
                    width,
                    height,
                    data.len()
                );
                None
            }
        }
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("pages", &self.page_count())
            .field("bytes", &self.raw.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::image_pdf;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_counts_pages() {
        let doc = PdfDocument::load(&image_pdf(&[(4, 4), (6, 2)])).unwrap();
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_page_images_decodes_gray_xobject() {
        let doc = PdfDocument::load(&image_pdf(&[(6, 2)])).unwrap();
        let images = doc.page_images(1).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!((images[0].width(), images[0].height()), (6, 2));
        assert_eq!(images[0].to_luma8().get_pixel(0, 0)[0], 200);
    }

    fn page_tree(page_parent: impl FnOnce(ObjectId, ObjectId) -> ObjectId) -> PdfDocument {
        use lopdf::dictionary;

        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let page_id = document.new_object_id();
        let parent = page_parent(pages_id, page_id);
        document.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => parent,
            }),
        );
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
                "Parent" => page_id,
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);
        PdfDocument {
            document,
            raw: Vec::new(),
        }
    }

    #[test]
    fn test_self_parent_has_no_resources() {
        let doc = page_tree(|_, page_id| page_id);
        let page_id = *doc.document.get_pages().get(&1).unwrap();
        assert!(doc.resources(page_id).is_none());
        assert_eq!(doc.page_images(1).unwrap().len(), 0);
    }

    #[test]
    fn test_rasterize_returns_on_parent_cycle() {
        use super::super::{LopdfRasterizer, PageRasterizer};

        let mut document = page_tree(|_, page_id| page_id).document;
        let mut bytes = Vec::new();
        document.save_to(&mut bytes).unwrap();

        let err = LopdfRasterizer.rasterize(&bytes, 3, 300).unwrap_err();
        assert!(matches!(err, PdfError::ImageExtraction(_)));
    }

    #[test]
    fn test_parent_cycle_through_pages_node() {
        let doc = page_tree(|pages_id, _| pages_id);
        let page_id = *doc.document.get_pages().get(&1).unwrap();
        assert!(doc.resources(page_id).is_none());
    }

    #[test]
    fn test_page_resources_found() {
        let doc = PdfDocument::load(&image_pdf(&[(3, 3)])).unwrap();
        let page_id = *doc.document.get_pages().get(&1).unwrap();
        assert!(doc.resources(page_id).is_some());
    }

    #[test]
    fn test_invalid_page_number() {
        let doc = PdfDocument::load(&image_pdf(&[(4, 4)])).unwrap();
        assert!(matches!(doc.page_images(7), Err(PdfError::InvalidPage(7))));
    }
}
