//! Page images from embedded scans using lopdf, text via pdf-extract.
//!
//! Content streams are not interpreted here: a page is its largest scan
//! resampled to the page size, or a blank page when it has none.

use std::collections::HashSet;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage, Luma, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, info, trace, warn};

use super::{PdfRasterizer, Result, POINTS_PER_INCH};
use crate::error::PdfError;

/// US Letter, for pages without a MediaBox.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// A loaded PDF document.
pub struct PdfDocument {
    document: Document,
    raw_data: Vec<u8>,
}

impl PdfDocument {
    /// Load a PDF from a file.
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| PdfError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(&data)
    }

    /// Load a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        let raw_data = if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self { document, raw_data })
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Text embedded in the PDF (empty for pure scans).
    pub fn embedded_text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Page size in points (width, height) from the page's MediaBox.
    pub fn page_size(&self, page: u32) -> Result<Option<(f32, f32)>> {
        let page_id = self.page_id(page)?;
        let media_box = self.inherited_entry(page_id, b"MediaBox");

        let size = media_box.and_then(|obj| {
            let arr = match obj {
                Object::Array(arr) => arr,
                _ => return None,
            };
            let nums: Vec<f32> = arr.iter().filter_map(|o| self.as_number(o)).collect();
            if nums.len() != 4 {
                return None;
            }
            Some(((nums[2] - nums[0]).abs(), (nums[3] - nums[1]).abs()))
        });

        Ok(size)
    }

    /// Render a page at the given DPI.
    ///
    /// Takes the largest image on the page (the scan) and resamples it to the
    /// page's MediaBox size at `dpi`. A page without any image renders blank.
    pub fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage> {
        let (scan, (width_pt, height_pt)) = match (self.page_scan(page)?, self.page_size(page)?) {
            (Some(scan), None) => {
                debug!("Page {} has no MediaBox, keeping native resolution", page);
                return Ok(scan);
            }
            (scan, size) => (scan, size.unwrap_or(DEFAULT_PAGE_SIZE)),
        };

        let target_w = ((width_pt / POINTS_PER_INCH) * dpi as f32).round().max(1.0) as u32;
        let target_h = ((height_pt / POINTS_PER_INCH) * dpi as f32).round().max(1.0) as u32;

        let Some(scan) = scan else {
            warn!("Page {} has no scanned image, rendering it blank", page);
            return Ok(DynamicImage::ImageLuma8(GrayImage::from_pixel(
                target_w,
                target_h,
                Luma([255]),
            )));
        };

        if scan.dimensions() == (target_w, target_h) {
            return Ok(scan);
        }

        trace!(
            "Resampling page {} from {:?} to {}x{} ({} dpi)",
            page,
            scan.dimensions(),
            target_w,
            target_h,
            dpi
        );
        Ok(scan.resize_exact(target_w, target_h, FilterType::Triangle))
    }

    /// The largest image drawn on a page, if any.
    fn page_scan(&self, page: u32) -> Result<Option<DynamicImage>> {
        let page_id = self.page_id(page)?;

        let mut images = Vec::new();
        if let Some(resources) = self.page_resources(page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = self.document.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = self.document.dereference(obj_ref) {
                            if let Some(img) = self.decode_image_object(obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        // Images not reachable from the page resources: fall back to
        // document order when there is exactly one image per page.
        if images.is_empty() {
            let all = self.all_images();
            if all.len() == self.page_count() as usize {
                debug!("No XObject images on page {}, using document image {}", page, page);
                images = all.into_iter().skip((page - 1) as usize).take(1).collect();
            }
        }

        debug!("Found {} images on page {}", images.len(), page);

        Ok(images.into_iter().max_by_key(|img| {
            let (w, h) = img.dimensions();
            w as u64 * h as u64
        }))
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    fn all_images(&self) -> Vec<DynamicImage> {
        let mut images = Vec::new();
        let mut seen: HashSet<ObjectId> = HashSet::new();

        for (id, object) in self.document.objects.iter() {
            if !seen.insert(*id) {
                continue;
            }
            if let Some(img) = self.decode_image_object(object) {
                images.push(img);
            }
        }

        images
    }

    fn decode_image_object(&self, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;

        trace!("Found image object: {}x{}", width, height);

        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.last().and_then(|o| o.as_name().ok()),
                _ => None,
            };

            match filter_name {
                Some(b"DCTDecode") => {
                    return image::load_from_memory_with_format(
                        &stream.content,
                        image::ImageFormat::Jpeg,
                    )
                    .ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    trace!("Unsupported image filter {:?}", filter_name);
                    return None;
                }
                _ => {}
            }
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self.document.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB".as_slice());

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);

        decode_raw(&data, width, height, color_space, bits)
    }

    fn page_resources(&self, page_id: ObjectId) -> Option<Dictionary> {
        match self.inherited_entry(page_id, b"Resources")? {
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    /// Look up a page attribute, walking up the page tree for inherited values.
    fn inherited_entry(&self, node_id: ObjectId, key: &[u8]) -> Option<Object> {
        let mut current = Some(node_id);
        let mut visited = HashSet::new();

        while let Some(id) = current {
            if !visited.insert(id) {
                break;
            }
            let Ok(Object::Dictionary(dict)) = self.document.get_object(id) else {
                break;
            };

            if let Ok(value) = dict.get(key) {
                if let Ok((_, resolved)) = self.document.dereference(value) {
                    return Some(resolved.clone());
                }
            }

            current = match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => Some(*parent_id),
                _ => None,
            };
        }

        None
    }

    fn as_number(&self, obj: &Object) -> Option<f32> {
        match obj {
            Object::Integer(i) => Some(*i as f32),
            Object::Real(r) => Some(*r as f32),
            Object::Reference(id) => self.document.get_object(*id).ok().and_then(|o| self.as_number(o)),
            _ => None,
        }
    }
}

/// Build an image from uncompressed 8-bit gray or RGB samples.
fn decode_raw(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: i64,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixels = (width as usize) * (height as usize);

    match color_space {
        b"DeviceGray" | b"G" | b"CalGray" if data.len() >= pixels => {
            GrayImage::from_raw(width, height, data[..pixels].to_vec()).map(DynamicImage::ImageLuma8)
        }
        b"DeviceRGB" | b"RGB" | b"CalRGB" if data.len() >= pixels * 3 => {
            RgbImage::from_raw(width, height, data[..pixels * 3].to_vec()).map(DynamicImage::ImageRgb8)
        }
        _ => {
            trace!(
                "Could not decode image: data_len={}, colorspace={:?}",
                data.len(),
                String::from_utf8_lossy(color_space)
            );
            None
        }
    }
}

/// Rasterizer for scanned PDFs backed by [`PdfDocument`].
#[derive(Debug, Clone, Default)]
pub struct LopdfRasterizer {
    max_pages: usize,
}

impl LopdfRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of pages rasterized (0 = unlimited).
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }
}

impl PdfRasterizer for LopdfRasterizer {
    fn rasterize(&self, pdf_path: &Path, dpi: u32) -> Result<Vec<DynamicImage>> {
        let document = PdfDocument::open(pdf_path)?;
        let mut page_count = document.page_count();
        if self.max_pages > 0 && page_count as usize > self.max_pages {
            debug!("Limiting rasterization to {} of {} pages", self.max_pages, page_count);
            page_count = self.max_pages as u32;
        }

        info!("Rasterizing {} pages at {} dpi", page_count, dpi);

        (1..=page_count)
            .map(|page| document.render_page(page, dpi))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};
    use pretty_assertions::assert_eq;

    /// A PDF whose pages each show one 8x8 gray scan on a 1x1 inch page.
    pub(crate) fn scanned_pdf(pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::new();
        for i in 0..pages {
            let shade = (40 * (i + 1)) as u8;
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 8,
                    "Height" => 8,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                vec![shade; 64],
            ));
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                b"q 72 0 0 72 0 0 cm /Im0 Do Q".to_vec(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! { "Im0" => image_id },
                },
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(72),
                    Object::Integer(72),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    /// A born-digital Letter page: one line of Helvetica text, no images.
    pub(crate) fn text_only_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            b"BT /F1 24 Tf 72 700 Td (INVOICE INV2024001) Tj ET".to_vec(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_page_count_and_inherited_media_box() {
        let pdf = PdfDocument::from_bytes(&scanned_pdf(2)).unwrap();
        assert_eq!(pdf.page_count(), 2);
        assert_eq!(pdf.page_size(1).unwrap(), Some((72.0, 72.0)));
    }

    #[test]
    fn test_render_page_scales_to_dpi() {
        let pdf = PdfDocument::from_bytes(&scanned_pdf(1)).unwrap();
        let page = pdf.render_page(1, 300).unwrap();
        assert_eq!(page.dimensions(), (300, 300));

        let page = pdf.render_page(1, 8 * 9).unwrap();
        assert_eq!(page.dimensions(), (72, 72));
    }

    #[test]
    fn test_pages_keep_their_own_scan() {
        let pdf = PdfDocument::from_bytes(&scanned_pdf(2)).unwrap();
        let first = pdf.render_page(1, 72).unwrap().to_luma8();
        let second = pdf.render_page(2, 72).unwrap().to_luma8();
        assert_eq!(first.get_pixel(0, 0).0, [40]);
        assert_eq!(second.get_pixel(0, 0).0, [80]);
    }

    #[test]
    fn test_page_without_scan_renders_blank() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("born_digital.pdf");
        std::fs::write(&path, text_only_pdf()).unwrap();

        let pages = LopdfRasterizer::new().rasterize(&path, 300).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].dimensions(), (2550, 3300));
        assert_eq!(pages[0].to_luma8().get_pixel(100, 100).0, [255]);
    }

    #[test]
    fn test_invalid_page() {
        let pdf = PdfDocument::from_bytes(&scanned_pdf(1)).unwrap();
        assert!(matches!(pdf.render_page(3, 300), Err(PdfError::InvalidPage(3))));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(
            PdfDocument::from_bytes(b"definitely not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }

    #[test]
    fn test_rasterizer_reads_file_in_page_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, scanned_pdf(3)).unwrap();

        let pages = LopdfRasterizer::new().rasterize(&path, 144).unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2].to_luma8().get_pixel(5, 5).0, [120]);

        let pages = LopdfRasterizer::new().with_max_pages(2).rasterize(&path, 144).unwrap();
        assert_eq!(pages.len(), 2);
    }

    #[test]
    fn test_decode_raw_rgb() {
        let img = decode_raw(&[255, 0, 0, 0, 255, 0], 2, 1, b"DeviceRGB", 8).unwrap();
        assert_eq!(img.to_rgb8().get_pixel(1, 0).0, [0, 255, 0]);
        assert!(decode_raw(&[0; 2], 2, 1, b"DeviceRGB", 8).is_none());
        assert!(decode_raw(&[0; 2], 2, 1, b"DeviceGray", 1).is_none());
    }
}
