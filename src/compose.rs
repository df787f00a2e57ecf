//! The redaction compositor: flattened, irreversible output.
//!
//! Every page of the source document, including pages with nothing to
//! redact, is redrawn from its original content into a fresh buffer, and
//! each selected region is painted with an opaque fill. The compositor never
//! touches a text layer or content stream: it rasterizes and repaints, so
//! redacted text cannot be recovered by re-extracting text from the output.
//!
//! Once started, composition runs to completion or fails outright; an
//! interrupted redaction must never yield a partially-flattened document.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgba, RgbaImage};
use printpdf::{Image, ImageTransform, Mm, PdfDocument};
use tracing::debug;

use crate::error::{RedactError, RedactResult};
use crate::geometry::normalized_to_raster;
use crate::store::RedactionRegion;

/// Fixed padding applied around every painted region, in page points, to
/// guard against under-sized bounding boxes leaving a sliver of visible
/// text at the edges.
pub const REDACTION_PADDING_POINTS: f32 = 3.0;

const POINTS_PER_INCH: f32 = 72.0;
const MM_PER_POINT: f32 = 25.4 / 72.0;

/// The document model collaborator: page count, per-page content bounds,
/// and a draw primitive that re-renders a page's full original content.
pub trait SourceDocument {
    fn page_count(&self) -> usize;

    /// Page dimensions in points.
    fn page_size_points(&self, page_index: usize) -> RedactResult<(f32, f32)>;

    /// Redraws the page's full original content into a fresh raster buffer.
    fn render_page(&self, page_index: usize) -> RedactResult<RgbaImage>;
}

#[derive(Debug)]
struct RasterPage {
    image: RgbaImage,
    width_pt: f32,
    height_pt: f32,
}

/// A scanned document: an ordered sequence of page images with point
/// dimensions derived from the scan resolution.
#[derive(Debug)]
pub struct RasterDocument {
    pages: Vec<RasterPage>,
}

impl RasterDocument {
    /// Builds a document from in-memory page images scanned at `dpi`.
    pub fn from_images(images: Vec<RgbaImage>, dpi: f32) -> Self {
        let mut doc = Self { pages: Vec::new() };
        for image in images {
            doc.push_page(image, dpi);
        }
        doc
    }

    /// Opens page image files, in page order. Any unreadable file is fatal:
    /// the session cannot start on a corrupt document.
    pub fn open_images(paths: &[PathBuf], dpi: f32) -> RedactResult<Self> {
        if paths.is_empty() {
            return Err(RedactError::DocumentOpen {
                path: PathBuf::new(),
                reason: "no page images given".to_string(),
            });
        }

        let mut images = Vec::with_capacity(paths.len());
        for path in paths {
            let image = image::open(path).map_err(|e| RedactError::DocumentOpen {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            images.push(image.to_rgba8());
        }
        Ok(Self::from_images(images, dpi))
    }

    pub fn push_page(&mut self, image: RgbaImage, dpi: f32) {
        let (w, h) = image.dimensions();
        self.pages.push(RasterPage {
            width_pt: w as f32 * POINTS_PER_INCH / dpi,
            height_pt: h as f32 * POINTS_PER_INCH / dpi,
            image,
        });
    }
}

impl SourceDocument for RasterDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size_points(&self, page_index: usize) -> RedactResult<(f32, f32)> {
        self.pages
            .get(page_index)
            .map(|p| (p.width_pt, p.height_pt))
            .ok_or_else(|| RedactError::Composition {
                message: format!("page {page_index} out of range"),
                page: Some(page_index),
            })
    }

    fn render_page(&self, page_index: usize) -> RedactResult<RgbaImage> {
        self.pages
            .get(page_index)
            .map(|p| p.image.clone())
            .ok_or_else(|| RedactError::Composition {
                message: format!("page {page_index} out of range"),
                page: Some(page_index),
            })
    }
}

/// One flattened output page.
#[derive(Debug)]
pub struct FlattenedPage {
    pub image: RgbaImage,
    pub width_pt: f32,
    pub height_pt: f32,
}

/// The flattened output document, page order identical to the source.
#[derive(Debug)]
pub struct FlattenedDocument {
    pages: Vec<FlattenedPage>,
}

impl FlattenedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, page_index: usize) -> Option<&FlattenedPage> {
        self.pages.get(page_index)
    }

    /// Serializes the flattened pages as a PDF, one embedded raster per
    /// page. Serialization failure is a composition failure; the caller
    /// must discard any partial output file.
    pub fn save_pdf(&self, path: &Path) -> RedactResult<()> {
        if self.pages.is_empty() {
            return Err(RedactError::Composition {
                message: "document has no pages".to_string(),
                page: None,
            });
        }

        let doc = PdfDocument::empty("Redacted Document");
        let mut page_refs = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let (page_idx, layer_idx) = doc.add_page(
                Mm(page.width_pt * MM_PER_POINT),
                Mm(page.height_pt * MM_PER_POINT),
                "Page",
            );
            page_refs.push((page_idx, layer_idx));
        }

        for (page, (page_idx, layer_idx)) in self.pages.iter().zip(page_refs) {
            let layer = doc.get_page(page_idx).get_layer(layer_idx);
            let rgb = DynamicImage::ImageRgba8(page.image.clone()).to_rgb8();
            let embedded = Image::from_dynamic_image(&DynamicImage::ImageRgb8(rgb));

            // Scale the raster so it exactly covers the page.
            let dpi = page.image.width() as f32 * POINTS_PER_INCH / page.width_pt;
            embedded.add_to_layer(
                layer,
                ImageTransform {
                    dpi: Some(dpi),
                    ..Default::default()
                },
            );
        }

        let file = File::create(path).map_err(|e| RedactError::Composition {
            message: format!("cannot create '{}': {e}", path.display()),
            page: None,
        })?;
        doc.save(&mut BufWriter::new(file))
            .map_err(|e| RedactError::Composition {
                message: format!("PDF serialization failed: {e}"),
                page: None,
            })
    }
}

/// Renders the flattened output document.
#[derive(Debug, Clone)]
pub struct Compositor {
    padding_points: f32,
}

impl Default for Compositor {
    fn default() -> Self {
        Self {
            padding_points: REDACTION_PADDING_POINTS,
        }
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_padding_points(mut self, padding_points: f32) -> Self {
        self.padding_points = padding_points.max(0.0);
        self
    }

    /// Composes the flattened document: every source page redrawn, every
    /// region in `selected` painted opaque.
    ///
    /// `selected` must be the selected-region projection of the store; the
    /// session enforces that. Pages are processed sequentially; the raster
    /// draw here is cheap and deterministic ordering matters more than
    /// parallel speedups.
    pub fn compose(
        &self,
        document: &dyn SourceDocument,
        selected: &[&RedactionRegion],
    ) -> RedactResult<FlattenedDocument> {
        let page_count = document.page_count();

        for region in selected {
            if region.page_index >= page_count {
                return Err(RedactError::Composition {
                    message: format!(
                        "region {} references page {} of a {page_count}-page document",
                        region.id, region.page_index
                    ),
                    page: Some(region.page_index),
                });
            }
        }

        let mut pages = Vec::with_capacity(page_count);
        for page_index in 0..page_count {
            // Untouched pages go through the same redraw, so the output is
            // uniformly flattened and never references the original.
            let mut image = document.render_page(page_index)?;
            let (width_pt, height_pt) = document.page_size_points(page_index)?;

            let mut painted = 0usize;
            for region in selected.iter().filter(|r| r.page_index == page_index) {
                let rect = region
                    .rect
                    .expanded(
                        self.padding_points / width_pt,
                        self.padding_points / height_pt,
                    )
                    .clamped();
                paint_opaque(&mut image, rect);
                painted += 1;
            }

            debug!(page = page_index, painted, "page flattened");
            pages.push(FlattenedPage {
                image,
                width_pt,
                height_pt,
            });
        }

        Ok(FlattenedDocument { pages })
    }
}

/// Paints a normalized rect onto the page raster as solid black.
fn paint_opaque(image: &mut RgbaImage, rect: crate::geometry::NormalizedRect) {
    let (w, h) = image.dimensions();
    let px = normalized_to_raster(rect, w, h);

    let x0 = px.x.floor().max(0.0) as u32;
    let y0 = px.y.floor().max(0.0) as u32;
    let x1 = ((px.x + px.width).ceil() as u32).min(w);
    let y1 = ((px.y + px.height).ceil() as u32).min(h);

    let black = Rgba([0u8, 0u8, 0u8, 255u8]);
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, black);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::NormalizedRect;
    use image::Rgba;

    fn white_doc(pages: usize, w: u32, h: u32) -> RasterDocument {
        let images = (0..pages)
            .map(|_| RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255])))
            .collect();
        RasterDocument::from_images(images, 72.0)
    }

    #[test]
    fn test_compose_preserves_page_count() {
        let doc = white_doc(4, 100, 100);
        let out = Compositor::new().compose(&doc, &[]).unwrap();
        assert_eq!(out.page_count(), 4);
    }

    #[test]
    fn test_compose_redraws_untouched_pages() {
        let doc = white_doc(2, 50, 50);
        let out = Compositor::new().compose(&doc, &[]).unwrap();
        for i in 0..2 {
            let page = out.page(i).unwrap();
            assert_eq!(page.image.dimensions(), (50, 50));
            assert!(page
                .image
                .pixels()
                .all(|p| *p == Rgba([255, 255, 255, 255])));
        }
    }

    #[test]
    fn test_compose_paints_selected_region_opaque() {
        let doc = white_doc(1, 100, 100);
        // Bottom-left quadrant in normalized space maps to the lower-left
        // of the image, which is the *top-left* in raster rows flipped:
        // normalized y=0 is the raster bottom.
        let region = RedactionRegion::manual(0, NormalizedRect::new(0.0, 0.0, 0.5, 0.5));
        let out = Compositor::new()
            .with_padding_points(0.0)
            .compose(&doc, &[&region])
            .unwrap();

        let image = &out.page(0).unwrap().image;
        // Inside the region: raster rows 50..100, columns 0..50.
        assert_eq!(*image.get_pixel(10, 90), Rgba([0, 0, 0, 255]));
        assert_eq!(*image.get_pixel(49, 51), Rgba([0, 0, 0, 255]));
        // Outside.
        assert_eq!(*image.get_pixel(60, 90), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(10, 10), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_compose_applies_padding() {
        // 100x100 px at 72 dpi = 100x100 pt, so 3 pt of padding is 3 px.
        let doc = white_doc(1, 100, 100);
        let region = RedactionRegion::manual(0, NormalizedRect::new(0.4, 0.4, 0.2, 0.2));
        let out = Compositor::new().compose(&doc, &[&region]).unwrap();

        let image = &out.page(0).unwrap().image;
        // Unpadded rect covers raster 40..60 in both axes; padding extends
        // it to 37..63.
        assert_eq!(*image.get_pixel(38, 50), Rgba([0, 0, 0, 255]));
        assert_eq!(*image.get_pixel(62, 50), Rgba([0, 0, 0, 255]));
        assert_eq!(*image.get_pixel(35, 50), Rgba([255, 255, 255, 255]));
        assert_eq!(*image.get_pixel(65, 50), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_compose_rejects_out_of_range_region() {
        let doc = white_doc(1, 20, 20);
        let region = RedactionRegion::manual(5, NormalizedRect::new(0.0, 0.0, 0.1, 0.1));
        let err = Compositor::new().compose(&doc, &[&region]).unwrap_err();
        assert!(matches!(err, RedactError::Composition { .. }));
    }

    #[test]
    fn test_save_pdf_rejects_empty_document() {
        let out = FlattenedDocument { pages: Vec::new() };
        let dir = tempfile::tempdir().unwrap();
        assert!(out.save_pdf(&dir.path().join("out.pdf")).is_err());
    }

    #[test]
    fn test_open_images_requires_pages() {
        assert!(matches!(
            RasterDocument::open_images(&[], 150.0),
            Err(RedactError::DocumentOpen { .. })
        ));
    }

    #[test]
    fn test_open_images_rejects_unreadable_file() {
        let err =
            RasterDocument::open_images(&[PathBuf::from("/nonexistent/page.png")], 150.0)
                .unwrap_err();
        assert!(matches!(err, RedactError::DocumentOpen { .. }));
    }
}
