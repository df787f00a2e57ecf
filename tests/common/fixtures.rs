//! Builders for synthetic scanned documents and recognition results.

use std::sync::Arc;

use image::{Rgba, RgbaImage};

use blackout::{
    FlattenedDocument, NormalizedRect, RasterDocument, RecognitionAccuracy, RecognizedLine,
    RedactResult, TextRecognizer,
};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// A blank white page raster.
pub fn blank_page(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, WHITE)
}

/// A document of `pages` identical blank pages at 72 dpi (1 px = 1 pt).
pub fn blank_document(pages: usize, width: u32, height: u32) -> RasterDocument {
    RasterDocument::from_images(
        (0..pages).map(|_| blank_page(width, height)).collect(),
        72.0,
    )
}

#[derive(Clone)]
struct ScriptedLine {
    page: usize,
    text: String,
    bounds: NormalizedRect,
}

/// Recognizer scripted with fixed lines per page, standing in for the
/// external recognition engine. Bounds are given in normalized page space
/// and converted to the pixel space of whatever raster the adapter sends.
#[derive(Clone, Default)]
pub struct MockRecognizer {
    lines: Vec<ScriptedLine>,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line(mut self, page: usize, text: &str, bounds: NormalizedRect) -> Self {
        self.lines.push(ScriptedLine {
            page,
            text: text.to_string(),
            bounds,
        });
        self
    }

    pub fn into_arc(self) -> Arc<dyn TextRecognizer> {
        Arc::new(self)
    }
}

impl TextRecognizer for MockRecognizer {
    fn recognize(
        &self,
        page_index: usize,
        image: &RgbaImage,
        _languages: &[String],
        _accuracy: RecognitionAccuracy,
    ) -> RedactResult<Vec<RecognizedLine>> {
        let (w, h) = image.dimensions();
        Ok(self
            .lines
            .iter()
            .filter(|line| line.page == page_index)
            .map(|line| RecognizedLine {
                text: line.text.clone(),
                bounds: blackout::geometry::normalized_to_raster(line.bounds, w, h),
                handle: None,
            })
            .collect())
    }
}

/// Samples the flattened page at a normalized point (origin bottom-left).
pub fn pixel_at_normalized(doc: &FlattenedDocument, page: usize, nx: f32, ny: f32) -> Rgba<u8> {
    let image = &doc.page(page).expect("page exists").image;
    let (w, h) = image.dimensions();
    let x = ((nx * w as f32) as u32).min(w - 1);
    let y = (((1.0 - ny) * h as f32) as u32).min(h - 1);
    *image.get_pixel(x, y)
}

/// Asserts the flattened page is opaque black at a normalized point.
pub fn assert_opaque_at(doc: &FlattenedDocument, page: usize, nx: f32, ny: f32) {
    assert_eq!(
        pixel_at_normalized(doc, page, nx, ny),
        BLACK,
        "expected opaque fill at ({nx}, {ny}) on page {page}"
    );
}

/// Asserts the flattened page still shows original (white) content at a
/// normalized point.
pub fn assert_untouched_at(doc: &FlattenedDocument, page: usize, nx: f32, ny: f32) {
    assert_eq!(
        pixel_at_normalized(doc, page, nx, ny),
        WHITE,
        "expected untouched content at ({nx}, {ny}) on page {page}"
    );
}
