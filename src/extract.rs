//! Positioned text extraction from rendered page images.
//!
//! The optical recognition engine is an external collaborator, consumed
//! through the [`TextRecognizer`] trait. The [`ExtractionAdapter`] wraps it:
//! it downscales the page raster to bound recognition latency and memory,
//! dispatches the (potentially blocking) recognition call to a worker thread
//! with a bounded wait, and converts the engine's pixel-space line geometry
//! into normalized page space.
//!
//! A per-page recognition failure or timeout is never fatal: the adapter
//! logs it and returns an empty block list, and analysis moves on.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use image::imageops::FilterType;
use image::RgbaImage;
use tracing::{debug, warn};

use crate::error::{RedactError, RedactResult};
use crate::geometry::{raster_to_normalized, NormalizedRect, RasterRect};

/// Default bound on the longer raster dimension handed to recognition.
pub const DEFAULT_MAX_DIMENSION: u32 = 2048;

/// Default bounded wait for one page's recognition call.
pub const DEFAULT_RECOGNITION_TIMEOUT: Duration = Duration::from_secs(10);

/// Requested recognition quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionAccuracy {
    Fast,
    /// The most accurate mode available; the adapter always requests this.
    Accurate,
}

/// Handle for precise sub-range geometry queries against a recognized line.
///
/// Engines that keep per-character geometry expose it here; its absence is a
/// supported, expected condition that triggers proportional approximation in
/// [`crate::resolve`].
pub trait RecognitionHandle: Send + Sync {
    /// The exact normalized box of the given char range, if the engine can
    /// produce one.
    fn box_for_char_range(&self, range: Range<usize>) -> Option<NormalizedRect>;
}

/// One recognized line as reported by the engine, in raster-pixel space.
pub struct RecognizedLine {
    pub text: String,
    /// Pixel bounds within the image that was handed to the engine.
    pub bounds: RasterRect,
    pub handle: Option<Arc<dyn RecognitionHandle>>,
}

/// The external optical recognition collaborator.
pub trait TextRecognizer: Send + Sync {
    /// Recognizes text in a rendered page image. `page_index` identifies the
    /// page being processed; `languages` and `accuracy` are hints the engine
    /// may honor where supported.
    fn recognize(
        &self,
        page_index: usize,
        image: &RgbaImage,
        languages: &[String],
        accuracy: RecognitionAccuracy,
    ) -> RedactResult<Vec<RecognizedLine>>;
}

/// One line of recognized text with a normalized bounding box.
///
/// Produced once per page, owned by the analysis loop for the duration of
/// that page, then discarded; only derived redaction regions persist.
pub struct TextBlock {
    pub text: String,
    /// Block-level bounds in normalized page space.
    pub bounds: NormalizedRect,
    pub page_index: usize,
    pub handle: Option<Arc<dyn RecognitionHandle>>,
}

/// Wraps the recognition collaborator with raster sizing, timeout, and
/// coordinate conversion.
pub struct ExtractionAdapter {
    recognizer: Arc<dyn TextRecognizer>,
    target_max_dimension: u32,
    timeout: Duration,
    languages: Vec<String>,
}

impl ExtractionAdapter {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            recognizer,
            target_max_dimension: DEFAULT_MAX_DIMENSION,
            timeout: DEFAULT_RECOGNITION_TIMEOUT,
            languages: vec!["en-US".to_string()],
        }
    }

    /// Bounds the longer raster dimension handed to recognition.
    pub fn with_target_max_dimension(mut self, max_dimension: u32) -> Self {
        self.target_max_dimension = max_dimension.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_languages(mut self, languages: Vec<String>) -> Self {
        self.languages = languages;
        self
    }

    /// Extracts positioned text blocks from one page's raster.
    ///
    /// Returns the blocks and the scale factor applied before recognition
    /// (1.0 when the page already fit within the target dimension), so
    /// callers holding raster-space geometry can map back to page space.
    /// Recognition failure or timeout yields an empty block list.
    pub fn extract(&self, page_image: &RgbaImage, page_index: usize) -> (Vec<TextBlock>, f32) {
        let (width, height) = page_image.dimensions();
        let longest = width.max(height);
        let scale = if longest > self.target_max_dimension {
            self.target_max_dimension as f32 / longest as f32
        } else {
            1.0
        };

        let raster = if scale < 1.0 {
            image::imageops::resize(
                page_image,
                ((width as f32 * scale).round() as u32).max(1),
                ((height as f32 * scale).round() as u32).max(1),
                FilterType::Triangle,
            )
        } else {
            page_image.clone()
        };

        let (raster_w, raster_h) = raster.dimensions();
        debug!(
            page = page_index,
            raster_w, raster_h, scale, "dispatching recognition"
        );

        let lines = match self.recognize_with_timeout(page_index, raster) {
            Ok(lines) => lines,
            Err(err) => {
                // Per-page absorption: the page proceeds with no text.
                warn!(page = page_index, error = %err, "recognition failed; page treated as empty");
                return (Vec::new(), scale);
            }
        };

        let blocks = lines
            .into_iter()
            .map(|line| TextBlock {
                text: line.text,
                bounds: raster_to_normalized(line.bounds, raster_w, raster_h).clamped(),
                page_index,
                handle: line.handle,
            })
            .collect();

        (blocks, scale)
    }

    /// Runs the recognition call on a worker thread and waits with a bounded
    /// timeout. On timeout the worker is left to finish and drop its result.
    fn recognize_with_timeout(
        &self,
        page_index: usize,
        raster: RgbaImage,
    ) -> RedactResult<Vec<RecognizedLine>> {
        let (tx, rx) = mpsc::channel();
        let recognizer = Arc::clone(&self.recognizer);
        let languages = self.languages.clone();

        thread::spawn(move || {
            let result =
                recognizer.recognize(page_index, &raster, &languages, RecognitionAccuracy::Accurate);
            // The receiver may have timed out and gone away.
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(_) => Err(RedactError::RecognitionTimeout {
                page: page_index,
                timeout: self.timeout,
            }),
        }
    }
}

/// Recognizer that reports no text for any page.
///
/// Used when no recognition engine is wired in (manual-region-only
/// sessions); every page analyzes as "no text found".
#[derive(Debug, Clone, Default)]
pub struct NullRecognizer;

impl TextRecognizer for NullRecognizer {
    fn recognize(
        &self,
        _page_index: usize,
        _image: &RgbaImage,
        _languages: &[String],
        _accuracy: RecognitionAccuracy,
    ) -> RedactResult<Vec<RecognizedLine>> {
        Ok(Vec::new())
    }
}

/// Recognizer backed by sidecar text files produced by an external OCR stage.
///
/// One file per page, one line per text block:
/// `x<TAB>y<TAB>width<TAB>height<TAB>text`, with coordinates in normalized
/// page space (origin bottom-left). Missing or malformed files surface as
/// per-page recognition failures.
pub struct SidecarRecognizer {
    files: Vec<PathBuf>,
}

impl SidecarRecognizer {
    /// `files[p]` is the sidecar for page `p`.
    pub fn from_files(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    fn parse_line(line: &str) -> Option<(NormalizedRect, String)> {
        let mut parts = line.splitn(5, '\t');
        let x: f32 = parts.next()?.trim().parse().ok()?;
        let y: f32 = parts.next()?.trim().parse().ok()?;
        let width: f32 = parts.next()?.trim().parse().ok()?;
        let height: f32 = parts.next()?.trim().parse().ok()?;
        let text = parts.next()?.to_string();
        Some((NormalizedRect::new(x, y, width, height), text))
    }

    fn read_page(&self, page_index: usize, path: &Path) -> RedactResult<Vec<(NormalizedRect, String)>> {
        let content = fs::read_to_string(path).map_err(|e| RedactError::PageRecognition {
            page: page_index,
            reason: format!("cannot read sidecar '{}': {e}", path.display()),
        })?;

        let mut blocks = Vec::new();
        for (lineno, line) in content.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let parsed = Self::parse_line(line).ok_or_else(|| RedactError::PageRecognition {
                page: page_index,
                reason: format!(
                    "malformed sidecar line {} in '{}'",
                    lineno + 1,
                    path.display()
                ),
            })?;
            blocks.push(parsed);
        }
        Ok(blocks)
    }
}

impl TextRecognizer for SidecarRecognizer {
    fn recognize(
        &self,
        page_index: usize,
        image: &RgbaImage,
        _languages: &[String],
        _accuracy: RecognitionAccuracy,
    ) -> RedactResult<Vec<RecognizedLine>> {
        let path = self
            .files
            .get(page_index)
            .ok_or_else(|| RedactError::PageRecognition {
                page: page_index,
                reason: "no sidecar file for page".to_string(),
            })?;

        let (img_w, img_h) = image.dimensions();
        let blocks = self.read_page(page_index, path)?;

        // Sidecar boxes are already normalized; convert to the pixel space
        // of whatever raster the adapter handed us so the adapter's own
        // conversion round-trips them back.
        Ok(blocks
            .into_iter()
            .map(|(rect, text)| RecognizedLine {
                text,
                bounds: crate::geometry::normalized_to_raster(rect, img_w, img_h),
                handle: None,
            })
            .collect())
    }
}
