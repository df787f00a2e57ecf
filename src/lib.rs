//! Sensitive-data detection and irreversible redaction for scanned
//! documents.
//!
//! The engine extracts positioned text from rendered page images via an
//! external recognition collaborator, classifies spans as sensitive-data
//! categories with confidence scores, resolves precise on-page bounding
//! boxes (with a proportional fallback), tracks automatic and user-drawn
//! redaction regions with selection state, and composes a flattened output
//! document where every selected region is painted opaque. The output is
//! redrawn pixels, never an overlay, so redacted content cannot be
//! recovered.
//!
//! # Architecture
//!
//! - [`geometry`]: pure conversions between raster, view, and normalized
//!   page space
//! - [`classify`]: category pattern matchers and confidence scoring
//! - [`extract`]: the recognition-collaborator seam and extraction adapter
//! - [`resolve`]: sub-block bounding-box resolution with fallback
//! - [`store`]: the per-page region collection with selection state
//! - [`placement`]: view-space gestures to store mutations
//! - [`compose`]: the flattening compositor and PDF output
//! - [`session`]: the per-document orchestrator and UI-facing API
//! - [`error`]: error taxonomy
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use blackout::{
//!     Classifier, ExtractionAdapter, NullRecognizer, RasterDocument, RedactionSession,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let document = RasterDocument::open_images(
//!     &["page-1.png".into(), "page-2.png".into()],
//!     150.0,
//! )?;
//! let adapter = ExtractionAdapter::new(Arc::new(NullRecognizer));
//! let mut session = RedactionSession::new(document, adapter, Classifier::with_default_matchers());
//!
//! let summary = session.analyze()?;
//! println!("{} regions found", summary.total_regions);
//!
//! let output = session.apply()?;
//! output.save_pdf("redacted.pdf".as_ref())?;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod compose;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod placement;
pub mod resolve;
pub mod session;
pub mod store;

// Re-exports for convenient access
pub use classify::{Classifier, Detection, Matcher, NameTagger, SensitiveCategory};
pub use compose::{
    Compositor, FlattenedDocument, RasterDocument, SourceDocument, REDACTION_PADDING_POINTS,
};
pub use error::{RedactError, RedactResult};
pub use extract::{
    ExtractionAdapter, NullRecognizer, RecognitionAccuracy, RecognitionHandle, RecognizedLine,
    SidecarRecognizer, TextBlock, TextRecognizer,
};
pub use geometry::{NormalizedRect, RasterRect, ViewPoint, ViewRect, ViewSize};
pub use placement::{Gesture, GestureOutcome, PlacementController};
pub use resolve::resolve_box;
pub use session::{AnalysisState, AnalysisSummary, CancelToken, Progress, RedactionSession};
pub use store::{RedactionRegion, RegionSource, RegionStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_classifier_covers_builtin_categories() {
        let classifier = Classifier::with_default_matchers();
        let categories = classifier.categories();
        for category in SensitiveCategory::BUILTIN {
            assert!(categories.contains(&category));
        }
    }

    #[test]
    fn test_store_and_geometry_exports() {
        let mut store = RegionStore::new();
        let rect = NormalizedRect::new(0.1, 0.1, 0.2, 0.1);
        store.add(RedactionRegion::manual(0, rect)).unwrap();
        assert_eq!(store.selected_regions().len(), 1);
    }
}
