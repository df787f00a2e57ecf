//! The redaction session: per-page analysis orchestration and the API the
//! surrounding UI drives.
//!
//! A session is explicitly constructed and passed by reference; there is no
//! ambient global state. It owns the region store (the single mutation
//! owner), the extraction adapter, the classifier, and the source document.
//!
//! Analysis is sequential across pages: page N's extraction does not start
//! until page N-1 has fully resolved, so at most one page raster is alive at
//! a time. Cancellation is cooperative, checked once per page boundary;
//! regions already resolved for completed pages are kept.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::classify::{Classifier, Detection, SensitiveCategory};
use crate::compose::{Compositor, FlattenedDocument, SourceDocument};
use crate::error::RedactResult;
use crate::extract::{ExtractionAdapter, TextBlock};
use crate::geometry::{view_to_normalized, NormalizedRect, ViewRect, ViewSize};
use crate::placement::{MIN_DRAG_HEIGHT, MIN_DRAG_WIDTH};
use crate::resolve::resolve_box;
use crate::store::{RedactionRegion, RegionStore};

/// Cooperative cancellation flag, cloneable across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Where the analysis loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    Idle,
    Extracting(usize),
    Classifying(usize),
    Resolving(usize),
    Done,
}

/// Progress report, published after each page completes.
///
/// Consumers must tolerate these arriving on a different execution context
/// than the one that requested analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub page_index: usize,
    pub page_count: usize,
    /// Fraction of pages completed, in `[0, 1]`.
    pub fraction: f32,
    /// Regions found so far, across all completed pages.
    pub regions_found: usize,
}

/// Terminal analysis report.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSummary {
    pub total_regions: usize,
    /// Page index → number of regions found on it.
    pub regions_by_page: BTreeMap<usize, usize>,
    /// Pages where recognition found no text (including failed pages).
    pub pages_without_text: Vec<usize>,
    /// True when analysis stopped at a page boundary before the last page.
    pub cancelled: bool,
}

/// One interactive redaction session over one source document.
pub struct RedactionSession<D: SourceDocument> {
    document: D,
    adapter: ExtractionAdapter,
    classifier: Classifier,
    categories: Vec<SensitiveCategory>,
    compositor: Compositor,
    store: RegionStore,
    cancel: CancelToken,
    state: AnalysisState,
}

impl<D: SourceDocument> RedactionSession<D> {
    pub fn new(document: D, adapter: ExtractionAdapter, classifier: Classifier) -> Self {
        let categories = classifier.categories();
        Self {
            document,
            adapter,
            classifier,
            categories,
            compositor: Compositor::new(),
            store: RegionStore::new(),
            cancel: CancelToken::new(),
            state: AnalysisState::Idle,
        }
    }

    /// Restricts detection to the given categories.
    pub fn with_categories(mut self, categories: Vec<SensitiveCategory>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_compositor(mut self, compositor: Compositor) -> Self {
        self.compositor = compositor;
        self
    }

    /// Token for cancelling analysis from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> AnalysisState {
        self.state
    }

    pub fn store(&self) -> &RegionStore {
        &self.store
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Runs the full analysis pipeline without progress reporting.
    pub fn analyze(&mut self) -> RedactResult<AnalysisSummary> {
        self.analyze_with_progress(|_| {})
    }

    /// Runs extract → classify → resolve for every page, sequentially,
    /// populating the region store. Per-page failures are absorbed: the
    /// page is recorded as "no text found" and the loop proceeds.
    pub fn analyze_with_progress(
        &mut self,
        mut on_progress: impl FnMut(Progress),
    ) -> RedactResult<AnalysisSummary> {
        let page_count = self.document.page_count();
        let mut summary = AnalysisSummary::default();

        for page_index in 0..page_count {
            // Cancellation is checked only between pages; a page in flight
            // always completes so its regions stay valid.
            if self.cancel.is_cancelled() {
                info!(page = page_index, "analysis cancelled at page boundary");
                summary.cancelled = true;
                break;
            }

            let (had_text, regions) = self.analyze_page(page_index);
            if !had_text {
                summary.pages_without_text.push(page_index);
            }

            let found = regions.len();
            summary.regions_by_page.insert(page_index, found);
            summary.total_regions += found;
            for region in regions {
                self.store.add(region)?;
            }

            on_progress(Progress {
                page_index,
                page_count,
                fraction: (page_index + 1) as f32 / page_count as f32,
                regions_found: summary.total_regions,
            });
        }

        self.state = AnalysisState::Done;
        info!(
            total = summary.total_regions,
            pages = page_count,
            cancelled = summary.cancelled,
            "analysis finished"
        );
        Ok(summary)
    }

    /// Extract → classify → resolve for a single page. The page raster is
    /// dropped before returning, bounding peak memory to one page.
    ///
    /// The flag is whether extraction produced any text at all; a page full
    /// of text may still yield zero regions.
    fn analyze_page(&mut self, page_index: usize) -> (bool, Vec<RedactionRegion>) {
        self.state = AnalysisState::Extracting(page_index);
        let blocks = match self.document.render_page(page_index) {
            Ok(raster) => {
                let (blocks, _scale) = self.adapter.extract(&raster, page_index);
                blocks
            }
            Err(err) => {
                // Render failures are page-local here: the page contributes
                // no findings, matching the recognition-failure policy.
                warn!(page = page_index, error = %err, "page render failed; no text extracted");
                Vec::new()
            }
        };

        let had_text = !blocks.is_empty();

        self.state = AnalysisState::Classifying(page_index);
        let mut classified: Vec<(usize, Detection)> = Vec::new();
        for (block_idx, block) in blocks.iter().enumerate() {
            for detection in self.classifier.classify(&block.text, &self.categories) {
                classified.push((block_idx, detection));
            }
        }

        self.state = AnalysisState::Resolving(page_index);
        // Sort page-wide by descending confidence (stable: ties keep first
        // appearance order) so the most likely items surface first.
        let mut order: Vec<usize> = (0..classified.len()).collect();
        order.sort_by(|&a, &b| {
            classified[b]
                .1
                .confidence
                .partial_cmp(&classified[a].1.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut regions = Vec::with_capacity(classified.len());
        for idx in order {
            let (block_idx, detection) = &classified[idx];
            let block: &TextBlock = &blocks[*block_idx];
            let rect = resolve_box(block, &detection.range).clamped();
            debug!(
                page = page_index,
                category = detection.category.label(),
                confidence = detection.confidence,
                "region resolved"
            );
            regions.push(RedactionRegion::automatic(
                page_index,
                rect,
                detection.text.clone(),
                detection.category,
                detection.confidence,
            ));
        }
        (had_text, regions)
    }

    /// Adds a user-drawn region given in view space. Regions below the
    /// minimum view size, or on a nonexistent page, are silently ignored
    /// (no region is created).
    pub fn add_manual_region(
        &mut self,
        page_index: usize,
        view_rect: ViewRect,
        view_size: ViewSize,
    ) -> Option<Uuid> {
        if view_rect.width <= MIN_DRAG_WIDTH || view_rect.height <= MIN_DRAG_HEIGHT {
            return None;
        }
        let rect = view_to_normalized(view_rect, view_size).clamped();
        self.add_manual_region_normalized(page_index, rect)
    }

    /// Adds a user-supplied region already in normalized page space.
    pub fn add_manual_region_normalized(
        &mut self,
        page_index: usize,
        rect: NormalizedRect,
    ) -> Option<Uuid> {
        if page_index >= self.document.page_count() {
            return None;
        }
        self.store
            .add(RedactionRegion::manual(page_index, rect))
            .ok()
    }

    pub fn toggle_region(&mut self, id: Uuid) -> bool {
        self.store.toggle_selection(id)
    }

    /// Removes a manual region; automatic regions are rejected (no-op).
    pub fn remove_manual_region(&mut self, id: Uuid) -> bool {
        self.store.remove(id)
    }

    pub fn select_all(&mut self) {
        self.store.select_all();
    }

    pub fn deselect_all(&mut self) {
        self.store.deselect_all();
    }

    /// Composes the flattened output from the currently selected regions.
    ///
    /// Succeeds only if every page composed; there is never a partial
    /// output.
    pub fn apply(&self) -> RedactResult<FlattenedDocument> {
        let selected = self.store.selected_regions();
        info!(selected = selected.len(), "applying redactions");
        self.compositor.compose(&self.document, &selected)
    }
}
