//! Interactive placement: gestures in view space become store mutations.
//!
//! Gestures arrive as raw view-space events; all space conversion goes
//! through [`crate::geometry`]. The controller holds only the current page,
//! view size, and in-flight drag state; the region store stays with its
//! single owner and is passed in per call.

use tracing::debug;
use uuid::Uuid;

use crate::geometry::{normalized_to_view, view_to_normalized, ViewPoint, ViewRect, ViewSize};
use crate::store::{RedactionRegion, RegionStore};

/// Minimum view-space width for a drawn region. Guards against accidental
/// taps registering as draws.
pub const MIN_DRAG_WIDTH: f32 = 10.0;

/// Minimum view-space height for a drawn region.
pub const MIN_DRAG_HEIGHT: f32 = 5.0;

/// A raw user gesture in view space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Single tap. Deliberately ignored for selection toggling, so that
    /// panning and zooming don't cause accidental selection changes.
    Tap(ViewPoint),
    /// Double tap: toggles the selection of the region under the point.
    DoubleTap(ViewPoint),
    DragBegan(ViewPoint),
    DragMoved(ViewPoint),
    DragEnded,
}

/// What a gesture did to the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    /// Nothing happened (single tap, miss, or an undersized/invalid drag,
    /// which is silently dropped).
    Ignored,
    /// Selection of an existing region was toggled.
    Toggled(Uuid),
    /// A drag completed and added a manual region.
    RegionAdded(Uuid),
    /// A drag is in flight.
    DragInProgress,
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    start: ViewPoint,
    current: ViewPoint,
}

/// Translates gestures on the currently displayed page into region-store
/// mutations.
#[derive(Debug)]
pub struct PlacementController {
    page_index: usize,
    view_size: ViewSize,
    drag: Option<DragState>,
}

impl PlacementController {
    pub fn new(page_index: usize, view_size: ViewSize) -> Self {
        Self {
            page_index,
            view_size,
            drag: None,
        }
    }

    /// Switches the displayed page; any in-flight drag is abandoned.
    pub fn set_page(&mut self, page_index: usize) {
        self.page_index = page_index;
        self.drag = None;
    }

    /// Updates the view size (e.g. after a rotation); any in-flight drag is
    /// abandoned since its coordinates no longer mean the same thing.
    pub fn set_view_size(&mut self, view_size: ViewSize) {
        self.view_size = view_size;
        self.drag = None;
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Feeds one gesture through the controller, mutating `store` as
    /// required.
    pub fn handle(&mut self, gesture: Gesture, store: &mut RegionStore) -> GestureOutcome {
        match gesture {
            Gesture::Tap(_) => GestureOutcome::Ignored,
            Gesture::DoubleTap(point) => self.toggle_at(point, store),
            Gesture::DragBegan(point) => {
                self.drag = Some(DragState {
                    start: point,
                    current: point,
                });
                GestureOutcome::DragInProgress
            }
            Gesture::DragMoved(point) => match self.drag.as_mut() {
                Some(drag) => {
                    drag.current = point;
                    GestureOutcome::DragInProgress
                }
                None => GestureOutcome::Ignored,
            },
            Gesture::DragEnded => self.finish_drag(store),
        }
    }

    /// Hit-tests the current page's regions in view space; the first hit
    /// (insertion order) wins.
    fn toggle_at(&self, point: ViewPoint, store: &mut RegionStore) -> GestureOutcome {
        let hit = store
            .regions_for_page(self.page_index)
            .iter()
            .find(|region| normalized_to_view(region.rect, self.view_size).contains(point))
            .map(|region| region.id);

        match hit {
            Some(id) => {
                store.toggle_selection(id);
                GestureOutcome::Toggled(id)
            }
            None => GestureOutcome::Ignored,
        }
    }

    fn finish_drag(&mut self, store: &mut RegionStore) -> GestureOutcome {
        let Some(drag) = self.drag.take() else {
            return GestureOutcome::Ignored;
        };

        let view_rect = ViewRect::from_corners(drag.start, drag.current);
        if view_rect.width <= MIN_DRAG_WIDTH || view_rect.height <= MIN_DRAG_HEIGHT {
            debug!(
                width = view_rect.width,
                height = view_rect.height,
                "drag below minimum size; no region created"
            );
            return GestureOutcome::Ignored;
        }

        let rect = view_to_normalized(view_rect, self.view_size).clamped();
        let region = RedactionRegion::manual(self.page_index, rect);
        match store.add(region) {
            Ok(id) => GestureOutcome::RegionAdded(id),
            // Invalid manual regions are silently dropped.
            Err(_) => GestureOutcome::Ignored,
        }
    }
}
