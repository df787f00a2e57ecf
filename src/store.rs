//! The authoritative collection of redaction regions for one session.
//!
//! Regions are keyed per page and carry selection state. The store is not
//! thread-safe by contract: exactly one logical owner (the session) performs
//! all mutation; reads may be snapshotted freely.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::classify::SensitiveCategory;
use crate::error::{RedactError, RedactResult};
use crate::geometry::NormalizedRect;

/// How a region came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    /// Produced by the classifier pipeline.
    Automatic,
    /// Drawn by the user.
    Manual,
}

/// A candidate or confirmed redaction rectangle.
///
/// Geometry is never mutated after creation; the only mutable state is
/// selection, plus deletion for manual regions.
#[derive(Debug, Clone)]
pub struct RedactionRegion {
    pub id: Uuid,
    pub page_index: usize,
    pub rect: NormalizedRect,
    pub source: RegionSource,
    /// The matched text. Always present for automatic regions.
    pub detected_text: Option<String>,
    /// Always present for automatic regions.
    pub category: Option<SensitiveCategory>,
    pub confidence: Option<f32>,
    pub is_selected: bool,
}

impl RedactionRegion {
    /// An automatic finding. Created selected so every detected item is
    /// redacted unless the user opts out.
    pub fn automatic(
        page_index: usize,
        rect: NormalizedRect,
        detected_text: String,
        category: SensitiveCategory,
        confidence: f32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            page_index,
            rect,
            source: RegionSource::Automatic,
            detected_text: Some(detected_text),
            category: Some(category),
            confidence: Some(confidence),
            is_selected: true,
        }
    }

    /// A user-drawn region, always initially selected.
    pub fn manual(page_index: usize, rect: NormalizedRect) -> Self {
        Self {
            id: Uuid::new_v4(),
            page_index,
            rect,
            source: RegionSource::Manual,
            detected_text: None,
            category: None,
            confidence: None,
            is_selected: true,
        }
    }
}

/// In-memory region collection, keyed by page index.
#[derive(Debug, Default)]
pub struct RegionStore {
    pages: BTreeMap<usize, Vec<RedactionRegion>>,
}

impl RegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a region, enforcing the store invariants: rect within the unit
    /// square, automatic regions carrying text and category, no duplicate
    /// ids.
    pub fn add(&mut self, region: RedactionRegion) -> RedactResult<Uuid> {
        if !region.rect.is_in_unit_square() {
            return Err(RedactError::InvalidRegion {
                reason: format!("rect outside unit square: {:?}", region.rect),
            });
        }
        if region.source == RegionSource::Automatic
            && (region.detected_text.is_none() || region.category.is_none())
        {
            return Err(RedactError::InvalidRegion {
                reason: "automatic region without detected text or category".to_string(),
            });
        }
        if self.find(region.id).is_some() {
            return Err(RedactError::InvalidRegion {
                reason: format!("duplicate region id {}", region.id),
            });
        }

        let id = region.id;
        self.pages.entry(region.page_index).or_default().push(region);
        Ok(id)
    }

    /// Removes a **manual** region. Removing an automatic region is
    /// rejected (returns `false`, no-op): automatic findings are meant to be
    /// deselected, not deleted, preserving audit visibility.
    pub fn remove(&mut self, id: Uuid) -> bool {
        for regions in self.pages.values_mut() {
            if let Some(pos) = regions.iter().position(|r| r.id == id) {
                if regions[pos].source != RegionSource::Manual {
                    return false;
                }
                regions.remove(pos);
                return true;
            }
        }
        false
    }

    /// Toggles a region's selection. Returns `false` when the id is unknown.
    pub fn toggle_selection(&mut self, id: Uuid) -> bool {
        for regions in self.pages.values_mut() {
            if let Some(region) = regions.iter_mut().find(|r| r.id == id) {
                region.is_selected = !region.is_selected;
                return true;
            }
        }
        false
    }

    pub fn find(&self, id: Uuid) -> Option<&RedactionRegion> {
        self.pages.values().flatten().find(|r| r.id == id)
    }

    /// Regions on one page, in insertion order.
    pub fn regions_for_page(&self, page_index: usize) -> &[RedactionRegion] {
        self.pages
            .get(&page_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every selected region across all pages, page order ascending.
    pub fn selected_regions(&self) -> Vec<&RedactionRegion> {
        self.pages
            .values()
            .flatten()
            .filter(|r| r.is_selected)
            .collect()
    }

    pub fn select_all(&mut self) {
        self.for_each_mut(|r| r.is_selected = true);
    }

    pub fn deselect_all(&mut self) {
        self.for_each_mut(|r| r.is_selected = false);
    }

    pub fn iter(&self) -> impl Iterator<Item = &RedactionRegion> {
        self.pages.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.values().all(Vec::is_empty)
    }

    fn for_each_mut(&mut self, f: impl Fn(&mut RedactionRegion)) {
        for regions in self.pages.values_mut() {
            for region in regions.iter_mut() {
                f(region);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> NormalizedRect {
        NormalizedRect::new(0.1, 0.1, 0.2, 0.05)
    }

    #[test]
    fn test_add_and_query() {
        let mut store = RegionStore::new();
        let id = store
            .add(RedactionRegion::automatic(
                0,
                rect(),
                "123-45-6789".to_string(),
                SensitiveCategory::Ssn,
                0.8,
            ))
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.regions_for_page(0).len(), 1);
        assert!(store.regions_for_page(1).is_empty());
        assert!(store.find(id).unwrap().is_selected);
    }

    #[test]
    fn test_add_rejects_out_of_bounds_rect() {
        let mut store = RegionStore::new();
        let region = RedactionRegion::manual(0, NormalizedRect::new(0.9, 0.9, 0.3, 0.3));
        assert!(store.add(region).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut store = RegionStore::new();
        let region = RedactionRegion::manual(0, rect());
        let dup = region.clone();
        store.add(region).unwrap();
        assert!(store.add(dup).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_manual_only() {
        let mut store = RegionStore::new();
        let auto_id = store
            .add(RedactionRegion::automatic(
                0,
                rect(),
                "x@y.co".to_string(),
                SensitiveCategory::Email,
                0.8,
            ))
            .unwrap();
        let manual_id = store.add(RedactionRegion::manual(0, rect())).unwrap();

        // Automatic removal is a no-op.
        assert!(!store.remove(auto_id));
        assert!(store.find(auto_id).is_some());

        assert!(store.remove(manual_id));
        assert!(store.find(manual_id).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_toggle_and_bulk_selection() {
        let mut store = RegionStore::new();
        let a = store.add(RedactionRegion::manual(0, rect())).unwrap();
        let b = store.add(RedactionRegion::manual(2, rect())).unwrap();

        assert_eq!(store.selected_regions().len(), 2);
        assert!(store.toggle_selection(a));
        assert_eq!(store.selected_regions().len(), 1);
        assert_eq!(store.selected_regions()[0].id, b);

        store.deselect_all();
        assert!(store.selected_regions().is_empty());
        store.select_all();
        assert_eq!(store.selected_regions().len(), 2);

        assert!(!store.toggle_selection(Uuid::new_v4()));
    }
}
