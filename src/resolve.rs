//! Bounding-box resolution for matched substrings.
//!
//! Given a detection's char-offset range within a text block, produce the
//! most precise on-page box available. The preferred path queries the
//! block's recognition handle for exact sub-range geometry; when no handle
//! exists (or the query fails) the box is approximated proportionally along
//! the block.

use std::ops::Range;

use crate::extract::TextBlock;
use crate::geometry::NormalizedRect;

/// Resolves the normalized box for a matched char range within `block`.
///
/// The fallback approximation assumes a single-line block with roughly
/// uniform glyph widths; it may over- or under-cover a match in blocks
/// mixing variable-width characters. Callers must treat the result as
/// best-effort, not exact.
pub fn resolve_box(block: &TextBlock, range: &Range<usize>) -> NormalizedRect {
    if let Some(handle) = &block.handle {
        if let Some(rect) = handle.box_for_char_range(range.clone()) {
            return rect;
        }
    }
    approximate_box(block, range)
}

/// Proportional fallback: the match's box is carved out of the block's box
/// by character-count ratios. Character counts, not byte counts: the block
/// text may be multi-byte. Full block height is reused (blocks are treated
/// as single-line).
fn approximate_box(block: &TextBlock, range: &Range<usize>) -> NormalizedRect {
    let block_len = block.text.chars().count();
    if block_len == 0 || range.is_empty() {
        return block.bounds;
    }

    let start = range.start.min(block_len);
    let len = range.len().min(block_len - start);

    let start_ratio = start as f32 / block_len as f32;
    let width_ratio = len as f32 / block_len as f32;

    NormalizedRect {
        x: block.bounds.x + block.bounds.width * start_ratio,
        y: block.bounds.y,
        width: block.bounds.width * width_ratio,
        height: block.bounds.height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RecognitionHandle;
    use std::sync::Arc;

    fn block(text: &str, bounds: NormalizedRect) -> TextBlock {
        TextBlock {
            text: text.to_string(),
            bounds,
            page_index: 0,
            handle: None,
        }
    }

    struct ExactHandle(NormalizedRect);

    impl RecognitionHandle for ExactHandle {
        fn box_for_char_range(&self, _range: Range<usize>) -> Option<NormalizedRect> {
            Some(self.0)
        }
    }

    struct BrokenHandle;

    impl RecognitionHandle for BrokenHandle {
        fn box_for_char_range(&self, _range: Range<usize>) -> Option<NormalizedRect> {
            None
        }
    }

    #[test]
    fn test_handle_box_returned_as_is() {
        let exact = NormalizedRect::new(0.25, 0.5, 0.1, 0.02);
        let mut b = block("aaaXXXbbb", NormalizedRect::new(0.0, 0.4, 0.9, 0.05));
        b.handle = Some(Arc::new(ExactHandle(exact)));
        assert_eq!(resolve_box(&b, &(3..6)), exact);
    }

    #[test]
    fn test_handle_failure_falls_back() {
        let mut b = block("aaaXXXbbb", NormalizedRect::new(0.0, 0.4, 0.9, 0.05));
        b.handle = Some(Arc::new(BrokenHandle));
        let rect = resolve_box(&b, &(3..6));
        // 9 chars, match at 3..6: starts a third of the way in, spans a third.
        assert!((rect.x - 0.3).abs() < 1e-4);
        assert!((rect.width - 0.3).abs() < 1e-4);
        assert!((rect.y - 0.4).abs() < 1e-4);
        assert!((rect.height - 0.05).abs() < 1e-4);
    }

    #[test]
    fn test_fallback_x_increases_with_offset() {
        let b = block("aaaXXXbbb", NormalizedRect::new(0.1, 0.2, 0.6, 0.05));
        let mut last_x = f32::NEG_INFINITY;
        for start in 0..6 {
            let rect = resolve_box(&b, &(start..start + 3));
            assert!(rect.x > last_x, "x must strictly increase with offset");
            last_x = rect.x;
        }
    }

    #[test]
    fn test_fallback_char_counts_not_bytes() {
        // Four chars, match on the last one; multi-byte text must not skew
        // the ratios.
        let b = block("ééXY", NormalizedRect::new(0.0, 0.0, 1.0, 0.1));
        let rect = resolve_box(&b, &(3..4));
        assert!((rect.x - 0.75).abs() < 1e-4);
        assert!((rect.width - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_empty_block_returns_block_bounds() {
        let bounds = NormalizedRect::new(0.2, 0.2, 0.3, 0.1);
        let b = block("", bounds);
        assert_eq!(resolve_box(&b, &(0..0)), bounds);
    }
}
