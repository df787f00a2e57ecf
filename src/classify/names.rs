//! Personal-name detection via an external named-entity sub-service.
//!
//! The engine does not ship its own named-entity model; a [`NameTagger`]
//! implementation wraps whatever service the platform provides. Tagger
//! output is word-granular and noisy, so results are filtered against a
//! short stop-list of common words frequently mis-tagged as names before
//! being emitted at a fixed confidence.

use std::ops::Range;

use super::{char_substring, PatternHit};

/// Fixed confidence for every emitted personal-name hit.
pub const NAME_CONFIDENCE: f32 = 0.75;

/// Named-entity sub-service for personal names.
///
/// Implementations return **char-offset** ranges into `text`, one per tagged
/// word.
pub trait NameTagger: Send + Sync {
    fn tag_personal_names(&self, text: &str) -> Vec<Range<usize>>;
}

/// Common words the upstream tagger tends to mislabel as personal names.
const STOP_WORDS: &[&str] = &[
    "the", "and", "dear", "hello", "hi", "regards", "sincerely", "best", "thanks", "thank",
    "from", "subject", "attention", "attn", "mr", "mrs", "ms", "dr", "page", "invoice", "total",
    "date", "name", "bill", "will", "may",
];

/// Filters raw tagger output and maps it to pattern hits.
///
/// Drops single- and two-character results and stop-listed words; everything
/// surviving is emitted at [`NAME_CONFIDENCE`].
pub(crate) fn name_hits(tagger: &dyn NameTagger, text: &str) -> Vec<PatternHit> {
    tagger
        .tag_personal_names(text)
        .into_iter()
        .filter(|range| {
            if range.len() <= 2 {
                return false;
            }
            let word = char_substring(text, range);
            let normalized: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            !normalized.is_empty() && !STOP_WORDS.contains(&normalized.as_str())
        })
        .map(|range| PatternHit {
            range,
            confidence: NAME_CONFIDENCE,
        })
        .collect()
}
