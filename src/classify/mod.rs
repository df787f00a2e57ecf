//! Sensitive-data classification over recognized text.
//!
//! Each [`SensitiveCategory`] has one [`Matcher`] implementation that scans a
//! block of text and reports char-offset ranges with a confidence score.
//! Classification is a pure text pass; on-page bounding boxes are resolved in
//! a separate step (see [`crate::resolve`]).

pub mod names;
pub mod patterns;

pub use names::{NameTagger, NAME_CONFIDENCE};
pub use patterns::{
    AddressMatcher, BankAccountMatcher, CreditCardMatcher, CustomMatcher, DateMatcher,
    EmailMatcher, IntlPassportMatcher, IntlPhoneMatcher, IpAddressMatcher, PassportMatcher,
    PhoneMatcher, SsnMatcher,
};

use std::ops::Range;
use std::sync::Arc;

use regex::Regex;

use crate::error::RedactResult;

/// Minimum confidence for a detection to be emitted at all.
pub const CONFIDENCE_FLOOR: f32 = 0.5;

/// The closed set of sensitive-data categories the engine can detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensitiveCategory {
    Ssn,
    CreditCard,
    Phone,
    PhoneIntl,
    Email,
    Date,
    Passport,
    PassportIntl,
    BankAccount,
    Address,
    IpAddress,
    PersonalName,
    Custom,
}

impl SensitiveCategory {
    /// Every category with a built-in pattern matcher (everything except
    /// `PersonalName`, which needs a [`NameTagger`], and `Custom`).
    pub const BUILTIN: [SensitiveCategory; 11] = [
        Self::Ssn,
        Self::CreditCard,
        Self::Phone,
        Self::PhoneIntl,
        Self::Email,
        Self::Date,
        Self::Passport,
        Self::PassportIntl,
        Self::BankAccount,
        Self::Address,
        Self::IpAddress,
    ];

    /// Default minimum-confidence threshold for this category.
    pub fn default_confidence(&self) -> f32 {
        match self {
            Self::BankAccount => 0.6,
            Self::Address | Self::Date => 0.7,
            Self::CreditCard => CreditCardMatcher::STRONG_CONFIDENCE,
            Self::PersonalName => NAME_CONFIDENCE,
            _ => 0.8,
        }
    }

    /// Human-readable label used in logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ssn => "SSN",
            Self::CreditCard => "credit card",
            Self::Phone => "phone",
            Self::PhoneIntl => "intl phone",
            Self::Email => "email",
            Self::Date => "date",
            Self::Passport => "passport",
            Self::PassportIntl => "intl passport",
            Self::BankAccount => "bank account",
            Self::Address => "address",
            Self::IpAddress => "IP address",
            Self::PersonalName => "personal name",
            Self::Custom => "custom pattern",
        }
    }
}

/// One raw match inside a block of text.
///
/// `range` is in **character** offsets, not bytes, because downstream box
/// approximation is proportional to character counts.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternHit {
    pub range: Range<usize>,
    pub confidence: f32,
}

/// A classified span of block text, not yet positioned on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub category: SensitiveCategory,
    /// Char-offset range into the block text.
    pub range: Range<usize>,
    pub confidence: f32,
    /// The matched text itself.
    pub text: String,
}

/// A pattern matcher for one sensitive-data category.
pub trait Matcher: Send + Sync {
    fn category(&self) -> SensitiveCategory;

    /// Scans `text` and returns every match with char-offset ranges.
    /// Matching is stateless; a block may yield zero, one, or many hits.
    fn find(&self, text: &str) -> Vec<PatternHit>;
}

/// Converts a regex byte range into a char-offset range.
pub(crate) fn byte_to_char_range(text: &str, start: usize, end: usize) -> Range<usize> {
    let char_start = text[..start].chars().count();
    let char_len = text[start..end].chars().count();
    char_start..char_start + char_len
}

/// Extracts the substring covered by a char-offset range.
pub(crate) fn char_substring(text: &str, range: &Range<usize>) -> String {
    text.chars()
        .skip(range.start)
        .take(range.len())
        .collect()
}

/// Maps every regex match in `text` to a hit at a fixed confidence.
pub(crate) fn hits_at_confidence(regex: &Regex, text: &str, confidence: f32) -> Vec<PatternHit> {
    regex
        .find_iter(text)
        .map(|m| PatternHit {
            range: byte_to_char_range(text, m.start(), m.end()),
            confidence,
        })
        .collect()
}

/// Classifies block text against a set of category matchers.
///
/// Matchers are held one per category; overlapping matches across categories
/// are kept distinct, each independently offered to the user for selection.
pub struct Classifier {
    matchers: Vec<Box<dyn Matcher>>,
    name_tagger: Option<Arc<dyn NameTagger>>,
}

impl Classifier {
    /// A classifier with no matchers registered.
    pub fn new() -> Self {
        Self {
            matchers: Vec::new(),
            name_tagger: None,
        }
    }

    /// A classifier with every built-in category matcher registered.
    pub fn with_default_matchers() -> Self {
        Self::for_categories(&SensitiveCategory::BUILTIN)
    }

    /// A classifier with the built-in matchers for `categories` only.
    /// `PersonalName` and `Custom` are skipped; register those explicitly
    /// via [`set_name_tagger`](Self::set_name_tagger) and
    /// [`add_custom_pattern`](Self::add_custom_pattern).
    pub fn for_categories(categories: &[SensitiveCategory]) -> Self {
        let mut classifier = Self::new();
        for category in categories {
            if let Some(matcher) = patterns::builtin_matcher(*category) {
                classifier.matchers.push(matcher);
            }
        }
        classifier
    }

    pub fn add_matcher(&mut self, matcher: Box<dyn Matcher>) {
        self.matchers.push(matcher);
    }

    /// Registers a user-supplied regex as a `Custom` category matcher.
    pub fn add_custom_pattern(&mut self, pattern: &str) -> RedactResult<()> {
        self.matchers.push(Box::new(CustomMatcher::new(pattern)?));
        Ok(())
    }

    /// Registers the named-entity sub-service used for `PersonalName`.
    pub fn set_name_tagger(&mut self, tagger: Arc<dyn NameTagger>) {
        self.name_tagger = Some(tagger);
    }

    /// The categories this classifier can currently detect, in first-seen
    /// order with duplicates removed.
    pub fn categories(&self) -> Vec<SensitiveCategory> {
        let mut categories: Vec<SensitiveCategory> = Vec::new();
        for matcher in &self.matchers {
            let category = matcher.category();
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        if self.name_tagger.is_some() && !categories.contains(&SensitiveCategory::PersonalName) {
            categories.push(SensitiveCategory::PersonalName);
        }
        categories
    }

    /// Classifies one block of text against the requested categories.
    ///
    /// Stateless and order-independent; detections below
    /// [`CONFIDENCE_FLOOR`] are dropped. The result is in match order, not
    /// confidence order; page-level aggregation sorts (see
    /// [`sort_by_confidence`]).
    pub fn classify(&self, text: &str, categories: &[SensitiveCategory]) -> Vec<Detection> {
        let mut detections = Vec::new();

        for matcher in &self.matchers {
            if !categories.contains(&matcher.category()) {
                continue;
            }
            for hit in matcher.find(text) {
                if hit.confidence < CONFIDENCE_FLOOR {
                    continue;
                }
                detections.push(Detection {
                    category: matcher.category(),
                    text: char_substring(text, &hit.range),
                    range: hit.range,
                    confidence: hit.confidence,
                });
            }
        }

        if categories.contains(&SensitiveCategory::PersonalName) {
            if let Some(tagger) = &self.name_tagger {
                for hit in names::name_hits(tagger.as_ref(), text) {
                    detections.push(Detection {
                        category: SensitiveCategory::PersonalName,
                        text: char_substring(text, &hit.range),
                        range: hit.range,
                        confidence: hit.confidence,
                    });
                }
            }
        }

        detections
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::with_default_matchers()
    }
}

/// Sorts detections by descending confidence, ties broken by first
/// appearance (the sort is stable), so the most likely sensitive items
/// surface first.
pub fn sort_by_confidence(detections: &mut [Detection]) {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
