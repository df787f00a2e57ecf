//! Built-in pattern matchers, one per sensitive-data category.
//!
//! Every matcher compiles its regex once behind a `Lazy` static and reports
//! char-offset hits at the category's confidence. Validation beyond the
//! regex itself (NANP digit rules, card digit counts, IP octet ranges) lives
//! beside the pattern it guards.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{byte_to_char_range, hits_at_confidence, Matcher, PatternHit, SensitiveCategory};
use crate::error::{RedactError, RedactResult};

/// US Social Security numbers in the canonical NNN-NN-NNNN form.
#[derive(Debug, Clone, Default)]
pub struct SsnMatcher;

impl SsnMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("valid SSN regex"));
        &PATTERN
    }
}

impl Matcher for SsnMatcher {
    fn category(&self) -> SensitiveCategory {
        SensitiveCategory::Ssn
    }

    fn find(&self, text: &str) -> Vec<PatternHit> {
        hits_at_confidence(Self::regex(), text, self.category().default_confidence())
    }
}

/// Payment-card numbers: runs of 12+ digits, optionally space- or
/// dash-grouped.
///
/// A match whose stripped digit count is 13-19 (valid card lengths) scores
/// 0.9; anything else scores 0.4 and is dropped by the emission floor.
#[derive(Debug, Clone, Default)]
pub struct CreditCardMatcher;

impl CreditCardMatcher {
    pub const STRONG_CONFIDENCE: f32 = 0.9;
    pub const WEAK_CONFIDENCE: f32 = 0.4;

    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\b\d(?:[ -]?\d){11,}\b").expect("valid card regex"));
        &PATTERN
    }

    /// Length check over the stripped digits: 13-19 digits is card-shaped.
    pub fn digit_count_is_card_length(text: &str) -> bool {
        let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
        (13..=19).contains(&digits)
    }
}

impl Matcher for CreditCardMatcher {
    fn category(&self) -> SensitiveCategory {
        SensitiveCategory::CreditCard
    }

    fn find(&self, text: &str) -> Vec<PatternHit> {
        Self::regex()
            .find_iter(text)
            .map(|m| {
                let confidence = if Self::digit_count_is_card_length(m.as_str()) {
                    Self::STRONG_CONFIDENCE
                } else {
                    Self::WEAK_CONFIDENCE
                };
                PatternHit {
                    range: byte_to_char_range(text, m.start(), m.end()),
                    confidence,
                }
            })
            .collect()
    }
}

/// North American Numbering Plan phone numbers.
///
/// Supports (555) 123-4567, 555-123-4567, 555.123.4567, +1 555 123 4567.
/// The area code's leading digit is restricted to 2-9 by the pattern.
#[derive(Debug, Clone, Default)]
pub struct PhoneMatcher;

impl PhoneMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?:\+?1[-.\s]?)?\(?([2-9]\d{2})\)?[-.\s]?(\d{3})[-.\s]?(\d{4})\b")
                .expect("valid NANP phone regex")
        });
        &PATTERN
    }
}

impl Matcher for PhoneMatcher {
    fn category(&self) -> SensitiveCategory {
        SensitiveCategory::Phone
    }

    fn find(&self, text: &str) -> Vec<PatternHit> {
        hits_at_confidence(Self::regex(), text, self.category().default_confidence())
    }
}

/// International phone numbers: a `+` country code followed by 8-15 digits
/// with optional separators.
#[derive(Debug, Clone, Default)]
pub struct IntlPhoneMatcher;

impl IntlPhoneMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\+(?:\d[\s.-]?){7,14}\d\b").expect("valid intl phone regex"));
        &PATTERN
    }
}

impl Matcher for IntlPhoneMatcher {
    fn category(&self) -> SensitiveCategory {
        SensitiveCategory::PhoneIntl
    }

    fn find(&self, text: &str) -> Vec<PatternHit> {
        hits_at_confidence(Self::regex(), text, self.category().default_confidence())
    }
}

/// Email addresses.
#[derive(Debug, Clone, Default)]
pub struct EmailMatcher;

impl EmailMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
                .expect("valid email regex")
        });
        &PATTERN
    }
}

impl Matcher for EmailMatcher {
    fn category(&self) -> SensitiveCategory {
        SensitiveCategory::Email
    }

    fn find(&self, text: &str) -> Vec<PatternHit> {
        hits_at_confidence(Self::regex(), text, self.category().default_confidence())
    }
}

/// Calendar dates: numeric MM/DD/YYYY (or `-` separated) and spelled-out
/// month forms like "January 5, 2024".
#[derive(Debug, Clone, Default)]
pub struct DateMatcher;

impl DateMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(
                r"\b(?:\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|Jul(?:y)?|Aug(?:ust)?|Sep(?:tember)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\.?\s+\d{1,2},?\s+\d{4})\b",
            )
            .expect("valid date regex")
        });
        &PATTERN
    }
}

impl Matcher for DateMatcher {
    fn category(&self) -> SensitiveCategory {
        SensitiveCategory::Date
    }

    fn find(&self, text: &str) -> Vec<PatternHit> {
        hits_at_confidence(Self::regex(), text, self.category().default_confidence())
    }
}

/// US passport numbers: one uppercase letter followed by eight digits.
#[derive(Debug, Clone, Default)]
pub struct PassportMatcher;

impl PassportMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\b[A-Z]\d{8}\b").expect("valid passport regex"));
        &PATTERN
    }
}

impl Matcher for PassportMatcher {
    fn category(&self) -> SensitiveCategory {
        SensitiveCategory::Passport
    }

    fn find(&self, text: &str) -> Vec<PatternHit> {
        hits_at_confidence(Self::regex(), text, self.category().default_confidence())
    }
}

/// International passport numbers: one or two uppercase letters followed by
/// six to nine digits. Overlaps the US form by design; overlapping hits are
/// kept distinct.
#[derive(Debug, Clone, Default)]
pub struct IntlPassportMatcher;

impl IntlPassportMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\b[A-Z]{1,2}\d{6,9}\b").expect("valid intl passport regex"));
        &PATTERN
    }
}

impl Matcher for IntlPassportMatcher {
    fn category(&self) -> SensitiveCategory {
        SensitiveCategory::PassportIntl
    }

    fn find(&self, text: &str) -> Vec<PatternHit> {
        hits_at_confidence(Self::regex(), text, self.category().default_confidence())
    }
}

/// Bank-account-like digit runs (8-17 digits, unseparated). Deliberately
/// broad, hence the lower 0.6 confidence.
#[derive(Debug, Clone, Default)]
pub struct BankAccountMatcher;

impl BankAccountMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\b\d{8,17}\b").expect("valid bank account regex"));
        &PATTERN
    }
}

impl Matcher for BankAccountMatcher {
    fn category(&self) -> SensitiveCategory {
        SensitiveCategory::BankAccount
    }

    fn find(&self, text: &str) -> Vec<PatternHit> {
        hits_at_confidence(Self::regex(), text, self.category().default_confidence())
    }
}

/// US street addresses: house number, capitalized street words, and a
/// street-type suffix.
#[derive(Debug, Clone, Default)]
pub struct AddressMatcher;

impl AddressMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(
                r"\b\d{1,5}\s+(?:[A-Z][a-zA-Z]*\s+){1,4}(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Court|Ct|Place|Pl|Way|Terrace|Ter|Circle|Cir)\b",
            )
            .expect("valid address regex")
        });
        &PATTERN
    }
}

impl Matcher for AddressMatcher {
    fn category(&self) -> SensitiveCategory {
        SensitiveCategory::Address
    }

    fn find(&self, text: &str) -> Vec<PatternHit> {
        hits_at_confidence(Self::regex(), text, self.category().default_confidence())
    }
}

/// IPv4 addresses with per-octet range validation.
#[derive(Debug, Clone, Default)]
pub struct IpAddressMatcher;

impl IpAddressMatcher {
    pub fn new() -> Self {
        Self
    }

    fn regex() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("valid IPv4 regex"));
        &PATTERN
    }

    /// True when every dotted component parses as an octet (0-255).
    pub fn octets_in_range(candidate: &str) -> bool {
        candidate
            .split('.')
            .all(|octet| octet.parse::<u16>().map(|v| v <= 255).unwrap_or(false))
    }
}

impl Matcher for IpAddressMatcher {
    fn category(&self) -> SensitiveCategory {
        SensitiveCategory::IpAddress
    }

    fn find(&self, text: &str) -> Vec<PatternHit> {
        Self::regex()
            .find_iter(text)
            .filter(|m| Self::octets_in_range(m.as_str()))
            .map(|m| PatternHit {
                range: byte_to_char_range(text, m.start(), m.end()),
                confidence: self.category().default_confidence(),
            })
            .collect()
    }
}

/// A user-supplied regex pattern, detected as the `Custom` category.
#[derive(Debug, Clone)]
pub struct CustomMatcher {
    regex: Regex,
    confidence: f32,
}

impl CustomMatcher {
    pub fn new(pattern: &str) -> RedactResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| RedactError::Pattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            regex,
            confidence: SensitiveCategory::Custom.default_confidence(),
        })
    }
}

impl Matcher for CustomMatcher {
    fn category(&self) -> SensitiveCategory {
        SensitiveCategory::Custom
    }

    fn find(&self, text: &str) -> Vec<PatternHit> {
        hits_at_confidence(&self.regex, text, self.confidence)
    }
}

/// Builds the built-in matcher for a category, if it has one.
pub fn builtin_matcher(category: SensitiveCategory) -> Option<Box<dyn Matcher>> {
    match category {
        SensitiveCategory::Ssn => Some(Box::new(SsnMatcher::new())),
        SensitiveCategory::CreditCard => Some(Box::new(CreditCardMatcher::new())),
        SensitiveCategory::Phone => Some(Box::new(PhoneMatcher::new())),
        SensitiveCategory::PhoneIntl => Some(Box::new(IntlPhoneMatcher::new())),
        SensitiveCategory::Email => Some(Box::new(EmailMatcher::new())),
        SensitiveCategory::Date => Some(Box::new(DateMatcher::new())),
        SensitiveCategory::Passport => Some(Box::new(PassportMatcher::new())),
        SensitiveCategory::PassportIntl => Some(Box::new(IntlPassportMatcher::new())),
        SensitiveCategory::BankAccount => Some(Box::new(BankAccountMatcher::new())),
        SensitiveCategory::Address => Some(Box::new(AddressMatcher::new())),
        SensitiveCategory::IpAddress => Some(Box::new(IpAddressMatcher::new())),
        SensitiveCategory::PersonalName | SensitiveCategory::Custom => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssn_basic() {
        let hits = SsnMatcher::new().find("SSN: 123-45-6789 on file");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].range, 5..16);
    }

    #[test]
    fn test_ssn_rejects_wrong_grouping() {
        assert!(SsnMatcher::new().find("12-345-6789").is_empty());
        assert!(SsnMatcher::new().find("123-456-789").is_empty());
    }

    #[test]
    fn test_credit_card_strong_confidence() {
        let hits = CreditCardMatcher::new().find("card 4111 1111 1111 1111 ok");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].confidence, CreditCardMatcher::STRONG_CONFIDENCE);
    }

    #[test]
    fn test_credit_card_bad_length_is_weak() {
        // 21 digits: card-shaped run, wrong length.
        let hits = CreditCardMatcher::new().find("123456789012345678901");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].confidence, CreditCardMatcher::WEAK_CONFIDENCE);
    }

    #[test]
    fn test_phone_formats() {
        let matcher = PhoneMatcher::new();
        for sample in [
            "(555) 123-4567",
            "555-123-4567",
            "555.123.4567",
            "+1 555 123 4567",
        ] {
            assert_eq!(matcher.find(sample).len(), 1, "should match {sample}");
        }
    }

    #[test]
    fn test_phone_rejects_invalid_area_code() {
        // Area code may not start with 0 or 1.
        assert!(PhoneMatcher::new().find("(055) 123-4567").is_empty());
        assert!(PhoneMatcher::new().find("(155) 123-4567").is_empty());
    }

    #[test]
    fn test_intl_phone() {
        let hits = IntlPhoneMatcher::new().find("dial +44 20 7946 0958 now");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_email() {
        let hits = EmailMatcher::new().find("mail user@example.com or admin@sub.example.org");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_date_numeric_and_spelled() {
        let matcher = DateMatcher::new();
        assert_eq!(matcher.find("due 12/31/2024").len(), 1);
        assert_eq!(matcher.find("born 1-5-99").len(), 1);
        assert_eq!(matcher.find("on January 5, 2024").len(), 1);
    }

    #[test]
    fn test_date_does_not_match_ip() {
        assert!(DateMatcher::new().find("host 192.168.1.1 up").is_empty());
    }

    #[test]
    fn test_passport_forms() {
        assert_eq!(PassportMatcher::new().find("passport C12345678").len(), 1);
        assert_eq!(
            IntlPassportMatcher::new().find("travel doc AB1234567").len(),
            1
        );
    }

    #[test]
    fn test_bank_account_digit_runs() {
        let matcher = BankAccountMatcher::new();
        assert_eq!(matcher.find("acct 12345678").len(), 1);
        assert_eq!(matcher.find("acct 12345678901234567").len(), 1);
        // Too short and too long are both rejected.
        assert!(matcher.find("ref 1234567").is_empty());
        assert!(matcher.find("ref 123456789012345678").is_empty());
    }

    #[test]
    fn test_address() {
        let hits = AddressMatcher::new().find("ship to 123 Main Street please");
        assert_eq!(hits.len(), 1);
        assert_eq!(
            AddressMatcher::new().find("4970 El Camino Real Blvd").len(),
            1
        );
    }

    #[test]
    fn test_ip_octet_validation() {
        let matcher = IpAddressMatcher::new();
        assert_eq!(matcher.find("gateway 192.168.1.1").len(), 1);
        assert!(matcher.find("version 999.1.2.3").is_empty());
    }

    #[test]
    fn test_builtin_matcher_coverage() {
        for category in SensitiveCategory::BUILTIN {
            let matcher = builtin_matcher(category).expect("built-in matcher");
            assert_eq!(matcher.category(), category);
        }
        assert!(builtin_matcher(SensitiveCategory::PersonalName).is_none());
        assert!(builtin_matcher(SensitiveCategory::Custom).is_none());
    }
}
