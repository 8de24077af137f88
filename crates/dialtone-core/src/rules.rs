//! Country rule table — digit counts, display patterns, speech languages.
//!
//! The table is built once at startup by [`RuleTable::standard`], validated,
//! and never mutated afterwards.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::digits::{generate_digits, Digits};
use crate::error::RuleError;
use crate::number::GeneratedNumber;
use crate::pattern::DigitPattern;

static RE_LANGUAGE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}(?:-[A-Z]{2})?$").unwrap());

/// Supported countries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CountryCode {
    CN,
    US,
    UK,
    JP,
    DE,
    AU,
}

impl CountryCode {
    pub const ALL: [CountryCode; 6] = [
        CountryCode::CN,
        CountryCode::US,
        CountryCode::UK,
        CountryCode::JP,
        CountryCode::DE,
        CountryCode::AU,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CountryCode::CN => "CN",
            CountryCode::US => "US",
            CountryCode::UK => "UK",
            CountryCode::JP => "JP",
            CountryCode::DE => "DE",
            CountryCode::AU => "AU",
        }
    }
}

impl FromStr for CountryCode {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        CountryCode::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RuleError::UnknownCountry(s.to_string()))
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Number shape for one country.
#[derive(Debug, Clone)]
pub struct CountryRule {
    pub code: CountryCode,
    /// International dialing prefix. Informational; never part of `format` output.
    pub prefix: &'static str,
    /// Random digits to generate (fixed trunk digits live in the pattern).
    pub digit_count: usize,
    pub pattern: DigitPattern,
    /// BCP-47 tag the number is spoken in.
    pub language: &'static str,
    /// Advisory voice name. Nothing guarantees a voice by this name exists.
    pub preferred_voice: &'static str,
}

impl CountryRule {
    pub fn new(
        code: CountryCode,
        prefix: &'static str,
        digit_count: usize,
        notation: &str,
        language: &'static str,
        preferred_voice: &'static str,
    ) -> Self {
        Self {
            code,
            prefix,
            digit_count,
            pattern: DigitPattern::parse(notation),
            language,
            preferred_voice,
        }
    }

    /// Check that the pattern consumes exactly `digit_count` digits and the
    /// language tag is well-formed.
    pub fn validate(&self) -> Result<(), RuleError> {
        let required = self.pattern.required_digits();
        if required != self.digit_count {
            return Err(RuleError::FormatRuleMismatch {
                rule: self.code.to_string(),
                required,
                generated: self.digit_count,
            });
        }
        if !RE_LANGUAGE_TAG.is_match(self.language) {
            return Err(RuleError::InvalidLanguageTag {
                country: self.code,
                tag: self.language.to_string(),
            });
        }
        Ok(())
    }

    /// Format a digit sequence for display. Pure and deterministic.
    pub fn format(&self, digits: &Digits) -> Result<String, RuleError> {
        if digits.len() != self.digit_count {
            return Err(RuleError::FormatRuleMismatch {
                rule: self.code.to_string(),
                required: self.digit_count,
                generated: digits.len(),
            });
        }
        self.pattern
            .apply(digits)
            .map_err(|e| e.for_country(self.code))
    }

    /// Draw `digit_count` digits and format them.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<GeneratedNumber, RuleError> {
        let digits = generate_digits(rng, self.digit_count);
        let display = self.format(&digits)?;
        Ok(GeneratedNumber {
            country: self.code,
            prefix: self.prefix,
            digits,
            display,
            language: self.language,
        })
    }
}

/// Code, prefix, digit count, pattern, language, voice hint.
const STANDARD_RULES: &[(CountryCode, &str, usize, &str, &str, &str)] = &[
    (CountryCode::CN, "+86", 10, "1## #### ####", "zh-CN", "Microsoft Huihui"),
    (CountryCode::US, "+1", 10, "(###) ###-####", "en-US", "Google US English"),
    (CountryCode::UK, "+44", 9, "07### ######", "en-GB", "Google UK English"),
    (CountryCode::JP, "+81", 10, "0##-####-####", "ja-JP", "Google 日本語"),
    (CountryCode::DE, "+49", 8, "015# #######", "de-DE", "Google Deutsch"),
    (CountryCode::AU, "+61", 8, "04## ### ###", "en-AU", "Google Australian English"),
];

/// Validated, immutable set of country rules.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<CountryRule>,
}

impl RuleTable {
    /// Validate every rule and reject duplicate codes.
    pub fn new(rules: Vec<CountryRule>) -> Result<Self, RuleError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            rule.validate()?;
            if !seen.insert(rule.code) {
                return Err(RuleError::DuplicateCountry(rule.code));
            }
        }
        debug!("rule table validated: {} countries", rules.len());
        Ok(Self { rules })
    }

    /// The built-in six-country table.
    pub fn standard() -> Result<Self, RuleError> {
        let rules = STANDARD_RULES
            .iter()
            .map(|&(code, prefix, count, notation, language, voice)| {
                CountryRule::new(code, prefix, count, notation, language, voice)
            })
            .collect();
        Self::new(rules)
    }

    pub fn get(&self, code: CountryCode) -> Option<&CountryRule> {
        self.rules.iter().find(|r| r.code == code)
    }

    /// Resolve a user-supplied code such as `"us"` or `"UK"`.
    pub fn lookup(&self, code: &str) -> Result<&CountryRule, RuleError> {
        let parsed: CountryCode = code.parse()?;
        self.get(parsed)
            .ok_or_else(|| RuleError::UnknownCountry(code.to_string()))
    }

    /// Rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &CountryRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn table() -> RuleTable {
        RuleTable::standard().unwrap()
    }

    fn format(code: CountryCode, digits: &str) -> String {
        table()
            .get(code)
            .unwrap()
            .format(&Digits::new(digits).unwrap())
            .unwrap()
    }

    #[test]
    fn standard_table_has_all_countries_once() {
        let t = table();
        assert_eq!(t.len(), 6);
        let codes: Vec<_> = t.iter().map(|r| r.code).collect();
        assert_eq!(codes, CountryCode::ALL.to_vec());
    }

    #[test]
    fn formats_every_country() {
        assert_eq!(format(CountryCode::CN, "1234567890"), "112 3456 7890");
        assert_eq!(format(CountryCode::US, "1234567890"), "(123) 456-7890");
        assert_eq!(format(CountryCode::UK, "123456789"), "07123 456789");
        assert_eq!(format(CountryCode::JP, "1234567890"), "012-3456-7890");
        assert_eq!(format(CountryCode::DE, "12345678"), "0151 2345678");
        assert_eq!(format(CountryCode::AU, "12345678"), "0412 345 678");
    }

    #[test]
    fn formatting_is_deterministic() {
        assert_eq!(
            format(CountryCode::JP, "9081726354"),
            format(CountryCode::JP, "9081726354")
        );
    }

    #[test]
    fn generated_numbers_have_configured_length() {
        let t = table();
        let mut rng = StdRng::seed_from_u64(7);
        for rule in t.iter() {
            for _ in 0..20 {
                let n = rule.generate(&mut rng).unwrap();
                assert_eq!(n.digits.len(), rule.digit_count);
                assert!(n.digits.as_str().bytes().all(|b| b.is_ascii_digit()));
                assert_eq!(n.display, rule.format(&n.digits).unwrap());
                assert_eq!(n.language, rule.language);
            }
        }
    }

    #[test]
    fn format_rejects_wrong_length() {
        let t = table();
        let us = t.get(CountryCode::US).unwrap();
        let err = us.format(&Digits::new("123").unwrap()).unwrap_err();
        assert_eq!(
            err,
            RuleError::FormatRuleMismatch {
                rule: "US".into(),
                required: 10,
                generated: 3,
            }
        );
    }

    #[test]
    fn validation_catches_pattern_wanting_more_digits() {
        let bad = CountryRule::new(CountryCode::DE, "+49", 7, "015# #######", "de-DE", "");
        let err = RuleTable::new(vec![bad]).unwrap_err();
        assert_eq!(
            err,
            RuleError::FormatRuleMismatch {
                rule: "DE".into(),
                required: 8,
                generated: 7,
            }
        );
    }

    #[test]
    fn validation_catches_unused_digits() {
        let bad = CountryRule::new(CountryCode::UK, "+44", 10, "07### ######", "en-GB", "");
        assert!(matches!(
            RuleTable::new(vec![bad]),
            Err(RuleError::FormatRuleMismatch { required: 9, generated: 10, .. })
        ));
    }

    #[test]
    fn validation_catches_bad_language_tag() {
        let bad = CountryRule::new(CountryCode::US, "+1", 3, "###", "english", "");
        assert!(matches!(
            RuleTable::new(vec![bad]),
            Err(RuleError::InvalidLanguageTag { country: CountryCode::US, .. })
        ));
    }

    #[test]
    fn validation_catches_duplicates() {
        let a = CountryRule::new(CountryCode::US, "+1", 3, "###", "en-US", "");
        let b = CountryRule::new(CountryCode::US, "+1", 4, "####", "en-US", "");
        assert_eq!(
            RuleTable::new(vec![a, b]).unwrap_err(),
            RuleError::DuplicateCountry(CountryCode::US)
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let t = table();
        assert_eq!(t.lookup("us").unwrap().code, CountryCode::US);
        assert_eq!(t.lookup(" Jp ").unwrap().code, CountryCode::JP);
    }

    #[test]
    fn lookup_unknown_country() {
        assert_eq!(
            table().lookup("FR").unwrap_err(),
            RuleError::UnknownCountry("FR".into())
        );
    }

    #[test]
    fn lookup_in_partial_table() {
        let only_us = RuleTable::new(vec![CountryRule::new(
            CountryCode::US,
            "+1",
            3,
            "###",
            "en-US",
            "",
        )])
        .unwrap();
        assert!(only_us.lookup("US").is_ok());
        assert_eq!(
            only_us.lookup("au").unwrap_err(),
            RuleError::UnknownCountry("au".into())
        );
    }
}
