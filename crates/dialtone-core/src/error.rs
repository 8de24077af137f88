//! Errors raised by the rule table and number generation.

use thiserror::Error;

use crate::rules::CountryCode;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// Selection names a country that is not in the rule table.
    #[error("unknown country code: {0:?}")]
    UnknownCountry(String),

    /// A format pattern and its digit count disagree.
    #[error("format rule {rule} needs {required} digits but {generated} were generated")]
    FormatRuleMismatch {
        rule: String,
        required: usize,
        generated: usize,
    },

    #[error("invalid language tag {tag:?} for {country}")]
    InvalidLanguageTag { country: CountryCode, tag: String },

    #[error("country {0} is configured more than once")]
    DuplicateCountry(CountryCode),

    #[error("not a digit sequence: {0:?}")]
    InvalidDigits(String),
}

impl RuleError {
    /// Re-label a pattern-level mismatch with the country it belongs to.
    pub(crate) fn for_country(self, country: CountryCode) -> Self {
        match self {
            RuleError::FormatRuleMismatch {
                required,
                generated,
                ..
            } => RuleError::FormatRuleMismatch {
                rule: country.to_string(),
                required,
                generated,
            },
            other => other,
        }
    }
}
