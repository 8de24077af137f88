//! A generated phone number — the "current result" the UI shows and speaks.

use serde::Serialize;

use crate::digits::Digits;
use crate::rules::CountryCode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedNumber {
    pub country: CountryCode,
    pub prefix: &'static str,
    /// Raw random digits, before any fixed trunk digits are added.
    pub digits: Digits,
    /// National display form, e.g. `(123) 456-7890`.
    pub display: String,
    /// Speech language tag.
    pub language: &'static str,
}

impl GeneratedNumber {
    /// International form: dialing prefix followed by the national digits
    /// with the trunk `0` dropped, e.g. `07123 456789` → `+44 7123456789`.
    pub fn international(&self) -> String {
        let national: String = self.display.chars().filter(char::is_ascii_digit).collect();
        let national = national.strip_prefix('0').unwrap_or(&national);
        format!("{} {}", self.prefix, national)
    }
}
