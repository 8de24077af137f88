//! dialtone-core — Country rules, number formatting, and voice selection.
//!
//! No async runtime, no I/O, no platform dependencies. The speech engine is
//! reached only through the [`voice::SpeechSynthesizer`] trait.

pub mod controller;
pub mod digits;
pub mod error;
pub mod number;
pub mod pattern;
pub mod rules;
pub mod types;
pub mod voice;

pub use error::RuleError;
