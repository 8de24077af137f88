//! Random digit sequences.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use rand::Rng;
use serde::Serialize;

use crate::error::RuleError;

/// An ordered sequence of ASCII decimal digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Digits(String);

impl Digits {
    pub fn new(s: impl Into<String>) -> Result<Self, RuleError> {
        let s = s.into();
        if s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s))
        } else {
            Err(RuleError::InvalidDigits(s))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Slice out `range`, or `None` if it runs past the end.
    pub fn get(&self, range: Range<usize>) -> Option<&str> {
        self.0.get(range)
    }

    /// Digit values, in order.
    pub fn values(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.bytes().map(|b| b - b'0')
    }
}

impl FromStr for Digits {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Digits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Draw `n` independent, uniformly distributed digits. Never fails.
pub fn generate_digits<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Digits {
    let s = (0..n)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect();
    Digits(s)
}
