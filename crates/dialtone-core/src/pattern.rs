//! Digit patterns — literal text interleaved with digit ranges.
//!
//! A pattern is written in a compact notation where every `#` takes the next
//! digit of the input and every other character is copied verbatim:
//!
//! ```text
//! "(###) ###-####"  +  "1234567890"  →  "(123) 456-7890"
//! "07### ######"    +  "123456789"   →  "07123 456789"
//! ```
//!
//! Because the pattern is data rather than a closure, a rule table can check
//! mechanically that each pattern consumes exactly the digits it is given.

use std::fmt;

use crate::digits::Digits;
use crate::error::RuleError;

/// Placeholder character in the pattern notation.
pub const PLACEHOLDER: char = '#';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Fixed text: punctuation, spaces, trunk digits.
    Literal(String),
    /// Half-open range of input digit indices.
    Range { start: usize, end: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitPattern {
    segments: Vec<Segment>,
}

impl DigitPattern {
    /// Parse the `#` notation. Adjacent placeholders coalesce into one range.
    pub fn parse(notation: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut run_start: Option<usize> = None;
        let mut next = 0;

        for c in notation.chars() {
            if c == PLACEHOLDER {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                run_start.get_or_insert(next);
                next += 1;
            } else {
                if let Some(start) = run_start.take() {
                    segments.push(Segment::Range { start, end: next });
                }
                literal.push(c);
            }
        }

        if let Some(start) = run_start {
            segments.push(Segment::Range { start, end: next });
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of input digits the pattern reads (one past the highest index).
    pub fn required_digits(&self) -> usize {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Range { end, .. } => Some(*end),
                Segment::Literal(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Render `digits` through the pattern.
    ///
    /// Every range is bounds-checked; a pattern that reads past the input
    /// yields [`RuleError::FormatRuleMismatch`] instead of partial output.
    pub fn apply(&self, digits: &Digits) -> Result<String, RuleError> {
        let mut out = String::with_capacity(digits.len() + self.segments.len() * 2);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Range { start, end } => {
                    let part = digits.get(*start..*end).ok_or_else(|| {
                        RuleError::FormatRuleMismatch {
                            rule: self.to_string(),
                            required: self.required_digits(),
                            generated: digits.len(),
                        }
                    })?;
                    out.push_str(part);
                }
            }
        }
        Ok(out)
    }
}

impl fmt::Display for DigitPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Range { start, end } => {
                    for _ in *start..*end {
                        write!(f, "{PLACEHOLDER}")?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digits(s: &str) -> Digits {
        Digits::new(s).unwrap()
    }

    #[test]
    fn parse_coalesces_ranges() {
        let p = DigitPattern::parse("(###) ###-####");
        assert_eq!(
            p.segments(),
            &[
                Segment::Literal("(".into()),
                Segment::Range { start: 0, end: 3 },
                Segment::Literal(") ".into()),
                Segment::Range { start: 3, end: 6 },
                Segment::Literal("-".into()),
                Segment::Range { start: 6, end: 10 },
            ]
        );
        assert_eq!(p.required_digits(), 10);
    }

    #[test]
    fn leading_literal_digits_are_not_placeholders() {
        let p = DigitPattern::parse("015# #######");
        assert_eq!(p.segments()[0], Segment::Literal("015".into()));
        assert_eq!(p.required_digits(), 8);
    }

    #[test]
    fn apply_formats() {
        let p = DigitPattern::parse("(###) ###-####");
        assert_eq!(p.apply(&digits("1234567890")).unwrap(), "(123) 456-7890");
    }

    #[test]
    fn apply_rejects_short_input() {
        let p = DigitPattern::parse("(###) ###-####");
        let err = p.apply(&digits("12345")).unwrap_err();
        assert_eq!(
            err,
            RuleError::FormatRuleMismatch {
                rule: "(###) ###-####".into(),
                required: 10,
                generated: 5,
            }
        );
    }

    #[test]
    fn display_round_trips_notation() {
        for notation in ["1## #### ####", "0##-####-####", "04## ### ###", "no digits"] {
            assert_eq!(DigitPattern::parse(notation).to_string(), notation);
        }
    }

    #[test]
    fn empty_pattern_needs_nothing() {
        let p = DigitPattern::parse("");
        assert_eq!(p.required_digits(), 0);
        assert_eq!(p.apply(&digits("")).unwrap(), "");
    }

    #[test]
    fn non_ascii_literals_survive() {
        let p = DigitPattern::parse("☎ ###");
        assert_eq!(p.apply(&digits("123")).unwrap(), "☎ 123");
    }
}
