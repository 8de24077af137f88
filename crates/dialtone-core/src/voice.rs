//! Voice catalog, utterances, and the voice-selection policy.

use serde::{Deserialize, Serialize};

/// Playback rate for phone numbers, relative to the engine's normal rate.
/// Digit runs are hard to follow at full speed.
pub const SPEECH_RATE: f32 = 0.8;

/// A voice offered by a synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    /// Language tag as the engine reports it (`en-US`, sometimes `en_US`).
    pub language: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
        }
    }
}

/// One speech request.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub language: String,
    pub rate: f32,
    /// `None` leaves voice choice to the engine.
    pub voice: Option<Voice>,
}

/// Host speech capability.
///
/// All methods are fire-and-forget. Implementations log their own failures
/// and degrade to silence; nothing here reports errors back to the caller.
pub trait SpeechSynthesizer {
    /// Voices currently available.
    fn voices(&self) -> Vec<Voice>;

    /// Abort any in-flight utterance.
    fn cancel(&self);

    /// Start speaking. Returns immediately.
    fn speak(&self, utterance: Utterance);
}

impl<T: SpeechSynthesizer + ?Sized> SpeechSynthesizer for Box<T> {
    fn voices(&self) -> Vec<Voice> {
        (**self).voices()
    }

    fn cancel(&self) {
        (**self).cancel()
    }

    fn speak(&self, utterance: Utterance) {
        (**self).speak(utterance)
    }
}

/// Leading language component of a tag: `en` for `en-US` or `en_GB`.
pub fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

/// Pick a voice for `language`.
///
/// Exact tag match first, then the first voice sharing the primary subtag.
/// `None` means the engine should fall back to its own default.
pub fn select_voice<'a>(voices: &'a [Voice], language: &str) -> Option<&'a Voice> {
    if let Some(exact) = voices.iter().find(|v| v.language == language) {
        return Some(exact);
    }

    let primary = primary_subtag(language);
    if primary.is_empty() {
        return None;
    }
    voices
        .iter()
        .find(|v| primary_subtag(&v.language).eq_ignore_ascii_case(primary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(entries: &[(&str, &str)]) -> Vec<Voice> {
        entries.iter().map(|(n, l)| Voice::new(*n, *l)).collect()
    }

    #[test]
    fn exact_match_beats_primary_match() {
        let voices = catalog(&[("brit", "en-GB"), ("yank", "en-US")]);
        assert_eq!(select_voice(&voices, "en-US").unwrap().name, "yank");
    }

    #[test]
    fn primary_match_beats_nothing() {
        let voices = catalog(&[("ja", "ja-JP"), ("brit", "en-GB"), ("aussie", "en-AU")]);
        assert_eq!(select_voice(&voices, "en-US").unwrap().name, "brit");
    }

    #[test]
    fn no_match_defers_to_engine() {
        let voices = catalog(&[("brit", "en-GB")]);
        assert!(select_voice(&voices, "de-DE").is_none());
        assert!(select_voice(&[], "en-US").is_none());
    }

    #[test]
    fn primary_match_ignores_case_and_underscores() {
        let voices = catalog(&[("piper", "EN_gb")]);
        assert_eq!(select_voice(&voices, "en-AU").unwrap().name, "piper");
    }

    #[test]
    fn primary_subtag_is_not_a_prefix_match() {
        // "eng" must not satisfy "en".
        let voices = catalog(&[("odd", "eng-XX")]);
        assert!(select_voice(&voices, "en-US").is_none());
    }

    #[test]
    fn bare_tag_matches_regional_voice() {
        let voices = catalog(&[("zf_xiaobei", "zh-CN")]);
        assert_eq!(select_voice(&voices, "zh").unwrap().name, "zf_xiaobei");
    }

    #[test]
    fn primary_subtag_examples() {
        assert_eq!(primary_subtag("en-US"), "en");
        assert_eq!(primary_subtag("pt_BR"), "pt");
        assert_eq!(primary_subtag("ja"), "ja");
        assert_eq!(primary_subtag(""), "");
    }

    #[test]
    fn speech_rate_is_slowed() {
        assert_eq!(SPEECH_RATE, 0.8);
    }
}
