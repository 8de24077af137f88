//! A synthesizer with no voices that never makes a sound.
//!
//! Used when audio is disabled (`--mute`) so the rest of the stack runs
//! unchanged.

use dialtone_core::voice::{SpeechSynthesizer, Utterance, Voice};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSynth;

impl SpeechSynthesizer for SilentSynth {
    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }

    fn cancel(&self) {}

    fn speak(&self, utterance: Utterance) {
        debug!("silent: dropping utterance ({})", utterance.language);
    }
}
