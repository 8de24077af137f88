//! Controller — owns the rule table, the speech backend, and the single
//! "current result" slot.
//!
//! ```text
//! generate("US") → lookup rule → draw digits → format → replace current
//! speak()        → cancel in-flight → pick voice → synth.speak(rate 0.8)
//! ```
//!
//! There is no history: each successful generation discards the previous
//! number. A failed generation leaves the slot untouched.

use rand::Rng;
use tracing::{debug, info};

use crate::error::RuleError;
use crate::number::GeneratedNumber;
use crate::rules::RuleTable;
use crate::voice::{select_voice, SpeechSynthesizer, Utterance, SPEECH_RATE};

/// Result of a speak request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// Nothing has been generated yet.
    NothingToSpeak,
    /// Handed to the synthesizer. `voice` is `None` when the engine picks.
    Dispatched { voice: Option<String> },
}

pub struct Controller<S> {
    table: RuleTable,
    synth: S,
    current: Option<GeneratedNumber>,
}

impl<S: SpeechSynthesizer> Controller<S> {
    pub fn new(table: RuleTable, synth: S) -> Self {
        Self {
            table,
            synth,
            current: None,
        }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }

    pub fn current(&self) -> Option<&GeneratedNumber> {
        self.current.as_ref()
    }

    /// Generate a number for `country` using the thread-local RNG.
    pub fn generate(&mut self, country: &str) -> Result<&GeneratedNumber, RuleError> {
        self.generate_with(country, &mut rand::rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(
        &mut self,
        country: &str,
        rng: &mut R,
    ) -> Result<&GeneratedNumber, RuleError> {
        let rule = self.table.lookup(country)?;
        let number = rule.generate(rng)?;
        debug!("generated {} number: {}", number.country, number.display);
        Ok(self.current.insert(number))
    }

    /// Speak the current number. Last request wins: any in-flight speech is
    /// cancelled before the new utterance is dispatched.
    pub fn speak(&self) -> SpeakOutcome {
        let Some(number) = &self.current else {
            debug!("speak: nothing generated yet");
            return SpeakOutcome::NothingToSpeak;
        };

        self.synth.cancel();

        let voices = self.synth.voices();
        let voice = select_voice(&voices, number.language).cloned();
        match &voice {
            Some(v) => info!("speak: {} with voice {}", number.language, v.name),
            None => info!("speak: no voice for {}, using engine default", number.language),
        }

        let name = voice.as_ref().map(|v| v.name.clone());
        self.synth.speak(Utterance {
            text: number.display.clone(),
            language: number.language.to_string(),
            rate: SPEECH_RATE,
            voice,
        });

        SpeakOutcome::Dispatched { voice: name }
    }

    /// Cancel any in-flight speech.
    pub fn stop(&self) {
        self.synth.cancel();
    }
}
