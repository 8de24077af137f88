//! Shared types for dialtone speech backends and their consumers.
//!
//! Kept in dialtone-core so the CLI and server can describe speech state
//! without pulling in tokio or rodio.

use serde::Serialize;

// ─── Speech types ──────────────────────────────────────────────────────────

/// Speech backend configuration.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub kokoro_url: String,
    /// Voice used when the utterance names none and the catalog has nothing
    /// for its language.
    pub voice: String,
    /// When false, utterances are dropped without touching audio hardware.
    pub enabled: bool,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            kokoro_url: "http://localhost:8880".into(),
            voice: "af_heart".into(),
            enabled: true,
        }
    }
}

/// Observable speech state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechState {
    Idle,
    Converting,
    Playing,
}

/// Speech status snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SpeechStatus {
    pub state: SpeechState,
    /// Voice of the most recent utterance.
    pub voice: Option<String>,
}
