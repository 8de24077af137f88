//! Kokoro speech backend — utterance → Kokoro PCM stream → rodio playback.
//!
//! Pipeline:
//!
//! ```text
//! speak(utterance) → [job_tx] → fetcher: POST Kokoro, stream PCM,
//!                                 create source on first data
//!                  → [play_cmd_tx] → playback thread: rodio sink
//! ```
//!
//! Epoch-based cancellation: `cancel()` and `speak()` both bump an
//! [`AtomicU64`]. Jobs, PCM chunks, and sources from an older epoch are
//! dropped, so the most recent request always wins and nothing queues.
//!
//! Everything here is best effort. A missing audio device, an unreachable
//! Kokoro server, or a bad response is logged and results in silence.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use futures_util::StreamExt;
use rodio::{OutputStream, Sink};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use dialtone_core::types::{SpeechConfig, SpeechState, SpeechStatus};
use dialtone_core::voice::{primary_subtag, SpeechSynthesizer, Utterance, Voice};

use crate::catalog::{builtin_catalog, catalog_from_names};
use crate::streaming_source::{PcmChunk, StreamingSource};

/// Kokoro PCM streaming format: 24 kHz mono 16-bit signed LE.
const PCM_SAMPLE_RATE: u32 = 24_000;
const PCM_CHANNELS: u16 = 1;

/// How often the playback thread checks whether the sink has drained.
const DRAIN_POLL: Duration = Duration::from_millis(50);

/// Cloneable handle to the Kokoro pipeline. All trait methods are non-blocking.
#[derive(Clone)]
pub struct KokoroSynth {
    job_tx: mpsc::UnboundedSender<SpeechJob>,
    play_cmd_tx: std::sync::mpsc::Sender<PlayCmd>,
    status_tx: watch::Sender<SpeechStatus>,
    status_rx: watch::Receiver<SpeechStatus>,
    epoch: Arc<AtomicU64>,
    catalog: Arc<RwLock<Vec<Voice>>>,
    config: Arc<SpeechConfig>,
    client: reqwest::Client,
}

// ─── Internal types ────────────────────────────────────────────────────────

struct SpeechJob {
    text: String,
    voice: String,
    speed: f32,
    epoch: u64,
}

enum PlayCmd {
    PlayStream(StreamingSource),
    Stop,
}

#[derive(serde::Deserialize)]
struct VoicesResponse {
    voices: Vec<String>,
}

// ─── Construction ──────────────────────────────────────────────────────────

impl KokoroSynth {
    /// Spawn the fetcher task and playback thread. Must be called inside a
    /// tokio runtime.
    pub fn new(config: SpeechConfig) -> Self {
        let epoch = Arc::new(AtomicU64::new(0));
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(SpeechStatus {
            state: SpeechState::Idle,
            voice: None,
        });

        // Playback OS thread (rodio OutputStream is !Send)
        let (play_cmd_tx, play_cmd_rx) = std::sync::mpsc::channel::<PlayCmd>();
        let play_status_tx = status_tx.clone();
        if let Err(e) = std::thread::Builder::new()
            .name("dialtone-playback".into())
            .spawn(move || playback_thread(play_cmd_rx, play_status_tx))
        {
            error!("speech: failed to spawn playback thread: {e}");
        }

        let client = reqwest::Client::new();
        let url = format!("{}/v1/audio/speech", config.kokoro_url);
        tokio::spawn(fetcher_task(
            job_rx,
            play_cmd_tx.clone(),
            epoch.clone(),
            status_tx.clone(),
            client.clone(),
            url,
        ));

        Self {
            job_tx,
            play_cmd_tx,
            status_tx,
            status_rx,
            epoch,
            catalog: Arc::new(RwLock::new(builtin_catalog())),
            config: Arc::new(config),
            client,
        }
    }

    /// Replace the catalog with the voices the Kokoro server reports.
    /// On failure the current catalog is kept.
    pub async fn refresh_voices(&self) {
        let url = format!("{}/v1/audio/voices", self.config.kokoro_url);
        let names = match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<VoicesResponse>().await {
                Ok(body) => body.voices,
                Err(e) => {
                    warn!("voices: bad response from {url}: {e}");
                    return;
                }
            },
            Ok(resp) => {
                warn!("voices: Kokoro returned {}", resp.status());
                return;
            }
            Err(e) => {
                warn!("voices: request failed, keeping built-in catalog: {e}");
                return;
            }
        };

        let catalog = catalog_from_names(names);
        info!("voices: {} available from Kokoro", catalog.len());
        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = catalog;
    }

    /// Voice used when an utterance names none: the first catalog voice that
    /// shares the language's primary subtag, else the configured default.
    pub fn default_voice_for(&self, language: &str) -> String {
        let primary = primary_subtag(language);
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|v| primary_subtag(&v.language).eq_ignore_ascii_case(primary))
            .map(|v| v.name.clone())
            .unwrap_or_else(|| self.config.voice.clone())
    }

    /// Get current status.
    pub fn status(&self) -> SpeechStatus {
        self.status_rx.borrow().clone()
    }

    /// Resolve once nothing is converting or playing.
    pub async fn wait_idle(&self) {
        let mut rx = self.status_rx.clone();
        let _ = rx.wait_for(|s| s.state == SpeechState::Idle).await;
    }
}

impl SpeechSynthesizer for KokoroSynth {
    fn voices(&self) -> Vec<Voice> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn cancel(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let _ = self.play_cmd_tx.send(PlayCmd::Stop);
        update_status(&self.status_tx, |s| s.state = SpeechState::Idle);
    }

    fn speak(&self, utterance: Utterance) {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let voice = match utterance.voice {
            Some(v) => v.name,
            None => self.default_voice_for(&utterance.language),
        };
        debug!(
            "speech: queue {} chars as {voice} (epoch {epoch})",
            utterance.text.len()
        );

        update_status(&self.status_tx, |s| {
            s.state = SpeechState::Converting;
            s.voice = Some(voice.clone());
        });

        let job = SpeechJob {
            text: utterance.text,
            voice,
            speed: utterance.rate,
            epoch,
        };
        if self.job_tx.send(job).is_err() {
            warn!("speech: fetcher is gone, dropping utterance");
            update_status(&self.status_tx, |s| s.state = SpeechState::Idle);
        }
    }
}

// ─── Fetcher task ──────────────────────────────────────────────────────────

async fn fetcher_task(
    mut job_rx: mpsc::UnboundedReceiver<SpeechJob>,
    play_cmd_tx: std::sync::mpsc::Sender<PlayCmd>,
    epoch: Arc<AtomicU64>,
    status_tx: watch::Sender<SpeechStatus>,
    client: reqwest::Client,
    url: String,
) {
    while let Some(job) = job_rx.recv().await {
        if job.epoch != epoch.load(Ordering::SeqCst) {
            debug!("fetch: discarding stale job");
            continue;
        }

        let played = fetch_and_stream(&job, &client, &url, &play_cmd_tx, &epoch).await;

        // Nothing reached the sink, so the playback thread will never flip
        // the state back. Do it here unless a newer request owns the status.
        if !played && job.epoch == epoch.load(Ordering::SeqCst) {
            update_status(&status_tx, |s| s.state = SpeechState::Idle);
        }
    }
}

/// Stream one job into the playback thread. Returns whether a source was
/// handed to the sink.
async fn fetch_and_stream(
    job: &SpeechJob,
    client: &reqwest::Client,
    url: &str,
    play_cmd_tx: &std::sync::mpsc::Sender<PlayCmd>,
    epoch: &Arc<AtomicU64>,
) -> bool {
    let body = serde_json::json!({
        "input": job.text,
        "voice": job.voice,
        "model": "kokoro",
        "response_format": "pcm",
        "stream": true,
        "speed": job.speed,
    });

    debug!("fetch: POST {} chars", job.text.len());

    let resp = match client.post(url).json(&body).send().await {
        Ok(resp) if resp.status().is_success() => resp,
        Ok(resp) => {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            error!("fetch: Kokoro error {status}: {text}");
            return false;
        }
        Err(e) => {
            warn!("fetch: speech unavailable: {e}");
            return false;
        }
    };

    let mut stream = resp.bytes_stream();
    let mut leftover: Option<u8> = None;
    let mut pcm_tx: Option<std::sync::mpsc::Sender<PcmChunk>> = None;

    while let Some(chunk_result) = stream.next().await {
        if job.epoch != epoch.load(Ordering::SeqCst) {
            debug!("fetch: cancelled mid-stream");
            break;
        }

        let chunk = match chunk_result {
            Ok(c) => c,
            Err(e) => {
                error!("fetch: stream error: {e}");
                break;
            }
        };

        let (samples, lo) = bytes_to_i16(&chunk, leftover.take());
        leftover = lo;
        if samples.is_empty() {
            continue;
        }

        match &pcm_tx {
            Some(tx) => {
                if tx.send(PcmChunk::Data(samples)).is_err() {
                    break;
                }
            }
            None => {
                let (tx, rx) = std::sync::mpsc::channel();
                let source = StreamingSource::new(
                    rx,
                    PCM_CHANNELS,
                    PCM_SAMPLE_RATE,
                    job.epoch,
                    epoch.clone(),
                );
                let _ = tx.send(PcmChunk::Data(samples));
                if play_cmd_tx.send(PlayCmd::PlayStream(source)).is_err() {
                    warn!("fetch: playback unavailable, dropping audio");
                    break;
                }
                pcm_tx = Some(tx);
            }
        }
    }

    match pcm_tx {
        Some(tx) => {
            let _ = tx.send(PcmChunk::Done);
            true
        }
        None => false,
    }
}

/// Convert raw bytes to i16 PCM samples (little-endian), carrying an odd
/// trailing byte into the next chunk.
fn bytes_to_i16(bytes: &[u8], leftover: Option<u8>) -> (Vec<i16>, Option<u8>) {
    let joined: Vec<u8>;
    let slice = match leftover {
        Some(lo) => {
            joined = std::iter::once(lo).chain(bytes.iter().copied()).collect();
            &joined[..]
        }
        None => bytes,
    };

    let pairs = slice.chunks_exact(2);
    let remainder = pairs.remainder().first().copied();
    let samples = pairs.map(|p| i16::from_le_bytes([p[0], p[1]])).collect();
    (samples, remainder)
}

// ─── Playback OS thread ────────────────────────────────────────────────────

fn playback_thread(
    cmd_rx: std::sync::mpsc::Receiver<PlayCmd>,
    status_tx: watch::Sender<SpeechStatus>,
) {
    let (_stream, stream_handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            warn!("playback: no audio output, speech will be silent: {e}");
            return;
        }
    };

    let new_sink = || match Sink::try_new(&stream_handle) {
        Ok(sink) => Some(sink),
        Err(e) => {
            error!("playback: failed to create sink: {e}");
            None
        }
    };

    let Some(mut sink) = new_sink() else {
        return;
    };

    loop {
        match cmd_rx.recv_timeout(DRAIN_POLL) {
            Ok(PlayCmd::PlayStream(source)) => {
                debug!("playback: source appended to sink");
                sink.append(source);
                update_status(&status_tx, |s| s.state = SpeechState::Playing);
            }
            Ok(PlayCmd::Stop) => {
                sink.stop();
                match new_sink() {
                    Some(fresh) => sink = fresh,
                    None => return,
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                sink.stop();
                break;
            }
        }

        if sink.empty() {
            update_status(&status_tx, |s| {
                if s.state == SpeechState::Playing {
                    s.state = SpeechState::Idle;
                }
            });
        }
    }
}

fn update_status(tx: &watch::Sender<SpeechStatus>, f: impl FnOnce(&mut SpeechStatus)) {
    tx.send_modify(f);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SpeechConfig {
        SpeechConfig {
            // Nothing listens on the discard port.
            kokoro_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        }
    }

    #[test]
    fn bytes_to_i16_basic() {
        let (samples, lo) = bytes_to_i16(&[0x01, 0x00, 0xFF, 0x7F], None);
        assert_eq!(samples, vec![1, 32767]);
        assert_eq!(lo, None);
    }

    #[test]
    fn bytes_to_i16_keeps_odd_byte() {
        let (samples, lo) = bytes_to_i16(&[0x01, 0x00, 0xFF], None);
        assert_eq!(samples, vec![1]);
        assert_eq!(lo, Some(0xFF));
    }

    #[test]
    fn bytes_to_i16_carries_leftover() {
        let (samples, lo) = bytes_to_i16(&[0x7F, 0x01, 0x00], Some(0xFF));
        assert_eq!(samples, vec![32767, 1]);
        assert_eq!(lo, None);
    }

    #[test]
    fn bytes_to_i16_empty() {
        let (samples, lo) = bytes_to_i16(&[], None);
        assert!(samples.is_empty());
        assert_eq!(lo, None);
    }

    #[tokio::test]
    async fn starts_with_builtin_catalog() {
        let synth = KokoroSynth::new(config());
        assert_eq!(synth.voices(), builtin_catalog());
        assert_eq!(synth.status().state, SpeechState::Idle);
    }

    #[tokio::test]
    async fn default_voice_follows_language() {
        let synth = KokoroSynth::new(config());
        assert!(synth.default_voice_for("ja-JP").starts_with('j'));
        assert!(synth.default_voice_for("en-AU").starts_with('a'));
        // No German voices: configured default.
        assert_eq!(synth.default_voice_for("de-DE"), "af_heart");
    }

    #[tokio::test]
    async fn failed_refresh_keeps_catalog() {
        let synth = KokoroSynth::new(config());
        synth.refresh_voices().await;
        assert_eq!(synth.voices(), builtin_catalog());
    }

    #[tokio::test]
    async fn unreachable_server_degrades_to_idle() {
        let synth = KokoroSynth::new(config());
        synth.speak(Utterance {
            text: "(123) 456-7890".into(),
            language: "en-US".into(),
            rate: 0.8,
            voice: None,
        });
        assert_eq!(synth.status().state, SpeechState::Converting);
        assert_eq!(synth.status().voice.as_deref(), Some("af_alloy"));

        tokio::time::timeout(Duration::from_secs(10), synth.wait_idle())
            .await
            .expect("speech never settled");
    }

    #[tokio::test]
    async fn cancel_goes_idle_immediately() {
        let synth = KokoroSynth::new(config());
        synth.speak(Utterance {
            text: "0412 345 678".into(),
            language: "en-AU".into(),
            rate: 0.8,
            voice: Some(Voice::new("bf_emma", "en-GB")),
        });
        synth.cancel();
        assert_eq!(synth.status().state, SpeechState::Idle);
        assert_eq!(synth.status().voice.as_deref(), Some("bf_emma"));
    }
}
