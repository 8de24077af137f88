//! HTTP API for the dialtone controller.
//!
//! Runs on port 2004 by default. CORS-permissive so a browser page can drive
//! it from another origin.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tracing::info;

use dialtone_core::controller::{Controller, SpeakOutcome};
use dialtone_core::number::GeneratedNumber;
use dialtone_core::rules::CountryCode;
use dialtone_core::voice::{SpeechSynthesizer, Voice};
use dialtone_core::RuleError;

/// Controller over any speech backend, shared across handlers.
pub type SharedController = Arc<Mutex<Controller<Box<dyn SpeechSynthesizer + Send>>>>;

/// Build the axum router around a controller.
pub fn router(controller: Controller<Box<dyn SpeechSynthesizer + Send>>) -> Router {
    Router::new()
        .route("/countries", get(countries))
        .route("/generate", post(generate))
        .route("/current", get(current))
        .route("/speak", post(speak))
        .route("/stop", post(stop))
        .route("/voices", get(voices))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(Mutex::new(controller)))
}

fn lock(state: &SharedController) -> MutexGuard<'_, Controller<Box<dyn SpeechSynthesizer + Send>>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(serde::Serialize)]
struct ErrorResponse {
    ok: bool,
    error: String,
}

/// Error surfaced to the client as `{ ok: false, error }`.
#[derive(Debug)]
struct ApiError(StatusCode, String);

impl From<RuleError> for ApiError {
    fn from(e: RuleError) -> Self {
        let status = match e {
            RuleError::UnknownCountry(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            ok: false,
            error: self.1,
        };
        (self.0, Json(body)).into_response()
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct CountryInfo {
    code: CountryCode,
    prefix: &'static str,
    digit_count: usize,
    pattern: String,
    language: &'static str,
    preferred_voice: &'static str,
}

async fn countries(State(state): State<SharedController>) -> Json<Vec<CountryInfo>> {
    let controller = lock(&state);
    let list = controller
        .table()
        .iter()
        .map(|rule| CountryInfo {
            code: rule.code,
            prefix: rule.prefix,
            digit_count: rule.digit_count,
            pattern: rule.pattern.to_string(),
            language: rule.language,
            preferred_voice: rule.preferred_voice,
        })
        .collect();
    Json(list)
}

#[derive(serde::Deserialize)]
struct GenerateRequest {
    country: String,
}

async fn generate(
    State(state): State<SharedController>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GeneratedNumber>, ApiError> {
    let mut controller = lock(&state);
    let number = controller.generate(&req.country)?.clone();
    info!("generate: {} → {}", number.country, number.display);
    Ok(Json(number))
}

async fn current(
    State(state): State<SharedController>,
) -> Result<Json<GeneratedNumber>, ApiError> {
    lock(&state)
        .current()
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError(StatusCode::NOT_FOUND, "no number generated yet".into()))
}

#[derive(serde::Serialize)]
struct SpeakResponse {
    ok: bool,
    spoken: bool,
    voice: Option<String>,
}

async fn speak(State(state): State<SharedController>) -> Json<SpeakResponse> {
    let outcome = lock(&state).speak();
    let (spoken, voice) = match outcome {
        SpeakOutcome::NothingToSpeak => (false, None),
        SpeakOutcome::Dispatched { voice } => (true, voice),
    };
    Json(SpeakResponse {
        ok: true,
        spoken,
        voice,
    })
}

#[derive(serde::Serialize)]
struct OkResponse {
    ok: bool,
}

async fn stop(State(state): State<SharedController>) -> Json<OkResponse> {
    lock(&state).stop();
    Json(OkResponse { ok: true })
}

async fn voices(State(state): State<SharedController>) -> Json<Vec<Voice>> {
    Json(lock(&state).synth().voices())
}
