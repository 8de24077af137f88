//! dialtone-lib — Speech backends and HTTP API.
//!
//! Kokoro-backed speech synthesis, a silent fallback synthesizer, and the
//! axum router that exposes the controller. Depends on dialtone-core for
//! rules, formatting, and voice selection.

pub mod catalog;
pub mod server;
pub mod silent;
pub mod speech;
pub mod streaming_source;

// Re-export dialtone-core for convenience
pub use dialtone_core;
