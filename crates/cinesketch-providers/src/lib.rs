//! AI provider layer for CineSketch.
//!
//! Direct HTTP clients for Gemini, Doubao, and OpenAI, plus the machinery that
//! makes them dependable: typed errors, backoff retry, and ordered fallback.
//!
//! # Architecture
//!
//! - [`traits`]: capability traits (`VisionChat`, `ImageGen`, `SpeechSynth`) and [`Candidate`]
//! - [`registry`]: static specs for the supported providers and what each can do
//! - [`retry::BackoffRetrier`]: exponential backoff around a single candidate
//! - [`fallback::FallbackChain`]: first success across an ordered candidate list
//! - [`extract`]: recover JSON from free-form model text
//! - [`usage`]: token counts and cost estimates

pub mod classify;
pub mod doubao;
pub mod extract;
pub mod fallback;
pub mod gemini;
pub mod http_provider;
pub mod openai;
pub mod registry;
pub mod retry;
pub mod traits;
pub mod usage;

// Re-export main types for convenience
pub use doubao::DoubaoClient;
pub use extract::{extract_json, find_array};
pub use fallback::{Attempted, FallbackChain};
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use registry::{Capability, ProviderSpec, PROVIDERS};
pub use retry::{BackoffRetrier, RetryPolicy};
pub use traits::{
    Adapter, Candidate, ChatOutput, GeneratedImage, ImageGen, ImageRequest, Part, SpeechOutput,
    SpeechRequest, SpeechSynth, VisionChat, VisionRequest,
};
