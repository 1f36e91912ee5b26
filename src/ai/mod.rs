//! AI service seam
//!
//! The classifier, query analyzer and answer synthesizer all talk to the
//! classification/generation service through the `LlmService` trait, so
//! tests can substitute scripted or failing implementations and the HTTP
//! client stays a construction-time concern.

use anyhow::Result;

mod client;

pub use client::OpenAiClient;

/// One completion request to the AI service
///
/// Callers embed any message context (sender, timestamp, reference date)
/// in the user text.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System instructions
    pub system: String,
    /// User text plus embedded context
    pub user: String,
    /// Request a JSON object response
    pub json: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// A JSON-mode request for structured extraction
    pub fn structured(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            json: true,
            temperature: 0.3,
            max_tokens: 800,
        }
    }

    /// A free-text request for answer generation
    pub fn conversational(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            json: false,
            temperature: 0.7,
            max_tokens: 500,
        }
    }
}

/// Interface to the classification/generation service
///
/// One attempt per call, bounded by the client's timeout; callers recover
/// from any `Err` with their deterministic fallback.
pub trait LlmService {
    fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
