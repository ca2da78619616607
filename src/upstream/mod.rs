//! Upstream generation API.
//!
//! Typed wire format for Gemini `generateContent`, the reply extraction
//! fallback order, and the client the relay calls through.

mod client;
pub mod types;

pub use client::{ContentGenerator, GeminiClient, API_KEY_HEADER};
pub use types::{GenerateContentResponse, ReplySource, NO_REPLY};
