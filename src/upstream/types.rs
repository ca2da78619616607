//! Gemini `generateContent` wire types and reply extraction.

use serde::{Deserialize, Serialize};

/// Reply text used when the upstream response carries no usable text.
pub const NO_REPLY: &str = "No reply";

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// Single-turn request carrying `prompt` verbatim as one user part.
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(prompt)],
            }],
        }
    }
}

/// A turn of content, in requests and in candidates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One piece of content. Only text parts are relayed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// Response body of `generateContent`.
///
/// The REST API answers with `candidates`; a top-level `text` is accepted as
/// well so gateways that flatten the reply can sit upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl Candidate {
    /// Text of the first content part, if any.
    pub fn first_part_text(&self) -> Option<&str> {
        self.content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

/// Where a response's reply text can come from.
#[derive(Debug, Clone)]
pub enum ReplySource {
    PlainText(String),
    CandidateList(Vec<Candidate>),
    Empty,
}

impl From<GenerateContentResponse> for ReplySource {
    fn from(response: GenerateContentResponse) -> Self {
        match response.text {
            Some(text) if !text.is_empty() => ReplySource::PlainText(text),
            _ if !response.candidates.is_empty() => {
                ReplySource::CandidateList(response.candidates)
            }
            _ => ReplySource::Empty,
        }
    }
}

impl ReplySource {
    /// Apply the fallback order: plain text, then the first candidate's
    /// first part, then [`NO_REPLY`].
    pub fn into_reply(self) -> String {
        match self {
            ReplySource::PlainText(text) => text,
            ReplySource::CandidateList(candidates) => candidates
                .first()
                .and_then(Candidate::first_part_text)
                .filter(|text| !text.is_empty())
                .map_or_else(|| NO_REPLY.to_string(), str::to_string),
            ReplySource::Empty => NO_REPLY.to_string(),
        }
    }
}

/// Google API error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_request_from_prompt() {
        let request = GenerateContentRequest::from_prompt("hello");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "hello"}]}]
            })
        );
    }

    #[test]
    fn test_plain_text_preferred() {
        let response = parse(serde_json::json!({
            "text": "hi there",
            "candidates": [{"content": {"parts": [{"text": "ignored"}]}}]
        }));
        let source = ReplySource::from(response);
        assert!(matches!(source, ReplySource::PlainText(_)));
        assert_eq!(source.into_reply(), "hi there");
    }

    #[test]
    fn test_empty_text_falls_back_to_candidate() {
        let response = parse(serde_json::json!({
            "text": "",
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "first"}, {"text": "second"}]},
                "finishReason": "STOP"
            }]
        }));
        let source = ReplySource::from(response);
        assert!(matches!(source, ReplySource::CandidateList(_)));
        assert_eq!(source.into_reply(), "first");
    }

    #[test]
    fn test_candidate_without_parts_is_no_reply() {
        let response = parse(serde_json::json!({
            "candidates": [{"finishReason": "SAFETY"}]
        }));
        assert_eq!(ReplySource::from(response).into_reply(), NO_REPLY);
    }

    #[test]
    fn test_blocked_prompt_is_empty() {
        let response = parse(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }));
        let source = ReplySource::from(response);
        assert!(matches!(source, ReplySource::Empty));
        assert_eq!(source.into_reply(), NO_REPLY);
    }

    #[test]
    fn test_error_envelope_parses() {
        let envelope: ApiErrorEnvelope = serde_json::from_value(serde_json::json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        }))
        .unwrap();
        assert_eq!(envelope.error.code, Some(400));
        assert_eq!(envelope.error.status.as_deref(), Some("INVALID_ARGUMENT"));
    }
}
