pub mod groq;
pub mod local;
pub mod noop;
pub mod prompt_builder;
mod prompts;
pub mod stream;

use std::io::{self, Read};
use std::time::Duration;

use reqwest::blocking::Response;
use serde::Serialize;
use thiserror::Error;

use self::stream::Snapshots;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Everything a backend needs to answer one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub prompt: String,
    pub system: String,
    pub history: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub model: String,
}

/// Final result of a chat call.
///
/// `processing_time` is zero for streamed replies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatReply {
    pub text: String,
    pub model: Option<String>,
    pub processing_time: Duration,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to connect to the API server at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} timed out: {source}")]
    Timeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API error: {status} - {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("stream interrupted after {} bytes: {source}", .partial.len())]
    Interrupted {
        partial: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed stream record: {record}")]
    MalformedRecord { record: String, partial: String },

    #[error("Invalid response format from API - {0}")]
    InvalidResponse(String),

    #[error("failed to encode request: {0}")]
    Encode(String),

    #[error("{0}")]
    Config(String),
}

impl ApiError {
    /// Upstream HTTP status, when the failure came with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text accumulated before a mid-stream failure.
    pub fn partial_text(&self) -> Option<&str> {
        match self {
            ApiError::Interrupted { partial, .. } | ApiError::MalformedRecord { partial, .. } => {
                Some(partial)
            }
            _ => None,
        }
    }

    /// Rebuild a stream failure so it can be reported twice.
    ///
    /// Only the mid-stream variants can be rebuilt; the io source keeps its
    /// kind and message.
    pub(crate) fn replay(&self) -> Option<ApiError> {
        match self {
            ApiError::Interrupted { partial, source } => Some(ApiError::Interrupted {
                partial: partial.clone(),
                source: io::Error::new(source.kind(), source.to_string()),
            }),
            ApiError::MalformedRecord { record, partial } => Some(ApiError::MalformedRecord {
                record: record.clone(),
                partial: partial.clone(),
            }),
            _ => None,
        }
    }
}

/// Classify a failed `send()`: a missed deadline is not a refused connection.
pub(crate) fn send_error(url: String, source: reqwest::Error) -> ApiError {
    if source.is_timeout() {
        ApiError::Timeout { url, source }
    } else {
        ApiError::Connect { url, source }
    }
}

/// A live streamed reply over an HTTP body.
pub type ChatStream = Snapshots<Box<dyn Read + Send>>;

/// A backend that can answer a [`ChatRequest`].
pub trait LlmClient: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Request/response call; the whole reply is parsed once.
    fn complete(&self, request: &ChatRequest) -> Result<ChatReply, ApiError>;

    /// Streaming call. The status has already been checked when this returns.
    fn stream(&self, request: &ChatRequest) -> Result<ChatStream, ApiError>;
}

/// Reject non-success responses before any body is consumed as a stream.
pub(crate) fn ensure_success(provider: &'static str, resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    log::debug!("{provider} response status: {status}");

    if status.is_success() {
        return Ok(resp);
    }

    let text = match resp.text() {
        Ok(text) => text,
        Err(e) => {
            log::debug!("Failed to read {provider} error body: {e}");
            String::new()
        }
    };
    let body = if text.trim().is_empty() {
        status.canonical_reason().unwrap_or_default().to_string()
    } else {
        text
    };

    Err(ApiError::Status {
        provider,
        status: status.as_u16(),
        body,
    })
}

/// Truncate long strings for debug logging.
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }

    let mut cut = max_len;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...\n[truncated {} chars]", &s[..cut], s.len() - cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_for_http_errors() {
        let err = ApiError::Status {
            provider: "Local",
            status: 503,
            body: "busy".into(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "Local API error: 503 - busy");

        let err = ApiError::InvalidResponse("missing \"response\" field".into());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn partial_text_survives_interruption() {
        let err = ApiError::Interrupted {
            partial: "Hello wo".into(),
            source: io::Error::new(io::ErrorKind::ConnectionReset, "reset"),
        };
        assert_eq!(err.partial_text(), Some("Hello wo"));
        assert!(err.to_string().contains("after 8 bytes"));
    }

    #[test]
    fn replay_keeps_partial_text_and_message() {
        let err = ApiError::Interrupted {
            partial: "Hello".into(),
            source: io::Error::new(io::ErrorKind::ConnectionReset, "reset"),
        };
        let again = err.replay().unwrap();
        assert_eq!(again.partial_text(), Some("Hello"));
        assert_eq!(again.to_string(), err.to_string());

        let err = ApiError::MalformedRecord {
            record: "{\"response\":".into(),
            partial: "a".into(),
        };
        assert_eq!(err.replay().unwrap().to_string(), err.to_string());

        assert!(ApiError::Config("x".into()).replay().is_none());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        let out = truncate("ééé", 3);
        assert!(out.starts_with("é..."));
    }
}
