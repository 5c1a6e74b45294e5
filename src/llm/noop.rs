use std::io::{Cursor, Read};
use std::time::Duration;

use serde_json::json;

use super::stream::{Snapshots, StreamOptions};
use super::{ApiError, ChatReply, ChatRequest, ChatStream, LlmClient};

/// No-op / dummy model client for development with --no-model or model=none.
pub struct NoopClient;

fn dummy_text(request: &ChatRequest) -> String {
    format!(
        "[DUMMY REPLY] model={} history={} prompt: {}",
        request.model,
        request.history.len(),
        request.prompt
    )
}

impl LlmClient for NoopClient {
    fn name(&self) -> &'static str {
        "Noop"
    }

    fn complete(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        Ok(ChatReply {
            text: dummy_text(request),
            model: Some("none".into()),
            processing_time: Duration::ZERO,
        })
    }

    /// Replays the dummy text word by word as Ollama-style records.
    fn stream(&self, request: &ChatRequest) -> Result<ChatStream, ApiError> {
        let text = dummy_text(request);
        let mut body = String::new();

        for word in text.split_inclusive(' ') {
            body.push_str(&json!({"message": {"content": word}, "done": false}).to_string());
            body.push('\n');
        }
        body.push_str(&json!({"message": {"content": ""}, "done": true}).to_string());
        body.push('\n');

        let reader: Box<dyn Read + Send> = Box::new(Cursor::new(body.into_bytes()));
        Ok(Snapshots::new(reader, StreamOptions::default()).with_model("none"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChatRequest {
        ChatRequest {
            prompt: "what is a thesis statement?".into(),
            system: String::new(),
            history: Vec::new(),
            max_tokens: 16,
            temperature: 0.0,
            model: "none".into(),
        }
    }

    #[test]
    fn stream_and_complete_agree() {
        let full = NoopClient.complete(&request()).unwrap();

        let mut stream = NoopClient.stream(&request()).unwrap();
        let snapshots: Vec<_> = stream.by_ref().map(|s| s.unwrap()).collect();
        assert!(stream.done_hint());
        assert!(snapshots.len() > 1);
        assert_eq!(snapshots.last().unwrap().text, full.text);

        let streamed = NoopClient.stream(&request()).unwrap().finish().unwrap();
        assert_eq!(streamed.text, full.text);
        assert_eq!(streamed.model.as_deref(), Some("none"));
    }
}
