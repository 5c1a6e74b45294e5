use std::io::Read;
use std::time::Duration;

use musli::json;
use musli::Encode;
use reqwest::blocking::{Client, Response};
use serde_json::Value;

use super::stream::record::{extract_content, Leniency, BODY_SHAPES};
use super::stream::{Snapshots, StreamOptions};
use super::{
    ensure_success, send_error, truncate, ApiError, ChatReply, ChatRequest, ChatStream, LlmClient,
};

const PROVIDER: &str = "Local";

#[derive(Debug, Encode)]
struct HistoryMessage {
    role: String,
    content: String,
}

/// Request body understood by the local inference endpoint.
#[derive(Debug, Encode)]
struct LocalChatRequest {
    prompt: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    conversation_history: Option<Vec<HistoryMessage>>,
    model: String,
    stream: bool,
}

/// Synchronous client for the local (or user-supplied custom) inference endpoint.
pub struct LocalClient {
    http: Client,
    url: String,
    api_key: Option<String>,
    plain_text_body: bool,
    options: StreamOptions,
}

impl LocalClient {
    /// Client for the configured endpoint, authenticated with `X-API-Key`.
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: url.into(),
            api_key,
            plain_text_body: false,
            options: StreamOptions::default(),
        })
    }

    /// Client for a user-supplied URL. The JSON body goes out as `text/plain`
    /// so browsers and strict CORS setups treat it as a simple request.
    pub fn custom(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut client = Self::new(url, None, timeout)?;
        client.plain_text_body = true;
        Ok(client)
    }

    pub fn with_leniency(mut self, leniency: Leniency) -> Self {
        self.options.leniency = leniency;
        self
    }

    fn post(&self, request: &ChatRequest, stream: bool) -> Result<Response, ApiError> {
        let history = (!request.history.is_empty()).then(|| {
            request
                .history
                .iter()
                .map(|m| HistoryMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect()
        });

        let req_body = LocalChatRequest {
            prompt: request.prompt.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system.clone(),
            conversation_history: history,
            model: request.model.clone(),
            stream,
        };

        let body_str = json::to_string(&req_body)
            .map_err(|e| ApiError::Encode(format!("local chat request: {e}")))?;

        log::info!("Sending request to {} (model {:?})", self.url, request.model);
        log::debug!("Prompt: {}", truncate(&request.prompt, 500));
        log::trace!("Local request body: {body_str}");

        let content_type = if self.plain_text_body {
            "text/plain"
        } else {
            "application/json"
        };

        let mut builder = self
            .http
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body_str);

        if let Some(key) = &self.api_key {
            builder = builder.header("X-API-Key", key);
        }

        let resp = builder
            .send()
            .map_err(|source| send_error(self.url.clone(), source))?;

        ensure_success(PROVIDER, resp)
    }
}

/// Parse a complete (non-streamed) reply body.
fn parse_reply(body: &str) -> Result<ChatReply, ApiError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::InvalidResponse(format!("body is not JSON: {e}")))?;

    let text = extract_content(&value, &BODY_SHAPES)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ApiError::InvalidResponse("missing \"response\" field".into()))?;

    let processing_time = value
        .get("processing_time")
        .and_then(Value::as_f64)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or_default();

    Ok(ChatReply {
        text: text.to_string(),
        model: value.get("model").and_then(Value::as_str).map(str::to_owned),
        processing_time,
    })
}

impl LlmClient for LocalClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn complete(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        let resp = self.post(request, false)?;

        let resp_text = resp
            .text()
            .map_err(|e| ApiError::InvalidResponse(format!("failed to read body: {e}")))?;

        log::trace!("Local raw JSON response: {resp_text}");

        let reply = parse_reply(&resp_text)?;
        log::debug!("Model used: {}", reply.model.as_deref().unwrap_or("Not specified"));
        Ok(reply)
    }

    fn stream(&self, request: &ChatRequest) -> Result<ChatStream, ApiError> {
        let resp = self.post(request, true)?;
        let body: Box<dyn Read + Send> = Box::new(resp);
        Ok(Snapshots::new(body, self.options).with_model(request.model.clone()))
    }
}
