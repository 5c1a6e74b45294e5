use std::io::Read;
use std::time::{Duration, Instant};

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};

use super::prompt_builder::message_list;
use super::stream::record::{Framing, Leniency};
use super::stream::{Snapshots, StreamOptions};
use super::{
    ensure_success, send_error, truncate, ApiError, ChatMessage, ChatReply, ChatRequest,
    ChatStream, LlmClient,
};

const PROVIDER: &str = "Groq";

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// The hosted model routed to Groq instead of the local endpoint.
pub const GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Minimal request/response structs for the OpenAI-compatible chat API.
#[derive(Serialize)]
struct GroqRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
    model: Option<String>,
    usage: Option<GroqUsage>,
}

#[derive(Deserialize)]
struct GroqChoice {
    message: GroqMessage,
}

#[derive(Deserialize)]
struct GroqMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct GroqUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

pub struct GroqClient {
    client: Client,
    api_key: String,
    api_base_url: String,
    leniency: Leniency,
}

impl GroqClient {
    pub fn new(
        api_key: String,
        api_base_url: String,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(GroqClient {
            client,
            api_key,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            leniency: Leniency::default(),
        })
    }

    pub fn with_leniency(mut self, leniency: Leniency) -> Self {
        self.leniency = leniency;
        self
    }

    fn chat_url(&self) -> String {
        if self.api_base_url.ends_with("/v1") {
            format!("{}/chat/completions", self.api_base_url)
        } else {
            format!("{}/v1/chat/completions", self.api_base_url)
        }
    }

    fn call_chat(&self, request: &ChatRequest, stream: bool) -> Result<Response, ApiError> {
        let url = self.chat_url();
        let req = GroqRequest {
            model: &request.model,
            messages: message_list(request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream,
        };

        log::info!("Calling Groq model {:?} (stream: {stream})", request.model);
        log::debug!("Prompt: {}", truncate(&request.prompt, 500));

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .map_err(|source| send_error(url, source))?;

        ensure_success(PROVIDER, resp)
    }
}

impl LlmClient for GroqClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn complete(&self, request: &ChatRequest) -> Result<ChatReply, ApiError> {
        let started = Instant::now();
        let resp = self.call_chat(request, false)?;

        let chat_resp: GroqResponse = resp
            .json()
            .map_err(|e| ApiError::InvalidResponse(format!("failed to parse Groq response: {e}")))?;

        if let Some(usage) = &chat_resp.usage {
            log::debug!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }

        let text = chat_resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ApiError::InvalidResponse("no choices returned from Groq".into()))?;

        Ok(ChatReply {
            text,
            model: chat_resp.model,
            processing_time: started.elapsed(),
        })
    }

    fn stream(&self, request: &ChatRequest) -> Result<ChatStream, ApiError> {
        let resp = self.call_chat(request, true)?;
        let body: Box<dyn Read + Send> = Box::new(resp);
        let options = StreamOptions {
            framing: Framing::ServerSentEvents,
            leniency: self.leniency,
        };
        Ok(Snapshots::new(body, options).with_model(request.model.clone()))
    }
}
