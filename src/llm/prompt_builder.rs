use crate::llm::prompts;
use crate::llm::{ChatMessage, ChatRequest, Role};

/// Only the most recent messages (three exchanges) are sent upstream.
pub const HISTORY_LIMIT: usize = 6;

/// Sampling parameters shared by every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub max_tokens: u32,
    pub temperature: f32,
}

pub fn chat_request(
    message: &str,
    history: &[ChatMessage],
    model: &str,
    sampling: Sampling,
) -> ChatRequest {
    let start = history.len().saturating_sub(HISTORY_LIMIT);

    ChatRequest {
        prompt: message.to_owned(),
        system: prompts::SYSTEM_INSTRUCTION.to_owned(),
        history: history[start..].to_vec(),
        max_tokens: sampling.max_tokens,
        temperature: sampling.temperature,
        model: model.to_owned(),
    }
}

/// Flatten a request into an OpenAI-style message list: system, history, user.
pub fn message_list(request: &ChatRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    messages.push(ChatMessage::new(Role::System, request.system.clone()));
    messages.extend(request.history.iter().cloned());
    messages.push(ChatMessage::new(Role::User, request.prompt.clone()));
    messages
}
