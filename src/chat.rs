use crate::llm::stream::Snapshot;
use crate::llm::{ApiError, ChatMessage, ChatReply, ChatRequest, LlmClient, Role};

/// In-memory conversation for the interactive loop.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Record a finished exchange.
    pub fn push_exchange(&mut self, user: &str, assistant: &str) {
        self.messages.push(ChatMessage::new(Role::User, user));
        self.messages.push(ChatMessage::new(Role::Assistant, assistant));
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// Send one message.
///
/// With `on_progress` the reply is streamed and the callback sees every
/// cumulative snapshot; without it the request goes out unstreamed and the
/// body is parsed once.
pub fn send_message(
    client: &dyn LlmClient,
    request: &ChatRequest,
    on_progress: Option<&mut dyn FnMut(&Snapshot)>,
) -> Result<ChatReply, ApiError> {
    let Some(on_progress) = on_progress else {
        return client.complete(request);
    };

    let mut stream = client.stream(request)?;
    for snapshot in stream.by_ref() {
        on_progress(&snapshot?);
    }

    if !stream.done_hint() {
        log::debug!(
            "{} stream closed without a done marker after {} bytes",
            client.name(),
            stream.text().len()
        );
    }
    stream.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::noop::NoopClient;
    use crate::llm::prompt_builder::{chat_request, Sampling};

    const SAMPLING: Sampling = Sampling {
        max_tokens: 64,
        temperature: 0.5,
    };

    #[test]
    fn streaming_reports_growing_snapshots() {
        let request = chat_request("hello there", &[], "none", SAMPLING);
        let mut seen = Vec::new();
        let mut record = |s: &Snapshot| seen.push(s.text.clone());

        let reply = send_message(&NoopClient, &request, Some(&mut record)).unwrap();

        assert!(seen.len() > 1);
        assert!(seen.windows(2).all(|w| w[1].starts_with(&w[0]) && w[1].len() > w[0].len()));
        assert_eq!(seen.last().unwrap(), &reply.text);
    }

    #[test]
    fn without_callback_uses_single_call() {
        let request = chat_request("hello", &[], "none", SAMPLING);
        let reply = send_message(&NoopClient, &request, None).unwrap();
        assert!(reply.text.starts_with("[DUMMY REPLY]"));
    }

    #[test]
    fn conversation_tracks_exchanges() {
        let mut convo = Conversation::new();
        convo.push_exchange("hi", "hello!");
        assert_eq!(convo.history().len(), 2);
        assert_eq!(convo.history()[1].role, Role::Assistant);
        convo.clear();
        assert!(convo.history().is_empty());
    }
}
