use serde_json::Value;
use thiserror::Error;

/// How records are wrapped on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// One JSON object (or raw text line) per line. Ollama and most local servers.
    #[default]
    JsonLines,
    /// `data: {...}` lines, terminated by `data: [DONE]`. OpenAI-compatible hosts.
    ServerSentEvents,
}

/// What to do with records that look like objects but don't parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Leniency {
    #[default]
    Lenient,
    Strict,
}

/// Policy applied to a record that failed to parse as a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnparsedPolicy {
    DropSilently,
    PassthroughVerbatim,
    Fail,
}

/// A known place where upstreams put the response text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `{"response": "..."}`
    Response,
    /// `{"message": {"content": "..."}}`
    MessageContent,
    /// `{"choices": [{"message": {"content": "..."}}]}`
    ChoiceMessage,
    /// `{"choices": [{"delta": {"content": "..."}}]}`
    ChoiceDelta,
}

/// Precedence used for streamed records.
pub const STREAM_SHAPES: [Shape; 3] = [Shape::MessageContent, Shape::ChoiceDelta, Shape::Response];

/// Precedence used for a complete (non-streamed) response body.
pub const BODY_SHAPES: [Shape; 4] = [
    Shape::Response,
    Shape::MessageContent,
    Shape::ChoiceMessage,
    Shape::ChoiceDelta,
];

impl Shape {
    pub fn extract(self, value: &Value) -> Option<&str> {
        match self {
            Shape::Response => value.get("response")?.as_str(),
            Shape::MessageContent => value.get("message")?.get("content")?.as_str(),
            Shape::ChoiceMessage => first_choice(value)?.get("message")?.get("content")?.as_str(),
            Shape::ChoiceDelta => first_choice(value)?.get("delta")?.get("content")?.as_str(),
        }
    }
}

fn first_choice(value: &Value) -> Option<&Value> {
    value.get("choices")?.as_array()?.first()
}

/// First match among `shapes`, in order.
pub fn extract_content<'a>(value: &'a Value, shapes: &[Shape]) -> Option<&'a str> {
    shapes.iter().find_map(|shape| shape.extract(value))
}

/// Decide what happens to a record that isn't a parsable JSON object.
pub fn classify_unparsed(record: &str, leniency: Leniency) -> UnparsedPolicy {
    let looks_like_object = record.trim_start().starts_with('{');
    match (looks_like_object, leniency) {
        (false, _) => UnparsedPolicy::PassthroughVerbatim,
        (true, Leniency::Lenient) => UnparsedPolicy::DropSilently,
        (true, Leniency::Strict) => UnparsedPolicy::Fail,
    }
}

/// Text contributed by one record plus the upstream's end-of-stream hint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interpreted {
    pub fragment: String,
    pub done: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed stream record: {record}")]
pub struct MalformedRecord {
    pub record: String,
}

#[derive(Debug, PartialEq, Eq)]
enum SseLine<'a> {
    Data(&'a str),
    Done,
    Skip,
    Bare(&'a str),
}

fn unwrap_sse(record: &str) -> SseLine<'_> {
    if let Some(data) = record.strip_prefix("data:") {
        let data = data.strip_prefix(' ').unwrap_or(data);
        if data.trim() == "[DONE]" {
            return SseLine::Done;
        }
        return SseLine::Data(data);
    }

    let is_field = ["event:", "id:", "retry:"]
        .iter()
        .any(|field| record.starts_with(field));
    if is_field || record.starts_with(':') {
        SseLine::Skip
    } else {
        SseLine::Bare(record)
    }
}

/// Turn one complete record into a fragment.
pub fn interpret(
    record: &str,
    framing: Framing,
    leniency: Leniency,
) -> Result<Interpreted, MalformedRecord> {
    let payload = match framing {
        Framing::JsonLines => record,
        Framing::ServerSentEvents => match unwrap_sse(record) {
            SseLine::Data(data) => data,
            SseLine::Bare(line) => line,
            SseLine::Done => {
                return Ok(Interpreted {
                    fragment: String::new(),
                    done: true,
                });
            }
            SseLine::Skip => return Ok(Interpreted::default()),
        },
    };

    if payload.trim().is_empty() {
        return Ok(Interpreted::default());
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(value) if value.is_object() => Ok(Interpreted {
            fragment: extract_content(&value, &STREAM_SHAPES)
                .unwrap_or_default()
                .to_owned(),
            done: value.get("done").and_then(Value::as_bool).unwrap_or(false),
        }),
        _ => match classify_unparsed(payload, leniency) {
            UnparsedPolicy::PassthroughVerbatim => Ok(Interpreted {
                fragment: format!("{payload}\n"),
                done: false,
            }),
            UnparsedPolicy::DropSilently => {
                log::trace!("Dropping unparsable record: {payload}");
                Ok(Interpreted::default())
            }
            UnparsedPolicy::Fail => Err(MalformedRecord {
                record: payload.to_owned(),
            }),
        },
    }
}
