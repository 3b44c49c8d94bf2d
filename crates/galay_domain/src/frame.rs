use serde::Deserialize;
use serde_json::Value;

use crate::{Block, SourceRef, lenient_blocks, lenient_sources};

/// Wire shape of a single SSE `data:` payload.
///
/// Any subset of the fields may be present in one frame. Use
/// [`StreamFrame::events`] to decode the frame into the ordered effects the
/// reconciler applies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamFrame {
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub replace: Option<Value>,
    #[serde(default, deserialize_with = "lenient_blocks")]
    pub blocks: Option<Vec<Block>>,
    #[serde(default)]
    pub done: Option<Value>,
    #[serde(default, deserialize_with = "lenient_sources")]
    pub sources: Option<Vec<SourceRef>>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub partial: Option<Value>,
}

/// One effect decoded from a [`StreamFrame`], in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// Text appended to the accumulated answer.
    ContentDelta(String),
    /// Authoritative replacement of the accumulated answer.
    Replace {
        text: String,
        blocks: Option<Vec<Block>>,
    },
    /// Pre-built blocks with no accompanying text.
    Blocks(Vec<Block>),
    /// Terminal success signal.
    Done {
        sources: Vec<SourceRef>,
        blocks: Option<Vec<Block>>,
    },
    /// Terminal failure signal.
    Error(String),
}

impl FrameEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error(_))
    }
}

impl StreamFrame {
    /// Parses a `data:` payload. Returns `None` for anything that is not a
    /// JSON object.
    pub fn parse(payload: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(payload).ok()? {
            value @ Value::Object(_) => serde_json::from_value(value).ok(),
            _ => None,
        }
    }

    pub fn is_partial(&self) -> bool {
        self.partial.as_ref().is_some_and(is_truthy)
    }

    /// Decodes the frame into events: content, then replace (or standalone
    /// blocks), then done, then error. An empty result means the frame
    /// carried nothing recognizable.
    pub fn events(self) -> Vec<FrameEvent> {
        let mut events = Vec::new();
        let mut blocks = self.blocks.filter(|blocks| !blocks.is_empty());

        if let Some(content) = self.content.as_ref() {
            let text = flatten_text(content);
            if !text.is_empty() {
                events.push(FrameEvent::ContentDelta(text));
            }
        }

        let done = self.done.as_ref().is_some_and(is_truthy);

        match self.replace.as_ref() {
            Some(replace) if !replace.is_null() => {
                events.push(FrameEvent::Replace { text: flatten_text(replace), blocks: blocks.take() });
            }
            _ if !done => {
                if let Some(blocks) = blocks.take() {
                    events.push(FrameEvent::Blocks(blocks));
                }
            }
            _ => {}
        }

        if done {
            events.push(FrameEvent::Done {
                sources: self.sources.unwrap_or_default(),
                blocks: blocks.take(),
            });
        }

        if let Some(error) = self.error.as_ref().filter(|error| is_truthy(error)) {
            let message = flatten_text(error);
            events.push(FrameEvent::Error(if message.is_empty() {
                "stream error".to_string()
            } else {
                message
            }));
        }

        events
    }
}

/// Coerces a content payload into flat text.
///
/// Strings pass through, arrays concatenate their flattened parts and objects
/// contribute their first non-empty `text`, `content` or `reasoning_content`
/// field.
pub fn flatten_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(parts) => parts.iter().map(flatten_text).collect(),
        Value::Object(map) => ["text", "content", "reasoning_content"]
            .iter()
            .filter_map(|key| map.get(*key))
            .map(flatten_text)
            .find(|text| !text.is_empty())
            .unwrap_or_default(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
