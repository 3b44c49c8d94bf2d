use serde::{Deserialize, Serialize};

use crate::{Block, SessionId, SourceRef, lenient_blocks, lenient_sources};

/// Request body shared by the streaming and non-streaming chat endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: SessionId,
    pub use_memory: bool,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, session_id: SessionId) -> Self {
        Self { message: message.into(), session_id, use_memory: true }
    }

    pub fn use_memory(mut self, use_memory: bool) -> Self {
        self.use_memory = use_memory;
        self
    }
}

/// JSON body returned by the non-streaming chat endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default)]
    pub response: String,
    #[serde(default, deserialize_with = "lenient_blocks", skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<Block>>,
    #[serde(default, deserialize_with = "lenient_sources", skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatReply {
    /// Server-computed blocks, if any were supplied.
    pub fn blocks(&self) -> Option<&[Block]> {
        self.blocks.as_deref().filter(|blocks| !blocks.is_empty())
    }

    pub fn sources(&self) -> &[SourceRef] {
        self.sources.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_body_shape() {
        let fixture = ChatRequest::new("hi", SessionId::new("s1"));
        let actual = serde_json::to_value(&fixture).unwrap();
        let expected = json!({"message": "hi", "session_id": "s1", "use_memory": true});
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_reply_with_missing_fields() {
        let actual: ChatReply = serde_json::from_str(r#"{"response":"ok","sources":"bad"}"#).unwrap();
        assert_eq!(actual.response, "ok");
        assert_eq!(actual.blocks(), None);
        assert!(actual.sources().is_empty());
    }
}
