use std::time::Duration;

use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

const DEFAULT_BASE_URL: &str = "http://localhost:8080/ai/";

/// Endpoints and timeouts for one chat client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Setters)]
#[serde(rename_all = "camelCase")]
#[setters(into)]
pub struct ChatConfig {
    /// Base url the `api/chat` and `api/chat/stream` paths are joined onto.
    pub base_url: Url,
    /// Bound on waiting for response headers of the stream attempt and of a
    /// direct non-streaming request.
    pub connect_timeout_ms: u64,
    /// Bound on the gap between two stream chunks.
    pub idle_timeout_ms: u64,
    /// Bound on the single recovery request sent after a stream produced
    /// nothing.
    pub fallback_timeout_ms: u64,
    pub use_memory: bool,
    /// Maximum number of characters of error detail shown to the user.
    pub detail_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            connect_timeout_ms: 15_000,
            idle_timeout_ms: 45_000,
            fallback_timeout_ms: 5_000,
            use_memory: true,
            detail_limit: 180,
        }
    }
}

impl ChatConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_millis(self.fallback_timeout_ms)
    }

    pub fn stream_url(&self) -> crate::Result<Url> {
        self.endpoint("api/chat/stream")
    }

    pub fn chat_url(&self) -> crate::Result<Url> {
        self.endpoint("api/chat")
    }

    fn endpoint(&self, path: &str) -> crate::Result<Url> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path).map_err(|error| Error::InvalidUrl(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_timeouts() {
        let fixture = ChatConfig::default();
        assert_eq!(fixture.connect_timeout(), Duration::from_secs(15));
        assert_eq!(fixture.idle_timeout(), Duration::from_secs(45));
        assert_eq!(fixture.fallback_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_endpoints_join_onto_base_path() {
        let fixture = ChatConfig::default().base_url(Url::parse("https://example.com/ai").unwrap());
        assert_eq!(fixture.stream_url().unwrap().as_str(), "https://example.com/ai/api/chat/stream");
        assert_eq!(fixture.chat_url().unwrap().as_str(), "https://example.com/ai/api/chat");
    }
}
