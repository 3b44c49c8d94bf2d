use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures::StreamExt;
use galay_domain::{ChatConfig, ChatReply, ChatRequest, Error, SessionId, SourceRef};
use galay_markdown::{render_blocks, render_markdown};
use serde_json::Value;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, info, warn};

use crate::reconciler::{Flow, StreamReconciler};
use crate::state::StreamState;
use crate::surface::Surface;
use crate::transport::{ChatTransport, TransportResponse};

/// Prefix of every user-facing failure message.
pub const FAILURE_PREFIX: &str = "抱歉，服务暂时不可用：";
const EMPTY_DETAIL: &str = "请稍后再试";
const EMPTY_REPLY: &str = "抱歉，未返回有效内容。";

/// Final state of one delivered answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub text: String,
    pub html: String,
    pub sources: Vec<SourceRef>,
    /// Whether the stream itself produced visible content.
    pub got_content: bool,
    /// Whether the answer came from the non-streaming endpoint.
    pub used_fallback: bool,
}

/// Sends chat messages over a [`ChatTransport`] and renders the answers onto
/// a [`Surface`].
pub struct ChatClient<T> {
    transport: Arc<T>,
    config: ChatConfig,
    session: SessionId,
}

impl<T> Clone for ChatClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            config: self.config.clone(),
            session: self.session.clone(),
        }
    }
}

impl<T: ChatTransport> ChatClient<T> {
    pub fn new(transport: Arc<T>, config: ChatConfig, session: SessionId) -> Self {
        Self { transport, config, session }
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Like [`ChatClient::send_message`] but turns any failure into a
    /// message on the surface.
    pub async fn deliver<S: Surface>(&self, message: &str, surface: &mut S) -> Option<Outcome> {
        match self.send_message(message, surface).await {
            Ok(outcome) => Some(outcome),
            Err(error) => {
                warn!(error = ?error, "Chat request failed");
                surface.clear_progress();
                surface.failure(&failure_message(&error, self.config.detail_limit));
                None
            }
        }
    }

    /// Streams the answer to `message`, falling back to the non-streaming
    /// endpoint when the stream produced nothing or never connected.
    pub async fn send_message<S: Surface>(
        &self,
        message: &str,
        surface: &mut S,
    ) -> anyhow::Result<Outcome> {
        let request = ChatRequest::new(message, self.session.clone()).use_memory(self.config.use_memory);
        let mut reconciler = StreamReconciler::new();
        reconciler.advance(StreamState::Connecting);

        let response = match timeout(self.config.connect_timeout(), self.transport.stream(&request)).await {
            Ok(response) => response.context("Failed to open chat stream")?,
            Err(_) => {
                warn!(timeout_ms = self.config.connect_timeout_ms, "Chat stream connect timed out");
                reconciler.advance(StreamState::Failed);
                return self.fallback(&request, surface).await.map_err(|error| {
                    warn!(error = ?error, "Fallback after connect timeout failed");
                    Error::ConnectTimeout { timeout_ms: self.config.connect_timeout_ms }.into()
                });
            }
        };

        if !response.is_success() {
            reconciler.advance(StreamState::Failed);
            return Err(http_error(response, self.config.connect_timeout()).await.into());
        }
        if !response.is_event_stream() {
            reconciler.advance(StreamState::Failed);
            debug!(content_type = ?response.content_type, "Unexpected stream content type");
            return Err(Error::StreamUnavailable.into());
        }

        surface.clear_progress();
        reconciler.advance(StreamState::Streaming);
        self.read_stream(response, &mut reconciler, surface).await?;

        if !reconciler.got_content() {
            info!("Stream ended without content, using non-streaming endpoint");
            return self.fallback(&request, surface).await;
        }

        Ok(Outcome {
            text: reconciler.text().to_string(),
            html: reconciler.html().to_string(),
            sources: reconciler.sources().to_vec(),
            got_content: true,
            used_fallback: false,
        })
    }

    /// Reads until a terminal frame, the end of the body or an idle timeout.
    /// The body is dropped on return, which cancels the underlying read.
    async fn read_stream<S: Surface>(
        &self,
        response: TransportResponse,
        reconciler: &mut StreamReconciler,
        surface: &mut S,
    ) -> anyhow::Result<()> {
        let idle = self.config.idle_timeout();
        let mut body = response.body;

        loop {
            match timeout(idle, body.next()).await {
                Ok(Some(Ok(chunk))) => {
                    if reconciler.consume(&chunk, surface) == Flow::Complete {
                        debug!("Terminal frame received, closing stream");
                        return Ok(());
                    }
                }
                Ok(Some(Err(error))) => {
                    reconciler.advance(StreamState::Failed);
                    return Err(Error::Transport(format!("{error:#}")).into());
                }
                Ok(None) => {
                    reconciler.finish(surface);
                    return Ok(());
                }
                Err(_) if reconciler.got_content() => {
                    reconciler.advance(StreamState::Failed);
                    return Err(Error::IdleTimeout { timeout_ms: self.config.idle_timeout_ms }.into());
                }
                Err(_) => {
                    warn!(timeout_ms = self.config.idle_timeout_ms, "Stream idle before any content");
                    reconciler.advance(StreamState::Completed);
                    return Ok(());
                }
            }
        }
    }

    /// One non-streaming request bounded by the fallback timeout.
    async fn fallback<S: Surface>(
        &self,
        request: &ChatRequest,
        surface: &mut S,
    ) -> anyhow::Result<Outcome> {
        let reply = self.request_reply(request, self.config.fallback_timeout()).await?;
        surface.clear_progress();

        let text = if reply.response.trim().is_empty() {
            EMPTY_REPLY.to_string()
        } else {
            reply.response.clone()
        };
        let html = match reply.blocks() {
            Some(blocks) => render_blocks(blocks),
            None => render_markdown(&text),
        };
        surface.update(&html);

        let sources = reply.sources().to_vec();
        if !sources.is_empty() {
            surface.sources(&sources);
        }

        Ok(Outcome { text, html, sources, got_content: false, used_fallback: true })
    }

    /// `limit` is one budget shared by the connect, the status check and
    /// the body read.
    async fn request_reply(&self, request: &ChatRequest, limit: Duration) -> anyhow::Result<ChatReply> {
        let deadline = Instant::now() + limit;
        let elapsed = || Error::ConnectTimeout { timeout_ms: limit.as_millis() as u64 };

        let response = timeout_at(deadline, self.transport.send(request))
            .await
            .map_err(|_| elapsed())?
            .context("Failed to call chat endpoint")?;

        if !response.is_success() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            return Err(http_error(response, remaining).await.into());
        }

        let body = timeout_at(deadline, response.bytes()).await.map_err(|_| elapsed())??;
        serde_json::from_slice(&body).context("Failed to parse chat reply")
    }
}

/// Builds the error for a non-2xx response from its body. A body that does
/// not arrive within `limit` leaves the detail at `HTTP <status>`.
async fn http_error(response: TransportResponse, limit: Duration) -> Error {
    let status = response.status;
    let body = match timeout(limit, response.text()).await {
        Ok(Ok(body)) => body,
        Ok(Err(_)) | Err(_) => String::new(),
    };
    Error::Http { status, detail: error_detail(status, &body) }
}

/// Human readable detail of an error body: a JSON `error`, `detail` or
/// `message` field, else the trimmed text, else `HTTP <status>`.
pub fn error_detail(status: u16, body: &str) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        let field = ["error", "detail", "message"]
            .into_iter()
            .filter_map(|key| fields.get(key))
            .map(galay_domain::flatten_text)
            .find(|text| !text.trim().is_empty());
        if let Some(field) = field {
            return field.trim().to_string();
        }
    }

    let text = body.trim();
    if text.is_empty() {
        format!("HTTP {status}")
    } else {
        text.to_string()
    }
}

/// `抱歉，服务暂时不可用：<detail>` with the detail whitespace-collapsed and
/// cut to `limit` characters.
pub fn failure_message(error: &anyhow::Error, limit: usize) -> String {
    let detail = match error.downcast_ref::<Error>() {
        Some(error) => error.to_string(),
        None => error.root_cause().to_string(),
    };
    let detail = detail.split_whitespace().collect::<Vec<_>>().join(" ");
    let detail: String = detail.chars().take(limit).collect();
    if detail.is_empty() {
        format!("{FAILURE_PREFIX}{EMPTY_DETAIL}")
    } else {
        format!("{FAILURE_PREFIX}{detail}")
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_error_detail_prefers_json_fields() {
        assert_eq!(error_detail(500, r#"{"error":"model offline"}"#), "model offline");
        assert_eq!(error_detail(422, r#"{"detail":"bad input","message":"x"}"#), "bad input");
        assert_eq!(error_detail(400, r#"{"error":null,"message":"m"}"#), "m");
    }

    #[test]
    fn test_error_detail_falls_back_to_text_then_status() {
        assert_eq!(error_detail(502, "  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(error_detail(503, "   "), "HTTP 503");
        assert_eq!(error_detail(404, "{}"), "{}");
    }

    #[test]
    fn test_failure_message_uses_domain_error() {
        let fixture: anyhow::Error = Error::ConnectTimeout { timeout_ms: 15_000 }.into();
        assert_eq!(failure_message(&fixture, 180), "抱歉，服务暂时不可用：连接 AI 服务超时");
    }

    #[test]
    fn test_failure_message_collapses_and_truncates() {
        let fixture = anyhow!("line one\n\n   line two").context("outer");
        assert_eq!(failure_message(&fixture, 180), "抱歉，服务暂时不可用：line one line two");

        let fixture = anyhow!("{}", "错".repeat(300));
        let actual = failure_message(&fixture, 180);
        assert_eq!(actual.chars().count(), FAILURE_PREFIX.chars().count() + 180);
    }

    #[test]
    fn test_failure_message_without_detail() {
        let fixture = anyhow!(" \n ");
        assert_eq!(failure_message(&fixture, 180), "抱歉，服务暂时不可用：请稍后再试");
    }
}
