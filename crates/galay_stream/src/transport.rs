use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use galay_domain::ChatRequest;

/// Response body delivered chunk by chunk.
pub type ByteStream = BoxStream<'static, anyhow::Result<Bytes>>;

/// Status line, content type and body of one chat endpoint response.
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: ByteStream,
}

impl TransportResponse {
    pub fn new(status: u16, content_type: Option<String>, body: ByteStream) -> Self {
        Self { status, content_type, body }
    }

    /// A response whose body arrives in a single chunk.
    pub fn full(status: u16, content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            status,
            content_type: Some(content_type.into()),
            body: futures::stream::once(async move { Ok(body) }).boxed(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True unless the server declared a type other than `text/event-stream`.
    pub fn is_event_stream(&self) -> bool {
        self.content_type
            .as_deref()
            .is_none_or(|content_type| content_type.contains("text/event-stream"))
    }

    /// Collects the remaining body.
    pub async fn bytes(mut self) -> anyhow::Result<Bytes> {
        let mut collected = Vec::new();
        while let Some(chunk) = self.body.next().await {
            collected.extend_from_slice(&chunk?);
        }
        Ok(Bytes::from(collected))
    }

    pub async fn text(self) -> anyhow::Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// The two chat endpoints. Implementations return the response as soon as
/// headers arrive; timeouts are applied by the caller.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// `POST <base>/api/chat/stream`
    async fn stream(&self, request: &ChatRequest) -> anyhow::Result<TransportResponse>;

    /// `POST <base>/api/chat`
    async fn send(&self, request: &ChatRequest) -> anyhow::Result<TransportResponse>;
}
