use anyhow::Context;
use async_trait::async_trait;
use futures::StreamExt;
use galay_domain::{ChatConfig, ChatRequest};
use galay_stream::{ChatTransport, TransportResponse};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response, Url};
use tracing::debug;

const VERSION: &str = match option_env!("APP_VERSION") {
    None => env!("CARGO_PKG_VERSION"),
    Some(v) => v,
};

const EVENT_STREAM: &str = "text/event-stream";
const JSON: &str = "application/json";

/// [`ChatTransport`] over HTTP.
///
/// The client carries no request timeout of its own; `ChatClient` bounds the
/// connect, idle and fallback phases separately.
#[derive(Clone)]
pub struct GalayHttpTransport {
    client: Client,
    stream_url: Url,
    chat_url: Url,
}

impl GalayHttpTransport {
    pub fn new(config: &ChatConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            stream_url: config.stream_url()?,
            chat_url: config.chat_url()?,
        })
    }

    async fn post(&self, url: &Url, accept: &'static str, request: &ChatRequest) -> anyhow::Result<Response> {
        let body = serde_json::to_vec(request).context("Failed to serialize chat request")?;
        let response = self
            .client
            .post(url.clone())
            .headers(self.headers(accept))
            .body(body)
            .send()
            .await
            .with_context(|| format_http_context(None, "POST", url))?;

        debug!(
            status = response.status().as_u16(),
            url = %url,
            "Chat endpoint responded"
        );
        Ok(response)
    }

    fn headers(&self, accept: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(format!("galay-chat/{VERSION}").as_str())
                .unwrap_or(HeaderValue::from_static("galay-chat")),
        );
        debug!(headers = ?headers, "Request Headers");
        headers
    }
}

/// Turns a reqwest response into a transport response once headers are in.
fn into_transport(response: Response) -> TransportResponse {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response
        .bytes_stream()
        .map(|chunk| chunk.map_err(anyhow::Error::from))
        .boxed();
    TransportResponse::new(status, content_type, body)
}

fn format_http_context(status: Option<u16>, method: &str, url: &Url) -> String {
    match status {
        Some(status) => format!("{status} {method} {url}"),
        None => format!("{method} {url}"),
    }
}

#[async_trait]
impl ChatTransport for GalayHttpTransport {
    async fn stream(&self, request: &ChatRequest) -> anyhow::Result<TransportResponse> {
        let response = self.post(&self.stream_url, EVENT_STREAM, request).await?;
        Ok(into_transport(response))
    }

    async fn send(&self, request: &ChatRequest) -> anyhow::Result<TransportResponse> {
        let response = self.post(&self.chat_url, JSON, request).await?;
        Ok(into_transport(response))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use galay_domain::{Error, SessionId};
    use galay_stream::{ChatClient, MemorySurface};
    use mockito::{Matcher, Mock, ServerGuard};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    struct MockServer {
        server: ServerGuard,
    }

    impl MockServer {
        async fn new() -> Self {
            Self { server: mockito::Server::new_async().await }
        }

        fn url(&self) -> String {
            format!("{}/ai/", self.server.url())
        }

        async fn mock_stream(&mut self, body: &str, status: usize) -> Mock {
            self.server
                .mock("POST", "/ai/api/chat/stream")
                .match_header("accept", EVENT_STREAM)
                .match_header("content-type", JSON)
                .with_status(status)
                .with_header("content-type", EVENT_STREAM)
                .with_body(body)
                .create_async()
                .await
        }

        async fn mock_chat(&mut self, body: serde_json::Value, status: usize) -> Mock {
            self.server
                .mock("POST", "/ai/api/chat")
                .match_header("accept", JSON)
                .with_status(status)
                .with_header("content-type", JSON)
                .with_body(body.to_string())
                .create_async()
                .await
        }
    }

    fn config(fixture: &MockServer) -> ChatConfig {
        ChatConfig::default().base_url(Url::parse(&fixture.url()).unwrap())
    }

    fn request() -> ChatRequest {
        ChatRequest::new("如何构建？", SessionId::new("session_1"))
    }

    #[tokio::test]
    async fn test_stream_posts_json_body() -> anyhow::Result<()> {
        let mut fixture = MockServer::new().await;
        let mock = fixture
            .server
            .mock("POST", "/ai/api/chat/stream")
            .match_body(Matcher::Json(json!({
                "message": "如何构建？",
                "session_id": "session_1",
                "use_memory": true
            })))
            .with_status(200)
            .with_header("content-type", "text/event-stream; charset=utf-8")
            .with_body("data: {\"done\":true}\n\n")
            .create_async()
            .await;

        let transport = GalayHttpTransport::new(&config(&fixture))?;
        let actual = transport.stream(&request()).await?;

        mock.assert_async().await;
        assert_eq!(actual.status, 200);
        assert!(actual.is_event_stream());
        assert_eq!(actual.text().await?, "data: {\"done\":true}\n\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_send_keeps_error_status_and_body() -> anyhow::Result<()> {
        let mut fixture = MockServer::new().await;
        let mock = fixture.mock_chat(json!({"error": "model offline"}), 503).await;

        let transport = GalayHttpTransport::new(&config(&fixture))?;
        let actual = transport.send(&request()).await?;

        mock.assert_async().await;
        assert!(!actual.is_success());
        assert_eq!(actual.content_type.as_deref(), Some(JSON));
        assert_eq!(actual.text().await?, r#"{"error":"model offline"}"#);
        Ok(())
    }

    #[tokio::test]
    async fn test_client_renders_streamed_answer() -> anyhow::Result<()> {
        let mut fixture = MockServer::new().await;
        let body = concat!(
            "data: {\"content\":\"## 构建\\n\"}\n\n",
            "data: {\"content\":\"运行 `make`\"}\n\n",
            "data: {\"done\":true,\"sources\":[{\"project\":\"galay\",\"file\":\"docs/build.md\",\"file_name\":\"build.md\"}]}\n\n",
        );
        let mock = fixture.mock_stream(body, 200).await;

        let transport = Arc::new(GalayHttpTransport::new(&config(&fixture))?);
        let client = ChatClient::new(transport, config(&fixture), SessionId::new("session_1"));
        let mut surface = MemorySurface::default();
        let actual = client.send_message("如何构建？", &mut surface).await?;

        mock.assert_async().await;
        assert_eq!(actual.html, "<h2>构建</h2><p>运行 <code>make</code></p>");
        assert_eq!(surface.html, actual.html);
        assert_eq!(surface.source_updates, 1);
        assert!(!actual.used_fallback);
        Ok(())
    }

    #[tokio::test]
    async fn test_client_surfaces_http_error_detail() -> anyhow::Result<()> {
        let mut fixture = MockServer::new().await;
        let mock = fixture.mock_stream(r#"{"detail":"quota exceeded"}"#, 429).await;

        let transport = Arc::new(GalayHttpTransport::new(&config(&fixture))?);
        let client = ChatClient::new(transport, config(&fixture), SessionId::new("session_1"));
        let mut surface = MemorySurface::default();
        let actual = client.send_message("hi", &mut surface).await.unwrap_err();

        mock.assert_async().await;
        let expected = "quota exceeded";
        assert!(matches!(actual.downcast_ref::<Error>(), Some(Error::Http { status: 429, .. })));
        assert_eq!(actual.to_string(), expected);
        Ok(())
    }

    #[tokio::test]
    async fn test_client_falls_back_on_empty_stream() -> anyhow::Result<()> {
        let mut fixture = MockServer::new().await;
        let stream = fixture.mock_stream("data: {\"done\":true}\n\n", 200).await;
        let chat = fixture
            .mock_chat(json!({"success": true, "response": "直接回答", "session_id": "session_1"}), 200)
            .await;

        let transport = Arc::new(GalayHttpTransport::new(&config(&fixture))?);
        let client = ChatClient::new(transport, config(&fixture), SessionId::new("session_1"));
        let mut surface = MemorySurface::default();
        let actual = client.send_message("hi", &mut surface).await?;

        stream.assert_async().await;
        chat.assert_async().await;
        assert!(actual.used_fallback);
        assert_eq!(surface.html, "<p>直接回答</p>");
        Ok(())
    }
}
