use thiserror::Error;

/// Failures the chat client distinguishes when deciding on fallback and on
/// what to show the user.
#[derive(Debug, Error)]
pub enum Error {
    #[error("连接 AI 服务超时")]
    ConnectTimeout { timeout_ms: u64 },

    #[error("AI 响应超时，请稍后重试")]
    IdleTimeout { timeout_ms: u64 },

    #[error("{detail}")]
    Http { status: u16, detail: String },

    #[error("{0}")]
    Transport(String),

    #[error("AI 流式响应不可用")]
    StreamUnavailable,

    #[error("Invalid chat service url: {0}")]
    InvalidUrl(String),
}

impl Error {
    pub fn is_connect_timeout(&self) -> bool {
        matches!(self, Self::ConnectTimeout { .. })
    }
}

pub type Result<A> = std::result::Result<A, Error>;
