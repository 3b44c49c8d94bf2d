//! Offline stand-in for the chat service.
//!
//! Replays built-in sample answers the way the service streams them: growing
//! `partial` replace frames, then the canonical answer, then `done`.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use galay_domain::{Block, ChatRequest, SourceRef};
use galay_markdown::parse_blocks;
use galay_stream::{ChatTransport, TransportResponse};
use serde_json::json;

pub const SESSION_ID: &str = "local-preview-session";
const FRAME_INTERVAL: Duration = Duration::from_millis(30);
const MIN_BREAK_CHUNK: usize = 20;
const MAX_CHUNK: usize = 56;

const RAW_CMAKE_STREAM: &str = "1. 环境要求：- C++20 编译器（GCC 11+/Clang 14+）- CMake 3.20+ 构建系统2. 安装步骤：git clone https://github.com/galay/galay.git 使用 CMake 构建：cmake -S . -B build cmake --build build -j 3. 编译运行命令：g++ -std=c++20 main.cpp -o demo ./demo";
const RAW_CMAKE: &str = "## 环境要求\n- C++20 编译器（GCC 11+/Clang 14+）\n- CMake 3.20+ 构建系统\n## 安装步骤\n```bash\ngit clone https://github.com/galay/galay.git\n```\n使用 CMake 构建：\n```bash\ncmake -S . -B build\ncmake --build build -j\n```\n## 编译运行命令\n```bash\ng++ -std=c++20 main.cpp -o demo ./demo\n```";
const FINAL_CMAKE: &str = "## 环境要求\n- C++20 编译器（GCC 11+/Clang 14+）\n- CMake 3.20+ 构建系统\n## 安装步骤\n```bash\ngit clone https://github.com/galay/galay.git\n```\n使用 CMake 构建：\n```bash\ncmake -S . -B build\ncmake --build build -j\n```";
const QUOTED_FENCE: &str = "\"```bash\"\npython3 -m venv .venv\nsource .venv/bin/activate\npip install -r requirements.txt\n\"```\"";
const REPEATED_OL: &str = "1. 第一项：环境要求\n1. 第二项：安装命令\n1. 第三项：最小示例\n1. 第四项：运行验证";
const CPP_BASH_MIX: &str = "## 最小示例\n```cpp\n#include <iostream>\nint main() {\n    std::cout << \"hello\" << std::endl;\n    return 0;\n}\n```\n## 编译运行命令\n```bash\ng++ -std=c++20 main.cpp -o demo\n./demo\n```";

pub const HELP_TEXT: &str = "本地格式验证命令：\n- `:case raw_cmake`：模拟脏流式文本，并在结束用 replace 覆盖为规范结果\n- `:case final_cmake`：直接返回规范 Markdown\n- `:case quoted_fence`：测试引号包裹 fence\n- `:case repeated_ol`：测试连续 1. 有序列表渲染\n- `:case cpp_bash_mix`：测试 C++/Bash 代码块与高亮\n- `:raw 你的文本`：原样回显你输入的文本";

/// A named sample: the canonical answer and, optionally, the damaged text
/// streamed before it.
struct Case {
    name: &'static str,
    answer: &'static str,
    stream_text: Option<&'static str>,
}

const CASES: &[Case] = &[
    Case { name: "raw_cmake", answer: RAW_CMAKE, stream_text: Some(RAW_CMAKE_STREAM) },
    Case { name: "final_cmake", answer: FINAL_CMAKE, stream_text: None },
    Case { name: "quoted_fence", answer: QUOTED_FENCE, stream_text: None },
    Case { name: "repeated_ol", answer: REPEATED_OL, stream_text: None },
    Case { name: "cpp_bash_mix", answer: CPP_BASH_MIX, stream_text: None },
];

pub fn sources() -> Vec<SourceRef> {
    vec![SourceRef::new("local-mock", "offline://sample.md", "sample.md")]
}

/// What the mock answers to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockOutput {
    pub answer: String,
    pub stream_text: String,
    pub blocks: Vec<Block>,
}

impl MockOutput {
    fn new(answer: impl Into<String>, stream_text: impl Into<String>) -> Self {
        let answer = answer.into();
        let blocks = parse_blocks(&answer);
        Self { answer, stream_text: stream_text.into(), blocks }
    }

    /// Resolves `:help`, `:case <name>`, `:raw <text>` and plain echoes.
    pub fn resolve(message: &str) -> Self {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Self::new("（空输入）", "");
        }
        if trimmed == ":help" {
            return Self::new(HELP_TEXT, HELP_TEXT);
        }
        if let Some(key) = case_key(trimmed) {
            let key = key.to_lowercase();
            return match CASES.iter().find(|case| case.name == key) {
                Some(case) => Self::new(case.answer, case.stream_text.unwrap_or(case.answer)),
                None => Self::new(
                    format!("未找到样例：{key}\n\n可先发送 :help 查看命令。"),
                    format!("未找到样例：{key}"),
                ),
            };
        }
        if trimmed.starts_with(":raw ")
            && let Some(start) = message.find(":raw ")
        {
            let literal = &message[start + ":raw ".len()..];
            return Self::new(literal, literal);
        }
        Self::new(message, message)
    }

    /// SSE body: one partial replace per chunk, the final replace, then done.
    pub fn frames(&self) -> Vec<String> {
        let mut frames = Vec::new();
        let mut partial = String::new();
        for chunk in split_stream_chunks(&self.stream_text) {
            partial.push_str(&chunk);
            frames.push(json!({
                "replace": partial,
                "blocks": parse_blocks(&partial),
                "partial": true,
            }));
        }
        frames.push(json!({"replace": self.answer, "blocks": self.blocks}));
        frames.push(json!({"done": true, "sources": sources(), "blocks": self.blocks}));

        frames.into_iter().map(|frame| format!("data: {frame}\n\n")).collect()
    }

    /// JSON body of the non-streaming endpoint.
    pub fn reply(&self) -> serde_json::Value {
        json!({
            "success": true,
            "response": self.answer,
            "blocks": self.blocks,
            "sources": sources(),
            "session_id": SESSION_ID,
        })
    }
}

/// `:case <name>` where the name is ASCII alphanumeric, `_` or `-`.
fn case_key(trimmed: &str) -> Option<&str> {
    let rest = trimmed.strip_prefix(":case")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let key = rest.trim_start();
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then_some(key)
}

/// Cuts text into stream chunks: after sentence punctuation once a chunk has
/// 20 characters, or at 56 characters.
pub fn split_stream_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for c in text.chars() {
        current.push(c);
        count += 1;
        let breaks = matches!(c, '\n' | '。' | '！' | '？' | '!' | '?' | '；' | ';');
        if (count >= MIN_BREAK_CHUNK && breaks) || count >= MAX_CHUNK {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// [`ChatTransport`] answering from [`MockOutput`] without a network.
#[derive(Debug, Clone)]
pub struct LocalMockTransport {
    interval: Duration,
}

impl Default for LocalMockTransport {
    fn default() -> Self {
        Self { interval: FRAME_INTERVAL }
    }
}

impl LocalMockTransport {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

#[async_trait]
impl ChatTransport for LocalMockTransport {
    async fn stream(&self, request: &ChatRequest) -> anyhow::Result<TransportResponse> {
        let interval = self.interval;
        let frames = MockOutput::resolve(&request.message).frames();
        let body = futures::stream::iter(frames)
            .then(move |frame| async move {
                tokio::time::sleep(interval).await;
                Ok(Bytes::from(frame))
            })
            .boxed();
        Ok(TransportResponse::new(
            200,
            Some("text/event-stream; charset=utf-8".to_string()),
            body,
        ))
    }

    async fn send(&self, request: &ChatRequest) -> anyhow::Result<TransportResponse> {
        let reply = MockOutput::resolve(&request.message).reply();
        Ok(TransportResponse::full(
            200,
            "application/json; charset=utf-8",
            reply.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use galay_domain::{ChatConfig, ChatReply, SessionId};
    use galay_markdown::render_blocks;
    use galay_stream::{ChatClient, MemorySurface};
    use pretty_assertions::assert_eq;

    use super::*;

    fn client() -> ChatClient<LocalMockTransport> {
        ChatClient::new(
            Arc::new(LocalMockTransport::default()),
            ChatConfig::default(),
            SessionId::new("s"),
        )
    }

    #[test]
    fn test_chunks_break_on_punctuation_after_twenty_chars() {
        let fixture = format!("{}。{}", "甲".repeat(19), "乙".repeat(3));
        let actual = split_stream_chunks(&fixture);
        let expected = vec![format!("{}。", "甲".repeat(19)), "乙".repeat(3)];
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_chunks_ignore_early_punctuation_and_cap_at_56() {
        let fixture = format!("短句。{}", "x".repeat(60));
        let actual = split_stream_chunks(&fixture);
        assert_eq!(actual.len(), 2);
        assert_eq!(actual[0].chars().count(), 56);
        assert_eq!(actual.concat(), fixture);
    }

    #[test]
    fn test_resolve_commands() {
        assert_eq!(MockOutput::resolve("  ").answer, "（空输入）");
        assert_eq!(MockOutput::resolve("  ").stream_text, "");
        assert_eq!(MockOutput::resolve(":help").answer, HELP_TEXT);
        assert_eq!(MockOutput::resolve(":raw  ## 原样").answer, " ## 原样");
        assert_eq!(MockOutput::resolve("你好").answer, "你好");
    }

    #[test]
    fn test_resolve_cases() {
        let actual = MockOutput::resolve(":case RAW_CMAKE");
        assert_eq!(actual.answer, RAW_CMAKE);
        assert_eq!(actual.stream_text, RAW_CMAKE_STREAM);

        let actual = MockOutput::resolve(":case repeated_ol");
        assert_eq!(actual.stream_text, REPEATED_OL);
        assert_eq!(actual.blocks, vec![Block::ordered(1, ["第一项：环境要求", "第二项：安装命令", "第三项：最小示例", "第四项：运行验证"])]);
    }

    #[test]
    fn test_unknown_case() {
        let actual = MockOutput::resolve(":case nope");
        assert_eq!(actual.answer, "未找到样例：nope\n\n可先发送 :help 查看命令。");
        assert_eq!(actual.stream_text, "未找到样例：nope");
    }

    #[test]
    fn test_frames_end_with_replace_then_done() {
        let fixture = MockOutput::resolve(":case final_cmake");
        let actual = fixture.frames();
        let chunks = split_stream_chunks(FINAL_CMAKE).len();

        assert_eq!(actual.len(), chunks + 2);
        assert!(actual[0].contains("\"partial\":true"));
        assert!(!actual[chunks].contains("partial"));
        assert!(actual[chunks + 1].contains("\"done\":true"));
        assert!(actual.iter().all(|frame| frame.starts_with("data: ") && frame.ends_with("\n\n")));
    }

    #[test]
    fn test_reply_shape() {
        let fixture = MockOutput::resolve(":case quoted_fence").reply();
        let actual: ChatReply = serde_json::from_value(fixture).unwrap();
        assert_eq!(actual.success, Some(true));
        assert_eq!(actual.response, QUOTED_FENCE);
        assert_eq!(actual.session_id.as_deref(), Some(SESSION_ID));
        assert_eq!(actual.sources(), sources().as_slice());
    }

    #[tokio::test(start_paused = true)]
    async fn test_streamed_case_settles_on_canonical_blocks() {
        let mut surface = MemorySurface::default();
        let actual = client().send_message(":case raw_cmake", &mut surface).await.unwrap();

        let expected = render_blocks(&parse_blocks(RAW_CMAKE));
        assert_eq!(actual.text, RAW_CMAKE);
        assert_eq!(surface.html, expected);
        assert_eq!(surface.sources, sources());
        assert_eq!(surface.source_updates, 1);
        assert!(!actual.used_fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_input_streams_placeholder() {
        let mut surface = MemorySurface::default();
        let actual = client().send_message("", &mut surface).await.unwrap();
        assert_eq!(actual.html, "<p>（空输入）</p>");
    }
}
