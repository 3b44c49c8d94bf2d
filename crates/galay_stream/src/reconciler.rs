use galay_domain::{Block, FrameEvent, SourceRef, StreamFrame};
use galay_markdown::{render_blocks, render_markdown};
use tracing::{debug, warn};

use crate::sse::SseBuffer;
use crate::state::StreamState;
use crate::surface::Surface;

/// Fixed answer shown when the server reports an error inside the stream.
pub const STREAM_ERROR_APOLOGY: &str = "抱歉，生成回答时出错了。";

/// Whether the caller should keep reading the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// A terminal frame was applied. Buffered frames after it are discarded
    /// and the transport should be dropped.
    Complete,
}

/// Maps the frames of one message's stream onto an evolving rendered answer.
#[derive(Debug, Default)]
pub struct StreamReconciler {
    state: StreamState,
    buffer: SseBuffer,
    text: String,
    html: String,
    sources: Vec<SourceRef>,
    rendered_blocks: bool,
    errored: bool,
}

impl StreamReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn advance(&mut self, next: StreamState) {
        self.state.advance(next);
    }

    /// Accumulated plain answer text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn sources(&self) -> &[SourceRef] {
        &self.sources
    }

    /// True once anything visible was rendered: non-blank text or non-empty
    /// server blocks.
    pub fn got_content(&self) -> bool {
        !self.text.trim().is_empty() || self.rendered_blocks || self.errored
    }

    /// True when the stream ended with an error frame.
    pub fn errored(&self) -> bool {
        self.errored
    }

    /// Feeds one network chunk.
    pub fn consume<S: Surface>(&mut self, chunk: &[u8], surface: &mut S) -> Flow {
        if self.state.is_terminal() {
            return Flow::Complete;
        }
        for payload in self.buffer.push(chunk) {
            if self.apply_payload(&payload, surface) == Flow::Complete {
                return Flow::Complete;
            }
        }
        Flow::Continue
    }

    /// Applies whatever the transport left unterminated and marks the stream
    /// complete.
    pub fn finish<S: Surface>(&mut self, surface: &mut S) -> Flow {
        if !self.state.is_terminal() {
            for payload in self.buffer.finish() {
                if self.apply_payload(&payload, surface) == Flow::Complete {
                    break;
                }
            }
        }
        self.advance(StreamState::Completed);
        Flow::Complete
    }

    fn apply_payload<S: Surface>(&mut self, payload: &str, surface: &mut S) -> Flow {
        let Some(frame) = StreamFrame::parse(payload) else {
            debug!(payload, "Skipping malformed frame");
            return Flow::Continue;
        };

        let partial = frame.is_partial();
        let events = frame.events();
        if events.is_empty() {
            debug!(payload, "Skipping frame without recognized fields");
            return Flow::Continue;
        }

        for event in events {
            let terminal = event.is_terminal();
            self.apply(event, partial, surface);
            if terminal {
                self.advance(StreamState::Completed);
                return Flow::Complete;
            }
        }
        Flow::Continue
    }

    fn apply<S: Surface>(&mut self, event: FrameEvent, partial: bool, surface: &mut S) {
        match event {
            FrameEvent::ContentDelta(delta) => {
                self.text.push_str(&delta);
                self.show(render_markdown(&self.text), surface);
            }
            FrameEvent::Replace { text, blocks } => {
                debug!(partial, length = text.len(), "Replacing answer");
                self.text = text;
                let html = match blocks {
                    Some(blocks) => self.render_server_blocks(&blocks),
                    None => render_markdown(&self.text),
                };
                self.show(html, surface);
            }
            FrameEvent::Blocks(blocks) => {
                let html = self.render_server_blocks(&blocks);
                self.show(html, surface);
            }
            FrameEvent::Done { sources, blocks } => {
                if let Some(blocks) = blocks {
                    let html = self.render_server_blocks(&blocks);
                    self.show(html, surface);
                }
                if !sources.is_empty() && self.sources.is_empty() {
                    self.sources = sources;
                    surface.sources(&self.sources);
                }
            }
            FrameEvent::Error(message) => {
                warn!(message, "Stream reported an error");
                self.errored = true;
                self.show(format!("<p>{STREAM_ERROR_APOLOGY}</p>"), surface);
            }
        }
    }

    fn render_server_blocks(&mut self, blocks: &[Block]) -> String {
        let html = render_blocks(blocks);
        self.rendered_blocks |= !html.is_empty();
        html
    }

    fn show<S: Surface>(&mut self, html: String, surface: &mut S) {
        self.html = html;
        surface.update(&self.html);
    }
}
