//! Galay Markdown - Markdown to HTML for streamed chat answers.
//!
//! Model output arrives token by token and is often damaged on the way:
//! fences glued to prose, commands run together, numbered items on one line.
//! This crate repairs such text ([`normalize`]), parses it into [`Block`]s
//! ([`parse_blocks`]) and renders HTML fragments with highlighted code
//! ([`render_blocks`]).
//!
//! # Example
//!
//! ```
//! let html = galay_markdown::render_markdown("## 安装\n```sh\ncmake -S . -B build\n```");
//! assert!(html.starts_with("<h2>安装</h2>"));
//! assert!(html.contains("data-lang=\"bash\""));
//! ```

mod code;
mod heading;
pub mod highlight;
mod html;
mod inline;
mod list;
pub mod normalize;
mod parser;
mod renderer;
mod style;

pub use code::CodeHighlighter;
use galay_domain::Block;
pub use highlight::{highlight, normalize_language};
pub use html::{HtmlStyler, escape_html};
pub use inline::{InlineElement, InlineParser, render_inline_content, render_inline_elements};
pub use normalize::normalize;
pub use parser::{BlockParser, parse_blocks};
pub use renderer::{Renderer, render_sources};
pub use style::{BlockStyler, InlineStyler};

/// Renders blocks with the default HTML styler.
pub fn render_blocks(blocks: &[Block]) -> String {
    Renderer::<HtmlStyler>::default().render_blocks(blocks)
}

/// Renders one line of inline markdown.
pub fn render_inline(text: &str) -> String {
    render_inline_content(text, &HtmlStyler)
}

/// Normalizes, parses and renders raw answer text.
pub fn render_markdown(text: &str) -> String {
    render_blocks(&parse_blocks(&normalize(text)))
}
