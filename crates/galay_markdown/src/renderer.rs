//! Block renderer producing HTML fragments.

use galay_domain::{Block, SourceRef};

use crate::code::CodeHighlighter;
use crate::heading::{render_heading, render_lines};
use crate::html::{HtmlStyler, escape_html};
use crate::list::render_list;
use crate::style::{BlockStyler, InlineStyler};

/// Renders blocks with a styler for the markup and a highlighter for code.
#[derive(Debug, Clone, Default)]
pub struct Renderer<S = HtmlStyler> {
    styler: S,
    highlighter: CodeHighlighter,
}

impl<S: InlineStyler + BlockStyler> Renderer<S> {
    pub fn new(styler: S) -> Self {
        Self { styler, highlighter: CodeHighlighter::default() }
    }

    pub fn with_highlighter(mut self, highlighter: CodeHighlighter) -> Self {
        self.highlighter = highlighter;
        self
    }

    pub fn render_blocks(&self, blocks: &[Block]) -> String {
        blocks.iter().map(|block| self.render_block(block)).collect()
    }

    pub fn render_block(&self, block: &Block) -> String {
        match block {
            Block::Heading { level, text } => render_heading(*level, text, &self.styler),
            Block::Paragraph { text } => {
                let lines = render_lines(text, &self.styler);
                if lines.is_empty() {
                    String::new()
                } else {
                    self.styler.paragraph(&lines)
                }
            }
            Block::Blockquote { text } => {
                let lines = render_lines(text, &self.styler);
                if lines.is_empty() {
                    String::new()
                } else {
                    self.styler.blockquote(&lines)
                }
            }
            Block::List { ordered, start, items } => render_list(*ordered, *start, items, &self.styler),
            Block::Code { language, code } => self.highlighter.render(language, code),
            Block::HorizontalRule => self.styler.rule(),
        }
    }
}

/// Citation strip shown under an answer. No sources render nothing.
pub fn render_sources(sources: &[SourceRef]) -> String {
    if sources.is_empty() {
        return String::new();
    }

    let items = sources
        .iter()
        .map(|source| {
            format!(
                "<span class=\"source-tag\" title=\"{}\">{} / {}</span>",
                escape_html(&source.file),
                escape_html(&source.project),
                escape_html(&source.file_name)
            )
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!("<div class=\"sources-content\"><small>引用来源：{items}</small></div>")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(blocks: &[Block]) -> String {
        Renderer::<HtmlStyler>::default().render_blocks(blocks)
    }

    #[test]
    fn test_render_each_block_kind() {
        let fixture = vec![
            Block::heading(2, "安装 **CMake**"),
            Block::paragraph("line one\nline `two`"),
            Block::blockquote("note"),
            Block::unordered(["a", "b"]),
            Block::HorizontalRule,
        ];
        insta::assert_snapshot!(render(&fixture), @"<h2>安装 <strong>CMake</strong></h2><p>line one<br>line <code>two</code></p><blockquote>note</blockquote><ul><li>a</li><li>b</li></ul><hr>");
    }

    #[test]
    fn test_blank_paragraph_renders_nothing() {
        assert_eq!(render(&[Block::paragraph("  \n ")]), "");
    }

    #[test]
    fn test_script_never_reaches_output() {
        let fixture = vec![
            Block::paragraph("<script>alert(\"x\")</script>"),
            Block::heading(1, "<script>"),
            Block::unordered(["<script>"]),
            Block::code("<script>", "<script>\"x\"</script>"),
        ];
        let actual = render(&fixture);
        assert!(!actual.contains("<script>"));
        assert!(!actual.contains("\"x\""));
    }

    #[test]
    fn test_mixed_language_code_blocks_in_order() {
        let fixture = vec![
            Block::code("cpp", "int main() {}"),
            Block::paragraph("then"),
            Block::code("sh", "cmake --build build"),
        ];
        let actual = render(&fixture);
        assert_eq!(actual.matches("class=\"code-block\"").count(), 2);
        let cpp = actual.find("class=\"code-lang\">cpp</span>").unwrap();
        let bash = actual.find("class=\"code-lang\">bash</span>").unwrap();
        assert!(cpp < bash);
    }

    #[test]
    fn test_render_sources() {
        let fixture = vec![
            SourceRef::new("galay-kernel", "docs/a.md", "a.md"),
            SourceRef::new("local", "<b>", "b"),
        ];
        insta::assert_snapshot!(render_sources(&fixture), @r#"<div class="sources-content"><small>引用来源：<span class="source-tag" title="docs/a.md">galay-kernel / a.md</span> <span class="source-tag" title="&lt;b&gt;">local / b</span></small></div>"#);
    }

    #[test]
    fn test_no_sources_render_nothing() {
        assert_eq!(render_sources(&[]), "");
    }
}
