//! Heading rendering.

use crate::inline::render_inline_content;
use crate::style::{BlockStyler, InlineStyler};

/// Render a heading. Empty text renders nothing.
pub fn render_heading<S: InlineStyler + BlockStyler>(level: u8, content: &str, styler: &S) -> String {
    let content = content.trim();
    if content.is_empty() {
        return String::new();
    }
    styler.heading(level, &render_inline_content(content, styler))
}

/// Render paragraph-like text, one inline-rendered entry per non-blank line.
pub fn render_lines<S: InlineStyler>(content: &str, styler: &S) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| render_inline_content(line, styler))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::html::HtmlStyler;

    #[test]
    fn test_heading_level_is_clamped() {
        assert_eq!(render_heading(9, "Deep", &HtmlStyler), "<h6>Deep</h6>");
        assert_eq!(render_heading(0, "Top", &HtmlStyler), "<h1>Top</h1>");
    }

    #[test]
    fn test_blank_heading_renders_nothing() {
        assert_eq!(render_heading(2, "  ", &HtmlStyler), "");
    }

    #[test]
    fn test_render_lines_skips_blank_lines() {
        let actual = render_lines("a\n\n  **b**  \n", &HtmlStyler);
        assert_eq!(actual, vec!["a".to_string(), "<strong>b</strong>".to_string()]);
    }
}
