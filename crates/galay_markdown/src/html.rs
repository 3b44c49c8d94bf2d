//! HTML escaping and the tag styler used for chat output.

use crate::style::{BlockStyler, InlineStyler};

/// Escapes text for use in element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Link targets allowed to become anchors. Anything else renders as text.
fn is_safe_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    ["http://", "https://", "mailto:", "/", "#", "./"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// Styler producing the markup consumed by the chat widget.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlStyler;

impl InlineStyler for HtmlStyler {
    fn text(&self, text: &str) -> String {
        escape_html(text)
    }

    fn bold(&self, inner: &str) -> String {
        format!("<strong>{inner}</strong>")
    }

    fn italic(&self, inner: &str) -> String {
        format!("<em>{inner}</em>")
    }

    fn code(&self, text: &str) -> String {
        format!("<code>{}</code>", escape_html(text))
    }

    fn link(&self, inner: &str, url: &str) -> String {
        if is_safe_url(url) {
            format!(
                "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{inner}</a>",
                escape_html(url.trim())
            )
        } else {
            inner.to_string()
        }
    }
}

impl BlockStyler for HtmlStyler {
    fn heading(&self, level: u8, inner: &str) -> String {
        let level = level.clamp(1, 6);
        format!("<h{level}>{inner}</h{level}>")
    }

    fn paragraph(&self, lines: &[String]) -> String {
        format!("<p>{}</p>", lines.join("<br>"))
    }

    fn blockquote(&self, lines: &[String]) -> String {
        format!("<blockquote>{}</blockquote>", lines.join("<br>"))
    }

    fn list(&self, ordered: bool, start: u32, items: &[String]) -> String {
        let body: String = items.iter().map(|item| format!("<li>{item}</li>")).collect();
        match (ordered, start) {
            (true, start) if start > 1 => format!("<ol start=\"{start}\">{body}</ol>"),
            (true, _) => format!("<ol>{body}</ol>"),
            (false, _) => format!("<ul>{body}</ul>"),
        }
    }

    fn rule(&self) -> String {
        "<hr>".to_string()
    }
}
