//! Code block container with a language header and copy button.

use derive_setters::Setters;

use crate::highlight::{highlight, normalize_language};
use crate::html::escape_html;

/// Renders fenced code into the chat widget's code block markup.
#[derive(Debug, Clone, Setters)]
#[setters(into)]
pub struct CodeHighlighter {
    copy_label: String,
}

impl Default for CodeHighlighter {
    fn default() -> Self {
        Self { copy_label: "复制".to_string() }
    }
}

impl CodeHighlighter {
    /// Returns an empty string when the body has no visible content.
    pub fn render(&self, language: &str, code: &str) -> String {
        if code.trim().is_empty() {
            return String::new();
        }

        let body = code.trim_matches('\n');
        let label = escape_html(&normalize_language(language));
        let highlighted = highlight(body, &label);

        format!(
            "<div class=\"code-block\" data-lang=\"{label}\"><div class=\"code-header\"><span class=\"code-lang\">{label}</span><button class=\"code-copy\" type=\"button\">{}</button></div><pre><code class=\"language-{label}\">{highlighted}</code></pre></div>",
            escape_html(&self.copy_label)
        )
    }
}
