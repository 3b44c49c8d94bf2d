//! Inline content rendering: bold, italic, inline code and links.

use crate::style::InlineStyler;

/// A parsed inline span. Text is kept raw; styling and escaping happen when
/// rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineElement {
    Text(String),
    Bold(String),
    Italic(String),
    Code(String),
    Link { text: String, url: String },
}

/// Single-pass scanner for the inline subset used in chat answers.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineParser;

impl InlineParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, content: &str) -> Vec<InlineElement> {
        let mut elements = Vec::new();
        let mut text = String::new();
        let mut rest = content;

        while let Some(ch) = rest.chars().next() {
            if let Some((element, tail)) = Self::span(rest) {
                if !text.is_empty() {
                    elements.push(InlineElement::Text(std::mem::take(&mut text)));
                }
                elements.push(element);
                rest = tail;
                continue;
            }
            text.push(ch);
            rest = &rest[ch.len_utf8()..];
        }

        if !text.is_empty() {
            elements.push(InlineElement::Text(text));
        }
        elements
    }

    /// Tries to read one styled span at the start of `rest`.
    fn span(rest: &str) -> Option<(InlineElement, &str)> {
        if let Some(after) = rest.strip_prefix('`') {
            let (code, tail) = split_once(after, "`")?;
            return (!code.is_empty()).then(|| (InlineElement::Code(code.to_string()), tail));
        }

        if let Some(after) = rest.strip_prefix("**") {
            let (inner, tail) = split_once(after, "**")?;
            return is_tight(inner).then(|| (InlineElement::Bold(inner.to_string()), tail));
        }

        if let Some(after) = rest.strip_prefix('*') {
            let (inner, tail) = split_once(after, "*")?;
            return is_tight(inner).then(|| (InlineElement::Italic(inner.to_string()), tail));
        }

        if let Some(after) = rest.strip_prefix('[') {
            let (text, after_text) = split_once(after, "](")?;
            let (url, tail) = split_once(after_text, ")")?;
            let valid = !text.is_empty()
                && !text.contains(['[', '\n'])
                && !url.is_empty()
                && !url.contains(char::is_whitespace);
            return valid.then(|| {
                (
                    InlineElement::Link { text: text.to_string(), url: url.to_string() },
                    tail,
                )
            });
        }

        None
    }
}

fn split_once<'a>(text: &'a str, delimiter: &str) -> Option<(&'a str, &'a str)> {
    text.find(delimiter)
        .map(|index| (&text[..index], &text[index + delimiter.len()..]))
}

/// Emphasis needs non-empty content that does not start or end with
/// whitespace, so `a * b * c` stays literal.
fn is_tight(inner: &str) -> bool {
    !inner.is_empty()
        && !inner.starts_with(char::is_whitespace)
        && !inner.ends_with(char::is_whitespace)
}

/// Render inline content to a string using a styler.
pub fn render_inline_content<S: InlineStyler>(content: &str, styler: &S) -> String {
    render_inline_elements(&InlineParser::new().parse(content), styler)
}

/// Render inline elements to a string using a styler.
pub fn render_inline_elements<S: InlineStyler>(elements: &[InlineElement], styler: &S) -> String {
    let mut result = String::new();
    for element in elements {
        match element {
            InlineElement::Text(text) => {
                result.push_str(&styler.text(text));
            }
            InlineElement::Bold(text) => {
                result.push_str(&styler.bold(&render_inline_content(text, styler)));
            }
            InlineElement::Italic(text) => {
                result.push_str(&styler.italic(&render_inline_content(text, styler)));
            }
            InlineElement::Code(text) => {
                result.push_str(&styler.code(text));
            }
            InlineElement::Link { text, url } => {
                result.push_str(&styler.link(&render_inline_content(text, styler), url));
            }
        }
    }

    result
}
