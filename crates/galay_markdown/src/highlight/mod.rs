//! Span-wrapping highlighter for the languages chat answers actually carry.
//!
//! Output is escaped text with `<span class="tok-…">` wrappers. Removing the
//! tags and unescaping always gives back the input.

mod cpp;
mod shell;

use crate::html::escape_html;

/// Token classes, rendered as `tok-<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Comment,
    String,
    Keyword,
    Type,
    Function,
    Number,
    Preprocessor,
    Builtin,
    Variable,
}

impl Token {
    pub fn class(self) -> &'static str {
        match self {
            Self::Comment => "tok-comment",
            Self::String => "tok-string",
            Self::Keyword => "tok-keyword",
            Self::Type => "tok-type",
            Self::Function => "tok-function",
            Self::Number => "tok-number",
            Self::Preprocessor => "tok-preprocessor",
            Self::Builtin => "tok-builtin",
            Self::Variable => "tok-variable",
        }
    }
}

/// Highlighter families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Cpp,
    Bash,
    Cmake,
    Plain,
}

impl Language {
    pub fn from_label(label: &str) -> Self {
        match normalize_language(label).as_str() {
            "cpp" | "c" => Self::Cpp,
            "bash" => Self::Bash,
            "cmake" => Self::Cmake,
            _ => Self::Plain,
        }
    }
}

/// Canonical label shown in the code header.
pub fn normalize_language(label: &str) -> String {
    let label = label.trim().to_lowercase();
    match label.as_str() {
        "" => "text".to_string(),
        "c++" | "cc" | "cxx" | "hpp" | "h" => "cpp".to_string(),
        "sh" | "zsh" | "shell" => "bash".to_string(),
        _ => label,
    }
}

/// Highlights `code` for the given language label.
pub fn highlight(code: &str, language: &str) -> String {
    match Language::from_label(language) {
        Language::Cpp => cpp::highlight(code),
        Language::Bash => shell::highlight_bash(code),
        Language::Cmake => shell::highlight_cmake(code),
        Language::Plain => escape_html(code),
    }
}

/// Accumulates escaped output.
#[derive(Debug, Default)]
pub(crate) struct SpanWriter {
    out: String,
}

impl SpanWriter {
    pub(crate) fn plain(&mut self, text: &str) {
        self.out.push_str(&escape_html(text));
    }

    pub(crate) fn token(&mut self, token: Token, text: &str) {
        if text.is_empty() {
            return;
        }
        self.out.push_str("<span class=\"");
        self.out.push_str(token.class());
        self.out.push_str("\">");
        self.out.push_str(&escape_html(text));
        self.out.push_str("</span>");
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}
