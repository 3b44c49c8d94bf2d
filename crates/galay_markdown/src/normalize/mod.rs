//! Recovery of Markdown damaged by token streaming.
//!
//! Passes run in a fixed order, each over the output of the previous one:
//! inline fence repair, prose rewrites outside fences, synthetic fences for
//! unfenced code, fence sanitation, reflow of collapsed code and removal of
//! empty fences. The result is stable: normalizing it again changes nothing
//! for well-formed input.

mod fence;
mod matchers;
mod plain;
mod recover;
mod reflow;

use lazy_static::lazy_static;
use regex::Regex;

pub use fence::{drop_empty_fences, repair_inline_fences};
pub use matchers::{
    CODE_LINE_MATCHERS, CodeLineMatcher, LANGUAGE_MATCHERS, LanguageMatcher, LineFacts,
    code_line_rule, guess_code_language, looks_like_code_line, looks_like_shell_command,
};
pub use plain::{normalize_outside_fences, normalize_plain_segment};
pub use recover::{canonicalize_code_blocks, sanitize_fenced_blocks};
pub use reflow::{reflow_code, reflow_fenced_blocks};

lazy_static! {
    static ref ZERO_WIDTH: Regex = Regex::new(r"[\x{200b}-\x{200f}\x{feff}]").unwrap();
    static ref TRAILING_SPACE: Regex = Regex::new(r"[ \t]+\n").unwrap();
    static ref BLANK_RUN: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Normalizes raw model output into Markdown the block parser understands.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = ZERO_WIDTH.replace_all(&text, "");

    let text = repair_inline_fences(&text);
    let text = normalize_outside_fences(&text);
    let text = canonicalize_code_blocks(&text);
    let text = sanitize_fenced_blocks(&text);
    let text = reflow_fenced_blocks(&text);
    let text = drop_empty_fences(&text);

    let text = TRAILING_SPACE.replace_all(&text, "\n");
    let text = BLANK_RUN.replace_all(&text, "\n\n");
    text.trim().to_string()
}
