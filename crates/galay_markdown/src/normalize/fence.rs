//! Fence marker helpers and inline fence repair.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

const QUOTES: &[char] = &['"', '\'', '“', '”'];

lazy_static! {
    static ref FENCE_LINE: Regex = Regex::new(r"^```[A-Za-z0-9_-]*\s*$").unwrap();
    static ref FENCE_CLOSE: Regex = Regex::new(r"^```\s*$").unwrap();

    // Crosses a line break only when a quote opens the next line.
    static ref GLUED_OPEN: Regex =
        Regex::new(r#"([^\n])[ \t]*(?:\n?[“”"'])?[ \t]*```([A-Za-z0-9_-]*)"#).unwrap();
    static ref GLUED_CODE: Regex = Regex::new(r"```([A-Za-z0-9_-]+)[ \t]+(\S)").unwrap();
    static ref GLUED_CLOSE: Regex =
        Regex::new(r#"([^\n])```[“”"']?([ \t]*(?:\n|$))"#).unwrap();
    static ref QUOTE_BEFORE: Regex =
        Regex::new(r#"(^|\n)[“”"']+```([A-Za-z0-9_-]*)[ \t]*(\n|$)"#).unwrap();
    static ref QUOTE_AFTER: Regex =
        Regex::new(r#"(^|\n)```([A-Za-z0-9_-]*)[“”"']+[ \t]*(\n|$)"#).unwrap();
    static ref QUOTE_AFTER_COLON: Regex =
        Regex::new(r#"([:：])\s*[“”"']\s*(\n```[A-Za-z0-9_-]*[ \t]*\n)"#).unwrap();
}

/// Upper bound on rewrite rounds for rules whose matches can overlap.
const MAX_ROUNDS: usize = 16;

/// Applies `pattern` until the text stops changing.
pub(crate) fn replace_until_stable(text: &str, pattern: &Regex, replacement: &str) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_ROUNDS {
        match pattern.replace_all(&current, replacement) {
            Cow::Borrowed(_) => break,
            Cow::Owned(next) if next == current => break,
            Cow::Owned(next) => current = next,
        }
    }
    current
}

/// Strips decorative quotes around a trimmed line.
pub(crate) fn fence_token(line: &str) -> &str {
    line.trim().trim_start_matches(QUOTES).trim_end_matches(QUOTES)
}

pub(crate) fn is_fence_line(token: &str) -> bool {
    FENCE_LINE.is_match(token)
}

pub(crate) fn is_fence_close(token: &str) -> bool {
    FENCE_CLOSE.is_match(token)
}

/// Lowercased language tag of a fence line, empty when untagged.
pub(crate) fn fence_language(token: &str) -> String {
    token.trim_start_matches("```").trim().to_lowercase()
}

/// Puts every fence marker on its own line and removes quotes wrapped around
/// markers.
pub fn repair_inline_fences(text: &str) -> String {
    let text = GLUED_OPEN.replace_all(text, "${1}\n```${2}");
    let text = replace_until_stable(&text, &GLUED_CODE, "```${1}\n${2}");
    let text = replace_until_stable(&text, &GLUED_CLOSE, "${1}\n```${2}");
    let text = replace_until_stable(&text, &QUOTE_BEFORE, "${1}```${2}${3}");
    let text = replace_until_stable(&text, &QUOTE_AFTER, "${1}```${2}${3}");
    QUOTE_AFTER_COLON.replace_all(&text, "${1}${2}").into_owned()
}

/// Removes fenced blocks whose body is blank.
pub fn drop_empty_fences(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut output: Vec<&str> = Vec::with_capacity(lines.len());
    let mut in_fence = false;
    let mut index = 0;

    while index < lines.len() {
        let line = lines[index];
        let token = line.trim();
        index += 1;

        if !is_fence_line(token) {
            output.push(line);
            continue;
        }

        if in_fence {
            if is_fence_close(token) {
                in_fence = false;
            }
            output.push(line);
            continue;
        }

        let next = lines[index..]
            .iter()
            .position(|candidate| !candidate.trim().is_empty())
            .map(|offset| index + offset);
        match next {
            Some(close) if is_fence_close(lines[close].trim()) => index = close + 1,
            _ => {
                in_fence = true;
                output.push(line);
            }
        }
    }

    output.join("\n")
}
