//! Line-oriented recovery: synthetic fences around unfenced code runs and
//! cleanup of prose that ended up inside real fences.

use lazy_static::lazy_static;
use regex::Regex;

use super::fence::{fence_language, fence_token, is_fence_close, is_fence_line, replace_until_stable};
use super::matchers::{
    SHELL_LINE, find_inline_code_start, guess_code_language, is_code_line_for_language,
    is_explanatory_line, language_hint, looks_like_code_line, looks_like_shell_command,
    split_command_and_prose,
};

lazy_static! {
    static ref TAGGED_FENCE: Regex = Regex::new(r"^```[A-Za-z0-9_-]+\s*$").unwrap();
    static ref GIT_THEN_CD: Regex = Regex::new(r"(?i)(\.git)(cd\s+)").unwrap();
    static ref SUBSHELL_THEN_COMMAND: Regex = Regex::new(
        r"(?i)(\$\([^)]+\))(sudo\b|make\b|cmake\b|cd\b|git\b|\./|nc\b|telnet\b)"
    )
    .unwrap();
    static ref GLUED_SUDO_MAKE: Regex = Regex::new(r"(?i)(\S)(sudo\s+make\b)").unwrap();
    static ref CD_THEN_CMAKE: Regex = Regex::new(r"(?i)(\bcd\s+\S*?)(cmake\s+\.\.)").unwrap();
    static ref AND_THEN: Regex = Regex::new(r"&&[ \t]*(\S)").unwrap();
    static ref INCLUDE_THEN_DECL: Regex = Regex::new(
        r"(?i)(#include\s*<[^>]+>)[ \t]*(#include|int\s+main\s*\(|template\s*<|class\s+\w+|struct\s+\w+)"
    )
    .unwrap();
    static ref STATEMENT_THEN_DECL: Regex = Regex::new(
        r"([;{}])[ \t]*(#include|int\s+main\s*\(|template\s*<|class\s+\w+|struct\s+\w+|return\b)"
    )
    .unwrap();
    static ref CPP_HINT_PREFIX: Regex = Regex::new(r"(?i)^(?:cpp|c\+\+)\s*(#include\b)").unwrap();
}

/// Wraps unfenced code runs in synthetic fences and splits prose lines that
/// turn into code mid-line.
pub fn canonicalize_code_blocks(text: &str) -> String {
    let mut recovery = Recovery::default();
    for line in text.split('\n') {
        recovery.line(line);
    }
    recovery.finish()
}

#[derive(Debug, Default)]
struct Recovery {
    output: Vec<String>,
    in_fence: bool,
    synthetic: bool,
    pending_hint: Option<&'static str>,
}

impl Recovery {
    fn line(&mut self, raw: &str) {
        let line = raw.trim_end();
        let stripped = line.trim();
        let token = fence_token(stripped);

        if is_fence_line(token) {
            self.fence(token);
            return;
        }
        if self.in_fence {
            self.output.push(line.to_string());
            return;
        }
        if stripped.is_empty() {
            self.close_synthetic();
            self.pending_hint = None;
            self.output.push(String::new());
            return;
        }

        if let Some(hint) = language_hint(stripped)
            && !self.synthetic
        {
            self.pending_hint = Some(hint);
            return;
        }

        if let Some(start) = find_inline_code_start(stripped) {
            let prose = stripped[..start].trim();
            let code = stripped[start..].trim();
            if !prose.is_empty() {
                self.close_synthetic();
                self.flush_hint();
                self.output.push(prose.to_string());
            }
            self.code(code);
            return;
        }

        if looks_like_code_line(stripped) {
            self.code(stripped);
            return;
        }

        self.close_synthetic();
        self.flush_hint();
        self.output.push(stripped.to_string());
    }

    fn fence(&mut self, token: &str) {
        if self.synthetic {
            self.close_synthetic();
            self.pending_hint = None;
            if !is_fence_close(token) {
                self.output.push(token.to_string());
                self.in_fence = true;
            }
            return;
        }

        if !self.in_fence {
            self.pending_hint = None;
            let opener = if TAGGED_FENCE.is_match(token) { token } else { "```" };
            self.output.push(opener.to_string());
            self.in_fence = true;
            return;
        }

        if is_fence_close(token) {
            self.output.push("```".to_string());
            self.in_fence = false;
            self.pending_hint = None;
            return;
        }

        // A tagged fence inside an open fence keeps only its tag as text.
        let nested = fence_language(token);
        if !nested.is_empty() {
            self.output.push(nested);
        }
    }

    fn code(&mut self, code: &str) {
        if !self.synthetic {
            let language = self
                .pending_hint
                .unwrap_or_else(|| guess_code_language(code));
            self.output.push(format!("```{language}"));
            self.synthetic = true;
        }
        self.pending_hint = None;
        self.output
            .extend(split_compact_code_line(code).into_iter().map(|line| strip_language_prefix(&line)));
    }

    fn close_synthetic(&mut self) {
        if self.synthetic {
            self.output.push("```".to_string());
            self.synthetic = false;
        }
    }

    fn flush_hint(&mut self) {
        if let Some(hint) = self.pending_hint.take() {
            self.output.push(hint.to_string());
        }
    }

    fn finish(mut self) -> String {
        self.close_synthetic();
        self.flush_hint();
        self.output.join("\n")
    }
}

/// Splits a line of glued statements or commands into separate lines.
pub(crate) fn split_compact_code_line(line: &str) -> Vec<String> {
    let stripped = line.trim();
    if stripped.is_empty() {
        return vec![String::new()];
    }

    let normalized = if looks_like_shell_command(stripped) {
        let text = GIT_THEN_CD.replace_all(stripped, "${1}\n${2}");
        let text = SUBSHELL_THEN_COMMAND.replace_all(&text, "${1}\n${2}");
        let text = replace_until_stable(&text, &GLUED_SUDO_MAKE, "${1}\n${2}");
        let text = CD_THEN_CMAKE.replace_all(&text, "${1}\n${2}");
        replace_until_stable(&text, &AND_THEN, "&&\n${1}")
    } else {
        let text = replace_until_stable(stripped, &INCLUDE_THEN_DECL, "${1}\n${2}");
        replace_until_stable(&text, &STATEMENT_THEN_DECL, "${1}\n${2}")
    };

    normalized
        .split('\n')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Drops a language word glued in front of code, as in `cpp #include <x>` or
/// `bash git status`.
fn strip_language_prefix(line: &str) -> String {
    if let Some(captures) = CPP_HINT_PREFIX.captures(line)
        && let Some(whole) = captures.get(0)
    {
        return format!("{}{}", &captures[1], &line[whole.end()..]);
    }

    let lowered = line.to_ascii_lowercase();
    for prefix in ["bash", "shell"] {
        if lowered.starts_with(prefix) {
            let rest = line[prefix.len()..].trim_start();
            if !rest.is_empty() && SHELL_LINE.is_match(rest) {
                return rest.to_string();
            }
        }
    }
    line.to_string()
}

/// Hoists lead-in prose out of fences and unwraps fences holding no code.
pub fn sanitize_fenced_blocks(text: &str) -> String {
    let mut output: Vec<String> = Vec::new();
    let mut fence: Option<(String, Vec<String>)> = None;

    for line in text.split('\n') {
        let token = fence_token(line);
        if is_fence_line(token) {
            match fence.take() {
                None => fence = Some((fence_language(token), Vec::new())),
                Some((language, body)) if is_fence_close(token) => {
                    emit_sanitized(&mut output, &language, body);
                }
                Some((language, mut body)) => {
                    body.push(token.to_string());
                    fence = Some((language, body));
                }
            }
            continue;
        }

        match fence.as_mut() {
            Some((_, body)) => body.push(line.trim_end().to_string()),
            None => output.push(line.to_string()),
        }
    }

    if let Some((language, body)) = fence {
        emit_sanitized(&mut output, &language, body);
    }
    output.join("\n")
}

fn emit_sanitized(output: &mut Vec<String>, language: &str, body: Vec<String>) {
    let (prose, code) = sanitize_block(body, language);
    output.extend(prose);
    if !code.is_empty() {
        output.push(format!("```{language}"));
        output.extend(code);
        output.push("```".to_string());
    }
}

/// Returns `(prose, code)` for one fence body.
fn sanitize_block(mut lines: Vec<String>, language: &str) -> (Vec<String>, Vec<String>) {
    let mut prose = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let current = lines[index].trim().to_string();
        if current.is_empty() {
            index += 1;
            continue;
        }
        if let Some((command, lead_in)) = split_command_and_prose(&current) {
            prose.push(lead_in);
            lines[index] = command;
            break;
        }
        if is_code_line_for_language(&current, language) {
            break;
        }
        if is_explanatory_line(&current) {
            prose.push(current);
            index += 1;
            continue;
        }
        break;
    }

    let mut code: Vec<String> = lines.split_off(index);
    while code.first().is_some_and(|line| line.trim().is_empty()) {
        code.remove(0);
    }
    while code.last().is_some_and(|line| line.trim().is_empty()) {
        code.pop();
    }

    let has_code = code
        .iter()
        .filter(|line| !line.trim().is_empty())
        .any(|line| is_code_line_for_language(line, language));
    if !has_code {
        prose.extend(code.into_iter().filter(|line| !line.trim().is_empty()));
        return (prose, Vec::new());
    }
    (prose, code)
}
