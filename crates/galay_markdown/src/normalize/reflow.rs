//! Reflow of code that arrived squashed onto one or two lines.

use lazy_static::lazy_static;
use regex::Regex;

use super::fence::{fence_language, is_fence_close, is_fence_line, replace_until_stable};
use crate::highlight::normalize_language;

const INDENT: &str = "    ";
const LONG_LINE: usize = 120;
const DENSE_PUNCTUATION: usize = 4;
const DIRECTIVES: &[&str] = &["#include", "#pragma", "#define", "#if", "#ifdef", "#ifndef", "#else", "#endif"];
const TOP_LEVEL: &[&str] = &["#include", "template", "class ", "struct ", "namespace ", "int main", "return"];

lazy_static! {
    static ref AND_THEN: Regex = Regex::new(r"&&[ \t]*(\S)").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Cpp,
    Shell,
}

impl Family {
    fn of(language: &str) -> Option<Self> {
        match normalize_language(language).as_str() {
            "cpp" | "c" => Some(Self::Cpp),
            "bash" => Some(Self::Shell),
            _ => None,
        }
    }

    fn punctuation(self, line: &str) -> usize {
        match self {
            Self::Cpp => line.chars().filter(|ch| matches!(ch, ';' | '{' | '}')).count(),
            Self::Shell => line.matches("&&").count() + line.matches(';').count(),
        }
    }
}

/// Rewrites the body of every C-family and shell fence.
pub fn reflow_fenced_blocks(text: &str) -> String {
    let mut output: Vec<String> = Vec::new();
    let mut open: Option<(String, Vec<&str>)> = None;

    for line in text.split('\n') {
        let token = line.trim();
        match open.take() {
            None if is_fence_line(token) => open = Some((token.to_string(), Vec::new())),
            None => output.push(line.to_string()),
            Some((opener, body)) if is_fence_close(token) => {
                let language = fence_language(&opener);
                output.push(opener);
                let code = reflow_code(&language, &body.join("\n"));
                if !code.is_empty() {
                    output.push(code);
                }
                output.push("```".to_string());
            }
            Some((opener, mut body)) => {
                body.push(line);
                open = Some((opener, body));
            }
        }
    }

    // An unterminated fence is left as it came.
    if let Some((opener, body)) = open {
        output.push(opener);
        output.extend(body.into_iter().map(str::to_string));
    }
    output.join("\n")
}

/// Splits collapsed code and re-indents it for its language family. Other
/// languages pass through.
pub fn reflow_code(language: &str, code: &str) -> String {
    let Some(family) = Family::of(language) else {
        return code.to_string();
    };

    let collapsed = is_collapsed(family, code);
    match family {
        Family::Cpp => {
            let lines = if collapsed {
                split_cpp_statements(code)
            } else {
                code.split('\n').map(str::to_string).collect()
            };
            reindent_by_braces(&lines)
        }
        Family::Shell => {
            let code = if collapsed {
                replace_until_stable(code, &AND_THEN, "&&\n${1}")
            } else {
                code.to_string()
            };
            let lines: Vec<String> = code.split('\n').map(|line| line.trim().to_string()).collect();
            trim_blank_edges(lines).join("\n")
        }
    }
}

fn is_collapsed(family: Family, code: &str) -> bool {
    let lines: Vec<&str> = code.split('\n').filter(|line| !line.trim().is_empty()).collect();
    if lines.is_empty() || lines.len() > 2 {
        return false;
    }
    let punctuation: usize = lines.iter().map(|line| family.punctuation(line)).sum();
    lines.iter().any(|line| line.chars().count() > LONG_LINE) || punctuation >= DENSE_PUNCTUATION
}

fn starts_with(chars: &[char], word: &str) -> bool {
    let mut index = 0;
    for expected in word.chars() {
        if chars.get(index) != Some(&expected) {
            return false;
        }
        index += 1;
    }
    true
}

fn flush(lines: &mut Vec<String>, current: &mut String) {
    let line = current.trim();
    if !line.is_empty() {
        lines.push(line.to_string());
    }
    current.clear();
}

/// Breaks C-family source into one statement per line. Strings and
/// parenthesized headers such as `for (;;)` are never split.
fn split_cpp_statements(code: &str) -> Vec<String> {
    let chars: Vec<char> = code.chars().collect();
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut parens = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut index = 0;

    while index < chars.len() {
        let ch = chars[index];

        if let Some(open) = quote {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            index += 1;
            continue;
        }

        let rest = &chars[index..];
        let word_start = index == 0 || matches!(chars[index - 1], ' ' | '\t' | '>' | '"');

        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '(' => {
                parens += 1;
                current.push(ch);
            }
            ')' => {
                parens = parens.saturating_sub(1);
                current.push(ch);
            }
            '\n' => flush(&mut lines, &mut current),
            ';' | '{' if parens == 0 => {
                current.push(ch);
                flush(&mut lines, &mut current);
            }
            '}' if parens == 0 => {
                flush(&mut lines, &mut current);
                current.push('}');
                let next = rest
                    .iter()
                    .skip(1)
                    .position(|candidate| !candidate.is_whitespace())
                    .map(|offset| index + 1 + offset);
                if let Some(next) = next
                    && matches!(chars[next], ';' | ',')
                {
                    current.push(chars[next]);
                    index = next;
                }
                flush(&mut lines, &mut current);
            }
            '#' if parens == 0 && DIRECTIVES.iter().any(|directive| starts_with(rest, directive)) => {
                flush(&mut lines, &mut current);
                current.push('#');
            }
            _ if parens == 0
                && word_start
                && current.trim_start().starts_with('#')
                && TOP_LEVEL.iter().any(|keyword| starts_with(rest, keyword)) =>
            {
                flush(&mut lines, &mut current);
                current.push(ch);
            }
            _ => current.push(ch),
        }
        index += 1;
    }

    flush(&mut lines, &mut current);
    lines
}

/// One indent level per unmatched `{`. Preprocessor lines stay flush left
/// and a line opening with `}` sits one level out.
fn reindent_by_braces(lines: &[String]) -> String {
    let lines = trim_blank_edges(lines.iter().map(|line| line.replace('\t', INDENT)).collect());
    let mut output = Vec::with_capacity(lines.len());
    let mut depth = 0usize;

    for line in &lines {
        let stripped = line.trim();
        if stripped.is_empty() {
            output.push(String::new());
            continue;
        }

        let level = if stripped.starts_with('}') { depth.saturating_sub(1) } else { depth };
        let indent = if stripped.starts_with('#') { String::new() } else { INDENT.repeat(level) };
        output.push(format!("{indent}{stripped}"));

        let opens = stripped.matches('{').count();
        let closes = stripped.matches('}').count();
        depth = (depth + opens).saturating_sub(closes);
    }

    output.join("\n").trim_end().to_string()
}

fn trim_blank_edges(mut lines: Vec<String>) -> Vec<String> {
    while lines.first().is_some_and(|line| line.trim().is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    lines
}
