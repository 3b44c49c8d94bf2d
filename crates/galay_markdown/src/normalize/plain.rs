//! Rewrites of prose outside fences: run-on headings and list items, glued
//! commands and known section titles each get their own line.

use lazy_static::lazy_static;
use regex::Regex;

use super::fence::{fence_token, is_fence_close, is_fence_line, replace_until_stable};
use super::matchers::{COMMAND_AFTER_PUNCT, NUMBERED_COMMAND, split_command_and_prose};
use crate::parser::is_rule;

lazy_static! {
    static ref RUN_ON_HEADING: Regex = Regex::new(r"([^\n#])\s*(#{1,6}\s)").unwrap();
    static ref NUMBER_AFTER_PUNCT: Regex =
        Regex::new(r"([。！？!?;；:：])\s*([1-9]\d?)\.([^\d\s])").unwrap();
    static ref NUMBER_WITHOUT_SPACE: Regex = Regex::new(r"(^|\n)([1-9]\d?)\.([^\d\s])").unwrap();
    static ref ITEM_AFTER_PUNCT: Regex = Regex::new(r"([。！？!?;；:：])\s*(\d+\.\s)").unwrap();
    static ref BULLET_AFTER_PUNCT: Regex = Regex::new(r"([。！？!?;；:：])\s*([-*]\s)").unwrap();
    static ref GLUED_BULLET: Regex =
        Regex::new(r"([\x{4e00}-\x{9fa5}A-Za-z0-9）)])-\s+").unwrap();
    static ref EMPTY_HEADING: Regex = Regex::new(r"(^|\n)(#{1,6})\s*\n(\S)").unwrap();
    static ref QUOTE_ONLY_LINE: Regex = Regex::new(r#"(?m)^[ \t]*[“”"']+[ \t]*$"#).unwrap();
    static ref INCLUDE_AFTER_COLON: Regex =
        Regex::new(r"(?i)([:：])\s*(?:cpp|c\+\+)?\s*(#include\s*<)").unwrap();
    static ref MAIN_AFTER_PUNCT: Regex = Regex::new(r"([:：。；;])\s*(int\s+main\s*\()").unwrap();
    static ref SECTION_TITLE: Regex = Regex::new(
        r"^\s*(?:\d+\.\s*)?(环境要求|安装步骤|最小示例|运行与验证|编译运行命令|编译与运行|运行命令)\s*[：:]?\s*(.*)$"
    )
    .unwrap();
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t]+").unwrap();
    static ref SPACE_AROUND_NEWLINE: Regex = Regex::new(r"[ \t]*\n[ \t]*").unwrap();
    static ref BLANK_RUN: Regex = Regex::new(r"\n{3,}").unwrap();
}

/// Applies [`normalize_plain_segment`] to every run of lines outside fences.
pub fn normalize_outside_fences(text: &str) -> String {
    let mut output: Vec<String> = Vec::new();
    let mut plain: Vec<&str> = Vec::new();
    let mut in_fence = false;

    let flush = |plain: &mut Vec<&str>, output: &mut Vec<String>| {
        if plain.is_empty() {
            return;
        }
        let normalized = normalize_plain_segment(&plain.join("\n"));
        plain.clear();
        if !normalized.is_empty() {
            output.extend(normalized.split('\n').map(str::to_string));
        }
    };

    for line in text.split('\n') {
        let token = fence_token(line);
        if is_fence_line(token) {
            flush(&mut plain, &mut output);
            output.push(token.to_string());
            in_fence = !is_fence_close(token) || !in_fence;
            continue;
        }
        if in_fence {
            output.push(line.to_string());
        } else {
            plain.push(line);
        }
    }

    flush(&mut plain, &mut output);
    output.join("\n")
}

/// Normalizes one prose segment.
pub fn normalize_plain_segment(segment: &str) -> String {
    let text = isolate_rules(segment);
    let text = RUN_ON_HEADING.replace_all(&text, "${1}\n${2}");
    let text = replace_until_stable(&text, &NUMBER_AFTER_PUNCT, "${1}\n${2}. ${3}");
    let text = replace_until_stable(&text, &NUMBER_WITHOUT_SPACE, "${1}${2}. ${3}");
    let text = ITEM_AFTER_PUNCT.replace_all(&text, "${1}\n${2}");
    let text = BULLET_AFTER_PUNCT.replace_all(&text, "${1}\n${2}");
    let text = GLUED_BULLET.replace_all(&text, "${1}\n- ");
    let text = replace_until_stable(&text, &EMPTY_HEADING, "${1}${2} ${3}");
    let text = QUOTE_ONLY_LINE.replace_all(&text, "");

    // A numbered item holding only a command becomes the command line.
    let text = NUMBERED_COMMAND.replace_all(&text, "${1}");
    let text = replace_until_stable(&text, &COMMAND_AFTER_PUNCT, "${1}\n${2}${3}");
    let text = INCLUDE_AFTER_COLON.replace_all(&text, "${1}\ncpp ${2}");
    let text = MAIN_AFTER_PUNCT.replace_all(&text, "${1}\n${2}");
    let text = split_mixed_lines(&text);
    let text = section_headings(&text);

    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    let text = SPACE_AROUND_NEWLINE.replace_all(&text, "\n");
    let text = BLANK_RUN.replace_all(&text, "\n\n");
    text.trim_matches('\n').to_string()
}

/// Puts every horizontal rule line between blank lines.
fn isolate_rules(segment: &str) -> String {
    let mut lines = Vec::new();
    for line in segment.split('\n') {
        if is_rule(line.trim()) {
            lines.extend(["", line.trim(), ""]);
        } else {
            lines.push(line);
        }
    }
    lines.join("\n")
}

fn split_mixed_lines(text: &str) -> String {
    let mut output = Vec::new();
    for line in text.split('\n').map(str::trim) {
        match split_command_and_prose(line) {
            Some((command, prose)) => {
                output.push(command);
                output.push(prose);
            }
            None => output.push(line.to_string()),
        }
    }
    output.join("\n")
}

/// `1. 环境要求：…` becomes `## 环境要求` followed by the rest of the line.
fn section_headings(text: &str) -> String {
    let mut output = Vec::new();
    for line in text.split('\n').map(str::trim) {
        match SECTION_TITLE.captures(line) {
            Some(captures) => {
                output.push(format!("## {}", &captures[1]));
                let tail = captures[2].trim();
                if !tail.is_empty() {
                    output.push(tail.to_string());
                }
            }
            None => output.push(line.to_string()),
        }
    }
    output.join("\n")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_run_on_heading() {
        let actual = normalize_plain_segment("介绍完毕。## 下一节");
        assert_eq!(actual, "介绍完毕。\n## 下一节");
    }

    #[test]
    fn test_run_on_numbered_items() {
        let actual = normalize_plain_segment("步骤：1.下载2. 编译。3.运行");
        assert_eq!(actual, "步骤：\n1. 下载2. 编译。\n3. 运行");
    }

    #[test]
    fn test_bullets_after_punctuation() {
        let actual = normalize_plain_segment("要求：- C++20 编译器（GCC 11+）- CMake 3.20+");
        assert_eq!(actual, "要求：\n- C++20 编译器（GCC 11+）\n- CMake 3.20+");
    }

    #[test]
    fn test_commands_after_colon() {
        let actual = normalize_plain_segment("安装：git clone https://example.com/x.git");
        assert_eq!(actual, "安装：\ngit clone https://example.com/x.git");
    }

    #[test]
    fn test_numbered_command_item_loses_number() {
        let actual = normalize_plain_segment("1. cmake --build build");
        assert_eq!(actual, "cmake --build build");
    }

    #[test]
    fn test_include_after_colon() {
        let actual = normalize_plain_segment("示例：#include <iostream>");
        assert_eq!(actual, "示例：\ncpp #include <iostream>");
    }

    #[test]
    fn test_section_titles_become_headings() {
        let actual = normalize_plain_segment("1. 环境要求： 需要 C++20\n安装步骤");
        assert_eq!(actual, "## 环境要求\n需要 C++20\n## 安装步骤");
    }

    #[test]
    fn test_command_and_prose_split() {
        let actual = normalize_plain_segment("git clone https://a.com/b.git 使用 CMake 构建：");
        assert_eq!(actual, "git clone https://a.com/b.git\n使用 CMake 构建：");
    }

    #[test]
    fn test_rules_are_isolated() {
        let actual = normalize_plain_segment("above\n---\nbelow");
        assert_eq!(actual, "above\n\n---\n\nbelow");
    }

    #[test]
    fn test_quote_only_lines_and_whitespace() {
        let actual = normalize_plain_segment("a   b\n\"\n\n\n\nc");
        assert_eq!(actual, "a b\n\nc");
    }

    #[test]
    fn test_fenced_content_is_left_alone() {
        let fixture = "说明：git status\n```bash\n1. cmake  --build\n```";
        let actual = normalize_outside_fences(fixture);
        assert_eq!(actual, "说明：\ngit status\n```bash\n1. cmake  --build\n```");
    }
}
