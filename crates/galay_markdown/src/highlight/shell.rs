//! Regex tokenizers for shell scripts and CMake lists.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::{SpanWriter, Token};

lazy_static! {
    static ref SHELL_TOKEN: Regex = Regex::new(concat!(
        r#"(?P<comment>(?m:^|[ \t])#[^\n]*)"#,
        r#"|(?P<string>"(?:\\.|[^"\\])*"|'[^'\n]*')"#,
        r#"|(?P<variable>\$\{[^}\n]*\}|\$[A-Za-z_][A-Za-z0-9_]*|\$[0-9@#?*!$])"#,
        r#"|(?P<word>[A-Za-z_][A-Za-z0-9_-]*)"#,
    ))
    .unwrap();
    static ref CMAKE_TOKEN: Regex = Regex::new(concat!(
        r#"(?P<comment>#[^\n]*)"#,
        r#"|(?P<string>"(?:\\.|[^"\\])*")"#,
        r#"|(?P<variable>\$(?:ENV)?\{[^}\n]*\})"#,
        r#"|(?P<word>[A-Za-z_][A-Za-z0-9_]*)"#,
    ))
    .unwrap();
}

const SHELL_KEYWORDS: &[&str] = &[
    "if", "then", "else", "elif", "fi", "for", "in", "do", "done", "while", "until", "case",
    "esac", "function", "return", "local", "export",
];

const SHELL_BUILTINS: &[&str] = &[
    "apt", "apt-get", "brew", "cargo", "cat", "cd", "chmod", "cmake", "cp", "ctest", "curl",
    "docker", "echo", "g++", "gcc", "git", "grep", "ls", "make", "mkdir", "mv", "ninja", "pip",
    "python", "python3", "rm", "source", "sudo", "tar", "wget", "yum", "clang", "clang++",
];

const CMAKE_COMMANDS: &[&str] = &[
    "add_compile_options", "add_definitions", "add_executable", "add_library",
    "add_subdirectory", "add_test", "cmake_minimum_required", "else", "elseif", "enable_testing",
    "endforeach", "endfunction", "endif", "endmacro", "file", "find_package", "foreach",
    "function", "if", "include", "include_directories", "install", "link_directories", "list",
    "macro", "message", "option", "project", "set", "target_compile_definitions",
    "target_compile_features", "target_compile_options", "target_include_directories",
    "target_link_libraries", "target_sources",
];

const CMAKE_KEYWORDS: &[&str] = &[
    "VERSION", "LANGUAGES", "REQUIRED", "COMPONENTS", "CONFIG", "PUBLIC", "PRIVATE",
    "INTERFACE", "STATIC", "SHARED", "CACHE", "STRING", "BOOL", "ON", "OFF", "TRUE", "FALSE",
    "AND", "OR", "NOT", "DESTINATION", "TARGETS", "GLOB", "GLOB_RECURSE", "CXX",
];

pub(super) fn highlight_bash(code: &str) -> String {
    tokenize(code, &SHELL_TOKEN, |word| {
        if SHELL_KEYWORDS.contains(&word) {
            Some(Token::Keyword)
        } else if SHELL_BUILTINS.contains(&word) {
            Some(Token::Builtin)
        } else {
            None
        }
    })
}

pub(super) fn highlight_cmake(code: &str) -> String {
    tokenize(code, &CMAKE_TOKEN, |word| {
        if CMAKE_COMMANDS.contains(&word.to_ascii_lowercase().as_str()) {
            Some(Token::Builtin)
        } else if CMAKE_KEYWORDS.contains(&word) || word.starts_with("CMAKE_") {
            Some(Token::Keyword)
        } else {
            None
        }
    })
}

fn tokenize(code: &str, pattern: &Regex, word: impl Fn(&str) -> Option<Token>) -> String {
    let mut writer = SpanWriter::default();
    let mut last = 0;

    for captures in pattern.captures_iter(code) {
        let Some((start, token)) = classify(&captures, &word) else {
            continue;
        };
        let Some(whole) = captures.get(0) else {
            continue;
        };
        writer.plain(&code[last..start]);
        writer.token(token, &code[start..whole.end()]);
        last = whole.end();
    }

    writer.plain(&code[last..]);
    writer.finish()
}

/// Start offset and class of a match. Comments may carry a leading blank
/// that stays plain.
fn classify(captures: &Captures<'_>, word: &impl Fn(&str) -> Option<Token>) -> Option<(usize, Token)> {
    if let Some(comment) = captures.name("comment") {
        let start = comment.start() + comment.as_str().find('#').unwrap_or(0);
        return Some((start, Token::Comment));
    }
    if let Some(string) = captures.name("string") {
        return Some((string.start(), Token::String));
    }
    if let Some(variable) = captures.name("variable") {
        return Some((variable.start(), Token::Variable));
    }
    let matched = captures.name("word")?;
    word(matched.as_str()).map(|token| (matched.start(), token))
}
