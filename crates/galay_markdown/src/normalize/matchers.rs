//! Line classifiers used by the recovery passes.
//!
//! The heuristics are order sensitive. [`CODE_LINE_MATCHERS`] and
//! [`LANGUAGE_MATCHERS`] are evaluated top to bottom and the first hit wins,
//! so new entries must be placed deliberately.

use lazy_static::lazy_static;
use regex::Regex;

/// Command verbs recognized at the start of a shell line.
macro_rules! shell_commands {
    () => {
        r"(?:git|docker|kubectl|curl|wget|npm|pnpm|yarn|pip|python|python3|cmake|make|mkdir|cd|ls|pwd|echo|export|sudo|apt|apt-get|brew|dnf|yum|nc|telnet|cat|grep|sed|awk|find|cp|mv|rm|chmod|chown|tar|unzip|zip|g\+\+|gcc|clang\+\+|clang|go|cargo|javac|java)"
    };
}

lazy_static! {
    static ref CJK: Regex = Regex::new(r"[\x{4e00}-\x{9fa5}]").unwrap();
    pub(crate) static ref SHELL_LINE: Regex = Regex::new(concat!(
        r"(?i)^\$?\s*(?P<cmd>",
        shell_commands!(),
        r"|\./\S+)(?P<tail>\s.*)?$"
    ))
    .unwrap();
    /// Unanchored command occurrence, `(?P<cmd>…)` marks the verb itself.
    pub(crate) static ref SHELL_ANYWHERE: Regex = Regex::new(concat!(
        r"(?i)\$?\s*(?P<cmd>",
        shell_commands!(),
        r"|\./\S+)(?:\s|$)"
    ))
    .unwrap();
    /// Numbered item whose text is a bare command, group 1 is the command.
    pub(crate) static ref NUMBERED_COMMAND: Regex = Regex::new(concat!(
        r"(?mi)^[ \t]*\d+\.[ \t]+(\$?[ \t]*(?:",
        shell_commands!(),
        r"|\./\S+)(?:[ \t].*)?)$"
    ))
    .unwrap();
    /// Command glued after a colon or sentence end.
    pub(crate) static ref COMMAND_AFTER_PUNCT: Regex = Regex::new(concat!(
        r"(?i)([:：。；;])\s*(\$?\s*(?:",
        shell_commands!(),
        r"|\./\S+))(\s|$)"
    ))
    .unwrap();
    static ref CMAKE_LINE: Regex = Regex::new(
        r"(?i)^(cmake_minimum_required|project|add_executable|add_library|target_link_libraries|target_include_directories|find_package|install)\s*\("
    )
    .unwrap();
    static ref INCLUDE_LINE: Regex = Regex::new(r"(?i)^(?:cpp|c\+\+)?\s*#include\s*<").unwrap();
    static ref INT_MAIN: Regex = Regex::new(r"\bint\s+main\s*\(").unwrap();
    static ref DECLARATION: Regex =
        Regex::new(r"^(template\s*<|class\s+\w+|struct\s+\w+|namespace\s+\w+)").unwrap();
    static ref TYPED_STATEMENT: Regex =
        Regex::new(r"^\s*(int|void|bool|auto|size_t)\s+\w+.*[;{]\s*$").unwrap();
    static ref COROUTINE: Regex = Regex::new(r"\bco_(return|await|yield)\b").unwrap();
    static ref RETURN_LINE: Regex =
        Regex::new(r"^\s*return\b[^\x{4e00}-\x{9fa5}]*[;}]\s*$").unwrap();
    static ref MEMBER_CALL: Regex = Regex::new(r"->\s*\w+\(").unwrap();
    static ref BRACES: Regex = Regex::new(r"^[{}]+[;,]?$").unwrap();
    static ref CLOSERS: Regex = Regex::new(r"^[)\]}]+[;,]?$").unwrap();
    static ref TAIL_START: Regex = Regex::new(r"^[A-Za-z0-9_./:@=-]").unwrap();
    static ref VERSION_ONLY: Regex = Regex::new(r"^\d+(?:\.\d+)*\+?$").unwrap();
    static ref COMPILER_ARG: Regex = Regex::new(
        r"(?i)(?:^|\s)(-[-\w=:.+]+|\S+\.(?:c|cc|cpp|cxx|h|hpp|o|so|a))(?:\s|$)"
    )
    .unwrap();
    static ref TRAILING_COLON: Regex = Regex::new(r"[：:]\s*$").unwrap();
    static ref MIXED_PROSE: Regex = Regex::new(
        r"\s+((?:使用|然后|接着|再|并|并且|说明|示例|构建|运行|验证)[^。\n]*[：:])\s*$"
    )
    .unwrap();
    static ref EXPLANATION_END: Regex = Regex::new(r"[：:。；;!?！？]$").unwrap();
    static ref EXPLANATION_WORD: Regex =
        Regex::new(r"(说明|步骤|示例|构建|运行|验证|如下|例如|命令)").unwrap();
    static ref INLINE_INCLUDE: Regex = Regex::new(r"(?i)(?:cpp|c\+\+)?\s*#include\s*<").unwrap();
    static ref INLINE_CMAKE: Regex = Regex::new(r"(?i)\bcmake_minimum_required\s*\(").unwrap();
    static ref INLINE_PROJECT: Regex = Regex::new(r"(?i)\bproject\s*\(").unwrap();
    static ref COMMENT_LINE: Regex = Regex::new(r"^\s*(//|/\*|\*|\*/)").unwrap();
    static ref CALL_SHAPED: Regex = Regex::new(r"^[A-Za-z_]+\s*\(").unwrap();
}

const COMPILERS: &[&str] = &["gcc", "g++", "clang", "clang++"];
const BARE_COMMANDS: &[&str] = &["make", "cmake", "ls", "pwd"];

pub(crate) fn has_cjk(text: &str) -> bool {
    CJK.is_match(text)
}

/// A line split into its leading shell verb and the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ShellLine<'a> {
    pub cmd: &'a str,
    pub tail: &'a str,
}

impl<'a> ShellLine<'a> {
    pub(crate) fn parse(line: &'a str) -> Option<Self> {
        let captures = SHELL_LINE.captures(line)?;
        let cmd = captures.name("cmd")?.as_str();
        let tail = captures.name("tail").map_or("", |tail| tail.as_str().trim());
        Some(Self { cmd, tail })
    }
}

/// True for a line that reads as one shell invocation.
pub fn looks_like_shell_command(line: &str) -> bool {
    let stripped = line.trim();
    if stripped.is_empty() || has_cjk(stripped) || TRAILING_COLON.is_match(stripped) {
        return false;
    }

    let Some(shell) = ShellLine::parse(stripped) else {
        return false;
    };
    let cmd = shell.cmd.to_lowercase();
    if cmd.starts_with("./") {
        return true;
    }
    if shell.tail.is_empty() {
        return BARE_COMMANDS.contains(&cmd.as_str());
    }
    if !TAIL_START.is_match(shell.tail) || VERSION_ONLY.is_match(shell.tail) {
        return false;
    }
    // "GCC 11+/Clang 14+" is a requirement, not an invocation.
    if COMPILERS.contains(&cmd.as_str()) && !COMPILER_ARG.is_match(shell.tail) {
        return false;
    }
    true
}

/// Facts about a trimmed line shared by the matchers.
#[derive(Debug, Clone, Copy)]
pub struct LineFacts<'a> {
    pub text: &'a str,
    pub has_cjk: bool,
}

impl<'a> LineFacts<'a> {
    pub fn new(line: &'a str) -> Self {
        let text = line.trim();
        Self { text, has_cjk: has_cjk(text) }
    }
}

/// A named code-line predicate.
#[derive(Debug, Clone, Copy)]
pub struct CodeLineMatcher {
    pub name: &'static str,
    pub matches: fn(&LineFacts<'_>) -> bool,
}

/// Code-line detection rules in precedence order.
pub const CODE_LINE_MATCHERS: &[CodeLineMatcher] = &[
    CodeLineMatcher { name: "include", matches: |line| INCLUDE_LINE.is_match(line.text) },
    CodeLineMatcher { name: "declaration", matches: |line| DECLARATION.is_match(line.text) },
    CodeLineMatcher { name: "cmake", matches: |line| CMAKE_LINE.is_match(line.text) },
    CodeLineMatcher { name: "shell", matches: |line| looks_like_shell_command(line.text) },
    CodeLineMatcher { name: "typed_statement", matches: |line| TYPED_STATEMENT.is_match(line.text) },
    CodeLineMatcher {
        name: "coroutine",
        matches: |line| !line.has_cjk && COROUTINE.is_match(line.text),
    },
    CodeLineMatcher {
        name: "return",
        matches: |line| !line.has_cjk && RETURN_LINE.is_match(line.text),
    },
    CodeLineMatcher {
        name: "member_call",
        matches: |line| !line.has_cjk && MEMBER_CALL.is_match(line.text),
    },
    CodeLineMatcher { name: "braces", matches: |line| BRACES.is_match(line.text) },
    CodeLineMatcher { name: "closers", matches: |line| CLOSERS.is_match(line.text) },
    CodeLineMatcher {
        name: "statement",
        matches: |line| {
            !line.has_cjk && line.text.ends_with(';') && line.text.chars().count() >= 12
        },
    },
    CodeLineMatcher {
        name: "brace_call",
        matches: |line| !line.has_cjk && line.text.contains(['{', '}']) && line.text.contains('('),
    },
];

/// Name of the first matcher that accepts the line.
pub fn code_line_rule(line: &str) -> Option<&'static str> {
    let facts = LineFacts::new(line);
    if facts.text.is_empty() {
        return None;
    }
    CODE_LINE_MATCHERS
        .iter()
        .find(|matcher| (matcher.matches)(&facts))
        .map(|matcher| matcher.name)
}

pub fn looks_like_code_line(line: &str) -> bool {
    code_line_rule(line).is_some()
}

/// A language guessed from the first line of a code run.
#[derive(Debug, Clone, Copy)]
pub struct LanguageMatcher {
    pub language: &'static str,
    pub matches: fn(&str) -> bool,
}

/// Language guessing rules in precedence order; no hit means `text`.
pub const LANGUAGE_MATCHERS: &[LanguageMatcher] = &[
    LanguageMatcher {
        language: "cpp",
        matches: |line| INCLUDE_LINE.is_match(line) || INT_MAIN.is_match(line),
    },
    LanguageMatcher { language: "cmake", matches: |line| CMAKE_LINE.is_match(line) },
    LanguageMatcher { language: "bash", matches: looks_like_shell_command },
];

pub fn guess_code_language(line: &str) -> &'static str {
    let stripped = line.trim();
    if stripped.is_empty() {
        return "text";
    }
    LANGUAGE_MATCHERS
        .iter()
        .find(|matcher| (matcher.matches)(stripped))
        .map_or("text", |matcher| matcher.language)
}

/// Whether a line inside a fence tagged `language` is code.
pub(crate) fn is_code_line_for_language(line: &str, language: &str) -> bool {
    let stripped = line.trim();
    if stripped.is_empty() {
        return true;
    }
    match language.trim().to_lowercase().as_str() {
        "bash" | "shell" | "sh" | "zsh" => stripped.starts_with('#') || looks_like_shell_command(stripped),
        "cmake" => {
            stripped.starts_with('#') || CMAKE_LINE.is_match(stripped) || CALL_SHAPED.is_match(stripped)
        }
        "cpp" | "c++" | "cc" | "cxx" | "hpp" | "h" => {
            COMMENT_LINE.is_match(stripped) || looks_like_code_line(stripped)
        }
        _ => looks_like_code_line(stripped),
    }
}

/// Chinese lead-in prose such as "编译命令如下：".
pub(crate) fn is_explanatory_line(line: &str) -> bool {
    let stripped = line.trim();
    if stripped.is_empty() || looks_like_code_line(stripped) || !has_cjk(stripped) {
        return false;
    }
    EXPLANATION_END.is_match(stripped) || EXPLANATION_WORD.is_match(stripped)
}

/// Canonical language of a standalone hint line such as `cpp` or `- bash:`.
pub(crate) fn language_hint(line: &str) -> Option<&'static str> {
    let lowered = line.trim().to_lowercase();
    let mut hint = lowered.as_str();
    hint = hint.trim_start();
    if let Some(rest) = hint.strip_prefix(['-', '*', '+']) {
        hint = rest.trim_start();
    }
    hint = hint.trim_matches('`');
    hint = hint.trim_end();
    if let Some(rest) = hint.strip_suffix([':', '：']) {
        hint = rest;
    }
    if let Some(rest) = hint.strip_prefix("language") {
        let rest = rest.trim_start();
        if let Some(rest) = rest.strip_prefix([':', '：']) {
            hint = rest.trim_start();
        }
    }
    match hint.trim() {
        "cpp" | "c++" | "cc" | "cxx" | "hpp" | "h" => Some("cpp"),
        "bash" | "shell" | "sh" | "zsh" => Some("bash"),
        "cmake" => Some("cmake"),
        "text" | "plaintext" => Some("text"),
        _ => None,
    }
}

/// Byte offset where code starts inside a prose line, if anywhere after the
/// first character.
pub(crate) fn find_inline_code_start(line: &str) -> Option<usize> {
    if line.is_empty() || looks_like_code_line(line) {
        return None;
    }

    let anchored = [&*INLINE_INCLUDE, &*INT_MAIN, &*INLINE_CMAKE, &*INLINE_PROJECT]
        .into_iter()
        .flat_map(|pattern| pattern.find_iter(line).map(|found| found.start()));

    let commands = SHELL_ANYWHERE.captures_iter(line).filter_map(|captures| {
        let whole = captures.get(0)?;
        let cmd = captures.name("cmd")?;
        let glued = line[..cmd.start()]
            .chars()
            .next_back()
            .is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        let candidate = line[whole.start()..].trim();
        (!glued && looks_like_shell_command(candidate)).then_some(whole.start())
    });

    anchored.chain(commands).filter(|start| *start > 0).min()
}

/// Splits `git clone … 使用 CMake 构建：` into the command and the trailing
/// prose.
pub(crate) fn split_command_and_prose(line: &str) -> Option<(String, String)> {
    let stripped = line.trim();
    let shell = ShellLine::parse(stripped)?;
    if shell.tail.is_empty() || !has_cjk(shell.tail) {
        return None;
    }

    let prose = MIXED_PROSE.captures(shell.tail)?;
    let whole = prose.get(0)?;
    let prose_text = prose.get(1)?.as_str().trim().to_string();
    let command_tail = shell.tail[..whole.start()].trim_end();

    let prefix = if stripped.starts_with('$') { "$ " } else { "" };
    let command = format!("{prefix}{} {command_tail}", shell.cmd).trim().to_string();
    looks_like_shell_command(&command).then_some((command, prose_text))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_shell_commands() {
        assert!(looks_like_shell_command("git clone https://github.com/galay/galay.git"));
        assert!(looks_like_shell_command("$ cmake -S . -B build"));
        assert!(looks_like_shell_command("./demo"));
        assert!(looks_like_shell_command("make"));
        assert!(looks_like_shell_command("python3 -m venv .venv"));
        assert!(looks_like_shell_command("g++ -std=c++20 main.cpp -o demo"));
    }

    #[test]
    fn test_not_shell_commands() {
        assert!(!looks_like_shell_command("GCC 11+/Clang 14+"));
        assert!(!looks_like_shell_command("CMake 3.20+ 构建系统"));
        assert!(!looks_like_shell_command("cmake 3.20"));
        assert!(!looks_like_shell_command("echo:"));
        assert!(!looks_like_shell_command("cd"));
        assert!(!looks_like_shell_command("catalog entries"));
        assert!(!looks_like_shell_command("git (optional)"));
    }

    #[test]
    fn test_code_line_rule_order() {
        assert_eq!(code_line_rule("#include <vector>"), Some("include"));
        assert_eq!(code_line_rule("cpp #include <vector>"), Some("include"));
        assert_eq!(code_line_rule("class Server {"), Some("declaration"));
        assert_eq!(code_line_rule("add_executable(demo main.cc)"), Some("cmake"));
        assert_eq!(code_line_rule("cmake --build build"), Some("shell"));
        assert_eq!(code_line_rule("int value = 3;"), Some("typed_statement"));
        assert_eq!(code_line_rule("co_await socket.recv(buffer);"), Some("coroutine"));
        assert_eq!(code_line_rule("return 0;"), Some("return"));
        assert_eq!(code_line_rule("ptr->run()"), Some("member_call"));
        assert_eq!(code_line_rule("};"), Some("braces"));
        assert_eq!(code_line_rule("));"), Some("closers"));
        assert_eq!(code_line_rule("std::cout << x;"), Some("statement"));
        assert_eq!(code_line_rule("if (ok) { go(); }"), Some("brace_call"));
        assert_eq!(code_line_rule("这是普通的一句话。"), None);
        assert_eq!(code_line_rule("返回值为 0;"), None);
    }

    #[test]
    fn test_guess_code_language() {
        assert_eq!(guess_code_language("#include <iostream>"), "cpp");
        assert_eq!(guess_code_language("int main() {"), "cpp");
        assert_eq!(guess_code_language("project(demo)"), "cmake");
        assert_eq!(guess_code_language("git status --short"), "bash");
        assert_eq!(guess_code_language("std::cout << x;"), "text");
    }

    #[test]
    fn test_language_hint() {
        assert_eq!(language_hint("cpp"), Some("cpp"));
        assert_eq!(language_hint("- Shell:"), Some("bash"));
        assert_eq!(language_hint("`c++`"), Some("cpp"));
        assert_eq!(language_hint("language: CMake"), Some("cmake"));
        assert_eq!(language_hint("python"), None);
    }

    #[test]
    fn test_find_inline_code_start() {
        let fixture = "示例代码：#include <iostream>";
        assert_eq!(find_inline_code_start(fixture), Some("示例代码：".len()));

        let fixture = "先执行 git clone https://github.com/a/b.git";
        assert_eq!(find_inline_code_start(fixture), Some("先执行".len()));

        assert_eq!(find_inline_code_start("abcd make"), Some("abcd ".len()));
        assert_eq!(find_inline_code_start("- CMake 3.20+ 构建系统"), None);
    }

    #[test]
    fn test_split_command_and_prose() {
        let actual = split_command_and_prose("git clone https://github.com/galay/galay.git 使用 CMake 构建：");
        let expected = Some((
            "git clone https://github.com/galay/galay.git".to_string(),
            "使用 CMake 构建：".to_string(),
        ));
        assert_eq!(actual, expected);
        assert_eq!(split_command_and_prose("git clone url"), None);
    }

    #[test]
    fn test_explanatory_line() {
        assert!(is_explanatory_line("编译命令如下："));
        assert!(is_explanatory_line("运行示例"));
        assert!(!is_explanatory_line("cmake --build build"));
        assert!(!is_explanatory_line("plain english"));
    }
}
