//! C-family scanner.

use super::{SpanWriter, Token};

const KEYWORDS: &[&str] = &[
    "alignas", "auto", "break", "case", "catch", "class", "co_await", "co_return", "co_yield",
    "concept", "const", "consteval", "constexpr", "continue", "decltype", "default", "delete",
    "do", "else", "enum", "explicit", "export", "extern", "false", "final", "for", "friend",
    "goto", "if", "inline", "mutable", "namespace", "new", "noexcept", "nullptr", "operator",
    "override", "private", "protected", "public", "requires", "return", "sizeof", "static",
    "static_assert", "static_cast", "dynamic_cast", "reinterpret_cast", "const_cast", "struct",
    "switch", "template", "this", "throw", "true", "try", "typedef", "typename", "union",
    "using", "virtual", "volatile", "while",
];

const TYPES: &[&str] = &[
    "bool", "char", "double", "float", "int", "long", "short", "signed", "unsigned", "void",
    "size_t", "ssize_t", "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t",
    "uint32_t", "uint64_t", "std", "string", "string_view", "vector", "map", "unordered_map",
    "set", "optional", "expected", "shared_ptr", "unique_ptr", "Task", "Coroutine",
];

/// Call-shaped identifiers that are not function names.
const NOT_CALLS: &[&str] = &["if", "for", "while", "switch", "catch", "return", "sizeof"];

pub(super) fn highlight(code: &str) -> String {
    let mut writer = SpanWriter::default();
    let bytes = code.as_bytes();
    let mut index = 0;
    let mut plain_start = 0;
    let mut line_start = true;

    while index < bytes.len() {
        let byte = bytes[index];
        let rest = &code[index..];

        let token = if line_start && byte == b'#' {
            Some((Token::Preprocessor, line_end(code, index)))
        } else if rest.starts_with("//") {
            Some((Token::Comment, line_end(code, index)))
        } else if rest.starts_with("/*") {
            let end = rest[2..].find("*/").map_or(code.len(), |end| index + 2 + end + 2);
            Some((Token::Comment, end))
        } else if byte == b'"' || byte == b'\'' {
            Some((Token::String, quoted_end(code, index, byte)))
        } else if byte.is_ascii_digit() && !preceded_by_word(bytes, index) {
            Some((Token::Number, number_end(bytes, index)))
        } else if (byte.is_ascii_alphabetic() || byte == b'_') && !preceded_by_word(bytes, index) {
            let end = word_end(bytes, index);
            Some((classify(&code[index..end], bytes, end), end))
        } else {
            None
        };

        match token {
            Some((token, end)) => {
                writer.plain(&code[plain_start..index]);
                match token {
                    Token::Variable => writer.plain(&code[index..end]),
                    token => writer.token(token, &code[index..end]),
                }
                index = end;
                plain_start = end;
                line_start = false;
            }
            None => {
                if byte == b'\n' {
                    line_start = true;
                } else if !byte.is_ascii_whitespace() {
                    line_start = false;
                }
                index += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    writer.plain(&code[plain_start..]);
    writer.finish()
}

/// `Variable` marks a plain identifier; the scanner writes it unwrapped.
fn classify(word: &str, bytes: &[u8], end: usize) -> Token {
    if KEYWORDS.contains(&word) {
        return Token::Keyword;
    }
    if TYPES.contains(&word) {
        return Token::Type;
    }
    let mut next = end;
    while next < bytes.len() && (bytes[next] == b' ' || bytes[next] == b'\t') {
        next += 1;
    }
    if next < bytes.len() && bytes[next] == b'(' && !NOT_CALLS.contains(&word) {
        return Token::Function;
    }
    Token::Variable
}

fn line_end(code: &str, index: usize) -> usize {
    code[index..].find('\n').map_or(code.len(), |end| index + end)
}

fn quoted_end(code: &str, index: usize, quote: u8) -> usize {
    let bytes = code.as_bytes();
    let mut cursor = index + 1;
    while cursor < bytes.len() {
        match bytes[cursor] {
            b'\\' => cursor += 2,
            b'\n' => return cursor,
            byte if byte == quote => return cursor + 1,
            _ => cursor += 1,
        }
    }
    // An escape at the very end can step past the last byte.
    code.len()
}

fn number_end(bytes: &[u8], index: usize) -> usize {
    let mut cursor = index;
    let hex = bytes[index] == b'0' && matches!(bytes.get(index + 1), Some(b'x' | b'X'));
    if hex {
        cursor += 2;
        while cursor < bytes.len() && (bytes[cursor].is_ascii_hexdigit() || bytes[cursor] == b'\'') {
            cursor += 1;
        }
    } else {
        while cursor < bytes.len() {
            let byte = bytes[cursor];
            let exponent_sign = matches!(byte, b'+' | b'-')
                && matches!(bytes.get(cursor.wrapping_sub(1)), Some(b'e' | b'E'));
            if byte.is_ascii_digit() || byte == b'.' || byte == b'\'' || byte == b'e' || byte == b'E' || exponent_sign {
                cursor += 1;
            } else {
                break;
            }
        }
    }
    while cursor < bytes.len() && matches!(bytes[cursor], b'u' | b'U' | b'l' | b'L' | b'f' | b'F') {
        cursor += 1;
    }
    cursor
}

fn word_end(bytes: &[u8], index: usize) -> usize {
    let mut cursor = index;
    while cursor < bytes.len() && (bytes[cursor].is_ascii_alphanumeric() || bytes[cursor] == b'_') {
        cursor += 1;
    }
    cursor
}

/// True when the byte before `index` continues an identifier, including any
/// non-ASCII text.
fn preceded_by_word(bytes: &[u8], index: usize) -> bool {
    index > 0 && {
        let previous = bytes[index - 1];
        previous.is_ascii_alphanumeric() || previous == b'_' || previous >= 0x80
    }
}
