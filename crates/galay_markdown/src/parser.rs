//! Line-oriented block parser.
//!
//! A single left-to-right scan over the text drives an explicit
//! [`BlockParser`] state. Every flush moves one accumulator into at most one
//! emitted [`Block`] and clears it.

use galay_domain::Block;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FENCE: Regex = Regex::new(r"^```([A-Za-z0-9_-]*)\s*$").unwrap();
    static ref HEADING: Regex = Regex::new(r"^(#{1,6})\s+(.+)$").unwrap();
    static ref QUOTE: Regex = Regex::new(r"^>\s?(.*)$").unwrap();
    static ref ORDERED: Regex = Regex::new(
        r"^(?:(?:✅|☑|✔|🔥|🌟|🧠|🔧|⚙|🛠|📈|📌)\x{FE0F}?)?\s*(\d+)\.\s+(.+)$"
    )
    .unwrap();
    static ref UNORDERED: Regex = Regex::new(r"^[-*]\s+(.+)$").unwrap();
}

/// Parses markdown into blocks. Works on partial input: an unterminated fence
/// emits the code collected so far.
pub fn parse_blocks(text: &str) -> Vec<Block> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut parser = BlockParser::default();
    for line in text.split('\n') {
        parser.line(line);
    }
    parser.finish()
}

#[derive(Debug, Default)]
struct ListState {
    ordered: bool,
    start: u32,
    expected: Option<u32>,
    items: Vec<String>,
}

#[derive(Debug)]
struct CodeState {
    language: String,
    lines: Vec<String>,
}

/// Accumulators for one scan.
#[derive(Debug, Default)]
pub struct BlockParser {
    blocks: Vec<Block>,
    paragraph: Vec<String>,
    quote: Vec<String>,
    list: ListState,
    code: Option<CodeState>,
}

impl BlockParser {
    /// Feeds one line (without its terminator).
    pub fn line(&mut self, raw: &str) {
        let line = raw.trim_end();
        let trimmed = line.trim();

        if let Some(captures) = FENCE.captures(trimmed) {
            self.fence(raw, trimmed, &captures[1]);
            return;
        }

        if let Some(code) = self.code.as_mut() {
            code.lines.push(raw.to_string());
            return;
        }

        if trimmed.is_empty() {
            self.flush_all();
        } else if is_rule(trimmed) {
            self.flush_all();
            self.blocks.push(Block::HorizontalRule);
        } else if let Some(captures) = HEADING.captures(trimmed) {
            self.flush_all();
            self.blocks
                .push(Block::heading(captures[1].len() as u8, captures[2].trim()));
        } else if let Some(captures) = QUOTE.captures(trimmed) {
            self.flush_paragraph();
            self.flush_list();
            self.quote.push(captures[1].trim().to_string());
        } else if let Some(captures) = ORDERED.captures(trimmed) {
            let number = captures[1].parse::<u32>().unwrap_or(u32::MAX);
            self.ordered_item(number, captures[2].trim());
        } else if let Some(captures) = UNORDERED.captures(trimmed) {
            self.flush_paragraph();
            self.flush_quote();
            if self.list.items.is_empty() || self.list.ordered {
                self.flush_list();
            }
            self.list.items.push(captures[1].trim().to_string());
        } else {
            self.flush_quote();
            self.flush_list();
            self.paragraph.push(trimmed.to_string());
        }
    }

    /// Flushes whatever is still open and returns the blocks.
    pub fn finish(mut self) -> Vec<Block> {
        if self.code.is_some() {
            self.flush_code();
        } else {
            self.flush_all();
        }
        self.blocks
    }

    fn fence(&mut self, line: &str, trimmed: &str, language: &str) {
        match self.code.as_mut() {
            None => {
                self.flush_all();
                let language = if language.is_empty() {
                    "text".to_string()
                } else {
                    language.to_lowercase()
                };
                self.code = Some(CodeState { language, lines: Vec::new() });
            }
            Some(_) if trimmed == "```" => self.flush_code(),
            // A tagged fence inside a code block is literal content.
            Some(code) => code.lines.push(line.to_string()),
        }
    }

    /// Continuity rule: a repeated `1.` keeps the open list going, any other
    /// unexpected number starts a new list.
    fn ordered_item(&mut self, number: u32, text: &str) {
        self.flush_paragraph();
        self.flush_quote();

        let open = !self.list.items.is_empty() && self.list.ordered;
        let restart = match self.list.expected {
            Some(expected) => number != expected && number != 1,
            None => false,
        };

        if !open || restart {
            self.flush_list();
            self.list.ordered = true;
            self.list.start = number;
            self.list.expected = Some(number.saturating_add(1));
        } else {
            self.list.expected = Some(self.list.expected.unwrap_or(number).saturating_add(1));
        }
        self.list.items.push(text.to_string());
    }

    fn flush_all(&mut self) {
        self.flush_paragraph();
        self.flush_quote();
        self.flush_list();
    }

    fn flush_paragraph(&mut self) {
        let lines = std::mem::take(&mut self.paragraph);
        let text = lines.join("\n");
        if !text.trim().is_empty() {
            self.blocks.push(Block::paragraph(text.trim()));
        }
    }

    fn flush_quote(&mut self) {
        let lines = std::mem::take(&mut self.quote);
        let text = lines.join("\n");
        if !text.trim().is_empty() {
            self.blocks.push(Block::blockquote(text.trim()));
        }
    }

    fn flush_list(&mut self) {
        let list = std::mem::take(&mut self.list);
        if list.items.is_empty() {
            return;
        }
        self.blocks.push(Block::List {
            ordered: list.ordered,
            start: list.ordered.then_some(list.start),
            items: list.items,
        });
    }

    fn flush_code(&mut self) {
        let Some(code) = self.code.take() else {
            return;
        };
        // Lines are kept verbatim; only the final line break before the
        // closing fence goes.
        let body = code.lines.join("\n");
        let body = body.strip_suffix('\n').unwrap_or(&body);
        if !body.trim().is_empty() {
            self.blocks.push(Block::code(code.language, body));
        }
    }
}

/// Three or more of the same `-`, `*` or `_` and nothing else.
pub(crate) fn is_rule(trimmed: &str) -> bool {
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first @ ('-' | '*' | '_')) => {
            trimmed.chars().count() >= 3 && chars.all(|ch| ch == first)
        }
        _ => false,
    }
}
