//! List rendering.

use crate::inline::render_inline_content;
use crate::style::{BlockStyler, InlineStyler};

/// Render a list. Blank items are dropped; a list with no items renders
/// nothing.
pub fn render_list<S: InlineStyler + BlockStyler>(
    ordered: bool,
    start: Option<u32>,
    items: &[String],
    styler: &S,
) -> String {
    let rendered: Vec<String> = items
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| render_inline_content(item, styler))
        .collect();

    if rendered.is_empty() {
        return String::new();
    }
    styler.list(ordered, start.unwrap_or(1), &rendered)
}
