/// Trait for styling inline elements.
pub trait InlineStyler {
    fn text(&self, text: &str) -> String;
    fn bold(&self, inner: &str) -> String;
    fn italic(&self, inner: &str) -> String;
    fn code(&self, text: &str) -> String;
    fn link(&self, inner: &str, url: &str) -> String;
}

/// Trait for styling block elements. Every `inner` argument is already
/// rendered markup.
pub trait BlockStyler {
    fn heading(&self, level: u8, inner: &str) -> String;
    fn paragraph(&self, lines: &[String]) -> String;
    fn blockquote(&self, lines: &[String]) -> String;
    fn list(&self, ordered: bool, start: u32, items: &[String]) -> String;
    fn rule(&self) -> String;
}
