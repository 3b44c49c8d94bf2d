use std::io::Write;

use colored::Colorize;
use galay_domain::SourceRef;
use galay_markdown::{normalize, render_sources};
use galay_stream::{Outcome, Surface};

/// Prints answers to a terminal once the stream has settled.
///
/// Intermediate updates only replace the held HTML; the typing indicator goes
/// to stderr so piped stdout stays clean.
pub struct TerminalSurface<W> {
    out: W,
    html_mode: bool,
    progress: bool,
    html: String,
    sources: Vec<SourceRef>,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, html_mode: bool) -> Self {
        Self { out, html_mode, progress: false, html: String::new(), sources: Vec::new() }
    }

    pub fn start_progress(&mut self) {
        eprint!("{}", "生成中…".dimmed());
        self.progress = true;
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Writes the settled answer and its citations.
    pub fn finish(&mut self, outcome: &Outcome) -> anyhow::Result<()> {
        self.clear_progress();
        if self.html_mode {
            writeln!(self.out, "{}", outcome.html)?;
            if !self.sources.is_empty() {
                writeln!(self.out, "{}", render_sources(&self.sources))?;
            }
            return Ok(());
        }

        if outcome.text.trim().is_empty() {
            writeln!(self.out, "{}", outcome.html)?;
        } else {
            writeln!(self.out, "{}", format_markdown(&normalize(&outcome.text)))?;
        }
        if !self.sources.is_empty() {
            writeln!(self.out, "{}", format_sources(&self.sources).dimmed())?;
        }
        Ok(())
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn update(&mut self, html: &str) {
        self.html = html.to_string();
    }

    fn sources(&mut self, sources: &[SourceRef]) {
        self.sources = sources.to_vec();
    }

    fn failure(&mut self, message: &str) {
        writeln!(self.out, "{}", message.red()).ok();
    }

    fn clear_progress(&mut self) {
        if self.progress {
            eprint!("\r\x1b[2K");
            self.progress = false;
        }
    }
}

/// Colors canonical markdown for the terminal: bold headings, dimmed fences,
/// cyan code.
fn format_markdown(markdown: &str) -> String {
    let mut in_code = false;
    markdown
        .lines()
        .map(|line| {
            if line.trim_start().starts_with("```") {
                in_code = !in_code;
                line.dimmed().to_string()
            } else if in_code {
                line.cyan().to_string()
            } else if line.starts_with('#') {
                line.trim_start_matches('#').trim_start().bold().to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_sources(sources: &[SourceRef]) -> String {
    let names = sources
        .iter()
        .map(|source| format!("{} / {}", source.project, source.file_name))
        .collect::<Vec<_>>()
        .join("，");
    format!("引用来源：{names}")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn outcome(text: &str, html: &str) -> Outcome {
        Outcome { text: text.to_string(), html: html.to_string(), ..Default::default() }
    }

    fn printed(surface: TerminalSurface<Vec<u8>>) -> String {
        String::from_utf8(surface.into_inner()).unwrap()
    }

    #[test]
    fn test_plain_mode_prints_canonical_markdown() {
        colored::control::set_override(false);
        let mut fixture = TerminalSurface::new(Vec::new(), false);
        fixture.sources(&[SourceRef::new("galay", "docs/build.md", "build.md")]);
        fixture
            .finish(&outcome("## 构建\n```bash\nmake\n```", "<h2>构建</h2>"))
            .unwrap();

        let actual = printed(fixture);
        assert!(actual.starts_with("构建\n"));
        assert!(actual.contains("```bash\nmake\n```"));
        assert!(actual.ends_with("\n引用来源：galay / build.md\n"));
    }

    #[test]
    fn test_html_mode_prints_html_and_sources() {
        colored::control::set_override(false);
        let mut fixture = TerminalSurface::new(Vec::new(), true);
        fixture.update("<p>a</p>");
        fixture.sources(&[SourceRef::new("p", "f", "n")]);
        fixture.finish(&outcome("a", "<p>a</p>")).unwrap();

        let actual = printed(fixture);
        let expected = "<p>a</p>\n<div class=\"sources-content\"><small>引用来源：<span class=\"source-tag\" title=\"f\">p / n</span></small></div>\n";
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_blocks_only_answer_prints_html() {
        colored::control::set_override(false);
        let mut fixture = TerminalSurface::new(Vec::new(), false);
        fixture.finish(&outcome("", "<h2>X</h2>")).unwrap();
        assert_eq!(printed(fixture), "<h2>X</h2>\n");
    }

    #[test]
    fn test_failure_is_printed() {
        colored::control::set_override(false);
        let mut fixture = TerminalSurface::new(Vec::new(), false);
        fixture.failure("抱歉，服务暂时不可用：HTTP 503");
        assert_eq!(printed(fixture), "抱歉，服务暂时不可用：HTTP 503\n");
    }
}
