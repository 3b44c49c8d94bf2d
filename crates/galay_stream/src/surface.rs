use galay_domain::SourceRef;

/// Display adapter the rendered output is committed to.
///
/// Every `update` carries the complete HTML of the answer so far, not a
/// delta.
pub trait Surface {
    fn update(&mut self, html: &str);
    fn sources(&mut self, sources: &[SourceRef]);
    /// Shows a user-facing failure message in place of an answer.
    fn failure(&mut self, message: &str);
    /// Removes the typing indicator. Called before the first update and
    /// before any failure.
    fn clear_progress(&mut self);
}

/// Surface that keeps everything in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySurface {
    pub html: String,
    pub sources: Vec<SourceRef>,
    pub failures: Vec<String>,
    pub updates: usize,
    pub source_updates: usize,
    pub progress_cleared: bool,
}

impl Surface for MemorySurface {
    fn update(&mut self, html: &str) {
        self.html = html.to_string();
        self.updates += 1;
    }

    fn sources(&mut self, sources: &[SourceRef]) {
        self.sources = sources.to_vec();
        self.source_updates += 1;
    }

    fn failure(&mut self, message: &str) {
        self.failures.push(message.to_string());
    }

    fn clear_progress(&mut self) {
        self.progress_cleared = true;
    }
}
