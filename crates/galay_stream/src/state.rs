use tracing::debug;

/// Lifecycle of one message send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreamState {
    #[default]
    Idle,
    /// Waiting for response headers, bounded by the connect timeout.
    Connecting,
    /// Reading chunks, bounded by the idle timeout between two chunks.
    Streaming,
    Completed,
    Failed,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Moves to `next` unless a terminal state was already reached.
    pub fn advance(&mut self, next: StreamState) {
        if self.is_terminal() {
            return;
        }
        debug!(from = ?self, to = ?next, "Stream state changed");
        *self = next;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_advance_through_lifecycle() {
        let mut fixture = StreamState::default();
        fixture.advance(StreamState::Connecting);
        fixture.advance(StreamState::Streaming);
        fixture.advance(StreamState::Completed);
        assert_eq!(fixture, StreamState::Completed);
    }

    #[test]
    fn test_terminal_state_is_final() {
        let mut fixture = StreamState::Failed;
        fixture.advance(StreamState::Streaming);
        assert_eq!(fixture, StreamState::Failed);
        assert!(fixture.is_terminal());
    }
}
