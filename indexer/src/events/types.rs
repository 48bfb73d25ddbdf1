//! Types for the event poller.

/// Result of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Number of raw events fetched.
    pub fetched: usize,
    /// Number of events classified and handed to the dispatcher.
    pub dispatched: usize,
    /// Number of events with an unrecognized topic.
    pub dropped: usize,
    /// Paging token the cursor ended on.
    pub cursor: Option<String>,
    /// Whether the cursor moved during the cycle.
    pub cursor_moved: bool,
}

impl PollSummary {
    /// Creates an empty summary.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if the fetch returned no events.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fetched == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_summary_empty() {
        let summary = PollSummary::empty();
        assert!(summary.is_empty());
        assert_eq!(summary.dispatched, 0);
        assert!(summary.cursor.is_none());
        assert!(!summary.cursor_moved);
    }
}
