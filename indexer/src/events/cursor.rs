//! Event cursor for tracking polling progress.
//!
//! The cursor lives only in process memory. It is lost on restart, after
//! which polling resumes from the configured start ledger.

use serde::{Deserialize, Serialize};

/// Cursor for tracking event polling progress.
///
/// Holds the paging token of the last event handed to the dispatcher. The
/// cursor only moves forward: an older ledger never replaces a newer one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCursor {
    /// Paging token of the last processed event.
    pub paging_token: Option<String>,

    /// Ledger of the last processed event.
    pub last_ledger: u64,

    /// Number of events the cursor has moved past.
    pub events_seen: u64,
}

impl EventCursor {
    /// Creates an empty cursor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            paging_token: None,
            last_ledger: 0,
            events_seen: 0,
        }
    }

    /// Creates a cursor positioned at the given paging token.
    #[must_use]
    pub fn at(paging_token: impl Into<String>, last_ledger: u64) -> Self {
        Self {
            paging_token: Some(paging_token.into()),
            last_ledger,
            events_seen: 0,
        }
    }

    /// Returns the paging token to resume from.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.paging_token.as_deref()
    }

    /// Returns true if no event has been processed yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.paging_token.is_none()
    }

    /// Moves the cursor past an event.
    ///
    /// Ignored if the event's ledger is older than the current position or
    /// the token is empty.
    ///
    /// Returns true if the cursor moved.
    pub fn advance(&mut self, paging_token: &str, ledger: u64) -> bool {
        if paging_token.is_empty() || ledger < self.last_ledger {
            return false;
        }

        if self.paging_token.as_deref() == Some(paging_token) {
            return false;
        }

        self.paging_token = Some(paging_token.to_string());
        self.last_ledger = ledger;
        self.events_seen = self.events_seen.saturating_add(1);
        true
    }

    /// Resets the cursor to initial state.
    pub fn reset(&mut self) {
        self.paging_token = None;
        self.last_ledger = 0;
        self.events_seen = 0;
    }
}
