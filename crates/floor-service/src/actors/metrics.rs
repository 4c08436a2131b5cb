//! Mailbox monitoring for the floor actor.
//!
//! | Level    | Depth     |
//! |----------|-----------|
//! | Normal   | < 100     |
//! | Warning  | 100-500   |
//! | Critical | > 500     |
//!
//! The monitor is shared between the handle (which counts messages in) and
//! the actor (which counts them out), so the depth is the real backlog.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, warn};

use crate::observability::metrics;

pub const MAILBOX_NORMAL: usize = 100;
pub const MAILBOX_WARNING: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxLevel {
    Normal,
    Warning,
    Critical,
}

impl MailboxLevel {
    #[must_use]
    pub fn for_depth(depth: usize) -> Self {
        if depth > MAILBOX_WARNING {
            MailboxLevel::Critical
        } else if depth >= MAILBOX_NORMAL {
            MailboxLevel::Warning
        } else {
            MailboxLevel::Normal
        }
    }
}

#[derive(Debug)]
pub struct MailboxMonitor {
    floor_id: String,
    depth: AtomicUsize,
    peak_depth: AtomicUsize,
    messages_processed: AtomicU64,
}

impl MailboxMonitor {
    #[must_use]
    pub fn new(floor_id: impl Into<String>) -> Self {
        Self {
            floor_id: floor_id.into(),
            depth: AtomicUsize::new(0),
            peak_depth: AtomicUsize::new(0),
            messages_processed: AtomicU64::new(0),
        }
    }

    /// Count a message about to be sent to the actor.
    pub fn record_enqueue(&self) {
        let new_depth = self.depth.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_depth.fetch_max(new_depth, Ordering::Relaxed);
        metrics::set_actor_mailbox_depth(new_depth);

        match MailboxLevel::for_depth(new_depth) {
            MailboxLevel::Critical => {
                warn!(
                    target: "floor.actor.mailbox",
                    floor_id = %self.floor_id,
                    depth = new_depth,
                    threshold = MAILBOX_WARNING,
                    "Mailbox depth critical"
                );
            }
            // Log once when crossing into warning
            MailboxLevel::Warning if new_depth == MAILBOX_NORMAL => {
                debug!(
                    target: "floor.actor.mailbox",
                    floor_id = %self.floor_id,
                    depth = new_depth,
                    "Mailbox depth elevated"
                );
            }
            _ => {}
        }
    }

    /// Undo an enqueue whose send failed.
    pub fn record_send_failed(&self) {
        let depth = self.decrement();
        metrics::set_actor_mailbox_depth(depth);
    }

    /// Count a message the actor finished processing.
    pub fn record_dequeue(&self) {
        let depth = self.decrement();
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
        metrics::set_actor_mailbox_depth(depth);
    }

    fn decrement(&self) -> usize {
        let previous = self
            .depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| Some(d.saturating_sub(1)))
            .unwrap_or(0);
        previous.saturating_sub(1)
    }

    #[must_use]
    pub fn current_depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn peak_depth(&self) -> usize {
        self.peak_depth.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn current_level(&self) -> MailboxLevel {
        MailboxLevel::for_depth(self.current_depth())
    }
}
