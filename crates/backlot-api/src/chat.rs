//! # Chat Feed
//!
//! Live-update plumbing for internal chat. New messages are published to a
//! `tokio::sync::broadcast` channel that connected consumers subscribe to;
//! the poll endpoint (`GET .../messages?after=`) covers clients that were
//! offline or dropped frames.
//!
//! ## Delivery Model
//!
//! At-least-once. A subscriber may see a message both from the feed and
//! from a poll, or twice after a reconnect — consumers de-duplicate by
//! message id. Per-conversation ordering is (`sent_at`, id); the id
//! tiebreak makes the order total even when two messages share a
//! timestamp.

use tokio::sync::broadcast;

use backlot_core::MessageId;

use crate::state::MessageRecord;

/// Cloneable handle to the in-process chat broadcast channel.
///
/// Publishing never blocks and never fails: with no subscribers the
/// message is simply dropped (the store still has it, and polling will
/// find it). Slow subscribers that overflow the channel capacity miss
/// frames and recover via poll.
#[derive(Debug, Clone)]
pub struct MessageFeed {
    tx: broadcast::Sender<MessageRecord>,
}

impl MessageFeed {
    /// Create a feed with the given per-subscriber buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a message to all current subscribers.
    pub fn publish(&self, message: MessageRecord) {
        // Err means no live subscribers — not a failure.
        let _ = self.tx.send(message);
    }

    /// Subscribe to the feed. The receiver observes messages published
    /// after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<MessageRecord> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Sort messages into the canonical per-conversation order and drop
/// duplicate ids (at-least-once delivery tolerance).
pub fn order_messages(mut messages: Vec<MessageRecord>) -> Vec<MessageRecord> {
    messages.sort_by(|a, b| {
        a.sent_at
            .cmp(&b.sent_at)
            .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
    });
    messages.dedup_by_key(|m| m.id);
    messages
}

/// Keep only messages strictly after the cursor message, in canonical
/// order. An unknown cursor id returns the full ordered list — the client
/// is resyncing from a state the server no longer knows about.
pub fn after_cursor(messages: Vec<MessageRecord>, cursor: MessageId) -> Vec<MessageRecord> {
    let ordered = order_messages(messages);
    match ordered.iter().position(|m| m.id == cursor) {
        Some(idx) => ordered.into_iter().skip(idx + 1).collect(),
        None => ordered,
    }
}
