// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory message registry.
//!
//! [`MessageStore`] is an explicitly owned arena keyed by [`MessageId`],
//! injected into the dispatcher rather than living as ambient shared state.
//! Records are inserted at enqueue time and thereafter mutated only through
//! [`update`](MessageStore::update) by the single worker holding the message;
//! readers get cloned snapshots of committed state.

use dashmap::DashMap;

use courier_core::{MessageId, QueuedMessage};

/// Registry of every message seen by the dispatcher, keyed by id.
///
/// Entries are retained until process shutdown; there is no external
/// persistence.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: DashMap<MessageId, QueuedMessage>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly created record.
    pub fn insert(&self, message: QueuedMessage) {
        self.messages.insert(message.id().clone(), message);
    }

    /// Remove a record, returning it if present.
    pub fn remove(&self, id: &MessageId) -> Option<QueuedMessage> {
        self.messages.remove(id).map(|(_, message)| message)
    }

    /// A cloned snapshot of the record's committed state.
    pub fn get(&self, id: &MessageId) -> Option<QueuedMessage> {
        self.messages.get(id).map(|entry| entry.value().clone())
    }

    /// Mutate a record in place under the shard lock.
    ///
    /// The closure must not block; transitions are committed atomically with
    /// respect to concurrent [`get`](MessageStore::get) snapshots.
    pub fn update<R>(
        &self,
        id: &MessageId,
        f: impl FnOnce(&mut QueuedMessage) -> R,
    ) -> Option<R> {
        self.messages.get_mut(id).map(|mut entry| f(entry.value_mut()))
    }

    /// Total number of records ever enqueued and still retained.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use courier_core::{MessageStatus, ProcessOutcome};
    use std::collections::HashMap;

    fn fresh(text: &str) -> QueuedMessage {
        QueuedMessage::new("+1234567890", text, Utc::now(), HashMap::new())
    }

    #[test]
    fn insert_and_get_round_trip() {
        let store = MessageStore::new();
        let msg = fresh("hello");
        let id = msg.id().clone();
        store.insert(msg);

        let snapshot = store.get(&id).expect("present");
        assert_eq!(snapshot.text(), "hello");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_unknown_id_is_none() {
        let store = MessageStore::new();
        assert!(store.get(&MessageId::new()).is_none());
    }

    #[test]
    fn snapshots_do_not_leak_mutations() {
        let store = MessageStore::new();
        let msg = fresh("hello");
        let id = msg.id().clone();
        store.insert(msg);

        let mut snapshot = store.get(&id).expect("present");
        snapshot.begin_processing().expect("pending -> processing");

        // The store still holds the committed pending state.
        assert_eq!(store.get(&id).expect("present").status(), MessageStatus::Pending);
    }

    #[test]
    fn update_commits_transitions() {
        let store = MessageStore::new();
        let msg = fresh("hello");
        let id = msg.id().clone();
        store.insert(msg);

        store
            .update(&id, |m| m.begin_processing())
            .expect("present")
            .expect("pending -> processing");
        store
            .update(&id, |m| m.finish(ProcessOutcome::Completed("ok".into())))
            .expect("present")
            .expect("processing -> completed");

        let snapshot = store.get(&id).expect("present");
        assert_eq!(snapshot.status(), MessageStatus::Completed);
        assert_eq!(snapshot.result(), Some("ok"));
    }

    #[test]
    fn remove_drops_the_record() {
        let store = MessageStore::new();
        let msg = fresh("hello");
        let id = msg.id().clone();
        store.insert(msg);

        assert!(store.remove(&id).is_some());
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }
}
