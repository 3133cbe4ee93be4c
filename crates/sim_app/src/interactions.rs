//! Per-entity queues of pending interactions.

use std::collections::BTreeMap;

use sim_types::{EntityId, Interaction};

/// Interactions waiting for their target's next update.
///
/// Each interaction is handed out exactly once by [`InteractionQueue::take`].
#[derive(Debug, Default, Clone)]
pub struct InteractionQueue {
    pending: BTreeMap<EntityId, Vec<Interaction>>,
}

impl InteractionQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interaction for `target`.
    pub fn push(&mut self, target: EntityId, interaction: Interaction) {
        self.pending.entry(target).or_default().push(interaction);
    }

    /// Remove and return everything queued for `target`, oldest first.
    pub fn take(&mut self, target: EntityId) -> Vec<Interaction> {
        self.pending.remove(&target).unwrap_or_default()
    }

    /// Interactions queued for `target`, without consuming them.
    #[must_use]
    pub fn pending_for(&self, target: EntityId) -> &[Interaction] {
        self.pending.get(&target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Drop everything queued for `target`. Returns how many were dropped.
    pub fn discard(&mut self, target: EntityId) -> usize {
        self.pending.remove(&target).map_or(0, |q| q.len())
    }

    /// Total number of queued interactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
