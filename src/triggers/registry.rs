//! Trigger storage and the live-trigger registry.
//!
//! [`TriggerStore`] owns every trigger and hands out [`TriggerId`]s, which
//! are the identity of a trigger: two triggers with the same label are still
//! two triggers. [`TriggerRegistry`] tracks which of those ids are live and
//! where each came from.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::trigger::Trigger;

/// Source recorded for triggers registered without one.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Unique identifier for a trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerId(pub u32);

impl TriggerId {
    /// Create a new trigger ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Trigger({})", self.0)
    }
}

/// Arena of triggers keyed by id.
///
/// A trigger is taken out of its slot while it fires (`checkout`) and put
/// back afterwards (`checkin`). This lets the firing trigger mutate itself
/// and the rest of the engine at the same time. A trigger removed while it
/// was checked out is dropped on checkin.
#[derive(Debug, Default)]
pub struct TriggerStore {
    slots: FxHashMap<TriggerId, Option<Trigger>>,
    next_id: u32,
}

impl TriggerStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: FxHashMap::default(),
            next_id: 1,
        }
    }

    /// Store a trigger and allocate its id.
    pub fn insert(&mut self, trigger: Trigger) -> TriggerId {
        let id = TriggerId(self.next_id);
        self.next_id += 1;
        self.slots.insert(id, Some(trigger));
        id
    }

    /// Borrow a stored trigger. `None` if unknown or currently firing.
    #[must_use]
    pub fn get(&self, id: TriggerId) -> Option<&Trigger> {
        self.slots.get(&id).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: TriggerId) -> Option<&mut Trigger> {
        self.slots.get_mut(&id).and_then(Option::as_mut)
    }

    /// Does a slot exist for `id` (firing or not)?
    #[must_use]
    pub fn contains(&self, id: TriggerId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Is the trigger currently firing?
    #[must_use]
    pub fn is_checked_out(&self, id: TriggerId) -> bool {
        matches!(self.slots.get(&id), Some(None))
    }

    /// Take a trigger out of its slot for firing.
    ///
    /// Returns `None` if the id is unknown or the trigger is already firing.
    pub fn checkout(&mut self, id: TriggerId) -> Option<Trigger> {
        self.slots.get_mut(&id).and_then(Option::take)
    }

    /// Return a fired trigger to its slot.
    pub fn checkin(&mut self, id: TriggerId, trigger: Trigger) {
        match self.slots.get_mut(&id) {
            Some(slot) => *slot = Some(trigger),
            None => debug!(trigger = %id, label = %trigger.label(), "Dropping trigger removed while firing"),
        }
    }

    /// Delete a trigger. Returns it unless it was firing.
    pub fn remove(&mut self, id: TriggerId) -> Option<Trigger> {
        self.slots.remove(&id).flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// The set of live triggers and where each came from.
///
/// ## Example Usage
///
/// ```
/// use rust_tabletop::triggers::{TriggerId, TriggerRegistry};
///
/// let mut registry = TriggerRegistry::new();
/// assert!(registry.add_trigger(TriggerId::new(1), Some("Goblin")));
/// assert!(!registry.add_trigger(TriggerId::new(1), Some("Goblin")));
///
/// assert_eq!(registry.source_of(TriggerId::new(1)), "Goblin");
/// assert_eq!(registry.source_of(TriggerId::new(2)), "unknown");
/// ```
#[derive(Clone, Debug, Default)]
pub struct TriggerRegistry {
    live: FxHashSet<TriggerId>,
    sources: FxHashMap<TriggerId, String>,
}

impl TriggerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a trigger. Returns `false` if it was already registered.
    pub fn add_trigger(&mut self, id: TriggerId, source: Option<&str>) -> bool {
        if !self.live.insert(id) {
            return false;
        }
        self.sources.insert(
            id,
            source.unwrap_or(UNKNOWN_SOURCE).to_string(),
        );
        true
    }

    /// Unregister a trigger. Unknown ids are ignored.
    pub fn remove_trigger(&mut self, id: TriggerId) {
        self.live.remove(&id);
        self.sources.remove(&id);
    }

    #[must_use]
    pub fn is_registered(&self, id: TriggerId) -> bool {
        self.live.contains(&id)
    }

    /// Where a trigger came from, or `"unknown"`.
    #[must_use]
    pub fn source_of(&self, id: TriggerId) -> &str {
        self.sources.get(&id).map_or(UNKNOWN_SOURCE, String::as_str)
    }

    /// Live triggers registered from `source`, in id order.
    #[must_use]
    pub fn triggers_by_source(&self, source: &str) -> Vec<TriggerId> {
        let mut ids: Vec<_> = self
            .sources
            .iter()
            .filter(|(_, s)| s.as_str() == source)
            .map(|(&id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Every live trigger, in id order.
    #[must_use]
    pub fn all(&self) -> Vec<TriggerId> {
        let mut ids: Vec<_> = self.live.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Log every live trigger with its source.
    pub fn debug_dump(&self) {
        for id in self.all() {
            debug!(trigger = %id, source = %self.source_of(id), "Registered trigger");
        }
    }
}
