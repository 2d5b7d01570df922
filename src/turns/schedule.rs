//! Turn-keyed callback schedule.
//!
//! ## Dispatch Policies
//!
//! Two policies decide which entries are due when the counter moves:
//!
//! - [`DispatchPolicy::ExactTurn`]: an entry fires only on the turn it was
//!   scheduled for. An entry whose turn was skipped never fires.
//! - [`DispatchPolicy::AtOrBefore`]: an entry fires on the first dispatch at
//!   or after its turn, so skipped turns are caught up.
//!
//! Entries due on the same dispatch fire in the order they were scheduled.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::EngineResult;

/// Which scheduled entries a dispatch picks up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// Fire when `now == fire_turn`.
    #[default]
    ExactTurn,
    /// Fire when `fire_turn <= now`.
    AtOrBefore,
}

impl DispatchPolicy {
    #[must_use]
    pub fn is_due(self, fire_turn: u64, now: u64) -> bool {
        match self {
            Self::ExactTurn => fire_turn == now,
            Self::AtOrBefore => fire_turn <= now,
        }
    }
}

/// A deferred callback. Receives the context and the data it was scheduled with.
pub type ScheduledCallback<C, D> = Box<dyn FnOnce(&mut C, D) -> EngineResult<()>>;

/// One scheduled callback.
pub struct ScheduledEntry<C, D> {
    pub fire_turn: u64,
    callback: ScheduledCallback<C, D>,
    data: D,
}

impl<C, D> ScheduledEntry<C, D> {
    /// Invoke the callback, consuming the entry.
    pub fn run(self, context: &mut C) -> EngineResult<()> {
        (self.callback)(context, self.data)
    }

    #[must_use]
    pub fn data(&self) -> &D {
        &self.data
    }
}

impl<C, D: std::fmt::Debug> std::fmt::Debug for ScheduledEntry<C, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledEntry")
            .field("fire_turn", &self.fire_turn)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

/// Pending callbacks keyed by the turn they fire on.
pub struct Schedule<C, D> {
    policy: DispatchPolicy,
    entries: Vec<ScheduledEntry<C, D>>,
}

impl<C, D> Schedule<C, D> {
    #[must_use]
    pub fn new(policy: DispatchPolicy) -> Self {
        Self {
            policy,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// Add a callback for `fire_turn`.
    pub fn push(
        &mut self,
        fire_turn: u64,
        callback: impl FnOnce(&mut C, D) -> EngineResult<()> + 'static,
        data: D,
    ) {
        self.entries.push(ScheduledEntry {
            fire_turn,
            callback: Box::new(callback),
            data,
        });
    }

    /// Remove and return every entry due at `now`, in scheduling order.
    ///
    /// Under `ExactTurn`, entries whose turn already passed can never fire;
    /// they are dropped with a warning.
    pub fn take_due(&mut self, now: u64) -> Vec<ScheduledEntry<C, D>> {
        let mut due = Vec::new();
        let mut pending = Vec::with_capacity(self.entries.len());

        for entry in self.entries.drain(..) {
            if self.policy.is_due(entry.fire_turn, now) {
                due.push(entry);
            } else if entry.fire_turn < now {
                warn!(fire_turn = entry.fire_turn, now, "Dropping scheduled entry for a turn already passed");
            } else {
                pending.push(entry);
            }
        }

        self.entries = pending;
        due
    }

    /// Number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Turns with at least one pending entry, ascending.
    #[must_use]
    pub fn pending_turns(&self) -> Vec<u64> {
        let mut turns: Vec<_> = self.entries.iter().map(|e| e.fire_turn).collect();
        turns.sort_unstable();
        turns.dedup();
        turns
    }

    /// Drop every pending entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<C, D> std::fmt::Debug for Schedule<C, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schedule")
            .field("policy", &self.policy)
            .field("pending", &self.entries.len())
            .finish()
    }
}
