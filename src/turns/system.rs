//! Round-based turn order.

use tracing::info;

use crate::core::EntityId;
use crate::error::EngineResult;

use super::schedule::{DispatchPolicy, Schedule, ScheduledEntry};

/// Participants taking turns in rounds.
///
/// Unlike [`TurnManager`](super::TurnManager), the round schedule uses
/// [`DispatchPolicy::AtOrBefore`]: anything scheduled for a round that has
/// already started fires on the next dispatch instead of being lost.
pub struct TurnSystem<C, D> {
    participants: Vec<EntityId>,
    current_index: usize,
    round_number: u64,
    schedule: Schedule<C, D>,
}

impl<C, D> TurnSystem<C, D> {
    #[must_use]
    pub fn new(participants: Vec<EntityId>) -> Self {
        Self {
            participants,
            current_index: 0,
            round_number: 1,
            schedule: Schedule::new(DispatchPolicy::AtOrBefore),
        }
    }

    #[must_use]
    pub fn participants(&self) -> &[EntityId] {
        &self.participants
    }

    /// Replace the turn order. The first participant acts next.
    pub fn set_participants(&mut self, participants: Vec<EntityId>) {
        self.participants = participants;
        self.current_index = 0;
    }

    /// Drop a participant. The turn stays with whoever holds it, or passes
    /// to the next in line when the current participant leaves.
    pub fn remove_participant(&mut self, entity: EntityId) {
        let Some(index) = self.participants.iter().position(|&p| p == entity) else {
            return;
        };
        self.participants.remove(index);
        if index < self.current_index {
            self.current_index -= 1;
        }
        if self.current_index >= self.participants.len() {
            self.current_index = 0;
        }
    }

    /// Whose turn it is, if anyone is participating.
    #[must_use]
    pub fn current(&self) -> Option<EntityId> {
        self.participants.get(self.current_index).copied()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn round_number(&self) -> u64 {
        self.round_number
    }

    /// Schedule `callback` for `rounds` rounds after the current one.
    pub fn schedule_in(
        &mut self,
        rounds: u64,
        callback: impl FnOnce(&mut C, D) -> EngineResult<()> + 'static,
        data: D,
    ) {
        self.schedule.push(self.round_number.saturating_add(rounds), callback, data);
    }

    /// Entries due in the current round.
    pub fn take_due(&mut self) -> Vec<ScheduledEntry<C, D>> {
        self.schedule.take_due(self.round_number)
    }

    /// Start a round: move the round counter on, reset the turn order and
    /// collect everything due at or before the new round. The caller runs
    /// the returned entries.
    pub fn start_round(&mut self) -> Vec<ScheduledEntry<C, D>> {
        self.round_number = self.round_number.saturating_add(1);
        self.current_index = 0;
        info!(round = self.round_number, "Round starts");
        self.take_due()
    }

    /// Pass the turn to the next participant.
    pub fn next_turn(&mut self) -> Option<EntityId> {
        if self.participants.is_empty() {
            return None;
        }
        self.current_index = (self.current_index + 1) % self.participants.len();
        let current = self.current();
        if let Some(entity) = current {
            info!(entity = %entity, "Next turn");
        }
        current
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.schedule.len()
    }
}

impl<C, D> std::fmt::Debug for TurnSystem<C, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnSystem")
            .field("participants", &self.participants)
            .field("current_index", &self.current_index)
            .field("round_number", &self.round_number)
            .field("schedule", &self.schedule)
            .finish()
    }
}
