//! Turn-granular scheduler.

use tracing::debug;

use crate::error::EngineResult;

use super::schedule::{DispatchPolicy, Schedule, ScheduledEntry};

/// A turn counter with callbacks scheduled relative to it.
///
/// The manager only decides what is due. Running the callbacks is left to
/// the owner, which can hand them whatever context they need.
///
/// ```
/// use rust_tabletop::turns::{DispatchPolicy, TurnManager};
///
/// let mut turns: TurnManager<Vec<u64>, u64> = TurnManager::new(DispatchPolicy::ExactTurn);
/// turns.schedule_in(2, |log, n| { log.push(n); Ok(()) }, 7);
///
/// let mut log = Vec::new();
/// assert!(turns.advance().is_empty());
/// for entry in turns.advance() {
///     entry.run(&mut log).unwrap();
/// }
/// assert_eq!(log, vec![7]);
/// assert_eq!(turns.current_turn(), 2);
/// ```
pub struct TurnManager<C, D> {
    current_turn: u64,
    schedule: Schedule<C, D>,
}

impl<C, D> TurnManager<C, D> {
    #[must_use]
    pub fn new(policy: DispatchPolicy) -> Self {
        Self {
            current_turn: 0,
            schedule: Schedule::new(policy),
        }
    }

    #[must_use]
    pub fn current_turn(&self) -> u64 {
        self.current_turn
    }

    #[must_use]
    pub fn policy(&self) -> DispatchPolicy {
        self.schedule.policy()
    }

    /// Schedule `callback` to fire `turns` turns from now.
    ///
    /// With the exact-turn policy, `turns == 0` targets the current turn,
    /// which has already been dispatched, so the entry never fires.
    pub fn schedule_in(
        &mut self,
        turns: u64,
        callback: impl FnOnce(&mut C, D) -> EngineResult<()> + 'static,
        data: D,
    ) {
        let fire_turn = self.current_turn + turns;
        debug!(fire_turn, current_turn = self.current_turn, "Scheduled callback");
        self.schedule.push(fire_turn, callback, data);
    }

    /// Move to the next turn and return the entries now due.
    pub fn advance(&mut self) -> Vec<ScheduledEntry<C, D>> {
        self.current_turn += 1;
        self.schedule.take_due(self.current_turn)
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.schedule.len()
    }
}

impl<C, D> std::fmt::Debug for TurnManager<C, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnManager")
            .field("current_turn", &self.current_turn)
            .field("schedule", &self.schedule)
            .finish()
    }
}
