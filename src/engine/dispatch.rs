//! Event delivery and turn driving.

use tracing::{debug, error, info, warn};

use super::Engine;
use crate::bus::Subscriber;
use crate::core::{EntityId, Position};
use crate::error::EngineResult;
use crate::triggers::{EventPayload, TriggerId};
use crate::turns::{ScheduledEntry, TurnOutcome, ACTION_EXECUTED, ACTION_PROPOSED};

type DueEntries = Vec<ScheduledEntry<Engine, EventPayload>>;

impl Engine {
    /// Emit an event and return the payload as the reactions left it.
    ///
    /// A payload with a position in this engine's world is delivered
    /// spatially; anything else goes to the global subscribers.
    pub fn emit(&mut self, event_type: &str, mut payload: EventPayload) -> EngineResult<EventPayload> {
        self.emit_with(event_type, &mut payload)?;
        Ok(payload)
    }

    /// Emit an event against a payload the caller keeps.
    pub fn emit_with(&mut self, event_type: &str, payload: &mut EventPayload) -> EngineResult<()> {
        match (payload.position, payload.world) {
            (Some(position), Some(world)) if world == self.world_id() => {
                self.emit_spatial(event_type, position, payload)
            }
            (Some(_), Some(world)) => {
                warn!(
                    event_type,
                    payload_world = %world,
                    engine_world = %self.world_id(),
                    "Payload names another world, delivering globally"
                );
                self.emit_global(event_type, payload)
            }
            _ => self.emit_global(event_type, payload),
        }
    }

    /// Deliver to every subscriber in subscription order. Stops at the first error.
    fn emit_global(&mut self, event_type: &str, payload: &mut EventPayload) -> EngineResult<()> {
        let subscribers = self.bus.subscribers(event_type);
        debug!(event_type, subscribers = subscribers.len(), "Global emit");
        for subscriber in subscribers {
            match subscriber {
                Subscriber::Trigger(id) => self.fire_trigger(id, payload)?,
                Subscriber::Handler(id) => {
                    // Removed by an earlier subscriber in this emit.
                    let Some(handler) = self.bus.handler(id) else {
                        continue;
                    };
                    handler(self, payload)?;
                }
            }
        }
        Ok(())
    }

    /// Deliver to the entities on `position`, then to every other placed
    /// entity that can see it.
    ///
    /// Every qualifying entity is served even if one fails; the first error
    /// is returned at the end.
    fn emit_spatial(
        &mut self,
        event_type: &str,
        position: Position,
        payload: &mut EventPayload,
    ) -> EngineResult<()> {
        let mut receivers = self.world.entities_at(position);
        for (id, at) in self.world.placed_entities() {
            if at == position {
                continue;
            }
            let sees = self
                .world
                .entity(id)
                .and_then(|e| e.vision_range)
                .is_none_or(|range| self.world.can_see(position, at, range));
            if sees {
                receivers.push(id);
            }
        }
        debug!(event_type, position = %position, receivers = receivers.len(), "Spatial emit");

        let mut first_error = None;
        for entity in receivers {
            if let Err(err) = self.deliver_to_entity(entity, event_type, payload) {
                error!(entity = %entity, event_type, error = %err, "Spatial delivery failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Run an entity's triggers for `event_type`, in attachment order.
    fn deliver_to_entity(
        &mut self,
        entity: EntityId,
        event_type: &str,
        payload: &mut EventPayload,
    ) -> EngineResult<()> {
        for id in self.entity_triggers_for(entity, event_type) {
            self.fire_trigger(id, payload)?;
        }
        Ok(())
    }

    /// An entity's triggers listening for `event_type`, in attachment order.
    ///
    /// A firing trigger is out of the store, so its subscription decides.
    pub(crate) fn entity_triggers_for(&self, entity: EntityId, event_type: &str) -> Vec<TriggerId> {
        let Some(owner) = self.world.entity(entity) else {
            return Vec::new();
        };
        owner
            .triggers
            .iter()
            .copied()
            .filter(|&id| match self.triggers.get(id) {
                Some(trigger) => trigger.event_type() == event_type,
                None => {
                    self.triggers.is_checked_out(id)
                        && self.bus.is_subscribed(event_type, Subscriber::Trigger(id))
                }
            })
            .collect()
    }

    /// Fire one stored trigger.
    ///
    /// A trigger that is already mid-fire is skipped. A trigger removed while
    /// it fires is dropped once it returns.
    pub fn fire_trigger(&mut self, id: TriggerId, payload: &mut EventPayload) -> EngineResult<()> {
        if self.triggers.is_checked_out(id) {
            debug!(trigger = %id, "Trigger already firing, skipping re-entry");
            return Ok(());
        }
        let Some(mut trigger) = self.triggers.checkout(id) else {
            return Ok(());
        };
        let result = trigger.check_and_react(self, payload);
        self.triggers.checkin(id, trigger);
        result
    }

    /// Run scheduled entries in order. All run; the first error is returned.
    fn run_due(&mut self, entries: DueEntries) -> EngineResult<()> {
        let mut first_error = None;
        for entry in entries {
            if let Err(err) = entry.run(self) {
                error!(error = %err, "Scheduled callback failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Advance the turn counter and run what is due. Returns the new turn.
    pub fn next_turn(&mut self) -> EngineResult<u64> {
        let due = self.turns.advance();
        let turn = self.turns.current_turn();
        if !due.is_empty() {
            info!(turn, callbacks = due.len(), "Dispatching scheduled callbacks");
        }
        self.run_due(due)?;
        Ok(turn)
    }

    /// Start a round of the turn order. Returns the new round number.
    pub fn start_round(&mut self) -> EngineResult<u64> {
        let due = self.turn_system.start_round();
        let round = self.turn_system.round_number();
        self.run_due(due)?;
        Ok(round)
    }

    /// Play the current participant's turn, then pass the turn on.
    ///
    /// The actor picks an action, which is validated and announced with
    /// `ACTION_PROPOSED`. If announcing it queued reactions, those resolve
    /// and the action is withheld. Otherwise it executes and
    /// `ACTION_EXECUTED` follows.
    pub fn execute_turn(&mut self) -> EngineResult<TurnOutcome> {
        let outcome = match self.turn_system.current() {
            Some(entity) => self.play_turn(entity),
            None => Ok(TurnOutcome::Idle),
        };
        let due = self.turn_system.take_due();
        let ended = self.run_due(due);
        self.turn_system.next_turn();
        let outcome = outcome?;
        ended?;
        Ok(outcome)
    }

    fn play_turn(&mut self, entity: EntityId) -> EngineResult<TurnOutcome> {
        let Some(action) = self
            .actors
            .get(&entity)
            .and_then(|actor| actor.decide_action(entity, self))
        else {
            debug!(entity = %entity, "No action this turn");
            return Ok(TurnOutcome::Idle);
        };

        if let Err(reason) = action.validate(self) {
            warn!(entity = %entity, action = %action.describe(), reason = %reason, "Action rejected");
            return Ok(TurnOutcome::Rejected(reason));
        }

        let description = action.describe();
        let announcement = EventPayload::new()
            .in_world(self.world_id())
            .with_source(entity)
            .with_value("action", description.clone());
        let announcement = self.emit(ACTION_PROPOSED, announcement)?;

        if self.reactions.blocked() {
            info!(entity = %entity, action = %description, "Action contested");
            self.resolve_reactions();
            return Ok(TurnOutcome::Contested);
        }

        action.execute(self)?;
        info!(entity = %entity, action = %description, "Action executed");
        self.emit(ACTION_EXECUTED, announcement)?;
        Ok(TurnOutcome::Executed)
    }
}
