//! Reaction queue.
//!
//! Reactions that interrupt an action (a guard's attack of opportunity, a
//! counterspell) wait here. While the queue is non-empty the turn's action is
//! withheld and the queue is resolved instead.
//!
//! Resolution is FIFO. A failing entry is logged and skipped; the rest still
//! resolve. Entries added while resolving are resolved in the same pass.

use std::collections::VecDeque;
use std::fmt;

use tracing::{error, info};

use crate::core::EntityId;
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::triggers::EventPayload;

/// Emitted globally when a [`ContestedAction`] resolves. The reactor is the
/// payload source and the contested action is under `"action"`.
pub const REACTION_RESOLVED: &str = "REACTION_RESOLVED";

/// A pending reaction.
pub trait QueuedReaction: fmt::Debug {
    /// Short human-readable description.
    fn describe(&self) -> String;

    /// Carry out the reaction.
    fn resolve(self: Box<Self>, engine: &mut Engine) -> EngineResult<()>;
}

/// An entity reacting to another's action.
///
/// Resolving tells the gamemaster and emits [`REACTION_RESOLVED`]; the
/// reactor's own triggers decide what the reaction actually does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContestedAction {
    pub reactor: EntityId,
    /// Description of the action being reacted to.
    pub action: String,
}

impl ContestedAction {
    pub fn new(reactor: EntityId, action: impl Into<String>) -> Self {
        Self {
            reactor,
            action: action.into(),
        }
    }
}

impl QueuedReaction for ContestedAction {
    fn describe(&self) -> String {
        format!("{} reacts to {}", self.reactor, self.action)
    }

    fn resolve(self: Box<Self>, engine: &mut Engine) -> EngineResult<()> {
        let name = engine
            .world()
            .entity(self.reactor)
            .map(|e| e.name.clone())
            .ok_or(EngineError::UnknownEntity(self.reactor))?;
        info!(reactor = %name, action = %self.action, "Reaction resolved");
        if let Some(gamemaster) = engine.gamemaster_mut() {
            gamemaster.flag_event(&format!("{name} reacts to {}", self.action));
        }

        let payload = EventPayload::new()
            .in_world(engine.world_id())
            .with_source(self.reactor)
            .with_value("action", self.action);
        engine.emit(REACTION_RESOLVED, payload)?;
        Ok(())
    }
}

/// FIFO of pending reactions.
#[derive(Debug, Default)]
pub struct ReactionQueue {
    pending: VecDeque<Box<dyn QueuedReaction>>,
}

impl ReactionQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, reaction: Box<dyn QueuedReaction>) {
        info!(reaction = %reaction.describe(), "Queued reaction");
        self.pending.push_back(reaction);
    }

    /// Are reactions waiting?
    #[must_use]
    pub fn blocked(&self) -> bool {
        !self.pending.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pop(&mut self) -> Option<Box<dyn QueuedReaction>> {
        self.pending.pop_front()
    }

    /// Descriptions of waiting reactions, in resolution order.
    #[must_use]
    pub fn describe_pending(&self) -> Vec<String> {
        self.pending.iter().map(|r| r.describe()).collect()
    }
}

impl Engine {
    /// Resolve queued reactions until the queue is empty.
    ///
    /// Returns how many resolved successfully.
    pub fn resolve_reactions(&mut self) -> usize {
        info!(pending = self.reactions().len(), "Resolving reactions");
        let mut resolved = 0;
        while let Some(reaction) = self.reactions_mut().pop() {
            let description = reaction.describe();
            match reaction.resolve(self) {
                Ok(()) => resolved += 1,
                Err(err) => error!(reaction = %description, error = %err, "Reaction failed"),
            }
        }
        info!(resolved, "All reactions resolved");
        resolved
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::core::{EngineConfig, EntityKind};

    #[derive(Debug)]
    struct Failing;

    impl QueuedReaction for Failing {
        fn describe(&self) -> String {
            "failing".to_string()
        }

        fn resolve(self: Box<Self>, _engine: &mut Engine) -> EngineResult<()> {
            Err(EngineError::callback("fizzled"))
        }
    }

    #[test]
    fn test_blocked() {
        let mut queue = ReactionQueue::new();
        assert!(!queue.blocked());
        queue.add(Box::new(ContestedAction::new(EntityId(1), "move")));
        assert!(queue.blocked());
        assert_eq!(queue.describe_pending(), vec!["Entity(1) reacts to move"]);
    }

    #[test]
    fn test_failure_does_not_stop_resolution() {
        let mut engine = Engine::new(EngineConfig::default());
        let a = engine.world_mut().spawn("A", EntityKind::Npc);
        let b = engine.world_mut().spawn("B", EntityKind::Npc);
        engine.reactions_mut().add(Box::new(ContestedAction::new(a, "a")));
        engine.reactions_mut().add(Box::new(Failing));
        engine.reactions_mut().add(Box::new(ContestedAction::new(EntityId(99), "gone")));
        engine.reactions_mut().add(Box::new(ContestedAction::new(b, "b")));

        assert_eq!(engine.resolve_reactions(), 2);
        assert!(engine.reactions().is_empty());
    }

    #[test]
    fn test_contested_action_emits_for_reactor() {
        let mut engine = Engine::new(EngineConfig::default());
        let guard = engine.world_mut().spawn("Guard", EntityKind::Npc);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let handler = engine.add_handler(move |_, payload| {
            let action = payload.value("action").and_then(|v| v.as_str()).unwrap_or_default();
            log.borrow_mut().push((payload.source, action.to_string()));
            Ok(())
        });
        engine.subscribe_handler(REACTION_RESOLVED, handler);

        engine.reactions_mut().add(Box::new(ContestedAction::new(guard, "Entity(9) moves to (1,1)")));
        assert_eq!(engine.resolve_reactions(), 1);
        assert_eq!(*seen.borrow(), vec![(Some(guard), "Entity(9) moves to (1,1)".to_string())]);
    }
}
