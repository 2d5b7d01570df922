//! Event payloads.
//!
//! A payload travels with every emitted event. The typed fields cover what
//! the engine itself reads; `values` carries arbitrary content data
//! (a perception score, a spell name, ...).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{EntityId, Position, RollMode, WorldId};

/// Data delivered with an event.
///
/// Receivers get the payload by mutable reference, so changes made by one
/// receiver are visible to the next.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// World the event happened in. Makes the turn counter reachable.
    pub world: Option<WorldId>,

    /// Tile the event happened on. Together with `world` this makes
    /// delivery spatial.
    pub position: Option<Position>,

    /// The entity that caused the event.
    pub source: Option<EntityId>,

    /// The entity affected by the event (damage goes here).
    pub target: Option<EntityId>,

    /// Skill modifiers used by skill checks.
    #[serde(default)]
    pub character_stats: BTreeMap<String, i64>,

    #[serde(default)]
    pub roll_mode: RollMode,

    /// Free-form content data.
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
}

impl EventPayload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the world (builder pattern).
    #[must_use]
    pub fn in_world(mut self, world: WorldId) -> Self {
        self.world = Some(world);
        self
    }

    /// Set the position (builder pattern).
    #[must_use]
    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the source entity (builder pattern).
    #[must_use]
    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the target entity (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    /// Add a skill modifier (builder pattern).
    #[must_use]
    pub fn with_stat(mut self, skill: impl Into<String>, modifier: i64) -> Self {
        self.character_stats.insert(skill.into(), modifier);
        self
    }

    /// Set the roll mode (builder pattern).
    #[must_use]
    pub fn with_roll_mode(mut self, mode: RollMode) -> Self {
        self.roll_mode = mode;
        self
    }

    /// Add a content value (builder pattern).
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Does this payload address the given world?
    #[must_use]
    pub fn is_for_world(&self, world: WorldId) -> bool {
        self.world == Some(world)
    }
}
