//! Entity identification and the entity record consumed by the engine.
//!
//! The engine does not own the character-sheet model. It only needs an
//! identity, a position, an optional vision range, the triggers bound to the
//! entity and, for damage reactions, the `take_damage` capability (`Vitals`).
//!
//! ```
//! use rust_tabletop::core::{EntityId, EntityKind, GameEntity, Vitals};
//!
//! let mut guard = GameEntity::new(EntityId(1), "Guard", EntityKind::Npc)
//!     .with_vision_range(3)
//!     .with_vitals(Vitals::new(10));
//!
//! assert!(guard.take_damage(4, "slashing"));
//! assert_eq!(guard.vitals.map(|v| v.current), Some(6));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::triggers::TriggerId;

use super::Position;

/// Unique identifier for an entity placed in (or known to) a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Identifier of a simulated world.
///
/// Payloads carry a `WorldId` to make the world (and its turn counter)
/// reachable from event handlers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldId(pub u32);

impl WorldId {
    /// Create a new world ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for WorldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "World({})", self.0)
    }
}

/// Broad category of an entity. Drives trigger presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Player,
    Npc,
    Enemy,
    Trap,
    Object,
}

impl EntityKind {
    /// The lowercase tag used in save records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Npc => "npc",
            Self::Enemy => "enemy",
            Self::Trap => "trap",
            Self::Object => "object",
        }
    }
}

/// Hit points. Presence of this record is the `take_damage` capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    pub current: i64,
    pub max: i64,
}

impl Vitals {
    /// Full health with the given maximum.
    #[must_use]
    pub const fn new(max: i64) -> Self {
        Self { current: max, max }
    }

    /// Is the owner still standing?
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.current > 0
    }
}

/// An entity as seen by the trigger engine.
#[derive(Clone, Debug)]
pub struct GameEntity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,

    /// Current tile, `None` until placed in a world.
    pub position: Option<Position>,

    /// How far the entity notices spatial events.
    /// `None` means the entity is notified of every spatial event.
    pub vision_range: Option<u32>,

    /// Damage capability. Entities without vitals ignore damage.
    pub vitals: Option<Vitals>,

    /// Skill modifiers (perception, athletics, ...).
    pub stats: BTreeMap<String, i64>,

    /// Triggers bound to this entity, in registration order.
    pub triggers: Vec<TriggerId>,
}

impl GameEntity {
    /// Create an unplaced entity with no vision limit and no vitals.
    pub fn new(id: EntityId, name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            position: None,
            vision_range: None,
            vitals: None,
            stats: BTreeMap::new(),
            triggers: Vec::new(),
        }
    }

    /// Limit how far this entity notices spatial events (builder pattern).
    #[must_use]
    pub fn with_vision_range(mut self, range: u32) -> Self {
        self.vision_range = Some(range);
        self
    }

    /// Give the entity hit points (builder pattern).
    #[must_use]
    pub fn with_vitals(mut self, vitals: Vitals) -> Self {
        self.vitals = Some(vitals);
        self
    }

    /// Set a skill modifier (builder pattern).
    #[must_use]
    pub fn with_stat(mut self, skill: impl Into<String>, modifier: i64) -> Self {
        self.stats.insert(skill.into(), modifier);
        self
    }

    /// Apply damage. Returns `false` when the entity has no vitals.
    pub fn take_damage(&mut self, amount: i64, damage_type: &str) -> bool {
        let Some(vitals) = self.vitals.as_mut() else {
            return false;
        };
        vitals.current = vitals.current.saturating_sub(amount).max(0);
        debug!(
            entity = %self.name,
            amount,
            damage_type,
            remaining = vitals.current,
            "Entity took damage"
        );
        true
    }

    /// Is this trigger bound to the entity?
    #[must_use]
    pub fn has_trigger(&self, id: TriggerId) -> bool {
        self.triggers.contains(&id)
    }
}
