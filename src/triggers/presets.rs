//! Default triggers for new entities, by kind.

use crate::core::EntityKind;

use super::condition::Condition;
use super::reaction::Reaction;
use super::trigger::Trigger;

/// Someone started a conversation with the entity.
pub const TALKED_TO: &str = "TALKED_TO";

/// A player came within the entity's reach.
pub const PLAYER_IN_RANGE: &str = "PLAYER_IN_RANGE";

/// Something stepped on the entity's tile.
pub const STEPPED_ON: &str = "STEPPED_ON";

/// Triggers a freshly created entity of `kind` starts with.
#[must_use]
pub fn presets_for(kind: EntityKind) -> Vec<Trigger> {
    match kind {
        EntityKind::Npc => vec![Trigger::new(
            TALKED_TO,
            Condition::AlwaysTrue,
            Reaction::alert("NPC was talked to"),
        )],
        EntityKind::Enemy => vec![Trigger::new(
            PLAYER_IN_RANGE,
            Condition::AlwaysTrue,
            Reaction::damage("slashing", 1),
        )],
        EntityKind::Trap => vec![Trigger::new(
            STEPPED_ON,
            Condition::perception(12),
            Reaction::damage("piercing", 6),
        )],
        EntityKind::Player | EntityKind::Object => Vec::new(),
    }
}
