//! Trigger system for event-driven map content.
//!
//! Triggers let tiles, traps and characters respond to events. Event types
//! are plain strings chosen by content ("STEPPED_ON", "TALKED_TO"); the
//! engine only matches them.
//!
//! ## Key Components
//!
//! - [`EventPayload`]: Data delivered with an event
//! - [`Condition`]: When a trigger fires (perception, skill checks, functions)
//! - [`Reaction`]: What a trigger does (damage, alerts, sounds, delayed events)
//! - [`Trigger`]: Event type + condition + reaction, with cooldown and chaining
//! - [`TriggerStore`] / [`TriggerRegistry`]: Ownership and live-set tracking
//! - [`TriggerCodec`]: Save-record decoding against the tag registries
//!
//! ## Design Philosophy
//!
//! Conditions and reactions are closed enums. Anything content needs beyond
//! the built-ins goes through a named function, registered once in the
//! [`FunctionRegistry`] so save records can refer to it by name. Unknown
//! tags and names fail loudly at load time instead of defaulting.
//!
//! ## Example Usage
//!
//! ```
//! use rust_tabletop::core::{EngineConfig, EntityKind, Position, Vitals};
//! use rust_tabletop::engine::Engine;
//! use rust_tabletop::triggers::{Condition, EventPayload, Reaction, Trigger};
//!
//! let mut engine = Engine::new(EngineConfig::new(5, 5));
//! let trap = engine.world_mut().spawn("Spike Trap", EntityKind::Trap);
//! let hero = engine.world_mut().spawn("Hero", EntityKind::Player);
//! engine.world_mut().entity_mut(hero).unwrap().vitals = Some(Vitals::new(20));
//! engine.world_mut().place_entity(trap, Position::new(2, 2)).unwrap();
//!
//! let spikes = Trigger::new("STEPPED_ON", Condition::perception(12), Reaction::damage("piercing", 6))
//!     .with_label("spikes");
//! engine.register_trigger(trap, spikes).unwrap();
//!
//! let payload = EventPayload::new()
//!     .in_world(engine.world_id())
//!     .at(Position::new(2, 2))
//!     .with_target(hero)
//!     .with_value("perception", 15);
//! engine.emit("STEPPED_ON", payload).unwrap();
//!
//! // Perception 15 meets DC 12, so the trap goes off.
//! assert_eq!(engine.world().entity(hero).unwrap().vitals.unwrap().current, 14);
//! ```

mod condition;
mod payload;
pub mod presets;
mod reaction;
mod registry;
mod serialize;
mod trigger;

pub use condition::{parse_perception, Condition, ConditionFn, NamedCondition, SkillCheck, PERCEPTION_KEY};
pub use payload::EventPayload;
pub use presets::presets_for;
pub use reaction::{NamedReaction, Reaction, ReactionFn};
pub use registry::{TriggerId, TriggerRegistry, TriggerStore, UNKNOWN_SOURCE};
pub use serialize::{
    ComponentRegistry, ConditionRegistry, Constructor, EntityRecord, FunctionRegistry,
    ReactionRegistry, TriggerCodec, FUNCTION_TAG, SKILL_CHECK_TAG,
};
pub use trigger::Trigger;
