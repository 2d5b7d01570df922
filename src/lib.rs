//! # rust-tabletop
//!
//! A trigger, event and turn engine for tabletop RPG maps.
//!
//! Map content ("step on this tile", "talk to this guard", "a spell is cast")
//! emits events. Triggers attached to entities answer them with reactions
//! (damage, gamemaster alerts, sounds, delayed events), gated by conditions,
//! cooldowns and line of sight, and can chain into further triggers.
//!
//! ## Design Principles
//!
//! 1. **One context, no globals**: An [`Engine`] owns the world, the event
//!    bus, the triggers, both turn schedulers and the reaction queue. Two
//!    engines never share state.
//!
//! 2. **Closed variants, named extensions**: Conditions and reactions are
//!    enums. Custom behaviour is a named function, so save records stay
//!    lossless.
//!
//! 3. **Deterministic**: Every roll goes through a seeded [`GameRng`]. Same
//!    seed, same session.
//!
//! ## Modules
//!
//! - `core`: Ids, positions, entities, dice, RNG, configuration
//! - `world`: Tile grid and line of sight
//! - `triggers`: Payloads, conditions, reactions, triggers, save records
//! - `bus`: Subscriber table
//! - `turns`: Turn manager, round-based turn system, actions
//! - `queue`: Reaction queue for contested actions
//! - `engine`: The context object and event delivery
//! - `error`: Error types

pub mod bus;
pub mod core;
pub mod engine;
pub mod error;
pub mod queue;
pub mod triggers;
pub mod turns;
pub mod world;

// Re-export commonly used types
pub use crate::core::{
    DiceExpr, EngineConfig, EntityId, EntityKind, GameEntity, GameRng, GridKind, Position,
    RollMode, Vitals, WorldId,
};

pub use crate::world::{TileGrid, TileTag, World};

pub use crate::triggers::{
    Condition, EventPayload, FunctionRegistry, Reaction, SkillCheck, Trigger, TriggerId,
    TriggerRegistry,
};

pub use crate::bus::{EventBus, HandlerId, Subscriber};

pub use crate::turns::{Action, Actor, DispatchPolicy, TurnManager, TurnOutcome, TurnSystem};

pub use crate::queue::{ContestedAction, QueuedReaction, ReactionQueue, REACTION_RESOLVED};

pub use crate::engine::{AudioOutput, Engine, Gamemaster};

pub use crate::error::{ConfigError, EngineError, EngineResult};
