//! Core engine types: identifiers, positions, entities, dice, configuration.
//!
//! These are the leaves of the engine. Nothing here knows about events,
//! triggers or turns beyond the trigger ids an entity carries.

pub mod config;
pub mod dice;
pub mod entity;
pub mod position;
pub mod rng;

pub use config::{EngineConfig, GridKind, CONFIG_PATH_ENV};
pub use dice::{DiceError, DiceExpr};
pub use entity::{EntityId, EntityKind, GameEntity, Vitals, WorldId};
pub use position::Position;
pub use rng::{GameRng, GameRngState, RollMode};
