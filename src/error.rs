//! Engine error taxonomy.
//!
//! Only configuration problems (bad save data, unknown tags, unregistered
//! functions), invalid placements and failing callbacks surface as errors.
//! Soft runtime misses (a target without hit points, an unparsable
//! perception value) are logged where they happen and never reach this type.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::{EntityId, Position};
use crate::triggers::TriggerId;

/// Result alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by the trigger/event/turn engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A serialized condition or reaction named a type tag nobody registered.
    #[error("Unknown {kind} type: {tag}")]
    UnknownComponent { kind: &'static str, tag: String },

    /// A serialized record referenced a function missing from the function registry.
    #[error("Unknown {kind} function: {name}")]
    UnknownFunction { kind: &'static str, name: String },

    /// A component record had the right tag but unusable arguments.
    #[error("Malformed {tag} record: {reason}")]
    MalformedComponent { tag: String, reason: String },

    /// A required field was absent from a serialized record.
    #[error("Missing field '{field}' in {record} record")]
    MissingField { record: &'static str, field: &'static str },

    /// A trigger chain exceeded the configured depth.
    #[error("Trigger chain deeper than {limit} links")]
    ChainTooDeep { limit: usize },

    /// An entity was placed outside the grid.
    #[error("Cannot place {name} at invalid tile {position}")]
    InvalidPlacement { name: String, position: Position },

    /// An entity with this id is already in the world.
    #[error("Entity {0} already exists")]
    DuplicateEntity(EntityId),

    /// An operation referenced an entity that does not exist.
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// An operation referenced a trigger that does not exist.
    #[error("Unknown trigger: {0}")]
    UnknownTrigger(TriggerId),

    /// A registry refused a registration (duplicate tag or name).
    #[error("Registration rejected: {0}")]
    Registration(String),

    /// A user-supplied callback reported a failure.
    #[error("Callback failed: {0}")]
    Callback(String),

    /// Engine configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Shorthand for callback failures raised from closures.
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback(message.into())
    }
}

/// Failures while loading an [`EngineConfig`](crate::core::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read engine config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
