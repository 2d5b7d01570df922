//! Engine configuration.
//!
//! Content tools configure the engine at startup by providing an
//! `EngineConfig`, either built in code or loaded from JSON:
//!
//! ```json
//! { "width": 12, "height": 8, "grid_kind": "hex", "turn_policy": "exact_turn" }
//! ```
//!
//! Every field has a default, so partial files are fine. `from_env` honours
//! the `TABLETOP_ENGINE_CONFIG` variable as a path override.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::turns::DispatchPolicy;

/// Environment variable naming a JSON config file.
pub const CONFIG_PATH_ENV: &str = "TABLETOP_ENGINE_CONFIG";

/// Grid topology. Determines the adjacency set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridKind {
    /// Four neighbours (N, S, W, E).
    #[default]
    Square,
    /// Six neighbours on three axes.
    Hex,
}

/// Configuration for one engine instance (one simulated world).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grid width in tiles.
    pub width: u32,

    /// Grid height in tiles.
    pub height: u32,

    /// Square or hex adjacency.
    pub grid_kind: GridKind,

    /// Seed for skill checks and dice.
    pub rng_seed: u64,

    /// How the turn manager decides which scheduled entries are due.
    pub turn_policy: DispatchPolicy,

    /// Longest trigger chain accepted from save data.
    pub max_chain_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            grid_kind: GridKind::Square,
            rng_seed: 0,
            turn_policy: DispatchPolicy::ExactTurn,
            max_chain_depth: 32,
        }
    }
}

impl EngineConfig {
    /// Create a config for a grid of the given size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Use hex adjacency (builder pattern).
    #[must_use]
    pub fn hex(mut self) -> Self {
        self.grid_kind = GridKind::Hex;
        self
    }

    /// Set the RNG seed (builder pattern).
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Set the turn-manager dispatch policy (builder pattern).
    #[must_use]
    pub fn with_turn_policy(mut self, policy: DispatchPolicy) -> Self {
        self.turn_policy = policy;
        self
    }

    /// Set the maximum accepted chain depth (builder pattern).
    #[must_use]
    pub fn with_max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = depth;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Load from the file named by `TABLETOP_ENGINE_CONFIG`, or defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from) {
            Some(path) => {
                debug!(path = %path.display(), "Loading engine config");
                Self::from_file(&path)
            }
            None => {
                warn!("{} not set, using default engine config", CONFIG_PATH_ENV);
                Ok(Self::default())
            }
        }
    }
}
