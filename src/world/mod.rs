//! The simulated world: a tile grid plus the entities placed on it.
//!
//! ## Design Philosophy
//!
//! Entities are stored once, keyed by id, in the `World`. Tiles only hold
//! occupant ids, so moving an entity touches two occupant lists and the
//! entity's own `position` and nothing else. Iteration over entities is in
//! id order, which keeps spatial delivery deterministic.
//!
//! ## Example Usage
//!
//! ```
//! use rust_tabletop::core::{EngineConfig, EntityKind, Position, WorldId};
//! use rust_tabletop::world::World;
//!
//! let mut world = World::new(WorldId::new(1), &EngineConfig::new(4, 4));
//! let guard = world.spawn("Guard", EntityKind::Npc);
//!
//! world.place_entity(guard, Position::new(1, 1)).unwrap();
//! assert_eq!(world.entities_at(Position::new(1, 1)), vec![guard]);
//!
//! // Moving off the map is refused, not an error.
//! assert!(!world.move_entity(guard, Position::new(9, 9)).unwrap());
//! ```

mod grid;

use std::collections::BTreeMap;

use tracing::{debug, warn};

pub use grid::{line_between, Neighbours, Terrain, Tile, TileGrid, TileTag};

use crate::core::{EngineConfig, EntityId, EntityKind, GameEntity, Position, WorldId};
use crate::error::{EngineError, EngineResult};

/// A grid and the entities in it.
#[derive(Clone, Debug)]
pub struct World {
    id: WorldId,
    grid: TileGrid,
    entities: BTreeMap<EntityId, GameEntity>,
    next_entity_id: u32,
}

impl World {
    /// Create an empty world sized by `config`.
    #[must_use]
    pub fn new(id: WorldId, config: &EngineConfig) -> Self {
        Self {
            id,
            grid: TileGrid::new(config.width, config.height, config.grid_kind),
            entities: BTreeMap::new(),
            next_entity_id: 1,
        }
    }

    #[must_use]
    pub fn id(&self) -> WorldId {
        self.id
    }

    #[must_use]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut TileGrid {
        &mut self.grid
    }

    /// Allocate a fresh entity id, skipping ids already in use.
    pub fn alloc_entity_id(&mut self) -> EntityId {
        while self.entities.contains_key(&EntityId(self.next_entity_id)) {
            self.next_entity_id = self.next_entity_id.wrapping_add(1);
        }
        let id = EntityId(self.next_entity_id);
        self.next_entity_id = self.next_entity_id.wrapping_add(1);
        id
    }

    /// Create an unplaced entity and return its id.
    pub fn spawn(&mut self, name: impl Into<String>, kind: EntityKind) -> EntityId {
        let id = self.alloc_entity_id();
        self.entities.insert(id, GameEntity::new(id, name, kind));
        id
    }

    /// Insert a pre-built entity under its own id.
    ///
    /// An entity that already carries a position is placed there. A taken id
    /// or an invalid position is refused and leaves the world unchanged.
    pub fn insert_entity(&mut self, entity: GameEntity) -> EngineResult<EntityId> {
        let id = entity.id;
        if self.entities.contains_key(&id) {
            return Err(EngineError::DuplicateEntity(id));
        }
        if let Some(pos) = entity.position {
            if !self.grid.is_valid_tile(pos.x, pos.y) {
                return Err(EngineError::InvalidPlacement {
                    name: entity.name,
                    position: pos,
                });
            }
            self.grid.add_occupant(pos, id);
        }
        if let Some(next) = id.raw().checked_add(1) {
            self.next_entity_id = self.next_entity_id.max(next);
        }
        self.entities.insert(id, entity);
        Ok(id)
    }

    /// Remove an entity and clear it from its tile.
    ///
    /// Triggers are not touched here; [`Engine::remove_entity`](crate::engine::Engine::remove_entity)
    /// removes an entity together with its triggers.
    pub(crate) fn remove_entity(&mut self, id: EntityId) -> Option<GameEntity> {
        let entity = self.entities.remove(&id)?;
        if let Some(pos) = entity.position {
            self.grid.remove_occupant(pos, id);
        }
        Some(entity)
    }

    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&GameEntity> {
        self.entities.get(&id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut GameEntity> {
        self.entities.get_mut(&id)
    }

    /// All entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &GameEntity> {
        self.entities.values()
    }

    /// Number of entities, placed or not.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Put an entity on a tile, relocating it if it was already placed.
    ///
    /// Placement is expected to be valid, so an out-of-bounds tile is an error.
    pub fn place_entity(&mut self, id: EntityId, pos: Position) -> EngineResult<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(EngineError::UnknownEntity(id))?;

        if !self.grid.is_valid_tile(pos.x, pos.y) {
            return Err(EngineError::InvalidPlacement {
                name: entity.name.clone(),
                position: pos,
            });
        }

        if let Some(old) = entity.position.replace(pos) {
            self.grid.remove_occupant(old, id);
        }
        self.grid.add_occupant(pos, id);
        debug!(entity = %id, position = %pos, "Placed entity");
        Ok(())
    }

    /// Move an entity. An invalid destination is logged and ignored.
    ///
    /// Returns whether the entity moved.
    pub fn move_entity(&mut self, id: EntityId, pos: Position) -> EngineResult<bool> {
        if !self.entities.contains_key(&id) {
            return Err(EngineError::UnknownEntity(id));
        }
        if !self.grid.is_valid_tile(pos.x, pos.y) {
            warn!(entity = %id, position = %pos, "Refusing move to invalid tile");
            return Ok(false);
        }
        self.place_entity(id, pos)?;
        Ok(true)
    }

    /// Entities on a tile, in arrival order.
    #[must_use]
    pub fn entities_at(&self, pos: Position) -> Vec<EntityId> {
        self.grid.occupants(pos).to_vec()
    }

    /// Every placed entity with its position, in id order.
    #[must_use]
    pub fn placed_entities(&self) -> Vec<(EntityId, Position)> {
        self.entities
            .values()
            .filter_map(|e| e.position.map(|p| (e.id, p)))
            .collect()
    }

    /// Line of sight on this world's grid.
    #[must_use]
    pub fn can_see(&self, from: Position, to: Position, max_range: u32) -> bool {
        self.grid.can_see(from, to, max_range)
    }
}
