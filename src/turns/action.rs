//! Actions taken on a turn, and the actors that choose them.

use std::fmt;

use tracing::info;

use crate::core::{DiceExpr, EntityId, Position};
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::triggers::EventPayload;

/// Emitted when an actor has chosen a valid action.
pub const ACTION_PROPOSED: &str = "ACTION_PROPOSED";

/// Emitted after an action has executed.
pub const ACTION_EXECUTED: &str = "ACTION_EXECUTED";

/// Emitted spatially on the destination tile after a move.
pub const ON_ENTER: &str = "ON_ENTER";

/// Something an entity does on its turn.
pub trait Action: fmt::Debug {
    /// Short human-readable description, used in logs and payloads.
    fn describe(&self) -> String;

    /// Check the action can be performed right now.
    fn validate(&self, engine: &Engine) -> Result<(), String>;

    /// Perform the action.
    fn execute(&self, engine: &mut Engine) -> EngineResult<()>;
}

/// Chooses what an entity does when its turn comes up.
pub trait Actor {
    /// Pick an action for `entity`, or `None` to pass.
    fn decide_action(&self, entity: EntityId, engine: &Engine) -> Option<Box<dyn Action>>;
}

/// Closures work as actors.
impl<F> Actor for F
where
    F: Fn(EntityId, &Engine) -> Option<Box<dyn Action>>,
{
    fn decide_action(&self, entity: EntityId, engine: &Engine) -> Option<Box<dyn Action>> {
        self(entity, engine)
    }
}

/// Move an entity to another tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveAction {
    pub entity: EntityId,
    pub to: Position,
}

impl MoveAction {
    #[must_use]
    pub fn new(entity: EntityId, to: Position) -> Self {
        Self { entity, to }
    }
}

impl Action for MoveAction {
    fn describe(&self) -> String {
        format!("{} moves to {}", self.entity, self.to)
    }

    fn validate(&self, engine: &Engine) -> Result<(), String> {
        if engine.world().entity(self.entity).is_none() {
            return Err(format!("{} does not exist", self.entity));
        }
        let grid = engine.world().grid();
        if !grid.is_valid_tile(self.to.x, self.to.y) {
            return Err(format!("{} is off the map", self.to));
        }
        if grid.blocks_movement(self.to) {
            return Err(format!("{} is blocked", self.to));
        }
        Ok(())
    }

    fn execute(&self, engine: &mut Engine) -> EngineResult<()> {
        if !engine.world_mut().move_entity(self.entity, self.to)? {
            return Ok(());
        }
        let payload = EventPayload::new()
            .in_world(engine.world_id())
            .at(self.to)
            .with_source(self.entity);
        engine.emit(ON_ENTER, payload)?;
        Ok(())
    }
}

/// Roll damage dice against a target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrikeAction {
    pub attacker: EntityId,
    pub target: EntityId,
    pub damage: DiceExpr,
    pub damage_type: String,
}

impl StrikeAction {
    pub fn new(attacker: EntityId, target: EntityId, damage: DiceExpr, damage_type: impl Into<String>) -> Self {
        Self {
            attacker,
            target,
            damage,
            damage_type: damage_type.into(),
        }
    }
}

impl Action for StrikeAction {
    fn describe(&self) -> String {
        format!(
            "{} strikes {} for {} {}",
            self.attacker, self.target, self.damage, self.damage_type
        )
    }

    fn validate(&self, engine: &Engine) -> Result<(), String> {
        if engine.world().entity(self.attacker).is_none() {
            return Err(format!("{} does not exist", self.attacker));
        }
        match engine.world().entity(self.target) {
            None => Err(format!("{} does not exist", self.target)),
            Some(target) if target.vitals.is_none() => {
                Err(format!("{} cannot take damage", target.name))
            }
            Some(_) => Ok(()),
        }
    }

    fn execute(&self, engine: &mut Engine) -> EngineResult<()> {
        let amount = self.damage.roll(engine.rng_mut());
        let target = engine
            .world_mut()
            .entity_mut(self.target)
            .ok_or(EngineError::UnknownEntity(self.target))?;
        target.take_damage(amount, &self.damage_type);
        info!(attacker = %self.attacker, target = %self.target, amount, "Strike landed");
        Ok(())
    }
}

/// What happened on a turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The action ran.
    Executed,
    /// Pending reactions were resolved instead; the action did not run.
    Contested,
    /// The action failed validation and did not run.
    Rejected(String),
    /// Nobody acted (no participants, no actor, or the actor passed).
    Idle,
}
