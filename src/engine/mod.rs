//! The engine context.
//!
//! One [`Engine`] value owns everything a simulated world needs: the world
//! itself, the event bus, the trigger store and registry, both turn
//! schedulers, the reaction queue, the serialization registries, the RNG and
//! the outside collaborators. Nothing is global, so independent engines
//! never interfere.
//!
//! ## Example Usage
//!
//! ```
//! use rust_tabletop::core::{EngineConfig, EntityKind, Position};
//! use rust_tabletop::engine::Engine;
//! use rust_tabletop::triggers::{Condition, EventPayload, Reaction, Trigger};
//!
//! let mut engine = Engine::new(EngineConfig::new(6, 6).with_seed(7));
//! let bell = engine.world_mut().spawn("Bell", EntityKind::Object);
//!
//! // Ring again three turns after being struck.
//! let echo = Trigger::new("STRUCK", Condition::AlwaysTrue, Reaction::schedule(3, "RING"));
//! engine.register_trigger(bell, echo).unwrap();
//!
//! engine.emit("STRUCK", EventPayload::new()).unwrap();
//! for _ in 0..3 {
//!     engine.next_turn().unwrap();
//! }
//! assert_eq!(engine.current_turn(), 3);
//! ```

mod collaborators;
mod dispatch;

use serde_json::Value;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

pub use collaborators::{AudioError, AudioOutput, Gamemaster, NullAudio};

use crate::bus::{EventBus, HandlerId, Subscriber};
use crate::core::{EngineConfig, EntityId, GameEntity, GameRng, GameRngState, WorldId};
use crate::error::{EngineError, EngineResult};
use crate::queue::ReactionQueue;
use crate::triggers::{
    presets_for, ConditionRegistry, EntityRecord, EventPayload, FunctionRegistry,
    ReactionRegistry, Trigger, TriggerCodec, TriggerId, TriggerRegistry, TriggerStore,
};
use crate::turns::{Actor, TurnManager, TurnSystem};
use crate::world::World;

/// World id used by [`Engine::new`].
pub const DEFAULT_WORLD_ID: WorldId = WorldId::new(1);

/// The trigger/event/turn engine for one world.
pub struct Engine {
    config: EngineConfig,
    world: World,
    bus: EventBus,

    triggers: TriggerStore,
    registry: TriggerRegistry,
    owners: FxHashMap<TriggerId, EntityId>,

    turns: TurnManager<Engine, EventPayload>,
    turn_system: TurnSystem<Engine, EventPayload>,
    actors: FxHashMap<EntityId, Box<dyn Actor>>,
    reactions: ReactionQueue,

    condition_types: ConditionRegistry,
    reaction_types: ReactionRegistry,
    functions: FunctionRegistry,

    rng: GameRng,
    audio: Box<dyn AudioOutput>,
    gamemaster: Option<Box<dyn Gamemaster>>,
}

impl Engine {
    /// Create an engine for [`DEFAULT_WORLD_ID`].
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::for_world(DEFAULT_WORLD_ID, config)
    }

    /// Create an engine for a specific world id.
    #[must_use]
    pub fn for_world(world_id: WorldId, config: EngineConfig) -> Self {
        info!(
            world = %world_id,
            width = config.width,
            height = config.height,
            grid = ?config.grid_kind,
            "Creating engine"
        );
        Self {
            world: World::new(world_id, &config),
            bus: EventBus::new(),
            triggers: TriggerStore::new(),
            registry: TriggerRegistry::new(),
            owners: FxHashMap::default(),
            turns: TurnManager::new(config.turn_policy),
            turn_system: TurnSystem::new(Vec::new()),
            actors: FxHashMap::default(),
            reactions: ReactionQueue::new(),
            condition_types: ConditionRegistry::with_builtins(),
            reaction_types: ReactionRegistry::with_builtins(),
            functions: FunctionRegistry::new(),
            rng: GameRng::new(config.rng_seed),
            audio: Box::new(NullAudio),
            gamemaster: None,
            config,
        }
    }

    /// Create an engine from the config file named by the environment.
    pub fn from_env() -> EngineResult<Self> {
        Ok(Self::new(EngineConfig::from_env()?))
    }

    /// Attach an audio backend (builder pattern).
    #[must_use]
    pub fn with_audio(mut self, audio: impl AudioOutput + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    /// Attach a gamemaster (builder pattern).
    #[must_use]
    pub fn with_gamemaster(mut self, gamemaster: impl Gamemaster + 'static) -> Self {
        self.gamemaster = Some(Box::new(gamemaster));
        self
    }

    // === Accessors ===

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn world_id(&self) -> WorldId {
        self.world.id()
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Store a plain event callback. Subscribe it with
    /// [`subscribe_handler`](Self::subscribe_handler) to receive events.
    pub fn add_handler(
        &mut self,
        handler: impl Fn(&mut Engine, &mut EventPayload) -> EngineResult<()> + 'static,
    ) -> HandlerId {
        self.bus.add_handler(handler)
    }

    /// Subscribe a stored handler. Returns whether the subscription is new.
    pub fn subscribe_handler(&mut self, event_type: &str, id: HandlerId) -> bool {
        self.bus.subscribe(event_type, Subscriber::Handler(id))
    }

    pub fn unsubscribe_handler(&mut self, event_type: &str, id: HandlerId) {
        self.bus.unsubscribe(event_type, Subscriber::Handler(id));
    }

    /// Drop a handler and all its subscriptions.
    pub fn remove_handler(&mut self, id: HandlerId) {
        self.bus.remove_handler(id);
    }

    /// Remove every trigger and every subscription.
    ///
    /// Triggers leave the registry, the bus and their owners together.
    /// Handlers stay stored but are unsubscribed. Must not be called from
    /// inside a dispatch.
    pub fn reset_events(&mut self) {
        let live = self.registry.all();
        info!(triggers = live.len(), "Resetting events");
        for id in live {
            // Every id comes from the registry, so removal cannot miss.
            let _ = self.remove_trigger(id);
        }
        self.bus.reset();
    }

    /// A stored trigger. `None` while the trigger is firing.
    #[must_use]
    pub fn trigger(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.get(id)
    }

    pub fn trigger_mut(&mut self, id: TriggerId) -> Option<&mut Trigger> {
        self.triggers.get_mut(id)
    }

    #[must_use]
    pub fn trigger_registry(&self) -> &TriggerRegistry {
        &self.registry
    }

    /// Entity a trigger is attached to.
    #[must_use]
    pub fn trigger_owner(&self, id: TriggerId) -> Option<EntityId> {
        self.owners.get(&id).copied()
    }

    pub fn rng_mut(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    /// Dice state for a save game.
    #[must_use]
    pub fn rng_state(&self) -> GameRngState {
        self.rng.state()
    }

    /// Continue rolling from a saved dice state.
    pub fn restore_rng(&mut self, state: &GameRngState) {
        self.rng = GameRng::from_state(state);
    }

    pub fn audio_mut(&mut self) -> &mut dyn AudioOutput {
        self.audio.as_mut()
    }

    pub fn set_audio(&mut self, audio: impl AudioOutput + 'static) {
        self.audio = Box::new(audio);
    }

    pub fn gamemaster_mut(&mut self) -> Option<&mut (dyn Gamemaster + 'static)> {
        self.gamemaster.as_deref_mut()
    }

    pub fn set_gamemaster(&mut self, gamemaster: impl Gamemaster + 'static) {
        self.gamemaster = Some(Box::new(gamemaster));
    }

    #[must_use]
    pub fn reactions(&self) -> &ReactionQueue {
        &self.reactions
    }

    pub fn reactions_mut(&mut self) -> &mut ReactionQueue {
        &mut self.reactions
    }

    #[must_use]
    pub fn condition_types(&self) -> &ConditionRegistry {
        &self.condition_types
    }

    pub fn condition_types_mut(&mut self) -> &mut ConditionRegistry {
        &mut self.condition_types
    }

    #[must_use]
    pub fn reaction_types(&self) -> &ReactionRegistry {
        &self.reaction_types
    }

    pub fn reaction_types_mut(&mut self) -> &mut ReactionRegistry {
        &mut self.reaction_types
    }

    #[must_use]
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    /// Decoder for save records using this engine's registries.
    #[must_use]
    pub fn codec(&self) -> TriggerCodec<'_> {
        TriggerCodec {
            conditions: &self.condition_types,
            reactions: &self.reaction_types,
            functions: &self.functions,
            max_chain_depth: self.config.max_chain_depth,
        }
    }

    // === Turns ===

    #[must_use]
    pub fn current_turn(&self) -> u64 {
        self.turns.current_turn()
    }

    /// The current turn, if `world` names this engine's world.
    #[must_use]
    pub fn turn_for(&self, world: Option<WorldId>) -> Option<u64> {
        (world == Some(self.world_id())).then(|| self.turns.current_turn())
    }

    #[must_use]
    pub fn turn_manager(&self) -> &TurnManager<Engine, EventPayload> {
        &self.turns
    }

    #[must_use]
    pub fn turn_system(&self) -> &TurnSystem<Engine, EventPayload> {
        &self.turn_system
    }

    /// Run `callback` with `payload` after `turns` turns.
    pub fn schedule_in(
        &mut self,
        turns: u64,
        callback: impl FnOnce(&mut Engine, EventPayload) -> EngineResult<()> + 'static,
        payload: EventPayload,
    ) {
        self.turns.schedule_in(turns, callback, payload);
    }

    /// Emit `event_type` with `payload` after `turns` turns.
    pub fn schedule_emit(&mut self, turns: u64, event_type: String, payload: EventPayload) {
        debug!(turns, event_type = %event_type, "Scheduling event");
        self.turns.schedule_in(
            turns,
            move |engine, payload| engine.emit(&event_type, payload).map(|_| ()),
            payload,
        );
    }

    /// Run `callback` with `payload` after `rounds` rounds of the turn order.
    pub fn schedule_in_rounds(
        &mut self,
        rounds: u64,
        callback: impl FnOnce(&mut Engine, EventPayload) -> EngineResult<()> + 'static,
        payload: EventPayload,
    ) {
        self.turn_system.schedule_in(rounds, callback, payload);
    }

    /// Set who takes turns, in order.
    pub fn set_turn_order(&mut self, participants: Vec<EntityId>) {
        self.turn_system.set_participants(participants);
    }

    /// Let `actor` decide for `entity` on its turns.
    pub fn set_actor(&mut self, entity: EntityId, actor: impl Actor + 'static) {
        self.actors.insert(entity, Box::new(actor));
    }

    pub fn remove_actor(&mut self, entity: EntityId) {
        self.actors.remove(&entity);
    }

    /// Remove an entity from the world along with everything it owns.
    ///
    /// Its triggers are unsubscribed, unregistered and dropped, its actor is
    /// forgotten and it leaves the turn order.
    pub fn remove_entity(&mut self, entity: EntityId) -> EngineResult<GameEntity> {
        let record = self
            .world
            .entity(entity)
            .ok_or(EngineError::UnknownEntity(entity))?;
        let mut owned = record.triggers.clone();
        owned.extend(
            self.owners
                .iter()
                .filter(|&(id, &owner)| owner == entity && !record.triggers.contains(id))
                .map(|(&id, _)| id),
        );
        for id in owned {
            if self.triggers.contains(id) {
                self.remove_trigger(id)?;
            }
        }
        self.actors.remove(&entity);
        self.turn_system.remove_participant(entity);

        let removed = self
            .world
            .remove_entity(entity)
            .ok_or(EngineError::UnknownEntity(entity))?;
        info!(entity = %entity, name = %removed.name, "Removed entity");
        Ok(removed)
    }

    // === Trigger lifecycle ===

    /// Attach a new trigger to an entity.
    ///
    /// Stores the trigger, registers it (with the entity's name as source
    /// unless it has one) and subscribes it to its event type.
    pub fn register_trigger(&mut self, entity: EntityId, mut trigger: Trigger) -> EngineResult<TriggerId> {
        let owner = self
            .world
            .entity(entity)
            .ok_or(EngineError::UnknownEntity(entity))?;
        if trigger.source.is_none() {
            trigger.source = Some(owner.name.clone());
        }
        let id = self.store_trigger(trigger);
        self.attach_trigger(entity, id)?;
        Ok(id)
    }

    /// Register a trigger that belongs to no entity.
    ///
    /// Only global emits reach it.
    pub fn register_global_trigger(&mut self, trigger: Trigger) -> TriggerId {
        let id = self.store_trigger(trigger);
        self.activate(id);
        id
    }

    fn store_trigger(&mut self, trigger: Trigger) -> TriggerId {
        let label = trigger.label().to_string();
        let id = self.triggers.insert(trigger);
        debug!(trigger = %id, label = %label, "Stored trigger");
        id
    }

    /// Register and subscribe a stored trigger. Idempotent.
    fn activate(&mut self, id: TriggerId) {
        let Some(trigger) = self.triggers.get(id) else {
            return;
        };
        let event_type = trigger.event_type().to_string();
        self.registry.add_trigger(id, trigger.source.as_deref());
        self.bus.subscribe(&event_type, Subscriber::Trigger(id));
    }

    /// Attach an already stored trigger to an entity. Idempotent.
    pub fn attach_trigger(&mut self, entity: EntityId, id: TriggerId) -> EngineResult<()> {
        if !self.triggers.contains(id) {
            return Err(EngineError::UnknownTrigger(id));
        }
        let owner = self
            .world
            .entity_mut(entity)
            .ok_or(EngineError::UnknownEntity(entity))?;
        if !owner.has_trigger(id) {
            owner.triggers.push(id);
        }
        if let Some(previous) = self.owners.insert(id, entity).filter(|&p| p != entity) {
            if let Some(old) = self.world.entity_mut(previous) {
                old.triggers.retain(|&t| t != id);
            }
        }
        self.activate(id);
        Ok(())
    }

    /// Unsubscribe, unregister, detach and drop a trigger.
    ///
    /// A trigger removed while it is firing finishes its current run and is
    /// then dropped; `None` is returned in that case.
    pub fn remove_trigger(&mut self, id: TriggerId) -> EngineResult<Option<Trigger>> {
        if !self.triggers.contains(id) {
            return Err(EngineError::UnknownTrigger(id));
        }
        self.bus.unsubscribe_all(Subscriber::Trigger(id));
        self.registry.remove_trigger(id);
        if let Some(owner) = self.owners.remove(&id) {
            if let Some(entity) = self.world.entity_mut(owner) {
                entity.triggers.retain(|&t| t != id);
            }
        }
        debug!(trigger = %id, "Removed trigger");
        Ok(self.triggers.remove(id))
    }

    /// Give an entity the default triggers for its kind.
    pub fn add_presets(&mut self, entity: EntityId) -> EngineResult<Vec<TriggerId>> {
        let kind = self
            .world
            .entity(entity)
            .ok_or(EngineError::UnknownEntity(entity))?
            .kind;
        presets_for(kind)
            .into_iter()
            .map(|trigger| self.register_trigger(entity, trigger))
            .collect()
    }

    // === Save records ===

    /// Decode a trigger record against this engine's registries.
    pub fn trigger_from_value(&self, record: &Value) -> EngineResult<Trigger> {
        self.codec().decode_trigger(record)
    }

    /// Create an entity from its save record and register its triggers.
    ///
    /// Every trigger is decoded before anything is created, so a bad record
    /// leaves the engine untouched.
    pub fn load_entity(&mut self, record: &Value) -> EngineResult<EntityId> {
        let record: EntityRecord =
            serde_json::from_value(record.clone()).map_err(|err| EngineError::MalformedComponent {
                tag: "entity".to_string(),
                reason: err.to_string(),
            })?;
        let triggers = record
            .triggers
            .iter()
            .map(|t| self.trigger_from_value(t))
            .collect::<EngineResult<Vec<_>>>()?;

        let id = self.world.spawn(record.name, record.entity_type);
        if let Some(entity) = self.world.entity_mut(id) {
            entity.stats = record.stats;
        }
        for trigger in triggers {
            self.register_trigger(id, trigger)?;
        }
        Ok(id)
    }

    /// Encode an entity and its triggers as a save record.
    pub fn entity_to_value(&self, id: EntityId) -> EngineResult<Value> {
        let entity = self.world.entity(id).ok_or(EngineError::UnknownEntity(id))?;
        let triggers = entity
            .triggers
            .iter()
            .map(|&t| {
                self.triggers
                    .get(t)
                    .map(Trigger::to_value)
                    .ok_or(EngineError::UnknownTrigger(t))
            })
            .collect::<EngineResult<Vec<_>>>()?;
        let record = EntityRecord {
            name: entity.name.clone(),
            entity_type: entity.kind,
            stats: entity.stats.clone(),
            triggers,
        };
        serde_json::to_value(record).map_err(|err| EngineError::MalformedComponent {
            tag: "entity".to_string(),
            reason: err.to_string(),
        })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("world", &self.world_id())
            .field("entities", &self.world.entity_count())
            .field("triggers", &self.triggers.len())
            .field("current_turn", &self.turns.current_turn())
            .field("round", &self.turn_system.round_number())
            .field("pending_reactions", &self.reactions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EntityKind, Position};
    use crate::triggers::{Condition, Reaction};
    use serde_json::json;

    fn alert(event: &str) -> Trigger {
        Trigger::new(event, Condition::AlwaysTrue, Reaction::alert("hi"))
    }

    #[test]
    fn test_register_trigger_wires_everything() {
        let mut engine = Engine::new(EngineConfig::default());
        let guard = engine.world_mut().spawn("Guard", EntityKind::Npc);
        let id = engine.register_trigger(guard, alert("TALKED_TO")).unwrap();

        assert!(engine.trigger_registry().is_registered(id));
        assert_eq!(engine.trigger_registry().source_of(id), "Guard");
        assert!(engine.bus().is_subscribed("TALKED_TO", Subscriber::Trigger(id)));
        assert!(engine.world().entity(guard).unwrap().has_trigger(id));
        assert_eq!(engine.trigger_owner(id), Some(guard));
    }

    #[test]
    fn test_register_on_unknown_entity() {
        let mut engine = Engine::new(EngineConfig::default());
        assert!(matches!(
            engine.register_trigger(EntityId(7), alert("X")),
            Err(EngineError::UnknownEntity(EntityId(7)))
        ));
        assert!(engine.trigger_registry().is_empty());
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut engine = Engine::new(EngineConfig::default());
        let guard = engine.world_mut().spawn("Guard", EntityKind::Npc);
        let id = engine.register_trigger(guard, alert("X")).unwrap();
        engine.attach_trigger(guard, id).unwrap();

        assert_eq!(engine.world().entity(guard).unwrap().triggers, vec![id]);
        assert_eq!(engine.bus().subscribers("X").len(), 1);
        assert_eq!(engine.trigger_registry().len(), 1);
    }

    #[test]
    fn test_attach_moves_between_owners() {
        let mut engine = Engine::new(EngineConfig::default());
        let old = engine.world_mut().spawn("Old", EntityKind::Object);
        let new = engine.world_mut().spawn("New", EntityKind::Object);
        let id = engine.register_trigger(old, alert("X")).unwrap();

        engine.attach_trigger(new, id).unwrap();
        assert!(engine.world().entity(old).unwrap().triggers.is_empty());
        assert_eq!(engine.world().entity(new).unwrap().triggers, vec![id]);
        assert_eq!(engine.trigger_owner(id), Some(new));
    }

    #[test]
    fn test_remove_trigger_undoes_registration() {
        let mut engine = Engine::new(EngineConfig::default());
        let guard = engine.world_mut().spawn("Guard", EntityKind::Npc);
        let id = engine.register_trigger(guard, alert("X")).unwrap();

        let removed = engine.remove_trigger(id).unwrap().unwrap();
        assert_eq!(removed.event_type(), "X");
        assert!(!engine.trigger_registry().is_registered(id));
        assert!(engine.bus().subscribers("X").is_empty());
        assert!(engine.world().entity(guard).unwrap().triggers.is_empty());
        assert!(matches!(engine.remove_trigger(id), Err(EngineError::UnknownTrigger(_))));
    }

    #[test]
    fn test_remove_entity_drops_its_triggers() {
        let mut engine = Engine::new(EngineConfig::new(3, 3));
        let guard = engine.world_mut().spawn("Guard", EntityKind::Npc);
        let other = engine.world_mut().spawn("Guard", EntityKind::Npc);
        engine.world_mut().place_entity(guard, Position::new(1, 1)).unwrap();
        let shout = engine.register_trigger(guard, alert("NOISE")).unwrap();
        let wave = engine.register_trigger(guard, alert("WAVE")).unwrap();
        let kept = engine.register_trigger(other, alert("NOISE")).unwrap();
        engine.set_turn_order(vec![other, guard]);

        let removed = engine.remove_entity(guard).unwrap();
        assert_eq!(removed.name, "Guard");
        assert!(engine.world().entity(guard).is_none());
        assert!(engine.world().entities_at(Position::new(1, 1)).is_empty());
        for id in [shout, wave] {
            assert!(engine.trigger(id).is_none());
            assert!(!engine.trigger_registry().is_registered(id));
            assert!(engine.trigger_owner(id).is_none());
        }
        assert_eq!(engine.bus().subscribers("NOISE"), vec![Subscriber::Trigger(kept)]);
        assert!(engine.bus().subscribers("WAVE").is_empty());
        assert_eq!(engine.turn_system().participants(), &[other]);
        assert!(matches!(engine.remove_entity(guard), Err(EngineError::UnknownEntity(_))));
    }

    #[test]
    fn test_reset_events_clears_both_sides() {
        let mut engine = Engine::new(EngineConfig::default());
        let door = engine.world_mut().spawn("Door", EntityKind::Object);
        let owned = engine.register_trigger(door, alert("OPEN")).unwrap();
        let global = engine.register_global_trigger(alert("OPEN"));
        let handler = engine.add_handler(|_, _| Ok(()));
        engine.subscribe_handler("OPEN", handler);

        engine.reset_events();
        assert!(engine.trigger_registry().is_empty());
        assert!(engine.bus().event_types().is_empty());
        assert!(engine.trigger(owned).is_none() && engine.trigger(global).is_none());
        assert!(engine.world().entity(door).unwrap().triggers.is_empty());
        assert!(engine.subscribe_handler("OPEN", handler));
    }

    #[test]
    fn test_presets() {
        let mut engine = Engine::new(EngineConfig::default());
        let trap = engine.world_mut().spawn("Pit", EntityKind::Trap);
        let ids = engine.add_presets(trap).unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(engine.trigger(ids[0]).unwrap().event_type(), "STEPPED_ON");
    }

    #[test]
    fn test_restored_rng_repeats_rolls() {
        let mut engine = Engine::new(EngineConfig::default().with_seed(21));
        engine.rng_mut().roll_die(20);
        let saved = engine.rng_state();
        let first: Vec<_> = (0..5).map(|_| engine.rng_mut().roll_die(20)).collect();

        engine.restore_rng(&saved);
        let again: Vec<_> = (0..5).map(|_| engine.rng_mut().roll_die(20)).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_turn_for_other_world() {
        let engine = Engine::new(EngineConfig::default());
        assert_eq!(engine.turn_for(Some(DEFAULT_WORLD_ID)), Some(0));
        assert_eq!(engine.turn_for(Some(WorldId::new(99))), None);
        assert_eq!(engine.turn_for(None), None);
    }

    #[test]
    fn test_entity_record_round_trip() {
        let mut engine = Engine::new(EngineConfig::default());
        let id = engine
            .load_entity(&json!({
                "name": "Goblin",
                "entity_type": "enemy",
                "stats": {"stealth": 4},
                "triggers": [{
                    "event_type": "PLAYER_IN_RANGE",
                    "label": "stab",
                    "next_trigger": null,
                    "condition": {"type": "AlwaysTrue", "args": {}},
                    "reaction": {"type": "ApplyDamage", "args": {"damage_type": "slashing", "amount": 1}}
                }]
            }))
            .unwrap();

        let goblin = engine.world().entity(id).unwrap();
        assert_eq!(goblin.kind, EntityKind::Enemy);
        assert_eq!(goblin.stats.get("stealth"), Some(&4));
        assert_eq!(goblin.triggers.len(), 1);

        let saved = engine.entity_to_value(id).unwrap();
        assert_eq!(saved["name"], "Goblin");
        assert_eq!(saved["entity_type"], "enemy");
        assert_eq!(saved["triggers"][0]["label"], "stab");
        assert_eq!(saved["triggers"][0]["source"], "Goblin");
    }

    #[test]
    fn test_bad_entity_record_creates_nothing() {
        let mut engine = Engine::new(EngineConfig::default());
        let err = engine
            .load_entity(&json!({
                "name": "Ghost",
                "entity_type": "npc",
                "triggers": [{
                    "event_type": "X",
                    "condition": {"type": "Haunted"},
                    "reaction": {"type": "AlertGamemaster", "args": {"message": "boo"}}
                }]
            }))
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownComponent { .. }));
        assert_eq!(engine.world().entity_count(), 0);
    }
}
