//! Turn driving tests: actors, validation, contested actions and both
//! scheduler policies.

use std::cell::RefCell;
use std::rc::Rc;

use rust_tabletop::core::{DiceExpr, EngineConfig, EntityId, EntityKind, Position, Vitals};
use rust_tabletop::engine::Engine;
use rust_tabletop::queue::ContestedAction;
use rust_tabletop::triggers::{Condition, EventPayload, Reaction, Trigger};
use rust_tabletop::turns::{
    Action, DispatchPolicy, MoveAction, StrikeAction, TurnOutcome, ACTION_EXECUTED, ACTION_PROPOSED,
    ON_ENTER,
};
use rust_tabletop::world::TileTag;

fn walker(to: Position) -> impl Fn(EntityId, &Engine) -> Option<Box<dyn Action>> {
    move |entity: EntityId, _engine: &Engine| Some(Box::new(MoveAction::new(entity, to)) as Box<dyn Action>)
}

fn spawn_at(engine: &mut Engine, name: &str, x: i32, y: i32) -> EntityId {
    let id = engine.world_mut().spawn(name, EntityKind::Player);
    engine.world_mut().place_entity(id, Position::new(x, y)).unwrap();
    id
}

fn watch(engine: &mut Engine, event_type: &str) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&log);
    let handler = engine.add_handler(move |_, payload| {
        let action = payload
            .value("action")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        seen.borrow_mut().push(action);
        Ok(())
    });
    engine.subscribe_handler(event_type, handler);
    log
}

#[test]
fn test_valid_action_executes() {
    let mut engine = Engine::new(EngineConfig::new(4, 4));
    let hero = spawn_at(&mut engine, "Hero", 0, 0);
    engine.set_actor(hero, walker(Position::new(1, 0)));
    engine.set_turn_order(vec![hero]);
    let proposed = watch(&mut engine, ACTION_PROPOSED);
    let executed = watch(&mut engine, ACTION_EXECUTED);

    assert_eq!(engine.execute_turn().unwrap(), TurnOutcome::Executed);
    assert_eq!(engine.world().entity(hero).unwrap().position, Some(Position::new(1, 0)));
    assert_eq!(*proposed.borrow(), vec!["Entity(1) moves to (1,0)"]);
    assert_eq!(*executed.borrow(), vec!["Entity(1) moves to (1,0)"]);
}

#[test]
fn test_move_fires_on_enter_at_destination() {
    let mut engine = Engine::new(EngineConfig::new(4, 4));
    let hero = spawn_at(&mut engine, "Hero", 0, 0);
    engine.world_mut().entity_mut(hero).unwrap().vitals = Some(Vitals::new(10));
    let plate = spawn_at(&mut engine, "Pressure Plate", 2, 0);
    engine
        .register_trigger(plate, Trigger::new(ON_ENTER, Condition::AlwaysTrue, Reaction::function(
            "crush_mover",
            |engine, payload| {
                if let Some(mover) = payload.source {
                    if let Some(entity) = engine.world_mut().entity_mut(mover) {
                        entity.take_damage(3, "bludgeoning");
                    }
                }
                Ok(())
            },
        )))
        .unwrap();

    engine.set_actor(hero, walker(Position::new(2, 0)));
    engine.set_turn_order(vec![hero]);
    engine.execute_turn().unwrap();
    assert_eq!(engine.world().entity(hero).unwrap().vitals.unwrap().current, 7);
}

#[test]
fn test_invalid_action_is_rejected() {
    let mut engine = Engine::new(EngineConfig::new(4, 4));
    let hero = spawn_at(&mut engine, "Hero", 0, 0);
    engine
        .world_mut()
        .grid_mut()
        .tag_tile(Position::new(1, 0), TileTag::BlocksMovement);
    engine.set_actor(hero, walker(Position::new(1, 0)));
    engine.set_turn_order(vec![hero]);
    let proposed = watch(&mut engine, ACTION_PROPOSED);

    let outcome = engine.execute_turn().unwrap();
    assert!(matches!(outcome, TurnOutcome::Rejected(reason) if reason.contains("blocked")));
    assert_eq!(engine.world().entity(hero).unwrap().position, Some(Position::new(0, 0)));
    assert!(proposed.borrow().is_empty());
}

#[test]
fn test_contested_action_is_withheld() {
    let mut engine = Engine::new(EngineConfig::new(4, 4));
    let hero = spawn_at(&mut engine, "Hero", 0, 0);
    let guard = spawn_at(&mut engine, "Guard", 3, 3);
    engine.set_actor(hero, walker(Position::new(0, 1)));
    engine.set_turn_order(vec![hero, guard]);

    let interrupt = Reaction::function("attack_of_opportunity", move |engine, payload| {
        let action = payload
            .value("action")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        engine.reactions_mut().add(Box::new(ContestedAction::new(guard, action)));
        Ok(())
    });
    engine
        .register_trigger(guard, Trigger::new(ACTION_PROPOSED, Condition::AlwaysTrue, interrupt))
        .unwrap();
    let executed = watch(&mut engine, ACTION_EXECUTED);

    assert_eq!(engine.execute_turn().unwrap(), TurnOutcome::Contested);
    assert_eq!(engine.world().entity(hero).unwrap().position, Some(Position::new(0, 0)));
    assert!(engine.reactions().is_empty());
    assert!(executed.borrow().is_empty());
    assert_eq!(engine.turn_system().current(), Some(guard));
}

#[test]
fn test_turn_rotates_and_idles() {
    let mut engine = Engine::new(EngineConfig::new(4, 4));
    let a = spawn_at(&mut engine, "A", 0, 0);
    let b = spawn_at(&mut engine, "B", 1, 1);
    engine.set_turn_order(vec![a, b]);

    assert_eq!(engine.execute_turn().unwrap(), TurnOutcome::Idle);
    assert_eq!(engine.turn_system().current(), Some(b));
    assert_eq!(engine.execute_turn().unwrap(), TurnOutcome::Idle);
    assert_eq!(engine.turn_system().current(), Some(a));
}

#[test]
fn test_strike_rolls_damage() {
    let mut engine = Engine::new(EngineConfig::new(4, 4).with_seed(99));
    let hero = spawn_at(&mut engine, "Hero", 0, 0);
    let orc = spawn_at(&mut engine, "Orc", 1, 0);
    engine.world_mut().entity_mut(orc).unwrap().vitals = Some(Vitals::new(30));
    let dice = DiceExpr::parse("2d6+1").unwrap();
    let strike = StrikeAction::new(hero, orc, dice.clone(), "slashing");
    engine.set_actor(hero, move |_: EntityId, _: &Engine| {
        Some(Box::new(strike.clone()) as Box<dyn Action>)
    });
    engine.set_turn_order(vec![hero]);

    assert_eq!(engine.execute_turn().unwrap(), TurnOutcome::Executed);
    let lost = 30 - engine.world().entity(orc).unwrap().vitals.unwrap().current;
    assert!((dice.min_total()..=dice.max_total()).contains(&lost));
}

#[test]
fn test_round_schedule_catches_up() {
    let mut engine = Engine::new(EngineConfig::default());
    let ran = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&ran);
    engine.schedule_in_rounds(
        1,
        move |engine, _| {
            log.borrow_mut().push(engine.turn_system().round_number());
            Ok(())
        },
        EventPayload::new(),
    );

    // Round 2 starts and its entry runs straight away.
    assert_eq!(engine.start_round().unwrap(), 2);
    assert_eq!(*ran.borrow(), vec![2]);

    let log = Rc::clone(&ran);
    engine.schedule_in_rounds(
        0,
        move |engine, _| {
            log.borrow_mut().push(engine.turn_system().round_number() * 10);
            Ok(())
        },
        EventPayload::new(),
    );

    // Nobody is in the turn order; ending the turn still dispatches.
    engine.execute_turn().unwrap();
    assert_eq!(*ran.borrow(), vec![2, 20]);
}

#[test]
fn test_manager_policies() {
    let schedule_now = |engine: &mut Engine, hits: &Rc<RefCell<u32>>| {
        let hits = Rc::clone(hits);
        engine.schedule_in(
            0,
            move |_, _| {
                *hits.borrow_mut() += 1;
                Ok(())
            },
            EventPayload::new(),
        );
    };

    let exact_hits = Rc::new(RefCell::new(0));
    let mut exact = Engine::new(EngineConfig::default());
    schedule_now(&mut exact, &exact_hits);
    exact.next_turn().unwrap();
    assert_eq!(*exact_hits.borrow(), 0);
    assert_eq!(exact.turn_manager().pending(), 0);

    let lenient_hits = Rc::new(RefCell::new(0));
    let mut lenient =
        Engine::new(EngineConfig::default().with_turn_policy(DispatchPolicy::AtOrBefore));
    schedule_now(&mut lenient, &lenient_hits);
    lenient.next_turn().unwrap();
    assert_eq!(*lenient_hits.borrow(), 1);
}
