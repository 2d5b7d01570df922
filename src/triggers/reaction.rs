//! Trigger reactions.
//!
//! A reaction is what a trigger does once its condition passes. Reactions
//! act on the engine: they damage entities, alert the gamemaster, play
//! sounds or schedule follow-up events.

use std::fmt;
use std::path::Path;
use std::rc::Rc;

use tracing::{info, warn};

use crate::engine::Engine;
use crate::error::EngineResult;

use super::payload::EventPayload;

/// Signature of a registered reaction function.
pub type ReactionFn = Rc<dyn Fn(&mut Engine, &mut EventPayload) -> EngineResult<()>>;

/// A reaction function together with the name it is saved under.
#[derive(Clone)]
pub struct NamedReaction {
    name: String,
    func: ReactionFn,
}

impl NamedReaction {
    pub fn new(
        name: impl Into<String>,
        func: impl Fn(&mut Engine, &mut EventPayload) -> EngineResult<()> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    pub(crate) fn from_shared(name: impl Into<String>, func: ReactionFn) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared(&self) -> ReactionFn {
        Rc::clone(&self.func)
    }

    pub fn call(&self, engine: &mut Engine, payload: &mut EventPayload) -> EngineResult<()> {
        (self.func)(engine, payload)
    }
}

impl fmt::Debug for NamedReaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NamedReaction").field(&self.name).finish()
    }
}

impl PartialEq for NamedReaction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// An effect run by a trigger.
#[derive(Clone, Debug, PartialEq)]
pub enum Reaction {
    /// Damage the payload's target. Targets without hit points are skipped.
    ApplyDamage { damage_type: String, amount: i64 },

    /// Log a message for the gamemaster and flag it on the attached one.
    AlertGamemaster { message: String },

    /// Play a sound through the engine's audio output.
    PlaySound { sound_file: String },

    /// Emit `event_type` with a copy of the current payload `turns` turns later.
    ScheduleEvent { turns: u64, event_type: String },

    /// A registered function.
    Function(NamedReaction),
}

impl Reaction {
    pub fn damage(damage_type: impl Into<String>, amount: i64) -> Self {
        Self::ApplyDamage {
            damage_type: damage_type.into(),
            amount,
        }
    }

    pub fn alert(message: impl Into<String>) -> Self {
        Self::AlertGamemaster {
            message: message.into(),
        }
    }

    pub fn sound(sound_file: impl Into<String>) -> Self {
        Self::PlaySound {
            sound_file: sound_file.into(),
        }
    }

    pub fn schedule(turns: u64, event_type: impl Into<String>) -> Self {
        Self::ScheduleEvent {
            turns,
            event_type: event_type.into(),
        }
    }

    pub fn function(
        name: impl Into<String>,
        func: impl Fn(&mut Engine, &mut EventPayload) -> EngineResult<()> + 'static,
    ) -> Self {
        Self::Function(NamedReaction::new(name, func))
    }

    /// Type tag used in save records and derived labels.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ApplyDamage { .. } => "ApplyDamage",
            Self::AlertGamemaster { .. } => "AlertGamemaster",
            Self::PlaySound { .. } => "PlaySound",
            Self::ScheduleEvent { .. } => "ScheduleEvent",
            Self::Function(_) => "function",
        }
    }

    #[must_use]
    pub fn is_damage(&self) -> bool {
        matches!(self, Self::ApplyDamage { .. })
    }

    /// Run the reaction. Soft misses are logged; function errors propagate.
    pub fn execute(&self, engine: &mut Engine, payload: &mut EventPayload) -> EngineResult<()> {
        match self {
            Self::ApplyDamage {
                damage_type,
                amount,
            } => {
                let target = match payload.target {
                    Some(id) => engine.world_mut().entity_mut(id),
                    None => None,
                };
                let damaged =
                    target.is_some_and(|entity| entity.take_damage(*amount, damage_type));
                if !damaged {
                    warn!(target = ?payload.target, "ApplyDamage: invalid or missing target");
                }
                Ok(())
            }
            Self::AlertGamemaster { message } => {
                info!(message = %message, "GM alert");
                if let Some(gm) = engine.gamemaster_mut() {
                    gm.flag_event(message);
                }
                Ok(())
            }
            Self::PlaySound { sound_file } => {
                if let Err(err) = engine.audio_mut().play(Path::new(sound_file)) {
                    warn!(sound_file = %sound_file, error = %err, "Could not play sound");
                }
                Ok(())
            }
            Self::ScheduleEvent { turns, event_type } => {
                engine.schedule_emit(*turns, event_type.clone(), payload.clone());
                Ok(())
            }
            Self::Function(named) => named.call(engine, payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EngineConfig, EntityKind, Vitals};
    use crate::error::EngineError;

    fn engine() -> Engine {
        Engine::new(EngineConfig::new(4, 4))
    }

    #[test]
    fn test_apply_damage_hits_target() {
        let mut engine = engine();
        let orc = engine.world_mut().spawn("Orc", EntityKind::Enemy);
        engine.world_mut().entity_mut(orc).unwrap().vitals = Some(Vitals::new(10));

        let mut payload = EventPayload::new().with_target(orc);
        Reaction::damage("fire", 4).execute(&mut engine, &mut payload).unwrap();

        assert_eq!(engine.world().entity(orc).unwrap().vitals.unwrap().current, 6);
    }

    #[test]
    fn test_apply_damage_soft_misses() {
        let mut engine = engine();
        let rock = engine.world_mut().spawn("Rock", EntityKind::Object);

        let mut no_target = EventPayload::new();
        assert!(Reaction::damage("fire", 4).execute(&mut engine, &mut no_target).is_ok());

        let mut no_vitals = EventPayload::new().with_target(rock);
        assert!(Reaction::damage("fire", 4).execute(&mut engine, &mut no_vitals).is_ok());
    }

    #[test]
    fn test_play_sound_without_backend_is_soft() {
        let mut engine = engine();
        let mut payload = EventPayload::new();
        assert!(Reaction::sound("sfx/creak.wav").execute(&mut engine, &mut payload).is_ok());
    }

    #[test]
    fn test_function_error_propagates() {
        let mut engine = engine();
        let mut payload = EventPayload::new();
        let boom = Reaction::function("boom", |_, _| Err(EngineError::callback("boom")));
        assert!(matches!(
            boom.execute(&mut engine, &mut payload),
            Err(EngineError::Callback(_))
        ));
    }

    #[test]
    fn test_function_can_mutate_payload() {
        let mut engine = engine();
        let mut payload = EventPayload::new();
        let mark = Reaction::function("mark", |_, p| {
            p.set_value("marked", true);
            Ok(())
        });
        mark.execute(&mut engine, &mut payload).unwrap();
        assert_eq!(payload.value("marked"), Some(&serde_json::Value::Bool(true)));
    }

    #[test]
    fn test_tags() {
        assert_eq!(Reaction::damage("cold", 1).tag(), "ApplyDamage");
        assert_eq!(Reaction::alert("x").tag(), "AlertGamemaster");
        assert_eq!(Reaction::sound("x").tag(), "PlaySound");
        assert_eq!(Reaction::schedule(1, "X").tag(), "ScheduleEvent");
        assert!(Reaction::damage("cold", 1).is_damage());
    }
}
