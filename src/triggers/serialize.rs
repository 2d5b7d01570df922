//! Save-record encoding for triggers, conditions and reactions.
//!
//! ## Record Format
//!
//! ```json
//! {
//!   "event_type": "STEPPED_ON",
//!   "label": "STEPPED_ON:ApplyDamage",
//!   "next_trigger": null,
//!   "condition": {"type": "PerceptionCheck", "args": {"dc": 12}},
//!   "reaction": {"type": "ApplyDamage", "args": {"damage_type": "piercing", "amount": 6}}
//! }
//! ```
//!
//! Skill checks are written flat (`{"type": "SkillCheck", "skill", "dc"}`)
//! and registered functions by name (`{"type": "function", "name"}`).
//! `source` and `cooldown` are written only when set.
//!
//! Decoding is strict: an unknown type tag, an unregistered function name or
//! unusable arguments all fail the whole record.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::core::EntityKind;
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};

use super::condition::{Condition, ConditionFn, NamedCondition, SkillCheck};
use super::payload::EventPayload;
use super::reaction::{NamedReaction, Reaction, ReactionFn};
use super::trigger::Trigger;

/// Type tag of a function reference.
pub const FUNCTION_TAG: &str = "function";

/// Type tag of a flat skill-check record.
pub const SKILL_CHECK_TAG: &str = "SkillCheck";

/// Builds a component from its `args` object.
pub type Constructor<T> = fn(&Value) -> EngineResult<T>;

/// Tag to constructor map for one component kind.
///
/// Registrations are append-only: a tag, once registered, cannot be
/// replaced.
#[derive(Clone, Debug)]
pub struct ComponentRegistry<T> {
    kind: &'static str,
    constructors: FxHashMap<String, Constructor<T>>,
    order: Vec<String>,
}

pub type ConditionRegistry = ComponentRegistry<Condition>;
pub type ReactionRegistry = ComponentRegistry<Reaction>;

impl<T> ComponentRegistry<T> {
    /// An empty registry for components of `kind` ("condition", "reaction").
    #[must_use]
    pub fn empty(kind: &'static str) -> Self {
        Self {
            kind,
            constructors: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// Register a constructor under `tag`.
    pub fn register(&mut self, tag: impl Into<String>, constructor: Constructor<T>) -> EngineResult<()> {
        let tag = tag.into();
        if tag == FUNCTION_TAG || self.constructors.contains_key(&tag) {
            return Err(EngineError::Registration(format!(
                "{} type '{}' is already registered",
                self.kind, tag
            )));
        }
        debug!(kind = self.kind, tag = %tag, "Registered component type");
        self.constructors.insert(tag.clone(), constructor);
        self.order.push(tag);
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Build a component from its tag and `args`.
    pub fn create(&self, tag: &str, args: &Value) -> EngineResult<T> {
        let constructor = self
            .constructors
            .get(tag)
            .ok_or_else(|| EngineError::UnknownComponent {
                kind: self.kind,
                tag: tag.to_string(),
            })?;
        constructor(args)
    }

    /// Registered tags, in registration order.
    #[must_use]
    pub fn list_keys(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }
}

impl ConditionRegistry {
    /// Registry pre-populated with the built-in conditions.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty("condition");
        registry.insert_builtin("AlwaysTrue", |_| Ok(Condition::AlwaysTrue));
        registry.insert_builtin("PerceptionCheck", |args| {
            let DcArgs { dc } = parse_args("PerceptionCheck", args)?;
            Ok(Condition::PerceptionCheck { dc })
        });
        registry
    }
}

impl Default for ConditionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ReactionRegistry {
    /// Registry pre-populated with the built-in reactions.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty("reaction");
        registry.insert_builtin("ApplyDamage", |args| {
            let DamageArgs { damage_type, amount } = parse_args("ApplyDamage", args)?;
            Ok(Reaction::ApplyDamage { damage_type, amount })
        });
        registry.insert_builtin("AlertGamemaster", |args| {
            let MessageArgs { message } = parse_args("AlertGamemaster", args)?;
            Ok(Reaction::AlertGamemaster { message })
        });
        registry.insert_builtin("PlaySound", |args| {
            let SoundArgs { sound_file } = parse_args("PlaySound", args)?;
            Ok(Reaction::PlaySound { sound_file })
        });
        registry.insert_builtin("ScheduleEvent", |args| {
            let ScheduleArgs { turns, event_type } = parse_args("ScheduleEvent", args)?;
            Ok(Reaction::ScheduleEvent { turns, event_type })
        });
        registry
    }
}

impl Default for ReactionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl<T> ComponentRegistry<T> {
    fn insert_builtin(&mut self, tag: &str, constructor: Constructor<T>) {
        self.constructors.insert(tag.to_string(), constructor);
        self.order.push(tag.to_string());
    }
}

#[derive(Deserialize)]
struct DcArgs {
    dc: i64,
}

#[derive(Deserialize)]
struct DamageArgs {
    damage_type: String,
    amount: i64,
}

#[derive(Deserialize)]
struct MessageArgs {
    message: String,
}

#[derive(Deserialize)]
struct SoundArgs {
    sound_file: String,
}

#[derive(Deserialize)]
struct ScheduleArgs {
    turns: u64,
    event_type: String,
}

fn parse_args<A: DeserializeOwned>(tag: &str, args: &Value) -> EngineResult<A> {
    A::deserialize(args).map_err(|err| EngineError::MalformedComponent {
        tag: tag.to_string(),
        reason: err.to_string(),
    })
}

/// Named functions that save records refer to with `{"type": "function"}`.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    conditions: FxHashMap<String, ConditionFn>,
    reactions: FxHashMap<String, ReactionFn>,
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut conditions: Vec<_> = self.conditions.keys().collect();
        let mut reactions: Vec<_> = self.reactions.keys().collect();
        conditions.sort();
        reactions.sort();
        f.debug_struct("FunctionRegistry")
            .field("conditions", &conditions)
            .field("reactions", &reactions)
            .finish()
    }
}

impl FunctionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a condition function and return a condition that calls it.
    pub fn register_condition(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&EventPayload) -> bool + 'static,
    ) -> EngineResult<Condition> {
        let named = NamedCondition::new(name, func);
        if self.conditions.contains_key(named.name()) {
            return Err(EngineError::Registration(format!(
                "condition function '{}' is already registered",
                named.name()
            )));
        }
        self.conditions.insert(named.name().to_string(), named.shared());
        Ok(Condition::Function(named))
    }

    /// Register a reaction function and return a reaction that calls it.
    pub fn register_reaction(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(&mut Engine, &mut EventPayload) -> EngineResult<()> + 'static,
    ) -> EngineResult<Reaction> {
        let named = NamedReaction::new(name, func);
        if self.reactions.contains_key(named.name()) {
            return Err(EngineError::Registration(format!(
                "reaction function '{}' is already registered",
                named.name()
            )));
        }
        self.reactions.insert(named.name().to_string(), named.shared());
        Ok(Reaction::Function(named))
    }

    #[must_use]
    pub fn condition(&self, name: &str) -> Option<Condition> {
        self.conditions
            .get(name)
            .map(|f| Condition::Function(NamedCondition::from_shared(name, f.clone())))
    }

    #[must_use]
    pub fn reaction(&self, name: &str) -> Option<Reaction> {
        self.reactions
            .get(name)
            .map(|f| Reaction::Function(NamedReaction::from_shared(name, f.clone())))
    }
}

impl Condition {
    /// Encode as a save-record fragment.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::AlwaysTrue => json!({"type": self.tag(), "args": {}}),
            Self::PerceptionCheck { dc } => json!({"type": self.tag(), "args": {"dc": dc}}),
            Self::SkillCheck(check) => {
                let mut record = Map::new();
                record.insert("type".into(), SKILL_CHECK_TAG.into());
                record.insert("skill".into(), check.skill.clone().into());
                record.insert("dc".into(), check.dc.into());
                if check.auto_pass {
                    record.insert("auto_pass".into(), true.into());
                }
                if check.auto_fail {
                    record.insert("auto_fail".into(), true.into());
                }
                Value::Object(record)
            }
            Self::Function(named) => json!({"type": FUNCTION_TAG, "name": named.name()}),
        }
    }
}

impl Reaction {
    /// Encode as a save-record fragment.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let args = match self {
            Self::ApplyDamage {
                damage_type,
                amount,
            } => json!({"damage_type": damage_type, "amount": amount}),
            Self::AlertGamemaster { message } => json!({"message": message}),
            Self::PlaySound { sound_file } => json!({"sound_file": sound_file}),
            Self::ScheduleEvent { turns, event_type } => {
                json!({"turns": turns, "event_type": event_type})
            }
            Self::Function(named) => return json!({"type": FUNCTION_TAG, "name": named.name()}),
        };
        json!({"type": self.tag(), "args": args})
    }
}

impl Trigger {
    /// Encode the trigger and its whole chain as a save record.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut record = Map::new();
        record.insert("event_type".into(), self.event_type().into());
        record.insert("label".into(), self.label().into());
        record.insert(
            "next_trigger".into(),
            self.next_trigger
                .as_deref()
                .map_or(Value::Null, Trigger::to_value),
        );
        record.insert("condition".into(), self.condition.to_value());
        record.insert("reaction".into(), self.reaction.to_value());
        if let Some(source) = &self.source {
            record.insert("source".into(), source.clone().into());
        }
        if let Some(cooldown) = self.cooldown {
            record.insert("cooldown".into(), cooldown.into());
        }
        Value::Object(record)
    }
}

/// Decodes save records against a set of registries.
#[derive(Clone, Copy, Debug)]
pub struct TriggerCodec<'a> {
    pub conditions: &'a ConditionRegistry,
    pub reactions: &'a ReactionRegistry,
    pub functions: &'a FunctionRegistry,
    pub max_chain_depth: usize,
}

impl TriggerCodec<'_> {
    pub fn decode_condition(&self, record: &Value) -> EngineResult<Condition> {
        let tag = type_tag(record, "condition")?;
        match tag {
            FUNCTION_TAG => {
                let name = function_name(record, "condition")?;
                self.functions
                    .condition(name)
                    .ok_or_else(|| EngineError::UnknownFunction {
                        kind: "condition",
                        name: name.to_string(),
                    })
            }
            SKILL_CHECK_TAG => Ok(Condition::SkillCheck(parse_args::<SkillCheck>(tag, record)?)),
            _ => self.conditions.create(tag, args_of(record)),
        }
    }

    pub fn decode_reaction(&self, record: &Value) -> EngineResult<Reaction> {
        let tag = type_tag(record, "reaction")?;
        match tag {
            FUNCTION_TAG => {
                let name = function_name(record, "reaction")?;
                self.functions
                    .reaction(name)
                    .ok_or_else(|| EngineError::UnknownFunction {
                        kind: "reaction",
                        name: name.to_string(),
                    })
            }
            _ => self.reactions.create(tag, args_of(record)),
        }
    }

    /// Decode a trigger record, including its chain.
    pub fn decode_trigger(&self, record: &Value) -> EngineResult<Trigger> {
        self.decode_link(record, 1)
    }

    fn decode_link(&self, record: &Value, depth: usize) -> EngineResult<Trigger> {
        if depth > self.max_chain_depth {
            return Err(EngineError::ChainTooDeep {
                limit: self.max_chain_depth,
            });
        }

        let event_type = record
            .get("event_type")
            .and_then(Value::as_str)
            .ok_or(EngineError::MissingField {
                record: "trigger",
                field: "event_type",
            })?;
        let condition = self.decode_condition(required(record, "trigger", "condition")?)?;
        let reaction = self.decode_reaction(required(record, "trigger", "reaction")?)?;

        let mut trigger = Trigger::new(event_type, condition, reaction);
        if let Some(label) = optional(record, "label", Value::as_str, "a string")? {
            trigger = trigger.with_label(label);
        }
        if let Some(source) = optional(record, "source", Value::as_str, "a string")? {
            trigger = trigger.with_source(source);
        }
        if let Some(cooldown) = optional(record, "cooldown", Value::as_u64, "a non-negative integer")? {
            trigger = trigger.with_cooldown(cooldown);
        }
        match record.get("next_trigger") {
            None | Some(Value::Null) => {}
            Some(next) => trigger = trigger.then(self.decode_link(next, depth + 1)?),
        }
        Ok(trigger)
    }
}

fn type_tag<'v>(record: &'v Value, kind: &'static str) -> EngineResult<&'v str> {
    record
        .get("type")
        .and_then(Value::as_str)
        .ok_or(EngineError::MissingField {
            record: kind,
            field: "type",
        })
}

fn function_name<'v>(record: &'v Value, kind: &'static str) -> EngineResult<&'v str> {
    record
        .get("name")
        .and_then(Value::as_str)
        .ok_or(EngineError::MissingField {
            record: kind,
            field: "name",
        })
}

fn required<'v>(record: &'v Value, kind: &'static str, field: &'static str) -> EngineResult<&'v Value> {
    record
        .get(field)
        .filter(|v| !v.is_null())
        .ok_or(EngineError::MissingField { record: kind, field })
}

/// An optional trigger field. Absent or null is `None`; any other value must
/// convert.
fn optional<'v, T>(
    record: &'v Value,
    field: &'static str,
    convert: impl FnOnce(&'v Value) -> Option<T>,
    expected: &str,
) -> EngineResult<Option<T>> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => convert(value).map(Some).ok_or_else(|| EngineError::MalformedComponent {
            tag: "trigger".to_string(),
            reason: format!("'{field}' must be {expected}, got {value}"),
        }),
    }
}

static EMPTY_ARGS: Value = Value::Null;

fn args_of(record: &Value) -> &Value {
    match record.get("args") {
        Some(args) if !args.is_null() => args,
        _ => &EMPTY_ARGS,
    }
}

/// Save record of an entity and its triggers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    pub entity_type: EntityKind,
    #[serde(default)]
    pub stats: BTreeMap<String, i64>,
    #[serde(default)]
    pub triggers: Vec<Value>,
}
