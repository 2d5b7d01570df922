//! Trigger conditions.
//!
//! Conditions decide whether a trigger's reaction runs. The variant set is
//! closed; content that needs custom logic registers a named function and
//! refers to it with [`Condition::Function`].

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{GameRng, RollMode};

use super::payload::EventPayload;

/// Payload key read by [`Condition::PerceptionCheck`].
pub const PERCEPTION_KEY: &str = "perception";

/// Signature of a registered condition function.
pub type ConditionFn = Rc<dyn Fn(&EventPayload) -> bool>;

/// A condition function together with the name it is saved under.
#[derive(Clone)]
pub struct NamedCondition {
    name: String,
    func: ConditionFn,
}

impl NamedCondition {
    pub fn new(name: impl Into<String>, func: impl Fn(&EventPayload) -> bool + 'static) -> Self {
        Self {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    pub(crate) fn from_shared(name: impl Into<String>, func: ConditionFn) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared(&self) -> ConditionFn {
        Rc::clone(&self.func)
    }

    pub fn call(&self, payload: &EventPayload) -> bool {
        (self.func)(payload)
    }
}

impl fmt::Debug for NamedCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NamedCondition").field(&self.name).finish()
    }
}

/// Functions are equal when they are saved under the same name.
impl PartialEq for NamedCondition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// A d20 check against a stat modifier.
///
/// `auto_pass` wins over `auto_fail`; either one skips the roll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCheck {
    pub skill: String,
    pub dc: i64,
    #[serde(default)]
    pub auto_pass: bool,
    #[serde(default)]
    pub auto_fail: bool,
}

impl SkillCheck {
    pub fn new(skill: impl Into<String>, dc: i64) -> Self {
        Self {
            skill: skill.into(),
            dc,
            auto_pass: false,
            auto_fail: false,
        }
    }

    /// Always succeed without rolling (builder pattern).
    #[must_use]
    pub fn with_auto_pass(mut self) -> Self {
        self.auto_pass = true;
        self
    }

    /// Always fail without rolling (builder pattern).
    #[must_use]
    pub fn with_auto_fail(mut self) -> Self {
        self.auto_fail = true;
        self
    }

    /// Roll d20 + the stat's modifier (0 when missing) against the DC.
    pub fn attempt(&self, stats: &BTreeMap<String, i64>, mode: RollMode, rng: &mut GameRng) -> bool {
        if self.auto_pass {
            return true;
        }
        if self.auto_fail {
            return false;
        }

        let roll = rng.roll_d20(mode);
        let modifier = stats.get(&self.skill).copied().unwrap_or(0);
        let total = roll.saturating_add(modifier);
        debug!(skill = %self.skill, roll, modifier, dc = self.dc, "Skill check");
        total >= self.dc
    }
}

/// A predicate over an event payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Always passes.
    AlwaysTrue,

    /// Passes when the payload's `perception` value is at least `dc`.
    /// A missing or unparsable value fails the check.
    PerceptionCheck { dc: i64 },

    /// Rolls against the payload's `character_stats`.
    SkillCheck(SkillCheck),

    /// A registered function.
    Function(NamedCondition),
}

impl Condition {
    /// Shorthand for a perception check.
    #[must_use]
    pub fn perception(dc: i64) -> Self {
        Self::PerceptionCheck { dc }
    }

    /// Shorthand for a skill check.
    pub fn skill(skill: impl Into<String>, dc: i64) -> Self {
        Self::SkillCheck(SkillCheck::new(skill, dc))
    }

    /// Wrap a plain function under a save name.
    pub fn function(name: impl Into<String>, func: impl Fn(&EventPayload) -> bool + 'static) -> Self {
        Self::Function(NamedCondition::new(name, func))
    }

    /// Type tag used in save records.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::AlwaysTrue => "AlwaysTrue",
            Self::PerceptionCheck { .. } => "PerceptionCheck",
            Self::SkillCheck(_) => "SkillCheck",
            Self::Function(_) => "function",
        }
    }

    #[must_use]
    pub fn is_skill_check(&self) -> bool {
        matches!(self, Self::SkillCheck(_))
    }

    /// Evaluate against a payload. Skill checks draw from `rng`.
    pub fn evaluate(&self, payload: &EventPayload, rng: &mut GameRng) -> bool {
        match self {
            Self::AlwaysTrue => true,
            Self::PerceptionCheck { dc } => match parse_perception(payload.value(PERCEPTION_KEY)) {
                Some(perception) => perception >= *dc,
                None => {
                    warn!(value = ?payload.value(PERCEPTION_KEY), "Invalid perception value in payload");
                    false
                }
            },
            Self::SkillCheck(check) => {
                check.attempt(&payload.character_stats, payload.roll_mode, rng)
            }
            Self::Function(named) => named.call(payload),
        }
    }
}

/// Read a perception score from a payload value.
///
/// Integers, integer strings and floats (truncated) are accepted. Anything
/// else, including booleans and a missing value, yields `None`.
#[must_use]
pub fn parse_perception(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
