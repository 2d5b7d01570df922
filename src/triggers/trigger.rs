//! The trigger: an event type bound to a condition and a reaction.

use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::error::EngineResult;

use super::condition::Condition;
use super::payload::EventPayload;
use super::reaction::Reaction;
use super::registry::UNKNOWN_SOURCE;

/// A trigger definition.
///
/// Triggers watch for one event type. When the event arrives the trigger
/// checks its cooldown, evaluates its condition, runs its reaction and then
/// hands the same payload to the next trigger in its chain.
///
/// Chains are owned: each link is boxed inside its parent, so a chain can
/// never loop back on itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Trigger {
    event_type: String,

    pub condition: Condition,
    pub reaction: Reaction,

    /// Stable display key. Derived from the event type and reaction tag
    /// unless given explicitly.
    label: String,

    /// Free-form origin (usually the owning entity's name).
    pub source: Option<String>,

    /// Minimum turns between two fires. `None` or 0 means no cooldown.
    pub cooldown: Option<u64>,

    last_fired_turn: Option<u64>,

    /// Fired right after this trigger's reaction, with the same payload.
    pub next_trigger: Option<Box<Trigger>>,
}

impl Trigger {
    /// Create a trigger with a derived label.
    pub fn new(event_type: impl Into<String>, condition: Condition, reaction: Reaction) -> Self {
        let event_type = event_type.into();
        let label = format!("{}:{}", event_type, reaction.tag());
        Self {
            event_type,
            condition,
            reaction,
            label,
            source: None,
            cooldown: None,
            last_fired_turn: None,
            next_trigger: None,
        }
    }

    /// Set an explicit label (builder pattern).
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the source (builder pattern).
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the cooldown in turns (builder pattern).
    #[must_use]
    pub fn with_cooldown(mut self, turns: u64) -> Self {
        self.cooldown = Some(turns);
        self
    }

    /// Chain another trigger after this one (builder pattern).
    ///
    /// Replaces any existing next link.
    #[must_use]
    pub fn then(mut self, next: Trigger) -> Self {
        self.next_trigger = Some(Box::new(next));
        self
    }

    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Change the label after creation.
    ///
    /// Labels are treated as stable keys, so every change is logged.
    pub fn relabel(&mut self, label: impl Into<String>) {
        let label = label.into();
        if label != self.label {
            warn!(old = %self.label, new = %label, "Trigger label changed");
            self.label = label;
        }
    }

    /// Turn of the last successful fire, if any was recorded.
    #[must_use]
    pub fn last_fired_turn(&self) -> Option<u64> {
        self.last_fired_turn
    }

    /// Number of links in the chain starting at this trigger.
    #[must_use]
    pub fn chain_len(&self) -> usize {
        let mut len = 1;
        let mut link = self.next_trigger.as_deref();
        while let Some(next) = link {
            len += 1;
            link = next.next_trigger.as_deref();
        }
        len
    }

    /// Is the trigger blocked by its cooldown at `current_turn`?
    #[must_use]
    pub fn on_cooldown(&self, current_turn: u64) -> bool {
        match (self.cooldown, self.last_fired_turn) {
            (Some(cooldown), Some(last)) => current_turn.saturating_sub(last) < cooldown,
            _ => false,
        }
    }

    /// Run the trigger against a payload.
    ///
    /// Cooldown and condition misses are silent no-fires. Reaction errors
    /// propagate, and a failing reaction neither records a fire nor chains.
    /// A skill check paired with a damage reaction is a saving throw: passing
    /// the check avoids the damage.
    pub fn check_and_react(
        &mut self,
        engine: &mut Engine,
        payload: &mut EventPayload,
    ) -> EngineResult<()> {
        let current_turn = engine.turn_for(payload.world);

        if current_turn.is_some_and(|turn| self.on_cooldown(turn)) {
            debug!(label = %self.label, "Trigger on cooldown, skipped");
            return Ok(());
        }

        let success = match &self.condition {
            Condition::SkillCheck(check) => {
                let passed =
                    check.attempt(&payload.character_stats, payload.roll_mode, engine.rng_mut());
                if self.reaction.is_damage() {
                    !passed
                } else {
                    passed
                }
            }
            condition => condition.evaluate(payload, engine.rng_mut()),
        };

        if !success {
            debug!(label = %self.label, "Trigger condition not met, skipped");
            return Ok(());
        }

        info!(
            label = %self.label,
            source = %self.source.as_deref().unwrap_or(UNKNOWN_SOURCE),
            "Trigger activated"
        );
        self.reaction.execute(engine, payload)?;

        if let Some(turn) = current_turn {
            self.last_fired_turn = Some(turn);
        }

        if let Some(next) = self.next_trigger.as_deref_mut() {
            debug!(from = %self.label, to = %next.label, "Chaining trigger");
            next.check_and_react(engine, payload)?;
        }
        Ok(())
    }
}
