//! Turn scheduling.
//!
//! Two schedulers share one [`Schedule`] type and differ only in dispatch
//! policy:
//!
//! - [`TurnManager`]: a plain turn counter. Callbacks fire exactly on their
//!   turn by default (`ExactTurn`); the policy is configurable.
//! - [`TurnSystem`]: rounds over a participant list. Round callbacks fire at
//!   or after their round (`AtOrBefore`), so a skipped round is caught up.
//!
//! Entities act through the [`Actor`] and [`Action`] seams; the engine drives
//! a full turn (decide, validate, announce, execute or defer) in
//! [`Engine::execute_turn`](crate::engine::Engine::execute_turn).

mod action;
mod manager;
mod schedule;
mod system;

pub use action::{
    Action, Actor, MoveAction, StrikeAction, TurnOutcome, ACTION_EXECUTED, ACTION_PROPOSED,
    ON_ENTER,
};
pub use manager::TurnManager;
pub use schedule::{DispatchPolicy, Schedule, ScheduledCallback, ScheduledEntry};
pub use system::TurnSystem;
