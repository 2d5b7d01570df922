//! Event bus subscriber table.
//!
//! The bus maps event types to subscribers in subscription order. It only
//! stores *who* listens; delivery happens in
//! [`Engine::emit`](crate::engine::Engine::emit), which owns the triggers and
//! handlers the subscribers point at.
//!
//! ## Example Usage
//!
//! ```
//! use rust_tabletop::bus::{EventBus, Subscriber};
//! use rust_tabletop::triggers::TriggerId;
//!
//! let mut bus = EventBus::new();
//! let door = Subscriber::Trigger(TriggerId::new(1));
//!
//! bus.subscribe("OPENED", door);
//! bus.subscribe("OPENED", door); // no duplicate
//! assert_eq!(bus.subscribers("OPENED"), vec![door]);
//!
//! bus.unsubscribe("OPENED", door);
//! bus.unsubscribe("OPENED", door); // no-op
//! assert!(bus.subscribers("OPENED").is_empty());
//! ```

use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::Engine;
use crate::error::EngineResult;
use crate::triggers::{EventPayload, TriggerId};

/// Identifier of a plain callback registered on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandlerId(pub u32);

impl HandlerId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handler({})", self.0)
    }
}

/// A plain event callback.
pub type Handler = Rc<dyn Fn(&mut Engine, &mut EventPayload) -> EngineResult<()>>;

/// Something that can be subscribed to an event type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subscriber {
    Trigger(TriggerId),
    Handler(HandlerId),
}

impl std::fmt::Display for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trigger(id) => id.fmt(f),
            Self::Handler(id) => id.fmt(f),
        }
    }
}

/// Subscriber table and handler storage.
#[derive(Default)]
pub struct EventBus {
    subscribers: FxHashMap<String, Vec<Subscriber>>,
    handlers: FxHashMap<HandlerId, Handler>,
    next_handler: u32,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to an event type. Subscribing twice has no effect.
    ///
    /// Returns whether the subscription is new.
    pub fn subscribe(&mut self, event_type: &str, subscriber: Subscriber) -> bool {
        let list = self.subscribers.entry(event_type.to_string()).or_default();
        if list.contains(&subscriber) {
            return false;
        }
        debug!(event_type, subscriber = %subscriber, "Subscribed");
        list.push(subscriber);
        true
    }

    /// Remove a subscription. Unknown subscriptions are ignored.
    pub fn unsubscribe(&mut self, event_type: &str, subscriber: Subscriber) {
        if let Some(list) = self.subscribers.get_mut(event_type) {
            list.retain(|s| *s != subscriber);
            if list.is_empty() {
                self.subscribers.remove(event_type);
            }
        }
    }

    /// Remove a subscriber from every event type.
    pub fn unsubscribe_all(&mut self, subscriber: Subscriber) {
        self.subscribers.retain(|_, list| {
            list.retain(|s| *s != subscriber);
            !list.is_empty()
        });
    }

    /// Subscribers of an event type, in subscription order.
    #[must_use]
    pub fn subscribers(&self, event_type: &str) -> Vec<Subscriber> {
        self.subscribers.get(event_type).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn is_subscribed(&self, event_type: &str, subscriber: Subscriber) -> bool {
        self.subscribers
            .get(event_type)
            .is_some_and(|list| list.contains(&subscriber))
    }

    /// Store a callback. Subscribe the returned id to receive events.
    pub fn add_handler(
        &mut self,
        handler: impl Fn(&mut Engine, &mut EventPayload) -> EngineResult<()> + 'static,
    ) -> HandlerId {
        let id = HandlerId(self.next_handler);
        self.next_handler += 1;
        self.handlers.insert(id, Rc::new(handler));
        id
    }

    /// Drop a callback and all its subscriptions.
    pub fn remove_handler(&mut self, id: HandlerId) {
        self.handlers.remove(&id);
        self.unsubscribe_all(Subscriber::Handler(id));
    }

    #[must_use]
    pub fn handler(&self, id: HandlerId) -> Option<Handler> {
        self.handlers.get(&id).cloned()
    }

    /// Event types with at least one subscriber, sorted.
    #[must_use]
    pub fn event_types(&self) -> Vec<&str> {
        let mut types: Vec<_> = self.subscribers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Drop every subscription. Handlers stay stored.
    ///
    /// Must not be called from inside a dispatch.
    pub fn reset(&mut self) {
        warn!(event_types = self.subscribers.len(), "Resetting event bus subscriptions");
        self.subscribers.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
