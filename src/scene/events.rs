//! Name-keyed synchronous event dispatch
//!
//! Key principles:
//! - Key-value arguments (no order dependency)
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Registration per event name (only notify interested handlers)
//! - Synchronous delivery, no persistence

use crate::foundation::math::Vec3;
use crate::scene::EntityId;
use std::collections::HashMap;

/// Variant for type-safe event arguments
#[derive(Debug, Clone, PartialEq)]
pub enum EventArg {
    /// An entity reference
    Entity(EntityId),
    /// A scalar value
    Float(f32),
    /// A vector value
    Vector(Vec3),
    /// A text value
    Text(String),
    /// A boolean flag
    Flag(bool),
}

/// Event payload with key-value arguments
#[derive(Debug, Clone, Default)]
pub struct EventData {
    args: HashMap<&'static str, EventArg>,
}

impl EventData {
    /// Create an empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument (builder pattern)
    pub fn with_arg(mut self, key: &'static str, value: EventArg) -> Self {
        self.args.insert(key, value);
        self
    }

    /// Get an argument by key
    pub fn get(&self, key: &str) -> Option<&EventArg> {
        self.args.get(key)
    }

    /// Get an entity argument if present
    pub fn get_entity(&self, key: &str) -> Option<EntityId> {
        if let Some(EventArg::Entity(id)) = self.get(key) {
            Some(*id)
        } else {
            None
        }
    }

    /// Get a scalar argument if present
    pub fn get_float(&self, key: &str) -> Option<f32> {
        if let Some(EventArg::Float(value)) = self.get(key) {
            Some(*value)
        } else {
            None
        }
    }

    /// Get a vector argument if present
    pub fn get_vector(&self, key: &str) -> Option<Vec3> {
        if let Some(EventArg::Vector(value)) = self.get(key) {
            Some(*value)
        } else {
            None
        }
    }
}

/// Boxed event handler; returns true when the event was consumed
pub type EventListener = Box<dyn FnMut(&EventData) -> bool>;

/// Name-keyed event bus with chain-of-responsibility forwarding
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<String, Vec<EventListener>>,
}

impl EventBus {
    /// Create a new empty event bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for a named event
    ///
    /// Only listeners registered under this name will be notified.
    pub fn add_listener(&mut self, event_name: impl Into<String>, listener: EventListener) {
        self.listeners.entry(event_name.into()).or_default().push(listener);
    }

    /// Dispatch an event synchronously to all listeners for its name
    ///
    /// Stops at the first listener that returns true (consumed). Returns
    /// the number of listeners invoked.
    pub fn dispatch(&mut self, event_name: &str, data: &EventData) -> usize {
        let mut invoked = 0;
        if let Some(listeners) = self.listeners.get_mut(event_name) {
            for listener in listeners.iter_mut() {
                invoked += 1;
                if listener(data) {
                    break;
                }
            }
        }
        invoked
    }

    /// Number of listeners registered for a name
    pub fn listener_count(&self, event_name: &str) -> usize {
        self.listeners.get(event_name).map_or(0, Vec::len)
    }

    /// Drop all listeners (useful for state transitions)
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn dispatch_reaches_registered_listener() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        bus.add_listener(
            "spawn",
            Box::new(move |data| {
                sink.borrow_mut().push(data.get_entity("entity"));
                false
            }),
        );

        let data = EventData::new().with_arg("entity", EventArg::Entity(EntityId(7)));
        let invoked = bus.dispatch("spawn", &data);

        assert_eq!(invoked, 1);
        assert_eq!(*seen.borrow(), vec![Some(EntityId(7))]);
    }

    #[test]
    fn unknown_name_is_a_no_op() {
        let mut bus = EventBus::new();
        assert_eq!(bus.dispatch("nothing-registered", &EventData::new()), 0);
    }

    #[test]
    fn consumed_event_stops_forwarding() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));

        for consume in [true, false] {
            let sink = Rc::clone(&count);
            bus.add_listener(
                "hit",
                Box::new(move |_| {
                    *sink.borrow_mut() += 1;
                    consume
                }),
            );
        }

        bus.dispatch("hit", &EventData::new());
        // Second listener never runs: the first consumed the event
        assert_eq!(*count.borrow(), 1);
    }
}
