//! # anvil-forms-events
//!
//! Named-event dispatcher for anvil-forms. The host registers listeners
//! under event names; components dispatch payloads without direct
//! dependencies on each other. Choice resolution additionally needs the set
//! of currently registered event names, which [`EventDispatcher::event_names`]
//! exposes in sorted order.
//!
//! ## Usage
//!
//! ```
//! use anvil_forms_events::EventDispatcher;
//! use std::sync::Arc;
//!
//! let dispatcher = EventDispatcher::new();
//!
//! dispatcher.connect("form.submitted", "audit-log", Arc::new(|payload| {
//!     println!("submitted: {payload}");
//! }));
//!
//! let delivered = dispatcher.dispatch("form.submitted", &serde_json::json!({"form": "contact"}));
//! assert_eq!(delivered, 1);
//! assert_eq!(dispatcher.event_names(), vec!["form.submitted".to_string()]);
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// The type signature for an event listener callback.
///
/// Listeners receive the dispatched payload by reference and must be
/// `Send + Sync` so events can fire from any thread.
pub type EventListener = Arc<dyn Fn(&serde_json::Value) + Send + Sync>;

/// A dispatcher of named events.
///
/// Listeners are called in registration order. Each listener carries an id
/// used for replacement and disconnection.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<BTreeMap<String, Vec<(String, EventListener)>>>,
}

impl EventDispatcher {
    /// Creates a new dispatcher with no registered events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an event name without attaching a listener.
    ///
    /// Useful for hosts that want an event to show up in `event::` choice
    /// lists before any listener is connected.
    pub fn register(&self, event: impl Into<String>) {
        self.listeners
            .write()
            .expect("event dispatcher lock poisoned")
            .entry(event.into())
            .or_default();
    }

    /// Connects a listener to the named event.
    ///
    /// If a listener with the same id is already connected to this event,
    /// it is replaced.
    pub fn connect(
        &self,
        event: impl Into<String>,
        listener_id: impl Into<String>,
        callback: EventListener,
    ) {
        let id = listener_id.into();
        let mut listeners = self
            .listeners
            .write()
            .expect("event dispatcher lock poisoned");
        let entry = listeners.entry(event.into()).or_default();

        if let Some(existing) = entry.iter_mut().find(|(lid, _)| *lid == id) {
            existing.1 = callback;
        } else {
            entry.push((id, callback));
        }
    }

    /// Disconnects the listener with the given id from the named event.
    ///
    /// Returns `true` if a listener was found and removed. The event name
    /// itself stays registered.
    pub fn disconnect(&self, event: &str, listener_id: &str) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .expect("event dispatcher lock poisoned");
        if let Some(entry) = listeners.get_mut(event) {
            let len_before = entry.len();
            entry.retain(|(id, _)| id != listener_id);
            return entry.len() < len_before;
        }
        false
    }

    /// Dispatches a payload to all listeners of the named event.
    ///
    /// Returns the number of listeners called. Dispatching to an
    /// unregistered event is a no-op.
    pub fn dispatch(&self, event: &str, payload: &serde_json::Value) -> usize {
        let listeners = self
            .listeners
            .read()
            .expect("event dispatcher lock poisoned");
        listeners.get(event).map_or(0, |entry| {
            for (_, callback) in entry {
                callback(payload);
            }
            entry.len()
        })
    }

    /// Returns the names of all registered events, sorted.
    pub fn event_names(&self) -> Vec<String> {
        self.listeners
            .read()
            .expect("event dispatcher lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Returns the number of listeners connected to the named event.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .read()
            .expect("event dispatcher lock poisoned")
            .get(event)
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("events", &self.event_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_register_shows_in_names() {
        let dispatcher = EventDispatcher::new();
        dispatcher.register("form.submitted");
        dispatcher.register("content.saved");
        assert_eq!(
            dispatcher.event_names(),
            vec!["content.saved".to_string(), "form.submitted".to_string()]
        );
    }

    #[test]
    fn test_connect_and_dispatch() {
        let dispatcher = EventDispatcher::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        dispatcher.connect(
            "form.submitted",
            "counter",
            Arc::new(move |_| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let delivered = dispatcher.dispatch("form.submitted", &serde_json::Value::Null);
        assert_eq!(delivered, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_unregistered_is_noop() {
        let dispatcher = EventDispatcher::new();
        assert_eq!(dispatcher.dispatch("missing", &serde_json::Value::Null), 0);
    }

    #[test]
    fn test_connect_replaces_same_id() {
        let dispatcher = EventDispatcher::new();
        dispatcher.connect("e", "dup", Arc::new(|_| {}));
        dispatcher.connect("e", "dup", Arc::new(|_| {}));
        assert_eq!(dispatcher.listener_count("e"), 1);
    }

    #[test]
    fn test_disconnect() {
        let dispatcher = EventDispatcher::new();
        dispatcher.connect("e", "a", Arc::new(|_| {}));
        assert!(dispatcher.disconnect("e", "a"));
        assert!(!dispatcher.disconnect("e", "a"));
        // Event name stays registered after its last listener leaves
        assert_eq!(dispatcher.event_names(), vec!["e".to_string()]);
    }

    #[test]
    fn test_listeners_called_in_order() {
        let dispatcher = EventDispatcher::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        for id in ["first", "second", "third"] {
            let order_clone = Arc::clone(&order);
            dispatcher.connect(
                "e",
                id,
                Arc::new(move |_| {
                    order_clone.lock().unwrap().push(id);
                }),
            );
        }

        dispatcher.dispatch("e", &serde_json::Value::Null);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }
}
