//! Named application state mutated by `action` events.
//!
//! An explicit, injectable container instead of ambient globals: state
//! lives under string keys, mutations are setters registered under
//! `(state_key, setter_key)`, and observers subscribe per key.

use serde_json::Value;
use std::collections::HashMap;

type Setter = Box<dyn Fn(&mut Value, &[Value]) + Send>;
type Subscriber = Box<dyn FnMut(&Value) + Send>;

#[derive(Default)]
pub struct StateStore {
    values: HashMap<String, Value>,
    setters: HashMap<(String, String), Setter>,
    subscribers: HashMap<String, Vec<Subscriber>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Replaces the value under `key` and notifies its subscribers.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        self.values.insert(key.clone(), value);
        self.notify(&key);
    }

    /// Registers an observer invoked after every change to `key`.
    pub fn subscribe(&mut self, key: impl Into<String>, f: impl FnMut(&Value) + Send + 'static) {
        self.subscribers.entry(key.into()).or_default().push(Box::new(f));
    }

    /// Registers the mutation invoked for `action` events addressed to
    /// `(state_key, setter_key)`. Setters must be pure replacements of
    /// the addressed state from their arguments, so replaying an
    /// action is a no-op.
    pub fn register_setter(
        &mut self,
        state_key: impl Into<String>,
        setter_key: impl Into<String>,
        f: impl Fn(&mut Value, &[Value]) + Send + 'static,
    ) {
        self.setters
            .insert((state_key.into(), setter_key.into()), Box::new(f));
    }

    /// Dispatches an action. Unregistered targets are logged and
    /// dropped; there is nothing the client could do with them.
    pub fn apply_action(&mut self, state_key: &str, setter_key: &str, args: &[Value]) {
        let Some(setter) = self
            .setters
            .get(&(state_key.to_string(), setter_key.to_string()))
        else {
            tracing::warn!(state_key, setter_key, "no setter registered for action");
            return;
        };
        let value = self.values.entry(state_key.to_string()).or_insert(Value::Null);
        setter(value, args);
        self.notify(&state_key.to_string());
    }

    fn notify(&mut self, key: &str) {
        let Some(value) = self.values.get(key).cloned() else {
            return;
        };
        if let Some(subscribers) = self.subscribers.get_mut(key) {
            for subscriber in subscribers {
                subscriber(&value);
            }
        }
    }
}
