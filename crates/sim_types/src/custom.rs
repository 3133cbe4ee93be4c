//! Open, script-owned key/value state.
//!
//! Entities, players and the world aggregate each carry a [`CustomState`]:
//! arbitrary data keyed by name (team, health, timers, spawn points). The
//! core never interprets it. Values are JSON-like (`serde_json::Value`) so
//! scripts keep their flexibility while the encoding stays stable and
//! serialisable. Keys iterate in sorted order, which keeps snapshots
//! byte-for-byte reproducible.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sim_math::Vec3;

/// A tagged key/value container for script-private data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomState(Map<String, Value>);

impl CustomState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Raw value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Numeric value stored under `key`, if it is a number.
    #[must_use]
    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.0.get(key).and_then(Value::as_f64).map(|v| v as f32)
    }

    /// Integer value stored under `key`, such as an entity or player id.
    /// Fractional and negative numbers yield `None`.
    #[must_use]
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// Boolean value stored under `key`, if it is a boolean.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// String value stored under `key`, if it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Vector stored under `key` as a `[x, y, z]` array.
    #[must_use]
    pub fn get_vec3(&self, key: &str) -> Option<Vec3> {
        let items = self.0.get(key)?.as_array()?;
        match items.as_slice() {
            [x, y, z] => Some(Vec3::new(
                x.as_f64()? as f32,
                y.as_f64()? as f32,
                z.as_f64()? as f32,
            )),
            _ => None,
        }
    }

    /// Store a value under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Store a vector under `key` as a `[x, y, z]` array.
    pub fn set_vec3(&mut self, key: impl Into<String>, value: Vec3) {
        self.set(key, vec![value.x, value.y, value.z]);
    }

    /// Builder-style [`CustomState::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Remove and return the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns `true` if no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for CustomState {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
