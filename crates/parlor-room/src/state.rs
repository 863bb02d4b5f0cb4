//! The shared state object a room synchronizes to its members.

use parlor_protocol::StateSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A room's shared state: string keys mapped to arbitrary JSON values.
///
/// `RoomState` is a value. Rooms never edit the map they are holding; they
/// build the next state and swap it in, so a reader never sees a merge in
/// progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomState(StateSnapshot);

impl RoomState {
    /// An empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this state with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Looks up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shallow merge: returns a copy of `self` where every top-level key of
    /// `patch` overwrites the existing entry. Keys missing from `patch` are
    /// kept as they are; nested objects are replaced, not merged.
    pub fn merged(&self, patch: &RoomState) -> RoomState {
        let mut next = self.0.clone();
        for (key, value) in &patch.0 {
            next.insert(key.clone(), value.clone());
        }
        RoomState(next)
    }

    pub fn as_snapshot(&self) -> &StateSnapshot {
        &self.0
    }

    pub fn into_snapshot(self) -> StateSnapshot {
        self.0
    }
}

impl From<StateSnapshot> for RoomState {
    fn from(map: StateSnapshot) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for RoomState {
    type Error = Value;

    /// Only JSON objects are valid states; anything else is handed back.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}
