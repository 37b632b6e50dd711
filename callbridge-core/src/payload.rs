//! SDK payload graph and cycle-safe JSON serialization
//!
//! SDK payloads are object graphs, not trees: a call points back at the
//! client that owns it, which may point at the call again. Objects are shared
//! nodes here, so such graphs can be represented. Serialization tracks every
//! visited node and writes [`CIRCULAR_MARKER`] instead of visiting one twice.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Written in place of any object that was already serialized
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// A value in an SDK payload
#[derive(Clone, Default)]
pub enum Payload {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Payload>),
    Object(ObjectRef),
}

/// Shared, mutable object node
///
/// Cloning an `ObjectRef` clones the reference, not the object. Two clones
/// are the same node for cycle detection.
#[derive(Clone, Default)]
pub struct ObjectRef(Arc<Mutex<Vec<(String, Payload)>>>);

impl ObjectRef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value under the same key
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Payload>) {
        let key = key.into();
        let value = value.into();
        let mut fields = self.fields();
        match fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => fields.push((key, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(self, key: impl Into<String>, value: impl Into<Payload>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<Payload> {
        self.fields()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn len(&self) -> usize {
        self.fields().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Same node, not just equal contents
    pub fn same_node(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn node_key(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    fn fields(&self) -> MutexGuard<'_, Vec<(String, Payload)>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the fields, taken without holding the lock afterwards
    fn entries(&self) -> Vec<(String, Payload)> {
        self.fields().clone()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Field values may loop back here, so only print the keys
        let keys: Vec<String> = self.entries().into_iter().map(|(k, _)| k).collect();
        f.debug_struct("ObjectRef").field("keys", &keys).finish()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::String(s) => write!(f, "String({s:?})"),
            Self::Array(items) => f.debug_list().entries(items).finish(),
            Self::Object(obj) => fmt::Debug::fmt(obj, f),
        }
    }
}

impl Payload {
    /// Build a payload from anything serde can serialize
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::from)
    }

    /// Convert to a JSON value, replacing revisited objects with the marker
    pub fn to_json_value(&self) -> Value {
        let mut seen = HashSet::new();
        self.to_value_guarded(&mut seen)
    }

    /// Pretty-printed JSON (2-space indent), never fails
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_json_value())
            .unwrap_or_else(|_| String::from("null"))
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    fn to_value_guarded(&self, seen: &mut HashSet<usize>) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => {
                Value::Array(items.iter().map(|i| i.to_value_guarded(seen)).collect())
            }
            Self::Object(obj) => {
                if !seen.insert(obj.node_key()) {
                    return Value::String(CIRCULAR_MARKER.to_string());
                }

                let mut map = Map::new();
                for (key, value) in obj.entries() {
                    map.insert(key, value.to_value_guarded(seen));
                }
                Value::Object(map)
            }
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                let obj = ObjectRef::new();
                for (key, value) in map {
                    obj.insert(key, Self::from(value));
                }
                Self::Object(obj)
            }
        }
    }
}

impl From<ObjectRef> for Payload {
    fn from(obj: ObjectRef) -> Self {
        Self::Object(obj)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Payload {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}
