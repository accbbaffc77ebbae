//! The mapping payload: insertion-ordered, structurally-keyed.

use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::value::Value;

/// A hashable dictionary key.
///
/// Only the immutable primitives can key a mapping; trying to key one
/// with a list, dict, or instance is a `TypeError` raised by the
/// caller when `from_value` returns `None`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DictKey {
    None,
    Bool(bool),
    Int(i64),
    /// Float stored by bit pattern.
    Float(u64),
    Str(Rc<str>),
}

impl DictKey {
    /// Convert a runtime value to a key, if it is hashable.
    pub fn from_value(value: &Value) -> Option<DictKey> {
        match value {
            Value::None => Some(DictKey::None),
            Value::Bool(b) => Some(DictKey::Bool(*b)),
            Value::Int(i) => Some(DictKey::Int(*i)),
            Value::Float(f) => Some(DictKey::Float(f.to_bits())),
            Value::Str(s) => Some(DictKey::Str(Rc::clone(s))),
            _ => None,
        }
    }

    /// Convert the key back to a runtime value.
    pub fn to_value(&self) -> Value {
        match self {
            DictKey::None => Value::None,
            DictKey::Bool(b) => Value::Bool(*b),
            DictKey::Int(i) => Value::Int(*i),
            DictKey::Float(bits) => Value::Float(f64::from_bits(*bits)),
            DictKey::Str(s) => Value::Str(Rc::clone(s)),
        }
    }

    /// Key text for `KeyError` messages (the key's repr).
    pub fn describe(&self) -> String {
        match self {
            DictKey::None => "None".to_owned(),
            DictKey::Bool(true) => "True".to_owned(),
            DictKey::Bool(false) => "False".to_owned(),
            DictKey::Int(i) => i.to_string(),
            DictKey::Float(bits) => f64::from_bits(*bits).to_string(),
            DictKey::Str(s) => format!("'{s}'"),
        }
    }
}

/// Insertion-ordered mapping payload.
#[derive(Clone, Debug, Default)]
pub struct DictValue {
    entries: IndexMap<DictKey, Value, FxBuildHasher>,
}

impl DictValue {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key/value pair, replacing any existing entry without
    /// disturbing its insertion position.
    pub fn insert(&mut self, key: DictKey, value: Value) {
        self.entries.insert(key, value);
    }

    /// Look up a key.
    pub fn get(&self, key: &DictKey) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Remove a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &DictKey) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &DictKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&DictKey, &Value)> {
        self.entries.iter()
    }

    /// Keys in insertion order, as runtime values.
    pub fn keys(&self) -> Vec<Value> {
        self.entries.keys().map(DictKey::to_value).collect()
    }
}

impl FromIterator<(DictKey, Value)> for DictValue {
    fn from_iter<T: IntoIterator<Item = (DictKey, Value)>>(iter: T) -> Self {
        DictValue {
            entries: iter.into_iter().collect(),
        }
    }
}
