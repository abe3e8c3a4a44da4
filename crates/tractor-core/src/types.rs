//! Core data types for the extraction engine
//!
//! This module defines the values the engine navigates: the [`Subject`]
//! union, the [`Key`] type used by ordered maps, the side-channel
//! [`Context`] and the [`SubjectObject`] capability trait for opaque
//! host objects.
//!
//! Copyright (c) 2025 Tractor Team
//! Licensed under the Apache-2.0 license

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Key of a [`Subject::Map`] or [`Context`] entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Integer key (also used for positional entries)
    Int(i64),
    /// String key
    Str(String),
}

impl Key {
    /// Parse a textual segment into the integer key it denotes, if any
    pub fn parse_int(segment: &str) -> Option<Key> {
        segment.parse::<i64>().ok().map(Key::Int)
    }

    /// Render the key as it would appear in an accessor segment
    pub fn as_segment(&self) -> String {
        match self {
            Key::Int(i) => i.to_string(),
            Key::Str(s) => s.clone(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{}", i),
            Key::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key::Int(value as i64)
    }
}

/// Ordered map type used by [`Subject::Map`]
pub type SubjectMap = IndexMap<Key, Subject>;

/// Capabilities of an opaque host object exposed to the engine
///
/// The host decides which types it exposes; the engine only reads declared
/// fields, asks the optional dynamic getter, and invokes named methods.
/// Faults raised by the object are returned as [`anyhow::Error`] and are
/// re-wrapped by the resolver before reaching callers.
pub trait SubjectObject: fmt::Debug + Send + Sync {
    /// Descriptive type name used in diagnostics
    fn type_name(&self) -> &str;

    /// Read a declared field
    fn field(&self, name: &str) -> Option<Subject>;

    /// Resolve a field that is not declared, for objects with a dynamic getter
    ///
    /// Returns `None` when the object has no dynamic getter or does not know
    /// the name.
    fn dynamic_field(&self, _name: &str) -> Option<anyhow::Result<Subject>> {
        None
    }

    /// Invoke a method by name; `None` means the object has no such method
    fn call(&self, method: &str) -> Option<anyhow::Result<Subject>>;

    /// JSON rendering used when a subject is serialized
    fn to_json(&self) -> Value {
        Value::String(format!("<{}>", self.type_name()))
    }
}

/// A value under inspection
#[derive(Debug, Clone, Default)]
pub enum Subject {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Sequence(Vec<Subject>),
    Map(SubjectMap),
    Object(Arc<dyn SubjectObject>),
}

impl Subject {
    /// Wrap a host object
    pub fn object<T: SubjectObject + 'static>(object: T) -> Self {
        Subject::Object(Arc::new(object))
    }

    /// Build a map subject from key/value pairs
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<Key>,
        V: Into<Subject>,
        I: IntoIterator<Item = (K, V)>,
    {
        Subject::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Descriptive type name used in diagnostics
    pub fn type_name(&self) -> String {
        match self {
            Subject::Null => "null".to_string(),
            Subject::Bool(_) => "bool".to_string(),
            Subject::Int(_) => "int".to_string(),
            Subject::Float(_) => "float".to_string(),
            Subject::String(_) => "string".to_string(),
            Subject::Sequence(_) => "sequence".to_string(),
            Subject::Map(_) => "map".to_string(),
            Subject::Object(object) => object.type_name().to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Subject::Null)
    }

    /// Whether the subject is a collection the call suffix maps over
    pub fn is_iterable(&self) -> bool {
        matches!(self, Subject::Sequence(_) | Subject::Map(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Subject::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Subject::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Subject::Int(i) => Some(*i as f64),
            Subject::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Subject::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&SubjectMap> {
        match self {
            Subject::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Subject]> {
        match self {
            Subject::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Iterate the element values of a sequence or map
    pub fn values(&self) -> Box<dyn Iterator<Item = &Subject> + '_> {
        match self {
            Subject::Sequence(items) => Box::new(items.iter()),
            Subject::Map(map) => Box::new(map.values()),
            _ => Box::new(std::iter::empty()),
        }
    }

    /// Convert the subject into a JSON value
    ///
    /// Integer map keys become JSON object keys in their decimal form;
    /// objects render through [`SubjectObject::to_json`].
    pub fn to_json(&self) -> Value {
        match self {
            Subject::Null => Value::Null,
            Subject::Bool(b) => Value::Bool(*b),
            Subject::Int(i) => Value::Number((*i).into()),
            Subject::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Subject::String(s) => Value::String(s.clone()),
            Subject::Sequence(items) => Value::Array(items.iter().map(Subject::to_json).collect()),
            Subject::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.as_segment(), v.to_json()))
                    .collect(),
            ),
            Subject::Object(object) => object.to_json(),
        }
    }
}

impl PartialEq for Subject {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Subject::Null, Subject::Null) => true,
            (Subject::Bool(a), Subject::Bool(b)) => a == b,
            (Subject::Int(a), Subject::Int(b)) => a == b,
            (Subject::Float(a), Subject::Float(b)) => a == b,
            (Subject::String(a), Subject::String(b)) => a == b,
            (Subject::Sequence(a), Subject::Sequence(b)) => a == b,
            // Order is significant for maps
            (Subject::Map(a), Subject::Map(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Subject::Object(a), Subject::Object(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<Value> for Subject {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Subject::Null,
            Value::Bool(b) => Subject::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Subject::Int(i),
                None => Subject::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Subject::String(s),
            Value::Array(items) => Subject::Sequence(items.into_iter().map(Subject::from).collect()),
            Value::Object(map) => Subject::Map(
                map.into_iter()
                    .map(|(k, v)| (Key::Str(k), Subject::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Subject {
    fn from(value: &str) -> Self {
        Subject::String(value.to_string())
    }
}

impl From<String> for Subject {
    fn from(value: String) -> Self {
        Subject::String(value)
    }
}

impl From<i64> for Subject {
    fn from(value: i64) -> Self {
        Subject::Int(value)
    }
}

impl From<i32> for Subject {
    fn from(value: i32) -> Self {
        Subject::Int(value as i64)
    }
}

impl From<f64> for Subject {
    fn from(value: f64) -> Self {
        Subject::Float(value)
    }
}

impl From<bool> for Subject {
    fn from(value: bool) -> Self {
        Subject::Bool(value)
    }
}

impl From<Vec<Subject>> for Subject {
    fn from(value: Vec<Subject>) -> Self {
        Subject::Sequence(value)
    }
}

impl From<SubjectMap> for Subject {
    fn from(value: SubjectMap) -> Self {
        Subject::Map(value)
    }
}

impl Serialize for Subject {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Subject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Subject::from)
    }
}

/// Side-channel store for `::`-scoped lookups
///
/// Owned by the caller and read-only to the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    entries: IndexMap<Key, Subject>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion
    pub fn with(mut self, key: impl Into<Key>, value: impl Into<Subject>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Subject>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &Key) -> Option<&Subject> {
        self.entries.get(key)
    }

    /// Look up an entry by its textual name, falling back to the integer key
    pub fn lookup(&self, name: &str) -> Option<&Subject> {
        self.entries
            .get(&Key::Str(name.to_string()))
            .or_else(|| Key::parse_int(name).and_then(|k| self.entries.get(&k)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Subject)> {
        self.entries.iter()
    }

    /// Build a context from a JSON object; other JSON values yield `None`
    pub fn from_json(value: Value) -> Option<Self> {
        match Subject::from(value) {
            Subject::Map(entries) => Some(Self { entries }),
            _ => None,
        }
    }
}

impl<K: Into<Key>, V: Into<Subject>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
