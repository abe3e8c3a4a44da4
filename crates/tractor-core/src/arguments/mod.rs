//! Argument model for configured stages
//!
//! A stage's configured arguments are an ordered list of (key, value)
//! pairs. Keys and values may be deferred [`Extraction`]s resolved against
//! the live payload at the moment a stage asks for them.
//!
//! - [`provider`] - lookup and expansion of arguments at execution time
//! - [`declarative`] - decoding arguments from JSON/YAML configuration
//!
//! Copyright (c) 2025 Tractor Team
//! Licensed under the Apache-2.0 license

pub mod declarative;
pub mod provider;

pub use provider::ArgumentProvider;

use crate::accessor::Extraction;
use crate::types::{Key, Subject};
use serde_json::Value;

/// Key of an [`Argument`]
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentKey {
    /// No key; addressed by position
    Positional,
    /// Literal string or integer key
    Key(Key),
    /// Key computed from the payload
    Extraction(Extraction),
}

/// Value of an [`Argument`]
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    Literal(Subject),
    Extraction(Extraction),
    Nested(Arguments),
}

impl ArgumentValue {
    /// The literal subject, if this value is one
    pub fn as_literal(&self) -> Option<&Subject> {
        match self {
            ArgumentValue::Literal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<&Arguments> {
        match self {
            ArgumentValue::Nested(args) => Some(args),
            _ => None,
        }
    }

    /// JSON rendering used in diagnostics; extractions render as markers
    pub fn to_json(&self) -> Value {
        match self {
            ArgumentValue::Literal(s) => s.to_json(),
            ArgumentValue::Extraction(e) => declarative::extraction_marker(e),
            ArgumentValue::Nested(args) => args.to_json(),
        }
    }
}

macro_rules! literal_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ArgumentValue {
                fn from(value: $ty) -> Self {
                    ArgumentValue::Literal(Subject::from(value))
                }
            }
        )*
    };
}

literal_from!(&str, String, i64, i32, f64, bool);

impl From<Subject> for ArgumentValue {
    fn from(value: Subject) -> Self {
        ArgumentValue::Literal(value)
    }
}

impl From<Extraction> for ArgumentValue {
    fn from(value: Extraction) -> Self {
        ArgumentValue::Extraction(value)
    }
}

impl From<Arguments> for ArgumentValue {
    fn from(value: Arguments) -> Self {
        ArgumentValue::Nested(value)
    }
}

/// One configured argument
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub key: ArgumentKey,
    pub value: ArgumentValue,
}

impl Argument {
    pub fn positional(value: impl Into<ArgumentValue>) -> Self {
        Self {
            key: ArgumentKey::Positional,
            value: value.into(),
        }
    }

    pub fn keyed(key: impl Into<Key>, value: impl Into<ArgumentValue>) -> Self {
        Self {
            key: ArgumentKey::Key(key.into()),
            value: value.into(),
        }
    }

    /// Argument whose key is computed from the payload
    pub fn computed(key: Extraction, value: impl Into<ArgumentValue>) -> Self {
        Self {
            key: ArgumentKey::Extraction(key),
            value: value.into(),
        }
    }
}

/// Ordered list of arguments (the argument iterator)
///
/// Insertion order is preserved and is significant: the n-th positional
/// argument is addressed by the integer key `n`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    items: Vec<Argument>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style keyed argument
    pub fn with(mut self, key: impl Into<Key>, value: impl Into<ArgumentValue>) -> Self {
        self.items.push(Argument::keyed(key, value));
        self
    }

    /// Builder-style positional argument
    pub fn with_positional(mut self, value: impl Into<ArgumentValue>) -> Self {
        self.items.push(Argument::positional(value));
        self
    }

    pub fn push(&mut self, argument: Argument) {
        self.items.push(argument);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Argument> {
        self.items.iter()
    }

    /// Find the value stored under `key`
    ///
    /// An explicit literal key wins; an integer key otherwise addresses the
    /// positional argument at that ordinal. Arguments whose key is an
    /// extraction only become addressable after expansion.
    pub fn get(&self, key: &Key) -> Option<&ArgumentValue> {
        let explicit = self.items.iter().find_map(|arg| match &arg.key {
            ArgumentKey::Key(k) if k == key => Some(&arg.value),
            _ => None,
        });
        if explicit.is_some() {
            return explicit;
        }

        match key {
            Key::Int(index) if *index >= 0 => self
                .items
                .iter()
                .filter(|arg| arg.key == ArgumentKey::Positional)
                .nth(*index as usize)
                .map(|arg| &arg.value),
            _ => None,
        }
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// Pair every argument with its effective key
    ///
    /// Positional arguments are keyed by their ordinal among positional
    /// arguments; other keys are returned as configured.
    pub fn entries(&self) -> Vec<(ArgumentKey, &ArgumentValue)> {
        let mut position = 0i64;
        self.items
            .iter()
            .map(|arg| match &arg.key {
                ArgumentKey::Positional => {
                    let key = ArgumentKey::Key(Key::Int(position));
                    position += 1;
                    (key, &arg.value)
                }
                other => (other.clone(), &arg.value),
            })
            .collect()
    }

    /// JSON rendering used in diagnostics
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (key, value) in self.entries() {
            let key = match key {
                ArgumentKey::Key(k) => k.as_segment(),
                ArgumentKey::Extraction(e) => e.to_string(),
                ArgumentKey::Positional => unreachable!("entries() numbers positional arguments"),
            };
            map.insert(key, value.to_json());
        }
        Value::Object(map)
    }
}

impl FromIterator<Argument> for Arguments {
    fn from_iter<I: IntoIterator<Item = Argument>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type Item = &'a Argument;
    type IntoIter = std::slice::Iter<'a, Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
