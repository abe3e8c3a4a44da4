//! Argument lookup and expansion
//!
//! Stages ask the [`ArgumentProvider`] for their configured arguments.
//! Plain lookup never fails; expansion replaces deferred extractions with
//! their value on the current payload.
//!
//! Copyright (c) 2025 Tractor Team
//! Licensed under the Apache-2.0 license

use super::declarative::extraction_marker;
use super::{ArgumentKey, ArgumentValue, Arguments};
use crate::accessor::{Extraction, Resolver};
use crate::types::{Context, Key, Subject, SubjectMap};
use crate::{Error, Result};
use indexmap::IndexMap;
use std::sync::Arc;

/// Resolves configured arguments for stage implementations
#[derive(Debug, Clone)]
pub struct ArgumentProvider {
    resolver: Arc<Resolver>,
}

impl ArgumentProvider {
    pub fn new(resolver: Arc<Resolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Look up `key`, falling back to `default` when absent
    pub fn get(
        &self,
        args: Option<&Arguments>,
        key: impl Into<Key>,
        default: impl Into<ArgumentValue>,
    ) -> ArgumentValue {
        let key = key.into();
        args.and_then(|args| args.get(&key))
            .cloned()
            .unwrap_or_else(|| default.into())
    }

    /// Look up `key` and expand it against `payload`
    ///
    /// An extraction is resolved; a nested argument list becomes an ordered
    /// map whose children's keys and values are expanded one level deep.
    pub fn get_with_expansion(
        &self,
        args: Option<&Arguments>,
        key: impl Into<Key>,
        default: impl Into<ArgumentValue>,
        payload: &Subject,
        context: &Context,
    ) -> Result<Subject> {
        let key = key.into();
        let value = self.get(args, key.clone(), default);
        log::trace!("expanding argument '{}'", key);

        match value {
            ArgumentValue::Literal(subject) => Ok(subject),
            ArgumentValue::Extraction(extraction) => self.extract(&extraction, payload, context),
            ArgumentValue::Nested(nested) => self.expand(&nested, payload, context),
        }
    }

    /// Expand the immediate children of an argument list into a map
    ///
    /// Positional children are keyed by their ordinal. A child that is itself
    /// a nested list is not expanded: it is rendered as data, with any
    /// extraction inside it kept as its `$extract` marker. Use
    /// [`expand_children`](Self::expand_children) to reach such a list.
    pub fn expand(&self, args: &Arguments, payload: &Subject, context: &Context) -> Result<Subject> {
        let children = self.expand_children(args, payload, context)?;
        let map = children
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    ArgumentValue::Literal(subject) => subject,
                    ArgumentValue::Nested(nested) => unexpanded_subject(&nested),
                    ArgumentValue::Extraction(extraction) => Subject::from(extraction_marker(&extraction)),
                };
                (key, value)
            })
            .collect();
        Ok(Subject::Map(map))
    }

    /// Expand the keys and extraction values of the immediate children
    ///
    /// Nested lists are returned untouched so the caller can expand them
    /// with the payload of its choice.
    pub fn expand_children(
        &self,
        args: &Arguments,
        payload: &Subject,
        context: &Context,
    ) -> Result<IndexMap<Key, ArgumentValue>> {
        let mut children = IndexMap::with_capacity(args.len());

        for (key, value) in args.entries() {
            let key = match key {
                ArgumentKey::Key(k) => k,
                ArgumentKey::Extraction(extraction) => {
                    let resolved = self.extract(&extraction, payload, context)?;
                    self.key_from_subject(&extraction, resolved)?
                }
                ArgumentKey::Positional => unreachable!("entries() numbers positional arguments"),
            };

            let value = match value {
                ArgumentValue::Literal(subject) => ArgumentValue::Literal(subject.clone()),
                ArgumentValue::Extraction(extraction) => {
                    ArgumentValue::Literal(self.extract(extraction, payload, context)?)
                }
                ArgumentValue::Nested(nested) => ArgumentValue::Nested(nested.clone()),
            };

            children.insert(key, value);
        }

        Ok(children)
    }

    fn extract(&self, extraction: &Extraction, payload: &Subject, context: &Context) -> Result<Subject> {
        self.resolver.resolve(payload, extraction.accessor(), context)
    }

    fn key_from_subject(&self, extraction: &Extraction, resolved: Subject) -> Result<Key> {
        match resolved {
            Subject::String(s) => Ok(Key::Str(s)),
            Subject::Int(i) => Ok(Key::Int(i)),
            other => Err(Error::configuration(format!(
                "argument key {} must resolve to a string or integer, received {}",
                extraction,
                other.type_name()
            ))),
        }
    }
}

/// Render an unexpanded argument list as data
fn unexpanded_subject(args: &Arguments) -> Subject {
    let mut map = SubjectMap::with_capacity(args.len());
    for (key, value) in args.entries() {
        let key = match key {
            ArgumentKey::Key(k) => k,
            ArgumentKey::Extraction(extraction) => Key::Str(extraction.to_string()),
            ArgumentKey::Positional => unreachable!("entries() numbers positional arguments"),
        };
        let value = match value {
            ArgumentValue::Literal(subject) => subject.clone(),
            ArgumentValue::Extraction(extraction) => Subject::from(extraction_marker(extraction)),
            ArgumentValue::Nested(nested) => unexpanded_subject(nested),
        };
        map.insert(key, value);
    }
    Subject::Map(map)
}
