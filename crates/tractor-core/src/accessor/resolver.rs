//! Accessor resolver
//!
//! Evaluates an [`Accessor`] against a [`Subject`] and a [`Context`].
//! Resolution is a strict left fold over the chain segments: each step's
//! output becomes the subject of the next step. Faults raised by host
//! objects are re-wrapped as extraction errors with the fault as source.
//!
//! Copyright (c) 2025 Tractor Team
//! Licensed under the Apache-2.0 license

use super::segment::{is_blank, split_chain, Segment, CALL_SUFFIX, CONTEXT_SEPARATOR};
use super::Accessor;
use crate::types::{Context, Key, Subject, SubjectMap};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum nesting of computed accessors and context scopes
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { max_depth: 32 }
    }
}

/// Evaluates accessor expressions
///
/// The resolver holds no state besides its configuration and is safe to
/// share across threads.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    /// Create a resolver with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with custom configuration
    pub fn with_config(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `accessor` against `subject`
    pub fn resolve(&self, subject: &Subject, accessor: &Accessor, context: &Context) -> Result<Subject> {
        self.resolve_accessor(subject, accessor, context, 0)
    }

    /// Resolve a literal path; `None` is the identity
    pub fn resolve_path(&self, subject: &Subject, path: Option<&str>, context: &Context) -> Result<Subject> {
        self.resolve_chain(subject, path.unwrap_or(""), context, 0)
    }

    fn resolve_accessor(
        &self,
        subject: &Subject,
        accessor: &Accessor,
        context: &Context,
        depth: usize,
    ) -> Result<Subject> {
        self.check_depth(accessor, subject, depth)?;

        match accessor {
            Accessor::Path(path) => self.resolve_chain(subject, path, context, depth),
            Accessor::Computed(inner) => {
                let computed = self.resolve_accessor(subject, inner, context, depth + 1)?;
                match computed {
                    Subject::Null => Ok(subject.clone()),
                    Subject::String(path) => {
                        log::trace!("computed accessor {} yielded '{}'", accessor, path);
                        self.resolve_chain(subject, &path, context, depth + 1)
                    }
                    other => Err(Error::extraction(
                        accessor.to_string(),
                        subject.type_name(),
                        format!(
                            "computed accessor must yield string, received {}",
                            other.type_name()
                        ),
                    )),
                }
            }
        }
    }

    /// Left fold of the non-blank segments of `path`
    fn resolve_chain(&self, subject: &Subject, path: &str, context: &Context, depth: usize) -> Result<Subject> {
        let segments = split_chain(path);
        let Some((first, rest)) = segments.split_first() else {
            return Ok(subject.clone());
        };

        let mut current = self.resolve_segment(subject, first, context, depth)?;
        for segment in rest {
            current = self.resolve_segment(&current, segment, context, depth)?;
        }
        Ok(current)
    }

    fn resolve_segment(&self, subject: &Subject, segment: &str, context: &Context, depth: usize) -> Result<Subject> {
        log::trace!("resolving segment '{}' on {}", segment, subject.type_name());

        match Segment::classify(segment) {
            Segment::Context { entry, rest } => {
                let scoped = context.lookup(entry).ok_or_else(|| {
                    Error::extraction(
                        segment,
                        subject.type_name(),
                        format!("context entry '{}' not found", entry),
                    )
                })?;
                if is_blank(rest) {
                    return Ok(scoped.clone());
                }
                if depth + 1 > self.config.max_depth {
                    return Err(self.depth_error(segment, subject));
                }
                self.resolve_segment(scoped, rest, context, depth + 1)
            }
            Segment::Call { method } => self.invoke(subject, segment, method),
            Segment::Lookup { name } => self.lookup(subject, name),
        }
    }

    /// Invoke `method` on the subject, or on each element of a collection
    fn invoke(&self, subject: &Subject, segment: &str, method: &str) -> Result<Subject> {
        match subject {
            Subject::Sequence(items) => items
                .iter()
                .map(|item| self.invoke_once(item, segment, method))
                .collect::<Result<Vec<_>>>()
                .map(Subject::Sequence),
            Subject::Map(map) => map
                .iter()
                .map(|(key, item)| Ok((key.clone(), self.invoke_once(item, segment, method)?)))
                .collect::<Result<SubjectMap>>()
                .map(Subject::Map),
            other => self.invoke_once(other, segment, method),
        }
    }

    fn invoke_once(&self, subject: &Subject, segment: &str, method: &str) -> Result<Subject> {
        let Subject::Object(object) = subject else {
            return Err(Error::extraction(
                segment,
                subject.type_name(),
                format!("cannot invoke '{}{}' on {}", method, CALL_SUFFIX, subject.type_name()),
            ));
        };

        match object.call(method) {
            Some(Ok(value)) => Ok(value),
            Some(Err(fault)) => Err(Error::extraction(
                segment,
                object.type_name(),
                format!("invocation of '{}{}' failed", method, CALL_SUFFIX),
            )
            .with_cause(fault)),
            None => Err(Error::extraction(
                segment,
                object.type_name(),
                format!("method '{}' is not callable on {}", method, object.type_name()),
            )),
        }
    }

    /// Map key, sequence index or object field lookup
    fn lookup(&self, subject: &Subject, name: &str) -> Result<Subject> {
        match subject {
            Subject::Map(map) => map
                .get(&Key::Str(name.to_string()))
                .or_else(|| Key::parse_int(name).and_then(|k| map.get(&k)))
                .cloned()
                .ok_or_else(|| {
                    Error::extraction(name, subject.type_name(), format!("key '{}' not found in map", name))
                }),
            Subject::Sequence(items) => name
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index))
                .cloned()
                .ok_or_else(|| {
                    Error::extraction(
                        name,
                        subject.type_name(),
                        format!("index '{}' not found in sequence of length {}", name, items.len()),
                    )
                }),
            Subject::Object(object) => {
                if let Some(value) = object.field(name) {
                    return Ok(value);
                }
                match object.dynamic_field(name) {
                    Some(Ok(value)) => Ok(value),
                    Some(Err(fault)) => Err(Error::extraction(
                        name,
                        object.type_name(),
                        format!("reading field '{}' failed", name),
                    )
                    .with_cause(fault)),
                    None => Err(Error::extraction(
                        name,
                        object.type_name(),
                        format!("field '{}' is not accessible on {}", name, object.type_name()),
                    )),
                }
            }
            other => Err(Error::extraction(
                name,
                other.type_name(),
                format!("cannot read '{}' from {}", name, other.type_name()),
            )),
        }
    }

    fn check_depth(&self, accessor: &Accessor, subject: &Subject, depth: usize) -> Result<()> {
        if depth > self.config.max_depth {
            return Err(self.depth_error(&accessor.to_string(), subject));
        }
        Ok(())
    }

    fn depth_error(&self, accessor: &str, subject: &Subject) -> Error {
        Error::extraction(
            accessor,
            subject.type_name(),
            format!(
                "maximum accessor depth of {} exceeded (nested '{}' or computed accessors)",
                self.config.max_depth, CONTEXT_SEPARATOR
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::Extraction;
    use crate::ErrorKind;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Debug)]
    struct Named {
        name: String,
        extra: HashMap<String, String>,
    }

    impl Named {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                extra: HashMap::new(),
            }
        }
    }

    impl crate::types::SubjectObject for Named {
        fn type_name(&self) -> &str {
            "Named"
        }

        fn field(&self, name: &str) -> Option<Subject> {
            (name == "name").then(|| Subject::from(self.name.as_str()))
        }

        fn dynamic_field(&self, name: &str) -> Option<anyhow::Result<Subject>> {
            if name == "broken" {
                return Some(Err(anyhow::anyhow!("getter exploded")));
            }
            self.extra.get(name).map(|v| Ok(Subject::from(v.as_str())))
        }

        fn call(&self, method: &str) -> Option<anyhow::Result<Subject>> {
            match method {
                "getName" => Some(Ok(Subject::from(self.name.as_str()))),
                "fail" => Some(Err(anyhow::anyhow!("boom"))),
                _ => None,
            }
        }
    }

    fn resolve(subject: &Subject, path: &str) -> Result<Subject> {
        Resolver::new().resolve(subject, &Accessor::path(path), &Context::new())
    }

    #[test]
    fn test_identity_on_blank_accessors() {
        let subject = Subject::from(json!({"a": 1}));
        let resolver = Resolver::new();
        let context = Context::new();
        assert_eq!(resolver.resolve_path(&subject, None, &context).unwrap(), subject);
        assert_eq!(resolve(&subject, "").unwrap(), subject);
        assert_eq!(resolve(&subject, "...").unwrap(), subject);
    }

    #[test]
    fn test_chained_lookup() {
        let subject = Subject::from(json!({"a": {"b": {"c": 7}}, "list": [10, 20]}));
        assert_eq!(resolve(&subject, "a.b.c").unwrap(), Subject::from(7));
        assert_eq!(resolve(&subject, "a..b.c").unwrap(), Subject::from(7));
        assert_eq!(resolve(&subject, "list.1").unwrap(), Subject::from(20));
    }

    #[test]
    fn test_integer_map_keys() {
        let subject = Subject::map([(Key::Int(5), "five")]);
        assert_eq!(resolve(&subject, "5").unwrap(), Subject::from("five"));
    }

    #[test]
    fn test_missing_key_reports_segment_and_type() {
        let subject = Subject::from(json!({"a": 1}));
        let err = resolve(&subject, "b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Extraction);
        assert_eq!(err.origin(), Some("b"));
        assert!(err.messages()[0].contains("'b'"));
        assert!(err.to_string().contains("on map"));
    }

    #[test]
    fn test_scalar_lookup_fails() {
        let err = resolve(&Subject::from(3), "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Extraction);
        assert!(err.messages()[0].contains("int"));
    }

    #[test]
    fn test_context_scope() {
        let context = Context::new().with("user", Subject::from(json!({"name": "Ann"})));
        let resolver = Resolver::new();
        let anything = Subject::from(json!([1, 2, 3]));

        let name = resolver
            .resolve(&anything, &Accessor::path("user::name"), &context)
            .unwrap();
        assert_eq!(name, Subject::from("Ann"));

        let entry = resolver
            .resolve(&anything, &Accessor::path("user::"), &context)
            .unwrap();
        assert_eq!(entry, Subject::from(json!({"name": "Ann"})));

        let blank_rest = resolver
            .resolve(&anything, &Accessor::path("user::  "), &context)
            .unwrap();
        assert_eq!(blank_rest, entry);

        let err = resolver
            .resolve(&anything, &Accessor::path("nobody::name"), &context)
            .unwrap_err();
        assert!(err.messages()[0].contains("context entry 'nobody'"));
    }

    #[test]
    fn test_call_maps_over_collections() {
        let subject = Subject::map([
            ("k1", Subject::object(Named::new("1"))),
            ("k2", Subject::object(Named::new("2"))),
        ]);
        let result = resolve(&subject, "getName()").unwrap();
        assert_eq!(result, Subject::from(json!({"k1": "1", "k2": "2"})));

        let sequence = Subject::Sequence(vec![
            Subject::object(Named::new("x")),
            Subject::object(Named::new("y")),
        ]);
        assert_eq!(
            resolve(&sequence, "getName()").unwrap(),
            Subject::from(json!(["x", "y"]))
        );
    }

    #[test]
    fn test_call_on_single_object() {
        let subject = Subject::map([("user", Subject::object(Named::new("Bo")))]);
        assert_eq!(resolve(&subject, "user.getName()").unwrap(), Subject::from("Bo"));
        assert_eq!(resolve(&subject, "user.name").unwrap(), Subject::from("Bo"));
    }

    #[test]
    fn test_invocation_fault_is_wrapped() {
        let subject = Subject::object(Named::new("z"));
        let err = resolve(&subject, "fail()").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Extraction);
        let source = std::error::Error::source(&err).expect("fault kept as source");
        assert_eq!(source.to_string(), "boom");

        let err = resolve(&subject, "missing()").unwrap_err();
        assert!(err.messages()[0].contains("not callable"));
    }

    #[test]
    fn test_dynamic_fields() {
        let mut named = Named::new("n");
        named.extra.insert("nickname".to_string(), "nn".to_string());
        let subject = Subject::object(named);

        assert_eq!(resolve(&subject, "nickname").unwrap(), Subject::from("nn"));
        let err = resolve(&subject, "broken").unwrap_err();
        assert!(std::error::Error::source(&err).is_some());
        let err = resolve(&subject, "unknown").unwrap_err();
        assert!(err.messages()[0].contains("not accessible on Named"));
    }

    #[test]
    fn test_computed_accessor() {
        let subject = Subject::from(json!({"field": "price", "price": 12, "nothing": null, "num": 4}));
        let resolver = Resolver::new();
        let context = Context::new();

        let accessor = Accessor::from(Extraction::new("field"));
        assert_eq!(resolver.resolve(&subject, &accessor, &context).unwrap(), Subject::from(12));

        let identity = Accessor::computed("nothing");
        assert_eq!(resolver.resolve(&subject, &identity, &context).unwrap(), subject);

        let err = resolver
            .resolve(&subject, &Accessor::computed("num"), &context)
            .unwrap_err();
        assert!(err.messages()[0].contains("computed accessor must yield string"));
    }

    #[test]
    fn test_depth_guard() {
        let resolver = Resolver::with_config(ResolverConfig { max_depth: 2 });
        let subject = Subject::from(json!({"a": "a"}));
        let mut accessor = Accessor::path("a");
        for _ in 0..4 {
            accessor = Accessor::computed(accessor);
        }
        let err = resolver.resolve(&subject, &accessor, &Context::new()).unwrap_err();
        assert!(err.messages()[0].contains("maximum accessor depth"));
    }
}
