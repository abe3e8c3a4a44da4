//! Built-in transformers and validators
//!
//! A small reference set of stages for common reshaping and checks. Stages
//! that take payload-dependent arguments read them through the
//! [`ArgumentProvider`], so their configuration may contain extractions.
//!
//! Copyright (c) 2025 Tractor Team
//! Licensed under the Apache-2.0 license

use super::StageRegistry;
use crate::arguments::{ArgumentProvider, ArgumentValue, Arguments};
use crate::pipeline::{Transformer, Validator};
use crate::types::{Context, Key, Subject};
use crate::{Error, Result};
use regex::Regex;
use std::sync::Arc;

pub const UPPER: &str = "upper";
pub const LOWER: &str = "lower";
pub const TRIM: &str = "trim";
pub const DEFAULT: &str = "default";
pub const MAP: &str = "map";
pub const COMPACT: &str = "compact";
pub const REQUIRED: &str = "required";
pub const TYPE: &str = "type";
pub const PATTERN: &str = "pattern";

/// Register every built-in stage
pub fn register_all(registry: &mut StageRegistry, provider: ArgumentProvider) {
    registry
        .register_transformer(UPPER, Arc::new(StringCase::Upper))
        .register_transformer(LOWER, Arc::new(StringCase::Lower))
        .register_transformer(TRIM, Arc::new(StringCase::Trim))
        .register_transformer(DEFAULT, Arc::new(DefaultValue::new(provider.clone())))
        .register_transformer(MAP, Arc::new(ValueMap::new(provider.clone())))
        .register_transformer(COMPACT, Arc::new(Compact))
        .register_validator(REQUIRED, Arc::new(Required))
        .register_validator(TYPE, Arc::new(TypeCheck::new(provider.clone())))
        .register_validator(PATTERN, Arc::new(PatternMatch::new(provider)));
}

/// Named argument, falling back to the first positional argument
fn named_or_first(provider: &ArgumentProvider, args: &Arguments, name: &str) -> ArgumentValue {
    let first = provider.get(Some(args), 0i64, Subject::Null);
    provider.get(Some(args), name, first)
}

fn expand_named_or_first(
    provider: &ArgumentProvider,
    stage: &str,
    args: &Arguments,
    name: &str,
    payload: &Subject,
    context: &Context,
) -> Result<Subject> {
    let fallback = named_or_first(provider, args, name);
    provider
        .get_with_expansion(Some(args), name, fallback, payload, context)
        .map_err(|e| {
            Error::transformation(stage, vec![format!("could not expand argument '{}'", name)])
                .with_arguments(args.clone())
                .with_cause(e)
        })
}

/// String case and whitespace transformers; null passes through
#[derive(Debug, Clone, Copy)]
pub enum StringCase {
    Upper,
    Lower,
    Trim,
}

impl StringCase {
    fn name(&self) -> &'static str {
        match self {
            StringCase::Upper => UPPER,
            StringCase::Lower => LOWER,
            StringCase::Trim => TRIM,
        }
    }
}

impl Transformer for StringCase {
    fn transform(&self, value: Subject, arguments: &Arguments, _context: &Context) -> Result<Subject> {
        match value {
            Subject::Null => Ok(Subject::Null),
            Subject::String(s) => Ok(Subject::String(match self {
                StringCase::Upper => s.to_uppercase(),
                StringCase::Lower => s.to_lowercase(),
                StringCase::Trim => s.trim().to_string(),
            })),
            other => Err(Error::invalid_type(self.name(), "string", other, Vec::new())
                .with_arguments(arguments.clone())),
        }
    }
}

/// Replaces null with the `value` argument
#[derive(Debug, Clone)]
pub struct DefaultValue {
    provider: ArgumentProvider,
}

impl DefaultValue {
    pub fn new(provider: ArgumentProvider) -> Self {
        Self { provider }
    }
}

impl Transformer for DefaultValue {
    fn transform(&self, value: Subject, arguments: &Arguments, context: &Context) -> Result<Subject> {
        if !value.is_null() {
            return Ok(value);
        }
        expand_named_or_first(&self.provider, DEFAULT, arguments, "value", &value, context)
    }
}

/// Maps scalar values through the `values` table
///
/// Values without an entry use the `default` argument when configured and
/// fail otherwise.
#[derive(Debug, Clone)]
pub struct ValueMap {
    provider: ArgumentProvider,
}

impl ValueMap {
    pub fn new(provider: ArgumentProvider) -> Self {
        Self { provider }
    }
}

impl Transformer for ValueMap {
    fn transform(&self, value: Subject, arguments: &Arguments, context: &Context) -> Result<Subject> {
        let key = match &value {
            Subject::String(s) => Key::Str(s.clone()),
            Subject::Int(i) => Key::Int(*i),
            _ => {
                return Err(Error::invalid_type(MAP, "string or int", value, Vec::new())
                    .with_arguments(arguments.clone()))
            }
        };

        let table = expand_named_or_first(&self.provider, MAP, arguments, "values", &value, context)?;
        let table = match table {
            Subject::Map(map) => map,
            other => {
                return Err(Error::transformation(
                    MAP,
                    vec![format!("argument 'values' must be a map, found {}", other.type_name())],
                )
                .with_arguments(arguments.clone()))
            }
        };

        if let Some(mapped) = table.get(&key) {
            return Ok(mapped.clone());
        }

        if arguments.contains(&Key::from("default")) {
            return self
                .provider
                .get_with_expansion(Some(arguments), "default", Subject::Null, &value, context)
                .map_err(|e| {
                    Error::transformation(MAP, vec!["could not expand argument 'default'".to_string()])
                        .with_arguments(arguments.clone())
                        .with_cause(e)
                });
        }

        Err(Error::transformation(MAP, vec![format!("no mapping for '{}'", key)])
            .with_arguments(arguments.clone())
            .with_data(value))
    }
}

/// Drops null entries from sequences and maps; other values pass through
#[derive(Debug, Clone, Copy)]
pub struct Compact;

impl Transformer for Compact {
    fn transform(&self, value: Subject, _arguments: &Arguments, _context: &Context) -> Result<Subject> {
        Ok(match value {
            Subject::Sequence(items) => {
                Subject::Sequence(items.into_iter().filter(|v| !v.is_null()).collect())
            }
            Subject::Map(mut map) => {
                map.retain(|_, v| !v.is_null());
                Subject::Map(map)
            }
            other => other,
        })
    }
}

/// Rejects null and blank strings
#[derive(Debug, Clone, Copy)]
pub struct Required;

impl Validator for Required {
    fn validate(&self, value: &Subject, arguments: &Arguments, _context: &Context) -> Result<()> {
        let message = match value {
            Subject::Null => "value is required",
            Subject::String(s) if s.trim().is_empty() => "value must not be blank",
            _ => return Ok(()),
        };
        Err(Error::invalid_data(REQUIRED, value.clone(), vec![message.to_string()])
            .with_arguments(arguments.clone()))
    }
}

/// Checks the value's type name against the `type` argument
///
/// `number` accepts both integers and floats; `object` accepts any host
/// object.
#[derive(Debug, Clone)]
pub struct TypeCheck {
    provider: ArgumentProvider,
}

impl TypeCheck {
    pub fn new(provider: ArgumentProvider) -> Self {
        Self { provider }
    }
}

impl Validator for TypeCheck {
    fn validate(&self, value: &Subject, arguments: &Arguments, context: &Context) -> Result<()> {
        let expected = expand_named_or_first(&self.provider, TYPE, arguments, "type", value, context)?;
        let expected = match expected {
            Subject::String(s) => s,
            other => {
                return Err(Error::configuration(format!(
                    "'type' validator needs a type name, found {}",
                    other.type_name()
                ))
                .with_origin(TYPE))
            }
        };

        let matches = match (expected.as_str(), value) {
            ("number", Subject::Int(_) | Subject::Float(_)) => true,
            ("object", Subject::Object(_)) => true,
            (name, other) => other.type_name() == name,
        };

        if matches {
            Ok(())
        } else {
            Err(Error::invalid_type(TYPE, expected, value.clone(), Vec::new())
                .with_arguments(arguments.clone()))
        }
    }
}

/// Matches strings against the `pattern` regular expression
#[derive(Debug, Clone)]
pub struct PatternMatch {
    provider: ArgumentProvider,
}

impl PatternMatch {
    pub fn new(provider: ArgumentProvider) -> Self {
        Self { provider }
    }
}

impl Validator for PatternMatch {
    fn validate(&self, value: &Subject, arguments: &Arguments, context: &Context) -> Result<()> {
        let text = match value {
            Subject::String(s) => s,
            other => {
                return Err(Error::invalid_type(PATTERN, "string", other.clone(), Vec::new())
                    .with_arguments(arguments.clone()))
            }
        };

        let pattern = match expand_named_or_first(&self.provider, PATTERN, arguments, "pattern", value, context)? {
            Subject::String(p) => p,
            other => {
                return Err(Error::configuration(format!(
                    "'pattern' validator needs a pattern string, found {}",
                    other.type_name()
                ))
                .with_origin(PATTERN))
            }
        };

        let regex = Regex::new(&pattern).map_err(|e| {
            Error::configuration(format!("invalid pattern '{}'", pattern))
                .with_origin(PATTERN)
                .with_cause(e)
        })?;

        if regex.is_match(text) {
            Ok(())
        } else {
            Err(Error::invalid_data(
                PATTERN,
                value.clone(),
                vec![format!("'{}' does not match pattern '{}'", text, pattern)],
            )
            .with_arguments(arguments.clone()))
        }
    }
}
