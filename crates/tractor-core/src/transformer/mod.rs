//! Named transformations and the stage registry
//!
//! A [`Transformation`] is a stage name plus its configured arguments;
//! [`Transformations`] is the ordered list applied by the extractor. The
//! [`StageRegistry`] maps names to the transformers and validators that
//! implement them.
//!
//! - [`built_in`] - the reference set of stages shipped with the engine
//!
//! Copyright (c) 2025 Tractor Team
//! Licensed under the Apache-2.0 license

pub mod built_in;

use crate::arguments::{ArgumentProvider, Arguments};
use crate::pipeline::{PipelineDefinition, Stage, TransformationStage, Transformer, ValidationStage, Validator};
use crate::{Error, Result};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// A named operation with its configured arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Transformation {
    name: String,
    arguments: Arguments,
}

impl Transformation {
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Transformation without arguments
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Arguments::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }
}

/// Ordered transformations, applied left to right
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transformations {
    items: Vec<Transformation>,
}

impl Transformations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append
    pub fn then(mut self, transformation: Transformation) -> Self {
        self.items.push(transformation);
        self
    }

    pub fn push(&mut self, transformation: Transformation) {
        self.items.push(transformation);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transformation> {
        self.items.iter()
    }

    /// Decode transformations from a declarative pipeline definition
    ///
    /// Every malformed entry is reported; messages are collected into one
    /// configuration error.
    pub fn from_definition(definition: &PipelineDefinition) -> Result<Self> {
        let mut items = Vec::with_capacity(definition.stages.len());
        let mut problems = Vec::new();

        for (index, stage) in definition.stages.iter().enumerate() {
            match Arguments::from_config(&stage.args) {
                Ok(arguments) => items.push(Transformation::new(stage.stage.clone(), arguments)),
                Err(e) => problems.extend(
                    e.messages()
                        .iter()
                        .map(|m| format!("stage {} '{}': {}", index, stage.stage, m)),
                ),
            }
        }

        if problems.is_empty() {
            Ok(Self { items })
        } else {
            Err(Error::configuration_all(Some("pipeline".to_string()), problems))
        }
    }
}

impl FromIterator<Transformation> for Transformations {
    fn from_iter<I: IntoIterator<Item = Transformation>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Transformations {
    type Item = &'a Transformation;
    type IntoIter = std::slice::Iter<'a, Transformation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[derive(Clone)]
enum Operation {
    Transformer(Arc<dyn Transformer>),
    Validator(Arc<dyn Validator>),
}

/// Registry of named stage implementations
#[derive(Clone, Default)]
pub struct StageRegistry {
    operations: IndexMap<String, Operation>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the stages in [`built_in`]
    pub fn with_built_ins(provider: ArgumentProvider) -> Self {
        let mut registry = Self::new();
        built_in::register_all(&mut registry, provider);
        registry
    }

    /// Register a transformer under `name`, replacing any previous entry
    pub fn register_transformer(&mut self, name: impl Into<String>, transformer: Arc<dyn Transformer>) -> &mut Self {
        self.operations.insert(name.into(), Operation::Transformer(transformer));
        self
    }

    /// Register a validator under `name`, replacing any previous entry
    pub fn register_validator(&mut self, name: impl Into<String>, validator: Arc<dyn Validator>) -> &mut Self {
        self.operations.insert(name.into(), Operation::Validator(validator));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.operations.keys().map(String::as_str).collect()
    }

    /// Bind the operation registered under `name` to `arguments`
    pub fn stage(&self, name: &str, arguments: Arguments) -> Result<Arc<dyn Stage>> {
        match self.operations.get(name) {
            Some(Operation::Transformer(t)) => {
                Ok(Arc::new(TransformationStage::new(name, Arc::clone(t), arguments)))
            }
            Some(Operation::Validator(v)) => {
                Ok(Arc::new(ValidationStage::new(name, Arc::clone(v), arguments)))
            }
            None => Err(Error::configuration(format!("unknown stage '{}'", name)).with_origin(name)),
        }
    }

    /// Stage applying `transformation`
    pub fn stage_for(&self, transformation: &Transformation) -> Result<Arc<dyn Stage>> {
        self.stage(transformation.name(), transformation.arguments().clone())
    }
}

impl fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageRegistry")
            .field("operations", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Context, Subject};
    use crate::ErrorKind;
    use serde_json::json;

    fn identity() -> Arc<dyn Transformer> {
        Arc::new(|value: Subject, _: &Arguments, _: &Context| -> Result<Subject> { Ok(value) })
    }

    #[test]
    fn test_unknown_stage_is_configuration_error() {
        let registry = StageRegistry::new();
        let err = registry.stage("nope", Arguments::new()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.origin(), Some("nope"));
    }

    #[test]
    fn test_registration_order_and_replacement() {
        let mut registry = StageRegistry::new();
        registry
            .register_transformer("b", identity())
            .register_transformer("a", identity())
            .register_transformer("b", identity());
        assert_eq!(registry.names(), vec!["b", "a"]);
        assert!(registry.contains("a"));
    }

    #[test]
    fn test_from_definition_collects_every_problem() {
        let definition: PipelineDefinition = serde_json::from_value(json!([
            {"stage": "upper"},
            {"stage": "map", "args": "bad"},
            {"stage": "default", "args": {"value": {"$extract": 3}}}
        ]))
        .unwrap();

        let err = Transformations::from_definition(&definition).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.messages().len(), 2);
        assert!(err.messages()[0].starts_with("stage 1 'map'"));
        assert!(err.messages()[1].starts_with("stage 2 'default'"));
    }

    #[test]
    fn test_from_definition() {
        let definition: PipelineDefinition = serde_json::from_value(json!([
            {"stage": "trim"},
            {"stage": "default", "args": {"value": "n/a"}}
        ]))
        .unwrap();
        let transformations = Transformations::from_definition(&definition).unwrap();
        let names: Vec<_> = transformations.iter().map(Transformation::name).collect();
        assert_eq!(names, vec!["trim", "default"]);
    }
}
