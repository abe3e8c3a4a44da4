//! Builder for declarative pipelines
//!
//! A pipeline definition is an ordered list of `{stage, args}` entries, read
//! from JSON or YAML. The builder resolves each stage name against a
//! [`StageRegistry`] and decodes its arguments.
//!
//! Copyright (c) 2025 Tractor Team
//! Licensed under the Apache-2.0 license

use super::Pipeline;
use crate::transformer::{StageRegistry, Transformations};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// One entry of a declarative pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Registered stage identifier
    #[serde(alias = "stage_identifier")]
    pub stage: String,

    /// Declarative arguments, see [`crate::arguments::declarative`]
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub args: Value,
}

impl StageDefinition {
    pub fn new(stage: impl Into<String>, args: Value) -> Self {
        Self {
            stage: stage.into(),
            args,
        }
    }
}

/// Ordered list of stage definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineDefinition {
    pub stages: Vec<StageDefinition>,
}

impl PipelineDefinition {
    pub fn new(stages: Vec<StageDefinition>) -> Self {
        Self { stages }
    }

    /// Decode a definition from a configuration value
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| {
            Error::configuration("pipeline definition must be a list of {stage, args} entries")
                .with_origin("pipeline")
                .with_cause(e)
        })
    }
}

/// Builds runnable pipelines from definitions
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    registry: Arc<StageRegistry>,
}

impl PipelineBuilder {
    pub fn new(registry: Arc<StageRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    /// Build a pipeline from a definition
    ///
    /// Unknown stage names and malformed arguments are all reported in a
    /// single configuration error.
    pub fn build(&self, definition: &PipelineDefinition) -> Result<Pipeline> {
        let mut problems = Vec::new();

        for (index, stage) in definition.stages.iter().enumerate() {
            if !self.registry.contains(&stage.stage) {
                problems.push(format!("stage {}: unknown stage '{}'", index, stage.stage));
            }
        }

        let transformations = match Transformations::from_definition(definition) {
            Ok(transformations) => Some(transformations),
            Err(e) => {
                problems.extend(e.messages().iter().cloned());
                None
            }
        };

        match transformations {
            Some(transformations) if problems.is_empty() => self.build_transformations(&transformations),
            _ => Err(Error::configuration_all(Some("pipeline".to_string()), problems)),
        }
    }

    /// Build a pipeline applying `transformations` in order
    pub fn build_transformations(&self, transformations: &Transformations) -> Result<Pipeline> {
        let stages = transformations
            .iter()
            .map(|t| self.registry.stage_for(t))
            .collect::<Result<Vec<_>>>()?;

        log::debug!("built pipeline with {} stages", stages.len());
        Ok(Pipeline::new().add_stages(stages))
    }
}
