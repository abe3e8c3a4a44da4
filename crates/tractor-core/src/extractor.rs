//! Extraction followed by transformation
//!
//! The [`Extractor`] resolves an accessor against a subject and pipes the
//! result through a one-shot pipeline built from the caller's
//! transformations. Callers see the failing stage's own error, never the
//! executor's stage wrapper.
//!
//! Copyright (c) 2025 Tractor Team
//! Licensed under the Apache-2.0 license

use crate::accessor::{Accessor, Resolver};
use crate::arguments::declarative::decode_accessor;
use crate::pipeline::{PipelineBuilder, PipelineDefinition};
use crate::registry::{services, Registry};
use crate::transformer::{StageRegistry, Transformations};
use crate::types::{Context, Key, Subject, SubjectMap};
use crate::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;

/// How to produce one output field
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldSpec {
    /// Path string, `null` or an `{"$extract": ..}` marker
    #[serde(default, deserialize_with = "accessor_from_config")]
    pub accessor: Accessor,

    /// Pipeline definition applied to the extracted value
    #[serde(default, alias = "pipeline", deserialize_with = "transformations_from_config")]
    pub transformations: Transformations,
}

impl FieldSpec {
    pub fn new(accessor: impl Into<Accessor>, transformations: Transformations) -> Self {
        Self {
            accessor: accessor.into(),
            transformations,
        }
    }
}

/// Output field name to field spec, in output order
pub type Mapping = IndexMap<String, FieldSpec>;

fn accessor_from_config<'de, D>(deserializer: D) -> std::result::Result<Accessor, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    decode_accessor(&value).map_err(serde::de::Error::custom)
}

fn transformations_from_config<'de, D>(deserializer: D) -> std::result::Result<Transformations, D::Error>
where
    D: Deserializer<'de>,
{
    let definition = PipelineDefinition::deserialize(deserializer)?;
    Transformations::from_definition(&definition).map_err(serde::de::Error::custom)
}

/// Resolves accessors and applies transformations
#[derive(Debug, Clone)]
pub struct Extractor {
    resolver: Arc<Resolver>,
    stages: Arc<StageRegistry>,
}

impl Extractor {
    pub fn new(resolver: Arc<Resolver>, stages: Arc<StageRegistry>) -> Self {
        Self { resolver, stages }
    }

    /// Build from the resolver and stage registry held by `registry`
    pub fn from_registry(registry: &Registry) -> Result<Self> {
        Ok(Self::new(
            registry.resolve::<Resolver>(services::RESOLVER)?,
            registry.resolve::<StageRegistry>(services::STAGE_REGISTRY)?,
        ))
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn stages(&self) -> &StageRegistry {
        &self.stages
    }

    /// Resolve `accessor` on `subject` and apply `transformations` in order
    pub fn extract(
        &self,
        subject: &Subject,
        accessor: &Accessor,
        transformations: &Transformations,
        context: &Context,
    ) -> Result<Subject> {
        let value = self.resolver.resolve(subject, accessor, context)?;
        if transformations.is_empty() {
            return Ok(value);
        }

        let pipeline = PipelineBuilder::new(Arc::clone(&self.stages)).build_transformations(transformations)?;
        log::debug!("extracted '{}', applying {} transformations", accessor, pipeline.len());
        pipeline.process(value, context)
    }

    /// Build a map with one entry per field of `mapping`
    ///
    /// The first failing field stops the mapping. Its error keeps its kind
    /// and gains a trailing message naming the field.
    pub fn extract_fields(&self, subject: &Subject, mapping: &Mapping, context: &Context) -> Result<Subject> {
        let mut output = SubjectMap::with_capacity(mapping.len());

        for (name, field) in mapping {
            let value = self
                .extract(subject, &field.accessor, &field.transformations, context)
                .map_err(|e| e.with_message(format!("field '{}' could not be produced", name)))?;
            output.insert(Key::Str(name.clone()), value);
        }

        Ok(Subject::Map(output))
    }
}
