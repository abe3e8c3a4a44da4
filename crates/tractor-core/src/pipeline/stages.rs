//! Transformer and validator contracts
//!
//! Concrete operations implement [`Transformer`] or [`Validator`]; the
//! adapters in this module bind one to its configured [`Arguments`] so it
//! can run as a pipeline [`Stage`].
//!
//! Copyright (c) 2025 Tractor Team
//! Licensed under the Apache-2.0 license

use super::Stage;
use crate::arguments::Arguments;
use crate::types::{Context, Subject};
use crate::Result;
use std::sync::Arc;

/// An operation that reshapes a value
pub trait Transformer: Send + Sync {
    /// Transform `value`; failures are [`crate::Error::Transformation`] or a
    /// validation error
    fn transform(&self, value: Subject, arguments: &Arguments, context: &Context) -> Result<Subject>;
}

/// An operation that checks a value without changing it
pub trait Validator: Send + Sync {
    /// Check `value`; failures are [`crate::Error::InvalidData`] or
    /// [`crate::Error::InvalidType`]
    fn validate(&self, value: &Subject, arguments: &Arguments, context: &Context) -> Result<()>;
}

/// Closures can be used as transformers
impl<F> Transformer for F
where
    F: Fn(Subject, &Arguments, &Context) -> Result<Subject> + Send + Sync,
{
    fn transform(&self, value: Subject, arguments: &Arguments, context: &Context) -> Result<Subject> {
        self(value, arguments, context)
    }
}

/// A transformer bound to its configured arguments
#[derive(Clone)]
pub struct TransformationStage {
    name: String,
    transformer: Arc<dyn Transformer>,
    arguments: Arguments,
}

impl TransformationStage {
    pub fn new(name: impl Into<String>, transformer: Arc<dyn Transformer>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            transformer,
            arguments,
        }
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }
}

impl Stage for TransformationStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, payload: Subject, context: &Context) -> Result<Subject> {
        self.transformer.transform(payload, &self.arguments, context)
    }
}

/// A validator bound to its configured arguments; passes the value through
#[derive(Clone)]
pub struct ValidationStage {
    name: String,
    validator: Arc<dyn Validator>,
    arguments: Arguments,
}

impl ValidationStage {
    pub fn new(name: impl Into<String>, validator: Arc<dyn Validator>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            validator,
            arguments,
        }
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }
}

impl Stage for ValidationStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, payload: Subject, context: &Context) -> Result<Subject> {
        self.validator.validate(&payload, &self.arguments, context)?;
        Ok(payload)
    }
}
