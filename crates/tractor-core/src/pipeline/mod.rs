//! Stage pipeline executor
//!
//! A [`Pipeline`] threads a payload and a read-only [`Context`] through an
//! ordered list of [`Stage`]s. The first failing stage stops the run and its
//! error is wrapped in [`Error::Stage`] so callers can tell which stage
//! failed; [`Pipeline::process`] strips that wrapper again.
//!
//! The transformation system is organized into the following modules:
//!
//! - [`stages`] - transformer and validator contracts and their stage adapters
//! - [`builder`] - building pipelines from declarative definitions
//!
//! Copyright (c) 2025 Tractor Team
//! Licensed under the Apache-2.0 license

pub mod builder;
pub mod stages;

#[cfg(test)]
mod tests;

pub use builder::{PipelineBuilder, PipelineDefinition, StageDefinition};
pub use stages::{TransformationStage, Transformer, ValidationStage, Validator};

use crate::types::{Context, Subject};
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// One step of a pipeline
pub trait Stage: Send + Sync {
    /// Name used in logs and diagnostics
    fn name(&self) -> &str;

    /// Apply the stage to `payload`
    ///
    /// Failures use the engine's error taxonomy: transformation or
    /// validation errors for rejected input.
    fn apply(&self, payload: Subject, context: &Context) -> Result<Subject>;
}

/// An ordered list of stages
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    pub fn add_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Append several stages in order
    pub fn add_stages<I>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Stage>>,
    {
        self.stages.extend(stages);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Start a run that can be stepped stage by stage
    pub fn start(&self, payload: Subject) -> PipelineRun<'_> {
        PipelineRun::new(&self.stages, payload)
    }

    /// Run every stage; a failure is returned wrapped in [`Error::Stage`]
    pub fn run(&self, payload: Subject, context: &Context) -> Result<Subject> {
        self.start(payload).finish(context)
    }

    /// Run every stage and surface the failing stage's own error
    pub fn process(&self, payload: Subject, context: &Context) -> Result<Subject> {
        self.run(payload, context).map_err(Error::into_stage_cause)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// State of a [`PipelineRun`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Ready,
    Running { stage_index: usize },
    Succeeded,
    Failed { stage_index: usize },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed { .. })
    }
}

/// A single execution of a pipeline
///
/// Stages execute strictly in order; no stage is retried and a failed run
/// cannot be resumed.
pub struct PipelineRun<'p> {
    stages: &'p [Arc<dyn Stage>],
    state: RunState,
    value: Option<Subject>,
}

impl<'p> PipelineRun<'p> {
    fn new(stages: &'p [Arc<dyn Stage>], payload: Subject) -> Self {
        Self {
            stages,
            state: RunState::Ready,
            value: Some(payload),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Current payload; `None` once the run has failed
    pub fn value(&self) -> Option<&Subject> {
        self.value.as_ref()
    }

    /// Execute the next stage
    pub fn step(&mut self, context: &Context) -> Result<RunState> {
        let stage_index = match self.state {
            RunState::Ready => 0,
            RunState::Running { stage_index } => stage_index,
            RunState::Succeeded => return Ok(self.state),
            RunState::Failed { stage_index } => {
                return Err(Error::configuration(format!(
                    "pipeline run failed at stage {} and cannot be resumed",
                    stage_index
                )))
            }
        };

        if stage_index >= self.stages.len() {
            self.state = RunState::Succeeded;
            return Ok(self.state);
        }

        self.state = RunState::Running { stage_index };
        let stage = &self.stages[stage_index];
        let payload = self.value.take().unwrap_or_default();

        log::debug!("running stage {} '{}'", stage_index, stage.name());
        match stage.apply(payload, context) {
            Ok(next) => {
                self.value = Some(next);
                self.state = if stage_index + 1 == self.stages.len() {
                    RunState::Succeeded
                } else {
                    RunState::Running {
                        stage_index: stage_index + 1,
                    }
                };
                Ok(self.state)
            }
            Err(error) => {
                log::debug!("stage {} '{}' failed: {}", stage_index, stage.name(), error);
                self.state = RunState::Failed { stage_index };
                Err(Error::stage(stage_index, error))
            }
        }
    }

    /// Step until the run succeeds or fails
    pub fn finish(mut self, context: &Context) -> Result<Subject> {
        while !self.state.is_terminal() {
            self.step(context)?;
        }
        self.value
            .take()
            .ok_or_else(|| Error::configuration("pipeline run produced no value"))
    }
}
