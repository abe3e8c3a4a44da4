//! Extract command handler

use super::utils::{ensure_single_stdin, load_context, load_document, Engine};
use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use tracing::instrument;
use tractor_core::{Accessor, Context, Pipeline, PipelineDefinition, RunState, Subject};

/// Handle the extract command
#[instrument(skip(config, output), fields(subject = %args.subject.display(), accessor = %args.accessor))]
pub fn handle_extract(args: ExtractArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::with_details("extract", &args.accessor);
    ensure_single_stdin([
        Some(args.subject.as_path()),
        args.pipeline.as_deref(),
        args.context.as_deref(),
    ])?;

    let engine = Engine::from_config(config)?;
    let subject = Subject::from(load_document(&args.subject)?);
    let context = load_context(args.context.as_deref())?;

    // Build before resolving so definition errors surface first
    let pipeline = match &args.pipeline {
        Some(path) => {
            let definition = PipelineDefinition::from_value(load_document(path)?)?;
            Some(engine.builder.build(&definition)?)
        }
        None => None,
    };

    let accessor = Accessor::path(args.accessor.as_str());
    let mut value = engine.extractor.resolver().resolve(&subject, &accessor, &context)?;
    tracing::debug!(accessor = %accessor, kind = %value.type_name(), "resolved accessor");

    if let Some(pipeline) = pipeline {
        output.info(&format!("Running {} stage(s): {}", pipeline.len(), pipeline.stage_names().join(" → ")))?;
        value = run_stepwise(&pipeline, value, &context)?;
    }

    if value.is_null() {
        output.warning(&format!("'{}' produced null", accessor))?;
    }
    output.subject(&value)?;
    timer.finish();
    Ok(())
}

/// Run `pipeline` one stage at a time, tracing each transition
///
/// A failure keeps its stage wrapper so the report names the stage index.
pub(super) fn run_stepwise(pipeline: &Pipeline, payload: Subject, context: &Context) -> Result<Subject> {
    let mut run = pipeline.start(payload);

    while !run.state().is_terminal() {
        let state = run.step(context).map_err(|e| {
            tracing::debug!(state = ?run.state(), error = %e, "pipeline run failed");
            e
        })?;
        if let RunState::Running { stage_index } = state {
            tracing::trace!(next = stage_index, "stage completed");
        }
    }

    Ok(run.finish(context)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;
    use tractor_core::ErrorKind;

    fn pipeline(stages: serde_json::Value) -> Pipeline {
        let engine = Engine::from_config(&Config::default()).unwrap();
        let definition = PipelineDefinition::from_value(stages).unwrap();
        engine.builder.build(&definition).unwrap()
    }

    #[test]
    fn test_run_stepwise_applies_every_stage() {
        let pipeline = pipeline(json!([{"stage": "trim"}, {"stage": "upper"}]));
        let value = run_stepwise(&pipeline, Subject::from("  nl "), &Context::new()).unwrap();
        assert_eq!(value, Subject::from("NL"));
    }

    #[test]
    fn test_run_stepwise_keeps_stage_index() {
        let pipeline = pipeline(json!([{"stage": "trim"}, {"stage": "required"}, {"stage": "upper"}]));
        let err = run_stepwise(&pipeline, Subject::from("   "), &Context::new()).unwrap_err();

        let Error::Core(core) = &err else {
            panic!("expected an engine error, got {:?}", err);
        };
        assert_eq!(core.stage_index(), Some(1));
        assert_eq!(crate::error::stage_cause(core).kind(), ErrorKind::InvalidData);
        assert_eq!(err.exit_code(), 22);
    }
}
