//! Tests for the stage pipeline executor
//!
//! Copyright (c) 2025 Tractor Team
//! Licensed under the Apache-2.0 license

use super::*;
use crate::arguments::Arguments;
use crate::ErrorKind;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Stage that appends its tag to a string payload and counts invocations
struct Append {
    tag: &'static str,
    calls: Arc<AtomicUsize>,
}

impl Stage for Append {
    fn name(&self) -> &str {
        self.tag
    }

    fn apply(&self, payload: Subject, _context: &Context) -> Result<Subject> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = payload.as_str().unwrap_or_default();
        Ok(Subject::from(format!("{}{}", text, self.tag)))
    }
}

struct Reject {
    calls: Arc<AtomicUsize>,
}

impl Stage for Reject {
    fn name(&self) -> &str {
        "reject"
    }

    fn apply(&self, payload: Subject, _context: &Context) -> Result<Subject> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::invalid_data(
            "reject",
            payload,
            vec!["rejected".to_string(), "still rejected".to_string()],
        ))
    }
}

fn append(tag: &'static str, calls: &Arc<AtomicUsize>) -> Arc<dyn Stage> {
    Arc::new(Append {
        tag,
        calls: Arc::clone(calls),
    })
}

fn reject(calls: &Arc<AtomicUsize>) -> Arc<dyn Stage> {
    Arc::new(Reject {
        calls: Arc::clone(calls),
    })
}

#[test]
fn test_stages_run_in_order() {
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = Pipeline::new()
        .add_stage(append("a", &calls))
        .add_stage(append("b", &calls))
        .add_stage(append("c", &calls));

    let result = pipeline.run(Subject::from(">"), &Context::new()).unwrap();
    assert_eq!(result, Subject::from(">abc"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_failure_short_circuits() {
    let before = Arc::new(AtomicUsize::new(0));
    let failing = Arc::new(AtomicUsize::new(0));
    let after = Arc::new(AtomicUsize::new(0));
    let pipeline = Pipeline::new()
        .add_stage(append("a", &before))
        .add_stage(reject(&failing))
        .add_stage(append("c", &after));

    let err = pipeline.run(Subject::from(""), &Context::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Stage);
    assert_eq!(err.stage_index(), Some(1));

    assert_eq!(before.load(Ordering::SeqCst), 1);
    assert_eq!(failing.load(Ordering::SeqCst), 1);
    assert_eq!(after.load(Ordering::SeqCst), 0);
}

#[test]
fn test_process_surfaces_the_stage_error() {
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = Pipeline::new()
        .add_stage(append("a", &calls))
        .add_stage(reject(&calls))
        .add_stage(append("c", &calls));

    let err = pipeline.process(Subject::from(""), &Context::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert_eq!(err.origin(), Some("reject"));
    assert_eq!(
        err.messages(),
        &["rejected".to_string(), "still rejected".to_string()]
    );
    assert_eq!(err.data(), Some(&Subject::from("a")));
}

#[test]
fn test_empty_pipeline_is_identity() {
    let pipeline = Pipeline::new();
    assert!(pipeline.is_empty());

    let payload = Subject::from(serde_json::json!({"a": [1, 2]}));
    assert_eq!(pipeline.run(payload.clone(), &Context::new()).unwrap(), payload);

    let mut run = pipeline.start(Subject::Null);
    assert_eq!(run.step(&Context::new()).unwrap(), RunState::Succeeded);
}

#[test]
fn test_run_state_transitions() {
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = Pipeline::new()
        .add_stage(append("a", &calls))
        .add_stage(append("b", &calls));
    let context = Context::new();

    let mut run = pipeline.start(Subject::from(""));
    assert_eq!(run.state(), RunState::Ready);

    assert_eq!(run.step(&context).unwrap(), RunState::Running { stage_index: 1 });
    assert_eq!(run.value(), Some(&Subject::from("a")));

    assert_eq!(run.step(&context).unwrap(), RunState::Succeeded);
    assert!(run.state().is_terminal());

    // stepping a finished run is a no-op
    assert_eq!(run.step(&context).unwrap(), RunState::Succeeded);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(run.finish(&context).unwrap(), Subject::from("ab"));
}

#[test]
fn test_failed_run_cannot_resume() {
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = Pipeline::new()
        .add_stage(reject(&calls))
        .add_stage(append("b", &calls));
    let context = Context::new();

    let mut run = pipeline.start(Subject::from(""));
    assert!(run.step(&context).is_err());
    assert_eq!(run.state(), RunState::Failed { stage_index: 0 });
    assert!(run.value().is_none());

    let err = run.step(&context).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_transformation_and_validation_stages() {
    let shout: Arc<dyn Transformer> = Arc::new(|value: Subject, args: &Arguments, _: &Context| -> Result<Subject> {
        let suffix = args
            .get(&crate::types::Key::from("suffix"))
            .and_then(|v| v.as_literal())
            .and_then(Subject::as_str)
            .unwrap_or("")
            .to_string();
        Ok(Subject::from(format!("{}{}", value.as_str().unwrap_or(""), suffix)))
    });

    struct NotEmpty;
    impl Validator for NotEmpty {
        fn validate(&self, value: &Subject, _: &Arguments, _: &Context) -> Result<()> {
            match value.as_str() {
                Some("") => Err(Error::invalid_data("not_empty", value.clone(), vec!["empty".into()])),
                _ => Ok(()),
            }
        }
    }

    let pipeline = Pipeline::new()
        .add_stage(Arc::new(ValidationStage::new("not_empty", Arc::new(NotEmpty), Arguments::new())))
        .add_stage(Arc::new(TransformationStage::new(
            "shout",
            shout,
            Arguments::new().with("suffix", "!"),
        )));

    assert_eq!(pipeline.stage_names(), vec!["not_empty", "shout"]);
    assert_eq!(
        pipeline.process(Subject::from("hey"), &Context::new()).unwrap(),
        Subject::from("hey!")
    );

    let err = pipeline.process(Subject::from(""), &Context::new()).unwrap_err();
    assert!(err.is_validation());
}
