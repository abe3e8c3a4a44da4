//! End-to-end tests for extraction, argument expansion and pipelines


use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use test_support::*;
use tractor_core::{
    Accessor, Argument, ArgumentProvider, Arguments, Context, Error, ErrorKind, Extraction, Key,
    Mapping, Pipeline, PipelineBuilder, PipelineDefinition, Resolver, ResolverConfig, Result,
    Stage, StageRegistry, Subject, Transformations,
};

#[test]
fn test_identity_on_empty_accessor() {
    let subject = order();
    let resolver = Resolver::new();
    let context = Context::new();

    assert_eq!(resolver.resolve_path(&subject, None, &context).unwrap(), subject);
    for path in ["", "...", " . "] {
        assert_eq!(resolver.resolve(&subject, &Accessor::path(path), &context).unwrap(), subject);
    }
}

#[test]
fn test_left_fold_chaining() {
    let subject = order();
    let context = Context::new();

    let chained = extract(&subject, "order.customer.name", &context).unwrap();
    let stepwise = extract(
        &extract(&extract(&subject, "order", &context).unwrap(), "customer", &context).unwrap(),
        "name",
        &context,
    )
    .unwrap();
    assert_eq!(chained, stepwise);
    assert_eq!(extract(&subject, "order..lines.1.sku", &context).unwrap(), Subject::from("B-7"));
}

#[test]
fn test_context_scoping() {
    let context = user_context();
    for subject in [Subject::Null, order(), people()] {
        assert_eq!(extract(&subject, "user::name", &context).unwrap(), Subject::from("Ann"));
        assert_eq!(
            extract(&subject, "user::", &context).unwrap(),
            Subject::from(json!({"name": "Ann"}))
        );
    }
}

#[test]
fn test_callable_suffix_maps_over_collections() {
    let value = extract(&people(), "getName()", &Context::new()).unwrap();
    assert_eq!(value, Subject::from(json!({"k1": "1", "k2": "2"})));

    let keys: Vec<_> = value.as_map().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec![Key::from("k1"), Key::from("k2")]);

    let single = extract(&shared_person("Bo"), "getName()", &Context::new()).unwrap();
    assert_eq!(single, Subject::from("Bo"));
}

#[test]
fn test_object_fields_and_dynamic_getter() {
    let subject = Subject::map([
        ("person", shared_person("Cy")),
        ("settings", Subject::object(Settings)),
    ]);
    let context = Context::new();

    assert_eq!(extract(&subject, "person.name", &context).unwrap(), Subject::from("Cy"));
    assert_eq!(extract(&subject, "settings.env_prod", &context).unwrap(), Subject::from("PROD"));

    let err = extract(&subject, "settings.other", &context).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Extraction);
    assert!(err.messages()[0].contains("Settings"));
}

#[test]
fn test_missing_key_fails_with_extraction_error() {
    let err = extract(&Subject::from(json!({"a": 1})), "b", &Context::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Extraction);
    assert!(err.messages().iter().any(|m| m.contains("\"b\"") || m.contains("'b'")));
}

#[test]
fn test_host_faults_are_wrapped() {
    let err = extract(&shared_person("Di"), "explode()", &Context::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Extraction);

    let source = std::error::Error::source(&err).expect("fault retained as source");
    assert_eq!(source.to_string(), "connection reset");
}

#[test]
fn test_computed_accessor() {
    let subject = Subject::from(json!({"pointer": "order.total", "order": {"total": 5}, "bad": 3}));
    let resolver = Resolver::new();
    let context = Context::new();

    let value = resolver
        .resolve(&subject, &Accessor::computed("pointer"), &context)
        .unwrap();
    assert_eq!(value, Subject::from(5));

    let err = resolver
        .resolve(&subject, &Accessor::computed("bad"), &context)
        .unwrap_err();
    assert!(err.messages()[0].contains("computed accessor must yield string"));
}

#[test]
fn test_depth_guard() {
    let resolver = Resolver::with_config(ResolverConfig { max_depth: 2 });
    let subject = Subject::from(json!({"p": "p"}));
    let accessor = Accessor::computed(Accessor::computed(Accessor::computed("p")));

    let err = resolver.resolve(&subject, &accessor, &Context::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Extraction);
    assert!(err.messages()[0].contains("maximum accessor depth"));
}

#[test]
fn test_invalid_type_message_non_loss() {
    let data = Subject::from(json!([1, 2]));
    let err = Error::invalid_type("type", "string", data, vec!["E1".to_string()]);

    assert_eq!(err.messages().len(), 2);
    assert!(err.messages().contains(&"E1".to_string()));
    assert!(err.messages().contains(&"expected string, received sequence".to_string()));
}

struct Counting {
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl Stage for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn apply(&self, payload: Subject, _context: &Context) -> Result<Subject> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(Error::transformation("counting", vec!["stage two failed".to_string()]).with_data(payload))
        } else {
            Ok(payload)
        }
    }
}

#[test]
fn test_pipeline_short_circuit() {
    let counters: Vec<_> = (0..3).map(|_| Arc::new(AtomicUsize::new(0))).collect();
    let pipeline = Pipeline::new().add_stages(counters.iter().enumerate().map(|(i, calls)| {
        Arc::new(Counting {
            fail: i == 1,
            calls: Arc::clone(calls),
        }) as Arc<dyn Stage>
    }));

    let err = pipeline.process(Subject::from("x"), &Context::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transformation);
    assert_eq!(err.messages(), &["stage two failed".to_string()]);
    assert_eq!(err.data(), Some(&Subject::from("x")));

    let calls: Vec<_> = counters.iter().map(|c| c.load(Ordering::SeqCst)).collect();
    assert_eq!(calls, vec![1, 1, 0]);
}

#[test]
fn test_argument_expansion() {
    let provider = ArgumentProvider::new(Arc::new(Resolver::new()));
    let nested: Arguments = vec![Argument::computed(Extraction::new("a"), Extraction::new("b"))]
        .into_iter()
        .collect();
    let args = Arguments::new().with_positional(nested);
    let payload = Subject::from(json!({"a": "k", "b": 42}));

    let expanded = provider
        .get_with_expansion(Some(&args), 0i64, Subject::Null, &payload, &Context::new())
        .unwrap();
    assert_eq!(expanded, Subject::from(json!({"k": 42})));
}

#[test]
fn test_argument_expansion_stops_at_the_first_level() {
    let provider = ArgumentProvider::new(Arc::new(Resolver::new()));
    let args = Arguments::from_config(&json!({
        "opts": {
            "top": {"$extract": "v"},
            "inner": {"deep": {"$extract": "v"}}
        }
    }))
    .unwrap();
    let payload = Subject::from(json!({"v": 1}));

    let expanded = provider
        .get_with_expansion(Some(&args), "opts", Subject::Null, &payload, &Context::new())
        .unwrap();
    assert_eq!(
        expanded,
        Subject::from(json!({"top": 1, "inner": {"deep": {"$extract": "v"}}}))
    );
}

#[test]
fn test_yaml_pipeline_definition() {
    let yaml = r#"
- stage: trim
- stage: map
  args:
    values:
      ANN SMITH: { $extract: "labels::vip" }
    default: regular
- stage: upper
"#;
    let definition: PipelineDefinition = serde_yaml::from_str(yaml).unwrap();
    let provider = ArgumentProvider::new(Arc::new(Resolver::new()));
    let registry = Arc::new(StageRegistry::with_built_ins(provider));
    let context = Context::new().with("labels", Subject::from(json!({"vip": "gold"})));

    // map keys are case sensitive, so the untransformed name falls back to the default
    let pipeline = PipelineBuilder::new(Arc::clone(&registry)).build(&definition).unwrap();
    let value = pipeline.process(Subject::from(" ann smith "), &context).unwrap();
    assert_eq!(value, Subject::from("REGULAR"));

    let value = pipeline.process(Subject::from("ANN SMITH "), &context).unwrap();
    assert_eq!(value, Subject::from("GOLD"));
}

#[test]
fn test_extract_with_declared_transformations() {
    let definition = PipelineDefinition::from_value(json!([
        {"stage": "trim"},
        {"stage": "upper"}
    ]))
    .unwrap();
    let transformations = Transformations::from_definition(&definition).unwrap();

    let value = extractor()
        .extract(&order(), &Accessor::path("order.customer.name"), &transformations, &Context::new())
        .unwrap();
    assert_eq!(value, Subject::from("ANN SMITH"));
}

#[test]
fn test_extract_surfaces_validation_errors() {
    let definition = PipelineDefinition::from_value(json!([
        {"stage": "default", "args": {"value": null}},
        {"stage": "required"}
    ]))
    .unwrap();
    let transformations = Transformations::from_definition(&definition).unwrap();

    let err = extractor()
        .extract(&order(), &Accessor::path("order.customer.email"), &transformations, &Context::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert!(err.is_validation());
    assert_eq!(err.origin(), Some("required"));
}

#[test]
fn test_field_mapping() {
    let mapping: Mapping = serde_yaml::from_str(
        r#"
id:
  accessor: order.id
status:
  accessor: order.status
  pipeline:
    - stage: map
      args:
        values: { $extract: "labels::" }
customer:
  accessor: order.customer.name
  pipeline:
    - stage: trim
skus:
  accessor: order.lines
"#,
    )
    .unwrap();

    let context = Context::new().with("labels", Subject::from(json!({"S": "shipped", "P": "pending"})));
    let output = extractor().extract_fields(&order(), &mapping, &context).unwrap();
    assert_eq!(
        output,
        Subject::from(json!({
            "id": 1017,
            "status": "shipped",
            "customer": "ann smith",
            "skus": [{"sku": "A-1", "qty": 2}, {"sku": "B-7", "qty": 1}]
        }))
    );
}
