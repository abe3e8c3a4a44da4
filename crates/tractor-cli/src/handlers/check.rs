//! Check command handler
//!
//! Builds a pipeline or field mapping against the built-in stage registry
//! without running it, so definition mistakes surface before data is read.

use super::map::parse_mapping;
use super::utils::{load_document, Engine};
use crate::cli::{CheckArgs, DefinitionKind};
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use serde::Serialize;
use std::path::Path;
use tracing::instrument;
use tractor_core::{PipelineDefinition, Transformations};

/// What a definition file contains once it has been built
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckSummary {
    pub kind: &'static str,
    pub entries: Vec<CheckEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessor: Option<String>,
    pub stages: Vec<String>,
}

/// Handle the check command
#[instrument(skip(config, output), fields(file = %args.file.display(), kind = ?args.kind))]
pub fn handle_check(args: CheckArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let timer = Timer::with_details("check", &args.file.display().to_string());
    let engine = Engine::from_config(config)?;
    let document = load_document(&args.file)?;

    let summary = match args.kind {
        DefinitionKind::Pipeline => check_pipeline(&engine, document)?,
        DefinitionKind::Mapping => check_mapping(&engine, &args.file, document)?,
    };

    output.success(&format!("✓ {} is a valid {} definition", args.file.display(), summary.kind))?;
    output.section(&format!("{} entries", summary.entries.len()))?;
    match args.kind {
        DefinitionKind::Pipeline => output.table(
            &["#", "stage"],
            summary
                .entries
                .iter()
                .map(|e| vec![e.name.clone(), e.stages.join(", ")])
                .collect(),
        )?,
        DefinitionKind::Mapping => output.table(
            &["field", "accessor", "stages"],
            summary
                .entries
                .iter()
                .map(|e| {
                    vec![
                        e.name.clone(),
                        e.accessor.clone().unwrap_or_default(),
                        e.stages.join(" → "),
                    ]
                })
                .collect(),
        )?,
    }
    if output.format() != crate::cli::OutputFormat::Human {
        output.data(&summary)?;
    }

    timer.finish();
    Ok(())
}

fn check_pipeline(engine: &Engine, document: serde_json::Value) -> Result<CheckSummary> {
    let definition = PipelineDefinition::from_value(document)?;
    let pipeline = engine.builder.build(&definition)?;

    let entries = pipeline
        .stage_names()
        .into_iter()
        .enumerate()
        .map(|(index, name)| CheckEntry {
            name: index.to_string(),
            accessor: None,
            stages: vec![name.to_string()],
        })
        .collect();

    Ok(CheckSummary {
        kind: "pipeline",
        entries,
    })
}

fn check_mapping(engine: &Engine, path: &Path, document: serde_json::Value) -> Result<CheckSummary> {
    let mapping = parse_mapping(path, document)?;

    let mut messages = Vec::new();
    let mut entries = Vec::with_capacity(mapping.len());
    for (field, spec) in &mapping {
        if let Err(e) = engine.builder.build_transformations(&spec.transformations) {
            messages.extend(e.messages().iter().map(|m| format!("field '{}': {}", field, m)));
            continue;
        }
        entries.push(CheckEntry {
            name: field.clone(),
            accessor: Some(spec.accessor.to_string()),
            stages: stage_names(&spec.transformations),
        });
    }

    if !messages.is_empty() {
        return Err(tractor_core::Error::configuration_all(Some(path.display().to_string()), messages).into());
    }

    Ok(CheckSummary {
        kind: "mapping",
        entries,
    })
}

fn stage_names(transformations: &Transformations) -> Vec<String> {
    transformations.iter().map(|t| t.name().to_string()).collect()
}
