//! Shared utilities for command handlers

use crate::config::Config;
use crate::error::{Error, Result};
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tractor_core::registry::services;
use tractor_core::{Context, Extractor, PipelineBuilder, Registry, StageRegistry};

/// Path that stands for standard input
pub const STDIN: &str = "-";

pub fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == STDIN
}

/// Load a JSON or YAML document, choosing the parser by extension
///
/// `-` reads standard input, which may hold either format.
pub fn load_document(path: &Path) -> Result<Value> {
    if is_stdin(path) {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        // YAML is a superset of JSON
        return serde_yaml::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "JSON or YAML".to_string(),
        });
    }

    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;

    let is_yaml = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false);

    if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "YAML parse failed");
            Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "YAML".to_string(),
            }
        })
    } else {
        serde_json::from_str(&content).map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "JSON parse failed");
            Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "JSON".to_string(),
            }
        })
    }
}

/// Load the context document; no path means an empty context
pub fn load_context(path: Option<&Path>) -> Result<Context> {
    let Some(path) = path else {
        return Ok(Context::new());
    };

    let document = load_document(path)?;
    Context::from_json(document).ok_or_else(|| Error::InvalidFormat {
        path: path.to_path_buf(),
        expected: "an object at the top level".to_string(),
    })
}

/// Reject invocations that would read standard input more than once
pub fn ensure_single_stdin<'a>(paths: impl IntoIterator<Item = Option<&'a Path>>) -> Result<()> {
    let readers = paths.into_iter().flatten().filter(|p| is_stdin(p)).count();
    if readers > 1 {
        return Err(Error::invalid_args("standard input ('-') can only be read once"));
    }
    Ok(())
}

/// Engine collaborators built from the CLI configuration
pub struct Engine {
    pub extractor: Extractor,
    pub builder: PipelineBuilder,
}

impl Engine {
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = Registry::with_defaults(&config.engine);
        let stages: Arc<StageRegistry> = registry.resolve(services::STAGE_REGISTRY)?;

        Ok(Self {
            extractor: Extractor::from_registry(&registry)?,
            builder: PipelineBuilder::new(stages),
        })
    }
}
