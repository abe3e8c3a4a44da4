//! Tractor Core - declarative extraction and transformation engine
//!
//! This crate resolves small path expressions ("accessors") against nested
//! data and pipes the result through named, argument-configured stages.
//!
//! # Main Components
//!
//! - **Error Handling**: A failure taxonomy using `thiserror` and `anyhow`
//! - **Subjects**: Maps, sequences, scalars and host objects under inspection
//! - **Accessors**: The path grammar and its resolver
//! - **Arguments**: Stage arguments that may defer to extractions
//! - **Pipelines**: Ordered stage execution with structured failures
//! - **Extractor**: Resolution followed by transformation in one call
//!
//! # Example
//!
//! ```
//! use tractor_core::{Accessor, Context, EngineConfig, Extractor, Registry, Subject};
//! use tractor_core::{Transformation, Transformations};
//! use serde_json::json;
//!
//! fn example() -> tractor_core::Result<()> {
//!     let extractor = Extractor::from_registry(&Registry::with_defaults(&EngineConfig::default()))?;
//!     let subject = Subject::from(json!({"user": {"name": " ann "}}));
//!     let transformations = Transformations::new()
//!         .then(Transformation::named("trim"))
//!         .then(Transformation::named("upper"));
//!
//!     let name = extractor.extract(
//!         &subject,
//!         &Accessor::path("user.name"),
//!         &transformations,
//!         &Context::new(),
//!     )?;
//!     assert_eq!(name, Subject::from("ANN"));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod accessor;
pub mod arguments;
pub mod config;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod registry;
pub mod transformer;
pub mod types;

// Re-export main types for convenience
pub use accessor::{Accessor, Extraction, Resolver, ResolverConfig};
pub use arguments::{Argument, ArgumentKey, ArgumentProvider, ArgumentValue, Arguments};
pub use config::EngineConfig;
pub use error::{Error, ErrorKind, ErrorReport, Result};
pub use extractor::{Extractor, FieldSpec, Mapping};
pub use pipeline::{
    Pipeline, PipelineBuilder, PipelineDefinition, PipelineRun, RunState, Stage, StageDefinition,
    TransformationStage, Transformer, ValidationStage, Validator,
};
pub use registry::Registry;
pub use transformer::{StageRegistry, Transformation, Transformations};
pub use types::{Context, Key, Subject, SubjectMap, SubjectObject};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
