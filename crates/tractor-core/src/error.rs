//! Error types for the Tractor core library
//!
//! This module defines the failure taxonomy of the engine using thiserror.
//! Every kind carries an ordered list of messages plus its provenance
//! (accessor, transformer or validator name, arguments, offending data),
//! and may hold a prior cause. Enriching an error with a cause keeps the
//! cause's messages: information is added, never replaced.

use crate::arguments::Arguments;
use crate::types::Subject;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Main error type for Tractor operations
#[derive(Error, Debug)]
pub enum Error {
    /// Accessor resolution could not complete
    #[error("Extraction failed at '{accessor}' on {subject_type}: {}", .messages.join("; "))]
    Extraction {
        accessor: String,
        subject_type: String,
        messages: Vec<String>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A transformation stage rejected or could not process its input
    #[error("Transformation '{transformer}' failed: {}", .messages.join("; "))]
    Transformation {
        transformer: String,
        arguments: Option<Arguments>,
        data: Option<Subject>,
        messages: Vec<String>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A value is structurally or semantically wrong
    #[error("Validation '{validator}' failed: {}", .messages.join("; "))]
    InvalidData {
        validator: String,
        arguments: Option<Arguments>,
        data: Option<Subject>,
        messages: Vec<String>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A value's type precludes any contextual check
    #[error("Validation '{validator}' failed: {}", .messages.join("; "))]
    InvalidType {
        validator: String,
        expected: String,
        arguments: Option<Arguments>,
        data: Option<Subject>,
        messages: Vec<String>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Malformed declarative definition
    #[error("Configuration error: {}", .messages.join("; "))]
    Configuration {
        origin: Option<String>,
        messages: Vec<String>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Executor wrapper identifying the failing stage
    #[error("Stage {index} failed: {source}")]
    Stage {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    /// No service registered under the identifier
    #[error("Service '{type_id}' not found")]
    NotFound {
        type_id: String,
        messages: Vec<String>,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A service is registered but is not of the requested type
    #[error("Service '{type_id}' is not a {expected}")]
    InvalidInstance {
        type_id: String,
        expected: String,
        messages: Vec<String>,
        #[source]
        source: Option<anyhow::Error>,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Discriminant of an [`Error`], for callers that match on kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Extraction,
    Transformation,
    InvalidData,
    InvalidType,
    Configuration,
    Stage,
    NotFound,
    InvalidInstance,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Extraction => "ExtractionError",
            ErrorKind::Transformation => "TransformationError",
            ErrorKind::InvalidData => "InvalidData",
            ErrorKind::InvalidType => "InvalidType",
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Stage => "StageError",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InvalidInstance => "InvalidInstance",
        };
        write!(f, "{}", name)
    }
}

impl Error {
    /// Create an extraction error for a segment that could not be resolved
    pub fn extraction(
        accessor: impl Into<String>,
        subject_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Extraction {
            accessor: accessor.into(),
            subject_type: subject_type.into(),
            messages: vec![message.into()],
            source: None,
        }
    }

    /// Create a transformation error with its collected messages
    pub fn transformation(transformer: impl Into<String>, messages: Vec<String>) -> Self {
        Self::Transformation {
            transformer: transformer.into(),
            arguments: None,
            data: None,
            messages,
            source: None,
        }
    }

    /// Create an invalid-data validation error
    pub fn invalid_data(validator: impl Into<String>, data: Subject, errors: Vec<String>) -> Self {
        Self::InvalidData {
            validator: validator.into(),
            arguments: None,
            data: Some(data),
            messages: errors,
            source: None,
        }
    }

    /// Create an invalid-type validation error
    ///
    /// A generated `expected <T>, received <type>` entry is appended to
    /// `errors`.
    pub fn invalid_type(
        validator: impl Into<String>,
        expected: impl Into<String>,
        data: Subject,
        mut errors: Vec<String>,
    ) -> Self {
        let expected = expected.into();
        errors.push(format!("expected {}, received {}", expected, data.type_name()));
        Self::InvalidType {
            validator: validator.into(),
            expected,
            arguments: None,
            data: Some(data),
            messages: errors,
            source: None,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            origin: None,
            messages: vec![message.into()],
            source: None,
        }
    }

    /// Create a configuration error carrying several messages
    pub fn configuration_all(origin: Option<String>, messages: Vec<String>) -> Self {
        Self::Configuration {
            origin,
            messages,
            source: None,
        }
    }

    /// Wrap a stage failure with the index of the failing stage
    pub fn stage(index: usize, error: Error) -> Self {
        Self::Stage {
            index,
            source: Box::new(error),
        }
    }

    /// No service registered under `type_id`
    pub fn not_found(type_id: impl Into<String>) -> Self {
        Self::NotFound {
            type_id: type_id.into(),
            messages: Vec::new(),
            source: None,
        }
    }

    /// The service under `type_id` is not an `expected`
    pub fn invalid_instance(type_id: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidInstance {
            type_id: type_id.into(),
            expected: expected.into(),
            messages: Vec::new(),
            source: None,
        }
    }

    /// Attach the configured arguments of the failing operation
    pub fn with_arguments(mut self, args: Arguments) -> Self {
        match &mut self {
            Self::Transformation { arguments, .. }
            | Self::InvalidData { arguments, .. }
            | Self::InvalidType { arguments, .. } => *arguments = Some(args),
            _ => {}
        }
        self
    }

    /// Attach the offending data
    pub fn with_data(mut self, value: Subject) -> Self {
        match &mut self {
            Self::Transformation { data, .. }
            | Self::InvalidData { data, .. }
            | Self::InvalidType { data, .. } => *data = Some(value),
            _ => {}
        }
        self
    }

    /// Record the origin name of a configuration error
    pub fn with_origin(mut self, name: impl Into<String>) -> Self {
        if let Self::Configuration { origin, .. } = &mut self {
            *origin = Some(name.into());
        }
        self
    }

    /// Append a message to this error's list
    ///
    /// A stage wrapper passes the message to the stage's own error.
    pub fn with_message(self, message: impl Into<String>) -> Self {
        match self {
            Self::Stage { index, source } => Self::stage(index, (*source).with_message(message)),
            mut other => {
                if let Some((messages, _)) = other.slots_mut() {
                    messages.push(message.into());
                }
                other
            }
        }
    }

    /// Enrich this error with a prior cause
    ///
    /// When the cause is itself an [`Error`], its messages are placed ahead
    /// of this error's own messages. The cause is retained as `source`; a
    /// stage wrapper hands it to the stage's own error.
    pub fn with_cause(self, cause: impl Into<anyhow::Error>) -> Self {
        let cause = cause.into();
        let inherited = cause
            .downcast_ref::<Error>()
            .map(|e| e.messages().to_vec())
            .unwrap_or_default();

        match self {
            Self::Stage { index, source } => Self::stage(index, (*source).with_cause(cause)),
            mut other => {
                if let Some((messages, source)) = other.slots_mut() {
                    let own = std::mem::take(messages);
                    messages.extend(inherited);
                    messages.extend(own);
                    *source = Some(cause);
                }
                other
            }
        }
    }

    /// Message list and cause slot of every non-wrapper variant
    fn slots_mut(&mut self) -> Option<(&mut Vec<String>, &mut Option<anyhow::Error>)> {
        match self {
            Self::Extraction { messages, source, .. }
            | Self::Transformation { messages, source, .. }
            | Self::InvalidData { messages, source, .. }
            | Self::InvalidType { messages, source, .. }
            | Self::Configuration { messages, source, .. }
            | Self::NotFound { messages, source, .. }
            | Self::InvalidInstance { messages, source, .. } => Some((messages, source)),
            Self::Stage { .. } => None,
        }
    }

    /// Kind discriminant
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Extraction { .. } => ErrorKind::Extraction,
            Self::Transformation { .. } => ErrorKind::Transformation,
            Self::InvalidData { .. } => ErrorKind::InvalidData,
            Self::InvalidType { .. } => ErrorKind::InvalidType,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Stage { .. } => ErrorKind::Stage,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidInstance { .. } => ErrorKind::InvalidInstance,
        }
    }

    /// Whether this is either validation flavor
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidData { .. } | Self::InvalidType { .. })
    }

    /// Ordered collected messages
    ///
    /// A stage wrapper reports the messages of the stage's own error.
    pub fn messages(&self) -> &[String] {
        match self {
            Self::Extraction { messages, .. }
            | Self::Transformation { messages, .. }
            | Self::InvalidData { messages, .. }
            | Self::InvalidType { messages, .. }
            | Self::Configuration { messages, .. }
            | Self::NotFound { messages, .. }
            | Self::InvalidInstance { messages, .. } => messages,
            Self::Stage { source, .. } => source.messages(),
        }
    }

    /// Name of the accessor, transformer or validator the error came from
    pub fn origin(&self) -> Option<&str> {
        match self {
            Self::Extraction { accessor, .. } => Some(accessor),
            Self::Transformation { transformer, .. } => Some(transformer),
            Self::InvalidData { validator, .. } | Self::InvalidType { validator, .. } => {
                Some(validator)
            }
            Self::Configuration { origin, .. } => origin.as_deref(),
            Self::Stage { source, .. } => source.origin(),
            Self::NotFound { type_id, .. } | Self::InvalidInstance { type_id, .. } => Some(type_id),
        }
    }

    /// Offending data, when recorded
    pub fn data(&self) -> Option<&Subject> {
        match self {
            Self::Transformation { data, .. }
            | Self::InvalidData { data, .. }
            | Self::InvalidType { data, .. } => data.as_ref(),
            _ => None,
        }
    }

    /// Configured arguments of the failing operation, when recorded
    pub fn arguments(&self) -> Option<&Arguments> {
        match self {
            Self::Transformation { arguments, .. }
            | Self::InvalidData { arguments, .. }
            | Self::InvalidType { arguments, .. } => arguments.as_ref(),
            _ => None,
        }
    }

    /// The prior cause when it is itself an engine error
    pub fn cause(&self) -> Option<&Error> {
        match self {
            Self::Extraction { source, .. }
            | Self::Transformation { source, .. }
            | Self::InvalidData { source, .. }
            | Self::InvalidType { source, .. }
            | Self::Configuration { source, .. }
            | Self::NotFound { source, .. }
            | Self::InvalidInstance { source, .. } => {
                source.as_ref().and_then(|e| e.downcast_ref::<Error>())
            }
            Self::Stage { source, .. } => Some(source),
        }
    }

    /// Index of the failing stage if this is a stage wrapper
    pub fn stage_index(&self) -> Option<usize> {
        match self {
            Self::Stage { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Strip every stage wrapper, returning the stage's own error
    pub fn into_stage_cause(self) -> Error {
        let mut error = self;
        while let Self::Stage { source, .. } = error {
            error = *source;
        }
        error
    }

    /// Structured rendering for diagnostics
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            origin: self.origin().map(str::to_string),
            stage_index: self.stage_index(),
            messages: self.messages().to_vec(),
            arguments: self.arguments().map(Arguments::to_json),
            data: self.data().map(Subject::to_json),
        }
    }
}

/// Serializable view of an [`Error`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_index: Option<usize>,
    pub messages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}
