// Pipeline failure taxonomy.
//
// Each variant is terminal for one invocation. Callers map the kind to a
// transport-level category (the web layer maps it to an HTTP status).

use serde_json::Value;
use thiserror::Error;

/// A classified pipeline failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upstream data source was unreachable or answered non-success.
    #[error("{message}")]
    UpstreamFetch {
        message: String,
        /// The upstream response body, when one was received.
        payload: Option<Value>,
    },

    /// Nothing usable was left after normalization.
    #[error("{message}")]
    EmptyCorpus { message: String },

    /// The inference provider failed, timed out, or was cancelled.
    #[error("{message}")]
    Inference {
        message: String,
        /// Raw provider output from the last failed attempt, if any.
        payload: Option<Value>,
    },

    /// The provider answered, but the answer breaks the report schema.
    #[error("{message}: {details}")]
    SchemaValidation {
        message: String,
        details: String,
        /// The rejected candidate, kept for diagnostics.
        payload: Value,
    },
}

/// Discriminant of `PipelineError`, for callers that only need the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UpstreamFetch,
    EmptyCorpus,
    Inference,
    SchemaValidation,
}

impl ErrorKind {
    /// Stable snake_case name used in JSON error bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UpstreamFetch => "upstream_fetch",
            ErrorKind::EmptyCorpus => "empty_corpus",
            ErrorKind::Inference => "inference",
            ErrorKind::SchemaValidation => "schema_validation",
        }
    }
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::UpstreamFetch { .. } => ErrorKind::UpstreamFetch,
            PipelineError::EmptyCorpus { .. } => ErrorKind::EmptyCorpus,
            PipelineError::Inference { .. } => ErrorKind::Inference,
            PipelineError::SchemaValidation { .. } => ErrorKind::SchemaValidation,
        }
    }

    /// Human-readable message without diagnostic details.
    pub fn message(&self) -> &str {
        match self {
            PipelineError::UpstreamFetch { message, .. }
            | PipelineError::EmptyCorpus { message }
            | PipelineError::Inference { message, .. }
            | PipelineError::SchemaValidation { message, .. } => message,
        }
    }

    /// Validation details, when the failure has them.
    pub fn details(&self) -> Option<&str> {
        match self {
            PipelineError::SchemaValidation { details, .. } => Some(details),
            _ => None,
        }
    }

    /// The offending raw payload, when one is available.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            PipelineError::UpstreamFetch { payload, .. }
            | PipelineError::Inference { payload, .. } => payload.as_ref(),
            PipelineError::SchemaValidation { payload, .. } => Some(payload),
            PipelineError::EmptyCorpus { .. } => None,
        }
    }
}

/// Collaborator error that keeps the raw body it received.
///
/// Adapters return it inside their `anyhow::Error`; the pipeline recovers it
/// with `downcast_ref` (which sees through `.context()`) and attaches the
/// body to the `PipelineError` as its payload.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RawPayloadError {
    message: String,
    body: String,
}

impl RawPayloadError {
    pub fn new(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            body: body.into(),
        }
    }

    /// The body as JSON if it parses, otherwise as a JSON string.
    /// A blank body is no payload at all.
    pub fn payload(&self) -> Option<Value> {
        if self.body.trim().is_empty() {
            return None;
        }
        Some(
            serde_json::from_str(&self.body)
                .unwrap_or_else(|_| Value::String(self.body.clone())),
        )
    }
}

/// Payload carried anywhere in an adapter error's chain.
pub fn payload_of(error: &anyhow::Error) -> Option<Value> {
    error
        .downcast_ref::<RawPayloadError>()
        .and_then(RawPayloadError::payload)
}
