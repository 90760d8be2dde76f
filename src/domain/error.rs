use std::time::Duration;

use thiserror::Error;

/// Failure of a single render request.
///
/// Every variant is terminal for the request that produced it. None of them
/// are ever encoded into a response envelope.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("malformed render request: {reason}")]
    MalformedRequest { reason: String },
    #[error("component `{name}` is not registered")]
    ComponentNotFound { name: String },
    #[error("component `{name}` failed to render: {source}")]
    Render {
        name: String,
        #[source]
        source: RenderError,
    },
    #[error("failed to encode render response: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("worker closed")]
    WorkerClosed,
    #[error("render timed out after {}ms", .timeout.as_millis())]
    TimedOut { timeout: Duration },
    #[error("render task aborted: {0}")]
    Aborted(String),
}

impl BridgeError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRequest {
            reason: reason.into(),
        }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::ComponentNotFound { name: name.into() }
    }

    pub fn render(name: impl Into<String>, source: RenderError) -> Self {
        Self::Render {
            name: name.into(),
            source,
        }
    }

    /// True when the failure taints the worker that ran the request rather
    /// than the request itself.
    pub fn is_worker_failure(&self) -> bool {
        matches!(
            self,
            BridgeError::WorkerClosed | BridgeError::TimedOut { .. } | BridgeError::Aborted(_)
        )
    }

    /// Short, stable label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::MalformedRequest { .. } => "malformed_request",
            BridgeError::ComponentNotFound { .. } => "component_not_found",
            BridgeError::Render { .. } => "render_error",
            BridgeError::Encode(_) => "encode_error",
            BridgeError::WorkerClosed => "worker_closed",
            BridgeError::TimedOut { .. } => "timed_out",
            BridgeError::Aborted(_) => "aborted",
        }
    }
}

/// Raised by a renderable when it cannot produce markup from the given props.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid props: {0}")]
    InvalidProps(#[source] serde_json::Error),
    #[error("template rendering failed: {0}")]
    Template(#[source] askama::Error),
    #[error("{0}")]
    Failed(String),
}

impl RenderError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
