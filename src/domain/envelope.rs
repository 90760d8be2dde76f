//! Request and response envelopes exchanged with the host process.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::BridgeError;

/// A request to render the component registered under `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    /// Registry name of the component to render.
    pub name: String,
    /// Property payload handed to the component untouched.
    #[serde(default = "empty_props")]
    pub props: Value,
    /// Per-request timeout used by the render pool. Never serialized.
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl RenderRequest {
    pub fn new(name: impl Into<String>, props: Value) -> Self {
        Self {
            name: name.into(),
            props,
            timeout: None,
        }
    }

    /// Request with an empty props object.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, empty_props())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Decode a serialized request envelope.
    ///
    /// The payload must be a JSON object whose `name` is a non-empty string.
    /// A missing `props` field decodes as an empty object.
    pub fn decode(json: &str) -> Result<Self, BridgeError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|err| BridgeError::malformed(format!("invalid JSON: {err}")))?;

        let Value::Object(mut fields) = value else {
            return Err(BridgeError::malformed("request must be a JSON object"));
        };

        let name = match fields.remove("name") {
            Some(Value::String(name)) if !name.trim().is_empty() => name,
            Some(Value::String(_)) => {
                return Err(BridgeError::malformed("`name` must not be empty"));
            }
            Some(_) => return Err(BridgeError::malformed("`name` must be a string")),
            None => return Err(BridgeError::malformed("missing `name` field")),
        };

        let props = fields.remove("props").unwrap_or_else(empty_props);

        Ok(Self::new(name, props))
    }
}

/// Markup produced for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResponse {
    pub html: String,
}

impl RenderResponse {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn encode(&self) -> Result<String, BridgeError> {
        serde_json::to_string(self).map_err(BridgeError::Encode)
    }
}

fn empty_props() -> Value {
    Value::Object(Map::new())
}
