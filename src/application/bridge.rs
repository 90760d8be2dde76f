//! Render bridge: the entry point handed to the host process.
//!
//! One pipeline (resolve, render, wrap) sits behind two facades. The
//! synchronous facade takes and returns serialized envelopes; the callback
//! facade takes an already decoded request and hands the serialized response
//! to a completion callback.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, warn};

use crate::application::registry::ComponentRegistry;
use crate::domain::{BridgeError, RenderRequest, RenderResponse};

pub(crate) const METRIC_RENDER_TOTAL: &str = "viewbridge_render_total";
pub(crate) const METRIC_RENDER_MS: &str = "viewbridge_render_ms";

#[derive(Debug, Clone)]
pub struct RenderBridge {
    registry: Arc<ComponentRegistry>,
}

impl RenderBridge {
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// Render a serialized request and return the serialized response.
    ///
    /// The request is decoded before any resolution happens, so a malformed
    /// envelope never reaches the registry.
    pub fn render_json(&self, request_json: &str) -> Result<String, BridgeError> {
        let request = RenderRequest::decode(request_json).inspect_err(record_failure)?;
        let response = self.render_request(&request)?;
        encode(&response)
    }

    /// Render a decoded request and deliver the serialized response to
    /// `complete`.
    ///
    /// `complete` runs exactly once on success, on the caller's thread, before
    /// this returns. On failure it is dropped without being called and the
    /// error is returned instead.
    pub fn render_with<F>(&self, request: &RenderRequest, complete: F) -> Result<(), BridgeError>
    where
        F: FnOnce(String),
    {
        let response = self.render_request(request)?;
        let encoded = encode(&response)?;
        complete(encoded);
        Ok(())
    }

    /// Resolve and render `request`. Both facades go through here.
    pub fn render_request(&self, request: &RenderRequest) -> Result<RenderResponse, BridgeError> {
        let started = Instant::now();

        let result = self.registry.resolve(&request.name).and_then(|component| {
            component
                .render(&request.props)
                .map(RenderResponse::new)
                .map_err(|err| BridgeError::render(&request.name, err))
        });

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(_) => {
                counter!(METRIC_RENDER_TOTAL, "outcome" => "ok").increment(1);
                histogram!(METRIC_RENDER_MS).record(elapsed_ms);
                debug!(component = %request.name, elapsed_ms, "rendered component");
            }
            Err(err) => {
                record_failure(err);
                warn!(component = %request.name, error = %err, "render failed");
            }
        }

        result
    }
}

fn encode(response: &RenderResponse) -> Result<String, BridgeError> {
    response.encode().inspect_err(record_failure)
}

fn record_failure(err: &BridgeError) {
    counter!(METRIC_RENDER_TOTAL, "outcome" => err.kind()).increment(1);
}
