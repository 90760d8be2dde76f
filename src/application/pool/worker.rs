use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task;

use crate::application::bridge::RenderBridge;
use crate::domain::{BridgeError, RenderRequest, RenderResponse};

use super::lock::{mutex_lock, mutex_try_lock};

const LOCK_TARGET: &str = "application::pool::worker";

/// Response together with the time spent producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    pub response: RenderResponse,
    /// Covers waiting for the worker, resolution and rendering.
    pub elapsed: Duration,
}

/// A single rendering slot bound to one registry generation.
///
/// Renders run on the blocking thread pool. A worker whose render timed out is
/// closed and never handed out again, even though the render itself keeps
/// running until it returns.
#[derive(Debug)]
pub struct RenderWorker {
    generation: u64,
    closed: AtomicBool,
    bridge: Mutex<Option<RenderBridge>>,
}

impl RenderWorker {
    pub fn new(generation: u64, bridge: RenderBridge) -> Self {
        Self {
            generation,
            closed: AtomicBool::new(false),
            bridge: Mutex::new(Some(bridge)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Refuse further renders and release the bridge.
    ///
    /// Never blocks: when a render currently holds the bridge, that render
    /// releases it once it returns.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        if let Some(mut bridge) = mutex_try_lock(&self.bridge, LOCK_TARGET, "close") {
            bridge.take();
        }
    }

    /// Render `request`, giving up after `timeout`.
    pub async fn render(
        self: &Arc<Self>,
        request: RenderRequest,
        timeout: Duration,
    ) -> Result<RenderOutcome, BridgeError> {
        let worker = Arc::clone(self);
        let job = task::spawn_blocking(move || worker.render_blocking(&request));

        match tokio::time::timeout(timeout, job).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(BridgeError::Aborted(join_error.to_string())),
            Err(_) => Err(BridgeError::TimedOut { timeout }),
        }
    }

    /// Render on the current thread, without a timeout.
    pub fn render_blocking(&self, request: &RenderRequest) -> Result<RenderOutcome, BridgeError> {
        let started = Instant::now();
        let mut slot = mutex_lock(&self.bridge, LOCK_TARGET, "render");

        if self.is_closed() {
            slot.take();
            return Err(BridgeError::WorkerClosed);
        }
        let bridge = slot.as_ref().ok_or(BridgeError::WorkerClosed)?;
        let result = bridge.render_request(request);

        if self.is_closed() {
            slot.take();
        }

        let response = result?;
        Ok(RenderOutcome {
            response,
            elapsed: started.elapsed(),
        })
    }
}
