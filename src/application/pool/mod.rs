//! Render pool.
//!
//! A dynamically growing set of [`RenderWorker`]s sharing one registry
//! generation. Swapping the registry bumps the generation; idle workers from
//! older generations are discarded instead of being handed out, and in-flight
//! renders finish against the registry they started with. Their workers are
//! discarded when they come back.

mod lock;
mod worker;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use metrics::counter;
use tracing::{debug, info, warn};

use crate::application::bridge::RenderBridge;
use crate::application::registry::ComponentRegistry;
use crate::domain::{BridgeError, RenderRequest};

use self::lock::mutex_lock;

pub use worker::{RenderOutcome, RenderWorker};

pub(crate) const METRIC_WORKER_SPAWN_TOTAL: &str = "viewbridge_worker_spawn_total";
pub(crate) const METRIC_WORKER_RETIRED_TOTAL: &str = "viewbridge_worker_retired_total";

/// Timeout applied to requests that do not carry their own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const LOCK_TARGET: &str = "application::pool";

pub struct RenderPool {
    default_timeout: Duration,
    state: Mutex<PoolState>,
}

struct PoolState {
    generation: u64,
    registry: Arc<ComponentRegistry>,
    idle: VecDeque<Arc<RenderWorker>>,
}

impl PoolState {
    fn spawn_worker(&self) -> Arc<RenderWorker> {
        counter!(METRIC_WORKER_SPAWN_TOTAL).increment(1);
        debug!(generation = self.generation, "spawning render worker");
        Arc::new(RenderWorker::new(
            self.generation,
            RenderBridge::new(Arc::clone(&self.registry)),
        ))
    }

    fn is_current(&self, worker: &RenderWorker) -> bool {
        worker.generation() == self.generation && !worker.is_closed()
    }
}

fn discard(worker: &RenderWorker) {
    let reason = if worker.is_closed() {
        "worker_closed"
    } else {
        "stale_generation"
    };
    worker.close();
    counter!(METRIC_WORKER_RETIRED_TOTAL, "reason" => reason).increment(1);
}

impl RenderPool {
    /// Create a pool serving `registry`, with one worker ready.
    pub fn new(registry: Arc<ComponentRegistry>, default_timeout: Duration) -> Self {
        let mut state = PoolState {
            generation: 1,
            registry,
            idle: VecDeque::new(),
        };
        let worker = state.spawn_worker();
        state.idle.push_back(worker);

        Self {
            default_timeout,
            state: Mutex::new(state),
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn generation(&self) -> u64 {
        mutex_lock(&self.state, LOCK_TARGET, "generation").generation
    }

    pub fn registry(&self) -> Arc<ComponentRegistry> {
        Arc::clone(&mutex_lock(&self.state, LOCK_TARGET, "registry").registry)
    }

    pub fn idle_workers(&self) -> usize {
        mutex_lock(&self.state, LOCK_TARGET, "idle_workers")
            .idle
            .len()
    }

    /// Install a new registry. Idle workers are retired immediately; workers
    /// that are busy are discarded when they come back.
    pub fn update_registry(&self, registry: Arc<ComponentRegistry>) {
        let mut state = mutex_lock(&self.state, LOCK_TARGET, "update_registry");
        state.generation += 1;
        state.registry = registry;

        let retired = state.idle.len();
        for worker in state.idle.drain(..) {
            worker.close();
        }
        counter!(METRIC_WORKER_RETIRED_TOTAL, "reason" => "stale_generation")
            .increment(retired as u64);

        let worker = state.spawn_worker();
        state.idle.push_back(worker);

        info!(
            generation = state.generation,
            retired_workers = retired,
            components = state.registry.len(),
            "installed component registry"
        );
    }

    /// Take a usable worker, creating one when none is idle.
    pub fn acquire(&self) -> Arc<RenderWorker> {
        let mut state = mutex_lock(&self.state, LOCK_TARGET, "acquire");

        while let Some(worker) = state.idle.pop_front() {
            if state.is_current(&worker) {
                return worker;
            }
            discard(&worker);
        }

        state.spawn_worker()
    }

    /// Return a worker for reuse. Closed workers and workers from an older
    /// generation are discarded instead.
    pub fn release(&self, worker: Arc<RenderWorker>) {
        let mut state = mutex_lock(&self.state, LOCK_TARGET, "release");
        if state.is_current(&worker) {
            state.idle.push_back(worker);
        } else {
            discard(&worker);
        }
    }

    /// Render `request` on a pooled worker.
    ///
    /// A missing or zero per-request timeout falls back to the pool default.
    ///
    /// Request-level failures leave the worker in the pool. Timeouts, aborted
    /// renders and closed workers retire it.
    pub async fn render(&self, request: RenderRequest) -> Result<RenderOutcome, BridgeError> {
        let timeout = request
            .timeout
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(self.default_timeout);
        let name = request.name.clone();
        let worker = self.acquire();

        match worker.render(request, timeout).await {
            Ok(outcome) => {
                self.release(worker);
                Ok(outcome)
            }
            Err(err) if err.is_worker_failure() => {
                worker.close();
                counter!(METRIC_WORKER_RETIRED_TOTAL, "reason" => err.kind()).increment(1);
                warn!(component = %name, error = %err, "retired render worker");
                Err(err)
            }
            Err(err) => {
                self.release(worker);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use serde_json::Value;

    use super::*;
    use crate::domain::RenderError;

    fn fixed(html: &'static str) -> impl Fn(&Value) -> Result<String, RenderError> + Send + Sync {
        move |_: &Value| Ok(html.to_string())
    }

    fn registry_rendering(html: &'static str) -> Arc<ComponentRegistry> {
        let registry = ComponentRegistry::builder()
            .component("Fixed", move || fixed(html))
            .and_then(|builder| {
                builder.component("Slow", || {
                    |_: &Value| -> Result<String, RenderError> {
                        thread::sleep(Duration::from_millis(200));
                        Ok("<div>slow</div>".to_string())
                    }
                })
            })
            .expect("valid registrations")
            .build();
        Arc::new(registry)
    }

    #[test]
    fn starts_with_one_idle_worker() {
        let pool = RenderPool::new(registry_rendering("<div>1</div>"), DEFAULT_TIMEOUT);
        assert_eq!(pool.idle_workers(), 1);
        assert_eq!(pool.generation(), 1);
        assert_eq!(pool.default_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn acquire_reuses_released_workers() {
        let pool = RenderPool::new(registry_rendering("<div>1</div>"), DEFAULT_TIMEOUT);

        let first = pool.acquire();
        assert_eq!(pool.idle_workers(), 0);
        let second = pool.acquire();
        assert!(!Arc::ptr_eq(&first, &second));

        pool.release(Arc::clone(&first));
        let again = pool.acquire();
        assert!(Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn acquire_skips_closed_and_stale_workers() {
        let pool = RenderPool::new(registry_rendering("<div>1</div>"), DEFAULT_TIMEOUT);

        let closed = pool.acquire();
        closed.close();
        pool.release(Arc::clone(&closed));
        let fresh = pool.acquire();
        assert!(!Arc::ptr_eq(&closed, &fresh));
        assert!(!fresh.is_closed());

        pool.update_registry(registry_rendering("<div>2</div>"));
        pool.release(Arc::clone(&fresh));
        let current = pool.acquire();
        assert_eq!(current.generation(), 2);
        let next = pool.acquire();
        assert_eq!(next.generation(), 2);
        assert!(!Arc::ptr_eq(&fresh, &next));
        assert!(fresh.is_closed());
    }

    #[tokio::test]
    async fn request_failures_keep_the_worker() {
        let pool = RenderPool::new(registry_rendering("<div>1</div>"), DEFAULT_TIMEOUT);
        let worker = pool.acquire();
        pool.release(Arc::clone(&worker));

        let err = pool
            .render(RenderRequest::named("WrongWidget"))
            .await
            .expect_err("unknown component");
        assert!(matches!(err, BridgeError::ComponentNotFound { .. }));

        assert!(!worker.is_closed());
        assert!(Arc::ptr_eq(&worker, &pool.acquire()));
    }

    #[test]
    fn release_discards_stale_workers() {
        let pool = RenderPool::new(registry_rendering("<div>1</div>"), DEFAULT_TIMEOUT);
        let busy = pool.acquire();

        pool.update_registry(registry_rendering("<div>2</div>"));
        pool.release(Arc::clone(&busy));

        assert!(busy.is_closed());
        assert_eq!(pool.idle_workers(), 1);
        assert_eq!(pool.acquire().generation(), 2);
    }

    #[tokio::test]
    async fn zero_timeout_falls_back_to_the_default() {
        let pool = RenderPool::new(registry_rendering("<div>1</div>"), DEFAULT_TIMEOUT);

        let outcome = pool
            .render(RenderRequest::named("Slow").with_timeout(Duration::ZERO))
            .await
            .expect("zero means no per-request timeout");
        assert_eq!(outcome.response.html, "<div>slow</div>");
        assert_eq!(pool.idle_workers(), 1);
    }

    #[tokio::test]
    async fn timeouts_retire_the_worker() {
        let pool = RenderPool::new(registry_rendering("<div>1</div>"), DEFAULT_TIMEOUT);
        let worker = pool.acquire();
        pool.release(Arc::clone(&worker));

        let err = pool
            .render(RenderRequest::named("Slow").with_timeout(Duration::from_millis(20)))
            .await
            .expect_err("render is slower than the timeout");
        assert!(matches!(err, BridgeError::TimedOut { .. }));
        assert!(worker.is_closed());
        assert_eq!(pool.idle_workers(), 0);

        let outcome = pool
            .render(RenderRequest::named("Fixed"))
            .await
            .expect("pool recovers");
        assert_eq!(outcome.response.html, "<div>1</div>");
    }
}
