use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::{bridge, pool, registry};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            bridge::METRIC_RENDER_TOTAL,
            Unit::Count,
            "Total number of render requests, labelled by outcome."
        );
        describe_histogram!(
            bridge::METRIC_RENDER_MS,
            Unit::Milliseconds,
            "Time spent resolving and rendering a component."
        );
        describe_counter!(
            registry::METRIC_COMPONENT_LOAD_TOTAL,
            Unit::Count,
            "Total number of component loads; at most one per component and registry."
        );
        describe_counter!(
            pool::METRIC_WORKER_SPAWN_TOTAL,
            Unit::Count,
            "Total number of render workers created by the pool."
        );
        describe_counter!(
            pool::METRIC_WORKER_RETIRED_TOTAL,
            Unit::Count,
            "Total number of render workers retired, labelled by reason."
        );
    });
}
