use std::{
    io::{self, Read, Write},
    process,
    sync::Arc,
};

use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use viewbridge::{
    application::{RenderPool, error::AppError},
    config::{self, Command, RenderArgs},
    domain::RenderRequest,
    infra::{error::InfraError, telemetry},
    presentation::default_registry,
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();

    if dispatcher::has_been_set() {
        error!(
            source = report.source,
            error = %error,
            chain = ?report.messages,
            "application error"
        );
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(
            source = report.source,
            error = %error,
            chain = ?report.messages,
            "application error"
        );
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(Command::Render(Box::<RenderArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        Command::Render(args) => run_render(settings, *args).await,
        Command::Components(_) => run_components(),
    }
}

async fn run_render(settings: config::Settings, args: RenderArgs) -> Result<(), AppError> {
    let registry = Arc::new(default_registry()?);
    if settings.render.preload {
        registry.preload();
        info!(components = registry.len(), "preloaded components");
    }

    let pool = RenderPool::new(registry, settings.render.timeout);

    let payload = match args.request {
        Some(payload) => payload,
        None => read_stdin()?,
    };
    let request = RenderRequest::decode(payload.trim())?;
    let name = request.name.clone();

    let outcome = pool.render(request).await?;
    info!(
        component = %name,
        elapsed_ms = outcome.elapsed.as_secs_f64() * 1000.0,
        "render complete"
    );

    let encoded = outcome.response.encode()?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{encoded}").map_err(InfraError::from)?;
    Ok(())
}

fn run_components() -> Result<(), AppError> {
    let registry = default_registry()?;
    let mut stdout = io::stdout().lock();
    for name in registry.names() {
        writeln!(stdout, "{name}").map_err(InfraError::from)?;
    }
    Ok(())
}

fn read_stdin() -> Result<String, AppError> {
    let mut payload = String::new();
    io::stdin()
        .read_to_string(&mut payload)
        .map_err(InfraError::from)?;
    Ok(payload)
}
