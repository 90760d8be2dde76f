use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::registry::RegistryError, config::LoadError, domain::error::BridgeError,
    infra::error::InfraError,
};

/// Error chain flattened into messages, outermost first.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
}

impl AppError {
    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::RenderError;

    #[test]
    fn report_walks_the_source_chain() {
        let error = AppError::from(BridgeError::render(
            "Greeting",
            RenderError::failed("missing `who`"),
        ));

        let report = error.report();
        assert_eq!(report.source, "application::error");
        assert_eq!(
            report.messages,
            vec![
                "component `Greeting` failed to render: missing `who`".to_string(),
                "missing `who`".to_string(),
            ]
        );
    }
}
