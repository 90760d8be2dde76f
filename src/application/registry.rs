//! Component registry.
//!
//! Maps component names to loaders declared up front. Each loader runs at most
//! once, on the first lookup of its name, and the loaded renderable is shared by
//! every later lookup. Concurrent first lookups of the same name wait for a
//! single load instead of racing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use metrics::counter;
use once_cell::sync::OnceCell;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::domain::{BridgeError, RenderError};

pub(crate) const METRIC_COMPONENT_LOAD_TOTAL: &str = "viewbridge_component_load_total";

/// Something that turns a props payload into markup.
pub trait Renderable: Send + Sync {
    fn render(&self, props: &Value) -> Result<String, RenderError>;
}

impl<F> Renderable for F
where
    F: Fn(&Value) -> Result<String, RenderError> + Send + Sync,
{
    fn render(&self, props: &Value) -> Result<String, RenderError> {
        self(props)
    }
}

type Loader = Box<dyn Fn() -> Arc<dyn Renderable> + Send + Sync>;

struct RegistryEntry {
    loader: Loader,
    loaded: OnceCell<Arc<dyn Renderable>>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("invalid component name `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },
    #[error("component `{name}` is already registered")]
    Duplicate { name: String },
}

/// Declares the components a [`ComponentRegistry`] can resolve.
#[derive(Default)]
pub struct RegistryBuilder {
    entries: HashMap<String, RegistryEntry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `load` under `name`. The loader is not called until the name
    /// is first resolved.
    pub fn component<F, R>(mut self, name: impl Into<String>, load: F) -> Result<Self, RegistryError>
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: Renderable + 'static,
    {
        let name = name.into();
        validate_name(&name)?;

        if self.entries.contains_key(&name) {
            return Err(RegistryError::Duplicate { name });
        }

        let loader: Loader = Box::new(move || Arc::new(load()) as Arc<dyn Renderable>);
        self.entries.insert(
            name,
            RegistryEntry {
                loader,
                loaded: OnceCell::new(),
            },
        );
        Ok(self)
    }

    pub fn build(self) -> ComponentRegistry {
        ComponentRegistry {
            entries: self.entries,
        }
    }
}

/// Resolves component names to renderables, loading each one lazily.
pub struct ComponentRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl ComponentRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Look up the renderable registered under `name`, loading it on first use.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Renderable>, BridgeError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| BridgeError::not_found(name))?;

        let renderable = entry.loaded.get_or_init(|| {
            debug!(component = name, "loading component");
            counter!(METRIC_COMPONENT_LOAD_TOTAL).increment(1);
            (entry.loader)()
        });

        Ok(Arc::clone(renderable))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in lexical order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of components that have been loaded so far.
    pub fn loaded_count(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.loaded.get().is_some())
            .count()
    }

    /// Load every registered component now instead of on first lookup.
    pub fn preload(&self) {
        for name in self.names() {
            // Registered names always resolve.
            let _ = self.resolve(name);
        }
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.names())
            .field("loaded", &self.loaded_count())
            .finish()
    }
}

fn validate_name(name: &str) -> Result<(), RegistryError> {
    if name.is_empty() {
        return Err(RegistryError::InvalidName {
            name: name.to_string(),
            reason: "name must not be empty",
        });
    }

    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'));
    if !valid {
        return Err(RegistryError::InvalidName {
            name: name.to_string(),
            reason: "allowed characters are ASCII letters, digits, `_`, `-`, `.` and `/`",
        });
    }

    Ok(())
}
