//! viewbridge: resolve a named view component, render it with the supplied
//! props, and hand back the markup wrapped in a `{"html": ...}` envelope.
//!
//! ```ignore
//! use std::sync::Arc;
//! use viewbridge::{application::RenderBridge, presentation::default_registry};
//!
//! let bridge = RenderBridge::new(Arc::new(default_registry()?));
//! let response = bridge.render_json(r#"{"name":"Greeting","props":{"who":"World"}}"#)?;
//! assert_eq!(response, r#"{"html":"<p>Hello, World</p>"}"#);
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
