//! Domain layer types and invariants.

pub mod envelope;
pub mod error;

pub use envelope::{RenderRequest, RenderResponse};
pub use error::{BridgeError, RenderError};
