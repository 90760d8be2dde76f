//! View components and the askama adapter that renders them.

pub mod components;
pub mod views;

pub use components::default_registry;
pub use views::TemplateComponent;
