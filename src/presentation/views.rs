//! Askama-backed renderables.

use std::fmt;
use std::marker::PhantomData;

use askama::Template;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::application::registry::Renderable;
use crate::domain::RenderError;

pub fn render_template<T: Template>(template: &T) -> Result<String, RenderError> {
    template.render().map_err(RenderError::Template)
}

/// Renders the askama template `T`, built from the request props.
///
/// Props are deserialized into `T` first, so missing or mistyped required
/// fields fail with [`RenderError::InvalidProps`] before any markup is
/// produced. `null` props are treated as an empty object.
pub struct TemplateComponent<T> {
    _view: PhantomData<fn() -> T>,
}

impl<T> TemplateComponent<T> {
    pub fn new() -> Self {
        Self { _view: PhantomData }
    }
}

impl<T> Default for TemplateComponent<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TemplateComponent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateComponent")
            .field("view", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Renderable for TemplateComponent<T>
where
    T: Template + DeserializeOwned,
{
    fn render(&self, props: &Value) -> Result<String, RenderError> {
        let view = match props {
            Value::Null => T::deserialize(&Value::Object(Map::new())),
            props => T::deserialize(props),
        }
        .map_err(RenderError::InvalidProps)?;

        render_template(&view)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Template, Deserialize)]
    #[template(source = "<b>{{ label }}</b>", ext = "html")]
    struct BadgeView {
        label: String,
    }

    #[test]
    fn renders_props_through_template() {
        let component = TemplateComponent::<BadgeView>::new();
        let html = component.render(&json!({"label": "new"})).expect("renders");
        assert_eq!(html, "<b>new</b>");
    }

    #[test]
    fn escapes_markup_in_props() {
        let component = TemplateComponent::<BadgeView>::new();
        let html = component
            .render(&json!({"label": "<script>"}))
            .expect("renders");
        assert!(html.starts_with("<b>&"), "{html}");
        assert!(!html.contains("<script>"), "{html}");
    }

    #[test]
    fn missing_required_props_are_invalid() {
        let component = TemplateComponent::<BadgeView>::new();

        for props in [json!({}), Value::Null, json!({"label": 7})] {
            let err = component.render(&props).expect_err("props are invalid");
            assert!(matches!(err, RenderError::InvalidProps(_)), "{props}: {err}");
        }
    }
}
