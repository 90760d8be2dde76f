//! View components shipped with the bridge.

use askama::Template;
use serde::Deserialize;

use crate::application::registry::{ComponentRegistry, RegistryError};

use super::views::TemplateComponent;

#[derive(Debug, Template, Deserialize)]
#[template(path = "components/greeting.html")]
pub struct GreetingView {
    pub who: String,
}

#[derive(Debug, Default, Template, Deserialize)]
#[template(path = "components/widget.html")]
#[serde(default)]
pub struct WidgetView {
    pub serial: String,
    pub date: String,
}

#[derive(Debug, Template, Deserialize)]
#[template(path = "components/item_list.html")]
pub struct ItemListView {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

/// Registry holding every built-in component.
pub fn default_registry() -> Result<ComponentRegistry, RegistryError> {
    let registry = ComponentRegistry::builder()
        .component("Greeting", TemplateComponent::<GreetingView>::new)?
        .component("Widget", TemplateComponent::<WidgetView>::new)?
        .component("ItemList", TemplateComponent::<ItemListView>::new)?
        .build();
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::RenderError;

    fn render(name: &str, props: serde_json::Value) -> Result<String, RenderError> {
        let registry = default_registry().expect("built-in components register");
        registry
            .resolve(name)
            .expect("built-in component")
            .render(&props)
    }

    #[test]
    fn registers_built_in_components() {
        let registry = default_registry().expect("built-in components register");
        assert_eq!(registry.names(), vec!["Greeting", "ItemList", "Widget"]);
        assert_eq!(registry.loaded_count(), 0);
    }

    #[test]
    fn greeting_renders_exact_markup() {
        let html = render("Greeting", json!({"who": "World"})).expect("renders");
        assert_eq!(html, "<p>Hello, World</p>");
    }

    #[test]
    fn greeting_requires_who() {
        let err = render("Greeting", json!({})).expect_err("missing prop");
        assert!(matches!(err, RenderError::InvalidProps(_)));
    }

    #[test]
    fn widget_renders_serial_and_date() {
        let html = render("Widget", json!({"serial": "N-1-A", "date": "2017-10-17"}))
            .expect("renders");
        insta::assert_snapshot!(html, @r#"<div class="widget"><h2>Widget N-1-A</h2><p>manufactured at <time datetime="2017-10-17">2017-10-17</time></p></div>"#);
    }

    #[test]
    fn widget_renders_without_props() {
        let html = render("Widget", json!({})).expect("renders");
        assert!(html.contains("manufacture date unknown"));
    }

    #[test]
    fn item_list_renders_each_item() {
        let html = render(
            "ItemList",
            json!({"title": "Parts", "items": ["bolt", "nut & washer"]}),
        )
        .expect("renders");

        assert!(html.contains("<h3>Parts</h3>"));
        assert!(html.contains("<li>bolt</li>"));
        assert!(!html.contains("nut & washer"));
        assert!(!html.contains("Nothing to show."));
    }

    #[test]
    fn item_list_reports_empty_lists() {
        let html = render("ItemList", json!({})).expect("renders");
        assert!(html.contains("Nothing to show."));
        assert!(!html.contains("<h3>"));
    }
}
