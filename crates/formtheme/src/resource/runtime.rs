//! Template runtime: the `form` object plus the functions and filters blocks use.
//!
//! Registered by [`register_form_functions`] in every [`MiniJinjaResource`]
//! environment:
//!
//! | Function | Renders |
//! |----------|---------|
//! | `form_widget(form, vars?)` | the widget fragment |
//! | `form_row(form, vars?)` | the row fragment |
//! | `form_label(form, label?, vars?)` | the label fragment |
//! | `form_errors(form, vars?)` | the errors fragment |
//! | `form_help(form, vars?)` | the help fragment |
//! | `form_start(form, vars?)` | the start tag |
//! | `form_end(form, vars?)` | the rest of the children, then the end tag |
//! | `form_rest(form, vars?)` | the children not rendered yet |
//! | `form_block(form, name, vars?)` | the block called `name` |
//!
//! Filters: `humanize` turns a field name into a label, `attrs` renders an
//! attribute map.
//!
//! [`MiniJinjaResource`]: super::MiniJinjaResource

use std::sync::Arc;

use minijinja::value::{Enumerator, Object, ObjectRepr};
use minijinja::{Environment, Error, ErrorKind, Value};

use crate::renderer::FormRenderer;
use crate::view::ViewId;

/// A view as seen from inside a template.
///
/// | Attribute | Value |
/// |-----------|-------|
/// | `form.vars` | the view's own variables |
/// | `form.children` | child handles, in declaration order |
/// | `form.parent` | the parent handle, `none` at the root |
/// | `form.rendered` | whether the view counts as rendered |
/// | `form.<child>` | the child with that name |
///
/// Iterating a handle yields its children.
#[derive(Debug, Clone)]
pub struct FormHandle {
    id: ViewId,
    renderer: FormRenderer,
}

impl FormHandle {
    pub fn new(id: ViewId, renderer: FormRenderer) -> Self {
        Self { id, renderer }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn renderer(&self) -> &FormRenderer {
        &self.renderer
    }

    fn handle(&self, id: ViewId) -> Value {
        Value::from_object(FormHandle::new(id, self.renderer.clone()))
    }

    fn children(&self) -> Vec<Value> {
        self.renderer
            .tree()
            .get(self.id)
            .map(|view| view.children().iter().map(|c| self.handle(*c)).collect())
            .unwrap_or_default()
    }
}

impl Object for FormHandle {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Iterable
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let tree = self.renderer.tree();
        let view = tree.get(self.id)?;
        match key.as_str()? {
            "vars" => Some(Value::from_serialize(view.vars())),
            "children" => Some(Value::from(self.children())),
            "parent" => Some(view.parent().map_or(Value::from(()), |p| self.handle(p))),
            "rendered" => Some(Value::from(self.renderer.is_rendered(self.id))),
            name => tree.child(self.id, name).map(|child| self.handle(child)),
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Values(self.children())
    }
}

fn form_handle(value: &Value) -> Result<&FormHandle, Error> {
    value.downcast_object_ref::<FormHandle>().ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("expected a form view, got {}", value.kind()),
        )
    })
}

/// Registers the `form_*` functions and the form filters on `env`.
pub fn register_form_functions(env: &mut Environment<'static>) {
    env.add_function(
        "form_widget",
        |form: Value, vars: Option<Value>| -> Result<Value, Error> {
            let form = form_handle(&form)?;
            let html = form.renderer().render_widget(form.id(), vars)?;
            Ok(Value::from_safe_string(html))
        },
    );
    env.add_function(
        "form_row",
        |form: Value, vars: Option<Value>| -> Result<Value, Error> {
            let form = form_handle(&form)?;
            let html = form.renderer().render_row(form.id(), vars)?;
            Ok(Value::from_safe_string(html))
        },
    );
    env.add_function(
        "form_label",
        |form: Value, label: Option<String>, vars: Option<Value>| -> Result<Value, Error> {
            let form = form_handle(&form)?;
            let html = form
                .renderer()
                .render_label(form.id(), label.as_deref(), vars)?;
            Ok(Value::from_safe_string(html))
        },
    );
    env.add_function(
        "form_errors",
        |form: Value, vars: Option<Value>| -> Result<Value, Error> {
            let form = form_handle(&form)?;
            let html = form.renderer().render_errors(form.id(), vars)?;
            Ok(Value::from_safe_string(html))
        },
    );
    env.add_function(
        "form_help",
        |form: Value, vars: Option<Value>| -> Result<Value, Error> {
            let form = form_handle(&form)?;
            let html = form.renderer().render_help(form.id(), vars)?;
            Ok(Value::from_safe_string(html))
        },
    );
    env.add_function(
        "form_start",
        |form: Value, vars: Option<Value>| -> Result<Value, Error> {
            let form = form_handle(&form)?;
            let html = form.renderer().render_start(form.id(), vars)?;
            Ok(Value::from_safe_string(html))
        },
    );
    env.add_function(
        "form_end",
        |form: Value, vars: Option<Value>| -> Result<Value, Error> {
            let form = form_handle(&form)?;
            let html = form.renderer().render_end(form.id(), vars)?;
            Ok(Value::from_safe_string(html))
        },
    );
    env.add_function(
        "form_rest",
        |form: Value, vars: Option<Value>| -> Result<Value, Error> {
            let form = form_handle(&form)?;
            let html = form.renderer().render_rest(form.id(), vars)?;
            Ok(Value::from_safe_string(html))
        },
    );
    env.add_function(
        "form_block",
        |form: Value, name: String, vars: Option<Value>| -> Result<Value, Error> {
            let form = form_handle(&form)?;
            let html = form.renderer().render_block(form.id(), &name, vars)?;
            Ok(Value::from_safe_string(html))
        },
    );

    env.add_filter("humanize", |value: String| -> String { humanize(&value) });
    env.add_filter("attrs", |value: Value| -> Result<Value, Error> {
        Ok(Value::from_safe_string(attrs(&value)?))
    });
}

/// Turns a field name into a label.
///
/// Camel case humps and underscores become word breaks, and only the first
/// letter is capitalized: `firstName` and `first_name` both become
/// `First name`.
pub fn humanize(text: &str) -> String {
    let mut spaced = String::with_capacity(text.len() + 4);
    for c in text.chars() {
        if c.is_uppercase() {
            spaced.push('_');
        }
        spaced.push(c);
    }

    let words: Vec<&str> = spaced
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .collect();
    let lowered = words.join(" ").to_lowercase();

    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Renders an attribute map as ` key="value"` pairs.
///
/// `true` renders the key as its own value (`disabled="disabled"`); `false`
/// and `none` skip the attribute. Anything else renders as text.
pub fn attrs(value: &Value) -> Result<String, Error> {
    if value.is_undefined() || value.is_none() {
        return Ok(String::new());
    }
    let mut out = String::new();
    for key in value.try_iter()? {
        let item = value.get_item(&key)?;
        if item.is_undefined() || item.is_none() {
            continue;
        }
        if item.kind() == minijinja::value::ValueKind::Bool {
            if item.is_true() {
                out.push_str(&format!(" {}=\"{}\"", key, key));
            }
            continue;
        }
        out.push_str(&format!(" {}=\"{}\"", key, item));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{MiniJinjaResource, ResourceRef};
    use crate::view::ViewBuilder;
    use serde_json::json;

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("first_name"), "First name");
        assert_eq!(humanize("firstName"), "First name");
        assert_eq!(humanize("name"), "Name");
        assert_eq!(humanize("  spaced__out "), "Spaced out");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn test_attrs_filter() {
        let mut env = Environment::new();
        register_form_functions(&mut env);
        let out = env
            .render_str(
                "<input{{ attr|attrs }}>",
                minijinja::context! {
                    attr => json!({"class": "wide", "disabled": true, "readonly": false, "title": null}),
                },
            )
            .unwrap();
        assert_eq!(out, r#"<input class="wide" disabled="disabled">"#);
    }

    #[test]
    fn test_attrs_of_nothing() {
        assert_eq!(attrs(&Value::UNDEFINED).unwrap(), "");
        assert!(attrs(&Value::from(3)).is_err());
    }

    #[test]
    fn test_form_object_in_templates() {
        let theme: ResourceRef = Arc::new(
            MiniJinjaResource::new("nav")
                .with_block(
                    "form_widget",
                    "{{ form.vars.name }}:{% for child in form %}{{ child.vars.name }}{% if child.parent is not none %}^{% endif %}{% endfor %}:{{ form.email.vars.id }}:{{ form.children|length }}:{{ form.parent is none }}",
                )
                .unwrap(),
        );
        let tree = ViewBuilder::new("user", ["form"])
            .child(ViewBuilder::new("email", ["form"]))
            .child(ViewBuilder::new("age", ["form"]))
            .build();
        let renderer = FormRenderer::new(tree, vec![theme]);
        let html = renderer.render_widget(renderer.tree().root(), ()).unwrap();
        assert_eq!(html, "user:email^age^:user_email:2:true");
    }

    #[test]
    fn test_rendered_attribute_tracks_state() {
        let theme: ResourceRef = Arc::new(
            MiniJinjaResource::from_blocks(
                "t",
                [
                    ("text_widget", "w"),
                    (
                        "form_widget",
                        "{% for child in form %}{% if not child.rendered %}{{ form_widget(child) }}{% endif %}{% endfor %}",
                    ),
                ],
            )
            .unwrap(),
        );
        let tree = ViewBuilder::new("f", ["form"])
            .child(ViewBuilder::new("a", ["text", "form"]))
            .child(ViewBuilder::new("b", ["text", "form"]))
            .build();
        let renderer = FormRenderer::new(tree, vec![theme]);
        let a = renderer.tree().find("a").unwrap();
        renderer.render_widget(a, ()).unwrap();
        assert_eq!(renderer.render_widget(renderer.tree().root(), ()).unwrap(), "w");
    }

    #[test]
    fn test_form_functions_require_a_form() {
        let mut env = Environment::new();
        register_form_functions(&mut env);
        let err = env.render_str("{{ form_widget('nope') }}", ()).unwrap_err();
        assert!(err.to_string().contains("expected a form view"));
    }
}
