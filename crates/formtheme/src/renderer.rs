//! The rendering facade.
//!
//! [`FormRenderer`] is the entry point for turning a [`ViewTree`] into markup.
//! It owns the per-pass state (theme assignments, the block cache, which
//! views were rendered, the variable scopes of blocks being rendered) and is
//! a cheap handle: clones share the same pass.
//!
//! ## Fragments
//!
//! | Fragment | Block suffix | Missing block | Renders once |
//! |----------|--------------|---------------|--------------|
//! | [`Fragment::Widget`] | `widget` | error | yes |
//! | [`Fragment::Row`] | `row` | error | yes |
//! | [`Fragment::Start`] | `start` | error | no |
//! | [`Fragment::End`] | `end` | error | no |
//! | [`Fragment::Label`] | `label` | empty | no |
//! | [`Fragment::Errors`] | `errors` | empty | no |
//! | [`Fragment::Help`] | `help` | empty | no |
//!
//! Optional fragments also render nothing when their data says so: a
//! `label` of `false`, no `errors`, or no `help`.
//!
//! ## Variables
//!
//! Every operation takes variable overrides as any [`Serialize`] value that
//! serializes to a map (`()` or `serde_json::Value::Null` mean none). They are
//! merged over the view's variables for this call only; `attr` and
//! `label_attr` are merged key by key.
//!
//! While a block renders for a view, its merged variables become the base for
//! nested calls on the same view, so `form_row(form, {"label": "Name"})`
//! reaches the label rendered inside the row.
//!
//! ## Example
//!
//! ```rust
//! use formtheme::{form_div_layout, FormRenderer, ViewBuilder};
//! use serde_json::json;
//!
//! let tree = ViewBuilder::new("user", ["form"])
//!     .child(ViewBuilder::new("email", ["email", "text", "form"]))
//!     .child(ViewBuilder::new("age", ["integer", "form"]))
//!     .build();
//! let renderer = FormRenderer::new(tree, vec![form_div_layout().unwrap()]);
//!
//! let email = renderer.tree().find("email").unwrap();
//! let widget = renderer.render_widget(email, json!({"attr": {"class": "wide"}})).unwrap();
//! assert!(widget.contains(r#"type="email""#));
//!
//! // Everything not rendered yet: only the age row.
//! let rest = renderer.render_rest(renderer.tree().root(), ()).unwrap();
//! assert!(rest.contains("user_age"));
//! assert!(!rest.contains("user_email"));
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::cache::ResolvedBlock;
use crate::engine::{Explanation, RendererEngine};
use crate::error::RenderError;
use crate::resource::{resource_names, FormHandle, ResourceRef};
use crate::view::{FormView, Variables, ViewId, ViewTree};

/// Variables merged key by key instead of replaced.
const MERGED_MAPS: &[&str] = &["attr", "label_attr"];

/// A renderable part of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fragment {
    Widget,
    Row,
    Label,
    Errors,
    Help,
    Start,
    End,
}

impl Fragment {
    pub const ALL: [Fragment; 7] = [
        Fragment::Widget,
        Fragment::Row,
        Fragment::Label,
        Fragment::Errors,
        Fragment::Help,
        Fragment::Start,
        Fragment::End,
    ];

    /// The block name suffix, e.g. `widget` for `text_widget`.
    pub fn suffix(self) -> &'static str {
        match self {
            Fragment::Widget => "widget",
            Fragment::Row => "row",
            Fragment::Label => "label",
            Fragment::Errors => "errors",
            Fragment::Help => "help",
            Fragment::Start => "start",
            Fragment::End => "end",
        }
    }

    /// Whether a missing block is an error rather than empty output.
    pub fn is_required(self) -> bool {
        matches!(
            self,
            Fragment::Widget | Fragment::Row | Fragment::Start | Fragment::End
        )
    }

    /// Whether rendering marks the view as rendered (and refuses a second time).
    pub fn renders_once(self) -> bool {
        matches!(self, Fragment::Widget | Fragment::Row)
    }

    /// Whether the merged variables say there is nothing to render.
    fn is_suppressed(self, vars: &Variables) -> bool {
        match self {
            Fragment::Label => vars.get("label") == Some(&JsonValue::Bool(false)),
            Fragment::Errors => is_blank(vars.get("errors")),
            Fragment::Help => is_blank(vars.get("help")),
            _ => false,
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for Fragment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Fragment::ALL
            .into_iter()
            .find(|fragment| fragment.suffix() == s)
            .ok_or_else(|| {
                format!(
                    "unknown fragment \"{}\", expected one of: widget, row, label, errors, help, start, end",
                    s
                )
            })
    }
}

fn is_blank(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => true,
        Some(JsonValue::String(s)) => s.is_empty(),
        Some(JsonValue::Array(items)) => items.is_empty(),
        Some(JsonValue::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

/// Merges `overrides` over `base`. Overrides win per key, except that the
/// `attr` and `label_attr` maps are merged key by key.
pub fn merge_variables(base: &Variables, overrides: &Variables) -> Variables {
    let mut merged = base.clone();
    for (key, value) in overrides {
        if MERGED_MAPS.contains(&key.as_str()) {
            if let (Some(JsonValue::Object(existing)), JsonValue::Object(extra)) =
                (merged.get_mut(key), value)
            {
                existing.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
                continue;
            }
        }
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Serializes caller-supplied variables into a map.
pub fn to_variables(vars: impl Serialize) -> Result<Variables, RenderError> {
    match serde_json::to_value(vars)? {
        JsonValue::Null => Ok(Variables::new()),
        JsonValue::Object(map) => Ok(map),
        other => Err(RenderError::InvalidVariables(json_kind(&other).to_string())),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "a map",
    }
}

/// Mutable state of one render pass.
#[derive(Debug)]
struct PassState {
    engine: RendererEngine,
    rendered: HashSet<ViewId>,
    scopes: HashMap<ViewId, Vec<Variables>>,
    /// Candidate positions of the fragments currently rendering, per view.
    levels: HashMap<(ViewId, Fragment), Vec<usize>>,
}

impl PassState {
    fn is_rendered(&self, tree: &ViewTree, view: ViewId) -> bool {
        if self.rendered.contains(&view) {
            return true;
        }
        match tree.get(view) {
            Some(node) if !node.children().is_empty() => node
                .children()
                .iter()
                .all(|child| self.is_rendered(tree, *child)),
            _ => false,
        }
    }

    /// Variables a new call on `view` starts from.
    fn scope_base<'a>(&'a self, view: &'a FormView) -> &'a Variables {
        self.scopes
            .get(&view.id())
            .and_then(|stack| stack.last())
            .unwrap_or_else(|| view.vars())
    }

    fn push_scope(&mut self, view: ViewId, vars: Variables) {
        self.scopes.entry(view).or_default().push(vars);
    }

    fn pop_scope(&mut self, view: ViewId) {
        if let Some(stack) = self.scopes.get_mut(&view) {
            stack.pop();
            if stack.is_empty() {
                self.scopes.remove(&view);
            }
        }
    }

    /// First candidate a lookup of `fragment` may use: past the block
    /// already rendering it for `view`, if any.
    fn resume_level(&self, view: ViewId, fragment: Fragment) -> usize {
        self.levels
            .get(&(view, fragment))
            .and_then(|stack| stack.last())
            .map_or(0, |level| level + 1)
    }

    fn push_level(&mut self, view: ViewId, fragment: Fragment, level: usize) {
        self.levels.entry((view, fragment)).or_default().push(level);
    }

    fn pop_level(&mut self, view: ViewId, fragment: Fragment) {
        if let Some(stack) = self.levels.get_mut(&(view, fragment)) {
            stack.pop();
            if stack.is_empty() {
                self.levels.remove(&(view, fragment));
            }
        }
    }

    fn not_found(&mut self, tree: &ViewTree, view: ViewId, lookup: &str) -> RenderError {
        let type_chain = tree
            .get(view)
            .map(|node| node.type_chain().to_vec())
            .unwrap_or_default();
        let themes = resource_names(&self.engine.theme_stack(tree, view));
        RenderError::BlockNotFound {
            fragment: lookup.to_string(),
            type_chain,
            themes,
        }
    }
}

struct Shared {
    tree: ViewTree,
    state: Mutex<PassState>,
}

/// Renders fragments of one view tree.
///
/// Cloning is cheap; clones share the same tree and pass state. The state
/// lock is released while a resource renders, so blocks may call back into
/// the renderer (this is how `form_row` renders the label and widget).
#[derive(Clone)]
pub struct FormRenderer {
    shared: Arc<Shared>,
}

impl fmt::Debug for FormRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormRenderer")
            .field("views", &self.shared.tree.len())
            .finish_non_exhaustive()
    }
}

impl FormRenderer {
    /// Creates a renderer for `tree` with the given default themes.
    pub fn new(tree: ViewTree, default_themes: Vec<ResourceRef>) -> Self {
        Self {
            shared: Arc::new(Shared {
                tree,
                state: Mutex::new(PassState {
                    engine: RendererEngine::new(default_themes),
                    rendered: HashSet::new(),
                    scopes: HashMap::new(),
                    levels: HashMap::new(),
                }),
            }),
        }
    }

    pub fn tree(&self) -> &ViewTree {
        &self.shared.tree
    }

    fn lock(&self) -> MutexGuard<'_, PassState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Assigns a theme to `view` and its subtree.
    ///
    /// `resources` come first in the view's theme stack. With
    /// `use_default_themes = false` the default themes are no longer searched
    /// for this subtree.
    pub fn set_theme(
        &self,
        view: ViewId,
        resources: Vec<ResourceRef>,
        use_default_themes: bool,
    ) -> Result<(), RenderError> {
        self.lock()
            .engine
            .set_theme(&self.shared.tree, view, resources, use_default_themes)
    }

    /// Whether `view` was rendered, or all of its children were.
    pub fn is_rendered(&self, view: ViewId) -> bool {
        self.lock().is_rendered(&self.shared.tree, view)
    }

    /// Marks `view` as rendered so "render rest" skips it.
    pub fn set_rendered(&self, view: ViewId) -> Result<(), RenderError> {
        if !self.shared.tree.contains(view) {
            return Err(RenderError::UnknownView(view));
        }
        self.lock().rendered.insert(view);
        Ok(())
    }

    /// Describes how `fragment` resolves for `view`.
    pub fn explain(&self, view: ViewId, fragment: Fragment) -> Result<Explanation, RenderError> {
        self.lock()
            .engine
            .explain(&self.shared.tree, view, fragment.suffix())
    }

    pub fn render_widget(&self, view: ViewId, vars: impl Serialize) -> Result<String, RenderError> {
        self.render_fragment(view, Fragment::Widget, vars)
    }

    pub fn render_row(&self, view: ViewId, vars: impl Serialize) -> Result<String, RenderError> {
        self.render_fragment(view, Fragment::Row, vars)
    }

    /// Renders the label. `label` is used unless `vars` sets one itself.
    pub fn render_label(
        &self,
        view: ViewId,
        label: Option<&str>,
        vars: impl Serialize,
    ) -> Result<String, RenderError> {
        let mut vars = to_variables(vars)?;
        if let Some(label) = label {
            vars.entry("label").or_insert_with(|| JsonValue::from(label));
        }
        self.render_fragment_with(view, Fragment::Label, vars)
    }

    pub fn render_errors(&self, view: ViewId, vars: impl Serialize) -> Result<String, RenderError> {
        self.render_fragment(view, Fragment::Errors, vars)
    }

    pub fn render_help(&self, view: ViewId, vars: impl Serialize) -> Result<String, RenderError> {
        self.render_fragment(view, Fragment::Help, vars)
    }

    pub fn render_start(&self, view: ViewId, vars: impl Serialize) -> Result<String, RenderError> {
        self.render_fragment(view, Fragment::Start, vars)
    }

    /// Renders the end tag, preceded by every child not rendered yet.
    ///
    /// Passing `render_rest: false` renders the end tag alone.
    pub fn render_end(&self, view: ViewId, vars: impl Serialize) -> Result<String, RenderError> {
        let vars = to_variables(vars)?;
        let mut out = String::new();
        if vars.get("render_rest") != Some(&JsonValue::Bool(false)) {
            out.push_str(&self.render_rest(view, ())?);
        }
        out.push_str(&self.render_fragment_with(view, Fragment::End, vars)?);
        Ok(out)
    }

    /// Renders every child of `view` that was not rendered yet, in declaration order.
    ///
    /// Children are rendered as rows, or as widgets when they carry their
    /// own label (buttons). `vars` is passed to each of them. Rendered
    /// children, including composites whose children were all rendered, are
    /// skipped entirely.
    pub fn render_rest(&self, view: ViewId, vars: impl Serialize) -> Result<String, RenderError> {
        let tree = &self.shared.tree;
        let node = tree.get(view).ok_or(RenderError::UnknownView(view))?;
        let vars = to_variables(vars)?;

        let mut out = String::new();
        for &child in node.children() {
            if self.is_rendered(child) {
                continue;
            }
            let do_not_render_label = tree
                .get(child)
                .is_some_and(|child| child.do_not_render_label());
            let fragment = if do_not_render_label {
                Fragment::Widget
            } else {
                Fragment::Row
            };
            out.push_str(&self.render_fragment_with(child, fragment, vars.clone())?);
        }
        Ok(out)
    }

    /// Renders the `form` block: start tag, widget and end tag.
    pub fn render_form(&self, view: ViewId, vars: impl Serialize) -> Result<String, RenderError> {
        self.render_block(view, "form", vars)
    }

    /// Renders `fragment` for `view`.
    pub fn render_fragment(
        &self,
        view: ViewId,
        fragment: Fragment,
        vars: impl Serialize,
    ) -> Result<String, RenderError> {
        let vars = to_variables(vars)?;
        self.render_fragment_with(view, fragment, vars)
    }

    /// Renders the block named exactly `block` from the theme stack of `view`.
    ///
    /// Inside another block's rendering for the same view, that block's
    /// variables are the base `vars` is merged onto.
    pub fn render_block(
        &self,
        view: ViewId,
        block: &str,
        vars: impl Serialize,
    ) -> Result<String, RenderError> {
        let tree = &self.shared.tree;
        let node = tree.get(view).ok_or(RenderError::UnknownView(view))?;
        let vars = to_variables(vars)?;

        let (resolved, merged) = {
            let mut state = self.lock();
            let merged = merge_variables(state.scope_base(node), &vars);
            let Some(resolved) = state.engine.resolve_block(tree, view, block)? else {
                return Err(state.not_found(tree, view, block));
            };
            state.push_scope(view, merged.clone());
            (resolved, merged)
        };

        let result = self.render_resolved(view, &resolved, &merged);
        self.lock().pop_scope(view);
        result
    }

    fn render_fragment_with(
        &self,
        view: ViewId,
        fragment: Fragment,
        vars: Variables,
    ) -> Result<String, RenderError> {
        let tree = &self.shared.tree;
        let node = tree.get(view).ok_or(RenderError::UnknownView(view))?;

        let (resolved, merged) = {
            let mut state = self.lock();
            if fragment.renders_once() && state.is_rendered(tree, view) {
                return Err(RenderError::AlreadyRendered {
                    name: node.name().to_string(),
                });
            }

            let merged = merge_variables(state.scope_base(node), &vars);
            if fragment.is_suppressed(&merged) {
                debug!(view = %view, fragment = %fragment, "nothing to render");
                return Ok(String::new());
            }

            let from = state.resume_level(view, fragment);
            match state
                .engine
                .resolve_fragment(tree, view, fragment.suffix(), from)?
            {
                Some(resolved) => {
                    state.push_scope(view, merged.clone());
                    state.push_level(view, fragment, resolved.level);
                    (resolved, merged)
                }
                None if fragment.is_required() => {
                    return Err(state.not_found(tree, view, fragment.suffix()));
                }
                None => return Ok(String::new()),
            }
        };

        let result = self.render_resolved(view, &resolved, &merged);

        let mut state = self.lock();
        state.pop_scope(view);
        state.pop_level(view, fragment);
        let html = result?;
        if fragment.renders_once() {
            state.rendered.insert(view);
        }
        Ok(html)
    }

    fn render_resolved(
        &self,
        view: ViewId,
        resolved: &ResolvedBlock,
        vars: &Variables,
    ) -> Result<String, RenderError> {
        let mut context: BTreeMap<String, minijinja::Value> = vars
            .iter()
            .map(|(key, value)| (key.clone(), minijinja::Value::from_serialize(value)))
            .collect();
        context.insert(
            "form".to_string(),
            minijinja::Value::from_object(FormHandle::new(view, self.clone())),
        );
        let context = minijinja::Value::from_iter(context);
        resolved.resource.render_block(&resolved.block, &context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MiniJinjaResource;
    use crate::view::ViewBuilder;
    use serde_json::json;

    fn theme(name: &str, blocks: &[(&str, &str)]) -> ResourceRef {
        Arc::new(MiniJinjaResource::from_blocks(name, blocks.iter().copied()).unwrap())
    }

    fn basic_theme() -> ResourceRef {
        theme(
            "basic",
            &[
                ("form_widget", "[{{ name }}{% if attr %} {{ attr|attrs }}{% endif %}]"),
                ("form_label", "<{{ label }}>"),
                ("form_errors", "!{{ errors|join(',') }}"),
                ("form_help", "?{{ help }}"),
                ("form_row", "{{ form_label(form) }}{{ form_widget(form) }}"),
                ("form_start", "<form>"),
                ("form_end", "</form>"),
                ("button_widget", "(button {{ name }})"),
            ],
        )
    }

    fn form() -> ViewTree {
        ViewBuilder::new("f", ["form"])
            .child(ViewBuilder::new("f1", ["text", "form"]).var("label", "One"))
            .child(ViewBuilder::new("f2", ["text", "form"]).var("label", "Two"))
            .child(ViewBuilder::new("f3", ["text", "form"]).var("label", "Three"))
            .build()
    }

    #[test]
    fn test_fragment_from_str() {
        assert_eq!("widget".parse::<Fragment>().unwrap(), Fragment::Widget);
        assert_eq!("end".parse::<Fragment>().unwrap(), Fragment::End);
        assert!("form_start".parse::<Fragment>().is_err());
    }

    #[test]
    fn test_merge_overrides_win() {
        let base = to_variables(json!({"label": "a", "required": true})).unwrap();
        let extra = to_variables(json!({"label": "b"})).unwrap();
        let merged = merge_variables(&base, &extra);
        assert_eq!(merged["label"], "b");
        assert_eq!(merged["required"], true);
    }

    #[test]
    fn test_merge_attr_key_wise() {
        let base = to_variables(json!({"attr": {"class": "a", "id": "x"}})).unwrap();
        let extra = to_variables(json!({"attr": {"class": "b"}})).unwrap();
        let merged = merge_variables(&base, &extra);
        assert_eq!(merged["attr"], json!({"class": "b", "id": "x"}));
    }

    #[test]
    fn test_to_variables_rejects_non_maps() {
        assert!(to_variables(()).unwrap().is_empty());
        assert!(matches!(
            to_variables(json!([1, 2])),
            Err(RenderError::InvalidVariables(_))
        ));
    }

    #[test]
    fn test_widget_renders_once() {
        let renderer = FormRenderer::new(form(), vec![basic_theme()]);
        let f1 = renderer.tree().find("f1").unwrap();
        assert_eq!(renderer.render_widget(f1, ()).unwrap(), "[f1]");
        assert!(renderer.is_rendered(f1));
        let err = renderer.render_widget(f1, ()).unwrap_err();
        assert!(matches!(err, RenderError::AlreadyRendered { name } if name == "f1"));
        assert!(renderer.render_row(f1, ()).is_err());
        // Labels are not render-once.
        assert_eq!(renderer.render_label(f1, None, ()).unwrap(), "<One>");
    }

    #[test]
    fn test_row_vars_reach_nested_fragments() {
        let renderer = FormRenderer::new(form(), vec![basic_theme()]);
        let f2 = renderer.tree().find("f2").unwrap();
        let html = renderer
            .render_row(f2, json!({"label": "Custom", "attr": {"class": "x"}}))
            .unwrap();
        assert_eq!(html, r#"<Custom>[f2  class="x"]"#);
    }

    #[test]
    fn test_optional_fragments_render_empty() {
        let renderer = FormRenderer::new(form(), vec![basic_theme()]);
        let f1 = renderer.tree().find("f1").unwrap();
        assert_eq!(renderer.render_label(f1, None, json!({"label": false})).unwrap(), "");
        assert_eq!(renderer.render_errors(f1, ()).unwrap(), "");
        assert_eq!(renderer.render_errors(f1, json!({"errors": []})).unwrap(), "");
        assert_eq!(renderer.render_help(f1, json!({"help": ""})).unwrap(), "");
        assert_eq!(
            renderer.render_errors(f1, json!({"errors": ["a", "b"]})).unwrap(),
            "!a,b"
        );
        assert_eq!(renderer.render_help(f1, json!({"help": "hint"})).unwrap(), "?hint");
    }

    #[test]
    fn test_missing_optional_block_is_empty() {
        let renderer = FormRenderer::new(form(), vec![theme("bare", &[("form_widget", "w")])]);
        let f1 = renderer.tree().find("f1").unwrap();
        assert_eq!(renderer.render_label(f1, None, ()).unwrap(), "");
        assert_eq!(renderer.render_help(f1, json!({"help": "x"})).unwrap(), "");
    }

    #[test]
    fn test_missing_required_block_is_an_error() {
        let renderer = FormRenderer::new(form(), vec![theme("bare", &[("form_label", "l")])]);
        let f1 = renderer.tree().find("f1").unwrap();
        match renderer.render_widget(f1, ()).unwrap_err() {
            RenderError::BlockNotFound {
                fragment,
                type_chain,
                themes,
            } => {
                assert_eq!(fragment, "widget");
                assert_eq!(type_chain, ["text", "form"]);
                assert_eq!(themes, ["bare"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!renderer.is_rendered(f1));
    }

    #[test]
    fn test_explicit_label_loses_to_label_variable() {
        let renderer = FormRenderer::new(form(), vec![basic_theme()]);
        let f1 = renderer.tree().find("f1").unwrap();
        assert_eq!(renderer.render_label(f1, Some("Given"), ()).unwrap(), "<Given>");
        assert_eq!(
            renderer
                .render_label(f1, Some("Given"), json!({"label": "Var"}))
                .unwrap(),
            "<Var>"
        );
    }

    #[test]
    fn test_rest_skips_rendered_children() {
        let renderer = FormRenderer::new(form(), vec![basic_theme()]);
        let root = renderer.tree().root();
        let f2 = renderer.tree().find("f2").unwrap();
        renderer.render_widget(f2, ()).unwrap();

        assert_eq!(renderer.render_rest(root, ()).unwrap(), "<One>[f1]<Three>[f3]");
        assert_eq!(renderer.render_rest(root, ()).unwrap(), "");
        assert!(renderer.is_rendered(root));
    }

    #[test]
    fn test_rest_renders_buttons_as_widgets() {
        let tree = ViewBuilder::new("f", ["form"])
            .child(ViewBuilder::new("save", ["button"]).do_not_render_label())
            .build();
        let renderer = FormRenderer::new(tree, vec![basic_theme()]);
        assert_eq!(
            renderer.render_rest(renderer.tree().root(), ()).unwrap(),
            "(button save)"
        );
    }

    #[test]
    fn test_end_renders_rest_unless_disabled() {
        let renderer = FormRenderer::new(form(), vec![basic_theme()]);
        let root = renderer.tree().root();
        assert_eq!(
            renderer.render_end(root, json!({"render_rest": false})).unwrap(),
            "</form>"
        );
        assert_eq!(
            renderer.render_end(root, ()).unwrap(),
            "<One>[f1]<Two>[f2]<Three>[f3]</form>"
        );
    }

    #[test]
    fn test_set_rendered() {
        let renderer = FormRenderer::new(form(), vec![basic_theme()]);
        let f3 = renderer.tree().find("f3").unwrap();
        renderer.set_rendered(f3).unwrap();
        assert!(renderer.is_rendered(f3));
        assert!(renderer.set_rendered(ViewId(42)).is_err());
    }

    #[test]
    fn test_clones_share_state() {
        let renderer = FormRenderer::new(form(), vec![basic_theme()]);
        let clone = renderer.clone();
        let f1 = renderer.tree().find("f1").unwrap();
        clone.render_widget(f1, ()).unwrap();
        assert!(renderer.is_rendered(f1));
    }

    #[test]
    fn test_render_block_inherits_caller_scope() {
        let theme = theme(
            "scoped",
            &[
                ("text_widget", "{{ form_block(form, 'inner', {'type': 'email'}) }}"),
                ("inner", "{{ type }}/{{ placeholder }}"),
            ],
        );
        let renderer = FormRenderer::new(form(), vec![theme]);
        let f1 = renderer.tree().find("f1").unwrap();
        let html = renderer
            .render_widget(f1, json!({"placeholder": "p", "type": "text"}))
            .unwrap();
        assert_eq!(html, "email/p");
    }

    #[test]
    fn test_unknown_view() {
        let renderer = FormRenderer::new(form(), vec![basic_theme()]);
        assert!(matches!(
            renderer.render_widget(ViewId(99), ()),
            Err(RenderError::UnknownView(_))
        ));
        assert!(!renderer.is_rendered(ViewId(99)));
    }
}
