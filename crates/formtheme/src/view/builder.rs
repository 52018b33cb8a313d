//! View tree construction.
//!
//! [`ViewBuilder`] assembles a tree bottom-up the way a form factory would and
//! assigns each view its identity variables (`name`, `id`, `full_name`,
//! `unique_block_prefix`, `compound`) unless they were set explicitly.
//!
//! # Derived Variables
//!
//! | Variable | Root | Below a named parent |
//! |----------|------|----------------------|
//! | `id` | `name` | `{parent.id}_{name}` |
//! | `full_name` | `name` | `{parent.full_name}[{name}]` |
//! | `unique_block_prefix` | `_{block_name}` | `{parent.unique_block_prefix}_{block_name}` |
//!
//! Below a root with an empty name, children are treated like roots.
//! `block_name` comes from [`ViewBuilder::block_name`], then a `block_name`
//! variable, then the view name; collections typically set it to `entry` so
//! that every entry shares the `_{collection}_entry` prefix.

use serde::Deserialize;
use serde_json::Value;

use super::tree::{FormView, ViewId, ViewTree};
use super::Variables;
use crate::error::RenderError;

/// Builder for one view and, recursively, its children.
#[derive(Debug, Clone, Default)]
pub struct ViewBuilder {
    name: String,
    types: Vec<String>,
    vars: Variables,
    children: Vec<ViewBuilder>,
    block_name: Option<String>,
    do_not_render_label: bool,
}

impl ViewBuilder {
    /// Creates a builder for a view with the given name and type chain
    /// (most derived type first).
    pub fn new<I, S>(name: impl Into<String>, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            types: types.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sets a single variable.
    pub fn var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Merges every key of a JSON object into the variables.
    ///
    /// Non-object values are ignored.
    pub fn vars(mut self, vars: Value) -> Self {
        if let Value::Object(map) = vars {
            self.vars.extend(map);
        }
        self
    }

    /// Appends a child view (declaration order is preserved).
    pub fn child(mut self, child: ViewBuilder) -> Self {
        self.children.push(child);
        self
    }

    /// Overrides the name segment used for the unique block prefix.
    pub fn block_name(mut self, block_name: impl Into<String>) -> Self {
        self.block_name = Some(block_name.into());
        self
    }

    /// Marks the view as button-like: "render rest" renders its widget only.
    pub fn do_not_render_label(mut self) -> Self {
        self.do_not_render_label = true;
        self
    }

    /// Builds the tree, assigning ids in pre-order.
    pub fn build(self) -> ViewTree {
        let mut nodes = Vec::new();
        push_node(self, None, &mut nodes);
        ViewTree { nodes }
    }
}

fn push_node(builder: ViewBuilder, parent: Option<ViewId>, nodes: &mut Vec<FormView>) -> ViewId {
    let id = ViewId(nodes.len());
    let ViewBuilder {
        name,
        types,
        mut vars,
        children,
        block_name,
        do_not_render_label,
    } = builder;

    let block_name = block_name
        .or_else(|| {
            vars.get("block_name")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| name.clone());
    let parent_vars = parent.map(|p| &nodes[p.0].vars);
    let parent_full_name = parent_vars
        .and_then(|v| v.get("full_name"))
        .and_then(Value::as_str)
        .filter(|full_name| !full_name.is_empty());

    let (view_id, full_name, prefix) = match (parent_vars, parent_full_name) {
        (Some(pv), Some(parent_full_name)) => (
            format!("{}_{}", str_var(pv, "id"), name),
            format!("{}[{}]", parent_full_name, name),
            format!("{}_{}", str_var(pv, "unique_block_prefix"), block_name),
        ),
        _ => (name.clone(), name.clone(), format!("_{}", block_name)),
    };

    vars.entry("name").or_insert_with(|| Value::from(name.clone()));
    vars.entry("id").or_insert_with(|| Value::from(view_id));
    vars.entry("full_name").or_insert_with(|| Value::from(full_name));
    vars.entry("unique_block_prefix")
        .or_insert_with(|| Value::from(prefix));
    vars.entry("compound")
        .or_insert_with(|| Value::from(!children.is_empty()));

    nodes.push(FormView {
        id,
        name,
        type_chain: types,
        vars,
        parent,
        children: Vec::new(),
        do_not_render_label,
    });

    for child in children {
        let child_id = push_node(child, Some(id), nodes);
        nodes[id.0].children.push(child_id);
    }
    id
}

fn str_var<'a>(vars: &'a Variables, key: &str) -> &'a str {
    vars.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// Serialized description of a view tree.
///
/// ```yaml
/// name: user
/// types: [form]
/// children:
///   - name: email
///     types: [email, text, form]
///     vars: { label: "E-mail" }
///   - name: save
///     types: [submit, button]
///     do_not_render_label: true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewSpec {
    pub name: String,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub vars: Variables,
    #[serde(default)]
    pub children: Vec<ViewSpec>,
    #[serde(default)]
    pub block_name: Option<String>,
    #[serde(default)]
    pub do_not_render_label: bool,
}

impl From<ViewSpec> for ViewBuilder {
    fn from(spec: ViewSpec) -> Self {
        ViewBuilder {
            name: spec.name,
            types: spec.types,
            vars: spec.vars,
            children: spec.children.into_iter().map(ViewBuilder::from).collect(),
            block_name: spec.block_name,
            do_not_render_label: spec.do_not_render_label,
        }
    }
}

impl ViewTree {
    /// Builds a tree from a YAML [`ViewSpec`].
    pub fn from_yaml(yaml: &str) -> Result<Self, RenderError> {
        let spec: ViewSpec = serde_yaml::from_str(yaml)?;
        Ok(ViewBuilder::from(spec).build())
    }

    /// Builds a tree from a JSON [`ViewSpec`].
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        let spec: ViewSpec = serde_json::from_str(json)?;
        Ok(ViewBuilder::from(spec).build())
    }
}
