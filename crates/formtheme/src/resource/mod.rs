//! Template resources: the units a theme is made of.
//!
//! A theme is an ordered list of [`TemplateResource`]s. The engine only asks
//! two questions of a resource: does it define a block, and render that block
//! with these variables. How a resource stores its blocks, and whether it
//! inherits blocks from another resource, is its own concern.
//!
//! The default implementation is [`MiniJinjaResource`], where every block is
//! a MiniJinja template. Blocks call back into the renderer through the
//! `form_*` functions registered by [`register_form_functions`]:
//!
//! ```jinja
//! {# form_row #}
//! <div>{{ form_label(form) }}{{ form_errors(form) }}{{ form_widget(form) }}</div>
//! ```
//!
//! ## Key Types
//!
//! - [`TemplateResource`]: the collaborator contract
//! - [`MiniJinjaResource`]: blocks as MiniJinja templates, optionally extending a parent
//! - [`ResourceRegistry`]: named resources built from a [`ThemeConfig`](crate::ThemeConfig)

mod div_layout;
mod jinja;
pub mod registry;
mod runtime;

use std::fmt;
use std::sync::Arc;

use crate::error::RenderError;

pub use self::div_layout::{form_div_layout, FORM_DIV_LAYOUT};
pub use self::jinja::{walk_block_dir, MiniJinjaResource, BLOCK_EXTENSIONS};
pub use self::registry::ResourceRegistry;
pub use self::runtime::{attrs, humanize, register_form_functions, FormHandle};

/// A template resource that can render named blocks.
pub trait TemplateResource: Send + Sync + fmt::Debug {
    /// Name used in diagnostics (e.g. `form_div_layout`).
    fn name(&self) -> &str;

    /// Whether this resource, or anything it inherits from, defines `block`.
    fn defines_block(&self, block: &str) -> bool;

    /// Renders `block` with the given context.
    ///
    /// The context is a map of the merged view variables plus a `form`
    /// entry holding a [`FormHandle`] for the view being rendered.
    fn render_block(&self, block: &str, context: &minijinja::Value) -> Result<String, RenderError>;
}

/// Shared handle to a resource, as stored in themes.
pub type ResourceRef = Arc<dyn TemplateResource>;

/// Names of the given resources, in order.
pub fn resource_names(resources: &[ResourceRef]) -> Vec<String> {
    resources.iter().map(|r| r.name().to_string()).collect()
}
