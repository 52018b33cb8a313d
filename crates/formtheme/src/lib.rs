//! # Formtheme - Themed Form Rendering
//!
//! `formtheme` renders form views through themes made of template blocks.
//! Each view has a type chain (`["email", "text", "form"]`); rendering one of
//! its fragments (`widget`, `row`, `label`, ...) picks the most specific block
//! any active theme defines, so a theme only overrides what it needs to.
//!
//! ## Core Concepts
//!
//! - [`ViewTree`]: immutable tree of [`FormView`]s, built with [`ViewBuilder`]
//! - [`TemplateResource`]: a set of named blocks, such as a [`MiniJinjaResource`]
//! - [`FormRenderer`]: renders fragments, tracks what was rendered, assigns themes
//! - [`ThemeConfig`] / [`ResourceRegistry`]: themes described in YAML
//!
//! ## Block Resolution
//!
//! For a `choice` view rendering its `widget`, the candidate blocks are
//! `_{prefix}_widget`, `choice_widget`, `form_widget`. Candidates are tried in
//! that order, and for each one every theme of the view's stack is asked in
//! priority order. The view's stack is its own theme, then its ancestors'
//! themes, then the default themes.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use formtheme::{form_div_layout, FormRenderer, MiniJinjaResource, ViewBuilder};
//!
//! let tree = ViewBuilder::new("user", ["form"])
//!     .child(ViewBuilder::new("name", ["text", "form"]))
//!     .build();
//! let renderer = FormRenderer::new(tree, vec![form_div_layout().unwrap()]);
//!
//! // A theme overriding one block, applied to the whole form.
//! let custom = MiniJinjaResource::new("custom")
//!     .with_block("text_widget", r#"<input type="text" rel="custom" />"#)
//!     .unwrap();
//! let root = renderer.tree().root();
//! renderer.set_theme(root, vec![Arc::new(custom)], true).unwrap();
//!
//! let name = renderer.tree().find("name").unwrap();
//! assert_eq!(
//!     renderer.render_widget(name, ()).unwrap(),
//!     r#"<input type="text" rel="custom" />"#
//! );
//! // Labels still come from the default theme.
//! assert_eq!(
//!     renderer.render_label(name, None, ()).unwrap(),
//!     r#"<label for="user_name">Name</label>"#
//! );
//! ```
//!
//! ## Configuration Files
//!
//! ```rust
//! use formtheme::{ResourceRegistry, ThemeConfig};
//!
//! let config = ThemeConfig::from_yaml(r#"
//! default_themes: [custom]
//! resources:
//!   custom:
//!     extends: form_div_layout
//!     blocks:
//!       form_errors: '<span class="error">{{ errors|join(", ") }}</span>'
//! "#).unwrap();
//! let registry = ResourceRegistry::from_config(&config).unwrap();
//! let defaults = registry.default_themes().unwrap();
//! assert_eq!(defaults.len(), 1);
//! ```

pub mod block;
pub mod cache;
pub mod config;
pub mod engine;
mod error;
pub mod renderer;
pub mod resource;
pub mod theme;
pub mod view;

// Error types
pub use config::ConfigError;
pub use error::RenderError;

// View tree
pub use view::{FormView, Variables, ViewBuilder, ViewId, ViewSpec, ViewTree};

// Resolution
pub use block::candidate_block_names;
pub use engine::{Explanation, RendererEngine};
pub use theme::ThemeRegistry;

// Resources
pub use resource::{
    form_div_layout, register_form_functions, FormHandle, MiniJinjaResource, ResourceRef,
    ResourceRegistry, TemplateResource, FORM_DIV_LAYOUT,
};

// Rendering
pub use renderer::{merge_variables, FormRenderer, Fragment};

// Configuration
pub use config::{ResourceConfig, ThemeConfig};
