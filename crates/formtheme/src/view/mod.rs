//! Form view trees.
//!
//! A [`ViewTree`] mirrors the structure of a form: every node is a
//! [`FormView`] with a type chain (most derived type first), a set of
//! rendering variables and an ordered list of children. The tree owns all of
//! its nodes; parents are referenced by [`ViewId`], never owned, so ownership
//! stays strictly top-down.
//!
//! Trees are produced once, before rendering, by a [`ViewBuilder`] or from a
//! serialized [`ViewSpec`]:
//!
//! ```rust
//! use formtheme::view::ViewBuilder;
//!
//! let tree = ViewBuilder::new("user", ["form"])
//!     .child(ViewBuilder::new("email", ["email", "text", "form"]))
//!     .child(ViewBuilder::new("save", ["submit", "button"]).do_not_render_label())
//!     .build();
//!
//! let email = tree.find("email").unwrap();
//! assert_eq!(tree.get(email).unwrap().vars()["id"], "user_email");
//! assert_eq!(tree.get(email).unwrap().vars()["unique_block_prefix"], "_user_email");
//! ```
//!
//! Rendering never mutates a tree. The per-render "already rendered" state
//! lives in the [`FormRenderer`](crate::FormRenderer).

mod builder;
mod tree;

pub use builder::{ViewBuilder, ViewSpec};
pub use tree::{FormView, ViewId, ViewTree};

/// Rendering variables of a view: a JSON object.
pub type Variables = serde_json::Map<String, serde_json::Value>;
