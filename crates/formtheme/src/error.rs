//! Error types for fragment rendering.
//!
//! This module provides [`RenderError`], the error type returned by every
//! rendering operation. It abstracts over the underlying template engine's
//! errors, so callers never have to match on MiniJinja types.

use thiserror::Error;

use crate::view::ViewId;

/// Error type for fragment rendering operations.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A required fragment matched no block in any theme of the view's stack.
    ///
    /// The message lists everything needed to diagnose a misconfigured theme:
    /// the fragment, the view's type chain and the resources that were searched.
    #[error(
        "unable to render the \"{fragment}\" fragment: no block found for types [{}] in themes [{}]",
        .type_chain.join(", "),
        .themes.join(", ")
    )]
    BlockNotFound {
        fragment: String,
        type_chain: Vec<String>,
        themes: Vec<String>,
    },

    /// A render-once fragment (`widget`, `row`) was requested twice for a view.
    #[error(
        "field \"{name}\" has already been rendered, save the result of the previous render call and output that instead"
    )]
    AlreadyRendered { name: String },

    /// The view id does not belong to the renderer's tree.
    #[error("unknown view {0}")]
    UnknownView(ViewId),

    /// Caller-supplied variables did not serialize to a map.
    #[error("variables must be a map, got {0}")]
    InvalidVariables(String),

    /// Template syntax error or failure while evaluating a block.
    #[error("template error: {0}")]
    TemplateError(String),

    /// A resource was asked to render a block it does not define.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Data serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// I/O error (e.g., reading a block from disk).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for RenderError {
    fn from(err: serde_yaml::Error) -> Self {
        RenderError::SerializationError(err.to_string())
    }
}

impl RenderError {
    /// Rebuilds an error seen through a template engine error's source chain.
    fn rebuild(&self) -> RenderError {
        match self {
            RenderError::BlockNotFound {
                fragment,
                type_chain,
                themes,
            } => RenderError::BlockNotFound {
                fragment: fragment.clone(),
                type_chain: type_chain.clone(),
                themes: themes.clone(),
            },
            RenderError::AlreadyRendered { name } => {
                RenderError::AlreadyRendered { name: name.clone() }
            }
            RenderError::UnknownView(view) => RenderError::UnknownView(*view),
            RenderError::InvalidVariables(kind) => RenderError::InvalidVariables(kind.clone()),
            RenderError::TemplateError(msg) => RenderError::TemplateError(msg.clone()),
            RenderError::TemplateNotFound(msg) => RenderError::TemplateNotFound(msg.clone()),
            RenderError::SerializationError(msg) => RenderError::SerializationError(msg.clone()),
            RenderError::Io(err) => RenderError::Io(std::io::Error::new(err.kind(), err.to_string())),
        }
    }
}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;
        use std::error::Error as _;

        // A fragment rendered from inside a block failed: surface its own error.
        let mut source = err.source();
        while let Some(cause) = source {
            if let Some(nested) = cause.downcast_ref::<RenderError>() {
                return nested.rebuild();
            }
            source = cause.source();
        }

        match err.kind() {
            ErrorKind::TemplateNotFound => RenderError::TemplateNotFound(err.to_string()),
            ErrorKind::BadSerialization => RenderError::SerializationError(err.to_string()),
            _ => RenderError::TemplateError(format!("{:#}", err)),
        }
    }
}

impl From<RenderError> for minijinja::Error {
    fn from(err: RenderError) -> Self {
        minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, err.to_string())
            .with_source(err)
    }
}
