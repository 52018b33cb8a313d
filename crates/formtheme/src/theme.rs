//! Per-view theme assignment with inheritance.
//!
//! A theme is an ordered list of [`TemplateResource`](crate::TemplateResource)s.
//! Themes are assigned to views explicitly; a view without an assignment
//! inherits the themes of its ancestors. The renderer's default themes come
//! last and never change once the registry is created.
//!
//! ## Effective Stack
//!
//! For a view, the effective stack is, in priority order:
//!
//! 1. the view's own explicit resources (if any)
//! 2. the explicit resources of each ancestor, nearest first
//! 3. the default resources, unless the nearest explicit assignment was made
//!    with `use_default_themes = false`
//!
//! A child theme therefore shadows only the blocks it defines and still sees
//! its parent's blocks for everything else.
//!
//! Stacks are memoized per view. Assigning a theme drops the memoized stacks
//! of the view and its whole subtree.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::resource::ResourceRef;
use crate::view::{ViewId, ViewTree};

#[derive(Debug, Clone)]
struct ThemeAssignment {
    resources: Vec<ResourceRef>,
    use_default_themes: bool,
}

/// Theme assignments for the views of one tree.
#[derive(Debug)]
pub struct ThemeRegistry {
    defaults: Arc<[ResourceRef]>,
    explicit: HashMap<ViewId, ThemeAssignment>,
    effective: HashMap<ViewId, Arc<[ResourceRef]>>,
}

impl ThemeRegistry {
    /// Creates a registry with the given default themes.
    pub fn new(defaults: Vec<ResourceRef>) -> Self {
        Self {
            defaults: defaults.into(),
            explicit: HashMap::new(),
            effective: HashMap::new(),
        }
    }

    /// The default themes, appended to every stack that allows them.
    pub fn defaults(&self) -> &[ResourceRef] {
        &self.defaults
    }

    /// Records the explicit theme of `view`, replacing any previous one.
    ///
    /// Returns the views whose effective stack may have changed: `view`
    /// followed by its descendants. Callers holding per-view caches must
    /// drop their entries for these views before the next lookup.
    pub fn set_theme(
        &mut self,
        tree: &ViewTree,
        view: ViewId,
        resources: Vec<ResourceRef>,
        use_default_themes: bool,
    ) -> Vec<ViewId> {
        debug!(
            view = %view,
            resources = resources.len(),
            use_default_themes,
            "assigning theme"
        );
        self.explicit.insert(
            view,
            ThemeAssignment {
                resources,
                use_default_themes,
            },
        );

        let mut affected = Vec::with_capacity(1);
        affected.push(view);
        affected.extend(tree.descendants(view));
        for id in &affected {
            self.effective.remove(id);
        }
        affected
    }

    /// Whether `view` has an explicit theme.
    pub fn has_theme(&self, view: ViewId) -> bool {
        self.explicit.contains_key(&view)
    }

    /// Returns the effective theme stack of `view`, in priority order.
    pub fn effective_theme_stack(&mut self, tree: &ViewTree, view: ViewId) -> Arc<[ResourceRef]> {
        if let Some(stack) = self.effective.get(&view) {
            return Arc::clone(stack);
        }

        let mut resources: Vec<ResourceRef> = Vec::new();
        let mut use_defaults: Option<bool> = None;
        for id in std::iter::once(view).chain(tree.ancestors(view)) {
            if let Some(assignment) = self.explicit.get(&id) {
                resources.extend(assignment.resources.iter().cloned());
                use_defaults.get_or_insert(assignment.use_default_themes);
            }
        }
        if use_defaults.unwrap_or(true) {
            resources.extend(self.defaults.iter().cloned());
        }

        let stack: Arc<[ResourceRef]> = resources.into();
        self.effective.insert(view, Arc::clone(&stack));
        stack
    }
}
