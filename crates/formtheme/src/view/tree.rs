//! Arena storage for form views.

use std::fmt;

use super::Variables;

/// Stable identity of a view within its tree.
///
/// Ids are assigned in pre-order when the tree is built, so the root is
/// always `ViewId(0)` and siblings sharing a name or type still differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub(crate) usize);

impl ViewId {
    /// Returns the numeric index of this id.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single node of a [`ViewTree`].
#[derive(Debug, Clone)]
pub struct FormView {
    pub(crate) id: ViewId,
    pub(crate) name: String,
    pub(crate) type_chain: Vec<String>,
    pub(crate) vars: Variables,
    pub(crate) parent: Option<ViewId>,
    pub(crate) children: Vec<ViewId>,
    pub(crate) do_not_render_label: bool,
}

impl FormView {
    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type names, most derived first (e.g. `["choice", "form"]`).
    pub fn type_chain(&self) -> &[String] {
        &self.type_chain
    }

    pub fn vars(&self) -> &Variables {
        &self.vars
    }

    /// Returns a variable by name.
    pub fn var(&self, name: &str) -> Option<&serde_json::Value> {
        self.vars.get(name)
    }

    pub fn parent(&self) -> Option<ViewId> {
        self.parent
    }

    /// Child ids in declaration order.
    pub fn children(&self) -> &[ViewId] {
        &self.children
    }

    /// Whether "render rest" should render only the widget of this view
    /// (button-like types carry their label inside the widget).
    pub fn do_not_render_label(&self) -> bool {
        self.do_not_render_label
    }
}

/// An immutable tree of [`FormView`] nodes.
#[derive(Debug, Clone)]
pub struct ViewTree {
    pub(crate) nodes: Vec<FormView>,
}

impl ViewTree {
    /// The root view id.
    pub fn root(&self) -> ViewId {
        ViewId(0)
    }

    pub fn get(&self, id: ViewId) -> Option<&FormView> {
        self.nodes.get(id.0)
    }

    pub fn contains(&self, id: ViewId) -> bool {
        id.0 < self.nodes.len()
    }

    /// Number of views in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a direct child of `id` by name.
    pub fn child(&self, id: ViewId, name: &str) -> Option<ViewId> {
        self.get(id)?
            .children
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].name == name)
    }

    /// Looks up a view by a dot-separated path of child names from the root.
    ///
    /// The empty path is the root itself.
    pub fn find(&self, path: &str) -> Option<ViewId> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.root(), |id, segment| self.child(id, segment))
    }

    /// All views below `id` in pre-order, excluding `id`.
    pub fn descendants(&self, id: ViewId) -> Vec<ViewId> {
        let mut out = Vec::new();
        let mut stack: Vec<ViewId> = match self.get(id) {
            Some(view) => view.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        out
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: ViewId) -> impl Iterator<Item = ViewId> + '_ {
        std::iter::successors(self.get(id).and_then(|v| v.parent), move |p| {
            self.nodes[p.0].parent
        })
    }

    /// Iterates every view in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &FormView> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::view::ViewBuilder;

    fn sample() -> crate::view::ViewTree {
        ViewBuilder::new("parent", ["form"])
            .child(
                ViewBuilder::new("child1", ["form"])
                    .child(ViewBuilder::new("field1", ["text", "form"]))
                    .child(ViewBuilder::new("field2", ["text", "form"])),
            )
            .child(ViewBuilder::new("child2", ["form"]).child(ViewBuilder::new("field1", ["text", "form"])))
            .build()
    }

    #[test]
    fn test_ids_are_preorder() {
        let tree = sample();
        let names: Vec<_> = tree.iter().map(|v| v.name().to_string()).collect();
        assert_eq!(names, ["parent", "child1", "field1", "field2", "child2", "field1"]);
        for (i, view) in tree.iter().enumerate() {
            assert_eq!(view.id().index(), i);
        }
    }

    #[test]
    fn test_find_distinguishes_same_named_siblings() {
        let tree = sample();
        let a = tree.find("child1.field1").unwrap();
        let b = tree.find("child2.field1").unwrap();
        assert_ne!(a, b);
        assert_eq!(tree.find(""), Some(tree.root()));
        assert_eq!(tree.find("child1.missing"), None);
    }

    #[test]
    fn test_descendants_and_ancestors() {
        let tree = sample();
        let child1 = tree.find("child1").unwrap();
        let field2 = tree.find("child1.field2").unwrap();

        let below: Vec<_> = tree.descendants(child1).into_iter().map(|id| id.index()).collect();
        assert_eq!(below, [2, 3]);

        let above: Vec<_> = tree.ancestors(field2).collect();
        assert_eq!(above, [child1, tree.root()]);
        assert_eq!(tree.ancestors(tree.root()).count(), 0);
    }
}
