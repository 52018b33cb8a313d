//! Block resolution across a view's theme stack.
//!
//! [`RendererEngine`] answers one question: which resource renders which
//! block for this view and fragment. It combines the view's candidate block
//! names (see [`crate::block`]) with its effective theme stack (see
//! [`crate::theme`]) and memoizes the answer.
//!
//! # Search Order
//!
//! Candidates form the outer loop and themes the inner loop:
//!
//! ```text
//! for block in candidates          (most specific first)
//!     for resource in theme stack  (highest priority first)
//!         if resource defines block -> winner
//! ```
//!
//! A more specific block therefore wins even when it is defined by a lower
//! priority theme. With themes `[custom, default]`, where `custom` defines
//! only `form_widget` and `default` defines `choice_widget`, a `choice` view
//! renders `default`'s `choice_widget`.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::block::candidate_block_names;
use crate::cache::{BlockCache, LookupKey, ResolvedBlock};
use crate::error::RenderError;
use crate::resource::{resource_names, ResourceRef};
use crate::theme::ThemeRegistry;
use crate::view::{ViewId, ViewTree};

/// Resolves blocks for the views of one tree.
#[derive(Debug)]
pub struct RendererEngine {
    themes: ThemeRegistry,
    cache: BlockCache,
}

/// How a fragment was (or would be) resolved for a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub view: ViewId,
    pub fragment: String,
    /// Candidate block names, most specific first.
    pub candidates: Vec<String>,
    /// Names of the resources searched, highest priority first.
    pub themes: Vec<String>,
    /// The winning `(block, resource name)`, if any.
    pub winner: Option<(String, String)>,
}

impl RendererEngine {
    pub fn new(defaults: Vec<ResourceRef>) -> Self {
        Self {
            themes: ThemeRegistry::new(defaults),
            cache: BlockCache::new(),
        }
    }

    /// Assigns a theme to `view` and drops every cached lookup that may
    /// depend on it.
    pub fn set_theme(
        &mut self,
        tree: &ViewTree,
        view: ViewId,
        resources: Vec<ResourceRef>,
        use_default_themes: bool,
    ) -> Result<(), RenderError> {
        if !tree.contains(view) {
            return Err(RenderError::UnknownView(view));
        }
        let affected = self
            .themes
            .set_theme(tree, view, resources, use_default_themes);
        self.cache.invalidate(&affected);
        debug!(view = %view, invalidated = affected.len(), "invalidated block cache");
        Ok(())
    }

    /// The effective theme stack of `view`.
    pub fn theme_stack(&mut self, tree: &ViewTree, view: ViewId) -> Arc<[ResourceRef]> {
        self.themes.effective_theme_stack(tree, view)
    }

    /// Resolves a fragment suffix (`widget`, `row`, ...) for `view`.
    ///
    /// Candidates before index `from` are skipped; a block rendering the same
    /// fragment for the same view resumes after its own position, which is
    /// how an override wraps the block it overrides.
    ///
    /// `Ok(None)` means no remaining candidate is defined by any theme of the
    /// stack.
    pub fn resolve_fragment(
        &mut self,
        tree: &ViewTree,
        view: ViewId,
        fragment: &str,
        from: usize,
    ) -> Result<Option<ResolvedBlock>, RenderError> {
        let node = tree.get(view).ok_or(RenderError::UnknownView(view))?;
        let key = LookupKey::Fragment {
            suffix: fragment.to_string(),
            from,
        };
        if let Some(cached) = self.cache.get(view, &key) {
            trace!(view = %view, fragment, from, "block cache hit");
            return Ok(cached.cloned());
        }

        let candidates = candidate_block_names(node, fragment);
        let stack = self.themes.effective_theme_stack(tree, view);
        let resolved = search(&candidates, from, &stack);
        log_result(view, fragment, resolved.as_ref());
        self.cache.insert(view, key, resolved.clone());
        Ok(resolved)
    }

    /// Resolves an exact block name through the theme stack of `view`.
    pub fn resolve_block(
        &mut self,
        tree: &ViewTree,
        view: ViewId,
        block: &str,
    ) -> Result<Option<ResolvedBlock>, RenderError> {
        if !tree.contains(view) {
            return Err(RenderError::UnknownView(view));
        }
        let key = LookupKey::Block(block.to_string());
        if let Some(cached) = self.cache.get(view, &key) {
            trace!(view = %view, block, "block cache hit");
            return Ok(cached.cloned());
        }

        let stack = self.themes.effective_theme_stack(tree, view);
        let resolved = search(std::slice::from_ref(&block.to_string()), 0, &stack);
        log_result(view, block, resolved.as_ref());
        self.cache.insert(view, key, resolved.clone());
        Ok(resolved)
    }

    /// Describes the lookup of `fragment` for `view` without caching it.
    pub fn explain(
        &mut self,
        tree: &ViewTree,
        view: ViewId,
        fragment: &str,
    ) -> Result<Explanation, RenderError> {
        let node = tree.get(view).ok_or(RenderError::UnknownView(view))?;
        let candidates = candidate_block_names(node, fragment);
        let stack = self.themes.effective_theme_stack(tree, view);
        let winner = search(&candidates, 0, &stack)
            .map(|resolved| (resolved.block, resolved.resource.name().to_string()));
        Ok(Explanation {
            view,
            fragment: fragment.to_string(),
            candidates,
            themes: resource_names(&stack),
            winner,
        })
    }

    /// Number of cached lookups.
    pub fn cached_lookups(&self) -> usize {
        self.cache.len()
    }
}

fn search(candidates: &[String], from: usize, stack: &[ResourceRef]) -> Option<ResolvedBlock> {
    for (level, block) in candidates.iter().enumerate().skip(from) {
        for resource in stack {
            trace!(block = %block, resource = resource.name(), "probing");
            if resource.defines_block(block) {
                return Some(ResolvedBlock {
                    block: block.clone(),
                    resource: Arc::clone(resource),
                    level,
                });
            }
        }
    }
    None
}

fn log_result(view: ViewId, lookup: &str, resolved: Option<&ResolvedBlock>) {
    match resolved {
        Some(hit) => debug!(
            view = %view,
            lookup,
            block = %hit.block,
            resource = hit.resource.name(),
            "resolved block"
        ),
        None => debug!(view = %view, lookup, "no block found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MiniJinjaResource;
    use crate::view::ViewBuilder;

    fn theme(name: &str, blocks: &[&str]) -> ResourceRef {
        Arc::new(MiniJinjaResource::from_blocks(name, blocks.iter().map(|b| (*b, *b))).unwrap())
    }

    fn winner(resolved: Option<ResolvedBlock>) -> Option<(String, String)> {
        resolved.map(|r| (r.block, r.resource.name().to_string()))
    }

    fn pair(block: &str, resource: &str) -> Option<(String, String)> {
        Some((block.to_string(), resource.to_string()))
    }

    #[test]
    fn test_specific_candidate_beats_theme_priority() {
        let tree = ViewBuilder::new("choice", ["choice", "form"])
            .var("unique_block_prefix", "")
            .build();
        let custom = theme("custom", &["form_widget"]);
        let default = theme("default", &["choice_widget", "form_widget"]);
        let mut engine = RendererEngine::new(vec![default]);
        engine
            .set_theme(&tree, tree.root(), vec![custom], true)
            .unwrap();

        let resolved = engine.resolve_fragment(&tree, tree.root(), "widget", 0).unwrap();
        assert_eq!(winner(resolved), pair("choice_widget", "default"));
    }

    #[test]
    fn test_earlier_theme_wins_for_same_candidate() {
        let tree = ViewBuilder::new("name", ["text", "form"]).build();
        let mut engine = RendererEngine::new(vec![
            theme("first", &["text_widget"]),
            theme("second", &["text_widget"]),
        ]);
        let resolved = engine.resolve_fragment(&tree, tree.root(), "widget", 0).unwrap();
        assert_eq!(winner(resolved), pair("text_widget", "first"));
    }

    #[test]
    fn test_instance_prefix_beats_type_block() {
        let tree = ViewBuilder::new("name", ["text", "form"])
            .var("unique_block_prefix", "custom_x")
            .build();
        let mut engine = RendererEngine::new(vec![theme("low", &["custom_x_widget"])]);
        engine
            .set_theme(&tree, tree.root(), vec![theme("high", &["text_widget"])], true)
            .unwrap();
        let resolved = engine.resolve_fragment(&tree, tree.root(), "widget", 0).unwrap();
        assert_eq!(winner(resolved), pair("custom_x_widget", "low"));
    }

    #[test]
    fn test_resume_skips_candidates_up_to_position() {
        let tree = ViewBuilder::new("name", ["text", "form"]).build();
        let mut engine = RendererEngine::new(vec![
            theme("custom", &["_name_widget", "text_widget"]),
            theme("default", &["text_widget", "form_widget"]),
        ]);
        let first = engine
            .resolve_fragment(&tree, tree.root(), "widget", 0)
            .unwrap()
            .unwrap();
        assert_eq!((first.block.as_str(), first.level), ("_name_widget", 0));

        let resumed = engine
            .resolve_fragment(&tree, tree.root(), "widget", first.level + 1)
            .unwrap();
        assert_eq!(winner(resumed), pair("text_widget", "custom"));
        let resumed = engine
            .resolve_fragment(&tree, tree.root(), "widget", 2)
            .unwrap();
        assert_eq!(winner(resumed), pair("form_widget", "default"));
        assert!(engine
            .resolve_fragment(&tree, tree.root(), "widget", 3)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_miss_is_cached_and_reset_by_set_theme() {
        let tree = ViewBuilder::new("name", ["text", "form"]).build();
        let mut engine = RendererEngine::new(Vec::new());
        assert!(engine
            .resolve_fragment(&tree, tree.root(), "help", 0)
            .unwrap()
            .is_none());
        assert_eq!(engine.cached_lookups(), 1);

        engine
            .set_theme(&tree, tree.root(), vec![theme("t", &["form_help"])], true)
            .unwrap();
        assert_eq!(engine.cached_lookups(), 0);
        let resolved = engine.resolve_fragment(&tree, tree.root(), "help", 0).unwrap();
        assert_eq!(winner(resolved), pair("form_help", "t"));
    }

    #[test]
    fn test_set_theme_replaces_cached_widget_winner() {
        let tree = ViewBuilder::new("name", ["text", "form"]).build();
        let mut engine = RendererEngine::new(vec![theme("default", &["form_widget"])]);
        let resolved = engine.resolve_fragment(&tree, tree.root(), "widget", 0).unwrap();
        assert_eq!(winner(resolved), pair("form_widget", "default"));

        engine
            .set_theme(&tree, tree.root(), vec![theme("custom", &["text_widget"])], true)
            .unwrap();
        let resolved = engine.resolve_fragment(&tree, tree.root(), "widget", 0).unwrap();
        assert_eq!(winner(resolved), pair("text_widget", "custom"));
    }

    #[test]
    fn test_resolve_block_is_exact() {
        let tree = ViewBuilder::new("name", ["text", "form"]).build();
        let mut engine = RendererEngine::new(vec![theme("t", &["widget_attributes"])]);
        let resolved = engine
            .resolve_block(&tree, tree.root(), "widget_attributes")
            .unwrap();
        assert_eq!(winner(resolved), pair("widget_attributes", "t"));
        assert!(engine
            .resolve_block(&tree, tree.root(), "attributes")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_unknown_view() {
        let tree = ViewBuilder::new("name", ["text"]).build();
        let mut engine = RendererEngine::new(Vec::new());
        let err = engine
            .resolve_fragment(&tree, ViewId(7), "widget", 0)
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownView(_)));
        assert!(engine
            .set_theme(&tree, ViewId(7), Vec::new(), true)
            .is_err());
    }

    #[test]
    fn test_explain_lists_search_space() {
        let tree = ViewBuilder::new("name", ["text", "form"]).build();
        let mut engine = RendererEngine::new(vec![theme("default", &["form_label"])]);
        let explanation = engine.explain(&tree, tree.root(), "label").unwrap();
        assert_eq!(
            explanation.candidates,
            ["_name_label", "text_label", "form_label"]
        );
        assert_eq!(explanation.themes, ["default"]);
        assert_eq!(explanation.winner, pair("form_label", "default"));
        assert_eq!(engine.cached_lookups(), 0);
    }
}
