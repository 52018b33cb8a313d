//! Memoized block lookups.
//!
//! Lookups are keyed by view and by what was asked: a fragment suffix (which
//! expands to the view's candidate list, searched from a given position) or
//! one explicit block name. Misses
//! are cached as `None` so a missing optional fragment is only searched once.
//!
//! Entries are only valid while the view's effective theme stack is
//! unchanged; the engine drops them through [`BlockCache::invalidate`]
//! whenever a theme is assigned.

use std::collections::HashMap;

use crate::resource::ResourceRef;
use crate::view::ViewId;

/// What a lookup asked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LookupKey {
    /// A fragment suffix such as `widget` or `row`, searched from candidate
    /// index `from` on.
    Fragment { suffix: String, from: usize },
    /// An explicit block name.
    Block(String),
}

/// A block that was found: its name and the resource defining it.
#[derive(Debug, Clone)]
pub struct ResolvedBlock {
    pub block: String,
    pub resource: ResourceRef,
    /// Position of `block` in the view's candidate list (0 for exact lookups).
    pub level: usize,
}

/// Per-view memo of lookup results, including negative ones.
#[derive(Debug, Default)]
pub struct BlockCache {
    entries: HashMap<ViewId, HashMap<LookupKey, Option<ResolvedBlock>>>,
}

impl BlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result, `Some(None)` for a cached miss.
    pub fn get(&self, view: ViewId, key: &LookupKey) -> Option<Option<&ResolvedBlock>> {
        self.entries
            .get(&view)
            .and_then(|lookups| lookups.get(key))
            .map(Option::as_ref)
    }

    pub fn insert(&mut self, view: ViewId, key: LookupKey, result: Option<ResolvedBlock>) {
        self.entries.entry(view).or_default().insert(key, result);
    }

    /// Drops every entry of the given views.
    pub fn invalidate<'a>(&mut self, views: impl IntoIterator<Item = &'a ViewId>) {
        for view in views {
            self.entries.remove(view);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached lookups across all views.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
