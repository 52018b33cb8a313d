//! Block name candidates for a view fragment.
//!
//! A fragment (`widget`, `row`, `label`, ...) of a view is rendered by the
//! first block found among an ordered list of candidate names:
//!
//! 1. `{unique_block_prefix}_{fragment}` when the view carries a
//!    `unique_block_prefix` variable (e.g. `_user_email_widget`), so a theme
//!    can customize one field occurrence without touching its type.
//! 2. `{type}_{fragment}` for each type of the view's chain, most derived
//!    first (e.g. `email_widget`, `text_widget`, `form_widget`).
//!
//! Resolution never fails here; an empty list means nothing can match.

use crate::view::FormView;

/// Name of the variable holding the per-instance block prefix.
pub const UNIQUE_BLOCK_PREFIX: &str = "unique_block_prefix";

/// Returns the candidate block names for `fragment`, most specific first.
///
/// Duplicate names are dropped, keeping the first (most specific) position.
pub fn candidate_block_names(view: &FormView, fragment: &str) -> Vec<String> {
    let prefix = view
        .var(UNIQUE_BLOCK_PREFIX)
        .and_then(serde_json::Value::as_str)
        .filter(|prefix| !prefix.is_empty());

    candidates_for(prefix, view.type_chain(), fragment)
}

/// Candidate names for an explicit prefix and type chain.
pub fn candidates_for<S: AsRef<str>>(
    prefix: Option<&str>,
    type_chain: &[S],
    fragment: &str,
) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(type_chain.len() + 1);
    let all = prefix
        .into_iter()
        .chain(type_chain.iter().map(|t| t.as_ref()))
        .map(|base| format!("{}_{}", base, fragment));
    for name in all {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
