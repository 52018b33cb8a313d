//! MiniJinja-backed template resources.
//!
//! A [`MiniJinjaResource`] holds a set of named blocks, each compiled as its
//! own template inside a private MiniJinja environment. Blocks can come from
//! inline strings, a YAML mapping or a directory of template files.
//!
//! # Block Files
//!
//! [`MiniJinjaResource::from_dir`] registers every file directly inside the
//! directory whose extension is recognized; the file stem is the block name.
//! Subdirectories are ignored.
//!
//! | Priority | Extension |
//! |----------|-----------|
//! | 1 (highest) | `.jinja` |
//! | 2 | `.jinja2` |
//! | 3 | `.j2` |
//! | 4 (lowest) | `.html` |
//!
//! If `text_widget.jinja` and `text_widget.html` both exist, the `.jinja`
//! file wins.
//!
//! # Inheritance
//!
//! A resource may [`extend`](MiniJinjaResource::extends) another one. Blocks
//! it does not define itself are looked up, and rendered, in the parent.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use minijinja::{Environment, Value};

use super::runtime::register_form_functions;
use super::{ResourceRef, TemplateResource};
use crate::error::RenderError;

/// Recognized block file extensions in priority order.
pub const BLOCK_EXTENSIONS: &[&str] = &[".jinja", ".jinja2", ".j2", ".html"];

/// A template resource whose blocks are MiniJinja templates.
///
/// # Example
///
/// ```rust
/// use formtheme::MiniJinjaResource;
///
/// let theme = MiniJinjaResource::new("custom")
///     .with_block("text_widget", r#"<input type="text" rel="custom" />"#)
///     .unwrap();
/// ```
pub struct MiniJinjaResource {
    name: String,
    env: Environment<'static>,
    blocks: BTreeSet<String>,
    parent: Option<ResourceRef>,
}

impl MiniJinjaResource {
    /// Creates an empty resource with the form runtime registered.
    pub fn new(name: impl Into<String>) -> Self {
        let mut env = Environment::new();
        register_form_functions(&mut env);
        Self {
            name: name.into(),
            env,
            blocks: BTreeSet::new(),
            parent: None,
        }
    }

    /// Adds a block, returning `self` for chaining.
    ///
    /// # Errors
    ///
    /// Returns an error if the block source does not compile.
    pub fn with_block(mut self, block: &str, source: &str) -> Result<Self, RenderError> {
        self.add_block(block, source)?;
        Ok(self)
    }

    /// Adds or replaces a block.
    ///
    /// The source is compiled immediately; syntax errors are returned here
    /// rather than at render time.
    pub fn add_block(&mut self, block: &str, source: &str) -> Result<(), RenderError> {
        self.env
            .add_template_owned(block.to_string(), source.to_string())?;
        self.blocks.insert(block.to_string());
        Ok(())
    }

    /// Sets the resource this one inherits undefined blocks from.
    pub fn extends(mut self, parent: ResourceRef) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builds a resource from `(block, source)` pairs.
    pub fn from_blocks<I, K, V>(name: impl Into<String>, blocks: I) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut resource = Self::new(name);
        for (block, source) in blocks {
            resource.add_block(block.as_ref(), source.as_ref())?;
        }
        Ok(resource)
    }

    /// Builds a resource from a YAML mapping of block names to sources.
    ///
    /// ```rust
    /// use formtheme::{MiniJinjaResource, TemplateResource};
    ///
    /// let theme = MiniJinjaResource::from_yaml("labels", r#"
    /// form_label: "<label>{{ label }}</label>"
    /// "#).unwrap();
    /// assert!(theme.defines_block("form_label"));
    /// ```
    pub fn from_yaml(name: impl Into<String>, yaml: &str) -> Result<Self, RenderError> {
        let blocks: BTreeMap<String, String> = serde_yaml::from_str(yaml)?;
        Self::from_blocks(name, blocks)
    }

    /// Builds a resource from the block files of a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read or a block does not compile.
    pub fn from_dir<P: AsRef<Path>>(name: impl Into<String>, dir: P) -> Result<Self, RenderError> {
        let mut resource = Self::new(name);
        resource.add_dir(dir)?;
        Ok(resource)
    }

    /// Adds every block file of a directory, replacing existing blocks of the same name.
    pub fn add_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<(), RenderError> {
        for (block, path) in walk_block_dir(dir.as_ref())? {
            let source = std::fs::read_to_string(&path)?;
            self.add_block(&block, &source)?;
        }
        Ok(())
    }

    /// Names of the blocks defined directly by this resource.
    pub fn blocks(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(String::as_str)
    }

    pub fn parent(&self) -> Option<&ResourceRef> {
        self.parent.as_ref()
    }

    /// Returns a mutable reference to the underlying MiniJinja environment.
    ///
    /// This allows registering additional filters or functions for the
    /// resource's blocks.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

impl fmt::Debug for MiniJinjaResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiniJinjaResource")
            .field("name", &self.name)
            .field("blocks", &self.blocks)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .finish()
    }
}

impl TemplateResource for MiniJinjaResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn defines_block(&self, block: &str) -> bool {
        self.blocks.contains(block)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.defines_block(block))
    }

    fn render_block(&self, block: &str, context: &Value) -> Result<String, RenderError> {
        if self.blocks.contains(block) {
            let tmpl = self.env.get_template(block)?;
            return Ok(tmpl.render(context)?);
        }
        match &self.parent {
            Some(parent) => parent.render_block(block, context),
            None => Err(RenderError::TemplateNotFound(format!(
                "block \"{}\" in resource \"{}\"",
                block, self.name
            ))),
        }
    }
}

/// Lists the block files of a directory as `(block name, path)` pairs.
///
/// Only files directly inside `dir` are considered. When several files share
/// a stem, the extension listed first in [`BLOCK_EXTENSIONS`] wins. The
/// result is sorted by block name.
pub fn walk_block_dir(dir: &Path) -> Result<Vec<(String, PathBuf)>, RenderError> {
    let mut found: HashMap<String, (usize, PathBuf)> = HashMap::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some((priority, ext)) = BLOCK_EXTENSIONS
            .iter()
            .enumerate()
            .find(|(_, ext)| file_name.ends_with(*ext))
        else {
            continue;
        };
        let block = file_name[..file_name.len() - ext.len()].to_string();
        if block.is_empty() {
            continue;
        }
        let replace = found
            .get(&block)
            .map_or(true, |(existing, _)| priority < *existing);
        if replace {
            found.insert(block, (priority, path));
        }
    }

    let mut blocks: Vec<(String, PathBuf)> = found
        .into_iter()
        .map(|(block, (_, path))| (block, path))
        .collect();
    blocks.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_block_file(dir: &Path, file_name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.join(file_name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn ctx(value: serde_json::Value) -> Value {
        Value::from_serialize(&value)
    }

    #[test]
    fn test_render_own_block() {
        let resource = MiniJinjaResource::new("t")
            .with_block("text_widget", "<input value=\"{{ value }}\" />")
            .unwrap();
        let out = resource
            .render_block("text_widget", &ctx(serde_json::json!({"value": "x"})))
            .unwrap();
        assert_eq!(out, "<input value=\"x\" />");
    }

    #[test]
    fn test_invalid_block_source_fails_on_add() {
        let result = MiniJinjaResource::new("t").with_block("broken", "{{ unclosed");
        assert!(result.is_err());
    }

    #[test]
    fn test_parent_blocks_are_defined_and_rendered() {
        let parent: ResourceRef = Arc::new(
            MiniJinjaResource::new("base")
                .with_block("form_label", "base label")
                .unwrap(),
        );
        let child = MiniJinjaResource::new("child")
            .with_block("text_widget", "child widget")
            .unwrap()
            .extends(parent);

        assert!(child.defines_block("text_widget"));
        assert!(child.defines_block("form_label"));
        assert!(!child.defines_block("form_row"));
        assert_eq!(
            child.render_block("form_label", &ctx(serde_json::json!({}))).unwrap(),
            "base label"
        );
    }

    #[test]
    fn test_child_block_shadows_parent() {
        let parent: ResourceRef = Arc::new(
            MiniJinjaResource::new("base")
                .with_block("form_label", "base")
                .unwrap(),
        );
        let child = MiniJinjaResource::new("child")
            .with_block("form_label", "child")
            .unwrap()
            .extends(parent);
        assert_eq!(
            child.render_block("form_label", &ctx(serde_json::json!({}))).unwrap(),
            "child"
        );
    }

    #[test]
    fn test_missing_block_is_not_found() {
        let resource = MiniJinjaResource::new("empty");
        let err = resource
            .render_block("form_row", &ctx(serde_json::json!({})))
            .unwrap_err();
        assert!(matches!(err, RenderError::TemplateNotFound(_)));
    }

    #[test]
    fn test_from_yaml() {
        let resource = MiniJinjaResource::from_yaml(
            "yaml",
            "text_widget: \"<input>\"\nform_label: \"<label>{{ label }}</label>\"\n",
        )
        .unwrap();
        let blocks: Vec<_> = resource.blocks().collect();
        assert_eq!(blocks, ["form_label", "text_widget"]);
    }

    #[test]
    fn test_walk_block_dir_extension_priority() {
        let temp_dir = TempDir::new().unwrap();
        create_block_file(temp_dir.path(), "text_widget.html", "html");
        create_block_file(temp_dir.path(), "text_widget.jinja", "jinja");
        create_block_file(temp_dir.path(), "form_row.j2", "row");
        create_block_file(temp_dir.path(), "notes.txt", "ignored");
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();
        create_block_file(&temp_dir.path().join("nested"), "form_label.jinja", "nested");

        let blocks = walk_block_dir(temp_dir.path()).unwrap();
        let names: Vec<_> = blocks.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["form_row", "text_widget"]);
        assert!(blocks[1].1.ends_with("text_widget.jinja"));
    }

    #[test]
    fn test_from_dir_renders_file_blocks() {
        let temp_dir = TempDir::new().unwrap();
        create_block_file(temp_dir.path(), "email_widget.jinja", "<input type=\"email\" rel=\"theme\" />\n");

        let resource = MiniJinjaResource::from_dir("theme", temp_dir.path()).unwrap();
        assert!(resource.defines_block("email_widget"));
        let out = resource
            .render_block("email_widget", &ctx(serde_json::json!({})))
            .unwrap();
        assert_eq!(out, "<input type=\"email\" rel=\"theme\" />");
    }

    #[test]
    fn test_from_dir_missing_directory() {
        let result = MiniJinjaResource::from_dir("missing", "/nonexistent/formtheme/blocks");
        assert!(matches!(result, Err(RenderError::Io(_))));
    }
}
