//! Named resources built from a [`ThemeConfig`].

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::div_layout::{form_div_layout, FORM_DIV_LAYOUT};
use super::jinja::MiniJinjaResource;
use super::ResourceRef;
use crate::config::{ConfigError, ThemeConfig};

/// Template resources by name.
///
/// Always contains the built-in `form_div_layout`, unless a configuration
/// replaces it with a resource of the same name.
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    resources: BTreeMap<String, ResourceRef>,
    default_themes: Vec<String>,
}

impl ResourceRegistry {
    /// A registry holding only the built-in theme, which is also the default.
    pub fn new() -> Result<Self, ConfigError> {
        let layout = form_div_layout().map_err(|source| ConfigError::Resource {
            name: FORM_DIV_LAYOUT.to_string(),
            source,
        })?;
        let mut resources = BTreeMap::new();
        resources.insert(FORM_DIV_LAYOUT.to_string(), layout);
        Ok(Self {
            resources,
            default_themes: vec![FORM_DIV_LAYOUT.to_string()],
        })
    }

    /// Builds every resource of `config`.
    ///
    /// Parents are built before the resources extending them. Extending an
    /// unknown resource, or extending in a cycle, is an error, as is a default
    /// theme that names no resource.
    pub fn from_config(config: &ThemeConfig) -> Result<Self, ConfigError> {
        let mut registry = Self::new()?;
        let mut done = HashSet::new();
        for name in config.resources.keys() {
            registry.build(config, name, &mut Vec::new(), &mut done)?;
        }
        registry.default_themes = config.default_themes.clone();
        registry.resolve(&registry.default_themes)?;
        Ok(registry)
    }

    fn build(
        &mut self,
        config: &ThemeConfig,
        name: &str,
        path: &mut Vec<String>,
        done: &mut HashSet<String>,
    ) -> Result<ResourceRef, ConfigError> {
        if done.contains(name) {
            return self.get(name);
        }
        if let Some(start) = path.iter().position(|n| n == name) {
            let mut cycle = path[start..].to_vec();
            cycle.push(name.to_string());
            return Err(ConfigError::ExtendsCycle(cycle));
        }
        let Some(resource_config) = config.resources.get(name) else {
            return self.get(name);
        };

        path.push(name.to_string());
        let parent = match &resource_config.extends {
            Some(parent) => Some(self.build(config, parent, path, done)?),
            None => None,
        };
        path.pop();

        let wrap = |source| ConfigError::Resource {
            name: name.to_string(),
            source,
        };
        let mut resource = MiniJinjaResource::new(name);
        if let Some(dir) = &resource_config.dir {
            resource.add_dir(dir).map_err(wrap)?;
        }
        for (block, source) in &resource_config.blocks {
            resource.add_block(block, source).map_err(wrap)?;
        }
        if let Some(parent) = parent {
            resource = resource.extends(parent);
        }
        debug!(resource = name, blocks = resource.blocks().count(), "built resource");

        let resource: ResourceRef = Arc::new(resource);
        self.resources.insert(name.to_string(), Arc::clone(&resource));
        done.insert(name.to_string());
        Ok(resource)
    }

    /// Adds or replaces a resource under its own name.
    pub fn insert(&mut self, resource: ResourceRef) {
        self.resources.insert(resource.name().to_string(), resource);
    }

    pub fn get(&self, name: &str) -> Result<ResourceRef, ConfigError> {
        self.resources
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownResource(name.to_string()))
    }

    /// Looks up several resources, keeping their order.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<ResourceRef>, ConfigError> {
        names.iter().map(|name| self.get(name.as_ref())).collect()
    }

    /// The configured default themes.
    pub fn default_themes(&self) -> Result<Vec<ResourceRef>, ConfigError> {
        self.resolve(&self.default_themes)
    }

    /// Names of all registered resources, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }
}
