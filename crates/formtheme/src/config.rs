//! Theme configuration files.
//!
//! A configuration names the template resources available to a renderer and
//! which of them are the default themes:
//!
//! ```yaml
//! default_themes: [custom, form_div_layout]
//! resources:
//!   custom:
//!     extends: form_div_layout
//!     dir: ./themes/custom
//!     blocks:
//!       text_widget: '<input type="text" rel="custom">'
//! ```
//!
//! Each resource may load blocks from a directory (see
//! [`MiniJinjaResource::from_dir`](crate::MiniJinjaResource::from_dir)), define
//! blocks inline (inline blocks win over directory blocks of the same name)
//! and extend one other resource. The built-in `form_div_layout` is always
//! available. When `default_themes` is omitted it is `[form_div_layout]`.
//!
//! Configurations are turned into resources by
//! [`ResourceRegistry::from_config`](crate::ResourceRegistry::from_config).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::error::RenderError;
use crate::resource::FORM_DIV_LAYOUT;

/// Errors raised while loading a configuration or building its resources.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid YAML or has the wrong shape.
    #[error("invalid theme configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A theme or `extends` target names no known resource.
    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    /// Resources extend each other in a loop.
    #[error("resources extend each other in a cycle: {}", .0.join(" -> "))]
    ExtendsCycle(Vec<String>),

    /// A resource's blocks could not be loaded or compiled.
    #[error("failed to build resource '{name}': {source}")]
    Resource {
        name: String,
        #[source]
        source: RenderError,
    },
}

/// Top-level theme configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ThemeConfig {
    /// Default themes, highest priority first.
    #[serde(default = "default_themes")]
    pub default_themes: Vec<String>,

    /// Resources by name.
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceConfig>,
}

/// One named template resource.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    /// Directory of block files.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Inline blocks, by name.
    #[serde(default)]
    pub blocks: BTreeMap<String, String>,

    /// Resource to inherit undefined blocks from.
    #[serde(default)]
    pub extends: Option<String>,
}

fn default_themes() -> Vec<String> {
    vec![FORM_DIV_LAYOUT.to_string()]
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            default_themes: default_themes(),
            resources: BTreeMap::new(),
        }
    }
}

impl ThemeConfig {
    /// Parses a configuration. Relative `dir` entries stay relative to the
    /// current directory.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads a configuration file. Relative `dir` entries are resolved
    /// against the directory containing the file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&yaml)?;
        if let Some(base) = path.parent() {
            config.resolve_dirs(base);
        }
        Ok(config)
    }

    /// Makes every relative resource directory relative to `base`.
    pub fn resolve_dirs(&mut self, base: &Path) {
        for resource in self.resources.values_mut() {
            if let Some(dir) = resource.dir.as_mut() {
                if dir.is_relative() {
                    *dir = base.join(&*dir);
                }
            }
        }
    }
}
