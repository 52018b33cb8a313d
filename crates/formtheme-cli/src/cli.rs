//! Command-line interface definition and command execution.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use formtheme::{
    Explanation, FormRenderer, Fragment, ResourceRegistry, ThemeConfig, ViewId, ViewTree,
};
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "formtheme")]
#[command(about = "Render form fragments through block themes")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render a fragment of a view, or the whole form
    Render {
        #[command(flatten)]
        target: Target,

        /// Fragment to render (widget, row, label, errors, help, start, end).
        /// Renders the whole form when omitted.
        #[arg(long)]
        fragment: Option<Fragment>,

        /// Theme applied to the root view, highest priority first (repeatable)
        #[arg(long = "theme")]
        themes: Vec<String>,

        /// Stop searching the default themes below the root view
        #[arg(long)]
        no_default_themes: bool,

        /// Variables as a JSON object
        #[arg(long)]
        vars: Option<String>,
    },

    /// Show the candidate blocks, searched themes and winner for a fragment
    Explain {
        #[command(flatten)]
        target: Target,

        /// Fragment to explain
        #[arg(long, default_value = "widget")]
        fragment: Fragment,
    },
}

/// Which view of which tree, with which configuration.
#[derive(Debug, clap::Args)]
pub struct Target {
    /// Theme configuration (YAML). Uses the built-in layout when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// View tree description (YAML, or JSON for `.json` files)
    #[arg(long)]
    pub view: PathBuf,

    /// Dot-separated path of the view inside the tree (root when omitted)
    #[arg(long, default_value = "")]
    pub path: String,
}

struct Loaded {
    registry: ResourceRegistry,
    renderer: FormRenderer,
    view: ViewId,
}

impl Target {
    fn load(&self) -> Result<Loaded> {
        let config = match &self.config {
            Some(path) => ThemeConfig::from_file(path)
                .with_context(|| format!("loading theme configuration {}", path.display()))?,
            None => ThemeConfig::default(),
        };
        let registry = ResourceRegistry::from_config(&config)?;
        let tree = load_tree(&self.view)?;
        debug!(views = tree.len(), "loaded view tree");

        let view = tree
            .find(&self.path)
            .ok_or_else(|| anyhow!("no view at path '{}'", self.path))?;
        let renderer = FormRenderer::new(tree, registry.default_themes()?);
        Ok(Loaded {
            registry,
            renderer,
            view,
        })
    }
}

fn load_tree(path: &Path) -> Result<ViewTree> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading view tree {}", path.display()))?;
    let tree = if path.extension().is_some_and(|ext| ext == "json") {
        ViewTree::from_json(&source)
    } else {
        ViewTree::from_yaml(&source)
    };
    tree.with_context(|| format!("parsing view tree {}", path.display()))
}

impl Cli {
    /// Runs the command and returns what should be printed.
    pub fn execute(&self) -> Result<String> {
        match &self.command {
            Commands::Render {
                target,
                fragment,
                themes,
                no_default_themes,
                vars,
            } => {
                let loaded = target.load()?;
                let renderer = &loaded.renderer;
                if !themes.is_empty() || *no_default_themes {
                    let resources = loaded.registry.resolve(themes)?;
                    renderer.set_theme(renderer.tree().root(), resources, !no_default_themes)?;
                }

                let vars: serde_json::Value = match vars {
                    Some(json) => serde_json::from_str(json).context("parsing --vars")?,
                    None => serde_json::Value::Null,
                };
                let html = match fragment {
                    Some(Fragment::Label) => renderer.render_label(loaded.view, None, &vars)?,
                    Some(Fragment::End) => renderer.render_end(loaded.view, &vars)?,
                    Some(fragment) => renderer.render_fragment(loaded.view, *fragment, &vars)?,
                    None => renderer.render_form(loaded.view, &vars)?,
                };
                Ok(html)
            }
            Commands::Explain { target, fragment } => {
                let loaded = target.load()?;
                let explanation = loaded.renderer.explain(loaded.view, *fragment)?;
                Ok(format_explanation(&explanation))
            }
        }
    }
}

fn format_explanation(explanation: &Explanation) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "view {} fragment \"{}\"\n",
        explanation.view, explanation.fragment
    ));
    out.push_str("candidates:\n");
    for candidate in &explanation.candidates {
        out.push_str(&format!("  {}\n", candidate));
    }
    out.push_str("themes:\n");
    for theme in &explanation.themes {
        out.push_str(&format!("  {}\n", theme));
    }
    match &explanation.winner {
        Some((block, resource)) => out.push_str(&format!("winner: {} from {}", block, resource)),
        None => out.push_str("winner: none"),
    }
    out
}
