//! The plugin pipeline.
//!
//! Plugins shape the node graph and the document built from it. Each node passes
//! through four hooks:
//!
//! - `resolve` rewrites the node's source before it is inserted. All plugins run
//!   in a loop until none of them changes the source any more.
//! - `scan` lists the node's children.
//! - `enter` runs before the children are visited, in plugin order.
//! - `exit` runs after the children are visited, in reverse plugin order.
//!
//! Plugins are looked up by name in a fixed registry and instantiated from the
//! configuration.

pub mod backbone;
pub mod nonnull;
pub mod transfer_types;

use crate::collector::ScanElements;
use crate::config::ParserConfig;
use crate::error::{Error, Result};
use crate::model::ModelContext;
use crate::node::{NodeDependencies, NodePath, NodeSource, NodeTree};
use log::{debug, info};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

pub const BACKBONE: &str = "backbone";
pub const TRANSFER_TYPES: &str = "transfer-types";
pub const NONNULL: &str = "nonnull";

/// Plugins enabled unless the configuration says otherwise, with their default
/// order
pub const DEFAULT_PLUGINS: &[(&str, i32)] =
    &[(TRANSFER_TYPES, -100), (BACKBONE, 0), (NONNULL, 100)];

/// Read-only state every hook can consult
pub struct PluginContext<'a> {
    pub models: &'a ModelContext,
    pub elements: &'a ScanElements,
}

/// A participant in the node graph traversal.
///
/// All hooks default to doing nothing, so a plugin implements only the ones it
/// needs.
pub trait Plugin {
    /// Registry name of the plugin
    fn name(&self) -> &str;

    /// Rewrites the source of a node about to be inserted under the last node
    /// of `parent`.
    ///
    /// # Returns
    ///
    /// The source to use instead, or `source` itself to leave it unchanged.
    fn resolve(
        &self,
        source: NodeSource,
        _parent: &NodePath,
        _tree: &NodeTree,
        _ctx: &PluginContext,
    ) -> Result<NodeSource> {
        Ok(source)
    }

    /// Adds the children of `dependencies.node`
    fn scan(
        &self,
        _dependencies: &mut NodeDependencies,
        _tree: &NodeTree,
        _ctx: &PluginContext,
    ) -> Result<()> {
        Ok(())
    }

    /// Called when the traversal enters the last node of `path`
    fn enter(&self, _path: &NodePath, _tree: &mut NodeTree, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Called when the traversal leaves the last node of `path`.
    ///
    /// Exit hooks run in reverse plugin order, in the walker and inside
    /// [`CompositePlugin`] alike, so hooks nest like scopes: the plugin that
    /// entered a node first leaves it last. A later plugin such as `nonnull` can
    /// then adjust a node's schema before `backbone` attaches it to the parent.
    fn exit(&self, _path: &NodePath, _tree: &mut NodeTree, _ctx: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Classes this plugin substitutes by other classes. The dependency
    /// collector treats them as leaves.
    fn replaced_types(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// A plugin made of sub-plugins that run in registration order, except for
/// [`Plugin::exit`], which runs them in reverse
pub struct CompositePlugin {
    name: String,
    plugins: Vec<Box<dyn Plugin>>,
}

impl CompositePlugin {
    pub fn new(name: impl Into<String>, plugins: Vec<Box<dyn Plugin>>) -> Self {
        Self {
            name: name.into(),
            plugins,
        }
    }
}

impl Plugin for CompositePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve(
        &self,
        source: NodeSource,
        parent: &NodePath,
        tree: &NodeTree,
        ctx: &PluginContext,
    ) -> Result<NodeSource> {
        let mut source = source;
        for plugin in &self.plugins {
            source = plugin.resolve(source, parent, tree, ctx)?;
        }
        Ok(source)
    }

    fn scan(
        &self,
        dependencies: &mut NodeDependencies,
        tree: &NodeTree,
        ctx: &PluginContext,
    ) -> Result<()> {
        for plugin in &self.plugins {
            plugin.scan(dependencies, tree, ctx)?;
        }
        Ok(())
    }

    fn enter(&self, path: &NodePath, tree: &mut NodeTree, ctx: &PluginContext) -> Result<()> {
        for plugin in &self.plugins {
            plugin.enter(path, tree, ctx)?;
        }
        Ok(())
    }

    fn exit(&self, path: &NodePath, tree: &mut NodeTree, ctx: &PluginContext) -> Result<()> {
        for plugin in self.plugins.iter().rev() {
            plugin.exit(path, tree, ctx)?;
        }
        Ok(())
    }

    fn replaced_types(&self) -> BTreeMap<String, String> {
        self.plugins
            .iter()
            .flat_map(|plugin| plugin.replaced_types())
            .collect()
    }
}

pub fn is_known_plugin(name: &str) -> bool {
    DEFAULT_PLUGINS.iter().any(|(known, _)| *known == name)
}

/// Default order of a registered plugin
pub fn default_order(name: &str) -> i32 {
    DEFAULT_PLUGINS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, order)| *order)
        .unwrap_or(0)
}

/// Instantiates a registered plugin.
///
/// # Errors
///
/// Returns a configuration error for an unknown name or a `configuration` value
/// the plugin cannot deserialize.
pub fn create_plugin(
    name: &str,
    configuration: Option<&serde_json::Value>,
    config: &ParserConfig,
) -> Result<Box<dyn Plugin>> {
    debug!("Creating plugin {}", name);
    let plugin: Box<dyn Plugin> = match name {
        BACKBONE => {
            parse_configuration::<backbone::BackboneConfig>(name, configuration)?;
            Box::new(backbone::backbone(config))
        }
        TRANSFER_TYPES => Box::new(transfer_types::TransferTypesPlugin::new(
            parse_configuration(name, configuration)?,
        )),
        NONNULL => Box::new(nonnull::NonNullPlugin::new(parse_configuration(
            name,
            configuration,
        )?)),
        _ => return Err(Error::config(name, "unknown plugin")),
    };
    Ok(plugin)
}

fn parse_configuration<T: DeserializeOwned + Default>(
    name: &str,
    configuration: Option<&serde_json::Value>,
) -> Result<T> {
    match configuration {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|err| Error::config(name, format!("invalid plugin configuration: {}", err))),
    }
}

/// The ordered plugins of one run
pub struct PluginManager {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginManager {
    /// Plugins in the order they run
    pub fn new(plugins: Vec<Box<dyn Plugin>>) -> Self {
        Self { plugins }
    }

    /// Instantiates the plugins the configuration enables, sorted by order.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the plugin section is inconsistent or
    /// a plugin rejects its configuration.
    pub fn from_config(config: &ParserConfig) -> Result<Self> {
        let mut plugins = Vec::new();
        for plugin in config.effective_plugins()? {
            plugins.push(create_plugin(
                &plugin.name,
                plugin.configuration.as_ref(),
                config,
            )?);
        }

        let manager = Self::new(plugins);
        info!("Using plugins: {}", manager.names().join(", "));
        Ok(manager)
    }

    pub fn plugins(&self) -> &[Box<dyn Plugin>] {
        &self.plugins
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|plugin| plugin.name()).collect()
    }

    /// Replacements declared by all plugins; later plugins win on conflicts
    pub fn replaced_types(&self) -> BTreeMap<String, String> {
        self.plugins
            .iter()
            .flat_map(|plugin| plugin.replaced_types())
            .collect()
    }
}
