//! Substitution of classes that travel over the wire as other classes.
//!
//! A `UUID` field is sent as a string, a `Stream` result as a list. This plugin
//! rewrites such class references before the backbone generates schemas for
//! them, and tells the dependency collector not to follow the replaced classes.

use super::{Plugin, PluginContext, TRANSFER_TYPES};
use crate::error::Result;
use crate::model::SignatureModel;
use crate::node::{NodePath, NodeSource, NodeTree};
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Replacements applied unless the configuration overrides them
const DEFAULT_REPLACEMENTS: &[(&str, &str)] = &[
    ("java.net.URI", "java.lang.String"),
    ("java.net.URL", "java.lang.String"),
    ("java.util.UUID", "java.lang.String"),
    ("java.util.stream.Stream", "java.util.List"),
];

/// Configuration of the `transfer-types` plugin.
///
/// `types` maps binary class names to the class they are transferred as. The
/// entries are added to the built-in replacements; an entry for a class that
/// already has one replaces it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransferTypesConfig {
    pub types: BTreeMap<String, String>,
}

pub struct TransferTypesPlugin {
    replacements: BTreeMap<String, String>,
}

impl TransferTypesPlugin {
    pub fn new(config: TransferTypesConfig) -> Self {
        let mut replacements: BTreeMap<String, String> = DEFAULT_REPLACEMENTS
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        replacements.extend(config.types);
        Self { replacements }
    }
}

impl Plugin for TransferTypesPlugin {
    fn name(&self) -> &str {
        TRANSFER_TYPES
    }

    fn resolve(
        &self,
        source: NodeSource,
        _parent: &NodePath,
        _tree: &NodeTree,
        _ctx: &PluginContext,
    ) -> Result<NodeSource> {
        if let NodeSource::TypeSignature(SignatureModel::ClassRef(reference)) = &source {
            if let Some(replacement) = self.replacements.get(reference.name()) {
                debug!("Transferring {} as {}", reference.name(), replacement);
                return Ok(NodeSource::TypeSignature(SignatureModel::ClassRef(
                    reference.with_name(replacement.as_str()),
                )));
            }
        }
        Ok(source)
    }

    fn replaced_types(&self) -> BTreeMap<String, String> {
        self.replacements.clone()
    }
}
