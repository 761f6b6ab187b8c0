use super::{current_source, take_schema};
use crate::error::Result;
use crate::node::{NodeDependencies, NodePath, NodeSource, NodeTree};
use crate::plugin::{Plugin, PluginContext};

/// A property becomes a named property of its entity's object schema
pub struct PropertyPlugin;

impl Plugin for PropertyPlugin {
    fn name(&self) -> &str {
        "backbone-property"
    }

    fn scan(
        &self,
        dependencies: &mut NodeDependencies,
        tree: &NodeTree,
        _ctx: &PluginContext,
    ) -> Result<()> {
        if let Some(NodeSource::Property(property)) = tree.source(dependencies.node) {
            dependencies.add(NodeSource::TypeSignature(property.signature().clone()));
        }
        Ok(())
    }

    fn exit(&self, path: &NodePath, tree: &mut NodeTree, _ctx: &PluginContext) -> Result<()> {
        let Some(NodeSource::Property(property)) = current_source(path, tree) else {
            return Ok(());
        };
        let schema = take_schema(path, tree);
        let entity = path
            .parent()
            .and_then(|id| tree.target_mut(id))
            .and_then(|target| target.schema_mut());
        if let Some(entity) = entity {
            entity.insert_property(property.name(), schema);
        }
        Ok(())
    }
}
