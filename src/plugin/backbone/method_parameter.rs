use super::{current_source, take_schema};
use crate::error::Result;
use crate::node::{NodeDependencies, NodePath, NodeSource, NodeTree};
use crate::plugin::{Plugin, PluginContext};

/// A method parameter becomes a property of its operation's request body
pub struct MethodParameterPlugin;

impl Plugin for MethodParameterPlugin {
    fn name(&self) -> &str {
        "backbone-method-parameter"
    }

    fn scan(
        &self,
        dependencies: &mut NodeDependencies,
        tree: &NodeTree,
        _ctx: &PluginContext,
    ) -> Result<()> {
        if let Some(NodeSource::MethodParameter(parameter)) = tree.source(dependencies.node) {
            dependencies.add(NodeSource::TypeSignature(parameter.signature().clone()));
        }
        Ok(())
    }

    fn exit(&self, path: &NodePath, tree: &mut NodeTree, _ctx: &PluginContext) -> Result<()> {
        let Some(NodeSource::MethodParameter(parameter)) = current_source(path, tree) else {
            return Ok(());
        };
        let schema = take_schema(path, tree);
        let operation = path
            .parent()
            .and_then(|id| tree.target_mut(id))
            .and_then(|target| target.operation_mut());
        if let Some(operation) = operation {
            operation.add_request_property(parameter.name(), schema);
        }
        Ok(())
    }
}
