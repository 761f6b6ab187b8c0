use super::{current_source, document, endpoint_name, BackboneSettings};
use crate::error::{Error, Result};
use crate::node::{NodeDependencies, NodePath, NodeSource, NodeTarget, NodeTree};
use crate::openapi_builder::Operation;
use crate::plugin::{Plugin, PluginContext};
use std::rc::Rc;

/// Method nodes become operations.
///
/// The operation is built in the node's target while parameters and the result
/// type are visited, then published under the endpoint's path on exit.
pub struct MethodPlugin {
    settings: Rc<BackboneSettings>,
}

impl MethodPlugin {
    pub fn new(settings: Rc<BackboneSettings>) -> Self {
        Self { settings }
    }
}

impl Plugin for MethodPlugin {
    fn name(&self) -> &str {
        "backbone-method"
    }

    fn scan(
        &self,
        dependencies: &mut NodeDependencies,
        tree: &NodeTree,
        ctx: &PluginContext,
    ) -> Result<()> {
        if let Some(NodeSource::Method(method)) = tree.source(dependencies.node) {
            for parameter in method.parameters(ctx.models) {
                dependencies.add(NodeSource::MethodParameter(parameter.clone()));
            }
            if !method.is_void() {
                dependencies.add(NodeSource::TypeSignature(method.result_type().clone()));
            }
        }
        Ok(())
    }

    fn enter(&self, path: &NodePath, tree: &mut NodeTree, ctx: &PluginContext) -> Result<()> {
        let Some(NodeSource::Method(method)) = current_source(path, tree) else {
            return Ok(());
        };
        let endpoint = endpoint_name(path, tree, ctx, &self.settings)?.ok_or_else(|| {
            Error::plugin(self.name(), format!("method {} outside of an endpoint", method.name()))
        })?;

        let mut operation = Operation::new(&endpoint, method.name());
        if !method.parameters(ctx.models).is_empty() {
            operation = operation.with_request_body();
        }
        if let Some(target) = path.current().and_then(|id| tree.target_mut(id)) {
            *target = NodeTarget::Operation(operation);
        }
        Ok(())
    }

    fn exit(&self, path: &NodePath, tree: &mut NodeTree, ctx: &PluginContext) -> Result<()> {
        let Some(NodeSource::Method(method)) = current_source(path, tree) else {
            return Ok(());
        };
        let Some(endpoint) = endpoint_name(path, tree, ctx, &self.settings)? else {
            return Ok(());
        };
        let target = path
            .current()
            .and_then(|id| tree.target_mut(id))
            .map(NodeTarget::take);
        if let Some(NodeTarget::Operation(operation)) = target {
            document(tree, self.name())?.add_operation(&endpoint, method.name(), operation);
        }
        Ok(())
    }
}
