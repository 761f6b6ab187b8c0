use super::{current_source, document, BackboneSettings};
use crate::classpath::is_jdk_class;
use crate::detector::EndpointDetector;
use crate::error::Result;
use crate::node::{NodeDependencies, NodePath, NodeSource, NodeTarget, NodeTree};
use crate::openapi_builder::OpenApiBuilder;
use crate::plugin::{Plugin, PluginContext};
use log::debug;
use std::rc::Rc;

/// Root and endpoint nodes: the root lists the endpoints and holds the
/// document; an endpoint lists its API methods and its supertypes and adds its
/// tag.
pub struct EndpointPlugin {
    settings: Rc<BackboneSettings>,
}

impl EndpointPlugin {
    pub fn new(settings: Rc<BackboneSettings>) -> Self {
        Self { settings }
    }
}

impl Plugin for EndpointPlugin {
    fn name(&self) -> &str {
        "backbone-endpoint"
    }

    fn scan(
        &self,
        dependencies: &mut NodeDependencies,
        tree: &NodeTree,
        ctx: &PluginContext,
    ) -> Result<()> {
        match tree.source(dependencies.node) {
            Some(NodeSource::Root) => {
                for endpoint in &ctx.elements.endpoints {
                    dependencies.add(NodeSource::Endpoint(endpoint.clone()));
                }
            }
            Some(NodeSource::Endpoint(class)) => {
                for method in class.methods(ctx.models) {
                    if EndpointDetector::is_api_method(method) {
                        dependencies.add(NodeSource::Method(method.clone()));
                    }
                }
                for supertype in class.supertypes() {
                    if !is_jdk_class(supertype.name()) {
                        dependencies.add(NodeSource::EndpointSignature(supertype.clone()));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn enter(&self, path: &NodePath, tree: &mut NodeTree, ctx: &PluginContext) -> Result<()> {
        match current_source(path, tree) {
            Some(NodeSource::Root) => {
                if let Some(target) = path.current().and_then(|id| tree.target_mut(id)) {
                    *target = NodeTarget::Document(OpenApiBuilder::new());
                }
            }
            Some(NodeSource::Endpoint(class)) => {
                let name = EndpointDetector::endpoint_name(
                    ctx.models,
                    &class,
                    &self.settings.endpoint_annotation,
                )?;
                debug!("Publishing {} as {}", class.name(), name);
                document(tree, self.name())?.add_tag(&name, class.name());
            }
            _ => {}
        }
        Ok(())
    }
}
