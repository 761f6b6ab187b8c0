use super::BackboneSettings;
use crate::classpath::is_jdk_class;
use crate::detector::EndpointDetector;
use crate::error::Result;
use crate::model::ClassInfoModel;
use crate::node::{NodeDependencies, NodeSource, NodeTree};
use crate::plugin::{Plugin, PluginContext};
use log::debug;
use std::rc::Rc;

/// Ancestors of endpoints.
///
/// A supertype reference becomes an exposed ancestor when its class carries the
/// exposed annotation, otherwise a non-exposed one. Both are walked further up;
/// only exposed ancestors contribute methods.
pub struct EndpointExposedPlugin {
    settings: Rc<BackboneSettings>,
}

impl EndpointExposedPlugin {
    pub fn new(settings: Rc<BackboneSettings>) -> Self {
        Self { settings }
    }
}

fn add_supertypes(class: &ClassInfoModel, dependencies: &mut NodeDependencies) {
    for supertype in class.supertypes() {
        if !is_jdk_class(supertype.name()) {
            dependencies.add(NodeSource::EndpointSignature(supertype.clone()));
        }
    }
}

impl Plugin for EndpointExposedPlugin {
    fn name(&self) -> &str {
        "backbone-endpoint-exposed"
    }

    fn scan(
        &self,
        dependencies: &mut NodeDependencies,
        tree: &NodeTree,
        ctx: &PluginContext,
    ) -> Result<()> {
        match tree.source(dependencies.node) {
            Some(NodeSource::EndpointSignature(reference)) => {
                let Some(class) = reference.class_info(ctx.models)? else {
                    return Ok(());
                };
                if class.has_annotation(ctx.models, &self.settings.exposed_annotation) {
                    debug!("{} is exposed", class.name());
                    dependencies.add(NodeSource::EndpointExposed(class));
                } else {
                    dependencies.add(NodeSource::EndpointNonExposed(class));
                }
            }
            Some(NodeSource::EndpointExposed(class)) => {
                for method in class.methods(ctx.models) {
                    if EndpointDetector::is_api_method(method) {
                        dependencies.add(NodeSource::Method(method.clone()));
                    }
                }
                add_supertypes(class, dependencies);
            }
            Some(NodeSource::EndpointNonExposed(class)) => add_supertypes(class, dependencies),
            _ => {}
        }
        Ok(())
    }
}
