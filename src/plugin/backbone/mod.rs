//! The structural plugin.
//!
//! The backbone builds the node graph (endpoints, their methods and exposed
//! ancestors, entities and their properties, and the type signatures below all
//! of them) and assembles the document from it. It is a composite of one
//! sub-plugin per node kind; the sub-plugins share the annotation settings and a
//! cache of `@JsonValue` methods.

mod endpoint;
mod endpoint_exposed;
mod entity;
mod method;
mod method_parameter;
mod property;
mod type_signature;

pub use endpoint::EndpointPlugin;
pub use endpoint_exposed::EndpointExposedPlugin;
pub use entity::EntityPlugin;
pub use method::MethodPlugin;
pub use method_parameter::MethodParameterPlugin;
pub use property::PropertyPlugin;
pub use type_signature::TypeSignaturePlugin;

use super::{CompositePlugin, PluginContext, BACKBONE};
use crate::config::ParserConfig;
use crate::detector::EndpointDetector;
use crate::error::{Error, Result};
use crate::model::{MethodInfoModel, ModelContext};
use crate::node::{NodePath, NodeSource, NodeTarget, NodeTree};
use crate::openapi_builder::OpenApiBuilder;
use crate::schema_generator::Schema;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// The backbone takes no options; an empty object is accepted
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackboneConfig {}

#[derive(Debug)]
pub struct BackboneSettings {
    pub endpoint_annotation: String,
    pub exposed_annotation: String,
}

/// `@JsonValue` methods by class name, looked up once per class
#[derive(Debug, Default)]
pub struct JsonValueCache {
    methods: RefCell<HashMap<String, Option<MethodInfoModel>>>,
}

impl JsonValueCache {
    pub fn json_value_method(
        &self,
        ctx: &ModelContext,
        class_name: &str,
    ) -> Option<MethodInfoModel> {
        if let Some(cached) = self.methods.borrow().get(class_name) {
            return cached.clone();
        }
        let method = ctx
            .find_class(class_name)
            .and_then(|class| class.json_value_method(ctx));
        self.methods
            .borrow_mut()
            .insert(class_name.to_string(), method.clone());
        method
    }
}

/// Creates the backbone for a configuration
pub fn backbone(config: &ParserConfig) -> CompositePlugin {
    let settings = Rc::new(BackboneSettings {
        endpoint_annotation: config.endpoint_annotation.clone(),
        exposed_annotation: config.endpoint_exposed_annotation.clone(),
    });
    let cache = Rc::new(JsonValueCache::default());

    CompositePlugin::new(
        BACKBONE,
        vec![
            Box::new(EndpointPlugin::new(settings.clone())),
            Box::new(EndpointExposedPlugin::new(settings.clone())),
            Box::new(MethodPlugin::new(settings)),
            Box::new(MethodParameterPlugin),
            Box::new(EntityPlugin),
            Box::new(PropertyPlugin),
            Box::new(TypeSignaturePlugin::new(cache)),
        ],
    )
}

/// Source of the node being visited
fn current_source(path: &NodePath, tree: &NodeTree) -> Option<NodeSource> {
    path.current()
        .and_then(|id| tree.source(id))
        .cloned()
}

/// Source of the parent of the node being visited
fn parent_source(path: &NodePath, tree: &NodeTree) -> Option<NodeSource> {
    path.parent().and_then(|id| tree.source(id)).cloned()
}

/// Takes the schema built for the node being visited; a node without one
/// contributes the untyped schema
fn take_schema(path: &NodePath, tree: &mut NodeTree) -> Schema {
    path.current()
        .and_then(|id| tree.target_mut(id))
        .and_then(|target| match target.take() {
            NodeTarget::Schema(schema) => Some(schema),
            _ => None,
        })
        .unwrap_or_else(Schema::any)
}

fn document<'t>(tree: &'t mut NodeTree, plugin: &str) -> Result<&'t mut OpenApiBuilder> {
    tree.document_mut()
        .ok_or_else(|| Error::plugin(plugin, "the root node holds no document"))
}

/// Published name of the endpoint the visited node belongs to
fn endpoint_name(
    path: &NodePath,
    tree: &NodeTree,
    ctx: &PluginContext,
    settings: &BackboneSettings,
) -> Result<Option<String>> {
    for id in path.ids().iter().rev() {
        if let Some(NodeSource::Endpoint(class)) = tree.source(*id) {
            let name =
                EndpointDetector::endpoint_name(ctx.models, class, &settings.endpoint_annotation)?;
            return Ok(Some(name));
        }
    }
    Ok(None)
}
