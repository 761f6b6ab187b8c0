use super::{current_source, parent_source, take_schema, JsonValueCache};
use crate::classpath::is_jdk_class;
use crate::error::Result;
use crate::model::specialized::{ITERABLE, MAP};
use crate::model::SignatureModel;
use crate::node::{NodeDependencies, NodePath, NodeSource, NodeTarget, NodeTree};
use crate::plugin::{Plugin, PluginContext};
use crate::schema_generator::SchemaGenerator;
use crate::signature::Wildcard;
use crate::type_resolver::TypeResolver;
use log::debug;
use std::rc::Rc;

/// Type signature nodes.
///
/// Resolution narrows a signature to something a schema can be generated for:
/// type variables are substituted from the path or replaced by their
/// declaration, type parameters by their bound, type arguments by their type,
/// and classes serialized through a `@JsonValue` method by that method's result.
///
/// Containers get one child for their element type. On exit the schema is handed
/// to the parent node.
pub struct TypeSignaturePlugin {
    json_values: Rc<JsonValueCache>,
}

impl TypeSignaturePlugin {
    pub fn new(json_values: Rc<JsonValueCache>) -> Self {
        Self { json_values }
    }

    fn resolve_signature(
        &self,
        signature: &SignatureModel,
        parent: &NodePath,
        tree: &NodeTree,
        ctx: &PluginContext,
    ) -> Result<Option<SignatureModel>> {
        let resolved = match signature {
            SignatureModel::TypeVariable(variable) => {
                let resolver = TypeResolver::new(ctx.models);
                match resolver.substitute_variable(variable, parent.ids(), tree)? {
                    Some(substituted) => Some(substituted),
                    None => variable
                        .resolve(ctx.models)?
                        .map(SignatureModel::TypeParameter),
                }
            }
            SignatureModel::TypeParameter(parameter) => parameter.effective_bound().cloned(),
            SignatureModel::TypeArgument(argument) => match argument.wildcard() {
                Wildcard::None | Wildcard::Extends => argument.associated_type().cloned(),
                Wildcard::Any | Wildcard::Super => None,
            },
            SignatureModel::ClassRef(reference) if !is_jdk_class(reference.name()) => self
                .json_values
                .json_value_method(ctx.models, reference.name())
                .map(|method| {
                    debug!("{} serializes through {}()", reference.name(), method.name());
                    method.result_type().clone()
                }),
            _ => None,
        };
        Ok(resolved)
    }

    /// Element type of a container signature
    fn element(&self, signature: &SignatureModel, ctx: &PluginContext) -> Option<SignatureModel> {
        match signature {
            SignatureModel::Array(array) => Some(array.component().clone()),
            SignatureModel::ClassRef(reference) => {
                let resolver = TypeResolver::new(ctx.models);
                if signature.is_optional() {
                    reference
                        .type_arguments()
                        .first()
                        .cloned()
                        .map(SignatureModel::TypeArgument)
                } else if signature.is_map(ctx.models) {
                    resolver.supertype_argument(reference, MAP, 1)
                } else if signature.is_iterable(ctx.models) {
                    resolver.supertype_argument(reference, ITERABLE, 0)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl Plugin for TypeSignaturePlugin {
    fn name(&self) -> &str {
        "backbone-type-signature"
    }

    fn resolve(
        &self,
        source: NodeSource,
        parent: &NodePath,
        tree: &NodeTree,
        ctx: &PluginContext,
    ) -> Result<NodeSource> {
        let resolved = match &source {
            NodeSource::TypeSignature(signature) => {
                self.resolve_signature(signature, parent, tree, ctx)?
            }
            _ => None,
        };
        Ok(resolved.map(NodeSource::TypeSignature).unwrap_or(source))
    }

    fn scan(
        &self,
        dependencies: &mut NodeDependencies,
        tree: &NodeTree,
        ctx: &PluginContext,
    ) -> Result<()> {
        if let Some(NodeSource::TypeSignature(signature)) = tree.source(dependencies.node) {
            if let Some(element) = self.element(signature, ctx) {
                dependencies.add(NodeSource::TypeSignature(element));
            }
        }
        Ok(())
    }

    fn enter(&self, path: &NodePath, tree: &mut NodeTree, ctx: &PluginContext) -> Result<()> {
        let Some(NodeSource::TypeSignature(signature)) = current_source(path, tree) else {
            return Ok(());
        };
        let schema = SchemaGenerator::new(ctx.models).generate_schema(&signature)?;
        if let Some(target) = path.current().and_then(|id| tree.target_mut(id)) {
            *target = NodeTarget::Schema(schema);
        }
        Ok(())
    }

    fn exit(&self, path: &NodePath, tree: &mut NodeTree, _ctx: &PluginContext) -> Result<()> {
        let Some(NodeSource::TypeSignature(_)) = current_source(path, tree) else {
            return Ok(());
        };
        let Some(parent_id) = path.parent() else {
            return Ok(());
        };
        let parent = parent_source(path, tree);
        let schema = take_schema(path, tree);
        let Some(target) = tree.target_mut(parent_id) else {
            return Ok(());
        };

        match parent {
            Some(NodeSource::Method(_)) => {
                if let Some(operation) = target.operation_mut() {
                    operation.set_response(schema);
                }
            }
            Some(NodeSource::MethodParameter(_)) | Some(NodeSource::Property(_)) => {
                *target = NodeTarget::Schema(schema);
            }
            Some(NodeSource::TypeSignature(_)) => {
                if let Some(container) = target.schema_mut() {
                    container.attach_child(schema);
                }
            }
            _ => {}
        }
        Ok(())
    }
}
