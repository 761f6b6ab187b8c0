use super::{current_source, document, take_schema};
use crate::error::Result;
use crate::model::PropertyModel;
use crate::node::{NodeDependencies, NodePath, NodeSource, NodeTarget, NodeTree};
use crate::plugin::{Plugin, PluginContext};
use crate::schema_generator::SchemaGenerator;

/// Entities become component schemas
pub struct EntityPlugin;

impl Plugin for EntityPlugin {
    fn name(&self) -> &str {
        "backbone-entity"
    }

    fn scan(
        &self,
        dependencies: &mut NodeDependencies,
        tree: &NodeTree,
        ctx: &PluginContext,
    ) -> Result<()> {
        match tree.source(dependencies.node) {
            Some(NodeSource::Root) => {
                for entity in &ctx.elements.entities {
                    dependencies.add(NodeSource::Entity(entity.clone()));
                }
            }
            Some(NodeSource::Entity(class)) if !class.is_enum() => {
                for property in PropertyModel::of_class(ctx.models, class)? {
                    dependencies.add(NodeSource::Property(property));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn enter(&self, path: &NodePath, tree: &mut NodeTree, ctx: &PluginContext) -> Result<()> {
        let Some(NodeSource::Entity(class)) = current_source(path, tree) else {
            return Ok(());
        };
        let schema = SchemaGenerator::new(ctx.models).entity_schema(&class);
        if let Some(target) = path.current().and_then(|id| tree.target_mut(id)) {
            *target = NodeTarget::Schema(schema);
        }
        Ok(())
    }

    fn exit(&self, path: &NodePath, tree: &mut NodeTree, _ctx: &PluginContext) -> Result<()> {
        let Some(NodeSource::Entity(class)) = current_source(path, tree) else {
            return Ok(());
        };
        let schema = take_schema(path, tree);
        document(tree, self.name())?.add_schema(class.name(), schema);
        Ok(())
    }
}
