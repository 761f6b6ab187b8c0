//! Nullability from annotations.
//!
//! Reference types are nullable unless something says otherwise. This plugin
//! reads what the code says: a non-null annotation on the declaration (method
//! result, parameter or property), or a default declared on the enclosing class,
//! one of its outer classes or its package. An explicit nullable annotation on
//! the declaration beats any default. `Optional` stays nullable.
//!
//! Only the top-level signature of a declaration is affected; element types of
//! containers keep their own nullability.

use super::{Plugin, PluginContext, NONNULL};
use crate::error::Result;
use crate::model::{AnnotationInfoModel, ModelContext};
use crate::node::{NodePath, NodeSource, NodeTree};
use log::debug;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;

/// Configuration of the `nonnull` plugin: lists of annotation binary names
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct NonNullConfig {
    /// Annotations making the annotated declaration non-null
    pub nonnull: Vec<String>,
    /// Annotations keeping the annotated declaration nullable
    pub nullable: Vec<String>,
    /// Class or package annotations making every declaration inside non-null
    pub default_nonnull: Vec<String>,
}

impl Default for NonNullConfig {
    fn default() -> Self {
        Self {
            nonnull: to_strings(&[
                "javax.annotation.Nonnull",
                "jakarta.annotation.Nonnull",
                "org.jspecify.annotations.NonNull",
                "org.springframework.lang.NonNull",
            ]),
            nullable: to_strings(&[
                "javax.annotation.Nullable",
                "jakarta.annotation.Nullable",
                "org.jspecify.annotations.Nullable",
                "org.springframework.lang.Nullable",
            ]),
            default_nonnull: to_strings(&[
                "org.springframework.lang.NonNullApi",
                "org.jspecify.annotations.NullMarked",
            ]),
        }
    }
}

fn to_strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

pub struct NonNullPlugin {
    config: NonNullConfig,
    packages: RefCell<HashMap<String, bool>>,
}

impl NonNullPlugin {
    pub fn new(config: NonNullConfig) -> Self {
        Self {
            config,
            packages: RefCell::new(HashMap::new()),
        }
    }

    fn has_any(&self, annotations: &[AnnotationInfoModel], names: &[String]) -> bool {
        annotations
            .iter()
            .any(|annotation| names.iter().any(|name| name == annotation.name()))
    }

    /// Whether `class_name`, one of its outer classes or its package declares
    /// non-null as the default
    fn is_default_nonnull(&self, ctx: &ModelContext, class_name: &str) -> bool {
        let mut current = ctx.find_class(class_name);
        let mut package = None;
        while let Some(class) = current {
            if self.has_any(class.annotations(ctx), &self.config.default_nonnull) {
                return true;
            }
            package = Some(class.package_name().to_string());
            current = class.outer_class().and_then(|outer| ctx.find_class(outer));
        }
        match package {
            Some(package) => self.is_package_nonnull(ctx, &package),
            None => false,
        }
    }

    fn is_package_nonnull(&self, ctx: &ModelContext, package: &str) -> bool {
        if let Some(cached) = self.packages.borrow().get(package) {
            return *cached;
        }
        let info_name = if package.is_empty() {
            "package-info".to_string()
        } else {
            format!("{}.package-info", package)
        };
        let nonnull = ctx
            .find_class(&info_name)
            .map(|info| self.has_any(info.annotations(ctx), &self.config.default_nonnull))
            .unwrap_or(false);
        if nonnull {
            debug!("Package {} is non-null by default", package);
        }
        self.packages
            .borrow_mut()
            .insert(package.to_string(), nonnull);
        nonnull
    }

    /// Decides whether the declaration behind `owner` is non-null.
    ///
    /// # Returns
    ///
    /// `None` when `owner` is not a declaration with a type signature.
    fn declaration_nonnull(&self, owner: &NodeSource, ctx: &ModelContext) -> Option<bool> {
        let (annotations, class_name) = match owner {
            NodeSource::Method(method) => {
                (method.annotations(ctx).to_vec(), method.owner().to_string())
            }
            NodeSource::MethodParameter(parameter) => (
                parameter.annotations(ctx).to_vec(),
                parameter.owner().to_string(),
            ),
            NodeSource::Property(property) => {
                (property.annotations(ctx), property.owner().to_string())
            }
            _ => return None,
        };

        if self.has_any(&annotations, &self.config.nullable) {
            return Some(false);
        }
        if self.has_any(&annotations, &self.config.nonnull) {
            return Some(true);
        }
        Some(self.is_default_nonnull(ctx, &class_name))
    }
}

impl Plugin for NonNullPlugin {
    fn name(&self) -> &str {
        NONNULL
    }

    fn exit(&self, path: &NodePath, tree: &mut NodeTree, ctx: &PluginContext) -> Result<()> {
        let (Some(id), Some(parent_id)) = (path.current(), path.parent()) else {
            return Ok(());
        };
        let Some(NodeSource::TypeSignature(signature)) = tree.source(id) else {
            return Ok(());
        };
        if signature.is_primitive() || signature.is_optional() {
            return Ok(());
        }
        let Some(owner) = tree.source(parent_id) else {
            return Ok(());
        };
        if self.declaration_nonnull(owner, ctx.models) != Some(true) {
            return Ok(());
        }

        debug!("{} is non-null", owner);
        if let Some(schema) = tree.target_mut(id).and_then(|target| target.schema_mut()) {
            schema.set_nullable(false);
        }
        Ok(())
    }
}
