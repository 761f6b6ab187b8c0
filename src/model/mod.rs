//! The model layer.
//!
//! Models are uniform wrappers over type-system entities. Class, field, method,
//! parameter and annotation models each come from one of two origins: a scanned
//! descriptor ([`crate::parser::ScannedClass`]) or a live runtime class
//! ([`crate::runtime::RtClass`]). The origin is private to each model; the rest of
//! the engine only uses the shared queries.
//!
//! Models are cheap `Rc` handles. The pooled kinds are created through the
//! [`ModelPool`] of the run's [`ModelContext`] and compare by identity. Signature
//! models are values compared structurally.

pub mod annotation;
pub mod class;
pub mod member;
pub mod pool;
pub mod property;
pub mod signature;
pub mod specialized;

pub use annotation::{AnnotationInfoModel, AnnotationParameterModel};
pub use class::{ClassInfoModel, InheritanceChain};
pub use member::{FieldInfoModel, MethodInfoModel, MethodParameterInfoModel};
pub use pool::{Model, ModelKind, ModelPool, Pooled};
pub use property::{PropertyModel, PropertySource};
pub use signature::{
    ArraySignatureModel, BaseSignatureModel, ClassRefSignatureModel, SignatureModel,
    TypeArgumentModel, TypeParameterModel, TypeScope, TypeVariableModel,
};

use crate::classpath::{is_jdk_class, Classpath};
use crate::error::{Error, Result};
use log::debug;
use std::cell::OnceCell;
use std::rc::Rc;

/// State shared by all model construction in one engine run
#[derive(Debug)]
pub struct ModelContext {
    classpath: Rc<Classpath>,
    pool: ModelPool,
}

impl ModelContext {
    pub fn new(classpath: Rc<Classpath>) -> Self {
        Self {
            classpath,
            pool: ModelPool::new(),
        }
    }

    pub fn classpath(&self) -> &Classpath {
        &self.classpath
    }

    pub fn pool(&self) -> &ModelPool {
        &self.pool
    }

    /// Loads the class model for a binary name.
    ///
    /// Standard-library classes outside the catalog yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] for any other class that is not on the
    /// classpath.
    pub fn class_by_name(&self, name: &str) -> Result<Option<ClassInfoModel>> {
        match self.classpath.find(name) {
            Some(handle) => Ok(Some(ClassInfoModel::of(self, handle))),
            None if is_jdk_class(name) => {
                debug!("Standard-library class {} is not in the catalog", name);
                Ok(None)
            }
            None => Err(Error::Resolution(name.to_string())),
        }
    }

    /// Loads the class model for a binary name, ignoring missing classes
    pub fn find_class(&self, name: &str) -> Option<ClassInfoModel> {
        self.classpath
            .find(name)
            .map(|handle| ClassInfoModel::of(self, handle))
    }
}

/// Fallible counterpart of `OnceCell::get_or_init`
pub(crate) fn get_or_try_init<T>(
    cell: &OnceCell<T>,
    init: impl FnOnce() -> Result<T>,
) -> Result<&T> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = init()?;
    Ok(cell.get_or_init(|| value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_by_name_tolerates_unknown_jdk_classes() {
        let ctx = ModelContext::new(Rc::new(Classpath::with_jdk()));
        assert!(ctx.class_by_name("java.lang.String").unwrap().is_some());
        assert!(ctx.class_by_name("java.util.concurrent.Flow").unwrap().is_none());
        assert!(matches!(
            ctx.class_by_name("com.example.Missing"),
            Err(Error::Resolution(_))
        ));
        assert!(ctx.find_class("com.example.Missing").is_none());
    }
}
