use super::{
    AnnotationInfoModel, ClassInfoModel, FieldInfoModel, MethodInfoModel,
    MethodParameterInfoModel,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Kinds of pooled models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Class,
    Field,
    Method,
    MethodParameter,
    Annotation,
}

/// Pool key: the model kind plus the address of the wrapped entity.
///
/// Every pooled model holds an `Rc` to its entity, so an address cannot be reused
/// while the pool holds the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PoolKey {
    kind: ModelKind,
    address: usize,
}

/// Any pooled model
#[derive(Debug, Clone)]
pub enum Model {
    Class(ClassInfoModel),
    Field(FieldInfoModel),
    Method(MethodInfoModel),
    MethodParameter(MethodParameterInfoModel),
    Annotation(AnnotationInfoModel),
}

/// A model type that lives in the [`ModelPool`]
pub trait Pooled: Clone {
    const KIND: ModelKind;

    fn into_model(self) -> Model;

    fn from_model(model: &Model) -> Option<Self>;
}

macro_rules! pooled {
    ($model:ident, $variant:ident) => {
        impl Pooled for $model {
            const KIND: ModelKind = ModelKind::$variant;

            fn into_model(self) -> Model {
                Model::$variant(self)
            }

            fn from_model(model: &Model) -> Option<Self> {
                match model {
                    Model::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }
    };
}

pooled!(ClassInfoModel, Class);
pooled!(FieldInfoModel, Field);
pooled!(MethodInfoModel, Method);
pooled!(MethodParameterInfoModel, MethodParameter);
pooled!(AnnotationInfoModel, Annotation);

/// Identity pool of models, owned by one engine run.
///
/// Wrapping the same entity twice returns the same model, so models compare by
/// identity and share their cached derived state.
#[derive(Default)]
pub struct ModelPool {
    models: RefCell<HashMap<PoolKey, Model>>,
}

impl ModelPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the model wrapping `key`, constructing it with `constructor` on
    /// first use.
    ///
    /// The pool is not borrowed while `constructor` runs, so constructors may
    /// create other pooled models.
    pub fn get_or_create<K, P, M, F>(&self, key: &Rc<K>, parent: P, constructor: F) -> M
    where
        M: Pooled,
        F: FnOnce(&Rc<K>, P) -> M,
    {
        let pool_key = PoolKey {
            kind: M::KIND,
            address: Rc::as_ptr(key) as *const () as usize,
        };

        let cached = self
            .models
            .borrow()
            .get(&pool_key)
            .and_then(M::from_model);
        if let Some(model) = cached {
            return model;
        }

        let model = constructor(key, parent);
        let mut models = self.models.borrow_mut();
        // a constructor that pooled the same entity itself wins
        let pooled = models
            .entry(pool_key)
            .or_insert_with(|| model.clone().into_model());
        M::from_model(pooled).unwrap_or(model)
    }

    pub fn len(&self) -> usize {
        self.models.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.borrow().is_empty()
    }
}

impl fmt::Debug for ModelPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelPool")
            .field("models", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::{ClassHandle, Classpath};
    use crate::model::ModelContext;
    use crate::runtime::{RtClass, RtField, RtType, Runtime};

    fn context() -> ModelContext {
        let mut runtime = Runtime::with_jdk();
        runtime.register(
            RtClass::new("com.example.Item")
                .field(RtField::new("id", RtType::class("java.lang.String"))),
        );
        ModelContext::new(Rc::new(Classpath::new(runtime)))
    }

    #[test]
    fn test_same_entity_yields_same_model() {
        let ctx = context();
        let handle = ctx.classpath().find("com.example.Item").unwrap();
        let first = ClassInfoModel::of(&ctx, handle.clone());
        let second = ClassInfoModel::of(&ctx, handle);
        assert_eq!(first, second);
        assert_eq!(ctx.pool().len(), 1);
    }

    #[test]
    fn test_pooled_models_share_derived_state() {
        let ctx = context();
        let first = ctx.class_by_name("com.example.Item").unwrap().unwrap();
        let second = ctx.class_by_name("com.example.Item").unwrap().unwrap();

        let fields_a = first.fields(&ctx);
        let fields_b = second.fields(&ctx);
        assert!(std::ptr::eq(fields_a.as_ptr(), fields_b.as_ptr()));
        assert_eq!(fields_a[0], fields_b[0]);
    }

    #[test]
    fn test_constructor_runs_once() {
        let ctx = context();
        let Some(ClassHandle::Runtime(class)) = ctx.classpath().find("com.example.Item") else {
            panic!("Expected runtime class");
        };
        let mut calls = 0;
        for _ in 0..3 {
            let _: ClassInfoModel = ctx.pool().get_or_create(&class, (), |_, ()| {
                calls += 1;
                ClassInfoModel::of(&ctx, ClassHandle::Runtime(class.clone()))
            });
        }
        assert_eq!(calls, 1);
    }
}
