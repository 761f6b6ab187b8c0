use super::{
    AnnotationInfoModel, ModelContext, SignatureModel, TypeParameterModel, TypeScope,
};
use crate::metadata::Modifier;
use crate::parser::{ScannedField, ScannedMethod, ScannedParameter};
use crate::runtime::{RtField, RtMethod, RtParameter};
use crate::signature::BaseType;
use std::cell::OnceCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

fn annotations_of(
    ctx: &ModelContext,
    source: &[Rc<crate::metadata::AnnotationDescriptor>],
) -> Vec<AnnotationInfoModel> {
    source
        .iter()
        .map(|annotation| AnnotationInfoModel::of_source(ctx, annotation))
        .collect()
}

fn runtime_annotations_of(
    ctx: &ModelContext,
    source: &[Rc<crate::runtime::RtAnnotation>],
) -> Vec<AnnotationInfoModel> {
    source
        .iter()
        .map(|annotation| AnnotationInfoModel::of_reflection(ctx, annotation))
        .collect()
}

enum FieldOrigin {
    Source(Rc<ScannedField>),
    Reflection(Rc<RtField>),
}

struct FieldInner {
    origin: FieldOrigin,
    owner: String,
    annotations: OnceCell<Vec<AnnotationInfoModel>>,
    signature: OnceCell<SignatureModel>,
}

/// A field of a class
#[derive(Clone)]
pub struct FieldInfoModel(Rc<FieldInner>);

impl FieldInfoModel {
    pub(crate) fn of_source(ctx: &ModelContext, field: &Rc<ScannedField>, owner: &str) -> Self {
        ctx.pool().get_or_create(field, owner, |field, owner| {
            Self::new(FieldOrigin::Source(field.clone()), owner)
        })
    }

    pub(crate) fn of_reflection(ctx: &ModelContext, field: &Rc<RtField>, owner: &str) -> Self {
        ctx.pool().get_or_create(field, owner, |field, owner| {
            Self::new(FieldOrigin::Reflection(field.clone()), owner)
        })
    }

    fn new(origin: FieldOrigin, owner: &str) -> Self {
        Self(Rc::new(FieldInner {
            origin,
            owner: owner.to_string(),
            annotations: OnceCell::new(),
            signature: OnceCell::new(),
        }))
    }

    pub fn name(&self) -> &str {
        match &self.0.origin {
            FieldOrigin::Source(field) => &field.descriptor.name,
            FieldOrigin::Reflection(field) => &field.name,
        }
    }

    /// Binary name of the declaring class
    pub fn owner(&self) -> &str {
        &self.0.owner
    }

    pub fn modifiers(&self) -> &[Modifier] {
        match &self.0.origin {
            FieldOrigin::Source(field) => &field.descriptor.modifiers,
            FieldOrigin::Reflection(field) => &field.modifiers,
        }
    }

    pub fn is_public(&self) -> bool {
        self.modifiers().contains(&Modifier::Public)
    }

    pub fn is_static(&self) -> bool {
        self.modifiers().contains(&Modifier::Static)
    }

    pub fn is_transient(&self) -> bool {
        self.modifiers().contains(&Modifier::Transient)
    }

    pub fn is_synthetic(&self) -> bool {
        self.modifiers().contains(&Modifier::Synthetic)
    }

    pub fn is_enum_constant(&self) -> bool {
        self.modifiers().contains(&Modifier::Enum)
    }

    pub fn annotations(&self, ctx: &ModelContext) -> &[AnnotationInfoModel] {
        self.0.annotations.get_or_init(|| match &self.0.origin {
            FieldOrigin::Source(field) => annotations_of(ctx, &field.annotations),
            FieldOrigin::Reflection(field) => runtime_annotations_of(ctx, &field.annotations),
        })
    }

    pub fn signature(&self) -> &SignatureModel {
        self.0.signature.get_or_init(|| {
            let scope = TypeScope::class(self.owner());
            match &self.0.origin {
                FieldOrigin::Source(field) => SignatureModel::of_source(&field.signature, &scope),
                FieldOrigin::Reflection(field) => SignatureModel::of_reflection(&field.ty, &scope),
            }
        })
    }
}

/// The entity behind a method model; also names the method in a [`TypeScope`]
#[derive(Clone)]
pub(crate) enum MethodOrigin {
    Source(Rc<ScannedMethod>),
    Reflection(Rc<RtMethod>),
}

impl MethodOrigin {
    fn address(&self) -> usize {
        match self {
            MethodOrigin::Source(method) => Rc::as_ptr(method) as *const () as usize,
            MethodOrigin::Reflection(method) => Rc::as_ptr(method) as *const () as usize,
        }
    }

    fn name(&self) -> &str {
        match self {
            MethodOrigin::Source(method) => &method.descriptor.name,
            MethodOrigin::Reflection(method) => &method.name,
        }
    }

    pub(crate) fn type_parameters(&self, scope: &TypeScope) -> Vec<TypeParameterModel> {
        match self {
            MethodOrigin::Source(method) => method
                .signature
                .type_params
                .iter()
                .map(|param| TypeParameterModel::of_source(param, scope))
                .collect(),
            MethodOrigin::Reflection(method) => method
                .type_parameters
                .iter()
                .map(|param| TypeParameterModel::of_reflection(param, scope))
                .collect(),
        }
    }
}

impl PartialEq for MethodOrigin {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for MethodOrigin {}

impl Hash for MethodOrigin {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl fmt::Debug for MethodOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", self.name())
    }
}

struct MethodInner {
    origin: MethodOrigin,
    owner: String,
    annotations: OnceCell<Vec<AnnotationInfoModel>>,
    parameters: OnceCell<Vec<MethodParameterInfoModel>>,
    result: OnceCell<SignatureModel>,
    type_parameters: OnceCell<Vec<TypeParameterModel>>,
}

/// A method of a class
#[derive(Clone)]
pub struct MethodInfoModel(Rc<MethodInner>);

impl MethodInfoModel {
    pub(crate) fn of_source(ctx: &ModelContext, method: &Rc<ScannedMethod>, owner: &str) -> Self {
        ctx.pool().get_or_create(method, owner, |method, owner| {
            Self::new(MethodOrigin::Source(method.clone()), owner)
        })
    }

    pub(crate) fn of_reflection(ctx: &ModelContext, method: &Rc<RtMethod>, owner: &str) -> Self {
        ctx.pool().get_or_create(method, owner, |method, owner| {
            Self::new(MethodOrigin::Reflection(method.clone()), owner)
        })
    }

    fn new(origin: MethodOrigin, owner: &str) -> Self {
        Self(Rc::new(MethodInner {
            origin,
            owner: owner.to_string(),
            annotations: OnceCell::new(),
            parameters: OnceCell::new(),
            result: OnceCell::new(),
            type_parameters: OnceCell::new(),
        }))
    }

    pub fn name(&self) -> &str {
        self.0.origin.name()
    }

    /// Binary name of the declaring class
    pub fn owner(&self) -> &str {
        &self.0.owner
    }

    /// Scope for type variables used in this method's signature
    pub fn scope(&self) -> TypeScope {
        TypeScope::method(self.owner(), self.0.origin.clone())
    }

    pub fn modifiers(&self) -> &[Modifier] {
        match &self.0.origin {
            MethodOrigin::Source(method) => &method.descriptor.modifiers,
            MethodOrigin::Reflection(method) => &method.modifiers,
        }
    }

    pub fn is_public(&self) -> bool {
        self.modifiers().contains(&Modifier::Public)
    }

    pub fn is_static(&self) -> bool {
        self.modifiers().contains(&Modifier::Static)
    }

    pub fn is_synthetic(&self) -> bool {
        self.modifiers().contains(&Modifier::Synthetic)
    }

    pub fn is_bridge(&self) -> bool {
        self.modifiers().contains(&Modifier::Bridge)
    }

    pub fn annotations(&self, ctx: &ModelContext) -> &[AnnotationInfoModel] {
        self.0.annotations.get_or_init(|| match &self.0.origin {
            MethodOrigin::Source(method) => annotations_of(ctx, &method.annotations),
            MethodOrigin::Reflection(method) => runtime_annotations_of(ctx, &method.annotations),
        })
    }

    pub fn parameters(&self, ctx: &ModelContext) -> &[MethodParameterInfoModel] {
        self.0.parameters.get_or_init(|| {
            let scope = self.scope();
            match &self.0.origin {
                MethodOrigin::Source(method) => method
                    .parameters
                    .iter()
                    .map(|param| MethodParameterInfoModel::of_source(ctx, param, &scope))
                    .collect(),
                MethodOrigin::Reflection(method) => method
                    .parameters
                    .iter()
                    .enumerate()
                    .map(|(index, param)| {
                        MethodParameterInfoModel::of_reflection(ctx, param, index, &scope)
                    })
                    .collect(),
            }
        })
    }

    pub fn result_type(&self) -> &SignatureModel {
        self.0.result.get_or_init(|| {
            let scope = self.scope();
            match &self.0.origin {
                MethodOrigin::Source(method) => {
                    SignatureModel::of_source(&method.signature.result, &scope)
                }
                MethodOrigin::Reflection(method) => {
                    SignatureModel::of_reflection(&method.result, &scope)
                }
            }
        })
    }

    pub fn is_void(&self) -> bool {
        matches!(
            self.result_type(),
            SignatureModel::Base(base) if base.base_type() == BaseType::Void
        )
    }

    pub fn type_parameters(&self) -> &[TypeParameterModel] {
        self.0
            .type_parameters
            .get_or_init(|| self.0.origin.type_parameters(&self.scope()))
    }
}

enum ParameterOrigin {
    Source(Rc<ScannedParameter>),
    Reflection { param: Rc<RtParameter>, index: usize },
}

struct ParameterInner {
    origin: ParameterOrigin,
    scope: TypeScope,
    annotations: OnceCell<Vec<AnnotationInfoModel>>,
    signature: OnceCell<SignatureModel>,
}

/// A parameter of a method
#[derive(Clone)]
pub struct MethodParameterInfoModel(Rc<ParameterInner>);

impl MethodParameterInfoModel {
    fn of_source(ctx: &ModelContext, param: &Rc<ScannedParameter>, scope: &TypeScope) -> Self {
        ctx.pool().get_or_create(param, scope, |param, scope| {
            Self::new(ParameterOrigin::Source(param.clone()), scope.clone())
        })
    }

    fn of_reflection(
        ctx: &ModelContext,
        param: &Rc<RtParameter>,
        index: usize,
        scope: &TypeScope,
    ) -> Self {
        ctx.pool().get_or_create(param, scope, |param, scope| {
            Self::new(
                ParameterOrigin::Reflection {
                    param: param.clone(),
                    index,
                },
                scope.clone(),
            )
        })
    }

    fn new(origin: ParameterOrigin, scope: TypeScope) -> Self {
        Self(Rc::new(ParameterInner {
            origin,
            scope,
            annotations: OnceCell::new(),
            signature: OnceCell::new(),
        }))
    }

    pub fn name(&self) -> &str {
        match &self.0.origin {
            ParameterOrigin::Source(param) => &param.name,
            ParameterOrigin::Reflection { param, .. } => &param.name,
        }
    }

    /// Position in the parameter list
    pub fn index(&self) -> usize {
        match &self.0.origin {
            ParameterOrigin::Source(param) => param.index,
            ParameterOrigin::Reflection { index, .. } => *index,
        }
    }

    /// Binary name of the class declaring the method
    pub fn owner(&self) -> &str {
        self.0.scope.class_name()
    }

    pub fn annotations(&self, ctx: &ModelContext) -> &[AnnotationInfoModel] {
        self.0.annotations.get_or_init(|| match &self.0.origin {
            ParameterOrigin::Source(param) => annotations_of(ctx, &param.annotations),
            ParameterOrigin::Reflection { param, .. } => {
                runtime_annotations_of(ctx, &param.annotations)
            }
        })
    }

    pub fn signature(&self) -> &SignatureModel {
        self.0.signature.get_or_init(|| match &self.0.origin {
            ParameterOrigin::Source(param) => {
                SignatureModel::of_source(&param.signature, &self.0.scope)
            }
            ParameterOrigin::Reflection { param, .. } => {
                SignatureModel::of_reflection(&param.ty, &self.0.scope)
            }
        })
    }
}

macro_rules! identity_eq {
    ($model:ident, $label:literal) => {
        impl PartialEq for $model {
            fn eq(&self, other: &Self) -> bool {
                Rc::ptr_eq(&self.0, &other.0)
            }
        }

        impl Eq for $model {}

        impl Hash for $model {
            fn hash<H: Hasher>(&self, state: &mut H) {
                (Rc::as_ptr(&self.0) as usize).hash(state);
            }
        }

        impl fmt::Debug for $model {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({}.{})"), self.owner(), self.name())
            }
        }
    };
}

identity_eq!(FieldInfoModel, "Field");
identity_eq!(MethodInfoModel, "Method");
identity_eq!(MethodParameterInfoModel, "MethodParameter");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::Classpath;
    use crate::parser::DescriptorParser;
    use crate::runtime::{RtClass, RtType, Runtime};
    use std::path::Path;

    fn context(yaml: &str, runtime: Runtime) -> ModelContext {
        let mut classpath = Classpath::new(runtime);
        classpath.extend(DescriptorParser::parse_str(yaml, Path::new("test.yaml")).unwrap());
        ModelContext::new(Rc::new(classpath))
    }

    #[test]
    fn test_source_method_members() {
        let ctx = context(
            r#"
name: com.example.Greeter
methods:
  - name: greet
    descriptor: (Ljava/lang/String;)Ljava/lang/String;
    modifiers: [public]
    parameters:
      - name: name
  - name: reset
    descriptor: ()V
    modifiers: [public, static]
"#,
            Runtime::with_jdk(),
        );
        let class = ctx.class_by_name("com.example.Greeter").unwrap().unwrap();
        let methods = class.methods(&ctx);
        assert_eq!(methods.len(), 2);

        let greet = &methods[0];
        assert_eq!(greet.owner(), "com.example.Greeter");
        assert!(greet.is_public());
        assert!(!greet.is_void());
        assert_eq!(greet.result_type().to_string(), "java.lang.String");

        let params = greet.parameters(&ctx);
        assert_eq!(params[0].name(), "name");
        assert_eq!(params[0].index(), 0);
        assert_eq!(params[0].signature().to_string(), "java.lang.String");

        assert!(methods[1].is_static());
        assert!(methods[1].is_void());
    }

    #[test]
    fn test_reflection_field_members() {
        let mut runtime = Runtime::with_jdk();
        runtime.register(
            RtClass::new("com.example.Item")
                .field(RtField::new("id", RtType::class("java.lang.String")))
                .field(
                    RtField::new("cache", RtType::class("java.lang.Object"))
                        .with_modifiers(vec![Modifier::Private, Modifier::Transient]),
                ),
        );
        let ctx = context("classes: []\n", runtime);
        let class = ctx.class_by_name("com.example.Item").unwrap().unwrap();
        let fields = class.fields(&ctx);

        assert_eq!(fields[0].name(), "id");
        assert_eq!(fields[0].owner(), "com.example.Item");
        assert!(!fields[0].is_transient());
        assert!(fields[1].is_transient());
        assert_eq!(format!("{:?}", fields[0]), "Field(com.example.Item.id)");
    }

    #[test]
    fn test_method_type_variables_resolve_to_method_parameters() {
        let ctx = context(
            r#"
name: com.example.Box
signature: <T:Ljava/lang/Object;>Ljava/lang/Object;
methods:
  - name: convert
    descriptor: (Ljava/lang/Object;)Ljava/lang/Object;
    signature: <R:Ljava/lang/Number;>(TT;)TR;
    modifiers: [public]
"#,
            Runtime::with_jdk(),
        );
        let class = ctx.class_by_name("com.example.Box").unwrap().unwrap();
        let method = &class.methods(&ctx)[0];

        let SignatureModel::TypeVariable(result) = method.result_type() else {
            panic!("Expected type variable");
        };
        let declared = result.resolve(&ctx).unwrap().unwrap();
        assert_eq!(declared.name(), "R");
        assert_eq!(declared.bounds()[0].to_string(), "java.lang.Number");

        let SignatureModel::TypeVariable(param) = method.parameters(&ctx)[0].signature() else {
            panic!("Expected type variable");
        };
        assert_eq!(param.resolve(&ctx).unwrap().unwrap().name(), "T");
    }
}
