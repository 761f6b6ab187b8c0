use super::annotation;
use super::specialized::JSON_VALUE;
use super::{
    get_or_try_init, AnnotationInfoModel, ClassRefSignatureModel, FieldInfoModel,
    MethodInfoModel, ModelContext, TypeParameterModel, TypeScope,
};
use crate::classpath::{is_jdk_class, ClassHandle};
use crate::error::Result;
use crate::metadata::{ClassKind, Modifier};
use crate::parser::ScannedClass;
use crate::runtime::RtClass;
use std::cell::OnceCell;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

enum ClassOrigin {
    Source(Rc<ScannedClass>),
    Reflection(Rc<RtClass>),
}

struct ClassInner {
    origin: ClassOrigin,
    annotations: OnceCell<Vec<AnnotationInfoModel>>,
    fields: OnceCell<Vec<FieldInfoModel>>,
    methods: OnceCell<Vec<MethodInfoModel>>,
    type_parameters: OnceCell<Vec<TypeParameterModel>>,
    superclass: OnceCell<Option<ClassRefSignatureModel>>,
    interfaces: OnceCell<Vec<ClassRefSignatureModel>>,
    inheritance_chain: OnceCell<InheritanceChain>,
}

/// A class, interface, enum or annotation type
#[derive(Clone)]
pub struct ClassInfoModel(Rc<ClassInner>);

impl ClassInfoModel {
    /// Returns the pooled model of a classpath entry
    pub fn of(ctx: &ModelContext, handle: ClassHandle) -> Self {
        match handle {
            ClassHandle::Scanned(class) => ctx.pool().get_or_create(&class, (), |class, ()| {
                Self::new(ClassOrigin::Source(class.clone()))
            }),
            ClassHandle::Runtime(class) => ctx.pool().get_or_create(&class, (), |class, ()| {
                Self::new(ClassOrigin::Reflection(class.clone()))
            }),
        }
    }

    fn new(origin: ClassOrigin) -> Self {
        Self(Rc::new(ClassInner {
            origin,
            annotations: OnceCell::new(),
            fields: OnceCell::new(),
            methods: OnceCell::new(),
            type_parameters: OnceCell::new(),
            superclass: OnceCell::new(),
            interfaces: OnceCell::new(),
            inheritance_chain: OnceCell::new(),
        }))
    }

    /// Binary name, e.g. `com.example.Outer$Inner`
    pub fn name(&self) -> &str {
        match &self.0.origin {
            ClassOrigin::Source(class) => class.name(),
            ClassOrigin::Reflection(class) => &class.name,
        }
    }

    /// Name without package and enclosing classes
    pub fn simple_name(&self) -> &str {
        let name = self.name();
        name.rsplit(['.', '$']).next().unwrap_or(name)
    }

    pub fn package_name(&self) -> &str {
        let name = self.name();
        name.rfind('.').map(|index| &name[..index]).unwrap_or("")
    }

    pub fn kind(&self) -> ClassKind {
        match &self.0.origin {
            ClassOrigin::Source(class) => class.descriptor.kind,
            ClassOrigin::Reflection(class) => class.kind,
        }
    }

    pub fn modifiers(&self) -> &[Modifier] {
        match &self.0.origin {
            ClassOrigin::Source(class) => &class.descriptor.modifiers,
            ClassOrigin::Reflection(class) => &class.modifiers,
        }
    }

    pub fn is_public(&self) -> bool {
        self.modifiers().contains(&Modifier::Public)
    }

    pub fn is_interface(&self) -> bool {
        self.kind() == ClassKind::Interface
    }

    pub fn is_enum(&self) -> bool {
        self.kind() == ClassKind::Enum
    }

    /// Whether the class belongs to the standard library
    pub fn is_jdk(&self) -> bool {
        is_jdk_class(self.name())
    }

    /// Scope for type variables used in class-level signatures
    pub fn scope(&self) -> TypeScope {
        TypeScope::class(self.name())
    }

    pub fn annotations(&self, ctx: &ModelContext) -> &[AnnotationInfoModel] {
        self.0.annotations.get_or_init(|| match &self.0.origin {
            ClassOrigin::Source(class) => class
                .annotations
                .iter()
                .map(|annotation| AnnotationInfoModel::of_source(ctx, annotation))
                .collect(),
            ClassOrigin::Reflection(class) => class
                .annotations
                .iter()
                .map(|annotation| AnnotationInfoModel::of_reflection(ctx, annotation))
                .collect(),
        })
    }

    pub fn find_annotation(&self, ctx: &ModelContext, name: &str) -> Option<&AnnotationInfoModel> {
        annotation::find(self.annotations(ctx), name)
    }

    pub fn has_annotation(&self, ctx: &ModelContext, name: &str) -> bool {
        self.find_annotation(ctx, name).is_some()
    }

    /// Declared fields, in declaration order
    pub fn fields(&self, ctx: &ModelContext) -> &[FieldInfoModel] {
        self.0.fields.get_or_init(|| match &self.0.origin {
            ClassOrigin::Source(class) => class
                .fields
                .iter()
                .map(|field| FieldInfoModel::of_source(ctx, field, class.name()))
                .collect(),
            ClassOrigin::Reflection(class) => class
                .fields
                .iter()
                .map(|field| FieldInfoModel::of_reflection(ctx, field, &class.name))
                .collect(),
        })
    }

    /// Declared methods, in declaration order
    pub fn methods(&self, ctx: &ModelContext) -> &[MethodInfoModel] {
        self.0.methods.get_or_init(|| match &self.0.origin {
            ClassOrigin::Source(class) => class
                .methods
                .iter()
                .map(|method| MethodInfoModel::of_source(ctx, method, class.name()))
                .collect(),
            ClassOrigin::Reflection(class) => class
                .methods
                .iter()
                .map(|method| MethodInfoModel::of_reflection(ctx, method, &class.name))
                .collect(),
        })
    }

    pub fn type_parameters(&self) -> &[TypeParameterModel] {
        self.0.type_parameters.get_or_init(|| {
            let scope = self.scope();
            match &self.0.origin {
                ClassOrigin::Source(class) => class
                    .signature
                    .type_params
                    .iter()
                    .map(|param| TypeParameterModel::of_source(param, &scope))
                    .collect(),
                ClassOrigin::Reflection(class) => class
                    .type_parameters
                    .iter()
                    .map(|param| TypeParameterModel::of_reflection(param, &scope))
                    .collect(),
            }
        })
    }

    pub fn superclass(&self) -> Option<&ClassRefSignatureModel> {
        self.0
            .superclass
            .get_or_init(|| {
                let scope = self.scope();
                match &self.0.origin {
                    ClassOrigin::Source(class) => class
                        .signature
                        .superclass
                        .as_ref()
                        .map(|sig| ClassRefSignatureModel::of_source(sig, &scope)),
                    ClassOrigin::Reflection(class) => class
                        .superclass
                        .as_ref()
                        .map(|ty| ClassRefSignatureModel::of_reflection(ty, &scope)),
                }
            })
            .as_ref()
    }

    pub fn interfaces(&self) -> &[ClassRefSignatureModel] {
        self.0.interfaces.get_or_init(|| {
            let scope = self.scope();
            match &self.0.origin {
                ClassOrigin::Source(class) => class
                    .signature
                    .interfaces
                    .iter()
                    .map(|sig| ClassRefSignatureModel::of_source(sig, &scope))
                    .collect(),
                ClassOrigin::Reflection(class) => class
                    .interfaces
                    .iter()
                    .map(|ty| ClassRefSignatureModel::of_reflection(ty, &scope))
                    .collect(),
            }
        })
    }

    /// Superclass followed by the interfaces
    pub fn supertypes(&self) -> impl Iterator<Item = &ClassRefSignatureModel> {
        self.superclass().into_iter().chain(self.interfaces())
    }

    /// Binary names of directly nested classes
    pub fn inner_classes(&self) -> &[String] {
        match &self.0.origin {
            ClassOrigin::Source(class) => &class.descriptor.inner_classes,
            ClassOrigin::Reflection(class) => &class.declared_classes,
        }
    }

    pub fn outer_class(&self) -> Option<&str> {
        match &self.0.origin {
            ClassOrigin::Source(class) => class.descriptor.outer_class.as_deref(),
            ClassOrigin::Reflection(class) => class.enclosing_class.as_deref(),
        }
    }

    /// Names of the enum constants, in declaration order
    pub fn enum_constants(&self, ctx: &ModelContext) -> Vec<String> {
        self.fields(ctx)
            .iter()
            .filter(|field| field.is_enum_constant())
            .map(|field| field.name().to_string())
            .collect()
    }

    /// The method annotated with `@JsonValue`, which replaces the class in
    /// serialized form
    pub fn json_value_method(&self, ctx: &ModelContext) -> Option<MethodInfoModel> {
        self.methods(ctx)
            .iter()
            .find(|method| annotation::find(method.annotations(ctx), JSON_VALUE).is_some())
            .cloned()
    }

    /// The class and all its non-standard-library supertypes
    pub fn inheritance_chain(&self, ctx: &ModelContext) -> Result<&InheritanceChain> {
        get_or_try_init(&self.0.inheritance_chain, || InheritanceChain::of(ctx, self))
    }

    /// Whether the class is `target` or has it among its supertypes.
    ///
    /// Supertypes missing from the classpath are skipped.
    pub fn is_assignable_to(&self, ctx: &ModelContext, target: &str) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([self.clone()]);
        while let Some(class) = queue.pop_front() {
            if class.name() == target {
                return true;
            }
            if !visited.insert(class.name().to_string()) {
                continue;
            }
            for supertype in class.supertypes() {
                if let Some(next) = ctx.find_class(supertype.name()) {
                    queue.push_back(next);
                }
            }
        }
        false
    }
}

impl PartialEq for ClassInfoModel {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ClassInfoModel {}

impl Hash for ClassInfoModel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for ClassInfoModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassInfoModel").field(&self.name()).finish()
    }
}

/// A class flattened together with its non-standard-library supertypes.
///
/// Breadth-first and deduplicated: the class itself first, then its superclass
/// and interfaces, then theirs.
#[derive(Debug, Clone)]
pub struct InheritanceChain {
    classes: Vec<ClassInfoModel>,
}

impl InheritanceChain {
    fn of(ctx: &ModelContext, class: &ClassInfoModel) -> Result<Self> {
        let mut classes = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([class.clone()]);

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.name().to_string()) {
                continue;
            }
            for supertype in current.supertypes() {
                if is_jdk_class(supertype.name()) {
                    continue;
                }
                if let Some(next) = ctx.class_by_name(supertype.name())? {
                    queue.push_back(next);
                }
            }
            classes.push(current);
        }

        Ok(Self { classes })
    }

    pub fn classes(&self) -> &[ClassInfoModel] {
        &self.classes
    }

    /// Fields of every class in the chain
    pub fn fields(&self, ctx: &ModelContext) -> Vec<FieldInfoModel> {
        self.classes
            .iter()
            .flat_map(|class| class.fields(ctx).iter().cloned())
            .collect()
    }

    /// Methods of every class in the chain
    pub fn methods(&self, ctx: &ModelContext) -> Vec<MethodInfoModel> {
        self.classes
            .iter()
            .flat_map(|class| class.methods(ctx).iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::Classpath;
    use crate::error::Error;
    use crate::parser::DescriptorParser;
    use crate::runtime::{RtClass, RtType, Runtime};
    use std::path::Path;

    fn context(yaml: &str) -> ModelContext {
        let mut classpath = Classpath::with_jdk();
        classpath.extend(DescriptorParser::parse_str(yaml, Path::new("test.yaml")).unwrap());
        ModelContext::new(Rc::new(classpath))
    }

    const HIERARCHY: &str = r#"
classes:
  - name: com.example.Base
    signature: <T:Ljava/lang/Object;>Ljava/lang/Object;
    fields:
      - name: id
        descriptor: Ljava/lang/String;
  - name: com.example.Named
    kind: interface
  - name: com.example.Person
    signature: Lcom/example/Base<Ljava/lang/Long;>;Lcom/example/Named;Ljava/io/Serializable;
    fields:
      - name: name
        descriptor: Ljava/lang/String;
  - name: com.example.Outer$Inner
    outer_class: com.example.Outer
"#;

    #[test]
    fn test_names() {
        let ctx = context(HIERARCHY);
        let inner = ctx.class_by_name("com.example.Outer$Inner").unwrap().unwrap();
        assert_eq!(inner.simple_name(), "Inner");
        assert_eq!(inner.package_name(), "com.example");
        assert_eq!(inner.outer_class(), Some("com.example.Outer"));
    }

    #[test]
    fn test_supertypes_from_signature() {
        let ctx = context(HIERARCHY);
        let person = ctx.class_by_name("com.example.Person").unwrap().unwrap();
        let superclass = person.superclass().unwrap();
        assert_eq!(superclass.to_string(), "com.example.Base<java.lang.Long>");
        let names: Vec<&str> = person.supertypes().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["com.example.Base", "com.example.Named", "java.io.Serializable"]
        );
    }

    #[test]
    fn test_inheritance_chain_skips_jdk_classes() {
        let ctx = context(HIERARCHY);
        let person = ctx.class_by_name("com.example.Person").unwrap().unwrap();
        let chain = person.inheritance_chain(&ctx).unwrap();
        let names: Vec<&str> = chain.classes().iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec!["com.example.Person", "com.example.Base", "com.example.Named"]
        );

        let fields: Vec<String> = chain
            .fields(&ctx)
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        assert_eq!(fields, vec!["name", "id"]);
    }

    #[test]
    fn test_inheritance_chain_reports_missing_superclass() {
        let ctx = context("name: com.example.Orphan\nsuperclass: com.example.Missing\n");
        let orphan = ctx.class_by_name("com.example.Orphan").unwrap().unwrap();
        assert!(matches!(
            orphan.inheritance_chain(&ctx),
            Err(Error::Resolution(name)) if name == "com.example.Missing"
        ));
    }

    #[test]
    fn test_assignability_walks_catalog() {
        let mut runtime = Runtime::with_jdk();
        runtime.register(
            RtClass::new("com.example.Items").extends(RtType::parameterized(
                "java.util.ArrayList",
                vec![RtType::class("com.example.Item")],
            )),
        );
        let ctx = ModelContext::new(Rc::new(Classpath::new(runtime)));
        let items = ctx.class_by_name("com.example.Items").unwrap().unwrap();
        assert!(items.is_assignable_to(&ctx, "java.lang.Iterable"));
        assert!(!items.is_assignable_to(&ctx, "java.util.Map"));
    }

    #[test]
    fn test_enum_constants() {
        let mut runtime = Runtime::with_jdk();
        runtime.register(RtClass::enumeration("com.example.Color", &["RED", "GREEN"]));
        let ctx = ModelContext::new(Rc::new(Classpath::new(runtime)));
        let color = ctx.class_by_name("com.example.Color").unwrap().unwrap();
        assert!(color.is_enum());
        assert_eq!(color.enum_constants(&ctx), vec!["RED", "GREEN"]);
    }
}
