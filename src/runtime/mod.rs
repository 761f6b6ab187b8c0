//! Live type registry: the reflection backend.
//!
//! Where descriptors describe classes as serialized byte-code metadata, the
//! runtime holds class objects that host code registers directly, the way a
//! running program exposes its loaded classes through reflection. Types are
//! reflective values ([`RtType`]) and annotation members are read by invoking
//! accessors, which may fail.
//!
//! ```
//! use openapi_from_classes::runtime::{RtAnnotation, RtClass, RtMethod, RtType, Runtime};
//!
//! let mut runtime = Runtime::with_jdk();
//! runtime.register(
//!     RtClass::new("com.example.Greeter")
//!         .annotated(RtAnnotation::new("com.example.Endpoint"))
//!         .method(RtMethod::new("greet", RtType::class("java.lang.String"))
//!             .param("name", RtType::class("java.lang.String"))),
//! );
//! assert!(runtime.class_for_name("com.example.Greeter").is_some());
//! ```

pub mod jdk;

use crate::metadata::{AnnotationValue, ClassKind, Modifier};
use crate::signature::BaseType;
use log::warn;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A reflective type value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RtType {
    Primitive(BaseType),
    /// A raw class reference
    Class(String),
    Parameterized {
        raw: String,
        args: Vec<RtType>,
        owner: Option<Box<RtType>>,
    },
    /// Usage of a type variable
    Variable(String),
    Wildcard {
        upper: Vec<RtType>,
        lower: Vec<RtType>,
    },
    Array(Box<RtType>),
}

impl RtType {
    pub fn class(name: impl Into<String>) -> Self {
        RtType::Class(name.into())
    }

    pub fn primitive(base: BaseType) -> Self {
        RtType::Primitive(base)
    }

    pub fn parameterized(raw: impl Into<String>, args: Vec<RtType>) -> Self {
        RtType::Parameterized {
            raw: raw.into(),
            args,
            owner: None,
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        RtType::Variable(name.into())
    }

    /// `?`
    pub fn wildcard() -> Self {
        RtType::Wildcard {
            upper: Vec::new(),
            lower: Vec::new(),
        }
    }

    /// `? extends bound`
    pub fn extends(bound: RtType) -> Self {
        RtType::Wildcard {
            upper: vec![bound],
            lower: Vec::new(),
        }
    }

    /// `? super bound`
    pub fn super_of(bound: RtType) -> Self {
        RtType::Wildcard {
            upper: Vec::new(),
            lower: vec![bound],
        }
    }

    pub fn array_of(component: RtType) -> Self {
        RtType::Array(Box::new(component))
    }
}

/// A generic type parameter declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtTypeParameter {
    pub name: String,
    pub bounds: Vec<RtType>,
}

impl RtTypeParameter {
    pub fn new(name: impl Into<String>, bounds: Vec<RtType>) -> Self {
        Self {
            name: name.into(),
            bounds,
        }
    }
}

type Accessor = Rc<dyn Fn() -> std::result::Result<AnnotationValue, String>>;

/// A member of an annotation instance, read through its accessor
#[derive(Clone)]
pub struct RtAnnotationMember {
    pub name: String,
    accessor: Accessor,
}

impl RtAnnotationMember {
    /// Reads the member value; fails if the accessor fails
    pub fn invoke(&self) -> std::result::Result<AnnotationValue, String> {
        (self.accessor)()
    }
}

impl fmt::Debug for RtAnnotationMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtAnnotationMember")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// An annotation instance
#[derive(Debug, Clone)]
pub struct RtAnnotation {
    pub name: String,
    members: Vec<RtAnnotationMember>,
}

impl RtAnnotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Adds a member with a constant value
    pub fn with_value(self, member: impl Into<String>, value: AnnotationValue) -> Self {
        self.with_accessor(member, move || Ok(value.clone()))
    }

    /// Adds a member whose value is produced by invoking `accessor`
    pub fn with_accessor<F>(mut self, member: impl Into<String>, accessor: F) -> Self
    where
        F: Fn() -> std::result::Result<AnnotationValue, String> + 'static,
    {
        self.members.push(RtAnnotationMember {
            name: member.into(),
            accessor: Rc::new(accessor),
        });
        self
    }

    pub fn members(&self) -> &[RtAnnotationMember] {
        &self.members
    }
}

#[derive(Debug, Clone)]
pub struct RtField {
    pub name: String,
    pub ty: RtType,
    pub modifiers: Vec<Modifier>,
    pub annotations: Vec<Rc<RtAnnotation>>,
}

impl RtField {
    pub fn new(name: impl Into<String>, ty: RtType) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers: vec![Modifier::Private],
            annotations: Vec::new(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Vec<Modifier>) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn annotated(mut self, annotation: RtAnnotation) -> Self {
        self.annotations.push(Rc::new(annotation));
        self
    }
}

#[derive(Debug, Clone)]
pub struct RtParameter {
    pub name: String,
    pub ty: RtType,
    pub annotations: Vec<Rc<RtAnnotation>>,
}

impl RtParameter {
    pub fn new(name: impl Into<String>, ty: RtType) -> Self {
        Self {
            name: name.into(),
            ty,
            annotations: Vec::new(),
        }
    }

    pub fn annotated(mut self, annotation: RtAnnotation) -> Self {
        self.annotations.push(Rc::new(annotation));
        self
    }
}

#[derive(Debug, Clone)]
pub struct RtMethod {
    pub name: String,
    pub type_parameters: Vec<RtTypeParameter>,
    pub parameters: Vec<Rc<RtParameter>>,
    pub result: RtType,
    pub modifiers: Vec<Modifier>,
    pub annotations: Vec<Rc<RtAnnotation>>,
}

impl RtMethod {
    /// A public instance method
    pub fn new(name: impl Into<String>, result: RtType) -> Self {
        Self {
            name: name.into(),
            type_parameters: Vec::new(),
            parameters: Vec::new(),
            result,
            modifiers: vec![Modifier::Public],
            annotations: Vec::new(),
        }
    }

    pub fn param(self, name: impl Into<String>, ty: RtType) -> Self {
        self.parameter(RtParameter::new(name, ty))
    }

    pub fn parameter(mut self, parameter: RtParameter) -> Self {
        self.parameters.push(Rc::new(parameter));
        self
    }

    pub fn type_parameter(mut self, parameter: RtTypeParameter) -> Self {
        self.type_parameters.push(parameter);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Vec<Modifier>) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn annotated(mut self, annotation: RtAnnotation) -> Self {
        self.annotations.push(Rc::new(annotation));
        self
    }
}

/// A live class object
#[derive(Debug, Clone)]
pub struct RtClass {
    pub name: String,
    pub kind: ClassKind,
    pub modifiers: Vec<Modifier>,
    pub type_parameters: Vec<RtTypeParameter>,
    pub superclass: Option<RtType>,
    pub interfaces: Vec<RtType>,
    pub fields: Vec<Rc<RtField>>,
    pub methods: Vec<Rc<RtMethod>>,
    pub annotations: Vec<Rc<RtAnnotation>>,
    pub declared_classes: Vec<String>,
    pub enclosing_class: Option<String>,
}

impl RtClass {
    /// A public class extending `java.lang.Object`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let superclass = if name == "java.lang.Object" {
            None
        } else {
            Some(RtType::class("java.lang.Object"))
        };
        Self {
            name,
            kind: ClassKind::Class,
            modifiers: vec![Modifier::Public],
            type_parameters: Vec::new(),
            superclass,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
            declared_classes: Vec::new(),
            enclosing_class: None,
        }
    }

    /// A public interface
    pub fn interface(name: impl Into<String>) -> Self {
        let mut class = Self::new(name);
        class.kind = ClassKind::Interface;
        class.modifiers.push(Modifier::Abstract);
        class.superclass = None;
        class
    }

    /// A public enum with the given constants
    pub fn enumeration(name: impl Into<String>, constants: &[&str]) -> Self {
        let mut class = Self::new(name);
        class.kind = ClassKind::Enum;
        class.superclass = Some(RtType::parameterized(
            "java.lang.Enum",
            vec![RtType::class(class.name.clone())],
        ));
        for constant in constants {
            class.fields.push(Rc::new(
                RtField::new(*constant, RtType::class(class.name.clone())).with_modifiers(vec![
                    Modifier::Public,
                    Modifier::Static,
                    Modifier::Final,
                    Modifier::Enum,
                ]),
            ));
        }
        class
    }

    pub fn with_modifiers(mut self, modifiers: Vec<Modifier>) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn type_parameter(mut self, parameter: RtTypeParameter) -> Self {
        self.type_parameters.push(parameter);
        self
    }

    pub fn extends(mut self, superclass: RtType) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn implements(mut self, interface: RtType) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn field(mut self, field: RtField) -> Self {
        self.fields.push(Rc::new(field));
        self
    }

    pub fn method(mut self, method: RtMethod) -> Self {
        self.methods.push(Rc::new(method));
        self
    }

    pub fn annotated(mut self, annotation: RtAnnotation) -> Self {
        self.annotations.push(Rc::new(annotation));
        self
    }

    pub fn nested(mut self, name: impl Into<String>) -> Self {
        self.declared_classes.push(name.into());
        self
    }

    pub fn enclosed_by(mut self, name: impl Into<String>) -> Self {
        self.enclosing_class = Some(name.into());
        self
    }
}

/// Registry of live classes, looked up by binary name
#[derive(Debug, Default)]
pub struct Runtime {
    classes: HashMap<String, Rc<RtClass>>,
}

impl Runtime {
    /// An empty runtime
    pub fn new() -> Self {
        Self::default()
    }

    /// A runtime with the standard-library catalog registered
    pub fn with_jdk() -> Self {
        let mut runtime = Self::new();
        jdk::register(&mut runtime);
        runtime
    }

    /// Registers a class, replacing any class with the same name
    pub fn register(&mut self, class: RtClass) -> Rc<RtClass> {
        let class = Rc::new(class);
        if self
            .classes
            .insert(class.name.clone(), class.clone())
            .is_some()
        {
            warn!("Runtime class {} registered twice, keeping the latest", class.name);
        }
        class
    }

    pub fn class_for_name(&self, name: &str) -> Option<Rc<RtClass>> {
        self.classes.get(name).cloned()
    }

    /// Names of all registered classes, sorted
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut runtime = Runtime::new();
        runtime.register(RtClass::new("com.example.A"));
        assert!(runtime.class_for_name("com.example.A").is_some());
        assert!(runtime.class_for_name("com.example.B").is_none());
        assert_eq!(runtime.len(), 1);
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut runtime = Runtime::new();
        runtime.register(RtClass::new("com.example.A"));
        runtime.register(RtClass::interface("com.example.A"));
        let class = runtime.class_for_name("com.example.A").unwrap();
        assert_eq!(class.kind, ClassKind::Interface);
    }

    #[test]
    fn test_enumeration_builder() {
        let class = RtClass::enumeration("com.example.Color", &["RED", "GREEN"]);
        assert_eq!(class.kind, ClassKind::Enum);
        assert_eq!(class.fields.len(), 2);
        assert!(class.fields[0].modifiers.contains(&Modifier::Enum));
        assert_eq!(
            class.superclass,
            Some(RtType::parameterized(
                "java.lang.Enum",
                vec![RtType::class("com.example.Color")]
            ))
        );
    }

    #[test]
    fn test_annotation_accessors() {
        let annotation = RtAnnotation::new("com.example.Endpoint")
            .with_value("value", AnnotationValue::String("greeting".to_string()))
            .with_accessor("broken", || Err("member threw".to_string()));

        assert_eq!(
            annotation.members()[0].invoke(),
            Ok(AnnotationValue::String("greeting".to_string()))
        );
        assert_eq!(annotation.members()[1].invoke(), Err("member threw".to_string()));
    }

    #[test]
    fn test_class_names_are_sorted() {
        let mut runtime = Runtime::new();
        runtime.register(RtClass::new("b.B"));
        runtime.register(RtClass::new("a.A"));
        assert_eq!(runtime.class_names(), vec!["a.A", "b.B"]);
    }
}
