//! Signature models: the sum type at the heart of type resolution.
//!
//! Signatures are built from either backend's type representation (a parsed
//! [`TypeSig`] or a reflective [`RtType`]) and normalized on construction, so two
//! occurrences of the same type compare equal no matter where they came from.

use super::member::MethodOrigin;
use super::specialized::OBJECT;
use super::{ClassInfoModel, ModelContext};
use crate::error::Result;
use crate::runtime::{RtType, RtTypeParameter};
use crate::signature::{BaseType, ClassTypeSig, TypeArg, TypeParamSig, TypeSig, Wildcard};
use std::fmt;

/// Where type variables used by a signature are declared: a class, and
/// optionally one of its methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeScope {
    class: String,
    method: Option<MethodOrigin>,
}

impl TypeScope {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            class: name.into(),
            method: None,
        }
    }

    pub(crate) fn method(class: impl Into<String>, method: MethodOrigin) -> Self {
        Self {
            class: class.into(),
            method: Some(method),
        }
    }

    /// Binary name of the declaring class
    pub fn class_name(&self) -> &str {
        &self.class
    }

    /// Whether the scope's method declares a type variable of this name,
    /// shadowing any class-level one
    pub fn is_method_variable(&self, name: &str) -> bool {
        self.method_type_parameters()
            .iter()
            .any(|parameter| parameter.name() == name)
    }

    /// Type parameters declared by the scope's method, if any
    fn method_type_parameters(&self) -> Vec<TypeParameterModel> {
        match &self.method {
            Some(method) => method.type_parameters(self),
            None => Vec::new(),
        }
    }
}

/// A type signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignatureModel {
    Base(BaseSignatureModel),
    Array(ArraySignatureModel),
    ClassRef(ClassRefSignatureModel),
    TypeVariable(TypeVariableModel),
    TypeArgument(TypeArgumentModel),
    TypeParameter(TypeParameterModel),
}

impl SignatureModel {
    /// Builds a signature from a parsed descriptor signature
    pub fn of_source(sig: &TypeSig, scope: &TypeScope) -> Self {
        match sig {
            TypeSig::Base(base) => SignatureModel::Base(BaseSignatureModel(*base)),
            TypeSig::Array(component) => SignatureModel::Array(ArraySignatureModel {
                component: Box::new(Self::of_source(component, scope)),
            }),
            TypeSig::Class(class) => {
                SignatureModel::ClassRef(ClassRefSignatureModel::of_source(class, scope))
            }
            TypeSig::Variable(name) => SignatureModel::TypeVariable(TypeVariableModel {
                name: name.clone(),
                scope: scope.clone(),
            }),
        }
    }

    /// Builds a signature from a reflective type
    pub fn of_reflection(ty: &RtType, scope: &TypeScope) -> Self {
        match ty {
            RtType::Primitive(base) => SignatureModel::Base(BaseSignatureModel(*base)),
            RtType::Class(_) | RtType::Parameterized { .. } => {
                SignatureModel::ClassRef(ClassRefSignatureModel::of_reflection(ty, scope))
            }
            RtType::Variable(name) => SignatureModel::TypeVariable(TypeVariableModel {
                name: name.clone(),
                scope: scope.clone(),
            }),
            RtType::Wildcard { .. } => {
                SignatureModel::TypeArgument(TypeArgumentModel::of_reflection(ty, scope))
            }
            RtType::Array(component) => SignatureModel::Array(ArraySignatureModel {
                component: Box::new(Self::of_reflection(component, scope)),
            }),
        }
    }

    pub fn as_class_ref(&self) -> Option<&ClassRefSignatureModel> {
        match self {
            SignatureModel::ClassRef(class_ref) => Some(class_ref),
            _ => None,
        }
    }
}

impl fmt::Display for SignatureModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureModel::Base(base) => write!(f, "{}", base.0.java_name()),
            SignatureModel::Array(array) => write!(f, "{}[]", array.component),
            SignatureModel::ClassRef(class_ref) => write!(f, "{}", class_ref),
            SignatureModel::TypeVariable(variable) => write!(f, "{}", variable.name),
            SignatureModel::TypeArgument(argument) => write!(f, "{}", argument),
            SignatureModel::TypeParameter(parameter) => write!(f, "{}", parameter),
        }
    }
}

/// A primitive type or `void`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaseSignatureModel(pub BaseType);

impl BaseSignatureModel {
    pub fn base_type(&self) -> BaseType {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArraySignatureModel {
    component: Box<SignatureModel>,
}

impl ArraySignatureModel {
    pub fn new(component: SignatureModel) -> Self {
        Self {
            component: Box::new(component),
        }
    }

    pub fn component(&self) -> &SignatureModel {
        &self.component
    }
}

/// A reference to a class, with type arguments and the owner type of a nested
/// generic class
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassRefSignatureModel {
    name: String,
    type_arguments: Vec<TypeArgumentModel>,
    owner: Option<Box<ClassRefSignatureModel>>,
}

impl ClassRefSignatureModel {
    /// A raw reference to the class with the given binary name
    pub fn raw(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_arguments: Vec::new(),
            owner: None,
        }
    }

    pub fn of_source(sig: &ClassTypeSig, scope: &TypeScope) -> Self {
        Self {
            name: sig.name.clone(),
            type_arguments: sig
                .type_args
                .iter()
                .map(|arg| TypeArgumentModel::of_source(arg, scope))
                .collect(),
            owner: sig
                .owner
                .as_ref()
                .map(|owner| Box::new(Self::of_source(owner, scope))),
        }
    }

    /// Builds a reference from a class or parameterized type; other reflective
    /// types produce a raw `java.lang.Object` reference
    pub fn of_reflection(ty: &RtType, scope: &TypeScope) -> Self {
        match ty {
            RtType::Class(name) => Self::raw(name.clone()),
            RtType::Parameterized { raw, args, owner } => Self {
                name: raw.clone(),
                type_arguments: args
                    .iter()
                    .map(|arg| TypeArgumentModel::of_reflection(arg, scope))
                    .collect(),
                owner: owner
                    .as_deref()
                    .map(|owner| Box::new(Self::of_reflection(owner, scope))),
            },
            _ => Self::raw(OBJECT),
        }
    }

    /// Binary name of the referenced class
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_arguments(&self) -> &[TypeArgumentModel] {
        &self.type_arguments
    }

    pub fn owner(&self) -> Option<&ClassRefSignatureModel> {
        self.owner.as_deref()
    }

    /// The same reference pointing at another class, keeping the type arguments
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_arguments: self.type_arguments.clone(),
            owner: None,
        }
    }

    /// The same reference with its type arguments replaced
    pub fn with_arguments(&self, type_arguments: Vec<TypeArgumentModel>) -> Self {
        Self {
            name: self.name.clone(),
            type_arguments,
            owner: self.owner.clone(),
        }
    }

    /// The referenced class, `None` for standard-library classes outside the
    /// catalog
    pub fn class_info(&self, ctx: &ModelContext) -> Result<Option<ClassInfoModel>> {
        ctx.class_by_name(&self.name)
    }
}

impl fmt::Display for ClassRefSignatureModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.type_arguments.is_empty() {
            write!(f, "<")?;
            for (index, argument) in self.type_arguments.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", argument)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

/// A type argument at a generic usage site
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeArgumentModel {
    wildcard: Wildcard,
    associated: Option<Box<SignatureModel>>,
}

impl TypeArgumentModel {
    pub fn new(wildcard: Wildcard, associated: Option<SignatureModel>) -> Self {
        Self::normalized(wildcard, associated)
    }

    pub fn of_source(arg: &TypeArg, scope: &TypeScope) -> Self {
        let associated = arg
            .bound
            .as_ref()
            .map(|bound| SignatureModel::of_source(bound, scope));
        Self::normalized(arg.wildcard, associated)
    }

    pub fn of_reflection(ty: &RtType, scope: &TypeScope) -> Self {
        match ty {
            RtType::Wildcard { upper, lower } => match (lower.first(), upper.first()) {
                (Some(lower), _) => Self::normalized(
                    Wildcard::Super,
                    Some(SignatureModel::of_reflection(lower, scope)),
                ),
                (None, Some(upper)) => Self::normalized(
                    Wildcard::Extends,
                    Some(SignatureModel::of_reflection(upper, scope)),
                ),
                (None, None) => Self::normalized(Wildcard::Any, None),
            },
            _ => Self::normalized(Wildcard::None, Some(SignatureModel::of_reflection(ty, scope))),
        }
    }

    /// `? extends Object` is the same argument as `?`
    fn normalized(wildcard: Wildcard, associated: Option<SignatureModel>) -> Self {
        let unbounded = wildcard == Wildcard::Extends
            && matches!(
                &associated,
                Some(SignatureModel::ClassRef(class_ref)) if class_ref.name == OBJECT
            );
        if unbounded {
            return Self {
                wildcard: Wildcard::Any,
                associated: None,
            };
        }
        Self {
            wildcard,
            associated: associated.map(Box::new),
        }
    }

    pub fn wildcard(&self) -> Wildcard {
        self.wildcard
    }

    /// The argument type, or the wildcard bound
    pub fn associated_type(&self) -> Option<&SignatureModel> {
        self.associated.as_deref()
    }
}

impl fmt::Display for TypeArgumentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.wildcard, &self.associated) {
            (Wildcard::Any, _) | (_, None) => write!(f, "?"),
            (Wildcard::Extends, Some(bound)) => write!(f, "? extends {}", bound),
            (Wildcard::Super, Some(bound)) => write!(f, "? super {}", bound),
            (Wildcard::None, Some(bound)) => write!(f, "{}", bound),
        }
    }
}

/// A usage of a type variable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeVariableModel {
    name: String,
    scope: TypeScope,
}

impl TypeVariableModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &TypeScope {
        &self.scope
    }

    /// Finds the declaring type parameter.
    ///
    /// Searches the declaring method, then the declaring class, then the classes
    /// enclosing it.
    pub fn resolve(&self, ctx: &ModelContext) -> Result<Option<TypeParameterModel>> {
        if let Some(parameter) = self
            .scope
            .method_type_parameters()
            .into_iter()
            .find(|parameter| parameter.name == self.name)
        {
            return Ok(Some(parameter));
        }

        let mut current = ctx.class_by_name(&self.scope.class)?;
        while let Some(class) = current {
            if let Some(parameter) = class
                .type_parameters()
                .iter()
                .find(|parameter| parameter.name == self.name)
            {
                return Ok(Some(parameter.clone()));
            }
            current = match class.outer_class() {
                Some(outer) => ctx.class_by_name(outer)?,
                None => None,
            };
        }
        Ok(None)
    }
}

/// A generic type parameter declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeParameterModel {
    name: String,
    bounds: Vec<SignatureModel>,
}

impl TypeParameterModel {
    pub fn of_source(param: &TypeParamSig, scope: &TypeScope) -> Self {
        Self {
            name: param.name.clone(),
            bounds: param
                .bounds()
                .map(|bound| SignatureModel::of_source(bound, scope))
                .collect(),
        }
    }

    pub fn of_reflection(param: &RtTypeParameter, scope: &TypeScope) -> Self {
        Self {
            name: param.name.clone(),
            bounds: param
                .bounds
                .iter()
                .map(|bound| SignatureModel::of_reflection(bound, scope))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> &[SignatureModel] {
        &self.bounds
    }

    /// The first bound other than `java.lang.Object`
    pub fn effective_bound(&self) -> Option<&SignatureModel> {
        self.bounds.iter().find(|bound| {
            !matches!(bound, SignatureModel::ClassRef(class_ref) if class_ref.name == OBJECT)
        })
    }
}

impl fmt::Display for TypeParameterModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(bound) = self.effective_bound() {
            write!(f, " extends {}", bound)?;
        }
        Ok(())
    }
}
