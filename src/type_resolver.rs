use crate::error::Result;
use crate::model::{
    ArraySignatureModel, ClassRefSignatureModel, ModelContext, SignatureModel, TypeArgumentModel,
    TypeVariableModel,
};
use crate::node::{NodeId, NodeSource, NodeTree};
use crate::signature::Wildcard;
use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};

/// Type resolver - substitutes type variables with the arguments bound to them
///
/// Two kinds of binding are handled:
///
/// - along a node path, where an exposed or non-exposed ancestor of an endpoint
///   sits below the supertype reference that binds its type parameters;
/// - along the supertypes of a class, to find what a parameterized class binds
///   for `Iterable` or `Map`.
pub struct TypeResolver<'a> {
    ctx: &'a ModelContext,
}

type Bindings<'b> = HashMap<&'b str, &'b TypeArgumentModel>;

impl<'a> TypeResolver<'a> {
    pub fn new(ctx: &'a ModelContext) -> Self {
        Self { ctx }
    }

    /// Substitutes a type variable with the argument bound to it on the path.
    ///
    /// # Arguments
    ///
    /// * `variable` - The variable to substitute
    /// * `path` - Node ids from the root down to the node using the variable
    /// * `tree` - The tree the ids point into
    ///
    /// # Returns
    ///
    /// The bound type, or `None` when nothing on the path binds the variable.
    /// Wildcard arguments are not substituted: the variable then stays
    /// unresolved and falls back to its declaration.
    pub fn substitute_variable(
        &self,
        variable: &TypeVariableModel,
        path: &[NodeId],
        tree: &NodeTree,
    ) -> Result<Option<SignatureModel>> {
        if variable.scope().is_method_variable(variable.name()) {
            return Ok(None);
        }

        for (position, &id) in path.iter().enumerate().rev() {
            let class = match tree.source(id) {
                Some(NodeSource::EndpointExposed(class))
                | Some(NodeSource::EndpointNonExposed(class)) => class,
                _ => continue,
            };
            if class.name() != variable.scope().class_name() {
                continue;
            }

            let Some(index) = class
                .type_parameters()
                .iter()
                .position(|parameter| parameter.name() == variable.name())
            else {
                return Ok(None);
            };
            let binding = position
                .checked_sub(1)
                .and_then(|parent| tree.source(path[parent]));
            let Some(NodeSource::EndpointSignature(reference)) = binding else {
                return Ok(None);
            };
            let Some(argument) = reference.type_arguments().get(index) else {
                debug!("{} is used raw, {} stays unbound", reference, variable.name());
                return Ok(None);
            };
            if argument.wildcard() != Wildcard::None {
                debug!(
                    "{} is bound to wildcard {}, leaving it unresolved",
                    variable.name(),
                    argument
                );
                return Ok(None);
            }

            return match argument.associated_type() {
                Some(SignatureModel::TypeVariable(next)) => {
                    // bound to a variable of the class one level further down
                    let substituted = self.substitute_variable(next, &path[..position - 1], tree)?;
                    Ok(Some(substituted.unwrap_or_else(|| {
                        SignatureModel::TypeVariable(next.clone())
                    })))
                }
                Some(bound) => Ok(Some(bound.clone())),
                None => Ok(None),
            };
        }
        Ok(None)
    }

    /// Finds the type argument a class reference binds for a type parameter of
    /// one of its supertypes.
    ///
    /// # Arguments
    ///
    /// * `reference` - The parameterized class reference to start from
    /// * `target` - Binary name of the supertype, such as `java.lang.Iterable`
    /// * `index` - Position of the type parameter of `target`
    ///
    /// # Returns
    ///
    /// The argument as a type argument signature, or `None` if `target` is not
    /// reached. Raw references and classes missing from the classpath end the
    /// search along their branch.
    pub fn supertype_argument(
        &self,
        reference: &ClassRefSignatureModel,
        target: &str,
        index: usize,
    ) -> Option<SignatureModel> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([reference.clone()]);

        while let Some(current) = queue.pop_front() {
            if current.name() == target {
                return current
                    .type_arguments()
                    .get(index)
                    .map(|argument| SignatureModel::TypeArgument(argument.clone()));
            }
            if !visited.insert(current.name().to_string()) {
                continue;
            }
            let Some(class) = self.ctx.find_class(current.name()) else {
                debug!("Cannot follow supertypes of {}", current.name());
                continue;
            };

            let parameters = class.type_parameters();
            if parameters.len() != current.type_arguments().len() {
                debug!("{} is used raw, its supertype arguments are unknown", current);
                continue;
            }
            let bindings: Bindings = parameters
                .iter()
                .map(|parameter| parameter.name())
                .zip(current.type_arguments())
                .collect();
            for supertype in class.supertypes() {
                queue.push_back(bind_class_ref(supertype, &bindings));
            }
        }
        None
    }
}

fn bind(signature: &SignatureModel, bindings: &Bindings) -> SignatureModel {
    match signature {
        SignatureModel::TypeVariable(variable) => match bindings.get(variable.name()) {
            Some(argument) => match (argument.wildcard(), argument.associated_type()) {
                (Wildcard::None, Some(bound)) => bound.clone(),
                _ => SignatureModel::TypeArgument((*argument).clone()),
            },
            None => signature.clone(),
        },
        SignatureModel::ClassRef(reference) => {
            SignatureModel::ClassRef(bind_class_ref(reference, bindings))
        }
        SignatureModel::Array(array) => {
            SignatureModel::Array(ArraySignatureModel::new(bind(array.component(), bindings)))
        }
        SignatureModel::TypeArgument(argument) => {
            SignatureModel::TypeArgument(bind_argument(argument, bindings))
        }
        SignatureModel::Base(_) | SignatureModel::TypeParameter(_) => signature.clone(),
    }
}

fn bind_argument(argument: &TypeArgumentModel, bindings: &Bindings) -> TypeArgumentModel {
    if argument.wildcard() == Wildcard::None {
        if let Some(SignatureModel::TypeVariable(variable)) = argument.associated_type() {
            if let Some(bound) = bindings.get(variable.name()) {
                return (*bound).clone();
            }
        }
    }
    TypeArgumentModel::new(
        argument.wildcard(),
        argument.associated_type().map(|associated| bind(associated, bindings)),
    )
}

fn bind_class_ref(
    reference: &ClassRefSignatureModel,
    bindings: &Bindings,
) -> ClassRefSignatureModel {
    if bindings.is_empty() {
        return reference.clone();
    }
    reference.with_arguments(
        reference
            .type_arguments()
            .iter()
            .map(|argument| bind_argument(argument, bindings))
            .collect(),
    )
}
