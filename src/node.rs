//! The node graph built while traversing the API surface.
//!
//! Every node pairs a model (its source) with the document fragment built for it
//! (its target). Nodes live in an arena and refer to their parent by index; the
//! traversal keeps the chain of nodes from the root to the current one as a
//! [`NodePath`].

use crate::model::{
    ClassInfoModel, ClassRefSignatureModel, MethodInfoModel, MethodParameterInfoModel,
    PropertyModel, SignatureModel,
};
use crate::openapi_builder::{OpenApiBuilder, Operation};
use crate::schema_generator::Schema;
use std::fmt;

pub type NodeId = usize;

/// The model a node stands for
#[derive(Debug, Clone, PartialEq)]
pub enum NodeSource {
    Root,
    Endpoint(ClassInfoModel),
    /// A supertype reference of an endpoint or of an ancestor, with the type
    /// arguments it binds
    EndpointSignature(ClassRefSignatureModel),
    /// An ancestor carrying the exposed annotation; its methods are published
    EndpointExposed(ClassInfoModel),
    /// An ancestor without the exposed annotation; only its supertypes are walked
    EndpointNonExposed(ClassInfoModel),
    Method(MethodInfoModel),
    MethodParameter(MethodParameterInfoModel),
    Entity(ClassInfoModel),
    Property(PropertyModel),
    TypeSignature(SignatureModel),
}

impl NodeSource {
    /// The signature of a type signature node
    pub fn signature(&self) -> Option<&SignatureModel> {
        match self {
            NodeSource::TypeSignature(signature) => Some(signature),
            _ => None,
        }
    }
}

impl fmt::Display for NodeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeSource::Root => write!(f, "root"),
            NodeSource::Endpoint(class) => write!(f, "endpoint {}", class.name()),
            NodeSource::EndpointSignature(signature) => write!(f, "supertype {}", signature),
            NodeSource::EndpointExposed(class) => write!(f, "exposed {}", class.name()),
            NodeSource::EndpointNonExposed(class) => write!(f, "non-exposed {}", class.name()),
            NodeSource::Method(method) => write!(f, "method {}.{}", method.owner(), method.name()),
            NodeSource::MethodParameter(parameter) => write!(f, "parameter {}", parameter.name()),
            NodeSource::Entity(class) => write!(f, "entity {}", class.name()),
            NodeSource::Property(property) => {
                write!(f, "property {}.{}", property.owner(), property.name())
            }
            NodeSource::TypeSignature(signature) => write!(f, "type {}", signature),
        }
    }
}

/// The document fragment built for a node
#[derive(Debug, Default)]
pub enum NodeTarget {
    #[default]
    None,
    Document(OpenApiBuilder),
    Operation(Operation),
    Schema(Schema),
}

impl NodeTarget {
    pub fn is_none(&self) -> bool {
        matches!(self, NodeTarget::None)
    }

    pub fn schema(&self) -> Option<&Schema> {
        match self {
            NodeTarget::Schema(schema) => Some(schema),
            _ => None,
        }
    }

    pub fn schema_mut(&mut self) -> Option<&mut Schema> {
        match self {
            NodeTarget::Schema(schema) => Some(schema),
            _ => None,
        }
    }

    pub fn operation_mut(&mut self) -> Option<&mut Operation> {
        match self {
            NodeTarget::Operation(operation) => Some(operation),
            _ => None,
        }
    }

    /// Moves the target out, leaving `None` behind
    pub fn take(&mut self) -> NodeTarget {
        std::mem::take(self)
    }
}

#[derive(Debug)]
pub struct Node {
    pub source: NodeSource,
    pub target: NodeTarget,
    pub parent: Option<NodeId>,
}

/// Arena of all nodes created during one traversal
#[derive(Debug, Default)]
pub struct NodeTree {
    nodes: Vec<Node>,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: NodeSource, parent: Option<NodeId>) -> NodeId {
        self.nodes.push(Node {
            source,
            target: NodeTarget::None,
            parent,
        });
        self.nodes.len() - 1
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn source(&self, id: NodeId) -> Option<&NodeSource> {
        self.get(id).map(|node| &node.source)
    }

    pub fn target_mut(&mut self, id: NodeId) -> Option<&mut NodeTarget> {
        self.get_mut(id).map(|node| &mut node.target)
    }

    /// The document builder held by the root node
    pub fn document_mut(&mut self) -> Option<&mut OpenApiBuilder> {
        match self.target_mut(0) {
            Some(NodeTarget::Document(builder)) => Some(builder),
            _ => None,
        }
    }

    /// Takes the document builder out of the root node
    pub fn take_document(&mut self) -> Option<OpenApiBuilder> {
        let target = self.target_mut(0)?;
        match target.take() {
            NodeTarget::Document(builder) => Some(builder),
            other => {
                *target = other;
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Chain of nodes from the root to the node being visited
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath {
    ids: Vec<NodeId>,
}

impl NodePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, id: NodeId) {
        self.ids.push(id);
    }

    pub(crate) fn pop(&mut self) -> Option<NodeId> {
        self.ids.pop()
    }

    /// The node being visited
    pub fn current(&self) -> Option<NodeId> {
        self.ids.last().copied()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.ancestors().next()
    }

    pub fn grandparent(&self) -> Option<NodeId> {
        self.ancestors().nth(1)
    }

    /// Ancestors of the current node, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids.iter().rev().skip(1).copied()
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Children discovered for a node during the scan phase, in visiting order
#[derive(Debug)]
pub struct NodeDependencies {
    pub node: NodeId,
    pub children: Vec<NodeSource>,
}

impl NodeDependencies {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    pub fn add(&mut self, child: NodeSource) {
        self.children.push(child);
    }
}
