//! Class metadata descriptors.
//!
//! A descriptor is the serialized form of what a byte-code scanner knows about one
//! compiled class: names, modifiers, annotations and member types written as JVM
//! descriptors and signatures. Descriptors are plain data; [`crate::parser`] turns
//! them into loaded classes with parsed signatures.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of a class declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
}

/// Access and property flags of classes and members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Transient,
    Volatile,
    Synthetic,
    Bridge,
    /// Marks a field as an enum constant
    Enum,
}

/// A constant value of an annotation member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<AnnotationValue>),
}

impl AnnotationValue {
    pub fn as_str(&self) -> Option<&str> {
        if let AnnotationValue::String(value) = self {
            Some(value.as_str())
        } else {
            None
        }
    }
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationValue::Bool(value) => write!(f, "{}", value),
            AnnotationValue::Int(value) => write!(f, "{}", value),
            AnnotationValue::Float(value) => write!(f, "{}", value),
            AnnotationValue::String(value) => write!(f, "\"{}\"", value),
            AnnotationValue::Array(values) => {
                write!(f, "{{")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// An annotation applied to a class, member or parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDescriptor {
    /// Binary name of the annotation type
    pub name: String,
    /// Member values by member name
    #[serde(default)]
    pub values: BTreeMap<String, AnnotationValue>,
}

/// One compiled class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    /// Binary name, e.g. `com.example.Outer$Inner`
    pub name: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    /// Generic class signature, when the class is generic or extends a parameterized type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Binary name of the superclass; ignored when `signature` is present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    /// Binary names of implemented interfaces; ignored when `signature` is present
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<AnnotationDescriptor>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
    /// Binary names of directly nested classes
    #[serde(default)]
    pub inner_classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer_class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// JVM field descriptor, e.g. `Ljava/lang/String;`
    pub descriptor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub annotations: Vec<AnnotationDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    /// JVM method descriptor, e.g. `(Ljava/lang/String;)V`
    pub descriptor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub annotations: Vec<AnnotationDescriptor>,
    /// Parameter names and annotations, in declaration order
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<AnnotationDescriptor>,
}

/// Top-level shape of a descriptor document: one class or a list of classes
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DescriptorDocument {
    Many { classes: Vec<ClassDescriptor> },
    One(Box<ClassDescriptor>),
}

impl DescriptorDocument {
    pub fn into_classes(self) -> Vec<ClassDescriptor> {
        match self {
            DescriptorDocument::Many { classes } => classes,
            DescriptorDocument::One(class) => vec![*class],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_class_document() {
        let yaml = r#"
name: com.example.Greeter
modifiers: [public]
annotations:
  - name: com.example.Endpoint
methods:
  - name: greet
    descriptor: (Ljava/lang/String;)Ljava/lang/String;
    modifiers: [public]
    parameters:
      - name: name
"#;
        let document: DescriptorDocument = serde_yaml::from_str(yaml).unwrap();
        let classes = document.into_classes();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].kind, ClassKind::Class);
        assert_eq!(classes[0].methods[0].parameters[0].name, "name");
        assert!(classes[0].annotations[0].values.is_empty());
    }

    #[test]
    fn test_class_list_document() {
        let json = r#"{"classes": [
            {"name": "com.example.A"},
            {"name": "com.example.Color", "kind": "enum"}
        ]}"#;
        let document: DescriptorDocument = serde_json::from_str(json).unwrap();
        let classes = document.into_classes();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[1].kind, ClassKind::Enum);
    }

    #[test]
    fn test_annotation_values() {
        let yaml = r#"
name: com.example.Endpoint
values:
  value: greeting
  retries: 3
  enabled: true
  tags: [a, b]
"#;
        let annotation: AnnotationDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(annotation.values["value"].as_str(), Some("greeting"));
        assert_eq!(annotation.values["retries"], AnnotationValue::Int(3));
        assert_eq!(annotation.values["enabled"], AnnotationValue::Bool(true));
        assert_eq!(annotation.values["tags"].to_string(), "{\"a\", \"b\"}");
    }
}
