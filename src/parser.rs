use crate::error::{Error, Result};
use crate::metadata::{
    AnnotationDescriptor, ClassDescriptor, ClassKind, DescriptorDocument, FieldDescriptor,
    MethodDescriptor,
};
use crate::signature::{self, ClassSig, ClassTypeSig, MethodSig, TypeArg, TypeSig, Wildcard};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Parser for class metadata descriptor files.
///
/// Reads YAML or JSON descriptor documents and parses every JVM descriptor and
/// signature they contain, producing [`ScannedClass`] values ready to be put on a
/// [`crate::classpath::Classpath`].
///
/// # Example
///
/// ```no_run
/// use openapi_from_classes::parser::DescriptorParser;
/// use std::path::Path;
///
/// let classes = DescriptorParser::parse_file(Path::new("classes/Greeter.yaml")).unwrap();
/// println!("Loaded {} classes", classes.len());
/// ```
pub struct DescriptorParser;

/// A class loaded from a descriptor, with all signatures parsed.
///
/// Members are kept behind `Rc` so that models can hold on to them and so that
/// each member has a stable identity for the model pool.
#[derive(Debug)]
pub struct ScannedClass {
    /// File the class was read from
    pub source: PathBuf,
    /// The descriptor with annotations, fields and methods moved out
    pub descriptor: ClassDescriptor,
    pub signature: ClassSig,
    pub annotations: Vec<Rc<AnnotationDescriptor>>,
    pub fields: Vec<Rc<ScannedField>>,
    pub methods: Vec<Rc<ScannedMethod>>,
}

#[derive(Debug)]
pub struct ScannedField {
    pub descriptor: FieldDescriptor,
    pub signature: TypeSig,
    pub annotations: Vec<Rc<AnnotationDescriptor>>,
}

#[derive(Debug)]
pub struct ScannedMethod {
    pub descriptor: MethodDescriptor,
    pub signature: MethodSig,
    pub annotations: Vec<Rc<AnnotationDescriptor>>,
    pub parameters: Vec<Rc<ScannedParameter>>,
}

#[derive(Debug)]
pub struct ScannedParameter {
    pub name: String,
    pub index: usize,
    pub signature: TypeSig,
    pub annotations: Vec<Rc<AnnotationDescriptor>>,
}

impl ScannedClass {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

impl DescriptorParser {
    /// Parses one descriptor file.
    ///
    /// The format is chosen by extension: `.json` is read as JSON, anything else as
    /// YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a descriptor document, or
    /// contains a malformed descriptor or signature.
    pub fn parse_file(path: &Path) -> Result<Vec<ScannedClass>> {
        debug!("Parsing descriptor file: {}", path.display());

        let content = fs::read_to_string(path).map_err(|e| Error::Descriptor {
            file: path.to_path_buf(),
            message: format!("failed to read file: {}", e),
        })?;

        let classes = Self::parse_str(&content, path)?;
        debug!(
            "Loaded {} classes from {}",
            classes.len(),
            path.display()
        );
        Ok(classes)
    }

    /// Parses descriptor text that was read from `source`
    pub fn parse_str(content: &str, source: &Path) -> Result<Vec<ScannedClass>> {
        let is_json = source.extension().and_then(|s| s.to_str()) == Some("json");
        let document: DescriptorDocument = if is_json {
            serde_json::from_str(content).map_err(|e| Error::Descriptor {
                file: source.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            serde_yaml::from_str(content).map_err(|e| Error::Descriptor {
                file: source.to_path_buf(),
                message: e.to_string(),
            })?
        };

        document
            .into_classes()
            .into_iter()
            .map(|descriptor| Self::load(descriptor, source))
            .collect()
    }

    /// Parses a batch of descriptor files; the first failure aborts the batch.
    pub fn parse_files(paths: &[PathBuf]) -> Result<Vec<ScannedClass>> {
        debug!("Parsing {} descriptor files", paths.len());

        let mut classes = Vec::new();
        for path in paths {
            classes.extend(Self::parse_file(path)?);
        }

        debug!("Parsing complete: {} classes loaded", classes.len());
        Ok(classes)
    }

    /// Turns one descriptor into a loaded class
    pub fn load(mut descriptor: ClassDescriptor, source: &Path) -> Result<ScannedClass> {
        let wrap = |e: Error| Error::Descriptor {
            file: source.to_path_buf(),
            message: format!("class `{}`: {}", descriptor.name, e),
        };

        let signature = match &descriptor.signature {
            Some(sig) => signature::parse_class(sig).map_err(wrap)?,
            None => Self::implicit_class_signature(&descriptor),
        };

        let annotations = std::mem::take(&mut descriptor.annotations)
            .into_iter()
            .map(Rc::new)
            .collect();

        let mut fields = Vec::new();
        for mut field in std::mem::take(&mut descriptor.fields) {
            let text = field.signature.as_deref().unwrap_or(&field.descriptor);
            let field_signature = signature::parse_type(text).map_err(wrap)?;
            let annotations = std::mem::take(&mut field.annotations)
                .into_iter()
                .map(Rc::new)
                .collect();
            fields.push(Rc::new(ScannedField {
                descriptor: field,
                signature: field_signature,
                annotations,
            }));
        }

        let mut methods = Vec::new();
        for mut method in std::mem::take(&mut descriptor.methods) {
            let text = method.signature.as_deref().unwrap_or(&method.descriptor);
            let method_signature = signature::parse_method(text).map_err(wrap)?;

            if method.parameters.len() > method_signature.params.len() {
                return Err(Error::Descriptor {
                    file: source.to_path_buf(),
                    message: format!(
                        "method `{}.{}` names {} parameters but its signature has {}",
                        descriptor.name,
                        method.name,
                        method.parameters.len(),
                        method_signature.params.len()
                    ),
                });
            }

            let mut named = std::mem::take(&mut method.parameters).into_iter();
            let parameters = method_signature
                .params
                .iter()
                .enumerate()
                .map(|(index, param_signature)| {
                    let (name, annotations) = match named.next() {
                        Some(param) => (param.name, param.annotations),
                        None => (format!("arg{}", index), Vec::new()),
                    };
                    Rc::new(ScannedParameter {
                        name,
                        index,
                        signature: param_signature.clone(),
                        annotations: annotations.into_iter().map(Rc::new).collect(),
                    })
                })
                .collect();

            let annotations = std::mem::take(&mut method.annotations)
                .into_iter()
                .map(Rc::new)
                .collect();
            methods.push(Rc::new(ScannedMethod {
                descriptor: method,
                signature: method_signature,
                annotations,
                parameters,
            }));
        }

        Ok(ScannedClass {
            source: source.to_path_buf(),
            descriptor,
            signature,
            annotations,
            fields,
            methods,
        })
    }

    /// Superclass/interfaces of a class that carries no generic signature
    fn implicit_class_signature(descriptor: &ClassDescriptor) -> ClassSig {
        let superclass = match (&descriptor.superclass, descriptor.kind) {
            (Some(name), _) => Some(ClassTypeSig::raw(name.clone())),
            (None, ClassKind::Enum) => Some(ClassTypeSig {
                name: "java.lang.Enum".to_string(),
                type_args: vec![TypeArg {
                    wildcard: Wildcard::None,
                    bound: Some(TypeSig::Class(ClassTypeSig::raw(descriptor.name.clone()))),
                }],
                owner: None,
            }),
            (None, ClassKind::Class) if descriptor.name != "java.lang.Object" => {
                Some(ClassTypeSig::raw("java.lang.Object"))
            }
            (None, _) => None,
        };

        ClassSig {
            type_params: Vec::new(),
            superclass,
            interfaces: descriptor
                .interfaces
                .iter()
                .map(|name| ClassTypeSig::raw(name.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    /// Helper function to create a temporary file with content
    fn create_temp_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        let mut file = fs::File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file_path
    }

    #[test]
    fn test_parse_valid_yaml_descriptor() {
        let temp_dir = TempDir::new().unwrap();
        let yaml = r#"
name: com.example.Greeter
modifiers: [public]
methods:
  - name: greet
    descriptor: (Ljava/lang/String;I)Ljava/lang/String;
    modifiers: [public]
    parameters:
      - name: name
"#;
        let path = create_temp_file(&temp_dir, "Greeter.yaml", yaml);
        let classes = DescriptorParser::parse_file(&path).unwrap();

        assert_eq!(classes.len(), 1);
        let class = &classes[0];
        assert_eq!(class.name(), "com.example.Greeter");
        assert_eq!(class.source, path);
        assert_eq!(
            class.signature.superclass.as_ref().unwrap().name,
            "java.lang.Object"
        );

        let method = &class.methods[0];
        assert_eq!(method.parameters.len(), 2);
        assert_eq!(method.parameters[0].name, "name");
        // unnamed parameters get positional names
        assert_eq!(method.parameters[1].name, "arg1");
    }

    #[test]
    fn test_parse_json_descriptor_list() {
        let temp_dir = TempDir::new().unwrap();
        let json = r#"{"classes": [
            {"name": "com.example.Color", "kind": "enum"},
            {"name": "com.example.Shape", "kind": "interface"}
        ]}"#;
        let path = create_temp_file(&temp_dir, "classes.json", json);
        let classes = DescriptorParser::parse_file(&path).unwrap();

        assert_eq!(classes.len(), 2);
        let color_super = classes[0].signature.superclass.as_ref().unwrap();
        assert_eq!(color_super.name, "java.lang.Enum");
        assert_eq!(color_super.type_args.len(), 1);
        assert!(classes[1].signature.superclass.is_none());
    }

    #[test]
    fn test_generic_signature_wins_over_descriptor() {
        let yaml = r#"
name: com.example.Page
signature: <T:Ljava/lang/Object;>Ljava/lang/Object;
fields:
  - name: content
    descriptor: Ljava/util/List;
    signature: Ljava/util/List<TT;>;
"#;
        let classes = DescriptorParser::parse_str(yaml, Path::new("Page.yaml")).unwrap();
        let class = &classes[0];
        assert_eq!(class.signature.type_params[0].name, "T");
        let TypeSig::Class(list) = &class.fields[0].signature else {
            panic!("Expected class signature");
        };
        assert_eq!(list.type_args.len(), 1);
    }

    #[test]
    fn test_malformed_signature_is_fatal() {
        let yaml = r#"
name: com.example.Broken
fields:
  - name: value
    descriptor: Ljava/lang/String
"#;
        let err = DescriptorParser::parse_str(yaml, Path::new("Broken.yaml")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Broken.yaml"));
        assert!(message.contains("com.example.Broken"));
    }

    #[test]
    fn test_too_many_parameter_names_is_fatal() {
        let yaml = r#"
name: com.example.Broken
methods:
  - name: run
    descriptor: ()V
    parameters:
      - name: extra
"#;
        assert!(DescriptorParser::parse_str(yaml, Path::new("Broken.yaml")).is_err());
    }

    #[test]
    fn test_parse_nonexistent_file() {
        let result = DescriptorParser::parse_file(Path::new("/nonexistent/Class.yaml"));
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("failed to read file"));
    }

    #[test]
    fn test_parse_files_stops_at_first_failure() {
        let temp_dir = TempDir::new().unwrap();
        let good = create_temp_file(&temp_dir, "a.yaml", "name: com.example.A\n");
        let bad = create_temp_file(&temp_dir, "b.yaml", "fields: [1, 2]\n");

        assert_eq!(DescriptorParser::parse_files(&[good.clone()]).unwrap().len(), 1);
        assert!(DescriptorParser::parse_files(&[good, bad]).is_err());
    }
}
