//! Dependency closure of the endpoints.
//!
//! Starting from the endpoints, the collector gathers every non-standard-library
//! class their own and inherited members reference, then every class those
//! reference, until a full pass adds nothing new. The result is the set of
//! entities the document needs schemas for.

use crate::classpath::is_jdk_class;
use crate::error::Result;
use crate::model::{ClassInfoModel, ModelContext, PropertyModel, SignatureModel};
use log::{debug, info};
use std::collections::{BTreeMap, HashSet};

/// Endpoints and the entities they depend on, both in discovery order
#[derive(Debug, Clone, Default)]
pub struct ScanElements {
    pub endpoints: Vec<ClassInfoModel>,
    pub entities: Vec<ClassInfoModel>,
}

/// Computes the fixpoint closure of endpoint dependencies
pub struct DependencyCollector<'a> {
    ctx: &'a ModelContext,
    replaced_types: &'a BTreeMap<String, String>,
}

impl<'a> DependencyCollector<'a> {
    /// Creates a collector.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Model context of the current run
    /// * `replaced_types` - Classes that plugins substitute, mapped to their
    ///   substitutes; these are never entities themselves
    pub fn new(ctx: &'a ModelContext, replaced_types: &'a BTreeMap<String, String>) -> Self {
        Self {
            ctx,
            replaced_types,
        }
    }

    /// Collects the entities reachable from `endpoints`.
    ///
    /// # Errors
    ///
    /// Returns a resolution error when a referenced class is not on the classpath.
    pub fn collect(&self, endpoints: Vec<ClassInfoModel>) -> Result<ScanElements> {
        let mut entities = Vec::new();
        let mut known = HashSet::new();

        for endpoint in &endpoints {
            for name in self.endpoint_dependencies(endpoint)? {
                self.admit(&name, &mut entities, &mut known)?;
            }
        }

        // entities grows while it is walked; every appended entry is visited later
        let mut index = 0;
        while index < entities.len() {
            let entity = entities[index].clone();
            for name in self.entity_dependencies(&entity)? {
                self.admit(&name, &mut entities, &mut known)?;
            }
            index += 1;
        }

        info!(
            "Collected {} entities for {} endpoint(s)",
            entities.len(),
            endpoints.len()
        );
        Ok(ScanElements {
            endpoints,
            entities,
        })
    }

    fn admit(
        &self,
        name: &str,
        entities: &mut Vec<ClassInfoModel>,
        known: &mut HashSet<String>,
    ) -> Result<()> {
        let name = self
            .replaced_types
            .get(name)
            .map(String::as_str)
            .unwrap_or(name);
        if is_jdk_class(name) || !known.insert(name.to_string()) {
            return Ok(());
        }

        let Some(class) = self.ctx.class_by_name(name)? else {
            return Ok(());
        };

        if let Some(method) = class.json_value_method(self.ctx) {
            debug!(
                "{} serializes as the result of {}()",
                class.name(),
                method.name()
            );
            for dependency in signature_dependencies(method.result_type()) {
                self.admit(&dependency, entities, known)?;
            }
            return Ok(());
        }

        debug!("Adding entity {}", class.name());
        entities.push(class);
        Ok(())
    }

    /// Types referenced by an endpoint and everything it inherits: field types,
    /// method parameter and result types, and type arguments bound anywhere in
    /// its hierarchy. Which of those methods get published is decided later by
    /// the walk; the closure covers them all.
    fn endpoint_dependencies(&self, endpoint: &ClassInfoModel) -> Result<Vec<String>> {
        let mut dependencies = Vec::new();
        let chain = endpoint.inheritance_chain(self.ctx)?;

        for class in chain.classes() {
            for supertype in class.supertypes() {
                for argument in supertype.type_arguments() {
                    if let Some(associated) = argument.associated_type() {
                        dependencies.extend(signature_dependencies(associated));
                    }
                }
            }

            for field in class.fields(self.ctx) {
                if field.is_synthetic() {
                    continue;
                }
                dependencies.extend(signature_dependencies(field.signature()));
            }

            for method in class.methods(self.ctx) {
                if method.is_synthetic() || method.is_bridge() {
                    continue;
                }
                for parameter in method.parameters(self.ctx) {
                    dependencies.extend(signature_dependencies(parameter.signature()));
                }
                dependencies.extend(signature_dependencies(method.result_type()));
                for type_parameter in method.type_parameters() {
                    for bound in type_parameter.bounds() {
                        dependencies.extend(signature_dependencies(bound));
                    }
                }
            }
        }

        Ok(dependencies)
    }

    /// Types referenced by an entity: property types, the superclass, public
    /// nested classes and type parameter bounds
    fn entity_dependencies(&self, entity: &ClassInfoModel) -> Result<Vec<String>> {
        let mut dependencies = Vec::new();
        if entity.is_enum() {
            return Ok(dependencies);
        }

        for property in PropertyModel::of_class(self.ctx, entity)? {
            dependencies.extend(signature_dependencies(property.signature()));
        }

        if let Some(superclass) = entity.superclass() {
            dependencies.extend(signature_dependencies(&SignatureModel::ClassRef(
                superclass.clone(),
            )));
        }

        for inner in entity.inner_classes() {
            if let Some(class) = self.ctx.class_by_name(inner)? {
                if class.is_public() {
                    dependencies.push(inner.clone());
                }
            }
        }

        for type_parameter in entity.type_parameters() {
            for bound in type_parameter.bounds() {
                dependencies.extend(signature_dependencies(bound));
            }
        }

        Ok(dependencies)
    }
}

/// Binary names of all classes a signature mentions
pub fn signature_dependencies(signature: &SignatureModel) -> Vec<String> {
    let mut names = Vec::new();
    collect_names(signature, &mut names);
    names
}

fn collect_names(signature: &SignatureModel, names: &mut Vec<String>) {
    match signature {
        SignatureModel::Base(_) | SignatureModel::TypeVariable(_) => {}
        SignatureModel::Array(array) => collect_names(array.component(), names),
        SignatureModel::ClassRef(class_ref) => {
            names.push(class_ref.name().to_string());
            for argument in class_ref.type_arguments() {
                if let Some(associated) = argument.associated_type() {
                    collect_names(associated, names);
                }
            }
            if let Some(owner) = class_ref.owner() {
                collect_names(&SignatureModel::ClassRef(owner.clone()), names);
            }
        }
        SignatureModel::TypeArgument(argument) => {
            if let Some(associated) = argument.associated_type() {
                collect_names(associated, names);
            }
        }
        SignatureModel::TypeParameter(parameter) => {
            for bound in parameter.bounds() {
                collect_names(bound, names);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::Classpath;
    use crate::error::Error;
    use crate::parser::DescriptorParser;
    use std::path::Path;
    use std::rc::Rc;

    fn context(yaml: &str) -> ModelContext {
        let mut classpath = Classpath::with_jdk();
        classpath.extend(DescriptorParser::parse_str(yaml, Path::new("test.yaml")).unwrap());
        ModelContext::new(Rc::new(classpath))
    }

    fn collect(ctx: &ModelContext, endpoint: &str) -> Result<Vec<String>> {
        let replaced = BTreeMap::new();
        let collector = DependencyCollector::new(ctx, &replaced);
        let endpoint = ctx.class_by_name(endpoint)?.unwrap();
        let elements = collector.collect(vec![endpoint])?;
        Ok(elements
            .entities
            .iter()
            .map(|c| c.name().to_string())
            .collect())
    }

    #[test]
    fn test_cycle_terminates_with_each_entity_once() {
        let ctx = context(
            r#"
classes:
  - name: com.example.Api
    methods:
      - name: get
        descriptor: ()Lcom/example/A;
        modifiers: [public]
  - name: com.example.A
    fields:
      - name: b
        descriptor: Lcom/example/B;
  - name: com.example.B
    fields:
      - name: a
        descriptor: Lcom/example/A;
      - name: self
        descriptor: Lcom/example/B;
"#,
        );
        assert_eq!(
            collect(&ctx, "com.example.Api").unwrap(),
            vec!["com.example.A", "com.example.B"]
        );
    }

    #[test]
    fn test_endpoint_fields_and_inherited_members_are_dependencies() {
        let ctx = context(
            r#"
classes:
  - name: com.example.Api
    superclass: com.example.Base
    fields:
      - name: owned
        descriptor: Lcom/example/FromOwnField;
        modifiers: [public]
    methods:
      - name: internal
        descriptor: ()Lcom/example/FromPrivateMethod;
        modifiers: [private]
  - name: com.example.Base
    fields:
      - name: inherited
        descriptor: Lcom/example/FromInheritedField;
        modifiers: [private]
    methods:
      - name: helper
        descriptor: ()Lcom/example/FromBaseMethod;
        modifiers: [public]
  - name: com.example.FromOwnField
  - name: com.example.FromPrivateMethod
  - name: com.example.FromInheritedField
  - name: com.example.FromBaseMethod
"#,
        );
        assert_eq!(
            collect(&ctx, "com.example.Api").unwrap(),
            vec![
                "com.example.FromOwnField",
                "com.example.FromPrivateMethod",
                "com.example.FromInheritedField",
                "com.example.FromBaseMethod",
            ]
        );
    }

    #[test]
    fn test_exposed_ancestor_and_type_arguments() {
        let ctx = context(
            r#"
classes:
  - name: com.example.Repository
    signature: <T:Ljava/lang/Object;>Ljava/lang/Object;
    annotations:
      - name: com.example.EndpointExposed
    methods:
      - name: find
        descriptor: ()Ljava/lang/Object;
        signature: ()TT;
        modifiers: [public]
      - name: audit
        descriptor: ()Lcom/example/Audit;
        modifiers: [public]
  - name: com.example.PersonEndpoint
    signature: Lcom/example/Repository<Lcom/example/Person;>;
  - name: com.example.Person
    superclass: com.example.Party
  - name: com.example.Party
  - name: com.example.Audit
"#,
        );
        assert_eq!(
            collect(&ctx, "com.example.PersonEndpoint").unwrap(),
            vec!["com.example.Person", "com.example.Audit", "com.example.Party"]
        );
    }

    #[test]
    fn test_missing_class_is_resolution_error() {
        let ctx = context(
            r#"
classes:
  - name: com.example.Api
    methods:
      - name: get
        descriptor: ()Lcom/example/Missing;
        modifiers: [public]
"#,
        );
        assert!(matches!(
            collect(&ctx, "com.example.Api"),
            Err(Error::Resolution(name)) if name == "com.example.Missing"
        ));
    }

    #[test]
    fn test_json_value_class_contributes_its_value_type() {
        let ctx = context(
            r#"
classes:
  - name: com.example.Api
    methods:
      - name: get
        descriptor: ()Lcom/example/Wrapper;
        modifiers: [public]
  - name: com.example.Wrapper
    methods:
      - name: value
        descriptor: ()Lcom/example/Payload;
        modifiers: [public]
        annotations:
          - name: com.fasterxml.jackson.annotation.JsonValue
  - name: com.example.Payload
"#,
        );
        assert_eq!(collect(&ctx, "com.example.Api").unwrap(), vec!["com.example.Payload"]);
    }

    #[test]
    fn test_replaced_types_are_leaves() {
        let ctx = context(
            r#"
classes:
  - name: com.example.Api
    methods:
      - name: get
        descriptor: ()Lcom/example/Money;
        modifiers: [public]
  - name: com.example.Money
    fields:
      - name: currency
        descriptor: Lcom/example/Currency;
"#,
        );
        let mut replaced = BTreeMap::new();
        replaced.insert("com.example.Money".to_string(), "java.lang.String".to_string());
        let collector = DependencyCollector::new(&ctx, &replaced);
        let endpoint = ctx.class_by_name("com.example.Api").unwrap().unwrap();
        let elements = collector.collect(vec![endpoint]).unwrap();
        assert!(elements.entities.is_empty());
    }
}
