use super::annotation;
use super::specialized::{JSON_IGNORE, JSON_PROPERTY};
use super::{
    AnnotationInfoModel, ClassInfoModel, FieldInfoModel, MethodInfoModel, ModelContext,
    SignatureModel,
};
use crate::error::Result;
use crate::signature::BaseType;
use log::debug;
use std::rc::Rc;

/// A member that contributes to a bean property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertySource {
    Field(FieldInfoModel),
    Getter(MethodInfoModel),
    Setter(MethodInfoModel),
}

impl PropertySource {
    /// Declared type of the property as seen by this member
    pub fn signature(&self, ctx: &ModelContext) -> SignatureModel {
        match self {
            PropertySource::Field(field) => field.signature().clone(),
            PropertySource::Getter(method) => method.result_type().clone(),
            PropertySource::Setter(method) => method.parameters(ctx)[0].signature().clone(),
        }
    }

    pub fn annotations<'a>(&'a self, ctx: &'a ModelContext) -> &'a [AnnotationInfoModel] {
        match self {
            PropertySource::Field(field) => field.annotations(ctx),
            PropertySource::Getter(method) | PropertySource::Setter(method) => {
                method.annotations(ctx)
            }
        }
    }
}

#[derive(Debug, PartialEq)]
struct PropertyInner {
    name: String,
    owner: String,
    signature: SignatureModel,
    sources: Vec<PropertySource>,
}

/// A bean property of a class, derived from its fields and accessors.
///
/// All sources of a property agree on its type: members whose type differs from
/// the first discovered one are left out.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyModel(Rc<PropertyInner>);

impl PropertyModel {
    /// Derives the properties declared by `class`.
    ///
    /// Fields come first, in declaration order, followed by properties that only
    /// have accessors. Inherited members are not included.
    pub fn of_class(ctx: &ModelContext, class: &ClassInfoModel) -> Result<Vec<PropertyModel>> {
        let mut groups: Vec<(String, Vec<PropertySource>)> = Vec::new();
        let mut add = |name: String, source: PropertySource| {
            match groups.iter_mut().find(|(existing, _)| *existing == name) {
                Some((_, sources)) => sources.push(source),
                None => groups.push((name, vec![source])),
            }
        };

        for field in class.fields(ctx) {
            if field.is_static() || field.is_transient() || field.is_synthetic() {
                continue;
            }
            add(field.name().to_string(), PropertySource::Field(field.clone()));
        }

        for method in class.methods(ctx) {
            if method.is_static()
                || method.is_synthetic()
                || method.is_bridge()
                || !method.is_public()
            {
                continue;
            }
            if let Some(name) = getter_property(ctx, method) {
                add(name, PropertySource::Getter(method.clone()));
            } else if let Some(name) = setter_property(ctx, method) {
                add(name, PropertySource::Setter(method.clone()));
            }
        }

        let mut properties = Vec::new();
        for (name, sources) in groups {
            if sources
                .iter()
                .any(|source| annotation::find(source.annotations(ctx), JSON_IGNORE).is_some())
            {
                debug!("Ignoring property {}.{}", class.name(), name);
                continue;
            }

            let mut renamed = None;
            for source in &sources {
                if let Some(json_property) =
                    annotation::find(source.annotations(ctx), JSON_PROPERTY)
                {
                    if let Some(value) = json_property.string_value("value")? {
                        renamed = Some(value.to_string());
                        break;
                    }
                }
            }

            let signature = sources[0].signature(ctx);
            let expected = signature.to_string();
            let sources: Vec<PropertySource> = sources
                .into_iter()
                .filter(|source| {
                    let actual = source.signature(ctx).to_string();
                    if actual != expected {
                        debug!(
                            "Dropping {:?} of property {}.{}: type {} differs from {}",
                            source,
                            class.name(),
                            name,
                            actual,
                            expected
                        );
                    }
                    actual == expected
                })
                .collect();

            properties.push(PropertyModel(Rc::new(PropertyInner {
                name: renamed.unwrap_or(name),
                owner: class.name().to_string(),
                signature,
                sources,
            })));
        }

        Ok(properties)
    }

    /// Serialized name of the property
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Binary name of the declaring class
    pub fn owner(&self) -> &str {
        &self.0.owner
    }

    pub fn signature(&self) -> &SignatureModel {
        &self.0.signature
    }

    pub fn sources(&self) -> &[PropertySource] {
        &self.0.sources
    }

    /// Annotations of all sources
    pub fn annotations(&self, ctx: &ModelContext) -> Vec<AnnotationInfoModel> {
        self.0
            .sources
            .iter()
            .flat_map(|source| source.annotations(ctx).iter().cloned())
            .collect()
    }
}

fn getter_property(ctx: &ModelContext, method: &MethodInfoModel) -> Option<String> {
    if !method.parameters(ctx).is_empty() || method.is_void() {
        return None;
    }
    let name = method.name();
    if let Some(rest) = name.strip_prefix("get").filter(|rest| !rest.is_empty()) {
        return Some(decapitalize(rest));
    }
    let is_boolean = matches!(
        method.result_type(),
        SignatureModel::Base(base) if base.base_type() == BaseType::Boolean
    );
    name.strip_prefix("is")
        .filter(|rest| is_boolean && !rest.is_empty())
        .map(decapitalize)
}

fn setter_property(ctx: &ModelContext, method: &MethodInfoModel) -> Option<String> {
    if method.parameters(ctx).len() != 1 || !method.is_void() {
        return None;
    }
    method
        .name()
        .strip_prefix("set")
        .filter(|rest| !rest.is_empty())
        .map(decapitalize)
}

/// Bean-style decapitalization: `Name` becomes `name`, `URL` stays `URL`
fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => {
            name.to_string()
        }
        (Some(first), _) => first.to_lowercase().chain(name[first.len_utf8()..].chars()).collect(),
        (None, _) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::Classpath;
    use crate::parser::DescriptorParser;
    use std::path::Path;

    fn properties(yaml: &str, class: &str) -> Vec<PropertyModel> {
        let mut classpath = Classpath::with_jdk();
        classpath.extend(DescriptorParser::parse_str(yaml, Path::new("test.yaml")).unwrap());
        let ctx = ModelContext::new(Rc::new(classpath));
        let class = ctx.class_by_name(class).unwrap().unwrap();
        PropertyModel::of_class(&ctx, &class).unwrap()
    }

    #[test]
    fn test_decapitalize() {
        assert_eq!(decapitalize("Name"), "name");
        assert_eq!(decapitalize("URL"), "URL");
        assert_eq!(decapitalize("x"), "x");
    }

    #[test]
    fn test_fields_then_accessors() {
        let props = properties(
            r#"
name: com.example.Item
fields:
  - name: id
    descriptor: Ljava/lang/String;
    modifiers: [private]
  - name: COUNTER
    descriptor: I
    modifiers: [private, static]
  - name: cache
    descriptor: Ljava/lang/Object;
    modifiers: [private, transient]
methods:
  - name: getId
    descriptor: ()Ljava/lang/String;
    modifiers: [public]
  - name: isActive
    descriptor: ()Z
    modifiers: [public]
  - name: setLabel
    descriptor: (Ljava/lang/String;)V
    modifiers: [public]
  - name: compute
    descriptor: ()I
    modifiers: [public]
"#,
            "com.example.Item",
        );
        let names: Vec<&str> = props.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["id", "active", "label"]);
        assert_eq!(props[0].sources().len(), 2);
        assert_eq!(props[1].signature().to_string(), "boolean");
    }

    #[test]
    fn test_json_annotations() {
        let props = properties(
            r#"
name: com.example.Account
fields:
  - name: password
    descriptor: Ljava/lang/String;
    annotations:
      - name: com.fasterxml.jackson.annotation.JsonIgnore
  - name: owner
    descriptor: Ljava/lang/String;
    annotations:
      - name: com.fasterxml.jackson.annotation.JsonProperty
        values:
          value: ownerName
"#,
            "com.example.Account",
        );
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].name(), "ownerName");
    }

    #[test]
    fn test_divergent_accessor_is_dropped() {
        let props = properties(
            r#"
name: com.example.Entry
fields:
  - name: value
    descriptor: Ljava/lang/String;
methods:
  - name: getValue
    descriptor: ()Ljava/lang/Integer;
    modifiers: [public]
  - name: setValue
    descriptor: (Ljava/lang/String;)V
    modifiers: [public]
"#,
            "com.example.Entry",
        );
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].signature().to_string(), "java.lang.String");
        let kinds: Vec<bool> = props[0]
            .sources()
            .iter()
            .map(|source| matches!(source, PropertySource::Getter(_)))
            .collect();
        assert_eq!(kinds, vec![false, false]);
    }
}
