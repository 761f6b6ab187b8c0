use crate::error::Result;
use crate::model::specialized::{BYTE, DOUBLE, FLOAT, INTEGER, LONG, SHORT};
use crate::model::{ClassInfoModel, ClassRefSignatureModel, ModelContext, SignatureModel};
use crate::signature::BaseType;
use log::debug;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Prefix of references into `components.schemas`
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Schema generator - converts type signatures to OpenAPI schemas
pub struct SchemaGenerator<'a> {
    ctx: &'a ModelContext,
}

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for scalar types (e.g., "int32", "int64", "date-time")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "anyOf", skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<Schema>>,
    #[serde(rename = "allOf", skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Schema>>,
    /// Properties for object types, in discovery order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Value schema for map types
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<Schema>>,
    /// Enum values for enum types
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl Schema {
    /// The untyped schema, accepting any value
    pub fn any() -> Self {
        Self {
            nullable: Some(true),
            ..Self::default()
        }
    }

    pub fn typed(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    pub fn formatted(schema_type: &str, format: &str) -> Self {
        Self {
            format: Some(format.to_string()),
            ..Self::typed(schema_type)
        }
    }

    /// An object schema without properties
    pub fn object() -> Self {
        Self::typed("object")
    }

    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed("array")
        }
    }

    /// An object schema whose values all follow `values`
    pub fn map(values: Schema) -> Self {
        Self {
            additional_properties: Some(Box::new(values)),
            ..Self::typed("object")
        }
    }

    /// A plain reference to the component schema of a class
    pub fn reference(class_name: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", SCHEMA_REF_PREFIX, class_name)),
            ..Self::default()
        }
    }

    pub fn enumeration(values: Vec<String>) -> Self {
        Self {
            enum_values: Some(values),
            ..Self::typed("string")
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable == Some(true)
    }

    pub fn is_array(&self) -> bool {
        self.schema_type.as_deref() == Some("array")
    }

    pub fn is_map(&self) -> bool {
        self.schema_type.as_deref() == Some("object") && self.additional_properties.is_some()
    }

    /// Builder form of [`Schema::set_nullable`]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.set_nullable(nullable);
        self
    }

    /// Marks the schema as nullable or not.
    ///
    /// OpenAPI 3.0 ignores siblings of `$ref`, so a nullable reference is
    /// expressed as `nullable` next to an `anyOf` holding the reference, and a
    /// non-null one collapses back to the plain reference.
    pub fn set_nullable(&mut self, nullable: bool) {
        if nullable {
            if let Some(reference) = self.reference.take() {
                self.any_of = Some(vec![Schema {
                    reference: Some(reference),
                    ..Schema::default()
                }]);
            }
            self.nullable = Some(true);
            return;
        }

        let single_reference = matches!(
            self.any_of.as_deref(),
            Some([only]) if only.reference.is_some() && self.schema_type.is_none()
        );
        if single_reference {
            if let Some(mut any_of) = self.any_of.take() {
                self.reference = any_of.pop().and_then(|only| only.reference);
            }
        }
        self.nullable = None;
    }

    /// Adds an object property; on an `allOf` composition the property goes to
    /// the object part
    pub fn insert_property(&mut self, name: impl Into<String>, schema: Schema) {
        if let Some(parts) = self.all_of.as_mut() {
            if let Some(own) = parts.iter_mut().rev().find(|part| part.reference.is_none()) {
                own.insert_property(name, schema);
                return;
            }
        }
        self.properties
            .get_or_insert_with(Properties::default)
            .insert(name, schema);
    }

    /// Puts the schema of a nested type signature in place: array items, map
    /// values, or, for an optional wrapper, the whole schema
    pub fn attach_child(&mut self, child: Schema) {
        if self.is_array() {
            self.items = Some(Box::new(child));
        } else if self.is_map() {
            self.additional_properties = Some(Box::new(child));
        } else {
            *self = child.nullable(true);
        }
    }
}

/// Object properties keeping their insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, Schema)>);

impl Properties {
    /// Inserts a property, replacing an existing one of the same name in place
    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = schema,
            None => self.0.push((name, schema)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, schema)| schema)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.0.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, schema) in &self.0 {
            map.serialize_entry(name, schema)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PropertiesVisitor;

        impl<'de> Visitor<'de> for PropertiesVisitor {
            type Value = Properties;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a map of property schemas")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Properties, A::Error> {
                let mut properties = Properties::default();
                while let Some((name, schema)) = access.next_entry::<String, Schema>()? {
                    properties.insert(name, schema);
                }
                Ok(properties)
            }
        }

        deserializer.deserialize_map(PropertiesVisitor)
    }
}

impl<'a> SchemaGenerator<'a> {
    pub fn new(ctx: &'a ModelContext) -> Self {
        Self { ctx }
    }

    /// Generate the schema for a resolved type signature.
    ///
    /// Containers get an untyped placeholder for their element, which the
    /// traversal replaces once the element signature has been visited.
    ///
    /// # Errors
    ///
    /// Returns a resolution error when a referenced user class is not on the
    /// classpath.
    pub fn generate_schema(&self, signature: &SignatureModel) -> Result<Schema> {
        debug!("Generating schema for type: {}", signature);

        let schema = match signature {
            SignatureModel::Base(base) => Self::primitive_to_schema(base.base_type()),
            SignatureModel::Array(_) => Schema::array(Schema::any()).nullable(true),
            SignatureModel::ClassRef(class_ref) => self.class_ref_schema(signature, class_ref)?,
            SignatureModel::TypeVariable(_)
            | SignatureModel::TypeArgument(_)
            | SignatureModel::TypeParameter(_) => Schema::any(),
        };
        Ok(schema)
    }

    /// Schemas of primitives are never nullable
    pub fn primitive_to_schema(base: BaseType) -> Schema {
        match base {
            BaseType::Boolean => Schema::typed("boolean"),
            BaseType::Byte | BaseType::Short | BaseType::Int => {
                Schema::formatted("integer", "int32")
            }
            BaseType::Long => Schema::formatted("integer", "int64"),
            BaseType::Float => Schema::formatted("number", "float"),
            BaseType::Double => Schema::formatted("number", "double"),
            BaseType::Char => Schema::typed("string"),
            BaseType::Void => Schema::default(),
        }
    }

    fn class_ref_schema(
        &self,
        signature: &SignatureModel,
        class_ref: &ClassRefSignatureModel,
    ) -> Result<Schema> {
        let schema = if signature.is_optional() {
            Schema::any()
        } else if signature.is_string() {
            Schema::typed("string")
        } else if signature.is_boolean() {
            Schema::typed("boolean")
        } else if signature.has_integer_type() {
            match class_ref.name() {
                BYTE | SHORT | INTEGER => Schema::formatted("integer", "int32"),
                LONG => Schema::formatted("integer", "int64"),
                _ => Schema::typed("integer"),
            }
        } else if signature.has_float_type() {
            match class_ref.name() {
                FLOAT => Schema::formatted("number", "float"),
                DOUBLE => Schema::formatted("number", "double"),
                _ => Schema::typed("number"),
            }
        } else if signature.is_date() {
            Schema::formatted("string", "date")
        } else if signature.is_date_time() {
            Schema::formatted("string", "date-time")
        } else if signature.is_map(self.ctx) {
            Schema::map(Schema::any())
        } else if signature.is_iterable(self.ctx) {
            Schema::array(Schema::any())
        } else if signature.is_jdk() {
            debug!("No schema mapping for {}, using any", class_ref.name());
            Schema::any()
        } else {
            // fails for classes missing from the classpath
            class_ref.class_info(self.ctx)?;
            Schema::reference(class_ref.name())
        };
        Ok(schema.nullable(true))
    }

    /// Component schema of an entity: string enumeration for enums, otherwise
    /// an object composed with its superclass when that is a user class
    pub fn entity_schema(&self, class: &ClassInfoModel) -> Schema {
        if class.is_enum() {
            return Schema::enumeration(class.enum_constants(self.ctx));
        }

        match class.superclass() {
            Some(superclass) if !SignatureModel::ClassRef(superclass.clone()).is_jdk() => Schema {
                all_of: Some(vec![Schema::reference(superclass.name()), Schema::object()]),
                ..Schema::default()
            },
            _ => Schema::object(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::Classpath;
    use crate::error::Error;
    use crate::model::TypeScope;
    use crate::parser::DescriptorParser;
    use crate::signature::parse_type;
    use std::path::Path;
    use std::rc::Rc;

    fn create_context(yaml: &str) -> ModelContext {
        let mut classpath = Classpath::with_jdk();
        if !yaml.is_empty() {
            classpath.extend(DescriptorParser::parse_str(yaml, Path::new("test.yaml")).unwrap());
        }
        ModelContext::new(Rc::new(classpath))
    }

    fn sig(text: &str) -> SignatureModel {
        SignatureModel::of_source(&parse_type(text).unwrap(), &TypeScope::class("com.example.A"))
    }

    #[test]
    fn test_primitive_type_int() {
        let ctx = create_context("");
        let schema = SchemaGenerator::new(&ctx).generate_schema(&sig("I")).unwrap();

        assert_eq!(schema.schema_type, Some("integer".to_string()));
        assert_eq!(schema.format, Some("int32".to_string()));
        assert!(schema.nullable.is_none());
    }

    #[test]
    fn test_primitive_type_long_and_double() {
        let ctx = create_context("");
        let generator = SchemaGenerator::new(&ctx);

        let schema = generator.generate_schema(&sig("J")).unwrap();
        assert_eq!(schema.format, Some("int64".to_string()));

        let schema = generator.generate_schema(&sig("D")).unwrap();
        assert_eq!(schema.schema_type, Some("number".to_string()));
        assert_eq!(schema.format, Some("double".to_string()));
        assert!(!schema.is_nullable());
    }

    #[test]
    fn test_boxed_and_string_types_are_nullable() {
        let ctx = create_context("");
        let generator = SchemaGenerator::new(&ctx);

        let schema = generator.generate_schema(&sig("Ljava/lang/String;")).unwrap();
        assert_eq!(schema.schema_type, Some("string".to_string()));
        assert!(schema.is_nullable());

        let schema = generator.generate_schema(&sig("Ljava/lang/Integer;")).unwrap();
        assert_eq!(schema.format, Some("int32".to_string()));
        assert!(schema.is_nullable());

        let schema = generator.generate_schema(&sig("Ljava/math/BigDecimal;")).unwrap();
        assert_eq!(schema.schema_type, Some("number".to_string()));
        assert!(schema.format.is_none());
    }

    #[test]
    fn test_date_types() {
        let ctx = create_context("");
        let generator = SchemaGenerator::new(&ctx);

        let schema = generator.generate_schema(&sig("Ljava/time/LocalDate;")).unwrap();
        assert_eq!(schema.format, Some("date".to_string()));

        let schema = generator.generate_schema(&sig("Ljava/time/Instant;")).unwrap();
        assert_eq!(schema.format, Some("date-time".to_string()));
    }

    #[test]
    fn test_containers_get_placeholders() {
        let ctx = create_context("");
        let generator = SchemaGenerator::new(&ctx);

        let schema = generator
            .generate_schema(&sig("Ljava/util/List<Ljava/lang/String;>;"))
            .unwrap();
        assert!(schema.is_array());
        assert_eq!(schema.items.as_deref(), Some(&Schema::any()));

        let schema = generator
            .generate_schema(&sig("Ljava/util/HashMap<Ljava/lang/String;Ljava/lang/Long;>;"))
            .unwrap();
        assert!(schema.is_map());

        let schema = generator.generate_schema(&sig("[I")).unwrap();
        assert!(schema.is_array());
    }

    #[test]
    fn test_user_class_is_nullable_reference() {
        let ctx = create_context("name: com.example.Item\n");
        let schema = SchemaGenerator::new(&ctx)
            .generate_schema(&sig("Lcom/example/Item;"))
            .unwrap();

        assert!(schema.reference.is_none());
        assert_eq!(schema.nullable, Some(true));
        let any_of = schema.any_of.unwrap();
        assert_eq!(
            any_of[0].reference,
            Some("#/components/schemas/com.example.Item".to_string())
        );
    }

    #[test]
    fn test_missing_user_class_is_resolution_error() {
        let ctx = create_context("");
        let result = SchemaGenerator::new(&ctx).generate_schema(&sig("Lcom/example/Missing;"));
        assert!(matches!(result, Err(Error::Resolution(_))));
    }

    #[test]
    fn test_unknown_jdk_class_is_any() {
        let ctx = create_context("");
        let schema = SchemaGenerator::new(&ctx)
            .generate_schema(&sig("Ljava/util/concurrent/Semaphore;"))
            .unwrap();
        assert_eq!(schema, Schema::any());
    }

    #[test]
    fn test_non_null_collapses_reference() {
        let schema = Schema::reference("com.example.Item").nullable(true).nullable(false);
        assert_eq!(schema, Schema::reference("com.example.Item"));
    }

    #[test]
    fn test_entity_schema_with_superclass() {
        let ctx = create_context(
            r#"
classes:
  - name: com.example.Party
  - name: com.example.Person
    superclass: com.example.Party
"#,
        );
        let person = ctx.class_by_name("com.example.Person").unwrap().unwrap();
        let mut schema = SchemaGenerator::new(&ctx).entity_schema(&person);
        schema.insert_property("name", Schema::typed("string"));

        let parts = schema.all_of.unwrap();
        assert_eq!(parts[0], Schema::reference("com.example.Party"));
        assert!(parts[1].properties.as_ref().unwrap().contains_key("name"));
    }

    #[test]
    fn test_properties_keep_insertion_order() {
        let mut schema = Schema::object();
        schema.insert_property("zeta", Schema::typed("string"));
        schema.insert_property("alpha", Schema::typed("string"));
        schema.insert_property("zeta", Schema::typed("integer"));

        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(
            json,
            r#"{"type":"object","properties":{"zeta":{"type":"integer"},"alpha":{"type":"string"}}}"#
        );
        let parsed: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, schema);
    }
}
