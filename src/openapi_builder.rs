use crate::schema_generator::Schema;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const OPENAPI_VERSION: &str = "3.0.1";
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// OpenAPI document builder
///
/// Collects tags, operations and component schemas while the node graph is
/// traversed. Paths and schemas are kept in sorted maps so the built document
/// does not depend on traversal order.
#[derive(Debug, Clone, Default)]
pub struct OpenApiBuilder {
    tags: Vec<Tag>,
    paths: BTreeMap<String, PathItem>,
    schemas: BTreeMap<String, Schema>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// API description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "Generated API".to_string(),
            version: "1.0.0".to_string(),
            description: None,
        }
    }
}

/// OpenAPI Server object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Tag object, one per endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    /// Binary name of the endpoint class
    #[serde(
        rename = "x-class-name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub class_name: Option<String>,
}

/// OpenAPI PathItem object
///
/// Endpoint methods are always published as `post`; other entries of a base
/// document are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// OpenAPI Operation object - represents a single endpoint method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(rename = "operationId")]
    pub operation_id: String,
    /// Request body, an object with one property per method parameter
    #[serde(
        rename = "requestBody",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, Response>,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Content types and their schemas
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type
    pub schema: Schema,
}

/// OpenAPI Response object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    pub description: String,
    /// Response content, absent for `void` methods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Schema definitions keyed by binary class name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Schema>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    #[serde(default)]
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    /// API paths
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    /// Components (schemas, etc.)
    #[serde(default)]
    pub components: Components,
}

impl Default for OpenApiDocument {
    fn default() -> Self {
        Self {
            openapi: OPENAPI_VERSION.to_string(),
            info: Info::default(),
            servers: Vec::new(),
            tags: Vec::new(),
            paths: BTreeMap::new(),
            components: Components::default(),
        }
    }
}

fn json_content(schema: Schema) -> BTreeMap<String, MediaType> {
    let mut content = BTreeMap::new();
    content.insert(JSON_MEDIA_TYPE.to_string(), MediaType { schema });
    content
}

impl Operation {
    /// Creates the operation of an endpoint method, answering `200` without
    /// content until a response schema is set
    pub fn new(endpoint: &str, method: &str) -> Self {
        let mut responses = BTreeMap::new();
        responses.insert(
            "200".to_string(),
            Response {
                description: "OK".to_string(),
                content: None,
            },
        );
        Self {
            tags: vec![endpoint.to_string()],
            operation_id: format!("{}_{}_POST", endpoint, method),
            request_body: None,
            responses,
        }
    }

    /// Gives the operation an empty JSON object request body
    pub fn with_request_body(mut self) -> Self {
        self.request_body = Some(RequestBody {
            content: json_content(Schema::object()),
        });
        self
    }

    /// Adds a parameter to the request body object, creating the body if needed
    pub fn add_request_property(&mut self, name: &str, schema: Schema) {
        let body = self.request_body.get_or_insert_with(|| RequestBody {
            content: json_content(Schema::object()),
        });
        if let Some(media) = body.content.get_mut(JSON_MEDIA_TYPE) {
            media.schema.insert_property(name, schema);
        }
    }

    /// Sets the JSON schema of the `200` response
    pub fn set_response(&mut self, schema: Schema) {
        let response = self
            .responses
            .entry("200".to_string())
            .or_insert_with(|| Response {
                description: "OK".to_string(),
                content: None,
            });
        response.content = Some(json_content(schema));
    }

    /// JSON schema of the request body
    pub fn request_schema(&self) -> Option<&Schema> {
        self.request_body
            .as_ref()
            .and_then(|body| body.content.get(JSON_MEDIA_TYPE))
            .map(|media| &media.schema)
    }

    /// JSON schema of the `200` response
    pub fn response_schema(&self) -> Option<&Schema> {
        self.responses
            .get("200")
            .and_then(|response| response.content.as_ref())
            .and_then(|content| content.get(JSON_MEDIA_TYPE))
            .map(|media| &media.schema)
    }
}

impl OpenApiBuilder {
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self::default()
    }

    /// Adds an endpoint tag; a tag of the same name is only added once
    pub fn add_tag(&mut self, name: &str, class_name: &str) {
        if self.tags.iter().any(|tag| tag.name == name) {
            debug!("Tag {} already present", name);
            return;
        }
        self.tags.push(Tag {
            name: name.to_string(),
            class_name: Some(class_name.to_string()),
        });
    }

    /// Publishes an operation under `/{endpoint}/{method}`.
    ///
    /// # Returns
    ///
    /// `false` when the path already has an operation. The first operation wins,
    /// so an overridden or overloaded method found later is left out.
    pub fn add_operation(&mut self, endpoint: &str, method: &str, operation: Operation) -> bool {
        let path = format!("/{}/{}", endpoint, method);
        let item = self.paths.entry(path.clone()).or_default();
        if item.post.is_some() {
            debug!("Operation for {} already present, skipping", path);
            return false;
        }
        debug!("Adding operation: POST {}", path);
        item.post = Some(operation);
        true
    }

    /// Adds a component schema
    pub fn add_schema(&mut self, name: &str, schema: Schema) {
        debug!("Adding schema: {}", name);
        self.schemas.insert(name.to_string(), schema);
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn paths(&self) -> &BTreeMap<String, PathItem> {
        &self.paths
    }

    pub fn schemas(&self) -> &BTreeMap<String, Schema> {
        &self.schemas
    }

    /// Build the final OpenAPI document
    pub fn build(self) -> OpenApiDocument {
        debug!(
            "Building OpenAPI document with {} path(s) and {} schema(s)",
            self.paths.len(),
            self.schemas.len()
        );
        OpenApiDocument {
            tags: self.tags,
            paths: self.paths,
            components: Components {
                schemas: self.schemas,
            },
            ..OpenApiDocument::default()
        }
    }
}

impl OpenApiDocument {
    /// Layers a generated document onto a base document.
    ///
    /// The base keeps its version, info and servers. Tags, paths and schemas of
    /// the generated document are added, replacing base entries of the same name.
    pub fn merge(mut self, generated: OpenApiDocument) -> OpenApiDocument {
        for tag in generated.tags {
            match self.tags.iter_mut().find(|existing| existing.name == tag.name) {
                Some(existing) => *existing = tag,
                None => self.tags.push(tag),
            }
        }
        self.paths.extend(generated.paths);
        self.components.schemas.extend(generated.components.schemas);
        self
    }
}
