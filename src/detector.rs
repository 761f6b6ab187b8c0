use crate::error::Result;
use crate::model::{ClassInfoModel, MethodInfoModel, ModelContext};
use log::{debug, info, warn};

/// Endpoint detector for finding the entry points of the API.
///
/// The `EndpointDetector` inspects every non-standard-library class on the
/// classpath and selects those carrying the configured endpoint annotation. Both
/// scanned and runtime-registered classes are considered.
pub struct EndpointDetector;

impl EndpointDetector {
    /// Detects endpoint classes.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Model context of the current run
    /// * `endpoint_annotation` - Binary name of the endpoint annotation
    ///
    /// # Returns
    ///
    /// Returns the endpoint classes sorted by binary name, so the result does not
    /// depend on the order classes were scanned or registered in.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use openapi_from_classes::classpath::Classpath;
    /// use openapi_from_classes::detector::EndpointDetector;
    /// use openapi_from_classes::model::ModelContext;
    /// use std::rc::Rc;
    ///
    /// let ctx = ModelContext::new(Rc::new(Classpath::with_jdk()));
    /// let endpoints = EndpointDetector::detect(&ctx, "com.example.Endpoint").unwrap();
    /// println!("Detected {} endpoint(s)", endpoints.len());
    /// ```
    pub fn detect(ctx: &ModelContext, endpoint_annotation: &str) -> Result<Vec<ClassInfoModel>> {
        let names = ctx.classpath().user_class_names();
        debug!("Detecting endpoints among {} classes", names.len());

        let mut endpoints = Vec::new();
        for name in names {
            let Some(class) = ctx.class_by_name(&name)? else {
                continue;
            };
            if !class.has_annotation(ctx, endpoint_annotation) {
                continue;
            }
            if !class.is_public() {
                warn!("Endpoint {} is not public", class.name());
            }
            debug!("Found endpoint: {}", class.name());
            endpoints.push(class);
        }

        info!("Detected {} endpoint(s)", endpoints.len());
        Ok(endpoints)
    }

    /// Name under which an endpoint is published: the annotation's `value`
    /// member when set, else the simple class name
    pub fn endpoint_name(
        ctx: &ModelContext,
        class: &ClassInfoModel,
        endpoint_annotation: &str,
    ) -> Result<String> {
        if let Some(annotation) = class.find_annotation(ctx, endpoint_annotation) {
            if let Some(value) = annotation.string_value("value")? {
                return Ok(value.to_string());
            }
        }
        Ok(class.simple_name().to_string())
    }

    /// Whether a method belongs to the API surface of its class
    pub fn is_api_method(method: &MethodInfoModel) -> bool {
        method.is_public() && !method.is_static() && !method.is_synthetic() && !method.is_bridge()
    }
}
