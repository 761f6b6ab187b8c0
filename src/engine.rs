//! One run of the generator, from class path to document.

use crate::classpath::Classpath;
use crate::collector::DependencyCollector;
use crate::config::ParserConfig;
use crate::detector::EndpointDetector;
use crate::error::{Error, Result};
use crate::model::ModelContext;
use crate::openapi_builder::OpenApiDocument;
use crate::parser::DescriptorParser;
use crate::plugin::{PluginContext, PluginManager};
use crate::scanner::ClasspathScanner;
use crate::serializer;
use crate::walker::Walker;
use log::{debug, info, warn};
use std::path::Path;
use std::rc::Rc;

/// The generator engine.
///
/// An engine holds a validated configuration and the class path it reads
/// classes from. Each call to [`Engine::generate`] is an independent run with
/// its own model pool, so nothing built by one run leaks into the next.
///
/// # Example
///
/// ```no_run
/// use openapi_from_classes::config::ParserConfig;
/// use openapi_from_classes::engine::Engine;
/// use std::path::Path;
///
/// let config = ParserConfig::from_file(Path::new("openapi-config.yaml")).unwrap();
/// let engine = Engine::from_config(config).unwrap();
/// let document = engine.generate().unwrap();
/// println!("{} paths", document.paths.len());
/// ```
pub struct Engine {
    config: ParserConfig,
    classpath: Rc<Classpath>,
}

impl Engine {
    /// Creates an engine reading descriptors from the configured class path.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the configuration is invalid or a class
    /// path entry does not exist, and a descriptor or signature error if a
    /// descriptor cannot be parsed.
    pub fn from_config(config: ParserConfig) -> Result<Self> {
        config.validate()?;

        let scan = ClasspathScanner::new(config.class_path.clone()).scan()?;
        for warning in &scan.warnings {
            warn!("{}", warning);
        }
        info!("Found {} descriptor files", scan.descriptor_files.len());

        let mut classpath = Classpath::with_jdk();
        classpath.extend(DescriptorParser::parse_files(&scan.descriptor_files)?);
        Ok(Self {
            config,
            classpath: Rc::new(classpath),
        })
    }

    /// Creates an engine over a prepared class path, for hosts that register
    /// runtime classes themselves. The configured class path is not scanned.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the configuration is invalid.
    pub fn with_classpath(config: ParserConfig, classpath: Classpath) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            classpath: Rc::new(classpath),
        })
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Generates the document.
    ///
    /// Detects the endpoints, collects their dependencies, walks the node graph
    /// with the configured plugins and layers the result onto the base document
    /// if one is configured. Configured `info` replaces whatever info the
    /// document had.
    ///
    /// # Errors
    ///
    /// The first error aborts the run; no partial document is returned.
    pub fn generate(&self) -> Result<OpenApiDocument> {
        let ctx = ModelContext::new(self.classpath.clone());
        let plugins = PluginManager::from_config(&self.config)?;

        let endpoints = EndpointDetector::detect(&ctx, &self.config.endpoint_annotation)?;

        let replaced_types = plugins.replaced_types();
        let elements = DependencyCollector::new(&ctx, &replaced_types).collect(endpoints)?;

        let walker = Walker::new(
            &plugins,
            PluginContext {
                models: &ctx,
                elements: &elements,
            },
        );
        let mut tree = walker.walk()?;
        let generated = tree
            .take_document()
            .ok_or_else(|| Error::config("plugins", "no plugin built a document"))?
            .build();
        debug!("Model pool holds {} models", ctx.pool().len());

        let mut document = match &self.config.open_api_base {
            Some(path) => load_base(path)?.merge(generated),
            None => generated,
        };
        if let Some(info) = &self.config.info {
            document.info = info.clone();
        }

        info!(
            "Generated {} paths and {} schemas",
            document.paths.len(),
            document.components.schemas.len()
        );
        Ok(document)
    }
}

fn load_base(path: &Path) -> Result<OpenApiDocument> {
    serializer::load_document(path).map_err(|err| {
        Error::config(
            path.display().to_string(),
            format!("cannot load base document: {:#}", err),
        )
    })
}
