use crate::error::{Error, Result};
use crate::openapi_builder::Info;
use crate::plugin::{self, DEFAULT_PLUGINS};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration of one engine run.
///
/// Read from YAML or JSON with kebab-case keys:
///
/// ```yaml
/// endpoint-annotation: com.example.Endpoint
/// endpoint-exposed-annotation: com.example.EndpointExposed
/// class-path: [classes]
/// open-api-base: base.yaml
/// plugins:
///   use:
///     - name: transfer-types
///       configuration:
///         types:
///           com.example.Money: java.math.BigDecimal
///   disable:
///     - name: nonnull
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ParserConfig {
    /// Binary name of the annotation marking endpoint classes
    pub endpoint_annotation: String,
    /// Binary name of the annotation marking ancestors whose methods belong to
    /// the endpoints extending them
    pub endpoint_exposed_annotation: String,
    /// Directories holding class descriptor files
    #[serde(default)]
    pub class_path: Vec<PathBuf>,
    /// Document the generated one is layered onto
    #[serde(default)]
    pub open_api_base: Option<PathBuf>,
    /// Info section of the generated document, replacing that of the base document
    #[serde(default)]
    pub info: Option<Info>,
    #[serde(default)]
    pub plugins: PluginsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PluginsConfig {
    /// Start from no plugins instead of the default set
    #[serde(default)]
    pub disable_all_defaults: bool,
    #[serde(default, rename = "use")]
    pub use_plugins: Vec<PluginUse>,
    #[serde(default)]
    pub disable: Vec<PluginRef>,
}

/// A plugin to run, optionally with a custom order and configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginUse {
    pub name: String,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub configuration: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginRef {
    pub name: String,
}

impl ParserConfig {
    pub fn new(
        endpoint_annotation: impl Into<String>,
        exposed_annotation: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_annotation: endpoint_annotation.into(),
            endpoint_exposed_annotation: exposed_annotation.into(),
            class_path: Vec::new(),
            open_api_base: None,
            info: None,
            plugins: PluginsConfig::default(),
        }
    }

    /// Loads a configuration file, JSON when the extension is `json`, YAML
    /// otherwise.
    ///
    /// Relative `class-path` entries and the base document path are taken
    /// relative to the directory of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialized.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        let mut config: ParserConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };

        if let Some(base_dir) = path.parent() {
            for entry in &mut config.class_path {
                if entry.is_relative() {
                    *entry = base_dir.join(entry.as_path());
                }
            }
            if let Some(base) = config.open_api_base.as_mut() {
                if base.is_relative() {
                    *base = base_dir.join(base.as_path());
                }
            }
        }
        Ok(config)
    }

    /// Checks the configuration before any class is loaded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending value when an annotation
    /// name is empty, both annotations are the same, or the plugin section is
    /// inconsistent (see [`ParserConfig::effective_plugins`]) or carries a
    /// configuration its plugin rejects.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint_annotation.trim().is_empty() {
            return Err(Error::config(
                &self.endpoint_annotation,
                "endpoint-annotation must not be empty",
            ));
        }
        if self.endpoint_exposed_annotation.trim().is_empty() {
            return Err(Error::config(
                &self.endpoint_exposed_annotation,
                "endpoint-exposed-annotation must not be empty",
            ));
        }
        if self.endpoint_annotation == self.endpoint_exposed_annotation {
            return Err(Error::config(
                &self.endpoint_annotation,
                "endpoint-annotation and endpoint-exposed-annotation must differ",
            ));
        }

        for entry in self.effective_plugins()? {
            plugin::create_plugin(&entry.name, entry.configuration.as_ref(), self)?;
        }
        info!("Configuration is valid");
        Ok(())
    }

    /// Plugins that run, sorted by order; plugins of equal order keep their
    /// position (defaults first, then `use` entries as listed).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for unknown plugin names, a plugin used twice,
    /// a plugin both used and disabled, or an empty result.
    pub fn effective_plugins(&self) -> Result<Vec<PluginUse>> {
        let mut used = HashSet::new();
        for entry in &self.plugins.use_plugins {
            if !plugin::is_known_plugin(&entry.name) {
                return Err(Error::config(&entry.name, "unknown plugin"));
            }
            if !used.insert(entry.name.as_str()) {
                return Err(Error::config(&entry.name, "plugin is used more than once"));
            }
        }

        let mut disabled = HashSet::new();
        for entry in &self.plugins.disable {
            if !plugin::is_known_plugin(&entry.name) {
                return Err(Error::config(&entry.name, "unknown plugin"));
            }
            if used.contains(entry.name.as_str()) {
                return Err(Error::config(&entry.name, "plugin is both used and disabled"));
            }
            disabled.insert(entry.name.as_str());
        }

        let mut plugins: Vec<(i32, PluginUse)> = Vec::new();
        if !self.plugins.disable_all_defaults {
            for (name, order) in DEFAULT_PLUGINS {
                if disabled.contains(name) || used.contains(name) {
                    continue;
                }
                plugins.push((
                    *order,
                    PluginUse {
                        name: name.to_string(),
                        order: Some(*order),
                        configuration: None,
                    },
                ));
            }
        }
        for entry in &self.plugins.use_plugins {
            let order = entry.order.unwrap_or_else(|| plugin::default_order(&entry.name));
            plugins.push((order, entry.clone()));
        }

        if plugins.is_empty() {
            return Err(Error::config("plugins", "no plugin left to run"));
        }

        plugins.sort_by_key(|(order, _)| *order);
        Ok(plugins.into_iter().map(|(_, entry)| entry).collect())
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

    fn config() -> ParserConfig {
        ParserConfig::new("com.example.Endpoint", "com.example.EndpointExposed")
    }

    fn names(config: &ParserConfig) -> Vec<String> {
        config
            .effective_plugins()
            .unwrap()
            .into_iter()
            .map(|plugin| plugin.name)
            .collect()
    }

    fn config_error(result: Result<()>) -> String {
        match result {
            Err(Error::Config { value, .. }) => value,
            other => panic!("expected a configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_file(
            &temp_dir,
            "config.yaml",
            r#"
endpoint-annotation: com.example.Endpoint
endpoint-exposed-annotation: com.example.EndpointExposed
class-path: [classes]
info:
  title: Shop
  version: "1.2"
plugins:
  use:
    - name: transfer-types
      configuration:
        types:
          com.example.Money: java.math.BigDecimal
"#,
        );

        let config = ParserConfig::from_file(&path).unwrap();
        assert_eq!(config.class_path, vec![temp_dir.path().join("classes")]);
        assert_eq!(config.info.as_ref().unwrap().title, "Shop");
        assert_eq!(config.plugins.use_plugins.len(), 1);
        config.validate().unwrap();
    }

    #[test]
    fn test_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_temp_file(
            &temp_dir,
            "config.json",
            r#"{"endpoint-annotation": "a.Endpoint", "endpoint-exposed-annotation": "a.Exposed"}"#,
        );
        let config = ParserConfig::from_file(&path).unwrap();
        assert_eq!(config.endpoint_annotation, "a.Endpoint");
        assert!(config.class_path.is_empty());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result: std::result::Result<ParserConfig, _> = serde_yaml::from_str(
            "endpoint-annotation: a\nendpoint-exposed-annotation: b\nendpoint-annotations: c\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_default_plugins() {
        assert_eq!(names(&config()), vec!["transfer-types", "backbone", "nonnull"]);
    }

    #[test]
    fn test_disable_and_use() {
        let mut config = config();
        config.plugins.disable.push(PluginRef {
            name: "nonnull".to_string(),
        });
        assert_eq!(names(&config), vec!["transfer-types", "backbone"]);

        let mut config = self::config();
        config.plugins.disable_all_defaults = true;
        config.plugins.use_plugins.push(PluginUse {
            name: "backbone".to_string(),
            order: None,
            configuration: None,
        });
        assert_eq!(names(&config), vec!["backbone"]);
    }

    #[test]
    fn test_empty_annotation() {
        let mut config = config();
        config.endpoint_annotation = " ".to_string();
        assert_eq!(config_error(config.validate()), " ");
    }

    #[test]
    fn test_identical_annotations() {
        let config = ParserConfig::new("com.example.Endpoint", "com.example.Endpoint");
        assert_eq!(config_error(config.validate()), "com.example.Endpoint");
    }

    #[test]
    fn test_unknown_plugin() {
        let mut config = config();
        config.plugins.disable.push(PluginRef {
            name: "swagger".to_string(),
        });
        assert_eq!(config_error(config.validate()), "swagger");
    }

    #[test]
    fn test_used_and_disabled() {
        let mut config = config();
        config.plugins.use_plugins.push(PluginUse {
            name: "nonnull".to_string(),
            order: None,
            configuration: None,
        });
        config.plugins.disable.push(PluginRef {
            name: "nonnull".to_string(),
        });
        assert_eq!(config_error(config.validate()), "nonnull");
    }

    #[test]
    fn test_duplicate_use() {
        let mut config = config();
        for _ in 0..2 {
            config.plugins.use_plugins.push(PluginUse {
                name: "backbone".to_string(),
                order: None,
                configuration: None,
            });
        }
        assert_eq!(config_error(config.validate()), "backbone");
    }

    #[test]
    fn test_no_plugin_left() {
        let mut config = config();
        config.plugins.disable_all_defaults = true;
        assert_eq!(config_error(config.validate()), "plugins");
    }

    #[test]
    fn test_bad_plugin_configuration() {
        let mut config = config();
        config.plugins.use_plugins.push(PluginUse {
            name: "nonnull".to_string(),
            order: None,
            configuration: Some(serde_json::json!({ "nonnull": 42 })),
        });
        assert_eq!(config_error(config.validate()), "nonnull");
    }
}
