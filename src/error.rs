use std::path::PathBuf;

/// Result type alias for the engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the engine.
///
/// Every variant is terminal for the current run: the engine never retries and
/// never returns a partially built document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or contradictory configuration, detected before traversal starts
    #[error("configuration error: {message} (offending value: `{value}`)")]
    Config { value: String, message: String },

    /// A referenced class cannot be found on the classpath
    #[error("cannot resolve class `{0}`")]
    Resolution(String),

    /// A class descriptor file could not be read or understood
    #[error("invalid class descriptor {}: {message}", file.display())]
    Descriptor { file: PathBuf, message: String },

    /// A JVM type signature string is malformed
    #[error("malformed signature `{signature}` at offset {offset}: {message}")]
    Signature {
        signature: String,
        offset: usize,
        message: String,
    },

    /// Reading an annotation member reflectively failed
    #[error("failed to read member `{member}` of annotation `{annotation}`: {message}")]
    ModelConstruction {
        annotation: String,
        member: String,
        message: String,
    },

    /// A plugin failed during resolve, scan, enter or exit
    #[error("plugin `{plugin}` failed: {message}")]
    Plugin { plugin: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub fn config(value: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            value: value.into(),
            message: message.into(),
        }
    }

    pub fn plugin(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Plugin {
            plugin: plugin.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(format!("YAML: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_offending_value() {
        let err = Error::config("unknown-plugin", "no plugin is registered under this name");
        let message = err.to_string();
        assert!(message.contains("unknown-plugin"));
        assert!(message.contains("no plugin is registered"));
    }

    #[test]
    fn test_resolution_error_names_class() {
        let err = Error::Resolution("com.example.Missing".to_string());
        assert_eq!(err.to_string(), "cannot resolve class `com.example.Missing`");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
