use serde_json::Value;
use std::path::PathBuf;

/// A layer of configuration, applied in the order it was added
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// YAML file on disk; missing files are an error
    File(PathBuf),
    /// YAML file on disk that is skipped when absent
    OptionalFile(PathBuf),
    /// Inline YAML document
    Yaml(String),
    /// Single value provided programmatically
    Value { key: String, value: Value },
    /// Environment variables `<PREFIX>__A__B=v`, mapped to `a.b`
    Env { prefix: String },
}

impl ConfigSource {
    /// Check if source is environment variables
    pub fn is_env(&self) -> bool {
        matches!(self, ConfigSource::Env { .. })
    }

    /// Check if source is a file
    pub fn is_file(&self) -> bool {
        matches!(self, ConfigSource::File(_) | ConfigSource::OptionalFile(_))
    }

    /// Get source description
    pub fn description(&self) -> String {
        match self {
            ConfigSource::File(path) => format!("Configuration file: {}", path.display()),
            ConfigSource::OptionalFile(path) => {
                format!("Optional configuration file: {}", path.display())
            }
            ConfigSource::Yaml(_) => "Inline YAML".to_string(),
            ConfigSource::Value { key, .. } => format!("Programmatically set: {}", key),
            ConfigSource::Env { prefix } => format!("Environment variables: {}__*", prefix),
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
