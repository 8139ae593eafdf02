use crate::config::{Config, ConfigError, ConfigSource};
use serde_json::Value;
use std::path::PathBuf;

/// Layered configuration builder
///
/// Sources are applied in the order they were added; later sources override
/// earlier ones key by key.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    sources: Vec<ConfigSource>,
}

impl ConfigBuilder {
    /// Create a builder with no sources
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required YAML file
    pub fn add_yaml_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(ConfigSource::File(path.into()));
        self
    }

    /// Add a YAML file that is skipped when missing
    pub fn add_optional_yaml_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(ConfigSource::OptionalFile(path.into()));
        self
    }

    /// Add an inline YAML document
    pub fn add_yaml_str(mut self, yaml: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Yaml(yaml.into()));
        self
    }

    /// Set a single value at a key path
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sources.push(ConfigSource::Value {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Apply environment overrides `<PREFIX>__A__B=v` as `a.b = v`
    pub fn add_env_overrides(mut self, prefix: impl Into<String>) -> Self {
        self.sources.push(ConfigSource::Env {
            prefix: prefix.into(),
        });
        self
    }

    /// Sources in application order
    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    /// Load every source into a [`Config`]
    pub fn build(&self) -> Result<Config, ConfigError> {
        let mut config = Config::new();

        for source in &self.sources {
            tracing::debug!("Loading configuration from {}", source);
            match source {
                ConfigSource::File(path) => {
                    config.merge(read_yaml_file(path)?);
                }
                ConfigSource::OptionalFile(path) => {
                    if path.exists() {
                        config.merge(read_yaml_file(path)?);
                    } else {
                        tracing::debug!("Skipping missing configuration file {}", path.display());
                    }
                }
                ConfigSource::Yaml(yaml) => {
                    config.merge(parse_yaml(yaml)?);
                }
                ConfigSource::Value { key, value } => config.set(key, value.clone()),
                ConfigSource::Env { prefix } => {
                    for (key, value) in env_overrides(prefix, std::env::vars()) {
                        config.set(&key, value);
                    }
                }
            }
        }

        Ok(config)
    }
}

fn read_yaml_file(path: &PathBuf) -> Result<Value, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileSystemError {
        path: path.display().to_string(),
        source,
    })?;
    parse_yaml(&contents)
}

fn parse_yaml(yaml: &str) -> Result<Value, ConfigError> {
    let value: Value = serde_yaml::from_str(yaml)?;
    // root must be a mapping
    Config::from_value(value.clone())?;
    Ok(value)
}

/// Translate `<PREFIX>__DATABASE__DEFAULT=pg` into `("database.default", "pg")`
fn env_overrides<I>(prefix: &str, vars: I) -> Vec<(String, Value)>
where
    I: IntoIterator<Item = (String, String)>,
{
    let marker = format!("{}__", prefix);
    let mut overrides: Vec<(String, Value)> = vars
        .into_iter()
        .filter_map(|(name, raw)| {
            let rest = name.strip_prefix(&marker)?;
            if rest.is_empty() {
                return None;
            }
            let key = rest
                .split("__")
                .map(|segment| segment.to_lowercase())
                .collect::<Vec<_>>()
                .join(".");
            Some((key, env_value(&raw)))
        })
        .collect();
    overrides.sort_by(|a, b| a.0.cmp(&b.0));
    overrides
}

/// Booleans and numbers keep their type; everything else stays a string
fn env_value(raw: &str) -> Value {
    match serde_yaml::from_str::<Value>(raw) {
        Ok(value @ (Value::Bool(_) | Value::Number(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_layers_apply_in_order() {
        let config = ConfigBuilder::new()
            .add_yaml_str("app:\n  name: first\n  timezone: UTC\n")
            .add_yaml_str("app:\n  name: second\n")
            .set("app.env", "testing")
            .build()
            .unwrap();

        assert_eq!(config.get_string("app.name", ""), "second");
        assert_eq!(config.get_string("app.timezone", ""), "UTC");
        assert_eq!(config.get_string("app.env", ""), "testing");
    }

    #[test]
    fn test_missing_required_file() {
        let err = ConfigBuilder::new()
            .add_yaml_file("/definitely/not/here.yaml")
            .build()
            .unwrap_err();

        assert!(matches!(err, ConfigError::FileSystemError { .. }));
    }

    #[test]
    fn test_missing_optional_file_is_skipped() {
        let config = ConfigBuilder::new()
            .add_optional_yaml_file("/definitely/not/here.yaml")
            .set("app.name", "demo")
            .build()
            .unwrap();

        assert_eq!(config.get_string("app.name", ""), "demo");
    }

    #[test]
    fn test_non_mapping_document_is_rejected() {
        let err = ConfigBuilder::new().add_yaml_str("- a\n- b\n").build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRoot { .. }));
    }

    #[test]
    fn test_env_override_mapping() {
        let vars = vec![
            ("CADENZA__DATABASE__CONNECTIONS__POSTGRESQL__PORT".to_string(), "6543".to_string()),
            ("CADENZA__APP__DEBUG".to_string(), "true".to_string()),
            ("CADENZA__APP__NAME".to_string(), "demo: app".to_string()),
            ("OTHER__APP__NAME".to_string(), "ignored".to_string()),
            ("CADENZA__".to_string(), "ignored".to_string()),
        ];

        let overrides = env_overrides("CADENZA", vars);
        assert_eq!(
            overrides,
            vec![
                ("app.debug".to_string(), Value::Bool(true)),
                ("app.name".to_string(), Value::String("demo: app".to_string())),
                (
                    "database.connections.postgresql.port".to_string(),
                    Value::from(6543)
                ),
            ]
        );
    }

    #[test]
    #[serial]
    fn test_env_overrides_from_process() {
        std::env::set_var("CADENZA_TEST__APP__TIMEZONE", "Asia/Jakarta");

        let config = ConfigBuilder::new()
            .set("app.timezone", "UTC")
            .add_env_overrides("CADENZA_TEST")
            .build()
            .unwrap();

        std::env::remove_var("CADENZA_TEST__APP__TIMEZONE");
        assert_eq!(config.get_string("app.timezone", ""), "Asia/Jakarta");
    }
}
