use crate::config::ConfigError;
use serde_json::{Map, Value};

/// Configuration repository addressed by dotted key paths
///
/// `database.connections.postgresql.host` walks nested mappings; a numeric
/// segment indexes into a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    values: Value,
}

impl Config {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self {
            values: Value::Object(Map::new()),
        }
    }

    /// Create a configuration from a value tree; the root must be a mapping
    pub fn from_value(values: Value) -> Result<Self, ConfigError> {
        match values {
            Value::Object(_) => Ok(Self { values }),
            Value::Null => Ok(Self::new()),
            other => Err(ConfigError::InvalidRoot {
                found: type_name(&other).to_string(),
            }),
        }
    }

    /// Raw value tree
    pub fn as_value(&self) -> &Value {
        &self.values
    }

    /// Look up a value by key path
    pub fn get(&self, key: &str) -> Option<&Value> {
        key.split('.').try_fold(&self.values, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Check if a non-null value exists at the key path
    pub fn has(&self, key: &str) -> bool {
        !matches!(self.get(key), None | Some(Value::Null))
    }

    /// Scalar value as a string, or `None` when missing or not a scalar
    pub fn get_optional_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Scalar value as a string, falling back to `default`
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get_optional_string(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// Unsigned integer, accepting numeric strings; `default` when missing
    pub fn get_u64(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Number(n)) => n
                .as_u64()
                .ok_or_else(|| ConfigError::invalid_value(key, n.to_string(), "unsigned integer")),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_value(key, s.as_str(), "unsigned integer")),
            Some(other) => Err(ConfigError::invalid_value(
                key,
                other.to_string(),
                "unsigned integer",
            )),
        }
    }

    /// Boolean, accepting `true/false/1/0/yes/no` strings; `default` when missing
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::invalid_value(key, s.as_str(), "boolean")),
            },
            Some(other) => Err(ConfigError::invalid_value(key, other.to_string(), "boolean")),
        }
    }

    /// List of strings; a single string is split on commas, missing is empty
    pub fn get_string_list(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(s
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(ConfigError::invalid_value(key, other.to_string(), "string")),
                })
                .collect(),
            Some(other) => Err(ConfigError::invalid_value(
                key,
                other.to_string(),
                "list of strings",
            )),
        }
    }

    /// Set a value at the key path, creating intermediate mappings
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let mut current = &mut self.values;
        for segment in key.split('.') {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            if let Value::Object(map) = current {
                current = map.entry(segment.to_string()).or_insert(Value::Null);
            }
        }
        *current = value.into();
    }

    /// Deep-merge another tree; mappings merge key by key, anything else replaces
    pub fn merge(&mut self, other: Value) {
        merge_values(&mut self.values, other);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_values(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => merge_values(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (target, incoming) => *target = incoming,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
