//! Immutable key/value configuration.
//!
//! A [`Config`] is built once per layer and never mutated. Cloning is cheap
//! (the entries are shared), so plugins may hold on to the configuration
//! they were initialized with.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::bytes::parse_byte_amount;
use crate::error::{ConfigError, ConfigResult};

/// Well-known configuration keys.
pub mod keys {
    pub const PACKING_CLASS: &str = "packing.class";
    /// Optional hint for the number of worker containers.
    pub const PACKING_CONTAINERS: &str = "packing.containers";

    pub const CLUSTER: &str = "cluster";
    pub const ROLE: &str = "role";
    pub const ENVIRON: &str = "environ";
    pub const VERBOSE: &str = "verbose";

    pub const JOB_ID: &str = "job.id";
    pub const JOB_NAME: &str = "job.name";
    pub const JOB_DEFINITION_FILE: &str = "job.definition.file";

    pub const HOME: &str = "home";
    pub const CONFIG_PATH: &str = "config.path";
    pub const RELEASE_FILE: &str = "release.file";

    pub const BUILD_VERSION: &str = "build.version";
    pub const BUILD_GIT_REVISION: &str = "build.git_revision";
    pub const BUILD_TIME: &str = "build.time";
    pub const BUILD_USER: &str = "build.user";

    pub const INSTANCE_CPU: &str = "instance.cpu";
    pub const INSTANCE_RAM: &str = "instance.ram";
    pub const INSTANCE_DISK: &str = "instance.disk";

    pub const CONTAINER_PADDING_CPU: &str = "container.padding.cpu";
    pub const CONTAINER_PADDING_RAM: &str = "container.padding.ram";
    pub const CONTAINER_PADDING_DISK: &str = "container.padding.disk";

    pub const MANAGER_CPU: &str = "manager.cpu";
    pub const MANAGER_RAM: &str = "manager.ram";
    pub const MANAGER_DISK: &str = "manager.disk";

    pub const SANDBOX_HOME: &str = "sandbox.home";
    pub const SANDBOX_CONFIG: &str = "sandbox.config";
    pub const SANDBOX_EXECUTOR: &str = "sandbox.binary.executor";
    pub const SANDBOX_SHELL: &str = "sandbox.binary.shell";
}

/// A single configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
    List(Vec<ConfigValue>),
    Table(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::String(_) => "string",
            ConfigValue::Bool(_) => "boolean",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::List(_) => "list",
            ConfigValue::Table(_) => "table",
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::String(s) => write!(f, "{s:?}"),
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Integer(n) => write!(f, "{n}"),
            ConfigValue::Float(x) => write!(f, "{x}"),
            ConfigValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            ConfigValue::Table(table) => {
                f.write_str("{")?;
                for (i, (k, v)) in table.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k} = {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<u32> for ConfigValue {
    fn from(value: u32) -> Self {
        ConfigValue::Integer(i64::from(value))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<toml::Value> for ConfigValue {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => ConfigValue::String(s),
            toml::Value::Integer(n) => ConfigValue::Integer(n),
            toml::Value::Float(x) => ConfigValue::Float(x),
            toml::Value::Boolean(b) => ConfigValue::Bool(b),
            toml::Value::Datetime(d) => ConfigValue::String(d.to_string()),
            toml::Value::Array(items) => {
                ConfigValue::List(items.into_iter().map(ConfigValue::from).collect())
            }
            toml::Value::Table(table) => ConfigValue::Table(
                table
                    .into_iter()
                    .map(|(k, v)| (k, ConfigValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// An immutable mapping from string keys to typed values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    entries: Arc<BTreeMap<String, ConfigValue>>,
}

impl Config {
    /// A configuration with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a configuration from key/value pairs. Later duplicates win.
    pub fn from_entries<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<ConfigValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect()
    }

    /// Parse TOML text. Nested tables are flattened into dotted keys, so
    /// `[packing] class = "x"` and `"packing.class" = "x"` are equivalent.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = toml::from_str(content)?;
        Ok(Self::from_toml_table(table))
    }

    pub fn from_toml_table(table: toml::Table) -> Self {
        let mut entries = BTreeMap::new();
        flatten_into(None, table, &mut entries);
        Self {
            entries: Arc::new(entries),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            ConfigValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Floats, or integers widened to floats.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            ConfigValue::Float(x) => Some(*x),
            ConfigValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// A byte count given either as a non-negative integer or as a
    /// byte-amount string such as `"512MB"`.
    pub fn get_bytes(&self, key: &str) -> ConfigResult<Option<u64>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let parsed = match value {
            ConfigValue::Integer(n) => u64::try_from(*n).ok(),
            ConfigValue::String(s) => parse_byte_amount(s),
            _ => None,
        };
        parsed.map(Some).ok_or_else(|| ConfigError::ByteAmount {
            key: key.to_string(),
            found: value.type_name(),
            value: value.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Apply `f` to every string value, including those nested in lists
    /// and tables.
    pub fn map_strings(&self, f: impl Fn(&str) -> String) -> Self {
        self.iter()
            .map(|(k, v)| (k.to_string(), map_value_strings(v, &f)))
            .collect()
    }
}

impl FromIterator<(String, ConfigValue)> for Config {
    fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
        Self {
            entries: Arc::new(iter.into_iter().collect()),
        }
    }
}

fn flatten_into(prefix: Option<&str>, table: toml::Table, out: &mut BTreeMap<String, ConfigValue>) {
    for (key, value) in table {
        let key = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key,
        };
        match value {
            toml::Value::Table(nested) => flatten_into(Some(&key), nested, out),
            other => {
                out.insert(key, ConfigValue::from(other));
            }
        }
    }
}

fn map_value_strings(value: &ConfigValue, f: &impl Fn(&str) -> String) -> ConfigValue {
    match value {
        ConfigValue::String(s) => ConfigValue::String(f(s)),
        ConfigValue::List(items) => {
            ConfigValue::List(items.iter().map(|v| map_value_strings(v, f)).collect())
        }
        ConfigValue::Table(table) => ConfigValue::Table(
            table
                .iter()
                .map(|(k, v)| (k.clone(), map_value_strings(v, f)))
                .collect(),
        ),
        other => other.clone(),
    }
}
