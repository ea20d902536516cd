//! Layered configuration resolution.
//!
//! Four layers are merged key-by-key, later layers overriding earlier ones:
//!
//! ```text
//! defaults  →  overrides  →  command line  →  job
//! ```
//!
//! Job-derived identity is applied last so a stale override file can never
//! shadow it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::config::{Config, ConfigValue, keys};
use crate::defaults;
use crate::error::{ConfigError, ConfigResult};
use crate::job::JobDescriptor;

/// Cluster config files read from the config directory, in merge order.
pub const CLUSTER_CONFIG_FILES: &[&str] = &["cluster.toml", "packing.toml", "scheduler.toml"];

/// Placeholders substituted in cluster config string values.
pub const HOME_PLACEHOLDER: &str = "${STORMPACK_HOME}";
pub const CONF_PLACEHOLDER: &str = "${STORMPACK_CONF}";

/// Where a configuration layer came from. Ordered by precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerSource {
    Defaults,
    Overrides,
    CommandLine,
    Job,
}

impl fmt::Display for LayerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LayerSource::Defaults => "defaults",
            LayerSource::Overrides => "overrides",
            LayerSource::CommandLine => "command-line",
            LayerSource::Job => "job",
        })
    }
}

/// One configuration source tagged with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayer {
    pub source: LayerSource,
    pub config: Config,
}

impl ConfigLayer {
    pub fn new(source: LayerSource, config: Config) -> Self {
        Self { source, config }
    }
}

/// The four layers of a run, merged in their fixed order by [`ConfigLayers::resolve`].
#[derive(Debug, Clone, Default)]
pub struct ConfigLayers {
    pub defaults: Config,
    pub overrides: Config,
    pub command_line: Config,
    pub job: Config,
}

impl ConfigLayers {
    pub fn into_ordered(self) -> [ConfigLayer; 4] {
        [
            ConfigLayer::new(LayerSource::Defaults, self.defaults),
            ConfigLayer::new(LayerSource::Overrides, self.overrides),
            ConfigLayer::new(LayerSource::CommandLine, self.command_line),
            ConfigLayer::new(LayerSource::Job, self.job),
        ]
    }

    pub fn resolve(self) -> Config {
        resolve(&self.into_ordered())
    }
}

/// Merge layers in list order; for each key the last layer to set it wins.
pub fn resolve(layers: &[ConfigLayer]) -> Config {
    let mut merged: BTreeMap<String, (LayerSource, ConfigValue)> = BTreeMap::new();

    for layer in layers {
        for (key, value) in layer.config.iter() {
            if let Some((previous, _)) = merged.insert(key.to_string(), (layer.source, value.clone())) {
                debug!(
                    key,
                    shadowed = %previous,
                    by = %layer.source,
                    "config key overridden"
                );
            }
        }
    }

    debug!(keys = merged.len(), layers = layers.len(), "configuration resolved");
    merged.into_iter().map(|(k, (_, v))| (k, v)).collect()
}

/// Merge plain configs in order, last write wins.
fn merge<'a>(configs: impl IntoIterator<Item = &'a Config>) -> Config {
    let mut merged = BTreeMap::new();
    for config in configs {
        for (key, value) in config.iter() {
            merged.insert(key.to_string(), value.clone());
        }
    }
    merged.into_iter().collect()
}

/// Built-in defaults, sandbox defaults, cluster config files and release
/// info, in that order.
///
/// `home` and `config_dir` must be existing directories. `release_file`,
/// when given, must exist.
pub fn build_defaults(
    home: &Path,
    config_dir: &Path,
    release_file: Option<&Path>,
) -> ConfigResult<Config> {
    if !home.is_dir() {
        return Err(ConfigError::MissingHome(home.to_path_buf()));
    }
    if !config_dir.is_dir() {
        return Err(ConfigError::MissingConfigDir(config_dir.to_path_buf()));
    }

    let home_str = home.display().to_string();
    let conf_str = config_dir.display().to_string();

    let mut layers = vec![defaults::builtin(), defaults::sandbox()];

    for name in CLUSTER_CONFIG_FILES {
        let path = config_dir.join(name);
        if !path.is_file() {
            debug!(file = %path.display(), "cluster config file absent, skipping");
            continue;
        }
        let config = load_toml_file(&path)?
            .map_strings(|s| s.replace(HOME_PLACEHOLDER, &home_str).replace(CONF_PLACEHOLDER, &conf_str));
        debug!(file = %path.display(), entries = config.len(), "loaded cluster config");
        layers.push(config);
    }

    let mut locations = vec![
        (keys::HOME, ConfigValue::from(home_str.as_str())),
        (keys::CONFIG_PATH, ConfigValue::from(conf_str.as_str())),
    ];
    if let Some(release) = release_file {
        layers.push(load_release(release)?);
        locations.push((keys::RELEASE_FILE, ConfigValue::from(release.display().to_string())));
    }
    layers.push(Config::from_entries(locations));

    Ok(merge(&layers))
}

/// Load an optional override file. No path, or an empty one, yields an
/// empty configuration; a path that does not exist is an error.
pub fn build_overrides(path: Option<&Path>) -> ConfigResult<Config> {
    match path {
        Some(path) if !path.as_os_str().is_empty() => {
            let config = load_toml_file(path)?;
            debug!(file = %path.display(), entries = config.len(), "loaded override config");
            Ok(config)
        }
        _ => Ok(Config::empty()),
    }
}

/// Wrap already-parsed command-line parameters.
pub fn build_from_command_line(cluster: &str, role: &str, environ: &str, verbose: bool) -> Config {
    Config::from_entries([
        (keys::CLUSTER, ConfigValue::from(cluster)),
        (keys::ROLE, ConfigValue::from(role)),
        (keys::ENVIRON, ConfigValue::from(environ)),
        (keys::VERBOSE, ConfigValue::from(verbose)),
    ])
}

/// Job identity and the definition file it was read from.
pub fn build_from_job(definition_file: &Path, job: &JobDescriptor) -> Config {
    Config::from_entries([
        (keys::JOB_ID, job.id.clone()),
        (keys::JOB_NAME, job.name.clone()),
        (keys::JOB_DEFINITION_FILE, definition_file.display().to_string()),
    ])
}

fn load_toml_file(path: &Path) -> ConfigResult<Config> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Config::from_toml_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Release info lands under `build.*`. `version` is required and must be semver.
fn load_release(path: &Path) -> ConfigResult<Config> {
    let release = load_toml_file(path)?;
    let version = release
        .get_str("version")
        .ok_or_else(|| ConfigError::MissingReleaseVersion(path.to_path_buf()))?;
    let parsed = semver::Version::parse(version).map_err(|source| ConfigError::ReleaseVersion {
        version: version.to_string(),
        source,
    })?;

    let mut entries = vec![(keys::BUILD_VERSION, ConfigValue::from(parsed.to_string()))];
    for (field, key) in [
        ("git_revision", keys::BUILD_GIT_REVISION),
        ("build_time", keys::BUILD_TIME),
        ("build_user", keys::BUILD_USER),
    ] {
        if let Some(value) = release.get(field) {
            entries.push((key, value.clone()));
        }
    }
    Ok(Config::from_entries(entries))
}
