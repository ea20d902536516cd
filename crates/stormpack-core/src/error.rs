//! Error types for configuration loading, job definitions, and plans.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while assembling configuration layers.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("home directory not found: {}", .0.display())]
    MissingHome(PathBuf),

    #[error("config directory not found: {}", .0.display())]
    MissingConfigDir(PathBuf),

    #[error("config file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("release file {} has no version", .0.display())]
    MissingReleaseVersion(PathBuf),

    #[error("invalid release version {version:?}: {source}")]
    ReleaseVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("invalid byte amount for {key}: {found} {value}")]
    ByteAmount {
        key: String,
        found: &'static str,
        value: String,
    },
}

/// Errors raised while loading or validating a job definition.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to read job definition {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse job definition {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse job definition {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid job definition: {0}")]
    Invalid(String),
}

/// Errors raised while assembling a packing plan.
#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("duplicate container id: {0}")]
    DuplicateContainer(String),
}
