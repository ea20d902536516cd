//! Packing error types.

use stormpack_core::{ConfigError, JobError, PlanError};
use thiserror::Error;

/// Errors raised by a packing plugin.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("pack called before initialize")]
    NotInitialized,

    #[error("pack already called")]
    AlreadyPacked,

    #[error("missing config key: {0}")]
    MissingConfig(&'static str),

    #[error("invalid value for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("{0}")]
    Failed(String),
}

/// Errors surfaced at the host boundary. Any of these means no plan and
/// therefore no report.
#[derive(Debug, Error)]
pub enum PackingError {
    #[error("no packing algorithm configured (set {key})")]
    MissingPluginKey { key: &'static str },

    #[error("unknown packing algorithm: {identifier}")]
    UnknownPlugin { identifier: String },

    #[error("failed to construct packing algorithm {identifier}")]
    Construction {
        identifier: String,
        #[source]
        source: PluginError,
    },

    #[error("packing algorithm {identifier} failed to initialize")]
    Initialize {
        identifier: String,
        #[source]
        source: PluginError,
    },

    #[error("packing algorithm {identifier} failed to pack")]
    Pack {
        identifier: String,
        #[source]
        source: PluginError,
    },

    #[error("job cannot be packed")]
    InvalidJob(#[source] JobError),

    #[error("packing host already used")]
    HostReused,
}

impl PackingError {
    /// The plugin identifier involved, when one was resolved.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            PackingError::UnknownPlugin { identifier }
            | PackingError::Construction { identifier, .. }
            | PackingError::Initialize { identifier, .. }
            | PackingError::Pack { identifier, .. } => Some(identifier),
            PackingError::MissingPluginKey { .. }
            | PackingError::InvalidJob(_)
            | PackingError::HostReused => None,
        }
    }
}

pub type PackingResult<T> = Result<T, PackingError>;
