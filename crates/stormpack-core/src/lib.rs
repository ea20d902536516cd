//! stormpack-core — shared types for the resource estimator.
//!
//! - **`config`**: immutable key/value configuration and well-known keys
//! - **`layers`**: building and merging the four configuration layers
//! - **`job`**: job definitions and container-count derivation
//! - **`resource`** / **`plan`**: resource triples and packing plans

pub mod bytes;
pub mod config;
pub mod defaults;
pub mod error;
pub mod job;
pub mod layers;
pub mod plan;
pub mod resource;

pub use config::{Config, ConfigValue, keys};
pub use error::{ConfigError, ConfigResult, JobError, PlanError};
pub use job::{Component, ComponentKind, JobDescriptor, ResourceRequest};
pub use layers::{ConfigLayer, ConfigLayers, LayerSource};
pub use plan::{ContainerPlan, InstancePlan, PackingPlan};
pub use resource::Resource;
