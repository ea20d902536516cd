//! stormpack-packing — packing algorithm host and resource reports.
//!
//! The host resolves the algorithm named by `packing.class` from a
//! [`PackingRegistry`], initializes it with the resolved configuration and a
//! [`RuntimeContext`] derived from the job, and asks it for a
//! [`PackingPlan`](stormpack_core::PackingPlan). The [`report`] module turns
//! that plan into the JSON document the CLI prints.
//!
//! # Components
//!
//! - **`plugin`**: the `PackingPlugin` capability and runtime context
//! - **`registry`**: identifier → factory table
//! - **`host`**: the construct/initialize/pack state machine
//! - **`round_robin`**, **`instance_per_container`**: built-in algorithms
//! - **`report`**: plan → report document

pub mod error;
pub mod host;
pub mod instance_per_container;
pub mod plugin;
pub mod registry;
pub mod report;
pub mod round_robin;
mod sizing;

pub use error::{PackingError, PackingResult, PluginError};
pub use host::{HostState, PackingHost};
pub use instance_per_container::InstancePerContainerPacking;
pub use plugin::{PackingPlugin, RuntimeContext};
pub use registry::{PackingRegistry, PluginFactory};
pub use report::{ReportError, ResourceReport};
pub use round_robin::RoundRobinPacking;
