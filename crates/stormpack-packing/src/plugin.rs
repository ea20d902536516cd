//! The packing capability and the runtime context handed to it.

use std::sync::Arc;

use stormpack_core::{Config, JobDescriptor, PackingPlan};

use crate::error::PluginError;

/// A packing algorithm.
///
/// The host calls [`initialize`](PackingPlugin::initialize) exactly once and
/// then [`pack`](PackingPlugin::pack) exactly once. Implementations may keep
/// clones of the configuration and runtime context between the two calls.
pub trait PackingPlugin {
    fn initialize(&mut self, config: &Config, runtime: &RuntimeContext) -> Result<(), PluginError>;

    fn pack(&mut self) -> Result<PackingPlan, PluginError>;
}

/// Job-specific inputs derived for a packing plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeContext {
    pub job_id: String,
    pub job_name: String,
    pub job: Arc<JobDescriptor>,
    /// Worker containers plus one management container.
    pub num_containers: u32,
}

impl RuntimeContext {
    pub fn derive(job: &JobDescriptor) -> Self {
        Self::from_shared(Arc::new(job.clone()))
    }

    pub fn from_shared(job: Arc<JobDescriptor>) -> Self {
        Self {
            job_id: job.id.clone(),
            job_name: job.name.clone(),
            num_containers: job.required_containers(),
            job,
        }
    }
}
