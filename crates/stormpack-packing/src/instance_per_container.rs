//! One container per instance, plus the management container.
//!
//! Containers carry no padding: each worker is exactly the size of the
//! instance it hosts. The plan always has `required_containers()` entries.

use stormpack_core::{Config, ContainerPlan, InstancePlan, PackingPlan};
use tracing::info;

use crate::error::PluginError;
use crate::plugin::{PackingPlugin, RuntimeContext};
use crate::round_robin::MANAGER_CONTAINER_ID;
use crate::sizing::Sizing;

#[derive(Debug, Default)]
pub struct InstancePerContainerPacking {
    prepared: Option<(Sizing, RuntimeContext)>,
    packed: bool,
}

impl InstancePerContainerPacking {
    pub const IDENTIFIER: &'static str = "stormpack_packing::InstancePerContainerPacking";
    pub const ALIAS: &'static str = "instance_per_container";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory() -> Result<Box<dyn PackingPlugin>, PluginError> {
        Ok(Box::new(Self::new()))
    }
}

impl PackingPlugin for InstancePerContainerPacking {
    fn initialize(&mut self, config: &Config, runtime: &RuntimeContext) -> Result<(), PluginError> {
        self.prepared = Some((Sizing::from_config(config)?, runtime.clone()));
        Ok(())
    }

    fn pack(&mut self) -> Result<PackingPlan, PluginError> {
        if self.packed {
            return Err(PluginError::AlreadyPacked);
        }
        let (sizing, runtime) = self.prepared.as_ref().ok_or(PluginError::NotInitialized)?;

        let mut containers = vec![ContainerPlan {
            id: MANAGER_CONTAINER_ID.to_string(),
            instances: Vec::new(),
            resource: sizing.manager,
        }];
        for component in &runtime.job.components {
            let resource = sizing.instance_resource(component)?;
            for task_id in 0..component.parallelism {
                containers.push(ContainerPlan {
                    id: containers.len().to_string(),
                    instances: vec![InstancePlan {
                        component: component.name.clone(),
                        task_id,
                        resource,
                    }],
                    resource,
                });
            }
        }

        let plan = PackingPlan::from_containers(format!("{}-instance-per-container", runtime.job_id), containers)?;
        self.packed = true;

        info!(
            job = %runtime.job_name,
            containers = plan.container_count(),
            "instance-per-container packing complete"
        );
        Ok(plan)
    }
}
