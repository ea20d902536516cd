//! Round-robin packing.
//!
//! Instances are dealt across worker containers one at a time, in component
//! declaration order. Container `"0"` is reserved for job management; workers
//! are numbered from `"1"`. Each worker is sized as the sum of its instances
//! plus a fixed padding for per-container overhead.

use stormpack_core::{Config, ContainerPlan, InstancePlan, PackingPlan, Resource, keys};
use tracing::{debug, info};

use crate::error::PluginError;
use crate::plugin::{PackingPlugin, RuntimeContext};
use crate::sizing::Sizing;

pub(crate) const MANAGER_CONTAINER_ID: &str = "0";

#[derive(Debug)]
struct Prepared {
    sizing: Sizing,
    runtime: RuntimeContext,
    worker_hint: Option<u32>,
}

#[derive(Debug, Default)]
pub struct RoundRobinPacking {
    prepared: Option<Prepared>,
    packed: bool,
}

impl RoundRobinPacking {
    pub const IDENTIFIER: &'static str = "stormpack_packing::RoundRobinPacking";
    pub const ALIAS: &'static str = "round_robin";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory() -> Result<Box<dyn PackingPlugin>, PluginError> {
        Ok(Box::new(Self::new()))
    }
}

impl PackingPlugin for RoundRobinPacking {
    fn initialize(&mut self, config: &Config, runtime: &RuntimeContext) -> Result<(), PluginError> {
        let worker_hint = match config.get_i64(keys::PACKING_CONTAINERS) {
            None => None,
            Some(n) => Some(u32::try_from(n).ok().filter(|n| *n > 0).ok_or_else(|| {
                PluginError::InvalidConfig {
                    key: keys::PACKING_CONTAINERS.to_string(),
                    reason: format!("expected a positive container count, got {n}"),
                }
            })?),
        };

        self.prepared = Some(Prepared {
            sizing: Sizing::from_config(config)?,
            runtime: runtime.clone(),
            worker_hint,
        });
        Ok(())
    }

    fn pack(&mut self) -> Result<PackingPlan, PluginError> {
        if self.packed {
            return Err(PluginError::AlreadyPacked);
        }
        let Prepared {
            sizing,
            runtime,
            worker_hint,
        } = self.prepared.as_ref().ok_or(PluginError::NotInitialized)?;

        let mut instances = Vec::new();
        for component in &runtime.job.components {
            let resource = sizing.instance_resource(component)?;
            instances.extend((0..component.parallelism).map(|task_id| InstancePlan {
                component: component.name.clone(),
                task_id,
                resource,
            }));
        }

        let workers = if instances.is_empty() {
            0
        } else {
            let wanted = worker_hint.unwrap_or(runtime.num_containers.saturating_sub(1));
            (wanted as usize).clamp(1, instances.len())
        };
        debug!(
            job = %runtime.job_name,
            instances = instances.len(),
            workers,
            "dealing instances round robin"
        );

        let mut buckets: Vec<Vec<InstancePlan>> = vec![Vec::new(); workers];
        for (i, instance) in instances.into_iter().enumerate() {
            buckets[i % workers].push(instance);
        }

        let mut containers = Vec::with_capacity(workers + 1);
        containers.push(ContainerPlan {
            id: MANAGER_CONTAINER_ID.to_string(),
            instances: Vec::new(),
            resource: sizing.manager,
        });
        for (i, bucket) in buckets.into_iter().enumerate() {
            let used: Resource = bucket.iter().map(|inst| &inst.resource).sum();
            containers.push(ContainerPlan {
                id: (i + 1).to_string(),
                instances: bucket,
                resource: used + sizing.padding,
            });
        }

        let plan = PackingPlan::from_containers(format!("{}-round-robin", runtime.job_id), containers)?;
        self.packed = true;

        info!(
            job = %runtime.job_name,
            containers = plan.container_count(),
            cpu = plan.resource.cpu,
            ram = plan.resource.ram,
            disk = plan.resource.disk,
            "round-robin packing complete"
        );
        Ok(plan)
    }
}
