//! Packing plans: the output of a packing algorithm.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::resource::Resource;

/// One component instance placed in a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstancePlan {
    pub component: String,
    /// Index of this instance within its component (0-based).
    pub task_id: u32,
    pub resource: Resource,
}

/// A single container and the instances assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerPlan {
    pub id: String,
    pub instances: Vec<InstancePlan>,
    pub resource: Resource,
}

/// Aggregate resources for a job plus the per-container breakdown.
///
/// Containers keep the order the packing algorithm produced them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackingPlan {
    pub id: String,
    pub resource: Resource,
    containers: Vec<ContainerPlan>,
}

impl PackingPlan {
    /// Build a plan, rejecting duplicate container ids.
    pub fn new(
        id: impl Into<String>,
        resource: Resource,
        containers: Vec<ContainerPlan>,
    ) -> Result<Self, PlanError> {
        let mut seen = HashSet::new();
        for container in &containers {
            if !seen.insert(container.id.as_str()) {
                return Err(PlanError::DuplicateContainer(container.id.clone()));
            }
        }
        Ok(Self {
            id: id.into(),
            resource,
            containers,
        })
    }

    /// Build a plan whose aggregate is the sum of its containers.
    pub fn from_containers(
        id: impl Into<String>,
        containers: Vec<ContainerPlan>,
    ) -> Result<Self, PlanError> {
        let total = containers.iter().map(|c| &c.resource).sum();
        Self::new(id, total, containers)
    }

    pub fn containers(&self) -> &[ContainerPlan] {
        &self.containers
    }

    pub fn container(&self, id: &str) -> Option<&ContainerPlan> {
        self.containers.iter().find(|c| c.id == id)
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// Sum of the per-container resources.
    pub fn containers_total(&self) -> Resource {
        self.containers.iter().map(|c| &c.resource).sum()
    }

    /// Whether the aggregate equals or bounds the per-container sum.
    pub fn totals_consistent(&self) -> bool {
        self.resource.covers(&self.containers_total())
    }
}
