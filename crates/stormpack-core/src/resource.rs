//! CPU / RAM / disk triples.

use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Resources consumed by an instance, a container, or a whole job.
///
/// `cpu` is a core count, `ram` and `disk` are bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub cpu: f64,
    pub ram: u64,
    pub disk: u64,
}

impl Resource {
    pub const ZERO: Resource = Resource {
        cpu: 0.0,
        ram: 0,
        disk: 0,
    };

    pub fn new(cpu: f64, ram: u64, disk: u64) -> Self {
        Self { cpu, ram, disk }
    }

    /// Whether `cpu` is a finite, non-negative number.
    pub fn is_valid(&self) -> bool {
        self.cpu.is_finite() && self.cpu >= 0.0
    }

    /// Whether every field of `self` is at least the matching field of `other`.
    /// CPU is compared with a small tolerance for float summation error.
    pub fn covers(&self, other: &Resource) -> bool {
        const CPU_EPSILON: f64 = 1e-9;
        self.cpu + CPU_EPSILON >= other.cpu && self.ram >= other.ram && self.disk >= other.disk
    }
}

impl Add for Resource {
    type Output = Resource;

    fn add(self, rhs: Resource) -> Resource {
        Resource {
            cpu: self.cpu + rhs.cpu,
            ram: self.ram.saturating_add(rhs.ram),
            disk: self.disk.saturating_add(rhs.disk),
        }
    }
}

impl Sum for Resource {
    fn sum<I: Iterator<Item = Resource>>(iter: I) -> Self {
        iter.fold(Resource::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Resource> for Resource {
    fn sum<I: Iterator<Item = &'a Resource>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
