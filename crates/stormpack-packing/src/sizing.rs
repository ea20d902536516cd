//! Resource sizing shared by the built-in packing algorithms.

use stormpack_core::{Component, Config, Resource, keys};

use crate::error::PluginError;

/// Per-instance defaults, per-container padding, and the management
/// container's size, read from configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Sizing {
    pub instance: Resource,
    pub padding: Resource,
    pub manager: Resource,
}

impl Sizing {
    pub fn from_config(config: &Config) -> Result<Self, PluginError> {
        Ok(Self {
            instance: read_resource(
                config,
                keys::INSTANCE_CPU,
                keys::INSTANCE_RAM,
                keys::INSTANCE_DISK,
            )?,
            padding: read_resource(
                config,
                keys::CONTAINER_PADDING_CPU,
                keys::CONTAINER_PADDING_RAM,
                keys::CONTAINER_PADDING_DISK,
            )?,
            manager: read_resource(config, keys::MANAGER_CPU, keys::MANAGER_RAM, keys::MANAGER_DISK)?,
        })
    }

    /// What one instance of `component` needs: its declared request, with
    /// unset fields filled from the instance defaults.
    pub fn instance_resource(&self, component: &Component) -> Result<Resource, PluginError> {
        let request = &component.resources;
        let resource = Resource {
            cpu: request.cpu.unwrap_or(self.instance.cpu),
            ram: request.ram.unwrap_or(self.instance.ram),
            disk: request.disk.unwrap_or(self.instance.disk),
        };
        if !resource.is_valid() {
            return Err(PluginError::InvalidConfig {
                key: format!("components.{}.resources.cpu", component.name),
                reason: format!("cpu must be a non-negative number, got {}", resource.cpu),
            });
        }
        Ok(resource)
    }
}

fn read_resource(
    config: &Config,
    cpu_key: &'static str,
    ram_key: &'static str,
    disk_key: &'static str,
) -> Result<Resource, PluginError> {
    let cpu = config.get_f64(cpu_key).ok_or(PluginError::MissingConfig(cpu_key))?;
    if !cpu.is_finite() || cpu < 0.0 {
        return Err(PluginError::InvalidConfig {
            key: cpu_key.to_string(),
            reason: format!("cpu must be a non-negative number, got {cpu}"),
        });
    }
    let ram = config.get_bytes(ram_key)?.ok_or(PluginError::MissingConfig(ram_key))?;
    let disk = config.get_bytes(disk_key)?.ok_or(PluginError::MissingConfig(disk_key))?;
    Ok(Resource::new(cpu, ram, disk))
}
