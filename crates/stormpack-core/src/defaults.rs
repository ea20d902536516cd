//! Built-in settings that every cluster starts from.

use crate::bytes::{GIB, MIB};
use crate::config::{Config, ConfigValue, keys};

/// Packing algorithm used when no layer names one.
pub const DEFAULT_PACKING_CLASS: &str = "stormpack_packing::RoundRobinPacking";

/// Cluster-independent defaults: packing algorithm and resource sizing.
pub fn builtin() -> Config {
    Config::from_entries([
        (keys::PACKING_CLASS, ConfigValue::from(DEFAULT_PACKING_CLASS)),
        (keys::VERBOSE, ConfigValue::from(false)),
        (keys::INSTANCE_CPU, ConfigValue::from(1.0)),
        (keys::INSTANCE_RAM, bytes(GIB)),
        (keys::INSTANCE_DISK, bytes(GIB)),
        (keys::CONTAINER_PADDING_CPU, ConfigValue::from(1.0)),
        (keys::CONTAINER_PADDING_RAM, bytes(512 * MIB)),
        (keys::CONTAINER_PADDING_DISK, bytes(GIB)),
        (keys::MANAGER_CPU, ConfigValue::from(1.0)),
        (keys::MANAGER_RAM, bytes(GIB)),
        (keys::MANAGER_DISK, bytes(GIB)),
    ])
}

/// Layout of a scheduled container's working directory.
pub fn sandbox() -> Config {
    Config::from_entries([
        (keys::SANDBOX_HOME, "./stormpack-core"),
        (keys::SANDBOX_CONFIG, "./stormpack-conf"),
        (keys::SANDBOX_EXECUTOR, "./stormpack-core/bin/stormpack-executor"),
        (keys::SANDBOX_SHELL, "./stormpack-core/bin/stormpack-shell"),
    ])
}

fn bytes(n: u64) -> ConfigValue {
    ConfigValue::Integer(n as i64)
}
