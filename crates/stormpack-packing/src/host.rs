//! Packing host. Drives a plugin through construct → initialize → pack.
//!
//! ```text
//! Unloaded ─▶ Constructed ─▶ Initialized ─▶ Packed
//!     │            │              │
//!     └────────────┴──────────────┴──▶ Failed
//! ```
//!
//! A failure anywhere discards the whole attempt; nothing is retried.

use stormpack_core::{Config, JobDescriptor, PackingPlan, keys};
use tracing::{debug, info, warn};

use crate::error::{PackingError, PackingResult};
use crate::plugin::RuntimeContext;
use crate::registry::PackingRegistry;

/// Where a host is in the two-phase protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Unloaded,
    Constructed,
    Initialized,
    Packed,
    Failed,
}

/// Runs one packing attempt against a registry.
#[derive(Debug)]
pub struct PackingHost<'r> {
    registry: &'r PackingRegistry,
    state: HostState,
}

impl<'r> PackingHost<'r> {
    pub fn new(registry: &'r PackingRegistry) -> Self {
        Self {
            registry,
            state: HostState::Unloaded,
        }
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    /// Resolve the configured algorithm, initialize it with `config` and a
    /// runtime context derived from `job`, and pack.
    ///
    /// A host runs once; any error leaves it in [`HostState::Failed`].
    pub fn run(&mut self, config: &Config, job: &JobDescriptor) -> PackingResult<PackingPlan> {
        if self.state != HostState::Unloaded {
            return Err(PackingError::HostReused);
        }
        let result = self.drive(config, job);
        if result.is_err() {
            self.state = HostState::Failed;
        }
        result
    }

    fn drive(&mut self, config: &Config, job: &JobDescriptor) -> PackingResult<PackingPlan> {
        job.validate().map_err(PackingError::InvalidJob)?;

        let identifier = config
            .get_str(keys::PACKING_CLASS)
            .ok_or(PackingError::MissingPluginKey {
                key: keys::PACKING_CLASS,
            })?;

        let mut plugin = self.registry.create(identifier)?;
        self.advance(HostState::Constructed, identifier);

        let runtime = RuntimeContext::derive(job);
        debug!(
            job_id = %runtime.job_id,
            containers = runtime.num_containers,
            "derived runtime context"
        );
        plugin
            .initialize(config, &runtime)
            .map_err(|source| PackingError::Initialize {
                identifier: identifier.to_string(),
                source,
            })?;
        self.advance(HostState::Initialized, identifier);

        let plan = plugin.pack().map_err(|source| PackingError::Pack {
            identifier: identifier.to_string(),
            source,
        })?;
        self.advance(HostState::Packed, identifier);

        if !plan.totals_consistent() {
            warn!(
                identifier,
                totals = ?plan.resource,
                containers_sum = ?plan.containers_total(),
                "plan totals are below the sum of its containers"
            );
        }

        info!(
            identifier,
            job = %runtime.job_name,
            containers = plan.container_count(),
            "packing plan ready"
        );
        Ok(plan)
    }

    fn advance(&mut self, next: HostState, identifier: &str) {
        debug!(identifier, from = ?self.state, to = ?next, "packing host transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PluginError;
    use crate::plugin::PackingPlugin;
    use crate::round_robin::RoundRobinPacking;
    use stormpack_core::{
        Component, ComponentKind, ConfigValue, ContainerPlan, Resource, ResourceRequest, defaults,
    };

    fn job(parallelism: &[u32]) -> JobDescriptor {
        JobDescriptor {
            id: "job-1".to_string(),
            name: "job".to_string(),
            components: parallelism
                .iter()
                .enumerate()
                .map(|(i, &p)| Component {
                    name: format!("c{i}"),
                    kind: ComponentKind::Operator,
                    parallelism: p,
                    resources: ResourceRequest::default(),
                })
                .collect(),
            config: Default::default(),
        }
    }

    fn config_with_class(class: &str) -> Config {
        defaults::builtin()
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .chain(std::iter::once((
                keys::PACKING_CLASS.to_string(),
                ConfigValue::from(class),
            )))
            .collect()
    }

    struct FailingInit;

    impl PackingPlugin for FailingInit {
        fn initialize(&mut self, _: &Config, _: &RuntimeContext) -> Result<(), PluginError> {
            Err(PluginError::Failed("bad cluster".to_string()))
        }

        fn pack(&mut self) -> Result<PackingPlan, PluginError> {
            unreachable!("pack after failed initialize")
        }
    }

    struct FailingPack;

    impl PackingPlugin for FailingPack {
        fn initialize(&mut self, _: &Config, _: &RuntimeContext) -> Result<(), PluginError> {
            Ok(())
        }

        fn pack(&mut self) -> Result<PackingPlan, PluginError> {
            Err(PluginError::Failed("out of capacity".to_string()))
        }
    }

    /// Records what the host handed to it and packs one container per
    /// required container.
    struct Echo {
        num_containers: u32,
    }

    impl PackingPlugin for Echo {
        fn initialize(&mut self, config: &Config, runtime: &RuntimeContext) -> Result<(), PluginError> {
            assert_eq!(config.get_str(keys::PACKING_CLASS), Some("echo"));
            self.num_containers = runtime.num_containers;
            Ok(())
        }

        fn pack(&mut self) -> Result<PackingPlan, PluginError> {
            let containers = (0..self.num_containers)
                .map(|i| ContainerPlan {
                    id: i.to_string(),
                    instances: Vec::new(),
                    resource: Resource::new(1.0, 1, 1),
                })
                .collect();
            Ok(PackingPlan::from_containers("echo", containers)?)
        }
    }

    /// Under-reports its totals.
    struct Undercount;

    impl PackingPlugin for Undercount {
        fn initialize(&mut self, _: &Config, _: &RuntimeContext) -> Result<(), PluginError> {
            Ok(())
        }

        fn pack(&mut self) -> Result<PackingPlan, PluginError> {
            let containers = vec![ContainerPlan {
                id: "0".to_string(),
                instances: Vec::new(),
                resource: Resource::new(2.0, 2, 2),
            }];
            Ok(PackingPlan::new("under", Resource::ZERO, containers)?)
        }
    }

    fn registry() -> PackingRegistry {
        let mut registry = PackingRegistry::with_builtins();
        registry.register("failing_init", || Ok(Box::new(FailingInit)));
        registry.register("failing_pack", || Ok(Box::new(FailingPack)));
        registry.register("echo", || Ok(Box::new(Echo { num_containers: 0 })));
        registry.register("undercount", || Ok(Box::new(Undercount)));
        registry.register("unconstructible", || Err(PluginError::Failed("boom".to_string())));
        registry
    }

    #[test]
    fn successful_run_reaches_packed() {
        let registry = registry();
        let mut host = PackingHost::new(&registry);
        assert_eq!(host.state(), HostState::Unloaded);

        let plan = host
            .run(&config_with_class(RoundRobinPacking::IDENTIFIER), &job(&[2, 3]))
            .unwrap();

        assert_eq!(host.state(), HostState::Packed);
        assert_eq!(plan.container_count(), 6);
    }

    #[test]
    fn plugin_sees_config_and_derived_container_count() {
        let registry = registry();
        let mut host = PackingHost::new(&registry);
        let plan = host.run(&config_with_class("echo"), &job(&[2, 3])).unwrap();
        assert_eq!(plan.container_count(), 6);
    }

    #[test]
    fn missing_class_key_fails() {
        let registry = registry();
        let mut host = PackingHost::new(&registry);
        let err = host.run(&Config::empty(), &job(&[1])).unwrap_err();

        assert!(matches!(err, PackingError::MissingPluginKey { .. }));
        assert_eq!(host.state(), HostState::Failed);
    }

    #[test]
    fn unknown_class_fails_from_unloaded() {
        let registry = registry();
        let mut host = PackingHost::new(&registry);
        let err = host
            .run(&config_with_class("com.example.Nope"), &job(&[1]))
            .unwrap_err();

        assert_eq!(err.identifier(), Some("com.example.Nope"));
        assert_eq!(host.state(), HostState::Failed);
    }

    #[test]
    fn construction_failure_fails() {
        let registry = registry();
        let mut host = PackingHost::new(&registry);
        let err = host.run(&config_with_class("unconstructible"), &job(&[1])).unwrap_err();
        assert!(matches!(err, PackingError::Construction { .. }));
        assert_eq!(host.state(), HostState::Failed);
    }

    #[test]
    fn initialize_failure_fails_with_source() {
        let registry = registry();
        let mut host = PackingHost::new(&registry);
        let err = host.run(&config_with_class("failing_init"), &job(&[1])).unwrap_err();

        match &err {
            PackingError::Initialize { identifier, source } => {
                assert_eq!(identifier, "failing_init");
                assert_eq!(source.to_string(), "bad cluster");
            }
            other => panic!("expected initialize error, got {other:?}"),
        }
        assert_eq!(host.state(), HostState::Failed);
    }

    #[test]
    fn pack_failure_fails_with_source() {
        let registry = registry();
        let mut host = PackingHost::new(&registry);
        let err = host.run(&config_with_class("failing_pack"), &job(&[1])).unwrap_err();

        assert!(matches!(err, PackingError::Pack { .. }));
        assert_eq!(
            std::error::Error::source(&err).map(|s| s.to_string()),
            Some("out of capacity".to_string())
        );
        assert_eq!(host.state(), HostState::Failed);
    }

    #[test]
    fn inconsistent_totals_are_not_rejected() {
        let registry = registry();
        let mut host = PackingHost::new(&registry);
        let plan = host.run(&config_with_class("undercount"), &job(&[1])).unwrap();
        assert!(!plan.totals_consistent());
        assert_eq!(host.state(), HostState::Packed);
    }

    #[test]
    fn oversized_job_fails_before_construction() {
        let registry = registry();
        let mut host = PackingHost::new(&registry);
        let err = host
            .run(&config_with_class("echo"), &job(&[u32::MAX, 1]))
            .unwrap_err();

        assert!(matches!(err, PackingError::InvalidJob(_)));
        assert_eq!(err.identifier(), None);
        assert_eq!(host.state(), HostState::Failed);
    }

    #[test]
    fn host_runs_once() {
        let registry = registry();
        let mut host = PackingHost::new(&registry);
        let config = config_with_class("round_robin");
        host.run(&config, &job(&[1])).unwrap();

        assert!(matches!(
            host.run(&config, &job(&[1])),
            Err(PackingError::HostReused)
        ));
        assert_eq!(host.state(), HostState::Packed);
    }
}
