//! Resource report rendering.
//!
//! Projects a [`PackingPlan`] onto the report document:
//!
//! ```json
//! {
//!   "topology_name": "wordcount",
//!   "containers": { "0": { "cpu": 1.0, "ram": 1024, "disk": 2048 } },
//!   "totals": { "cpu": 1.0, "ram": 1024, "disk": 2048 }
//! }
//! ```
//!
//! Containers appear in plan order. Values are copied as-is.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use stormpack_core::{PackingPlan, Resource};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cpu for {scope} is not a finite number: {value}")]
    NonFinite { scope: String, value: f64 },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// CPU / RAM / disk figures as they appear in the report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResourceFigures {
    pub cpu: f64,
    pub ram: u64,
    pub disk: u64,
}

impl From<&Resource> for ResourceFigures {
    fn from(r: &Resource) -> Self {
        Self {
            cpu: r.cpu,
            ram: r.ram,
            disk: r.disk,
        }
    }
}

/// Container id → figures, serialized as a JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerFigures(pub Vec<(String, ResourceFigures)>);

impl Serialize for ContainerFigures {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, figures) in &self.0 {
            map.serialize_entry(id, figures)?;
        }
        map.end()
    }
}

/// The report document. Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceReport {
    pub topology_name: String,
    pub containers: ContainerFigures,
    pub totals: ResourceFigures,
}

/// Build the report for `plan`. Fails only on values JSON cannot carry.
pub fn render(job_name: &str, plan: &PackingPlan) -> Result<ResourceReport, ReportError> {
    let mut containers = Vec::with_capacity(plan.container_count());
    for container in plan.containers() {
        check_finite(&format!("container {}", container.id), &container.resource)?;
        containers.push((container.id.clone(), ResourceFigures::from(&container.resource)));
    }
    check_finite("totals", &plan.resource)?;

    Ok(ResourceReport {
        topology_name: job_name.to_string(),
        containers: ContainerFigures(containers),
        totals: ResourceFigures::from(&plan.resource),
    })
}

/// Compact JSON report.
pub fn format(job_name: &str, plan: &PackingPlan) -> Result<String, ReportError> {
    Ok(serde_json::to_string(&render(job_name, plan)?)?)
}

/// Indented JSON report.
pub fn format_pretty(job_name: &str, plan: &PackingPlan) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(&render(job_name, plan)?)?)
}

// serde_json writes non-finite floats as `null`, which would break the schema.
fn check_finite(scope: &str, resource: &Resource) -> Result<(), ReportError> {
    if resource.cpu.is_finite() {
        Ok(())
    } else {
        Err(ReportError::NonFinite {
            scope: scope.to_string(),
            value: resource.cpu,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use stormpack_core::ContainerPlan;

    fn container(id: &str, cpu: f64, ram: u64, disk: u64) -> ContainerPlan {
        ContainerPlan {
            id: id.to_string(),
            instances: Vec::new(),
            resource: Resource::new(cpu, ram, disk),
        }
    }

    fn two_container_plan() -> PackingPlan {
        PackingPlan::new(
            "plan",
            Resource::new(3.0, 3072, 6144),
            vec![container("0", 1.0, 1024, 2048), container("1", 2.0, 2048, 4096)],
        )
        .unwrap()
    }

    #[test]
    fn renders_exact_document() {
        let json = format("wordcount", &two_container_plan()).unwrap();
        assert_eq!(
            json,
            r#"{"topology_name":"wordcount","containers":{"0":{"cpu":1.0,"ram":1024,"disk":2048},"1":{"cpu":2.0,"ram":2048,"disk":4096}},"totals":{"cpu":3.0,"ram":3072,"disk":6144}}"#
        );
    }

    #[test]
    fn shape_has_one_entry_per_container() {
        let json = format("wordcount", &two_container_plan()).unwrap();
        let doc: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(doc["topology_name"], "wordcount");
        let containers = doc["containers"].as_object().unwrap();
        assert_eq!(containers.len(), 2);
        for figures in containers.values() {
            let figures = figures.as_object().unwrap();
            assert_eq!(figures.len(), 3);
            assert!(figures.values().all(Value::is_number));
        }
        let totals = doc["totals"].as_object().unwrap();
        assert_eq!(totals.len(), 3);
        assert_eq!(totals["cpu"].as_f64(), Some(3.0));
        assert_eq!(totals["ram"].as_u64(), Some(3072));
        assert_eq!(totals["disk"].as_u64(), Some(6144));
    }

    #[test]
    fn keeps_plan_container_order() {
        let plan = PackingPlan::from_containers(
            "plan",
            vec![
                container("10", 1.0, 1, 1),
                container("2", 1.0, 1, 1),
                container("b", 1.0, 1, 1),
                container("a", 1.0, 1, 1),
            ],
        )
        .unwrap();

        let report = render("job", &plan).unwrap();
        let ids: Vec<&str> = report.containers.0.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, ["10", "2", "b", "a"]);

        let json = format("job", &plan).unwrap();
        let positions: Vec<usize> = ["\"10\"", "\"2\"", "\"b\"", "\"a\""]
            .iter()
            .map(|needle| json.find(needle).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn totals_copied_not_recomputed() {
        let plan = PackingPlan::new(
            "plan",
            Resource::new(10.0, 1, 1),
            vec![container("0", 1.0, 1024, 2048)],
        )
        .unwrap();
        let report = render("job", &plan).unwrap();
        assert_eq!(report.totals, ResourceFigures { cpu: 10.0, ram: 1, disk: 1 });
    }

    #[test]
    fn empty_plan_renders_empty_containers() {
        let plan = PackingPlan::from_containers("plan", Vec::new()).unwrap();
        let json = format("job", &plan).unwrap();
        assert_eq!(
            json,
            r#"{"topology_name":"job","containers":{},"totals":{"cpu":0.0,"ram":0,"disk":0}}"#
        );
    }

    #[test]
    fn formatting_is_idempotent() {
        let plan = two_container_plan();
        assert_eq!(format("wordcount", &plan).unwrap(), format("wordcount", &plan).unwrap());
        assert_eq!(
            format_pretty("wordcount", &plan).unwrap(),
            format_pretty("wordcount", &plan).unwrap()
        );
    }

    #[test]
    fn pretty_and_compact_carry_same_document() {
        let plan = two_container_plan();
        let compact: Value = serde_json::from_str(&format("wordcount", &plan).unwrap()).unwrap();
        let pretty: Value = serde_json::from_str(&format_pretty("wordcount", &plan).unwrap()).unwrap();
        assert_eq!(compact, pretty);
    }

    #[test]
    fn non_finite_cpu_is_an_error() {
        let plan = PackingPlan::from_containers("plan", vec![container("7", f64::INFINITY, 1, 1)]).unwrap();
        let err = format("job", &plan).unwrap_err();
        assert!(err.to_string().contains("container 7"));
    }
}
