//! Job (topology) definitions.
//!
//! A job is a graph of components, each declaring how many parallel
//! instances it runs and, optionally, how much each instance needs.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bytes::deserialize_opt_bytes;
use crate::error::JobError;

/// Whether a component produces the stream or transforms it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Source,
    Operator,
}

/// Per-instance resources a component asks for. Unset fields fall back
/// to the cluster's `instance.*` defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub cpu: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_opt_bytes")]
    pub ram: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_opt_bytes")]
    pub disk: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub kind: ComponentKind,
    pub parallelism: u32,
    #[serde(default)]
    pub resources: ResourceRequest,
}

/// A parsed job definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub components: Vec<Component>,
    /// Free-form job-level settings.
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

impl JobDescriptor {
    /// Load a job definition. `.json` files are parsed as JSON, anything
    /// else as TOML.
    pub fn from_file(path: &Path) -> Result<Self, JobError> {
        let content = std::fs::read_to_string(path).map_err(|source| JobError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let job: JobDescriptor = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|source| JobError::Json {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            toml::from_str(&content).map_err(|source| JobError::Toml {
                path: path.to_path_buf(),
                source,
            })?
        };

        job.validate()?;
        Ok(job)
    }

    pub fn validate(&self) -> Result<(), JobError> {
        if self.id.trim().is_empty() {
            return Err(JobError::Invalid("job id is empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(JobError::Invalid("job name is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for component in &self.components {
            if !seen.insert(component.name.as_str()) {
                return Err(JobError::Invalid(format!(
                    "duplicate component name: {}",
                    component.name
                )));
            }
        }
        if self.checked_required_containers().is_none() {
            return Err(JobError::Invalid(format!(
                "total parallelism exceeds {} containers",
                u32::MAX
            )));
        }
        Ok(())
    }

    /// Sum of declared parallelism across all components. Saturates; a job
    /// that passed [`validate`](Self::validate) never does.
    pub fn total_instances(&self) -> u32 {
        self.components
            .iter()
            .fold(0u32, |total, c| total.saturating_add(c.parallelism))
    }

    /// Containers the job needs: one per unit of parallelism plus one
    /// reserved for job management. Saturates like [`total_instances`](Self::total_instances).
    pub fn required_containers(&self) -> u32 {
        self.total_instances().saturating_add(1)
    }

    /// [`required_containers`](Self::required_containers), or `None` when the
    /// count does not fit in a `u32`.
    pub fn checked_required_containers(&self) -> Option<u32> {
        self.components
            .iter()
            .try_fold(0u32, |total, c| total.checked_add(c.parallelism))?
            .checked_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes::{GIB, MIB};
    use std::fs;

    fn component(name: &str, parallelism: u32) -> Component {
        Component {
            name: name.to_string(),
            kind: ComponentKind::Operator,
            parallelism,
            resources: ResourceRequest::default(),
        }
    }

    fn job(components: Vec<Component>) -> JobDescriptor {
        JobDescriptor {
            id: "wordcount-1".to_string(),
            name: "wordcount".to_string(),
            components,
            config: BTreeMap::new(),
        }
    }

    #[test]
    fn required_containers_with_no_components() {
        assert_eq!(job(vec![]).required_containers(), 1);
    }

    #[test]
    fn required_containers_adds_management_container() {
        let job = job(vec![component("words", 2), component("count", 3)]);
        assert_eq!(job.total_instances(), 5);
        assert_eq!(job.required_containers(), 6);
    }

    #[test]
    fn zero_parallelism_components_add_nothing() {
        let job = job(vec![component("idle", 0), component("count", 4)]);
        assert_eq!(job.required_containers(), 5);
    }

    #[test]
    fn rejects_parallelism_overflowing_container_count() {
        let single = job(vec![component("firehose", u32::MAX)]);
        assert_eq!(single.checked_required_containers(), None);
        assert!(matches!(single.validate(), Err(JobError::Invalid(_))));
        assert_eq!(single.required_containers(), u32::MAX);

        let pair = job(vec![component("a", 3_000_000_000), component("b", 3_000_000_000)]);
        let err = pair.validate().unwrap_err();
        assert!(err.to_string().contains("total parallelism exceeds"));
        assert_eq!(pair.total_instances(), u32::MAX);
    }

    #[test]
    fn largest_valid_parallelism_still_validates() {
        let job = job(vec![component("wide", u32::MAX - 1)]);
        job.validate().unwrap();
        assert_eq!(job.checked_required_containers(), Some(u32::MAX));
    }

    #[test]
    fn overflowing_toml_definition_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.toml");
        fs::write(
            &path,
            r#"
id = "huge-1"
name = "huge"

[[components]]
name = "firehose"
kind = "source"
parallelism = 4294967295
"#,
        )
        .unwrap();

        assert!(matches!(
            JobDescriptor::from_file(&path),
            Err(JobError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_duplicate_components() {
        let job = job(vec![component("count", 1), component("count", 2)]);
        let err = job.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate component name: count"));
    }

    #[test]
    fn rejects_empty_identity() {
        let mut job = job(vec![]);
        job.name = " ".to_string();
        assert!(matches!(job.validate(), Err(JobError::Invalid(_))));
    }

    #[test]
    fn loads_toml_definition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordcount.toml");
        fs::write(
            &path,
            r#"
id = "wordcount-1"
name = "wordcount"

[[components]]
name = "words"
kind = "source"
parallelism = 2

[[components]]
name = "count"
kind = "operator"
parallelism = 3
resources = { cpu = 0.5, ram = "512MB", disk = 2147483648 }
"#,
        )
        .unwrap();

        let job = JobDescriptor::from_file(&path).unwrap();
        assert_eq!(job.name, "wordcount");
        assert_eq!(job.components[0].kind, ComponentKind::Source);
        assert_eq!(job.components[1].resources.cpu, Some(0.5));
        assert_eq!(job.components[1].resources.ram, Some(512 * MIB));
        assert_eq!(job.components[1].resources.disk, Some(2 * GIB));
        assert_eq!(job.components[0].resources, ResourceRequest::default());
    }

    #[test]
    fn loads_json_definition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordcount.json");
        fs::write(
            &path,
            r#"{
  "id": "wordcount-1",
  "name": "wordcount",
  "components": [
    { "name": "words", "kind": "source", "parallelism": 1, "resources": { "ram": "1GB" } }
  ]
}"#,
        )
        .unwrap();

        let job = JobDescriptor::from_file(&path).unwrap();
        assert_eq!(job.components.len(), 1);
        assert_eq!(job.components[0].resources.ram, Some(GIB));
        assert_eq!(job.required_containers(), 2);
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = JobDescriptor::from_file(Path::new("/nonexistent/job.toml")).unwrap_err();
        assert!(matches!(err, JobError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JobDescriptor::from_file(&path),
            Err(JobError::Json { .. })
        ));
    }
}
