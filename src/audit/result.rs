use serde::{Deserialize, Serialize};

/// One probed container.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub namespace: String,
    pub pod_name: String,
    pub container_name: String,
    pub probe_command: String,
}

impl ContainerRecord {
    pub fn new(
        namespace: &str,
        pod_name: &str,
        container_name: &str,
        probe_command: &str,
    ) -> Self {
        Self {
            namespace: namespace.to_string(),
            pod_name: pod_name.to_string(),
            container_name: container_name.to_string(),
            probe_command: probe_command.to_string(),
        }
    }

    fn sort_key(&self) -> (&str, &str, &str) {
        (
            self.namespace.as_str(),
            self.pod_name.as_str(),
            self.container_name.as_str(),
        )
    }
}

/// A namespace or pod that was not audited because listing its children
/// failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedScope {
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_name: Option<String>,
    pub reason: String,
}

/// Outcome of an audit pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Containers whose probe output names root.
    pub root_containers: Vec<ContainerRecord>,
    /// Containers that could not be probed.
    pub error_containers: Vec<ContainerRecord>,
    pub skipped: Vec<SkippedScope>,
}

impl ClassificationResult {
    /// Orders both container sets by namespace, pod, then container name.
    pub fn sorted(mut self) -> Self {
        self.root_containers.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        self.error_containers.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        self
    }
}

/// Root check applied to probe stdout. Any occurrence of `root` counts, so
/// identities such as `chroot-user` also match.
pub fn is_root_identity(output: &str) -> bool {
    output.contains("root")
}
