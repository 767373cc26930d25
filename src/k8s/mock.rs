//! In-memory cluster for exercising the audit without an API server.

use crate::k8s::{ClusterApi, ProbeOutput};
use crate::{Result, RootAuditError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

type PodKey = (String, String);
type ContainerKey = (String, String, String);

#[derive(Debug, Clone)]
enum MockProbe {
    Output(String),
    Fail(String),
    Hang,
}

/// A fixed cluster layout with scripted failures.
///
/// Containers without a scripted probe answer with an exec error, the way a
/// real API server does when the container does not exist.
#[derive(Debug, Default)]
pub struct MockCluster {
    namespaces: Vec<String>,
    pods: HashMap<String, Vec<String>>,
    containers: HashMap<PodKey, Vec<String>>,
    probes: HashMap<ContainerKey, MockProbe>,
    fail_namespaces: bool,
    failing_pod_lists: HashSet<String>,
    failing_container_lists: HashSet<PodKey>,
    visited: Mutex<Vec<String>>,
    executed: Mutex<Vec<String>>,
}

impl MockCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, name: &str) -> Self {
        self.namespaces.push(name.to_string());
        self.pods.entry(name.to_string()).or_default();
        self
    }

    pub fn pod(mut self, namespace: &str, pod: &str, containers: &[&str]) -> Self {
        if !self.namespaces.iter().any(|n| n == namespace) {
            self = self.namespace(namespace);
        }
        self.pods
            .entry(namespace.to_string())
            .or_default()
            .push(pod.to_string());
        self.containers.insert(
            (namespace.to_string(), pod.to_string()),
            containers.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    pub fn probe_output(
        mut self,
        namespace: &str,
        pod: &str,
        container: &str,
        stdout: &str,
    ) -> Self {
        self.probes.insert(
            key(namespace, pod, container),
            MockProbe::Output(stdout.to_string()),
        );
        self
    }

    pub fn probe_failure(
        mut self,
        namespace: &str,
        pod: &str,
        container: &str,
        message: &str,
    ) -> Self {
        self.probes.insert(
            key(namespace, pod, container),
            MockProbe::Fail(message.to_string()),
        );
        self
    }

    /// The probe for this container never completes.
    pub fn probe_hang(mut self, namespace: &str, pod: &str, container: &str) -> Self {
        self.probes.insert(key(namespace, pod, container), MockProbe::Hang);
        self
    }

    pub fn fail_namespace_list(mut self) -> Self {
        self.fail_namespaces = true;
        self
    }

    pub fn fail_pod_list(mut self, namespace: &str) -> Self {
        self.failing_pod_lists.insert(namespace.to_string());
        self
    }

    pub fn fail_container_list(mut self, namespace: &str, pod: &str) -> Self {
        self.failing_container_lists
            .insert((namespace.to_string(), pod.to_string()));
        self
    }

    /// Namespaces whose pods were listed, in call order.
    pub fn visited_namespaces(&self) -> Vec<String> {
        self.visited.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Commands passed to `exec`, in call order.
    pub fn executed_commands(&self) -> Vec<String> {
        self.executed.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

fn key(namespace: &str, pod: &str, container: &str) -> ContainerKey {
    (namespace.to_string(), pod.to_string(), container.to_string())
}

#[async_trait]
impl ClusterApi for MockCluster {
    async fn list_namespaces(&self) -> Result<Vec<String>> {
        if self.fail_namespaces {
            return Err(RootAuditError::enumeration(
                "namespaces",
                "namespaces is forbidden",
            ));
        }
        Ok(self.namespaces.clone())
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<String>> {
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(namespace.to_string());
        }
        if self.failing_pod_lists.contains(namespace) {
            return Err(RootAuditError::enumeration(
                format!("pods in {}", namespace),
                "pods is forbidden",
            ));
        }
        Ok(self.pods.get(namespace).cloned().unwrap_or_default())
    }

    async fn list_containers(&self, namespace: &str, pod: &str) -> Result<Vec<String>> {
        let pod_key = (namespace.to_string(), pod.to_string());
        if self.failing_container_lists.contains(&pod_key) {
            return Err(RootAuditError::enumeration(
                format!("containers of pod {}/{}", namespace, pod),
                "pods not found",
            ));
        }
        self.containers.get(&pod_key).cloned().ok_or_else(|| {
            RootAuditError::enumeration(
                format!("containers of pod {}/{}", namespace, pod),
                "pods not found",
            )
        })
    }

    async fn exec(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &str,
    ) -> Result<ProbeOutput> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(command.to_string());
        }
        match self.probes.get(&key(namespace, pod, container)) {
            Some(MockProbe::Output(out)) => Ok(ProbeOutput::stdout(out.clone())),
            Some(MockProbe::Fail(message)) => {
                Err(RootAuditError::exec(namespace, pod, container, message))
            }
            Some(MockProbe::Hang) => futures::future::pending().await,
            None => Err(RootAuditError::exec(
                namespace,
                pod,
                container,
                format!("container {} not found", container),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_layout() {
        let cluster = MockCluster::new()
            .namespace("empty")
            .pod("default", "web", &["nginx", "envoy"]);

        assert_eq!(
            cluster.list_namespaces().await.unwrap(),
            vec!["empty", "default"]
        );
        assert_eq!(cluster.list_pods("default").await.unwrap(), vec!["web"]);
        assert_eq!(
            cluster.list_containers("default", "web").await.unwrap(),
            vec!["nginx", "envoy"]
        );
        assert_eq!(cluster.visited_namespaces(), vec!["default"]);
    }

    #[tokio::test]
    async fn test_mock_unscripted_probe_fails() {
        let cluster = MockCluster::new().pod("default", "web", &["nginx"]);

        let err = cluster
            .exec("default", "web", "nginx", "whoami")
            .await
            .unwrap_err();
        assert!(matches!(err, RootAuditError::ExecError { .. }));
        assert_eq!(cluster.executed_commands(), vec!["whoami"]);
    }
}
