//! The remote capabilities the audit needs from a cluster.

use crate::k8s::ProbeOutput;
use crate::Result;
use async_trait::async_trait;

/// Read and exec access to a cluster, keyed by plain object names.
///
/// Implemented by [`K8sClient`](crate::k8s::K8sClient) against a live API
/// server and by [`MockCluster`](crate::k8s::MockCluster) in tests.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Names of all namespaces visible to the session, in API order.
    async fn list_namespaces(&self) -> Result<Vec<String>>;

    /// Names of the pods in `namespace`.
    async fn list_pods(&self, namespace: &str) -> Result<Vec<String>>;

    /// Names of the containers declared in the pod's spec. Init and
    /// ephemeral containers are not included.
    async fn list_containers(&self, namespace: &str, pod: &str) -> Result<Vec<String>>;

    /// Runs `command` through `sh -c` inside the container, without stdin
    /// or a tty, and returns what it wrote.
    async fn exec(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &str,
    ) -> Result<ProbeOutput>;
}
