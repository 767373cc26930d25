use crate::audit::result::{is_root_identity, ClassificationResult, ContainerRecord, SkippedScope};
use crate::audit::AuditConfig;
use crate::k8s::ClusterApi;
use crate::{Result, RootAuditError};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Walks every non-excluded namespace, pod and container once and probes each
/// container's identity.
///
/// Only a failed namespace listing or cancellation ends the walk early.
/// Failures to list pods or containers skip that subtree; failed probes are
/// recorded in [`ClassificationResult::error_containers`].
pub struct Auditor<C> {
    cluster: C,
    config: AuditConfig,
}

impl<C: ClusterApi> Auditor<C> {
    pub fn new(cluster: C, config: AuditConfig) -> Self {
        Self { cluster, config }
    }

    pub fn cluster(&self) -> &C {
        &self.cluster
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Namespace names from the cluster, minus the configured exclusions.
    pub async fn list_namespaces(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        let namespaces = guarded(cancel, self.cluster.list_namespaces()).await?;

        Ok(namespaces
            .into_iter()
            .filter(|ns| {
                let excluded = self.config.exclusions.contains(ns);
                if excluded {
                    debug!("Skipping excluded namespace {}", ns);
                }
                !excluded
            })
            .collect())
    }

    pub async fn run(&self, cancel: &CancellationToken) -> Result<ClassificationResult> {
        let command = self.config.probe_command.as_str();
        let mut result = ClassificationResult::default();

        let namespaces = self.list_namespaces(cancel).await?;
        info!("Auditing {} namespaces", namespaces.len());

        for namespace in &namespaces {
            let pods = match guarded(cancel, self.cluster.list_pods(namespace)).await {
                Ok(pods) => pods,
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    warn!("Error listing pods in namespace {}: {}", namespace, e);
                    result.skipped.push(SkippedScope {
                        namespace: namespace.clone(),
                        pod_name: None,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            debug!("Namespace {} has {} pods", namespace, pods.len());

            for pod in &pods {
                let containers =
                    match guarded(cancel, self.cluster.list_containers(namespace, pod)).await {
                        Ok(containers) => containers,
                        Err(e) if e.is_cancelled() => return Err(e),
                        Err(e) => {
                            warn!("Error listing containers in pod {}/{}: {}", namespace, pod, e);
                            result.skipped.push(SkippedScope {
                                namespace: namespace.clone(),
                                pod_name: Some(pod.clone()),
                                reason: e.to_string(),
                            });
                            continue;
                        }
                    };

                for container in &containers {
                    let probe = self.cluster.exec(namespace, pod, container, command);

                    match guarded(cancel, probe).await {
                        Ok(output) if is_root_identity(&output.stdout) => {
                            info!("Container {}/{}/{} runs as root", namespace, pod, container);
                            result
                                .root_containers
                                .push(ContainerRecord::new(namespace, pod, container, command));
                        }
                        Ok(output) => {
                            debug!(
                                "Container {}/{}/{} runs as {}",
                                namespace,
                                pod,
                                container,
                                output.stdout.trim()
                            );
                        }
                        Err(e) if e.is_cancelled() => return Err(e),
                        Err(e) => {
                            warn!("Error running {:?}: {}", command, e);
                            result
                                .error_containers
                                .push(ContainerRecord::new(namespace, pod, container, command));
                        }
                    }
                }
            }
        }

        info!(
            "Audit complete: {} root containers, {} errors, {} skipped",
            result.root_containers.len(),
            result.error_containers.len(),
            result.skipped.len()
        );

        Ok(result)
    }
}

/// Drives `call` until it finishes or `cancel` fires. On cancellation the
/// call is dropped, which aborts the in-flight request.
async fn guarded<T, F>(cancel: &CancellationToken, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RootAuditError::Cancelled),
        res = call => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::ExclusionSet;
    use crate::k8s::MockCluster;

    fn auditor(cluster: MockCluster) -> Auditor<MockCluster> {
        Auditor::new(cluster, AuditConfig::default())
    }

    #[tokio::test]
    async fn test_list_namespaces_applies_exclusions() {
        let cluster = MockCluster::new()
            .namespace("default")
            .namespace("kube-system")
            .namespace("kube-public")
            .namespace("kube-node-lease")
            .namespace("prod");

        let namespaces = auditor(cluster)
            .list_namespaces(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(namespaces, vec!["default", "prod"]);
    }

    #[tokio::test]
    async fn test_custom_exclusions_replace_defaults() {
        let cluster = MockCluster::new()
            .namespace("kube-system")
            .namespace("monitoring");
        let config = AuditConfig {
            exclusions: ["monitoring"].into_iter().collect::<ExclusionSet>(),
            ..Default::default()
        };

        let namespaces = Auditor::new(cluster, config)
            .list_namespaces(&CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(namespaces, vec!["kube-system"]);
    }

    #[tokio::test]
    async fn test_non_root_output_is_discarded() {
        let cluster = MockCluster::new()
            .pod("default", "web", &["nginx"])
            .probe_output("default", "web", "nginx", "nginx\n");

        let result = auditor(cluster).run(&CancellationToken::new()).await.unwrap();

        assert!(result.root_containers.is_empty());
        assert!(result.error_containers.is_empty());
    }

    #[tokio::test]
    async fn test_custom_probe_command_is_used() {
        let cluster = MockCluster::new()
            .pod("default", "web", &["nginx"])
            .probe_output("default", "web", "nginx", "0\n");
        let config = AuditConfig {
            probe_command: "id -u".to_string(),
            ..Default::default()
        };

        let auditor = Auditor::new(cluster, config);
        auditor.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(auditor.config().probe_command, "id -u");
        assert_eq!(auditor.cluster().executed_commands(), vec!["id -u"]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cluster = MockCluster::new().pod("default", "web", &["nginx"]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = auditor(cluster).run(&cancel).await.unwrap_err();

        assert!(err.is_cancelled());
    }
}
