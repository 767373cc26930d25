use crate::k8s::types::container_names;
use crate::k8s::{ClusterApi, ProbeOutput};
use crate::{Result, RootAuditError};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use kube::api::AttachParams;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, ResourceExt};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

/// Authenticated session against the cluster's API server.
#[derive(Clone)]
pub struct K8sClient {
    client: Client,
}

impl K8sClient {
    /// Builds a session from the kubeconfig at `kubeconfig`, or from the
    /// usual inference chain (`KUBECONFIG`, `~/.kube/config`, in-cluster)
    /// when no path is given.
    pub async fn connect(kubeconfig: Option<&Path>) -> Result<Self> {
        let config = match kubeconfig {
            Some(path) => {
                debug!("Loading kubeconfig from {}", path.display());
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    RootAuditError::AuthError(format!(
                        "Failed to read kubeconfig {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| {
                        RootAuditError::AuthError(format!("Invalid kubeconfig: {}", e))
                    })?
            }
            None => {
                debug!("Inferring Kubernetes client configuration");
                Config::infer().await.map_err(|e| {
                    RootAuditError::AuthError(format!("Failed to infer kubeconfig: {}", e))
                })?
            }
        };

        let client = Client::try_from(config).map_err(|e| {
            RootAuditError::AuthError(format!("Failed to create K8s client: {}", e))
        })?;

        info!("Successfully connected to Kubernetes cluster");

        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn namespaces(&self) -> Api<Namespace> {
        Api::all(self.client.clone())
    }
}

#[async_trait]
impl ClusterApi for K8sClient {
    async fn list_namespaces(&self) -> Result<Vec<String>> {
        let list = self
            .namespaces()
            .list(&Default::default())
            .await
            .map_err(|e| RootAuditError::enumeration("namespaces", e))?;

        Ok(list.items.iter().map(|ns| ns.name_any()).collect())
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<String>> {
        let list = self
            .pods(namespace)
            .list(&Default::default())
            .await
            .map_err(|e| RootAuditError::enumeration(format!("pods in {}", namespace), e))?;

        Ok(list.items.iter().map(|pod| pod.name_any()).collect())
    }

    async fn list_containers(&self, namespace: &str, pod: &str) -> Result<Vec<String>> {
        let pod = self.pods(namespace).get(pod).await.map_err(|e| {
            RootAuditError::enumeration(format!("containers of pod {}/{}", namespace, pod), e)
        })?;

        Ok(container_names(&pod))
    }

    async fn exec(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &str,
    ) -> Result<ProbeOutput> {
        let fail = |message: String| RootAuditError::exec(namespace, pod, container, message);

        let params = AttachParams::default()
            .container(container)
            .stdin(false)
            .stdout(true)
            .stderr(true)
            .tty(false);

        debug!("Exec {:?} in {}/{}/{}", command, namespace, pod, container);

        let mut attached = self
            .pods(namespace)
            .exec(pod, ["sh", "-c", command], &params)
            .await
            .map_err(|e| fail(e.to_string()))?;

        let stdout = attached.stdout();
        let stderr = attached.stderr();
        let status = attached.take_status();

        let (stdout, stderr) = tokio::try_join!(read_all(stdout), read_all(stderr))
            .map_err(|e| fail(format!("stream read failed: {}", e)))?;

        let status = match status {
            Some(status) => status.await,
            None => None,
        };

        attached.join().await.map_err(|e| fail(e.to_string()))?;

        check_status(status).map_err(fail)?;

        Ok(ProbeOutput { stdout, stderr })
    }
}

/// Maps the terminal exec status to an error message. A missing status or
/// anything other than `Failure` counts as success.
fn check_status(status: Option<Status>) -> std::result::Result<(), String> {
    match status {
        Some(status) if status.status.as_deref() == Some("Failure") => Err(status
            .message
            .or(status.reason)
            .unwrap_or_else(|| "remote command failed".to_string())),
        _ => Ok(()),
    }
}

async fn read_all<R>(reader: Option<R>) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
