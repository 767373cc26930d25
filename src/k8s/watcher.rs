use crate::k8s::types::pod_phase;
use crate::{Result, RootAuditError};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::watcher::{self, Event};
use kube::{Api, ResourceExt};
use std::time::Duration;
use tracing::{debug, info};

/// Watches a single pod by name.
pub struct PodWatcher {
    api: Api<Pod>,
    name: String,
}

impl PodWatcher {
    pub fn new(api: Api<Pod>, name: &str) -> Self {
        Self {
            api,
            name: name.to_string(),
        }
    }

    /// Resolves once the pod reports phase `Running`.
    pub async fn wait_until_running(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.watch_until_running())
            .await
            .map_err(|_| {
                RootAuditError::KubernetesError(format!(
                    "Timed out after {:?} waiting for pod {} to run",
                    timeout, self.name
                ))
            })?
    }

    async fn watch_until_running(&self) -> Result<()> {
        info!("Waiting for pod {} to be running", self.name);

        let config = watcher::Config::default().fields(&format!("metadata.name={}", self.name));
        let mut stream = watcher::watcher(self.api.clone(), config).boxed();

        while let Some(event) = stream.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    debug!("Watcher error: {}", e);
                    continue;
                }
            };

            for pod_event in PodEvent::decode(event) {
                match pod_event {
                    PodEvent::Updated(pod) if pod_phase(&pod) == "Running" => {
                        info!("Pod {} is running", self.name);
                        return Ok(());
                    }
                    PodEvent::Updated(pod) => {
                        debug!("Pod {} is {}", self.name, pod_phase(&pod));
                    }
                    PodEvent::Deleted(name) => {
                        return Err(RootAuditError::KubernetesError(format!(
                            "Pod {} was deleted before it started running",
                            name
                        )));
                    }
                }
            }
        }

        Err(RootAuditError::KubernetesError(format!(
            "Watch stream for pod {} ended",
            self.name
        )))
    }
}

/// Pod changes carried by a watch stream.
#[derive(Debug)]
pub enum PodEvent {
    Updated(Box<Pod>),
    Deleted(String),
}

impl PodEvent {
    /// Flattens a raw watch event; a relist yields one update per pod.
    pub fn decode(event: Event<Pod>) -> Vec<PodEvent> {
        match event {
            Event::Applied(pod) => vec![PodEvent::Updated(Box::new(pod))],
            Event::Deleted(pod) => vec![PodEvent::Deleted(pod.name_any())],
            Event::Restarted(pods) => pods
                .into_iter()
                .map(|pod| PodEvent::Updated(Box::new(pod)))
                .collect(),
        }
    }
}
