//! Runs the audit against the cluster in the current kubeconfig.
//!
//! These tests create a throwaway namespace with a busybox pod and are ignored
//! by default: `cargo test --test live_cluster -- --ignored`.

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::{Container, Namespace, Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{DeleteParams, PostParams};
use kube::Api;
use rootaudit::k8s::{ClusterApi, K8sClient, PodWatcher};
use rootaudit::{AuditConfig, Auditor, ExclusionSet};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;

const TEST_POD: &str = "test-busybox-pod";

struct TestNamespace {
    client: K8sClient,
    name: String,
}

impl TestNamespace {
    async fn create() -> Result<Self> {
        let client = K8sClient::connect(None).await?;
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        let name = format!("test-rootaudit-{}", nanos);

        let namespaces: Api<Namespace> = Api::all(client.client().clone());
        namespaces
            .create(
                &PostParams::default(),
                &Namespace {
                    metadata: ObjectMeta {
                        name: Some(name.clone()),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            )
            .await
            .context("creating test namespace")?;

        let pod = Pod {
            metadata: ObjectMeta {
                name: Some(TEST_POD.to_string()),
                namespace: Some(name.clone()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "busybox".to_string(),
                    image: Some("busybox".to_string()),
                    command: Some(vec!["sleep".to_string(), "3600".to_string()]),
                    ..Default::default()
                }],
                restart_policy: Some("Never".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let ns = Self { client, name };
        ns.client
            .pods(&ns.name)
            .create(&PostParams::default(), &pod)
            .await
            .context("creating test pod")?;

        PodWatcher::new(ns.client.pods(&ns.name), TEST_POD)
            .wait_until_running(Duration::from_secs(60))
            .await?;

        Ok(ns)
    }

    async fn delete(self) -> Result<()> {
        let namespaces: Api<Namespace> = Api::all(self.client.client().clone());
        namespaces
            .delete(&self.name, &DeleteParams::default())
            .await
            .context("deleting test namespace")?;
        Ok(())
    }
}

#[tokio::test]
#[ignore]
async fn test_live_enumeration_and_exec() -> Result<()> {
    let ns = TestNamespace::create().await?;

    let pods = ns.client.list_pods(&ns.name).await?;
    let containers = ns.client.list_containers(&ns.name, TEST_POD).await?;
    let output = ns
        .client
        .exec(&ns.name, TEST_POD, "busybox", "echo 'Hello, Test!'")
        .await?;
    let missing = ns
        .client
        .exec(&ns.name, TEST_POD, "no-such-container", "whoami")
        .await;

    ns.delete().await?;

    assert!(pods.contains(&TEST_POD.to_string()));
    assert_eq!(containers, vec!["busybox"]);
    assert!(output.stdout.contains("Hello, Test!"));
    assert!(missing.is_err());
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_live_audit_finds_busybox_root() -> Result<()> {
    let ns = TestNamespace::create().await?;

    let namespaces = ns.client.list_namespaces().await?;
    let only_test_ns: ExclusionSet = namespaces
        .into_iter()
        .filter(|n| *n != ns.name)
        .collect();
    let auditor = Auditor::new(
        ns.client.clone(),
        AuditConfig {
            exclusions: only_test_ns,
            ..Default::default()
        },
    );
    let result = auditor.run(&CancellationToken::new()).await;

    ns.delete().await?;

    let result = result?;
    assert_eq!(result.root_containers.len(), 1);
    assert_eq!(result.root_containers[0].pod_name, TEST_POD);
    assert_eq!(result.root_containers[0].probe_command, "whoami");
    assert!(result.error_containers.is_empty());
    Ok(())
}
