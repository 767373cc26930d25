use crate::audit::{ClassificationResult, ContainerRecord};
use crate::{Result, RootAuditError};
use clap::ValueEnum;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

pub fn render(result: &ClassificationResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(result)),
        OutputFormat::Json => serde_json::to_string_pretty(result)
            .map_err(|e| RootAuditError::SerializationError(e.to_string())),
        OutputFormat::Yaml => serde_yaml::to_string(result)
            .map_err(|e| RootAuditError::SerializationError(e.to_string())),
    }
}

fn render_text(result: &ClassificationResult) -> String {
    let mut out = String::new();

    section(&mut out, "Root Containers", &result.root_containers);
    section(&mut out, "Containers with Errors", &result.error_containers);

    if !result.skipped.is_empty() {
        let _ = writeln!(out, "\nSkipped:");
        for skipped in &result.skipped {
            match &skipped.pod_name {
                Some(pod) => {
                    let _ = writeln!(
                        out,
                        "Namespace: {}, Pod: {}, Reason: {}",
                        skipped.namespace, pod, skipped.reason
                    );
                }
                None => {
                    let _ = writeln!(
                        out,
                        "Namespace: {}, Reason: {}",
                        skipped.namespace, skipped.reason
                    );
                }
            }
        }
    }

    out
}

fn section(out: &mut String, title: &str, records: &[ContainerRecord]) {
    let _ = writeln!(out, "\n{}:", title);
    for r in records {
        let _ = writeln!(
            out,
            "Namespace: {}, Pod: {}, Container: {}, Command: {}",
            r.namespace, r.pod_name, r.container_name, r.probe_command
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::SkippedScope;

    fn sample() -> ClassificationResult {
        ClassificationResult {
            root_containers: vec![ContainerRecord::new(
                "default",
                "busybox-pod",
                "busybox",
                "whoami",
            )],
            error_containers: vec![ContainerRecord::new("prod", "api", "app", "whoami")],
            skipped: vec![SkippedScope {
                namespace: "locked".to_string(),
                pod_name: None,
                reason: "forbidden".to_string(),
            }],
        }
    }

    #[test]
    fn test_render_text() {
        let text = render(&sample(), OutputFormat::Text).unwrap();

        assert!(text.contains(
            "Root Containers:\nNamespace: default, Pod: busybox-pod, Container: busybox, Command: whoami"
        ));
        assert!(text.contains("Containers with Errors:\nNamespace: prod, Pod: api"));
        assert!(text.contains("Namespace: locked, Reason: forbidden"));
    }

    #[test]
    fn test_render_text_empty_has_headers() {
        let text = render(&ClassificationResult::default(), OutputFormat::Text).unwrap();

        assert!(text.contains("Root Containers:"));
        assert!(text.contains("Containers with Errors:"));
        assert!(!text.contains("Skipped"));
    }

    #[test]
    fn test_render_json() {
        let json = render(&sample(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["root_containers"][0]["pod_name"], "busybox-pod");
        assert_eq!(value["error_containers"][0]["namespace"], "prod");
        assert!(value["skipped"][0].get("pod_name").is_none());
    }

    #[test]
    fn test_render_yaml() {
        let yaml = render(&sample(), OutputFormat::Yaml).unwrap();
        let parsed: ClassificationResult = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed, sample());
    }
}
