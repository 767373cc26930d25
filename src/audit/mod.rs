//! Namespace → pod → container traversal that finds containers running as root.

pub mod filter;
pub mod result;
pub mod traversal;

pub use filter::{contains_string, ExclusionSet};
pub use result::{is_root_identity, ClassificationResult, ContainerRecord, SkippedScope};
pub use traversal::Auditor;

/// Command run in every container unless the caller picks another one.
pub const DEFAULT_PROBE_COMMAND: &str = "whoami";

/// Settings for a single audit pass.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub exclusions: ExclusionSet,
    pub probe_command: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            exclusions: ExclusionSet::default(),
            probe_command: DEFAULT_PROBE_COMMAND.to_string(),
        }
    }
}
