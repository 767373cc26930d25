pub mod audit;
pub mod cli;
pub mod error;
pub mod k8s;
pub mod report;

pub use audit::{AuditConfig, Auditor, ClassificationResult, ContainerRecord, ExclusionSet};
pub use error::{Result, RootAuditError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
