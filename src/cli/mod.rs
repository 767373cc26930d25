pub mod commands;

use crate::audit::{AuditConfig, ExclusionSet, DEFAULT_PROBE_COMMAND};
use crate::report::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rootaudit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find Kubernetes containers running as root", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Probe every container's identity and report root containers")]
    Audit(AuditArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct AuditArgs {
    #[arg(long, help = "Path to kubeconfig (defaults to KUBECONFIG or ~/.kube/config)")]
    pub kubeconfig: Option<PathBuf>,

    #[arg(
        short,
        long = "exclude",
        value_name = "NAMESPACE",
        help = "Namespace to skip; replaces the default kube-* exclusions when given"
    )]
    pub exclude: Vec<String>,

    #[arg(
        long,
        conflicts_with = "exclude",
        help = "Audit kube-system, kube-public and kube-node-lease too"
    )]
    pub include_system: bool,

    #[arg(short, long, default_value = DEFAULT_PROBE_COMMAND, help = "Command run in each container")]
    pub command: String,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, help = "Report format")]
    pub output: OutputFormat,

    #[arg(long, value_name = "SECONDS", help = "Abort the audit after this many seconds")]
    pub timeout: Option<u64>,
}

impl AuditArgs {
    pub fn audit_config(&self) -> AuditConfig {
        let exclusions = if !self.exclude.is_empty() {
            self.exclude.iter().cloned().collect()
        } else if self.include_system {
            ExclusionSet::none()
        } else {
            ExclusionSet::default()
        };

        AuditConfig {
            exclusions,
            probe_command: self.command.clone(),
        }
    }
}
