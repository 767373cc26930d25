use crate::audit::Auditor;
use crate::cli::{AuditArgs, Commands};
use crate::k8s::K8sClient;
use crate::report;
use crate::Result;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Audit(args) => handle_audit(args).await,
    }
}

async fn handle_audit(args: AuditArgs) -> Result<()> {
    let client = K8sClient::connect(args.kubeconfig.as_deref()).await?;
    let auditor = Auditor::new(client, args.audit_config());

    let config = auditor.config();
    info!(
        "Audit requested - command: {:?}, excluded namespaces: {:?}",
        config.probe_command,
        config.exclusions.iter().collect::<Vec<_>>()
    );

    let cancel = CancellationToken::new();
    let _cancel_on_exit = cancel.clone().drop_guard();
    spawn_cancellation(cancel.clone(), args.timeout.map(Duration::from_secs));

    let result = auditor.run(&cancel).await?.sorted();

    print!("{}", report::render(&result, args.output)?);
    Ok(())
}

/// Cancels `cancel` on Ctrl-C or when the deadline passes.
fn spawn_cancellation(cancel: CancellationToken, deadline: Option<Duration>) {
    tokio::spawn(async move {
        let deadline = async {
            match deadline {
                Some(after) => tokio::time::sleep(after).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = signal::ctrl_c() => warn!("Interrupt received, cancelling audit"),
            _ = deadline => warn!("Audit deadline reached, cancelling"),
        }
        cancel.cancel();
    });
}
