use clap::Parser;

use pv_migrate::{MigrationRequest, MigrationError};

/// Migrate the contents of one persistent volume claim to another,
/// possibly across namespaces and clusters.
#[derive(Parser, Debug)]
#[command(name = "pv-migrate", version, about)]
struct Cli {
    /// kubeconfig context the source claim lives in, default context if omitted.
    #[arg(long, env = "PV_MIGRATE_SOURCE_CONTEXT")]
    source_context: Option<String>,

    /// Namespace of the source claim.
    #[arg(long, env = "PV_MIGRATE_SOURCE_NAMESPACE")]
    source_namespace: String,

    /// Name of the source claim.
    #[arg(long, env = "PV_MIGRATE_SOURCE_CLAIM")]
    source_claim: String,

    /// kubeconfig context the destination claim lives in, default context if omitted.
    #[arg(long, env = "PV_MIGRATE_DEST_CONTEXT")]
    dest_context: Option<String>,

    /// Namespace of the destination claim.
    #[arg(long, env = "PV_MIGRATE_DEST_NAMESPACE")]
    dest_namespace: String,

    /// Name of the destination claim.
    #[arg(long, env = "PV_MIGRATE_DEST_CLAIM")]
    dest_claim: String,

    /// Path to a kubeconfig file, overriding KUBECONFIG/~/.kube/config.
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<String>,

    /// Delete files at the destination that no longer exist at the source.
    #[arg(long, default_value_t = false)]
    delete: bool,

    /// Mount the source claim read-only on the sshd pod. Pass
    /// `--source-read-only=false` to allow the migration to write back
    /// to the source (e.g. for a post-migration cleanup job).
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    source_read_only: bool,
}

#[tokio::main]
async fn main() {
    pv_migrate::logging::init();

    let cli = Cli::parse();

    let request = MigrationRequest {
        source_context: cli.source_context,
        source_namespace: cli.source_namespace,
        source_claim: cli.source_claim,
        dest_context: cli.dest_context,
        dest_namespace: cli.dest_namespace,
        dest_claim: cli.dest_claim,
        kubeconfig_path: cli.kubeconfig,
        delete_extraneous: cli.delete,
        source_read_only: cli.source_read_only,
    };

    if let Err(e) = pv_migrate::run(request).await {
        let exit_code = match e {
            MigrationError::Config(_) => 0,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}
