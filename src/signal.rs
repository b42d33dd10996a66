//! Races the migration against SIGINT/SIGTERM.
//!
//! The idiomatic async equivalent of the source tool's independent
//! interrupt handler: whichever future resolves first wins, and on
//! the signal side that still means cleanup runs before the process
//! exits non-zero.

use std::future::Future;

use tokio::signal::unix::{signal, SignalKind};

use crate::cluster_ops::ClusterOps;
use crate::error::MigrationError;
use crate::token::InstanceToken;

/// Runs `migration` to completion, or cleans up and returns
/// `MigrationError::Interruption` if SIGINT/SIGTERM arrives first.
pub async fn run_interruptible<C, F>(
    ops: &C,
    token: &InstanceToken,
    migration: F,
) -> Result<(), MigrationError>
where
    C: ClusterOps,
    F: Future<Output = Result<(), MigrationError>>,
{
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| MigrationError::Config(format!("installing SIGINT handler: {e}")))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| MigrationError::Config(format!("installing SIGTERM handler: {e}")))?;

    tokio::select! {
        result = migration => result,
        _ = sigint.recv() => {
            log::warn!("received SIGINT, cleaning up");
            ops.cleanup(token).await;
            Err(MigrationError::Interruption)
        }
        _ = sigterm.recv() => {
            log::warn!("received SIGTERM, cleaning up");
            ops.cleanup(token).await;
            Err(MigrationError::Interruption)
        }
    }
}
