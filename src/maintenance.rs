//! Periodic cleanup of expired auth state and idle rate-limit buckets

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::state::AppState;

pub const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

/// Buckets untouched for this long are dropped
const RATE_LIMIT_IDLE: Duration = Duration::from_secs(300);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub challenges: u64,
    pub revocations: u64,
    pub rate_limit_buckets: usize,
}

/// Run one cleanup pass
pub async fn sweep(state: &AppState) -> SweepReport {
    let mut report = SweepReport::default();

    match state.auth_service.purge_expired().await {
        Ok((challenges, revocations)) => {
            report.challenges = challenges;
            report.revocations = revocations;
        }
        Err(e) => tracing::error!(error = %e, "Failed to purge expired auth state"),
    }

    report.rate_limit_buckets = state.rate_limiter.cleanup(RATE_LIMIT_IDLE).await;

    report
}

/// Spawn the sweeper loop
pub fn spawn_maintenance(state: AppState) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Maintenance task started");

        loop {
            tokio::time::sleep(MAINTENANCE_INTERVAL).await;

            let report = sweep(&state).await;
            if report != SweepReport::default() {
                tracing::debug!(
                    challenges = report.challenges,
                    revocations = report.revocations,
                    rate_limit_buckets = report.rate_limit_buckets,
                    "Maintenance sweep complete"
                );
            }
        }
    })
}
