//! Periodic reachability probe
//!
//! Connectivity is decided by actually reaching the check-in endpoint, not
//! by what the network stack reports.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{info, warn};

use crate::client::CheckInApi;

/// Probe once and publish the result; returns the new value
pub async fn probe_once<C: CheckInApi>(api: &C, online: &watch::Sender<bool>) -> bool {
    let reachable = api.probe().await;
    let changed = online.send_if_modified(|current| {
        if *current == reachable {
            false
        } else {
            *current = reachable;
            true
        }
    });
    if changed {
        if reachable {
            info!("Check-in endpoint is reachable");
        } else {
            warn!("Check-in endpoint is unreachable");
        }
    }
    reachable
}

/// Probe immediately, then on every tick of `schedule` (cron syntax with
/// seconds). The returned scheduler must be kept alive.
pub async fn start_probe<C: CheckInApi>(
    api: C,
    schedule: &str,
    online: watch::Sender<bool>,
) -> Result<JobScheduler, JobSchedulerError> {
    let online = Arc::new(online);
    probe_once(&api, &online).await;

    let scheduler = JobScheduler::new().await?;
    let job = Job::new_async(schedule, move |_, _| {
        let api = api.clone();
        let online = Arc::clone(&online);
        Box::pin(async move {
            probe_once(&api, &online).await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Started reachability probe with schedule: {}", schedule);
    Ok(scheduler)
}
