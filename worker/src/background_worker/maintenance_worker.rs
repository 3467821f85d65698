use anyhow::Result;
use chrono::{NaiveDate, Utc};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

use crate::usecases::subscription_maintenance::SubscriptionMaintenanceUseCase;

const TICK_INTERVAL: Duration = Duration::from_secs(3600);

/// Hourly tick: the pending-checkout cleanup runs every tick, the three
/// daily sweeps run on the first tick of each UTC day. Every sweep is
/// idempotent, so catching up after downtime is safe.
pub async fn run_maintenance_worker_loop(
    usecase: Arc<SubscriptionMaintenanceUseCase>,
) -> Result<()> {
    info!("Starting subscription maintenance worker loop");
    let mut last_daily_run: Option<NaiveDate> = None;

    loop {
        if let Err(err) = usecase.cleanup_stale_pending().await {
            error!(error = ?err, "stale pending cleanup sweep failed");
        }

        let today = Utc::now().date_naive();
        if last_daily_run != Some(today) {
            run_daily_sweeps(&usecase).await;
            last_daily_run = Some(today);
        }

        tokio::time::sleep(TICK_INTERVAL).await;
    }
}

async fn run_daily_sweeps(usecase: &SubscriptionMaintenanceUseCase) {
    if let Err(err) = usecase.grant_monthly_credits().await {
        error!(error = ?err, "monthly credit grant sweep failed");
    }
    if let Err(err) = usecase.expire_overdue().await {
        error!(error = ?err, "expiry sweep failed");
    }
    if let Err(err) = usecase.send_renewal_reminders().await {
        error!(error = ?err, "renewal reminder sweep failed");
    }
}
