use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::services::ScheduleEngine;

/// Owns the cron job that triggers schedule scans. The scan itself lives in
/// [`ScheduleEngine`]; this is only the periodic trigger.
pub struct PaymentScheduler {
    #[allow(dead_code)]
    scheduler: Arc<JobScheduler>,
}

impl PaymentScheduler {
    pub async fn start(engine: Arc<ScheduleEngine>, cron: &str) -> anyhow::Result<Self> {
        let scheduler = JobScheduler::new().await?;

        scheduler
            .add(Job::new_async(cron, move |_uuid, _lock| {
                let engine = engine.clone();
                Box::pin(async move {
                    match engine.run_once().await {
                        Ok(report) => {
                            if report.claimed > 0 {
                                info!(
                                    claimed = report.claimed,
                                    completed = report.completed,
                                    rescheduled = report.rescheduled,
                                    "scheduled payment scan done"
                                );
                            }
                        }
                        Err(e) => error!(error = %e, "scheduled payment scan failed"),
                    }
                })
            })?)
            .await?;

        scheduler.start().await?;
        info!(cron, "payment scheduler started");

        Ok(Self {
            scheduler: Arc::new(scheduler),
        })
    }

    pub async fn shutdown(&self) {
        // JobScheduler shuts down when dropped.
        info!("payment scheduler stopped");
    }
}
