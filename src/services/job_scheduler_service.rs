use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::errors::AppError;
use crate::jobs::quote_cache_job;
use crate::services::quote_service::QuoteService;

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub quotes: QuoteService,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobResult {
    pub items_processed: i32,
    pub items_failed: i32,
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
}

impl JobSchedulerService {
    pub async fn new(context: JobContext) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, context })
    }

    /// Registers the maintenance jobs and starts the scheduler.
    ///
    /// `quote_cache_cron` uses the six-field format (sec min hour day month weekday).
    pub async fn start(&mut self, quote_cache_cron: &str) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler...");

        self.schedule_job(
            quote_cache_cron,
            "evict_expired_quotes",
            "Quote cache eviction",
            quote_cache_job::evict_expired_quotes,
        )
        .await?;

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started");
        Ok(())
    }

    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        description: &str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                run_logged(job_name, context, job_fn).await;
            })
        })
        .map_err(|e| AppError::Internal(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} - {} [cron: {}]", job_name, description, schedule);
        Ok(())
    }
}

async fn run_logged<F, Fut>(job_name: &str, context: JobContext, job_fn: Arc<F>)
where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    let started_at = Utc::now();

    match job_fn(context).await {
        Ok(result) => {
            let duration_ms = (Utc::now() - started_at).num_milliseconds();
            info!(
                "Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
                job_name, result.items_processed, result.items_failed, duration_ms
            );
        }
        Err(e) => error!("❌ Job failed: {} - {}", job_name, e),
    }
}
