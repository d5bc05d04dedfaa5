//! In-memory crawl job registry.

use std::sync::Arc;

use dashmap::DashMap;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::crawler::{validate_product_url, ProductCrawler};
use super::types::{CrawlJob, JobResult, JobStatus};
use crate::error::CrawlError;
use crate::metrics;

/// Crawl jobs keyed by job id. Each submitted job runs on its own task.
///
/// Finished jobs older than the TTL are evicted on the next submission.
#[derive(Clone)]
pub struct JobStore {
    jobs: Arc<DashMap<String, CrawlJob>>,
    crawler: Arc<dyn ProductCrawler>,
    ttl: time::Duration,
}

impl std::fmt::Debug for JobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobStore")
            .field("jobs", &self.jobs.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl JobStore {
    /// Create an empty store backed by `crawler`.
    pub fn new(crawler: Arc<dyn ProductCrawler>) -> Self {
        Self {
            jobs: Arc::new(DashMap::new()),
            crawler,
            ttl: time::Duration::HOUR,
        }
    }

    /// Keep finished jobs for `ttl` after their last update.
    pub fn with_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.ttl = time::Duration::try_from(ttl).unwrap_or(time::Duration::MAX);
        self
    }

    /// Drop completed and failed jobs whose last update is older than the TTL.
    ///
    /// Returns the number of jobs removed.
    pub fn prune_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let before = self.jobs.len();
        self.jobs
            .retain(|_, job| !(job.status.is_terminal() && now - job.updated_at >= self.ttl));
        let removed = before.saturating_sub(self.jobs.len());
        if removed > 0 {
            debug!(removed, "Evicted expired crawl jobs");
        }
        removed
    }

    /// Register a crawl job and start it in the background.
    ///
    /// Returns the job as registered (`pending`). Must be called from within
    /// a Tokio runtime.
    pub fn submit(&self, url: &str, platform: &str) -> Result<CrawlJob, CrawlError> {
        validate_product_url(url)?;
        self.prune_expired();

        let job_id = Uuid::new_v4().to_string();
        let job = CrawlJob::pending(job_id.clone(), url.to_string(), platform.to_string());
        self.jobs.insert(job_id.clone(), job.clone());
        metrics::inc_crawl_submitted();
        info!(job_id = %job_id, url = %url, platform = %platform, "Crawl job submitted");

        let jobs = Arc::clone(&self.jobs);
        let crawler = Arc::clone(&self.crawler);
        let url = url.to_string();
        let platform = platform.to_string();
        tokio::spawn(async move {
            run_job(jobs, crawler, job_id, url, platform).await;
        });

        Ok(job)
    }

    /// Snapshot of a job.
    pub fn get(&self, job_id: &str) -> Option<CrawlJob> {
        self.jobs.get(job_id).map(|job| job.clone())
    }

    /// Number of known jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no job was submitted yet.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

async fn run_job(
    jobs: Arc<DashMap<String, CrawlJob>>,
    crawler: Arc<dyn ProductCrawler>,
    job_id: String,
    url: String,
    platform: String,
) {
    if let Some(mut job) = jobs.get_mut(&job_id) {
        job.transition(JobStatus::Running);
    }
    info!(job_id = %job_id, "Crawl job started");

    let outcome = crawler.crawl(&url, &platform).await;

    let Some(mut job) = jobs.get_mut(&job_id) else {
        warn!(job_id = %job_id, "Crawl job vanished before completion");
        return;
    };
    match outcome {
        Ok(details) => {
            job.result = Some(JobResult::Product(details));
            job.message = None;
            job.transition(JobStatus::Completed);
            metrics::inc_crawl_completed();
            info!(job_id = %job_id, "Crawl job completed");
        }
        Err(e) => {
            let message = e.to_string();
            error!(job_id = %job_id, error = %message, "Crawl job failed");
            job.result = Some(JobResult::Failure {
                error: message.clone(),
                product_url: url,
                platform,
            });
            job.message = Some(message);
            job.transition(JobStatus::Failed);
            metrics::inc_crawl_failed();
        }
    }
}
