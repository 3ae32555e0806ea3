//! Job completion tracking.
//!
//! The pipeline is the single writer of a job's `autonomous_mode`, `status`
//! and `total_content` fields while it runs. It touches the job row exactly
//! twice: [`JobTracker::mark_autonomous`] at the start and
//! [`JobTracker::complete`] at the end. No intermediate progress is stored.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::models::{JobStatus, JobUpdate};
use crate::store::MetadataStore;

pub struct JobTracker<'a> {
    store: &'a dyn MetadataStore,
}

impl<'a> JobTracker<'a> {
    pub fn new(store: &'a dyn MetadataStore) -> Self {
        Self { store }
    }

    /// Flag the job as processed autonomously.
    pub async fn mark_autonomous(&self, job_id: &str) -> Result<()> {
        let update = JobUpdate {
            autonomous_mode: Some(true),
            updated_at: Utc::now().timestamp(),
            ..Default::default()
        };
        self.store
            .update_job(job_id, &update)
            .await
            .with_context(|| format!("failed to mark job {} as autonomous", job_id))
    }

    /// Mark the job completed with its final artifact count.
    pub async fn complete(&self, job_id: &str, total_files: usize) -> Result<()> {
        let update = JobUpdate {
            status: Some(JobStatus::Completed),
            total_content: Some(total_files as i64),
            updated_at: Utc::now().timestamp(),
            ..Default::default()
        };
        self.store
            .update_job(job_id, &update)
            .await
            .with_context(|| format!("failed to complete job {}", job_id))?;
        info!(job_id, total_files, "job completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Job;
    use crate::store::memory::InMemoryMetadataStore;

    #[tokio::test]
    async fn test_mark_then_complete() {
        let store = InMemoryMetadataStore::new();
        let mut job = Job::new("report.pdf", 2048);
        job.updated_at -= 10;
        store.create_job(&job).await.unwrap();

        let tracker = JobTracker::new(&store);
        tracker.mark_autonomous(&job.id).await.unwrap();
        let marked = store.get_job(&job.id).await.unwrap().unwrap();
        assert!(marked.autonomous_mode);
        assert_eq!(marked.status, JobStatus::Processing);
        assert!(marked.updated_at > job.updated_at);

        tracker.complete(&job.id, 6).await.unwrap();
        let done = store.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.total_content, 6);
        assert!(done.autonomous_mode);
    }

    #[tokio::test]
    async fn test_missing_job_reports_error() {
        let store = InMemoryMetadataStore::new();
        let tracker = JobTracker::new(&store);
        let err = tracker.complete("ghost", 0).await.unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }
}
