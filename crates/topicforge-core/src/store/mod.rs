//! Storage abstractions for Topicforge.
//!
//! Two capabilities back the pipeline:
//!
//! - [`MetadataStore`]: a keyed record store holding jobs
//!   (`processing_jobs`), detected topics (`detected_topics`) and artifact
//!   rows (`generated_content`).
//! - [`BlobStore`]: an object store holding the rendered artifact bytes.
//!
//! Both are constructed explicitly by the application and passed to the
//! components that need them. Implementations must be `Send + Sync` to work
//! with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ArtifactRecord, Job, JobUpdate, Topic};

/// Abstract record store for jobs, topics, and artifact metadata.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`create_job`](MetadataStore::create_job) | Insert a new job row |
/// | [`get_job`](MetadataStore::get_job) | Fetch one job by ID |
/// | [`list_jobs`](MetadataStore::list_jobs) | All jobs, newest first |
/// | [`update_job`](MetadataStore::update_job) | Apply a partial update |
/// | [`delete_job`](MetadataStore::delete_job) | Delete a job and its rows |
/// | [`insert_topics`](MetadataStore::insert_topics) | Record detected topics |
/// | [`list_topics`](MetadataStore::list_topics) | Topics recorded for a job |
/// | [`insert_artifact`](MetadataStore::insert_artifact) | Record one artifact |
/// | [`list_artifacts`](MetadataStore::list_artifacts) | Artifacts for a job |
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert a new job. Fails if a job with the same ID exists.
    async fn create_job(&self, job: &Job) -> Result<()>;

    async fn get_job(&self, id: &str) -> Result<Option<Job>>;

    /// All jobs ordered by `created_at` descending.
    async fn list_jobs(&self) -> Result<Vec<Job>>;

    /// Apply `update` to the job. Fails if the job does not exist.
    async fn update_job(&self, id: &str, update: &JobUpdate) -> Result<()>;

    /// Delete a job together with its topic and artifact rows.
    ///
    /// Returns `false` when no such job existed.
    async fn delete_job(&self, id: &str) -> Result<bool>;

    async fn insert_topics(&self, job_id: &str, topics: &[Topic]) -> Result<()>;

    /// Topics recorded for a job, in insertion order.
    async fn list_topics(&self, job_id: &str) -> Result<Vec<Topic>>;

    async fn insert_artifact(&self, record: &ArtifactRecord) -> Result<()>;

    /// Artifacts recorded for a job, oldest first.
    async fn list_artifacts(&self, job_id: &str) -> Result<Vec<ArtifactRecord>>;
}

/// Abstract object store for artifact bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path`.
    ///
    /// When `overwrite` is `false` and an object already exists at `path`,
    /// the upload fails.
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str, overwrite: bool)
        -> Result<()>;

    /// Durable public/download URL for `path`. Does not check existence.
    fn public_url(&self, path: &str) -> String;

    /// Remove the object at `path`. Removing a missing object is not an error.
    async fn remove(&self, path: &str) -> Result<()>;
}
