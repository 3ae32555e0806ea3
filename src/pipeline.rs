//! End-to-end autonomous processing of one job.
//!
//! ```text
//! ProcessRequest { topics, fileName, jobId }
//!   │
//!   ├─ validate topics, look up the job
//!   ├─ mark job autonomous, record topics      (best-effort)
//!   ├─ consolidate topics into groups
//!   ├─ generate content per group              (sequential, paced)
//!   ├─ render + upload + record artifacts      (per category × result)
//!   └─ complete job with the artifact count    (failure is fatal)
//!   │
//!   ▼
//! ProcessResponse { success, results, processedTopics, jobId, skipped }
//! ```
//!
//! Used by both `forge process` and `POST /autonomous-process`.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use topicforge_core::generation::TextGenerator;
use topicforge_core::grouping::consolidate;
use topicforge_core::materialize::Materializer;
use topicforge_core::models::{CategoryResult, SkippedItem, Topic};
use topicforge_core::store::{BlobStore, MetadataStore};
use topicforge_core::tracker::JobTracker;

use crate::blob_fs::FsBlobStore;
use crate::blob_s3::S3BlobStore;
use crate::config::{Config, StorageConfig};
use crate::db;
use crate::generate::ContentGenerator;
use crate::openai::create_generator;
use crate::sqlite_store::SqliteStore;

/// Inbound trigger payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub file_name: String,
    pub job_id: String,
}

/// Successful pipeline response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub results: Vec<CategoryResult>,
    /// Number of groups that produced content.
    pub processed_topics: usize,
    pub job_id: String,
    pub skipped: Vec<SkippedItem>,
}

/// Build the blob store selected by `storage.backend`.
pub fn create_blob_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    match config.backend.as_str() {
        "filesystem" => Ok(Arc::new(FsBlobStore::new(
            config.root.clone(),
            config.public_base_url.clone(),
        ))),
        "s3" => {
            let s3 = config
                .s3
                .clone()
                .ok_or_else(|| anyhow::anyhow!("storage.s3 is not configured"))?;
            Ok(Arc::new(S3BlobStore::new(s3, config.timeout_secs)?))
        }
        other => bail!("Unknown storage backend: {}", other),
    }
}

pub struct Pipeline {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    generator: ContentGenerator,
}

impl Pipeline {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        generator: ContentGenerator,
    ) -> Self {
        Self {
            metadata,
            blobs,
            generator,
        }
    }

    /// Wire SQLite metadata, the configured blob backend, and the
    /// configured text generator.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        let generator: Arc<dyn TextGenerator> = create_generator(&config.generation)?;
        Ok(Self::new(
            Arc::new(SqliteStore::new(pool)),
            create_blob_store(&config.storage)?,
            ContentGenerator::from_config(generator, &config.generation),
        ))
    }

    pub fn metadata(&self) -> &dyn MetadataStore {
        self.metadata.as_ref()
    }

    pub fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    pub async fn process(&self, request: &ProcessRequest) -> Result<ProcessResponse> {
        let job_id = request.job_id.trim();
        if job_id.is_empty() {
            bail!("jobId must not be empty");
        }
        for (i, topic) in request.topics.iter().enumerate() {
            topic
                .validate()
                .with_context(|| format!("invalid topic at index {}", i))?;
        }
        if self.metadata.get_job(job_id).await?.is_none() {
            bail!("job not found: {}", job_id);
        }

        info!(
            job_id,
            file_name = %request.file_name,
            topics = request.topics.len(),
            "starting autonomous processing"
        );

        let tracker = JobTracker::new(self.metadata.as_ref());
        if let Err(e) = tracker.mark_autonomous(job_id).await {
            warn!(job_id, error = %e, "failed to mark job autonomous");
        }
        if let Err(e) = self.metadata.insert_topics(job_id, &request.topics).await {
            warn!(job_id, error = %e, "failed to record detected topics");
        }

        let groups = consolidate(&request.topics);
        info!(job_id, groups = groups.len(), "consolidated topics");

        let generated = self.generator.generate_all(&groups, job_id).await;
        info!(
            job_id,
            generated = generated.results.len(),
            skipped = generated.skipped.len(),
            "content generation finished"
        );

        let materialized = Materializer::new(self.blobs.as_ref(), self.metadata.as_ref())
            .materialize(&generated.results, job_id)
            .await;
        let total_files = materialized.total_files();

        tracker.complete(job_id, total_files).await?;

        let mut skipped = generated.skipped;
        skipped.extend(materialized.skipped);

        Ok(ProcessResponse {
            success: true,
            results: materialized.categories,
            processed_topics: generated.results.len(),
            job_id: job_id.to_string(),
            skipped,
        })
    }
}
