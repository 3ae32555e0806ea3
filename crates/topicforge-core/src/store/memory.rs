//! In-memory [`MetadataStore`] and [`BlobStore`] implementations for
//! testing and embedding.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread safety.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::models::{ArtifactRecord, Job, JobUpdate, Topic};

use super::{BlobStore, MetadataStore};

struct StoredTopic {
    job_id: String,
    topic: Topic,
}

/// In-memory metadata store.
pub struct InMemoryMetadataStore {
    jobs: RwLock<HashMap<String, Job>>,
    topics: RwLock<Vec<StoredTopic>>,
    artifacts: RwLock<Vec<ArtifactRecord>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            topics: RwLock::new(Vec::new()),
            artifacts: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn create_job(&self, job: &Job) -> Result<()> {
        let mut jobs = self.jobs.write().unwrap();
        if jobs.contains_key(&job.id) {
            bail!("job already exists: {}", job.id);
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn get_job(&self, id: &str) -> Result<Option<Job>> {
        Ok(self.jobs.read().unwrap().get(id).cloned())
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self.jobs.read().unwrap().values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(jobs)
    }

    async fn update_job(&self, id: &str, update: &JobUpdate) -> Result<()> {
        let mut jobs = self.jobs.write().unwrap();
        let job = match jobs.get_mut(id) {
            Some(j) => j,
            None => bail!("job not found: {}", id),
        };
        if let Some(status) = update.status {
            job.status = status;
        }
        if let Some(total) = update.total_content {
            job.total_content = total;
        }
        if let Some(flag) = update.autonomous_mode {
            job.autonomous_mode = flag;
        }
        job.updated_at = update.updated_at;
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> Result<bool> {
        let existed = self.jobs.write().unwrap().remove(id).is_some();
        self.topics.write().unwrap().retain(|t| t.job_id != id);
        self.artifacts.write().unwrap().retain(|a| a.job_id != id);
        Ok(existed)
    }

    async fn insert_topics(&self, job_id: &str, topics: &[Topic]) -> Result<()> {
        let mut stored = self.topics.write().unwrap();
        for topic in topics {
            stored.push(StoredTopic {
                job_id: job_id.to_string(),
                topic: topic.clone(),
            });
        }
        Ok(())
    }

    async fn list_topics(&self, job_id: &str) -> Result<Vec<Topic>> {
        Ok(self
            .topics
            .read()
            .unwrap()
            .iter()
            .filter(|t| t.job_id == job_id)
            .map(|t| t.topic.clone())
            .collect())
    }

    async fn insert_artifact(&self, record: &ArtifactRecord) -> Result<()> {
        self.artifacts.write().unwrap().push(record.clone());
        Ok(())
    }

    async fn list_artifacts(&self, job_id: &str) -> Result<Vec<ArtifactRecord>> {
        Ok(self
            .artifacts
            .read()
            .unwrap()
            .iter()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect())
    }
}

struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
}

/// In-memory blob store. Public URLs use the `memory://` scheme.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Bytes stored at `path`, if any.
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs.read().unwrap().get(path).map(|b| b.bytes.clone())
    }

    /// MIME type recorded for `path`, if any.
    pub fn content_type(&self, path: &str) -> Option<String> {
        self.blobs
            .read()
            .unwrap()
            .get(path)
            .map(|b| b.content_type.clone())
    }

    /// All stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.blobs.read().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
        overwrite: bool,
    ) -> Result<()> {
        let mut blobs = self.blobs.write().unwrap();
        if !overwrite && blobs.contains_key(path) {
            bail!("object already exists: {}", path);
        }
        blobs.insert(
            path.to_string(),
            StoredBlob {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{}", path)
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.blobs.write().unwrap().remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;

    #[tokio::test]
    async fn test_update_missing_job_fails() {
        let store = InMemoryMetadataStore::new();
        let update = JobUpdate {
            status: Some(JobStatus::Completed),
            ..Default::default()
        };
        assert!(store.update_job("nope", &update).await.is_err());
    }

    #[tokio::test]
    async fn test_list_jobs_newest_first() {
        let store = InMemoryMetadataStore::new();
        let mut old = Job::new("old.pdf", 10);
        old.created_at -= 100;
        let new = Job::new("new.pdf", 20);
        store.create_job(&old).await.unwrap();
        store.create_job(&new).await.unwrap();
        assert!(store.create_job(&new).await.is_err());

        let jobs = store.list_jobs().await.unwrap();
        assert_eq!(jobs[0].file_name, "new.pdf");
        assert_eq!(jobs[1].file_name, "old.pdf");
    }

    #[tokio::test]
    async fn test_blob_overwrite_semantics() {
        let blobs = InMemoryBlobStore::new();
        blobs.upload("a/b.md", b"one", "text/markdown", true).await.unwrap();
        blobs.upload("a/b.md", b"two", "text/markdown", true).await.unwrap();
        assert_eq!(blobs.get("a/b.md").unwrap(), b"two");
        assert!(blobs.upload("a/b.md", b"three", "text/markdown", false).await.is_err());
        blobs.remove("a/b.md").await.unwrap();
        blobs.remove("a/b.md").await.unwrap();
        assert!(blobs.get("a/b.md").is_none());
    }
}
