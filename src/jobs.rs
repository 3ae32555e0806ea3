//! Job history commands.
//!
//! Creating, listing, inspecting and deleting processing jobs, previewing
//! topic consolidation, and running the pipeline from the command line.
//! The `create_job` and `load_topics` helpers are shared with the HTTP
//! server.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use topicforge_core::grouping::consolidate;
use topicforge_core::history;
use topicforge_core::models::{Job, Topic};
use topicforge_core::store::MetadataStore;

use crate::config::Config;
use crate::db;
use crate::pipeline::{create_blob_store, Pipeline, ProcessRequest};
use crate::sqlite_store::SqliteStore;

/// Create a job in the `processing` state.
pub async fn create_job(metadata: &dyn MetadataStore, file_name: &str, file_size: i64) -> Result<Job> {
    if file_name.trim().is_empty() {
        bail!("fileName must not be empty");
    }
    if file_size < 0 {
        bail!("fileSize must not be negative");
    }
    let job = Job::new(file_name.trim(), file_size);
    metadata.create_job(&job).await?;
    Ok(job)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TopicsFile {
    Bare(Vec<Topic>),
    Wrapped { topics: Vec<Topic> },
}

/// Read a topics file: either a JSON array of topics or an object with a
/// `topics` array (the shape of the inbound trigger payload).
pub fn load_topics(path: &Path) -> Result<Vec<Topic>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read topics file: {}", path.display()))?;
    let parsed: TopicsFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse topics file: {}", path.display()))?;
    let topics = match parsed {
        TopicsFile::Bare(topics) => topics,
        TopicsFile::Wrapped { topics } => topics,
    };
    for (i, topic) in topics.iter().enumerate() {
        topic
            .validate()
            .with_context(|| format!("invalid topic at index {}", i))?;
    }
    Ok(topics)
}

async fn open_store(config: &Config) -> Result<SqliteStore> {
    Ok(SqliteStore::new(db::connect(config).await?))
}

pub async fn run_job_create(config: &Config, file_name: &str, file_size: i64) -> Result<()> {
    let store = open_store(config).await?;
    let job = create_job(&store, file_name, file_size).await?;
    store.pool().close().await;
    println!("{}", job.id);
    Ok(())
}

pub async fn run_jobs_list(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    let jobs = store.list_jobs().await?;
    store.pool().close().await;

    if jobs.is_empty() {
        println!("No jobs.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<10}  {:>7}  {:<10}  FILE",
        "ID", "STATUS", "CONTENT", "AUTONOMOUS"
    );
    for job in &jobs {
        println!(
            "{:<36}  {:<10}  {:>7}  {:<10}  {}",
            job.id,
            job.status,
            job.total_content,
            if job.autonomous_mode { "yes" } else { "no" },
            job.file_name
        );
    }
    Ok(())
}

pub async fn run_jobs_show(config: &Config, id: &str) -> Result<()> {
    let store = open_store(config).await?;
    let blobs = create_blob_store(&config.storage)?;

    let job = match store.get_job(id).await? {
        Some(job) => job,
        None => {
            store.pool().close().await;
            bail!("job not found: {}", id);
        }
    };
    let topics = store.list_topics(id).await?;
    let content = history::job_content(&store, blobs.as_ref(), id).await?;
    store.pool().close().await;

    println!("Job {}", job.id);
    println!("  File:        {} ({} bytes)", job.file_name, job.file_size);
    println!("  Status:      {}", job.status);
    println!("  Autonomous:  {}", job.autonomous_mode);
    println!("  Content:     {}", job.total_content);
    println!("  Created:     {}", format_ts(job.created_at));
    println!("  Updated:     {}", format_ts(job.updated_at));
    println!();

    println!("Topics ({}):", topics.len());
    for topic in &topics {
        println!(
            "  - {} [{}, {}, {:.0}%]",
            topic.name, topic.content_type, topic.sentiment, topic.confidence
        );
    }
    println!();

    if content.is_empty() {
        println!("No generated content.");
    }
    for category in &content {
        println!(
            "{} ({} files, {})",
            category.title, category.file_count, category.total_size
        );
        for file in &category.files {
            println!("  {}  {}  {}", file.name, file.size, file.download_url);
        }
    }
    Ok(())
}

pub async fn run_jobs_delete(config: &Config, id: &str) -> Result<()> {
    let store = open_store(config).await?;
    let blobs = create_blob_store(&config.storage)?;
    let deleted = history::delete_job(&store, blobs.as_ref(), id).await?;
    store.pool().close().await;

    if !deleted {
        bail!("job not found: {}", id);
    }
    println!("Deleted job {}", id);
    Ok(())
}

/// Print the consolidation of a topics file without calling any service.
pub fn run_group(path: &Path) -> Result<()> {
    let topics = load_topics(path)?;
    let groups = consolidate(&topics);

    println!("{} topics -> {} groups", topics.len(), groups.len());
    for group in &groups {
        println!();
        println!(
            "{} [{}, {}, {} pages]",
            group.main_topic, group.content_type, group.sentiment, group.total_pages
        );
        for sub in &group.sub_topics {
            println!("  + {}", sub);
        }
    }
    Ok(())
}

/// Run the pipeline for an existing job and print the JSON response.
pub async fn run_process(
    config: &Config,
    topics_path: &Path,
    job_id: &str,
    file_name: Option<&str>,
) -> Result<()> {
    let topics = load_topics(topics_path)?;
    let pipeline = Pipeline::from_config(config).await?;

    let file_name = match file_name {
        Some(name) => name.to_string(),
        None => pipeline
            .metadata()
            .get_job(job_id)
            .await?
            .map(|j| j.file_name)
            .unwrap_or_default(),
    };

    let response = pipeline
        .process(&ProcessRequest {
            topics,
            file_name,
            job_id: job_id.to_string(),
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use topicforge_core::models::JobStatus;
    use topicforge_core::store::memory::InMemoryMetadataStore;

    #[tokio::test]
    async fn test_create_job_validates_input() {
        let store = InMemoryMetadataStore::new();
        assert!(create_job(&store, "  ", 10).await.is_err());
        assert!(create_job(&store, "a.pdf", -1).await.is_err());

        let job = create_job(&store, " report.pdf ", 10).await.unwrap();
        assert_eq!(job.file_name, "report.pdf");
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(store.list_jobs().await.unwrap().len(), 1);
    }

    #[test]
    fn test_load_topics_accepts_both_shapes() {
        let tmp = TempDir::new().unwrap();
        let topic = r#"{"name":"Budget","keywords":["cost"],"pages":[1],"contentType":"financial","sentiment":"neutral"}"#;

        let bare = tmp.path().join("bare.json");
        std::fs::write(&bare, format!("[{}]", topic)).unwrap();
        assert_eq!(load_topics(&bare).unwrap().len(), 1);

        let wrapped = tmp.path().join("wrapped.json");
        std::fs::write(
            &wrapped,
            format!(r#"{{"topics":[{}],"fileName":"f.pdf","jobId":"j"}}"#, topic),
        )
        .unwrap();
        assert_eq!(load_topics(&wrapped).unwrap()[0].name, "Budget");

        let broken = tmp.path().join("broken.json");
        std::fs::write(&broken, "{not json").unwrap();
        assert!(load_topics(&broken).is_err());
    }

    #[test]
    fn test_format_ts() {
        assert_eq!(format_ts(0), "1970-01-01T00:00:00Z");
    }
}
