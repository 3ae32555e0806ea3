//! SQLite-backed [`MetadataStore`] implementation.
//!
//! Maps each [`MetadataStore`] operation onto the `processing_jobs`,
//! `detected_topics`, and `generated_content` tables created by
//! [`migrate::apply_schema`](crate::migrate::apply_schema).

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use topicforge_core::models::{ArtifactRecord, Job, JobUpdate, Topic};
use topicforge_core::store::MetadataStore;

/// SQLite implementation of the [`MetadataStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn job_from_row(row: &SqliteRow) -> Result<Job> {
    let status: String = row.get("status");
    Ok(Job {
        id: row.get("id"),
        file_name: row.get("file_name"),
        file_size: row.get("file_size"),
        status: status.parse()?,
        total_content: row.get("total_content"),
        autonomous_mode: row.get::<i64, _>("autonomous_mode") != 0,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn topic_from_row(row: &SqliteRow) -> Result<Topic> {
    let keywords_json: String = row.get("keywords_json");
    let pages_json: String = row.get("pages_json");
    let content_type: String = row.get("content_type");
    let sentiment: String = row.get("sentiment");
    Ok(Topic {
        name: row.get("name"),
        confidence: row.get("confidence"),
        keywords: serde_json::from_str(&keywords_json).context("corrupt keywords_json")?,
        pages: serde_json::from_str(&pages_json).context("corrupt pages_json")?,
        content_type: content_type.parse()?,
        sentiment: sentiment.parse()?,
        language: row.get("language"),
    })
}

fn artifact_from_row(row: &SqliteRow) -> Result<ArtifactRecord> {
    let category: String = row.get("category");
    let description: Option<String> = row.get("description");
    Ok(ArtifactRecord {
        id: row.get("id"),
        job_id: row.get("job_id"),
        category: category.parse()?,
        title: row.get("title"),
        description: description.unwrap_or_default(),
        file_name: row.get("file_name"),
        file_path: row.get("file_path"),
        file_type: row.get("file_type"),
        file_size: row.get("file_size"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn create_job(&self, job: &Job) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO processing_jobs (id, file_name, file_size, status, total_content,
                                         autonomous_mode, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.id)
        .bind(&job.file_name)
        .bind(job.file_size)
        .bind(job.status.as_str())
        .bind(job.total_content)
        .bind(job.autonomous_mode as i64)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_job(&self, id: &str) -> Result<Option<Job>> {
        let row = sqlx::query("SELECT * FROM processing_jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(job_from_row).transpose()
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        let rows = sqlx::query("SELECT * FROM processing_jobs ORDER BY created_at DESC, id ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(job_from_row).collect()
    }

    async fn update_job(&self, id: &str, update: &JobUpdate) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE processing_jobs SET
                status = COALESCE(?, status),
                total_content = COALESCE(?, total_content),
                autonomous_mode = COALESCE(?, autonomous_mode),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.total_content)
        .bind(update.autonomous_mode.map(|f| f as i64))
        .bind(update.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            bail!("job not found: {}", id);
        }
        Ok(())
    }

    async fn delete_job(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM generated_content WHERE job_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM detected_topics WHERE job_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM processing_jobs WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_topics(&self, job_id: &str, topics: &[Topic]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for topic in topics {
            sqlx::query(
                r#"
                INSERT INTO detected_topics (job_id, name, confidence, keywords_json, pages_json,
                                             content_type, sentiment, language)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(job_id)
            .bind(&topic.name)
            .bind(topic.confidence)
            .bind(serde_json::to_string(&topic.keywords)?)
            .bind(serde_json::to_string(&topic.pages)?)
            .bind(topic.content_type.as_str())
            .bind(topic.sentiment.as_str())
            .bind(&topic.language)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_topics(&self, job_id: &str) -> Result<Vec<Topic>> {
        let rows = sqlx::query("SELECT * FROM detected_topics WHERE job_id = ? ORDER BY id ASC")
            .bind(job_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(topic_from_row).collect()
    }

    async fn insert_artifact(&self, record: &ArtifactRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO generated_content (id, job_id, category, title, description, file_name,
                                           file_path, file_type, file_size, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.job_id)
        .bind(record.category.id())
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.file_name)
        .bind(&record.file_path)
        .bind(&record.file_type)
        .bind(&record.file_size)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_artifacts(&self, job_id: &str) -> Result<Vec<ArtifactRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM generated_content WHERE job_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(artifact_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::apply_schema;
    use sqlx::sqlite::SqlitePoolOptions;
    use topicforge_core::models::{Category, ContentType, JobStatus, Sentiment};

    async fn store() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        apply_schema(&pool).await.unwrap();
        SqliteStore::new(pool)
    }

    #[tokio::test]
    async fn test_job_lifecycle() {
        let store = store().await;
        let job = Job::new("brochure.pdf", 4096);
        store.create_job(&job).await.unwrap();

        let loaded = store.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(loaded, job);

        store
            .update_job(
                &job.id,
                &JobUpdate {
                    status: Some(JobStatus::Completed),
                    total_content: Some(4),
                    autonomous_mode: None,
                    updated_at: job.updated_at + 5,
                },
            )
            .await
            .unwrap();
        let updated = store.get_job(&job.id).await.unwrap().unwrap();
        assert_eq!(updated.status, JobStatus::Completed);
        assert_eq!(updated.total_content, 4);
        assert!(!updated.autonomous_mode);
        assert_eq!(updated.updated_at, job.updated_at + 5);

        assert!(store
            .update_job("missing", &JobUpdate::default())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_topics_and_artifacts_round_trip() {
        let store = store().await;
        let job = Job::new("deck.pptx", 1);
        store.create_job(&job).await.unwrap();

        let topic = Topic {
            name: "Balance Beam".to_string(),
            confidence: 91.5,
            keywords: vec!["beam".into(), "balance".into()],
            pages: vec![2, 3],
            content_type: ContentType::Gymnastics,
            sentiment: Sentiment::Positive,
            language: "en".to_string(),
        };
        store.insert_topics(&job.id, &[topic.clone()]).await.unwrap();
        assert_eq!(store.list_topics(&job.id).await.unwrap(), vec![topic]);

        let record = ArtifactRecord {
            id: "a1".to_string(),
            job_id: job.id.clone(),
            category: Category::ExecutiveSummary,
            title: "Balance Beam".to_string(),
            description: "Executive summary of Balance Beam".to_string(),
            file_name: "balance_beam_executive-summary.md".to_string(),
            file_path: format!("{}/executive-summary/balance_beam_executive-summary.md", job.id),
            file_type: "md".to_string(),
            file_size: "2 KB".to_string(),
            created_at: 100,
        };
        store.insert_artifact(&record).await.unwrap();
        assert_eq!(store.list_artifacts(&job.id).await.unwrap(), vec![record]);

        assert!(store.delete_job(&job.id).await.unwrap());
        assert!(store.list_topics(&job.id).await.unwrap().is_empty());
        assert!(store.list_artifacts(&job.id).await.unwrap().is_empty());
        assert!(!store.delete_job(&job.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_artifact_for_unknown_job_rejected() {
        let store = store().await;
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(store.pool())
            .await
            .unwrap();
        let record = ArtifactRecord {
            id: "orphan".to_string(),
            job_id: "no-such-job".to_string(),
            category: Category::Analysis,
            title: "t".to_string(),
            description: String::new(),
            file_name: "t_analysis.md".to_string(),
            file_path: "no-such-job/analysis/t_analysis.md".to_string(),
            file_type: "md".to_string(),
            file_size: "1 KB".to_string(),
            created_at: 1,
        };
        assert!(store.insert_artifact(&record).await.is_err());
    }
}
