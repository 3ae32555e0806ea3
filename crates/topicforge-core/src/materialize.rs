//! Artifact materialization.
//!
//! Turns each [`GenerationResult`] into one markdown artifact per
//! [`Category`], uploads the bytes to the [`BlobStore`], records a metadata
//! row in the [`MetadataStore`], and aggregates the successful artifacts into
//! one [`CategoryResult`] per category.
//!
//! # Failure policy
//!
//! Each (category, result) pair is independent. A failed upload or a failed
//! metadata write drops that artifact only: it is logged, reported as a
//! [`SkippedItem`], and excluded from the category's `file_count`. There are
//! no retries. A blob whose metadata write failed stays in storage.
//!
//! # File names
//!
//! Topic names that slug to the same value get `_2`, `_3`, ... suffixes in
//! input order, so every artifact of a job has its own storage path.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{
    ArtifactRecord, Category, CategoryResult, GeneratedFile, GenerationResult, SkipStage,
    SkippedItem,
};
use crate::render::{self, CONTENT_TYPE, FILE_TYPE};
use crate::store::{BlobStore, MetadataStore};

/// Categories produced for one job, plus every artifact that was dropped.
#[derive(Debug, Clone, Default)]
pub struct MaterializeOutcome {
    /// Non-empty categories, in [`Category::ALL`] order.
    pub categories: Vec<CategoryResult>,
    pub skipped: Vec<SkippedItem>,
}

impl MaterializeOutcome {
    /// Total successful artifacts across all categories.
    pub fn total_files(&self) -> usize {
        self.categories.iter().map(|c| c.file_count).sum()
    }
}

/// Renders, uploads, and records artifacts.
pub struct Materializer<'a> {
    blobs: &'a dyn BlobStore,
    metadata: &'a dyn MetadataStore,
}

impl<'a> Materializer<'a> {
    pub fn new(blobs: &'a dyn BlobStore, metadata: &'a dyn MetadataStore) -> Self {
        Self { blobs, metadata }
    }

    /// Materialize every result in every category, dated today (UTC).
    pub async fn materialize(
        &self,
        results: &[GenerationResult],
        job_id: &str,
    ) -> MaterializeOutcome {
        self.materialize_on(results, job_id, Utc::now().date_naive())
            .await
    }

    /// Like [`materialize`](Self::materialize) with an explicit generation date.
    pub async fn materialize_on(
        &self,
        results: &[GenerationResult],
        job_id: &str,
        generated_on: NaiveDate,
    ) -> MaterializeOutcome {
        let mut outcome = MaterializeOutcome::default();
        let slugs = unique_slugs(results);

        for category in Category::ALL {
            let mut aggregate = CategoryResult::empty(category);
            let mut total_kb: u64 = 0;

            for (result, slug) in results.iter().zip(&slugs) {
                let file_name = render::slug_file_name(slug, category);
                match self
                    .materialize_one(category, result, file_name, job_id, generated_on)
                    .await
                {
                    Ok((file, kb)) => {
                        aggregate.files.push(file);
                        total_kb += kb;
                    }
                    Err(skip) => {
                        warn!(
                            job_id,
                            stage = ?skip.stage,
                            item = %skip.item,
                            reason = %skip.reason,
                            "artifact skipped"
                        );
                        outcome.skipped.push(skip);
                    }
                }
            }

            if !aggregate.files.is_empty() {
                aggregate.file_count = aggregate.files.len();
                aggregate.total_size = render::size_label(total_kb);
                outcome.categories.push(aggregate);
            }
        }

        outcome
    }

    async fn materialize_one(
        &self,
        category: Category,
        result: &GenerationResult,
        file_name: String,
        job_id: &str,
        generated_on: NaiveDate,
    ) -> Result<(GeneratedFile, u64), SkippedItem> {
        let body = render::render(category, result, generated_on);
        let bytes = body.as_bytes();
        let path = render::artifact_path(job_id, category, &file_name);

        self.blobs
            .upload(&path, bytes, CONTENT_TYPE, true)
            .await
            .map_err(|e| SkippedItem {
                stage: SkipStage::Upload,
                item: path.clone(),
                reason: e.to_string(),
            })?;

        let kb = render::size_kb(bytes.len());
        let size = render::size_label(kb);
        let record = ArtifactRecord {
            id: Uuid::new_v4().to_string(),
            job_id: job_id.to_string(),
            category,
            title: result.topic.clone(),
            description: describe(category, result),
            file_name: file_name.clone(),
            file_path: path.clone(),
            file_type: FILE_TYPE.to_string(),
            file_size: size.clone(),
            created_at: Utc::now().timestamp(),
        };

        self.metadata
            .insert_artifact(&record)
            .await
            .map_err(|e| SkippedItem {
                stage: SkipStage::Metadata,
                item: path.clone(),
                reason: e.to_string(),
            })?;

        debug!(job_id, path = %path, size = %size, "artifact stored");

        Ok((
            GeneratedFile {
                name: file_name,
                file_type: FILE_TYPE.to_string(),
                size,
                download_url: self.blobs.public_url(&path),
            },
            kb,
        ))
    }
}

/// One slug per result, suffixed `_2`, `_3`, ... when an earlier result
/// already claimed it.
fn unique_slugs(results: &[GenerationResult]) -> Vec<String> {
    let mut seen = HashSet::new();
    results
        .iter()
        .map(|result| {
            let base = render::slug(&result.topic);
            let mut candidate = base.clone();
            let mut n = 2;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{}_{}", base, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

fn describe(category: Category, result: &GenerationResult) -> String {
    match category {
        Category::Analysis => format!(
            "Comprehensive {} analysis of {}",
            result.content_type, result.topic
        ),
        Category::ExecutiveSummary => format!("Executive summary of {}", result.topic),
    }
}
