//! Job history views: rebuilding category results from stored artifact
//! rows, and deleting a job together with its stored artifacts.

use std::collections::BTreeMap;

use anyhow::Result;
use tracing::warn;

use crate::models::{ArtifactRecord, Category, CategoryResult, GeneratedFile};
use crate::render;
use crate::store::{BlobStore, MetadataStore};

/// Group stored artifact rows into one [`CategoryResult`] per category.
///
/// `file_count` is the number of rows, `total_size` the sum of the rows'
/// size labels. Categories are returned in [`Category::ALL`] order and
/// empty categories are omitted.
pub fn category_view(records: &[ArtifactRecord], blobs: &dyn BlobStore) -> Vec<CategoryResult> {
    let mut by_category: BTreeMap<Category, (CategoryResult, u64)> = BTreeMap::new();

    for record in records {
        let (aggregate, total_kb) = by_category
            .entry(record.category)
            .or_insert_with(|| (CategoryResult::empty(record.category), 0));

        aggregate.files.push(GeneratedFile {
            name: record.file_name.clone(),
            file_type: record.file_type.clone(),
            size: record.file_size.clone(),
            download_url: blobs.public_url(&record.file_path),
        });
        *total_kb += render::parse_size_label(&record.file_size).unwrap_or(0);
    }

    by_category
        .into_values()
        .map(|(mut aggregate, total_kb)| {
            aggregate.file_count = aggregate.files.len();
            aggregate.total_size = render::size_label(total_kb);
            aggregate
        })
        .collect()
}

/// Load a job's artifacts and return its category view.
pub async fn job_content(
    metadata: &dyn MetadataStore,
    blobs: &dyn BlobStore,
    job_id: &str,
) -> Result<Vec<CategoryResult>> {
    let records = metadata.list_artifacts(job_id).await?;
    Ok(category_view(&records, blobs))
}

/// Delete a job: first every artifact blob, then the job's rows.
///
/// Blob removal failures are logged and do not stop the deletion. Returns
/// `false` when the job did not exist.
pub async fn delete_job(
    metadata: &dyn MetadataStore,
    blobs: &dyn BlobStore,
    job_id: &str,
) -> Result<bool> {
    if metadata.get_job(job_id).await?.is_none() {
        return Ok(false);
    }

    for record in metadata.list_artifacts(job_id).await? {
        if let Err(e) = blobs.remove(&record.file_path).await {
            warn!(job_id, path = %record.file_path, error = %e, "failed to remove artifact blob");
        }
    }

    metadata.delete_job(job_id).await
}
