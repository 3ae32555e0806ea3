//! Core data models used throughout Topicforge.
//!
//! These types represent the detected topics, consolidated groups, generated
//! results, stored artifacts, and job records that flow through the
//! consolidation and content-generation pipeline.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Broad classification of a detected topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Gymnastics,
    Storytelling,
    Business,
    Financial,
    Educational,
    Other,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Gymnastics => "gymnastics",
            ContentType::Storytelling => "storytelling",
            ContentType::Business => "business",
            ContentType::Financial => "financial",
            ContentType::Educational => "educational",
            ContentType::Other => "other",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "gymnastics" => ContentType::Gymnastics,
            "storytelling" => ContentType::Storytelling,
            "business" => ContentType::Business,
            "financial" => ContentType::Financial,
            "educational" => ContentType::Educational,
            "other" => ContentType::Other,
            other => bail!("unknown content type: '{}'", other),
        })
    }
}

/// Overall tone of a detected topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "positive" => Sentiment::Positive,
            "neutral" => Sentiment::Neutral,
            "negative" => Sentiment::Negative,
            other => bail!("unknown sentiment: '{}'", other),
        })
    }
}

/// A subject area detected within an uploaded document.
///
/// Produced by the external document-analysis step and immutable once
/// received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub name: String,
    /// Detection confidence, `0..=100`.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// One-based page numbers the topic appears on.
    #[serde(default)]
    pub pages: Vec<u32>,
    pub content_type: ContentType,
    pub sentiment: Sentiment,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl Topic {
    /// Reject topics that could not have come from a well-formed analysis.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("topic name must not be empty");
        }
        if !(0.0..=100.0).contains(&self.confidence) {
            bail!(
                "topic '{}': confidence must be in [0, 100], got {}",
                self.name,
                self.confidence
            );
        }
        if self.pages.iter().any(|&p| p == 0) {
            bail!("topic '{}': page numbers must be positive", self.name);
        }
        Ok(())
    }
}

/// A merged cluster of one or more similar [`Topic`]s.
///
/// Exists only for the duration of one processing run; it is the unit of
/// content generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicGroup {
    /// Name of the representative topic.
    pub main_topic: String,
    /// Names of the topics folded into the representative.
    pub sub_topics: Vec<String>,
    pub content_type: ContentType,
    pub sentiment: Sentiment,
    /// Concatenated keywords of every member (duplicates preserved).
    pub all_keywords: Vec<String>,
    pub total_pages: u32,
}

/// Generated prose for one [`TopicGroup`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub topic: String,
    pub content: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub sub_topics: Vec<String>,
    pub pages: u32,
}

/// Output categories. Every generation result is rendered once per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Analysis,
    ExecutiveSummary,
}

impl Category {
    /// All categories, in output order.
    pub const ALL: [Category; 2] = [Category::Analysis, Category::ExecutiveSummary];

    pub fn id(&self) -> &'static str {
        match self {
            Category::Analysis => "analysis",
            Category::ExecutiveSummary => "executive-summary",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::Analysis => "Comprehensive Analysis",
            Category::ExecutiveSummary => "Executive Summaries",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Analysis => "In-depth structured analysis for each consolidated topic",
            Category::ExecutiveSummary => "Condensed overviews with key takeaways and recommendations",
        }
    }

    /// Icon name understood by the browsing UI.
    pub fn icon(&self) -> &'static str {
        match self {
            Category::Analysis => "FileText",
            Category::ExecutiveSummary => "Briefcase",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "analysis" => Category::Analysis,
            "executive-summary" => Category::ExecutiveSummary,
            other => bail!("unknown category: '{}'", other),
        })
    }
}

/// A metadata row describing one stored artifact (`generated_content`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    pub id: String,
    pub job_id: String,
    pub category: Category,
    pub title: String,
    pub description: String,
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    /// Human-readable size label, e.g. `"3 KB"`.
    pub file_size: String,
    pub created_at: i64,
}

/// A downloadable file inside a [`CategoryResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedFile {
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub size: String,
    pub download_url: String,
}

/// Aggregated view of every artifact of one category for a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResult {
    pub id: Category,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub file_count: usize,
    pub total_size: String,
    pub files: Vec<GeneratedFile>,
}

impl CategoryResult {
    pub fn empty(category: Category) -> Self {
        Self {
            id: category,
            title: category.title().to_string(),
            description: category.description().to_string(),
            icon: category.icon().to_string(),
            file_count: 0,
            total_size: String::new(),
            files: Vec::new(),
        }
    }
}

/// Lifecycle state of a [`Job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            other => bail!("unknown job status: '{}'", other),
        })
    }
}

/// The persistent record tracking one end-to-end processing run
/// (`processing_jobs`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub file_name: String,
    pub file_size: i64,
    pub status: JobStatus,
    pub total_content: i64,
    pub autonomous_mode: bool,
    /// Unix epoch seconds.
    pub created_at: i64,
    /// Unix epoch seconds.
    pub updated_at: i64,
}

impl Job {
    /// A fresh job in the `processing` state with a random UUID.
    pub fn new(file_name: impl Into<String>, file_size: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            file_name: file_name.into(),
            file_size,
            status: JobStatus::Processing,
            total_content: 0,
            autonomous_mode: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied to a job row. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub total_content: Option<i64>,
    pub autonomous_mode: Option<bool>,
    pub updated_at: i64,
}

/// Pipeline stage at which a unit of work was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipStage {
    Generation,
    Upload,
    Metadata,
}

/// A unit of work dropped by the best-effort pipeline, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedItem {
    pub stage: SkipStage,
    /// Topic name for generation skips, storage path for artifact skips.
    pub item: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_deserializes_camel_case() {
        let json = r#"{
            "name": "Yoga Basics",
            "confidence": 87,
            "keywords": ["yoga", "stretch"],
            "pages": [1, 2],
            "contentType": "educational",
            "sentiment": "positive"
        }"#;
        let topic: Topic = serde_json::from_str(json).unwrap();
        assert_eq!(topic.content_type, ContentType::Educational);
        assert_eq!(topic.sentiment, Sentiment::Positive);
        assert_eq!(topic.language, "en");
        assert!(topic.validate().is_ok());
    }

    #[test]
    fn test_unknown_content_type_rejected() {
        let json = r#"{"name":"x","contentType":"poetry","sentiment":"neutral"}"#;
        assert!(serde_json::from_str::<Topic>(json).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_page_and_bad_confidence() {
        let mut topic: Topic = serde_json::from_str(
            r#"{"name":"x","pages":[0],"contentType":"other","sentiment":"neutral"}"#,
        )
        .unwrap();
        assert!(topic.validate().is_err());
        topic.pages = vec![3];
        topic.confidence = 140.0;
        assert!(topic.validate().is_err());
    }

    #[test]
    fn test_category_ids_round_trip_through_from_str() {
        for category in Category::ALL {
            assert_eq!(category.id().parse::<Category>().unwrap(), category);
        }
        assert_eq!(
            serde_json::to_value(Category::ExecutiveSummary).unwrap(),
            serde_json::json!("executive-summary")
        );
    }
}
