//! Paced, deadline-bounded content generation over consolidated groups.
//!
//! Groups are processed strictly one after another. Each call is wrapped in
//! a deadline, and a fixed pause follows every call (success or failure) to
//! stay under provider rate limits. A group whose call fails, times out, or
//! returns an unusable body is skipped and reported; the remaining groups
//! still run.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use topicforge_core::generation::{build_request, GenerationSettings, TextGenerator};
use topicforge_core::models::{GenerationResult, SkipStage, SkippedItem, TopicGroup};

use crate::config::GenerationConfig;

/// Results for every group that produced content, in group order, plus
/// the groups that did not.
#[derive(Debug, Default)]
pub struct GenerationOutcome {
    pub results: Vec<GenerationResult>,
    pub skipped: Vec<SkippedItem>,
}

pub struct ContentGenerator {
    generator: Arc<dyn TextGenerator>,
    settings: GenerationSettings,
    timeout: Duration,
    pacing: Duration,
}

impl ContentGenerator {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        settings: GenerationSettings,
        timeout: Duration,
        pacing: Duration,
    ) -> Self {
        Self {
            generator,
            settings,
            timeout,
            pacing,
        }
    }

    pub fn from_config(generator: Arc<dyn TextGenerator>, config: &GenerationConfig) -> Self {
        Self::new(
            generator,
            config.settings(),
            Duration::from_secs(config.timeout_secs),
            Duration::from_millis(config.pacing_ms),
        )
    }

    pub async fn generate_all(&self, groups: &[TopicGroup], job_id: &str) -> GenerationOutcome {
        let mut outcome = GenerationOutcome::default();

        for group in groups {
            let request = build_request(group, &self.settings);
            let reply = tokio::time::timeout(self.timeout, self.generator.generate(&request)).await;

            let failure = match reply {
                Ok(Ok(content)) => {
                    debug!(
                        job_id,
                        topic = %group.main_topic,
                        chars = content.len(),
                        backend = self.generator.name(),
                        "generated content"
                    );
                    outcome.results.push(GenerationResult {
                        topic: group.main_topic.clone(),
                        content,
                        content_type: group.content_type,
                        sub_topics: group.sub_topics.clone(),
                        pages: group.total_pages,
                    });
                    None
                }
                Ok(Err(e)) => Some(e.to_string()),
                Err(_) => Some(format!(
                    "generation timed out after {}s",
                    self.timeout.as_secs_f64()
                )),
            };

            if let Some(reason) = failure {
                warn!(
                    job_id,
                    stage = "generation",
                    item = %group.main_topic,
                    reason = %reason,
                    "skipping group"
                );
                outcome.skipped.push(SkippedItem {
                    stage: SkipStage::Generation,
                    item: group.main_topic.clone(),
                    reason,
                });
            }

            if !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        outcome
    }
}
