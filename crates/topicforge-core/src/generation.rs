//! Text-generation abstraction and prompt construction.
//!
//! Defines the [`TextGenerator`] trait that all generation backends
//! implement, and [`build_request`], which turns a [`TopicGroup`] into the
//! structured prompt sent to the backend.
//!
//! Concrete backends (the OpenAI-compatible chat-completions client) and the
//! paced, deadline-bounded generation loop live in the `topicforge` app
//! crate.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::TopicGroup;

/// Fixed system instruction sent with every generation request.
pub const SYSTEM_PROMPT: &str = "You are an expert content strategist and analyst. \
You turn consolidated topic detections from uploaded documents into substantial, \
well-structured analyses written in clear professional prose with markdown headings.";

/// Minimum length the backend is asked to produce, in words.
pub const MIN_TARGET_WORDS: usize = 800;

/// Section outline every analysis must follow, in order.
pub const SECTIONS: [&str; 5] = [
    "Executive Summary",
    "Key Findings",
    "Recommendations",
    "Supporting Context",
    "Strategic Implications",
];

/// Sampling parameters applied to every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 4000,
        }
    }
}

/// A single request to a [`TextGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A backend that turns a structured prompt into generated prose.
///
/// Implementations either return the generated text or fail; callers treat
/// every failure (transport, non-success status, malformed body) the same
/// way.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend identifier used in logs (e.g. `"openai:gpt-4.1"`).
    fn name(&self) -> &str;

    /// Generate text for one request.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Build the generation request for one consolidated group.
pub fn build_request(group: &TopicGroup, settings: &GenerationSettings) -> GenerationRequest {
    let sub_topics = if group.sub_topics.is_empty() {
        "none".to_string()
    } else {
        group.sub_topics.join(", ")
    };

    let outline: String = SECTIONS
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}\n", i + 1, s))
        .collect();

    let prompt = format!(
        "Create a comprehensive analysis for this consolidated topic.\n\n\
         Main topic: {main}\n\
         Related sub-topics: {subs}\n\
         Content type: {ctype}\n\
         Keywords: {keywords}\n\
         Sentiment: {sentiment}\n\
         Page coverage: {pages} pages\n\n\
         Write at least {words} words using these markdown sections, in order:\n\
         {outline}\n\
         Use numbered or bulleted lists for findings, and state concrete \
         recommendations explicitly.",
        main = group.main_topic,
        subs = sub_topics,
        ctype = group.content_type,
        keywords = group.all_keywords.join(", "),
        sentiment = group.sentiment,
        pages = group.total_pages,
        words = MIN_TARGET_WORDS,
        outline = outline,
    );

    GenerationRequest {
        system: SYSTEM_PROMPT.to_string(),
        prompt,
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
    }
}
