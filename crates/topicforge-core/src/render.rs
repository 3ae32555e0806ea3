//! Markdown templates for the output categories, plus the file naming and
//! size bookkeeping shared by the materializer and the job history views.
//!
//! # Templates
//!
//! - [`Category::Analysis`] wraps the generated text verbatim between a
//!   header (topic, related topics, content type, page coverage) and a
//!   footer (generation date, method).
//! - [`Category::ExecutiveSummary`] condenses the same text: the first three
//!   paragraphs, up to eight list-like lines, and up to five
//!   recommendation-like lines.
//!
//! Rendering is a pure function of the result and the supplied date, so
//! re-rendering the same result on the same day is byte-identical.

use chrono::NaiveDate;

use crate::models::{Category, GenerationResult};

/// File type recorded for every rendered artifact.
pub const FILE_TYPE: &str = "md";

/// MIME type used when uploading rendered artifacts.
pub const CONTENT_TYPE: &str = "text/markdown";

const METHOD_LABEL: &str = "Autonomous topic consolidation and AI content generation";

const MAX_OVERVIEW_BLOCKS: usize = 3;
const MAX_TAKEAWAYS: usize = 8;
const MAX_RECOMMENDATIONS: usize = 5;

const RECOMMENDATION_WORDS: [&str; 3] = ["recommend", "suggest", "should"];

const FALLBACK_RECOMMENDATIONS: [&str; 3] = [
    "Review the full analysis to identify priorities relevant to your goals.",
    "Share the key takeaways with stakeholders and collect their feedback.",
    "Revisit the source document periodically as the topic evolves.",
];

/// Render one artifact of `category` for `result`.
pub fn render(category: Category, result: &GenerationResult, generated_on: NaiveDate) -> String {
    match category {
        Category::Analysis => render_analysis(result, generated_on),
        Category::ExecutiveSummary => render_executive_summary(result, generated_on),
    }
}

fn render_analysis(result: &GenerationResult, generated_on: NaiveDate) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", result.topic));
    if !result.sub_topics.is_empty() {
        out.push_str(&format!(
            "**Related topics:** {}\n",
            result.sub_topics.join(", ")
        ));
    }
    out.push_str(&format!("**Content type:** {}\n", result.content_type));
    out.push_str(&format!("**Page coverage:** {} pages\n\n", result.pages));
    out.push_str("---\n\n");
    out.push_str(result.content.trim());
    out.push_str("\n\n---\n\n");
    out.push_str(&footer(generated_on));
    out
}

fn render_executive_summary(result: &GenerationResult, generated_on: NaiveDate) -> String {
    let overview = overview_blocks(&result.content);
    let takeaways = key_takeaways(&result.content);
    let recommendations = recommendations(&result.content);

    let mut out = String::new();
    out.push_str(&format!("# Executive Summary: {}\n\n", result.topic));

    out.push_str("## Quick Overview\n\n");
    for block in &overview {
        out.push_str(block);
        out.push_str("\n\n");
    }

    out.push_str("## Key Takeaways\n\n");
    if takeaways.is_empty() {
        out.push_str("_No list items were found in the analysis._\n");
    } else {
        for line in &takeaways {
            out.push_str(&format!("- {}\n", line));
        }
    }
    out.push('\n');

    out.push_str("## Recommendations\n\n");
    for (i, line) in recommendations.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, line));
    }

    out.push_str("\n---\n\n");
    out.push_str(&footer(generated_on));
    out
}

fn footer(generated_on: NaiveDate) -> String {
    format!(
        "*Generated on {} · {}*\n",
        generated_on.format("%Y-%m-%d"),
        METHOD_LABEL
    )
}

/// The first three non-empty blocks separated by blank lines.
///
/// A line counts as blank when it holds only whitespace, so CRLF text and
/// indented blank lines split blocks too.
pub fn overview_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }
    blocks
        .into_iter()
        .map(|b| b.trim().to_string())
        .take(MAX_OVERVIEW_BLOCKS)
        .collect()
}

/// Up to eight lines that look like list items, with their markers removed.
pub fn key_takeaways(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| is_list_item(l))
        .map(strip_list_marker)
        .filter(|l| !l.is_empty())
        .take(MAX_TAKEAWAYS)
        .collect()
}

/// Up to five recommendation-like lines, or three generic fallbacks.
///
/// Markdown headings are never treated as recommendations, so the
/// `## Recommendations` section title itself is skipped.
pub fn recommendations(text: &str) -> Vec<String> {
    let found: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.starts_with('#'))
        .filter(|l| {
            let lower = l.to_lowercase();
            RECOMMENDATION_WORDS.iter().any(|w| lower.contains(w))
        })
        .map(strip_list_marker)
        .filter(|l| !l.is_empty())
        .take(MAX_RECOMMENDATIONS)
        .collect();

    if found.is_empty() {
        FALLBACK_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect()
    } else {
        found
    }
}

fn is_list_item(line: &str) -> bool {
    list_marker_len(line).is_some()
}

/// Byte length of a leading `1.`, `2)`, `-`, `*` or `•` marker.
///
/// A marker only counts when whitespace or the end of the line follows it,
/// so `3D printing`, `2024 revenue` and `**Bold**` are plain text.
fn list_marker_len(line: &str) -> Option<usize> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    let marker = if digits > 0 {
        match line[digits..].chars().next() {
            Some(c @ ('.' | ')')) => digits + c.len_utf8(),
            _ => return None,
        }
    } else {
        match line.chars().next() {
            Some(c @ ('-' | '*' | '•')) => c.len_utf8(),
            _ => return None,
        }
    };
    match line[marker..].chars().next() {
        None => Some(marker),
        Some(c) if c.is_whitespace() => Some(marker),
        Some(_) => None,
    }
}

/// Remove a leading list marker, if there is one.
fn strip_list_marker(line: &str) -> String {
    let rest = match list_marker_len(line) {
        Some(n) => &line[n..],
        None => line,
    };
    rest.trim().to_string()
}

/// File name for a topic's artifact in `category`.
///
/// The topic name is lower-cased, runs of non-alphanumeric characters become
/// a single `_`, and leading/trailing underscores are trimmed.
///
/// ```rust
/// use topicforge_core::models::Category;
/// use topicforge_core::render::file_name;
///
/// assert_eq!(file_name("Yoga Basics!", Category::Analysis), "yoga_basics_analysis.md");
/// ```
pub fn file_name(topic: &str, category: Category) -> String {
    slug_file_name(&slug(topic), category)
}

/// Lower-cased, underscore-joined form of a topic name; `"topic"` when
/// nothing alphanumeric remains.
pub fn slug(topic: &str) -> String {
    let mut slug = String::with_capacity(topic.len());
    for c in topic.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        "topic".to_string()
    } else {
        slug.to_string()
    }
}

/// File name for an already-slugged topic in `category`.
pub fn slug_file_name(slug: &str, category: Category) -> String {
    format!("{}_{}.{}", slug, category.id(), FILE_TYPE)
}

/// Storage path scoped by job and category: `{job_id}/{category}/{file_name}`.
pub fn artifact_path(job_id: &str, category: Category, file_name: &str) -> String {
    format!("{}/{}/{}", job_id, category.id(), file_name)
}

/// Size in kilobytes, rounded up, never below 1.
pub fn size_kb(bytes: usize) -> u64 {
    (bytes as u64).div_ceil(1024).max(1)
}

/// Human-readable size label, e.g. `"3 KB"`.
pub fn size_label(kb: u64) -> String {
    format!("{} KB", kb)
}

/// Parse a label produced by [`size_label`] back into kilobytes.
pub fn parse_size_label(label: &str) -> Option<u64> {
    label.trim().strip_suffix("KB")?.trim().parse().ok()
}
