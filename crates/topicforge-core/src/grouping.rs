//! Greedy keyword-similarity topic consolidation.
//!
//! Folds detected [`Topic`]s into [`TopicGroup`]s so that related topics are
//! analysed together in a single generation request.
//!
//! # Algorithm
//!
//! 1. Walk topics in input order, skipping any already consumed.
//! 2. The current topic becomes the group's representative.
//! 3. Every later unconsumed topic is folded in when the Jaccard index of
//!    the two (case-insensitive) keyword sets is above
//!    [`SIMILARITY_THRESHOLD`], **or** when it shares the representative's
//!    content type.
//! 4. Folded topics contribute their name, keywords (concatenated, not
//!    deduplicated) and page count to the group.
//!
//! This is a single greedy pass, not a clustering: results depend on input
//! order, and the content-type clause alone is enough to merge two topics.
//!
//! # Example
//!
//! ```rust
//! use topicforge_core::grouping::keyword_similarity;
//!
//! let a = vec!["yoga".to_string(), "stretch".to_string()];
//! let b = vec!["Yoga".to_string(), "injury".to_string()];
//! assert!((keyword_similarity(&a, &b) - 1.0 / 3.0).abs() < 1e-9);
//! ```

use std::collections::HashSet;

use crate::models::{Topic, TopicGroup};

/// Keyword similarity strictly above this value folds two topics together.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

/// Jaccard index over the lower-cased keyword sets of two topics.
///
/// Returns `0.0` when both sets are empty.
pub fn keyword_similarity(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<String> = a.iter().map(|k| k.to_lowercase()).collect();
    let set_b: HashSet<String> = b.iter().map(|k| k.to_lowercase()).collect();

    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    intersection as f64 / union as f64
}

/// Whether `candidate` should be folded into the group led by `representative`.
fn should_fold(representative: &Topic, candidate: &Topic) -> bool {
    keyword_similarity(&representative.keywords, &candidate.keywords) > SIMILARITY_THRESHOLD
        || representative.content_type == candidate.content_type
}

/// Consolidate topics into groups.
///
/// Every input topic ends up in exactly one group, either as its
/// representative (`main_topic`) or in its `sub_topics`.
pub fn consolidate(topics: &[Topic]) -> Vec<TopicGroup> {
    let mut used = vec![false; topics.len()];
    let mut groups = Vec::new();

    for (i, representative) in topics.iter().enumerate() {
        if used[i] {
            continue;
        }
        used[i] = true;

        let mut group = TopicGroup {
            main_topic: representative.name.clone(),
            sub_topics: Vec::new(),
            content_type: representative.content_type,
            sentiment: representative.sentiment,
            all_keywords: representative.keywords.clone(),
            total_pages: representative.pages.len() as u32,
        };

        for (j, candidate) in topics.iter().enumerate().skip(i + 1) {
            if used[j] || !should_fold(representative, candidate) {
                continue;
            }
            used[j] = true;
            group.sub_topics.push(candidate.name.clone());
            group.all_keywords.extend(candidate.keywords.iter().cloned());
            group.total_pages += candidate.pages.len() as u32;
        }

        groups.push(group);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentType, Sentiment};

    fn topic(name: &str, keywords: &[&str], content_type: ContentType, pages: &[u32]) -> Topic {
        Topic {
            name: name.to_string(),
            confidence: 80.0,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            pages: pages.to_vec(),
            content_type,
            sentiment: Sentiment::Neutral,
            language: "en".to_string(),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(consolidate(&[]).is_empty());
    }

    #[test]
    fn test_singleton_group() {
        let groups = consolidate(&[topic("Solo", &["a"], ContentType::Other, &[1, 2])]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].main_topic, "Solo");
        assert!(groups[0].sub_topics.is_empty());
        assert_eq!(groups[0].total_pages, 2);
    }

    #[test]
    fn test_identical_keywords_different_type_grouped() {
        let groups = consolidate(&[
            topic("A", &["budget", "revenue"], ContentType::Business, &[1]),
            topic("B", &["Revenue", "BUDGET"], ContentType::Financial, &[2]),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].sub_topics, vec!["B"]);
    }

    #[test]
    fn test_disjoint_keywords_same_type_grouped() {
        let groups = consolidate(&[
            topic("A", &["vault"], ContentType::Gymnastics, &[1]),
            topic("B", &["beam"], ContentType::Gymnastics, &[4]),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].total_pages, 2);
    }

    #[test]
    fn test_disjoint_keywords_different_type_not_grouped() {
        let groups = consolidate(&[
            topic("A", &["vault"], ContentType::Gymnastics, &[1]),
            topic("B", &["ledger"], ContentType::Financial, &[4]),
        ]);
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.sub_topics.is_empty()));
    }

    #[test]
    fn test_yoga_scenario() {
        let groups = consolidate(&[
            topic("Yoga Basics", &["yoga", "stretch"], ContentType::Educational, &[1]),
            topic("Yoga Safety", &["yoga", "injury"], ContentType::Educational, &[2]),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].main_topic, "Yoga Basics");
        assert_eq!(groups[0].sub_topics, vec!["Yoga Safety"]);
        assert_eq!(groups[0].all_keywords, vec!["yoga", "stretch", "yoga", "injury"]);
    }

    #[test]
    fn test_similarity_threshold_is_strict() {
        // 3 shared of 5 distinct = 0.6, which must not fold on its own
        let a = topic("A", &["a", "b", "c", "d"], ContentType::Business, &[1]);
        let b = topic("B", &["a", "b", "c", "e"], ContentType::Other, &[1]);
        assert!((keyword_similarity(&a.keywords, &b.keywords) - 0.6).abs() < 1e-9);
        assert_eq!(consolidate(&[a, b]).len(), 2);
    }

    #[test]
    fn test_empty_keywords_only_merge_on_type() {
        let groups = consolidate(&[
            topic("A", &[], ContentType::Storytelling, &[1]),
            topic("B", &[], ContentType::Other, &[1]),
            topic("C", &[], ContentType::Storytelling, &[1]),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].sub_topics, vec!["C"]);
        assert_eq!(groups[1].main_topic, "B");
    }

    #[test]
    fn test_grouping_is_a_partition() {
        let types = [
            ContentType::Business,
            ContentType::Financial,
            ContentType::Other,
            ContentType::Business,
            ContentType::Educational,
            ContentType::Financial,
            ContentType::Storytelling,
        ];
        let topics: Vec<Topic> = types
            .iter()
            .enumerate()
            .map(|(i, ct)| {
                let kw = format!("k{}", i % 3);
                topic(&format!("T{}", i), &[kw.as_str(), "shared"], *ct, &[i as u32 + 1])
            })
            .collect();

        let groups = consolidate(&topics);
        let mut seen: Vec<String> = groups
            .iter()
            .flat_map(|g| std::iter::once(g.main_topic.clone()).chain(g.sub_topics.clone()))
            .collect();
        seen.sort();
        let mut expected: Vec<String> = topics.iter().map(|t| t.name.clone()).collect();
        expected.sort();
        assert_eq!(seen, expected);

        for g in &groups {
            let rep = topics.iter().find(|t| t.name == g.main_topic).unwrap();
            assert!(g.total_pages >= rep.pages.len() as u32);
        }
    }
}
