//! Lightweight per-chunk extraction: entities, references and keywords.
//!
//! Every function looks at one chunk's content only.

use ragctx_core::{Entity, EntityType};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

const MONTHS: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:\d{{4}}-\d{{2}}-\d{{2}}|\d{{1,2}}/\d{{1,2}}/\d{{2,4}}|\d{{1,2}} (?:{MONTHS}) \d{{4}}|(?:{MONTHS}) \d{{1,2}}, \d{{4}})\b"
    ))
    .expect("valid date regex (verified by tests)")
});

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bhttps?://[^\s<>()\[\]"']+"#).expect("valid url regex (verified by tests)")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
        .expect("valid email regex (verified by tests)")
});

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \[\d+(?:\s*[,\u{2013}-]\s*\d+)*\]                          # [1], [2, 3], [4-6]
        | \[[A-Z][A-Za-z]+(?:\ et\ al\.)?,?\ \d{4}[a-z]?\]           # [Smith, 2020]
        | \([A-Z][A-Za-z]+(?:\ et\ al\.)?,\ \d{4}[a-z]?\)            # (Smith et al., 2020)
        | (?i:\b(?:see|refer\ to)\s+(?:section|chapter|figure|fig\.|table|page|appendix)\s+[A-Za-z0-9][\w.-]*)
        ",
    )
    .expect("valid reference regex (verified by tests)")
});

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z'-]+").expect("valid word regex (verified by tests)"));

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "have", "his", "how", "its", "may", "new", "now", "see", "two",
    "who", "did", "get", "him", "let", "say", "she", "too", "use", "that", "this", "with",
    "from", "they", "will", "would", "there", "their", "what", "about", "which", "when", "were",
    "been", "into", "than", "then", "them", "these", "those", "also", "such", "each", "other",
    "some", "more", "most", "very", "only", "over", "just", "your", "where", "while", "should",
    "could", "being", "does", "here", "many", "much", "because", "both", "between", "after",
    "before", "under", "within", "without",
];

/// Number of keywords kept per chunk.
const KEYWORD_COUNT: usize = 5;

/// Dates, URLs and emails, ordered by position.
#[must_use]
pub fn extract_entities(content: &str) -> Vec<Entity> {
    let mut entities = Vec::new();

    for m in URL.find_iter(content) {
        let text = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']);
        entities.push(Entity {
            entity_type: EntityType::Url,
            text: text.to_string(),
            start: m.start(),
            end: m.start() + text.len(),
        });
    }
    let inside_url = |start: usize, entities: &[Entity]| {
        entities
            .iter()
            .any(|e| e.entity_type == EntityType::Url && e.start <= start && start < e.end)
    };

    for (re, entity_type) in [(&*EMAIL, EntityType::Email), (&*DATE, EntityType::Date)] {
        for m in re.find_iter(content) {
            if inside_url(m.start(), &entities) {
                continue;
            }
            entities.push(Entity {
                entity_type,
                text: m.as_str().to_string(),
                start: m.start(),
                end: m.end(),
            });
        }
    }

    entities.sort_by_key(|e| (e.start, e.end));
    entities
}

/// Citation-like strings in order of first appearance, deduplicated.
#[must_use]
pub fn extract_references(content: &str) -> Vec<String> {
    let mut references: Vec<String> = Vec::new();
    for m in REFERENCE.find_iter(content) {
        let text = m.as_str().trim_end_matches('.').to_string();
        if !references.contains(&text) {
            references.push(text);
        }
    }
    references
}

/// Most frequent non-stopword terms (lowercase, at least three letters).
/// Ties keep first-appearance order.
#[must_use]
pub fn extract_keywords(content: &str) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for m in WORD.find_iter(content) {
        let word = m.as_str().trim_matches(['\'', '-']).to_lowercase();
        if word.chars().count() < 3 || STOPWORDS.contains(&word.as_str()) {
            continue;
        }
        let count = counts.entry(word.clone()).or_insert(0);
        if *count == 0 {
            order.push(word);
        }
        *count += 1;
    }

    // Stable sort keeps first-appearance order among equal counts.
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(KEYWORD_COUNT);
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        LazyLock::force(&DATE);
        LazyLock::force(&URL);
        LazyLock::force(&EMAIL);
        LazyLock::force(&REFERENCE);
        LazyLock::force(&WORD);
    }

    #[test]
    fn test_extract_dates() {
        let entities =
            extract_entities("Signed 2024-03-12, amended 4/5/2024 and again on 12 March 2024.");
        let dates: Vec<&str> = entities
            .iter()
            .filter(|e| e.entity_type == EntityType::Date)
            .map(|e| e.text.as_str())
            .collect();
        assert_eq!(dates, vec!["2024-03-12", "4/5/2024", "12 March 2024"]);
    }

    #[test]
    fn test_extract_url_and_email() {
        let content = "Visit https://example.com/docs. Mail ops@example.org for help.";
        let entities = extract_entities(content);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].entity_type, EntityType::Url);
        assert_eq!(entities[0].text, "https://example.com/docs");
        assert_eq!(&content[entities[0].start..entities[0].end], "https://example.com/docs");
        assert_eq!(entities[1].entity_type, EntityType::Email);
        assert_eq!(entities[1].text, "ops@example.org");
    }

    #[test]
    fn test_dates_inside_urls_are_skipped() {
        let entities = extract_entities("Archive: https://example.com/2024-01-01/report");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].entity_type, EntityType::Url);
    }

    #[test]
    fn test_extract_references() {
        let content = "As shown [1] and [2, 3], confirmed by [Smith, 2020] and (Doe et al., 2019). \
            See section 4.2. Refer to Table 3 for data. Again [1].";
        let references = extract_references(content);
        assert_eq!(
            references,
            vec![
                "[1]",
                "[2, 3]",
                "[Smith, 2020]",
                "(Doe et al., 2019)",
                "See section 4.2",
                "Refer to Table 3",
            ]
        );
    }

    #[test]
    fn test_extract_references_none() {
        assert!(extract_references("Nothing to cite here.").is_empty());
    }

    #[test]
    fn test_extract_keywords() {
        let content = "Chunking splits documents. Chunking keeps documents readable; \
            chunking is fast and the index stays small.";
        let keywords = extract_keywords(content);
        assert_eq!(keywords[0], "chunking");
        assert_eq!(keywords[1], "documents");
        assert!(keywords.len() <= 5);
        assert!(!keywords.contains(&"the".to_string()));
    }
}
