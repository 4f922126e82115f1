//! Post-hoc chunk type classification.
//!
//! Checks run in order: heading, table, list, code, reference, and the first
//! match wins. Each structural check is gated by its `preserve_*` flag;
//! anything left is a paragraph.

use ragctx_core::{ChunkType, ChunkingConfig};
use regex::Regex;
use std::sync::LazyLock;

static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}\s+\S").expect("valid heading regex (verified by tests)"));

static TABLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\|.*\|\s*$").expect("valid table regex (verified by tests)"));

static LIST_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+•]|\d{1,3}[.)]|[a-z][.)])\s+\S").expect("valid list regex (verified by tests)")
});

static CODE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:def |class |fn |pub fn |function |import |from \S+ import|return\b|const |let |var |#include|public |private |package |func |\}|\{$|if\s*\(|for\s*\(|while\s*\()",
    )
    .expect("valid code regex (verified by tests)")
});

static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\d+(?:\s*[,\u{2013}-]\s*\d+)*\]|\[[A-Z][A-Za-z]+(?: et al\.)?,? \d{4}[a-z]?\]")
        .expect("valid citation regex (verified by tests)")
});

static BIBLIOGRAPHY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[\d+\]\s+\S").expect("valid bibliography regex (verified by tests)"));

/// Share of lines that must look like code for the keyword check to fire.
const CODE_LINE_RATIO: f64 = 0.3;

/// Classify chunk content.
#[must_use]
pub fn classify(content: &str, config: &ChunkingConfig) -> ChunkType {
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return ChunkType::Text;
    }
    let ratio = |re: &Regex| {
        lines.iter().filter(|line| re.is_match(line)).count() as f64 / lines.len() as f64
    };

    if config.preserve_headers && HEADING_LINE.is_match(lines[0].trim_start()) {
        return ChunkType::Heading;
    }
    if config.preserve_tables && lines.len() >= 2 && ratio(&TABLE_LINE) >= 0.5 {
        return ChunkType::Table;
    }
    if config.preserve_lists && ratio(&LIST_LINE) >= 0.5 {
        return ChunkType::List;
    }
    if config.preserve_code_blocks
        && (content.contains("```") || (lines.len() >= 2 && ratio(&CODE_LINE) >= CODE_LINE_RATIO))
    {
        return ChunkType::Code;
    }
    if is_reference(content, &lines) {
        return ChunkType::Reference;
    }

    ChunkType::Paragraph
}

/// Bibliography-style blocks, or prose dense with bracket citations.
fn is_reference(content: &str, lines: &[&str]) -> bool {
    let bibliography = lines.iter().filter(|l| BIBLIOGRAPHY_LINE.is_match(l)).count();
    if bibliography * 2 >= lines.len() && bibliography > 0 {
        return true;
    }
    let citations = CITATION.find_iter(content).count();
    let words = content.split_whitespace().count();
    citations >= 3 && citations * 20 >= words
}
