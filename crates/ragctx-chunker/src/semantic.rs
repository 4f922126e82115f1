//! Semantic chunking strategy.
//!
//! Splits text at markdown headings (ATX `#` and setext `===`/`---`
//! underlines) into sections, then packs each section body according to the
//! configured boundary strategy. Best for markdown, documentation and prose.

use ragctx_core::{BoundaryStrategy, ChunkingConfig};

use crate::builder::Draft;
use crate::packing::{paragraph_units, sentence_units, Packer, Span};
use crate::window::windows;

/// A parsed section of the document. The heading line itself is not part
/// of the body.
#[derive(Debug)]
pub(crate) struct Section<'a> {
    pub heading: Option<String>,
    pub level: Option<u8>,
    pub body: &'a str,
    pub body_start: usize,
}

/// Segment text into drafts, one or more per section.
pub(crate) fn segment(text: &str, config: &ChunkingConfig) -> Vec<Draft> {
    parse_sections(text)
        .into_iter()
        .flat_map(|section| {
            pack_body(section.body, section.body_start, config)
                .into_iter()
                .map(move |span| {
                    Draft::from_span(span).titled(section.heading.as_deref(), section.level)
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Pack a section body starting at byte `base` of the document.
pub(crate) fn pack_body(body: &str, base: usize, config: &ChunkingConfig) -> Vec<Span> {
    match config.boundary_strategy {
        BoundaryStrategy::SlidingWindow => windows(body, base, config),
        BoundaryStrategy::Sentence => Packer::pack(config, " ", sentence_units(body, base)),
        BoundaryStrategy::Paragraph
        | BoundaryStrategy::Section
        | BoundaryStrategy::Page
        | BoundaryStrategy::Semantic => Packer::pack(
            config,
            "\n\n",
            paragraph_units(body, base, config.preserve_code_blocks),
        ),
    }
}

/// Section under construction: heading plus the byte where its body starts.
struct Open {
    heading: Option<String>,
    level: Option<u8>,
    start: usize,
}

/// Parse document into sections based on headings.
pub(crate) fn parse_sections(text: &str) -> Vec<Section<'_>> {
    let mut sections = Vec::new();
    let mut current = Open {
        heading: None,
        level: None,
        start: 0,
    };
    let mut offset = 0;
    let mut previous: Option<(usize, &str)> = None;
    let mut in_fence = false;

    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        let line_end = offset + line.len();

        if content.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }

        if in_fence {
            // Headings are not recognised inside fenced code
        } else if let Some((level, heading)) = parse_markdown_heading(content) {
            close_section(&mut sections, current, text, offset);
            current = Open {
                heading: Some(heading),
                level: Some(level),
                start: line_end,
            };
        } else if let Some((prev_start, prev)) =
            previous.filter(|(start, _)| *start >= current.start)
        {
            if let Some(level) = underline_level(content, prev) {
                close_section(&mut sections, current, text, prev_start);
                current = Open {
                    heading: Some(prev.trim().to_string()),
                    level: Some(level),
                    start: line_end,
                };
            }
        }

        previous = Some((offset, content));
        offset = line_end;
    }
    close_section(&mut sections, current, text, text.len());

    sections
}

fn close_section<'a>(sections: &mut Vec<Section<'a>>, open: Open, text: &'a str, end: usize) {
    let end = end.max(open.start);
    let body = &text[open.start..end];
    if body.trim().is_empty() && open.heading.is_none() {
        return;
    }
    sections.push(Section {
        heading: open.heading,
        level: open.level,
        body,
        body_start: open.start,
    });
}

/// `# Title` through `###### Title`.
fn parse_markdown_heading(line: &str) -> Option<(u8, String)> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('#') {
        return None;
    }

    let hash_count = trimmed.chars().take_while(|c| *c == '#').count();
    if hash_count > 6 {
        return None;
    }

    let rest = &trimmed[hash_count..];
    if rest.trim().is_empty() || !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let level = u8::try_from(hash_count).ok()?;
    Some((level, rest.trim().to_string()))
}

/// Level of a setext underline (`===` is 1, `---` is 2) below `previous`.
fn underline_level(line: &str, previous: &str) -> Option<u8> {
    let trimmed = line.trim();
    if trimmed.len() < 3 {
        return None;
    }
    let prev = previous.trim();
    if prev.is_empty() || prev.starts_with('#') {
        return None;
    }

    if trimmed.chars().all(|c| c == '=') {
        Some(1)
    } else if trimmed.chars().all(|c| c == '-') {
        Some(2)
    } else {
        None
    }
}
