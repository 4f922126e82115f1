//! Page-oriented strategy for paginated input such as extracted PDF text.
//!
//! `page_breaks` are line indices at which a new page starts. Non-blank lines
//! are packed into chunks; a page boundary flushes the buffer once it holds
//! at least `min_chunk_size` characters.

use ragctx_core::{ChunkError, ChunkingConfig};

use crate::builder::Draft;
use crate::packing::{Packer, Unit};

pub(crate) fn segment(
    text: &str,
    page_breaks: &[usize],
    config: &ChunkingConfig,
) -> Result<Vec<Draft>, ChunkError> {
    let line_count = text.split_inclusive('\n').count();
    validate_breaks(page_breaks, line_count)?;

    let mut packer = Packer::new(config, "\n");
    let mut current_page = None;
    let mut offset = 0;

    for (index, line) in text.split_inclusive('\n').enumerate() {
        let start = offset;
        offset += line.len();
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let page = page_of_line(index, page_breaks);
        if current_page.is_some_and(|p| p != page) {
            packer.flush_if_ready();
        }
        current_page = Some(page);

        let lead = line.len() - line.trim_start().len();
        packer.push(Unit {
            text: trimmed,
            start: start + lead,
            page: Some(page),
        });
    }

    Ok(packer.finish().into_iter().map(Draft::from_span).collect())
}

/// 1-based page number of a line.
fn page_of_line(line: usize, page_breaks: &[usize]) -> u32 {
    let breaks_before = page_breaks.iter().filter(|&&b| b > 0 && b <= line).count();
    u32::try_from(breaks_before + 1).unwrap_or(u32::MAX)
}

fn validate_breaks(page_breaks: &[usize], line_count: usize) -> Result<(), ChunkError> {
    if let Some(pair) = page_breaks.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(ChunkError::InvalidHints(format!(
            "page breaks must be strictly increasing, found {} before {}",
            pair[0], pair[1]
        )));
    }
    if let Some(&last) = page_breaks.last() {
        if last >= line_count {
            return Err(ChunkError::InvalidHints(format!(
                "page break at line {last} is beyond the last line ({line_count} lines)"
            )));
        }
    }
    Ok(())
}
