//! Row-oriented strategy for delimited tabular text (CSV).
//!
//! The first non-blank line is the header. Data rows are batched up to
//! `csv_rows_per_chunk` rows, smaller when the chunk would exceed
//! `max_chunk_size`; each chunk repeats the header and is typed `table`.

use ragctx_core::{ChunkType, ChunkingConfig};

use crate::builder::Draft;
use crate::packing::{split_oversized, Unit};
use crate::text::char_len;

struct Row<'a> {
    text: &'a str,
    start: usize,
}

pub(crate) fn segment(text: &str, config: &ChunkingConfig) -> Vec<Draft> {
    let mut rows = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        if !content.trim().is_empty() {
            rows.push(Row {
                text: content,
                start: offset,
            });
        }
        offset += line.len();
    }

    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };
    if data.is_empty() {
        let end = header.start + header.text.len();
        return vec![table_draft(header.text.to_string(), header.start, end, None)];
    }

    let header_chars = char_len(header.text);
    let per_chunk = config.csv_rows_per_chunk.max(1);
    let mut drafts = Vec::new();
    let mut first = 0;

    while first < data.len() {
        // Grow the batch while it stays within the row and size limits
        let mut chars = header_chars;
        let mut last = first;
        while last < data.len() && last - first < per_chunk {
            let row_chars = 1 + char_len(data[last].text);
            if last > first && chars + row_chars > config.max_chunk_size {
                break;
            }
            chars += row_chars;
            last += 1;
        }

        let batch = &data[first..last];
        let mut content = String::with_capacity(chars);
        content.push_str(header.text);
        for row in batch {
            content.push('\n');
            content.push_str(row.text);
        }
        let title = format!("Rows {}-{}", first + 1, last);
        let start = batch[0].start;
        let end = batch[batch.len() - 1].start + batch[batch.len() - 1].text.len();

        if char_len(&content) > config.max_chunk_size {
            // A single row too wide for one chunk
            for piece in split_oversized(Unit::new(&content, 0), config.max_chunk_size) {
                drafts.push(table_draft(piece.text.to_string(), start, end, Some(title.clone())));
            }
        } else {
            drafts.push(table_draft(content, start, end, Some(title)));
        }
        first = last;
    }

    drafts
}

fn table_draft(content: String, start: usize, end: usize, title: Option<String>) -> Draft {
    Draft {
        content,
        start,
        end,
        section_title: title,
        chunk_type: Some(ChunkType::Table),
        ..Default::default()
    }
}
