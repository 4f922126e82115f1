//! Sliding-window segmentation of a section body.
//!
//! Windows are `target_chunk_size` characters long and start
//! `effective_overlap` characters before the previous window's end. Window
//! ends are pulled back to a paragraph break, line break, sentence end or
//! whitespace within the last fifth of the window, never below
//! `min_chunk_size`.

use ragctx_core::ChunkingConfig;

use crate::packing::Span;

pub(crate) fn windows(body: &str, base: usize, config: &ChunkingConfig) -> Vec<Span> {
    let chars: Vec<char> = body.chars().collect();
    let offsets: Vec<usize> = body
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(body.len()))
        .collect();
    let total = chars.len();
    let target = config.target_chunk_size.max(1);
    let overlap = config.effective_overlap().min(target.saturating_sub(1));

    let mut spans = Vec::new();
    let mut start = 0;
    while start < total {
        // Re-anchor a short final window so it keeps a full target length
        if total - start < target && total > target && !spans.is_empty() {
            start = total - target;
        }
        let target_end = (start + target).min(total);
        let end = find_break_point(&chars, start, target_end, config.min_chunk_size);
        push_window(&mut spans, body, &offsets, base, start, end);

        if end >= total {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    spans
}

fn push_window(spans: &mut Vec<Span>, body: &str, offsets: &[usize], base: usize, start: usize, end: usize) {
    let slice = &body[offsets[start]..offsets[end]];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = slice.len() - slice.trim_start().len();
    let from = base + offsets[start] + lead;
    spans.push(Span {
        text: trimmed.to_string(),
        start: from,
        end: from + trimmed.len(),
        page: None,
    });
}

/// Char index at which the window `[start, target_end)` should end.
fn find_break_point(chars: &[char], start: usize, target_end: usize, min_len: usize) -> usize {
    let total = chars.len();
    if target_end >= total {
        return total;
    }

    // Look within the last 20% of the window, keeping at least min_len
    let search_start = target_end
        .saturating_sub((target_end - start) / 5)
        .max(start + min_len);
    if search_start >= target_end {
        return target_end;
    }
    let range = search_start..target_end;

    // Prefer double newline (paragraph break)
    for i in range.clone().rev() {
        if i + 1 < target_end && chars[i] == '\n' && chars[i + 1] == '\n' {
            return i + 2;
        }
    }

    // Then single newline
    for i in range.clone().rev() {
        if chars[i] == '\n' {
            return i + 1;
        }
    }

    // Then sentence end
    for i in range.clone().rev() {
        if matches!(chars[i], '.' | '!' | '?') && i + 1 < total && chars[i + 1].is_whitespace() {
            return i + 1;
        }
    }

    // Then any whitespace
    for i in range.rev() {
        if chars[i].is_whitespace() {
            return i + 1;
        }
    }

    target_end
}
