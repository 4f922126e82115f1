//! Text helpers shared by the strategies and the confidence scorer.

use std::ops::Range;

/// Paragraphs this short (in characters) are dropped by paragraph splitting.
pub const MIN_PARAGRAPH_CHARS: usize = 10;

/// Length in characters.
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the `n`th character, or `text.len()` when `n` is past the end.
#[must_use]
pub fn byte_index_at_char(text: &str, n: usize) -> usize {
    text.char_indices().nth(n).map_or(text.len(), |(i, _)| i)
}

/// Last `n` characters of `text`.
#[must_use]
pub fn tail_chars(text: &str, n: usize) -> &str {
    let total = char_len(text);
    &text[byte_index_at_char(text, total.saturating_sub(n))..]
}

/// Normalize a file type or file name to a lowercase extension:
/// `"PDF"`, `".pdf"` and `"report.pdf"` all become `"pdf"`.
#[must_use]
pub fn normalize_file_type(file_type: &str) -> String {
    let trimmed = file_type.trim();
    let ext = trimmed.rsplit('.').next().unwrap_or(trimmed);
    ext.to_lowercase()
}

/// Fragments between sentence punctuation, trimmed, empties removed.
#[must_use]
pub fn sentence_fragments(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

/// Byte ranges of sentences. A sentence ends at `.`, `!` or `?` followed by
/// whitespace or the end of the text. Ranges are trimmed.
#[must_use]
pub fn sentence_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
            if at_boundary {
                let end = i + c.len_utf8();
                push_trimmed(&mut ranges, text, start..end);
                start = end;
            }
        }
    }
    push_trimmed(&mut ranges, text, start..text.len());

    ranges
}

fn push_trimmed(ranges: &mut Vec<Range<usize>>, text: &str, range: Range<usize>) {
    let slice = &text[range.clone()];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return;
    }
    let lead = slice.len() - slice.trim_start().len();
    let start = range.start + lead;
    ranges.push(start..start + trimmed.len());
}

/// Byte index at which to cut `text` so the head holds at most `max_chars`
/// characters. Prefers a sentence end, then whitespace, at or after
/// `min_chars`; falls back to a hard cut at `max_chars`.
#[must_use]
pub fn cut_point(text: &str, max_chars: usize, min_chars: usize) -> usize {
    let hard = byte_index_at_char(text, max_chars.max(1));
    if hard >= text.len() {
        return text.len();
    }
    let floor = byte_index_at_char(text, min_chars.min(max_chars));
    let window = &text[floor..hard];

    // Sentence end followed by whitespace
    let mut sentence_cut = None;
    let mut iter = window.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if matches!(c, '.' | '!' | '?') {
            let next_is_space = match iter.peek() {
                Some((_, next)) => next.is_whitespace(),
                None => text[hard..].starts_with(char::is_whitespace),
            };
            if next_is_space {
                sentence_cut = Some(floor + i + c.len_utf8());
            }
        }
    }
    if let Some(cut) = sentence_cut {
        return cut;
    }

    match window.rfind(char::is_whitespace) {
        Some(pos) if floor + pos > 0 => floor + pos,
        _ => hard,
    }
}
