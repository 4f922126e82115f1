//! Greedy packing of text units into size-bounded spans.
//!
//! Units (paragraphs, sentences or lines) are appended to a running buffer.
//! When the next unit would push the buffer past `max_chunk_size`, the buffer
//! is flushed if it has reached `min_chunk_size`; otherwise the head of the
//! unit that still fits is taken so the flushed span stays within bounds.
//! Units longer than the maximum are split before packing.

use ragctx_core::ChunkingConfig;

use crate::text::{char_len, cut_point, sentence_ranges, MIN_PARAGRAPH_CHARS};

/// A slice of source text with its byte offset in the original document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Unit<'a> {
    pub text: &'a str,
    pub start: usize,
    pub page: Option<u32>,
}

impl<'a> Unit<'a> {
    pub fn new(text: &'a str, start: usize) -> Self {
        Self {
            text,
            start,
            page: None,
        }
    }

    fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// Sub-slice `[from, to)` of this unit (byte offsets within the unit).
    fn slice(&self, from: usize, to: usize) -> Unit<'a> {
        Unit {
            text: &self.text[from..to],
            start: self.start + from,
            page: self.page,
        }
    }
}

/// Packed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Span {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub page: Option<u32>,
}

/// Split blank-line separated paragraphs, dropping fragments of
/// [`MIN_PARAGRAPH_CHARS`] characters or fewer. With `keep_fences`, blank
/// lines inside a fenced code block do not end the paragraph.
pub(crate) fn paragraph_units(body: &str, base: usize, keep_fences: bool) -> Vec<Unit<'_>> {
    let mut units = Vec::new();
    let mut para_start: Option<usize> = None;
    let mut para_end = 0;
    let mut in_fence = false;
    let mut offset = 0;

    for line in body.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        let trimmed = content.trim();
        if keep_fences && trimmed.starts_with("```") {
            in_fence = !in_fence;
        }

        if trimmed.is_empty() && !in_fence {
            if let Some(start) = para_start.take() {
                push_paragraph(&mut units, body, base, start, para_end);
            }
        } else {
            if para_start.is_none() {
                para_start = Some(offset);
            }
            para_end = offset + content.len();
        }
        offset += line.len();
    }
    if let Some(start) = para_start {
        push_paragraph(&mut units, body, base, start, para_end);
    }

    units
}

fn push_paragraph<'a>(units: &mut Vec<Unit<'a>>, body: &'a str, base: usize, start: usize, end: usize) {
    let slice = &body[start..end];
    let trimmed = slice.trim();
    if char_len(trimmed) <= MIN_PARAGRAPH_CHARS {
        return;
    }
    let lead = slice.len() - slice.trim_start().len();
    units.push(Unit::new(trimmed, base + start + lead));
}

/// One unit per sentence.
pub(crate) fn sentence_units(body: &str, base: usize) -> Vec<Unit<'_>> {
    sentence_ranges(body)
        .into_iter()
        .map(|range| Unit::new(&body[range.clone()], base + range.start))
        .collect()
}

/// Split a unit into pieces of at most `max` characters, cutting at sentence
/// ends, then whitespace, then anywhere.
pub(crate) fn split_oversized(unit: Unit<'_>, max: usize) -> Vec<Unit<'_>> {
    let mut pieces = Vec::new();
    let mut rest = unit;

    while char_len(rest.text) > max {
        let cut = cut_point(rest.text, max, max / 2);
        let head = rest.slice(0, cut);
        let head_len = head.text.trim_end().len();
        if head_len > 0 {
            pieces.push(rest.slice(0, head_len));
        }
        let tail = &rest.text[cut..];
        let lead = tail.len() - tail.trim_start().len();
        rest = rest.slice(cut + lead, rest.text.len());
    }
    if !rest.text.is_empty() {
        pieces.push(rest);
    }

    pieces
}

/// Greedy size-bounded packer.
pub(crate) struct Packer {
    min: usize,
    max: usize,
    separator: &'static str,
    buffer: String,
    buffer_chars: usize,
    start: usize,
    end: usize,
    page: Option<u32>,
    spans: Vec<Span>,
}

impl Packer {
    pub fn new(config: &ChunkingConfig, separator: &'static str) -> Self {
        Self {
            min: config.min_chunk_size,
            max: config.max_chunk_size,
            separator,
            buffer: String::new(),
            buffer_chars: 0,
            start: 0,
            end: 0,
            page: None,
            spans: Vec::new(),
        }
    }

    /// Pack every unit and return the spans.
    pub fn pack(config: &ChunkingConfig, separator: &'static str, units: Vec<Unit<'_>>) -> Vec<Span> {
        let mut packer = Self::new(config, separator);
        for unit in units {
            packer.push(unit);
        }
        packer.finish()
    }

    pub fn push(&mut self, unit: Unit<'_>) {
        for piece in split_oversized(unit, self.max) {
            self.push_fitting(piece);
        }
    }

    fn push_fitting(&mut self, unit: Unit<'_>) {
        if self.buffer.is_empty() {
            self.append(unit);
            return;
        }

        let separator_chars = char_len(self.separator);
        let unit_chars = char_len(unit.text);
        if self.buffer_chars + separator_chars + unit_chars <= self.max {
            self.append(unit);
            return;
        }
        if self.buffer_chars >= self.min {
            self.flush();
            self.append(unit);
            return;
        }

        // Buffer is still short: top it up with the head of this unit.
        let room = self.max.saturating_sub(self.buffer_chars + separator_chars);
        if room == 0 {
            self.flush();
            self.append(unit);
            return;
        }
        let needed = self.min.saturating_sub(self.buffer_chars + separator_chars);
        let cut = cut_point(unit.text, room, needed);
        let head_len = unit.text[..cut].trim_end().len();
        if head_len > 0 {
            self.append(unit.slice(0, head_len));
        }
        self.flush();

        let tail = &unit.text[cut..];
        let lead = tail.len() - tail.trim_start().len();
        if cut + lead < unit.text.len() {
            self.append(unit.slice(cut + lead, unit.text.len()));
        }
    }

    fn append(&mut self, unit: Unit<'_>) {
        if self.buffer.is_empty() {
            self.start = unit.start;
            self.page = unit.page;
        } else {
            self.buffer.push_str(self.separator);
            self.buffer_chars += char_len(self.separator);
        }
        self.buffer.push_str(unit.text);
        self.buffer_chars += char_len(unit.text);
        self.end = unit.end();
    }

    /// Flush the buffer if it has reached the minimum size.
    pub fn flush_if_ready(&mut self) {
        if self.buffer_chars >= self.min {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        self.spans.push(Span {
            text: std::mem::take(&mut self.buffer),
            start: self.start,
            end: self.end,
            page: self.page,
        });
        self.buffer_chars = 0;
    }

    /// Flush what is left. A final span below the minimum is merged into the
    /// previous one when the result still fits.
    pub fn finish(mut self) -> Vec<Span> {
        self.flush();

        let separator_chars = char_len(self.separator);
        if self.spans.len() >= 2 {
            let last_len = char_len(&self.spans[self.spans.len() - 1].text);
            let prev_len = char_len(&self.spans[self.spans.len() - 2].text);
            if last_len < self.min && prev_len + separator_chars + last_len <= self.max {
                if let Some(last) = self.spans.pop() {
                    if let Some(prev) = self.spans.last_mut() {
                        prev.text.push_str(self.separator);
                        prev.text.push_str(&last.text);
                        prev.end = last.end;
                    }
                }
            }
        }

        self.spans
    }
}
