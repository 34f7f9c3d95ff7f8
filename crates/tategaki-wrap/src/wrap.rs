//! Greedy phrase packing into budget-limited lines.

use crate::kinsoku::apply_line_head_kinsoku;
use crate::segment::Segmenter;

/// Result of wrapping a whole text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedText {
    /// Lines in order, after the kinsoku post-pass. Blank lines are kept.
    pub lines: Vec<String>,
    /// The budget used for wrapping. Canvas estimation must reuse this value.
    pub max_chars_per_line: usize,
}

impl WrappedText {
    /// Total number of characters across all lines.
    pub fn total_chars(&self) -> usize {
        self.lines.iter().map(|l| l.chars().count()).sum()
    }

    /// Lines joined back with `'\n'`.
    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }
}

/// Default budget: `round(sqrt(K))` over the non-newline characters, at least 1.
pub fn auto_budget(text: &str) -> usize {
    let chars = text.chars().filter(|&c| c != '\n').count();
    ((chars as f64).sqrt().round() as usize).max(1)
}

/// Use the explicit budget when given (floored at 1), otherwise derive one.
pub fn resolve_budget(text: &str, max_chars_per_line: Option<usize>) -> usize {
    match max_chars_per_line {
        Some(budget) => budget.max(1),
        None => auto_budget(text),
    }
}

/// Wrap `text` into lines of at most `max_chars_per_line` characters.
///
/// Hard newlines split paragraphs that are wrapped independently; the kinsoku
/// pass then runs over the combined line list.
pub fn wrap(text: &str, max_chars_per_line: Option<usize>, segmenter: &dyn Segmenter) -> WrappedText {
    let budget = resolve_budget(text, max_chars_per_line);

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        pack_paragraph(paragraph, budget, segmenter, &mut lines);
    }

    WrappedText {
        lines: apply_line_head_kinsoku(lines),
        max_chars_per_line: budget,
    }
}

/// Pack one paragraph into `out` without the kinsoku pass.
///
/// Every emitted line has at most `budget` characters. A phrase longer than
/// the budget is cut into budget-sized chunks; all but its last chunk become
/// lines of their own and the remainder is packed like a normal phrase.
pub fn pack_paragraph(paragraph: &str, budget: usize, segmenter: &dyn Segmenter, out: &mut Vec<String>) {
    let budget = budget.max(1);

    if paragraph.chars().count() <= budget {
        out.push(paragraph.to_string());
        return;
    }

    let mut current = String::new();
    let mut current_len = 0;

    for phrase in segmenter.segment(paragraph) {
        let mut phrase = phrase;
        let mut phrase_len = phrase.chars().count();

        if phrase_len > budget {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }

            let mut chunks = split_chars(phrase, budget);
            // Non-empty: phrase_len > budget >= 1.
            let last = chunks.pop().unwrap_or_default();
            out.extend(chunks.into_iter().map(str::to_string));
            phrase = last;
            phrase_len = phrase.chars().count();
        }

        if current_len + phrase_len <= budget {
            current.push_str(phrase);
            current_len += phrase_len;
        } else {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            current.push_str(phrase);
            current_len = phrase_len;
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
}

/// Split `s` into consecutive slices of `size` characters (the last may be shorter).
fn split_chars(s: &str, size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for (count, (idx, _)) in s.char_indices().enumerate() {
        if count > 0 && count % size == 0 {
            chunks.push(&s[start..idx]);
            start = idx;
        }
    }
    if start < s.len() {
        chunks.push(&s[start..]);
    }
    chunks
}
