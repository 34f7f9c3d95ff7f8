//! Line-head kinsoku (禁則処理).
//!
//! Some characters must never start a line: the ideographic comma and full
//! stop, closing quotes and the small tsu. The post-pass moves such a
//! character to the end of the preceding line.
//!
//! Policy:
//! - the pass runs over every line of the text, so a character may migrate
//!   across a paragraph boundary;
//! - the target is the nearest preceding non-empty line, so an emptied or
//!   blank line never receives a forbidden head character;
//! - empty lines stay in position.
//!
//! Migration only moves characters across line boundaries, so the
//! concatenation of all lines is unchanged by the pass.

/// Characters that may not begin a line.
pub const LINE_HEAD_FORBIDDEN: [char; 7] = ['、', '。', '」', '〟', 'っ', 'ッ', 'ｯ'];

pub fn is_line_head_forbidden(c: char) -> bool {
    LINE_HEAD_FORBIDDEN.contains(&c)
}

/// Move forbidden line-head characters onto the end of the previous line.
///
/// The first non-empty line is left alone even if it starts with a forbidden
/// character, because there is nothing before it to absorb the character.
pub fn apply_line_head_kinsoku(mut lines: Vec<String>) -> Vec<String> {
    // Index of the nearest non-empty line before `i`.
    let mut target: Option<usize> = None;

    for i in 0..lines.len() {
        if let Some(t) = target {
            while let Some(head) = lines[i].chars().next().filter(|&c| is_line_head_forbidden(c)) {
                lines[i].drain(..head.len_utf8());
                lines[t].push(head);
            }
        }
        if !lines[i].is_empty() {
            target = Some(i);
        }
    }

    lines
}
