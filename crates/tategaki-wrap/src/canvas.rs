//! Canvas size estimation for vertical layout.
//!
//! The estimate is a lower-bound hint for the renderer, not the final image
//! size: the true size is always re-measured from the rendered content. The
//! estimate uses the wrapping budget as the column height even though forced
//! splits can make the real geometry differ slightly.

/// Neither canvas edge is estimated below this many pixels.
pub const MIN_CANVAS_EDGE: u32 = 200;

/// Extra vertical slack for descenders and rounding.
const HEIGHT_SLACK: f64 = 50.0;

/// Column width factor applied on top of `font_size * line_height`.
const COLUMN_WIDTH_FACTOR: f64 = 1.2;

/// Estimated canvas size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

/// Layout parameters for an estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasEstimate {
    /// Characters after wrapping (newlines excluded).
    pub total_chars: usize,
    pub font_size: u32,
    pub line_height: f64,
    pub padding: u32,
    /// The same budget that was used for wrapping.
    pub max_chars_per_line: usize,
}

impl CanvasEstimate {
    pub fn size(&self) -> CanvasSize {
        estimate_canvas(
            self.total_chars,
            self.font_size,
            self.line_height,
            self.padding,
            self.max_chars_per_line,
        )
    }
}

/// Estimate `(width, height)` for `total_chars` characters laid out in
/// columns of `max_chars_per_line` characters.
pub fn estimate_canvas(
    total_chars: usize,
    font_size: u32,
    line_height: f64,
    padding: u32,
    max_chars_per_line: usize,
) -> CanvasSize {
    let font_size = f64::from(font_size);
    let padding = f64::from(padding);

    let column_width = (font_size * line_height * COLUMN_WIDTH_FACTOR).floor();
    let chars_per_column = max_chars_per_line.max(1);
    let columns = total_chars.div_ceil(chars_per_column).max(1);

    let height = (chars_per_column as f64 * font_size * line_height + padding * 2.0 + HEIGHT_SLACK).floor();
    let width = columns as f64 * column_width + padding * 2.0;

    CanvasSize {
        width: clamp_edge(width),
        height: clamp_edge(height),
    }
}

fn clamp_edge(value: f64) -> u32 {
    // Saturating float-to-int cast; NaN maps to 0 and is then floored.
    (value as u32).max(MIN_CANVAS_EDGE)
}
