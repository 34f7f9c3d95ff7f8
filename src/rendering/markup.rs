//! Vertical SVG markup generation.
//!
//! Wrapped lines become `<text>` columns laid out right to left inside a
//! `#content` group with `writing-mode="tb"`. Short digit runs are set upright
//! (tate-chu-yoko), the horizontal ellipsis becomes its vertical form and
//! dash-like characters are rotated into the column direction.

use super::backend::RenderDocument;
use super::resvg_backend::CONTENT_ID;
use crate::error::RenderError;
use regex::Regex;
use serde::Serialize;
use tategaki_wrap::{CanvasEstimate, WrappedText};
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "vertical.svg";

const TEMPLATE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="{{ width }}" height="{{ height }}" viewBox="0 0 {{ width }} {{ height }}">
  <g id="{{ content_id }}" writing-mode="tb" font-family="{{ font_family }}" font-size="{{ font_size }}" letter-spacing="{{ letter_spacing }}" fill="#000000">
{%- for column in columns %}
    <text x="{{ column.x }}" y="{{ column.y }}">{{ column.body }}</text>
{%- endfor %}
  </g>
</svg>
"##;

/// Families tried after the resolved font.
const FALLBACK_FAMILIES: [&str; 4] = [
    "Noto Sans CJK JP",
    "Hiragino Kaku Gothic ProN",
    "Yu Gothic",
    "sans-serif",
];

/// Digit runs considered for upright setting.
const DIGIT_RUN: &str = r"\d+";

/// Characters rotated a quarter turn in vertical columns. The prolonged
/// sound mark (ー) is not included.
const ROTATED_DASHES: &str = "[\u{2013}\u{2014}\u{2015}\u{2212}\u{FF0D}\u{2500}\u{2501}\u{23AF}\u{2E3A}\u{2E3B}]";

/// Layout inputs for one document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub font_size: u32,
    pub line_height: f64,
    /// Extra spacing in ems
    pub letter_spacing: f64,
    pub padding: u32,
}

#[derive(Serialize)]
struct Column {
    x: String,
    y: String,
    body: String,
}

pub struct MarkupGenerator {
    tera: Tera,
    decorator: VerticalDecorator,
}

impl MarkupGenerator {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;
        // Bodies are escaped by the decorator
        tera.autoescape_on(vec![]);
        Ok(Self {
            tera,
            decorator: VerticalDecorator::new()?,
        })
    }

    /// Build the document for already wrapped text.
    ///
    /// `family` is the resolved font family, if any face was loaded.
    pub fn build(
        &self,
        wrapped: &WrappedText,
        layout: &LayoutParams,
        family: Option<&str>,
    ) -> Result<RenderDocument, RenderError> {
        let estimate = CanvasEstimate {
            total_chars: wrapped.total_chars(),
            font_size: layout.font_size,
            line_height: layout.line_height,
            padding: layout.padding,
            max_chars_per_line: wrapped.max_chars_per_line,
        }
        .size();

        let pitch = f64::from(layout.font_size) * layout.line_height;
        let right_edge = f64::from(estimate.width) - f64::from(layout.padding);
        let top = f64::from(layout.padding);

        let columns: Vec<Column> = wrapped
            .lines
            .iter()
            .enumerate()
            // Blank lines still take up a column
            .filter(|(_, line)| !line.is_empty())
            .map(|(index, line)| Column {
                x: format_px(right_edge - pitch * (index as f64 + 0.5)),
                y: format_px(top),
                body: self.decorator.decorate(line),
            })
            .collect();

        let mut context = Context::new();
        context.insert("width", &estimate.width);
        context.insert("height", &estimate.height);
        context.insert("content_id", CONTENT_ID);
        context.insert("font_family", &font_family_list(family));
        context.insert("font_size", &layout.font_size);
        context.insert(
            "letter_spacing",
            &format_px(layout.letter_spacing * f64::from(layout.font_size)),
        );
        context.insert("columns", &columns);

        let markup = self.tera.render(TEMPLATE_NAME, &context)?;

        Ok(RenderDocument {
            markup,
            padding: layout.padding,
            estimate,
            columns: wrapped.lines.len(),
        })
    }
}

/// Escaped, comma-separated font-family attribute value.
fn font_family_list(family: Option<&str>) -> String {
    family
        .into_iter()
        .chain(FALLBACK_FAMILIES)
        .map(|name| {
            if name == "sans-serif" {
                name.to_string()
            } else {
                format!("'{}'", name.replace('\'', ""))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

fn format_px(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded}")
}

/// Per-line vertical text decorations: upright short digit runs, vertical
/// ellipsis and rotated dashes.
pub struct VerticalDecorator {
    digits: Regex,
    dashes: Regex,
}

impl VerticalDecorator {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            digits: Regex::new(DIGIT_RUN)?,
            dashes: Regex::new(ROTATED_DASHES)?,
        })
    }

    /// XML-escape a line and apply the decorations.
    pub fn decorate(&self, line: &str) -> String {
        let escaped = escape_xml(line);

        let upright = self.digits.replace_all(&escaped, |caps: &regex::Captures| {
            let run = &caps[0];
            if run.chars().count() <= 2 {
                format!(r#"<tspan class="tcy" glyph-orientation-vertical="0">{run}</tspan>"#)
            } else {
                run.to_string()
            }
        });

        let ellipsis = upright.replace('\u{2026}', "\u{FE19}");

        self.dashes
            .replace_all(&ellipsis, r#"<tspan rotate="90">$0</tspan>"#)
            .into_owned()
    }
}

/// Entity-escape without numeric references, so escaping never adds digits.
fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
