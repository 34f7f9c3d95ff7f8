//! Render request bodies and their validation.
//!
//! Ranges: font_size 8..=100, line_height 1.0..=3.0, letter_spacing
//! 0.0..=0.5, padding 0..=100, max_chars_per_line 1..=100. Text must contain
//! at least one non-whitespace character.

use crate::error::FieldError;
use crate::rendering::LayoutParams;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_FONT_SIZE: u32 = 20;
pub const DEFAULT_LINE_HEIGHT: f64 = 1.6;
pub const DEFAULT_LETTER_SPACING: f64 = 0.05;
pub const DEFAULT_PADDING: u32 = 20;

/// A single render request, fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RenderRequest {
    /// Text to set vertically; `\n` starts a new paragraph
    #[schema(example = "吾輩は猫である。名前はまだ無い。")]
    pub text: String,

    /// Logical font name (antique, gothic, mincho)
    #[serde(default)]
    pub font: Option<String>,

    #[serde(default = "default_font_size")]
    #[schema(minimum = 8, maximum = 100)]
    pub font_size: u32,

    #[serde(default = "default_line_height")]
    #[schema(minimum = 1.0, maximum = 3.0)]
    pub line_height: f64,

    /// Extra spacing between characters, in ems
    #[serde(default = "default_letter_spacing")]
    #[schema(minimum = 0.0, maximum = 0.5)]
    pub letter_spacing: f64,

    #[serde(default = "default_padding")]
    #[schema(maximum = 100)]
    pub padding: u32,

    /// Characters per column; derived from the text length when absent
    #[serde(default)]
    #[schema(minimum = 1, maximum = 100)]
    pub max_chars_per_line: Option<usize>,
}

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

fn default_line_height() -> f64 {
    DEFAULT_LINE_HEIGHT
}

fn default_letter_spacing() -> f64 {
    DEFAULT_LETTER_SPACING
}

fn default_padding() -> u32 {
    DEFAULT_PADDING
}

impl RenderRequest {
    /// A request with every option at its default.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: None,
            font_size: DEFAULT_FONT_SIZE,
            line_height: DEFAULT_LINE_HEIGHT,
            letter_spacing: DEFAULT_LETTER_SPACING,
            padding: DEFAULT_PADDING,
            max_chars_per_line: None,
        }
    }

    pub fn layout(&self) -> LayoutParams {
        LayoutParams {
            font_size: self.font_size,
            line_height: self.line_height,
            letter_spacing: self.letter_spacing,
            padding: self.padding,
        }
    }

    /// Collect field errors, locating them under `prefix` (e.g. `items.3`).
    pub fn validate_into(&self, prefix: &str, errors: &mut Vec<FieldError>) {
        if self.text.trim().is_empty() {
            errors.push(FieldError::new(join_loc(prefix, "text"), "Text cannot be empty"));
        }
        self.options().validate_into(prefix, errors);
    }

    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        self.validate_into("", &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn options(&self) -> RenderOptions {
        RenderOptions {
            font: self.font.clone(),
            font_size: Some(self.font_size),
            line_height: Some(self.line_height),
            letter_spacing: Some(self.letter_spacing),
            padding: Some(self.padding),
            max_chars_per_line: self.max_chars_per_line,
        }
    }
}

/// Optional render options, used for batch defaults and per-item overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RenderOptions {
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub font_size: Option<u32>,
    #[serde(default)]
    pub line_height: Option<f64>,
    #[serde(default)]
    pub letter_spacing: Option<f64>,
    #[serde(default)]
    pub padding: Option<u32>,
    #[serde(default)]
    pub max_chars_per_line: Option<usize>,
}

impl RenderOptions {
    pub fn validate_into(&self, prefix: &str, errors: &mut Vec<FieldError>) {
        if let Some(size) = self.font_size {
            if !(8..=100).contains(&size) {
                errors.push(FieldError::new(
                    join_loc(prefix, "font_size"),
                    "must be between 8 and 100",
                ));
            }
        }
        if let Some(height) = self.line_height {
            if !(1.0..=3.0).contains(&height) {
                errors.push(FieldError::new(
                    join_loc(prefix, "line_height"),
                    "must be between 1.0 and 3.0",
                ));
            }
        }
        if let Some(spacing) = self.letter_spacing {
            if !(0.0..=0.5).contains(&spacing) {
                errors.push(FieldError::new(
                    join_loc(prefix, "letter_spacing"),
                    "must be between 0.0 and 0.5",
                ));
            }
        }
        if let Some(padding) = self.padding {
            if padding > 100 {
                errors.push(FieldError::new(join_loc(prefix, "padding"), "must be between 0 and 100"));
            }
        }
        if let Some(chars) = self.max_chars_per_line {
            if !(1..=100).contains(&chars) {
                errors.push(FieldError::new(
                    join_loc(prefix, "max_chars_per_line"),
                    "must be between 1 and 100",
                ));
            }
        }
    }
}

/// One batch entry: text plus overrides of the batch defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BatchItem {
    pub text: String,
    #[serde(flatten)]
    pub options: RenderOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BatchRenderRequest {
    #[serde(default)]
    pub defaults: Option<RenderOptions>,
    pub items: Vec<BatchItem>,
}

impl BatchRenderRequest {
    /// Merge defaults into every item, field by field, and validate.
    ///
    /// Item value wins over the batch default, which wins over the global
    /// default.
    pub fn resolve(&self) -> Result<Vec<RenderRequest>, Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.items.is_empty() {
            errors.push(FieldError::new("items", "must contain at least one item"));
        }

        let defaults = self.defaults.clone().unwrap_or_default();
        defaults.validate_into("defaults", &mut errors);

        let resolved: Vec<RenderRequest> = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let request = merge(item, &defaults);
                request.validate_into(&format!("items.{index}"), &mut errors);
                request
            })
            .collect();

        if errors.is_empty() {
            Ok(resolved)
        } else {
            Err(errors)
        }
    }
}

fn merge(item: &BatchItem, defaults: &RenderOptions) -> RenderRequest {
    let o = &item.options;
    RenderRequest {
        text: item.text.clone(),
        font: o.font.clone().or_else(|| defaults.font.clone()),
        font_size: o.font_size.or(defaults.font_size).unwrap_or(DEFAULT_FONT_SIZE),
        line_height: o.line_height.or(defaults.line_height).unwrap_or(DEFAULT_LINE_HEIGHT),
        letter_spacing: o
            .letter_spacing
            .or(defaults.letter_spacing)
            .unwrap_or(DEFAULT_LETTER_SPACING),
        padding: o.padding.or(defaults.padding).unwrap_or(DEFAULT_PADDING),
        max_chars_per_line: o.max_chars_per_line.or(defaults.max_chars_per_line),
    }
}

fn join_loc(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}
