//! tategaki-wrap: line wrapping for vertical Japanese text
//!
//! This library packs text into fixed-length vertical columns. It knows
//! nothing about fonts or rendering; it only decides which characters end up
//! in which column and how large a canvas the result roughly needs.
//!
//! # Quick Start
//!
//! ```
//! use tategaki_wrap::{wrap, PhraseSegmenter};
//!
//! let wrapped = wrap("吾輩は猫である。名前はまだ無い。", Some(6), &PhraseSegmenter);
//!
//! assert_eq!(wrapped.max_chars_per_line, 6);
//! assert!(wrapped.lines.iter().skip(1).all(|l| !l.starts_with('。')));
//! assert_eq!(wrapped.lines.concat(), "吾輩は猫である。名前はまだ無い。");
//! ```
//!
//! # Pipeline
//!
//! ```text
//! text
//!   |  split on '\n' (paragraphs never merge)
//!   v
//! paragraph --(fits budget)--> single line
//!   |
//!   v  Segmenter
//! phrases --(greedy pack, force-split oversized phrases)--> lines
//!   |
//!   v  kinsoku post-pass over ALL lines of the text
//! wrapped lines
//! ```
//!
//! # Budget
//!
//! When no explicit budget is given, the budget is
//! `round(sqrt(K))` where `K` counts the non-newline characters of the whole
//! input, floored at 1. [`WrappedText::max_chars_per_line`] carries the value
//! that was used so the [`canvas`] estimator can reuse it instead of
//! re-deriving it from the wrapped geometry.

pub mod canvas;
pub mod kinsoku;
pub mod segment;
pub mod wrap;


pub use canvas::{estimate_canvas, CanvasEstimate, CanvasSize, MIN_CANVAS_EDGE};
pub use kinsoku::{apply_line_head_kinsoku, is_line_head_forbidden, LINE_HEAD_FORBIDDEN};
pub use segment::{CharClass, PhraseSegmenter, Segmenter};
pub use wrap::{auto_budget, pack_paragraph, resolve_budget, wrap, WrappedText};
