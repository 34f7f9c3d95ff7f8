//! Test fixtures and constants.

use serde_json::{json, Value};

/// Bearer token configured by `test_config`
pub const TOKEN: &str = "test-token";

/// Opening of Natsume Soseki's "I Am a Cat"
pub const NEKO: &str = "吾輩は猫である。名前はまだ無い。どこで生れたかとんと見当がつかぬ。";

/// Text that makes the mock backend fail
pub const FAILING_TEXT: &str = "✗";

/// Text that makes the mock backend hang
pub const HANGING_TEXT: &str = "⌛";

/// Text that makes the mock backend return a malformed surface
pub const MALFORMED_TEXT: &str = "▦";

/// PNG file signature
pub const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Batch body with the given item texts
pub fn batch_of(texts: &[&str]) -> Value {
    json!({
        "items": texts.iter().map(|t| json!({ "text": t })).collect::<Vec<_>>()
    })
}
