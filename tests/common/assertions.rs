//! Assertion helpers for tests.

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD, Engine};
use pretty_assertions::assert_eq;

use super::app::TestResponse;
use super::fixtures::PNG_SIGNATURE;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status,
        expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert the unified error body and return it
pub fn assert_error(response: &TestResponse, status: StatusCode, code: &str) -> serde_json::Value {
    assert_status(response, status);
    let json: serde_json::Value = response.json();
    assert_eq!(json["code"], code, "Full response: {json}");
    assert!(json["message"].is_string(), "Expected message string: {json}");

    let correlation_id = json["correlationId"].as_str().expect("Expected correlationId");
    assert_eq!(
        response.header("x-correlation-id"),
        Some(correlation_id),
        "Header and body correlation IDs differ"
    );
    json
}

/// Decode `image_base64` of a render result and check it is a PNG
pub fn assert_png_result(result: &serde_json::Value) -> Vec<u8> {
    let encoded = result["image_base64"].as_str().expect("Expected image_base64");
    let png = STANDARD.decode(encoded).expect("image_base64 is not valid base64");
    assert!(
        png.starts_with(PNG_SIGNATURE),
        "Expected PNG image, got {} bytes starting with {:?}",
        png.len(),
        &png[..8.min(png.len())]
    );
    png
}

/// Assert a batch item failed with the generic render error
pub fn assert_item_failed(result: &serde_json::Value) {
    assert_eq!(result["error"]["code"], "RENDER_ERROR", "Item: {result}");
    assert_eq!(result["error"]["message"], "Rendering failed", "Item: {result}");
    assert!(result.get("image_base64").is_none());
}
