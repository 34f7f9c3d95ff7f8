//! Header parsing utilities.

use axum::http::{header::AUTHORIZATION, HeaderMap};

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Longest caller-supplied correlation ID that is echoed back.
const MAX_CORRELATION_ID_LEN: usize = 128;

/// Extension trait for convenient header parsing.
pub trait HeaderMapExt {
    /// Get a header value as a string, returning None if missing.
    fn get_str(&self, name: &str) -> Option<&str>;

    /// The token of an `Authorization: Bearer <token>` header.
    fn bearer_token(&self) -> Option<&str>;

    /// A caller-supplied correlation ID, if it is safe to echo.
    fn correlation_id(&self) -> Option<&str>;
}

impl HeaderMapExt for HeaderMap {
    fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }

    fn bearer_token(&self) -> Option<&str> {
        let value = self.get_str(AUTHORIZATION.as_str())?;
        let (scheme, token) = value.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        let token = token.trim();
        (!token.is_empty()).then_some(token)
    }

    fn correlation_id(&self) -> Option<&str> {
        self.get_str(CORRELATION_ID_HEADER)
            .map(str::trim)
            .filter(|id| !id.is_empty() && id.len() <= MAX_CORRELATION_ID_LEN)
            .filter(|id| id.chars().all(|c| c.is_ascii_graphic()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    fn make_headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            // HTTP header names are case-insensitive
            let header_name = HeaderName::try_from(*name).unwrap();
            headers.insert(header_name, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn test_get_str() {
        let headers = make_headers(&[("X-Thing", "value")]);
        assert_eq!(headers.get_str("x-thing"), Some("value"));
        assert_eq!(headers.get_str("missing"), None);
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(make_headers(&[("Authorization", "Bearer abc")]).bearer_token(), Some("abc"));
        assert_eq!(make_headers(&[("Authorization", "bearer  abc ")]).bearer_token(), Some("abc"));
        assert_eq!(make_headers(&[("Authorization", "Basic abc")]).bearer_token(), None);
        assert_eq!(make_headers(&[("Authorization", "Bearer ")]).bearer_token(), None);
        assert_eq!(make_headers(&[("Authorization", "Bearer")]).bearer_token(), None);
        assert_eq!(HeaderMap::new().bearer_token(), None);
    }

    #[test]
    fn test_correlation_id() {
        let headers = make_headers(&[("X-Correlation-ID", "req-42")]);
        assert_eq!(headers.correlation_id(), Some("req-42"));

        let headers = make_headers(&[("X-Correlation-ID", "has space")]);
        assert_eq!(headers.correlation_id(), None);

        let long = "a".repeat(129);
        let headers = make_headers(&[("X-Correlation-ID", &long)]);
        assert_eq!(headers.correlation_id(), None);
    }
}
