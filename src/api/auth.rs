//! Bearer token check for the render endpoints.

use super::headers::HeaderMapExt;
use crate::error::ApiError;
use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Compares presented tokens against the configured one by SHA-256 digest.
#[derive(Clone)]
pub struct TokenVerifier {
    expected: Option<[u8; 32]>,
}

impl TokenVerifier {
    /// With no token configured every request is rejected.
    pub fn new(token: Option<&str>) -> Self {
        if token.is_none() {
            tracing::warn!("No API token configured; protected endpoints will reject all requests");
        }
        Self {
            expected: token.map(digest),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.expected.is_some()
    }

    pub fn verify(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let Some(expected) = self.expected else {
            return Err(ApiError::Unauthorized);
        };
        let Some(token) = headers.bearer_token() else {
            tracing::debug!("Missing bearer token");
            return Err(ApiError::Unauthorized);
        };

        let presented = digest(token);
        if bool::from(presented[..].ct_eq(&expected[..])) {
            Ok(())
        } else {
            tracing::debug!("Invalid bearer token");
            Err(ApiError::Unauthorized)
        }
    }
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}
