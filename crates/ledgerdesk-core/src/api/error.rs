use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// A request needed an access token and none is stored. Raised before
    /// any network I/O happens.
    #[error("Not authenticated - no access token is stored")]
    MissingCredential,

    /// The server rejected the credentials and no retry was available.
    #[error("Authentication failed - the session is no longer valid")]
    AuthenticationFailed,

    /// The refresh-token exchange failed or returned incomplete data.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Local persistence failure (storage file unreadable, keychain down).
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid dragging huge payloads into logs.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..cut],
            body.len()
        )
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::AuthenticationFailed,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Whether the session was torn down centrally before this error reached
    /// the caller. Callers can use it to skip their own cleanup.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ApiError::MissingCredential
                | ApiError::AuthenticationFailed
                | ApiError::RefreshFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn status_codes_map_to_variants() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::AuthenticationFailed
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "nope"),
            ApiError::AccessDenied(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, ""),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        let message = err.to_string();
        assert!(message.len() < body.len());
        assert!(message.contains("truncated"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // Multibyte characters straddling the cut point must not panic.
        let body = "é".repeat(600);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn auth_failures_are_flagged() {
        assert!(ApiError::MissingCredential.is_auth_failure());
        assert!(ApiError::AuthenticationFailed.is_auth_failure());
        assert!(ApiError::RefreshFailed("boom".into()).is_auth_failure());
        assert!(!ApiError::NotFound(String::new()).is_auth_failure());
    }
}
