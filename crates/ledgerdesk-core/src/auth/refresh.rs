//! Token refresh with single-flight coalescing.
//!
//! Every 401 on an authenticated request funnels through
//! [`RefreshGate::refresh`]. The first caller holds the guard while it
//! exchanges the refresh token; callers arriving while that exchange is in
//! flight wait on the same guard and reuse its result instead of issuing
//! their own refresh call. A failed exchange always tears the session down
//! and dispatches the session-expired redirect before the error propagates.

use std::sync::Arc;

use reqwest::Client;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::error::ApiError;
use crate::auth::tokens::TokenStore;
use crate::models::{ApiEnvelope, TokenPayload};
use crate::redirect::RedirectCoordinator;

/// Refresh endpoint path, relative to the API base URL. Allow-listed in the
/// auth policy, and called on a bare client here, so the exchange can never
/// trigger another refresh.
pub const REFRESH_ENDPOINT: &str = "/auth/refresh-token";

#[derive(Serialize)]
struct RefreshRequest<'a> {
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
}

pub struct RefreshGate {
    http: Client,
    base_url: String,
    tokens: TokenStore,
    coordinator: Arc<RedirectCoordinator>,
    // Held for the whole exchange; waiting here is what coalesces
    // concurrent refresh attempts into one call.
    guard: Mutex<()>,
}

impl RefreshGate {
    pub fn new(
        http: Client,
        base_url: String,
        tokens: TokenStore,
        coordinator: Arc<RedirectCoordinator>,
    ) -> Self {
        Self {
            http,
            base_url,
            tokens,
            coordinator,
            guard: Mutex::new(()),
        }
    }

    /// Exchange the stored refresh token for a new pair and return the new
    /// access token.
    ///
    /// `stale_access` is the token the failing request carried. If the stored
    /// token already differs once the guard is acquired, a concurrent caller
    /// finished a refresh in the meantime and its token is returned without
    /// another network call.
    pub async fn refresh(&self, stale_access: &str) -> Result<String, ApiError> {
        let _flight = self.guard.lock().await;

        match self.tokens.access_token() {
            Ok(Some(current)) if current != stale_access => {
                debug!("reusing token refreshed by a concurrent request");
                return Ok(current);
            }
            Ok(_) => {}
            Err(e) => return Err(self.fail(ApiError::Storage(e.to_string()))),
        }

        debug!("refreshing access token");
        match self.exchange().await {
            Ok(token) => {
                debug!("token refresh complete");
                Ok(token)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Refresh failure teardown: clear the session and dispatch the
    /// session-expired flow, then hand the error back for propagation.
    fn fail(&self, err: ApiError) -> ApiError {
        warn!(error = %err, "token refresh failed, tearing down session");
        if let Err(clear_err) = self.tokens.clear_session() {
            warn!(error = %clear_err, "failed to clear session state");
        }
        self.coordinator.redirect_to_session_expired();
        err
    }

    async fn exchange(&self) -> Result<String, ApiError> {
        let refresh_token = self
            .tokens
            .refresh_token()
            .map_err(|e| ApiError::Storage(e.to_string()))?
            .ok_or_else(|| ApiError::RefreshFailed("no refresh token stored".into()))?;

        let url = format!("{}{}", self.base_url, REFRESH_ENDPOINT);
        let response = self
            .http
            .post(&url)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
            .map_err(|e| ApiError::RefreshFailed(format!("refresh request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RefreshFailed(format!(
                "refresh endpoint returned {status}: {body}"
            )));
        }

        let payload: ApiEnvelope<TokenPayload> = response
            .json()
            .await
            .map_err(|e| ApiError::RefreshFailed(format!("malformed refresh response: {e}")))?;

        let TokenPayload {
            token,
            refresh_token,
        } = payload.data;
        if token.is_empty() || refresh_token.is_empty() {
            return Err(ApiError::RefreshFailed(
                "refresh response missing token fields".into(),
            ));
        }

        // Both tokens replaced in one write; readers never see a mix of
        // generations.
        self.tokens
            .save_tokens(&token, &refresh_token)
            .map_err(|e| ApiError::Storage(e.to_string()))?;

        Ok(token)
    }
}
