//! HTTP client for the ledgerdesk API.
//!
//! `ApiClient` decorates every outbound request with the stored access token
//! and reacts to authentication failures: the first 401 on an authenticated
//! request runs the refresh protocol, then the original request is replayed
//! exactly once with the new token. Callers never see the intermediate 401.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::policy;
use crate::auth::refresh::RefreshGate;
use crate::auth::tokens::TokenStore;
use crate::models::{Account, ApiEnvelope, Operation, OperationKind, TokenPayload, User};
use crate::redirect::RedirectCoordinator;

use super::error::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// An outbound request descriptor. Kept as plain data so a failed attempt can
/// be rebuilt and replayed after a token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, starting with `/`.
    pub path: String,
    pub body: Option<Value>,
    pub headers: header::HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: header::HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        let mut request = Self::new(Method::POST, path);
        request.body = Some(body);
        request
    }

    /// Add an explicit header. An explicit `Authorization` header suppresses
    /// the automatic bearer attach for the first attempt.
    pub fn header(mut self, name: header::HeaderName, value: header::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// API client carrying the authenticated request pipeline.
/// Clone is cheap - reqwest::Client uses Arc internally for connection
/// pooling, and the rest of the handles are Arcs already.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: TokenStore,
    refresh: Arc<RefreshGate>,
    coordinator: Arc<RedirectCoordinator>,
}

impl ApiClient {
    /// Build a client against `base_url`. The token store and redirect
    /// coordinator come in by injection; the client owns no global state.
    pub fn new(
        base_url: impl Into<String>,
        tokens: TokenStore,
        coordinator: Arc<RedirectCoordinator>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let base_url: String = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        let refresh = Arc::new(RefreshGate::new(
            http.clone(),
            base_url.clone(),
            tokens.clone(),
            coordinator.clone(),
        ));
        Ok(Self {
            http,
            base_url,
            tokens,
            refresh,
            coordinator,
        })
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn is_authenticated(&self) -> Result<bool, ApiError> {
        Ok(self
            .tokens
            .tokens()
            .map_err(|e| ApiError::Storage(e.to_string()))?
            .is_authenticated())
    }

    // ===== Request pipeline =====

    /// Send a request through the full attach/refresh/retry pipeline and
    /// deserialize the JSON response body.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute_raw(request).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Send a request through the pipeline and return the raw response.
    pub async fn execute_raw(&self, request: ApiRequest) -> Result<reqwest::Response, ApiError> {
        let needs_auth = policy::requires_authentication(&request.path);

        let bearer = if needs_auth {
            // Fail fast: a request known to need credentials never reaches
            // the network without them.
            match self
                .tokens
                .access_token()
                .map_err(|e| ApiError::Storage(e.to_string()))?
            {
                Some(token) => Some(token),
                None => {
                    debug!(path = %request.path, "rejecting unauthenticated request");
                    return Err(ApiError::MissingCredential);
                }
            }
        } else {
            None
        };

        let attempt = self.send(&request, bearer.as_deref(), false).await?;
        if attempt.status() != StatusCode::UNAUTHORIZED || !needs_auth {
            return Self::check(attempt).await;
        }

        // First 401 on an authenticated request: refresh, then replay once.
        warn!(path = %request.path, "request unauthorized, attempting token refresh");
        let stale = bearer.unwrap_or_default();
        let fresh = match self.refresh.refresh(&stale).await {
            Ok(token) => token,
            // The gate already cleared the session and dispatched the
            // redirect; the caller gets the original authentication failure.
            Err(_) => return Err(ApiError::AuthenticationFailed),
        };

        let retried = self.send(&request, Some(&fresh), true).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            // Freshly issued tokens are still rejected: give up for good.
            warn!(path = %request.path, "retried request still unauthorized");
            if let Err(e) = self.tokens.clear_session() {
                warn!(error = %e, "failed to clear session state");
            }
            self.coordinator.redirect_to_session_expired();
            return Err(ApiError::AuthenticationFailed);
        }
        Self::check(retried).await
    }

    /// Build and send one attempt. The bearer token is attached at most once,
    /// and an explicit `Authorization` header set by the caller wins unless
    /// this is the post-refresh replay (`override_auth`).
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
        override_auth: bool,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());

        if let Some(token) = bearer {
            let explicit_auth = request.headers.contains_key(header::AUTHORIZATION);
            if override_auth || !explicit_auth {
                builder = builder.bearer_auth(token);
            }
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }

    /// Map non-success statuses through the error taxonomy.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    // ===== Authentication =====

    /// Log in and establish a session. On success the token pair is saved,
    /// then the profile (with its primary account) is fetched and cached.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let request = ApiRequest::post(
            "/auth/login",
            serde_json::json!({ "email": email, "password": password }),
        );
        let payload: ApiEnvelope<TokenPayload> = self.execute(request).await?;
        self.tokens
            .save_tokens(&payload.data.token, &payload.data.refresh_token)
            .map_err(|e| ApiError::Storage(e.to_string()))?;
        self.fetch_profile().await
    }

    /// Create an account. Public endpoint; the caller still logs in
    /// afterwards.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError> {
        let request = ApiRequest::post(
            "/auth/register",
            serde_json::json!({ "name": name, "email": email, "password": password }),
        );
        self.execute_raw(request).await?;
        Ok(())
    }

    /// Ask the backend to mail a password-reset link. Public endpoint.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        let request = ApiRequest::post(
            "/auth/forgot-password",
            serde_json::json!({ "email": email }),
        );
        self.execute_raw(request).await?;
        Ok(())
    }

    /// Drop the local session. The backend keeps no server-side session
    /// state to invalidate.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.tokens
            .clear_session()
            .map_err(|e| ApiError::Storage(e.to_string()))
    }

    // ===== Profile & balance =====

    /// Fetch the user profile and cache it together with the primary
    /// account.
    pub async fn fetch_profile(&self) -> Result<User, ApiError> {
        let envelope: ApiEnvelope<User> = self.execute(ApiRequest::get("/user/profile")).await?;
        let user = envelope.data;
        self.tokens
            .cache_user(&user)
            .map_err(|e| ApiError::Storage(e.to_string()))?;
        if let Some(account) = user.primary_account() {
            self.tokens
                .cache_account(account)
                .map_err(|e| ApiError::Storage(e.to_string()))?;
        }
        Ok(user)
    }

    /// Current credit balance of the primary account.
    pub async fn fetch_balance(&self) -> Result<Account, ApiError> {
        let envelope: ApiEnvelope<Account> =
            self.execute(ApiRequest::get("/account/balance")).await?;
        let account = envelope.data;
        self.tokens
            .cache_account(&account)
            .map_err(|e| ApiError::Storage(e.to_string()))?;
        Ok(account)
    }

    // ===== Operations ledger =====

    pub async fn fetch_operations(&self) -> Result<Vec<Operation>, ApiError> {
        let envelope: ApiEnvelope<Vec<Operation>> =
            self.execute(ApiRequest::get("/operation")).await?;
        Ok(envelope.data)
    }

    pub async fn create_operation(
        &self,
        kind: OperationKind,
        amount: f64,
        concept: &str,
    ) -> Result<Operation, ApiError> {
        let request = ApiRequest::post(
            "/operation",
            serde_json::json!({ "type": kind, "amount": amount, "concept": concept }),
        );
        let envelope: ApiEnvelope<Operation> = self.execute(request).await?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_builder_carries_body() {
        let request = ApiRequest::post("/operation", serde_json::json!({"amount": 1.0}));
        assert_eq!(request.method, Method::POST);
        assert!(request.body.is_some());
    }

    #[test]
    fn explicit_header_is_recorded() {
        let request = ApiRequest::get("/user/profile").header(
            header::AUTHORIZATION,
            header::HeaderValue::from_static("Bearer custom"),
        );
        assert!(request.headers.contains_key(header::AUTHORIZATION));
    }
}
