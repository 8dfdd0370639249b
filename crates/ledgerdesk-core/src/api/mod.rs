//! HTTP client for the ledgerdesk backend.
//!
//! Every request passes through the authentication pipeline: bearer token
//! attachment, fail-fast on missing credentials, and a single
//! refresh-and-replay on 401. Status codes map into `ApiError`; anything
//! that is not an authentication failure passes through untouched.

pub mod client;
pub mod error;

pub use client::{ApiClient, ApiRequest};
pub use error::ApiError;
