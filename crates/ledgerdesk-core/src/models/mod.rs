//! Domain and wire types for the ledgerdesk API.
//!
//! Wire field names are camelCase; domain types use the usual Rust naming
//! and keep any display helpers as inherent methods.

pub mod operation;
pub mod user;

pub use operation::{Operation, OperationKind};
pub use user::{Account, User};

use serde::{Deserialize, Serialize};

/// Standard response envelope: every endpoint wraps its payload in `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
}

/// Token pair as issued by the login and refresh endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload {
    pub token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_payload_parses_wire_names() {
        let json = r#"{"data":{"token":"abc","refreshToken":"r1"}}"#;
        let envelope: ApiEnvelope<TokenPayload> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.token, "abc");
        assert_eq!(envelope.data.refresh_token, "r1");
    }
}
