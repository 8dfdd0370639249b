use serde::{Deserialize, Serialize};

/// Authenticated user profile as returned by `GET /user/profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl User {
    /// The primary account is the first one the profile lists.
    pub fn primary_account(&self) -> Option<&Account> {
        self.accounts.first()
    }
}

/// Credit account attached to a user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    /// Remaining credit balance.
    pub credit: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_without_accounts_parses() {
        let json = r#"{"id":"u1","name":"Ada","email":"ada@example.com"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.accounts.is_empty());
        assert!(user.primary_account().is_none());
    }

    #[test]
    fn primary_account_is_first_listed() {
        let json = r#"{
            "id": "u1",
            "name": "Ada",
            "email": "ada@example.com",
            "accounts": [
                {"id": "acc-1", "credit": 120.5},
                {"id": "acc-2", "credit": 0.0}
            ]
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.primary_account().unwrap().id, "acc-1");
    }
}
