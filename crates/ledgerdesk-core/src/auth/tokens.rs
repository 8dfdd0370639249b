use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::models::{Account, User};
use crate::storage::{
    Storage, ACCESS_TOKEN_KEY, ACCOUNT_KEY, REFRESH_TOKEN_KEY, USER_KEY,
};

/// The current token pair. Both fields absent means logged out; both present
/// means a live session. A mixed pair is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenPair {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

impl TokenPair {
    pub fn is_authenticated(&self) -> bool {
        self.access.is_some() && self.refresh.is_some()
    }
}

/// Sole owner of the persisted session keys. Everything session-related goes
/// through here; no other component touches those keys directly.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn tokens(&self) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.storage.get(ACCESS_TOKEN_KEY)?,
            refresh: self.storage.get(REFRESH_TOKEN_KEY)?,
        })
    }

    pub fn access_token(&self) -> Result<Option<String>> {
        self.storage.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Result<Option<String>> {
        self.storage.get(REFRESH_TOKEN_KEY)
    }

    /// Persist a new token pair. Both keys land in one write, so a reader
    /// never observes an old access token next to a new refresh token.
    pub fn save_tokens(&self, access: &str, refresh: &str) -> Result<()> {
        self.storage
            .set_many(&[(ACCESS_TOKEN_KEY, access), (REFRESH_TOKEN_KEY, refresh)])?;
        debug!("token pair saved");
        Ok(())
    }

    /// Remove every session-related key: both tokens plus the cached profile
    /// and account, in one operation. The theme preference is not session
    /// state and survives.
    pub fn clear_session(&self) -> Result<()> {
        self.storage
            .remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY, ACCOUNT_KEY])?;
        debug!("session cleared");
        Ok(())
    }

    // ===== Cached profile =====

    pub fn cached_user(&self) -> Result<Option<User>> {
        match self.storage.get(USER_KEY)? {
            Some(raw) => Ok(Some(
                serde_json::from_str(&raw).context("Failed to parse cached user")?,
            )),
            None => Ok(None),
        }
    }

    pub fn cache_user(&self, user: &User) -> Result<()> {
        self.storage.set(USER_KEY, &serde_json::to_string(user)?)
    }

    pub fn cached_account(&self) -> Result<Option<Account>> {
        match self.storage.get(ACCOUNT_KEY)? {
            Some(raw) => Ok(Some(
                serde_json::from_str(&raw).context("Failed to parse cached account")?,
            )),
            None => Ok(None),
        }
    }

    pub fn cache_account(&self, account: &Account) -> Result<()> {
        self.storage
            .set(ACCOUNT_KEY, &serde_json::to_string(account)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, THEME_MODE_KEY};

    fn store() -> TokenStore {
        TokenStore::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn empty_storage_reads_as_logged_out() {
        let tokens = store();
        let pair = tokens.tokens().unwrap();
        assert_eq!(pair, TokenPair::default());
        assert!(!pair.is_authenticated());
    }

    #[test]
    fn saved_pair_reads_back_whole() {
        let tokens = store();
        tokens.save_tokens("abc", "r1").unwrap();

        let pair = tokens.tokens().unwrap();
        assert_eq!(pair.access.as_deref(), Some("abc"));
        assert_eq!(pair.refresh.as_deref(), Some("r1"));
        assert!(pair.is_authenticated());
    }

    #[test]
    fn replacing_the_pair_never_mixes_generations() {
        let tokens = store();
        tokens.save_tokens("abc", "r1").unwrap();
        tokens.save_tokens("abc2", "r2").unwrap();

        let pair = tokens.tokens().unwrap();
        assert_eq!(pair.access.as_deref(), Some("abc2"));
        assert_eq!(pair.refresh.as_deref(), Some("r2"));
    }

    #[test]
    fn clear_session_removes_tokens_and_cached_profile() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(THEME_MODE_KEY, "dark").unwrap();

        let tokens = TokenStore::new(storage.clone());
        tokens.save_tokens("abc", "r1").unwrap();
        tokens
            .cache_user(&User {
                id: "u1".into(),
                name: "Ada".into(),
                email: "ada@example.com".into(),
                accounts: vec![],
            })
            .unwrap();
        tokens
            .cache_account(&Account {
                id: "acc-1".into(),
                credit: 120.0,
            })
            .unwrap();

        tokens.clear_session().unwrap();

        assert_eq!(tokens.tokens().unwrap(), TokenPair::default());
        assert!(tokens.cached_user().unwrap().is_none());
        assert!(tokens.cached_account().unwrap().is_none());
        // The theme preference is not session state.
        assert_eq!(storage.get(THEME_MODE_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn cached_account_round_trips() {
        let tokens = store();
        let account = Account {
            id: "acc-1".into(),
            credit: 42.5,
        };
        tokens.cache_account(&account).unwrap();
        assert_eq!(tokens.cached_account().unwrap(), Some(account));
    }
}
