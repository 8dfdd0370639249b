//! Durable client-side key-value storage.
//!
//! All persisted client state (tokens, cached profile, preferences) goes
//! through the `Storage` trait. Two implementations are provided:
//! - `FileStorage`: a single JSON map file, rewritten atomically
//! - `MemoryStorage`: in-memory map for tests and ephemeral sessions

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use anyhow::Result;

/// Storage key for the current access token
pub const ACCESS_TOKEN_KEY: &str = "token";

/// Storage key for the current refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Storage key for the serialized user profile
pub const USER_KEY: &str = "user";

/// Storage key for the serialized primary account
pub const ACCOUNT_KEY: &str = "account";

/// Storage key for the UI theme preference
pub const THEME_MODE_KEY: &str = "theme-mode";

/// Key-value persistence for client-side state.
///
/// Implementations are shared across tasks behind an `Arc`, so every method
/// takes `&self` and handles its own interior synchronization.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Write several keys so that a subsequent read observes either none or
    /// all of them.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Remove several keys in one operation.
    fn remove_many(&self, keys: &[&str]) -> Result<()>;

    /// Drop every stored key.
    fn clear(&self) -> Result<()>;
}
