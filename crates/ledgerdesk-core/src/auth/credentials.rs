use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

/// Keychain service name under which entries are filed
const SERVICE_NAME: &str = "ledgerdesk";

/// Remember-me support. The password for an email is held in the OS keychain,
/// never in the storage file. Only the interactive login flow consults this;
/// the request pipeline itself works purely from tokens.
pub struct CredentialStore;

impl CredentialStore {
    /// Store the password for `email` in the OS keychain.
    pub fn remember(email: &str, password: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Fetch the remembered password for `email`, if any. Keychain errors are
    /// logged and treated as "not remembered".
    pub fn recall(email: &str) -> Option<String> {
        let entry = match Entry::new(SERVICE_NAME, email) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "keyring unavailable");
                return None;
            }
        };
        match entry.get_password() {
            Ok(password) => Some(password),
            Err(e) => {
                debug!(error = %e, "no remembered credential");
                None
            }
        }
    }

    /// Drop the remembered password for `email`.
    pub fn forget(email: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, email).context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }

    pub fn is_remembered(email: &str) -> bool {
        Self::recall(email).is_some()
    }
}
