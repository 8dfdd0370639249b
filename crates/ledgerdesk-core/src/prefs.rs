//! UI preferences persisted alongside the session, but not part of it.
//!
//! The theme choice lives under its own storage key and deliberately
//! survives `clear_session`.

use anyhow::Result;

use crate::storage::{Storage, THEME_MODE_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    /// Unknown values fall back to the default light theme.
    pub fn from_name(name: &str) -> Self {
        match name {
            "dark" => ThemeMode::Dark,
            _ => ThemeMode::Light,
        }
    }
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn theme_mode(storage: &dyn Storage) -> Result<ThemeMode> {
    Ok(storage
        .get(THEME_MODE_KEY)?
        .map(|value| ThemeMode::from_name(&value))
        .unwrap_or_default())
}

pub fn set_theme_mode(storage: &dyn Storage, mode: ThemeMode) -> Result<()> {
    storage.set(THEME_MODE_KEY, mode.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn defaults_to_light() {
        let storage = MemoryStorage::new();
        assert_eq!(theme_mode(&storage).unwrap(), ThemeMode::Light);
    }

    #[test]
    fn round_trips_dark_mode() {
        let storage = MemoryStorage::new();
        set_theme_mode(&storage, ThemeMode::Dark).unwrap();
        assert_eq!(theme_mode(&storage).unwrap(), ThemeMode::Dark);
        assert_eq!(storage.get(THEME_MODE_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn unknown_values_fall_back_to_light() {
        let storage = MemoryStorage::new();
        storage.set(THEME_MODE_KEY, "solarized").unwrap();
        assert_eq!(theme_mode(&storage).unwrap(), ThemeMode::Light);
    }
}
