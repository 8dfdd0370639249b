use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

use super::Storage;

/// Storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

/// Key-value store backed by a single JSON file.
///
/// The whole map is rewritten on every mutation through a temp-file rename,
/// so multi-key writes land atomically: a crash mid-save leaves the previous
/// file intact, never a partially updated one.
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles between concurrent callers.
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
        Ok(Self {
            path: data_dir.join(STORAGE_FILE),
            lock: Mutex::new(()),
        })
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read storage file")?;
        serde_json::from_str(&contents).context("Failed to parse storage file")
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let contents = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).context("Failed to write storage file")?;
        std::fs::rename(&tmp, &self.path).context("Failed to replace storage file")?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap();
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut map = self.read_map()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.remove_many(&[key])
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut map = self.read_map()?;
        for key in keys {
            map.remove(*key);
        }
        self.write_map(&map)
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        self.write_map(&BTreeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, FileStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        (dir, storage)
    }

    #[test]
    fn values_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
            storage.set("token", "abc").unwrap();
        }
        let reopened = FileStorage::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn set_many_lands_all_entries_together() {
        let (_dir, storage) = storage();
        storage
            .set_many(&[("token", "abc"), ("refreshToken", "r1")])
            .unwrap();

        assert_eq!(storage.get("token").unwrap().as_deref(), Some("abc"));
        assert_eq!(storage.get("refreshToken").unwrap().as_deref(), Some("r1"));
    }

    #[test]
    fn clear_empties_the_map() {
        let (_dir, storage) = storage();
        storage.set("token", "abc").unwrap();
        storage.set("theme-mode", "dark").unwrap();

        storage.clear().unwrap();

        assert_eq!(storage.get("token").unwrap(), None);
        assert_eq!(storage.get("theme-mode").unwrap(), None);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (_dir, storage) = storage();
        assert_eq!(storage.get("anything").unwrap(), None);
    }
}
