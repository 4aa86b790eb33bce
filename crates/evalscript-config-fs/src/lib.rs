// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed `ConfigStore` for evalscript tools (uses platform config dir).

use directories::ProjectDirs;
use evalscript_config::{ConfigError, ConfigStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const EXTENSION: &str = "json";

/// Store configs as JSON files under the platform config directory.
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Create a store rooted at the user config directory (e.g., `~/.config/evalscript-gen/presets`).
    pub fn new() -> Result<Self, ConfigError> {
        let proj = ProjectDirs::from("dev", "flyingrobots", "evalscript-gen")
            .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))?;
        Self::at(proj.config_dir().join("presets"))
    }

    /// Create a store rooted at `base`, creating the directory if needed.
    pub fn at(base: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let base = base.into();
        fs::create_dir_all(&base)?;
        debug!(base = %base.display(), "opened config store");
        Ok(Self { base })
    }

    /// Directory the store writes to.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let filename = format!("{}.{}", key, EXTENSION);
        self.base.join(filename)
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let path = self.path_for(key);
        match fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }

    fn delete_raw(&self, key: &str) -> Result<(), ConfigError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn keys(&self) -> Result<Vec<String>, ConfigError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.base)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_owned());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    use super::*;

    #[test]
    fn round_trips_blobs_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path().join("presets")).unwrap();
        store.save_raw("ndvi", b"{}").unwrap();
        assert_eq!(store.load_raw("ndvi").unwrap(), b"{}");
        assert!(store.base().join("ndvi.json").is_file());
    }

    #[test]
    fn missing_key_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        assert!(matches!(store.load_raw("nope"), Err(ConfigError::NotFound)));
        assert!(matches!(store.delete_raw("nope"), Err(ConfigError::NotFound)));
    }

    #[test]
    fn keys_lists_json_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::at(dir.path()).unwrap();
        store.save_raw("zeta", b"{}").unwrap();
        store.save_raw("alpha", b"{}").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["alpha".to_owned(), "zeta".to_owned()]);

        store.delete_raw("alpha").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["zeta".to_owned()]);
    }
}
