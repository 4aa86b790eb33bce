// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config service and storage port for evalscript tools.
//!
//! Values are stored as JSON blobs keyed by a logical name (a preset name for
//! the CLI). Adapters implement [`ConfigStore`]; [`ConfigService`] handles
//! serialization and key hygiene on top of any store.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;

/// Storage port for raw config blobs (keyed by logical name).
pub trait ConfigStore {
    /// Load a raw config blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw config blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
    /// Remove a blob. Returns `NotFound` when missing.
    fn delete_raw(&self, key: &str) -> Result<(), ConfigError>;
    /// Keys currently stored, sorted.
    fn keys(&self) -> Result<Vec<String>, ConfigError>;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// Key contains characters outside `[A-Za-z0-9_-]` or is empty.
    #[error("invalid key {0:?}: use letters, digits, '-' and '_'")]
    InvalidKey(String),
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Reject keys that could escape a flat namespace (paths, dots, whitespace).
pub fn validate_key(key: &str) -> Result<(), ConfigError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidKey(key.to_owned()))
    }
}

/// Thin service that serializes config values and delegates storage to a `ConfigStore`.
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Load and deserialize a config value for `key`. Returns `Ok(None)` if missing.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        validate_key(key)?;
        match self.store.load_raw(key) {
            Ok(bytes) => {
                if bytes.is_empty() {
                    return Ok(None);
                }
                let value = serde_json::from_slice(&bytes)?;
                debug!(key, bytes = bytes.len(), "loaded config");
                Ok(Some(value))
            }
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serialize and persist a config value for `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        validate_key(key)?;
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)?;
        debug!(key, bytes = data.len(), "saved config");
        Ok(())
    }

    /// Remove the value for `key`. Returns `NotFound` when it does not exist.
    pub fn delete(&self, key: &str) -> Result<(), ConfigError> {
        validate_key(key)?;
        self.store.delete_raw(key)
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>, ConfigError> {
        self.store.keys()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]
    use super::*;
    use serde::Deserialize;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MemoryStore {
        blobs: RefCell<BTreeMap<String, Vec<u8>>>,
    }

    impl ConfigStore for MemoryStore {
        fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
            self.blobs
                .borrow()
                .get(key)
                .cloned()
                .ok_or(ConfigError::NotFound)
        }

        fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
            self.blobs.borrow_mut().insert(key.to_owned(), data.to_vec());
            Ok(())
        }

        fn delete_raw(&self, key: &str) -> Result<(), ConfigError> {
            self.blobs
                .borrow_mut()
                .remove(key)
                .map(|_| ())
                .ok_or(ConfigError::NotFound)
        }

        fn keys(&self) -> Result<Vec<String>, ConfigError> {
            Ok(self.blobs.borrow().keys().cloned().collect())
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Preset {
        bands: Vec<String>,
    }

    #[test]
    fn save_then_load() {
        let service = ConfigService::new(MemoryStore::default());
        let preset = Preset {
            bands: vec!["B04".into(), "B08".into()],
        };
        service.save("ndvi", &preset).unwrap();
        assert_eq!(service.load::<Preset>("ndvi").unwrap(), Some(preset));
        assert_eq!(service.keys().unwrap(), vec!["ndvi".to_owned()]);
    }

    #[test]
    fn missing_and_empty_blobs_load_as_none() {
        let service = ConfigService::new(MemoryStore::default());
        assert_eq!(service.load::<Preset>("absent").unwrap(), None);
        service.store.save_raw("empty", b"").unwrap();
        assert_eq!(service.load::<Preset>("empty").unwrap(), None);
    }

    #[test]
    fn corrupt_blob_is_serde_error() {
        let service = ConfigService::new(MemoryStore::default());
        service.store.save_raw("bad", b"{not json").unwrap();
        assert!(matches!(
            service.load::<Preset>("bad"),
            Err(ConfigError::Serde(_))
        ));
    }

    #[test]
    fn delete_reports_missing_keys() {
        let service = ConfigService::new(MemoryStore::default());
        service.save("x", &Preset { bands: vec![] }).unwrap();
        service.delete("x").unwrap();
        assert!(matches!(service.delete("x"), Err(ConfigError::NotFound)));
    }

    #[test]
    fn keys_are_validated() {
        assert!(validate_key("true-color_2").is_ok());
        for bad in ["", "../etc", "a b", "a.json", "ü"] {
            assert!(
                matches!(validate_key(bad), Err(ConfigError::InvalidKey(_))),
                "{bad:?} should be rejected"
            );
        }
        let service = ConfigService::new(MemoryStore::default());
        assert!(matches!(
            service.save("../x", &Preset { bands: vec![] }),
            Err(ConfigError::InvalidKey(_))
        ));
    }
}
