//! Key-value persistence for state that must survive between runs.
//!
//! Values live in a single JSON object (`state.json`) inside the state
//! directory. Every key is namespaced with [`STORAGE_PREFIX`] so the file can
//! be shared with other tools.

use anyhow::{Context, Result};
use log::{debug, error, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

pub const STORAGE_PREFIX: &str = "wallet_app_";

const STATE_FILE: &str = "state.json";
const APP_DIR: &str = "wallet-cli";

/// Environment variable overriding the state directory.
pub const STATE_DIR_ENV: &str = "WALLET_STATE_DIR";

/// Picks the state directory: explicit override, then `WALLET_STATE_DIR`, then
/// the platform config directory.
pub fn default_state_dir<R: Runtime>(runtime: &R, explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Ok(dir) = runtime.env_var(STATE_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    runtime
        .config_dir()
        .map(|dir| dir.join(APP_DIR))
        .context("Could not determine a config directory; pass --state-dir")
}

pub struct StateStore<'a, R: Runtime> {
    runtime: &'a R,
    dir: PathBuf,
}

impl<'a, R: Runtime> StateStore<'a, R> {
    pub fn new(runtime: &'a R, dir: PathBuf) -> Self {
        Self { runtime, dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    /// Reads `key`. Missing, unreadable or mistyped values read as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = match self.load() {
            Ok(entries) => entries,
            Err(e) => {
                error!("Error reading state key {:?}: {:#}", key, e);
                return None;
            }
        };

        let value = entries.get(&prefixed(key))?.clone();
        if value.is_null() {
            return None;
        }
        match serde_json::from_value(value) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring malformed state value for {:?}: {}", key, e);
                None
            }
        }
    }

    /// Writes `key`. Returns `false` (and logs) when the value could not be
    /// persisted.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let result = serde_json::to_value(value)
            .context("Failed to serialize state value")
            .and_then(|value| {
                self.update(|entries| {
                    entries.insert(prefixed(key), value);
                })
            });
        report(result, "writing", key)
    }

    pub fn remove(&self, key: &str) -> bool {
        let result = self.update(|entries| {
            entries.remove(&prefixed(key));
        });
        report(result, "removing", key)
    }

    /// Drops every key this store owns, leaving foreign keys alone.
    pub fn clear(&self) -> bool {
        let result = self.update(|entries| {
            entries.retain(|key, _| !key.starts_with(STORAGE_PREFIX));
        });
        report(result, "clearing", "*")
    }

    fn load(&self) -> Result<Map<String, Value>> {
        let path = self.path();
        if !self.runtime.exists(&path) {
            return Ok(Map::new());
        }
        let content = self.runtime.read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?
        {
            Value::Object(entries) => Ok(entries),
            _ => anyhow::bail!("{} does not hold a JSON object", path.display()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut Map<String, Value>)) -> Result<()> {
        let mut entries = self.load().unwrap_or_else(|e| {
            warn!("Discarding unreadable state file: {:#}", e);
            Map::new()
        });
        apply(&mut entries);

        self.runtime.create_dir_all(&self.dir)?;
        let path = self.path();
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(&Value::Object(entries))?;
        self.runtime.write(&tmp, &json)?;
        self.runtime.rename(&tmp, &path)?;
        debug!("Saved state to {}", path.display());
        Ok(())
    }
}

fn prefixed(key: &str) -> String {
    format!("{}{}", STORAGE_PREFIX, key)
}

fn report(result: Result<()>, action: &str, key: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            error!("Error {} state key {:?}: {:#}", action, key, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use tempfile::tempdir;

    #[test]
    fn test_set_and_get_round_trip() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let store = StateStore::new(&runtime, dir.path().join("state"));

        assert_eq!(store.get::<String>("walletId"), None);
        assert!(store.set("walletId", "w1"));
        assert_eq!(store.get::<String>("walletId"), Some("w1".to_string()));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("wallet_app_walletId"));
    }

    #[test]
    fn test_remove_and_clear_keep_foreign_keys() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let store = StateStore::new(&runtime, dir.path().to_path_buf());
        std::fs::write(store.path(), r#"{"other_tool": 1, "wallet_app_a": 2}"#).unwrap();

        assert!(store.set("b", &3));
        assert!(store.remove("a"));
        assert_eq!(store.get::<u32>("a"), None);
        assert_eq!(store.get::<u32>("b"), Some(3));

        assert!(store.clear());
        assert_eq!(store.get::<u32>("b"), None);
        let raw: Value = serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({"other_tool": 1}));
    }

    #[test]
    fn test_corrupt_state_reads_as_missing() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let store = StateStore::new(&runtime, dir.path().to_path_buf());
        std::fs::write(store.path(), "{not json").unwrap();

        assert_eq!(store.get::<String>("walletId"), None);
        // A write replaces the corrupt file.
        assert!(store.set("walletId", "w2"));
        assert_eq!(store.get::<String>("walletId"), Some("w2".to_string()));
    }

    #[test]
    fn test_mistyped_value_reads_as_missing() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let store = StateStore::new(&runtime, dir.path().to_path_buf());
        assert!(store.set("walletId", &42));
        assert_eq!(store.get::<String>("walletId"), None);
    }

    #[test]
    fn test_set_reports_write_failure() {
        let mut runtime = MockRuntime::new();
        let dir = PathBuf::from("/state");
        runtime.expect_exists().returning(|_| false);
        runtime
            .expect_create_dir_all()
            .with(eq(dir.clone()))
            .returning(|_| Ok(()));
        runtime
            .expect_write()
            .returning(|_, _| Err(anyhow::anyhow!("disk full")));
        runtime.expect_rename().never();

        let store = StateStore::new(&runtime, dir);
        assert!(!store.set("walletId", "w1"));
    }

    #[test]
    fn test_default_state_dir_precedence() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .with(eq(STATE_DIR_ENV))
            .returning(|_| Ok("/from/env".to_string()));
        runtime.expect_config_dir().never();

        assert_eq!(
            default_state_dir(&runtime, Some(PathBuf::from("/explicit"))).unwrap(),
            PathBuf::from("/explicit")
        );
        assert_eq!(
            default_state_dir(&runtime, None).unwrap(),
            PathBuf::from("/from/env")
        );
    }

    #[test]
    fn test_default_state_dir_falls_back_to_config_dir() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .returning(|_| Err(std::env::VarError::NotPresent));
        runtime
            .expect_config_dir()
            .returning(|| Some(PathBuf::from("/home/user/.config")));

        assert_eq!(
            default_state_dir(&runtime, None).unwrap(),
            PathBuf::from("/home/user/.config/wallet-cli")
        );
    }

    #[test]
    fn test_default_state_dir_without_config_dir_fails() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .returning(|_| Err(std::env::VarError::NotPresent));
        runtime.expect_config_dir().returning(|| None);

        assert!(default_state_dir(&runtime, None).is_err());
    }
}
