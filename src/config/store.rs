//! Rule list supply and persistence.
//!
//! The host owns where rules live; the crate only defines the collaborator
//! contract plus two bundled implementations: a JSON file store and an
//! in-memory store for embedding and tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::common::error::ConfigError;
use crate::config::types::RuleConfig;

/// Supplies the rule list at startup/reload and persists appended rules.
pub trait RuleStore: Send + Sync {
    fn load(&self) -> Result<Vec<RuleConfig>, ConfigError>;
    fn persist(&self, rules: &[RuleConfig]) -> Result<(), ConfigError>;
}

/// JSON file backed rule store.
#[derive(Debug)]
pub struct JsonRuleStore {
    path: PathBuf,
}

impl JsonRuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleStore for JsonRuleStore {
    fn load(&self) -> Result<Vec<RuleConfig>, ConfigError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    fn persist(&self, rules: &[RuleConfig]) -> Result<(), ConfigError> {
        let raw = serde_json::to_string_pretty(rules).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        std::fs::write(&self.path, raw).map_err(|source| ConfigError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}

/// In-memory rule store.
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    rules: Mutex<Vec<RuleConfig>>,
}

impl MemoryRuleStore {
    pub fn new(rules: Vec<RuleConfig>) -> Self {
        Self {
            rules: Mutex::new(rules),
        }
    }
}

impl RuleStore for MemoryRuleStore {
    fn load(&self) -> Result<Vec<RuleConfig>, ConfigError> {
        Ok(self
            .rules
            .lock()
            .map(|rules| rules.clone())
            .unwrap_or_default())
    }

    fn persist(&self, rules: &[RuleConfig]) -> Result<(), ConfigError> {
        if let Ok(mut stored) = self.rules.lock() {
            *stored = rules.to_vec();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rule() -> RuleConfig {
        RuleConfig {
            pattern: "Hello".to_string(),
            source_surface: Some("Primary Chat".to_string()),
            replacement: "Hi".to_string(),
            destination_surface: None,
        }
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryRuleStore::default();
        assert!(store.load().unwrap().is_empty());
        store.persist(&[sample_rule()]).unwrap();
        assert_eq!(store.load().unwrap(), vec![sample_rule()]);
    }

    #[test]
    fn test_json_store_round_trip() {
        let path = std::env::temp_dir().join(format!("scribe-rules-{}.json", uuid::Uuid::new_v4()));
        let store = JsonRuleStore::new(&path);
        assert!(store.load().unwrap().is_empty());

        store.persist(&[sample_rule()]).unwrap();
        assert_eq!(store.load().unwrap(), vec![sample_rule()]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_json_store_rejects_malformed_file() {
        let path = std::env::temp_dir().join(format!("scribe-bad-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "not json").unwrap();
        let store = JsonRuleStore::new(&path);
        assert!(matches!(store.load(), Err(ConfigError::Parse { .. })));
        let _ = std::fs::remove_file(&path);
    }
}
