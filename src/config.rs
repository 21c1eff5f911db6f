use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::Result as JournalResult;
use crate::store::{self, KvStore, AI_CONFIG_KEY};

const APP_DIR: &str = "daybook";
const CONFIG_FILE: &str = "config.toml";

/// Local settings read from `config.toml`. Every field has a default, so a
/// missing or partial file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
    pub sweep_interval_hours: u64,
    pub llm_api_url: String,
    pub llm_timeout_secs: u64,
    pub geocoder_url: String,
    pub geocode_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR),
            database_file: "daybook.sqlite3".to_string(),
            sweep_interval_hours: 24,
            llm_api_url: "https://api.openai.com/v1".to_string(),
            llm_timeout_secs: 60,
            geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
            geocode_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// `$DAYBOOK_CONFIG`, else `<config dir>/daybook/config.toml`.
    pub fn default_path() -> PathBuf {
        match std::env::var("DAYBOOK_CONFIG") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join(CONFIG_FILE),
        }
    }

    /// Loads from the default path, then applies `$DAYBOOK_DATA_DIR`.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::default_path())?;
        if let Ok(dir) = std::env::var("DAYBOOK_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_hours.max(1).saturating_mul(60 * 60))
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_secs(self.geocode_timeout_secs)
    }
}

/// Language-model credentials, kept in the journal store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiConfig {
    pub api_key: String,
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4".to_string(),
        }
    }
}

impl AiConfig {
    pub fn load(store: &dyn KvStore) -> JournalResult<Self> {
        Ok(store::load_document(store, AI_CONFIG_KEY)?.unwrap_or_default())
    }

    pub fn save(&self, store: &dyn KvStore) -> JournalResult<()> {
        store::save_document(store, AI_CONFIG_KEY, self)
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// The key with everything but its first few characters hidden.
    pub fn masked_api_key(&self) -> String {
        let key = self.api_key.trim();
        if key.is_empty() {
            return "(not set)".to_string();
        }
        let visible: String = key.chars().take(6).collect();
        format!("{visible}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.sweep_interval(), Duration::from_secs(86_400));
        assert_eq!(config.geocode_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "data_dir = \"/tmp/journal\"\nsweep_interval_hours = 6\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/journal"));
        assert_eq!(config.sweep_interval(), Duration::from_secs(6 * 3600));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/journal/daybook.sqlite3"));
        assert_eq!(config.llm_api_url, "https://api.openai.com/v1");
    }

    #[test]
    fn sweep_interval_is_clamped() {
        let mut config = AppConfig {
            sweep_interval_hours: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.sweep_interval(), Duration::from_secs(3600));

        config.sweep_interval_hours = u64::MAX;
        assert_eq!(config.sweep_interval(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "sweep_interval_hours = \"often\"").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn ai_config_defaults_and_persists() {
        let store = MemoryStore::new();
        let config = AiConfig::load(&store).unwrap();
        assert_eq!(config.model, "gpt-4");
        assert!(!config.has_api_key());
        assert_eq!(config.masked_api_key(), "(not set)");

        let updated = AiConfig {
            api_key: "sk-test-123456".into(),
            model: "gpt-4o".into(),
        };
        updated.save(&store).unwrap();
        assert_eq!(AiConfig::load(&store).unwrap(), updated);
        assert_eq!(updated.masked_api_key(), "sk-tes…");

        let raw = store.get(AI_CONFIG_KEY).unwrap().unwrap();
        assert!(raw.contains("\"apiKey\""));
    }
}
