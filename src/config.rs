use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::difficulty::Difficulty;
use crate::word_source::gemini::{self, GeminiConfig};
use crate::word_source::local::DEFAULT_NUMBER_OF_WORDS;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not write config: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode config: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub difficulty: Difficulty,
    /// Read from the file when present but never written back.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub offline: bool,
    pub number_of_words: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            api_key: None,
            model: gemini::DEFAULT_MODEL.to_string(),
            endpoint: gemini::DEFAULT_ENDPOINT.to_string(),
            timeout_secs: gemini::DEFAULT_TIMEOUT.as_secs(),
            offline: false,
            number_of_words: DEFAULT_NUMBER_OF_WORDS,
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
            timeout: self.timeout(),
        }
    }

    /// The generative source needs a key; without one we stay offline.
    pub fn use_offline_source(&self) -> bool {
        self.offline
            || self
                .api_key
                .as_deref()
                .map_or(true, |k| k.trim().is_empty())
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "typewell") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("typewell_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable config")
                }
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            difficulty: Difficulty::Death,
            api_key: Some("secret".into()),
            model: "gemini-2.0-flash".into(),
            endpoint: "http://localhost:8080".into(),
            timeout_secs: 3,
            offline: true,
            number_of_words: 12,
        };
        store.save(&cfg).unwrap();
        assert_eq!(
            store.load(),
            Config {
                api_key: None,
                ..cfg
            }
        );
    }

    #[test]
    fn save_leaves_api_key_out_of_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            difficulty: Difficulty::Hard,
            api_key: Some("AIza-very-secret".into()),
            ..Config::default()
        };

        store.save(&cfg).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(!written.contains("AIza-very-secret"));
        assert!(!written.contains("api_key"));
        assert_eq!(store.load().difficulty, Difficulty::Hard);
        assert_eq!(store.load().api_key, None);
    }

    #[test]
    fn hand_written_api_key_is_still_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"api_key": "from-file"}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"difficulty": "hard"}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.difficulty, Difficulty::Hard);
        assert_eq!(cfg.model, gemini::DEFAULT_MODEL);
    }

    #[test]
    fn offline_without_api_key() {
        let mut cfg = Config::default();
        assert!(cfg.use_offline_source());

        cfg.api_key = Some("key".into());
        assert!(!cfg.use_offline_source());

        cfg.offline = true;
        assert!(cfg.use_offline_source());
    }

    #[test]
    fn gemini_config_carries_settings() {
        let cfg = Config {
            api_key: Some("k".into()),
            timeout_secs: 0,
            ..Config::default()
        };
        let gemini = cfg.gemini();
        assert_eq!(gemini.api_key.as_deref(), Some("k"));
        assert_eq!(gemini.timeout, Duration::from_secs(1));
    }
}
